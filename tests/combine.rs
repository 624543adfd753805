use affinity_combine::combine::{CombineOutcome, combine_sources};
use affinity_combine::join::{Presence, outer_join};
use affinity_combine::model::{CandidateRecord, CandidateTable, CombineConfig, Record, Table};
use affinity_combine::report::SourceStatus;

fn reference_record(allele: &str, peptide: &str, measurement: f64) -> Record {
    Record {
        species: "human".to_string(),
        allele: allele.to_string(),
        peptide: peptide.to_string(),
        peptide_length: peptide.chars().count(),
        measurement,
    }
}

fn candidate(name: &str, rows: &[(&str, &str, f64)]) -> CandidateTable {
    let records = rows
        .iter()
        .map(|(allele, peptide, measurement)| CandidateRecord {
            allele: allele.to_string(),
            peptide: peptide.to_string(),
            measurement: *measurement,
        })
        .collect();
    CandidateTable::new(name, records)
}

fn config() -> CombineConfig {
    CombineConfig::new("human")
}

fn combined_rows(outcome: &CombineOutcome) -> Vec<Record> {
    outcome.combined.iter().cloned().collect()
}

#[test]
fn outer_join_emits_one_classified_row_per_key() {
    let reference = Table::new(vec![
        reference_record("A", "PEP1", 100.0),
        // Duplicate key in the reference: the first occurrence wins.
        reference_record("A", "PEP1", 999.0),
        reference_record("B", "PEP2", 200.0),
    ]);
    let source = candidate(
        "dup",
        &[("A", "PEP1", 101.0), ("A", "PEP1", 555.0), ("C", "PEP3", 5.0)],
    );

    let rows = outer_join(&reference, &source);

    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].presence,
        Presence::Both {
            reference: 100.0,
            candidate: 101.0
        }
    );
    assert_eq!(rows[1].presence, Presence::ReferenceOnly { reference: 200.0 });
    assert_eq!(rows[2].presence, Presence::CandidateOnly { candidate: 5.0 });

    assert_eq!(rows[0].reference(), Some(100.0));
    assert_eq!(rows[1].candidate(), None);
    assert_eq!(rows[2].reference(), None);
    assert_eq!(rows[2].candidate(), Some(5.0));
}

#[test]
fn agreeing_source_contributes_novel_rows() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let source = candidate("x", &[("A", "PEP1", 100.5), ("A", "PEP2", 50.0)]);

    let outcome = combine_sources(&reference, &[source], &config());

    assert_eq!(outcome.combined.len(), 2);
    let rows = combined_rows(&outcome);
    assert_eq!(rows[1], reference_record("A", "PEP2", 50.0));
    assert_eq!(outcome.report.new_allele_counts.get("A"), Some(&1));

    let diagnostic = &outcome.report.sources[0];
    assert_eq!(diagnostic.status, SourceStatus::Accepted);
    assert_eq!(diagnostic.overlap, 1);
    assert_eq!(diagnostic.agreement, Some(1.0));
    assert_eq!(diagnostic.admitted, 1);
}

#[test]
fn disagreeing_source_is_rejected_and_contributes_nothing() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let source = candidate("y", &[("A", "PEP1", 130.0), ("A", "PEP3", 20.0)]);

    let outcome = combine_sources(&reference, &[source], &config());

    assert_eq!(combined_rows(&outcome), vec![reference_record("A", "PEP1", 100.0)]);
    assert!(outcome.report.new_allele_counts.is_empty());

    let diagnostic = &outcome.report.sources[0];
    assert_eq!(diagnostic.status, SourceStatus::Rejected);
    assert_eq!(diagnostic.overlap, 1);
    assert_eq!(diagnostic.agreement, Some(0.0));
    assert_eq!(diagnostic.admitted, 0);
}

#[test]
fn source_without_overlap_is_skipped_not_scored() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let source = candidate("z", &[("B", "QQQQ", 75.0)]);

    let outcome = combine_sources(&reference, &[source], &config());

    assert_eq!(outcome.combined.len(), 1);
    let diagnostic = &outcome.report.sources[0];
    assert_eq!(diagnostic.status, SourceStatus::Skipped);
    assert_eq!(diagnostic.agreement, None);
    assert_eq!(diagnostic.overlap, 0);
    assert_eq!(diagnostic.admitted, 0);
}

#[test]
fn empty_source_is_skipped() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let source = candidate("empty", &[]);

    let outcome = combine_sources(&reference, &[source], &config());

    assert_eq!(outcome.report.sources[0].status, SourceStatus::Skipped);
    assert_eq!(outcome.combined.len(), 1);
}

#[test]
fn agreement_equal_to_threshold_is_rejected() {
    let peptides: Vec<String> = (0..10).map(|i| format!("PEPTIDE{i}")).collect();
    let reference = Table::new(
        peptides
            .iter()
            .map(|peptide| reference_record("A", peptide, 100.0))
            .collect(),
    );

    // Nine of ten overlapping rows agree, so the statistic is exactly 0.9.
    let mut rows: Vec<(&str, &str, f64)> = peptides
        .iter()
        .take(9)
        .map(|peptide| ("A", peptide.as_str(), 100.0))
        .collect();
    rows.push(("A", peptides[9].as_str(), 200.0));
    rows.push(("A", "NOVEL", 10.0));
    let source = candidate("boundary", &rows);

    let outcome = combine_sources(&reference, &[source], &config());

    let diagnostic = &outcome.report.sources[0];
    assert_eq!(diagnostic.status, SourceStatus::Rejected);
    let agreement = diagnostic.agreement.expect("scored source has agreement");
    assert!((agreement - 0.9).abs() < 1e-12);
    assert_eq!(outcome.combined.len(), reference.len());
}

#[test]
fn tolerance_band_is_anchored_to_reference_value() {
    // 101 is within 1% of reference 100, but 100 is not within 1% of
    // reference 99: the band uses the reference side, not max(|a|, |b|).
    let reference = Table::new(vec![
        reference_record("A", "PEP1", 100.0),
        reference_record("A", "PEP2", 99.0),
    ]);
    let source = candidate("asym", &[("A", "PEP1", 101.0), ("A", "PEP2", 100.0)]);

    let outcome = combine_sources(&reference, &[source], &config());

    let diagnostic = &outcome.report.sources[0];
    assert_eq!(diagnostic.overlap, 2);
    assert_eq!(diagnostic.agreement, Some(0.5));
    assert_eq!(diagnostic.status, SourceStatus::Rejected);
}

#[test]
fn combined_table_conserves_reference_and_admitted_rows() {
    let reference = Table::new(vec![
        reference_record("A", "PEP1", 100.0),
        reference_record("A", "PEP2", 200.0),
        reference_record("B", "PEP3", 300.0),
    ]);
    let accepted = candidate(
        "good",
        &[("A", "PEP1", 100.2), ("A", "NEW1", 10.0), ("B", "NEW2", 20.0)],
    );
    let rejected = candidate("bad", &[("A", "PEP2", 500.0), ("A", "NEVER", 5.0)]);

    let outcome = combine_sources(&reference, &[accepted, rejected], &config());

    assert_eq!(outcome.combined.len(), reference.len() + 2);
    assert_eq!(outcome.report.admitted_total(), 2);

    // Reference rows appear unchanged, in order, at the front.
    let rows = combined_rows(&outcome);
    let originals: Vec<Record> = reference.iter().cloned().collect();
    assert_eq!(&rows[..reference.len()], originals.as_slice());
}

#[test]
fn sources_are_visited_smallest_first() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let large = candidate(
        "alpha",
        &[("A", "PEP1", 100.0), ("A", "LARGE1", 1.0), ("A", "LARGE2", 2.0)],
    );
    let small = candidate("zeta", &[("A", "PEP1", 100.0), ("A", "SMALL1", 3.0)]);

    // Passed largest first; the fold must still visit the smaller source
    // first, so its novel row lands earlier in the combined table.
    let outcome = combine_sources(&reference, &[large, small], &config());

    let names: Vec<&str> = outcome
        .report
        .sources
        .iter()
        .map(|source| source.name.as_str())
        .collect();
    assert_eq!(names, vec!["zeta", "alpha"]);

    let peptides: Vec<&str> = outcome
        .combined
        .iter()
        .map(|record| record.peptide.as_str())
        .collect();
    assert_eq!(peptides, vec!["PEP1", "SMALL1", "LARGE1", "LARGE2"]);
}

#[test]
fn equal_size_sources_are_ordered_by_name() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let second = candidate("beta", &[("A", "PEP1", 100.0)]);
    let first = candidate("alpha", &[("A", "PEP1", 100.0)]);

    let outcome = combine_sources(&reference, &[second, first], &config());

    let names: Vec<&str> = outcome
        .report
        .sources
        .iter()
        .map(|source| source.name.as_str())
        .collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn duplicate_novel_keys_from_distinct_sources_are_both_kept() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let one = candidate("one", &[("A", "PEP1", 100.0), ("A", "PEPX", 10.0)]);
    let two = candidate("two", &[("A", "PEP1", 100.0), ("A", "PEPX", 20.0)]);

    let outcome = combine_sources(&reference, &[one, two], &config());

    assert_eq!(outcome.combined.len(), 3);
    assert_eq!(outcome.report.new_allele_counts.get("A"), Some(&2));
    let values: Vec<f64> = outcome
        .combined
        .iter()
        .filter(|record| record.peptide == "PEPX")
        .map(|record| record.measurement)
        .collect();
    assert_eq!(values, vec![10.0, 20.0]);
}

#[test]
fn admitted_rows_recompute_length_and_default_species() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let source = candidate("x", &[("A", "PEP1", 100.0), ("A", "GILGFVFTL", 50.0)]);

    let mut config = CombineConfig::new("mouse");
    config.tolerance_fraction = 0.01;
    let outcome = combine_sources(&reference, &[source], &config);

    let admitted = outcome
        .combined
        .iter()
        .find(|record| record.peptide == "GILGFVFTL")
        .expect("novel row admitted");
    assert_eq!(admitted.species, "mouse");
    assert_eq!(admitted.peptide_length, 9);
    assert_eq!(admitted.allele, "A");
    assert_eq!(admitted.measurement, 50.0);
}

#[test]
fn identical_inputs_produce_identical_outcomes() {
    let reference = Table::new(vec![
        reference_record("A", "PEP1", 100.0),
        reference_record("B", "PEP2", 200.0),
    ]);
    let sources = vec![
        candidate("one", &[("A", "PEP1", 100.0), ("A", "N1", 10.0)]),
        candidate("two", &[("B", "PEP2", 600.0), ("B", "N2", 20.0)]),
        candidate("three", &[("C", "DISJOINT", 30.0)]),
    ];

    let first = combine_sources(&reference, &sources, &config());
    let second = combine_sources(&reference, &sources, &config());

    assert_eq!(first, second);
}

#[test]
fn provenance_is_ranked_by_count_then_allele() {
    let reference = Table::new(vec![
        reference_record("A", "PEP1", 100.0),
        reference_record("B", "PEP2", 100.0),
        reference_record("C", "PEP3", 100.0),
    ]);
    let source = candidate(
        "x",
        &[
            ("A", "PEP1", 100.0),
            ("C", "N1", 1.0),
            ("C", "N2", 2.0),
            ("A", "N3", 3.0),
            ("B", "N4", 4.0),
        ],
    );

    let outcome = combine_sources(&reference, &[source], &config());

    let ranked = outcome.report.ranked_allele_counts();
    assert_eq!(ranked, vec![("C", 2), ("A", 1), ("B", 1)]);
}

#[test]
fn report_serializes_with_lowercase_statuses() {
    let reference = Table::new(vec![reference_record("A", "PEP1", 100.0)]);
    let sources = vec![
        candidate("good", &[("A", "PEP1", 100.0), ("A", "N1", 1.0)]),
        candidate("none", &[("Z", "ZZZZ", 9.0)]),
    ];

    let outcome = combine_sources(&reference, &sources, &config());
    let json = serde_json::to_value(&outcome.report).expect("report serializes");

    let statuses: Vec<&str> = json["sources"]
        .as_array()
        .expect("sources array")
        .iter()
        .map(|source| source["status"].as_str().expect("status string"))
        .collect();
    assert_eq!(statuses, vec!["skipped", "accepted"]);
    assert_eq!(json["combined_len"], 2);
    assert_eq!(json["reference_len"], 1);
}
