use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use crate::join::{Presence, outer_join};
use crate::model::{CandidateTable, CombineConfig, Record, Table};
use crate::report::{CombineReport, SourceDiagnostic, SourceStatus};

/// Result of folding every candidate source into the reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineOutcome {
    /// The reference rows followed by every admitted novel row.
    pub combined: Table,
    /// Per-source diagnostics and provenance counts.
    pub report: CombineReport,
}

/// A candidate-only joined row, projected to the fields a candidate can
/// supply.
struct NovelRow {
    allele: String,
    peptide: String,
    measurement: f64,
}

/// What one source contributed before any merge decision: its overlap size,
/// its agreement statistic (absent when the overlap is empty), and the rows
/// only it knows about.
struct Evaluation {
    overlap: usize,
    agreement: Option<f64>,
    novel: Vec<NovelRow>,
}

/// Accumulator threaded through the per-source fold.
struct Accumulator {
    combined: Table,
    new_allele_counts: BTreeMap<String, u64>,
    sources: Vec<SourceDiagnostic>,
}

/// Folds every candidate source into a combined table seeded with the
/// reference rows.
///
/// Sources are visited smallest first (row count, ties broken by name) so
/// repeated runs over the same inputs land novel rows in the same order.
/// The reference table itself is never modified; each source is joined
/// against it as loaded, and only the returned accumulator grows.
#[instrument(
    level = "info",
    skip_all,
    fields(reference_len = reference.len(), source_count = sources.len())
)]
pub fn combine_sources(
    reference: &Table,
    sources: &[CandidateTable],
    config: &CombineConfig,
) -> CombineOutcome {
    let mut ordered: Vec<&CandidateTable> = sources.iter().collect();
    ordered.sort_by(|lhs, rhs| {
        lhs.size()
            .cmp(&rhs.size())
            .then_with(|| lhs.name.cmp(&rhs.name))
    });

    let seed = Accumulator {
        combined: reference.clone(),
        new_allele_counts: BTreeMap::new(),
        sources: Vec::with_capacity(ordered.len()),
    };
    let merged = ordered
        .into_iter()
        .fold(seed, |accumulator, source| {
            merge_source(accumulator, reference, source, config)
        });

    info!(
        combined_len = merged.combined.len(),
        admitted = merged.combined.len() - reference.len(),
        "combination finished"
    );

    CombineOutcome {
        report: CombineReport {
            reference_len: reference.len(),
            combined_len: merged.combined.len(),
            sources: merged.sources,
            new_allele_counts: merged.new_allele_counts,
        },
        combined: merged.combined,
    }
}

/// One step of the fold: score the source and, if it passes the acceptance
/// gate, admit its novel rows. A merged source's effect is permanent for the
/// run; there is no rollback.
fn merge_source(
    mut accumulator: Accumulator,
    reference: &Table,
    source: &CandidateTable,
    config: &CombineConfig,
) -> Accumulator {
    let evaluation = evaluate_source(reference, source, config);

    let Some(agreement) = evaluation.agreement else {
        debug!(source = %source.name, "no overlapping measurements, skipping source");
        accumulator.sources.push(SourceDiagnostic {
            name: source.name.clone(),
            size: source.size(),
            overlap: 0,
            agreement: None,
            status: SourceStatus::Skipped,
            admitted: 0,
        });
        return accumulator;
    };

    if agreement <= config.acceptance_threshold {
        info!(
            source = %source.name,
            overlap = evaluation.overlap,
            agreement,
            "source rejected"
        );
        accumulator.sources.push(SourceDiagnostic {
            name: source.name.clone(),
            size: source.size(),
            overlap: evaluation.overlap,
            agreement: Some(agreement),
            status: SourceStatus::Rejected,
            admitted: 0,
        });
        return accumulator;
    }

    let admitted = evaluation.novel.len();
    info!(
        source = %source.name,
        overlap = evaluation.overlap,
        agreement,
        admitted,
        "source accepted"
    );
    for row in evaluation.novel {
        *accumulator
            .new_allele_counts
            .entry(row.allele.clone())
            .or_insert(0) += 1;
        accumulator.combined.push(Record {
            species: config.default_species.clone(),
            // Length comes from the key, not the source file, so a source
            // without a length column still yields complete rows.
            peptide_length: row.peptide.chars().count(),
            allele: row.allele,
            peptide: row.peptide,
            measurement: row.measurement,
        });
    }
    accumulator.sources.push(SourceDiagnostic {
        name: source.name.clone(),
        size: source.size(),
        overlap: evaluation.overlap,
        agreement: Some(agreement),
        status: SourceStatus::Accepted,
        admitted,
    });
    accumulator
}

/// Joins one source against the reference, classifies the rows, and scores
/// agreement over the overlap.
///
/// A candidate value agrees when it lies within `tolerance_fraction` of the
/// reference value; the tolerance band is anchored on the reference side,
/// not on the larger of the two magnitudes.
fn evaluate_source(
    reference: &Table,
    source: &CandidateTable,
    config: &CombineConfig,
) -> Evaluation {
    let mut overlap = 0usize;
    let mut within = 0usize;
    let mut novel = Vec::new();

    for row in outer_join(reference, source) {
        match row.presence {
            Presence::Both {
                reference: reference_value,
                candidate: candidate_value,
            } => {
                overlap += 1;
                let band = config.tolerance_fraction * reference_value.abs();
                if (candidate_value - reference_value).abs() <= band {
                    within += 1;
                }
            }
            Presence::CandidateOnly { candidate } => novel.push(NovelRow {
                allele: row.allele,
                peptide: row.peptide,
                measurement: candidate,
            }),
            Presence::ReferenceOnly { .. } => {}
        }
    }

    let agreement = (overlap > 0).then(|| within as f64 / overlap as f64);
    Evaluation {
        overlap,
        agreement,
        novel,
    }
}
