use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Outcome recorded for a candidate source after it was scored against the
/// reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// Agreement exceeded the threshold; the source's novel rows were merged.
    Accepted,
    /// Agreement at or below the threshold; nothing was merged.
    Rejected,
    /// No overlapping measurements, so the source could not be scored.
    Skipped,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Accepted => write!(f, "accepted"),
            SourceStatus::Rejected => write!(f, "rejected"),
            SourceStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-source diagnostics emitted regardless of whether the source was
/// merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDiagnostic {
    /// Source name, typically the candidate file stem.
    pub name: String,
    /// Declared size of the source (row count).
    pub size: usize,
    /// Number of joined rows with values on both sides.
    pub overlap: usize,
    /// Fraction of overlapping rows agreeing within tolerance. `None` for
    /// skipped sources: zero overlap is "no evidence", not 0% agreement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<f64>,
    pub status: SourceStatus,
    /// Novel rows admitted into the combined table; zero unless accepted.
    pub admitted: usize,
}

/// Summary of a full combination run: per-source diagnostics plus the
/// provenance counts of admitted rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombineReport {
    /// Size of the trusted reference table.
    pub reference_len: usize,
    /// Size of the combined table (reference plus admitted rows).
    pub combined_len: usize,
    /// Diagnostics in visitation order (ascending source size).
    pub sources: Vec<SourceDiagnostic>,
    /// Count of admitted novel rows per allele.
    pub new_allele_counts: BTreeMap<String, u64>,
}

impl CombineReport {
    /// Ranked provenance pairs: count descending, allele ascending on ties.
    pub fn ranked_allele_counts(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .new_allele_counts
            .iter()
            .map(|(allele, &count)| (allele.as_str(), count))
            .collect();
        ranked.sort_by(|lhs, rhs| rhs.1.cmp(&lhs.1).then_with(|| lhs.0.cmp(rhs.0)));
        ranked
    }

    /// Net number of rows admitted across all accepted sources.
    pub fn admitted_total(&self) -> usize {
        self.combined_len - self.reference_len
    }
}

impl fmt::Display for CombineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source summary")?;
        for source in &self.sources {
            write!(
                f,
                "  {}: size={} overlap={}",
                source.name, source.size, source.overlap
            )?;
            if let Some(agreement) = source.agreement {
                write!(f, " agreement={agreement:.4}")?;
            }
            writeln!(f, " {}", source.status)?;
        }
        writeln!(f, "New entry allele distribution")?;
        for (allele, count) in self.ranked_allele_counts() {
            writeln!(f, "  {allele}: {count}")?;
        }
        write!(
            f,
            "Combined dataset size: {} (+{})",
            self.combined_len,
            self.admitted_total()
        )
    }
}
