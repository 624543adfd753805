use std::collections::HashMap;

use crate::model::{CandidateTable, Table};

/// Composite identifier matching rows across tables: (allele, peptide).
pub type JoinKey = (String, String);

/// Which side(s) of the join supplied a value for a key, together with the
/// values themselves. Absent sides are absent from the variant rather than
/// marked with a sentinel number, so a missing value can never be confused
/// with an agreeing one. A neither-side variant does not exist: the join
/// only emits keys it actually saw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence {
    Both { reference: f64, candidate: f64 },
    ReferenceOnly { reference: f64 },
    CandidateOnly { candidate: f64 },
}

/// One output row of the full outer join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub allele: String,
    pub peptide: String,
    pub presence: Presence,
}

impl JoinedRow {
    /// Reference-side value, when the reference supplied one.
    pub fn reference(&self) -> Option<f64> {
        match self.presence {
            Presence::Both { reference, .. } | Presence::ReferenceOnly { reference } => {
                Some(reference)
            }
            Presence::CandidateOnly { .. } => None,
        }
    }

    /// Candidate-side value, when the candidate supplied one.
    pub fn candidate(&self) -> Option<f64> {
        match self.presence {
            Presence::Both { candidate, .. } | Presence::CandidateOnly { candidate } => {
                Some(candidate)
            }
            Presence::ReferenceOnly { .. } => None,
        }
    }
}

/// Full outer join of the reference and candidate tables on
/// (allele, peptide).
///
/// Every key seen on either side yields exactly one row. Duplicate keys
/// within a single input collapse to that input's first occurrence. Output
/// order is the reference's first-seen key order followed by candidate-only
/// keys in the candidate's first-seen order, which keeps downstream output
/// deterministic. Pure: neither input is modified.
pub fn outer_join(reference: &Table, candidate: &CandidateTable) -> Vec<JoinedRow> {
    let mut rows: Vec<JoinedRow> = Vec::with_capacity(reference.len() + candidate.size());
    let mut index: HashMap<JoinKey, usize> = HashMap::with_capacity(reference.len());

    for record in reference.iter() {
        let key = (record.allele.clone(), record.peptide.clone());
        if index.contains_key(&key) {
            continue;
        }
        index.insert(key, rows.len());
        rows.push(JoinedRow {
            allele: record.allele.clone(),
            peptide: record.peptide.clone(),
            presence: Presence::ReferenceOnly {
                reference: record.measurement,
            },
        });
    }

    for record in &candidate.records {
        let key = (record.allele.clone(), record.peptide.clone());
        match index.get(&key) {
            Some(&position) => {
                let row = &mut rows[position];
                if let Presence::ReferenceOnly { reference } = row.presence {
                    row.presence = Presence::Both {
                        reference,
                        candidate: record.measurement,
                    };
                }
            }
            None => {
                index.insert(key, rows.len());
                rows.push(JoinedRow {
                    allele: record.allele.clone(),
                    peptide: record.peptide.clone(),
                    presence: Presence::CandidateOnly {
                        candidate: record.measurement,
                    },
                });
            }
        }
    }

    rows
}
