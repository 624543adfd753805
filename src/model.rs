use serde::{Deserialize, Serialize};

/// Relative tolerance used when two measurements count as agreeing: a
/// candidate value matches when it is within this fraction of the reference
/// value.
pub const DEFAULT_TOLERANCE_FRACTION: f64 = 0.01;

/// A source must agree on strictly more than this fraction of its
/// overlapping rows before its novel rows are admitted.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.9;

/// A single measurement row in the reference (and combined) schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Species the measurement was taken in.
    pub species: String,
    /// MHC allele identifier; the grouping half of the join key.
    pub allele: String,
    /// Peptide sequence; the item half of the join key.
    pub peptide: String,
    /// Length of the peptide sequence in residues.
    pub peptide_length: usize,
    /// Measured binding affinity.
    pub measurement: f64,
}

/// Ordered collection of records sharing the reference schema. Row order is
/// not semantically meaningful but is preserved for deterministic output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    /// Creates a table from the provided records, keeping their order.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Appends a record at the end of the table.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

/// A measurement row as supplied by a candidate source. Candidates carry the
/// join key and a value only; the remaining reference columns are derived
/// when a row is admitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub allele: String,
    pub peptide: String,
    pub measurement: f64,
}

/// A named candidate dataset. The row count doubles as the source's declared
/// size, which fixes the visitation order of the combination pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTable {
    pub name: String,
    pub records: Vec<CandidateRecord>,
}

impl CandidateTable {
    /// Creates a candidate table with the given source name.
    pub fn new(name: impl Into<String>, records: Vec<CandidateRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Declared size of the source.
    pub fn size(&self) -> usize {
        self.records.len()
    }
}

/// Column names locating the reference schema's fields in a CSV file. The
/// defaults match the 2013 benchmark export the tool was built around.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceColumns {
    pub species: String,
    pub allele: String,
    pub peptide: String,
    pub peptide_length: String,
    pub measurement: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            species: "species".to_string(),
            allele: "mhc".to_string(),
            peptide: "sequence".to_string(),
            peptide_length: "peptide_length".to_string(),
            measurement: "meas".to_string(),
        }
    }
}

/// Per-source adapter mapping a candidate's column names onto the reference
/// schema. Supplied by the caller rather than inferred.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateColumns {
    pub allele: String,
    pub peptide: String,
    pub measurement: String,
}

impl Default for CandidateColumns {
    fn default() -> Self {
        Self {
            allele: "mhc".to_string(),
            peptide: "peptide".to_string(),
            measurement: "value".to_string(),
        }
    }
}

/// Tuning for the combination pass. There is no default species: admitted
/// rows carry no species of their own, so callers must state the category
/// they are filed under.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineConfig {
    pub tolerance_fraction: f64,
    pub acceptance_threshold: f64,
    pub default_species: String,
}

impl CombineConfig {
    /// Creates a configuration with the default tolerance and threshold and
    /// the given species for admitted rows.
    pub fn new(default_species: impl Into<String>) -> Self {
        Self {
            tolerance_fraction: DEFAULT_TOLERANCE_FRACTION,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            default_species: default_species.into(),
        }
    }
}
