use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, instrument};

use crate::error::{CombineError, Result};
use crate::model::{
    CandidateColumns, CandidateRecord, CandidateTable, Record, ReferenceColumns, Table,
};

/// Extensions recognised when discovering candidate files in a directory.
const CANDIDATE_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// Reads the trusted reference dataset. All five schema columns must be
/// present; the run aborts before any combination output otherwise.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_reference(path: &Path, columns: &ReferenceColumns) -> Result<Table> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();

    let species = column_index(&headers, "reference", &columns.species)?;
    let allele = column_index(&headers, "reference", &columns.allele)?;
    let peptide = column_index(&headers, "reference", &columns.peptide)?;
    let peptide_length = column_index(&headers, "reference", &columns.peptide_length)?;
    let measurement = column_index(&headers, "reference", &columns.measurement)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(Record {
            species: field(&row, species).to_string(),
            allele: field(&row, allele).to_string(),
            peptide: field(&row, peptide).to_string(),
            peptide_length: parse_length(
                "reference",
                &columns.peptide_length,
                field(&row, peptide_length),
            )?,
            measurement: parse_number(
                "reference",
                &columns.measurement,
                field(&row, measurement),
            )?,
        });
    }

    if records.is_empty() {
        return Err(CombineError::EmptyReference(path.to_path_buf()));
    }
    info!(record_count = records.len(), "reference table loaded");
    Ok(Table::new(records))
}

/// Reads a single candidate dataset, named after its file stem. The column
/// adapter maps the source's own header names onto the reference schema.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_candidate(path: &Path, columns: &CandidateColumns) -> Result<CandidateTable> {
    let name = source_name(path);
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();

    let allele = column_index(&headers, &name, &columns.allele)?;
    let peptide = column_index(&headers, &name, &columns.peptide)?;
    let measurement = column_index(&headers, &name, &columns.measurement)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(CandidateRecord {
            allele: field(&row, allele).to_string(),
            peptide: field(&row, peptide).to_string(),
            measurement: parse_number(&name, &columns.measurement, field(&row, measurement))?,
        });
    }

    debug!(source = %name, record_count = records.len(), "candidate table loaded");
    Ok(CandidateTable::new(name, records))
}

/// Discovers and reads every candidate file in a directory. Files are
/// visited in sorted name order so the set of loaded sources is
/// deterministic regardless of directory enumeration order.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn read_candidate_dir(dir: &Path, columns: &CandidateColumns) -> Result<Vec<CandidateTable>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_candidate_extension(path))
        .collect();
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        sources.push(read_candidate(path, columns)?);
    }
    info!(source_count = sources.len(), "candidate directory loaded");
    Ok(sources)
}

/// Picks the field delimiter from the file extension. The 2013 reference
/// benchmark ships tab-separated as `.txt`; candidate exports are plain CSV.
fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let reader = ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .from_path(path)?;
    Ok(reader)
}

fn has_candidate_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CANDIDATE_EXTENSIONS.contains(&ext))
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn column_index(headers: &StringRecord, table: &str, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| CombineError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn field<'a>(row: &'a StringRecord, index: usize) -> &'a str {
    row.get(index).unwrap_or("").trim()
}

fn parse_number(table: &str, column: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| CombineError::InvalidNumber {
            table: table.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn parse_length(table: &str, column: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|_| CombineError::InvalidNumber {
            table: table.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}
