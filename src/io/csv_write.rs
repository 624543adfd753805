use std::path::Path;

use tracing::{info, instrument};

use crate::error::Result;
use crate::model::Table;

/// Column order of the combined CSV, matching the reference export format.
const COMBINED_HEADER: [&str; 5] = ["species", "mhc", "peptide", "peptide_length", "meas"];

/// Writes the combined table as comma-separated values with a fixed header.
#[instrument(
    level = "info",
    skip_all,
    fields(path = %path.display(), record_count = table.len())
)]
pub fn write_combined(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COMBINED_HEADER)?;

    for record in table.iter() {
        let peptide_length = record.peptide_length.to_string();
        let measurement = record.measurement.to_string();
        writer.write_record([
            record.species.as_str(),
            record.allele.as_str(),
            record.peptide.as_str(),
            peptide_length.as_str(),
            measurement.as_str(),
        ])?;
    }

    writer.flush()?;
    info!("combined dataset written");
    Ok(())
}
