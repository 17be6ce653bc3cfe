use std::path::Path;

use crate::output::OutputError;
use crate::recode::TidyRow;

/// Column order of the observations CSV, matching `TidyRow`'s serde names
pub const HEADERS: [&str; 11] = [
    "Year",
    "Country of Residence",
    "Migration Flow",
    "IPS Citizenship",
    "Sex",
    "Age",
    "Measure Type",
    "Value",
    "IPS Marker",
    "CI",
    "Unit",
];

/// Serialize tidy rows to `path`
///
/// Row order is preserved as given, so re-running on identical input
/// produces byte-identical output. An empty batch still gets a header line.
pub fn write_observations(path: &Path, rows: &[TidyRow]) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;

    if rows.is_empty() {
        writer.write_record(HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}
