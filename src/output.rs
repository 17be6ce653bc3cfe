//! Output writers: the tidy CSV pair, the two CSVW schema documents, and the
//! Trig provenance file.

pub mod csv_writer;
pub mod schema;
pub mod trig;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::recode::{self, TidyRow};

pub use trig::DatasetMetadata;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write every output file under `out_dir`, creating it if absent
///
/// Emits, in order: `observations.csv`, its basic schema,
/// `observations-alt.csv` (pathified Measure Type), its fuller CSVW
/// metadata, and `dataset.trig`. Returns the paths written.
pub fn write_all(
    out_dir: &Path,
    rows: &[TidyRow],
    dataset: &DatasetMetadata,
) -> Result<Vec<PathBuf>, OutputError> {
    fs::create_dir_all(out_dir)?;

    let observations = out_dir.join("observations.csv");
    csv_writer::write_observations(&observations, rows)?;

    let observations_schema = out_dir.join("observations.csv-schema.json");
    schema::write_table_schema(&observations_schema, "observations.csv")?;

    let alt_rows = recode::with_pathified_measure_type(rows);
    let observations_alt = out_dir.join("observations-alt.csv");
    csv_writer::write_observations(&observations_alt, &alt_rows)?;

    let observations_alt_metadata = out_dir.join("observations-alt.csv-metadata.json");
    schema::write_csvw_metadata(&observations_alt_metadata, "observations-alt.csv", dataset)?;

    let dataset_trig = out_dir.join("dataset.trig");
    trig::write_trig(&dataset_trig, dataset)?;

    let written = vec![
        observations,
        observations_schema,
        observations_alt,
        observations_alt_metadata,
        dataset_trig,
    ];
    info!("Wrote {} output files to {}", written.len(), out_dir.display());
    Ok(written)
}
