//! Trig provenance for the dataset
//!
//! A fixed template rather than an RDF library: the graph is small and its
//! shape never changes between runs.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::Path;

use crate::output::schema::{DATASET_BASE_PATH, DATASET_BASE_URL};
use crate::output::OutputError;

const GRAPH_BASE: &str = "http://gss-data.org.uk/graph/";
const THEME_POPULATION: &str =
    "http://gss-data.org.uk/def/concept/statistics-authority-themes/population";
const PUBLISHER_ONS: &str =
    "https://www.gov.uk/government/organisations/office-for-national-statistics";

/// Provenance fields carried into `dataset.trig` and the CSVW metadata
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    pub title: String,
    pub publisher: String,
    pub landing_page: String,
    pub distribution_url: Option<String>,
    pub family: String,
    pub theme: String,
    pub modified: DateTime<Utc>,
}

impl DatasetMetadata {
    /// Metadata for the IPS 4.01 dataset as published
    pub fn ips_4_01(distribution_url: Option<String>, modified: DateTime<Utc>) -> Self {
        Self {
            title: "International Passenger Survey 4.01, citizenship group by sex by age \
by country of last or next residence"
                .to_string(),
            publisher: PUBLISHER_ONS.to_string(),
            landing_page: format!(
                "https://www.ons.gov.uk{}",
                crate::importers::downloader::DATASET_PATH
            ),
            distribution_url,
            family: "migration".to_string(),
            theme: THEME_POPULATION.to_string(),
            modified,
        }
    }
}

pub fn write_trig(path: &Path, dataset: &DatasetMetadata) -> Result<(), OutputError> {
    fs::write(path, render_trig(dataset))?;
    Ok(())
}

fn render_trig(dataset: &DatasetMetadata) -> String {
    let dataset_iri = format!("{DATASET_BASE_URL}{DATASET_BASE_PATH}");
    let graph_iri = format!("{GRAPH_BASE}{DATASET_BASE_PATH}-metadata");
    let modified = dataset
        .modified
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut statements = vec![
        format!("        dct:title {} ;", quote(&dataset.title)),
        format!("        dct:publisher <{}> ;", dataset.publisher),
        format!(
            "        dct:modified \"{modified}\"^^xsd:dateTime ;"
        ),
        format!("        dcat:landingPage <{}> ;", dataset.landing_page),
        format!("        dcat:theme <{}> ;", dataset.theme),
    ];
    if let Some(distribution) = &dataset.distribution_url {
        statements.push(format!("        dcat:distribution <{distribution}> ;"));
    }
    statements.push(format!("        gdp:family gdp:{} .", dataset.family));

    format!(
        "@prefix dcat: <http://www.w3.org/ns/dcat#> .\n\
@prefix dct: <http://purl.org/dc/terms/> .\n\
@prefix gdp: <http://gss-data.org.uk/def/gdp#> .\n\
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
\n\
<{graph_iri}> {{\n\
    <{dataset_iri}> a dcat:Dataset ;\n\
{}\n\
}}\n",
        statements.join("\n")
    )
}

fn quote(literal: &str) -> String {
    format!("\"{}\"", literal.replace('\\', "\\\\").replace('"', "\\\""))
}
