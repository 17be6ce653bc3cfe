//! CSVW schema documents for the observations files
//!
//! Two variants, mirroring the two published metadata files: a basic table
//! schema (column names, titles, datatypes) and a fuller metadata document
//! that binds each column to its vocabulary component and carries the
//! dataset provenance block.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::output::trig::DatasetMetadata;
use crate::output::OutputError;

const REF_BASE: &str = "https://ons-opendata.github.io/ref_migration/";
pub const DATASET_BASE_URL: &str = "http://gss-data.org.uk/data/";
pub const DATASET_BASE_PATH: &str = "gss_data/migration/ons-ltim-passenger-survey-4-01";

struct ColumnSpec {
    title: &'static str,
    name: &'static str,
    datatype: &'static str,
    required: bool,
    property_url: &'static str,
    value_url: Option<&'static str>,
}

// One entry per output column, in CSV order. The component URIs follow the
// migration reference vocabulary; SDMX dimensions/attributes are used where
// a standard component exists.
const COLUMNS: [ColumnSpec; 11] = [
    ColumnSpec {
        title: "Year",
        name: "year",
        datatype: "integer",
        required: true,
        property_url: "http://purl.org/linked-data/sdmx/2009/dimension#refPeriod",
        value_url: Some("http://reference.data.gov.uk/id/year/{year}"),
    },
    ColumnSpec {
        title: "Country of Residence",
        name: "country_of_residence",
        datatype: "string",
        required: true,
        property_url: "http://gss-data.org.uk/def/dimension/country-of-residence",
        value_url: Some(
            "http://gss-data.org.uk/def/concept/country-of-residence/{country_of_residence}",
        ),
    },
    ColumnSpec {
        title: "Migration Flow",
        name: "migration_flow",
        datatype: "string",
        required: true,
        property_url: "http://gss-data.org.uk/def/dimension/migration-flow",
        value_url: Some("http://gss-data.org.uk/def/concept/migration-flow/{migration_flow}"),
    },
    ColumnSpec {
        title: "IPS Citizenship",
        name: "ips_citizenship",
        datatype: "string",
        required: true,
        property_url: "http://gss-data.org.uk/def/dimension/ips-citizenship",
        value_url: Some("http://gss-data.org.uk/def/concept/ips-citizenship/{ips_citizenship}"),
    },
    ColumnSpec {
        title: "Sex",
        name: "sex",
        datatype: "string",
        required: true,
        property_url: "http://purl.org/linked-data/sdmx/2009/dimension#sex",
        value_url: Some("http://purl.org/linked-data/sdmx/2009/code#sex-{sex}"),
    },
    ColumnSpec {
        title: "Age",
        name: "age",
        datatype: "string",
        required: true,
        property_url: "http://gss-data.org.uk/def/dimension/age",
        value_url: Some("http://gss-data.org.uk/def/concept/age/{age}"),
    },
    ColumnSpec {
        title: "Measure Type",
        name: "measure_type",
        datatype: "string",
        required: true,
        property_url: "http://purl.org/linked-data/cube#measureType",
        value_url: Some("http://gss-data.org.uk/def/measure/{measure_type}"),
    },
    ColumnSpec {
        title: "Value",
        name: "value",
        datatype: "number",
        required: false,
        property_url: "http://gss-data.org.uk/def/measure/count",
        value_url: None,
    },
    ColumnSpec {
        title: "IPS Marker",
        name: "ips_marker",
        datatype: "string",
        required: false,
        property_url: "http://gss-data.org.uk/def/attribute/ips-marker",
        value_url: Some("http://gss-data.org.uk/def/concept/ips-marker/{ips_marker}"),
    },
    ColumnSpec {
        title: "CI",
        name: "ci",
        datatype: "string",
        required: false,
        property_url: "http://gss-data.org.uk/def/attribute/confidence-interval",
        value_url: None,
    },
    ColumnSpec {
        title: "Unit",
        name: "unit",
        datatype: "string",
        required: true,
        property_url: "http://purl.org/linked-data/sdmx/2009/attribute#unitMeasure",
        value_url: Some("http://gss-data.org.uk/def/concept/measurement-units/{unit}"),
    },
];

/// Row identifier template: one IRI per dimension combination
fn about_url() -> String {
    format!(
        "{DATASET_BASE_URL}{DATASET_BASE_PATH}/{{year}}/{{country_of_residence}}/\
{{migration_flow}}/{{ips_citizenship}}/{{sex}}/{{age}}"
    )
}

/// Basic table schema: names, titles, datatypes, required flags
pub fn write_table_schema(path: &Path, csv_file: &str) -> Result<(), OutputError> {
    let columns: Vec<Value> = COLUMNS
        .iter()
        .map(|c| {
            json!({
                "titles": c.title,
                "name": c.name,
                "datatype": c.datatype,
                "required": c.required,
            })
        })
        .collect();

    let document = json!({
        "@context": "http://www.w3.org/ns/csvw",
        "url": csv_file,
        "tableSchema": { "columns": columns },
    });

    write_json(path, &document)
}

/// Full CSVW metadata: component bindings, row template, and provenance
pub fn write_csvw_metadata(
    path: &Path,
    csv_file: &str,
    dataset: &DatasetMetadata,
) -> Result<(), OutputError> {
    let columns: Vec<Value> = COLUMNS
        .iter()
        .map(|c| {
            let mut column = json!({
                "titles": c.title,
                "name": c.name,
                "datatype": c.datatype,
                "required": c.required,
                "propertyUrl": c.property_url,
            });
            if let Some(value_url) = c.value_url {
                column["valueUrl"] = json!(value_url);
            }
            column
        })
        .collect();

    let mut provenance = json!({
        "dct:title": dataset.title,
        "dct:publisher": dataset.publisher,
        "dcat:landingPage": dataset.landing_page,
        "gdp:family": dataset.family,
        "dcat:theme": dataset.theme,
        "prov:wasGeneratedBy": {
            "prov:wasAssociatedWith": format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        },
    });
    if let Some(source) = &dataset.distribution_url {
        provenance["prov:wasDerivedFrom"] = json!(source);
    }

    let document = json!({
        "@context": "http://www.w3.org/ns/csvw",
        "@id": format!("{DATASET_BASE_URL}{DATASET_BASE_PATH}"),
        "url": csv_file,
        "tableSchema": {
            "columns": columns,
            "aboutUrl": about_url(),
        },
        "dcat:dataset": provenance,
    });

    write_json(path, &document)
}

fn write_json(path: &Path, document: &Value) -> Result<(), OutputError> {
    let mut rendered = serde_json::to_string_pretty(document)?;
    rendered.push('\n');
    fs::write(path, rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dataset() -> DatasetMetadata {
        DatasetMetadata::ips_4_01(
            Some("https://www.ons.gov.uk/file/ips2018.xlsx".to_string()),
            Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_table_schema_lists_all_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.csv-schema.json");
        write_table_schema(&path, "observations.csv").unwrap();

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let columns = document["tableSchema"]["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 11);
        assert_eq!(columns[0]["titles"], "Year");
        assert_eq!(columns[10]["titles"], "Unit");
        assert_eq!(document["url"], "observations.csv");
    }

    #[test]
    fn test_csvw_metadata_binds_components() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations-alt.csv-metadata.json");
        write_csvw_metadata(&path, "observations-alt.csv", &dataset()).unwrap();

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let columns = document["tableSchema"]["columns"].as_array().unwrap();

        let sex = columns.iter().find(|c| c["name"] == "sex").unwrap();
        assert_eq!(
            sex["propertyUrl"],
            "http://purl.org/linked-data/sdmx/2009/dimension#sex"
        );

        let value = columns.iter().find(|c| c["name"] == "value").unwrap();
        assert!(value.get("valueUrl").is_none());

        let about = document["tableSchema"]["aboutUrl"].as_str().unwrap();
        assert!(about.contains("{year}"));
        assert!(about.ends_with("{age}"));

        assert_eq!(document["dcat:dataset"]["gdp:family"], "migration");
        assert_eq!(
            document["dcat:dataset"]["prov:wasDerivedFrom"],
            "https://www.ons.gov.uk/file/ips2018.xlsx"
        );
    }
}
