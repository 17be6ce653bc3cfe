//! Categorical recoding: raw spreadsheet labels to the fixed output
//! vocabulary, and the composite-code split into its four facets.

use serde::Serialize;
use thiserror::Error;

use crate::importers::workbook_importer::Observation;
use crate::utils::pathify;

pub const MEASURE_TYPE: &str = "Count";
pub const UNIT: &str = "people-thousands";

#[derive(Error, Debug)]
pub enum RecodeError {
    #[error("Country header {0:?} does not pathify to resc-…-est")]
    MalformedCountry(String),

    #[error("Composite code {code:?} has {found} facets, expected 4")]
    FacetCount { code: String, found: usize },

    #[error("Unknown sex label: {0:?}")]
    UnknownSex(String),

    #[error("Citizenship label {0:?} is missing the \"All \" prefix")]
    MalformedCitizenship(String),

    #[error("Age band label too short: {0:?}")]
    MalformedAge(String),
}

/// One row of the tidy output table, in CSV column order
#[derive(Debug, Clone, Serialize)]
pub struct TidyRow {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Country of Residence")]
    pub country_of_residence: String,
    #[serde(rename = "Migration Flow")]
    pub migration_flow: String,
    #[serde(rename = "IPS Citizenship")]
    pub ips_citizenship: String,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Measure Type")]
    pub measure_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "IPS Marker")]
    pub ips_marker: String,
    #[serde(rename = "CI")]
    pub ci: String,
    #[serde(rename = "Unit")]
    pub unit: String,
}

// One-off label corrections applied after the mechanical strip.
const COUNTRY_OVERRIDES: &[(&str, &str)] = &[("bahamas-the", "bahamas")];

// IPS data markers as published, and their stable identifiers.
const MARKER_CODES: &[(&str, &str)] = &[
    ("z", "not-applicable"),
    (".", "no-contact"),
    ("0~", "rounds-to-zero"),
];

/// Country identifier from a column header such as "Resc Bahamas, The Est"
///
/// The pathified header must carry the `resc-` prefix and `-est` suffix;
/// anything else aborts the run. Slash-separated country pairs
/// ("Serbia / Montenegro") collapse to a single hyphen.
pub fn residence_country_code(label: &str) -> Result<String, RecodeError> {
    let slug = pathify(label);
    let code = slug
        .strip_prefix("resc-")
        .and_then(|s| s.strip_suffix("-est"))
        .ok_or_else(|| RecodeError::MalformedCountry(label.to_string()))?;
    let code = code.replace("-/-", "-");

    Ok(lookup(COUNTRY_OVERRIDES, &code).unwrap_or(code))
}

/// Split "<flow>, <citizenship>, <sex>, <age>" into its four facets
fn split_code(code: &str) -> Result<[&str; 4], RecodeError> {
    let parts: Vec<&str> = code.split(", ").collect();
    <[&str; 4]>::try_from(parts).map_err(|parts| RecodeError::FacetCount {
        code: code.to_string(),
        found: parts.len(),
    })
}

fn recode_sex(raw: &str) -> Result<&'static str, RecodeError> {
    match raw {
        "Female" => Ok("F"),
        "Male" => Ok("M"),
        "Persons" => Ok("T"),
        other => Err(RecodeError::UnknownSex(other.to_string())),
    }
}

fn recode_citizenship(raw: &str) -> Result<String, RecodeError> {
    raw.strip_prefix("All ")
        .map(pathify)
        .ok_or_else(|| RecodeError::MalformedCitizenship(raw.to_string()))
}

/// "Age All" becomes `all`; band labels like "Age 15-24" become `age/15-24`
fn recode_age(raw: &str) -> Result<String, RecodeError> {
    if raw == "Age All" {
        return Ok("all".to_string());
    }
    match (raw.get(..3), raw.get(4..)) {
        (Some(prefix), Some(band)) if !band.is_empty() => {
            Ok(format!("{}/{}", pathify(prefix), pathify(band)))
        }
        _ => Err(RecodeError::MalformedAge(raw.to_string())),
    }
}

fn recode_marker(raw: &str) -> String {
    lookup(MARKER_CODES, raw).unwrap_or_else(|| raw.to_string())
}

fn lookup(table: &[(&str, &str)], key: &str) -> Option<String> {
    table
        .iter()
        .find(|(raw, _)| *raw == key)
        .map(|(_, coded)| coded.to_string())
}

/// Recode raw observations into tidy rows
///
/// Applies the facet split and every categorical recode; the first
/// malformed label aborts the whole batch.
pub fn tidy_observations(observations: &[Observation]) -> Result<Vec<TidyRow>, RecodeError> {
    let mut rows = Vec::with_capacity(observations.len());

    for obs in observations {
        let [flow, citizenship, sex, age] = split_code(&obs.code)?;

        rows.push(TidyRow {
            year: obs.year,
            country_of_residence: residence_country_code(&obs.country)?,
            migration_flow: pathify(flow),
            ips_citizenship: recode_citizenship(citizenship)?,
            sex: recode_sex(sex)?.to_string(),
            age: recode_age(age)?,
            measure_type: MEASURE_TYPE.to_string(),
            value: obs.value.map(|v| v.to_string()).unwrap_or_default(),
            ips_marker: obs.marker.as_deref().map(recode_marker).unwrap_or_default(),
            ci: obs.ci.clone().unwrap_or_default(),
            unit: UNIT.to_string(),
        });
    }

    Ok(rows)
}

/// The alternate output differs only in its normalized Measure Type label
pub fn with_pathified_measure_type(rows: &[TidyRow]) -> Vec<TidyRow> {
    rows.iter()
        .map(|row| TidyRow {
            measure_type: pathify(&row.measure_type),
            ..row.clone()
        })
        .collect()
}
