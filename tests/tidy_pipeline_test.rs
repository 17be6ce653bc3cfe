// End-to-end transform tests: reshape fixture -> recode -> write outputs

use calamine::{Data, Range};
use chrono::{TimeZone, Utc};
use std::path::Path;

use ips_tidy::importers::workbook_importer::reshape_data_sheet;
use ips_tidy::output::{self, DatasetMetadata};
use ips_tidy::recode::{self, RecodeError, TidyRow};

fn fixture_range() -> Range<Data> {
    let mut range: Range<Data> = Range::new((0, 0), (12, 9));
    let mut set = |pos: (u32, u32), value: Data| range.set_value(pos, value);

    set((1, 0), Data::String("Year ending Dec 2015".to_string()));

    set((7, 6), Data::String("Resc Algeria Est".to_string()));
    set((7, 7), Data::String("Resc Algeria CI".to_string()));
    set((7, 8), Data::String("Resc Bahamas, The Est".to_string()));
    set((7, 9), Data::String("Resc Bahamas, The CI".to_string()));

    set(
        (8, 5),
        Data::String("Inflow, All British, Female, Age 15-24".to_string()),
    );
    set(
        (9, 5),
        Data::String("Outflow, All EU, Persons, Age All".to_string()),
    );

    set((8, 6), Data::Float(12.4));
    set((8, 7), Data::Float(3.1));
    set((8, 8), Data::Float(5.0));
    set((8, 9), Data::Float(1.2));

    set((9, 6), Data::String("z".to_string()));
    set((9, 7), Data::String("z".to_string()));
    set((9, 8), Data::Float(9.5));
    set((9, 9), Data::Float(2.5));

    range
}

fn tidy_rows() -> Vec<TidyRow> {
    let observations = reshape_data_sheet(&fixture_range(), "Data1").unwrap();
    recode::tidy_observations(&observations).unwrap()
}

fn dataset() -> DatasetMetadata {
    DatasetMetadata::ips_4_01(
        Some("https://www.ons.gov.uk/file/ips2018.xlsx".to_string()),
        Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap(),
    )
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_no_raw_labels_survive_recoding() {
    let rows = tidy_rows();

    for row in &rows {
        assert!(!row.country_of_residence.contains("Resc"));
        assert!(["F", "M", "T"].contains(&row.sex.as_str()));
        assert!(row.age == "all" || row.age.starts_with("age/"));
        assert!(row.migration_flow.chars().all(|c| c.is_ascii_lowercase()));
    }

    // The fixture's "z" marker is recoded, not passed through
    let marker_row = rows.iter().find(|r| !r.ips_marker.is_empty()).unwrap();
    assert_eq!(marker_row.ips_marker, "not-applicable");
    assert_eq!(marker_row.value, "");
}

#[test]
fn test_bahamas_override_applies() {
    let rows = tidy_rows();
    assert!(rows
        .iter()
        .any(|r| r.country_of_residence == "bahamas"));
    assert!(rows
        .iter()
        .all(|r| r.country_of_residence != "bahamas-the"));
}

#[test]
fn test_three_facet_code_aborts() {
    let mut observations = reshape_data_sheet(&fixture_range(), "Data1").unwrap();
    observations[0].code = "Inflow, All British, Female".to_string();

    match recode::tidy_observations(&observations) {
        Err(RecodeError::FacetCount { found, .. }) => assert_eq!(found, 3),
        other => panic!("Expected FacetCount error, got {other:?}"),
    }
}

#[test]
fn test_write_all_emits_five_files() {
    let dir = tempfile::tempdir().unwrap();
    let written = output::write_all(dir.path(), &tidy_rows(), &dataset()).unwrap();

    assert_eq!(written.len(), 5);
    for path in &written {
        assert!(path.exists(), "missing output: {}", path.display());
    }

    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "observations.csv",
            "observations.csv-schema.json",
            "observations-alt.csv",
            "observations-alt.csv-metadata.json",
            "dataset.trig",
        ]
    );
}

#[test]
fn test_csv_column_order_and_contents() {
    let dir = tempfile::tempdir().unwrap();
    output::write_all(dir.path(), &tidy_rows(), &dataset()).unwrap();

    let records = read_csv(&dir.path().join("observations.csv"));
    assert_eq!(
        records[0],
        vec![
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
        ]
    );

    // First observation: Algeria inflow estimate with its CI
    assert_eq!(
        records[1],
        vec![
            "2015",
            "algeria",
            "inflow",
            "british",
            "F",
            "age/15-24",
            "Count",
            "12.4",
            "",
            "3.1",
            "people-thousands",
        ]
    );

    // One data row per fixture observation
    assert_eq!(records.len() - 1, 4);
}

#[test]
fn test_alt_csv_differs_only_in_measure_type() {
    let dir = tempfile::tempdir().unwrap();
    output::write_all(dir.path(), &tidy_rows(), &dataset()).unwrap();

    let base = read_csv(&dir.path().join("observations.csv"));
    let alt = read_csv(&dir.path().join("observations-alt.csv"));

    assert_eq!(base.len(), alt.len());
    for (base_row, alt_row) in base.iter().zip(alt.iter()).skip(1) {
        assert_eq!(base_row[6], "Count");
        assert_eq!(alt_row[6], "count");
        for col in (0..11).filter(|&c| c != 6) {
            assert_eq!(base_row[col], alt_row[col]);
        }
    }
}

#[test]
fn test_rerun_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    output::write_all(first.path(), &tidy_rows(), &dataset()).unwrap();
    output::write_all(second.path(), &tidy_rows(), &dataset()).unwrap();

    for name in [
        "observations.csv",
        "observations.csv-schema.json",
        "observations-alt.csv",
        "observations-alt.csv-metadata.json",
        "dataset.trig",
    ] {
        let a = std::fs::read(first.path().join(name)).unwrap();
        let b = std::fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn test_schema_documents_parse_as_json() {
    let dir = tempfile::tempdir().unwrap();
    output::write_all(dir.path(), &tidy_rows(), &dataset()).unwrap();

    for name in [
        "observations.csv-schema.json",
        "observations-alt.csv-metadata.json",
    ] {
        let contents = std::fs::read_to_string(dir.path().join(name)).unwrap();
        let document: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(document["@context"], "http://www.w3.org/ns/csvw");
    }
}

#[test]
fn test_trig_names_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    output::write_all(dir.path(), &tidy_rows(), &dataset()).unwrap();

    let trig = std::fs::read_to_string(dir.path().join("dataset.trig")).unwrap();
    assert!(trig.contains("ons-ltim-passenger-survey-4-01"));
    assert!(trig.contains("a dcat:Dataset"));
    assert!(trig.contains("gdp:family gdp:migration"));
}
