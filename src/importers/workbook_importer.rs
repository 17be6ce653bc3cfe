use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Failed to read sheet {sheet}: {msg}")]
    SheetRead { sheet: String, msg: String },

    #[error("Sheet {sheet}: no year value in cell A2")]
    MissingYear { sheet: String },

    #[error("Sheet {sheet}: cannot parse year from {value:?}")]
    InvalidYear { sheet: String, value: String },

    #[error("Sheet {sheet}: no country-of-residence headers in row 8")]
    NoObservationColumns { sheet: String },

    #[error("No Data sheets found in workbook")]
    NoDataSheets,
}

/// One estimate cell lifted out of the cross-tabulated sheet
///
/// `country` and `code` are the raw axis labels; recoding happens later.
/// Numeric cells carry `value`; data-marker cells (`z`, `.`, `0~`) carry
/// `marker` instead. `ci` is the confidence-interval cell directly right of
/// the estimate, rendered as written, when present.
#[derive(Debug, Clone)]
pub struct Observation {
    pub year: i32,
    pub country: String,
    pub code: String,
    pub value: Option<f64>,
    pub marker: Option<String>,
    pub ci: Option<String>,
}

/// The tidied contents of a single Data sheet
#[derive(Debug)]
pub struct SheetTable {
    pub name: String,
    pub observations: Vec<Observation>,
}

/// Only sheets named with this prefix carry data tables
pub const SHEET_PREFIX: &str = "Data";

// Fixed layout of every Data sheet (0-indexed row/col):
// A2 holds the year (last four characters), row 8 the country-of-residence
// headers from column G rightward, column F the composite codes for rows
// 9-1448. The published sheets say "import only rows 8 to 1448, starting at
// column F".
const YEAR_CELL: (u32, u32) = (1, 0);
const HEADER_ROW: u32 = 7;
const CODE_COL: u32 = 5;
const FIRST_DATA_ROW: u32 = 8;
const LAST_DATA_ROW: u32 = 1447;
const FIRST_OBS_COL: u32 = 6;

/// Parser for the IPS 4.01 workbook
pub struct WorkbookImporter {
    workbook_path: String,
}

impl WorkbookImporter {
    pub fn new(workbook_path: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    /// Parse every Data sheet in the workbook, in sheet order
    ///
    /// Sheets whose name does not start with `Data` (notes, contents,
    /// terminology) are skipped, not an error. A workbook with no Data sheet
    /// at all is an error.
    pub fn parse_workbook(&self) -> Result<Vec<SheetTable>, ImportError> {
        info!("Parsing workbook: {}", self.workbook_path);

        // Open workbook (this is synchronous, caller should use spawn_blocking)
        let mut workbook: Xlsx<BufReader<File>> = match open_workbook(&self.workbook_path) {
            Ok(wb) => wb,
            Err(e) => return Err(ImportError::WorkbookOpen(e.to_string())),
        };

        let sheet_names = workbook.sheet_names().to_owned();
        debug!("Found {} sheets", sheet_names.len());

        let mut tables = Vec::new();
        for sheet_name in sheet_names {
            if !sheet_name.starts_with(SHEET_PREFIX) {
                debug!("Skipping non-data sheet: {}", sheet_name);
                continue;
            }

            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    return Err(ImportError::SheetRead {
                        sheet: sheet_name,
                        msg: format!("{e:?}"),
                    })
                }
            };

            let observations = reshape_data_sheet(&range, &sheet_name)?;
            info!(
                "Sheet {}: {} observations",
                sheet_name,
                observations.len()
            );
            tables.push(SheetTable {
                name: sheet_name,
                observations,
            });
        }

        if tables.is_empty() {
            return Err(ImportError::NoDataSheets);
        }

        info!(
            "Parsed {} data sheets, {} observations total",
            tables.len(),
            tables.iter().map(|t| t.observations.len()).sum::<usize>()
        );
        Ok(tables)
    }
}

/// An estimate column together with its paired CI column, if any
struct EstimateColumn {
    col: u32,
    label: String,
    ci_col: Option<u32>,
}

/// Reshape one Data sheet into long-format observations
///
/// One `Observation` per non-blank estimate cell in the data rectangle. Rows
/// with a blank code cell are skipped. Estimate columns missing a CI
/// neighbour produce observations with `ci: None`.
pub fn reshape_data_sheet(
    range: &Range<Data>,
    sheet: &str,
) -> Result<Vec<Observation>, ImportError> {
    let year = read_year(range, sheet)?;
    let columns = estimate_columns(range, sheet)?;

    let Some((end_row, _)) = range.end() else {
        return Err(ImportError::NoObservationColumns {
            sheet: sheet.to_string(),
        });
    };
    let last_row = end_row.min(LAST_DATA_ROW);

    let mut observations = Vec::new();
    for row in FIRST_DATA_ROW..=last_row {
        let Some(code) = cell_string(range, (row, CODE_COL)) else {
            continue;
        };

        for column in &columns {
            let (value, marker) = match range.get_value((row, column.col)) {
                Some(Data::Float(f)) => (Some(*f), None),
                Some(Data::Int(i)) => (Some(*i as f64), None),
                Some(Data::String(s)) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match trimmed.parse::<f64>() {
                        Ok(v) => (Some(v), None),
                        Err(_) => (None, Some(trimmed.to_string())),
                    }
                }
                _ => continue,
            };

            let ci = column
                .ci_col
                .and_then(|ci_col| cell_string(range, (row, ci_col)));

            observations.push(Observation {
                year,
                country: column.label.clone(),
                code: code.clone(),
                value,
                marker,
                ci,
            });
        }
    }

    Ok(observations)
}

/// Year from A2: the last four characters of e.g. "Year ending Dec 2015"
fn read_year(range: &Range<Data>, sheet: &str) -> Result<i32, ImportError> {
    let raw = cell_string(range, YEAR_CELL).ok_or_else(|| ImportError::MissingYear {
        sheet: sheet.to_string(),
    })?;

    let start = raw.len().saturating_sub(4);
    raw.get(start..)
        .and_then(|tail| tail.trim().parse::<i32>().ok())
        .ok_or_else(|| ImportError::InvalidYear {
            sheet: sheet.to_string(),
            value: raw.clone(),
        })
}

/// Headed observation columns in row 8, split estimate vs. CI
///
/// CI columns are those whose header carries a trailing `CI` marker; each
/// estimate column pairs with the CI column directly to its right, when that
/// neighbour exists.
fn estimate_columns(range: &Range<Data>, sheet: &str) -> Result<Vec<EstimateColumn>, ImportError> {
    let ci_pattern = Regex::new(r"^.*CI\s*$").expect("static pattern");

    let Some((_, end_col)) = range.end() else {
        return Err(ImportError::NoObservationColumns {
            sheet: sheet.to_string(),
        });
    };

    let mut headers = Vec::new();
    for col in FIRST_OBS_COL..=end_col {
        if let Some(label) = cell_string(range, (HEADER_ROW, col)) {
            headers.push((col, label));
        }
    }

    let mut columns = Vec::new();
    for (col, label) in &headers {
        if ci_pattern.is_match(label) {
            continue;
        }
        let ci_col = headers
            .iter()
            .find(|(c, l)| *c == col + 1 && ci_pattern.is_match(l))
            .map(|(c, _)| *c);
        if ci_col.is_none() {
            warn!("Sheet {}: estimate column {:?} has no CI neighbour", sheet, label);
        }
        columns.push(EstimateColumn {
            col: *col,
            label: label.clone(),
            ci_col,
        });
    }

    if columns.is_empty() {
        return Err(ImportError::NoObservationColumns {
            sheet: sheet.to_string(),
        });
    }
    Ok(columns)
}

/// Non-blank cell content as a trimmed string
///
/// Floats use Rust's shortest-roundtrip formatting, so a whole-number CI
/// prints without a trailing `.0`; marker strings pass through as written.
fn cell_string(range: &Range<Data>, position: (u32, u32)) -> Option<String> {
    match range.get_value(position) {
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Data::Int(i)) => Some(i.to_string()),
        Some(Data::Float(f)) => Some(f.to_string()),
        _ => None,
    }
}
