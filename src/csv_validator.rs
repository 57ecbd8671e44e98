//! RetinaNet CSV annotation validation

use csv::{ReaderBuilder, StringRecord};
use log::warn;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, Result};
use crate::types::{FlatRow, PixelBox};

/// Number of errors shown when a report is printed.
pub const MAX_REPORTED_ERRORS: usize = 10;

const FIELD_COUNT: usize = 6;

/// Row counts and errors for one annotation CSV.
#[derive(Debug, Default)]
pub struct CsvReport {
    pub path: PathBuf,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub errors: Vec<DatasetError>,
}

impl CsvReport {
    pub fn invalid_rows(&self) -> usize {
        self.total_rows - self.valid_rows
    }

    /// The errors that are printed; the rest are summarised as a count.
    pub fn example_errors(&self) -> &[DatasetError] {
        &self.errors[..self.errors.len().min(MAX_REPORTED_ERRORS)]
    }
}

impl fmt::Display for CsvReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation results for {}:", self.path.display())?;
        writeln!(f, "  Total rows: {}", self.total_rows)?;
        writeln!(f, "  Valid rows: {}", self.valid_rows)?;
        writeln!(f, "  Errors: {}", self.errors.len())?;
        if !self.errors.is_empty() {
            writeln!(f, "  Example errors:")?;
            for error in self.example_errors() {
                writeln!(f, "    - {}", error)?;
            }
        }
        if self.errors.len() > MAX_REPORTED_ERRORS {
            writeln!(
                f,
                "    ...and {} more errors.",
                self.errors.len() - MAX_REPORTED_ERRORS
            )?;
        }
        Ok(())
    }
}

fn parse_coordinate(value: &str, location: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| DatasetError::parse(location, value))
}

fn record_fields(record: &StringRecord) -> Vec<&str> {
    record.iter().collect()
}

/// Validate one CSV row, stopping at the first failed check.
pub fn validate_row(
    record: &StringRecord,
    row_num: usize,
    valid_classes: &BTreeSet<String>,
) -> Result<FlatRow> {
    let location = format!("Row {}", row_num);
    if record.len() != FIELD_COUNT {
        return Err(DatasetError::schema(
            location,
            format!(
                "incorrect number of columns ({}, expected {}): {:?}",
                record.len(),
                FIELD_COUNT,
                record_fields(record)
            ),
        ));
    }

    let image_path = PathBuf::from(&record[0]);
    if !image_path.exists() {
        return Err(DatasetError::missing(
            format!("{}: Image file", location),
            image_path,
        ));
    }

    let x1 = parse_coordinate(&record[1], &location)?;
    let y1 = parse_coordinate(&record[2], &location)?;
    let x2 = parse_coordinate(&record[3], &location)?;
    let y2 = parse_coordinate(&record[4], &location)?;
    let bbox = PixelBox { x1, y1, x2, y2 };
    if !is_valid_box(&bbox) {
        return Err(DatasetError::bounds(
            location,
            format!("invalid bounding box {}", bbox),
        ));
    }

    let class_name = &record[5];
    if !valid_classes.contains(class_name) {
        return Err(DatasetError::class(location, class_name));
    }

    Ok(FlatRow {
        image_path,
        bbox,
        class_name: class_name.to_string(),
    })
}

/// Corners ordered and non-negative; no upper bound is applied.
pub fn is_valid_box(bbox: &PixelBox) -> bool {
    bbox.x1 < bbox.x2 && bbox.y1 < bbox.y2 && bbox.x1 >= 0 && bbox.y1 >= 0 && bbox.x2 >= 0 && bbox.y2 >= 0
}

/// Parse one physical line as a CSV record. A blank line is an empty record.
fn parse_line(line: &str) -> std::result::Result<StringRecord, csv::Error> {
    let mut record = StringRecord::new();
    if line.is_empty() {
        return Ok(record);
    }
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .read_record(&mut record)?;
    Ok(record)
}

/// Validate every row of a headerless annotation CSV.
///
/// Rows are physical lines numbered from 1; a blank line is a row with no
/// fields. Row errors are collected into the report. Only a missing or
/// unreadable file is returned as an error.
pub fn validate_csv(path: &Path, valid_classes: &BTreeSet<String>) -> Result<CsvReport> {
    if !path.is_file() {
        return Err(DatasetError::missing("File", path));
    }
    let content = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;

    let mut report = CsvReport {
        path: path.to_path_buf(),
        ..Default::default()
    };

    for (index, line) in content.lines().enumerate() {
        let row_num = index + 1;
        report.total_rows += 1;
        let outcome = match parse_line(line) {
            Ok(record) => validate_row(&record, row_num, valid_classes),
            Err(e) => Err(DatasetError::schema(
                format!("Row {}", row_num),
                format!("unreadable row: {}", e),
            )),
        };
        match outcome {
            Ok(_) => report.valid_rows += 1,
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                report.errors.push(e);
            }
        }
    }

    Ok(report)
}
