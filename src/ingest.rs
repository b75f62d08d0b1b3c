//! Tabular input contract for the classification pipeline.
//!
//! The upstream upload/validation layer hands the core a table with columns
//! `Name`, `RT`, `Volume`, `Log P`, `Anchor`. This module reads that contract
//! from CSV/TSV into [`RawRecord`]s. Structural problems with the table
//! (missing columns, non-numeric cells, negative intensities) are contract
//! violations and surface as [`IngestError`]; chemically poor but well-formed
//! rows are the pipeline's job, not this module's.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors returned when the input table violates the ingestion contract.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A required column is missing from the header row.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A cell could not be parsed into the column's type.
    #[error("row {row}: invalid {column} value {value:?}")]
    InvalidField {
        /// 1-based data row number (excluding the header).
        row: usize,
        /// Column name from the contract.
        column: &'static str,
        /// Offending cell content.
        value: String,
    },

    /// A row has fewer cells than the header declares.
    #[error("row {row}: expected {expected} fields, found {found}")]
    ShortRow {
        /// 1-based data row number (excluding the header).
        row: usize,
        /// Number of header columns.
        expected: usize,
        /// Number of cells present.
        found: usize,
    },

    /// Error from the CSV parser.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while reading the table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One unprocessed row of the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Raw compound identifier, e.g. `GD1(36:1;O2)`.
    pub name: String,
    /// Retention time in minutes.
    pub retention_time: f64,
    /// Signal intensity (the `Volume` column). Must be non-negative.
    pub volume: f64,
    /// Hydrophobicity descriptor (the `Log P` column).
    pub log_p: f64,
    /// `T` when the compound's identity is independently confirmed.
    pub is_anchor: bool,
}

/// Column indices resolved from the header row.
struct ColumnLayout {
    name: usize,
    rt: usize,
    volume: usize,
    log_p: usize,
    anchor: usize,
    width: usize,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let find = |names: &[&str]| -> Option<usize> {
            normalized
                .iter()
                .position(|h| names.iter().any(|n| h == *n))
        };

        let missing = |column: &str| IngestError::MissingColumn(column.to_string());

        Ok(Self {
            name: find(&["name"]).ok_or_else(|| missing("Name"))?,
            rt: find(&["rt", "retention time"]).ok_or_else(|| missing("RT"))?,
            volume: find(&["volume", "intensity"]).ok_or_else(|| missing("Volume"))?,
            log_p: find(&["log p", "logp"]).ok_or_else(|| missing("Log P"))?,
            anchor: find(&["anchor"]).ok_or_else(|| missing("Anchor"))?,
            width: normalized.len(),
        })
    }
}

/// Read records from a CSV file path. The delimiter is inferred from the
/// extension: `.tsv`/`.txt` are tab-separated, anything else comma-separated.
pub fn read_records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>, IngestError> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") | Some("txt") => b'\t',
        _ => b',',
    };
    let file = File::open(path)?;
    read_records_with_delimiter(BufReader::new(file), delimiter)
}

/// Read comma-separated records from any reader.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, IngestError> {
    read_records_with_delimiter(reader, b',')
}

/// Read records with an explicit delimiter.
pub fn read_records_with_delimiter<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<Vec<RawRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let layout = ColumnLayout::resolve(csv_reader.headers()?)?;

    let mut records = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = i + 1;

        if record.len() < layout.width {
            return Err(IngestError::ShortRow {
                row,
                expected: layout.width,
                found: record.len(),
            });
        }

        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        records.push(RawRecord {
            name: cell(layout.name).to_string(),
            retention_time: parse_float(cell(layout.rt), row, "RT")?,
            volume: parse_volume(cell(layout.volume), row)?,
            log_p: parse_float(cell(layout.log_p), row, "Log P")?,
            is_anchor: parse_anchor(cell(layout.anchor), row)?,
        });
    }

    log::debug!("ingested {} records", records.len());
    Ok(records)
}

fn parse_float(value: &str, row: usize, column: &'static str) -> Result<f64, IngestError> {
    let parsed: f64 = value.parse().map_err(|_| IngestError::InvalidField {
        row,
        column,
        value: value.to_string(),
    })?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(IngestError::InvalidField {
            row,
            column,
            value: value.to_string(),
        })
    }
}

fn parse_volume(value: &str, row: usize) -> Result<f64, IngestError> {
    let volume = parse_float(value, row, "Volume")?;
    if volume < 0.0 {
        return Err(IngestError::InvalidField {
            row,
            column: "Volume",
            value: value.to_string(),
        });
    }
    Ok(volume)
}

fn parse_anchor(value: &str, row: usize) -> Result<bool, IngestError> {
    match value {
        "T" | "t" | "TRUE" | "true" | "True" => Ok(true),
        "F" | "f" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(IngestError::InvalidField {
            row,
            column: "Anchor",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Name,RT,Volume,Log P,Anchor
GD1(36:1;O2),10.5,120000,4.2,T
GM3(34:1;O2),8.1,54000,3.1,F
";

    #[test]
    fn reads_well_formed_table() {
        let records = read_records(TABLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "GD1(36:1;O2)");
        assert_eq!(records[0].retention_time, 10.5);
        assert!(records[0].is_anchor);
        assert!(!records[1].is_anchor);
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let table = "name,rt,volume,log p,anchor\nGD1(36:1;O2),1.0,2.0,3.0,F\n";
        let records = read_records(table.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_column_is_reported() {
        let table = "Name,RT,Volume,Anchor\nGD1(36:1;O2),1.0,2.0,T\n";
        let err = read_records(table.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(c) if c == "Log P"));
    }

    #[test]
    fn invalid_rt_is_reported_with_row() {
        let table = "Name,RT,Volume,Log P,Anchor\nGD1(36:1;O2),abc,2.0,3.0,T\n";
        let err = read_records(table.as_bytes()).unwrap_err();
        match err {
            IngestError::InvalidField { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "RT");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_volume_is_rejected() {
        let table = "Name,RT,Volume,Log P,Anchor\nGD1(36:1;O2),1.0,-5.0,3.0,T\n";
        let err = read_records(table.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidField { column: "Volume", .. }
        ));
    }

    #[test]
    fn tsv_delimiter() {
        let table = "Name\tRT\tVolume\tLog P\tAnchor\nGD1(36:1;O2)\t1.0\t2.0\t3.0\tT\n";
        let records = read_records_with_delimiter(table.as_bytes(), b'\t').unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_anchor);
    }
}
