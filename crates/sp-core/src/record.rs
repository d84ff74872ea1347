//! Per-group summary records.
//!
//! A summary file is whitespace-delimited text with eight float columns:
//!
//! ```text
//! minr maxr ca_ratio ba_ratio a center width mu
//! ```
//!
//! Row 0 holds the physical measurement of the group; every following row is
//! one randomized control realization. Blank lines and lines starting with
//! `#` are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sp_common::{Error, Host, Observable, Result};

use crate::logging::event_names;

/// Column names in file order.
pub const SUMMARY_COLUMNS: [&str; 8] = [
    "minr", "maxr", "ca_ratio", "ba_ratio", "a", "center", "width", "mu",
];

/// One parsed row of a summary file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub minr: f64,
    pub maxr: f64,
    pub ca_ratio: f64,
    pub ba_ratio: f64,
    pub a: f64,
    pub center: f64,
    pub width: f64,
    pub mu: f64,
}

impl SummaryRow {
    /// Build a row from values in file column order.
    pub fn from_columns(v: [f64; 8]) -> Self {
        SummaryRow {
            minr: v[0],
            maxr: v[1],
            ca_ratio: v[2],
            ba_ratio: v[3],
            a: v[4],
            center: v[5],
            width: v[6],
            mu: v[7],
        }
    }

    /// Value of an aggregated observable.
    pub fn get(&self, field: Observable) -> f64 {
        match field {
            Observable::Width => self.width,
            Observable::Mu => self.mu,
            Observable::A => self.a,
            Observable::BaRatio => self.ba_ratio,
            Observable::CaRatio => self.ca_ratio,
        }
    }
}

/// A summary file split into its physical row and its randomized controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub physical: SummaryRow,
    pub controls: Vec<SummaryRow>,
}

impl SummaryRecord {
    /// Total rows, physical included.
    pub fn rows(&self) -> usize {
        1 + self.controls.len()
    }

    /// The first `n_controls` control values of a field.
    ///
    /// Fails with `InsufficientData` when the file carries fewer controls;
    /// extra rows beyond `n_controls` are ignored.
    pub fn control_values(&self, field: Observable, n_controls: usize) -> Result<Vec<f64>> {
        if self.controls.len() < n_controls {
            return Err(Error::InsufficientData(format!(
                "{} randomized controls required, found {}",
                n_controls,
                self.controls.len()
            )));
        }
        Ok(self.controls[..n_controls]
            .iter()
            .map(|row| row.get(field))
            .collect())
    }
}

/// Path of a host's summary file for one group.
pub fn summary_path(dir: &Path, host: Host, group_id: u64, n_sat: u32) -> PathBuf {
    dir.join(format!("{}_group_{}_nsat_{}.dat", host.label(), group_id, n_sat))
}

/// Read and parse a summary file.
pub fn load_summary(path: &Path) -> Result<SummaryRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        line: None,
        message: format!("cannot read file: {}", e),
    })?;
    let record = parse_summary_content(&content, path)?;
    tracing::trace!(
        target: event_names::LOAD_SUMMARY_PARSED,
        path = %path.display(),
        rows = record.rows(),
        "Parsed summary file"
    );
    Ok(record)
}

/// Parse summary file content; `path` is only used for error reporting.
pub fn parse_summary_content(content: &str, path: &Path) -> Result<SummaryRecord> {
    let mut rows = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        rows.push(parse_row(trimmed).map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            line: Some(idx + 1),
            message,
        })?);
    }

    let mut rows = rows.into_iter();
    let physical = rows.next().ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        line: None,
        message: "file contains no data rows".to_string(),
    })?;

    Ok(SummaryRecord {
        physical,
        controls: rows.collect(),
    })
}

fn parse_row(line: &str) -> std::result::Result<SummaryRow, String> {
    let mut values = [0.0; 8];
    let mut count = 0;
    for token in line.split_whitespace() {
        if count < values.len() {
            let value = token.parse::<f64>().map_err(|_| {
                format!("column {} is not a number: {:?}", SUMMARY_COLUMNS[count], token)
            })?;
            if !value.is_finite() {
                return Err(format!(
                    "column {} is not finite: {:?}",
                    SUMMARY_COLUMNS[count], token
                ));
            }
            values[count] = value;
        }
        count += 1;
    }
    if count != values.len() {
        return Err(format!("expected {} fields, found {}", values.len(), count));
    }
    Ok(SummaryRow::from_columns(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(width: f64) -> String {
        format!("10 300 0.3 0.6 150 0 {} 1.5", width)
    }

    #[test]
    fn parses_physical_and_controls() {
        let content = format!("{}\n{}\n{}\n", row(20.0), row(40.0), row(60.0));
        let record = parse_summary_content(&content, Path::new("a.dat")).unwrap();
        assert_eq!(record.rows(), 3);
        assert_eq!(record.physical.width, 20.0);
        assert_eq!(record.physical.ca_ratio, 0.3);
        assert_eq!(record.physical.mu, 1.5);
        assert_eq!(record.controls[1].width, 60.0);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let content = format!("# minr maxr ...\n\n{}\n   \n{}\n", row(1.0), row(2.0));
        let record = parse_summary_content(&content, Path::new("a.dat")).unwrap();
        assert_eq!(record.rows(), 2);
    }

    #[test]
    fn wrong_field_count_reports_line() {
        let content = format!("{}\n1 2 3\n", row(1.0));
        let err = parse_summary_content(&content, Path::new("a.dat")).unwrap_err();
        match err {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("expected 8 fields, found 3"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_token_names_column() {
        let content = "10 300 0.3 0.6 150 0 wide 1.5\n";
        let err = parse_summary_content(content, Path::new("a.dat")).unwrap_err();
        assert!(err.to_string().contains("width"));
        assert_eq!(err.code(), 20);
    }

    #[test]
    fn non_finite_tokens_are_rejected() {
        for token in ["nan", "NaN", "inf", "-inf", "1e400"] {
            let content = format!("{}\n10 300 0.3 0.6 150 0 {} 1.5\n", row(1.0), token);
            match parse_summary_content(&content, Path::new("a.dat")) {
                Err(Error::Parse { line, message, .. }) => {
                    assert_eq!(line, Some(2));
                    assert!(message.contains("width is not finite"), "{message}");
                }
                other => panic!("expected Parse for {token}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_file_is_parse_error() {
        let err = parse_summary_content("# only a header\n", Path::new("a.dat")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: None, .. }));
    }

    #[test]
    fn missing_file_is_parse_error() {
        let err = load_summary(Path::new("/nonexistent/M31_group_1_nsat_11.dat")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn control_values_truncate_and_check() {
        let content = format!("{}\n{}\n{}\n{}\n", row(0.0), row(1.0), row(2.0), row(3.0));
        let record = parse_summary_content(&content, Path::new("a.dat")).unwrap();
        assert_eq!(
            record.control_values(Observable::Width, 2).unwrap(),
            vec![1.0, 2.0]
        );
        assert!(matches!(
            record.control_values(Observable::Width, 4),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn summary_path_uses_host_label() {
        let p = summary_path(Path::new("/d"), Host::Mw, 7, 11);
        assert_eq!(p, PathBuf::from("/d/MW_group_7_nsat_11.dat"));
    }
}
