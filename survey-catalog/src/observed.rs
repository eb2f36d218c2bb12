//! The `fields_observed.dat` observation log.
//!
//! A whitespace-delimited text table: the first non-comment line names the
//! columns, each following line holds one field's values. Empty cells are
//! written as `""` so they survive tokenization; date columns are always
//! kept as strings so "not observed" is an empty-string test.

use crate::error::{Error, Result};
use crate::field::Color;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const FIELD_COLUMN: &str = "Field";

const REQUIRED_COLUMNS: [&str; 3] = [FIELD_COLUMN, "Hari_dat", "ugr_dat"];

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationLog {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl ObservationLog {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (line_number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let tokens: Vec<String> = trimmed
                .split_whitespace()
                .map(|t| unquote(t).to_string())
                .collect();
            match &columns {
                None => columns = Some(tokens),
                Some(names) => {
                    if tokens.len() != names.len() {
                        return Err(Error::Parse(format!(
                            "line {}: {} values for {} columns",
                            line_number + 1,
                            tokens.len(),
                            names.len()
                        )));
                    }
                    rows.push(tokens);
                }
            }
        }

        let columns = columns.ok_or_else(|| Error::Parse("no header line found".to_string()))?;
        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(Error::MissingColumn {
                    column: required.to_string(),
                });
            }
        }
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Ok(Self {
            columns,
            column_index,
            rows,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = *self.column_index.get(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Field identifier of a row. Rows come from `parse`, which guarantees
    /// the column exists and every row is full-width.
    pub fn field(&self, row: usize) -> &str {
        self.value(row, FIELD_COLUMN).unwrap_or("")
    }

    /// Date token for a color; empty string means not observed in that
    /// color.
    pub fn date_token(&self, row: usize, color: Color) -> &str {
        self.value(row, color.date_column()).unwrap_or("")
    }
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_LOG: &str = "\
# VPHAS observation log
Field  Hari_dat  ugr_dat
0001   20120101  \"\"
0002   \"\"        20120102
0003   20120103  20120104
";

    #[test]
    fn parse_columns_and_rows() {
        let log = ObservationLog::parse(SIMPLE_LOG).unwrap();
        assert_eq!(log.columns(), ["Field", "Hari_dat", "ugr_dat"]);
        assert_eq!(log.num_rows(), 3);
    }

    #[test]
    fn field_identifiers_in_order() {
        let log = ObservationLog::parse(SIMPLE_LOG).unwrap();
        assert_eq!(log.field(0), "0001");
        assert_eq!(log.field(1), "0002");
        assert_eq!(log.field(2), "0003");
    }

    #[test]
    fn date_tokens_per_color() {
        let log = ObservationLog::parse(SIMPLE_LOG).unwrap();
        assert_eq!(log.date_token(0, Color::Red), "20120101");
        assert_eq!(log.date_token(0, Color::Blu), "");
        assert_eq!(log.date_token(1, Color::Red), "");
        assert_eq!(log.date_token(1, Color::Blu), "20120102");
    }

    #[test]
    fn quoted_empty_cell_is_empty_string() {
        let log = ObservationLog::parse("Field Hari_dat ugr_dat\nx \"\" \"\"\n").unwrap();
        assert_eq!(log.date_token(0, Color::Red), "");
        assert_eq!(log.date_token(0, Color::Blu), "");
    }

    #[test]
    fn extra_columns_are_kept() {
        let log =
            ObservationLog::parse("Field RA Hari_dat ugr_dat\n0001 97.5 20120101 \"\"\n").unwrap();
        assert_eq!(log.value(0, "RA"), Some("97.5"));
    }

    #[test]
    fn missing_required_column_errors() {
        let result = ObservationLog::parse("Field Hari_dat\n0001 20120101\n");
        assert!(matches!(
            result,
            Err(Error::MissingColumn { column }) if column == "ugr_dat"
        ));
    }

    #[test]
    fn ragged_row_errors() {
        let result = ObservationLog::parse("Field Hari_dat ugr_dat\n0001 20120101\n");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn empty_content_errors() {
        assert!(matches!(
            ObservationLog::parse(""),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            ObservationLog::parse("# only comments\n"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn header_only_log_has_no_rows() {
        let log = ObservationLog::parse("Field Hari_dat ugr_dat\n").unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn unknown_column_lookup_is_none() {
        let log = ObservationLog::parse(SIMPLE_LOG).unwrap();
        assert_eq!(log.value(0, "Seeing"), None);
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ObservationLog::read(&dir.path().join("fields_observed.dat"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
