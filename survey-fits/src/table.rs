//! Materialized binary-table extensions.
//!
//! Column layout comes from `TTYPEn`/`TFORMn`; cells decode big-endian per
//! the BINTABLE convention. Only scalar columns and character arrays are
//! supported, which covers every survey strategy and statistics table.

use crate::errors::{FitsError, Result};
use crate::header::Header;
use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;
use std::fmt;
use std::str;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Logical,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

#[derive(Debug, Clone)]
pub struct ColumnDesc {
    pub name: String,
    pub kind: ColumnKind,
    pub width: usize,
    pub(crate) offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Logical(bool),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinTable {
    columns: Vec<ColumnDesc>,
    column_index: HashMap<String, usize>,
    row_width: usize,
    rows: usize,
    data: Vec<u8>,
}

impl BinTable {
    pub(crate) fn from_parts(header: &Header, mut data: Vec<u8>) -> Result<Self> {
        let tfields = required(header, "TFIELDS")? as usize;
        let row_width = required(header, "NAXIS1")? as usize;
        let rows = required(header, "NAXIS2")? as usize;

        let mut columns = Vec::with_capacity(tfields);
        let mut offset = 0usize;
        for i in 1..=tfields {
            let form_key = format!("TFORM{i}");
            let form = header
                .get_keyword_value(&form_key)
                .and_then(|v| v.as_text())
                .ok_or(FitsError::KeywordNotFound { keyword: form_key })?;
            let (kind, width) = parse_tform(form)?;
            let name = header
                .get_keyword_value(&format!("TTYPE{i}"))
                .and_then(|v| v.as_text())
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| format!("COL{i}"));
            columns.push(ColumnDesc {
                name,
                kind,
                width,
                offset,
            });
            offset += width;
        }
        if offset > row_width {
            return Err(FitsError::InvalidFormat(format!(
                "columns span {offset} bytes but NAXIS1 is {row_width}"
            )));
        }
        let needed = row_width
            .checked_mul(rows)
            .ok_or_else(|| FitsError::InvalidFormat("table dimensions too large".to_string()))?;
        if data.len() < needed {
            return Err(FitsError::InvalidFormat(format!(
                "table data truncated: {} bytes for {rows} rows of {row_width}",
                data.len()
            )));
        }
        data.truncate(needed);

        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Ok(Self {
            columns,
            column_index,
            row_width,
            rows,
            data,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    pub fn value(&self, row: usize, column: &str) -> Result<CellValue> {
        let col = self.column(column)?;
        if row >= self.rows {
            return Err(FitsError::RowOutOfBounds {
                row,
                rows: self.rows,
            });
        }
        let start = row * self.row_width + col.offset;
        let bytes = &self.data[start..start + col.width];
        match col.kind {
            ColumnKind::Text => Ok(CellValue::Text(decode_text(bytes)?)),
            ColumnKind::Logical => match bytes[0] {
                b'T' => Ok(CellValue::Logical(true)),
                b'F' | 0 => Ok(CellValue::Logical(false)),
                other => Err(FitsError::InvalidFormat(format!(
                    "invalid logical cell byte: {other:#04x}"
                ))),
            },
            ColumnKind::Int16 => Ok(CellValue::Int(BigEndian::read_i16(bytes) as i64)),
            ColumnKind::Int32 => Ok(CellValue::Int(BigEndian::read_i32(bytes) as i64)),
            ColumnKind::Int64 => Ok(CellValue::Int(BigEndian::read_i64(bytes))),
            ColumnKind::Float32 => Ok(CellValue::Float(BigEndian::read_f32(bytes) as f64)),
            ColumnKind::Float64 => Ok(CellValue::Float(BigEndian::read_f64(bytes))),
        }
    }

    /// Text of a cell, rendered the way it would appear in a filename key.
    pub fn text(&self, row: usize, column: &str) -> Result<String> {
        Ok(self.value(row, column)?.to_string())
    }

    /// Indices of every row whose rendered cell equals `needle`, in table
    /// order.
    pub fn find_rows(&self, column: &str, needle: &str) -> Result<Vec<usize>> {
        let mut matches = Vec::new();
        for row in 0..self.rows {
            if self.text(row, column)? == needle {
                matches.push(row);
            }
        }
        Ok(matches)
    }

    /// A new table holding the given rows in the given order.
    pub fn select(&self, rows: &[usize]) -> Result<BinTable> {
        let mut data = Vec::with_capacity(rows.len() * self.row_width);
        for &row in rows {
            if row >= self.rows {
                return Err(FitsError::RowOutOfBounds {
                    row,
                    rows: self.rows,
                });
            }
            let start = row * self.row_width;
            data.extend_from_slice(&self.data[start..start + self.row_width]);
        }
        Ok(BinTable {
            columns: self.columns.clone(),
            column_index: self.column_index.clone(),
            row_width: self.row_width,
            rows: rows.len(),
            data,
        })
    }

    fn column(&self, name: &str) -> Result<&ColumnDesc> {
        self.column_index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| FitsError::ColumnNotFound {
                column: name.to_string(),
            })
    }
}

fn required(header: &Header, keyword: &str) -> Result<i64> {
    header
        .integer(keyword)
        .ok_or_else(|| FitsError::KeywordNotFound {
            keyword: keyword.to_string(),
        })
}

pub(crate) fn parse_tform(spec: &str) -> Result<(ColumnKind, usize)> {
    let spec = spec.trim();
    let split = spec
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| FitsError::UnsupportedFormat(spec.to_string()))?;
    let repeat: usize = if split == 0 {
        1
    } else {
        spec[..split]
            .parse()
            .map_err(|_| FitsError::UnsupportedFormat(spec.to_string()))?
    };
    let kind = match &spec[split..split + 1] {
        "A" => return Ok((ColumnKind::Text, repeat)),
        "L" => ColumnKind::Logical,
        "I" => ColumnKind::Int16,
        "J" => ColumnKind::Int32,
        "K" => ColumnKind::Int64,
        "E" => ColumnKind::Float32,
        "D" => ColumnKind::Float64,
        _ => return Err(FitsError::UnsupportedFormat(spec.to_string())),
    };
    if repeat != 1 {
        // Vector cells never occur in strategy or statistics tables.
        return Err(FitsError::UnsupportedFormat(spec.to_string()));
    }
    let width = match kind {
        ColumnKind::Logical => 1,
        ColumnKind::Int16 => 2,
        ColumnKind::Int32 | ColumnKind::Float32 => 4,
        ColumnKind::Int64 | ColumnKind::Float64 => 8,
        ColumnKind::Text => unreachable!(),
    };
    Ok((kind, width))
}

fn decode_text(bytes: &[u8]) -> Result<String> {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |p| p + 1);
    str::from_utf8(&bytes[..end])
        .map(str::to_string)
        .map_err(|_| FitsError::InvalidFormat("non-UTF-8 text cell".to_string()))
}
