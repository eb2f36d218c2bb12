//! Binary-table writer.
//!
//! Emits a minimal primary HDU followed by one `BINTABLE` extension. Survey
//! operators who maintain their own statistics files produce them through
//! this path, and the test suites use it to build fixtures.

use crate::errors::{FitsError, Result};
use crate::header::{KeywordValue, BLOCK_SIZE, CARD_SIZE};
use crate::table::{CellValue, ColumnKind};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
struct ColumnSpec {
    name: String,
    kind: ColumnKind,
    width: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TableWriter {
    extname: Option<String>,
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<CellValue>>,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extname(mut self, name: &str) -> Self {
        self.extname = Some(name.to_string());
        self
    }

    /// Character-array column (`<width>A`).
    pub fn text_column(mut self, name: &str, width: usize) -> Self {
        self.columns.push(ColumnSpec {
            name: name.to_string(),
            kind: ColumnKind::Text,
            width,
        });
        self
    }

    /// 32-bit integer column (`1J`).
    pub fn int_column(mut self, name: &str) -> Self {
        self.columns.push(ColumnSpec {
            name: name.to_string(),
            kind: ColumnKind::Int32,
            width: 4,
        });
        self
    }

    /// 64-bit float column (`1D`).
    pub fn float_column(mut self, name: &str) -> Self {
        self.columns.push(ColumnSpec {
            name: name.to_string(),
            kind: ColumnKind::Float64,
            width: 8,
        });
        self
    }

    pub fn row(mut self, cells: Vec<CellValue>) -> Self {
        self.rows.push(cells);
        self
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let row_width: usize = self.columns.iter().map(|c| c.width).sum();
        let mut out = primary_header(true);
        out.extend_from_slice(&self.extension_header(row_width));
        out.extend_from_slice(&self.data_area(row_width)?);
        Ok(out)
    }

    /// A file with nothing but an empty primary HDU.
    pub fn primary_only() -> Result<Vec<u8>> {
        Ok(primary_header(false))
    }

    fn extension_header(&self, row_width: usize) -> Vec<u8> {
        let mut cards = Vec::new();
        cards.push(card("XTENSION", &KeywordValue::Text("BINTABLE".into())));
        cards.push(card("BITPIX", &KeywordValue::Integer(8)));
        cards.push(card("NAXIS", &KeywordValue::Integer(2)));
        cards.push(card("NAXIS1", &KeywordValue::Integer(row_width as i64)));
        cards.push(card("NAXIS2", &KeywordValue::Integer(self.rows.len() as i64)));
        cards.push(card("PCOUNT", &KeywordValue::Integer(0)));
        cards.push(card("GCOUNT", &KeywordValue::Integer(1)));
        cards.push(card(
            "TFIELDS",
            &KeywordValue::Integer(self.columns.len() as i64),
        ));
        for (i, column) in self.columns.iter().enumerate() {
            let n = i + 1;
            cards.push(card(
                &format!("TTYPE{n}"),
                &KeywordValue::Text(column.name.clone()),
            ));
            cards.push(card(
                &format!("TFORM{n}"),
                &KeywordValue::Text(tform(column)),
            ));
        }
        if let Some(name) = &self.extname {
            cards.push(card("EXTNAME", &KeywordValue::Text(name.clone())));
        }
        finish_header(cards)
    }

    fn data_area(&self, row_width: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.rows.len() * row_width);
        for (row_number, cells) in self.rows.iter().enumerate() {
            if cells.len() != self.columns.len() {
                return Err(FitsError::InvalidFormat(format!(
                    "row {row_number} has {} cells, table has {} columns",
                    cells.len(),
                    self.columns.len()
                )));
            }
            for (cell, column) in cells.iter().zip(&self.columns) {
                encode_cell(cell, column, &mut data)?;
            }
        }
        pad_to_block(&mut data, 0);
        Ok(data)
    }
}

fn tform(column: &ColumnSpec) -> String {
    match column.kind {
        ColumnKind::Text => format!("{}A", column.width),
        ColumnKind::Logical => "1L".to_string(),
        ColumnKind::Int16 => "1I".to_string(),
        ColumnKind::Int32 => "1J".to_string(),
        ColumnKind::Int64 => "1K".to_string(),
        ColumnKind::Float32 => "1E".to_string(),
        ColumnKind::Float64 => "1D".to_string(),
    }
}

fn encode_cell(cell: &CellValue, column: &ColumnSpec, out: &mut Vec<u8>) -> Result<()> {
    match (cell, column.kind) {
        (CellValue::Text(s), ColumnKind::Text) => {
            if s.len() > column.width {
                return Err(FitsError::InvalidFormat(format!(
                    "text {s:?} exceeds column {} width {}",
                    column.name, column.width
                )));
            }
            out.extend_from_slice(s.as_bytes());
            out.extend(std::iter::repeat_n(b' ', column.width - s.len()));
        }
        (CellValue::Int(i), ColumnKind::Int32) => {
            let v = i32::try_from(*i).map_err(|_| {
                FitsError::InvalidFormat(format!(
                    "{i} overflows 32-bit column {}",
                    column.name
                ))
            })?;
            out.extend_from_slice(&v.to_be_bytes());
        }
        (CellValue::Float(f), ColumnKind::Float64) => {
            out.extend_from_slice(&f.to_be_bytes());
        }
        (CellValue::Logical(b), ColumnKind::Logical) => {
            out.push(if *b { b'T' } else { b'F' });
        }
        (cell, kind) => {
            return Err(FitsError::InvalidFormat(format!(
                "cell {cell:?} does not fit {kind:?} column {}",
                column.name
            )));
        }
    }
    Ok(())
}

fn primary_header(extend: bool) -> Vec<u8> {
    let cards = vec![
        card("SIMPLE", &KeywordValue::Logical(true)),
        card("BITPIX", &KeywordValue::Integer(8)),
        card("NAXIS", &KeywordValue::Integer(0)),
        card("EXTEND", &KeywordValue::Logical(extend)),
    ];
    finish_header(cards)
}

fn finish_header(mut cards: Vec<[u8; CARD_SIZE]>) -> Vec<u8> {
    cards.push(end_card());
    let mut bytes: Vec<u8> = cards.iter().flatten().copied().collect();
    pad_to_block(&mut bytes, b' ');
    bytes
}

fn card(name: &str, value: &KeywordValue) -> [u8; CARD_SIZE] {
    let text = match value {
        KeywordValue::Logical(b) => {
            format!("{:<8}= {:>20}", name, if *b { "T" } else { "F" })
        }
        KeywordValue::Integer(i) => format!("{:<8}= {:>20}", name, i),
        KeywordValue::Real(r) => format!("{:<8}= {:>20}", name, r),
        KeywordValue::Text(s) => format!("{:<8}= '{:<8}'", name, s),
    };
    to_card(&text)
}

fn end_card() -> [u8; CARD_SIZE] {
    to_card("END")
}

fn to_card(text: &str) -> [u8; CARD_SIZE] {
    let mut out = [b' '; CARD_SIZE];
    let bytes = text.as_bytes();
    let len = bytes.len().min(CARD_SIZE);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

fn pad_to_block(bytes: &mut Vec<u8>, fill: u8) {
    let remainder = bytes.len() % BLOCK_SIZE;
    if remainder != 0 {
        bytes.resize(bytes.len() + BLOCK_SIZE - remainder, fill);
    }
}
