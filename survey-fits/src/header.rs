//! FITS header cards and keyword lookup.
//!
//! A header is a sequence of 80-character cards terminated by `END`. Values
//! follow the `KEYWORD = value / comment` convention; this parser covers the
//! logical, integer, real, and quoted-string value forms that survey tables
//! use.

use crate::errors::{FitsError, Result};
use std::collections::HashMap;
use std::str;

pub const CARD_SIZE: usize = 80;
pub const BLOCK_SIZE: usize = 2880;

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl KeywordValue {
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            KeywordValue::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            KeywordValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            KeywordValue::Real(r) => Some(*r),
            KeywordValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeywordValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Keyword {
    pub name: String,
    pub value: Option<KeywordValue>,
    pub comment: Option<String>,
}

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            comment: None,
        }
    }

    pub fn logical(name: &str, value: bool) -> Self {
        Self {
            name: name.to_string(),
            value: Some(KeywordValue::Logical(value)),
            comment: None,
        }
    }

    pub fn integer(name: &str, value: i64) -> Self {
        Self {
            name: name.to_string(),
            value: Some(KeywordValue::Integer(value)),
            comment: None,
        }
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(KeywordValue::Text(value.to_string())),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    keywords: Vec<Keyword>,
    keyword_index: HashMap<String, usize>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, keyword: Keyword) {
        let index = self.keywords.len();
        self.keyword_index.insert(keyword.name.clone(), index);
        self.keywords.push(keyword);
    }

    pub fn get_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keyword_index
            .get(name)
            .and_then(|&index| self.keywords.get(index))
    }

    pub fn get_keyword_value(&self, name: &str) -> Option<&KeywordValue> {
        self.get_keyword(name)?.value.as_ref()
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get_keyword_value(name).and_then(|v| v.as_integer())
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn is_primary(&self) -> bool {
        self.get_keyword_value("SIMPLE")
            .and_then(|v| v.as_logical())
            .unwrap_or(false)
    }

    pub fn is_extension(&self) -> bool {
        self.get_keyword("XTENSION").is_some()
    }

    /// Parses cards until the `END` marker. The input must cover whole cards;
    /// cards after `END` (block padding) are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if !bytes.len().is_multiple_of(CARD_SIZE) {
            return Err(FitsError::InvalidFormat(format!(
                "header length {} is not a whole number of {CARD_SIZE}-byte cards",
                bytes.len()
            )));
        }
        let mut header = Header::new();
        for chunk in bytes.chunks_exact(CARD_SIZE) {
            let card = str::from_utf8(chunk)
                .map_err(|_| FitsError::InvalidFormat("non-UTF-8 header card".to_string()))?;
            if !card.is_ascii() {
                return Err(FitsError::InvalidFormat(
                    "non-ASCII header card".to_string(),
                ));
            }
            let name = card[0..8].trim_end();
            if name == "END" {
                return Ok(header);
            }
            if name.is_empty() {
                continue;
            }
            header.add_keyword(parse_card(name, card)?);
        }
        Err(FitsError::InvalidFormat(
            "header has no END card".to_string(),
        ))
    }
}

fn parse_card(name: &str, card: &str) -> Result<Keyword> {
    let commentary = name == "COMMENT" || name == "HISTORY";
    if commentary || card.len() < 10 || &card[8..10] != "= " {
        return Ok(Keyword {
            name: name.to_string(),
            value: None,
            comment: Some(card[8..].trim().to_string()).filter(|c| !c.is_empty()),
        });
    }
    let (value, comment) = parse_value(&card[10..])?;
    Ok(Keyword {
        name: name.to_string(),
        value,
        comment,
    })
}

fn parse_value(rest: &str) -> Result<(Option<KeywordValue>, Option<String>)> {
    let trimmed = rest.trim_start();
    if let Some(after_quote) = trimmed.strip_prefix('\'') {
        let (text, comment) = parse_string_value(after_quote)?;
        return Ok((Some(KeywordValue::Text(text)), comment));
    }
    let (value_part, comment) = match trimmed.split_once('/') {
        Some((v, c)) => (v, Some(c.trim().to_string()).filter(|c| !c.is_empty())),
        None => (trimmed, None),
    };
    let token = value_part.trim();
    let value = match token {
        "" => None,
        "T" => Some(KeywordValue::Logical(true)),
        "F" => Some(KeywordValue::Logical(false)),
        _ => {
            if let Ok(i) = token.parse::<i64>() {
                Some(KeywordValue::Integer(i))
            } else if let Ok(r) = token.parse::<f64>() {
                Some(KeywordValue::Real(r))
            } else {
                // Unrecognized free-form value; keep the raw token.
                Some(KeywordValue::Text(token.to_string()))
            }
        }
    };
    Ok((value, comment))
}

fn parse_string_value(s: &str) -> Result<(String, Option<String>)> {
    let bytes = s.as_bytes();
    let mut value = String::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            // Doubled quote is an escaped quote inside the value.
            if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                value.push('\'');
                i += 2;
                continue;
            }
            let comment = s[i + 1..]
                .trim_start()
                .strip_prefix('/')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            return Ok((value.trim_end().to_string(), comment));
        }
        value.push(bytes[i] as char);
        i += 1;
    }
    Err(FitsError::InvalidFormat(
        "unterminated string value in header card".to_string(),
    ))
}
