//! Fields, filter colors, and the filename key that ties them together.

use std::fmt;

/// Filter color channel. Each color maps to the concatenation that
/// processes it: Hari for red, ugr for blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blu,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Red, Color::Blu];

    pub fn label(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blu => "blu",
        }
    }

    pub fn concat(self) -> &'static str {
        match self {
            Color::Red => "Hari",
            Color::Blu => "ugr",
        }
    }

    /// Observation-log column holding this color's date token.
    pub fn date_column(self) -> &'static str {
        match self {
            Color::Red => "Hari_dat",
            Color::Blu => "ugr_dat",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One survey field: a named grouping of single-band exposures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub id: String,
}

impl Field {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// The `Filename` key a statistics table uses for one observed
/// field/color combination.
pub fn stats_key(field: &str, date_token: &str, color: Color) -> String {
    format!("{field}-{date_token}-{}.fits", color.label())
}
