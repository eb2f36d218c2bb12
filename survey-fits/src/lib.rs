//! Minimal FITS tabular I/O for survey metadata files.
//!
//! Survey pointing-strategy and per-field statistics files are FITS binary
//! tables: a bare primary HDU followed by one `BINTABLE` extension. This
//! crate reads exactly that shape (block-aligned HDU scanning, 80-character
//! header cards, scalar and character-array columns) and writes it back out
//! for operators who maintain their own statistics files.
//!
//! ```ignore
//! use survey_fits::FitsFile;
//!
//! let mut fits = FitsFile::open("stats-red.fits")?;
//! let stats = fits.first_table()?;
//! let rows = stats.find_rows("Filename", "0001-20120101-red.fits")?;
//! ```

pub mod errors;
pub mod header;
pub mod reader;
pub mod table;
pub mod writer;

pub use errors::{FitsError, Result};
pub use header::{Header, Keyword, KeywordValue};
pub use reader::{FitsFile, HduInfo};
pub use table::{BinTable, CellValue, ColumnDesc, ColumnKind};
pub use writer::TableWriter;
