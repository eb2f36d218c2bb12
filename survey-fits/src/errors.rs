#[derive(Debug, thiserror::Error)]
pub enum FitsError {
    #[error("invalid FITS format: {0}")]
    InvalidFormat(String),

    #[error("keyword {keyword} not found")]
    KeywordNotFound { keyword: String },

    #[error("column {column} not found")]
    ColumnNotFound { column: String },

    #[error("unsupported column format: {0}")]
    UnsupportedFormat(String),

    #[error("row {row} out of bounds for table with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("HDU not found: {0}")]
    HduNotFound(usize),

    #[error("no binary table extension in file")]
    NoTableExtension,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FitsError>;
