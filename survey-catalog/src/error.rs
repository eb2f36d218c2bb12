use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("column {column} missing from observation log")]
    MissingColumn { column: String },

    #[error("no statistics row for {filename}")]
    StatsRowMissing { filename: String },

    #[error("{count} statistics rows for {filename}, expected exactly one")]
    DuplicateStatsRow { filename: String, count: usize },

    #[error("fits error: {0}")]
    Fits(#[from] survey_fits::FitsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
