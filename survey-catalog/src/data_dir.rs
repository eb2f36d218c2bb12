//! Location of the catalog data directory and the files inside it.
//!
//! The directory is resolved once per process: `SURVEY_DATA_DIR` if set,
//! otherwise `./data`. Every loader also accepts an explicit path, so the
//! default only matters for the convenience call forms.

use crate::field::Color;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DATA_DIR_ENV: &str = "SURVEY_DATA_DIR";
pub const OBSERVED_FILENAME: &str = "fields_observed.dat";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub fn data_dir() -> &'static Path {
    DATA_DIR.get_or_init(|| {
        std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"))
    })
}

pub fn strategy_path(dir: &Path, survey: &str) -> PathBuf {
    dir.join(format!("{survey}_strategy.fits"))
}

pub fn observed_path(dir: &Path) -> PathBuf {
    dir.join(OBSERVED_FILENAME)
}

pub fn stats_path(dir: &Path, color: Color) -> PathBuf {
    dir.join(stats_filename(color))
}

pub fn stats_filename(color: Color) -> String {
    format!("stats-{}.fits", color.label())
}
