//! The survey abstraction: a named catalog with a pointing plan and a way
//! to enumerate its fields.

use crate::data_dir::{data_dir, observed_path, strategy_path};
use crate::error::Result;
use crate::field::Field;
use crate::observed::ObservationLog;
use std::path::Path;
use survey_fits::{BinTable, FitsFile};

/// A survey catalog. Every variant must say how its fields are enumerated;
/// the pointing plan always loads the same way, keyed by the survey's name.
pub trait Survey {
    fn name(&self) -> &str;

    /// All fields of the survey. There is deliberately no default body:
    /// a variant that cannot enumerate fields is not a survey.
    fn fields(&self) -> Result<Vec<Field>>;

    /// The planned-pointing table `<name>_strategy.fits`, read from
    /// `directory` or the default data directory. A missing resource is a
    /// hard error; the underlying failure propagates untouched.
    fn pointing_strategy(&self, directory: Option<&Path>) -> Result<BinTable> {
        let dir = directory.unwrap_or_else(|| data_dir());
        let mut fits = FitsFile::open(strategy_path(dir, self.name()))?;
        Ok(fits.first_table()?)
    }
}

/// Northern-plane survey with a fixed ten-field placeholder enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iphas;

pub const IPHAS_FIELD_COUNT: usize = 10;

impl Survey for Iphas {
    fn name(&self) -> &str {
        "IPHAS"
    }

    fn fields(&self) -> Result<Vec<Field>> {
        Ok((0..IPHAS_FIELD_COUNT)
            .map(|i| Field::new(format!("{i:04}")))
            .collect())
    }
}

/// Southern-plane survey backed by the observation log; see
/// [`crate::vphas`] for the log and statistics machinery.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vphas;

impl Survey for Vphas {
    fn name(&self) -> &str {
        "VPHAS"
    }

    /// One field per observation-log row. Enumeration was asked for
    /// explicitly, so a missing log is a hard error here.
    fn fields(&self) -> Result<Vec<Field>> {
        let log = ObservationLog::read(&observed_path(data_dir()))?;
        Ok((0..log.num_rows())
            .map(|row| Field::new(log.field(row)))
            .collect())
    }
}
