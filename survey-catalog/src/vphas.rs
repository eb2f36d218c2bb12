//! Observation-log-backed metadata retrieval for the southern survey.
//!
//! The flow is load-then-lookup: `observed_fetch` parses the log and fixes
//! the active color channels in an [`ObservedSession`], and `read_metadata`
//! cross-references each active color's statistics table against that
//! session. Sessions are plain values; loading again replaces the old one.

use crate::data_dir::{data_dir, observed_path, stats_path, OBSERVED_FILENAME};
use crate::error::{Error, Result};
use crate::field::{stats_key, Color};
use crate::observed::ObservationLog;
use crate::survey::Vphas;
use std::io::ErrorKind;
use std::path::Path;
use survey_fits::{BinTable, FitsError, FitsFile};

/// Which color channels a session is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSelection {
    pub red: bool,
    pub blu: bool,
}

impl ColorSelection {
    pub const BOTH: Self = Self {
        red: true,
        blu: true,
    };
    pub const RED: Self = Self {
        red: true,
        blu: false,
    };
    pub const BLU: Self = Self {
        red: false,
        blu: true,
    };

    pub fn includes(self, color: Color) -> bool {
        match color {
            Color::Red => self.red,
            Color::Blu => self.blu,
        }
    }
}

/// Outcome of a load that can miss its default resource or be called out
/// of order. `Missing` is advisory: the caller branches on it and carries
/// on. Anything that indicates broken data is an `Err` instead, so a
/// legitimate table can never be mistaken for a failure marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Loaded(T),
    Missing { hint: String },
}

impl<T> Fetch<T> {
    pub fn loaded(self) -> Option<T> {
        match self {
            Fetch::Loaded(value) => Some(value),
            Fetch::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Fetch::Missing { .. })
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Fetch::Loaded(_) => None,
            Fetch::Missing { hint } => Some(hint),
        }
    }
}

/// Log-loaded session state: the parsed observation log plus the color
/// channels chosen at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSession {
    log: ObservationLog,
    colors: ColorSelection,
}

impl ObservedSession {
    pub fn log(&self) -> &ObservationLog {
        &self.log
    }

    pub fn colors(&self) -> ColorSelection {
        self.colors
    }
}

/// Per-color statistics subsets for the observed fields, in
/// observation-log order. A color is `None` when it was not active in the
/// session.
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    pub red: Option<BinTable>,
    pub blu: Option<BinTable>,
}

impl FieldMetadata {
    pub fn for_color(&self, color: Color) -> Option<&BinTable> {
        match color {
            Color::Red => self.red.as_ref(),
            Color::Blu => self.blu.as_ref(),
        }
    }

    fn set(&mut self, color: Color, table: BinTable) {
        match color {
            Color::Red => self.red = Some(table),
            Color::Blu => self.blu = Some(table),
        }
    }
}

impl Vphas {
    /// Reads a `fields_observed.dat` log and starts a session.
    ///
    /// With no `table` argument the log is looked up in the data directory,
    /// and its absence is advisory (`Fetch::Missing`): nothing is
    /// configured yet. A path the caller named explicitly must exist, so
    /// failures there are hard.
    pub fn observed_fetch(
        &self,
        table: Option<&Path>,
        colors: ColorSelection,
    ) -> Result<Fetch<ObservedSession>> {
        let path = match table {
            Some(path) => path.to_path_buf(),
            None => observed_path(data_dir()),
        };
        let log = match ObservationLog::read(&path) {
            Ok(log) => log,
            Err(Error::Io(e)) if table.is_none() && e.kind() == ErrorKind::NotFound => {
                return Ok(Fetch::Missing {
                    hint: format!(
                        "no table specified and no {OBSERVED_FILENAME} in the data directory"
                    ),
                });
            }
            Err(e) => return Err(e),
        };
        Ok(Fetch::Loaded(ObservedSession { log, colors }))
    }

    /// Session restricted to fields observed in the red concatenation.
    pub fn observed_red(&self, table: Option<&Path>) -> Result<Fetch<ObservedSession>> {
        self.observed_fetch(table, ColorSelection::RED)
    }

    /// Session restricted to fields observed in the blue concatenation.
    pub fn observed_blu(&self, table: Option<&Path>) -> Result<Fetch<ObservedSession>> {
        self.observed_fetch(table, ColorSelection::BLU)
    }

    /// Statistics subsets for every active color of the session.
    ///
    /// `quick` loads the default log in place of a session; without it a
    /// session from [`Self::observed_fetch`] is required, and calling out
    /// of order is answered with guidance, not a fault. An absent
    /// statistics file aborts the whole call advisorily; a log entry the
    /// statistics table cannot account for is a data-integrity error and
    /// propagates.
    pub fn read_metadata(
        &self,
        session: Option<&ObservedSession>,
        directory: Option<&Path>,
        quick: bool,
    ) -> Result<Fetch<FieldMetadata>> {
        let quick_session;
        let session = if quick {
            match self.observed_fetch(None, ColorSelection::BOTH)? {
                Fetch::Loaded(loaded) => {
                    quick_session = loaded;
                    &quick_session
                }
                Fetch::Missing { .. } => {
                    return Ok(Fetch::Missing {
                        hint: format!(
                            "quick mode only works when {OBSERVED_FILENAME} exists in the \
                             data directory"
                        ),
                    });
                }
            }
        } else {
            match session {
                Some(session) => session,
                None => {
                    return Ok(Fetch::Missing {
                        hint: "run observed_fetch to choose the observed fields, or pass \
                               quick=true to use the log in the data directory"
                            .to_string(),
                    });
                }
            }
        };

        let mut metadata = FieldMetadata::default();
        for color in Color::ALL {
            if !session.colors().includes(color) {
                continue;
            }
            match self.metadata_fetch(color, session, directory)? {
                Fetch::Loaded(table) => metadata.set(color, table),
                Fetch::Missing { hint } => return Ok(Fetch::Missing { hint }),
            }
        }
        Ok(Fetch::Loaded(metadata))
    }

    /// Statistics rows for one color, in observation-log order.
    ///
    /// Every log row with a non-empty date token for `color` must match
    /// exactly one statistics row; zero or several matches mean the log
    /// and the statistics table disagree.
    fn metadata_fetch(
        &self,
        color: Color,
        session: &ObservedSession,
        directory: Option<&Path>,
    ) -> Result<Fetch<BinTable>> {
        let dir = directory.unwrap_or_else(|| data_dir());
        let path = stats_path(dir, color);
        let mut fits = match FitsFile::open(&path) {
            Ok(fits) => fits,
            Err(FitsError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Ok(Fetch::Missing {
                    hint: format!(
                        "no stats-{}.fits in {}; pass the directory that holds the \
                         statistics files",
                        color.label(),
                        dir.display()
                    ),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let stats = fits.first_table()?;

        let log = session.log();
        let mut picked = Vec::new();
        for row in 0..log.num_rows() {
            let token = log.date_token(row, color);
            if token.is_empty() {
                continue;
            }
            let filename = stats_key(log.field(row), token, color);
            let matches = stats.find_rows("Filename", &filename)?;
            match matches.len() {
                0 => return Err(Error::StatsRowMissing { filename }),
                1 => picked.push(matches[0]),
                count => return Err(Error::DuplicateStatsRow { filename, count }),
            }
        }
        Ok(Fetch::Loaded(stats.select(&picked)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use survey_fits::{CellValue, TableWriter};
    use tempfile::TempDir;

    const SIMPLE_LOG: &str = "\
Field  Hari_dat  ugr_dat
0001   20120101  \"\"
0002   \"\"        20120102
0003   20120103  20120104
";

    fn write_log(dir: &Path) {
        fs::write(observed_path(dir), SIMPLE_LOG).unwrap();
    }

    fn write_stats(dir: &Path, color: Color, filenames: &[&str]) {
        let mut writer = TableWriter::new()
            .extname("STATS")
            .text_column("Filename", 28)
            .float_column("Seeing")
            .int_column("Nstars");
        for (i, filename) in filenames.iter().enumerate() {
            writer = writer.row(vec![
                CellValue::Text((*filename).to_string()),
                CellValue::Float(0.8 + i as f64 / 10.0),
                CellValue::Int(1000 + i as i64),
            ]);
        }
        writer.write_to(stats_path(dir, color)).unwrap();
    }

    fn full_fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path());
        write_stats(
            dir.path(),
            Color::Red,
            &[
                "0003-20120103-red.fits",
                "0001-20120101-red.fits",
                "9999-20000101-red.fits",
            ],
        );
        write_stats(
            dir.path(),
            Color::Blu,
            &["0002-20120102-blu.fits", "0003-20120104-blu.fits"],
        );
        dir
    }

    fn session(dir: &Path, colors: ColorSelection) -> ObservedSession {
        Vphas
            .observed_fetch(Some(&observed_path(dir)), colors)
            .unwrap()
            .loaded()
            .unwrap()
    }

    #[test]
    fn observed_fetch_loads_explicit_table() {
        let dir = full_fixture();
        let session = session(dir.path(), ColorSelection::BOTH);
        assert_eq!(session.log().num_rows(), 3);
        assert!(session.colors().red);
        assert!(session.colors().blu);
    }

    #[test]
    fn observed_fetch_missing_explicit_table_is_hard() {
        let dir = tempfile::tempdir().unwrap();
        let result = Vphas.observed_fetch(Some(&observed_path(dir.path())), ColorSelection::BOTH);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn single_channel_wrappers_fix_the_flags() {
        let dir = full_fixture();
        let path = observed_path(dir.path());
        let red = Vphas.observed_red(Some(&path)).unwrap().loaded().unwrap();
        assert_eq!(red.colors(), ColorSelection::RED);
        let blu = Vphas.observed_blu(Some(&path)).unwrap().loaded().unwrap();
        assert_eq!(blu.colors(), ColorSelection::BLU);
    }

    #[test]
    fn second_fetch_equals_a_fresh_load() {
        let dir = full_fixture();
        let first = session(dir.path(), ColorSelection::BOTH);
        let second = session(dir.path(), ColorSelection::BOTH);
        assert_eq!(first, second);
    }

    #[test]
    fn red_metadata_follows_log_order_not_stats_order() {
        let dir = full_fixture();
        let session = session(dir.path(), ColorSelection::RED);
        let metadata = Vphas
            .read_metadata(Some(&session), Some(dir.path()), false)
            .unwrap()
            .loaded()
            .unwrap();

        let red = metadata.red.as_ref().unwrap();
        assert_eq!(red.num_rows(), 2);
        assert_eq!(red.text(0, "Filename").unwrap(), "0001-20120101-red.fits");
        assert_eq!(red.text(1, "Filename").unwrap(), "0003-20120103-red.fits");
        assert!(metadata.blu.is_none());
        assert!(metadata.for_color(Color::Blu).is_none());
    }

    #[test]
    fn blue_metadata_excludes_red_only_fields() {
        let dir = full_fixture();
        let session = session(dir.path(), ColorSelection::BLU);
        let metadata = Vphas
            .read_metadata(Some(&session), Some(dir.path()), false)
            .unwrap()
            .loaded()
            .unwrap();

        let blu = metadata.blu.as_ref().unwrap();
        assert_eq!(blu.num_rows(), 2);
        // Field 0001 was only observed in red; it must not leak into blue.
        for row in 0..blu.num_rows() {
            assert!(!blu.text(row, "Filename").unwrap().starts_with("0001"));
        }
    }

    #[test]
    fn both_channels_load_together() {
        let dir = full_fixture();
        let session = session(dir.path(), ColorSelection::BOTH);
        let metadata = Vphas
            .read_metadata(Some(&session), Some(dir.path()), false)
            .unwrap()
            .loaded()
            .unwrap();
        assert_eq!(metadata.red.as_ref().unwrap().num_rows(), 2);
        assert_eq!(metadata.blu.as_ref().unwrap().num_rows(), 2);
    }

    #[test]
    fn unaccounted_log_entry_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path());
        // Red stats lack field 0003, which the log declares observed.
        write_stats(dir.path(), Color::Red, &["0001-20120101-red.fits"]);

        let session = session(dir.path(), ColorSelection::RED);
        let result = Vphas.read_metadata(Some(&session), Some(dir.path()), false);
        assert!(matches!(
            result,
            Err(Error::StatsRowMissing { filename }) if filename == "0003-20120103-red.fits"
        ));
    }

    #[test]
    fn duplicate_stats_rows_are_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path());
        write_stats(
            dir.path(),
            Color::Red,
            &[
                "0001-20120101-red.fits",
                "0001-20120101-red.fits",
                "0003-20120103-red.fits",
            ],
        );

        let session = session(dir.path(), ColorSelection::RED);
        let result = Vphas.read_metadata(Some(&session), Some(dir.path()), false);
        assert!(matches!(
            result,
            Err(Error::DuplicateStatsRow { count: 2, .. })
        ));
    }

    #[test]
    fn one_bad_color_does_not_mask_the_other() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path());
        write_stats(dir.path(), Color::Red, &["0001-20120101-red.fits"]);
        write_stats(
            dir.path(),
            Color::Blu,
            &["0002-20120102-blu.fits", "0003-20120104-blu.fits"],
        );

        // Blue succeeds on its own even though red is inconsistent.
        let blu_session = session(dir.path(), ColorSelection::BLU);
        let metadata = Vphas
            .read_metadata(Some(&blu_session), Some(dir.path()), false)
            .unwrap()
            .loaded()
            .unwrap();
        assert_eq!(metadata.blu.as_ref().unwrap().num_rows(), 2);

        let red_session = session(dir.path(), ColorSelection::RED);
        assert!(Vphas
            .read_metadata(Some(&red_session), Some(dir.path()), false)
            .is_err());
    }

    #[test]
    fn missing_stats_file_aborts_advisorily() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path());
        write_stats(
            dir.path(),
            Color::Red,
            &["0001-20120101-red.fits", "0003-20120103-red.fits"],
        );
        // No blue stats file at all.

        let session = session(dir.path(), ColorSelection::BOTH);
        let fetch = Vphas
            .read_metadata(Some(&session), Some(dir.path()), false)
            .unwrap();
        assert!(fetch.is_missing());
        assert!(fetch.hint().unwrap().contains("stats-blu.fits"));
    }

    #[test]
    fn read_metadata_without_session_gives_guidance() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = Vphas
            .read_metadata(None, Some(dir.path()), false)
            .unwrap();
        assert!(fetch.is_missing());
        assert!(fetch.hint().unwrap().contains("observed_fetch"));
    }

    #[test]
    fn empty_date_tokens_produce_empty_subsets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            observed_path(dir.path()),
            "Field Hari_dat ugr_dat\n0001 \"\" \"\"\n",
        )
        .unwrap();
        write_stats(dir.path(), Color::Red, &["9999-20000101-red.fits"]);

        let session = session(dir.path(), ColorSelection::RED);
        let metadata = Vphas
            .read_metadata(Some(&session), Some(dir.path()), false)
            .unwrap()
            .loaded()
            .unwrap();
        let red = metadata.red.as_ref().unwrap();
        assert!(red.is_empty());
        assert!(red.has_column("Filename"));
    }

    #[test]
    fn fetch_accessors() {
        let loaded: Fetch<u8> = Fetch::Loaded(7);
        assert_eq!(loaded.hint(), None);
        assert!(!loaded.is_missing());
        assert_eq!(loaded.loaded(), Some(7));

        let missing: Fetch<u8> = Fetch::Missing {
            hint: "try again".to_string(),
        };
        assert!(missing.is_missing());
        assert_eq!(missing.hint(), Some("try again"));
        assert_eq!(missing.loaded(), None);
    }
}
