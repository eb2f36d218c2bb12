//! Metadata access for astronomical survey catalogs.
//!
//! A survey is a collection of single-band exposures, arbitrarily grouped
//! into fields. This crate reads the flat files that describe a survey
//! (the planned-pointing table, the observed-field log, and the per-field
//! quality statistics) and cross-references them on demand. It computes
//! nothing; it is the thin layer between catalog files on disk and an
//! analysis session.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`survey`] | [`Survey`] contract, [`Iphas`] and [`Vphas`] variants, pointing-strategy loading |
//! | [`vphas`] | Observation-log sessions, per-color statistics retrieval, [`Fetch`] soft/hard failure split |
//! | [`observed`] | `fields_observed.dat` parsing |
//! | [`field`] | Fields, filter colors, statistics filename keys |
//! | [`data_dir`] | Data-directory resolution and resource paths |
//! | [`provision`] | `Provisioner` boundary that populates the data directory |
//!
//! # Quick Start
//!
//! ```ignore
//! use survey_catalog::{ColorSelection, Fetch, Survey, Vphas};
//!
//! let survey = Vphas;
//! let strategy = survey.pointing_strategy(None)?;
//!
//! match survey.observed_fetch(None, ColorSelection::BOTH)? {
//!     Fetch::Loaded(session) => {
//!         let metadata = survey.read_metadata(Some(&session), None, false)?;
//!     }
//!     Fetch::Missing { hint } => eprintln!("{hint}"),
//! }
//! ```
//!
//! Module conventions: RA/Dec are decimal degrees; date tokens are
//! `YYYYMMDD` strings, with the empty string meaning "not observed".

pub mod data_dir;
pub mod error;
pub mod field;
pub mod observed;
pub mod provision;
pub mod survey;
pub mod vphas;

pub use error::{Error, Result};
pub use field::{Color, Field};
pub use observed::ObservationLog;
pub use provision::{Credentials, ProvisionReport, Provisioner};
pub use survey::{Iphas, Survey, Vphas};
pub use vphas::{ColorSelection, Fetch, FieldMetadata, ObservedSession};
