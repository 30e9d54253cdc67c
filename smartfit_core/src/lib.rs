#![forbid(unsafe_code)]

//! Core domain model and business logic for SmartFit.
//!
//! This crate provides:
//! - Domain types (body parts, exercises, sets, profile records)
//! - The session builder for logging a workout
//! - The profile editor with unit conversion and range validation
//! - The daily check-in form
//! - Record store contracts plus local file and HTTP implementations

pub mod types;
pub mod error;
pub mod units;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod record_log;
pub mod profile_store;
pub mod http;
pub mod markers;
pub mod session;
pub mod profile;
pub mod checkin;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use units::UnitSystem;
pub use catalog::BuiltinCatalog;
pub use config::Config;
pub use store::{ExerciseCatalog, ProfileStore, SetRecordSink, UserMetricSink};
pub use record_log::{read_checkin_log, read_set_log, JsonlLog};
pub use profile_store::FileProfileStore;
pub use http::HttpStore;
pub use markers::MarkerStore;
pub use session::{RatingPopoverKey, SessionBuilder, SessionSummary};
pub use profile::{FieldValue, ProfileEditor, ProfileField, ProfileForm, SaveOutcome};
pub use checkin::{CheckIn, CheckInForm};
