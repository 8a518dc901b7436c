//! Reading Validation
//!
//! Checks ingest payloads before anything reaches storage. A humidity value of
//! zero is a real measurement, so presence is decided by the JSON shape and
//! never by truthiness.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{RawReading, ValidatedReading, ValidationConfig, Validator};
