//! Validation Error Types

use thiserror::Error;

/// Errors during reading validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Missing required field (absent or `null`)
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but of the wrong JSON type
    #[error("Field {field} must be a {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    /// String field present but empty
    #[error("Field {0} must not be empty")]
    EmptyField(&'static str),

    /// Value outside the expected range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::InvalidType { .. } => "invalid_type",
            ValidationError::EmptyField(_) => "empty_field",
            ValidationError::OutOfRange { .. } => "out_of_range",
        }
    }
}
