//! Payload Validator

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Ingest payload as received, before any checks
///
/// Fields are kept as raw JSON so that absent, `null`, `0` and wrongly typed
/// values can be told apart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub humidity_value: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
}

/// Reading that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReading {
    pub humidity_value: f64,
    /// Location label exactly as received
    pub location: String,
    /// Soft findings that do not reject the reading
    pub warnings: Vec<ValidationError>,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Expected humidity range (%). Values outside it are accepted with a warning.
    pub humidity_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            humidity_range: (0.0, 100.0),
        }
    }
}

/// Validator for ingest payloads
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a raw payload
    ///
    /// Hard failures reject the reading. Range findings are returned as
    /// warnings on the validated reading.
    pub fn validate(&self, raw: &RawReading) -> Result<ValidatedReading, ValidationError> {
        let humidity_value = self.validate_humidity(raw.humidity_value.as_ref())?;
        let location = self.validate_location(raw.location.as_ref())?;

        let mut warnings = Vec::new();
        if let Err(e) = self.check_range("humidity_value", humidity_value, self.config.humidity_range) {
            debug!("Accepting out-of-range reading: {}", e);
            warnings.push(e);
        }

        Ok(ValidatedReading {
            humidity_value,
            location,
            warnings,
        })
    }

    /// Validate the humidity field: present and numeric
    pub fn validate_humidity(&self, value: Option<&Value>) -> Result<f64, ValidationError> {
        match value {
            None | Some(Value::Null) => Err(ValidationError::MissingField("humidity_value")),
            Some(v) => v.as_f64().ok_or(ValidationError::InvalidType {
                field: "humidity_value",
                expected: "number",
            }),
        }
    }

    /// Validate the location field: present, a string, not `""`
    ///
    /// The label is kept verbatim, whitespace included.
    pub fn validate_location(&self, value: Option<&Value>) -> Result<String, ValidationError> {
        let raw = match value {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("location")),
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(ValidationError::InvalidType {
                    field: "location",
                    expected: "string",
                })
            }
        };

        if raw.is_empty() {
            return Err(ValidationError::EmptyField("location"));
        }

        Ok(raw.clone())
    }

    /// Check a value against a range
    pub fn check_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
