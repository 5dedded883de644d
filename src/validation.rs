//! Validation Support
//!
//! Request parameters are checked fail-fast: the first offending field is
//! reported and nothing is partially applied.
//!
//! # Example
//!
//! ```rust
//! use hrsearch::validation::ValidationError;
//!
//! let err = ValidationError::new("limit", "limit must be between 1 and 100");
//! assert_eq!(err.to_string(), "limit must be between 1 and 100");
//! assert_eq!(err.field, "limit");
//! ```

use serde::Serialize;
use std::fmt;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message, already naming the field
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// `"{field} must be an integer"`
    #[must_use]
    pub fn not_an_integer(field: &str) -> Self {
        Self::new(field, format!("{field} must be an integer"))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
