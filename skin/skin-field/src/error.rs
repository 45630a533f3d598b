//! Error types for field construction.

use thiserror::Error;

/// Result type for field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur when constructing fields or operators.
#[derive(Debug, Error)]
pub enum FieldError {
    /// A field parameter is not a positive, finite number.
    #[error("invalid {name}: expected a positive finite value, got {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Value provided.
        value: f64,
    },

    /// A blend operator exponent is out of range.
    #[error("invalid blend exponent {0}: must be finite and >= 1")]
    InvalidExponent(f64),
}

/// Check that `value` is positive and finite.
pub(crate) fn require_positive(name: &'static str, value: f64) -> FieldResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError::InvalidParameter { name, value })
    }
}
