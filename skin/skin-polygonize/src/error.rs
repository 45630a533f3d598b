//! Error types for polygonization.

use skin_field::FieldBounds;
use thiserror::Error;

/// Result type for polygonization.
pub type PolygonizeResult<T> = Result<T, PolygonizeError>;

/// Errors that can occur while sampling or polygonizing a field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolygonizeError {
    /// Cell size must be positive and finite.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// Iso value must be finite.
    #[error("invalid iso value: {0}")]
    InvalidIsoValue(f64),

    /// Normal finite-difference step must be positive and finite.
    #[error("invalid normal epsilon: {0}")]
    InvalidNormalEpsilon(f64),

    /// Sampling bounds must have finite corners.
    #[error("invalid sampling bounds: {0:?}")]
    InvalidBounds(FieldBounds),

    /// No sampling bounds were given and some bone has no support box.
    #[error("field has unbounded support; set explicit sampling bounds")]
    UnboundedField,

    /// The sampling grid would exceed the configured cell limit.
    ///
    /// `cells` saturates at `usize::MAX` when the grid size overflows.
    #[error("sampling grid has {cells} cells, limit is {max}")]
    GridTooLarge {
        /// Cells the grid would need.
        cells: usize,
        /// Configured limit.
        max: usize,
    },
}
