//! Error types for skeleton construction and merging.

use thiserror::Error;

/// Result type for skeleton operations.
pub type SkeletonResult<T> = Result<T, SkeletonError>;

/// Errors that can occur while building or merging skeletons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkeletonError {
    /// The surface attachment graph contains a cycle.
    #[error("surface attachment graph contains a cycle through surface {surface}")]
    CyclicAttachment {
        /// A surface index on the cycle.
        surface: usize,
    },

    /// A skeleton must contain at least one bone.
    #[error("a skeleton needs at least one bone")]
    EmptySkeleton,

    /// The bone and parent lists have different lengths.
    #[error("{bones} bones but {parents} parent entries")]
    LengthMismatch {
        /// Number of bones.
        bones: usize,
        /// Number of parent entries.
        parents: usize,
    },

    /// A surface index is at or beyond [`MAX_SURFACES`](crate::MAX_SURFACES).
    #[error("surface index {index} exceeds the limit of {max} surfaces")]
    SurfaceIndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// The surface limit.
        max: usize,
    },

    /// A bone's parent does not precede it.
    #[error("bone at position {position} has parent {parent}, which does not precede it")]
    ParentOutOfOrder {
        /// Position of the offending bone.
        position: usize,
        /// Its parent position.
        parent: usize,
    },
}

impl SkeletonError {
    /// Whether this error is a cyclic attachment rather than a broken
    /// skeleton invariant.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicAttachment { .. })
    }
}
