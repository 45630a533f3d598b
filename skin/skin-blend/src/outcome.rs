//! Result of a structural update.

use std::fmt;

use skin_skeleton::SkeletonError;

/// What [`ImplicitBlend::update_skeleton`](crate::ImplicitBlend::update_skeleton)
/// did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum UpdateOutcome {
    /// Inputs matched the last snapshot; nothing was done.
    Unchanged,
    /// A new skeleton replaced the previous one.
    Rebuilt {
        /// Bones in the new skeleton.
        bones: usize,
    },
    /// The inputs contribute no bones; the node now has no skeleton.
    Cleared,
    /// The merge failed; the previous skeleton is still in place.
    Rejected(SkeletonError),
}

impl UpdateOutcome {
    /// Whether the held skeleton was replaced or removed.
    #[must_use]
    pub const fn changed_skeleton(&self) -> bool {
        matches!(self, Self::Rebuilt { .. } | Self::Cleared)
    }

    /// The merge error, if the update was rejected.
    #[must_use]
    pub const fn error(&self) -> Option<&SkeletonError> {
        match self {
            Self::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Rebuilt { bones } => write!(f, "rebuilt with {bones} bones"),
            Self::Cleared => write!(f, "cleared"),
            Self::Rejected(err) => write!(f, "rejected: {err}"),
        }
    }
}
