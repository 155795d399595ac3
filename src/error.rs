//! Error types for the grouping and selection core.

use thiserror::Error;

use crate::epoch::EpochId;

/// Result type alias for core tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types. The application layer wraps these in `anyhow`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A grouping key could not produce a usable value for an epoch.
    /// The tree that was being built is discarded.
    #[error("grouping by '{key}' failed for epoch {epoch}: {reason}")]
    GroupingFailed {
        key: String,
        epoch: EpochId,
        reason: String,
    },

    /// A node handle from an earlier tree was used after a rebuild.
    #[error("node handle from tree generation {held} used after rebuild (live generation {live})")]
    NodeInvalidated { held: u64, live: u64 },

    /// Two epochs in the inventory share one identity.
    #[error("duplicate epoch identity: {0}")]
    DuplicateEpoch(EpochId),

    /// A grouping key string could not be parsed.
    #[error("invalid grouping key: {0}")]
    InvalidKey(String),
}
