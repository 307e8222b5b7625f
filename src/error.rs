use std::{error::Error as StdError, fmt};

use crate::PoolKey;

/// Boxed error produced by a failing creation callback.
pub type CreateError = Box<dyn StdError + Send + Sync + 'static>;

/// Convenience alias for results produced by this crate.
pub type Result<T, E = PoolError> = std::result::Result<T, E>;

/// Errors surfaced by pools, the pool manager and the registry.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// A pool name or key was empty.
    #[error("pool key must not be empty")]
    EmptyKey,

    /// The pool configuration is unusable.
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// No pool is registered under the key.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolKey),

    /// A pool exists under the key but holds a different item type.
    #[error("pool {key} does not hold items of type {expected}")]
    TypeMismatch {
        /// Key of the pool that was looked up.
        key: PoolKey,
        /// Type name the caller asked for.
        expected: &'static str,
    },

    /// The pool refused a returned item because it failed validation.
    #[error("pool {0} rejected the returned item")]
    Rejected(PoolKey),

    /// The creation callback failed.
    #[error("failed to create pooled instance")]
    Create(#[source] CreateError),
}

impl PoolError {
    /// Returns `true` for wiring mistakes (unknown key, wrong type, bad config).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PoolError::EmptyKey
                | PoolError::InvalidConfig(_)
                | PoolError::PoolNotFound(_)
                | PoolError::TypeMismatch { .. }
        )
    }
}

/// Error returned by [`PoolManager::release`](crate::PoolManager::release).
///
/// The item the caller tried to return is handed back so ownership is never
/// lost on failure.
pub struct ReleaseError<T> {
    error: PoolError,
    item: T,
}

impl<T> ReleaseError<T> {
    pub(crate) fn new(error: PoolError, item: T) -> Self {
        ReleaseError { error, item }
    }

    /// The reason the release failed.
    pub fn error(&self) -> &PoolError {
        &self.error
    }

    /// Consumes the error and returns the rejected item.
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Splits the error into its reason and the rejected item.
    pub fn into_parts(self) -> (PoolError, T) {
        (self.error, self.item)
    }
}

impl<T> fmt::Debug for ReleaseError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for ReleaseError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> StdError for ReleaseError<T> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}
