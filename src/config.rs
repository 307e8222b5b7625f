#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{PoolError, Result};

/// Capacity and validation settings for a single pool.
///
/// `max_capacity` bounds the number of *idle* instances a pool keeps. It does
/// not limit how many instances may be handed out at once: once the free-list
/// is full, further returns are destroyed instead of pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Number of instances created when the pool is built.
    ///
    /// Clamped to `max_capacity`.
    pub initial_capacity: usize,
    /// Maximum number of idle instances held by the pool.
    pub max_capacity: usize,
    /// Reject returns that cannot belong to the pool.
    pub validate_on_return: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            max_capacity: 100,
            validate_on_return: true,
        }
    }
}

impl PoolConfig {
    /// Large free-list, eager prewarm and no return validation.
    pub fn high_performance() -> Self {
        Self {
            initial_capacity: 32,
            max_capacity: 1024,
            validate_on_return: false,
        }
    }

    /// Small free-list; anything returned past it is destroyed right away.
    pub fn memory_optimized() -> Self {
        Self {
            initial_capacity: 0,
            max_capacity: 16,
            validate_on_return: true,
        }
    }

    /// Sets the number of instances prewarmed at build time.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the idle-slot ceiling.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Enables or disables validation of returned items.
    pub fn with_validation(mut self, validate_on_return: bool) -> Self {
        self.validate_on_return = validate_on_return;
        self
    }

    /// Checks that the configuration can back a pool.
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "max_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Number of instances actually prewarmed at build time.
    pub(crate) fn effective_initial(&self) -> usize {
        self.initial_capacity.min(self.max_capacity)
    }
}
