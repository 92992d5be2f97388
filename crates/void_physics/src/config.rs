//! Query configuration

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Tuning for batched line tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Batches at least this long are traced on the rayon pool; shorter ones run inline
    pub parallel_threshold: usize,

    /// Capacity reserved for the pending queue and result buffer
    pub initial_capacity: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 32,
            initial_capacity: 64,
        }
    }
}

impl QueryConfig {
    /// Never leave the calling thread
    pub fn serial() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            ..Default::default()
        }
    }

    /// Fan out every non-empty batch
    pub fn always_parallel() -> Self {
        Self {
            parallel_threshold: 1,
            ..Default::default()
        }
    }

    /// Set the parallel threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set initial buffer capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(PhysicsError::InvalidConfig(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
