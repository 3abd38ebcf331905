//! Process-wide scoring weights
//!
//! Explicit shared state with a validated update path, replacing the
//! hidden module-level cache the legacy system relied on. Readers take a
//! snapshot per match; an in-flight match keeps the snapshot it started
//! with and only future matches observe an update.

use tokio::sync::RwLock;

use shared::AlgorithmWeights;

use crate::error::{EngineError, EngineResult};
use crate::traits::WeightsSource;

/// Hot-reloadable weights behind an `RwLock`
pub struct SharedWeights {
    current: RwLock<AlgorithmWeights>,
}

impl SharedWeights {
    /// Create with an initial, validated set of weights.
    pub fn new(initial: AlgorithmWeights) -> EngineResult<Self> {
        initial.validate().map_err(|e| EngineError::ConfigInvalid {
            detail: e.to_string(),
        })?;
        Ok(Self {
            current: RwLock::new(initial),
        })
    }
}

impl Default for SharedWeights {
    fn default() -> Self {
        Self {
            current: RwLock::new(AlgorithmWeights::default()),
        }
    }
}

#[async_trait::async_trait]
impl WeightsSource for SharedWeights {
    async fn snapshot(&self) -> AlgorithmWeights {
        *self.current.read().await
    }

    async fn update(&self, weights: AlgorithmWeights) -> EngineResult<AlgorithmWeights> {
        weights.validate().map_err(|e| EngineError::ConfigInvalid {
            detail: e.to_string(),
        })?;
        let mut guard = self.current.write().await;
        *guard = weights;
        Ok(*guard)
    }
}
