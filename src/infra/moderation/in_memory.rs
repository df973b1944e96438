// In-memory implementation of FilterStore.
//
// Useful for tests and local development where filter changes don't need to
// survive a restart. The SQLite store implements the same trait for
// deployments that do.

use crate::core::moderation::{FilterConfig, FilterStore, ModerationError};
use async_trait::async_trait;
use std::sync::RwLock;

/// Holds the single filter configuration behind a lock. Reads clone the
/// config, so concurrent moderation calls never observe a partial update.
pub struct InMemoryFilterStore {
    config: RwLock<FilterConfig>,
}

impl InMemoryFilterStore {
    /// Create a store seeded with the default configuration.
    pub fn new() -> Self {
        Self::with_config(FilterConfig::default())
    }

    /// Create a store seeded with a specific configuration.
    #[allow(dead_code)]
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl Default for InMemoryFilterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilterStore for InMemoryFilterStore {
    async fn load(&self) -> Result<FilterConfig, ModerationError> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|e| ModerationError::StorageError(e.to_string()))
    }

    async fn save(&self, config: FilterConfig) -> Result<(), ModerationError> {
        let mut guard = self
            .config
            .write()
            .map_err(|e| ModerationError::StorageError(e.to_string()))?;
        *guard = config;
        Ok(())
    }
}
