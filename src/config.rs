//! World configuration

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tuning knobs for a [`World`](crate::World).
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
///
/// ```
/// use sparse_ecs::WorldConfig;
///
/// let config = WorldConfig::from_json(r#"{ "entity_capacity": 4096 }"#).unwrap();
/// assert_eq!(config.entity_capacity, 4096);
/// assert_eq!(config.entity_cache_threshold, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Live entities to reserve room for
    pub entity_capacity: usize,

    /// Distinct queries to reserve room for
    pub query_capacity: usize,

    /// Queries with more matches than this keep their materialized entity
    /// list between reads instead of rebuilding it each time
    pub entity_cache_threshold: usize,
}

impl WorldConfig {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            // Most apps have a few dozen distinct filters
            query_capacity: 32,
            entity_cache_threshold: 100,
        }
    }
}
