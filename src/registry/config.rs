//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Default cap on states explored when validating indexed families.
pub const DEFAULT_EXPLORATION_LIMIT: usize = 4096;

/// Tunables for a [`Registry`](super::Registry).
///
/// # Example
///
/// ```rust
/// use tenet::registry::RegistryConfig;
///
/// let config = RegistryConfig::from_json(r#"{ "exploration_limit": 128 }"#).unwrap();
/// assert_eq!(config.exploration_limit, 128);
/// assert!(config.record_history);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of states visited when exploring an indexed state
    /// family for totality validation.
    pub exploration_limit: usize,

    /// Whether instances keep a session log of committed steps.
    pub record_history: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            exploration_limit: DEFAULT_EXPLORATION_LIMIT,
            record_history: true,
        }
    }
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn exploration_limit(mut self, limit: usize) -> Self {
        self.exploration_limit = limit;
        self
    }

    pub fn record_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }
}
