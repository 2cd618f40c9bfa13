//! Store configuration

use std::env;

use serde::Deserialize;

use crate::concurrent::DEFAULT_INITIAL_CAPACITY;

/// Environment variable overriding the first segment capacity
pub const ENV_INITIAL_CAPACITY: &str = "LEDGER_INITIAL_CAPACITY";

/// Environment variable toggling parallel history replay
pub const ENV_PARALLEL_REPLAY: &str = "LEDGER_PARALLEL_REPLAY";

/// Configuration for the event directory and statistics
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Capacity of the first array segment (clamped to at least 1)
    pub initial_capacity: usize,
    /// Replay entity histories on the rayon pool when subscribing
    pub parallel_replay: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            parallel_replay: true,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first segment capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Enable or disable parallel replay
    pub fn with_parallel_replay(mut self, enabled: bool) -> Self {
        self.parallel_replay = enabled;
        self
    }

    /// Effective first segment capacity
    pub fn segment_capacity(&self) -> usize {
        self.initial_capacity.max(1)
    }

    /// Build a config from defaults overridden by environment variables
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_INITIAL_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) => config.initial_capacity = capacity,
                Err(e) => tracing::warn!(
                    var = ENV_INITIAL_CAPACITY,
                    value = %raw,
                    error = %e,
                    "ignoring invalid initial capacity"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_PARALLEL_REPLAY) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.parallel_replay = true,
                "0" | "false" | "no" | "off" => config.parallel_replay = false,
                _ => tracing::warn!(
                    var = ENV_PARALLEL_REPLAY,
                    value = %raw,
                    "ignoring invalid parallel replay flag"
                ),
            }
        }

        config
    }
}
