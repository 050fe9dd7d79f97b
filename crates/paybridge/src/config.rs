//! Connection manager configuration

use paybridge_tron::{TronLinkConfig, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};

/// Key the provider preference is stored under
pub const DEFAULT_STORAGE_KEY: &str = "provider";

/// Settings for [`crate::ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorConfig {
    /// Preference key for the last provider kind
    pub storage_key: String,
    /// Delay between `window.tronLink` polls
    pub tron_poll_interval_ms: u64,
    /// Stop polling for TronLink after this many attempts; `None` polls forever
    pub tron_max_poll_attempts: Option<u32>,
    /// On a chain mismatch, ask the wallet to switch and re-check before paying
    pub switch_chain_on_mismatch: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            tron_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tron_max_poll_attempts: None,
            switch_chain_on_mismatch: true,
        }
    }
}

impl ConnectorConfig {
    /// Sets the preference key
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Bounds the TronLink injection poll
    pub fn with_tron_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.tron_max_poll_attempts = Some(attempts);
        self
    }

    /// Enables or disables the chain switch on mismatch
    pub fn with_switch_chain_on_mismatch(mut self, enabled: bool) -> Self {
        self.switch_chain_on_mismatch = enabled;
        self
    }

    /// Polling settings for [`paybridge_tron::TronLinkWallet`]
    pub fn tron_link_config(&self) -> TronLinkConfig {
        TronLinkConfig {
            poll_interval_ms: self.tron_poll_interval_ms,
            max_poll_attempts: self.tron_max_poll_attempts,
        }
    }
}
