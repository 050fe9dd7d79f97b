//! Configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paybridge::{ConnectorConfig, ManifestEntry, PaymentManifest};
use paybridge_rpc::{RateLimitConfig, RpcConfig};
use serde::{Deserialize, Serialize};

/// Frame's local JSON-RPC endpoint
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:1248";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    pub rpc_url: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    pub connector: ConnectorConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            timeout_secs: 120,
            requests_per_second: None,
            manifest: None,
            state_dir: None,
            connector: ConnectorConfig::default(),
        }
    }
}

/// Command line and environment overrides
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub manifest: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
}

impl CliConfig {
    /// `<config dir>/paybridge/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("paybridge").join(CONFIG_FILE))
    }

    /// Reads `path`, or the default location when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.rpc_url {
            self.rpc_url = url;
        }
        if overrides.manifest.is_some() {
            self.manifest = overrides.manifest;
        }
        if overrides.state_dir.is_some() {
            self.state_dir = overrides.state_dir;
        }
        self
    }

    pub fn rpc(&self) -> Result<RpcConfig> {
        let mut rpc = RpcConfig::new(&self.rpc_url).with_timeout(self.timeout_secs);
        if let Some(rps) = self.requests_per_second {
            rpc = rpc.with_rate_limit(RateLimitConfig {
                requests_per_second: rps,
                burst_size: rps,
            });
        }
        rpc.validate().context("invalid RPC endpoint")?;
        Ok(rpc)
    }

    /// Preference directory, `<data dir>/paybridge` unless overridden
    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("paybridge"))
                .context("no data directory; pass --state-dir"),
        }
    }

    /// The configured manifest, or native ETH and TRX
    pub fn manifest(&self) -> Result<PaymentManifest> {
        match &self.manifest {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading manifest {}", path.display()))?;
                PaymentManifest::from_json(&text)
                    .with_context(|| format!("parsing manifest {}", path.display()))
            }
            None => Ok(PaymentManifest::from_entries([
                ("ETH", ManifestEntry::evm_native()),
                ("TRX", ManifestEntry::tron_native()),
            ])?),
        }
    }
}
