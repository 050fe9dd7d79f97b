//! # paybridge RPC
//!
//! A small JSON-RPC 2.0 client for talking to an EVM node or a signing
//! daemon (Frame, an unlocked dev node) from outside the browser. The CLI
//! uses it as the transport behind an "injected" provider so that the same
//! connection manager code paths run natively.
//!
//! ## Features
//!
//! - HTTP client with connection reuse and gzip
//! - Optional request rate limiting
//! - EIP-1193 error codes preserved on RPC failures
//!
//! ## Example
//!
//! ```ignore
//! use paybridge_rpc::{RpcClient, RpcConfig};
//!
//! let client = RpcClient::new(RpcConfig::new("http://127.0.0.1:8545"))?;
//! let chain_id: String = client.call("eth_chainId", Vec::<()>::new()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use paybridge_error::ProviderError;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// RPC client errors
#[derive(Error, Debug)]
pub enum RpcError {
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RPC error response
    #[error("RPC error: code={code}, message={message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Response carried neither a result nor an error
    #[error("No result in response to {0}")]
    EmptyResponse(String),
}

/// Result type for RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;

impl From<RpcError> for ProviderError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Rpc { code, message } => ProviderError::from_rpc(code, message),
            RpcError::Json(e) => ProviderError::invalid_response("json", e.to_string()),
            RpcError::EmptyResponse(method) => {
                ProviderError::invalid_response(method, "missing result")
            }
            other => ProviderError::Transport(other.to_string()),
        }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst size (max requests in a burst)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

/// Configuration for an RPC endpoint
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Endpoint URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Optional client-side rate limit
    pub rate_limit: Option<RateLimitConfig>,
}

impl RpcConfig {
    /// Creates a configuration for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("paybridge/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: None,
        }
    }

    /// Sets the request timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enables rate limiting
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url).map_err(|e| RpcError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RpcError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        presets::local_node()
    }
}

/// RPC request payload
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<T: Serialize> {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Method name
    pub method: String,
    /// Parameters
    pub params: T,
    /// Request ID
    pub id: u64,
}

impl<T: Serialize> JsonRpcRequest<T> {
    /// Creates a new JSON-RPC request
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// RPC response payload
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// Response ID (number or string, depending on the node)
    #[serde(default)]
    pub id: serde_json::Value,
    /// Result (if successful)
    pub result: Option<T>,
    /// Error (if failed)
    pub error: Option<JsonRpcError>,
}

/// RPC error
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Additional data
    pub data: Option<serde_json::Value>,
}

/// HTTP JSON-RPC client bound to one endpoint
pub struct RpcClient {
    client: Client,
    url: String,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client for the configured endpoint
    pub fn new(config: RpcConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;

        let rate_limiter = match config.rate_limit {
            Some(limit) => {
                let per_second = NonZeroU32::new(limit.requests_per_second).ok_or_else(|| {
                    RpcError::InvalidConfig("requests_per_second must be non-zero".into())
                })?;
                let burst = NonZeroU32::new(limit.burst_size)
                    .ok_or_else(|| RpcError::InvalidConfig("burst_size must be non-zero".into()))?;
                Some(RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)))
            }
            None => None,
        };

        Ok(Self {
            client,
            url: config.url,
            rate_limiter,
            request_id: AtomicU64::new(1),
        })
    }

    /// Returns the endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Makes a JSON-RPC request
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(method, params, id);
        tracing::debug!(method, id, url = %self.url, "rpc request");

        let response = self.client.post(&self.url).json(&request).send().await?;
        let rpc_response: JsonRpcResponse<R> = response.json().await?;

        if let Some(error) = rpc_response.error {
            tracing::debug!(method, code = error.code, "rpc error: {}", error.message);
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::EmptyResponse(method.to_string()))
    }

    /// Returns the number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst) - 1
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url)
            .field("request_count", &self.request_count())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish()
    }
}

/// Common endpoints that hold unlocked accounts
pub mod presets {
    use super::RpcConfig;

    /// Local development node (anvil, hardhat, geth --dev)
    pub fn local_node() -> RpcConfig {
        RpcConfig::new("http://127.0.0.1:8545")
    }

    /// Frame desktop wallet
    pub fn frame() -> RpcConfig {
        RpcConfig::new("http://127.0.0.1:1248").with_timeout(120)
    }
}
