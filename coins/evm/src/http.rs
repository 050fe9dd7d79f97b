//! EIP-1193 over plain JSON-RPC, for running outside the browser.
//!
//! Useful against endpoints that hold unlocked accounts and sign on request:
//! a local dev node, or a desktop wallet such as Frame.

use async_trait::async_trait;
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_rpc::{RpcClient, RpcConfig};
use paybridge_traits::EventStream;
use serde_json::Value;
use tracing::debug;

use crate::transport::Eip1193Transport;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// [`Eip1193Transport`] backed by an HTTP JSON-RPC endpoint.
#[derive(Debug)]
pub struct HttpTransport {
    client: RpcClient,
}

impl HttpTransport {
    /// Connects to the configured endpoint
    pub fn new(config: RpcConfig) -> ProviderResult<Self> {
        Ok(Self {
            client: RpcClient::new(config)?,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        self.client.url()
    }
}

#[async_trait(?Send)]
impl Eip1193Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        self.client
            .call::<Value, Value>(method, params)
            .await
            .map_err(ProviderError::from)
    }

    async fn enable(&self) -> ProviderResult<Value> {
        match self.request("eth_requestAccounts", Value::Array(Vec::new())).await {
            Err(ProviderError::Rpc {
                code: METHOD_NOT_FOUND,
                ..
            }) => {
                debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.request("eth_accounts", Value::Array(Vec::new())).await
            }
            other => other,
        }
    }

    fn subscribe(&mut self) -> Option<Box<dyn EventStream>> {
        None
    }
}
