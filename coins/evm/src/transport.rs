//! The EIP-1193 seam: `request`, `on` and the WalletConnect session fields.

use async_trait::async_trait;
use paybridge_error::ProviderResult;
use paybridge_traits::EventStream;
use serde_json::Value;

/// An EIP-1193 provider object.
///
/// In the browser this is `window.ethereum` or a WalletConnect provider; the
/// CLI uses an HTTP JSON-RPC endpoint. Tests use the mock transport from
/// `paybridge-testing`.
#[async_trait(?Send)]
pub trait Eip1193Transport {
    /// `provider.request({ method, params })`
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value>;

    /// Asks the wallet to expose accounts; returns the account list.
    ///
    /// WalletConnect providers override this with their `enable()`.
    async fn enable(&self) -> ProviderResult<Value> {
        self.request("eth_requestAccounts", Value::Array(Vec::new()))
            .await
    }

    /// Registers `accountsChanged`, `chainChanged` and `disconnect` listeners.
    /// Returns `None` when the transport never emits events.
    fn subscribe(&mut self) -> Option<Box<dyn EventStream>>;

    /// `provider.accounts` of a WalletConnect session
    fn session_accounts(&self) -> Vec<String> {
        Vec::new()
    }

    /// `provider.chainId` of a WalletConnect session
    fn session_chain_id(&self) -> Option<u64> {
        None
    }

    /// Tears the session down and removes listeners
    async fn close(&mut self) -> ProviderResult<()> {
        Ok(())
    }
}
