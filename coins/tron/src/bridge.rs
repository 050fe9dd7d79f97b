//! The seam between the TronLink wallet logic and the browser.

use alloy::primitives::U256;
use async_trait::async_trait;
use paybridge_error::ProviderResult;
use paybridge_traits::TxHash;
use serde_json::Value;
use tokio::sync::mpsc;

/// Access to `window.tronLink`, its `tronWeb` object and window messages.
///
/// The browser implementation lives in `paybridge-wasm`; tests use the mock
/// bridge from `paybridge-testing`.
#[async_trait(?Send)]
pub trait TronLinkBridge {
    /// Whether `window.tronLink` exists yet
    fn is_injected(&self) -> bool;

    /// Waits between injection polls. An error ends the poll.
    async fn sleep_ms(&self, ms: u64) -> ProviderResult<()>;

    /// Installs the window-message handler; every `event.data` is forwarded
    /// to the returned receiver. Replaces any previous handler.
    fn listen(&self) -> mpsc::UnboundedReceiver<Value>;

    /// Blanks the window-message handler
    fn unlisten(&self);

    /// `tronLink.request({ method: "tron_requestAccounts" })`
    async fn request_accounts(&self) -> ProviderResult<()>;

    /// `tronWeb.defaultAddress.base58`, when tronWeb is ready
    fn default_address(&self) -> Option<String>;

    /// `tronWeb.trx.getBalance(address)` in sun
    async fn get_balance(&self, address: &str) -> ProviderResult<U256>;

    /// `tronWeb.trx.sendTransaction(to, amount)` with `amount` in sun
    async fn send_trx(&self, to: &str, amount: U256) -> ProviderResult<TxHash>;

    /// `(await tronWeb.contract().at(contract)).transfer(to, amount).send()`
    async fn send_trc20(&self, contract: &str, to: &str, amount: U256) -> ProviderResult<TxHash>;
}
