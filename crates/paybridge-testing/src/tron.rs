//! Scriptable TronLink bridge and window-message builders.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use alloy::primitives::U256;
use async_trait::async_trait;
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_traits::TxHash;
use paybridge_tron::TronLinkBridge;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// A transfer recorded by [`MockTronBridge`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TronTransfer {
    /// TRC-20 contract, `None` for TRX
    pub contract: Option<String>,
    /// Recipient
    pub to: String,
    /// Amount in base units
    pub amount: U256,
}

#[derive(Default)]
struct State {
    inject_after: Option<u32>,
    polls: u32,
    sleeps: Vec<u64>,
    sender: Option<mpsc::UnboundedSender<Value>>,
    listen_count: u32,
    unlisten_count: u32,
    request_count: u32,
    auto_approve: Option<String>,
    request_failure: Option<ProviderError>,
    sleep_failure: Option<ProviderError>,
    default_address: Option<String>,
    balances: HashMap<String, U256>,
    transfers: Vec<TronTransfer>,
    send_failure: Option<ProviderError>,
}

/// In-memory [`TronLinkBridge`]. Clones share state.
#[derive(Clone, Default)]
pub struct MockTronBridge {
    state: Rc<RefCell<State>>,
}

impl MockTronBridge {
    /// Extension present from the first poll
    pub fn new() -> Self {
        Self::default().inject_after(0)
    }

    /// Extension appears after `polls` unsuccessful polls
    pub fn inject_after(self, polls: u32) -> Self {
        self.state.borrow_mut().inject_after = Some(polls);
        self
    }

    /// Extension never appears
    pub fn never_injected() -> Self {
        Self::default()
    }

    /// `tronWeb.defaultAddress.base58`
    pub fn with_default_address(self, address: &str) -> Self {
        self.state.borrow_mut().default_address = Some(address.to_string());
        self
    }

    /// Balance in sun for `address`
    pub fn with_balance(self, address: &str, sun: U256) -> Self {
        self.state
            .borrow_mut()
            .balances
            .insert(address.to_string(), sun);
        self
    }

    /// On `tron_requestAccounts`, echo the tunnel message with `uuid` and
    /// reply with code 200, as TronLink does for an already-approved site
    pub fn with_auto_approve(self, uuid: &str) -> Self {
        self.state.borrow_mut().auto_approve = Some(uuid.to_string());
        self
    }

    /// Makes `request_accounts` fail
    pub fn fail_requests(self, error: ProviderError) -> Self {
        self.state.borrow_mut().request_failure = Some(error);
        self
    }

    /// Makes the poll timer fail
    pub fn fail_sleeps(self, error: ProviderError) -> Self {
        self.state.borrow_mut().sleep_failure = Some(error);
        self
    }

    /// Makes transfers fail
    pub fn fail_sends(self, error: ProviderError) -> Self {
        self.state.borrow_mut().send_failure = Some(error);
        self
    }

    /// Posts a raw window message; false when no listener is installed
    pub fn push(&self, data: Value) -> bool {
        match &self.state.borrow().sender {
            Some(tx) => tx.send(data).is_ok(),
            None => false,
        }
    }

    /// Number of injection polls performed
    pub fn polls(&self) -> u32 {
        self.state.borrow().polls
    }

    /// Recorded sleep durations
    pub fn sleeps(&self) -> Vec<u64> {
        self.state.borrow().sleeps.clone()
    }

    /// Whether a listener is installed
    pub fn is_listening(&self) -> bool {
        self.state.borrow().sender.is_some()
    }

    /// Number of `listen` calls
    pub fn listen_count(&self) -> u32 {
        self.state.borrow().listen_count
    }

    /// Number of `unlisten` calls
    pub fn unlisten_count(&self) -> u32 {
        self.state.borrow().unlisten_count
    }

    /// Number of `tron_requestAccounts` requests
    pub fn request_count(&self) -> u32 {
        self.state.borrow().request_count
    }

    /// Recorded transfers
    pub fn transfers(&self) -> Vec<TronTransfer> {
        self.state.borrow().transfers.clone()
    }

    fn record_transfer(&self, transfer: TronTransfer) -> ProviderResult<TxHash> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = &state.send_failure {
            return Err(err.clone());
        }
        state.transfers.push(transfer);
        Ok(TxHash::new(format!("{:064x}", state.transfers.len())))
    }
}

#[async_trait(?Send)]
impl TronLinkBridge for MockTronBridge {
    fn is_injected(&self) -> bool {
        let mut state = self.state.borrow_mut();
        let seen = state.polls;
        state.polls += 1;
        matches!(state.inject_after, Some(n) if seen >= n)
    }

    async fn sleep_ms(&self, ms: u64) -> ProviderResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = &state.sleep_failure {
            return Err(err.clone());
        }
        state.sleeps.push(ms);
        Ok(())
    }

    fn listen(&self) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.borrow_mut();
        state.sender = Some(tx);
        state.listen_count += 1;
        rx
    }

    fn unlisten(&self) {
        let mut state = self.state.borrow_mut();
        state.sender = None;
        state.unlisten_count += 1;
    }

    async fn request_accounts(&self) -> ProviderResult<()> {
        let auto_approve = {
            let mut state = self.state.borrow_mut();
            state.request_count += 1;
            if let Some(err) = &state.request_failure {
                return Err(err.clone());
            }
            state.auto_approve.clone()
        };
        if let Some(uuid) = auto_approve {
            self.push(messages::request_accounts(&uuid));
            self.push(messages::reply(&uuid, 200));
        }
        Ok(())
    }

    fn default_address(&self) -> Option<String> {
        self.state.borrow().default_address.clone()
    }

    async fn get_balance(&self, address: &str) -> ProviderResult<U256> {
        Ok(self
            .state
            .borrow()
            .balances
            .get(address)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn send_trx(&self, to: &str, amount: U256) -> ProviderResult<TxHash> {
        self.record_transfer(TronTransfer {
            contract: None,
            to: to.to_string(),
            amount,
        })
    }

    async fn send_trc20(&self, contract: &str, to: &str, amount: U256) -> ProviderResult<TxHash> {
        self.record_transfer(TronTransfer {
            contract: Some(contract.to_string()),
            to: to.to_string(),
            amount,
        })
    }
}

/// Builders for the window messages TronLink posts
pub mod messages {
    use super::*;

    /// `tunnel` echo of our `tron_requestAccounts` request
    pub fn request_accounts(uuid: &str) -> Value {
        json!({
            "message": {
                "action": "tunnel",
                "data": {
                    "action": "request",
                    "uuid": uuid,
                    "data": {"method": "tron_requestAccounts"}
                }
            }
        })
    }

    /// `connect`
    pub fn connect() -> Value {
        json!({"message": {"action": "connect", "data": {}}})
    }

    /// `tabReply` named `Wallet`
    pub fn wallet_auth(address: &str, authorized: bool) -> Value {
        json!({
            "message": {
                "action": "tabReply",
                "data": {"isAuth": authorized, "data": {"name": "Wallet", "address": address}}
            }
        })
    }

    /// `tabReply` answering request `uuid`
    pub fn reply(uuid: &str, code: i64) -> Value {
        json!({
            "message": {
                "action": "tabReply",
                "data": {"uuid": uuid, "data": {"code": code, "message": "ok"}}
            }
        })
    }

    /// `setAccount`
    pub fn set_account(address: &str) -> Value {
        json!({"message": {"action": "setAccount", "data": {"address": address}}})
    }
}
