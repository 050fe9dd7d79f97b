//! Scriptable EIP-1193 transport.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use alloy::primitives::U256;
use async_trait::async_trait;
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_evm::{chain_id_hex, Eip1193Transport};
use paybridge_traits::{ChannelEvents, EventStream, ProviderEvent};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Hash returned by `eth_sendTransaction` unless overridden
pub const MOCK_TX_HASH: &str =
    "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

#[derive(Default)]
struct State {
    responses: HashMap<String, Value>,
    failures: HashMap<String, ProviderError>,
    requests: Vec<(String, Value)>,
    events: Option<mpsc::UnboundedSender<ProviderEvent>>,
    session_accounts: Vec<String>,
    session_chain_id: Option<u64>,
    apply_switch: bool,
    subscribe_count: u32,
    closed: bool,
}

/// An in-memory [`Eip1193Transport`].
///
/// Clones share state, so a test can keep a handle after moving the
/// transport into a wallet and then inspect requests or emit events.
#[derive(Clone)]
pub struct MockTransport {
    state: Rc<RefCell<State>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Mainnet, no accounts, zero balance, switches apply
    pub fn new() -> Self {
        let transport = Self {
            state: Rc::new(RefCell::new(State {
                apply_switch: true,
                ..State::default()
            })),
        };
        transport
            .respond("eth_chainId", json!("0x1"))
            .respond("eth_requestAccounts", json!([]))
            .respond("eth_accounts", json!([]))
            .respond("eth_getBalance", json!("0x0"))
            .respond("eth_sendTransaction", json!(MOCK_TX_HASH))
            .respond("wallet_switchEthereumChain", Value::Null)
    }

    /// Sets the fixed response for a method
    pub fn respond(self, method: &str, value: Value) -> Self {
        self.state
            .borrow_mut()
            .responses
            .insert(method.to_string(), value);
        self
    }

    /// Makes a method fail until [`MockTransport::clear_failure`]
    pub fn fail(self, method: &str, error: ProviderError) -> Self {
        self.state
            .borrow_mut()
            .failures
            .insert(method.to_string(), error);
        self
    }

    /// Lets a previously failing method succeed again
    pub fn clear_failure(&self, method: &str) {
        self.state.borrow_mut().failures.remove(method);
    }

    /// Accounts returned by `eth_requestAccounts` and `eth_accounts`
    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        let value = json!(accounts);
        self.respond("eth_requestAccounts", value.clone())
            .respond("eth_accounts", value)
    }

    /// Chain reported by `eth_chainId`
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.respond("eth_chainId", json!(chain_id_hex(chain_id)))
    }

    /// Balance reported by `eth_getBalance`
    pub fn with_balance(self, wei: U256) -> Self {
        self.respond("eth_getBalance", json!(format!("0x{wei:x}")))
    }

    /// WalletConnect `provider.accounts` / `provider.chainId`
    pub fn with_session(self, accounts: &[&str], chain_id: u64) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.session_accounts = accounts.iter().map(|a| a.to_string()).collect();
            state.session_chain_id = Some(chain_id);
        }
        self
    }

    /// Whether `wallet_switchEthereumChain` changes the reported chain
    pub fn with_switch_applied(self, applied: bool) -> Self {
        self.state.borrow_mut().apply_switch = applied;
        self
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state.borrow().requests.clone()
    }

    /// Params of every request for `method`
    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Number of requests for `method`
    pub fn count(&self, method: &str) -> usize {
        self.requests_for(method).len()
    }

    /// Pushes an event to the current subscriber; false without one
    pub fn emit(&self, event: ProviderEvent) -> bool {
        match &self.state.borrow().events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Number of `subscribe` calls
    pub fn subscribe_count(&self) -> u32 {
        self.state.borrow().subscribe_count
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

#[async_trait(?Send)]
impl Eip1193Transport for MockTransport {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let mut state = self.state.borrow_mut();
        state.requests.push((method.to_string(), params.clone()));

        if let Some(err) = state.failures.get(method) {
            return Err(err.clone());
        }

        if method == "wallet_switchEthereumChain" && state.apply_switch {
            if let Some(chain) = params.get(0).and_then(|p| p.get("chainId")).cloned() {
                state.responses.insert("eth_chainId".to_string(), chain);
            }
        }

        state
            .responses
            .get(method)
            .cloned()
            .ok_or_else(|| ProviderError::Rpc {
                code: -32601,
                message: format!("method {method} not found"),
            })
    }

    fn subscribe(&mut self) -> Option<Box<dyn EventStream>> {
        let (tx, events) = ChannelEvents::channel();
        let mut state = self.state.borrow_mut();
        state.events = Some(tx);
        state.subscribe_count += 1;
        Some(Box::new(events))
    }

    fn session_accounts(&self) -> Vec<String> {
        self.state.borrow().session_accounts.clone()
    }

    fn session_chain_id(&self) -> Option<u64> {
        self.state.borrow().session_chain_id
    }

    async fn close(&mut self) -> ProviderResult<()> {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.events = None;
        Ok(())
    }
}
