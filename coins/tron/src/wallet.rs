use std::cell::Cell;
use std::rc::Rc;

use alloy::primitives::U256;
use async_trait::async_trait;
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_traits::{
    Connection, EventStream, ProviderEvent, ProviderKind, TxHash, WalletProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::address::validate_address;
use crate::bridge::TronLinkBridge;
use crate::handshake::{Handshake, HandshakeEffect};
use crate::protocol::TronLinkMessage;

/// Default interval between `window.tronLink` polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Injection polling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TronLinkConfig {
    /// Delay between polls in milliseconds
    pub poll_interval_ms: u64,
    /// Give up after this many polls; `None` polls forever
    pub max_poll_attempts: Option<u32>,
}

impl Default for TronLinkConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_poll_attempts: None,
        }
    }
}

/// TronLink extension as a [`WalletProvider`].
///
/// `connect` never waits for the extension. When `window.tronLink` is
/// already there it installs the message listener and fires
/// `tron_requestAccounts`; otherwise the event stream keeps polling and
/// does both once the extension shows up. The account arrives later as
/// [`ProviderEvent::Authorized`].
pub struct TronLinkWallet<B: TronLinkBridge + 'static> {
    bridge: Rc<B>,
    config: TronLinkConfig,
    events: Option<TronLinkEvents<B>>,
    cancelled: Rc<Cell<bool>>,
}

impl<B: TronLinkBridge + 'static> TronLinkWallet<B> {
    /// Creates a wallet over the given bridge
    pub fn new(bridge: Rc<B>, config: TronLinkConfig) -> Self {
        Self {
            bridge,
            config,
            events: None,
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    /// The underlying bridge
    pub fn bridge(&self) -> &Rc<B> {
        &self.bridge
    }
}

#[async_trait(?Send)]
impl<B: TronLinkBridge + 'static> WalletProvider for TronLinkWallet<B> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::TronLink
    }

    async fn connect(&mut self) -> ProviderResult<Connection> {
        self.cancelled.set(true);
        self.cancelled = Rc::new(Cell::new(false));

        let mut events = TronLinkEvents {
            rx: None,
            handshake: Handshake::new(),
            bridge: Rc::clone(&self.bridge),
            config: self.config.clone(),
            failed_polls: 0,
            cancelled: Rc::clone(&self.cancelled),
        };
        if self.bridge.is_injected() {
            events.start().await?;
        } else {
            events.failed_polls = 1;
            if let Some(err) = events.poll_limit_reached() {
                return Err(err);
            }
            info!("[tronLink] waiting for the extension");
        }
        self.events = Some(events);
        Ok(Connection::default())
    }

    fn take_events(&mut self) -> Option<Box<dyn EventStream>> {
        self.events
            .take()
            .map(|events| Box::new(events) as Box<dyn EventStream>)
    }

    async fn disconnect(&mut self) -> ProviderResult<()> {
        self.cancelled.set(true);
        self.bridge.unlisten();
        self.events = None;
        Ok(())
    }

    async fn address(&self) -> ProviderResult<Option<String>> {
        Ok(self.bridge.default_address())
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        Ok(0)
    }

    async fn balance(&self, address: &str) -> ProviderResult<U256> {
        self.bridge.get_balance(address).await
    }

    async fn send_native(&self, from: &str, to: &str, amount: U256) -> ProviderResult<TxHash> {
        validate_address(to)?;
        debug!(from, to, %amount, "sending TRX");
        self.bridge.send_trx(to, amount).await
    }

    async fn send_token(
        &self,
        from: &str,
        contract: &str,
        to: &str,
        amount: U256,
    ) -> ProviderResult<TxHash> {
        validate_address(contract)?;
        validate_address(to)?;
        debug!(from, contract, to, %amount, "sending TRC-20 transfer");
        self.bridge.send_trc20(contract, to, amount).await
    }
}

/// Event stream that drives the handshake from window messages.
///
/// Until the extension is injected the stream polls for it, sleeping
/// `poll_interval_ms` between checks. It ends when the owning wallet
/// disconnects.
pub struct TronLinkEvents<B: TronLinkBridge> {
    rx: Option<mpsc::UnboundedReceiver<Value>>,
    handshake: Handshake,
    bridge: Rc<B>,
    config: TronLinkConfig,
    failed_polls: u32,
    cancelled: Rc<Cell<bool>>,
}

impl<B: TronLinkBridge> TronLinkEvents<B> {
    /// Handshake state, for diagnostics
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    fn poll_limit_reached(&self) -> Option<ProviderError> {
        let max = self.config.max_poll_attempts?;
        (self.failed_polls >= max).then_some(ProviderError::InjectionTimeout {
            attempts: self.failed_polls,
        })
    }

    /// Polls until the extension is injected. `Ok(false)` once the wallet
    /// was disconnected.
    async fn wait_for_extension(&mut self) -> ProviderResult<bool> {
        loop {
            if self.cancelled.get() {
                return Ok(false);
            }
            if let Some(err) = self.poll_limit_reached() {
                return Err(err);
            }
            self.bridge.sleep_ms(self.config.poll_interval_ms).await?;
            if self.cancelled.get() {
                return Ok(false);
            }
            if self.bridge.is_injected() {
                return Ok(true);
            }
            self.failed_polls = self.failed_polls.saturating_add(1);
        }
    }

    /// Listens for window messages and asks for the accounts
    async fn start(&mut self) -> ProviderResult<()> {
        info!(polls = self.failed_polls, "tronLink found");
        self.handshake.extension_found();
        let rx = self.bridge.listen();

        debug!("[tronLink] request tron_requestAccounts");
        if let Err(e) = self.bridge.request_accounts().await {
            self.bridge.unlisten();
            return Err(e);
        }
        self.rx = Some(rx);
        Ok(())
    }

    fn effect_to_event(&mut self, effect: HandshakeEffect) -> Option<ProviderEvent> {
        match effect {
            HandshakeEffect::Connected => {
                info!("[tronLink] connect");
                Some(ProviderEvent::Connected)
            }
            HandshakeEffect::Authorized { address } => {
                info!(%address, "[tronLink] authorized wallet");
                Some(ProviderEvent::Authorized { address })
            }
            HandshakeEffect::AuthorizedDefault => match self.bridge.default_address() {
                Some(address) => {
                    info!(%address, "[tronLink] reply for requestAccounts");
                    self.handshake.resolve_default_address(&address);
                    Some(ProviderEvent::Authorized { address })
                }
                None => {
                    warn!("[tronLink] request approved but tronWeb has no default address");
                    None
                }
            },
            HandshakeEffect::AccountChanged { address } => {
                info!(%address, "[tronLink] setAccount");
                Some(ProviderEvent::AccountsChanged(vec![address]))
            }
        }
    }
}

#[async_trait(?Send)]
impl<B: TronLinkBridge> EventStream for TronLinkEvents<B> {
    async fn next_event(&mut self) -> Option<ProviderEvent> {
        if self.rx.is_none() {
            let started = match self.wait_for_extension().await {
                Ok(true) => self.start().await,
                Ok(false) => return None,
                Err(e) => Err(e),
            };
            if let Err(e) = started {
                warn!(error = %e, "[tronLink] giving up");
                self.cancelled.set(true);
                return Some(ProviderEvent::Failed(e.to_string()));
            }
            if self.cancelled.get() {
                self.bridge.unlisten();
                self.rx = None;
                return None;
            }
        }
        loop {
            let data = self.rx.as_mut()?.recv().await?;
            let Some(message) = TronLinkMessage::from_window_data(&data) else {
                continue;
            };
            debug!(action = message.action(), "[tronLink] message");
            if let Some(effect) = self.handshake.on_message(&message) {
                if let Some(event) = self.effect_to_event(effect) {
                    return Some(event);
                }
            }
        }
    }
}
