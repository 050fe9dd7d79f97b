//! # paybridge Traits
//!
//! Shared vocabulary for the paybridge wallet adapter. Every wallet kind the
//! connection manager can drive implements [`WalletProvider`], and reports
//! asynchronous wallet-side changes through an [`EventStream`].
//!
//! ## Core Types
//!
//! - [`ProviderKind`] - which wallet is behind the session (MetaMask, WalletConnect, TronLink)
//! - [`ChainType`] - which ecosystem a payment targets (EVM or Tron)
//! - [`WalletProvider`] - connect, disconnect, balance and transfer capabilities
//! - [`ProviderEvent`] - account, chain and authorization changes pushed by the wallet
//! - [`units`] - exact conversion between human amounts and base units
//!
//! The traits are `?Send`: wallets live on a single UI thread and every call
//! is a cooperative suspension point on a wallet round-trip.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod units;

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

pub use paybridge_error::{ErrorCode, ProviderError, ProviderResult};

/// Which wallet provider backs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Injected EIP-1193 provider (MetaMask and compatible extensions)
    MetaMask,
    /// WalletConnect session
    WalletConnect,
    /// TronLink browser extension
    TronLink,
}

impl ProviderKind {
    /// All provider kinds, in connection-menu order
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::MetaMask,
        ProviderKind::WalletConnect,
        ProviderKind::TronLink,
    ];

    /// The value persisted as the "last provider" preference
    pub fn storage_value(&self) -> &'static str {
        match self {
            ProviderKind::MetaMask => "mm",
            ProviderKind::WalletConnect => "walletconnect",
            ProviderKind::TronLink => "tronlink",
        }
    }

    /// Parses a persisted preference; unknown values yield `None`
    pub fn from_storage_value(value: &str) -> Option<Self> {
        match value {
            "mm" => Some(ProviderKind::MetaMask),
            "walletconnect" => Some(ProviderKind::WalletConnect),
            "tronlink" => Some(ProviderKind::TronLink),
            _ => None,
        }
    }

    /// The chain ecosystem this provider can pay on
    pub fn chain_type(&self) -> ChainType {
        match self {
            ProviderKind::MetaMask | ProviderKind::WalletConnect => ChainType::Evm,
            ProviderKind::TronLink => ChainType::Tron,
        }
    }

    /// Returns true for the EIP-1193 providers
    pub fn is_evm(&self) -> bool {
        self.chain_type() == ChainType::Evm
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::MetaMask => "MetaMask",
            ProviderKind::WalletConnect => "WalletConnect",
            ProviderKind::TronLink => "TronLink",
        };
        f.write_str(name)
    }
}

/// Chain ecosystem a payment or provider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    /// Ethereum Virtual Machine chains (Ethereum, BSC, Fantom, ...)
    Evm,
    /// Tron
    Tron,
}

impl ChainType {
    /// Decimal exponent of the chain's native coin (wei per ETH, sun per TRX)
    pub fn native_decimals(&self) -> u8 {
        match self {
            ChainType::Evm => 18,
            ChainType::Tron => 6,
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainType::Evm => f.write_str("evm"),
            ChainType::Tron => f.write_str("tron"),
        }
    }
}

/// Represents a transaction hash/ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    /// Creates a new TxHash from a string
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a provider reports right after a successful connect call.
///
/// Tron connects report nothing here; their account arrives later through
/// [`ProviderEvent::Authorized`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    /// Accounts exposed by the wallet, selected account first
    pub accounts: Vec<String>,
    /// Chain the wallet is on, when the handshake reports one
    pub chain_id: Option<u64>,
}

impl Connection {
    /// Creates a connection result from accounts only
    pub fn with_accounts(accounts: Vec<String>) -> Self {
        Self {
            accounts,
            chain_id: None,
        }
    }

    /// Sets the reported chain ID
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Returns the selected account
    pub fn primary_account(&self) -> Option<&str> {
        self.accounts.first().map(|s| s.as_str())
    }
}

/// A wallet-side change pushed to the connection manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ProviderEvent {
    /// `accountsChanged`: selected account first, empty when locked
    AccountsChanged(Vec<String>),
    /// `chainChanged`
    ChainChanged(u64),
    /// The wallet accepted the site but has not exposed an account yet
    Connected,
    /// The wallet authorized an account
    Authorized {
        /// Authorized account
        address: String,
    },
    /// The wallet ended the session
    Disconnected,
    /// The wallet gave up before authorizing, e.g. the extension never
    /// appeared
    Failed(String),
}

/// An asynchronous source of [`ProviderEvent`]s.
#[async_trait(?Send)]
pub trait EventStream {
    /// Waits for the next event; `None` once the provider stops emitting
    async fn next_event(&mut self) -> Option<ProviderEvent>;
}

/// [`EventStream`] backed by an unbounded channel.
///
/// Providers that learn about changes through callbacks push into the sender
/// half and hand this stream to the connection manager.
#[derive(Debug)]
pub struct ChannelEvents {
    rx: mpsc::UnboundedReceiver<ProviderEvent>,
}

impl ChannelEvents {
    /// Creates a connected sender/stream pair
    pub fn channel() -> (mpsc::UnboundedSender<ProviderEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Wraps an existing receiver
    pub fn new(rx: mpsc::UnboundedReceiver<ProviderEvent>) -> Self {
        Self { rx }
    }
}

#[async_trait(?Send)]
impl EventStream for ChannelEvents {
    async fn next_event(&mut self) -> Option<ProviderEvent> {
        self.rx.recv().await
    }
}

/// Capability interface shared by every wallet provider.
///
/// Amounts are always in the chain's base units (wei, sun, token base units);
/// scaling from human amounts happens in the payment layer.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Which wallet this is
    fn kind(&self) -> ProviderKind;

    /// Runs the wallet's enable/request handshake
    async fn connect(&mut self) -> ProviderResult<Connection>;

    /// Hands over the provider's event stream; `None` after the first call
    /// or when the provider never emits events
    fn take_events(&mut self) -> Option<Box<dyn EventStream>>;

    /// Ends the session on the wallet side and stops delivering events
    async fn disconnect(&mut self) -> ProviderResult<()>;

    /// Returns the selected account, if the wallet exposes one
    async fn address(&self) -> ProviderResult<Option<String>>;

    /// Returns the active chain ID (0 for chains without one)
    async fn chain_id(&self) -> ProviderResult<u64>;

    /// Returns the native balance of `address` in base units
    async fn balance(&self, address: &str) -> ProviderResult<U256>;

    /// Sends the native coin; resolves once the wallet returns a hash
    async fn send_native(&self, from: &str, to: &str, amount: U256) -> ProviderResult<TxHash>;

    /// Calls `transfer(to, amount)` on a token contract
    async fn send_token(
        &self,
        from: &str,
        contract: &str,
        to: &str,
        amount: U256,
    ) -> ProviderResult<TxHash>;

    /// Asks the wallet to switch to another chain
    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        Err(ProviderError::NotSupported(format!(
            "{} cannot switch to chain {}",
            self.kind(),
            chain_id
        )))
    }

    /// Decimal exponent of the native balance
    fn native_decimals(&self) -> u8 {
        self.kind().chain_type().native_decimals()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::units::{format_units, parse_units};
    pub use crate::{
        ChainType, ChannelEvents, Connection, EventStream, ProviderError, ProviderEvent,
        ProviderKind, ProviderResult, TxHash, WalletProvider,
    };
}
