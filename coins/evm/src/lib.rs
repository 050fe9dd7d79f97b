//! EIP-1193 wallets for paybridge
//!
//! [`EvmWallet`] drives any [`Eip1193Transport`]: an injected browser
//! provider (MetaMask), a WalletConnect provider, or, natively, an HTTP
//! JSON-RPC endpoint through [`HttpTransport`].
//!
//! ```ignore
//! use paybridge_evm::{EvmWallet, HttpTransport};
//! use paybridge_rpc::presets;
//!
//! let mut wallet = EvmWallet::injected(HttpTransport::new(presets::frame())?);
//! let connection = wallet.connect().await?;
//! ```

#![forbid(unsafe_code)]

pub mod chains;
pub mod erc20;
pub mod parse;
pub mod transport;
mod wallet;

#[cfg(not(target_arch = "wasm32"))]
mod http;

pub use chains::{chain_id_hex, chain_symbol, EvmChain};
pub use transport::Eip1193Transport;
pub use wallet::EvmWallet;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpTransport;

/// Decimal exponent of ether (wei per ETH)
pub const ETHER_DECIMALS: u8 = 18;

/// Expected chain when a payment does not name one
pub const DEFAULT_CHAIN_ID: u64 = 1;
