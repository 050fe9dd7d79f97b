//! # paybridge - one wallet session over MetaMask, WalletConnect and TronLink
//!
//! paybridge keeps a single [`Session`] for whichever wallet the user picked,
//! syncs its native balance, and pays manifest-listed coins and tokens
//! through it.
//!
//! ## Providers
//!
//! | Kind | Chain | Stored as |
//! |------|-------|-----------|
//! | MetaMask (injected EIP-1193) | EVM | `mm` |
//! | WalletConnect | EVM | `walletconnect` |
//! | TronLink | Tron | `tronlink` |
//!
//! ## Example
//!
//! ```ignore
//! use paybridge::prelude::*;
//!
//! let manifest = PaymentManifest::from_json(MANIFEST)?;
//! let mut manager = ConnectionManager::new(factory, MemoryStore::new(), manifest);
//!
//! manager.auto_connect().await;
//! if manager.is_network_valid("USDT_ERC20") {
//!     let hash = manager.pay("USDT_ERC20", recipient, "12.5").await?;
//! }
//! ```
//!
//! Provider events are delivered through [`SessionEvents`]; the host drives
//! them with [`ConnectionManager::pump_event`] or
//! [`ConnectionManager::apply_event`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod factory;
pub mod manager;
pub mod manifest;
pub mod session;
pub mod storage;

pub use config::{ConnectorConfig, DEFAULT_STORAGE_KEY};
pub use error::PayError;
pub use factory::ProviderFactory;
pub use manager::{ConnectionManager, SessionEvents};
pub use manifest::{ManifestEntry, ManifestError, PaymentManifest};
pub use session::{ConnectionStatus, Session};
pub use storage::{MemoryStore, PreferenceStore};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;

// ============================================================================
// Wallet crates
// ============================================================================

pub use paybridge_error as errors;
pub use paybridge_traits as traits;

/// EIP-1193 wallets
pub mod evm {
    pub use paybridge_evm::*;
}

/// TronLink
pub mod tron {
    pub use paybridge_tron::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConnectionManager, ConnectionStatus, ConnectorConfig, ManifestEntry, MemoryStore,
        PayError, PaymentManifest, PreferenceStore, ProviderFactory, Session, SessionEvents,
    };
    pub use paybridge_traits::prelude::*;
}
