//! TronLink extension support for paybridge
//!
//! TronLink injects `window.tronLink` some time after page load and talks to
//! the page through window messages. This crate models that conversation:
//! [`protocol`] decodes the messages, [`handshake`] tracks the connect state
//! machine and [`TronLinkWallet`] exposes the result as a
//! [`paybridge_traits::WalletProvider`] over a [`TronLinkBridge`].

#![forbid(unsafe_code)]

pub mod address;
pub mod bridge;
pub mod handshake;
pub mod protocol;
mod wallet;

pub use address::{is_valid_address, validate_address, TRON_ADDRESS_PREFIX};
pub use bridge::TronLinkBridge;
pub use handshake::{Handshake, HandshakeEffect, HandshakeState};
pub use protocol::TronLinkMessage;
pub use wallet::{TronLinkConfig, TronLinkEvents, TronLinkWallet, DEFAULT_POLL_INTERVAL_MS};

/// 1 TRX = 1,000,000 SUN
pub const SUN_PER_TRX: u64 = 1_000_000;

/// Decimal exponent of TRX
pub const TRX_DECIMALS: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;
    use paybridge_traits::ChainType;

    #[test]
    fn test_trx_decimals_match_chain_type() {
        assert_eq!(TRX_DECIMALS, ChainType::Tron.native_decimals());
        assert_eq!(SUN_PER_TRX, 10u64.pow(TRX_DECIMALS as u32));
    }

    #[test]
    fn test_default_config() {
        let config = TronLinkConfig::default();
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.max_poll_attempts, None);
    }
}
