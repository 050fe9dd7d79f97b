//! # paybridge Testing Infrastructure
//!
//! Shared test utilities for the paybridge workspace:
//! - [`MockTransport`]: a scriptable EIP-1193 provider
//! - [`MockTronBridge`]: a scriptable TronLink extension
//! - [`fixtures`]: well-formed addresses and a sample payment manifest
//! - [`strategies`]: proptest strategies for amounts and addresses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paybridge_testing::*;
//!
//! let transport = MockTransport::new()
//!     .with_accounts(&[fixtures::ETH_ADDRESS])
//!     .with_chain_id(56);
//! let mut wallet = EvmWallet::injected(transport.clone());
//! wallet.connect().await?;
//! assert_eq!(transport.count("eth_requestAccounts"), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod evm;
mod tron;

pub use evm::{MockTransport, MOCK_TX_HASH};
pub use tron::{messages as tron_messages, MockTronBridge, TronTransfer};

// ============================================================================
// Fixtures
// ============================================================================

/// Well-formed addresses and manifests
pub mod fixtures {
    use paybridge_tron::address::{encode_base58, PAYLOAD_LEN, TRON_ADDRESS_PREFIX};

    /// Connected EVM account
    pub const ETH_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    /// EVM payment recipient
    pub const ETH_RECIPIENT: &str = "0x8ba1f109551bD432803012645Ac136ddd64DBA72";

    /// Tether on Ethereum
    pub const USDT_ERC20: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    /// Tether on Tron
    pub const USDT_TRC20: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    /// Deterministic valid Tron address derived from `seed`
    pub fn tron_address(seed: u8) -> String {
        let mut payload = [seed; PAYLOAD_LEN];
        payload[0] = TRON_ADDRESS_PREFIX;
        encode_base58(&payload)
    }

    /// Payment manifest covering every dispatch path
    pub const SAMPLE_MANIFEST: &str = r#"{
        "ETH": { "type": "evm", "decimals": 18 },
        "USDT_ERC20": { "type": "evm", "contract": "0xdAC17F958D2ee523a2206206994597C13D831ec7", "decimals": 6 },
        "BNB": { "type": "evm", "decimals": 18, "chainId": 56 },
        "TRX": { "type": "tron", "decimals": 6 },
        "USDT_TRC20": { "type": "tron", "contract": "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", "decimals": 6 }
    }"#;
}

// ============================================================================
// Edge Case Amounts
// ============================================================================

/// Amount strings at the edges of decimal parsing
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// Accepted at 6 decimals, with their base-unit value
    pub fn valid_at_6() -> Vec<(&'static str, u64)> {
        vec![
            ("0", 0),
            ("0.000001", 1),
            ("1", 1_000_000),
            ("1.5", 1_500_000),
            (".5", 500_000),
            ("10.", 10_000_000),
            ("1.500000", 1_500_000),
            ("18446744073709", 18_446_744_073_709_000_000),
        ]
    }

    /// Rejected at any precision
    pub fn invalid() -> Vec<&'static str> {
        vec!["", ".", "-1", "+1", "1e6", "0x10", "1,5", "1.2.3", " ", "NaN", "∞"]
    }
}

// ============================================================================
// Property Strategies
// ============================================================================

/// proptest strategies
pub mod strategies {
    use proptest::prelude::*;

    /// A decimal amount string with at most `max_frac` fractional digits
    pub fn decimal_amount(max_frac: usize) -> impl Strategy<Value = String> {
        let frac = proptest::collection::vec(0u8..10, 0..=max_frac);
        ("[0-9]{1,12}", frac).prop_map(|(whole, frac)| {
            if frac.is_empty() {
                whole
            } else {
                let frac: String = frac.iter().map(|d| char::from(b'0' + d)).collect();
                format!("{whole}.{frac}")
            }
        })
    }

    /// A lowercase hex EVM address
    pub fn evm_address() -> impl Strategy<Value = String> {
        proptest::array::uniform20(any::<u8>()).prop_map(|bytes| format!("0x{}", hex::encode(bytes)))
    }

    /// A valid base58 Tron address
    pub fn tron_address() -> impl Strategy<Value = String> {
        any::<u8>().prop_map(super::fixtures::tron_address)
    }

    /// A chain id, biased toward the known ones
    pub fn chain_id() -> impl Strategy<Value = u64> {
        prop_oneof![
            Just(1u64),
            Just(56u64),
            Just(250u64),
            Just(10001u64),
            1u64..100_000u64,
        ]
    }
}
