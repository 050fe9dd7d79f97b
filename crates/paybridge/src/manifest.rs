//! Payment manifest: payment code -> chain, contract and decimals.
//!
//! ```json
//! {
//!   "USDT_ERC20": { "type": "evm", "contract": "0xdAC1...", "decimals": 6 },
//!   "TRX": { "type": "tron", "decimals": 6 },
//!   "BNB": { "type": "evm", "decimals": 18, "chainId": 56 }
//! }
//! ```

use std::collections::BTreeMap;

use paybridge_evm::{erc20::parse_address, DEFAULT_CHAIN_ID, ETHER_DECIMALS};
use paybridge_traits::{ChainType, ProviderKind};
use paybridge_tron::{validate_address, TRX_DECIMALS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Session;

/// Manifest loading errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Not a JSON object of entries
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A token entry without decimals
    #[error("Entry '{code}' names a contract but no decimals")]
    MissingDecimals {
        /// Payment code
        code: String,
    },

    /// A contract address that is not valid on the entry's chain
    #[error("Entry '{code}' has an invalid contract: {reason}")]
    InvalidContract {
        /// Payment code
        code: String,
        /// Why the address was rejected
        reason: String,
    },
}

/// One payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Chain ecosystem
    #[serde(rename = "type")]
    pub chain: ChainType,
    /// Token contract; `None` pays in the native coin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Token decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    /// Required EVM chain; defaults to Ethereum mainnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl ManifestEntry {
    /// Native EVM coin
    pub fn evm_native() -> Self {
        Self {
            chain: ChainType::Evm,
            contract: None,
            decimals: Some(ETHER_DECIMALS),
            chain_id: None,
        }
    }

    /// Native TRX
    pub fn tron_native() -> Self {
        Self {
            chain: ChainType::Tron,
            contract: None,
            decimals: Some(TRX_DECIMALS),
            chain_id: None,
        }
    }

    /// A token on `chain`
    pub fn token(chain: ChainType, contract: impl Into<String>, decimals: u8) -> Self {
        Self {
            chain,
            contract: Some(contract.into()),
            decimals: Some(decimals),
            chain_id: None,
        }
    }

    /// Sets the required EVM chain
    pub fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Whether this pays through a token contract
    pub fn is_token(&self) -> bool {
        self.contract.is_some()
    }

    /// Exponent the human amount is scaled by.
    ///
    /// Native EVM transfers always use 18 (wei); everything else uses the
    /// entry's decimals, falling back to the chain's native exponent.
    pub fn transfer_decimals(&self) -> u8 {
        match (self.chain, &self.contract) {
            (ChainType::Evm, None) => ETHER_DECIMALS,
            (chain, _) => self.decimals.unwrap_or(chain.native_decimals()),
        }
    }

    /// Chain the wallet must be on for EVM entries
    pub fn expected_chain_id(&self) -> u64 {
        self.chain_id.unwrap_or(DEFAULT_CHAIN_ID)
    }

    /// Whether `kind` can pay this entry
    pub fn accepts(&self, kind: ProviderKind) -> bool {
        kind.chain_type() == self.chain
    }

    fn validate(&self, code: &str) -> Result<(), ManifestError> {
        let Some(contract) = &self.contract else {
            return Ok(());
        };
        if self.decimals.is_none() {
            return Err(ManifestError::MissingDecimals {
                code: code.to_string(),
            });
        }
        let checked = match self.chain {
            ChainType::Evm => parse_address(contract).map(|_| ()),
            ChainType::Tron => validate_address(contract),
        };
        checked.map_err(|e| ManifestError::InvalidContract {
            code: code.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Static mapping from payment codes to [`ManifestEntry`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentManifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl PaymentManifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a manifest document
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: PaymentManifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates an already-parsed manifest document
    pub fn from_value(value: serde_json::Value) -> Result<Self, ManifestError> {
        let manifest: PaymentManifest = serde_json::from_value(value)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Builds a manifest from entries, validating each
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = (S, ManifestEntry)>,
        S: Into<String>,
    {
        let manifest = Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        self.entries
            .iter()
            .try_for_each(|(code, entry)| entry.validate(code))
    }

    /// Looks up a payment code
    pub fn get(&self, code: &str) -> Option<&ManifestEntry> {
        self.entries.get(code)
    }

    /// All payment codes, sorted
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff `code` exists, its chain matches the session's provider and
    /// the session is connected.
    pub fn is_network_valid(&self, code: &str, session: &Session) -> bool {
        let Some(entry) = self.get(code) else {
            return false;
        };
        let kind_matches = session.provider.is_some_and(|kind| entry.accepts(kind));
        kind_matches && session.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConnectionStatus;
    use paybridge_testing::fixtures;

    fn session(kind: ProviderKind, connected: bool) -> Session {
        Session {
            provider: Some(kind),
            connected,
            status: if connected {
                ConnectionStatus::Connected
            } else {
                ConnectionStatus::Connecting
            },
            ..Session::default()
        }
    }

    #[test]
    fn test_parse_sample() {
        let manifest = PaymentManifest::from_json(fixtures::SAMPLE_MANIFEST).unwrap();
        assert_eq!(manifest.len(), 5);
        assert_eq!(
            manifest.codes().collect::<Vec<_>>(),
            vec!["BNB", "ETH", "TRX", "USDT_ERC20", "USDT_TRC20"]
        );

        let usdt = manifest.get("USDT_ERC20").unwrap();
        assert_eq!(usdt.chain, ChainType::Evm);
        assert!(usdt.is_token());
        assert_eq!(usdt.transfer_decimals(), 6);
        assert_eq!(usdt.expected_chain_id(), 1);

        assert_eq!(manifest.get("BNB").unwrap().expected_chain_id(), 56);
        assert!(manifest.get("DOGE").is_none());
    }

    #[test]
    fn test_transfer_decimals() {
        let mut native = ManifestEntry::evm_native();
        native.decimals = Some(6);
        assert_eq!(native.transfer_decimals(), 18);

        assert_eq!(ManifestEntry::tron_native().transfer_decimals(), 6);
        let bare_trx = ManifestEntry {
            decimals: None,
            ..ManifestEntry::tron_native()
        };
        assert_eq!(bare_trx.transfer_decimals(), 6);

        let token = ManifestEntry::token(ChainType::Tron, fixtures::USDT_TRC20, 8);
        assert_eq!(token.transfer_decimals(), 8);
    }

    #[test]
    fn test_token_without_decimals_rejected() {
        let json = r#"{"X": {"type": "evm", "contract": "0xdAC17F958D2ee523a2206206994597C13D831ec7"}}"#;
        assert!(matches!(
            PaymentManifest::from_json(json),
            Err(ManifestError::MissingDecimals { .. })
        ));
    }

    #[test]
    fn test_contract_checked_against_chain() {
        let json = format!(
            r#"{{"X": {{"type": "tron", "contract": "{}", "decimals": 6}}}}"#,
            fixtures::USDT_ERC20
        );
        assert!(matches!(
            PaymentManifest::from_json(&json),
            Err(ManifestError::InvalidContract { .. })
        ));

        let entries = [(
            "Y",
            ManifestEntry::token(ChainType::Evm, fixtures::USDT_TRC20, 6),
        )];
        assert!(PaymentManifest::from_entries(entries).is_err());
    }

    #[test]
    fn test_unknown_chain_type_rejected() {
        let json = r#"{"SOL": {"type": "solana", "decimals": 9}}"#;
        assert!(matches!(
            PaymentManifest::from_json(json),
            Err(ManifestError::Json(_))
        ));
    }

    #[test]
    fn test_is_network_valid() {
        let manifest = PaymentManifest::from_json(fixtures::SAMPLE_MANIFEST).unwrap();

        assert!(manifest.is_network_valid("ETH", &session(ProviderKind::MetaMask, true)));
        assert!(manifest.is_network_valid("USDT_ERC20", &session(ProviderKind::WalletConnect, true)));
        assert!(manifest.is_network_valid("TRX", &session(ProviderKind::TronLink, true)));

        assert!(!manifest.is_network_valid("TRX", &session(ProviderKind::MetaMask, true)));
        assert!(!manifest.is_network_valid("ETH", &session(ProviderKind::TronLink, true)));
        assert!(!manifest.is_network_valid("DOGE", &session(ProviderKind::MetaMask, true)));
        assert!(!manifest.is_network_valid("ETH", &Session::default()));
    }

    #[test]
    fn test_not_connected_is_never_valid() {
        let manifest = PaymentManifest::from_json(fixtures::SAMPLE_MANIFEST).unwrap();
        for kind in ProviderKind::ALL {
            for code in manifest.codes() {
                assert!(!manifest.is_network_valid(code, &session(kind, false)));
            }
        }
    }

    #[test]
    fn test_serialize_round_trip_shape() {
        let manifest = PaymentManifest::from_entries([
            ("BNB", ManifestEntry::evm_native().on_chain(56)),
        ])
        .unwrap();
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"BNB": {"type": "evm", "decimals": 18, "chainId": 56}})
        );
    }

    mod props {
        use super::*;
        use paybridge_testing::strategies;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn evm_tokens_follow_their_entry(
                contract in strategies::evm_address(),
                decimals in 0u8..=36,
                chain_id in strategies::chain_id(),
            ) {
                let entry = ManifestEntry::token(ChainType::Evm, contract, decimals).on_chain(chain_id);
                let manifest = PaymentManifest::from_entries([("TOKEN", entry)]).unwrap();
                let token = manifest.get("TOKEN").unwrap();
                prop_assert_eq!(token.transfer_decimals(), decimals);
                prop_assert_eq!(token.expected_chain_id(), chain_id);
                prop_assert!(manifest.is_network_valid("TOKEN", &session(ProviderKind::MetaMask, true)));
                prop_assert!(!manifest.is_network_valid("TOKEN", &session(ProviderKind::TronLink, true)));
            }

            #[test]
            fn tron_tokens_need_tron_link(contract in strategies::tron_address(), decimals in 0u8..=18) {
                let entry = ManifestEntry::token(ChainType::Tron, contract, decimals);
                let manifest = PaymentManifest::from_entries([("TRC20", entry)]).unwrap();
                prop_assert!(manifest.is_network_valid("TRC20", &session(ProviderKind::TronLink, true)));
                prop_assert!(!manifest.is_network_valid("TRC20", &session(ProviderKind::WalletConnect, true)));
            }
        }
    }
}
