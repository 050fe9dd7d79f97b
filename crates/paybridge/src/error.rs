//! Payment errors

use paybridge_error::ProviderError;
use paybridge_traits::{ChainType, ProviderKind};
use thiserror::Error;

/// Why a payment was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayError {
    /// The code is not in the manifest
    #[error("Unknown payment code: {0}")]
    UnknownCode(String),

    /// No connected wallet
    #[error("Wallet not connected")]
    NotConnected,

    /// The active wallet cannot pay on the entry's chain
    #[error("Payment on {required} needs a matching wallet (active: {})", display_kind(.active))]
    WrongProvider {
        /// Chain the entry needs
        required: ChainType,
        /// Active provider kind
        active: Option<ProviderKind>,
    },

    /// The wallet is on another EVM chain
    #[error("Wallet is on chain {actual}, payment requires chain {expected}")]
    ChainMismatch {
        /// Chain the entry needs
        expected: u64,
        /// Chain the wallet reports
        actual: u64,
    },

    /// The amount does not scale to base units
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The recipient is not an address on the entry's chain
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The wallet reported a failure
    #[error(transparent)]
    Provider(ProviderError),
}

fn display_kind(kind: &Option<ProviderKind>) -> String {
    kind.map(|k| k.to_string()).unwrap_or_else(|| "none".to_string())
}

impl From<ProviderError> for PayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConnected => PayError::NotConnected,
            ProviderError::InvalidAddress { address, reason } => {
                PayError::InvalidRecipient(format!("'{address}': {reason}"))
            }
            ProviderError::InvalidAmount(msg) | ProviderError::AmountOverflow(msg) => {
                PayError::InvalidAmount(msg)
            }
            other => PayError::Provider(other),
        }
    }
}

impl PayError {
    /// True when the user declined the transfer in the wallet
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, PayError::Provider(e) if e.is_user_rejection())
    }
}
