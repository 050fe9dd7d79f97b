//! # paybridge Error
//!
//! Unified error types shared by every wallet provider behind the paybridge
//! connection manager. Injected EVM wallets, WalletConnect sessions and the
//! TronLink extension all report failures through [`ProviderError`], so the
//! payment layer can reason about them without knowing which SDK produced them.
//!
//! ## Example
//!
//! ```
//! use paybridge_error::{ErrorCode, ProviderError};
//!
//! let err = ProviderError::from_rpc(4001, "User rejected the request.");
//! assert!(err.is_user_rejection());
//! assert_eq!(err.code(), ErrorCode::UserRejected);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// EIP-1193 code for a request the user declined in the wallet UI.
pub const EIP1193_USER_REJECTED: i64 = 4001;
/// EIP-1193 code for a method the wallet has not authorized.
pub const EIP1193_UNAUTHORIZED: i64 = 4100;
/// EIP-1193 code for a provider that is disconnected from every chain.
pub const EIP1193_DISCONNECTED: i64 = 4900;
/// `wallet_switchEthereumChain` code for a chain the wallet does not know.
pub const EIP3326_UNRECOGNIZED_CHAIN: i64 = 4902;

/// The error type reported by every wallet provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    // ============ Availability ============
    /// The wallet object (injected provider, extension, SDK factory) is absent
    #[error("Wallet provider not available: {0}")]
    NotInjected(String),

    /// Gave up waiting for a browser extension to inject itself
    #[error("Timed out waiting for provider after {attempts} polls")]
    InjectionTimeout {
        /// Number of polls performed
        attempts: u32,
    },

    /// The operation needs an active connection
    #[error("Wallet not connected")]
    NotConnected,

    /// The provider does not implement this capability
    #[error("Not supported: {0}")]
    NotSupported(String),

    // ============ Wallet responses ============
    /// The user declined the request in the wallet
    #[error("User rejected request: {message}")]
    UserRejected {
        /// Message reported by the wallet
        message: String,
    },

    /// The wallet does not know the requested chain
    #[error("Unrecognized chain: {message}")]
    UnrecognizedChain {
        /// Message reported by the wallet
        message: String,
    },

    /// JSON-RPC / EIP-1193 error response
    #[error("RPC error: code={code}, message={message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// The response did not have the expected shape
    #[error("Invalid response to {method}: {reason}")]
    InvalidResponse {
        /// Method that was called
        method: String,
        /// What was wrong with it
        reason: String,
    },

    /// Transport failure talking to the wallet
    #[error("Transport error: {0}")]
    Transport(String),

    // ============ Inputs ============
    /// Invalid address format or checksum
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The invalid address
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid human-readable amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount does not fit the chain's integer type
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    // ============ Transactions ============
    /// The wallet reported a failed transfer
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    // ============ Generic ============
    /// Unknown/other error
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using [`ProviderError`]
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Maps an EIP-1193 / JSON-RPC error code onto the matching variant.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            EIP1193_USER_REJECTED => ProviderError::UserRejected { message },
            EIP3326_UNRECOGNIZED_CHAIN => ProviderError::UnrecognizedChain { message },
            EIP1193_DISCONNECTED => ProviderError::NotConnected,
            _ => ProviderError::Rpc { code, message },
        }
    }

    /// Shorthand for [`ProviderError::InvalidResponse`]
    pub fn invalid_response(method: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::InvalidResponse {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ProviderError::InvalidAddress`]
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Returns true when the user declined the request in the wallet UI
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ProviderError::UserRejected { .. })
    }

    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ProviderError::NotInjected(_) => ErrorCode::NotInjected,
            ProviderError::InjectionTimeout { .. } => ErrorCode::InjectionTimeout,
            ProviderError::NotConnected => ErrorCode::NotConnected,
            ProviderError::NotSupported(_) => ErrorCode::NotSupported,
            ProviderError::UserRejected { .. } => ErrorCode::UserRejected,
            ProviderError::UnrecognizedChain { .. } => ErrorCode::UnrecognizedChain,
            ProviderError::Rpc { .. } => ErrorCode::Rpc,
            ProviderError::InvalidResponse { .. } => ErrorCode::InvalidResponse,
            ProviderError::Transport(_) => ErrorCode::Transport,
            ProviderError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            ProviderError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            ProviderError::AmountOverflow(_) => ErrorCode::AmountOverflow,
            ProviderError::TransactionFailed(_) => ErrorCode::TransactionFailed,
            ProviderError::Other(_) => ErrorCode::Unknown,
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Wraps the error as a transport failure prefixed with `ctx`
    fn context(self, ctx: impl Into<String>) -> ProviderResult<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> ProviderResult<T> {
        self.map_err(|e| ProviderError::Transport(format!("{}: {}", ctx.into(), e)))
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::InvalidResponse {
            method: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Provider missing
    NotInjected = 1001,
    /// Extension never appeared
    InjectionTimeout = 1002,
    /// No active connection
    NotConnected = 1003,
    /// Capability not implemented
    NotSupported = 1004,
    /// User declined
    UserRejected = 2001,
    /// Unknown chain
    UnrecognizedChain = 2002,
    /// Generic RPC error
    Rpc = 2003,
    /// Malformed response
    InvalidResponse = 2004,
    /// Transport failure
    Transport = 2005,
    /// Invalid address
    InvalidAddress = 3001,
    /// Invalid amount
    InvalidAmount = 3002,
    /// Amount overflow
    AmountOverflow = 3003,
    /// Transaction failed
    TransactionFailed = 4001,
}
