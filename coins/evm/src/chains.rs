//! EVM chain identifiers and native coin symbols.

use serde::{Deserialize, Serialize};

/// Symbol reported for chains missing from [`EvmChain`]
pub const UNKNOWN_SYMBOL: &str = "XXX";

/// EVM chains the payment UI knows how to label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvmChain {
    /// Ethereum mainnet
    Ethereum = 1,
    /// Ropsten testnet
    Ropsten = 3,
    /// Rinkeby testnet
    Rinkeby = 4,
    /// Goerli testnet
    Goerli = 5,
    /// Kovan testnet
    Kovan = 42,
    /// BNB Smart Chain
    BinanceSmartChain = 56,
    /// Fantom Opera
    Fantom = 250,
    /// smartBCH
    SmartBch = 10000,
    /// EthereumPoW
    EthereumPow = 10001,
}

impl EvmChain {
    /// All known chains
    pub const ALL: [EvmChain; 9] = [
        EvmChain::Ethereum,
        EvmChain::Ropsten,
        EvmChain::Rinkeby,
        EvmChain::Goerli,
        EvmChain::Kovan,
        EvmChain::BinanceSmartChain,
        EvmChain::Fantom,
        EvmChain::SmartBch,
        EvmChain::EthereumPow,
    ];

    /// Looks a chain up by id
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.chain_id() == chain_id)
    }

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        *self as u64
    }

    /// Get chain name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Ropsten => "Ropsten",
            Self::Rinkeby => "Rinkeby",
            Self::Goerli => "Goerli",
            Self::Kovan => "Kovan",
            Self::BinanceSmartChain => "BNB Smart Chain",
            Self::Fantom => "Fantom",
            Self::SmartBch => "smartBCH",
            Self::EthereumPow => "EthereumPoW",
        }
    }

    /// Get native token symbol
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Self::Ethereum | Self::Ropsten | Self::Rinkeby | Self::Goerli | Self::Kovan => "ETH",
            Self::BinanceSmartChain => "BNB",
            Self::Fantom => "FTM",
            Self::SmartBch => "BCH",
            Self::EthereumPow => "ETHW",
        }
    }
}

/// Native coin symbol for a chain id, `XXX` when unknown
pub fn chain_symbol(chain_id: u64) -> &'static str {
    EvmChain::from_chain_id(chain_id)
        .map(|c| c.native_symbol())
        .unwrap_or(UNKNOWN_SYMBOL)
}

/// Hex form used by `wallet_switchEthereumChain` (`56` -> `"0x38"`)
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}
