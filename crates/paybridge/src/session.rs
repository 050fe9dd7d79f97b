//! Session state shared by every provider kind

use paybridge_traits::{ChainType, ProviderKind};
use serde::{Deserialize, Serialize};

/// Where the connection stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    /// No provider
    #[default]
    Disconnected,
    /// Handshake in progress (TronLink waits here for its authorization)
    Connecting,
    /// An account is available
    Connected,
}

/// The one session the connection manager maintains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Active provider kind
    pub provider: Option<ProviderKind>,
    /// Whether the wallet has exposed an account
    pub connected: bool,
    /// Selected account
    pub address: Option<String>,
    /// Active chain, 0 when unknown (Tron sessions keep 0)
    pub chain_id: u64,
    /// Native balance as a decimal string, `None` until synced
    pub balance: Option<String>,
    /// Connection status
    pub status: ConnectionStatus,
}

impl Session {
    /// Resets every field
    pub fn clear(&mut self) {
        *self = Session::default();
    }

    /// Chain ecosystem of the active provider
    pub fn chain_type(&self) -> Option<ChainType> {
        self.provider.map(|kind| kind.chain_type())
    }

    /// True for MetaMask sessions
    pub fn is_meta_mask(&self) -> bool {
        self.provider == Some(ProviderKind::MetaMask)
    }

    /// True for WalletConnect sessions
    pub fn is_wallet_connect(&self) -> bool {
        self.provider == Some(ProviderKind::WalletConnect)
    }

    /// True for TronLink sessions
    pub fn is_tron_link(&self) -> bool {
        self.provider == Some(ProviderKind::TronLink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear() {
        let mut session = Session {
            provider: Some(ProviderKind::WalletConnect),
            connected: true,
            address: Some("0xabc".into()),
            chain_id: 56,
            balance: Some("1.5".into()),
            status: ConnectionStatus::Connected,
        };
        assert_eq!(session.chain_type(), Some(ChainType::Evm));
        assert!(session.is_wallet_connect());

        session.clear();
        assert_eq!(session, Session::default());
        assert_eq!(session.chain_id, 0);
        assert_eq!(session.status, ConnectionStatus::Disconnected);
        assert_eq!(session.chain_type(), None);
    }

    #[test]
    fn test_snapshot_json() {
        let session = Session {
            provider: Some(ProviderKind::TronLink),
            connected: true,
            address: Some("TXYZ".into()),
            chain_id: 0,
            balance: Some("0".into()),
            status: ConnectionStatus::Connected,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["provider"], "tronlink");
        assert_eq!(json["chainId"], 0);
        assert_eq!(json["status"], "connected");
    }
}
