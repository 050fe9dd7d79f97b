//! Creation of provider handles per wallet kind

use paybridge_error::ProviderResult;
use paybridge_traits::{ProviderKind, WalletProvider};

use crate::config::ConnectorConfig;

/// Builds a fresh provider for a wallet kind.
///
/// Returns `Ok(None)` when the wallet is simply not available (no injected
/// provider, no WalletConnect factory), which the connection manager treats
/// as a silent no-op.
pub trait ProviderFactory {
    /// Creates a provider of `kind`
    fn create(
        &self,
        kind: ProviderKind,
        config: &ConnectorConfig,
    ) -> ProviderResult<Option<Box<dyn WalletProvider>>>;
}
