//! Browser wallets per provider kind.

use std::rc::Rc;

use js_sys::Function;
use paybridge::{ConnectorConfig, ProviderFactory};
use paybridge_error::ProviderResult;
use paybridge_evm::EvmWallet;
use paybridge_traits::{ProviderKind, WalletProvider};
use paybridge_tron::TronLinkWallet;

use crate::eip1193::{call_factory, JsEip1193Transport};
use crate::tronlink::JsTronLinkBridge;

/// Finds wallets in the page.
///
/// WalletConnect needs a JS function returning a fresh provider object
/// (for example `() => new WalletConnectProvider({ infuraId })`); without it
/// WalletConnect is unavailable.
#[derive(Default)]
pub struct BrowserProviderFactory {
    wallet_connect: Option<Function>,
}

impl BrowserProviderFactory {
    /// Creates a factory
    pub fn new(wallet_connect: Option<Function>) -> Self {
        Self { wallet_connect }
    }
}

impl ProviderFactory for BrowserProviderFactory {
    fn create(
        &self,
        kind: ProviderKind,
        config: &ConnectorConfig,
    ) -> ProviderResult<Option<Box<dyn WalletProvider>>> {
        let provider: Option<Box<dyn WalletProvider>> = match kind {
            ProviderKind::MetaMask => JsEip1193Transport::injected()?
                .map(|t| Box::new(EvmWallet::injected(t)) as Box<dyn WalletProvider>),
            ProviderKind::WalletConnect => match &self.wallet_connect {
                Some(factory) => {
                    let transport = JsEip1193Transport::wallet_connect(call_factory(factory)?);
                    Some(Box::new(EvmWallet::wallet_connect(transport)))
                }
                None => None,
            },
            ProviderKind::TronLink => Some(Box::new(TronLinkWallet::new(
                Rc::new(JsTronLinkBridge::new()),
                config.tron_link_config(),
            ))),
        };
        Ok(provider)
    }
}
