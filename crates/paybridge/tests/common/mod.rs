//! Shared harness for connection manager tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use paybridge::{
    ConnectionManager, ConnectorConfig, MemoryStore, PaymentManifest, ProviderFactory,
    SessionEvents,
};
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_evm::EvmWallet;
use paybridge_testing::{fixtures, MockTransport, MockTronBridge};
use paybridge_traits::{ProviderKind, WalletProvider};
use paybridge_tron::TronLinkWallet;

/// Hands out wallets over shared mocks and records what was created.
#[derive(Clone, Default)]
pub struct MockFactory {
    pub metamask: Option<MockTransport>,
    pub wallet_connect: Option<MockTransport>,
    pub tron: Option<MockTronBridge>,
    pub failure: Option<ProviderError>,
    created: Rc<RefCell<Vec<ProviderKind>>>,
}

impl MockFactory {
    pub fn with_metamask(mut self, transport: &MockTransport) -> Self {
        self.metamask = Some(transport.clone());
        self
    }

    pub fn with_wallet_connect(mut self, transport: &MockTransport) -> Self {
        self.wallet_connect = Some(transport.clone());
        self
    }

    pub fn with_tron(mut self, bridge: &MockTronBridge) -> Self {
        self.tron = Some(bridge.clone());
        self
    }

    pub fn failing(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn created(&self) -> Vec<ProviderKind> {
        self.created.borrow().clone()
    }
}

impl ProviderFactory for MockFactory {
    fn create(
        &self,
        kind: ProviderKind,
        config: &ConnectorConfig,
    ) -> ProviderResult<Option<Box<dyn WalletProvider>>> {
        self.created.borrow_mut().push(kind);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let provider: Option<Box<dyn WalletProvider>> = match kind {
            ProviderKind::MetaMask => self
                .metamask
                .clone()
                .map(|t| Box::new(EvmWallet::injected(t)) as Box<dyn WalletProvider>),
            ProviderKind::WalletConnect => self
                .wallet_connect
                .clone()
                .map(|t| Box::new(EvmWallet::wallet_connect(t)) as Box<dyn WalletProvider>),
            ProviderKind::TronLink => self.tron.clone().map(|b| {
                Box::new(TronLinkWallet::new(Rc::new(b), config.tron_link_config()))
                    as Box<dyn WalletProvider>
            }),
        };
        Ok(provider)
    }
}

pub fn sample_manifest() -> PaymentManifest {
    PaymentManifest::from_json(fixtures::SAMPLE_MANIFEST).unwrap()
}

pub fn manager(factory: &MockFactory, store: &MemoryStore) -> ConnectionManager {
    ConnectionManager::new(factory.clone(), store.clone(), sample_manifest())
}

/// MetaMask on mainnet exposing [`fixtures::ETH_ADDRESS`]
pub fn metamask() -> MockTransport {
    MockTransport::new()
        .with_accounts(&[fixtures::ETH_ADDRESS])
        .with_chain_id(1)
}

/// A connected MetaMask manager
pub async fn connected_metamask(transport: &MockTransport) -> (ConnectionManager, MemoryStore) {
    let store = MemoryStore::new();
    let factory = MockFactory::default().with_metamask(transport);
    let mut manager = manager(&factory, &store);
    manager.connect_metamask().await;
    assert!(manager.session().connected);
    (manager, store)
}

/// A TronLink manager that has been authorized for `address`, with its
/// event stream
pub async fn connected_tron(
    bridge: &MockTronBridge,
    address: &str,
) -> (ConnectionManager, SessionEvents) {
    let factory = MockFactory::default().with_tron(bridge);
    let mut manager = manager(&factory, &MemoryStore::new());
    manager.connect_tron_link().await;
    let mut events = manager.take_events().unwrap();
    assert!(bridge.push(paybridge_testing::tron_messages::wallet_auth(address, true)));
    assert!(manager.pump_event(&mut events).await);
    assert!(manager.session().connected);
    (manager, events)
}
