//! Stored provider preference and auto-connect

mod common;

use common::{manager, metamask, sample_manifest, MockFactory};
use paybridge::{
    ConnectionManager, ConnectorConfig, FileStore, MemoryStore, PreferenceStore, Session,
};
use paybridge_testing::{fixtures, MockTransport, MockTronBridge};
use paybridge_traits::ProviderKind;

#[tokio::test]
async fn test_auto_connect_without_preference_is_noop() {
    let transport = metamask();
    let store = MemoryStore::new();
    let factory = MockFactory::default().with_metamask(&transport);
    let mut manager = manager(&factory, &store);

    manager.auto_connect().await;

    assert_eq!(manager.session(), &Session::default());
    assert_eq!(manager.epoch(), 0);
    assert!(factory.created().is_empty());
    assert!(transport.requests().is_empty());
    assert_eq!(store.get("provider"), None);
}

#[tokio::test]
async fn test_auto_connect_unknown_value_ignored() {
    let store = MemoryStore::with_value("provider", "phantom");
    let factory = MockFactory::default().with_metamask(&metamask());
    let mut manager = manager(&factory, &store);

    manager.auto_connect().await;

    assert!(factory.created().is_empty());
    assert_eq!(manager.session(), &Session::default());
    assert_eq!(store.get("provider").as_deref(), Some("phantom"));
}

#[tokio::test]
async fn test_auto_connect_each_kind() {
    let cases = [
        ("mm", ProviderKind::MetaMask),
        ("walletconnect", ProviderKind::WalletConnect),
        ("tronlink", ProviderKind::TronLink),
    ];
    for (stored, kind) in cases {
        let factory = MockFactory::default()
            .with_metamask(&metamask())
            .with_wallet_connect(&MockTransport::new().with_session(&[fixtures::ETH_ADDRESS], 1))
            .with_tron(&MockTronBridge::new());
        let store = MemoryStore::with_value("provider", stored);
        let mut manager = manager(&factory, &store);

        manager.auto_connect().await;

        assert_eq!(factory.created(), vec![kind]);
        assert_eq!(manager.provider_kind(), Some(kind));
        assert_eq!(store.get("provider").as_deref(), Some(stored));
    }
}

#[tokio::test]
async fn test_auto_connect_failure_keeps_preference() {
    let transport = metamask().fail(
        "eth_requestAccounts",
        paybridge_error::ProviderError::from_rpc(-32002, "request already pending"),
    );
    let store = MemoryStore::with_value("provider", "mm");
    let factory = MockFactory::default().with_metamask(&transport);
    let mut manager = manager(&factory, &store);

    manager.auto_connect().await;

    assert_eq!(manager.session(), &Session::default());
    assert_eq!(store.get("provider").as_deref(), Some("mm"));
}

#[tokio::test]
async fn test_custom_storage_key() {
    let store = MemoryStore::new();
    let factory = MockFactory::default().with_metamask(&metamask());
    let config = ConnectorConfig::default().with_storage_key("shop.wallet");
    let mut manager = manager(&factory, &store).with_config(config);

    manager.connect_metamask().await;
    assert_eq!(store.get("shop.wallet").as_deref(), Some("mm"));
    assert_eq!(store.get("provider"), None);

    manager.disconnect().await;
    assert_eq!(store.get("shop.wallet"), None);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let transport = metamask();
    let factory = MockFactory::default().with_metamask(&transport);

    {
        let mut first =
            ConnectionManager::new(factory.clone(), FileStore::in_dir(dir.path()), sample_manifest());
        first.connect_metamask().await;
        assert!(first.session().connected);
    }

    let mut second =
        ConnectionManager::new(factory.clone(), FileStore::in_dir(dir.path()), sample_manifest());
    second.auto_connect().await;

    assert_eq!(second.session().address.as_deref(), Some(fixtures::ETH_ADDRESS));
    assert_eq!(factory.created(), vec![ProviderKind::MetaMask, ProviderKind::MetaMask]);

    second.disconnect().await;
    assert_eq!(FileStore::in_dir(dir.path()).get("provider"), None);
}
