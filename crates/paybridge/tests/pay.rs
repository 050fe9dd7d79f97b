//! Manifest-driven payment dispatch

mod common;

use alloy::primitives::U256;
use common::{connected_metamask, connected_tron, manager, metamask, MockFactory};
use paybridge::{ConnectorConfig, MemoryStore, PayError};
use paybridge_error::ProviderError;
use paybridge_evm::erc20::transfer_calldata;
use paybridge_testing::{fixtures, MockTransport, MockTronBridge, TronTransfer, MOCK_TX_HASH};
use paybridge_traits::{ChainType, ProviderKind};
use serde_json::json;

// ============================================================================
// EVM
// ============================================================================

#[tokio::test]
async fn test_native_transfer_scaled_by_1e18() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;

    let hash = manager.pay("ETH", fixtures::ETH_RECIPIENT, "0.5").await.unwrap();

    assert_eq!(hash.as_str(), MOCK_TX_HASH);
    let sent = transport.requests_for("eth_sendTransaction");
    assert_eq!(
        sent,
        vec![json!([{
            "from": fixtures::ETH_ADDRESS,
            "to": fixtures::ETH_RECIPIENT,
            "value": "0x6f05b59d3b20000",
        }])]
    );
}

#[tokio::test]
async fn test_token_transfer_scaled_by_decimals() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;

    manager
        .pay("USDT_ERC20", fixtures::ETH_RECIPIENT, "12.5")
        .await
        .unwrap();

    let expected_data = transfer_calldata(fixtures::ETH_RECIPIENT, U256::from(12_500_000u64)).unwrap();
    let sent = transport.requests_for("eth_sendTransaction");
    assert_eq!(
        sent,
        vec![json!([{
            "from": fixtures::ETH_ADDRESS,
            "to": fixtures::USDT_ERC20,
            "data": expected_data,
        }])]
    );
}

#[tokio::test]
async fn test_wallet_connect_pays() {
    let transport = MockTransport::new().with_session(&[fixtures::ETH_ADDRESS], 1);
    let factory = MockFactory::default().with_wallet_connect(&transport);
    let mut manager = manager(&factory, &MemoryStore::new());
    manager.connect_wallet_connect().await;

    assert!(manager.is_network_valid("ETH"));
    manager.pay("ETH", fixtures::ETH_RECIPIENT, "1").await.unwrap();
    assert_eq!(transport.count("eth_sendTransaction"), 1);
}

#[tokio::test]
async fn test_evm_code_rejected_for_tron_wallet() {
    let bridge = MockTronBridge::new();
    let (mut manager, _events) = connected_tron(&bridge, &fixtures::tron_address(1)).await;

    let err = manager.pay("USDT_ERC20", fixtures::ETH_RECIPIENT, "1").await.unwrap_err();
    assert_eq!(
        err,
        PayError::WrongProvider {
            required: ChainType::Evm,
            active: Some(ProviderKind::TronLink),
        }
    );
    assert!(bridge.transfers().is_empty());
}

#[tokio::test]
async fn test_invalid_inputs_send_nothing() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;

    assert!(matches!(
        manager.pay("ETH", "0x1234", "1").await,
        Err(PayError::InvalidRecipient(_))
    ));
    assert!(matches!(
        manager.pay("ETH", fixtures::USDT_TRC20, "1").await,
        Err(PayError::InvalidRecipient(_))
    ));
    for amount in ["", "-1", "1e18", "abc", "0.0000000000000000001"] {
        assert!(
            matches!(
                manager.pay("ETH", fixtures::ETH_RECIPIENT, amount).await,
                Err(PayError::InvalidAmount(_))
            ),
            "amount {amount:?} accepted"
        );
    }
    assert!(matches!(
        manager.pay("USDT_ERC20", fixtures::ETH_RECIPIENT, "0.0000001").await,
        Err(PayError::InvalidAmount(_))
    ));
    assert_eq!(transport.count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn test_wallet_rejection_surfaces() {
    let transport = metamask().fail(
        "eth_sendTransaction",
        ProviderError::from_rpc(4001, "User denied transaction signature"),
    );
    let (mut manager, _) = connected_metamask(&transport).await;

    let err = manager.pay("ETH", fixtures::ETH_RECIPIENT, "1").await.unwrap_err();
    assert!(err.is_user_rejection());
}

// ============================================================================
// Chain mismatch
// ============================================================================

#[tokio::test]
async fn test_mismatch_switches_then_pays() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;
    assert_eq!(manager.session().chain_id, 1);

    manager.pay("BNB", fixtures::ETH_RECIPIENT, "1").await.unwrap();

    assert_eq!(
        transport.requests_for("wallet_switchEthereumChain"),
        vec![json!([{"chainId": "0x38"}])]
    );
    assert_eq!(manager.session().chain_id, 56);
    assert_eq!(transport.count("eth_sendTransaction"), 1);
}

#[tokio::test]
async fn test_mismatch_when_switch_not_applied() {
    let transport = metamask().with_chain_id(56).with_switch_applied(false);
    let (mut manager, _) = connected_metamask(&transport).await;

    let err = manager.pay("ETH", fixtures::ETH_RECIPIENT, "1").await.unwrap_err();

    assert_eq!(
        err,
        PayError::ChainMismatch {
            expected: 1,
            actual: 56
        }
    );
    assert_eq!(transport.count("wallet_switchEthereumChain"), 1);
    assert_eq!(transport.count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn test_mismatch_when_switch_rejected() {
    let transport = metamask()
        .with_chain_id(250)
        .fail("wallet_switchEthereumChain", ProviderError::from_rpc(4902, "Unrecognized chain"));
    let (mut manager, _) = connected_metamask(&transport).await;

    let err = manager.pay("USDT_ERC20", fixtures::ETH_RECIPIENT, "1").await.unwrap_err();

    assert_eq!(
        err,
        PayError::ChainMismatch {
            expected: 1,
            actual: 250
        }
    );
    assert_eq!(transport.count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn test_mismatch_without_switching() {
    let transport = metamask().with_chain_id(56);
    let store = MemoryStore::new();
    let factory = MockFactory::default().with_metamask(&transport);
    let config = ConnectorConfig::default().with_switch_chain_on_mismatch(false);
    let mut manager = manager(&factory, &store).with_config(config);
    manager.connect_metamask().await;

    let err = manager.pay("ETH", fixtures::ETH_RECIPIENT, "1").await.unwrap_err();

    assert!(matches!(err, PayError::ChainMismatch { expected: 1, actual: 56 }));
    assert_eq!(transport.count("wallet_switchEthereumChain"), 0);
}

// ============================================================================
// Tron
// ============================================================================

#[tokio::test]
async fn test_trx_transfer_scaled_by_1e6() {
    let recipient = fixtures::tron_address(9);
    let bridge = MockTronBridge::new();
    let (mut manager, _events) = connected_tron(&bridge, &fixtures::tron_address(1)).await;

    let hash = manager.pay("TRX", &recipient, "2.75").await.unwrap();

    assert!(!hash.as_str().is_empty());
    assert_eq!(
        bridge.transfers(),
        vec![TronTransfer {
            contract: None,
            to: recipient,
            amount: U256::from(2_750_000u64),
        }]
    );
}

#[tokio::test]
async fn test_trc20_transfer() {
    let recipient = fixtures::tron_address(9);
    let bridge = MockTronBridge::new();
    let (mut manager, _events) = connected_tron(&bridge, &fixtures::tron_address(1)).await;

    manager.pay("USDT_TRC20", &recipient, "100").await.unwrap();

    assert_eq!(
        bridge.transfers(),
        vec![TronTransfer {
            contract: Some(fixtures::USDT_TRC20.to_string()),
            to: recipient,
            amount: U256::from(100_000_000u64),
        }]
    );
}

#[tokio::test]
async fn test_tron_code_rejected_for_evm_wallet() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;

    let err = manager.pay("TRX", &fixtures::tron_address(9), "1").await.unwrap_err();
    assert_eq!(
        err,
        PayError::WrongProvider {
            required: ChainType::Tron,
            active: Some(ProviderKind::MetaMask),
        }
    );
}

#[tokio::test]
async fn test_tron_send_failure() {
    let bridge = MockTronBridge::new().fail_sends(ProviderError::TransactionFailed("bandwidth".into()));
    let (mut manager, _events) = connected_tron(&bridge, &fixtures::tron_address(1)).await;

    let err = manager.pay("TRX", &fixtures::tron_address(9), "1").await.unwrap_err();
    assert!(matches!(err, PayError::Provider(ProviderError::TransactionFailed(_))));
}

#[tokio::test]
async fn test_tron_pay_before_authorization() {
    let bridge = MockTronBridge::new();
    let factory = MockFactory::default().with_tron(&bridge);
    let mut manager = manager(&factory, &MemoryStore::new());
    manager.connect_tron_link().await;

    let err = manager.pay("TRX", &fixtures::tron_address(9), "1").await.unwrap_err();
    assert_eq!(err, PayError::NotConnected);
}

// ============================================================================
// Lookup and validity
// ============================================================================

#[tokio::test]
async fn test_unknown_code() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;

    assert!(manager.test_pay("DOGE").is_none());
    assert_eq!(
        manager.pay("DOGE", fixtures::ETH_RECIPIENT, "1").await.unwrap_err(),
        PayError::UnknownCode("DOGE".into())
    );
}

#[tokio::test]
async fn test_pay_without_session() {
    let mut manager = manager(&MockFactory::default(), &MemoryStore::new());

    let entry = manager.test_pay("USDT_TRC20").unwrap();
    assert_eq!(entry.decimals, Some(6));

    let err = manager.pay("ETH", fixtures::ETH_RECIPIENT, "1").await.unwrap_err();
    assert_eq!(
        err,
        PayError::WrongProvider {
            required: ChainType::Evm,
            active: None
        }
    );
}

#[tokio::test]
async fn test_is_network_valid_tracks_connection() {
    let transport = metamask();
    let (mut manager, _) = connected_metamask(&transport).await;

    assert!(manager.is_network_valid("ETH"));
    assert!(manager.is_network_valid("BNB"));
    assert!(!manager.is_network_valid("TRX"));
    assert!(!manager.is_network_valid("DOGE"));

    manager.disconnect().await;
    for code in ["ETH", "USDT_ERC20", "BNB", "TRX", "USDT_TRC20"] {
        assert!(!manager.is_network_valid(code));
    }
}
