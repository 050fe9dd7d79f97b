//! Browser tests, run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Reflect};
use paybridge::PreferenceStore;
use paybridge_evm::Eip1193Transport;
use paybridge_traits::{EventStream, ProviderEvent};
use paybridge_tron::TronLinkBridge;
use paybridge_wasm::{version, JsEip1193Transport, JsTronLinkBridge, LocalStorageStore, WalletSession};
use serde_json::json;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn manifest() -> JsValue {
    js_sys::JSON::parse(
        r#"{
            "ETH": { "type": "evm", "decimals": 18 },
            "TRX": { "type": "tron", "decimals": 6 }
        }"#,
    )
    .unwrap()
}

fn session() -> WalletSession {
    WalletSession::new(manifest(), JsValue::UNDEFINED, None)
        .map_err(JsValue::from)
        .unwrap()
}

#[wasm_bindgen_test]
fn test_version() {
    assert_eq!(version(), env!("CARGO_PKG_VERSION"));
}

#[wasm_bindgen_test]
fn test_local_storage_round_trip() {
    let store = LocalStorageStore;
    store.set("paybridge.test", "tronlink").unwrap();
    assert_eq!(store.get("paybridge.test").as_deref(), Some("tronlink"));
    store.remove("paybridge.test").unwrap();
    assert_eq!(store.get("paybridge.test"), None);
}

#[wasm_bindgen_test]
fn test_invalid_manifest_is_rejected() {
    let bad = js_sys::JSON::parse(r#"{ "USDT": { "type": "evm", "contract": "0x1234" } }"#).unwrap();
    assert!(WalletSession::new(bad, JsValue::UNDEFINED, None).is_err());
}

#[wasm_bindgen_test]
fn test_test_pay() {
    let wallet = session();
    let entry = wallet.test_pay("ETH").map_err(JsValue::from).unwrap();
    assert!(entry.is_object());
    let missing = wallet.test_pay("DOGE").map_err(JsValue::from).unwrap();
    assert!(missing.is_undefined());
}

#[wasm_bindgen_test]
async fn test_metamask_absent_is_silent() {
    let wallet = session();
    JsFuture::from(wallet.connect_metamask()).await.unwrap();
    let valid = JsFuture::from(wallet.is_network_valid("ETH".into())).await.unwrap();
    assert_eq!(valid.as_bool(), Some(false));
    let symbol = JsFuture::from(wallet.chain_symbol()).await.unwrap();
    assert_eq!(symbol.as_string().as_deref(), Some("XXX"));
}

#[wasm_bindgen_test]
async fn test_switch_chain_rejects_inexact_ids() {
    let wallet = session();
    for bad in [1.5, -1.0, 9_007_199_254_740_992.0] {
        let err = JsFuture::from(wallet.switch_chain(bad)).await.unwrap_err();
        let message = Reflect::get(&err, &"message".into()).unwrap().as_string().unwrap();
        assert!(message.contains("invalid chain id"), "{message}");
    }
}

// ============================================================================
// TronLink window messages
// ============================================================================

#[wasm_bindgen_test]
async fn test_tron_bridge_forwards_window_messages() {
    let bridge = JsTronLinkBridge::new();
    let mut rx = bridge.listen();
    let message = json!({
        "message": { "action": "setAccount", "data": { "address": "TJRabPrwbZy45sbavfcjinPJC18kjpRTv8" } }
    });
    let data = js_sys::JSON::parse(&message.to_string()).unwrap();
    web_sys::window().unwrap().post_message(&data, "*").unwrap();

    assert_eq!(rx.recv().await, Some(message));

    bridge.unlisten();
    let onmessage = Reflect::get(&web_sys::window().unwrap(), &"onmessage".into()).unwrap();
    assert!(onmessage.is_null() || onmessage.is_undefined());
}

#[wasm_bindgen_test]
async fn test_tron_bridge_sleep_resolves() {
    JsTronLinkBridge::new().sleep_ms(1).await.unwrap();
}

// ============================================================================
// EIP-1193 events
// ============================================================================

/// A provider object that records the listeners registered with `on`
fn fake_provider() -> JsValue {
    Function::new_no_args(
        "return {
            listeners: {},
            on(event, listener) { this.listeners[event] = listener; },
            removeListener(event) { delete this.listeners[event]; },
        };",
    )
    .call0(&JsValue::NULL)
    .unwrap()
}

fn emit(provider: &JsValue, event: &str, value: JsValue) {
    let listeners = Reflect::get(provider, &"listeners".into()).unwrap();
    let listener: Function = Reflect::get(&listeners, &event.into()).unwrap().unchecked_into();
    listener.call1(&JsValue::NULL, &value).unwrap();
}

#[wasm_bindgen_test]
async fn test_chain_changed_hex_and_numeric() {
    let provider = fake_provider();
    let mut transport = JsEip1193Transport::wallet_connect(provider.clone());
    let mut events = transport.subscribe().unwrap();

    emit(&provider, "chainChanged", JsValue::from_str("0x38"));
    emit(&provider, "chainChanged", JsValue::from_f64(137.0));
    emit(&provider, "chainChanged", JsValue::from_str("not a chain"));
    emit(&provider, "accountsChanged", js_sys::Array::of1(&"0xabc".into()).into());

    assert_eq!(events.next_event().await, Some(ProviderEvent::ChainChanged(56)));
    assert_eq!(events.next_event().await, Some(ProviderEvent::ChainChanged(137)));
    assert_eq!(
        events.next_event().await,
        Some(ProviderEvent::AccountsChanged(vec!["0xabc".into()]))
    );
}
