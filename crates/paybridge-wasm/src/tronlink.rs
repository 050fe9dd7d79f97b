//! `window.tronLink` as a [`TronLinkBridge`].

use std::cell::RefCell;

use alloy::primitives::U256;
use async_trait::async_trait;
use js_sys::{Promise, Reflect};
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_traits::TxHash;
use paybridge_tron::TronLinkBridge;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::js;

type MessageHandler = Closure<dyn FnMut(web_sys::MessageEvent)>;

/// Browser bridge. Owns the `window.onmessage` handler while listening.
#[derive(Default)]
pub struct JsTronLinkBridge {
    handler: RefCell<Option<MessageHandler>>,
}

impl JsTronLinkBridge {
    /// Creates a bridge; nothing is touched until the wallet connects
    pub fn new() -> Self {
        Self::default()
    }

    fn tron_link() -> ProviderResult<JsValue> {
        js::get(&js::window()?, "tronLink")
            .ok_or_else(|| ProviderError::NotInjected("window.tronLink".into()))
    }

    fn tron_web() -> ProviderResult<JsValue> {
        js::get(&Self::tron_link()?, "tronWeb")
            .ok_or(ProviderError::NotConnected)
    }

    fn set_onmessage(handler: &JsValue) {
        if let Ok(window) = js::window() {
            if let Err(e) = Reflect::set(&window, &JsValue::from_str("onmessage"), handler) {
                debug!(error = ?e, "failed to set window.onmessage");
            }
        }
    }

    /// Blanks `window.onmessage` only while it is still our handler, so a
    /// newer bridge's handler survives this one's teardown
    fn release(handler: &MessageHandler) {
        let current = js::window()
            .ok()
            .and_then(|window| js::get(&window, "onmessage"));
        if current.as_ref() == Some(handler.as_ref()) {
            Self::set_onmessage(&JsValue::NULL);
        }
    }
}

/// Extracts `txid` / `transaction.txID` or a bare string result
fn tx_hash(method: &str, result: &JsValue) -> ProviderResult<TxHash> {
    if let Some(hash) = result.as_string() {
        return Ok(TxHash::new(hash));
    }
    if let Some(false) = js::get(result, "result").and_then(|r| r.as_bool()) {
        let reason = js::get(result, "code")
            .and_then(|c| c.as_string())
            .unwrap_or_else(|| "rejected".into());
        return Err(ProviderError::TransactionFailed(reason));
    }
    js::get(result, "txid")
        .or_else(|| js::get_path(result, &["transaction", "txID"]))
        .and_then(|h| h.as_string())
        .map(TxHash::new)
        .ok_or_else(|| ProviderError::invalid_response(method, "no transaction id"))
}

#[async_trait(?Send)]
impl TronLinkBridge for JsTronLinkBridge {
    fn is_injected(&self) -> bool {
        Self::tron_link().is_ok()
    }

    async fn sleep_ms(&self, ms: u64) -> ProviderResult<()> {
        let window = web_sys::window().ok_or_else(|| ProviderError::NotInjected("no window".into()))?;
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        let mut scheduled = Ok(0);
        let promise = Promise::new(&mut |resolve, _reject| {
            scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout);
        });
        // the promise only settles if the timer was set
        scheduled.map_err(js::js_error)?;
        JsFuture::from(promise).await.map_err(js::js_error)?;
        Ok(())
    }

    fn listen(&self) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = MessageHandler::new(move |event: web_sys::MessageEvent| {
            let data = event.data();
            if data.is_null() || data.is_undefined() {
                return;
            }
            if let Ok(value) = serde_wasm_bindgen::from_value::<Value>(data) {
                let _ = tx.send(value);
            }
        });
        Self::set_onmessage(handler.as_ref());
        *self.handler.borrow_mut() = Some(handler);
        rx
    }

    fn unlisten(&self) {
        if let Some(handler) = self.handler.borrow_mut().take() {
            Self::release(&handler);
        }
    }

    async fn request_accounts(&self) -> ProviderResult<()> {
        let tron_link = Self::tron_link()?;
        let request = js::method(&tron_link, "request")?;
        let args = js::to_js(&json!({ "method": "tron_requestAccounts" }))?;
        let pending = request.call1(&tron_link, &args).map_err(js::js_error)?;
        js::resolve(pending).await.map(|_| ())
    }

    fn default_address(&self) -> Option<String> {
        let tron_web = Self::tron_web().ok()?;
        js::get_path(&tron_web, &["defaultAddress", "base58"]).and_then(|a| a.as_string())
    }

    async fn get_balance(&self, address: &str) -> ProviderResult<U256> {
        let trx = js::get(&Self::tron_web()?, "trx")
            .ok_or_else(|| ProviderError::NotSupported("tronWeb.trx".into()))?;
        let get_balance = js::method(&trx, "getBalance")?;
        let pending = get_balance
            .call1(&trx, &JsValue::from_str(address))
            .map_err(js::js_error)?;
        let sun = js::resolve(pending).await?;
        js::to_u256("trx.getBalance", &sun)
    }

    async fn send_trx(&self, to: &str, amount: U256) -> ProviderResult<TxHash> {
        let trx = js::get(&Self::tron_web()?, "trx")
            .ok_or_else(|| ProviderError::NotSupported("tronWeb.trx".into()))?;
        let send = js::method(&trx, "sendTransaction")?;
        let pending = send
            .call2(&trx, &JsValue::from_str(to), &js::amount_to_js(amount))
            .map_err(js::js_error)?;
        let result = js::resolve(pending).await?;
        tx_hash("trx.sendTransaction", &result)
    }

    async fn send_trc20(&self, contract: &str, to: &str, amount: U256) -> ProviderResult<TxHash> {
        let tron_web = Self::tron_web()?;
        let contract_fn = js::method(&tron_web, "contract")?;
        let factory = contract_fn.call0(&tron_web).map_err(js::js_error)?;
        let at = js::method(&factory, "at")?;
        let pending = at
            .call1(&factory, &JsValue::from_str(contract))
            .map_err(js::js_error)?;
        let token = js::resolve(pending).await?;

        let transfer = js::method(&token, "transfer")?;
        let call = transfer
            .call2(&token, &JsValue::from_str(to), &js::amount_to_js(amount))
            .map_err(js::js_error)?;
        let send = js::method(&call, "send")?;
        let pending = send.call0(&call).map_err(js::js_error)?;
        let result = js::resolve(pending).await?;
        tx_hash("trc20.transfer", &result)
    }
}

impl Drop for JsTronLinkBridge {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.get_mut().take() {
            Self::release(&handler);
        }
    }
}
