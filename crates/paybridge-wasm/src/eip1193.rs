//! `window.ethereum` and WalletConnect providers as [`Eip1193Transport`]s.

use async_trait::async_trait;
use js_sys::{Array, Function};
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_evm::parse::parse_chain_id;
use paybridge_evm::Eip1193Transport;
use paybridge_traits::{ChannelEvents, EventStream, ProviderEvent};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::js;

type Listener = Closure<dyn FnMut(JsValue)>;

/// A JS EIP-1193 provider object.
pub struct JsEip1193Transport {
    provider: JsValue,
    wallet_connect: bool,
    listeners: Vec<(&'static str, Listener)>,
}

impl JsEip1193Transport {
    /// `window.ethereum`, if a wallet injected one
    pub fn injected() -> ProviderResult<Option<Self>> {
        let window = js::window()?;
        Ok(js::get(&window, "ethereum").map(|provider| Self {
            provider,
            wallet_connect: false,
            listeners: Vec::new(),
        }))
    }

    /// A provider returned by a WalletConnect provider factory
    pub fn wallet_connect(provider: JsValue) -> Self {
        Self {
            provider,
            wallet_connect: true,
            listeners: Vec::new(),
        }
    }

    /// The wrapped JS object
    pub fn provider(&self) -> &JsValue {
        &self.provider
    }

    fn listen(&mut self, event: &'static str, listener: Listener) -> ProviderResult<()> {
        let on = js::method(&self.provider, "on")?;
        on.call2(
            &self.provider,
            &JsValue::from_str(event),
            listener.as_ref(),
        )
        .map_err(js::js_error)?;
        self.listeners.push((event, listener));
        Ok(())
    }

    fn remove_listeners(&mut self) {
        let remove = js::method(&self.provider, "removeListener").ok();
        for (event, listener) in self.listeners.drain(..) {
            if let Some(remove) = &remove {
                let f: &Function = listener.as_ref().unchecked_ref();
                if let Err(e) = remove.call2(&self.provider, &JsValue::from_str(event), f) {
                    debug!(event, error = ?e, "removeListener failed");
                }
            }
        }
    }
}

fn accounts_listener(tx: UnboundedSender<ProviderEvent>) -> Listener {
    Closure::new(move |value: JsValue| {
        let accounts = if Array::is_array(&value) {
            Array::from(&value)
                .iter()
                .filter_map(|item| item.as_string())
                .collect()
        } else {
            Vec::new()
        };
        let _ = tx.send(ProviderEvent::AccountsChanged(accounts));
    })
}

/// Chain ids arrive as hex strings from MetaMask and as numbers from
/// WalletConnect
fn chain_value(value: &JsValue) -> Value {
    match (value.as_string(), value.as_f64()) {
        (Some(s), _) => json!(s),
        (None, Some(n)) => json!(n as u64),
        _ => Value::Null,
    }
}

fn chain_listener(tx: UnboundedSender<ProviderEvent>) -> Listener {
    Closure::new(move |value: JsValue| {
        match parse_chain_id(&chain_value(&value)) {
            Ok(chain_id) => {
                let _ = tx.send(ProviderEvent::ChainChanged(chain_id));
            }
            Err(e) => warn!(error = %e, "ignoring chainChanged"),
        }
    })
}

fn disconnect_listener(tx: UnboundedSender<ProviderEvent>) -> Listener {
    Closure::new(move |_: JsValue| {
        let _ = tx.send(ProviderEvent::Disconnected);
    })
}

#[async_trait(?Send)]
impl Eip1193Transport for JsEip1193Transport {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let request = js::method(&self.provider, "request")?;
        let args = js::to_js(&json!({ "method": method, "params": params }))?;
        let pending = request.call1(&self.provider, &args).map_err(js::js_error)?;
        let result = js::resolve(pending).await?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        js::from_js(method, result)
    }

    async fn enable(&self) -> ProviderResult<Value> {
        if !self.wallet_connect {
            return self.request("eth_requestAccounts", json!([])).await;
        }
        let enable = js::method(&self.provider, "enable")?;
        let pending = enable.call0(&self.provider).map_err(js::js_error)?;
        let result = js::resolve(pending).await?;
        if result.is_undefined() {
            return Ok(json!([]));
        }
        js::from_js("enable", result)
    }

    fn subscribe(&mut self) -> Option<Box<dyn EventStream>> {
        let (tx, events) = ChannelEvents::channel();
        let registered = self
            .listen("accountsChanged", accounts_listener(tx.clone()))
            .and_then(|_| self.listen("chainChanged", chain_listener(tx.clone())))
            .and_then(|_| self.listen("disconnect", disconnect_listener(tx)));
        if let Err(e) = registered {
            warn!(error = %e, "provider does not emit events");
            self.remove_listeners();
            return None;
        }
        Some(Box::new(events))
    }

    fn session_accounts(&self) -> Vec<String> {
        js::get(&self.provider, "accounts")
            .filter(Array::is_array)
            .map(|accounts| {
                Array::from(&accounts)
                    .iter()
                    .filter_map(|item| item.as_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn session_chain_id(&self) -> Option<u64> {
        let value = js::get(&self.provider, "chainId")?;
        parse_chain_id(&chain_value(&value)).ok()
    }

    async fn close(&mut self) -> ProviderResult<()> {
        self.remove_listeners();
        if !self.wallet_connect {
            return Ok(());
        }
        let disconnect = js::method(&self.provider, "disconnect")?;
        let pending = disconnect.call0(&self.provider).map_err(js::js_error)?;
        js::resolve(pending).await.map(|_| ())
    }
}

/// Calls a JS WalletConnect provider factory
pub(crate) fn call_factory(factory: &Function) -> ProviderResult<JsValue> {
    let provider = factory.call0(&JsValue::NULL).map_err(js::js_error)?;
    if provider.is_null() || provider.is_undefined() {
        return Err(ProviderError::NotInjected(
            "WalletConnect factory returned no provider".into(),
        ));
    }
    Ok(provider)
}
