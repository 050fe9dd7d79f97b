//! # paybridge WASM
//!
//! Browser bindings for paybridge: `window.ethereum`, a WalletConnect
//! provider factory and `window.tronLink` behind one [`WalletSession`].
//!
//! ## Usage in JavaScript/TypeScript
//!
//! ```javascript
//! import init, { WalletSession } from 'paybridge-wasm';
//!
//! await init();
//! const wallet = new WalletSession(manifest, {}, () => new WalletConnectProvider({ infuraId }));
//! wallet.onChange((session) => render(session));
//!
//! await wallet.autoConnect();
//! if (await wallet.isNetworkValid("USDT_ERC20")) {
//!     const hash = await wallet.pay("USDT_ERC20", recipient, "12.5");
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use paybridge::{ConnectionManager, ConnectorConfig, PaymentManifest};
use paybridge_traits::ProviderKind;
use tokio::sync::Mutex;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

pub mod eip1193;
pub mod factory;
mod js;
pub mod logging;
pub mod storage;
pub mod tronlink;

pub use eip1193::JsEip1193Transport;
pub use factory::BrowserProviderFactory;
pub use storage::LocalStorageStore;
pub use tronlink::JsTronLinkBridge;

// ============================================================================
// Initialization
// ============================================================================

/// Installs the panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
}

/// Returns the paybridge WASM version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ============================================================================
// Wallet session
// ============================================================================

type Shared = Rc<Mutex<ConnectionManager>>;
type Listener = Rc<RefCell<Option<Function>>>;

/// The page's wallet session.
///
/// Every method returning a promise serializes on the session; events from
/// the wallet are applied in between and reported through `onChange`.
#[wasm_bindgen]
pub struct WalletSession {
    manager: Shared,
    on_change: Listener,
    manifest: PaymentManifest,
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsError::new(&e.to_string()).into()
}

async fn snapshot(manager: &Shared) -> Result<JsValue, JsValue> {
    let guard = manager.lock().await;
    js::to_js(guard.session()).map_err(js_error)
}

async fn notify(manager: &Shared, on_change: &Listener) {
    let callback = on_change.borrow().clone();
    let Some(callback) = callback else {
        return;
    };
    if let Ok(session) = snapshot(manager).await {
        if let Err(e) = callback.call1(&JsValue::NULL, &session) {
            debug!(error = ?e, "onChange callback threw");
        }
    }
}

/// Drives the active provider's events until its stream ends or a newer
/// connection replaces it
fn spawn_events(manager: Shared, on_change: Listener) {
    spawn_local(async move {
        let events = manager.lock().await.take_events();
        let Some(mut events) = events else {
            return;
        };
        while let Some(event) = events.next().await {
            let applied = manager.lock().await.apply_event(events.epoch(), event).await;
            if !applied {
                break;
            }
            notify(&manager, &on_change).await;
        }
        debug!(epoch = events.epoch(), "event stream ended");
    });
}

#[wasm_bindgen]
impl WalletSession {
    /// Creates a session.
    ///
    /// `manifest` maps payment codes to `{ type, contract?, decimals, chainId? }`;
    /// `config` may override `storageKey`, `tronPollIntervalMs`,
    /// `tronMaxPollAttempts` and `switchChainOnMismatch`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        manifest: JsValue,
        config: JsValue,
        wallet_connect_factory: Option<Function>,
    ) -> Result<WalletSession, JsError> {
        let manifest_json: serde_json::Value = serde_wasm_bindgen::from_value(manifest)
            .map_err(|e| JsError::new(&format!("Invalid manifest: {e}")))?;
        let manifest = PaymentManifest::from_value(manifest_json)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let config = if config.is_undefined() || config.is_null() {
            ConnectorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {e}")))?
        };

        let manager = ConnectionManager::new(
            BrowserProviderFactory::new(wallet_connect_factory),
            LocalStorageStore,
            manifest.clone(),
        )
        .with_config(config);

        Ok(WalletSession {
            manager: Rc::new(Mutex::new(manager)),
            on_change: Rc::new(RefCell::new(None)),
            manifest,
        })
    }

    /// Registers a callback receiving the session snapshot after every change
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Option<Function>) {
        *self.on_change.borrow_mut() = callback;
    }

    fn connect_with(&self, kind: Option<ProviderKind>) -> Promise {
        let manager = Rc::clone(&self.manager);
        let on_change = Rc::clone(&self.on_change);
        future_to_promise(async move {
            {
                let mut guard = manager.lock().await;
                match kind {
                    Some(kind) => guard.connect(kind).await,
                    None => guard.auto_connect().await,
                }
            }
            spawn_events(Rc::clone(&manager), Rc::clone(&on_change));
            notify(&manager, &on_change).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Connects the injected EVM wallet
    #[wasm_bindgen(js_name = connectMetaMask)]
    pub fn connect_metamask(&self) -> Promise {
        self.connect_with(Some(ProviderKind::MetaMask))
    }

    /// Opens a WalletConnect session
    #[wasm_bindgen(js_name = connectWalletConnect)]
    pub fn connect_wallet_connect(&self) -> Promise {
        self.connect_with(Some(ProviderKind::WalletConnect))
    }

    /// Starts the TronLink handshake
    #[wasm_bindgen(js_name = connectTronLink)]
    pub fn connect_tron_link(&self) -> Promise {
        self.connect_with(Some(ProviderKind::TronLink))
    }

    /// Reconnects the wallet used last time, if any
    #[wasm_bindgen(js_name = autoConnect)]
    pub fn auto_connect(&self) -> Promise {
        self.connect_with(None)
    }

    /// Ends the session and forgets the stored wallet
    pub fn disconnect(&self) -> Promise {
        let manager = Rc::clone(&self.manager);
        let on_change = Rc::clone(&self.on_change);
        future_to_promise(async move {
            manager.lock().await.disconnect().await;
            notify(&manager, &on_change).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolves with `{ provider, connected, address, chainId, balance, status }`
    pub fn session(&self) -> Promise {
        let manager = Rc::clone(&self.manager);
        future_to_promise(async move { snapshot(&manager).await })
    }

    /// Resolves with the native symbol of the active chain
    #[wasm_bindgen(js_name = chainSymbol)]
    pub fn chain_symbol(&self) -> Promise {
        let manager = Rc::clone(&self.manager);
        future_to_promise(async move {
            let symbol = manager.lock().await.chain_symbol();
            Ok(JsValue::from_str(symbol))
        })
    }

    /// Manifest entry for `code`, or `undefined`
    #[wasm_bindgen(js_name = testPay)]
    pub fn test_pay(&self, code: &str) -> Result<JsValue, JsError> {
        match self.manifest.get(code) {
            Some(entry) => js::to_js(entry).map_err(|e| JsError::new(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Resolves with whether `code` can be paid with the connected wallet
    #[wasm_bindgen(js_name = isNetworkValid)]
    pub fn is_network_valid(&self, code: String) -> Promise {
        let manager = Rc::clone(&self.manager);
        future_to_promise(async move {
            let valid = manager.lock().await.is_network_valid(&code);
            Ok(JsValue::from_bool(valid))
        })
    }

    /// Asks the wallet to switch to `chain_id`
    #[wasm_bindgen(js_name = switchChain)]
    pub fn switch_chain(&self, chain_id: f64) -> Promise {
        let manager = Rc::clone(&self.manager);
        future_to_promise(async move {
            let chain_id = js::chain_id_from_f64(chain_id).map_err(js_error)?;
            manager
                .lock()
                .await
                .switch_chain(chain_id)
                .await
                .map_err(js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Pays `amount` (decimal string) of `code` to `to`; resolves with the
    /// transaction hash
    pub fn pay(&self, code: String, to: String, amount: String) -> Promise {
        let manager = Rc::clone(&self.manager);
        let on_change = Rc::clone(&self.on_change);
        future_to_promise(async move {
            let result = manager.lock().await.pay(&code, &to, &amount).await;
            notify(&manager, &on_change).await;
            let hash = result.map_err(js_error)?;
            Ok(JsValue::from_str(hash.as_str()))
        })
    }
}
