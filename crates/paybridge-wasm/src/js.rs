//! JS interop helpers shared by the bindings.

use alloy::primitives::U256;
use js_sys::{Function, Promise, Reflect};
use paybridge_error::{ProviderError, ProviderResult};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// `target[key]`; `None` for null, undefined or a throwing getter
pub(crate) fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_null() && !v.is_undefined())
}

/// Follows a property path such as `["tronWeb", "defaultAddress", "base58"]`
pub(crate) fn get_path(target: &JsValue, path: &[&str]) -> Option<JsValue> {
    path.iter().try_fold(target.clone(), |value, key| get(&value, key))
}

/// `target[key]` as a function
pub(crate) fn method(target: &JsValue, key: &str) -> ProviderResult<Function> {
    get(target, key)
        .and_then(|v| v.dyn_into::<Function>().ok())
        .ok_or_else(|| ProviderError::NotSupported(format!("{key} is not a function")))
}

/// The browser window as a plain value
pub(crate) fn window() -> ProviderResult<JsValue> {
    web_sys::window()
        .map(JsValue::from)
        .ok_or_else(|| ProviderError::NotInjected("no window".into()))
}

/// Awaits a value that may or may not be a promise
pub(crate) async fn resolve(value: JsValue) -> ProviderResult<JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(js_error),
        Err(plain) => Ok(plain),
    }
}

/// Maps a thrown value or rejected promise onto [`ProviderError`].
///
/// EIP-1193 errors carry a numeric `code`; anything else becomes a transport
/// error with whatever message can be read off it.
pub(crate) fn js_error(err: JsValue) -> ProviderError {
    let message = get(&err, "message")
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match get(&err, "code").and_then(|c| c.as_f64()) {
        Some(code) => ProviderError::from_rpc(code as i64, message),
        None => ProviderError::Transport(message),
    }
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> ProviderResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ProviderError::Other(format!("encoding for JS: {e}")))
}

pub(crate) fn from_js<T: DeserializeOwned>(method: &str, value: JsValue) -> ProviderResult<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ProviderError::invalid_response(method, e.to_string()))
}

/// Reads a JS number, decimal string or BigNumber-like object as base units
pub(crate) fn to_u256(name: &str, value: &JsValue) -> ProviderResult<U256> {
    if let Some(n) = value.as_f64() {
        if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
            return Err(ProviderError::invalid_response(name, format!("not an amount: {n}")));
        }
        return Ok(U256::from(n as u128));
    }
    let text = value
        .as_string()
        .or_else(|| {
            method(value, "toString")
                .ok()
                .and_then(|f| f.call0(value).ok())
                .and_then(|v| v.as_string())
        })
        .ok_or_else(|| ProviderError::invalid_response(name, "not an amount"))?;
    text.parse::<U256>()
        .map_err(|e| ProviderError::invalid_response(name, format!("'{text}': {e}")))
}

const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// A chain id passed as a JS number; must be an exact non-negative integer
pub(crate) fn chain_id_from_f64(value: f64) -> Result<u64, String> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > MAX_SAFE_INTEGER as f64 {
        return Err(format!("invalid chain id {value}"));
    }
    Ok(value as u64)
}

/// `U256` as a JS value: a number when exact, a decimal string otherwise
pub(crate) fn amount_to_js(amount: U256) -> JsValue {
    match u64::try_from(amount) {
        Ok(n) if n <= MAX_SAFE_INTEGER => JsValue::from_f64(n as f64),
        _ => JsValue::from_str(&amount.to_string()),
    }
}
