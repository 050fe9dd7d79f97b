//! `window.localStorage` as a [`PreferenceStore`].

use paybridge::PreferenceStore;
use paybridge_error::{ProviderError, ProviderResult};
use web_sys::Storage;

use crate::js;

/// Preferences in `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> ProviderResult<Storage> {
        web_sys::window()
            .ok_or_else(|| ProviderError::NotInjected("no window".into()))?
            .local_storage()
            .map_err(js::js_error)?
            .ok_or_else(|| ProviderError::NotSupported("localStorage is disabled".into()))
    }
}

impl PreferenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> ProviderResult<()> {
        Self::storage()?.set_item(key, value).map_err(js::js_error)
    }

    fn remove(&self, key: &str) -> ProviderResult<()> {
        Self::storage()?.remove_item(key).map_err(js::js_error)
    }
}
