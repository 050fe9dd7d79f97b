//! Where the "last provider" preference lives.
//!
//! Browsers use `localStorage` (see `paybridge-wasm`); the CLI uses
//! [`FileStore`]; tests use [`MemoryStore`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use paybridge_error::ProviderResult;

/// A string key/value store.
pub trait PreferenceStore {
    /// Reads a value
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value
    fn set(&self, key: &str, value: &str) -> ProviderResult<()>;

    /// Deletes a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> ProviderResult<()>;
}

/// In-memory store. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one value
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ProviderResult<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ProviderResult<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::BTreeMap;
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use paybridge_error::{ErrorContext, ProviderResult};
    use tracing::warn;

    use super::PreferenceStore;

    /// JSON object on disk, one file per store.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        /// File name used inside a state directory
        pub const FILE_NAME: &'static str = "preferences.json";

        /// Store backed by `path`
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// Store at `dir/preferences.json`
        pub fn in_dir(dir: impl AsRef<Path>) -> Self {
            Self::new(dir.as_ref().join(Self::FILE_NAME))
        }

        /// Backing file
        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Where an unreadable file is moved before it is replaced
        pub fn backup_path(&self) -> PathBuf {
            self.path.with_extension("json.bak")
        }

        fn load(&self) -> ProviderResult<BTreeMap<String, String>> {
            match fs::read_to_string(&self.path) {
                Ok(text) => Ok(serde_json::from_str(&text)?),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(e).context(format!("reading {}", self.path.display())),
            }
        }

        fn save(&self, values: &BTreeMap<String, String>) -> ProviderResult<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).context(format!("creating {}", parent.display()))?;
            }
            let json = serde_json::to_string_pretty(values)?;
            fs::write(&self.path, json).context(format!("writing {}", self.path.display()))
        }
    }

    impl PreferenceStore for FileStore {
        fn get(&self, key: &str) -> Option<String> {
            match self.load() {
                Ok(mut values) => values.remove(key),
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable preferences");
                    None
                }
            }
        }

        fn set(&self, key: &str, value: &str) -> ProviderResult<()> {
            let mut values = match self.load() {
                Ok(values) => values,
                Err(e) => {
                    let backup = self.backup_path();
                    warn!(
                        error = %e,
                        path = %self.path.display(),
                        backup = %backup.display(),
                        "replacing unreadable preferences"
                    );
                    if let Err(e) = fs::rename(&self.path, &backup) {
                        warn!(error = %e, "failed to keep a copy of the old preferences");
                    }
                    BTreeMap::new()
                }
            };
            values.insert(key.to_string(), value.to_string());
            self.save(&values)
        }

        fn remove(&self, key: &str) -> ProviderResult<()> {
            let mut values = self.load()?;
            if values.remove(key).is_some() {
                self.save(&values)?;
            }
            Ok(())
        }
    }
}
