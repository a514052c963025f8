//! Key/value persistence backends.
//!
//! Every backend stores opaque strings under fixed keys, the same contract as
//! the browser's `localStorage`:
//! - `MemoryStorage`: in-process map, used by tests
//! - `FileStorage`: one JSON file per key in a data directory (native)
//! - `LocalStorage`: `window.localStorage` (wasm32)

use std::collections::HashMap;

use crate::store::StoreError;

/// A persistent string slot store.
pub trait Storage {
    /// Reads the value under `key`, `None` if nothing was ever written.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value under `key`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend cannot be written.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a slot, as if an earlier session had written it.
    #[must_use]
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::{ErrorKind, Write};
    use std::path::{Path, PathBuf};

    use tempfile::NamedTempFile;

    use super::Storage;
    use crate::store::StoreError;

    /// Stores each key as `<dir>/<key>.json`.
    ///
    /// Writes land in a temporary file in the same directory and are renamed
    /// over the target, so readers see either the old value or the new one.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        pub fn path_for(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl Storage for FileStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            let path = self.path_for(key);
            match fs::read_to_string(&path) {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(StoreError::Io { path, source }),
            }
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            let path = self.path_for(key);
            let io_err = |source| StoreError::Io {
                path: path.clone(),
                source,
            };

            fs::create_dir_all(&self.dir).map_err(io_err)?;
            let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
            tmp.write_all(value.as_bytes()).map_err(io_err)?;
            tmp.as_file().sync_all().map_err(io_err)?;
            tmp.persist(&path).map_err(|e| io_err(e.error))?;
            log::debug!("Wrote {} bytes to {}", value.len(), path.display());
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::Storage;
    use crate::store::StoreError;

    /// The browser's `window.localStorage`.
    pub struct LocalStorage {
        inner: web_sys::Storage,
    }

    impl LocalStorage {
        /// Opens the window's local storage.
        ///
        /// # Errors
        /// Returns `StoreError::Unavailable` outside a window context or when
        /// storage access is denied.
        pub fn open() -> Result<Self, StoreError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .map(|inner| Self { inner })
                .ok_or_else(|| StoreError::Unavailable("localStorage is not accessible".into()))
        }
    }

    impl Storage for LocalStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner
                .get_item(key)
                .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner
                .set_item(key, value)
                .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
        }
    }
}
