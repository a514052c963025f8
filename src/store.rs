use std::path::PathBuf;

use serde_json::Value;

use crate::consts::BIRTHDAYS_KEY;
use crate::storage::Storage;
use crate::{BirthdayMap, BirthdayRecord};

/// Error type for the persistent birthday store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage backend cannot be reached at all.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing a storage file failed.
    #[error("Storage I/O failed for {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The map could not be encoded for storage.
    #[error("Failed to encode birthdays: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Names are the record key and must contain something.
    #[error("Name must not be empty")]
    EmptyName,
}

/// Read-modify-write access to the persisted `BirthdayMap`.
///
/// The whole map lives in one storage slot and every mutation rewrites it.
#[derive(Debug, Clone, Default)]
pub struct BirthdayStore<S> {
    storage: S,
}

impl<S: Storage> BirthdayStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Reads the persisted map. A missing slot or one that is not JSON yields
    /// an empty map. Entries that fail validation are dropped one at a time,
    /// so the valid ones survive the next write.
    ///
    /// # Errors
    /// Returns `StoreError` only if the backend itself fails.
    pub fn load(&self) -> Result<BirthdayMap, StoreError> {
        let Some(json) = self.storage.get_item(BIRTHDAYS_KEY)? else {
            log::debug!("No stored birthdays, starting fresh");
            return Ok(BirthdayMap::new());
        };

        let entries = match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(entries)) => entries,
            Ok(other) => {
                log::warn!("Stored birthdays are not a name map ({other}), starting fresh");
                return Ok(BirthdayMap::new());
            },
            Err(e) => {
                log::warn!("Stored birthdays are unreadable ({e}), starting fresh");
                return Ok(BirthdayMap::new());
            },
        };

        let map: BirthdayMap = entries
            .into_iter()
            .filter_map(|(name, entry)| match serde_json::from_value::<BirthdayRecord>(entry) {
                Ok(record) => Some((name, record)),
                Err(e) => {
                    log::warn!("Dropping unreadable stored birthday for {name:?}: {e}");
                    None
                },
            })
            .collect();
        log::debug!("Loaded {} birthdays", map.len());
        Ok(map)
    }

    /// Persists `map`, replacing whatever was stored before.
    ///
    /// # Errors
    /// Returns `StoreError` if encoding or the backend write fails.
    pub fn save(&mut self, map: &BirthdayMap) -> Result<(), StoreError> {
        let json = serde_json::to_string(map)?;
        self.storage.set_item(BIRTHDAYS_KEY, &json)?;
        log::info!("Saved {} birthdays", map.len());
        Ok(())
    }

    /// Looks up a single birthday by name.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend fails.
    pub fn get(&self, name: &str) -> Result<Option<BirthdayRecord>, StoreError> {
        Ok(self.load()?.get(name).copied())
    }

    /// Sets `name` to `record`, fully replacing any earlier record for that name.
    /// Returns the replaced record, if there was one.
    ///
    /// # Errors
    /// Returns `StoreError::EmptyName` for a blank name, or a backend error.
    pub fn upsert(
        &mut self,
        name: &str,
        record: BirthdayRecord,
    ) -> Result<Option<BirthdayRecord>, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let mut map = self.load()?;
        let previous = map.insert(name.to_owned(), record);
        self.save(&map)?;
        Ok(previous)
    }

    /// Deletes `name`. Returns whether anything was removed; a missing name
    /// leaves the stored map untouched.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend fails.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        let mut map = self.load()?;
        if map.remove(name).is_none() {
            log::debug!("No birthday stored for {name:?}, nothing to remove");
            return Ok(false);
        }
        self.save(&map)?;
        Ok(true)
    }

    /// Replaces the entire stored map.
    ///
    /// # Errors
    /// Returns `StoreError` if encoding or the backend write fails.
    pub fn replace_all(&mut self, map: &BirthdayMap) -> Result<(), StoreError> {
        log::info!("Replacing all stored birthdays with {} entries", map.len());
        self.save(map)
    }
}
