//! Backup export and validated restore.
//!
//! A backup is the whole `BirthdayMap` as pretty-printed JSON. Restoring
//! validates every entry first and only then replaces the stored map, so a
//! bad file never leaves partial data behind.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::consts::{BACKUP_FILE_EXTENSION, BACKUP_FILE_PREFIX};
use crate::storage::Storage;
use crate::store::{BirthdayStore, StoreError};
use crate::{BirthdayMap, BirthdayRecord};

/// Why a backup file was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The bytes are not UTF-8 JSON.
    #[error("Backup is not valid JSON: {0}")]
    ParseFailure(String),

    /// Well-formed JSON that is not a birthday map.
    #[error("Invalid backup format: {0}")]
    SchemaInvalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Serializes `map` as indented UTF-8 JSON.
///
/// # Errors
/// Returns `serde_json::Error` if encoding fails.
pub fn export_backup(map: &BirthdayMap) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(map)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// `birthday-backup-YYYY-MM-DD.json` for the given day.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!(
        "{BACKUP_FILE_PREFIX}{}.{BACKUP_FILE_EXTENSION}",
        date.format("%Y-%m-%d")
    )
}

/// Parses and validates a backup. Every entry must be an object with integer
/// `month` and `day` forming a real birthday; other fields are ignored.
///
/// # Errors
/// Returns `ImportError::ParseFailure` for malformed JSON and
/// `ImportError::SchemaInvalid` for the first entry that fails validation.
pub fn import_backup(bytes: &[u8]) -> Result<BirthdayMap, ImportError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ImportError::ParseFailure(e.to_string()))?;

    let Value::Object(entries) = value else {
        return Err(ImportError::SchemaInvalid(
            "top level must be an object of name to birthday".to_owned(),
        ));
    };

    entries
        .iter()
        .map(|(name, entry)| Ok((name.clone(), validate_entry(name, entry)?)))
        .collect()
}

/// Imports `bytes` and, only if the whole file is valid, replaces every
/// stored birthday with its contents.
///
/// # Errors
/// Returns `RestoreError::Import` without touching storage when the file is
/// rejected, or `RestoreError::Store` if the final write fails.
pub fn restore<S: Storage>(
    store: &mut BirthdayStore<S>,
    bytes: &[u8],
) -> Result<BirthdayMap, RestoreError> {
    let map = import_backup(bytes)?;
    store.replace_all(&map)?;
    log::info!("Restored {} birthdays from backup", map.len());
    Ok(map)
}

fn validate_entry(name: &str, entry: &Value) -> Result<BirthdayRecord, ImportError> {
    if name.trim().is_empty() {
        return Err(ImportError::SchemaInvalid(
            "entry with an empty name".to_owned(),
        ));
    }
    let Value::Object(fields) = entry else {
        return Err(ImportError::SchemaInvalid(format!(
            "entry {name:?} is not an object"
        )));
    };

    let month = integer_field(name, fields, "month")?;
    let day = integer_field(name, fields, "day")?;
    // Years are held as `Year`, so a numeric year outside 1..=9999 is
    // rejected here rather than imported and lost on the next save.
    let year = match fields.get("year") {
        None | Some(Value::Null) => None,
        Some(_) => Some(integer_field(name, fields, "year")?),
    };

    BirthdayRecord::new(month, day, year)
        .map_err(|e| ImportError::SchemaInvalid(format!("entry {name:?}: {e}")))
}

fn integer_field<T: TryFrom<u64>>(
    name: &str,
    fields: &Map<String, Value>,
    key: &str,
) -> Result<T, ImportError> {
    let Some(value) = fields.get(key) else {
        return Err(ImportError::SchemaInvalid(format!(
            "entry {name:?} is missing `{key}`"
        )));
    };
    value
        .as_u64()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| {
            ImportError::SchemaInvalid(format!(
                "entry {name:?} has a non-numeric or out of range `{key}`: {value}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BIRTHDAYS_KEY;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;

    fn record(month: u8, day: u8, year: Option<u16>) -> BirthdayRecord {
        BirthdayRecord::new(month, day, year).unwrap()
    }

    fn sample_map() -> BirthdayMap {
        let mut map = BirthdayMap::new();
        map.insert("Alice".to_owned(), record(3, 10, Some(1990)));
        map.insert("Bob".to_owned(), record(1, 5, None));
        map.insert("Leap Baby".to_owned(), record(2, 29, Some(2000)));
        map
    }

    #[test]
    fn test_export_is_pretty_json_object() {
        let bytes = export_backup(&sample_map()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n"));
        assert!(text.contains(r#""month": 3"#));

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Alice"]["year"], 1990);
        assert!(value["Bob"].get("year").is_none());
    }

    #[test]
    fn test_export_empty_map() {
        let bytes = export_backup(&BirthdayMap::new()).unwrap();
        assert_eq!(import_backup(&bytes).unwrap(), BirthdayMap::new());
    }

    #[test]
    fn test_round_trip() {
        let map = sample_map();
        let bytes = export_backup(&map).unwrap();
        assert_eq!(import_backup(&bytes).unwrap(), map);
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(backup_file_name(date), "birthday-backup-2026-03-07.json");
        assert_eq!(crate::consts::BACKUP_MIME_TYPE, "application/json");
    }

    #[test]
    fn test_import_not_json() {
        assert!(matches!(
            import_backup(b"{not json"),
            Err(ImportError::ParseFailure(_))
        ));
        assert!(matches!(
            import_backup(&[0xff, 0xfe]),
            Err(ImportError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_import_missing_month() {
        assert!(matches!(
            import_backup(br#"{"Alice": {"day": 5}}"#),
            Err(ImportError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_import_schema_violations() {
        let cases: [&[u8]; 9] = [
            br#"[]"#,
            br#"42"#,
            br#"{"Alice": 5}"#,
            br#"{"Alice": {"month": "3", "day": 5}}"#,
            br#"{"Alice": {"month": 3.5, "day": 5}}"#,
            br#"{"Alice": {"month": 13, "day": 5}}"#,
            br#"{"Alice": {"month": 4, "day": 31}}"#,
            br#"{"Alice": {"month": 4, "day": 1, "year": "1990"}}"#,
            br#"{"": {"month": 4, "day": 1}}"#,
        ];
        for bytes in cases {
            let result = import_backup(bytes);
            assert!(
                matches!(result, Err(ImportError::SchemaInvalid(_))),
                "{} should be rejected, got {result:?}",
                String::from_utf8_lossy(bytes)
            );
        }
    }

    #[test]
    fn test_import_rejects_year_outside_range() {
        let cases: [&[u8]; 3] = [
            br#"{"Alice": {"month": 3, "day": 10, "year": 0}}"#,
            br#"{"Alice": {"month": 3, "day": 10, "year": 10000}}"#,
            br#"{"Alice": {"month": 3, "day": 10, "year": -5}}"#,
        ];
        for bytes in cases {
            let err = import_backup(bytes).unwrap_err();
            assert!(
                matches!(&err, ImportError::SchemaInvalid(msg) if msg.contains("Alice")),
                "{err}"
            );
        }
    }

    #[test]
    fn test_import_ignores_extra_fields() {
        let map = import_backup(br#"{"Alice": {"month": 3, "day": 10, "year": null, "note": "x"}}"#)
            .unwrap();
        assert_eq!(map.get("Alice"), Some(&record(3, 10, None)));
    }

    #[test]
    fn test_import_error_names_the_entry() {
        let err = import_backup(br#"{"Good": {"month": 1, "day": 1}, "Bad": {"day": 1}}"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Invalid backup format: entry "Bad" is missing `month`"#
        );
    }

    #[test]
    fn test_restore_replaces_whole_map() {
        let mut store = BirthdayStore::new(MemoryStorage::new());
        store.upsert("Old", record(6, 6, None)).unwrap();

        let bytes = export_backup(&sample_map()).unwrap();
        let restored = restore(&mut store, &bytes).unwrap();

        assert_eq!(restored, sample_map());
        let stored = store.load().unwrap();
        assert_eq!(stored, sample_map());
        assert!(!stored.contains_key("Old"));
    }

    #[test]
    fn test_failed_restore_leaves_store_untouched() {
        let mut store = BirthdayStore::new(MemoryStorage::new());
        store.upsert("Old", record(6, 6, None)).unwrap();
        let before = store.storage().raw(BIRTHDAYS_KEY).map(str::to_owned);

        // One good entry, one bad one: nothing may be written
        let result = restore(
            &mut store,
            br#"{"New": {"month": 1, "day": 1}, "Broken": {"month": 1}}"#,
        );
        assert!(matches!(
            result,
            Err(RestoreError::Import(ImportError::SchemaInvalid(_)))
        ));

        let result = restore(&mut store, b"{not json");
        assert!(matches!(
            result,
            Err(RestoreError::Import(ImportError::ParseFailure(_)))
        ));

        assert_eq!(store.storage().raw(BIRTHDAYS_KEY).map(str::to_owned), before);
    }

    fn arb_record() -> impl Strategy<Value = BirthdayRecord> {
        (1u8..=12, 1u8..=31, proptest::option::of(1u16..=9999))
            .prop_filter_map("day must fit month", |(m, d, y)| {
                BirthdayRecord::new(m, d, y).ok()
            })
    }

    proptest! {
        #[test]
        fn prop_export_import_round_trip(
            map in proptest::collection::btree_map("[A-Za-z][A-Za-z '.-]{0,15}", arb_record(), 0..20)
        ) {
            let bytes = export_backup(&map).unwrap();
            prop_assert_eq!(import_backup(&bytes).unwrap(), map);
        }
    }
}
