use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};
use url::Url;

pub const DATA_DIR_VAR: &str = "BIRTHDAY_BOOK_DIR";
pub const REMOTE_URL_VAR: &str = "BIRTHDAY_BOOK_REMOTE_URL";
pub const TIMEOUT_VAR: &str = "BIRTHDAY_BOOK_TIMEOUT_SECS";

pub const DEFAULT_DATA_DIR: &str = ".birthday-book";
pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:8090";
pub const DEFAULT_TIMEOUT_SECS: &str = "10";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key:    &'static str,
        value:  String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the local birthday store
    pub data_dir:   PathBuf,
    /// Base URL of the hosted record backend
    pub remote_url: Url,
    pub timeout:    Duration,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(&[])
    }

    /// Like [`Config::from_env`], but `overrides` take the place of the
    /// matching variables before anything is validated.
    ///
    /// # Errors
    /// Returns `ConfigError` if a resulting value is unusable.
    pub fn from_env_with(overrides: &[(&str, &str)]) -> Result<Self, ConfigError> {
        Self::from_lookup(overriding(overrides, |key| env::var(key).ok()))
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// anything it does not provide.
    ///
    /// # Errors
    /// Returns `ConfigError` if a provided value is unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir: PathBuf = load(&lookup, DATA_DIR_VAR, DEFAULT_DATA_DIR)?;
        let remote_url: String = load(&lookup, REMOTE_URL_VAR, DEFAULT_REMOTE_URL)?;
        let remote_url = parse_remote_url(&remote_url)?;
        let timeout_secs: u64 = load(&lookup, TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS)?;

        let config = Self {
            data_dir,
            remote_url,
            timeout: Duration::from_secs(timeout_secs),
        };
        debug!("Loaded config: {config:?}");
        Ok(config)
    }
}

/// Accepts only absolute http(s) URLs.
///
/// # Errors
/// Returns `ConfigError` for anything else.
pub fn parse_remote_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: REMOTE_URL_VAR,
        value: value.to_owned(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

fn overriding<'a>(
    overrides: &'a [(&'a str, &'a str)],
    fallback: impl Fn(&str) -> Option<String> + 'a,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        overrides
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| (*value).to_owned())
            .or_else(|| fallback(key))
    }
}

fn load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
