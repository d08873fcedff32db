//! Shared configuration for tmlink.
//!
//! TOML profiles, secret resolution (env + keyring + plaintext), and
//! translation to `tmlink_core::SessionSettings` / `SessionOptions`.
//! The CLI layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use tmlink_core::{
    DEFAULT_FIELD_SET, DEFAULT_TOKEN_URL, FieldPolicy, SessionOptions, SessionSettings,
};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "tmlink";

/// Overrides the config file location when set.
pub const CONFIG_PATH_ENV: &str = "TMLINK_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            reconnect_interval_secs: default_reconnect_interval(),
        }
    }
}

fn default_output() -> String {
    "text".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_reconnect_interval() -> u64 {
    10
}

/// A named controller profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller address: an IP, a hostname, or a full URL.
    pub address: Option<String>,

    /// Name of the field set to bind.
    #[serde(default = "default_field_set")]
    pub field_set: Option<String>,

    /// OAuth client id issued for the controller API.
    pub client_id: Option<String>,

    /// Client credential expiry (e.g. "2026-06-09T00:00:00+0000").
    pub client_expiration: Option<String>,

    /// Controller API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// OAuth client secret (plaintext, prefer keyring or env var).
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    pub client_secret_env: Option<String>,

    /// Override the OAuth token endpoint.
    pub token_url: Option<String>,

    /// Seconds between reconnect attempts after the field set drops.
    pub reconnect_interval_secs: Option<u64>,

    /// Keep publishing the last active field when nothing is queued.
    #[serde(default)]
    pub retain_last_field: bool,

    /// Override timeout.
    pub timeout: Option<u64>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_field_set() -> Option<String> {
    Some(DEFAULT_FIELD_SET.into())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `TMLINK_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "tmlink", "tmlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tmlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, layered as defaults → TOML file → `TMLINK_` env vars.
///
/// Nested keys use a double underscore, e.g.
/// `TMLINK_PROFILES__DEFAULT__ADDRESS=192.168.1.50`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TMLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secrets ─────────────────────────────────────────────────────────

/// A secret a profile can store in the system keyring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    ApiKey,
    ClientSecret,
}

impl SecretKind {
    /// Keyring entry name for this secret under `profile_name`.
    pub fn keyring_user(self, profile_name: &str) -> String {
        match self {
            Self::ApiKey => format!("{profile_name}/api-key"),
            Self::ClientSecret => format!("{profile_name}/client-secret"),
        }
    }

    fn sources(self, profile: &Profile) -> (Option<&str>, Option<&str>) {
        match self {
            Self::ApiKey => (profile.api_key_env.as_deref(), profile.api_key.as_deref()),
            Self::ClientSecret => (
                profile.client_secret_env.as_deref(),
                profile.client_secret.as_deref(),
            ),
        }
    }
}

/// Resolve a secret from the credential chain.
///
/// Order: the profile's `*_env` variable, the system keyring, then the
/// plaintext value. `None` when nothing is configured; the session reports
/// that as bad configuration.
pub fn resolve_secret(
    profile: &Profile,
    profile_name: &str,
    kind: SecretKind,
) -> Option<SecretString> {
    let (env_name, plaintext) = kind.sources(profile);

    // 1. Profile's env var
    if let Some(val) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|s| SecretString::from(s.to_owned()))
}

/// Store a secret for `profile_name` in the system keyring.
pub fn store_secret(profile_name: &str, kind: SecretKind, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(profile_name))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Profile translation ─────────────────────────────────────────────

/// Look up a profile by name.
pub fn profile<'a>(config: &'a Config, name: &str) -> Result<&'a Profile, ConfigError> {
    config
        .profiles
        .get(name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: name.into(),
        })
}

/// Build `SessionSettings` from a profile. Missing values stay `None`.
pub fn profile_to_settings(profile: &Profile, profile_name: &str) -> SessionSettings {
    SessionSettings {
        address: profile.address.clone(),
        client_id: profile.client_id.clone(),
        client_secret: resolve_secret(profile, profile_name, SecretKind::ClientSecret),
        client_expiration: profile.client_expiration.clone(),
        api_key: resolve_secret(profile, profile_name, SecretKind::ApiKey),
        field_set: profile.field_set.clone(),
    }
}

pub fn profile_to_options(profile: &Profile, defaults: &Defaults) -> SessionOptions {
    SessionOptions {
        reconnect_interval: Duration::from_secs(
            profile
                .reconnect_interval_secs
                .unwrap_or(defaults.reconnect_interval_secs)
                .max(1),
        ),
        field_policy: if profile.retain_last_field {
            FieldPolicy::RetainLastActive
        } else {
            FieldPolicy::Strict
        },
    }
}

pub fn profile_timeout(profile: &Profile, defaults: &Defaults) -> Duration {
    Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout))
}

/// The OAuth token endpoint for a profile.
pub fn profile_token_url(profile: &Profile) -> Result<Url, ConfigError> {
    let raw = profile.token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL);
    Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: "token_url".into(),
        reason: format!("{raw}: {e}"),
    })
}
