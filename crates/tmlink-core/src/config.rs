// ── Session configuration ──
//
// `SessionSettings` is what a host hands the session: every field optional,
// exactly as it came out of a config file or form. `validate` turns it into
// `Credentials` plus the field set name, or fails with `BadConfig`.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::SessionError;
use crate::mapper::FieldPolicy;

/// Default name of the field set a fresh profile connects to.
pub const DEFAULT_FIELD_SET: &str = "Match Field Set #1";

/// Default delay between reconnect attempts after a field set closes.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

/// Everything needed to authenticate against a controller.
///
/// Immutable once a session attempt starts.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub address: Url,
    pub api_key: SecretString,
    pub client_id: String,
    pub client_secret: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// Raw session configuration, as supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    /// Controller host, either a bare IP/hostname or a full URL.
    pub address: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    /// Credential expiry, RFC 3339 (`2026-06-09T00:00:00+00:00`),
    /// `2026-06-09T00:00:00+0000`, or a plain date.
    pub client_expiration: Option<String>,
    pub api_key: Option<SecretString>,
    pub field_set: Option<String>,
}

/// Validated settings for one session attempt.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub credentials: Credentials,
    pub field_set: String,
}

impl SessionSettings {
    /// Check that every required field is present and well-formed.
    ///
    /// Empty strings count as missing. Fields are checked in groups; the
    /// first incomplete group names the error.
    pub fn validate(&self) -> Result<ValidatedSettings, SessionError> {
        let (Some(client_id), Some(client_secret), Some(expiration)) = (
            present(self.client_id.as_deref()),
            present_secret(self.client_secret.as_ref()),
            present(self.client_expiration.as_deref()),
        ) else {
            return Err(SessionError::bad_config("tm api credentials not provided"));
        };

        let (Some(address), Some(api_key)) = (
            present(self.address.as_deref()),
            present_secret(self.api_key.as_ref()),
        ) else {
            return Err(SessionError::bad_config("tm connection info not provided"));
        };

        let Some(field_set) = present(self.field_set.as_deref()) else {
            return Err(SessionError::bad_config(
                "field set connection info not provided",
            ));
        };

        let expires_at = parse_expiration(expiration).ok_or_else(|| {
            SessionError::bad_config(format!("invalid client expiration: {expiration}"))
        })?;
        let address = parse_address(address)?;

        Ok(ValidatedSettings {
            credentials: Credentials {
                address,
                api_key: api_key.clone(),
                client_id: client_id.to_owned(),
                client_secret: client_secret.clone(),
                expires_at,
            },
            field_set: field_set.to_owned(),
        })
    }
}

/// Tunables that are not part of the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub reconnect_interval: Duration,
    pub field_policy: FieldPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            field_policy: FieldPolicy::default(),
        }
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn present_secret(value: Option<&SecretString>) -> Option<&SecretString> {
    value.filter(|s| !s.expose_secret().trim().is_empty())
}

/// Accept a full URL or a bare host (`192.168.1.50`, `tm.local:8080`),
/// which is taken as plain HTTP.
fn parse_address(raw: &str) -> Result<Url, SessionError> {
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| SessionError::bad_config(format!("invalid controller address {raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(SessionError::bad_config(format!(
            "invalid controller address {raw}"
        )));
    }
    Ok(url)
}

fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
