//! CLI configuration: profile lookup plus `GlobalOpts` flag overrides.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use tmlink_config::{Config, Profile};
use tmlink_core::{DEFAULT_FIELD_SET, SessionOptions, SessionSettings, TmController};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a controller-facing command needs.
pub struct Resolved {
    pub settings: SessionSettings,
    pub options: SessionOptions,
    pub timeout: Duration,
    pub token_url: Url,
}

impl Resolved {
    pub fn controller(&self) -> TmController {
        TmController::new(self.timeout, self.token_url.clone())
    }

    /// The field set this invocation binds.
    pub fn field_set(&self) -> &str {
        self.settings.field_set.as_deref().unwrap_or(DEFAULT_FIELD_SET)
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load the config and layer the CLI flags over the active profile.
///
/// A missing profile is only an error when `--profile` named it; otherwise
/// the flags alone describe the connection.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let config = tmlink_config::load_config()?;
    let name = active_profile_name(global, &config);

    let fallback = Profile::default();
    let profile = match config.profiles.get(&name) {
        Some(profile) => profile,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&config),
            });
        }
        None => &fallback,
    };

    let mut settings = tmlink_config::profile_to_settings(profile, &name);
    apply_overrides(&mut settings, global);

    let timeout = global.timeout.map_or_else(
        || tmlink_config::profile_timeout(profile, &config.defaults),
        Duration::from_secs,
    );

    Ok(Resolved {
        settings,
        options: tmlink_config::profile_to_options(profile, &config.defaults),
        timeout,
        token_url: tmlink_config::profile_token_url(profile)?,
    })
}

/// CLI flag overrides take priority over profile values.
fn apply_overrides(settings: &mut SessionSettings, global: &GlobalOpts) {
    if let Some(ref address) = global.address {
        settings.address = Some(address.clone());
    }
    if let Some(ref client_id) = global.client_id {
        settings.client_id = Some(client_id.clone());
    }
    if let Some(ref expiration) = global.client_expiration {
        settings.client_expiration = Some(expiration.clone());
    }
    if let Some(ref secret) = global.client_secret {
        settings.client_secret = Some(SecretString::from(secret.clone()));
    }
    if let Some(ref key) = global.api_key {
        settings.api_key = Some(SecretString::from(key.clone()));
    }
    if let Some(ref field_set) = global.field_set {
        settings.field_set = Some(field_set.clone());
    }
    if settings.field_set.is_none() {
        settings.field_set = Some(DEFAULT_FIELD_SET.into());
    }
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
