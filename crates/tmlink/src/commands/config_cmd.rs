//! Config subcommand handlers.

use tmlink_config::{Config, SecretKind};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat, SecretArg};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&tmlink_config::config_path().display().to_string());
            Ok(())
        }
        ConfigCommand::Show => {
            let mut cfg = tmlink_config::load_config()?;
            redact(&mut cfg);
            let out = match global.output {
                OutputFormat::Text => toml::to_string_pretty(&cfg)?,
                OutputFormat::Json => output::render_json(&cfg)?,
            };
            output::print_output(&out);
            Ok(())
        }
        ConfigCommand::SetSecret { kind } => set_secret(kind, global),
    }
}

/// Mask plaintext secrets before display.
fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
        if profile.client_secret.is_some() {
            profile.client_secret = Some(MASK.into());
        }
    }
}

fn set_secret(kind: SecretArg, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = tmlink_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let kind = SecretKind::from(kind);

    let prompt = match kind {
        SecretKind::ApiKey => "API key: ",
        SecretKind::ClientSecret => "Client secret: ",
    };
    let secret = rpassword::prompt_password(prompt)?;
    if secret.trim().is_empty() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "cannot be empty".into(),
        });
    }

    tmlink_config::store_secret(&profile_name, kind, secret.trim())?;
    output::print_output(&format!(
        "Stored {} for profile '{profile_name}' in the system keyring",
        kind.keyring_user(&profile_name)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use tmlink_config::Profile;

    use super::*;

    #[test]
    fn redact_masks_only_present_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "gym".into(),
            Profile {
                api_key: Some("plain-key".into()),
                client_id: Some("client-1".into()),
                ..Profile::default()
            },
        );

        redact(&mut cfg);

        let gym = &cfg.profiles["gym"];
        assert_eq!(gym.api_key.as_deref(), Some(MASK));
        assert_eq!(gym.client_secret, None);
        assert_eq!(gym.client_id.as_deref(), Some("client-1"));
    }
}
