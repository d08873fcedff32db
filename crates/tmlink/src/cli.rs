//! Clap derive structures for the `tmlink` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use strum::IntoEnumIterator;

use tmlink_core::{AudienceDisplay, FieldId, FieldSetCommand, SkillsType};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tmlink -- drive tournament manager field sets from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "tmlink",
    version,
    about = "Watch and control tournament manager field sets",
    long_about = "Connects to a tournament manager controller, binds one field set,\n\
        and publishes its match, field and audience display state.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "TMLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller address, IP or URL (overrides profile)
    #[arg(long, short = 'a', env = "TMLINK_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Field set name (overrides profile)
    #[arg(long, short = 'f', env = "TMLINK_FIELD_SET", global = true)]
    pub field_set: Option<String>,

    /// Controller API key
    #[arg(long, env = "TMLINK_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// OAuth client id
    #[arg(long, env = "TMLINK_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "TMLINK_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Client credential expiry date
    #[arg(long, env = "TMLINK_CLIENT_EXPIRATION", global = true)]
    pub client_expiration: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TMLINK_OUTPUT",
        default_value = "text",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "TMLINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables and lines
    Text,
    /// JSON, one document (or one event per line for `watch`)
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bind the field set and print every state change until Ctrl-C
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// List field sets on the controller
    #[command(alias = "fs")]
    Fieldsets,

    /// List the fields of the configured field set
    Fields,

    /// Send a command to the configured field set
    #[command(alias = "a")]
    Action(ActionArgs),

    /// List audience display modes
    Displays,

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Report whether the audience display shows MODE (repeatable)
    #[arg(long = "when-display", value_name = "MODE", value_parser = parse_display)]
    pub when_display: Vec<AudienceDisplay>,

    /// Report whether field ID is the active field (repeatable)
    #[arg(long = "when-field", value_name = "ID")]
    pub when_field: Vec<FieldId>,
}

// ── Action ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ActionArgs {
    #[command(subcommand)]
    pub command: ActionCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ActionCommand {
    /// Queue the next match
    QueueNext,
    /// Queue the previous match
    QueuePrevious,
    /// Queue a programming skills run
    QueueSkillsProgramming,
    /// Queue a driver skills run
    QueueSkillsDriver,
    /// Start the queued match
    Start(FieldTarget),
    /// End the running match early
    EndEarly(FieldTarget),
    /// Reset the match timer
    ResetTimer(FieldTarget),
    /// Abort the running match
    Abort(FieldTarget),
    /// Switch the audience display
    Display {
        /// Display mode id, see `tmlink displays`
        #[arg(value_parser = parse_display)]
        mode: AudienceDisplay,
    },
}

#[derive(Debug, Clone, Args)]
pub struct FieldTarget {
    /// Field id to target (default: the active field)
    #[arg(long)]
    pub field: Option<FieldId>,
}

impl From<ActionCommand> for FieldSetCommand {
    fn from(action: ActionCommand) -> Self {
        match action {
            ActionCommand::QueueNext => Self::QueueNextMatch,
            ActionCommand::QueuePrevious => Self::QueuePreviousMatch,
            ActionCommand::QueueSkillsProgramming => Self::QueueSkills {
                skills_type: SkillsType::Programming,
            },
            ActionCommand::QueueSkillsDriver => Self::QueueSkills {
                skills_type: SkillsType::Driver,
            },
            ActionCommand::Start(target) => Self::StartMatch {
                field_id: target.field,
            },
            ActionCommand::EndEarly(target) => Self::EndMatchEarly {
                field_id: target.field,
            },
            ActionCommand::ResetTimer(target) => Self::ResetTimer {
                field_id: target.field,
            },
            ActionCommand::Abort(target) => Self::AbortMatch {
                field_id: target.field,
            },
            ActionCommand::Display { mode } => Self::SetAudienceDisplay { display: mode },
        }
    }
}

fn parse_display(raw: &str) -> Result<AudienceDisplay, String> {
    raw.parse().map_err(|_| {
        let valid: Vec<&str> = AudienceDisplay::iter().map(AudienceDisplay::id).collect();
        format!("unknown display mode '{raw}' (expected one of: {})", valid.join(", "))
    })
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Show the current configuration, secrets masked
    Show,
    /// Store a secret for the active profile in the system keyring
    SetSecret {
        #[arg(value_enum)]
        kind: SecretArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretArg {
    ApiKey,
    ClientSecret,
}

impl From<SecretArg> for tmlink_config::SecretKind {
    fn from(arg: SecretArg) -> Self {
        match arg {
            SecretArg::ApiKey => Self::ApiKey,
            SecretArg::ClientSecret => Self::ClientSecret,
        }
    }
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
