use clap::{Args, Parser, Subcommand, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "kosei", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub check: CheckArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    Secret(SecretCommand),
}

/// API key management subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum SecretCommand {
    /// Store the OpenRouter API key (prompted for when omitted).
    SetOpenRouterKey {
        #[arg(long)]
        key: Option<String>,
    },
    /// Remove the stored OpenRouter API key.
    ClearOpenRouterKey,
    /// Show whether an API key is configured.
    Status,
}

/// Arguments for the default proofreading flow.
#[derive(Debug, Clone, Args, Default)]
pub struct CheckArgs {
    /// Script file to proofread ("-" or omitted reads stdin).
    #[arg(value_name = "INFILE", value_hint = ValueHint::FilePath)]
    pub infile: Option<String>,

    /// Toggle the local pattern checks (defaults to config value).
    #[arg(
        long = "local",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub local: Option<bool>,

    /// Toggle the AI review pass (defaults to config value).
    #[arg(
        long = "ai",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub ai: Option<bool>,

    /// Model id for the AI review (defaults to config value).
    #[arg(long = "model", value_name = "MODEL")]
    pub model: Option<String>,

    /// Flag lines longer than this many characters.
    #[arg(long = "max-line-chars", value_name = "CHARS")]
    pub max_line_chars: Option<usize>,

    /// Write the findings to a CSV file (timestamped name when omitted).
    #[arg(
        long = "csv",
        num_args = 0..=1,
        default_missing_value = "",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub csv: Option<String>,
}

impl CheckArgs {
    /// Returns true when no processing flags were provided.
    pub fn is_empty(&self) -> bool {
        self.infile.is_none()
            && self.local.is_none()
            && self.ai.is_none()
            && self.model.is_none()
            && self.max_line_chars.is_none()
            && self.csv.is_none()
    }
}
