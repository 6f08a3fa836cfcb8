//! Clap derive structures for the `ouman` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ouman -- read and adjust an Ouman EH-800 heating controller
#[derive(Debug, Parser)]
#[command(
    name = "ouman",
    version,
    about = "Read and adjust Ouman EH-800 heating controllers from the command line",
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
    /// Device profile to use
    #[arg(long, short = 'p', env = "OUMAN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device address, URL or bare host (overrides profile)
    #[arg(long, short = 'a', env = "OUMAN_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Login username (overrides profile)
    #[arg(long, short = 'u', env = "OUMAN_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password, taken from the environment only
    #[arg(long, env = "OUMAN_PASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "OUMAN_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "OUMAN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read current values (auto-detects installed circuits)
    #[command(alias = "v")]
    Values(ValuesArgs),

    /// Write a value to a controllable endpoint
    Set(SetArgs),

    /// Show the raw alarm map
    Alarms,

    /// List the built-in endpoint registries (no device needed)
    Registries,

    /// List endpoint definitions (no device needed)
    #[command(alias = "ep")]
    Endpoints(EndpointsArgs),
}

#[derive(Debug, Args)]
pub struct ValuesArgs {
    /// Read these registries instead of auto-detecting (repeatable)
    #[arg(long, short = 'r')]
    pub registry: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Endpoint name, e.g. l1_curve_0_temperature
    pub endpoint: String,

    /// New value: a number, or an enum member such as `away`
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Debug, Args)]
pub struct EndpointsArgs {
    /// Only list this registry
    #[arg(long, short = 'r')]
    pub registry: Option<String>,
}
