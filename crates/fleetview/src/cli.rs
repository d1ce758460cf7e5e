//! Clap derive structures for the `fleetview` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fleetview_core::{ProviderFilter, SortKey, StatusFilter};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetview -- one list for every Ewon and Ixon remote-access device
#[derive(Debug, Parser)]
#[command(
    name = "fleetview",
    version,
    about = "Browse Ewon and Ixon remote-access devices from the command line",
    long_about = "Signs in to Ixon Cloud (and Talk2M when permitted), fetches both\n\
        device fleets concurrently, and shows them as one ranked list with\n\
        remote-access links and recent error counts.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FLEETVIEW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Ixon username (overrides the config file)
    #[arg(long, short = 'u', env = "FLEETVIEW_USERNAME", global = true)]
    pub username: Option<String>,

    /// Two-factor one-time code for the Ixon sign-in
    #[arg(long, global = true)]
    pub otp: Option<String>,

    /// Output format (overrides `defaults.output`)
    #[arg(long, short = 'o', env = "FLEETVIEW_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (overrides `defaults.color`)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides `defaults.timeout`)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Shared value enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Online first, then by name
    Alphabetical,
    /// Most recent errors first
    Errors,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Alphabetical => SortKey::Alphabetical,
            SortArg::Errors => SortKey::Errors,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    #[default]
    All,
    Ewon,
    Ixon,
}

impl From<ProviderArg> for ProviderFilter {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::All => ProviderFilter::All,
            ProviderArg::Ewon => ProviderFilter::Ewon,
            ProviderArg::Ixon => ProviderFilter::Ixon,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    #[default]
    All,
    Online,
    Offline,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::All => StatusFilter::All,
            StatusArg::Online => StatusFilter::Online,
            StatusArg::Offline => StatusFilter::Offline,
        }
    }
}

// ── Command tree ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, inspect and watch devices across both providers
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Show the signed-in Ixon user and granted permissions
    Whoami,

    /// Sign in and probe both provider sessions
    Check,

    /// Inspect the configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Devices
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices from every provider as one ranked list
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show links, data monitors and reports of one device
    Show {
        /// Device id, `provider:id`, or name
        device: String,
    },

    /// Refresh the device list on an interval, keeping sessions alive
    Watch {
        #[command(flatten)]
        list: ListArgs,

        /// Seconds between refreshes
        #[arg(long, short = 'n', default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

/// Ranking and filtering shared by `list` and `watch`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Sort order (overrides `defaults.sort`)
    #[arg(long, short = 's')]
    pub sort: Option<SortArg>,

    /// Only show devices of one provider
    #[arg(long, default_value = "all")]
    pub provider: ProviderArg,

    /// Only show online or offline devices
    #[arg(long, default_value = "all")]
    pub status: StatusArg,

    /// Case-insensitive substring match on the device name
    #[arg(long, short = 'f')]
    pub query: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Config & completions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets redacted
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
