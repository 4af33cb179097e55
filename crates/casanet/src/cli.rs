//! Clap derive structures for the `casanet` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// casanet -- control a casanet smart-home hub from the command line
#[derive(Debug, Parser)]
#[command(
    name = "casanet",
    version,
    about = "Manage a casanet smart-home hub from the command line",
    long_about = "A CLI for casanet hubs: minions, timings, local network and\n\
        Bluetooth devices, plus a live feed of timings as they fire.",
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
    /// Hub profile to use
    #[arg(long, short = 'p', env = "CASANET_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Hub URL (overrides profile)
    #[arg(long, short = 'H', env = "CASANET_HUB", global = true)]
    pub hub: Option<String>,

    /// Session token
    #[arg(long, env = "CASANET_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CASANET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CASANET_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: profile, then 30)
    #[arg(long, env = "CASANET_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage scheduled minion actions
    #[command(alias = "t")]
    Timings(TimingsArgs),

    /// Manage minions (switches, lights, appliances)
    #[command(alias = "m")]
    Minions(MinionsArgs),

    /// Manage devices on the hub's local network
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Manage Bluetooth devices seen by the hub
    #[command(alias = "bt")]
    Bluetooth(BluetoothArgs),

    /// Log in to the hub
    Login(LoginArgs),

    /// End the current session
    Logout,

    /// Show the logged-in profile
    Whoami,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Shared search argument for device lists.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive search over names and addresses
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TIMINGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TimingsArgs {
    #[command(subcommand)]
    pub command: TimingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TimingsCommand {
    /// List timings
    #[command(alias = "ls")]
    List,

    /// Print the timings list on every change until interrupted
    Watch,

    /// Show one timing
    Get {
        /// Timing ID
        id: String,
    },

    /// Create a timing
    Create(TimingCreateArgs),

    /// Delete a timing
    #[command(alias = "rm")]
    Delete {
        /// Timing ID
        id: String,
    },

    /// Activate a timing
    Enable {
        /// Timing ID
        id: String,
    },

    /// Deactivate a timing
    Disable {
        /// Timing ID
        id: String,
    },

    /// Stream timings as they fire until interrupted
    Feed,
}

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("schedule")
        .required(true)
        .args(["once", "daily", "sun", "after"])
))]
pub struct TimingCreateArgs {
    /// Minion the timing acts on
    #[arg(long, short = 'm')]
    pub minion: String,

    /// Display name
    #[arg(long, short = 'n', default_value = "")]
    pub name: String,

    /// Fire once at an RFC 3339 date-time (e.g. 2026-10-14T07:30:00Z)
    #[arg(long, value_name = "DATETIME")]
    pub once: Option<String>,

    /// Fire daily at HH:MM
    #[arg(long, value_name = "HH:MM")]
    pub daily: Option<String>,

    /// Fire daily relative to sunrise or sunset
    #[arg(long, value_enum)]
    pub sun: Option<SunArg>,

    /// Minutes after the sun event (with --sun)
    #[arg(long, default_value = "0", requires = "sun")]
    pub offset: i64,

    /// Fire once after this many minutes from now
    #[arg(long, value_name = "MINUTES")]
    pub after: Option<i64>,

    /// Days for daily timings (default: every day)
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<String>,

    /// Switch the minion on or off when fired
    #[arg(long, value_enum, default_value = "on")]
    pub action: PowerArg,

    /// Create the timing deactivated
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SunArg {
    Sunrise,
    Sunset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PowerArg {
    On,
    Off,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MINIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MinionsArgs {
    #[command(subcommand)]
    pub command: MinionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MinionsCommand {
    /// List minions
    #[command(alias = "ls")]
    List,

    /// Switch a minion on
    On {
        /// Minion ID
        id: String,
    },

    /// Switch a minion off
    Off {
        /// Minion ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List local network devices
    #[command(alias = "ls")]
    List(SearchArgs),

    /// Give a device a display name
    Rename {
        /// Device MAC address
        #[arg(value_name = "MAC")]
        mac: String,

        /// New name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BLUETOOTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BluetoothArgs {
    #[command(subcommand)]
    pub command: BluetoothCommand,
}

#[derive(Debug, Subcommand)]
pub enum BluetoothCommand {
    /// List Bluetooth devices
    #[command(alias = "ls")]
    List(SearchArgs),

    /// Print the device list on every change until interrupted
    Watch(SearchArgs),

    /// Give a device a display name
    Rename {
        /// Device UUID
        uuid: String,

        /// New name
        name: String,
    },

    /// Ask the hub to scan again, then list the result
    Rescan,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store a session token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
