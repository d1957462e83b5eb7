//! Clap derive structures for the `linkwatch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// linkwatch -- network weathermap
#[derive(Debug, Parser)]
#[command(
    name = "linkwatch",
    version,
    about = "Poll interface counters and render network utilization maps",
    long_about = "Samples cumulative interface counters from per-router counter agents,\n\
        derives throughput, utilization and health, and renders the topology\n\
        as a colored map (SVG snapshots, JSON messages, or the live TUI).",
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
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "LINKWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the configuration and summarize it
    Check,

    /// Print the topology message
    #[command(alias = "topo")]
    Topology,

    /// Poll and print one metrics message per cycle
    Poll(PollArgs),

    /// Poll, then print link and router status
    Status(StatusArgs),

    /// Poll and write an SVG snapshot every cycle
    Export(ExportArgs),

    /// Write a starter configuration file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Stop after this many cycles (runs until Ctrl-C when omitted)
    #[arg(long, short = 'n')]
    pub cycles: Option<u64>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Cycles to run before reporting; rates need at least two
    #[arg(long, short = 'n', default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
    pub cycles: u64,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Stop after this many cycles (runs until Ctrl-C when omitted)
    #[arg(long, short = 'n')]
    pub cycles: Option<u64>,

    /// Output directory (overrides `export.dir`)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Where to write the file (defaults to --config or the platform path)
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
