//! `linkwatch-tui`: live weathermap in the terminal.
//!
//! Runs the poll loop in the background and draws each published snapshot
//! onto a braille canvas with the same drawing routine the SVG exporter
//! uses. Routers can be selected and nudged around; the config file can be
//! reloaded without restarting.
//!
//! Logs are written to a file (default `/tmp/linkwatch-tui.log`) to avoid
//! corrupting the terminal UI.

mod action;
mod app;
mod canvas;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use linkwatch_core::{HttpProbe, Poller, SnapshotExporter};

use crate::app::App;

/// Live terminal weathermap.
#[derive(Parser, Debug)]
#[command(name = "linkwatch-tui", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "LINKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log file path (defaults to /tmp/linkwatch-tui.log)
    #[arg(long, default_value = "/tmp/linkwatch-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Route logs to `path`. The terminal belongs to the UI, so nothing is
/// written to stdout or stderr. Keep the guard alive until exit.
fn setup_tracing(path: &Path, verbose: u8) -> WorkerGuard {
    let level = ["warn", "info", "debug"]
        .get(usize::from(verbose))
        .copied()
        .unwrap_or("trace");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkwatch_tui={level},linkwatch_core={level}")));

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or(OsStr::new("linkwatch-tui.log"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli.log_file, cli.verbose);

    // Fail before touching the terminal so config errors print normally.
    let config = linkwatch_config::load_config(cli.config.as_deref()).wrap_err("loading configuration")?;
    let topology = config.to_topology().wrap_err("validating configuration")?;
    let probe = HttpProbe::new(&config.transport())?;

    let exporter = SnapshotExporter::new(config.export.dir.clone(), config.export_options(&topology));
    info!(
        targets = topology.targets.len(),
        links = topology.links.len(),
        "starting linkwatch-tui"
    );

    let cancel = CancellationToken::new();
    let (handle, poll_task) = Poller::spawn(topology, probe, config.poll_settings(), cancel.clone());

    let mut app = App::new(handle, exporter, cli.config, cancel.clone());
    let result = app.run().await;

    cancel.cancel();
    poll_task.await?;
    result
}
