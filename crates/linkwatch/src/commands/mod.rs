//! Command handlers and the shared bounded poll driver.

pub mod check;
pub mod export;
pub mod init;
pub mod poll;

use std::sync::Arc;

use tracing::{info, warn};

use linkwatch_config::{Config, load_config};
use linkwatch_core::{CounterProbe, HttpProbe, Poller, Snapshot, Topology};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load and validate the configuration named by `--config`.
pub fn load(global: &GlobalOpts) -> Result<(Config, Topology), CliError> {
    let config = load_config(global.config.as_deref())?;
    let topology = config.to_topology()?;
    Ok((config, topology))
}

/// A poller wired to the counter agents described by `config`.
pub fn http_poller(config: &Config, topology: Topology) -> Result<Poller<HttpProbe>, CliError> {
    let probe = HttpProbe::new(&config.transport())?;
    let (poller, _handle) = Poller::new(topology, probe, config.poll_settings());
    Ok(poller)
}

/// Run cycles back to back on the poll interval, handing each published
/// snapshot to `on_snapshot`. Stops after `cycles` cycles (aborted ones
/// included) or on Ctrl-C.
pub async fn drive<P, F>(poller: &mut Poller<P>, cycles: Option<u64>, mut on_snapshot: F) -> Result<(), CliError>
where
    P: CounterProbe,
    F: FnMut(&Topology, &Arc<Snapshot>) -> Result<(), CliError>,
{
    let interval = poller.settings().interval;
    let mut completed = 0u64;

    loop {
        match poller.try_cycle().await {
            Ok(snapshot) => on_snapshot(poller.topology(), &snapshot)?,
            Err(e) => warn!(error = %e, "poll cycle aborted"),
        }
        completed += 1;
        if cycles.is_some_and(|n| completed >= n) {
            return Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(cycles = completed, "interrupted");
                return Ok(());
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}
