//! `poll` and `status`: run the poll loop against the configured agents.

use std::sync::Arc;

use tabled::Tabled;

use linkwatch_core::{Message, Snapshot};

use super::{drive, http_poller, load};
use crate::cli::{GlobalOpts, PollArgs, StatusArgs};
use crate::error::CliError;
use crate::output::{self, fmt_bps, fmt_pct};

/// Stream one metrics message per cycle.
pub async fn handle(args: PollArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, topology) = load(global)?;
    let mut poller = http_poller(&config, topology)?;

    drive(&mut poller, args.cycles, |_, snapshot| {
        let message = Message::metrics(Arc::clone(snapshot));
        output::print_output(&output::render_stream(global.output, &message)?, global.quiet);
        Ok(())
    })
    .await
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Link")]
    id: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Fwd")]
    forward: String,
    #[tabled(rename = "Rev")]
    reverse: String,
    #[tabled(rename = "Capacity")]
    capacity: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct RouterRow {
    #[tabled(rename = "Router")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Run a few cycles, then report the last snapshot.
pub async fn status(args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, topology) = load(global)?;
    let mut poller = http_poller(&config, topology)?;

    let mut last: Option<Arc<Snapshot>> = None;
    drive(&mut poller, Some(args.cycles), |_, snapshot| {
        last = Some(Arc::clone(snapshot));
        Ok(())
    })
    .await?;

    let Some(snapshot) = last else {
        eprintln!("No snapshot was published");
        return Ok(());
    };

    let routers = output::render(global.output, &*snapshot, || {
        snapshot
            .routers
            .iter()
            .map(|(id, r)| RouterRow {
                id: id.clone(),
                status: r.status.to_string(),
                error: r.error.clone().unwrap_or_default(),
            })
            .collect()
    })?;
    output::print_output(&routers, global.quiet);

    if global.output == crate::cli::OutputFormat::Table {
        let links = output::render(global.output, &*snapshot, || {
            snapshot
                .links
                .iter()
                .map(|l| LinkRow {
                    id: l.id.clone(),
                    from: l.from.to_string(),
                    to: l.to.to_string(),
                    forward: direction(l.forward.as_ref().map(|m| m.out_bps), l.forward_utilization()),
                    reverse: direction(l.reverse.as_ref().map(|m| m.out_bps), l.reverse_utilization()),
                    capacity: l.capacity.map_or_else(|| "-".into(), fmt_bps),
                    status: l.status.to_string(),
                })
                .collect()
        })?;
        output::print_output(&links, global.quiet);
    }
    Ok(())
}

fn direction(bps: Option<f64>, utilization: Option<f64>) -> String {
    match bps {
        Some(bps) => format!("{} ({})", fmt_bps(bps), fmt_pct(utilization)),
        None => "-".into(),
    }
}
