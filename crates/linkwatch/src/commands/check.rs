//! `check` and `topology`: configuration inspection without polling.

use tabled::Tabled;

use linkwatch_core::Message;

use super::load;
use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, fmt_bps};

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "Target")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Interfaces")]
    interfaces: String,
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (config, topology) = load(global)?;
    let message = Message::topology(&topology);

    let rendered = output::render(global.output, &message, || {
        topology
            .targets
            .values()
            .map(|t| TargetRow {
                id: t.id.clone(),
                label: t.label.clone(),
                agent: t.agent.clone().unwrap_or_else(|| "-".into()),
                interfaces: t
                    .interfaces
                    .iter()
                    .map(|i| match i.max_bandwidth {
                        Some(bw) => format!("{} ({})", i.name, fmt_capacity(bw)),
                        None => i.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect()
    })?;
    output::print_output(&rendered, global.quiet);

    if global.output == crate::cli::OutputFormat::Table && !global.quiet {
        println!(
            "{} targets, {} links, polling every {} (probe timeout {})",
            topology.targets.len(),
            topology.links.len(),
            humantime::format_duration(config.poll_settings().interval),
            humantime::format_duration(config.poll_settings().probe_timeout),
        );
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn fmt_capacity(bps: u64) -> String {
    fmt_bps(bps as f64)
}

pub fn topology(global: &GlobalOpts) -> Result<(), CliError> {
    let (_, topology) = load(global)?;
    let rendered = output::render_stream(global.output, &Message::topology(&topology))?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
