//! `export`: render an SVG snapshot every cycle.

use linkwatch_core::{Geometry, SnapshotExporter};
use tracing::info;

use super::{drive, http_poller, load};
use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;

pub async fn handle(args: ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, topology) = load(global)?;
    let dir = args.out.unwrap_or_else(|| config.export.dir.clone());
    let exporter = SnapshotExporter::new(dir, config.export_options(&topology));
    let geometry = Geometry::compute(&topology);
    let mut poller = http_poller(&config, topology)?;

    info!(dir = %exporter.dir().display(), "exporting snapshots");
    drive(&mut poller, args.cycles, |topology, snapshot| {
        let path = tokio::task::block_in_place(|| exporter.export(topology, &geometry, snapshot))?;
        if !global.quiet {
            println!("{}", path.display());
        }
        Ok(())
    })
    .await?;

    if let Some(latest) = exporter.latest() {
        info!(path = %latest.display(), "latest snapshot");
    }
    Ok(())
}
