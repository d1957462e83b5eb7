// ── Snapshot export ──
//
// Offline rendering entrypoint: one SVG file per snapshot plus a stable
// `latest.svg`, with a handle to the most recent image.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::info;

use super::svg::SvgSurface;
use super::{RenderOptions, draw_map};
use crate::error::CoreError;
use crate::geometry::Geometry;
use crate::model::{Snapshot, Topology};

const LATEST: &str = "latest.svg";

/// Writes rendered snapshots into a directory.
///
/// Retention is not managed here; old `snapshot-*.svg` files accumulate
/// until something else prunes them.
#[derive(Debug)]
pub struct SnapshotExporter {
    dir: PathBuf,
    options: RenderOptions,
    latest: ArcSwapOption<PathBuf>,
}

impl SnapshotExporter {
    pub fn new(dir: impl Into<PathBuf>, options: RenderOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
            latest: ArcSwapOption::empty(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render to an SVG document without touching the filesystem.
    pub fn render(&self, topology: &Topology, geometry: &Geometry, snapshot: Option<&Snapshot>) -> String {
        let mut surface = SvgSurface::new(self.options.width, self.options.height);
        draw_map(&mut surface, topology, geometry, snapshot, &self.options);
        surface.finish()
    }

    /// Render `snapshot` and write `snapshot-<unix_ms>.svg` and
    /// `latest.svg`. Returns the timestamped path.
    ///
    /// Blocking I/O; async callers should run it on a blocking thread.
    pub fn export(&self, topology: &Topology, geometry: &Geometry, snapshot: &Snapshot) -> Result<PathBuf, CoreError> {
        let document = self.render(topology, geometry, Some(snapshot));
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CoreError::Export { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let path = self
            .dir
            .join(format!("snapshot-{}.svg", snapshot.timestamp.timestamp_millis()));
        fs::write(&path, &document).map_err(io_err(&path))?;

        // Replace `latest.svg` atomically so readers never see a partial file.
        let staging = self.dir.join(format!(".{LATEST}.tmp"));
        let latest = self.dir.join(LATEST);
        fs::write(&staging, &document).map_err(io_err(&staging))?;
        fs::rename(&staging, &latest).map_err(io_err(&latest))?;

        info!(path = %path.display(), "snapshot exported");
        self.latest.store(Some(Arc::new(path.clone())));
        Ok(path)
    }

    /// Path of the most recently exported image.
    pub fn latest(&self) -> Option<Arc<PathBuf>> {
        self.latest.load_full()
    }
}
