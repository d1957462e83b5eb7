//! Telemetry and rendering core for linkwatch, a network weathermap.
//!
//! The crate turns cumulative interface counters into a colored topology
//! diagram:
//!
//! - **Counter Sampler** ([`sampler`]) converts raw counters into rates,
//!   utilization and status, handling wrap/reset and staleness. The
//!   [`CounterCache`] holding the previous readings is owned by the poll
//!   loop and passed into the sampler by reference.
//!
//! - **Topology Resolver** ([`resolver`]) merges per-target samples into a
//!   [`Snapshot`]: router health, link forward/reverse metrics, link
//!   capacity and aggregate utilization.
//!
//! - **Geometry Engine** ([`geometry`]) computes fan-out curves for
//!   parallel links and splits any link path at its arc-length midpoint.
//!
//! - **Renderer** ([`render`]) draws a map through the abstract
//!   [`Surface`] capability set, so the interactive and offline backends
//!   share every drawing decision. [`SvgSurface`] is the offline backend.
//!
//! - **Poll Loop** ([`poll`]) samples all targets concurrently each cycle
//!   and atomically publishes one snapshot to subscribers.

pub mod error;
pub mod geometry;
pub mod model;
pub mod poll;
pub mod render;
pub mod resolver;
pub mod sampler;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use geometry::{Geometry, LinkPath, Point};
pub use model::{
    CounterId, Endpoint, Interface, InterfaceMetrics, Link, LinkMetrics, MapSize, Message,
    RouterMetrics, Snapshot, Status, Target, Topology,
};
pub use poll::{PollCommand, PollHandle, PollSettings, Poller};
pub use render::export::SnapshotExporter;
pub use render::svg::SvgSurface;
pub use render::{RenderOptions, Surface, draw_map};
pub use sampler::cache::CounterCache;
pub use sampler::probe::{CounterProbe, HttpProbe, StaticProbe};
