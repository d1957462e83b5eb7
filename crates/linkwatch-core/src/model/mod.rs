// ── Domain model ──
//
// Topology definitions (what to poll and where to draw it), per-cycle
// snapshots (what was measured), and the push messages built from both.

pub mod counter_id;
pub mod message;
pub mod snapshot;
pub mod topology;

pub use counter_id::CounterId;
pub use message::{InterfaceInfo, LinkInfo, Message, RouterInfo, TopologyMessage};
pub use snapshot::{
    CapacityRange, InterfaceMetrics, LinkMetrics, RouterMetrics, Snapshot, Status,
};
pub use topology::{Endpoint, Interface, Link, MapSize, Target, Topology};
