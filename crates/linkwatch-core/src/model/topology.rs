// ── Topology domain types ──
//
// A Topology is the validated, immutable description of what to poll
// and where to draw it. The config crate builds it; the core trusts its
// referential integrity (every link endpoint resolves).

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::sampler::cache::CacheKey;

/// Default multiplier applied to a probed speed counter (Mbps to bps).
pub const DEFAULT_SPEED_MULTIPLIER: f64 = 1_000_000.0;

/// Canvas size in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
}

/// A monitored interface on a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    /// Unique within its target.
    pub name: String,
    pub display_name: String,
    /// Statically configured capacity in bits per second.
    pub max_bandwidth: Option<u64>,
    /// Raw identifier of the cumulative inbound octet counter.
    pub in_counter: String,
    /// Raw identifier of the cumulative outbound octet counter.
    pub out_counter: String,
    /// Raw identifier of a dynamically probed speed value, if any.
    pub speed_counter: Option<String>,
    /// Scale applied to the probed speed value to obtain bits per second.
    pub speed_multiplier: f64,
}

impl Interface {
    /// Interface with the given counters and no capacity information.
    pub fn new(name: impl Into<String>, in_counter: impl Into<String>, out_counter: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            max_bandwidth: None,
            in_counter: in_counter.into(),
            out_counter: out_counter.into(),
            speed_counter: None,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
        }
    }

    pub fn with_max_bandwidth(mut self, bps: u64) -> Self {
        self.max_bandwidth = Some(bps);
        self
    }

    pub fn with_speed_counter(mut self, counter: impl Into<String>, multiplier: f64) -> Self {
        self.speed_counter = Some(counter.into());
        self.speed_multiplier = multiplier;
        self
    }
}

/// A monitored router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub label: String,
    pub position: Point,
    /// Base URL of the counter agent serving this target.
    pub agent: Option<String>,
    pub interfaces: Vec<Interface>,
}

impl Target {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            position,
            agent: None,
            interfaces: Vec::new(),
        }
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// One end of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "router")]
    pub target: String,
    pub interface: String,
}

impl Endpoint {
    pub fn new(target: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            interface: interface.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.interface)
    }
}

/// A link between two interfaces on two targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub from: Endpoint,
    pub to: Endpoint,
    pub label: Option<String>,
    /// Link-level capacity candidate in bits per second.
    pub capacity: Option<u64>,
    /// Manual path; when non-empty the link bypasses fan-out.
    pub waypoints: Vec<Point>,
}

impl Link {
    pub fn new(id: impl Into<String>, from: Endpoint, to: Endpoint) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            label: None,
            capacity: None,
            waypoints: Vec::new(),
        }
    }

    pub fn has_manual_path(&self) -> bool {
        !self.waypoints.is_empty()
    }

    /// Unordered target pair shared by every member of this link's group.
    pub fn group_key(&self) -> (&str, &str) {
        let (a, b) = (self.from.target.as_str(), self.to.target.as_str());
        if a <= b { (a, b) } else { (b, a) }
    }
}

/// The complete, validated topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub title: String,
    pub background: Option<String>,
    pub map_size: Option<MapSize>,
    pub poll_interval: Duration,
    /// Targets keyed by id, in configuration order.
    pub targets: IndexMap<String, Target>,
    pub links: Vec<Link>,
}

impl Topology {
    pub fn new(title: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            title: title.into(),
            background: None,
            map_size: None,
            poll_interval,
            targets: IndexMap::new(),
            links: Vec::new(),
        }
    }

    /// Insert or replace a target.
    pub fn add_target(&mut self, target: Target) {
        self.targets.insert(target.id.clone(), target);
    }

    pub fn target(&self, id: &str) -> Option<&Target> {
        self.targets.get(id)
    }

    pub fn interface(&self, endpoint: &Endpoint) -> Option<&Interface> {
        self.target(&endpoint.target)?.interface(&endpoint.interface)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Move a target on the canvas. Returns `false` for unknown ids.
    ///
    /// Callers must recompute [`Geometry`](crate::Geometry) before the
    /// next redraw.
    pub fn set_position(&mut self, id: &str, position: Point) -> bool {
        match self.targets.get_mut(id) {
            Some(target) => {
                target.position = position;
                true
            }
            None => false,
        }
    }

    /// Every key the sampler may cache under this topology.
    pub fn cache_keys(&self) -> HashSet<CacheKey> {
        self.targets
            .values()
            .flat_map(|t| t.interfaces.iter().map(|i| CacheKey::new(&t.id, i)))
            .collect()
    }

    /// Bounding size: the configured map size, or the extent of all
    /// positions and waypoints plus a margin.
    pub fn extent(&self) -> MapSize {
        if let Some(size) = self.map_size {
            return size;
        }
        let points = self
            .targets
            .values()
            .map(|t| t.position)
            .chain(self.links.iter().flat_map(|l| l.waypoints.iter().copied()));
        let (w, h) = points.fold((0.0_f64, 0.0_f64), |(w, h), p| (w.max(p.x), h.max(p.y)));
        MapSize {
            width: w + 80.0,
            height: h + 80.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Topology {
        let mut topo = Topology::new("test", Duration::from_secs(5));
        let mut a = Target::new("a", Point::new(10.0, 20.0));
        a.interfaces.push(Interface::new("eth0", "1.1", "1.2"));
        let mut b = Target::new("b", Point::new(300.0, 40.0));
        b.interfaces.push(Interface::new("eth1", "1.3", "1.4"));
        topo.add_target(a);
        topo.add_target(b);
        topo.links.push(Link::new(
            "ab",
            Endpoint::new("b", "eth1"),
            Endpoint::new("a", "eth0"),
        ));
        topo
    }

    #[test]
    fn group_key_is_unordered() {
        let topo = sample();
        assert_eq!(topo.links[0].group_key(), ("a", "b"));
    }

    #[test]
    fn set_position_rejects_unknown_target() {
        let mut topo = sample();
        assert!(topo.set_position("a", Point::new(1.0, 1.0)));
        assert!(!topo.set_position("zz", Point::new(1.0, 1.0)));
        assert_eq!(topo.target("a").map(|t| t.position), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn cache_keys_cover_all_interfaces() {
        let keys = sample().cache_keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&CacheKey::new("a", &Interface::new("eth0", "1.1", "1.2"))));
        assert!(keys.contains(&CacheKey::new("b", &Interface::new("eth1", "1.3", "1.4"))));
    }

    #[test]
    fn extent_falls_back_to_positions() {
        let size = sample().extent();
        assert!((size.width - 380.0).abs() < f64::EPSILON);
        assert!((size.height - 120.0).abs() < f64::EPSILON);
    }
}
