// ── Push message shapes ──
//
// The two messages handed to the transport layer: the topology (on
// connect and on every replacement) and the metrics (once per cycle).

use std::sync::Arc;

use serde::Serialize;

use super::snapshot::Snapshot;
use super::topology::{Endpoint, MapSize, Topology};
use crate::geometry::Point;

/// A push message, tagged with `"type"`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Topology(TopologyMessage),
    Metrics(Arc<Snapshot>),
}

impl Message {
    pub fn topology(topology: &Topology) -> Self {
        Self::Topology(TopologyMessage::from(topology))
    }

    pub fn metrics(snapshot: Arc<Snapshot>) -> Self {
        Self::Metrics(snapshot)
    }

    /// Compact JSON encoding, one message per line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyMessage {
    pub title: String,
    pub background_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_size: Option<MapSize>,
    pub poll_interval_ms: u64,
    pub routers: Vec<RouterInfo>,
    pub links: Vec<LinkInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterInfo {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub interfaces: Vec<InterfaceInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    pub name: String,
    pub display_name: String,
    pub max_bandwidth: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<Point>,
}

impl From<&Topology> for TopologyMessage {
    fn from(topology: &Topology) -> Self {
        let routers = topology
            .targets
            .values()
            .map(|t| RouterInfo {
                id: t.id.clone(),
                label: t.label.clone(),
                x: t.position.x,
                y: t.position.y,
                interfaces: t
                    .interfaces
                    .iter()
                    .map(|i| InterfaceInfo {
                        name: i.name.clone(),
                        display_name: i.display_name.clone(),
                        max_bandwidth: i.max_bandwidth,
                    })
                    .collect(),
            })
            .collect();

        let links = topology
            .links
            .iter()
            .map(|l| LinkInfo {
                id: l.id.clone(),
                label: l.label.clone(),
                from: l.from.clone(),
                to: l.to.clone(),
                waypoints: l.waypoints.clone(),
            })
            .collect();

        Self {
            title: topology.title.clone(),
            background_ref: topology.background.clone(),
            map_size: topology.map_size,
            poll_interval_ms: u64::try_from(topology.poll_interval.as_millis()).unwrap_or(u64::MAX),
            routers,
            links,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::TimeZone;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::model::{Interface, Link, Target};

    #[test]
    fn topology_message_shape() {
        let mut topo = Topology::new("Backbone", Duration::from_millis(2500));
        let mut a = Target::new("a", Point::new(1.0, 2.0));
        a.label = "Alpha".into();
        a.interfaces.push(Interface::new("eth0", "1.1", "1.2").with_max_bandwidth(1000));
        topo.add_target(a);
        let mut link = Link::new("l1", Endpoint::new("a", "eth0"), Endpoint::new("a", "eth0"));
        link.waypoints.push(Point::new(5.0, 6.0));
        topo.links.push(link);

        let value = serde_json::to_value(Message::topology(&topo)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "topology",
                "title": "Backbone",
                "backgroundRef": null,
                "pollIntervalMs": 2500,
                "routers": [{
                    "id": "a",
                    "label": "Alpha",
                    "x": 1.0,
                    "y": 2.0,
                    "interfaces": [{ "name": "eth0", "displayName": "eth0", "maxBandwidth": 1000 }]
                }],
                "links": [{
                    "id": "l1",
                    "from": { "router": "a", "interface": "eth0" },
                    "to": { "router": "a", "interface": "eth0" },
                    "waypoints": [[5.0, 6.0]]
                }]
            })
        );
    }

    #[test]
    fn metrics_message_is_tagged() {
        let snapshot = Snapshot {
            timestamp: Utc.timestamp_millis_opt(0).unwrap(),
            routers: BTreeMap::new(),
            links: Vec::new(),
        };
        let value = serde_json::to_value(Message::metrics(Arc::new(snapshot))).unwrap();
        assert_eq!(value["type"], "metrics");
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
        assert!(value["routers"].as_object().unwrap().is_empty());
    }
}
