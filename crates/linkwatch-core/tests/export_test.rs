#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use linkwatch_core::render::RenderOptions;
use linkwatch_core::{Endpoint, Geometry, Link, Point, Snapshot, SnapshotExporter, Target, Topology};

fn topology() -> Topology {
    let mut topo = Topology::new("Export & Co", Duration::from_secs(1));
    topo.add_target(Target::new("a", Point::new(40.0, 40.0)));
    topo.add_target(Target::new("b", Point::new(240.0, 40.0)));
    for id in ["l1", "l2"] {
        topo.links
            .push(Link::new(id, Endpoint::new("a", "e0"), Endpoint::new("b", "e0")));
    }
    topo
}

fn snapshot(ms: i64) -> Snapshot {
    Snapshot {
        timestamp: Utc.timestamp_millis_opt(ms).unwrap(),
        routers: BTreeMap::new(),
        links: Vec::new(),
    }
}

#[test]
fn export_writes_timestamped_and_latest() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("snapshots");
    let exporter = SnapshotExporter::new(&out, RenderOptions::default());
    let topo = topology();
    let geometry = Geometry::compute(&topo);

    assert!(exporter.latest().is_none());

    let first = exporter.export(&topo, &geometry, &snapshot(1_000)).unwrap();
    assert_eq!(first, out.join("snapshot-1000.svg"));
    let second = exporter.export(&topo, &geometry, &snapshot(2_000)).unwrap();

    assert_eq!(exporter.latest().as_deref(), Some(&second));
    assert!(first.exists());

    let latest = std::fs::read_to_string(out.join("latest.svg")).unwrap();
    assert_eq!(latest, std::fs::read_to_string(&second).unwrap());
    assert!(latest.starts_with("<svg"));
    assert!(latest.contains("Export &amp; Co"));
    // Two fanned-out links, each drawn as two quadratic halves.
    assert!(latest.matches(r#"fill="none""#).count() >= 4);
    assert!(latest.contains(" Q"));
}

#[test]
fn render_before_first_snapshot_says_no_data() {
    let exporter = SnapshotExporter::new("unused", RenderOptions::default());
    let topo = topology();
    let svg = exporter.render(&topo, &Geometry::compute(&topo), None);
    assert!(svg.contains("no data yet"));
}
