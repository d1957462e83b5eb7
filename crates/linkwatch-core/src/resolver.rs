//! Topology Resolver: merges per-target samples into one [`Snapshot`].
//!
//! Trusts the referential integrity of the [`Topology`]: every link
//! endpoint names a declared target and interface. Anything declared but
//! absent from the cycle's samples is reported as an explicit `"no data"`
//! error rather than dropped.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::model::snapshot::max_opt;
use crate::model::{InterfaceMetrics, Link, LinkMetrics, RouterMetrics, Snapshot, Status, Topology};
use crate::sampler::TargetSample;

const NO_DATA: &str = "no data";

/// Build the snapshot for one cycle.
pub fn resolve(
    topology: &Topology,
    samples: &HashMap<String, TargetSample>,
    timestamp: DateTime<Utc>,
) -> Snapshot {
    let routers: BTreeMap<String, RouterMetrics> = topology
        .targets
        .values()
        .map(|target| {
            let metrics = match samples.get(&target.id) {
                Some(sample) => resolve_router(target.interfaces.iter().map(|i| i.name.as_str()), sample),
                None => RouterMetrics {
                    status: Status::Error,
                    error: Some(NO_DATA.into()),
                    interfaces: target
                        .interfaces
                        .iter()
                        .map(|i| (i.name.clone(), InterfaceMetrics::no_data()))
                        .collect(),
                },
            };
            (target.id.clone(), metrics)
        })
        .collect();

    let mut snapshot = Snapshot {
        timestamp,
        routers,
        links: Vec::with_capacity(topology.links.len()),
    };
    let links = topology
        .links
        .iter()
        .map(|link| resolve_link(link, &snapshot))
        .collect();
    snapshot.links = links;
    snapshot
}

fn resolve_router<'a>(declared: impl Iterator<Item = &'a str>, sample: &TargetSample) -> RouterMetrics {
    let interfaces: BTreeMap<String, InterfaceMetrics> = declared
        .map(|name| {
            let metrics = sample
                .interfaces
                .get(name)
                .cloned()
                .unwrap_or_else(InterfaceMetrics::no_data);
            (name.to_owned(), metrics)
        })
        .collect();

    let status = if sample.error.is_some() {
        Status::Error
    } else {
        Status::aggregate(interfaces.values().map(|m| m.status))
    };

    RouterMetrics {
        status,
        error: sample.error.clone(),
        interfaces,
    }
}

/// Forward = the `from` interface, reverse = the `to` interface.
fn resolve_link(link: &Link, snapshot: &Snapshot) -> LinkMetrics {
    let forward = snapshot.interface(&link.from).cloned();
    let reverse = snapshot.interface(&link.to).cloned();

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let capacity = [
        link.capacity.map(|c| c as f64),
        forward.as_ref().and_then(|m| m.max_bandwidth),
        reverse.as_ref().and_then(|m| m.max_bandwidth),
    ]
    .into_iter()
    .flatten()
    .filter(|c| *c > 0.0)
    .reduce(f64::min);

    let status = Status::aggregate(
        [&forward, &reverse]
            .into_iter()
            .map(|m| m.as_ref().map_or(Status::Error, |m| m.status)),
    );

    let mut metrics = LinkMetrics {
        id: link.id.clone(),
        label: link.label.clone(),
        from: link.from.clone(),
        to: link.to.clone(),
        forward,
        reverse,
        aggregate_utilization: None,
        capacity,
        status,
    };
    metrics.aggregate_utilization = max_opt(metrics.forward_utilization(), metrics.reverse_utilization());
    metrics
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::geometry::Point;
    use crate::model::{Endpoint, Interface, Target};

    fn topology() -> Topology {
        let mut topo = Topology::new("test", Duration::from_secs(5));
        let mut a = Target::new("a", Point::new(0.0, 0.0));
        a.interfaces.push(Interface::new("e0", "1.1", "1.2").with_max_bandwidth(1_000));
        a.interfaces.push(Interface::new("e1", "1.3", "1.4"));
        let mut b = Target::new("b", Point::new(100.0, 0.0));
        b.interfaces.push(Interface::new("e0", "1.1", "1.2").with_max_bandwidth(400));
        topo.add_target(a);
        topo.add_target(b);
        let mut link = Link::new("ab", Endpoint::new("a", "e0"), Endpoint::new("b", "e0"));
        link.capacity = Some(10_000);
        topo.links.push(link);
        topo
    }

    fn metrics(out_utilization: Option<f64>, status: Status, max_bandwidth: Option<f64>) -> InterfaceMetrics {
        InterfaceMetrics {
            in_bps: 0.0,
            out_bps: 0.0,
            in_utilization: out_utilization.map(|_| 0.0),
            out_utilization,
            status,
            max_bandwidth,
            fresh: true,
            error: None,
        }
    }

    fn sample(id: &str, interfaces: &[(&str, InterfaceMetrics)]) -> TargetSample {
        TargetSample {
            target_id: id.into(),
            interfaces: interfaces
                .iter()
                .map(|(name, m)| ((*name).to_owned(), m.clone()))
                .collect(),
            ..TargetSample::default()
        }
    }

    #[test]
    fn link_takes_egress_of_each_endpoint() {
        let samples = HashMap::from([
            (
                "a".to_owned(),
                sample(
                    "a",
                    &[
                        ("e0", metrics(Some(0.3), Status::Ok, Some(1_000.0))),
                        ("e1", metrics(Some(0.8), Status::Warning, Some(1_000.0))),
                    ],
                ),
            ),
            ("b".to_owned(), sample("b", &[("e0", metrics(Some(0.6), Status::Ok, Some(400.0)))])),
        ]);

        let snapshot = resolve(&topology(), &samples, DateTime::<Utc>::UNIX_EPOCH);
        let link = snapshot.link("ab").unwrap();

        assert_eq!(link.forward_utilization(), Some(0.3));
        assert_eq!(link.reverse_utilization(), Some(0.6));
        assert_eq!(link.aggregate_utilization, Some(0.6));
        assert_eq!(link.capacity, Some(400.0));
        assert_eq!(link.status, Status::Ok);
        assert_eq!(snapshot.router("a").unwrap().status, Status::Warning);
    }

    #[test]
    fn absent_router_is_no_data_error() {
        let samples = HashMap::from([(
            "a".to_owned(),
            sample("a", &[("e0", metrics(Some(0.1), Status::Ok, Some(1_000.0)))]),
        )]);

        let snapshot = resolve(&topology(), &samples, DateTime::<Utc>::UNIX_EPOCH);

        let b = snapshot.router("b").unwrap();
        assert_eq!(b.status, Status::Error);
        assert_eq!(b.error.as_deref(), Some("no data"));
        assert_eq!(b.interfaces["e0"].error.as_deref(), Some("no data"));

        // a/e1 was declared but not sampled.
        let a = snapshot.router("a").unwrap();
        assert_eq!(a.interfaces["e1"].status, Status::Error);
        assert_eq!(a.status, Status::Error);

        let link = snapshot.link("ab").unwrap();
        assert_eq!(link.status, Status::Error);
        assert_eq!(link.aggregate_utilization, Some(0.1));
        // Only the link's own and the forward capacity remain.
        assert_eq!(link.capacity, Some(1_000.0));
    }

    #[test]
    fn unknown_capacity_everywhere_is_no_aggregate() {
        let samples = HashMap::from([
            ("a".to_owned(), sample("a", &[("e0", metrics(None, Status::Ok, None)), ("e1", metrics(None, Status::Ok, None))])),
            ("b".to_owned(), sample("b", &[("e0", metrics(None, Status::Ok, None))])),
        ]);
        let mut topo = topology();
        topo.links[0].capacity = None;

        let snapshot = resolve(&topo, &samples, DateTime::<Utc>::UNIX_EPOCH);
        let link = snapshot.link("ab").unwrap();

        assert_eq!(link.aggregate_utilization, None);
        assert_eq!(link.capacity, None);
        assert_eq!(link.status, Status::Ok);
    }

    #[test]
    fn target_error_forces_router_error() {
        let mut failed = sample("b", &[("e0", InterfaceMetrics::failed("timeout", Some(400.0)))]);
        failed.error = Some("timeout".into());
        let samples = HashMap::from([("b".to_owned(), failed)]);

        let snapshot = resolve(&topology(), &samples, DateTime::<Utc>::UNIX_EPOCH);

        assert_eq!(snapshot.router("b").unwrap().error.as_deref(), Some("timeout"));
        assert_eq!(Status::aggregate([Status::Ok, Status::Warning]), Status::Warning);
        assert_eq!(Status::aggregate([Status::Ok, Status::Error]), Status::Error);
    }
}
