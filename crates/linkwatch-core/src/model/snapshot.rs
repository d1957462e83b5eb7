// ── Snapshot domain types ──
//
// One poll cycle's complete, immutable result. Field names serialize in
// camelCase because snapshots are pushed verbatim as metrics messages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::topology::Endpoint;

/// Utilization at or above which an interface is `Warning`.
pub const WARNING_THRESHOLD: f64 = 0.75;
/// Utilization at or above which an interface is `Critical`.
pub const CRITICAL_THRESHOLD: f64 = 0.90;

/// Health status, ordered by severity: `Ok < Warning < Critical < Error`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Ok,
    Warning,
    Critical,
    Error,
}

impl Status {
    /// Status of a single measurement. An error dominates any utilization.
    pub fn evaluate(utilization: f64, has_error: bool) -> Self {
        if has_error {
            Self::Error
        } else if utilization >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if utilization >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    /// Like [`evaluate`](Self::evaluate), but unknown utilization only
    /// escalates through the error flag.
    pub fn evaluate_opt(utilization: Option<f64>, has_error: bool) -> Self {
        Self::evaluate(utilization.unwrap_or(0.0), has_error)
    }

    /// Composite status: the maximum severity among children, `Ok` if none.
    pub fn aggregate<I: IntoIterator<Item = Status>>(children: I) -> Self {
        children.into_iter().max().unwrap_or_default()
    }
}

/// Derived metrics for one interface in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceMetrics {
    pub in_bps: f64,
    pub out_bps: f64,
    /// `None` when the capacity is unknown.
    pub in_utilization: Option<f64>,
    pub out_utilization: Option<f64>,
    pub status: Status,
    /// Effective capacity in bits per second; `None` when unknown.
    pub max_bandwidth: Option<f64>,
    /// Whether both rates come from a valid, non-wrapped delta.
    pub fresh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InterfaceMetrics {
    /// Metrics for an interface that could not be sampled this cycle.
    pub fn failed(error: impl Into<String>, max_bandwidth: Option<f64>) -> Self {
        Self {
            in_bps: 0.0,
            out_bps: 0.0,
            in_utilization: None,
            out_utilization: None,
            status: Status::Error,
            max_bandwidth,
            fresh: false,
            error: Some(error.into()),
        }
    }

    /// Placeholder for an interface absent from a cycle's results.
    pub fn no_data() -> Self {
        Self::failed("no data", None)
    }
}

/// Per-router result of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterMetrics {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub interfaces: BTreeMap<String, InterfaceMetrics>,
}

/// Per-link result of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMetrics {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub from: Endpoint,
    pub to: Endpoint,
    /// Metrics of the `from` interface.
    pub forward: Option<InterfaceMetrics>,
    /// Metrics of the `to` interface.
    pub reverse: Option<InterfaceMetrics>,
    pub aggregate_utilization: Option<f64>,
    /// Minimum positive capacity among the link's candidates.
    pub capacity: Option<f64>,
    pub status: Status,
}

impl LinkMetrics {
    /// Egress utilization of the `from` interface (traffic flowing from → to).
    pub fn forward_utilization(&self) -> Option<f64> {
        self.forward.as_ref().and_then(|m| m.out_utilization)
    }

    /// Egress utilization of the `to` interface (traffic flowing to → from).
    pub fn reverse_utilization(&self) -> Option<f64> {
        self.reverse.as_ref().and_then(|m| m.out_utilization)
    }
}

/// Observed positive capacity range across the links of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityRange {
    pub min: f64,
    pub max: f64,
}

/// The atomically published result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub routers: BTreeMap<String, RouterMetrics>,
    pub links: Vec<LinkMetrics>,
}

impl Snapshot {
    pub fn router(&self, id: &str) -> Option<&RouterMetrics> {
        self.routers.get(id)
    }

    pub fn interface(&self, endpoint: &Endpoint) -> Option<&InterfaceMetrics> {
        self.router(&endpoint.target)?
            .interfaces
            .get(&endpoint.interface)
    }

    pub fn link(&self, id: &str) -> Option<&LinkMetrics> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Min/max positive link capacity, or `None` if no link has one.
    pub fn capacity_range(&self) -> Option<CapacityRange> {
        self.links
            .iter()
            .filter_map(|l| l.capacity)
            .filter(|c| *c > 0.0)
            .fold(None, |range, c| {
                Some(match range {
                    None => CapacityRange { min: c, max: c },
                    Some(r) => CapacityRange {
                        min: r.min.min(c),
                        max: r.max.max(c),
                    },
                })
            })
    }
}

/// Maximum of two optional values; `None` only if both are `None`.
pub(crate) fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
