//! Counter Sampler: raw cumulative counters to rates, utilization and
//! status.
//!
//! The arithmetic lives here as pure functions; [`target::sample_target`]
//! drives one probe round-trip per target and applies them to every
//! interface. Nothing in this module mutates the [`CounterCache`]: new
//! baselines are returned and the poll loop writes them once the whole
//! cycle has finished.
//!
//! [`CounterCache`]: cache::CounterCache

pub mod cache;
pub mod probe;
pub mod target;

use cache::CacheEntry;

use crate::model::{InterfaceMetrics, Status, snapshot::max_opt};

pub use target::{TargetSample, sample_target};

/// Throughput of one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub bps: f64,
    /// `true` only for a valid, non-wrapped delta.
    pub fresh: bool,
}

impl Rate {
    pub const STALE: Self = Self {
        bps: 0.0,
        fresh: false,
    };
}

/// Convert two cumulative octet readings into bits per second.
///
/// A missing reading, a missing baseline, a non-positive interval, or a
/// counter that went backwards (wrap or device reset) yields a stale zero
/// rate. The next cycle re-establishes the baseline.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn counter_rate(current: Option<u64>, previous: Option<u64>, elapsed_ms: i64) -> Rate {
    match (current, previous) {
        (Some(current), Some(previous)) if elapsed_ms > 0 && current >= previous => Rate {
            bps: (current - previous) as f64 * 8.0 / (elapsed_ms as f64 / 1000.0),
            fresh: true,
        },
        _ => Rate::STALE,
    }
}

/// Effective capacity in bits per second.
///
/// Priority: a probed speed scaled by `multiplier`, then the configured
/// value; non-positive candidates are skipped. `None` means unknown.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn resolve_capacity(probed: Option<u64>, multiplier: f64, configured: Option<u64>) -> Option<f64> {
    probed
        .map(|speed| speed as f64 * multiplier)
        .filter(|c| *c > 0.0 && c.is_finite())
        .or_else(|| configured.filter(|c| *c > 0).map(|c| c as f64))
}

/// `rate / capacity`, or `None` when the capacity is unknown.
pub fn utilization(rate: f64, capacity: Option<f64>) -> Option<f64> {
    capacity.map(|c| rate / c)
}

/// Raw readings gathered for one interface in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceReading {
    pub in_octets: Option<u64>,
    pub out_octets: Option<u64>,
    pub speed: Option<u64>,
}

/// Derive one interface's metrics from its readings and previous entry.
///
/// `error` carries a failure already attributed to this interface (a
/// missing reading, a malformed identifier); it forces `Status::Error`
/// without discarding whatever rates could still be computed. Returns the
/// metrics and, when both octet counters were read, the new cache entry.
pub fn sample_interface(
    reading: InterfaceReading,
    previous: Option<&CacheEntry>,
    now_ms: i64,
    capacity: Option<f64>,
    error: Option<String>,
) -> (InterfaceMetrics, Option<CacheEntry>) {
    let elapsed_ms = previous.map_or(0, |p| now_ms - p.observed_at_ms);
    let rx = counter_rate(reading.in_octets, previous.map(|p| p.in_octets), elapsed_ms);
    let tx = counter_rate(reading.out_octets, previous.map(|p| p.out_octets), elapsed_ms);

    let in_utilization = utilization(rx.bps, capacity);
    let out_utilization = utilization(tx.bps, capacity);
    let status = Status::evaluate_opt(max_opt(in_utilization, out_utilization), error.is_some());

    let entry = match (reading.in_octets, reading.out_octets) {
        (Some(in_octets), Some(out_octets)) => Some(CacheEntry {
            in_octets,
            out_octets,
            observed_at_ms: now_ms,
        }),
        _ => None,
    };

    let metrics = InterfaceMetrics {
        in_bps: rx.bps,
        out_bps: tx.bps,
        in_utilization,
        out_utilization,
        status,
        max_bandwidth: capacity,
        fresh: rx.fresh && tx.fresh,
        error,
    };
    (metrics, entry)
}
