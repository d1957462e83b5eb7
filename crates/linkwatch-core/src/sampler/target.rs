// ── Per-target sampling ──
//
// One probe round-trip per target, then per-interface derivation. Every
// failure is pinned to the narrowest entity it concerns: a malformed
// identifier to its interface, a transport failure to its target.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, warn};

use super::cache::{CacheEntry, CacheKey, CounterCache};
use super::probe::CounterProbe;
use super::{InterfaceReading, resolve_capacity, sample_interface};
use crate::error::CoreError;
use crate::model::{CounterId, Interface, InterfaceMetrics, Target};

/// Result of sampling one target in one cycle.
#[derive(Debug, Clone, Default)]
pub struct TargetSample {
    pub target_id: String,
    /// Target-level failure (probe transport, timeout).
    pub error: Option<String>,
    pub interfaces: BTreeMap<String, InterfaceMetrics>,
    /// New baselines, applied by the poll loop after the cycle completes.
    pub cache_updates: Vec<(CacheKey, CacheEntry)>,
}

impl TargetSample {
    /// A sample in which the whole target failed with `message`.
    pub fn failed(target: &Target, message: &str) -> Self {
        Self {
            target_id: target.id.clone(),
            error: Some(message.to_owned()),
            interfaces: target
                .interfaces
                .iter()
                .map(|i| {
                    let metrics = InterfaceMetrics::failed(message.to_owned(), configured_capacity(i));
                    (i.name.clone(), metrics)
                })
                .collect(),
            cache_updates: Vec::new(),
        }
    }
}

/// Parsed counter identifiers of one interface.
struct InterfaceCounters {
    rx: CounterId,
    tx: CounterId,
    speed: Option<CounterId>,
}

impl InterfaceCounters {
    fn parse(interface: &Interface) -> Result<Self, CoreError> {
        Ok(Self {
            rx: interface.in_counter.parse()?,
            tx: interface.out_counter.parse()?,
            speed: interface
                .speed_counter
                .as_deref()
                .map(str::parse)
                .transpose()?,
        })
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn configured_capacity(interface: &Interface) -> Option<f64> {
    interface.max_bandwidth.filter(|c| *c > 0).map(|c| c as f64)
}

/// Sample every interface of `target`.
///
/// Never fails: errors are recorded on the returned sample. `now_ms` is
/// the cycle's observation time in Unix epoch milliseconds.
pub async fn sample_target<P: CounterProbe>(
    probe: &P,
    target: &Target,
    cache: &CounterCache,
    now_ms: i64,
    timeout: Duration,
) -> TargetSample {
    let mut sample = TargetSample {
        target_id: target.id.clone(),
        ..TargetSample::default()
    };

    let mut parsed = Vec::with_capacity(target.interfaces.len());
    let mut request = Vec::new();
    for interface in &target.interfaces {
        match InterfaceCounters::parse(interface) {
            Ok(counters) => {
                request.push(counters.rx.clone());
                request.push(counters.tx.clone());
                request.extend(counters.speed.clone());
                parsed.push((interface, counters));
            }
            Err(e) => {
                debug!(router = %target.id, interface = %interface.name, error = %e, "skipping interface");
                sample.interfaces.insert(
                    interface.name.clone(),
                    InterfaceMetrics::failed(e.to_string(), configured_capacity(interface)),
                );
            }
        }
    }

    if parsed.is_empty() {
        return sample;
    }

    let fetched = match tokio::time::timeout(timeout, probe.fetch(target, &request)).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::ProbeTimeout {
            target: target.id.clone(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    };

    let readings = match fetched {
        Ok(readings) => readings,
        Err(e) => {
            warn!(router = %target.id, error = %e, "probe failed");
            let message = e.to_string();
            for (interface, _) in parsed {
                sample.interfaces.insert(
                    interface.name.clone(),
                    InterfaceMetrics::failed(message.clone(), configured_capacity(interface)),
                );
            }
            sample.error = Some(message);
            return sample;
        }
    };

    let read = |id: &CounterId| readings.get(id).copied().flatten();
    for (interface, counters) in parsed {
        let reading = InterfaceReading {
            in_octets: read(&counters.rx),
            out_octets: read(&counters.tx),
            speed: counters.speed.as_ref().and_then(read),
        };

        let missing: Vec<&str> = [(&counters.rx, reading.in_octets), (&counters.tx, reading.out_octets)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(id, _)| id.as_str())
            .collect();
        let error = (!missing.is_empty()).then(|| format!("missing reading for {}", missing.join(", ")));

        let key = CacheKey::new(&target.id, interface);
        let capacity = resolve_capacity(reading.speed, interface.speed_multiplier, interface.max_bandwidth);
        let (metrics, entry) = sample_interface(reading, cache.get(&key), now_ms, capacity, error);

        if let Some(entry) = entry {
            sample.cache_updates.push((key, entry));
        }
        sample.interfaces.insert(interface.name.clone(), metrics);
    }

    sample
}
