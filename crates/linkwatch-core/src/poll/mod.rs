//! Poll Loop: samples every target each cycle and publishes one snapshot.
//!
//! A cycle runs in four steps:
//!
//! 1. apply a pending [`PollCommand::ReplaceTopology`], evicting cache
//!    entries the new topology no longer declares or has re-pointed at
//!    other counters;
//! 2. sample all targets concurrently against the read-only cache;
//! 3. write the new baselines into the cache;
//! 4. resolve and publish the snapshot (arc-swap + `watch`).
//!
//! Cycles never overlap: the next one starts only after the previous one,
//! cache writes included, has finished. A target whose sampling panics is
//! reported as failed for that cycle. A panic anywhere else aborts the
//! cycle; it is logged and the previously published snapshot stays in place.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::CoreError;
use crate::model::{Message, Snapshot, Topology};
use crate::resolver::resolve;
use crate::sampler::cache::CounterCache;
use crate::sampler::probe::CounterProbe;
use crate::sampler::{TargetSample, sample_target};

/// Timing parameters of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Fixed delay between cycle starts.
    pub interval: Duration,
    /// Upper bound for one target's probe round-trip.
    pub probe_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// Events consumed at the top of the next cycle.
#[derive(Debug)]
pub enum PollCommand {
    /// Use this topology wholesale from the next cycle on. The cycle
    /// interval follows [`Topology::poll_interval`].
    ReplaceTopology {
        topology: Topology,
        probe_timeout: Duration,
    },
}

struct Shared {
    snapshot: ArcSwapOption<Snapshot>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    topology_tx: watch::Sender<Arc<Topology>>,
}

/// Owns the per-cycle state: the topology in force, the counter cache,
/// and the probe.
pub struct Poller<P> {
    probe: P,
    topology: Arc<Topology>,
    cache: CounterCache,
    settings: PollSettings,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedReceiver<PollCommand>,
}

/// Cheap, cloneable access to the loop's published state.
#[derive(Clone)]
pub struct PollHandle {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<PollCommand>,
}

impl<P: CounterProbe> Poller<P> {
    pub fn new(topology: Topology, probe: P, settings: PollSettings) -> (Self, PollHandle) {
        let topology = Arc::new(topology);
        let (snapshot_tx, _) = watch::channel(None);
        let (topology_tx, _) = watch::channel(Arc::clone(&topology));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            snapshot: ArcSwapOption::empty(),
            snapshot_tx,
            topology_tx,
        });
        let poller = Self {
            probe,
            topology,
            cache: CounterCache::new(),
            settings,
            shared: Arc::clone(&shared),
            commands: command_rx,
        };
        let handle = PollHandle {
            shared,
            commands: command_tx,
        };
        (poller, handle)
    }

    /// Build a poller and run it on the tokio runtime until `cancel` fires.
    pub fn spawn(
        topology: Topology,
        probe: P,
        settings: PollSettings,
        cancel: CancellationToken,
    ) -> (PollHandle, JoinHandle<()>) {
        let (poller, handle) = Self::new(topology, probe, settings);
        (handle, tokio::spawn(poller.run(cancel)))
    }

    pub fn cache(&self) -> &CounterCache {
        &self.cache
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Run cycles on a fixed schedule until cancelled. The first cycle
    /// starts immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = schedule(self.settings.interval);
        info!(
            interval = ?self.settings.interval,
            targets = self.topology.targets.len(),
            "poll loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.try_cycle().await {
                        error!(error = %e, "poll cycle aborted; keeping previous snapshot");
                    }
                    if interval.period() != self.settings.interval {
                        interval = schedule(self.settings.interval);
                        // The new interval's first tick is immediate; skip it.
                        interval.tick().await;
                    }
                }
            }
        }

        info!("poll loop stopped");
    }

    /// Run one cycle, turning a panic into [`CoreError::Orchestration`].
    /// On error nothing is published.
    pub async fn try_cycle(&mut self) -> Result<Arc<Snapshot>, CoreError> {
        AssertUnwindSafe(self.cycle())
            .catch_unwind()
            .await
            .map_err(|payload| CoreError::Orchestration(panic_message(payload.as_ref())))
    }

    /// Run one cycle stamped with the current time.
    pub async fn cycle(&mut self) -> Arc<Snapshot> {
        self.cycle_at(Utc::now()).await
    }

    /// Run one cycle stamped with `now`.
    pub async fn cycle_at(&mut self, now: DateTime<Utc>) -> Arc<Snapshot> {
        self.apply_commands();
        debug!(targets = self.topology.targets.len(), "poll cycle start");
        let started = Instant::now();

        let now_ms = now.timestamp_millis();
        let samples: Vec<TargetSample> = {
            let probe = &self.probe;
            let cache = &self.cache;
            let timeout = self.settings.probe_timeout;
            join_all(self.topology.targets.values().map(|target| {
                AssertUnwindSafe(sample_target(probe, target, cache, now_ms, timeout))
                    .catch_unwind()
                    .map(move |outcome| {
                        outcome.unwrap_or_else(|payload| {
                            let message = format!("sampler panicked: {}", panic_message(payload.as_ref()));
                            error!(router = %target.id, error = %message, "target sampling aborted");
                            TargetSample::failed(target, &message)
                        })
                    })
                    .boxed()
            }))
            .await
        };

        let mut by_target = HashMap::with_capacity(samples.len());
        for mut sample in samples {
            for (key, entry) in sample.cache_updates.drain(..) {
                self.cache.insert(key, entry);
            }
            by_target.insert(sample.target_id.clone(), sample);
        }

        let snapshot = Arc::new(resolve(&self.topology, &by_target, now));
        self.shared.snapshot.store(Some(Arc::clone(&snapshot)));
        self.shared.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
        debug!(
            routers = snapshot.routers.len(),
            links = snapshot.links.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "snapshot published"
        );
        snapshot
    }

    /// Drain pending commands. Only the most recent replacement matters.
    fn apply_commands(&mut self) {
        let mut replacement = None;
        while let Ok(command) = self.commands.try_recv() {
            match command {
                PollCommand::ReplaceTopology {
                    topology,
                    probe_timeout,
                } => replacement = Some((topology, probe_timeout)),
            }
        }
        let Some((topology, probe_timeout)) = replacement else {
            return;
        };

        let evicted = self.cache.retain_keys(&topology.cache_keys());
        self.settings = PollSettings {
            interval: topology.poll_interval,
            probe_timeout,
        };
        self.topology = Arc::new(topology);
        self.shared.topology_tx.send_replace(Arc::clone(&self.topology));
        info!(
            targets = self.topology.targets.len(),
            links = self.topology.links.len(),
            evicted,
            "topology replaced"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

fn schedule(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

impl PollHandle {
    /// The most recent snapshot; `None` until the first cycle completes.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.snapshot.load_full()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn subscribe_topology(&self) -> watch::Receiver<Arc<Topology>> {
        self.shared.topology_tx.subscribe()
    }

    /// The topology the loop is currently polling.
    pub fn topology(&self) -> Arc<Topology> {
        Arc::clone(&self.shared.topology_tx.borrow())
    }

    /// Queue a topology replacement, with its probe timeout, for the next
    /// cycle.
    pub fn replace_topology(&self, topology: Topology, probe_timeout: Duration) -> Result<(), CoreError> {
        self.commands
            .send(PollCommand::ReplaceTopology {
                topology,
                probe_timeout,
            })
            .map_err(|_| CoreError::PollerStopped)
    }

    pub fn topology_message(&self) -> Message {
        Message::topology(&self.topology())
    }

    pub fn metrics_message(&self) -> Option<Message> {
        self.snapshot().map(Message::metrics)
    }
}
