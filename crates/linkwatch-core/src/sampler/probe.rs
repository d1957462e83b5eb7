// ── Counter probes ──
//
// The seam between the sampler and the transport. `HttpProbe` talks to
// counter agents; `StaticProbe` serves scripted readings for tests and
// offline demos.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use linkwatch_api::{AgentClient, TransportConfig};
use tracing::trace;
use url::Url;

use crate::error::CoreError;
use crate::model::{CounterId, Target};

/// Readings for one target: every requested identifier maps to its value,
/// or `None` when the device could not read it.
pub type ProbeReadings = HashMap<CounterId, Option<u64>>;

/// Reads a batch of counters from one target.
///
/// Implementations must be cheap to share across concurrent fetches; the
/// poll loop calls `fetch` once per target per cycle.
pub trait CounterProbe: Send + Sync + 'static {
    fn fetch(
        &self,
        target: &Target,
        counters: &[CounterId],
    ) -> impl Future<Output = Result<ProbeReadings, CoreError>> + Send;
}

// ── HTTP agent probe ─────────────────────────────────────────────────

/// Probe backed by per-target counter agents over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(transport: &TransportConfig) -> Result<Self, CoreError> {
        let http = transport.build_client().map_err(|e| CoreError::probe("transport", &e))?;
        Ok(Self {
            http,
            timeout: transport.timeout,
        })
    }

    fn client_for(&self, target: &Target) -> Result<AgentClient, CoreError> {
        let raw = target.agent.as_deref().ok_or_else(|| CoreError::Probe {
            target: target.id.clone(),
            message: "no agent configured".into(),
        })?;
        // `Url::join` drops the last path segment unless it ends in '/'.
        let normalized = if raw.ends_with('/') {
            raw.to_owned()
        } else {
            format!("{raw}/")
        };
        let url = Url::parse(&normalized).map_err(|e| CoreError::Validation {
            entity: format!("agent URL for {}", target.id),
            message: e.to_string(),
        })?;
        Ok(AgentClient::with_client(self.http.clone(), url, self.timeout))
    }
}

impl CounterProbe for HttpProbe {
    async fn fetch(&self, target: &Target, counters: &[CounterId]) -> Result<ProbeReadings, CoreError> {
        let client = self.client_for(target)?;
        let request: Vec<String> = counters.iter().map(|c| c.as_str().to_owned()).collect();

        let raw = client
            .read_counters(&request)
            .await
            .map_err(|e| CoreError::probe(&target.id, &e))?;
        trace!(router = %target.id, count = raw.len(), "agent answered");

        Ok(counters
            .iter()
            .map(|id| (id.clone(), raw.get(id.as_str()).copied().flatten()))
            .collect())
    }
}

// ── Static probe ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StaticState {
    readings: HashMap<(String, CounterId), u64>,
    failing: HashMap<String, String>,
}

/// In-memory probe with scripted readings.
///
/// Clones share state, so a test can keep one handle and adjust readings
/// while the poll loop owns another.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    state: Arc<Mutex<StaticState>>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reading(&self, target: &str, counter: &CounterId, value: u64) {
        self.lock()
            .readings
            .insert((target.to_owned(), counter.clone()), value);
    }

    /// Make every fetch for `target` fail with `message`.
    pub fn fail_target(&self, target: &str, message: impl Into<String>) {
        self.lock().failing.insert(target.to_owned(), message.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StaticState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CounterProbe for StaticProbe {
    async fn fetch(&self, target: &Target, counters: &[CounterId]) -> Result<ProbeReadings, CoreError> {
        let state = self.lock();
        if let Some(message) = state.failing.get(&target.id) {
            return Err(CoreError::Probe {
                target: target.id.clone(),
                message: message.clone(),
            });
        }
        Ok(counters
            .iter()
            .map(|id| {
                let value = state.readings.get(&(target.id.clone(), id.clone())).copied();
                (id.clone(), value)
            })
            .collect())
    }
}
