// Counter agent HTTP client.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Raw readings keyed by the identifier string exactly as requested.
pub type CounterReadings = HashMap<String, Option<u64>>;

#[derive(Debug, Serialize)]
struct CounterRequest<'a> {
    counters: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CounterResponse {
    #[serde(default)]
    values: HashMap<String, Option<u64>>,
}

/// Client for a single counter agent.
///
/// Cheap to clone: `reqwest::Client` is internally reference counted.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout the `http` client was built with; reported in
    /// [`Error::Timeout`].
    timeout: Duration,
}

impl AgentClient {
    /// Build a client for the agent at `base_url` around a shared
    /// `reqwest::Client` (see [`TransportConfig::build_client`]).
    ///
    /// [`TransportConfig::build_client`]: crate::TransportConfig::build_client
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// Read a batch of counters in one round-trip.
    ///
    /// Every requested identifier is present in the result; identifiers
    /// the agent omitted map to `None`.
    pub async fn read_counters(&self, counters: &[String]) -> Result<CounterReadings, Error> {
        let url = self.base_url.join("v1/counters")?;
        debug!(url = %url, count = counters.len(), "reading counters");

        let response = self
            .http
            .post(url)
            .json(&CounterRequest { counters })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    }
                } else {
                    Error::Transport(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Agent {
                status: status.as_u16(),
                message: body.trim().chars().take(200).collect(),
            });
        }

        let parsed: CounterResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        let mut readings = parsed.values;
        for id in counters {
            readings.entry(id.clone()).or_insert(None);
        }
        Ok(readings)
    }
}
