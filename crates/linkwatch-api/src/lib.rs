//! Async client for linkwatch counter agents.
//!
//! A counter agent is a small HTTP service running next to (or proxying
//! for) a network device. It answers batched reads of cumulative
//! interface counters addressed by dotted-decimal object identifiers:
//!
//! ```text
//! POST {agent}/v1/counters   {"counters": ["1.3.6.1.2.1.31.1.1.1.6.1", ...]}
//! 200 OK                     {"values": {"1.3.6.1.2.1.31.1.1.1.6.1": 123456, ...}}
//! ```
//!
//! A `null` value (or a missing key) means the agent could not read that
//! counter. This crate knows nothing about topology, rates, or status;
//! `linkwatch-core` wraps it behind its `CounterProbe` trait.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{AgentClient, CounterReadings};
pub use error::Error;
pub use transport::TransportConfig;
