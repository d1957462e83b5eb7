//! UI actions. Every state change goes through one of these.

use std::sync::Arc;

use linkwatch_core::{Snapshot, Topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Data from the poll loop ──
    SnapshotUpdated(Arc<Snapshot>),
    TopologyUpdated(Arc<Topology>),

    // ── Map interaction ──
    SelectNext,
    SelectPrev,
    /// Move the selected router by (dx, dy) map units.
    MoveSelected(f64, f64),
    ReloadConfig,
    Export,

    Notify(Notification),
}
