//! Data bridge: forwards poll loop publications to TUI actions.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use linkwatch_core::PollHandle;

use crate::action::Action;

/// Push the current topology (and snapshot, if any), then forward every
/// replacement and every new snapshot until cancelled or the poller stops.
pub async fn spawn_data_bridge(handle: PollHandle, action_tx: mpsc::UnboundedSender<Action>, cancel: CancellationToken) {
    let mut snapshots = handle.subscribe_snapshots();
    let mut topology = handle.subscribe_topology();

    let _ = action_tx.send(Action::TopologyUpdated(topology.borrow_and_update().clone()));
    if let Some(snapshot) = snapshots.borrow_and_update().clone() {
        let _ = action_tx.send(Action::SnapshotUpdated(snapshot));
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = topology.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = topology.borrow_and_update().clone();
                debug!(targets = current.targets.len(), "dispatching TopologyUpdated");
                let _ = action_tx.send(Action::TopologyUpdated(current));
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = snapshots.borrow_and_update().clone() {
                    let _ = action_tx.send(Action::SnapshotUpdated(snapshot));
                }
            }
        }
    }

    debug!("data bridge shut down");
}
