//! Terminal input and frame pacing, merged into one channel.
//!
//! A background task turns crossterm input into [`Event`]s and interleaves
//! a render signal at a fixed frame rate. Every `frames_per_tick` frames it
//! also emits [`Event::Tick`] for housekeeping. One timer drives both.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Housekeeping (notification expiry).
    Tick,
    Render,
}

/// Frame pacing for the reader.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub frame: Duration,
    pub frames_per_tick: u32,
}

impl Default for Pacing {
    /// About 15 frames per second with a tick every quarter second. The
    /// map is redrawn in full every frame, so this stays modest.
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(66),
            frames_per_tick: 4,
        }
    }
}

/// Input worth forwarding; key releases, repeats, focus and mouse are dropped.
fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    pub fn spawn(pacing: Pacing) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(pump(tx, pacing, cancel.clone()));
        Self { rx, cancel }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn pump(tx: mpsc::UnboundedSender<Event>, pacing: Pacing, cancel: CancellationToken) {
    let mut input = EventStream::new();
    let mut frames = tokio::time::interval(pacing.frame);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let per_tick = pacing.frames_per_tick.max(1);
    let mut frame_no: u32 = 0;

    loop {
        let batch: Vec<Event> = tokio::select! {
            () = cancel.cancelled() => return,
            _ = frames.tick() => {
                frame_no = frame_no.wrapping_add(1);
                if frame_no % per_tick == 0 {
                    vec![Event::Tick, Event::Render]
                } else {
                    vec![Event::Render]
                }
            }
            next = input.next() => match next {
                Some(Ok(raw)) => translate(raw).into_iter().collect(),
                Some(Err(_)) => Vec::new(),
                None => return,
            },
        };

        for event in batch {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    use super::*;

    fn key(kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn only_presses_are_forwarded() {
        assert!(matches!(translate(key(KeyEventKind::Press)), Some(Event::Key(_))));
        assert!(translate(key(KeyEventKind::Release)).is_none());
        assert!(translate(key(KeyEventKind::Repeat)).is_none());
    }

    #[test]
    fn resize_and_focus() {
        assert!(matches!(translate(CrosstermEvent::Resize(80, 24)), Some(Event::Resize(80, 24))));
        assert!(translate(CrosstermEvent::FocusGained).is_none());
    }
}
