//! Application core: the event loop and action dispatch.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use linkwatch_core::{PollHandle, SnapshotExporter};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader, Pacing};
use crate::screens::map::MapScreen;
use crate::theme;
use crate::tui::Tui;

/// How long a notification stays in the footer.
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

const KEY_HINTS: &[(&str, &str)] = &[
    ("Tab", "select"),
    ("hjkl", "move"),
    ("R", "reload"),
    ("e", "export"),
    ("q", "quit"),
];

pub struct App {
    running: bool,
    map: MapScreen,
    handle: PollHandle,
    /// Re-read on reload; `None` means the default location.
    config_path: Option<PathBuf>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    bridge_cancel: CancellationToken,
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(
        handle: PollHandle,
        exporter: SnapshotExporter,
        config_path: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            map: MapScreen::new(exporter),
            handle,
            config_path,
            action_tx,
            action_rx,
            bridge_cancel: cancel.child_token(),
            notification: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;
        self.map.init(self.action_tx.clone())?;

        tokio::spawn(crate::data_bridge::spawn_data_bridge(
            self.handle.clone(),
            self.action_tx.clone(),
            self.bridge_cancel.clone(),
        ));

        let mut events = EventReader::spawn(Pacing::default());
        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.bridge_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::NONE, KeyCode::Char('q')) => {
                Ok(Some(Action::Quit))
            }
            _ => self.map.handle_key_event(key),
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
            }
            Action::Notify(notification) => {
                info!(message = %notification.message, "notification");
                self.notification = Some((notification.clone(), Instant::now()));
            }
            Action::ReloadConfig => self.reload(),
            _ => {}
        }

        if let Some(follow_up) = self.map.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    /// Re-read the config file and hand the topology to the poll loop. The
    /// map updates once the loop applies it at the start of its next cycle.
    fn reload(&mut self) {
        let result = linkwatch_config::load_config(self.config_path.as_deref())
            .and_then(|c| Ok((c.to_topology()?, c.poll_settings().probe_timeout)));
        let notification = match result {
            Ok((topology, probe_timeout)) => match self.handle.replace_topology(topology, probe_timeout) {
                Ok(()) => Notification::info("configuration reloaded; applies next cycle"),
                Err(e) => Notification::error(e.to_string()),
            },
            Err(e) => {
                warn!(error = %e, "reload failed");
                Notification::error(format!("reload failed: {e}"))
            }
        };
        self.notification = Some((notification, Instant::now()));
    }

    fn render(&self, frame: &mut Frame) {
        let [main, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
        self.map.render(frame, main);
        self.render_footer(frame, footer);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.notification {
            Some((notification, _)) => {
                let color = match notification.level {
                    NotificationLevel::Info => theme::ACCENT,
                    NotificationLevel::Error => theme::ERROR_RED,
                };
                Line::from(Span::styled(notification.message.clone(), Style::default().fg(color)))
            }
            None => Line::from(
                KEY_HINTS
                    .iter()
                    .flat_map(|(key, what)| {
                        [
                            Span::styled(format!(" {key}"), theme::key_hint_style()),
                            Span::styled(format!(" {what} "), theme::dim_style()),
                        ]
                    })
                    .collect::<Vec<_>>(),
            ),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
