//! Map screen: the live weathermap with a sidebar for the selected router.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::Canvas;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use linkwatch_core::{
    Geometry, InterfaceMetrics, Point, RenderOptions, Snapshot, SnapshotExporter, Target, Topology, draw_map,
};

use crate::action::{Action, Notification};
use crate::canvas::CanvasSurface;
use crate::component::Component;
use crate::theme;
use crate::widgets::rate_fmt::{fmt_rate_short, fmt_util};

/// Map units a router moves per key press.
const NUDGE: f64 = 10.0;
const SIDEBAR_WIDTH: u16 = 34;

pub struct MapScreen {
    /// Local copy; position edits apply here and are lost on reload.
    topology: Option<Topology>,
    geometry: Geometry,
    snapshot: Option<Arc<Snapshot>>,
    selected: usize,
    exporter: Arc<SnapshotExporter>,
    action_tx: Option<UnboundedSender<Action>>,
}

impl MapScreen {
    pub fn new(exporter: SnapshotExporter) -> Self {
        Self {
            topology: None,
            geometry: Geometry::default(),
            snapshot: None,
            selected: 0,
            exporter: Arc::new(exporter),
            action_tx: None,
        }
    }

    fn selected_target(&self) -> Option<&Target> {
        self.topology
            .as_ref()?
            .targets
            .get_index(self.selected)
            .map(|(_, target)| target)
    }

    /// Swap in a new topology, keeping the selection on the same router
    /// when it still exists.
    fn set_topology(&mut self, topology: Topology) {
        let keep = self.selected_target().map(|t| t.id.clone());
        self.geometry = Geometry::compute(&topology);
        self.selected = keep
            .and_then(|id| topology.targets.get_index_of(&id))
            .unwrap_or(0);
        self.topology = Some(topology);
    }

    fn step_selection(&mut self, forward: bool) {
        let count = self.topology.as_ref().map_or(0, |t| t.targets.len());
        if count == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
    }

    fn move_selected(&mut self, dx: f64, dy: f64) {
        let Some(topology) = self.topology.as_mut() else {
            return;
        };
        let Some((id, target)) = topology.targets.get_index(self.selected) else {
            return;
        };
        let id = id.clone();
        let moved = target.position + Point::new(dx, dy);
        let clamped = Point::new(moved.x.max(0.0), moved.y.max(0.0));
        if topology.set_position(&id, clamped) {
            self.geometry = Geometry::compute(topology);
        }
    }

    /// Write an SVG of the current view on the blocking pool; the outcome
    /// comes back as a notification.
    fn export(&self) -> Option<Action> {
        let (Some(topology), Some(snapshot)) = (self.topology.clone(), self.snapshot.clone()) else {
            return Some(Action::Notify(Notification::error("nothing to export until the first poll completes")));
        };
        let exporter = Arc::clone(&self.exporter);
        let geometry = self.geometry.clone();
        let tx = self.action_tx.clone();

        tokio::task::spawn_blocking(move || {
            let note = match exporter.export(&topology, &geometry, &snapshot) {
                Ok(path) => Notification::info(format!("exported {}", path.display())),
                Err(e) => Notification::error(e.to_string()),
            };
            if let Some(tx) = tx {
                let _ = tx.send(Action::Notify(note));
            }
        });
        None
    }

    fn render_map(&self, frame: &mut Frame, area: Rect, topology: &Topology) {
        let block = Block::default()
            .title(format!(" {} ", topology.title))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_style());
        let inner = block.inner(area);

        let mut options = RenderOptions::for_topology(topology);
        options.selected = self.selected_target().map(|t| t.id.clone());

        let mut surface = CanvasSurface::new(options.width, options.height, inner.width, inner.height);
        // Size text boxes and markers to terminal cells.
        let (cell_w, cell_h) = surface.cell_size();
        options.font_size = cell_h;
        options.label_padding = cell_w;
        options.router_radius = cell_h * 0.75;
        draw_map(&mut surface, topology, &self.geometry, self.snapshot.as_deref(), &options);

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([0.0, options.width])
            .y_bounds([0.0, options.height])
            .paint(|ctx| surface.paint(ctx));
        frame.render_widget(canvas, area);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Router ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_style());

        let Some(target) = self.selected_target() else {
            frame.render_widget(Paragraph::new("no routers").style(theme::dim_style()).block(block), area);
            return;
        };
        let router = self.snapshot.as_ref().and_then(|s| s.router(&target.id));

        let mut lines = vec![
            Line::from(Span::styled(
                target.label.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("status ", theme::dim_style()),
                Span::styled(
                    router.map_or_else(|| "no data".to_owned(), |r| r.status.to_string()),
                    Style::default().fg(theme::status_color(router.map(|r| r.status))),
                ),
            ]),
        ];
        if let Some(error) = router.and_then(|r| r.error.as_deref()) {
            lines.push(Line::from(Span::styled(error.to_owned(), Style::default().fg(theme::ERROR_RED))));
        }

        for interface in &target.interfaces {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                interface.display_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            let metrics = router.and_then(|r| r.interfaces.get(&interface.name));
            lines.extend(interface_lines(metrics));
        }

        if let Some(snapshot) = &self.snapshot {
            let age = (chrono::Utc::now() - snapshot.timestamp)
                .to_std()
                .unwrap_or_default();
            let age = std::time::Duration::from_secs(age.as_secs());
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("updated {} ago", humantime::format_duration(age)),
                theme::dim_style(),
            )));
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn rate_line(label: &'static str, bps: f64, utilization: Option<f64>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<4}"), theme::dim_style()),
        Span::raw(format!("{:>8} ", fmt_rate_short(bps))),
        Span::styled(
            format!("{:>4}", fmt_util(utilization)),
            Style::default().fg(theme::utilization_color(utilization)),
        ),
    ])
}

fn interface_lines(metrics: Option<&InterfaceMetrics>) -> Vec<Line<'static>> {
    let Some(m) = metrics else {
        return vec![Line::from(Span::styled("  no data", theme::dim_style()))];
    };
    let mut lines = vec![
        rate_line("in", m.in_bps, m.in_utilization),
        rate_line("out", m.out_bps, m.out_utilization),
    ];
    if let Some(error) = &m.error {
        lines.push(Line::from(Span::styled(
            format!("  {error}"),
            Style::default().fg(theme::ERROR_RED),
        )));
    } else if !m.fresh {
        lines.push(Line::from(Span::styled("  warming up", theme::dim_style())));
    }
    lines
}

impl Component for MapScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Tab => Action::SelectNext,
            KeyCode::BackTab => Action::SelectPrev,
            KeyCode::Char('h') | KeyCode::Left => Action::MoveSelected(-NUDGE, 0.0),
            KeyCode::Char('l') | KeyCode::Right => Action::MoveSelected(NUDGE, 0.0),
            KeyCode::Char('k') | KeyCode::Up => Action::MoveSelected(0.0, -NUDGE),
            KeyCode::Char('j') | KeyCode::Down => Action::MoveSelected(0.0, NUDGE),
            KeyCode::Char('R') => Action::ReloadConfig,
            KeyCode::Char('e') => Action::Export,
            _ => return Ok(None),
        };
        Ok(Some(action))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::TopologyUpdated(topology) => self.set_topology(Topology::clone(topology)),
            Action::SnapshotUpdated(snapshot) => self.snapshot = Some(Arc::clone(snapshot)),
            Action::SelectNext => self.step_selection(true),
            Action::SelectPrev => self.step_selection(false),
            Action::MoveSelected(dx, dy) => self.move_selected(*dx, *dy),
            Action::Export => return Ok(self.export()),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(topology) = &self.topology else {
            frame.render_widget(Paragraph::new("waiting for topology…").style(theme::dim_style()), area);
            return;
        };
        let [map_area, sidebar_area] =
            Layout::horizontal([Constraint::Min(30), Constraint::Length(SIDEBAR_WIDTH)]).areas(area);
        self.render_map(frame, map_area, topology);
        self.render_sidebar(frame, sidebar_area);
    }
}
