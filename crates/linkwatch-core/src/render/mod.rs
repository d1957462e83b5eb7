//! Renderer: one drawing routine, many backends.
//!
//! [`draw_map`] makes every visual decision (which half of a link gets
//! which color, how wide it is, where labels and the legend go) and
//! expresses it through the small [`Surface`] capability set. Backends
//! only translate those calls into paint: [`svg::SvgSurface`] builds an
//! offline SVG document, the terminal UI rasterizes onto a canvas. Given
//! the same topology, geometry and snapshot, both receive the identical
//! call sequence.

pub mod export;
pub mod palette;
pub mod svg;

use std::f64::consts::TAU;

use crate::geometry::{Geometry, HalfPath, Point, Segment, capacity_to_width};
use crate::model::{Snapshot, Topology};
use palette::{
    LABEL_BORDER, LABEL_BOX, Rgb, SELECTION, TEXT, UNKNOWN, UtilizationBucket, status_color,
    utilization_color,
};
use strum::IntoEnumIterator;

/// Segments used to approximate router markers.
const CIRCLE_SEGMENTS: u32 = 24;

/// Abstract drawing surface, modeled on a 2-D canvas context.
///
/// The current path persists until the next [`begin_path`](Self::begin_path),
/// so one path can be filled and then stroked. Coordinates are map units
/// with y growing downward.
pub trait Surface {
    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn quad_to(&mut self, control: Point, to: Point);
    fn close_path(&mut self);
    fn stroke(&mut self, color: Rgb, width: f64);
    fn fill(&mut self, color: Rgb);
    /// Draw `text` with its top-left corner at `at`.
    fn fill_text(&mut self, text: &str, at: Point, size: f64, color: Rgb);
    fn measure_text(&self, text: &str, size: f64) -> f64;
}

/// Layout parameters for [`draw_map`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub router_radius: f64,
    pub label_padding: f64,
    pub show_legend: bool,
    /// Router drawn with a highlighted outline.
    pub selected: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            font_size: 12.0,
            router_radius: 9.0,
            label_padding: 4.0,
            show_legend: true,
            selected: None,
        }
    }
}

impl RenderOptions {
    /// Defaults sized to the topology's extent.
    pub fn for_topology(topology: &Topology) -> Self {
        let extent = topology.extent();
        Self {
            width: extent.width,
            height: extent.height,
            ..Self::default()
        }
    }
}

// ── Shapes ───────────────────────────────────────────────────────────

fn trace_half(surface: &mut (impl Surface + ?Sized), half: &HalfPath) {
    surface.begin_path();
    surface.move_to(half.start);
    for segment in &half.segments {
        match *segment {
            Segment::Line(p) => surface.line_to(p),
            Segment::Quad { control, to } => surface.quad_to(control, to),
        }
    }
}

fn trace_circle(surface: &mut (impl Surface + ?Sized), center: Point, radius: f64) {
    surface.begin_path();
    for i in 0..CIRCLE_SEGMENTS {
        let angle = TAU * f64::from(i) / f64::from(CIRCLE_SEGMENTS);
        let p = Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin());
        if i == 0 {
            surface.move_to(p);
        } else {
            surface.line_to(p);
        }
    }
    surface.close_path();
}

fn trace_rect(surface: &mut (impl Surface + ?Sized), top_left: Point, width: f64, height: f64) {
    surface.begin_path();
    surface.move_to(top_left);
    surface.line_to(Point::new(top_left.x + width, top_left.y));
    surface.line_to(Point::new(top_left.x + width, top_left.y + height));
    surface.line_to(Point::new(top_left.x, top_left.y + height));
    surface.close_path();
}

/// A boxed label centered on `center`.
fn draw_label_box(surface: &mut (impl Surface + ?Sized), text: &str, center: Point, options: &RenderOptions) {
    let size = options.font_size;
    let pad = options.label_padding;
    let text_width = surface.measure_text(text, size);
    let (w, h) = (text_width + 2.0 * pad, size + 2.0 * pad);
    let top_left = Point::new(center.x - w / 2.0, center.y - h / 2.0);

    trace_rect(surface, top_left, w, h);
    surface.fill(LABEL_BOX);
    surface.stroke(LABEL_BORDER, 1.0);
    surface.fill_text(text, Point::new(top_left.x + pad, top_left.y + pad), size, TEXT);
}

// ── Map ──────────────────────────────────────────────────────────────

/// Draw the whole map. Idempotent: the same inputs always produce the
/// same sequence of surface calls.
///
/// Order: link halves, link labels, routers, legend, status line. Links
/// missing from `geometry` are skipped; a `None` snapshot draws every
/// element in the unknown color with a "no data yet" status line.
pub fn draw_map(
    surface: &mut (impl Surface + ?Sized),
    topology: &Topology,
    geometry: &Geometry,
    snapshot: Option<&Snapshot>,
    options: &RenderOptions,
) {
    let range = snapshot.and_then(Snapshot::capacity_range);
    let mut label_anchors = Vec::new();

    for link in &topology.links {
        let Some(path) = geometry.path(&link.id) else {
            continue;
        };
        let metrics = snapshot.and_then(|s| s.link(&link.id));
        let width = capacity_to_width(metrics.and_then(|m| m.capacity), range);
        let split = path.split_half();

        trace_half(surface, &split.first);
        surface.stroke(utilization_color(metrics.and_then(|m| m.forward_utilization())), width);
        trace_half(surface, &split.second);
        surface.stroke(utilization_color(metrics.and_then(|m| m.reverse_utilization())), width);

        if let Some(label) = &link.label {
            label_anchors.push((label.as_str(), split.midpoint));
        }
    }

    for (label, midpoint) in label_anchors {
        draw_label_box(surface, label, midpoint, options);
    }

    for target in topology.targets.values() {
        let status = snapshot.and_then(|s| s.router(&target.id)).map(|r| r.status);
        trace_circle(surface, target.position, options.router_radius);
        surface.fill(status_color(status));
        if options.selected.as_deref() == Some(target.id.as_str()) {
            surface.stroke(SELECTION, 3.0);
        } else {
            surface.stroke(LABEL_BORDER, 1.0);
        }

        let below = options.router_radius + options.label_padding * 2.0 + options.font_size / 2.0;
        let center = Point::new(target.position.x, target.position.y + below);
        draw_label_box(surface, &target.label, center, options);
    }

    if options.show_legend {
        draw_legend(surface, options);
    }

    let status_line = match snapshot {
        Some(s) => format!("{}  {}", topology.title, s.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
        None => format!("{}  no data yet", topology.title),
    };
    let y = options.height - options.font_size - options.label_padding * 2.0;
    surface.fill_text(&status_line, Point::new(options.label_padding * 2.0, y), options.font_size, TEXT);
}

/// Utilization legend in the top-left corner.
fn draw_legend(surface: &mut (impl Surface + ?Sized), options: &RenderOptions) {
    let size = options.font_size;
    let pad = options.label_padding;
    let row = size + pad;
    let swatch = size * 1.5;

    let rows: Vec<(&str, Rgb)> = UtilizationBucket::iter()
        .map(|b| (b.label(), b.color()))
        .chain(std::iter::once(("unknown", UNKNOWN)))
        .collect();
    let text_width = rows
        .iter()
        .map(|(label, _)| surface.measure_text(label, size))
        .fold(surface.measure_text("Utilization", size), f64::max);

    let origin = Point::new(pad * 2.0, pad * 2.0);
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let height = row * (rows.len() + 1) as f64 + pad;
    trace_rect(surface, origin, swatch + text_width + pad * 3.0, height + pad);
    surface.fill(LABEL_BOX);
    surface.stroke(LABEL_BORDER, 1.0);
    surface.fill_text("Utilization", Point::new(origin.x + pad, origin.y + pad), size, TEXT);

    for (i, (label, color)) in rows.into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        let y = origin.y + pad + row * (i + 1) as f64;
        trace_rect(surface, Point::new(origin.x + pad, y), swatch, size);
        surface.fill(color);
        surface.fill_text(label, Point::new(origin.x + pad * 2.0 + swatch, y), size, TEXT);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{Endpoint, InterfaceMetrics, Link, LinkMetrics, Status, Target};

    /// Records every call for comparison.
    #[derive(Default)]
    struct Recorder {
        ops: Vec<String>,
    }

    impl Surface for Recorder {
        fn begin_path(&mut self) {
            self.ops.push("begin".into());
        }
        fn move_to(&mut self, p: Point) {
            self.ops.push(format!("M {} {}", p.x, p.y));
        }
        fn line_to(&mut self, p: Point) {
            self.ops.push(format!("L {} {}", p.x, p.y));
        }
        fn quad_to(&mut self, c: Point, p: Point) {
            self.ops.push(format!("Q {} {} {} {}", c.x, c.y, p.x, p.y));
        }
        fn close_path(&mut self) {
            self.ops.push("Z".into());
        }
        fn stroke(&mut self, color: Rgb, width: f64) {
            self.ops.push(format!("stroke {} {width}", color.hex()));
        }
        fn fill(&mut self, color: Rgb) {
            self.ops.push(format!("fill {}", color.hex()));
        }
        fn fill_text(&mut self, text: &str, _at: Point, _size: f64, _color: Rgb) {
            self.ops.push(format!("text {text}"));
        }
        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        fn measure_text(&self, text: &str, size: f64) -> f64 {
            text.chars().count() as f64 * size * 0.6
        }
    }

    fn topology() -> Topology {
        let mut topo = Topology::new("Lab", Duration::from_secs(1));
        topo.add_target(Target::new("a", Point::new(0.0, 0.0)));
        topo.add_target(Target::new("b", Point::new(100.0, 0.0)));
        let mut link = Link::new("ab", Endpoint::new("a", "e0"), Endpoint::new("b", "e0"));
        link.label = Some("10G".into());
        topo.links.push(link);
        topo
    }

    fn metrics(out_utilization: f64) -> InterfaceMetrics {
        InterfaceMetrics {
            in_bps: 0.0,
            out_bps: 0.0,
            in_utilization: Some(0.0),
            out_utilization: Some(out_utilization),
            status: Status::Ok,
            max_bandwidth: Some(1e9),
            fresh: true,
            error: None,
        }
    }

    #[test]
    fn halves_take_directional_colors() {
        let topo = topology();
        let geometry = Geometry::compute(&topo);
        let snapshot = Snapshot {
            timestamp: Utc.timestamp_millis_opt(0).unwrap(),
            routers: BTreeMap::new(),
            links: vec![LinkMetrics {
                id: "ab".into(),
                label: None,
                from: Endpoint::new("a", "e0"),
                to: Endpoint::new("b", "e0"),
                forward: Some(metrics(0.5)),
                reverse: Some(metrics(0.95)),
                aggregate_utilization: Some(0.95),
                capacity: Some(1e9),
                status: Status::Ok,
            }],
        };
        let mut surface = Recorder::default();
        draw_map(&mut surface, &topo, &geometry, Some(&snapshot), &RenderOptions::default());

        let strokes: Vec<_> = surface.ops.iter().filter(|op| op.starts_with("stroke")).take(2).collect();
        assert_eq!(strokes[0], &format!("stroke {} 8", UtilizationBucket::Moderate.color().hex()));
        assert_eq!(strokes[1], &format!("stroke {} 8", UtilizationBucket::Severe.color().hex()));
        assert_eq!(surface.ops[1], "M 0 0");
        assert_eq!(surface.ops[2], "L 50 0");
        assert!(surface.ops.iter().any(|op| op == "text 10G"));
        assert!(surface.ops.last().unwrap().ends_with("1970-01-01 00:00:00 UTC"));
    }

    #[test]
    fn no_snapshot_draws_unknown_state() {
        let topo = topology();
        let geometry = Geometry::compute(&topo);
        let mut surface = Recorder::default();
        draw_map(&mut surface, &topo, &geometry, None, &RenderOptions::default());

        let unknown = format!("stroke {} 2", UNKNOWN.hex());
        assert_eq!(surface.ops.iter().filter(|op| **op == unknown).count(), 2);
        assert_eq!(surface.ops.last().map(String::as_str), Some("text Lab  no data yet"));
    }

    #[test]
    fn drawing_is_repeatable() {
        let topo = topology();
        let geometry = Geometry::compute(&topo);
        let options = RenderOptions {
            selected: Some("a".into()),
            ..RenderOptions::default()
        };
        let (mut first, mut second) = (Recorder::default(), Recorder::default());
        draw_map(&mut first, &topo, &geometry, None, &options);
        draw_map(&mut second, &topo, &geometry, None, &options);
        assert_eq!(first.ops, second.ops);
        assert!(first.ops.iter().any(|op| op == &format!("stroke {} 3", SELECTION.hex())));
    }
}
