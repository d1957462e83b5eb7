//! Terminal backend for the map renderer.
//!
//! [`CanvasSurface`] records the renderer's calls as flat line and text
//! operations in canvas coordinates (y grows upward), then replays them
//! into a ratatui canvas context. Curves are flattened and filled shapes
//! are rasterized into horizontal spans one braille dot row apart.

use ratatui::style::{Color, Style};
use ratatui::text::Line as TextLine;
use ratatui::widgets::canvas::{Context, Line};

use linkwatch_core::geometry::unit_normal;
use linkwatch_core::render::palette::Rgb;
use linkwatch_core::{Point, Surface};

use crate::theme;

/// Line segments per quadratic curve.
const CURVE_STEPS: u32 = 16;
/// Braille dots per terminal row.
const DOTS_PER_ROW: f64 = 4.0;
/// Strokes at least this wide get a flanking line on each side.
const WIDE_STROKE: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Line { from: Point, to: Point, color: Color },
    Text { at: Point, text: String, color: Color },
}

pub struct CanvasSurface {
    height: f64,
    /// Map units covered by one terminal cell, (x, y).
    cell: (f64, f64),
    subpaths: Vec<Vec<Point>>,
    ops: Vec<CanvasOp>,
}

impl CanvasSurface {
    /// A surface projecting a `width` × `height` map onto `cols` × `rows`
    /// terminal cells.
    pub fn new(width: f64, height: f64, cols: u16, rows: u16) -> Self {
        Self {
            height,
            cell: (width / f64::from(cols.max(1)), height / f64::from(rows.max(1))),
            subpaths: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> (f64, f64) {
        self.cell
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Replay the recorded operations. Text goes on a layer above lines.
    pub fn paint(&self, ctx: &mut Context<'_>) {
        for op in &self.ops {
            if let CanvasOp::Line { from, to, color } = op {
                ctx.draw(&Line::new(from.x, from.y, to.x, to.y, *color));
            }
        }
        ctx.layer();
        for op in &self.ops {
            if let CanvasOp::Text { at, text, color } = op {
                ctx.print(at.x, at.y, TextLine::styled(text.clone(), Style::default().fg(*color)));
            }
        }
    }

    fn flip(&self, p: Point) -> Point {
        Point::new(p.x, self.height - p.y)
    }

    fn current(&mut self) -> &mut Vec<Point> {
        if self.subpaths.is_empty() {
            self.subpaths.push(Vec::new());
        }
        let last = self.subpaths.len() - 1;
        &mut self.subpaths[last]
    }

    fn push_line(&mut self, from: Point, to: Point, color: Color) {
        self.ops.push(CanvasOp::Line { from, to, color });
    }
}

/// Where the edge `a`–`b` crosses the horizontal line at `y`, if it does.
/// Half-open in y so a shared vertex is counted once.
fn crossing(a: Point, b: Point, y: f64) -> Option<f64> {
    if (a.y <= y) == (b.y <= y) {
        return None;
    }
    Some(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
}

impl Surface for CanvasSurface {
    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, p: Point) {
        let p = self.flip(p);
        self.subpaths.push(vec![p]);
    }

    fn line_to(&mut self, p: Point) {
        let p = self.flip(p);
        self.current().push(p);
    }

    fn quad_to(&mut self, control: Point, to: Point) {
        let (control, to) = (self.flip(control), self.flip(to));
        let path = self.current();
        let from = path.last().copied().unwrap_or(control);
        for i in 1..=CURVE_STEPS {
            let t = f64::from(i) / f64::from(CURVE_STEPS);
            let u = 1.0 - t;
            path.push(from * (u * u) + control * (2.0 * u * t) + to * (t * t));
        }
    }

    fn close_path(&mut self) {
        let path = self.current();
        if let Some(&first) = path.first() {
            path.push(first);
        }
    }

    fn stroke(&mut self, color: Rgb, width: f64) {
        let color = theme::color(color);
        let mut lines = Vec::new();
        for path in &self.subpaths {
            for pair in path.windows(2) {
                let &[a, b] = pair else { continue };
                lines.push((a, b));
                if width >= WIDE_STROKE {
                    if let Some(normal) = unit_normal(a, b) {
                        let offset = normal * (width * 0.4);
                        lines.push((a + offset, b + offset));
                        lines.push((a - offset, b - offset));
                    }
                }
            }
        }
        for (a, b) in lines {
            self.push_line(a, b, color);
        }
    }

    /// Even-odd scanline fill over every subpath, each implicitly closed.
    fn fill(&mut self, color: Rgb) {
        let color = theme::color(color);
        let mut edges = Vec::new();
        for path in &self.subpaths {
            edges.extend(path.windows(2).filter_map(|pair| match *pair {
                [a, b] => Some((a, b)),
                _ => None,
            }));
            if let (Some(&first), Some(&last)) = (path.first(), path.last()) {
                if first != last {
                    edges.push((last, first));
                }
            }
        }
        let (min_y, max_y) = edges
            .iter()
            .flat_map(|&(a, b)| [a.y, b.y])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));

        let step = self.cell.1 / DOTS_PER_ROW;
        if !(step > 0.0 && min_y.is_finite() && max_y.is_finite()) {
            return;
        }

        let mut y = min_y + step / 2.0;
        while y < max_y {
            let mut xs: Vec<f64> = edges.iter().filter_map(|&(a, b)| crossing(a, b, y)).collect();
            xs.sort_by(f64::total_cmp);
            for span in xs.chunks_exact(2) {
                if let &[x0, x1] = span {
                    self.push_line(Point::new(x0, y), Point::new(x1, y), color);
                }
            }
            y += step;
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f64, color: Rgb) {
        // Canvas text is anchored at a single cell; use the vertical center.
        let at = self.flip(Point::new(at.x, at.y + size / 2.0));
        self.ops.push(CanvasOp::Text {
            at,
            text: text.to_owned(),
            color: theme::color(color),
        });
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn measure_text(&self, text: &str, _size: f64) -> f64 {
        text.chars().count() as f64 * self.cell.0
    }
}
