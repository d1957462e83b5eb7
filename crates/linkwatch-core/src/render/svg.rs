// ── SVG backend ──
//
// Offline rendering target. Each stroke or fill emits one `<path>`
// element carrying the current path data.

use std::fmt::Write as _;

use super::Surface;
use super::palette::{Rgb, SVG_BACKGROUND};
use crate::geometry::Point;

/// Average glyph advance of the monospace font, relative to its size.
const GLYPH_ADVANCE: f64 = 0.6;

/// Builds an SVG document from [`Surface`] calls.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: String,
    path: String,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
            path: String::new(),
        }
    }

    /// Close the document and return it.
    pub fn finish(self) -> String {
        let (w, h) = (num(self.width), num(self.height));
        let mut doc = String::with_capacity(self.body.len() + 256);
        let _ = writeln!(
            doc,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = writeln!(doc, r#"<rect width="100%" height="100%" fill="{}"/>"#, SVG_BACKGROUND.hex());
        doc.push_str(&self.body);
        doc.push_str("</svg>\n");
        doc
    }
}

/// Shortest fixed-precision rendering: `12`, `12.5`, `12.34`.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

impl Surface for SvgSurface {
    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Point) {
        let _ = write!(self.path, "M{} {} ", num(p.x), num(p.y));
    }

    fn line_to(&mut self, p: Point) {
        let _ = write!(self.path, "L{} {} ", num(p.x), num(p.y));
    }

    fn quad_to(&mut self, control: Point, to: Point) {
        let _ = write!(
            self.path,
            "Q{} {} {} {} ",
            num(control.x),
            num(control.y),
            num(to.x),
            num(to.y)
        );
    }

    fn close_path(&mut self) {
        self.path.push_str("Z ");
    }

    fn stroke(&mut self, color: Rgb, width: f64) {
        let _ = writeln!(
            self.body,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
            self.path.trim_end(),
            color.hex(),
            num(width)
        );
    }

    fn fill(&mut self, color: Rgb) {
        let _ = writeln!(
            self.body,
            r#"<path d="{}" fill="{}"/>"#,
            self.path.trim_end(),
            color.hex()
        );
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f64, color: Rgb) {
        let _ = writeln!(
            self.body,
            r#"<text x="{}" y="{}" font-family="monospace" font-size="{}" fill="{}" dominant-baseline="hanging">{}</text>"#,
            num(at.x),
            num(at.y),
            num(size),
            color.hex(),
            escape(text)
        );
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn measure_text(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * GLYPH_ADVANCE
    }
}
