//! Geometry Engine: pure functions for link paths.
//!
//! Parallel links between the same two targets fan out into distinct
//! quadratic curves; any link path, however many bends it has, can be
//! split at its arc-length midpoint so each direction gets its own half.
//! All functions are deterministic and allocation-light; degenerate
//! inputs resolve to fallback geometry instead of errors.

use std::collections::HashMap;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::model::{CapacityRange, Link, Topology};

/// Minimum perpendicular spacing between fanned-out links.
pub const FAN_SPACING_MIN: f64 = 40.0;
/// Maximum perpendicular spacing between fanned-out links.
pub const FAN_SPACING_MAX: f64 = 160.0;
/// Offsets smaller than this collapse to a straight path.
pub const STRAIGHT_EPSILON: f64 = 1.0;

/// Narrowest link stroke.
pub const MIN_WIDTH: f64 = 2.0;
/// Widest link stroke.
pub const MAX_WIDTH: f64 = 14.0;

// ── Point ────────────────────────────────────────────────────────────

/// A 2-D point in map units (y grows downward). Serializes as `[x, y]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(self, other: Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

// ── Fan-out ──────────────────────────────────────────────────────────

/// Perpendicular spacing for a group between `from` and `to`.
pub fn fan_spacing(from: Point, to: Point) -> f64 {
    (from.distance(to) / 3.0).clamp(FAN_SPACING_MIN, FAN_SPACING_MAX)
}

/// Signed perpendicular offset of member `index` in a group of `group_size`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn fan_offset(group_size: usize, index: usize, spacing: f64) -> f64 {
    (index as f64 - (group_size as f64 - 1.0) / 2.0) * spacing
}

/// Unit normal of `from → to` (rotated +90°), or `None` for coincident points.
pub fn unit_normal(from: Point, to: Point) -> Option<Point> {
    let len = from.distance(to);
    if len > 0.0 {
        Some(Point::new(-(to.y - from.y) / len, (to.x - from.x) / len))
    } else {
        None
    }
}

/// Path of member `index` in a group of `group_size` links between two points.
///
/// Returns `[from, to]` for a lone link, a near-zero offset, or coincident
/// endpoints; otherwise `[from, control, to]` where the control point sits
/// on the perpendicular through the midpoint.
pub fn compute_auto_path(from: Point, to: Point, group_size: usize, index: usize) -> Vec<Point> {
    if group_size <= 1 {
        return vec![from, to];
    }
    let offset = fan_offset(group_size, index, fan_spacing(from, to));
    match unit_normal(from, to) {
        Some(normal) if offset.abs() >= STRAIGHT_EPSILON => {
            vec![from, from.midpoint(to) + normal * offset, to]
        }
        _ => vec![from, to],
    }
}

/// `(group_size, index)` for every auto-routed link, keyed by link id.
///
/// Groups share an unordered target pair; members are ordered by link id.
/// Links with manual waypoints do not take part in fan-out.
pub fn fan_out_slots(links: &[Link]) -> HashMap<String, (usize, usize)> {
    let mut groups: HashMap<(&str, &str), Vec<&str>> = HashMap::new();
    for link in links.iter().filter(|l| !l.has_manual_path()) {
        groups.entry(link.group_key()).or_default().push(&link.id);
    }

    let mut slots = HashMap::new();
    for mut members in groups.into_values() {
        members.sort_unstable();
        let size = members.len();
        for (index, id) in members.into_iter().enumerate() {
            slots.insert(id.to_owned(), (size, index));
        }
    }
    slots
}

// ── Arc-length bisection ─────────────────────────────────────────────

/// A polyline split at half its length.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSplit {
    pub midpoint: Point,
    /// Ends with `midpoint`.
    pub first_half: Vec<Point>,
    /// Starts with `midpoint`.
    pub second_half: Vec<Point>,
}

/// Split a polyline at the point lying exactly at half its total length.
///
/// - 0 points: midpoint is the origin, both halves empty.
/// - 1 point, or all points coincident: the structural midpoint vertex is
///   the midpoint and both halves are that single point.
pub fn split_path_at_half(path: &[Point]) -> PathSplit {
    let single = |p: Point| PathSplit {
        midpoint: p,
        first_half: vec![p],
        second_half: vec![p],
    };

    match path {
        [] => {
            return PathSplit {
                midpoint: Point::default(),
                first_half: Vec::new(),
                second_half: Vec::new(),
            };
        }
        [p] => return single(*p),
        _ => {}
    }

    let total: f64 = path.windows(2).map(|w| w[0].distance(w[1])).sum();
    if total <= 0.0 {
        return single(path[path.len() / 2]);
    }

    let half = total / 2.0;
    let mut walked = 0.0;
    for (i, w) in path.windows(2).enumerate() {
        let seg = w[0].distance(w[1]);
        if seg > 0.0 && walked + seg >= half {
            let mid = w[0].lerp(w[1], (half - walked) / seg);
            let mut first_half = path[..=i].to_vec();
            first_half.push(mid);
            let mut second_half = vec![mid];
            second_half.extend_from_slice(&path[i + 1..]);
            return PathSplit {
                midpoint: mid,
                first_half,
                second_half,
            };
        }
        walked += seg;
    }

    // Rounding left `walked` just short of `half`: split at the end.
    let last = path[path.len() - 1];
    let mut first_half = path.to_vec();
    first_half.push(last);
    PathSplit {
        midpoint: last,
        first_half,
        second_half: vec![last],
    }
}

// ── Stroke width ─────────────────────────────────────────────────────

/// Stroke width for a link, interpolated log-linearly across the observed
/// capacity range.
///
/// Missing capacity, a missing range, or a non-positive range minimum
/// yield [`MIN_WIDTH`]; a collapsed range yields the midpoint width.
pub fn capacity_to_width(capacity: Option<f64>, range: Option<CapacityRange>) -> f64 {
    let (Some(capacity), Some(range)) = (capacity, range) else {
        return MIN_WIDTH;
    };
    if range.min <= 0.0 || capacity <= 0.0 || !capacity.is_finite() {
        return MIN_WIDTH;
    }
    if range.max <= range.min {
        return (MIN_WIDTH + MAX_WIDTH) / 2.0;
    }
    let c = capacity.clamp(range.min, range.max);
    let t = (c.ln() - range.min.ln()) / (range.max.ln() - range.min.ln());
    MIN_WIDTH + t * (MAX_WIDTH - MIN_WIDTH)
}

// ── Link paths ───────────────────────────────────────────────────────

/// One drawing step after a `move_to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Point),
    Quad { control: Point, to: Point },
}

/// An open path: a start point followed by segments.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfPath {
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl HalfPath {
    fn polyline(points: &[Point]) -> Self {
        let start = points.first().copied().unwrap_or_default();
        Self {
            start,
            segments: points.iter().skip(1).map(|p| Segment::Line(*p)).collect(),
        }
    }
}

/// A link split into its forward and reverse halves.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfSplit {
    pub midpoint: Point,
    pub first: HalfPath,
    pub second: HalfPath,
}

/// Renderable path of one link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkPath {
    /// Straight auto paths and manual waypoint paths.
    Polyline(Vec<Point>),
    /// Fanned-out auto path drawn as a quadratic curve.
    Curve { from: Point, control: Point, to: Point },
}

impl LinkPath {
    /// The path's defining points (`[from, control, to]` for curves).
    pub fn points(&self) -> Vec<Point> {
        match self {
            Self::Polyline(points) => points.clone(),
            Self::Curve { from, control, to } => vec![*from, *control, *to],
        }
    }

    /// Split into two independently drawable halves.
    ///
    /// Polylines are bisected by arc length. Curves are subdivided at
    /// `t = 0.5`; the control point lies on the perpendicular bisector of
    /// the chord, so the curve is symmetric and `t = 0.5` is its exact
    /// arc-length midpoint.
    pub fn split_half(&self) -> HalfSplit {
        match self {
            Self::Polyline(points) => {
                let split = split_path_at_half(points);
                HalfSplit {
                    midpoint: split.midpoint,
                    first: HalfPath::polyline(&split.first_half),
                    second: HalfPath::polyline(&split.second_half),
                }
            }
            Self::Curve { from, control, to } => {
                let left = from.midpoint(*control);
                let right = control.midpoint(*to);
                let mid = left.midpoint(right);
                HalfSplit {
                    midpoint: mid,
                    first: HalfPath {
                        start: *from,
                        segments: vec![Segment::Quad { control: left, to: mid }],
                    },
                    second: HalfPath {
                        start: mid,
                        segments: vec![Segment::Quad { control: right, to: *to }],
                    },
                }
            }
        }
    }
}

/// Precomputed paths for every link of a topology.
///
/// Never persisted; recompute after any position edit or topology
/// replacement.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    paths: HashMap<String, LinkPath>,
}

impl Geometry {
    pub fn compute(topology: &Topology) -> Self {
        let slots = fan_out_slots(&topology.links);
        let mut paths = HashMap::with_capacity(topology.links.len());

        for link in &topology.links {
            let (Some(from), Some(to)) = (
                topology.target(&link.from.target),
                topology.target(&link.to.target),
            ) else {
                continue;
            };
            let (from, to) = (from.position, to.position);

            let path = if link.has_manual_path() {
                let mut points = Vec::with_capacity(link.waypoints.len() + 2);
                points.push(from);
                points.extend_from_slice(&link.waypoints);
                points.push(to);
                LinkPath::Polyline(points)
            } else {
                let (size, index) = slots.get(&link.id).copied().unwrap_or((1, 0));
                // Fan out in the group's canonical orientation so members
                // declared in opposite directions do not collide.
                let canonical = link.from.target <= link.to.target;
                let mut points = if canonical {
                    compute_auto_path(from, to, size, index)
                } else {
                    compute_auto_path(to, from, size, index)
                };
                if !canonical {
                    points.reverse();
                }
                match points.as_slice() {
                    [a, c, b] => LinkPath::Curve {
                        from: *a,
                        control: *c,
                        to: *b,
                    },
                    _ => LinkPath::Polyline(points),
                }
            };
            paths.insert(link.id.clone(), path);
        }

        Self { paths }
    }

    pub fn path(&self, link_id: &str) -> Option<&LinkPath> {
        self.paths.get(link_id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{Endpoint, Target};

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    /// Signed offset of the control point from the chord midpoint.
    fn offset_of(path: &[Point]) -> f64 {
        let (from, to) = (path[0], path[path.len() - 1]);
        match path {
            [_, c, _] => (*c - from.midpoint(to)).dot(unit_normal(from, to).unwrap_or_default()),
            _ => 0.0,
        }
    }

    #[test]
    fn single_member_is_straight() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(300.0, 0.0));
        for index in 0..3 {
            assert_eq!(compute_auto_path(a, b, 1, index), vec![a, b]);
        }
    }

    #[test]
    fn three_members_fan_symmetrically() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(300.0, 0.0));
        let spacing = fan_spacing(a, b);
        assert!(close(spacing, 100.0));

        let paths: Vec<_> = (0..3).map(|i| compute_auto_path(a, b, 3, i)).collect();
        assert_eq!(paths[0].len(), 3);
        assert_eq!(paths[1], vec![a, b]);
        assert_eq!(paths[2].len(), 3);
        assert!(close(offset_of(&paths[0]), -spacing));
        assert!(close(offset_of(&paths[2]), spacing));
    }

    #[test]
    fn spacing_is_clamped() {
        let a = Point::new(0.0, 0.0);
        assert!(close(fan_spacing(a, Point::new(30.0, 0.0)), FAN_SPACING_MIN));
        assert!(close(fan_spacing(a, Point::new(3000.0, 0.0)), FAN_SPACING_MAX));
    }

    #[test]
    fn coincident_endpoints_stay_straight() {
        let a = Point::new(5.0, 5.0);
        assert_eq!(compute_auto_path(a, a, 2, 0), vec![a, a]);
    }

    #[test]
    fn split_straight_path_at_half() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(30.0, 40.0));
        let split = split_path_at_half(&[a, b]);
        assert!(close(split.midpoint.distance(a), 25.0));
        assert!(close(split.midpoint.distance(b), 25.0));
        assert_eq!(split.first_half, vec![a, split.midpoint]);
        assert_eq!(split.second_half, vec![split.midpoint, b]);
    }

    #[test]
    fn split_bent_path_duplicates_midpoint() {
        // Lengths 10 + 10 + 20: the midpoint is the end of the second segment.
        let path = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
        ];
        let split = split_path_at_half(&path);
        assert_eq!(split.midpoint, Point::new(10.0, 10.0));
        assert_eq!(split.first_half.last(), Some(&split.midpoint));
        assert_eq!(split.second_half.first(), Some(&split.midpoint));
        assert_eq!(split.second_half.last(), Some(&Point::new(30.0, 10.0)));
    }

    #[test]
    fn split_degenerate_paths() {
        let p = Point::new(7.0, 7.0);
        let split = split_path_at_half(&[p, p, p, p]);
        assert_eq!(split.midpoint, p);
        assert_eq!(split.first_half, vec![p]);
        assert_eq!(split.second_half, vec![p]);

        let split = split_path_at_half(&[p]);
        assert_eq!(split.midpoint, p);
        assert_eq!(split.first_half, vec![p]);

        let split = split_path_at_half(&[]);
        assert!(split.first_half.is_empty() && split.second_half.is_empty());
    }

    #[test]
    fn width_spans_min_to_max() {
        let range = Some(CapacityRange { min: 1e8, max: 1e11 });
        assert!(close(capacity_to_width(Some(1e8), range), MIN_WIDTH));
        assert!(close(capacity_to_width(Some(1e11), range), MAX_WIDTH));
        // Log-linear: 1e9 is a third of the way in log space.
        assert!(close(capacity_to_width(Some(1e9), range), 6.0));

        let mut last = MIN_WIDTH;
        for exp in 80..=110 {
            let w = capacity_to_width(Some(10f64.powf(f64::from(exp) / 10.0)), range);
            assert!(w >= last);
            last = w;
        }
    }

    #[test]
    fn width_fallbacks() {
        let range = Some(CapacityRange { min: 1e9, max: 1e9 });
        assert!(close(capacity_to_width(Some(1e9), range), 8.0));
        assert!(close(capacity_to_width(None, range), MIN_WIDTH));
        assert!(close(capacity_to_width(Some(1e9), None), MIN_WIDTH));
        let bad = Some(CapacityRange { min: 0.0, max: 1e9 });
        assert!(close(capacity_to_width(Some(1e9), bad), MIN_WIDTH));
    }

    #[test]
    fn curve_split_is_symmetric() {
        let path = LinkPath::Curve {
            from: Point::new(0.0, 0.0),
            control: Point::new(50.0, 40.0),
            to: Point::new(100.0, 0.0),
        };
        let split = path.split_half();
        assert_eq!(split.midpoint, Point::new(50.0, 20.0));
        assert_eq!(split.first.start, Point::new(0.0, 0.0));
        assert_eq!(split.second.start, split.midpoint);
    }

    fn two_router_topology(links: Vec<Link>) -> Topology {
        let mut topo = Topology::new("t", Duration::from_secs(1));
        topo.add_target(Target::new("A", Point::new(0.0, 0.0)));
        topo.add_target(Target::new("B", Point::new(300.0, 0.0)));
        topo.links = links;
        topo
    }

    #[test]
    fn parallel_links_fan_out_by_id_order() {
        // Declared out of order and in opposite directions.
        let topo = two_router_topology(vec![
            Link::new("b2", Endpoint::new("B", "x"), Endpoint::new("A", "y")),
            Link::new("a1", Endpoint::new("A", "x"), Endpoint::new("B", "y")),
        ]);
        let geometry = Geometry::compute(&topo);

        let canonical = |id: &str| {
            let mut pts = geometry.path(id).map(LinkPath::points).unwrap_or_default();
            if pts.first() != Some(&Point::new(0.0, 0.0)) {
                pts.reverse();
            }
            pts
        };
        let (a1, b2) = (offset_of(&canonical("a1")), offset_of(&canonical("b2")));
        assert!(close(a1, -50.0), "a1 offset {a1}");
        assert!(close(b2, 50.0), "b2 offset {b2}");

        // b2 keeps its own from → to orientation.
        let b2_points = geometry.path("b2").map(LinkPath::points).unwrap_or_default();
        assert_eq!(b2_points.first(), Some(&Point::new(300.0, 0.0)));
    }

    #[test]
    fn manual_waypoints_bypass_fan_out() {
        let mut manual = Link::new("m", Endpoint::new("A", "x"), Endpoint::new("B", "y"));
        manual.waypoints = vec![Point::new(100.0, 80.0), Point::new(200.0, 80.0)];
        let topo = two_router_topology(vec![
            manual,
            Link::new("auto", Endpoint::new("A", "z"), Endpoint::new("B", "z")),
        ]);
        let geometry = Geometry::compute(&topo);

        assert_eq!(
            geometry.path("m"),
            Some(&LinkPath::Polyline(vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 80.0),
                Point::new(200.0, 80.0),
                Point::new(300.0, 0.0),
            ]))
        );
        // The remaining auto link is alone in its group.
        assert_eq!(
            geometry.path("auto"),
            Some(&LinkPath::Polyline(vec![Point::new(0.0, 0.0), Point::new(300.0, 0.0)]))
        );
    }
}
