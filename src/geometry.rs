use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, PI};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

const EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan_length(self) -> f32 {
        self.x.abs() + self.y.abs()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub fn dx(&self) -> f32 {
        self.p2.x - self.p1.x
    }

    pub fn dy(&self) -> f32 {
        self.p2.y - self.p1.y
    }

    pub fn length(&self) -> f32 {
        self.p1.distance(self.p2)
    }

    /// Counter-clockwise angle in radians with the y axis pointing down.
    pub fn angle(&self) -> f32 {
        angle(self.p1, self.p2)
    }

    pub fn midpoint(&self) -> Point {
        midpoint(self.p1, self.p2)
    }

    pub fn point_at(&self, t: f32) -> Point {
        Point::new(self.p1.x + t * self.dx(), self.p1.y + t * self.dy())
    }

    /// Intersection point of two bounded segments.
    pub fn intersect(&self, other: &Line) -> Option<Point> {
        segment_intersection_param(self.p1, self.p2, other.p1, other.p2).map(|t| self.point_at(t))
    }

    /// Unit vector along the segment, `None` for degenerate segments.
    pub fn unit_vector(&self) -> Option<Point> {
        let length = self.length();
        if length <= f32::EPSILON {
            return None;
        }
        Some(Point::new(self.dx() / length, self.dy() / length))
    }

    /// Unit vector perpendicular to the segment.
    pub fn normal_vector(&self) -> Option<Point> {
        self.unit_vector().map(|unit| Point::new(unit.y, -unit.x))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self {
            min_x: center.x - width / 2.0,
            min_y: center.y - height / 2.0,
            max_x: center.x + width / 2.0,
            max_y: center.y + height / 2.0,
        }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.max_x, self.min_y)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.min_x, self.max_y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    pub fn inflate(self, amount: f32) -> Rect {
        Rect {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn translated(self, offset: Point) -> Rect {
        Rect {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    pub fn united(self, other: Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x - EPSILON
            && point.x <= self.max_x + EPSILON
            && point.y >= self.min_y - EPSILON
            && point.y <= self.max_y + EPSILON
    }

    /// Corners in clockwise order starting from the top-left one.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }
}

/// Closed polygon; the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        let count = self.points.len();
        (0..count).filter_map(move |i| {
            if count < 2 {
                return None;
            }
            Some(Line::new(self.points[i], self.points[(i + 1) % count]))
        })
    }

    pub fn translated(&self, offset: Point) -> Polygon {
        Polygon::new(self.points.iter().map(|point| *point + offset).collect())
    }

    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::default();
        };
        self.points.iter().skip(1).fold(
            Rect::from_points(*first, *first),
            |acc, point| acc.united(Rect::from_points(*point, *point)),
        )
    }

    /// Even-odd containment test; points on the boundary count as inside.
    pub fn contains(&self, point: Point) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        if self
            .edges()
            .any(|edge| distance_to_segment(point, edge) <= EPSILON * 10.0)
        {
            return true;
        }
        let mut inside = false;
        let count = self.points.len();
        let mut j = count - 1;
        for i in 0..count {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Exact boundary of a shape, used for hit testing and edge clipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum PainterPath {
    Rect { rect: Rect },
    Ellipse { rect: Rect },
    Polygon { polygon: Polygon },
}

impl PainterPath {
    pub fn rect(rect: Rect) -> Self {
        PainterPath::Rect { rect }
    }

    pub fn ellipse(rect: Rect) -> Self {
        PainterPath::Ellipse { rect }
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        PainterPath::Polygon {
            polygon: Polygon::new(points),
        }
    }

    /// Rectangle with circular corners approximated by short chords.
    pub fn rounded_rect(rect: Rect, radius: f32) -> Self {
        let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
        if radius <= f32::EPSILON {
            return PainterPath::rect(rect);
        }
        const STEPS: usize = 4;
        let corners = [
            (Point::new(rect.max_x - radius, rect.min_y + radius), -PI / 2.0),
            (Point::new(rect.max_x - radius, rect.max_y - radius), 0.0),
            (Point::new(rect.min_x + radius, rect.max_y - radius), PI / 2.0),
            (Point::new(rect.min_x + radius, rect.min_y + radius), PI),
        ];
        let mut points = Vec::with_capacity(corners.len() * (STEPS + 1));
        for (center, start) in corners {
            for step in 0..=STEPS {
                let theta = start + (PI / 2.0) * step as f32 / STEPS as f32;
                points.push(Point::new(
                    center.x + radius * theta.cos(),
                    center.y + radius * theta.sin(),
                ));
            }
        }
        PainterPath::polygon(points)
    }

    pub fn bounding_rect(&self) -> Rect {
        match self {
            PainterPath::Rect { rect } | PainterPath::Ellipse { rect } => *rect,
            PainterPath::Polygon { polygon } => polygon.bounding_rect(),
        }
    }

    pub fn translated(&self, offset: Point) -> PainterPath {
        match self {
            PainterPath::Rect { rect } => PainterPath::rect(rect.translated(offset)),
            PainterPath::Ellipse { rect } => PainterPath::ellipse(rect.translated(offset)),
            PainterPath::Polygon { polygon } => PainterPath::Polygon {
                polygon: polygon.translated(offset),
            },
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        match self {
            PainterPath::Rect { rect } => rect.contains(point),
            PainterPath::Ellipse { rect } => {
                let rx = rect.width() / 2.0;
                let ry = rect.height() / 2.0;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let center = rect.center();
                let norm_x = (point.x - center.x) / rx;
                let norm_y = (point.y - center.y) / ry;
                norm_x * norm_x + norm_y * norm_y <= 1.0 + EPSILON
            }
            PainterPath::Polygon { polygon } => polygon.contains(point),
        }
    }

    pub fn intersects(&self, other: &PainterPath) -> bool {
        if !self.bounding_rect().intersects(&other.bounding_rect()) {
            return false;
        }
        let outline = self.outline();
        let other_outline = other.outline();
        if outline.points.iter().any(|point| other.contains(*point))
            || other_outline.points.iter().any(|point| self.contains(*point))
        {
            return true;
        }
        outline.edges().any(|a| {
            other_outline
                .edges()
                .any(|b| segments_intersect(a.p1, a.p2, b.p1, b.p2))
        })
    }

    /// Closest boundary crossing to `line.p1`.
    pub fn intersection(&self, line: &Line) -> Option<Point> {
        self.intersections(line).into_iter().min_by(|a, b| {
            line.p1
                .distance(*a)
                .partial_cmp(&line.p1.distance(*b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    pub fn intersections(&self, line: &Line) -> Vec<Point> {
        match self {
            PainterPath::Ellipse { rect } => ellipse_intersections(*rect, line),
            _ => {
                let mut points: Vec<Point> = Vec::new();
                for edge in self.outline().edges() {
                    if let Some(point) = line.intersect(&edge) {
                        if !points.iter().any(|other| points_close(*other, point)) {
                            points.push(point);
                        }
                    }
                }
                points
            }
        }
    }

    /// Polygonal approximation of the boundary.
    pub fn outline(&self) -> Polygon {
        match self {
            PainterPath::Rect { rect } => Polygon::new(rect.corners().to_vec()),
            PainterPath::Polygon { polygon } => polygon.clone(),
            PainterPath::Ellipse { rect } => {
                const STEPS: usize = 32;
                let center = rect.center();
                let rx = rect.width() / 2.0;
                let ry = rect.height() / 2.0;
                Polygon::new(
                    (0..STEPS)
                        .map(|step| {
                            let theta = 2.0 * PI * step as f32 / STEPS as f32;
                            Point::new(center.x + rx * theta.cos(), center.y + ry * theta.sin())
                        })
                        .collect(),
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Brush {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Brush {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn solid(color: &str) -> Self {
        Self {
            color: Some(color.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pen {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub width: f32,
    pub dashed: bool,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            color: Some("#000000".to_string()),
            width: 1.1,
            dashed: false,
        }
    }
}

impl Pen {
    pub fn none() -> Self {
        Self {
            color: None,
            width: 0.0,
            dashed: false,
        }
    }
}

/// Drawable geometry with its paint attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape<G> {
    geometry: G,
    brush: Brush,
    pen: Pen,
}

impl<G> Shape<G> {
    pub fn new(geometry: G) -> Self {
        Self {
            geometry,
            brush: Brush::none(),
            pen: Pen::none(),
        }
    }

    pub fn with_paint(geometry: G, brush: Brush, pen: Pen) -> Self {
        Self {
            geometry,
            brush,
            pen,
        }
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: G) {
        self.geometry = geometry;
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn pen(&self) -> &Pen {
        &self.pen
    }

    pub fn set_pen(&mut self, pen: Pen) {
        self.pen = pen;
    }
}

/// Snaps `value` to the closest multiple of `grid`, then shifts it by `offset`.
pub fn snap_f(value: f32, grid: f32, offset: f32, snap: bool) -> f32 {
    if !snap || grid <= 0.0 {
        return value;
    }
    (value / grid).round_ties_even() * grid + offset
}

pub fn snap(point: Point, grid: f32, snap: bool) -> Point {
    Point::new(
        snap_f(point.x, grid, 0.0, snap),
        snap_f(point.y, grid, 0.0, snap),
    )
}

pub fn angle(p1: Point, p2: Point) -> f32 {
    (p1.y - p2.y).atan2(p2.x - p1.x)
}

pub fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}

/// Perpendicular projection of `point` onto the segment, clamped to its ends.
/// Returns the distance from `point` and the projected point.
pub fn projection(line: &Line, point: Point) -> (f32, Point) {
    let (dx, dy) = (line.dx(), line.dy());
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        return (point.distance(line.p1), line.p1);
    }
    let t = (((point.x - line.p1.x) * dx + (point.y - line.p1.y) * dy) / length_sq).clamp(0.0, 1.0);
    let projected = line.point_at(t);
    (point.distance(projected), projected)
}

pub fn distance_to_segment(point: Point, line: Line) -> f32 {
    projection(&line, point).0
}

/// Quad of width `size` around the segment `p1`-`p2` with the given angle.
pub fn create_area(p1: Point, p2: Point, rad: f32, size: f32) -> Polygon {
    let x = size / 2.0 * rad.sin();
    let y = size / 2.0 * rad.cos();
    let a = Point::new(x, y);
    let b = Point::new(-x, -y);
    Polygon::new(vec![p1 + a, p1 + b, p2 + b, p2 + a])
}

/// Triangle with its tip on `tip`, pointing along `rad`.
pub fn create_triangle_head(tip: Point, rad: f32, size: f32) -> Polygon {
    let p2 = tip
        - Point::new(
            (rad + FRAC_PI_3).sin() * size,
            (rad + FRAC_PI_3).cos() * size,
        );
    let p3 = tip
        - Point::new(
            (rad + PI - FRAC_PI_3).sin() * size,
            (rad + PI - FRAC_PI_3).cos() * size,
        );
    Polygon::new(vec![tip, p2, p3])
}

/// Triangle with its tip on `tip`, pointing against `rad`.
pub fn create_triangle_tail(tip: Point, rad: f32, size: f32) -> Polygon {
    let p2 = tip
        + Point::new(
            (rad + FRAC_PI_3).sin() * size,
            (rad + FRAC_PI_3).cos() * size,
        );
    let p3 = tip
        + Point::new(
            (rad + PI - FRAC_PI_3).sin() * size,
            (rad + PI - FRAC_PI_3).cos() * size,
        );
    Polygon::new(vec![tip, p2, p3])
}

/// Diamond head with one vertex on `tip`.
pub fn create_diamond_head(tip: Point, rad: f32, size: f32) -> Polygon {
    let p2 = tip
        - Point::new(
            (rad + FRAC_PI_4).sin() * size,
            (rad + FRAC_PI_4).cos() * size,
        );
    let p3 = p2
        - Point::new(
            (rad + 3.0 * FRAC_PI_4).sin() * size,
            (rad + 3.0 * FRAC_PI_4).cos() * size,
        );
    let p4 = p3
        - Point::new(
            (rad - 3.0 * FRAC_PI_4).sin() * size,
            (rad - 3.0 * FRAC_PI_4).cos() * size,
        );
    Polygon::new(vec![tip, p2, p3, p4])
}

fn ellipse_intersections(rect: Rect, line: &Line) -> Vec<Point> {
    let dx = line.dx();
    let dy = line.dy();
    let rx = rect.width() / 2.0;
    let ry = rect.height() / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }
    let center = rect.center();
    let sx = line.p1.x - center.x;
    let sy = line.p1.y - center.y;

    let a = (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry);
    if a.abs() <= f32::EPSILON {
        return Vec::new();
    }
    let b = 2.0 * ((sx * dx) / (rx * rx) + (sy * dy) / (ry * ry));
    let c = (sx * sx) / (rx * rx) + (sy * sy) / (ry * ry) - 1.0;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }

    let sqrt_disc = discriminant.sqrt();
    let mut points = Vec::new();
    for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
        if (0.0..=1.0).contains(&t) {
            let point = line.point_at(t);
            if !points.iter().any(|other| points_close(*other, point)) {
                points.push(point);
            }
        }
    }
    points
}

pub fn segment_intersection_param(
    start: Point,
    next: Point,
    edge_start: Point,
    edge_end: Point,
) -> Option<f32> {
    let r = next - start;
    let s = edge_end - edge_start;

    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() < 1e-6_f32 {
        return None;
    }

    let qp = edge_start - start;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    (o1.abs() < EPSILON && on_segment(a1, a2, b1))
        || (o2.abs() < EPSILON && on_segment(a1, a2, b2))
        || (o3.abs() < EPSILON && on_segment(b1, b2, a1))
        || (o4.abs() < EPSILON && on_segment(b1, b2, a2))
}

fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, c: Point) -> bool {
    c.x >= a.x.min(b.x) - EPSILON
        && c.x <= a.x.max(b.x) + EPSILON
        && c.y >= a.y.min(b.y) - EPSILON
        && c.y <= a.y.max(b.y) + EPSILON
}

pub fn points_close(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-2_f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_values_to_grid() {
        let cases = [
            (14.0, 10.0, 0.0, true, 10.0),
            (15.0, 10.0, 0.0, true, 20.0),
            (25.0, 10.0, 0.0, true, 20.0),
            (136.0, 10.0, -4.0, true, 136.0),
            (-59.0, 10.0, 4.0, true, -56.0),
            (14.0, 10.0, 0.0, false, 14.0),
        ];

        for (value, grid, offset, enabled, expected) in cases {
            assert_eq!(
                snap_f(value, grid, offset, enabled),
                expected,
                "snap_f({value}, {grid}, {offset}, {enabled})"
            );
        }
    }

    #[test]
    fn angle_follows_screen_orientation() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(angle(origin, Point::new(10.0, 0.0)), 0.0);
        assert!((angle(origin, Point::new(0.0, -10.0)) - PI / 2.0).abs() < 1e-6);
        assert!((angle(origin, Point::new(-10.0, 0.0)).abs() - PI).abs() < 1e-6);
    }

    #[test]
    fn projects_onto_segment() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let (distance, point) = projection(&line, Point::new(40.0, 30.0));
        assert_eq!(distance, 30.0);
        assert_eq!(point, Point::new(40.0, 0.0));

        let (distance, point) = projection(&line, Point::new(-30.0, 40.0));
        assert_eq!(distance, 50.0);
        assert_eq!(point, Point::new(0.0, 0.0));
    }

    #[test]
    fn rect_path_intersection_is_closest_to_start() {
        let path = PainterPath::rect(Rect::from_center(Point::new(0.0, 0.0), 110.0, 50.0));
        let line = Line::new(Point::new(0.0, 0.0), Point::new(300.0, 0.0));
        let hit = path.intersection(&line).unwrap();
        assert!(hit.distance(Point::new(55.0, 0.0)) < 1e-3, "{hit:?}");

        let crossing = Line::new(Point::new(-100.0, 0.0), Point::new(100.0, 0.0));
        assert_eq!(path.intersections(&crossing).len(), 2);
        let hit = path.intersection(&crossing).unwrap();
        assert!(hit.distance(Point::new(-55.0, 0.0)) < 1e-3, "{hit:?}");
    }

    #[test]
    fn ellipse_contains_and_clips() {
        let path = PainterPath::ellipse(Rect::from_center(Point::new(0.0, 0.0), 20.0, 20.0));
        assert!(path.contains(Point::new(0.0, 9.9)));
        assert!(!path.contains(Point::new(8.0, 8.0)));

        let line = Line::new(Point::new(0.0, 0.0), Point::new(0.0, 50.0));
        let hit = path.intersection(&line).unwrap();
        assert!((hit.y - 10.0).abs() < 1e-4, "{hit:?}");
    }

    #[test]
    fn polygon_contains_boundary_points() {
        let diamond = Polygon::new(vec![
            Point::new(0.0, -25.0),
            Point::new(35.0, 0.0),
            Point::new(0.0, 25.0),
            Point::new(-35.0, 0.0),
        ]);
        let cases = [
            (Point::new(0.0, 0.0), true),
            (Point::new(35.0, 0.0), true),
            (Point::new(17.5, 12.5), true),
            (Point::new(30.0, 20.0), false),
        ];

        for (point, expected) in cases {
            assert_eq!(diamond.contains(point), expected, "{point:?}");
        }
    }

    #[test]
    fn rounded_rect_stays_within_bounds() {
        let rect = Rect::from_center(Point::new(0.0, 0.0), 90.0, 40.0);
        let path = PainterPath::rounded_rect(rect, 8.0);
        let bounds = path.bounding_rect();
        assert!((bounds.width() - 90.0).abs() < 1e-3);
        assert!((bounds.height() - 40.0).abs() < 1e-3);
        assert!(!path.contains(Point::new(44.9, 19.9)));
        assert!(path.contains(Point::new(0.0, 19.9)));
    }

    #[test]
    fn triangle_head_points_along_segment() {
        let head = create_triangle_head(Point::new(100.0, 0.0), 0.0, 10.0);
        assert_eq!(head.points[0], Point::new(100.0, 0.0));
        assert!(head.points[1..].iter().all(|point| point.x < 100.0));
        let tail = create_triangle_tail(Point::new(0.0, 0.0), 0.0, 10.0);
        assert!(tail.points[1..].iter().all(|point| point.x > 0.0));
    }

    #[test]
    fn shape_is_a_plain_holder() {
        let mut shape = Shape::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        shape.set_brush(Brush::solid("#fcfcfc"));
        shape.set_geometry(Rect::new(1.0, 1.0, 5.0, 5.0));
        assert_eq!(shape.brush().color.as_deref(), Some("#fcfcfc"));
        assert_eq!(shape.geometry().width(), 5.0);
        assert_eq!(shape.pen(), &Pen::none());
    }
}
