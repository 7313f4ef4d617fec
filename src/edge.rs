use crate::error::DiagramError;
use crate::geometry::{
    Line, Point, Polygon, Rect, angle, create_area, create_diamond_head, create_triangle_head,
    create_triangle_tail, midpoint, projection, snap,
};
use crate::label::Label;
use crate::node::Node;
use crate::{
    EDGE_HEAD_SIZE, EDGE_SELECTION_SIZE, EDGE_Z_STEP, EdgeKind, HANDLE_HIT_SLACK, HANDLE_SIZE,
    INPUT_HEAD_SIZE, LABEL_Z_STEP, ORDINAL_LABEL_DISTANCE,
};
use std::f32::consts::{FRAC_PI_3, PI};
use tracing::trace;

const LABEL_SPACE_X: f32 = -40.0;
const LABEL_SPACE_Y: f32 = -16.0;
const LABEL_BEND_SPACE_X: f32 = -80.0;
const LABEL_BEND_FACTOR: f32 = 1.8;

impl EdgeKind {
    fn label_template(self) -> Option<&'static str> {
        match self {
            EdgeKind::Membership => Some("instanceOf"),
            EdgeKind::Same => Some("same"),
            EdgeKind::Different => Some("different"),
            _ => None,
        }
    }
}

/// Grid and snapping parameters shared by the interactive edge edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOptions {
    pub grid: f32,
    pub snap: bool,
    pub anchor_radius: f32,
}

/// A diagram edge. Endpoints are node ids; anchors live on the nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: String,
    kind: EdgeKind,
    source: String,
    target: Option<String>,
    breakpoints: Vec<Point>,
    z: f32,
    label: Option<Label>,
    path: Vec<Line>,
    selection: Vec<Polygon>,
    head: Polygon,
    tail: Polygon,
    handles: Vec<Rect>,
    anchor_handles: Vec<(String, Rect)>,
    visible: bool,
}

impl Edge {
    pub fn new(id: &str, kind: EdgeKind, source: &str, target: Option<&str>) -> Self {
        let label = kind
            .label_template()
            .map(|template| Label::new(template, Point::default(), true, false));
        Self {
            id: id.to_string(),
            kind,
            source: source.to_string(),
            target: target.map(str::to_string),
            breakpoints: Vec::new(),
            z: 0.0,
            label,
            path: Vec::new(),
            selection: Vec::new(),
            head: Polygon::default(),
            tail: Polygon::default(),
            handles: Vec::new(),
            anchor_handles: Vec::new(),
            visible: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }

    pub fn set_target(&mut self, target: Option<&str>) {
        self.target = target.map(str::to_string);
    }

    pub fn is_endpoint(&self, node: &str) -> bool {
        self.source == node || self.target.as_deref() == Some(node)
    }

    /// The endpoint opposite to `node`.
    pub fn other(&self, node: &str) -> Result<&str, DiagramError> {
        match self.target.as_deref() {
            Some(target) if self.source == node => Ok(target),
            Some(target) if target == node => Ok(&self.source),
            _ => Err(DiagramError::NotAnEndpoint {
                node: node.to_string(),
                edge: self.id.clone(),
            }),
        }
    }

    /// Reverses the direction: endpoints are exchanged and breakpoints reversed.
    pub fn swap(&mut self) -> Result<(), DiagramError> {
        let Some(target) = self.target.take() else {
            return Err(DiagramError::NotAnEndpoint {
                node: String::new(),
                edge: self.id.clone(),
            });
        };
        self.target = Some(std::mem::replace(&mut self.source, target));
        self.breakpoints.reverse();
        Ok(())
    }

    pub fn breakpoints(&self) -> &[Point] {
        &self.breakpoints
    }

    pub fn set_breakpoints(&mut self, breakpoints: Vec<Point>) {
        self.breakpoints = breakpoints;
    }

    pub fn insert_breakpoint(&mut self, index: usize, point: Point) {
        let index = index.min(self.breakpoints.len());
        self.breakpoints.insert(index, point);
    }

    pub fn remove_breakpoint(&mut self, index: usize) -> Option<Point> {
        (index < self.breakpoints.len()).then(|| self.breakpoints.remove(index))
    }

    pub fn set_breakpoint(&mut self, index: usize, point: Point) {
        if let Some(breakpoint) = self.breakpoints.get_mut(index) {
            *breakpoint = point;
        }
    }

    /// Translates every breakpoint.
    pub fn move_by(&mut self, delta: Point) {
        for breakpoint in &mut self.breakpoints {
            *breakpoint += delta;
        }
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn label_mut(&mut self) -> Option<&mut Label> {
        self.label.as_mut()
    }

    pub fn label_z(&self) -> f32 {
        self.z + LABEL_Z_STEP
    }

    pub fn path(&self) -> &[Line] {
        &self.path
    }

    pub fn selection(&self) -> &[Polygon] {
        &self.selection
    }

    pub fn head(&self) -> &Polygon {
        &self.head
    }

    pub fn tail(&self) -> &Polygon {
        &self.tail
    }

    pub fn handles(&self) -> &[Rect] {
        &self.handles
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn bounding_rect(&self) -> Rect {
        let mut points = self.path.iter().flat_map(|line| [line.p1, line.p2]);
        let Some(first) = points.next() else {
            return Rect::default();
        };
        points
            .fold(Rect::from_points(first, first), |acc, point| {
                acc.united(Rect::from_points(point, point))
            })
            .inflate(EDGE_SELECTION_SIZE / 2.0)
    }

    /// True when `point` hits the edge body.
    pub fn contains(&self, point: Point) -> bool {
        self.selection.iter().any(|area| area.contains(point))
            || (!self.head.is_empty() && self.head.contains(point))
    }

    /// Sub-segments of `points` not hidden under the endpoint shapes.
    pub fn compute_path(source: &Node, target: Option<&Node>, points: &[Point]) -> Vec<Line> {
        points
            .windows(2)
            .map(|pair| Line::new(pair[0], pair[1]))
            .filter(|line| {
                let in_source = source.contains(line.p1) && source.contains(line.p2);
                let in_target =
                    target.is_some_and(|target| target.contains(line.p1) && target.contains(line.p2));
                !in_source && !in_target
            })
            .collect()
    }

    /// Recomputes every derived piece of geometry from the endpoints.
    ///
    /// `target_pos` stands in for the target while the edge is being drawn;
    /// `ordinal` is the position of this edge among the inputs of its target.
    pub fn update(
        &mut self,
        source: &Node,
        target: Option<&Node>,
        target_pos: Option<Point>,
        ordinal: Option<usize>,
    ) {
        let source_anchor = source.anchor(&self.id);
        let target_point = target
            .map(|target| target.anchor(&self.id))
            .or(target_pos)
            .unwrap_or(source_anchor);

        self.anchor_handles = vec![(
            source.id().to_string(),
            Rect::from_center(source_anchor, HANDLE_SIZE, HANDLE_SIZE),
        )];
        if let Some(target) = target {
            self.anchor_handles.push((
                target.id().to_string(),
                Rect::from_center(target_point, HANDLE_SIZE, HANDLE_SIZE),
            ));
        }
        self.handles = self
            .breakpoints
            .iter()
            .map(|point| Rect::from_center(*point, HANDLE_SIZE, HANDLE_SIZE))
            .collect();

        let mut z = source.z().max(source.label_z());
        if let Some(target) = target {
            z = z.max(target.z()).max(target.label_z());
        }
        self.z = z + EDGE_Z_STEP;

        let mut points = Vec::with_capacity(self.breakpoints.len() + 2);
        points.push(source_anchor);
        points.extend(self.breakpoints.iter().copied());
        points.push(target_point);

        let collection = Self::compute_path(source, target, &points);
        self.path.clear();
        self.head = Polygon::default();
        self.tail = Polygon::default();

        if let (Some(first), Some(last)) = (collection.first(), collection.last()) {
            let start = source.intersection(first).unwrap_or(first.p1);
            let end = target
                .and_then(|target| target.intersection(last))
                .unwrap_or(last.p2);
            if collection.len() == 1 {
                self.path.push(Line::new(start, end));
            } else {
                self.path.push(Line::new(start, first.p2));
                self.path
                    .extend(collection[1..collection.len() - 1].iter().copied());
                self.path.push(Line::new(last.p1, end));
            }
            self.head = self.create_head(end, last.angle());
            if self.kind == EdgeKind::Equivalence {
                self.tail = create_triangle_tail(start, first.angle(), EDGE_HEAD_SIZE);
            }
        }

        self.selection = self
            .path
            .iter()
            .map(|line| create_area(line.p1, line.p2, line.angle(), EDGE_SELECTION_SIZE))
            .collect();
        self.visible = self.can_draw(source, target);
        self.update_label(ordinal);

        trace!(edge = %self.id, segments = self.path.len(), "updated edge");
    }

    fn create_head(&self, tip: Point, rad: f32) -> Polygon {
        match self.kind {
            EdgeKind::Inclusion | EdgeKind::Equivalence | EdgeKind::Membership => {
                create_triangle_head(tip, rad, EDGE_HEAD_SIZE)
            }
            EdgeKind::Input => create_diamond_head(tip, rad, INPUT_HEAD_SIZE),
            EdgeKind::Same | EdgeKind::Different => Polygon::default(),
        }
    }

    fn path_points(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self.path.iter().map(|line| line.p1).collect();
        if let Some(last) = self.path.last() {
            points.push(last.p2);
        }
        points
    }

    fn update_label(&mut self, ordinal: Option<usize>) {
        if self.kind == EdgeKind::Input {
            self.label = ordinal.map(|index| {
                let mut label = self
                    .label
                    .take()
                    .unwrap_or_else(|| Label::new("", Point::default(), false, false));
                label.set_text(&(index + 1).to_string());
                label
            });
        }
        let points = self.path_points();
        let Some(label) = self.label.as_mut() else {
            return;
        };
        if points.len() < 2 {
            return;
        }
        let default = if self.kind == EdgeKind::Input {
            ordinal_label_pos(&points)
        } else {
            centered_label_pos(&points)
        };
        label.relocate(default);
    }

    /// Whether the edge shows at all: overlapping endpoints hide it unless a
    /// breakpoint lies outside both shapes.
    pub fn can_draw(&self, source: &Node, target: Option<&Node>) -> bool {
        let Some(target) = target else {
            return true;
        };
        if !source.painter_path().intersects(target.painter_path()) {
            return true;
        }
        self.breakpoints
            .iter()
            .any(|point| !source.contains(*point) && !target.contains(*point))
    }

    /// Index at which a breakpoint for `mouse` belongs, and its projection on the
    /// closest segment.
    ///
    /// A segment ending on a breakpoint inserts before it, one starting on a
    /// breakpoint inserts after it; the source-to-target segment of an edge
    /// without breakpoints yields index 0.
    pub fn break_point_index(&self, source_anchor: Point, target_anchor: Point, mouse: Point) -> (usize, Point) {
        let mut points = Vec::with_capacity(self.breakpoints.len() + 2);
        points.push(source_anchor);
        points.extend(self.breakpoints.iter().copied());
        points.push(target_anchor);

        let mut shortest = f32::INFINITY;
        let mut point = mouse;
        let mut between: Option<(Point, Point)> = None;
        for pair in points.windows(2) {
            let (distance, projected) = projection(&Line::new(pair[0], pair[1]), mouse);
            if distance < shortest {
                shortest = distance;
                point = projected;
                between = Some((pair[0], pair[1]));
            }
        }

        let mut index = 0;
        if let Some((start, end)) = between {
            for (i, breakpoint) in self.breakpoints.iter().enumerate() {
                if *breakpoint == end {
                    index = i;
                    break;
                }
                if *breakpoint == start {
                    index = i + 1;
                    break;
                }
            }
        }
        (index, point)
    }

    /// New position for breakpoint `index` following the cursor; points dropped
    /// inside an endpoint are pushed back to that endpoint's boundary.
    pub fn break_point_move_target(
        &self,
        index: usize,
        mouse: Point,
        source: &Node,
        target: Option<&Node>,
        options: SnapOptions,
    ) -> Option<Point> {
        let breakpoint = *self.breakpoints.get(index)?;
        let mouse = snap(mouse, options.grid, options.snap);
        if source.contains(mouse) {
            return Some(
                source
                    .intersection(&Line::new(source.pos(), breakpoint))
                    .unwrap_or(mouse),
            );
        }
        if let Some(target) = target {
            if target.contains(mouse) {
                return Some(
                    target
                        .intersection(&Line::new(target.pos(), breakpoint))
                        .unwrap_or(mouse),
                );
            }
        }
        Some(mouse)
    }

    /// New anchor on `node` for the cursor at `mouse` while the anchor handle is dragged.
    pub fn anchor_move_target(&self, node: &Node, other: &Node, mouse: Point, options: SnapOptions) -> Point {
        let node_pos = node.pos();
        let mouse = snap(mouse, options.grid, options.snap);
        let other_anchor = other.anchor(&self.id);
        let is_target = self.target.as_deref() == Some(node.id());

        let neighbour = if is_target {
            self.breakpoints.last()
        } else {
            self.breakpoints.first()
        };
        let mut breakpoint = neighbour.copied().unwrap_or(other_anchor);
        if node.contains(breakpoint) {
            if node.contains(other_anchor) {
                return node.anchor(&self.id);
            }
            breakpoint = other_anchor;
        }

        let endpoint = if node.contains(mouse) {
            mouse
        } else {
            node.intersection(&Line::new(node_pos, mouse))
                .unwrap_or(node_pos)
        };
        if node_pos.distance(endpoint) < options.anchor_radius {
            return node_pos;
        }

        let line = Line::new(breakpoint, endpoint);
        let pos = node
            .intersections(&line)
            .into_iter()
            .min_by(|a, b| {
                breakpoint
                    .distance(*a)
                    .partial_cmp(&breakpoint.distance(*b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(endpoint);
        if node.contains(pos) {
            return pos;
        }

        let direction = line.unit_vector().unwrap_or_default();
        let normal = line.normal_vector().unwrap_or_default();
        [pos + direction, pos - direction, pos + normal, pos - normal]
            .into_iter()
            .find(|probe| node.contains(*probe))
            .unwrap_or(pos - Point::new(0.5, 0.5))
    }

    /// Node id whose anchor handle lies under `point`.
    pub fn anchor_at(&self, point: Point) -> Option<&str> {
        let area = Rect::from_center(point, 2.0 * HANDLE_HIT_SLACK, 2.0 * HANDLE_HIT_SLACK);
        self.anchor_handles
            .iter()
            .find(|(_, rect)| rect.intersects(&area))
            .map(|(node, _)| node.as_str())
    }

    /// Index of the breakpoint whose handle lies under `point`.
    pub fn break_point_at(&self, point: Point) -> Option<usize> {
        let area = Rect::from_center(point, 2.0 * HANDLE_HIT_SLACK, 2.0 * HANDLE_HIT_SLACK);
        self.handles.iter().position(|rect| rect.intersects(&area))
    }
}

/// Centre of the visible path, pushed aside so the text does not overlap it.
fn centered_label_pos(points: &[Point]) -> Point {
    let half = points.len() / 2;
    if points.len() % 2 == 0 {
        let (p1, p2) = (points[half - 1], points[half]);
        let mid = midpoint(p1, p2);
        let rad = angle(p1, p2);
        Point::new(
            mid.x + LABEL_SPACE_X * rad.sin(),
            mid.y + LABEL_SPACE_Y * rad.cos(),
        )
    } else {
        let mid = points[half];
        let rad1 = angle(points[half - 1], mid);
        let rad2 = angle(mid, points[half + 1]);
        let diff = rad2 - rad1;
        let mut space_x = 0.0;
        let mut space_y = LABEL_SPACE_Y;
        if diff > 0.0 && diff < PI {
            space_x = LABEL_BEND_SPACE_X * rad1.sin() + LABEL_BEND_SPACE_X * rad2.sin();
            space_y += LABEL_SPACE_Y * diff.sin() * LABEL_BEND_FACTOR;
        }
        Point::new(mid.x + space_x, mid.y + space_y)
    }
}

/// Next to the target end, where the ordinal of an input is read.
fn ordinal_label_pos(points: &[Point]) -> Point {
    let last = points[points.len() - 1];
    let rad = angle(points[points.len() - 2], last);
    last - Point::new(
        (rad + FRAC_PI_3).sin() * ORDINAL_LABEL_DISTANCE,
        (rad + FRAC_PI_3).cos() * ORDINAL_LABEL_DISTANCE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    const OPTIONS: SnapOptions = SnapOptions {
        grid: 10.0,
        snap: false,
        anchor_radius: 10.0,
    };

    fn node_at(id: &str, kind: NodeKind, x: f32, y: f32) -> Node {
        let mut node = Node::new(id, kind);
        node.set_pos(Point::new(x, y));
        node
    }

    fn pair() -> (Node, Node, Edge) {
        let source = node_at("n0", NodeKind::Concept, 0.0, 0.0);
        let target = node_at("n1", NodeKind::Concept, 300.0, 0.0);
        let edge = Edge::new("e0", EdgeKind::Inclusion, "n0", Some("n1"));
        (source, target, edge)
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn straight_path_is_clipped_by_both_shapes() {
        let (source, target, mut edge) = pair();
        edge.update(&source, Some(&target), None, None);

        assert_eq!(edge.path().len(), 1);
        assert!(close(edge.path()[0].p1, Point::new(55.0, 0.0)));
        assert!(close(edge.path()[0].p2, Point::new(245.0, 0.0)));
        assert!(close(edge.head().points[0], Point::new(245.0, 0.0)));
        assert!(edge.tail().is_empty());
        assert_eq!(edge.selection().len(), 1);
        assert!(edge.is_visible());
    }

    #[test]
    fn breakpoints_split_the_path() {
        let (source, target, mut edge) = pair();
        edge.set_breakpoints(vec![Point::new(150.0, 100.0)]);
        edge.update(&source, Some(&target), None, None);

        assert_eq!(edge.path().len(), 2);
        assert!(close(edge.path()[0].p2, Point::new(150.0, 100.0)));
        assert!(close(edge.path()[1].p1, Point::new(150.0, 100.0)));
        assert_eq!(edge.handles().len(), 1);
    }

    #[test]
    fn hidden_segments_are_dropped() {
        let (source, target, _) = pair();
        let points = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(150.0, 100.0),
            Point::new(300.0, 0.0),
        ];
        let lines = Edge::compute_path(&source, Some(&target), &points);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].p1, Point::new(20.0, 10.0));
    }

    #[test]
    fn update_is_idempotent() {
        let (source, target, mut edge) = pair();
        edge.set_breakpoints(vec![Point::new(150.0, 80.0), Point::new(200.0, -60.0)]);
        edge.update(&source, Some(&target), None, None);
        let first = edge.clone();
        edge.update(&source, Some(&target), None, None);
        assert_eq!(edge, first);
    }

    #[test]
    fn z_stays_above_endpoints_and_labels() {
        let (mut source, target, mut edge) = pair();
        source.set_z(3.0);
        edge.update(&source, Some(&target), None, None);
        assert!((edge.z() - (source.label_z() + EDGE_Z_STEP)).abs() < 1e-6);
    }

    #[test]
    fn equivalence_has_a_tail() {
        let (source, target, _) = pair();
        let mut edge = Edge::new("e0", EdgeKind::Equivalence, "n0", Some("n1"));
        edge.update(&source, Some(&target), None, None);
        assert!(close(edge.tail().points[0], Point::new(55.0, 0.0)));
        assert!(edge.tail().points[1..].iter().all(|point| point.x > 55.0));
    }

    #[test]
    fn drawing_edge_follows_the_cursor() {
        let source = node_at("n0", NodeKind::Concept, 0.0, 0.0);
        let mut edge = Edge::new("e0", EdgeKind::Input, "n0", None);
        edge.update(&source, None, Some(Point::new(200.0, 0.0)), None);
        assert_eq!(edge.path().len(), 1);
        assert!(close(edge.path()[0].p2, Point::new(200.0, 0.0)));

        edge.update(&source, None, Some(Point::new(10.0, 0.0)), None);
        assert!(edge.path().is_empty());
    }

    #[test]
    fn breakpoint_insertion_index() {
        let (source, target, mut edge) = pair();
        let (index, point) =
            edge.break_point_index(source.pos(), target.pos(), Point::new(150.0, 4.0));
        assert_eq!(index, 0);
        assert_eq!(point, Point::new(150.0, 0.0));

        edge.set_breakpoints(vec![Point::new(100.0, 100.0), Point::new(200.0, 100.0)]);
        let cases = [
            (Point::new(40.0, 60.0), 0),
            (Point::new(150.0, 110.0), 1),
            (Point::new(260.0, 60.0), 2),
        ];

        for (mouse, expected) in cases {
            let (index, _) = edge.break_point_index(source.pos(), target.pos(), mouse);
            assert_eq!(index, expected, "mouse at {mouse:?}");
        }
    }

    #[test]
    fn moving_breakpoint_into_a_node_sticks_to_boundary() {
        let (source, target, mut edge) = pair();
        edge.set_breakpoints(vec![Point::new(150.0, 100.0)]);
        let moved = edge
            .break_point_move_target(0, Point::new(10.0, 5.0), &source, Some(&target), OPTIONS)
            .unwrap();
        assert!(source.contains(moved));
        assert!(!source.contains(moved + Point::new(2.0, 2.0)));

        let free = edge
            .break_point_move_target(0, Point::new(150.0, 60.0), &source, Some(&target), OPTIONS)
            .unwrap();
        assert_eq!(free, Point::new(150.0, 60.0));
        assert!(edge
            .break_point_move_target(3, Point::default(), &source, Some(&target), OPTIONS)
            .is_none());
    }

    #[test]
    fn anchor_drag_snaps_to_centre_or_boundary() {
        let (source, target, edge) = pair();
        let centre = edge.anchor_move_target(&source, &target, Point::new(4.0, 3.0), OPTIONS);
        assert_eq!(centre, source.pos());

        let moved = edge.anchor_move_target(&source, &target, Point::new(40.0, 20.0), OPTIONS);
        assert!(source.contains(moved), "{moved:?}");
        assert!(moved.x > 0.0);

        let outside = edge.anchor_move_target(&source, &target, Point::new(0.0, -200.0), OPTIONS);
        assert!(source.contains(outside), "{outside:?}");
    }

    #[test]
    fn handles_are_hit_tested() {
        let (source, target, mut edge) = pair();
        edge.set_breakpoints(vec![Point::new(150.0, 100.0)]);
        edge.update(&source, Some(&target), None, None);
        assert_eq!(edge.anchor_at(Point::new(1.0, 1.0)), Some("n0"));
        assert_eq!(edge.anchor_at(Point::new(301.0, 0.0)), Some("n1"));
        assert_eq!(edge.break_point_at(Point::new(152.0, 98.0)), Some(0));
        assert_eq!(edge.break_point_at(Point::new(100.0, 0.0)), None);
    }

    #[test]
    fn overlapping_nodes_hide_the_edge() {
        let source = node_at("n0", NodeKind::Concept, 0.0, 0.0);
        let target = node_at("n1", NodeKind::Concept, 50.0, 0.0);
        let mut edge = Edge::new("e0", EdgeKind::Inclusion, "n0", Some("n1"));
        assert!(!edge.can_draw(&source, Some(&target)));
        edge.set_breakpoints(vec![Point::new(20.0, 200.0)]);
        assert!(edge.can_draw(&source, Some(&target)));
    }

    #[test]
    fn membership_label_sits_over_the_middle() {
        let source = node_at("n0", NodeKind::Individual, 0.0, 0.0);
        let target = node_at("n1", NodeKind::Concept, 300.0, 0.0);
        let mut edge = Edge::new("e0", EdgeKind::Membership, "n0", Some("n1"));
        edge.update(&source, Some(&target), None, None);
        let label = edge.label().unwrap();
        assert_eq!(label.text(), "instanceOf");
        let mid = edge.path()[0].midpoint();
        assert!(close(label.pos(), Point::new(mid.x, mid.y - 16.0)), "{:?}", label.pos());
    }

    #[test]
    fn ordinal_labels_follow_input_order() {
        let source = node_at("n0", NodeKind::Role, 0.0, 0.0);
        let target = node_at("n1", NodeKind::RoleChain, 300.0, 0.0);
        let mut edge = Edge::new("e0", EdgeKind::Input, "n0", Some("n1"));
        edge.update(&source, Some(&target), None, Some(1));
        assert_eq!(edge.label().map(Label::text), Some("2"));
        edge.update(&source, Some(&target), None, None);
        assert!(edge.label().is_none());
    }

    #[test]
    fn swap_reverses_direction() {
        let (_, _, mut edge) = pair();
        edge.set_breakpoints(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);
        edge.swap().unwrap();
        assert_eq!(edge.source(), "n1");
        assert_eq!(edge.target(), Some("n0"));
        assert_eq!(edge.breakpoints()[0], Point::new(2.0, 2.0));
        assert_eq!(edge.other("n0").unwrap(), "n1");
        assert!(edge.other("n9").is_err());
    }
}
