use crate::edge::Edge;
use crate::geometry::{Brush, Line, PainterPath, Pen, Point, Rect, Shape, snap_f};
use crate::label::{Label, measure_text_box, normalize_label_lines};
use crate::{EdgeKind, HALO_PADDING, HANDLE_HIT_SLACK, HANDLE_SIZE, Identity, LABEL_Z_STEP, NodeKind};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::SQRT_2;
use tracing::trace;

const HEXAGON_OBLIQUE: f32 = 6.0;
const FACET_OBLIQUE: f32 = 10.0;
const ROUNDED_RADIUS: f32 = 8.0;
const LABEL_FIT_PADDING: f32 = 16.0;

/// Resize handles, clockwise from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    TopLeft,
    TopMiddle,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomMiddle,
    BottomRight,
}

pub const HANDLES: [Handle; 8] = [
    Handle::TopLeft,
    Handle::TopMiddle,
    Handle::TopRight,
    Handle::MiddleLeft,
    Handle::MiddleRight,
    Handle::BottomLeft,
    Handle::BottomMiddle,
    Handle::BottomRight,
];

impl Handle {
    pub fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::MiddleLeft | Handle::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Handle::TopRight | Handle::MiddleRight | Handle::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopMiddle | Handle::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::BottomMiddle | Handle::BottomRight)
    }

    fn rect(self, bound: Rect) -> Rect {
        let size = HANDLE_SIZE;
        let center = bound.center();
        let x = if self.moves_left() {
            bound.min_x
        } else if self.moves_right() {
            bound.max_x - size
        } else {
            center.x - size / 2.0
        };
        let y = if self.moves_top() {
            bound.min_y
        } else if self.moves_bottom() {
            bound.max_y - size
        } else {
            center.y - size / 2.0
        };
        Rect::new(x, y, size, size)
    }
}

impl NodeKind {
    /// Default body size.
    pub fn default_size(self) -> (f32, f32) {
        match self {
            NodeKind::Concept => (110.0, 50.0),
            NodeKind::Role => (70.0, 50.0),
            NodeKind::Individual => (60.0, 60.0),
            NodeKind::Attribute | NodeKind::DomainRestriction | NodeKind::RangeRestriction => {
                (20.0, 20.0)
            }
            NodeKind::ValueDomain | NodeKind::Literal => (90.0, 40.0),
            NodeKind::Facet => (80.0, 40.0),
            NodeKind::PropertyAssertion => (52.0, 30.0),
            NodeKind::Union
            | NodeKind::Intersection
            | NodeKind::Complement
            | NodeKind::Enumeration
            | NodeKind::RoleChain
            | NodeKind::RoleInverse
            | NodeKind::DatatypeRestriction
            | NodeKind::DisjointUnion
            | NodeKind::HasKey => (50.0, 30.0),
        }
    }

    /// Minimum body size of interactively resizable kinds.
    pub fn minimum_size(self) -> Option<(f32, f32)> {
        match self {
            NodeKind::Concept => Some((110.0, 50.0)),
            NodeKind::Role => Some((70.0, 50.0)),
            NodeKind::Individual => Some((60.0, 60.0)),
            _ => None,
        }
    }

    pub fn is_resizable(self) -> bool {
        self.minimum_size().is_some()
    }

    /// Identities a node of this kind may assume.
    pub fn identities(self) -> &'static [Identity] {
        use Identity::*;
        match self {
            NodeKind::Concept => &[Concept, Individual],
            NodeKind::Role => &[Role, Individual],
            NodeKind::Attribute => &[Attribute, Individual],
            NodeKind::Individual => &[Individual],
            NodeKind::ValueDomain => &[ValueDomain],
            NodeKind::Literal => &[Value],
            NodeKind::DomainRestriction => &[Concept],
            NodeKind::RangeRestriction => &[Concept, ValueDomain, Neutral],
            NodeKind::Union | NodeKind::Intersection | NodeKind::Complement => {
                &[Attribute, Concept, Role, ValueDomain, Neutral]
            }
            NodeKind::DisjointUnion | NodeKind::Enumeration => &[Concept, ValueDomain, Neutral],
            NodeKind::RoleChain | NodeKind::RoleInverse => &[Role],
            NodeKind::DatatypeRestriction => &[ValueDomain],
            NodeKind::PropertyAssertion => &[RoleInstance, AttributeInstance],
            NodeKind::Facet => &[Facet],
            NodeKind::HasKey => &[Neutral],
        }
    }

    pub fn default_identity(self) -> Identity {
        if self.identities().contains(&Identity::Neutral) {
            return Identity::Neutral;
        }
        self.identities()
            .first()
            .copied()
            .unwrap_or(Identity::Unknown)
    }

    /// Initial label text, `None` for kinds drawn without a label.
    pub fn label_template(self) -> Option<&'static str> {
        match self {
            NodeKind::Concept => Some("concept"),
            NodeKind::Role => Some("role"),
            NodeKind::Attribute => Some("attribute"),
            NodeKind::Individual => Some("individual"),
            NodeKind::ValueDomain => Some("xsd:string"),
            NodeKind::Literal => Some("\"literal\""),
            NodeKind::DomainRestriction | NodeKind::RangeRestriction => Some("exists"),
            NodeKind::Union => Some("or"),
            NodeKind::Intersection => Some("and"),
            NodeKind::Complement => Some("not"),
            NodeKind::Enumeration => Some("oneOf"),
            NodeKind::RoleChain => Some("chain"),
            NodeKind::RoleInverse => Some("inv"),
            NodeKind::DatatypeRestriction => Some("data"),
            NodeKind::HasKey => Some("key"),
            NodeKind::Facet => Some("facet"),
            NodeKind::DisjointUnion | NodeKind::PropertyAssertion => None,
        }
    }

    fn label_offset(self) -> Point {
        match self {
            NodeKind::Role => Point::new(0.0, -30.0),
            NodeKind::Attribute | NodeKind::DomainRestriction | NodeKind::RangeRestriction => {
                Point::new(0.0, -22.0)
            }
            _ => Point::default(),
        }
    }

    fn label_flags(self) -> (bool, bool) {
        match self {
            NodeKind::Concept
            | NodeKind::Role
            | NodeKind::Attribute
            | NodeKind::Individual
            | NodeKind::DomainRestriction
            | NodeKind::RangeRestriction => (true, true),
            NodeKind::Literal | NodeKind::Facet => (false, true),
            _ => (false, false),
        }
    }

    fn fits_label(self) -> bool {
        matches!(self, NodeKind::ValueDomain | NodeKind::Literal | NodeKind::Facet)
    }

    fn brush(self) -> Brush {
        match self {
            NodeKind::DomainRestriction | NodeKind::DisjointUnion => Brush::solid("#000000"),
            _ => Brush::solid("#fcfcfc"),
        }
    }

    /// Boundary of this kind inscribed in `rect`.
    fn build_path(self, rect: Rect) -> PainterPath {
        let center = rect.center();
        match self {
            NodeKind::Concept | NodeKind::DomainRestriction | NodeKind::RangeRestriction => {
                PainterPath::rect(rect)
            }
            NodeKind::Attribute => PainterPath::ellipse(rect),
            NodeKind::ValueDomain | NodeKind::Literal => {
                PainterPath::rounded_rect(rect, ROUNDED_RADIUS)
            }
            NodeKind::PropertyAssertion => PainterPath::rounded_rect(rect, rect.height() / 2.0),
            NodeKind::Role => PainterPath::polygon(vec![
                Point::new(rect.min_x, center.y),
                Point::new(center.x, rect.max_y),
                Point::new(rect.max_x, center.y),
                Point::new(center.x, rect.min_y),
            ]),
            NodeKind::Individual => {
                let dx = rect.width() / (1.0 + SQRT_2) / 2.0;
                let dy = rect.height() / (1.0 + SQRT_2) / 2.0;
                PainterPath::polygon(vec![
                    Point::new(rect.min_x, center.y - dy),
                    Point::new(rect.min_x, center.y + dy),
                    Point::new(center.x - dx, rect.max_y),
                    Point::new(center.x + dx, rect.max_y),
                    Point::new(rect.max_x, center.y + dy),
                    Point::new(rect.max_x, center.y - dy),
                    Point::new(center.x + dx, rect.min_y),
                    Point::new(center.x - dx, rect.min_y),
                ])
            }
            NodeKind::Facet => PainterPath::polygon(vec![
                Point::new(rect.min_x + FACET_OBLIQUE, rect.min_y),
                Point::new(rect.max_x, rect.min_y),
                Point::new(rect.max_x - FACET_OBLIQUE, rect.max_y),
                Point::new(rect.min_x, rect.max_y),
            ]),
            NodeKind::Union
            | NodeKind::Intersection
            | NodeKind::Complement
            | NodeKind::Enumeration
            | NodeKind::RoleChain
            | NodeKind::RoleInverse
            | NodeKind::DatatypeRestriction
            | NodeKind::DisjointUnion
            | NodeKind::HasKey => PainterPath::polygon(vec![
                Point::new(rect.min_x, center.y),
                Point::new(rect.min_x + HEXAGON_OBLIQUE, rect.max_y),
                Point::new(rect.max_x - HEXAGON_OBLIQUE, rect.max_y),
                Point::new(rect.max_x, center.y),
                Point::new(rect.max_x - HEXAGON_OBLIQUE, rect.min_y),
                Point::new(rect.min_x + HEXAGON_OBLIQUE, rect.min_y),
            ]),
        }
    }
}

/// Geometry captured before and after a resize.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShapeState {
    pub bound: Rect,
    pub anchors: BTreeMap<String, Point>,
    pub label_pos: Option<Point>,
    pub label_default: Option<Point>,
}

/// Data recorded when a resize handle is pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeData {
    pub handle: Handle,
    pub press: Point,
    pub label_moved: bool,
    pub before: NodeShapeState,
}

/// Outcome of one identification step, see [`Node::identify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub identity: Identity,
    pub strong: BTreeSet<String>,
    pub remove: BTreeSet<String>,
    pub excluded: BTreeSet<String>,
}

impl Identification {
    fn new(identity: Identity, strong: BTreeSet<String>, remove: BTreeSet<String>) -> Self {
        Self {
            identity,
            strong,
            remove,
            excluded: BTreeSet::new(),
        }
    }
}

/// Read access to the node/edge arena, used by identity inference.
pub trait NodeGraph {
    fn node(&self, id: &str) -> Option<&Node>;
    fn edge(&self, id: &str) -> Option<&Edge>;

    /// Nodes at the other end of edges targeting `node` (equivalence edges count both ways).
    fn incoming_nodes(
        &self,
        node: &Node,
        edge_filter: impl Fn(&Edge) -> bool,
        node_filter: impl Fn(&Node) -> bool,
    ) -> Vec<&Node> {
        self.neighbours(node, |edge| {
            (edge.target() == Some(node.id()) || edge.kind() == EdgeKind::Equivalence)
                && edge_filter(edge)
        })
        .into_iter()
        .filter(|other| node_filter(*other))
        .collect()
    }

    fn outgoing_nodes(
        &self,
        node: &Node,
        edge_filter: impl Fn(&Edge) -> bool,
        node_filter: impl Fn(&Node) -> bool,
    ) -> Vec<&Node> {
        self.neighbours(node, |edge| {
            (edge.source() == node.id() || edge.kind() == EdgeKind::Equivalence)
                && edge_filter(edge)
        })
        .into_iter()
        .filter(|other| node_filter(*other))
        .collect()
    }

    fn neighbours(&self, node: &Node, edge_filter: impl Fn(&Edge) -> bool) -> Vec<&Node> {
        let mut found: BTreeMap<&str, &Node> = BTreeMap::new();
        for edge in node.edges().filter_map(|id| self.edge(id)) {
            if !edge_filter(edge) {
                continue;
            }
            let Ok(other) = edge.other(node.id()) else {
                continue;
            };
            if let Some(other) = self.node(other) {
                found.insert(other.id(), other);
            }
        }
        found.into_values().collect()
    }
}

/// A diagram node.
///
/// Shapes are kept in local coordinates and derived from a single bound (the
/// selection rectangle); `origin` maps them into the scene. Anchors are stored
/// in scene coordinates, keyed by edge id.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    kind: NodeKind,
    origin: Point,
    bound: Rect,
    z: f32,
    identity: Identity,
    label: Option<Label>,
    edges: BTreeSet<String>,
    anchors: BTreeMap<String, Point>,
    inputs: Vec<String>,
    background: Shape<PainterPath>,
    selection: Shape<PainterPath>,
    polygon: Shape<PainterPath>,
    valid: Option<bool>,
    path_cache: OnceCell<PainterPath>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.origin == other.origin
            && self.bound == other.bound
            && self.z == other.z
            && self.identity == other.identity
            && self.label == other.label
            && self.edges == other.edges
            && self.anchors == other.anchors
            && self.inputs == other.inputs
            && self.background == other.background
            && self.selection == other.selection
            && self.polygon == other.polygon
            && self.valid == other.valid
    }
}

impl Node {
    pub fn new(id: &str, kind: NodeKind) -> Self {
        let (width, height) = kind.default_size();
        Self::with_size(id, kind, width, height)
    }

    /// Creates a node whose body measures `width`×`height`, never less than the
    /// minimum of its kind.
    pub fn with_size(id: &str, kind: NodeKind, width: f32, height: f32) -> Self {
        let (width, height) = match kind.minimum_size() {
            Some((min_w, min_h)) => (width.max(min_w), height.max(min_h)),
            None => kind.default_size(),
        };
        let bound = Rect::from_center(
            Point::default(),
            width + 2.0 * HALO_PADDING,
            height + 2.0 * HALO_PADDING,
        );
        let label = kind.label_template().map(|template| {
            let (movable, editable) = kind.label_flags();
            Label::new(template, bound.center() + kind.label_offset(), movable, editable)
        });
        let mut node = Self {
            id: id.to_string(),
            kind,
            origin: Point::default(),
            bound,
            z: 0.0,
            identity: kind.default_identity(),
            label,
            edges: BTreeSet::new(),
            anchors: BTreeMap::new(),
            inputs: Vec::new(),
            background: Shape::new(kind.build_path(bound)),
            selection: Shape::new(kind.build_path(bound)),
            polygon: Shape::with_paint(
                kind.build_path(bound.inflate(-HALO_PADDING)),
                kind.brush(),
                Pen::default(),
            ),
            valid: None,
            path_cache: OnceCell::new(),
        };
        node.fit_to_label();
        node
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Scene position of the centre of the bounding rectangle.
    pub fn pos(&self) -> Point {
        self.origin + self.bound.center()
    }

    /// Moves the node so that its centre lands on `pos`. Anchors are left alone.
    pub fn set_pos(&mut self, pos: Point) {
        self.origin = pos - self.bound.center();
        self.invalidate();
    }

    /// Translates the node together with its anchors.
    pub fn move_by(&mut self, delta: Point) {
        self.origin += delta;
        for anchor in self.anchors.values_mut() {
            *anchor += delta;
        }
        self.invalidate();
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    pub fn set_z(&mut self, z: f32) {
        self.z = z;
    }

    pub fn label_z(&self) -> f32 {
        self.z + LABEL_Z_STEP
    }

    pub fn width(&self) -> f32 {
        self.bound.width() - 2.0 * HALO_PADDING
    }

    pub fn height(&self) -> f32 {
        self.bound.height() - 2.0 * HALO_PADDING
    }

    /// Scene bounds including the selection halo.
    pub fn bounding_rect(&self) -> Rect {
        self.bound.translated(self.origin)
    }

    /// Scene boundary of the node body, cached until the geometry changes.
    pub fn painter_path(&self) -> &PainterPath {
        self.path_cache
            .get_or_init(|| self.polygon.geometry().translated(self.origin))
    }

    pub fn background(&self) -> &Shape<PainterPath> {
        &self.background
    }

    pub fn selection(&self) -> &Shape<PainterPath> {
        &self.selection
    }

    pub fn polygon(&self) -> &Shape<PainterPath> {
        &self.polygon
    }

    pub fn contains(&self, point: Point) -> bool {
        self.painter_path().contains(point)
    }

    /// First point where `line` crosses the node boundary, starting from `line.p1`.
    pub fn intersection(&self, line: &Line) -> Option<Point> {
        self.painter_path().intersection(line)
    }

    pub fn intersections(&self, line: &Line) -> Vec<Point> {
        self.painter_path().intersections(line)
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn identities(&self) -> &'static [Identity] {
        self.kind.identities()
    }

    pub fn is_neutral_capable(&self) -> bool {
        self.identities().contains(&Identity::Neutral)
    }

    /// Sets the identity, falling back to `Unknown` when the kind does not admit it.
    /// Key nodes stay neutral.
    pub fn set_identity(&mut self, identity: Identity) {
        if self.kind == NodeKind::HasKey {
            return;
        }
        self.identity = self.admit(identity);
    }

    fn admit(&self, identity: Identity) -> Identity {
        if self.identities().contains(&identity) {
            identity
        } else {
            Identity::Unknown
        }
    }

    pub fn valid(&self) -> Option<bool> {
        self.valid
    }

    /// Highlights the background while a connection is being validated.
    pub fn set_valid(&mut self, valid: Option<bool>) {
        self.valid = valid;
        let brush = match valid {
            Some(true) => Brush::solid("#43a04780"),
            Some(false) => Brush::solid("#e5393580"),
            None => Brush::none(),
        };
        self.background.set_brush(brush);
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn label_mut(&mut self) -> Option<&mut Label> {
        self.label.as_mut()
    }

    pub fn text(&self) -> Option<&str> {
        self.label.as_ref().map(Label::text)
    }

    pub fn set_text(&mut self, text: &str) {
        if let Some(label) = self.label.as_mut() {
            label.set_text(text);
        }
        self.fit_to_label();
    }

    /// Scene position of the label centre.
    pub fn label_scene_pos(&self) -> Option<Point> {
        self.label.as_ref().map(|label| self.origin + label.pos())
    }

    pub fn set_label_scene_pos(&mut self, pos: Point) {
        let origin = self.origin;
        if let Some(label) = self.label.as_mut() {
            label.set_pos(pos - origin);
        }
    }

    pub fn label_scene_rect(&self) -> Option<Rect> {
        self.label
            .as_ref()
            .map(|label| label.bounding_rect(self.origin))
    }

    fn label_default_pos(&self) -> Point {
        self.bound.center() + self.kind.label_offset()
    }

    pub fn edges(&self) -> impl Iterator<Item = &String> {
        self.edges.iter()
    }

    pub fn has_edge(&self, edge: &str) -> bool {
        self.edges.contains(edge)
    }

    pub fn add_edge(&mut self, edge: &str) {
        self.edges.insert(edge.to_string());
    }

    /// Detaches an edge, dropping its anchor and input slot.
    pub fn remove_edge(&mut self, edge: &str) {
        self.edges.remove(edge);
        self.anchors.remove(edge);
        self.inputs.retain(|input| input != edge);
    }

    /// Attach point of `edge`; the node centre until one is set.
    pub fn anchor(&self, edge: &str) -> Point {
        self.anchors.get(edge).copied().unwrap_or_else(|| self.pos())
    }

    pub fn set_anchor(&mut self, edge: &str, pos: Point) {
        self.anchors.insert(edge.to_string(), pos);
    }

    pub fn anchors(&self) -> &BTreeMap<String, Point> {
        &self.anchors
    }

    pub fn set_anchors(&mut self, anchors: BTreeMap<String, Point>) {
        self.anchors = anchors;
    }

    /// Ordered incoming input edges of chain-like nodes.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn set_inputs(&mut self, inputs: Vec<String>) {
        self.inputs = inputs;
    }

    pub fn push_input(&mut self, edge: &str) {
        if self.kind.has_ordered_inputs() && !self.inputs.iter().any(|input| input == edge) {
            self.inputs.push(edge.to_string());
        }
    }

    pub fn input_index(&self, edge: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input == edge)
    }

    /// Scene rectangles of the resize handles; empty for fixed-size kinds.
    pub fn handles(&self) -> Vec<(Handle, Rect)> {
        if !self.kind.is_resizable() {
            return Vec::new();
        }
        let bound = self.bounding_rect();
        HANDLES
            .iter()
            .map(|handle| (*handle, handle.rect(bound)))
            .collect()
    }

    pub fn handle_at(&self, point: Point) -> Option<Handle> {
        let area = Rect::from_center(point, 2.0 * HANDLE_HIT_SLACK, 2.0 * HANDLE_HIT_SLACK);
        self.handles()
            .into_iter()
            .find(|(_, rect)| rect.intersects(&area))
            .map(|(handle, _)| handle)
    }

    pub fn shape_state(&self) -> NodeShapeState {
        NodeShapeState {
            bound: self.bound,
            anchors: self.anchors.clone(),
            label_pos: self.label.as_ref().map(Label::pos),
            label_default: self.label.as_ref().map(Label::default_pos),
        }
    }

    pub fn restore_shape_state(&mut self, state: &NodeShapeState) {
        self.set_bound(state.bound);
        self.anchors = state.anchors.clone();
        if let Some(label) = self.label.as_mut() {
            if let (Some(pos), Some(default)) = (state.label_pos, state.label_default) {
                label.relocate_with(default, true);
                label.set_pos(pos);
            }
        }
    }

    pub fn begin_resize(&self, handle: Handle, press: Point) -> ResizeData {
        ResizeData {
            handle,
            press,
            label_moved: self.label.as_ref().is_some_and(Label::is_moved),
            before: self.shape_state(),
        }
    }

    /// Recomputes the bound from the pressed handle and the cursor, clamping to the
    /// minimum size of the kind so that the side opposite the handle stays put.
    /// Returns the displacement applied to the dragged sides.
    pub fn resize(&mut self, data: &ResizeData, mouse: Point, grid: f32, snap: bool) -> Point {
        let Some((min_w, min_h)) = self.kind.minimum_size() else {
            return Point::default();
        };
        let min_w = min_w + 2.0 * HALO_PADDING;
        let min_h = min_h + 2.0 * HALO_PADDING;
        let handle = data.handle;
        let from = data.before.bound;
        let delta = mouse - data.press;
        let mut rect = from;
        let mut moved = Point::default();

        if handle.moves_left() {
            let to = snap_f(from.min_x + delta.x, grid, -HALO_PADDING, snap);
            moved.x = to - from.min_x;
            rect.min_x = to;
        } else if handle.moves_right() {
            let to = snap_f(from.max_x + delta.x, grid, HALO_PADDING, snap);
            moved.x = to - from.max_x;
            rect.max_x = to;
        }
        if handle.moves_top() {
            let to = snap_f(from.min_y + delta.y, grid, -HALO_PADDING, snap);
            moved.y = to - from.min_y;
            rect.min_y = to;
        } else if handle.moves_bottom() {
            let to = snap_f(from.max_y + delta.y, grid, HALO_PADDING, snap);
            moved.y = to - from.max_y;
            rect.max_y = to;
        }

        if rect.width() < min_w {
            let deficit = min_w - rect.width();
            if handle.moves_left() {
                moved.x -= deficit;
                rect.min_x -= deficit;
            } else {
                moved.x += deficit;
                rect.max_x += deficit;
            }
        }
        if rect.height() < min_h {
            let deficit = min_h - rect.height();
            if handle.moves_top() {
                moved.y -= deficit;
                rect.min_y -= deficit;
            } else {
                moved.y += deficit;
                rect.max_y += deficit;
            }
        }

        self.set_bound(rect);

        let center = self.pos();
        for (edge, before) in &data.before.anchors {
            let candidate = *before + moved * 0.5;
            let anchor = if self.contains(candidate) {
                candidate
            } else {
                self.intersection(&Line::new(candidate, center))
                    .unwrap_or(center)
            };
            self.anchors.insert(edge.clone(), anchor);
        }

        let default = self.label_default_pos();
        if let Some(label) = self.label.as_mut() {
            label.relocate_with(default, data.label_moved);
        }

        trace!(node = %self.id, ?handle, width = self.width(), height = self.height(), "resized node");
        moved
    }

    /// Replaces the selection bound and rebuilds every dependent shape.
    fn set_bound(&mut self, bound: Rect) {
        self.bound = bound;
        self.background
            .set_geometry(self.kind.build_path(bound));
        self.selection.set_geometry(self.kind.build_path(bound));
        self.polygon
            .set_geometry(self.kind.build_path(bound.inflate(-HALO_PADDING)));
        self.invalidate();
    }

    /// Widens datatype-like nodes so that their text fits, keeping the centre.
    fn fit_to_label(&mut self) {
        if !self.kind.fits_label() {
            return;
        }
        let Some(label) = self.label.as_ref() else {
            return;
        };
        let (default_w, default_h) = self.kind.default_size();
        let (text_w, _) = measure_text_box(&normalize_label_lines(label.text()));
        let width = (text_w + LABEL_FIT_PADDING).max(default_w);
        if (width - self.width()).abs() <= f32::EPSILON {
            return;
        }
        let bound = Rect::from_center(
            self.bound.center(),
            width + 2.0 * HALO_PADDING,
            default_h + 2.0 * HALO_PADDING,
        );
        self.set_bound(bound);
        self.clamp_anchors();
    }

    /// Pulls anchors left outside the body back onto its boundary.
    pub fn clamp_anchors(&mut self) {
        let center = self.pos();
        let outside: Vec<(String, Point)> = self
            .anchors
            .iter()
            .filter(|(_, anchor)| !self.contains(**anchor))
            .map(|(edge, anchor)| (edge.clone(), *anchor))
            .collect();
        for (edge, anchor) in outside {
            let clamped = self
                .intersection(&Line::new(anchor, center))
                .unwrap_or(center);
            self.anchors.insert(edge, clamped);
        }
    }

    /// Takes over the edges of `other`, used when a node is switched to another kind.
    pub(crate) fn adopt_connections(&mut self, other: &Node) {
        self.edges = other.edges.clone();
        self.anchors = other.anchors.clone();
        if self.kind.has_ordered_inputs() {
            self.inputs = other.inputs.clone();
        }
        self.clamp_anchors();
    }

    /// Keeps only the edges accepted by `keep`, with their anchors and input slots.
    pub(crate) fn retain_edges(&mut self, keep: impl Fn(&str) -> bool) {
        self.edges.retain(|edge| keep(edge));
        self.anchors.retain(|edge, _| keep(edge));
        self.inputs.retain(|edge| keep(edge));
    }

    pub(crate) fn rename_edges(&mut self, names: &BTreeMap<String, String>) {
        let rename = |edge: &String| names.get(edge).cloned().unwrap_or_else(|| edge.clone());
        self.edges = self.edges.iter().map(rename).collect();
        self.anchors = self
            .anchors
            .iter()
            .map(|(edge, anchor)| (rename(edge), *anchor))
            .collect();
        self.inputs = self.inputs.iter().map(rename).collect();
    }

    fn invalidate(&mut self) {
        self.path_cache.take();
    }

    /// Local identification step for nodes whose identity depends on their
    /// neighbourhood. `None` when no rule applies.
    pub fn identify<G: NodeGraph>(&self, graph: &G) -> Option<Identification> {
        match self.kind {
            NodeKind::Complement => self.identify_complement(graph),
            NodeKind::Enumeration => self.identify_enumeration(graph),
            NodeKind::RangeRestriction => self.identify_range_restriction(graph),
            NodeKind::PropertyAssertion => self.identify_property_assertion(graph),
            _ => None,
        }
    }

    fn identify_complement<G: NodeGraph>(&self, graph: &G) -> Option<Identification> {
        let membership = |edge: &Edge| edge.kind() == EdgeKind::Membership;

        let incoming = graph.incoming_nodes(self, membership, |node| {
            node.identity() == Identity::Individual
        });
        if !incoming.is_empty() {
            let identities: BTreeSet<Identity> = incoming.iter().map(|n| n.identity()).collect();
            let computed = if identities.len() == 1 && identities.contains(&Identity::Individual) {
                Identity::Concept
            } else {
                Identity::Unknown
            };
            return Some(Identification::new(
                self.admit(computed),
                self.own_id(),
                ids(&incoming),
            ));
        }

        let incoming = graph.incoming_nodes(self, membership, |node| {
            matches!(
                node.identity(),
                Identity::RoleInstance | Identity::AttributeInstance
            )
        });
        if !incoming.is_empty() {
            let identities: BTreeSet<Identity> = incoming
                .iter()
                .map(|node| match node.identity() {
                    Identity::RoleInstance => Identity::Role,
                    _ => Identity::Attribute,
                })
                .collect();
            let computed = single(&identities).unwrap_or(Identity::Unknown);
            return Some(Identification::new(
                self.admit(computed),
                self.own_id(),
                ids(&incoming),
            ));
        }

        self.identify_from_key(graph)
    }

    fn identify_enumeration<G: NodeGraph>(&self, graph: &G) -> Option<Identification> {
        let inputs = graph.incoming_nodes(
            self,
            |edge| edge.kind() == EdgeKind::Input,
            |node| matches!(node.kind(), NodeKind::Individual | NodeKind::Literal),
        );
        let identities: BTreeSet<Identity> = inputs
            .iter()
            .map(|node| {
                if node.identity() == Identity::Individual {
                    Identity::Concept
                } else {
                    Identity::ValueDomain
                }
            })
            .collect();
        let computed = if identities.is_empty() {
            Identity::Neutral
        } else {
            single(&identities).unwrap_or(Identity::Unknown)
        };

        if computed == Identity::Unknown {
            if let Some(identification) = self.identify_from_key(graph) {
                return Some(identification);
            }
        }

        let strong = if computed == Identity::Neutral {
            BTreeSet::new()
        } else {
            self.own_id()
        };
        Some(Identification::new(self.admit(computed), strong, ids(&inputs)))
    }

    fn identify_range_restriction<G: NodeGraph>(&self, graph: &G) -> Option<Identification> {
        let inputs = graph.incoming_nodes(
            self,
            |edge| edge.kind() == EdgeKind::Input,
            |node| !node.is_neutral_capable(),
        );
        let identities: BTreeSet<Identity> = inputs
            .iter()
            .filter_map(|node| match node.identity() {
                Identity::Role => Some(Identity::Concept),
                Identity::Attribute => Some(Identity::ValueDomain),
                _ => None,
            })
            .collect();
        if identities.is_empty() {
            return None;
        }
        let computed = single(&identities).unwrap_or(Identity::Unknown);
        Some(Identification::new(
            self.admit(computed),
            self.own_id(),
            ids(&inputs),
        ))
    }

    fn identify_property_assertion<G: NodeGraph>(&self, graph: &G) -> Option<Identification> {
        let inputs = graph.incoming_nodes(self, |edge| edge.kind() == EdgeKind::Input, |_| true);
        let identity = if inputs.iter().any(|node| node.kind() == NodeKind::Literal) {
            Identity::AttributeInstance
        } else {
            Identity::RoleInstance
        };
        Some(Identification::new(identity, self.own_id(), BTreeSet::new()))
    }

    /// Operators feeding a neutral key node describe classes.
    fn identify_from_key<G: NodeGraph>(&self, graph: &G) -> Option<Identification> {
        let outgoing = graph.outgoing_nodes(
            self,
            |edge| edge.kind() == EdgeKind::Input,
            |node| node.kind() == NodeKind::HasKey && node.identity() == Identity::Neutral,
        );
        if outgoing.is_empty() {
            return None;
        }
        Some(Identification::new(
            self.admit(Identity::Concept),
            self.own_id(),
            ids(&outgoing),
        ))
    }

    fn own_id(&self) -> BTreeSet<String> {
        BTreeSet::from([self.id.clone()])
    }
}

fn ids(nodes: &[&Node]) -> BTreeSet<String> {
    nodes.iter().map(|node| node.id().to_string()).collect()
}

fn single(identities: &BTreeSet<Identity>) -> Option<Identity> {
    if identities.len() == 1 {
        identities.iter().next().copied()
    } else {
        None
    }
}
