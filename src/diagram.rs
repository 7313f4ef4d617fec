use crate::command::{Command, MoveData, NodeMoveData, UndoStack};
use crate::config::DiagramConfig;
use crate::edge::{Edge, SnapOptions};
use crate::error::DiagramError;
use crate::factory::{ItemArgs, ItemFactory};
use crate::geometry::{snap, Point, Rect};
use crate::guid::Guid;
use crate::label::Label;
use crate::node::{Handle, Node, NodeGraph, ResizeData};
use crate::validator::{Profile, Validator};
use crate::{EdgeKind, Identity, ItemType, NodeKind, EDGE_PREFIX, NODE_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace, warn};

/// State of a node drag: the grabbed node and everything captured at press time.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveState {
    pub grab: String,
    pub press: Point,
    pub grab_pos: Point,
    pub start: MoveData,
}

/// Interaction state, each variant carrying only what its gesture needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DiagramMode {
    #[default]
    Idle,
    NodeAdd(NodeKind),
    EdgeAdd {
        kind: EdgeKind,
        pending: Option<Box<Edge>>,
    },
    NodeMove(MoveState),
    NodeResize {
        node: String,
        data: ResizeData,
    },
    EdgeAnchorMove {
        edge: String,
        node: String,
        before: Point,
    },
    EdgeBreakPointMove {
        edge: String,
        index: usize,
        before: Point,
    },
    LabelMove {
        item: String,
        press: Point,
        before: Point,
    },
    LabelEdit {
        node: String,
    },
    RubberBandDrag {
        origin: Point,
        current: Point,
    },
    SceneDrag {
        press: Point,
        offset: Point,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Idle,
    NodeAdd,
    EdgeAdd,
    NodeMove,
    NodeResize,
    EdgeAnchorMove,
    EdgeBreakPointMove,
    LabelMove,
    LabelEdit,
    RubberBandDrag,
    SceneDrag,
}

impl DiagramMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            DiagramMode::Idle => ModeKind::Idle,
            DiagramMode::NodeAdd(_) => ModeKind::NodeAdd,
            DiagramMode::EdgeAdd { .. } => ModeKind::EdgeAdd,
            DiagramMode::NodeMove(_) => ModeKind::NodeMove,
            DiagramMode::NodeResize { .. } => ModeKind::NodeResize,
            DiagramMode::EdgeAnchorMove { .. } => ModeKind::EdgeAnchorMove,
            DiagramMode::EdgeBreakPointMove { .. } => ModeKind::EdgeBreakPointMove,
            DiagramMode::LabelMove { .. } => ModeKind::LabelMove,
            DiagramMode::LabelEdit { .. } => ModeKind::LabelEdit,
            DiagramMode::RubberBandDrag { .. } => ModeKind::RubberBandDrag,
            DiagramMode::SceneDrag { .. } => ModeKind::SceneDrag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn control() -> Self {
        Self {
            control: true,
            ..Self::default()
        }
    }
}

/// A pointer event in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pos: Point,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self::at(Point::new(x, y))
    }

    pub fn at(pos: Point) -> Self {
        Self {
            pos,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Backspace,
    Delete,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }
}

/// Notifications collected for the embedding application, see [`Diagram::take_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramEvent {
    ModeChanged(ModeKind),
    NodeInserted(String),
    EdgeInserted(String),
    SelectionChanged,
    StatusChanged(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub kind: NodeKind,
    pub pos: Point,
    pub width: f32,
    pub height: f32,
    pub z: f32,
    pub identity: Identity,
    pub text: Option<String>,
    pub label_pos: Option<Point>,
    pub anchors: BTreeMap<String, Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: String,
    pub kind: EdgeKind,
    pub source: String,
    pub target: Option<String>,
    pub breakpoints: Vec<Point>,
    pub segments: Vec<(Point, Point)>,
    pub z: f32,
    pub text: Option<String>,
    pub visible: bool,
}

/// Read-only view of a diagram, in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSnapshot {
    pub mode: ModeKind,
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub selection: Vec<String>,
    pub status: Option<String>,
}

/// A press that becomes a drag once the pointer moves.
#[derive(Debug, Clone)]
enum PendingPress {
    Move(MoveState),
    Breakpoint(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Hit {
    Node(String),
    NodeLabel(String),
    Edge(String),
    EdgeLabel(String),
}

impl Hit {
    fn owner(&self) -> &str {
        match self {
            Hit::Node(id) | Hit::NodeLabel(id) | Hit::Edge(id) | Hit::EdgeLabel(id) => id,
        }
    }
}

/// The scene: owns every node and edge, the selection, the interaction mode
/// and the undo history.
pub struct Diagram {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
    nodes_by_label: BTreeMap<String, BTreeSet<String>>,
    selection: BTreeSet<String>,
    mode: DiagramMode,
    undostack: UndoStack,
    guid: Guid,
    factory: ItemFactory,
    validator: Box<dyn Validator>,
    config: DiagramConfig,
    paste_offset: Point,
    status: Option<String>,
    events: Vec<DiagramEvent>,
    view_offset: Point,
    press: Option<PendingPress>,
    highlighted: Option<String>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeGraph for Diagram {
    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }
}

impl Diagram {
    pub fn new() -> Self {
        Self::with_config(DiagramConfig::default())
    }

    pub fn with_config(config: DiagramConfig) -> Self {
        let paste_offset = Point::new(config.paste_offset_x, config.paste_offset_y);
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            nodes_by_label: BTreeMap::new(),
            selection: BTreeSet::new(),
            mode: DiagramMode::Idle,
            undostack: UndoStack::new(),
            guid: Guid::new(),
            factory: ItemFactory,
            validator: Box::new(Profile::owl2()),
            config,
            paste_offset,
            status: None,
            events: Vec::new(),
            view_offset: Point::default(),
            press: None,
            highlighted: None,
        }
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.set_validator(validator);
        self
    }

    pub fn set_validator(&mut self, validator: impl Validator + 'static) {
        self.validator = Box::new(validator);
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn mode(&self) -> &DiagramMode {
        &self.mode
    }

    /// Message left by the last rejected connection or swap.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<DiagramEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn view_offset(&self) -> Point {
        self.view_offset
    }

    pub fn undostack(&self) -> &UndoStack {
        &self.undostack
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Predicate nodes currently showing `text`.
    pub fn nodes_by_label(&self, text: &str) -> Vec<&Node> {
        self.nodes_by_label
            .get(text)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    pub fn snap_options(&self) -> SnapOptions {
        SnapOptions {
            grid: self.config.grid_size,
            snap: self.config.snap_to_grid,
            anchor_radius: self.config.anchor_snap_radius,
        }
    }

    fn snap(&self, point: Point) -> Point {
        snap(point, self.config.grid_size, self.config.snap_to_grid)
    }

    // Selection

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn select(&mut self, id: &str) -> Result<(), DiagramError> {
        if !self.nodes.contains_key(id) && !self.edges.contains_key(id) {
            return Err(DiagramError::MissingNode(id.to_string()));
        }
        if self.selection.insert(id.to_string()) {
            self.events.push(DiagramEvent::SelectionChanged);
        }
        Ok(())
    }

    pub fn select_only(&mut self, id: &str) {
        if self.selection.len() == 1 && self.selection.contains(id) {
            return;
        }
        self.selection.clear();
        self.selection.insert(id.to_string());
        self.events.push(DiagramEvent::SelectionChanged);
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.events.push(DiagramEvent::SelectionChanged);
        }
    }

    fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
        self.events.push(DiagramEvent::SelectionChanged);
    }

    fn select_in(&mut self, band: Rect) {
        let selected: BTreeSet<String> = self
            .nodes
            .values()
            .filter(|node| node.bounding_rect().intersects(&band))
            .map(|node| node.id().to_string())
            .collect();
        if selected != self.selection {
            self.selection = selected;
            self.events.push(DiagramEvent::SelectionChanged);
        }
    }

    // Hit testing

    fn hits_at(&self, point: Point) -> Vec<Hit> {
        let mut hits: Vec<(f32, Hit)> = Vec::new();
        for node in self.nodes.values() {
            if node.contains(point) {
                hits.push((node.z(), Hit::Node(node.id().to_string())));
            }
            if node.label_scene_rect().is_some_and(|rect| rect.contains(point)) {
                hits.push((node.label_z(), Hit::NodeLabel(node.id().to_string())));
            }
        }
        for edge in self.edges.values().filter(|edge| edge.is_visible()) {
            if edge.contains(point) {
                hits.push((edge.z(), Hit::Edge(edge.id().to_string())));
            }
            let label_hit = edge
                .label()
                .is_some_and(|label| label.bounding_rect(Point::default()).contains(point));
            if label_hit {
                hits.push((edge.label_z(), Hit::EdgeLabel(edge.id().to_string())));
            }
        }
        hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        hits.into_iter().map(|(_, hit)| hit).collect()
    }

    /// Ids of the items under `point`, topmost first.
    pub fn items_at(&self, point: Point) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for hit in self.hits_at(point) {
            if !ids.iter().any(|id| id == hit.owner()) {
                ids.push(hit.owner().to_string());
            }
        }
        ids
    }

    fn node_at(&self, point: Point) -> Option<String> {
        self.hits_at(point).into_iter().find_map(|hit| match hit {
            Hit::Node(id) => Some(id),
            _ => None,
        })
    }

    // Insertion

    /// Adds a node of `kind` centred on `pos` through the undo stack.
    pub fn add_node(&mut self, kind: NodeKind, pos: Point) -> Result<String, DiagramError> {
        let id = self.guid.next(NODE_PREFIX)?;
        let node = self
            .factory
            .create(ItemType::Node(kind), ItemArgs::new().id(&id).pos(pos))?
            .into_node()?;
        self.push(Command::NodeAdd { node });
        Ok(id)
    }

    /// Connects two nodes through the undo stack. `Ok(None)` when the validator
    /// rejects the connection; its message is left in [`Diagram::status`].
    pub fn add_edge(
        &mut self,
        kind: EdgeKind,
        source: &str,
        target: &str,
    ) -> Result<Option<String>, DiagramError> {
        for id in [source, target] {
            if !self.nodes.contains_key(id) {
                return Err(DiagramError::MissingNode(id.to_string()));
            }
        }
        let id = self.guid.next(EDGE_PREFIX)?;
        let edge = self
            .factory
            .create(
                ItemType::Edge(kind),
                ItemArgs::new().id(&id).source(source).target(target),
            )?
            .into_edge()?;
        let result = match (self.nodes.get(source), self.nodes.get(target)) {
            (Some(s), Some(t)) => self.validator.validate(self, s, &edge, t),
            _ => return Err(DiagramError::MissingNode(source.to_string())),
        };
        if !result.valid {
            warn!(kind = kind.as_str(), source, target, message = %result.message, "connection rejected");
            self.set_status(Some(result.message));
            return Ok(None);
        }
        self.push(Command::EdgeAdd { edge });
        Ok(Some(id))
    }

    /// Loads a node with an existing id, bypassing the undo stack.
    pub fn insert_node(&mut self, node: Node) -> Result<(), DiagramError> {
        self.check_free(node.id())?;
        self.guid.update(node.id())?;
        self.attach_node(node);
        Ok(())
    }

    /// Loads an edge with an existing id, bypassing the undo stack and the validator.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), DiagramError> {
        self.check_free(edge.id())?;
        let target = edge.target().ok_or(DiagramError::MissingArgument("target"))?;
        for id in [edge.source(), target] {
            if !self.nodes.contains_key(id) {
                return Err(DiagramError::MissingNode(id.to_string()));
            }
        }
        self.guid.update(edge.id())?;
        self.attach_edge(edge);
        Ok(())
    }

    fn check_free(&self, id: &str) -> Result<(), DiagramError> {
        if self.nodes.contains_key(id) || self.edges.contains_key(id) {
            return Err(DiagramError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    // Edits

    pub fn move_nodes<S: AsRef<str>>(&mut self, ids: &[S], delta: Point) -> Result<(), DiagramError> {
        let mut moved = BTreeSet::new();
        for id in ids {
            let id = id.as_ref();
            if !self.nodes.contains_key(id) {
                return Err(DiagramError::MissingNode(id.to_string()));
            }
            moved.insert(id.to_string());
        }
        if moved.is_empty() || delta == Point::default() {
            return Ok(());
        }
        let undo = self.capture_move(&moved);
        let redo = undo.translated(delta);
        self.push(Command::NodeMove { undo, redo });
        Ok(())
    }

    /// Drags `handle` of a resizable node by `delta` and commits the result.
    pub fn resize_node(&mut self, id: &str, handle: Handle, delta: Point) -> Result<(), DiagramError> {
        let (grid, snap) = (self.config.grid_size, self.config.snap_to_grid);
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DiagramError::MissingNode(id.to_string()))?;
        let Some(press) = node
            .handles()
            .into_iter()
            .find(|(candidate, _)| *candidate == handle)
            .map(|(_, rect)| rect.center())
        else {
            return Ok(());
        };
        let data = node.begin_resize(handle, press);
        node.resize(&data, press + delta, grid, snap);
        self.update_edges_of(id);
        self.finish_resize(id.to_string(), data);
        Ok(())
    }

    pub fn set_label_text(&mut self, id: &str, text: &str) -> Result<(), DiagramError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DiagramError::MissingNode(id.to_string()))?;
        let Some(label) = node.label() else {
            return Ok(());
        };
        let text = if text.trim().is_empty() {
            label.template()
        } else {
            text
        };
        if label.text() == text {
            return Ok(());
        }
        let command = label_change(node, id, label.text().to_string(), text.to_string());
        self.push(command);
        Ok(())
    }

    pub fn move_label(&mut self, item: &str, pos: Point) -> Result<(), DiagramError> {
        let before = self
            .label_pos(item)
            .ok_or_else(|| DiagramError::MissingNode(item.to_string()))?;
        if before != pos {
            self.push(Command::LabelMove {
                item: item.to_string(),
                undo: before,
                redo: pos,
            });
        }
        Ok(())
    }

    /// Adds a breakpoint on the segment closest to `pos`, returning its index.
    pub fn insert_breakpoint(&mut self, edge: &str, pos: Point) -> Result<usize, DiagramError> {
        let (index, point) = self.breakpoint_insertion(edge, pos)?;
        self.push(Command::EdgeBreakpointAdd {
            edge: edge.to_string(),
            index,
            point,
        });
        Ok(index)
    }

    pub fn remove_breakpoint(&mut self, edge: &str, index: usize) -> Result<bool, DiagramError> {
        let point = self
            .edges
            .get(edge)
            .ok_or_else(|| DiagramError::MissingEdge(edge.to_string()))?
            .breakpoints()
            .get(index)
            .copied();
        let Some(point) = point else {
            return Ok(false);
        };
        self.push(Command::EdgeBreakpointRemove {
            edge: edge.to_string(),
            index,
            point,
        });
        Ok(true)
    }

    fn breakpoint_insertion(&self, id: &str, pos: Point) -> Result<(usize, Point), DiagramError> {
        let edge = self
            .edges
            .get(id)
            .ok_or_else(|| DiagramError::MissingEdge(id.to_string()))?;
        let source = self
            .nodes
            .get(edge.source())
            .ok_or_else(|| DiagramError::MissingNode(edge.source().to_string()))?;
        let target = edge
            .target()
            .and_then(|target| self.nodes.get(target))
            .ok_or(DiagramError::MissingArgument("target"))?;
        Ok(edge.break_point_index(source.anchor(id), target.anchor(id), pos))
    }

    /// Removes nodes and edges; nodes take their incident edges with them.
    pub fn remove_items<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), DiagramError> {
        let mut node_ids = BTreeSet::new();
        let mut edge_ids = BTreeSet::new();
        for id in ids {
            let id = id.as_ref();
            if let Some(node) = self.nodes.get(id) {
                node_ids.insert(id.to_string());
                edge_ids.extend(node.edges().cloned());
            } else if self.edges.contains_key(id) {
                edge_ids.insert(id.to_string());
            } else {
                return Err(DiagramError::MissingNode(id.to_string()));
            }
        }
        if node_ids.is_empty() && edge_ids.is_empty() {
            return Ok(());
        }

        let edges: Vec<Edge> = edge_ids
            .iter()
            .filter_map(|id| self.edges.get(id))
            .cloned()
            .collect();
        let mut anchors = Vec::new();
        let mut inputs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for edge in &edges {
            for endpoint in [Some(edge.source()), edge.target()].into_iter().flatten() {
                if node_ids.contains(endpoint) {
                    continue;
                }
                let Some(node) = self.nodes.get(endpoint) else {
                    continue;
                };
                if let Some(anchor) = node.anchors().get(edge.id()) {
                    anchors.push((endpoint.to_string(), edge.id().to_string(), *anchor));
                }
                if node.kind().has_ordered_inputs() {
                    inputs
                        .entry(endpoint.to_string())
                        .or_insert_with(|| node.inputs().to_vec());
                }
            }
        }
        let nodes: Vec<Node> = node_ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .cloned()
            .collect();
        self.push(Command::ItemsRemove {
            nodes,
            edges,
            anchors,
            inputs: inputs.into_iter().collect(),
        });
        Ok(())
    }

    /// Replaces a node by one of another kind, keeping its id, position and edges.
    pub fn switch_node_kind(&mut self, id: &str, kind: NodeKind) -> Result<(), DiagramError> {
        let current = self
            .nodes
            .get(id)
            .ok_or_else(|| DiagramError::MissingNode(id.to_string()))?;
        if current.kind() == kind {
            return Ok(());
        }
        let mut args = ItemArgs::new().id(id).pos(current.pos());
        if current.kind().is_predicate() && kind.is_predicate() {
            if let Some(text) = current.text() {
                args = args.text(text);
            }
        }
        let mut node = self
            .factory
            .create(ItemType::Node(kind), args)?
            .into_node()?;
        node.set_z(current.z());
        node.adopt_connections(current);
        let undo = current.clone();
        self.push(Command::NodeSwitchTo { undo, redo: node });
        Ok(())
    }

    pub fn set_node_depth(&mut self, id: &str, z: f32) -> Result<(), DiagramError> {
        let current = self
            .nodes
            .get(id)
            .ok_or_else(|| DiagramError::MissingNode(id.to_string()))?
            .z();
        if current != z {
            self.push(Command::NodeSetDepth {
                node: id.to_string(),
                undo: current,
                redo: z,
            });
        }
        Ok(())
    }

    pub fn bring_to_front(&mut self, id: &str) -> Result<(), DiagramError> {
        let top = self
            .nodes
            .values()
            .filter(|node| node.id() != id)
            .map(Node::z)
            .fold(f32::NEG_INFINITY, f32::max);
        let z = if top.is_finite() { top + 1.0 } else { 0.0 };
        self.set_node_depth(id, z)
    }

    pub fn send_to_back(&mut self, id: &str) -> Result<(), DiagramError> {
        let bottom = self
            .nodes
            .values()
            .filter(|node| node.id() != id)
            .map(Node::z)
            .fold(f32::INFINITY, f32::min);
        let z = if bottom.is_finite() { bottom - 1.0 } else { 0.0 };
        self.set_node_depth(id, z)
    }

    /// Reorders the inputs of a chain-like node; `order` must permute the current inputs.
    pub fn change_inputs_order(&mut self, id: &str, order: Vec<String>) -> Result<(), DiagramError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DiagramError::MissingNode(id.to_string()))?;
        let current = node.inputs().to_vec();
        let expected: BTreeSet<&String> = current.iter().collect();
        if let Some(stray) = order.iter().find(|edge| !expected.contains(edge)) {
            return Err(DiagramError::NotAnEndpoint {
                node: id.to_string(),
                edge: stray.clone(),
            });
        }
        let given: BTreeSet<&String> = order.iter().collect();
        if let Some(missing) = current.iter().find(|edge| !given.contains(edge)) {
            return Err(DiagramError::MissingEdge(missing.clone()));
        }
        if order.len() != current.len() || order == current {
            return Ok(());
        }
        self.push(Command::NodeChangeInputsOrder {
            node: id.to_string(),
            undo: current,
            redo: order,
        });
        Ok(())
    }

    /// Whether the validator accepts the edge with its endpoints reversed.
    pub fn is_swap_allowed(&self, id: &str) -> Result<bool, DiagramError> {
        let edge = self
            .edges
            .get(id)
            .ok_or_else(|| DiagramError::MissingEdge(id.to_string()))?;
        let source = self
            .nodes
            .get(edge.source())
            .ok_or_else(|| DiagramError::MissingNode(edge.source().to_string()))?;
        let target = edge
            .target()
            .and_then(|target| self.nodes.get(target))
            .ok_or(DiagramError::MissingArgument("target"))?;
        Ok(self.validator.valid(self, target, edge, source))
    }

    /// Reverses an edge. `Ok(false)` when the reversed connection is not allowed.
    pub fn swap_edge(&mut self, id: &str) -> Result<bool, DiagramError> {
        if !self.is_swap_allowed(id)? {
            let kind = self.edges.get(id).map(Edge::kind).unwrap_or(EdgeKind::Inclusion);
            self.set_status(Some(format!("Swap is not allowed for this {}", kind.name())));
            return Ok(false);
        }
        let inputs = self
            .edges
            .get(id)
            .into_iter()
            .flat_map(|edge| [Some(edge.source()), edge.target()])
            .flatten()
            .filter_map(|endpoint| self.nodes.get(endpoint))
            .filter(|node| node.kind().has_ordered_inputs())
            .map(|node| (node.id().to_string(), node.inputs().to_vec()))
            .collect();
        self.push(Command::EdgeSwap {
            edge: id.to_string(),
            inputs,
        });
        Ok(true)
    }

    // History

    /// Applies `command` and records it.
    pub fn push(&mut self, command: Command) {
        command.redo(self);
        debug!(command = command.name(), "pushed command");
        self.undostack.push(command);
    }

    pub fn undo(&mut self) -> bool {
        let mut stack = std::mem::take(&mut self.undostack);
        let done = match stack.step_back() {
            Some(command) => {
                command.undo(self);
                true
            }
            None => false,
        };
        self.undostack = stack;
        done
    }

    pub fn redo(&mut self) -> bool {
        let mut stack = std::mem::take(&mut self.undostack);
        let done = match stack.step_forward() {
            Some(command) => {
                command.redo(self);
                true
            }
            None => false,
        };
        self.undostack = stack;
        done
    }

    // Mode handling

    pub fn set_mode(&mut self, mode: DiagramMode) {
        let previous = self.mode.kind();
        self.transition(previous, mode);
    }

    fn transition(&mut self, previous: ModeKind, next: DiagramMode) {
        self.mode = next;
        let kind = self.mode.kind();
        if previous != kind {
            debug!(from = ?previous, to = ?kind, "mode changed");
            self.events.push(DiagramEvent::ModeChanged(kind));
        }
    }

    /// Abandons the current gesture, restoring what it touched, and returns to Idle.
    pub fn reset_mode(&mut self) {
        self.press = None;
        let mode = std::mem::take(&mut self.mode);
        let previous = mode.kind();
        match mode {
            DiagramMode::EdgeAdd { .. } => {
                self.clear_highlight();
                self.set_status(None);
            }
            DiagramMode::NodeMove(state) => self.apply_move(&state.start),
            DiagramMode::NodeResize { node, data } => {
                if let Some(target) = self.nodes.get_mut(&node) {
                    target.restore_shape_state(&data.before);
                }
                self.update_edges_of(&node);
            }
            DiagramMode::EdgeAnchorMove { edge, node, before } => {
                if let Some(target) = self.nodes.get_mut(&node) {
                    target.set_anchor(&edge, before);
                }
                self.update_edge(&edge);
            }
            DiagramMode::EdgeBreakPointMove { edge, index, before } => {
                if let Some(target) = self.edges.get_mut(&edge) {
                    target.set_breakpoint(index, before);
                }
                self.update_edge(&edge);
            }
            DiagramMode::LabelMove { item, before, .. } => {
                self.apply_label_pos(&item, before);
            }
            DiagramMode::LabelEdit { node } => {
                if let Some(label) = self.nodes.get_mut(&node).and_then(Node::label_mut) {
                    label.cancel_edit();
                }
                self.sync_label(&node);
            }
            _ => {}
        }
        self.transition(previous, DiagramMode::Idle);
    }

    // Pointer and keyboard routing

    pub fn mouse_press(&mut self, event: PointerEvent) -> Result<(), DiagramError> {
        self.press = None;
        if matches!(self.mode, DiagramMode::LabelEdit { .. }) {
            self.commit_label_edit();
        }
        match (event.button, &self.mode) {
            (MouseButton::Middle, DiagramMode::Idle) => {
                let offset = self.view_offset;
                self.set_mode(DiagramMode::SceneDrag {
                    press: event.pos,
                    offset,
                });
            }
            (MouseButton::Left, DiagramMode::NodeAdd(kind)) => {
                let kind = *kind;
                self.insert_node_at(kind, event)?;
            }
            (MouseButton::Left, DiagramMode::EdgeAdd { kind, pending: None }) => {
                let kind = *kind;
                self.begin_edge(kind, event.pos)?;
            }
            (MouseButton::Left, DiagramMode::Idle) => {
                let next = self.press_idle(event);
                self.set_mode(next);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn mouse_move(&mut self, event: PointerEvent) {
        let pos = event.pos;
        let mode = std::mem::take(&mut self.mode);
        let previous = mode.kind();
        let next = match mode {
            DiagramMode::EdgeAdd {
                kind,
                pending: Some(edge),
            } => DiagramMode::EdgeAdd {
                kind,
                pending: Some(self.drag_edge(edge, pos)),
            },
            DiagramMode::NodeMove(state) => {
                self.drag_nodes(&state, pos);
                DiagramMode::NodeMove(state)
            }
            DiagramMode::NodeResize { node, data } => {
                let (grid, snap) = (self.config.grid_size, self.config.snap_to_grid);
                if let Some(target) = self.nodes.get_mut(&node) {
                    target.resize(&data, pos, grid, snap);
                }
                self.update_edges_of(&node);
                DiagramMode::NodeResize { node, data }
            }
            DiagramMode::EdgeAnchorMove { edge, node, before } => {
                self.drag_anchor(&edge, &node, pos);
                DiagramMode::EdgeAnchorMove { edge, node, before }
            }
            DiagramMode::EdgeBreakPointMove { edge, index, before } => {
                self.drag_breakpoint(&edge, index, pos);
                DiagramMode::EdgeBreakPointMove { edge, index, before }
            }
            DiagramMode::LabelMove { item, press, before } => {
                self.apply_label_pos(&item, before + (pos - press));
                DiagramMode::LabelMove { item, press, before }
            }
            DiagramMode::RubberBandDrag { origin, .. } => {
                self.select_in(Rect::from_points(origin, pos));
                DiagramMode::RubberBandDrag {
                    origin,
                    current: pos,
                }
            }
            DiagramMode::SceneDrag { press, offset } => {
                self.view_offset = offset + (pos - press);
                DiagramMode::SceneDrag { press, offset }
            }
            DiagramMode::Idle => match self.press.take() {
                Some(PendingPress::Move(state)) => {
                    self.drag_nodes(&state, pos);
                    DiagramMode::NodeMove(state)
                }
                Some(PendingPress::Breakpoint(edge)) => self.begin_breakpoint_drag(edge, pos),
                None => DiagramMode::Idle,
            },
            other => other,
        };
        self.transition(previous, next);
    }

    pub fn mouse_release(&mut self, event: PointerEvent) {
        self.press = None;
        let mode = std::mem::take(&mut self.mode);
        let previous = mode.kind();
        let next = match mode {
            DiagramMode::EdgeAdd {
                kind,
                pending: Some(edge),
            } => {
                self.finish_edge(*edge, event.pos);
                if event.modifiers.control || self.config.sticky_insert {
                    DiagramMode::EdgeAdd { kind, pending: None }
                } else {
                    DiagramMode::Idle
                }
            }
            DiagramMode::NodeMove(state) => {
                self.finish_move(state);
                DiagramMode::Idle
            }
            DiagramMode::NodeResize { node, data } => {
                self.finish_resize(node, data);
                DiagramMode::Idle
            }
            DiagramMode::EdgeAnchorMove { edge, node, before } => {
                let current = self
                    .nodes
                    .get(&node)
                    .and_then(|target| target.anchors().get(&edge).copied());
                if let Some(current) = current.filter(|current| *current != before) {
                    self.push(Command::EdgeAnchorMove {
                        edge,
                        node,
                        undo: before,
                        redo: current,
                    });
                }
                DiagramMode::Idle
            }
            DiagramMode::EdgeBreakPointMove { edge, index, before } => {
                let current = self
                    .edges
                    .get(&edge)
                    .and_then(|target| target.breakpoints().get(index).copied());
                if let Some(current) = current.filter(|current| *current != before) {
                    self.push(Command::EdgeBreakpointMove {
                        edge,
                        index,
                        undo: before,
                        redo: current,
                    });
                }
                DiagramMode::Idle
            }
            DiagramMode::LabelMove { item, before, .. } => {
                if let Some(current) = self.label_pos(&item).filter(|current| *current != before) {
                    self.push(Command::LabelMove {
                        item,
                        undo: before,
                        redo: current,
                    });
                }
                DiagramMode::Idle
            }
            DiagramMode::RubberBandDrag { .. } | DiagramMode::SceneDrag { .. } => DiagramMode::Idle,
            other => other,
        };
        self.transition(previous, next);
    }

    pub fn mouse_double_click(&mut self, event: PointerEvent) {
        if self.mode.kind() != ModeKind::Idle {
            return;
        }
        self.press = None;
        let Some(hit) = self.hits_at(event.pos).into_iter().next() else {
            return;
        };
        match hit {
            Hit::Node(id) | Hit::NodeLabel(id) => {
                self.begin_label_edit(&id);
            }
            Hit::Edge(id) | Hit::EdgeLabel(id) => self.add_right_angle_breakpoint(&id),
        }
    }

    pub fn key_press(&mut self, event: KeyEvent) -> Result<(), DiagramError> {
        let editing = match &self.mode {
            DiagramMode::LabelEdit { node } => Some(node.clone()),
            _ => None,
        };
        if let Some(node) = editing {
            match event.key {
                Key::Enter if event.modifiers.shift => self.edit_label(&node, |label| label.insert_text("\n")),
                Key::Enter => self.commit_label_edit(),
                Key::Escape => self.cancel_label_edit(),
                Key::Char(c) => {
                    let text = c.to_string();
                    self.edit_label(&node, |label| label.insert_text(&text));
                }
                Key::Backspace => self.edit_label(&node, Label::backspace),
                Key::Delete => {}
            }
            return Ok(());
        }

        match (self.mode.kind(), event.key) {
            (ModeKind::Idle, Key::Delete | Key::Backspace) => {
                let ids: Vec<String> = self.selection.iter().cloned().collect();
                if !ids.is_empty() {
                    self.remove_items(ids.as_slice())?;
                }
            }
            (ModeKind::Idle, Key::Escape) => self.clear_selection(),
            (_, Key::Escape) => self.reset_mode(),
            _ => {}
        }
        Ok(())
    }

    /// Keyboard focus left the scene: a running label edit is committed.
    pub fn focus_out(&mut self) {
        self.commit_label_edit();
    }

    pub fn begin_label_edit(&mut self, id: &str) -> bool {
        let started = self
            .nodes
            .get_mut(id)
            .and_then(Node::label_mut)
            .is_some_and(Label::begin_edit);
        if !started {
            return false;
        }
        self.clear_selection();
        self.set_mode(DiagramMode::LabelEdit {
            node: id.to_string(),
        });
        true
    }

    pub fn commit_label_edit(&mut self) {
        let DiagramMode::LabelEdit { node } = &self.mode else {
            return;
        };
        let node = node.clone();
        let change = self
            .nodes
            .get_mut(&node)
            .and_then(Node::label_mut)
            .and_then(Label::finish_edit);
        self.set_mode(DiagramMode::Idle);
        let command = change.and_then(|(undo, redo)| {
            let target = self.nodes.get(&node)?;
            Some(label_change(target, &node, undo, redo))
        });
        match command {
            Some(command) => self.push(command),
            None => self.sync_label(&node),
        }
    }

    /// Drops a running label edit, leaving the text it started with.
    pub fn cancel_label_edit(&mut self) {
        let DiagramMode::LabelEdit { node } = &self.mode else {
            return;
        };
        let node = node.clone();
        if let Some(label) = self.nodes.get_mut(&node).and_then(Node::label_mut) {
            label.cancel_edit();
        }
        self.set_mode(DiagramMode::Idle);
        self.sync_label(&node);
    }

    fn edit_label(&mut self, id: &str, edit: impl FnOnce(&mut Label)) {
        if let Some(label) = self.nodes.get_mut(id).and_then(Node::label_mut) {
            edit(label);
        }
    }

    /// Refits a node to its current label text and refreshes the label index.
    fn sync_label(&mut self, id: &str) {
        let text = self.nodes.get(id).and_then(Node::text).map(str::to_string);
        if let Some(text) = text {
            self.apply_node_text(id, &text);
        }
    }

    fn press_idle(&mut self, event: PointerEvent) -> DiagramMode {
        let pos = event.pos;
        for id in &self.selection {
            if let Some(edge) = self.edges.get(id) {
                if let Some(node) = edge.anchor_at(pos) {
                    let before = self.nodes.get(node).map_or(pos, |target| target.anchor(id));
                    return DiagramMode::EdgeAnchorMove {
                        edge: id.clone(),
                        node: node.to_string(),
                        before,
                    };
                }
                if let Some(index) = edge.break_point_at(pos) {
                    let before = edge.breakpoints().get(index).copied().unwrap_or(pos);
                    return DiagramMode::EdgeBreakPointMove {
                        edge: id.clone(),
                        index,
                        before,
                    };
                }
            }
            if let Some(node) = self.nodes.get(id) {
                if let Some(handle) = node.handle_at(pos) {
                    return DiagramMode::NodeResize {
                        node: id.clone(),
                        data: node.begin_resize(handle, pos),
                    };
                }
            }
        }

        let Some(hit) = self.hits_at(pos).into_iter().next() else {
            if !event.modifiers.control {
                self.clear_selection();
            }
            return DiagramMode::RubberBandDrag {
                origin: pos,
                current: pos,
            };
        };
        if event.modifiers.shift {
            if let Hit::NodeLabel(id) | Hit::EdgeLabel(id) = &hit {
                if let Some(before) = self.movable_label_pos(id) {
                    return DiagramMode::LabelMove {
                        item: id.clone(),
                        press: pos,
                        before,
                    };
                }
            }
        }

        let id = hit.owner().to_string();
        if event.modifiers.control {
            self.toggle_selection(&id);
        } else if !self.selection.contains(&id) {
            self.select_only(&id);
        }
        if !self.selection.contains(&id) {
            return DiagramMode::Idle;
        }

        if let Some(grab) = self.nodes.get(&id) {
            let grab_pos = grab.pos();
            let moved: BTreeSet<String> = self
                .selection
                .iter()
                .filter(|selected| self.nodes.contains_key(*selected))
                .cloned()
                .collect();
            self.press = Some(PendingPress::Move(MoveState {
                grab: id,
                press: pos,
                grab_pos,
                start: self.capture_move(&moved),
            }));
        } else {
            self.press = Some(PendingPress::Breakpoint(id));
        }
        DiagramMode::Idle
    }

    fn insert_node_at(&mut self, kind: NodeKind, event: PointerEvent) -> Result<(), DiagramError> {
        let pos = self.snap(event.pos);
        let id = self.add_node(kind, pos)?;
        self.select_only(&id);
        self.events.push(DiagramEvent::NodeInserted(id));
        if !(event.modifiers.control || self.config.sticky_insert) {
            self.set_mode(DiagramMode::Idle);
        }
        Ok(())
    }

    fn begin_edge(&mut self, kind: EdgeKind, pos: Point) -> Result<(), DiagramError> {
        let Some(source) = self.node_at(pos) else {
            return Ok(());
        };
        let id = self.guid.next(EDGE_PREFIX)?;
        let mut edge = self
            .factory
            .create(ItemType::Edge(kind), ItemArgs::new().id(&id).source(&source))?
            .into_edge()?;
        if let Some(node) = self.nodes.get(&source) {
            edge.update(node, None, Some(pos), None);
        }
        self.set_mode(DiagramMode::EdgeAdd {
            kind,
            pending: Some(Box::new(edge)),
        });
        Ok(())
    }

    fn drag_edge(&mut self, mut edge: Box<Edge>, pos: Point) -> Box<Edge> {
        self.clear_highlight();
        let target = self.node_at(pos);
        let verdict = match (
            self.nodes.get(edge.source()),
            target.as_deref().and_then(|id| self.nodes.get(id)),
        ) {
            (Some(source), Some(candidate)) => Some(self.validator.validate(self, source, &edge, candidate)),
            _ => None,
        };
        match (target, verdict) {
            (Some(target), Some(result)) => {
                if let Some(node) = self.nodes.get_mut(&target) {
                    node.set_valid(Some(result.valid));
                }
                self.highlighted = Some(target);
                self.set_status((!result.valid).then_some(result.message));
            }
            _ => self.set_status(None),
        }
        if let Some(source) = self.nodes.get(edge.source()) {
            edge.update(source, None, Some(pos), None);
        }
        edge
    }

    fn finish_edge(&mut self, mut edge: Edge, pos: Point) {
        self.clear_highlight();
        self.set_status(None);
        let Some(target) = self.node_at(pos) else {
            debug!(edge = edge.id(), "edge released over empty space");
            return;
        };
        let valid = match (self.nodes.get(edge.source()), self.nodes.get(&target)) {
            (Some(source), Some(candidate)) => self.validator.valid(self, source, &edge, candidate),
            _ => false,
        };
        if !valid {
            debug!(edge = edge.id(), %target, "edge released over invalid target");
            return;
        }
        edge.set_target(Some(&target));
        let id = edge.id().to_string();
        self.push(Command::EdgeAdd { edge });
        self.events.push(DiagramEvent::EdgeInserted(id));
    }

    fn clear_highlight(&mut self) {
        if let Some(id) = self.highlighted.take() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.set_valid(None);
            }
        }
    }

    fn set_status(&mut self, status: Option<String>) {
        if self.status != status {
            self.status = status.clone();
            self.events.push(DiagramEvent::StatusChanged(status));
        }
    }

    fn capture_move(&self, moved: &BTreeSet<String>) -> MoveData {
        let nodes = moved
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| {
                (
                    node.id().to_string(),
                    NodeMoveData {
                        pos: node.pos(),
                        anchors: node.anchors().clone(),
                    },
                )
            })
            .collect();
        let edges = self
            .edges
            .values()
            .filter(|edge| {
                moved.contains(edge.source()) && edge.target().is_some_and(|target| moved.contains(target))
            })
            .map(|edge| (edge.id().to_string(), edge.breakpoints().to_vec()))
            .collect();
        MoveData { nodes, edges }
    }

    fn drag_nodes(&mut self, state: &MoveState, pos: Point) {
        let grab_pos = self.snap(state.grab_pos + (pos - state.press));
        let delta = grab_pos - state.grab_pos;
        trace!(grab = %state.grab, dx = delta.x, dy = delta.y, "dragging nodes");
        self.apply_move(&state.start.translated(delta));
    }

    fn finish_move(&mut self, state: MoveState) {
        let moved: BTreeSet<String> = state.start.nodes.keys().cloned().collect();
        let redo = self.capture_move(&moved);
        if redo != state.start {
            self.push(Command::NodeMove {
                undo: state.start,
                redo,
            });
        }
    }

    fn finish_resize(&mut self, node: String, data: ResizeData) {
        let Some(current) = self.nodes.get(&node).map(Node::shape_state) else {
            return;
        };
        if current.bound != data.before.bound {
            self.push(Command::NodeResize {
                node,
                undo: data.before,
                redo: current,
            });
        }
    }

    fn drag_anchor(&mut self, edge_id: &str, node_id: &str, pos: Point) {
        let options = self.snap_options();
        let target = {
            let Some(edge) = self.edges.get(edge_id) else {
                return;
            };
            let Ok(other_id) = edge.other(node_id) else {
                return;
            };
            let (Some(node), Some(other)) = (self.nodes.get(node_id), self.nodes.get(other_id)) else {
                return;
            };
            edge.anchor_move_target(node, other, pos, options)
        };
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.set_anchor(edge_id, target);
        }
        self.update_edge(edge_id);
    }

    fn drag_breakpoint(&mut self, edge_id: &str, index: usize, pos: Point) {
        let options = self.snap_options();
        let point = {
            let Some(edge) = self.edges.get(edge_id) else {
                return;
            };
            let Some(source) = self.nodes.get(edge.source()) else {
                return;
            };
            let target = edge.target().and_then(|target| self.nodes.get(target));
            edge.break_point_move_target(index, pos, source, target, options)
        };
        if let (Some(point), Some(edge)) = (point, self.edges.get_mut(edge_id)) {
            edge.set_breakpoint(index, point);
        }
        self.update_edge(edge_id);
    }

    fn begin_breakpoint_drag(&mut self, edge: String, pos: Point) -> DiagramMode {
        let Ok((index, point)) = self.breakpoint_insertion(&edge, pos) else {
            return DiagramMode::Idle;
        };
        self.push(Command::EdgeBreakpointAdd {
            edge: edge.clone(),
            index,
            point,
        });
        self.drag_breakpoint(&edge, index, pos);
        DiagramMode::EdgeBreakPointMove {
            edge,
            index,
            before: point,
        }
    }

    fn add_right_angle_breakpoint(&mut self, id: &str) {
        let Some(edge) = self.edges.get(id) else {
            return;
        };
        if !edge.breakpoints().is_empty() {
            return;
        }
        let source = self.nodes.get(edge.source()).map(Node::pos);
        let target = edge.target().and_then(|target| self.nodes.get(target)).map(Node::pos);
        let (Some(source), Some(target)) = (source, target) else {
            return;
        };
        if source.x == target.x || source.y == target.y {
            return;
        }
        self.push(Command::EdgeBreakpointAdd {
            edge: id.to_string(),
            index: 0,
            point: Point::new(source.x, target.y),
        });
    }

    fn label_pos(&self, item: &str) -> Option<Point> {
        if let Some(node) = self.nodes.get(item) {
            return node.label_scene_pos();
        }
        self.edges.get(item).and_then(Edge::label).map(Label::pos)
    }

    fn movable_label_pos(&self, item: &str) -> Option<Point> {
        let movable = match (self.nodes.get(item), self.edges.get(item)) {
            (Some(node), _) => node.label().is_some_and(Label::is_movable),
            (None, Some(edge)) => edge.label().is_some_and(Label::is_movable),
            _ => false,
        };
        if movable {
            self.label_pos(item)
        } else {
            None
        }
    }

    // Identity propagation

    /// Recomputes the identities of the neutral-capable component around `id`.
    pub fn identify_from(&mut self, id: &str) {
        if !self.nodes.get(id).is_some_and(Node::is_neutral_capable) {
            return;
        }
        let (weak, mut strong): (BTreeSet<String>, BTreeSet<String>) = self
            .bfs(id)
            .into_iter()
            .partition(|node| self.nodes.get(node).is_some_and(Node::is_neutral_capable));

        let mut excluded = BTreeSet::new();
        for node_id in &weak {
            let Some(identification) = self.nodes.get(node_id).and_then(|node| node.identify(&*self)) else {
                continue;
            };
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.set_identity(identification.identity);
            }
            strong.extend(identification.strong);
            for removed in &identification.remove {
                strong.remove(removed);
            }
            excluded.extend(identification.excluded);
        }

        let identities: BTreeSet<Identity> = strong
            .iter()
            .filter_map(|node| self.nodes.get(node))
            .map(Node::identity)
            .collect();
        let computed = match identities.len() {
            0 => Identity::Neutral,
            1 => identities.into_iter().next().unwrap_or(Identity::Unknown),
            _ => Identity::Unknown,
        };
        trace!(start = id, identity = %computed, weak = weak.len(), "propagated identity");
        for node_id in weak
            .iter()
            .filter(|node| !strong.contains(*node) && !excluded.contains(*node))
        {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.set_identity(computed);
            }
        }
    }

    /// Nodes reachable from `start`, expanding only through neutral-capable nodes.
    fn bfs(&self, start: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([start.to_string()]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.is_neutral_capable() {
                continue;
            }
            for other in self.neighbours(node, |_| true) {
                if !visited.contains(other.id()) {
                    queue.push_back(other.id().to_string());
                }
            }
        }
        visited
    }

    fn refresh_assertion(&mut self, id: &str) {
        let identity = self
            .nodes
            .get(id)
            .filter(|node| node.kind() == NodeKind::PropertyAssertion)
            .and_then(|node| node.identify(&*self))
            .map(|identification| identification.identity);
        if let (Some(identity), Some(node)) = (identity, self.nodes.get_mut(id)) {
            node.set_identity(identity);
        }
    }

    fn refresh_endpoints(&mut self, source: &str, target: Option<&str>, added: bool) {
        for endpoint in [Some(source), target].into_iter().flatten() {
            self.refresh_assertion(endpoint);
        }
        let neutral = |diagram: &Self, id: &str| {
            diagram
                .nodes
                .get(id)
                .is_some_and(|node| node.identity() == Identity::Neutral)
        };
        let propagate = !added || target.is_some_and(|target| neutral(self, source) != neutral(self, target));
        if propagate {
            self.identify_from(source);
            if let Some(target) = target {
                self.identify_from(target);
            }
        }
        self.update_edges_of(source);
        if let Some(target) = target {
            self.update_edges_of(target);
        }
    }

    // Arena maintenance used by commands and the clipboard

    pub(crate) fn attach_node(&mut self, node: Node) {
        if let Some(previous) = self.nodes.get(node.id()) {
            unindex_label(&mut self.nodes_by_label, previous);
        }
        index_label(&mut self.nodes_by_label, &node);
        trace!(node = node.id(), kind = node.kind().as_str(), "attached node");
        self.nodes.insert(node.id().to_string(), node);
    }

    pub(crate) fn detach_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        unindex_label(&mut self.nodes_by_label, &node);
        self.selection.remove(id);
        if self.highlighted.as_deref() == Some(id) {
            self.highlighted = None;
        }
        trace!(node = id, "detached node");
        Some(node)
    }

    pub(crate) fn attach_edge(&mut self, edge: Edge) {
        let id = edge.id().to_string();
        let source = edge.source().to_string();
        let target = edge.target().map(str::to_string);
        let is_input = edge.kind() == EdgeKind::Input;
        self.edges.insert(id.clone(), edge);
        if let Some(node) = self.nodes.get_mut(&source) {
            node.add_edge(&id);
            pin_anchor(node, &id);
        }
        if let Some(node) = target.as_deref().and_then(|target| self.nodes.get_mut(target)) {
            node.add_edge(&id);
            pin_anchor(node, &id);
            if is_input {
                node.push_input(&id);
            }
        }
        trace!(edge = %id, "attached edge");
        self.refresh_endpoints(&source, target.as_deref(), true);
    }

    pub(crate) fn detach_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        for endpoint in [Some(edge.source()), edge.target()].into_iter().flatten() {
            if let Some(node) = self.nodes.get_mut(endpoint) {
                node.remove_edge(id);
            }
        }
        self.selection.remove(id);
        trace!(edge = id, "detached edge");
        self.refresh_endpoints(edge.source(), edge.target(), false);
        Some(edge)
    }

    pub(crate) fn replace_node(&mut self, node: Node) {
        let id = node.id().to_string();
        let neighbours: Vec<String> = node
            .edges()
            .filter_map(|edge| self.edges.get(edge))
            .filter_map(|edge| edge.other(&id).ok())
            .map(str::to_string)
            .collect();
        self.attach_node(node);
        self.refresh_assertion(&id);
        self.identify_from(&id);
        for neighbour in &neighbours {
            self.identify_from(neighbour);
        }
        self.update_edges_of(&id);
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub(crate) fn apply_move(&mut self, data: &MoveData) {
        for (id, state) in &data.nodes {
            let Some(node) = self.nodes.get_mut(id) else {
                warn!(node = %id, "moved node no longer in diagram");
                continue;
            };
            node.set_pos(state.pos);
            node.set_anchors(state.anchors.clone());
        }
        for (id, breakpoints) in &data.edges {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.set_breakpoints(breakpoints.clone());
            }
        }
        for id in data.nodes.keys() {
            self.update_edges_of(id);
        }
    }

    /// Recomputes the derived geometry of one committed edge.
    pub fn update_edge(&mut self, id: &str) {
        let Some(edge) = self.edges.get_mut(id) else {
            return;
        };
        let Some(source) = self.nodes.get(edge.source()) else {
            return;
        };
        let target = edge.target().and_then(|target| self.nodes.get(target));
        let ordinal = match (edge.kind(), target) {
            (EdgeKind::Input, Some(target)) => target.input_index(id),
            _ => None,
        };
        edge.update(source, target, None, ordinal);
    }

    pub fn update_edges_of(&mut self, node: &str) {
        let edges: Vec<String> = self
            .nodes
            .get(node)
            .map(|node| node.edges().cloned().collect())
            .unwrap_or_default();
        for edge in &edges {
            self.update_edge(edge);
        }
    }

    pub(crate) fn apply_node_text(&mut self, id: &str, text: &str) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        unindex_label(&mut self.nodes_by_label, node);
        node.set_text(text);
        index_label(&mut self.nodes_by_label, node);
        self.update_edges_of(id);
        true
    }

    pub(crate) fn apply_label_pos(&mut self, item: &str, pos: Point) -> bool {
        if let Some(node) = self.nodes.get_mut(item) {
            node.set_label_scene_pos(pos);
            return true;
        }
        match self.edges.get_mut(item).and_then(Edge::label_mut) {
            Some(label) => {
                label.set_pos(pos);
                true
            }
            None => false,
        }
    }

    /// Reverses an edge in place and moves its input slot to the new target.
    pub(crate) fn swap_endpoints(&mut self, id: &str) -> bool {
        let Some(edge) = self.edges.get_mut(id) else {
            return false;
        };
        if edge.swap().is_err() {
            return false;
        }
        let is_input = edge.kind() == EdgeKind::Input;
        let source = edge.source().to_string();
        let target = edge.target().map(str::to_string);
        if let Some(node) = self.nodes.get_mut(&source) {
            let inputs = node.inputs().iter().filter(|input| *input != id).cloned().collect();
            node.set_inputs(inputs);
        }
        if is_input {
            if let Some(node) = target.as_deref().and_then(|target| self.nodes.get_mut(target)) {
                node.push_input(id);
            }
        }
        self.refresh_endpoints(&source, target.as_deref(), false);
        true
    }

    pub(crate) fn next_id(&mut self, prefix: &str) -> Result<String, DiagramError> {
        self.guid.next(prefix)
    }

    pub(crate) fn max_z(&self) -> f32 {
        self.nodes.values().map(Node::z).fold(0.0, f32::max)
    }

    pub(crate) fn paste_offset(&self) -> Point {
        self.paste_offset
    }

    pub(crate) fn set_paste_offset(&mut self, offset: Point) {
        self.paste_offset = offset;
    }

    pub(crate) fn reset_paste_offset(&mut self) {
        self.paste_offset = Point::new(self.config.paste_offset_x, self.config.paste_offset_y);
    }

    // Export

    pub fn snapshot(&self) -> DiagramSnapshot {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeSnapshot {
                id: node.id().to_string(),
                kind: node.kind(),
                pos: node.pos(),
                width: node.width(),
                height: node.height(),
                z: node.z(),
                identity: node.identity(),
                text: node.text().map(str::to_string),
                label_pos: node.label_scene_pos(),
                anchors: node.anchors().clone(),
            })
            .collect();
        let edges = self
            .edges
            .values()
            .map(|edge| EdgeSnapshot {
                id: edge.id().to_string(),
                kind: edge.kind(),
                source: edge.source().to_string(),
                target: edge.target().map(str::to_string),
                breakpoints: edge.breakpoints().to_vec(),
                segments: edge.path().iter().map(|line| (line.p1, line.p2)).collect(),
                z: edge.z(),
                text: edge.label().map(|label| label.text().to_string()),
                visible: edge.is_visible(),
            })
            .collect();
        DiagramSnapshot {
            mode: self.mode.kind(),
            nodes,
            edges,
            selection: self.selection.iter().cloned().collect(),
            status: self.status.clone(),
        }
    }
}

/// Stores the centre as the explicit anchor of a newly attached edge.
fn label_change(node: &Node, id: &str, undo: String, redo: String) -> Command {
    let mut changed = node.clone();
    changed.set_text(&redo);
    Command::LabelChange {
        node: id.to_string(),
        undo,
        redo,
        undo_shape: node.shape_state(),
        redo_shape: changed.shape_state(),
    }
}

fn pin_anchor(node: &mut Node, edge: &str) {
    if !node.anchors().contains_key(edge) {
        let pos = node.pos();
        node.set_anchor(edge, pos);
    }
}

fn index_label(index: &mut BTreeMap<String, BTreeSet<String>>, node: &Node) {
    if !node.kind().is_predicate() {
        return;
    }
    if let Some(text) = node.text() {
        index
            .entry(text.to_string())
            .or_default()
            .insert(node.id().to_string());
    }
}

fn unindex_label(index: &mut BTreeMap<String, BTreeSet<String>>, node: &Node) {
    let Some(text) = node.text() else {
        return;
    };
    if let Some(ids) = index.get_mut(text) {
        ids.remove(node.id());
        if ids.is_empty() {
            index.remove(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::PermissiveValidator;

    fn permissive() -> Diagram {
        Diagram::new().with_validator(PermissiveValidator)
    }

    #[test]
    fn modes_report_their_kind() {
        let cases = [
            (DiagramMode::Idle, ModeKind::Idle),
            (DiagramMode::NodeAdd(NodeKind::Concept), ModeKind::NodeAdd),
            (
                DiagramMode::EdgeAdd {
                    kind: EdgeKind::Input,
                    pending: None,
                },
                ModeKind::EdgeAdd,
            ),
            (
                DiagramMode::LabelEdit { node: "n0".into() },
                ModeKind::LabelEdit,
            ),
        ];

        for (mode, expected) in cases {
            assert_eq!(mode.kind(), expected, "{mode:?}");
        }
    }

    #[test]
    fn node_add_mode_inserts_and_returns_to_idle() {
        let mut diagram = Diagram::new();
        diagram.set_mode(DiagramMode::NodeAdd(NodeKind::Concept));
        diagram.mouse_press(PointerEvent::new(13.0, 27.0)).unwrap();

        let node = diagram.node("n0").unwrap();
        assert_eq!(node.pos(), Point::new(10.0, 30.0));
        assert_eq!(diagram.mode(), &DiagramMode::Idle);
        assert!(diagram.is_selected("n0"));
        let events = diagram.take_events();
        assert!(events.contains(&DiagramEvent::NodeInserted("n0".into())));
        assert_eq!(events.last(), Some(&DiagramEvent::ModeChanged(ModeKind::Idle)));
    }

    #[test]
    fn control_keeps_node_add_mode() {
        let mut diagram = Diagram::new();
        diagram.set_mode(DiagramMode::NodeAdd(NodeKind::Role));
        let press = PointerEvent::new(0.0, 0.0).with_modifiers(Modifiers::control());
        diagram.mouse_press(press).unwrap();
        assert_eq!(diagram.mode().kind(), ModeKind::NodeAdd);
    }

    #[test]
    fn edge_add_commits_over_valid_target() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Concept, Point::new(300.0, 0.0)).unwrap();
        diagram.set_mode(DiagramMode::EdgeAdd {
            kind: EdgeKind::Inclusion,
            pending: None,
        });

        diagram.mouse_press(PointerEvent::new(0.0, 0.0)).unwrap();
        diagram.mouse_move(PointerEvent::new(150.0, 0.0));
        diagram.mouse_move(PointerEvent::new(300.0, 0.0));
        assert_eq!(diagram.node(&b).unwrap().valid(), Some(true));
        diagram.mouse_release(PointerEvent::new(300.0, 0.0));

        let edge = diagram.edge("e0").unwrap();
        assert_eq!((edge.source(), edge.target()), (a.as_str(), Some(b.as_str())));
        assert_eq!(diagram.node(&b).unwrap().valid(), None);
        assert_eq!(diagram.mode(), &DiagramMode::Idle);
    }

    #[test]
    fn edge_add_over_invalid_target_is_discarded() {
        let mut diagram = Diagram::new();
        diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        diagram.add_node(NodeKind::Role, Point::new(300.0, 0.0)).unwrap();
        diagram.set_mode(DiagramMode::EdgeAdd {
            kind: EdgeKind::Inclusion,
            pending: None,
        });

        diagram.mouse_press(PointerEvent::new(0.0, 0.0)).unwrap();
        diagram.mouse_move(PointerEvent::new(300.0, 0.0));
        assert_eq!(
            diagram.status(),
            Some("Type mismatch: inclusion between Concept and Role")
        );
        diagram.mouse_release(PointerEvent::new(300.0, 0.0));

        assert_eq!(diagram.edges().count(), 0);
        assert_eq!(diagram.status(), None);
        assert_eq!(diagram.undostack().len(), 2);
    }

    #[test]
    fn pressing_empty_canvas_starts_rubber_band() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        diagram.add_node(NodeKind::Concept, Point::new(400.0, 0.0)).unwrap();

        diagram.mouse_press(PointerEvent::new(-100.0, -100.0)).unwrap();
        diagram.mouse_move(PointerEvent::new(20.0, 20.0));
        assert_eq!(diagram.mode().kind(), ModeKind::RubberBandDrag);
        diagram.mouse_release(PointerEvent::new(20.0, 20.0));

        assert_eq!(diagram.selection().iter().collect::<Vec<_>>(), vec![&a]);
        assert_eq!(diagram.mode(), &DiagramMode::Idle);
    }

    #[test]
    fn dragging_a_node_commits_one_move() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();

        diagram.mouse_press(PointerEvent::new(5.0, 5.0)).unwrap();
        diagram.mouse_move(PointerEvent::new(30.0, 5.0));
        diagram.mouse_move(PointerEvent::new(56.0, 24.0));
        diagram.mouse_release(PointerEvent::new(56.0, 24.0));

        assert_eq!(diagram.node(&a).unwrap().pos(), Point::new(50.0, 20.0));
        assert_eq!(diagram.undostack().undo_text(), Some("move nodes"));
        assert!(diagram.undo());
        assert_eq!(diagram.node(&a).unwrap().pos(), Point::new(0.0, 0.0));
    }

    #[test]
    fn click_without_drag_pushes_nothing() {
        let mut diagram = permissive();
        diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        diagram.mouse_press(PointerEvent::new(0.0, 0.0)).unwrap();
        diagram.mouse_release(PointerEvent::new(0.0, 0.0));
        assert_eq!(diagram.undostack().len(), 1);
    }

    #[test]
    fn escape_restores_dragged_nodes() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        diagram.mouse_press(PointerEvent::new(0.0, 0.0)).unwrap();
        diagram.mouse_move(PointerEvent::new(100.0, 0.0));
        diagram.key_press(KeyEvent::new(Key::Escape)).unwrap();

        assert_eq!(diagram.node(&a).unwrap().pos(), Point::new(0.0, 0.0));
        assert_eq!(diagram.mode(), &DiagramMode::Idle);
    }

    #[test]
    fn label_edit_commits_on_enter() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        diagram.mouse_double_click(PointerEvent::new(0.0, 0.0));
        assert_eq!(diagram.mode().kind(), ModeKind::LabelEdit);

        for c in "Person".chars() {
            diagram.key_press(KeyEvent::new(Key::Char(c))).unwrap();
        }
        diagram.key_press(KeyEvent::new(Key::Enter)).unwrap();

        assert_eq!(diagram.node(&a).unwrap().text(), Some("Person"));
        assert_eq!(diagram.nodes_by_label("Person").len(), 1);
        assert_eq!(diagram.undostack().undo_text(), Some("change label"));

        diagram.undo();
        assert_eq!(diagram.node(&a).unwrap().text(), Some("concept"));
        assert!(diagram.nodes_by_label("Person").is_empty());
    }

    #[test]
    fn emptied_label_reverts_to_template() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        diagram.set_label_text(&a, "Person").unwrap();
        assert!(diagram.begin_label_edit(&a));
        diagram.key_press(KeyEvent::new(Key::Backspace)).unwrap();
        diagram.focus_out();

        assert_eq!(diagram.node(&a).unwrap().text(), Some("concept"));
        assert_eq!(diagram.mode(), &DiagramMode::Idle);
    }

    #[test]
    fn escape_cancels_label_edit() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let pushed = diagram.undostack().len();
        assert!(diagram.begin_label_edit(&a));
        for c in "Person".chars() {
            diagram.key_press(KeyEvent::new(Key::Char(c))).unwrap();
        }
        diagram.key_press(KeyEvent::new(Key::Escape)).unwrap();

        assert_eq!(diagram.node(&a).unwrap().text(), Some("concept"));
        assert_eq!(diagram.mode(), &DiagramMode::Idle);
        assert_eq!(diagram.undostack().len(), pushed);
        assert!(diagram.nodes_by_label("Person").is_empty());
    }

    #[test]
    fn label_change_undo_restores_clamped_anchor() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Literal, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Enumeration, Point::new(600.0, 0.0)).unwrap();
        let e = diagram.add_edge(EdgeKind::Input, &a, &b).unwrap().unwrap();
        diagram
            .set_label_text(&a, "\"a rather long literal value\"^^xsd:string")
            .unwrap();
        let wide = diagram.node(&a).unwrap().width();
        assert!(wide > 120.0, "{wide}");

        let near_edge = Point::new(wide / 2.0 - 5.0, 0.0);
        diagram.push(Command::EdgeAnchorMove {
            edge: e.clone(),
            node: a.clone(),
            undo: Point::new(0.0, 0.0),
            redo: near_edge,
        });
        diagram.set_label_text(&a, "x").unwrap();
        let clamped = diagram.node(&a).unwrap().anchor(&e);
        assert!(clamped.x < near_edge.x, "{clamped:?}");

        diagram.undo();
        let node = diagram.node(&a).unwrap();
        assert_eq!(node.width(), wide);
        assert_eq!(node.anchor(&e), near_edge);

        diagram.redo();
        assert_eq!(diagram.node(&a).unwrap().anchor(&e), clamped);
    }

    #[test]
    fn delete_key_removes_selection_with_edges() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Concept, Point::new(300.0, 0.0)).unwrap();
        let e = diagram.add_edge(EdgeKind::Inclusion, &a, &b).unwrap().unwrap();
        diagram.select(&a).unwrap();

        diagram.key_press(KeyEvent::new(Key::Delete)).unwrap();
        assert!(diagram.node(&a).is_none());
        assert!(diagram.edge(&e).is_none());
        assert!(!diagram.node(&b).unwrap().has_edge(&e));

        diagram.undo();
        assert!(diagram.node(&a).unwrap().has_edge(&e));
        assert!(diagram.node(&b).unwrap().has_edge(&e));
        assert_eq!(diagram.edge(&e).unwrap().target(), Some(b.as_str()));
    }

    #[test]
    fn double_click_on_edge_adds_right_angle_breakpoint() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Concept, Point::new(300.0, 200.0)).unwrap();
        let e = diagram.add_edge(EdgeKind::Inclusion, &a, &b).unwrap().unwrap();

        diagram.mouse_double_click(PointerEvent::new(150.0, 100.0));
        assert_eq!(diagram.edge(&e).unwrap().breakpoints(), &[Point::new(0.0, 200.0)]);
    }

    #[test]
    fn enumeration_of_individuals_becomes_concept() {
        let mut diagram = Diagram::new();
        let enumeration = diagram.add_node(NodeKind::Enumeration, Point::new(0.0, 0.0)).unwrap();
        let union = diagram.add_node(NodeKind::Union, Point::new(200.0, 0.0)).unwrap();
        let individual = diagram.add_node(NodeKind::Individual, Point::new(-200.0, 0.0)).unwrap();
        diagram.add_edge(EdgeKind::Input, &enumeration, &union).unwrap().unwrap();
        assert_eq!(diagram.node(&union).unwrap().identity(), Identity::Neutral);

        let e = diagram.add_edge(EdgeKind::Input, &individual, &enumeration).unwrap().unwrap();
        assert_eq!(diagram.node(&enumeration).unwrap().identity(), Identity::Concept);
        assert_eq!(diagram.node(&union).unwrap().identity(), Identity::Concept);

        diagram.remove_items(&[e]).unwrap();
        assert_eq!(diagram.node(&enumeration).unwrap().identity(), Identity::Neutral);
        assert_eq!(diagram.node(&union).unwrap().identity(), Identity::Neutral);
    }

    #[test]
    fn swap_requires_validator_approval() {
        let mut diagram = Diagram::new();
        let concept = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let complement = diagram.add_node(NodeKind::Complement, Point::new(200.0, 0.0)).unwrap();
        let e = diagram.add_edge(EdgeKind::Input, &concept, &complement).unwrap().unwrap();

        assert!(!diagram.swap_edge(&e).unwrap());
        assert!(diagram.status().is_some());
        assert_eq!(diagram.edge(&e).unwrap().source(), concept.as_str());
    }

    #[test]
    fn switching_kind_keeps_id_and_edges() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Union, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Concept, Point::new(200.0, 0.0)).unwrap();
        let e = diagram.add_edge(EdgeKind::Inclusion, &a, &b).unwrap().unwrap();

        diagram.switch_node_kind(&a, NodeKind::Intersection).unwrap();
        let node = diagram.node(&a).unwrap();
        assert_eq!(node.kind(), NodeKind::Intersection);
        assert!(node.has_edge(&e));
        assert_eq!(node.pos(), Point::new(0.0, 0.0));

        diagram.undo();
        assert_eq!(diagram.node(&a).unwrap().kind(), NodeKind::Union);
    }

    #[test]
    fn depth_changes_are_undoable() {
        let mut diagram = permissive();
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Concept, Point::new(10.0, 0.0)).unwrap();
        diagram.bring_to_front(&a).unwrap();
        assert_eq!(diagram.items_at(Point::new(5.0, 0.0)).first(), Some(&a));

        diagram.undo();
        diagram.send_to_back(&b).unwrap();
        assert_eq!(diagram.node(&b).unwrap().z(), -1.0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut diagram = permissive();
        diagram.insert_node(Node::new("n4", NodeKind::Concept)).unwrap();
        assert_eq!(
            diagram.insert_node(Node::new("n4", NodeKind::Role)),
            Err(DiagramError::DuplicateId("n4".into()))
        );
        let id = diagram.add_node(NodeKind::Concept, Point::default()).unwrap();
        assert_eq!(id, "n5");
    }

    #[test]
    fn middle_button_pans_the_view() {
        let mut diagram = permissive();
        let press = PointerEvent::new(0.0, 0.0).with_button(MouseButton::Middle);
        diagram.mouse_press(press).unwrap();
        diagram.mouse_move(PointerEvent::new(30.0, -10.0));
        diagram.mouse_release(PointerEvent::new(30.0, -10.0));
        assert_eq!(diagram.view_offset(), Point::new(30.0, -10.0));
        assert_eq!(diagram.nodes().count(), 0);
    }
}
