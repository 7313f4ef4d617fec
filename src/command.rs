use crate::diagram::Diagram;
use crate::edge::Edge;
use crate::geometry::Point;
use crate::node::{Node, NodeShapeState};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Position and anchors of one node taking part in a move.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMoveData {
    pub pos: Point,
    pub anchors: BTreeMap<String, Point>,
}

/// Everything a move touches: the moved nodes and the edges travelling with them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoveData {
    pub nodes: BTreeMap<String, NodeMoveData>,
    pub edges: BTreeMap<String, Vec<Point>>,
}

impl MoveData {
    pub fn translated(&self, delta: Point) -> MoveData {
        let nodes = self
            .nodes
            .iter()
            .map(|(id, data)| {
                let anchors = data
                    .anchors
                    .iter()
                    .map(|(edge, anchor)| (edge.clone(), *anchor + delta))
                    .collect();
                (
                    id.clone(),
                    NodeMoveData {
                        pos: data.pos + delta,
                        anchors,
                    },
                )
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|(id, points)| (id.clone(), points.iter().map(|point| *point + delta).collect()))
            .collect();
        MoveData { nodes, edges }
    }
}

/// A committed, reversible mutation of a diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NodeAdd {
        node: Node,
    },
    ItemsAdd {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    },
    /// Nodes and edges removed together. `anchors` and `inputs` hold what the
    /// surviving endpoints knew about the removed edges.
    ItemsRemove {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        anchors: Vec<(String, String, Point)>,
        inputs: Vec<(String, Vec<String>)>,
    },
    EdgeAdd {
        edge: Edge,
    },
    NodeMove {
        undo: MoveData,
        redo: MoveData,
    },
    NodeResize {
        node: String,
        undo: NodeShapeState,
        redo: NodeShapeState,
    },
    NodeSetDepth {
        node: String,
        undo: f32,
        redo: f32,
    },
    NodeSwitchTo {
        undo: Node,
        redo: Node,
    },
    NodeChangeInputsOrder {
        node: String,
        undo: Vec<String>,
        redo: Vec<String>,
    },
    EdgeAnchorMove {
        edge: String,
        node: String,
        undo: Point,
        redo: Point,
    },
    EdgeBreakpointAdd {
        edge: String,
        index: usize,
        point: Point,
    },
    EdgeBreakpointMove {
        edge: String,
        index: usize,
        undo: Point,
        redo: Point,
    },
    EdgeBreakpointRemove {
        edge: String,
        index: usize,
        point: Point,
    },
    EdgeSwap {
        edge: String,
        inputs: Vec<(String, Vec<String>)>,
    },
    /// Datatype-like nodes refit to their text, so the shape is kept on
    /// both sides of the change.
    LabelChange {
        node: String,
        undo: String,
        redo: String,
        undo_shape: NodeShapeState,
        redo_shape: NodeShapeState,
    },
    LabelMove {
        item: String,
        undo: Point,
        redo: Point,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::NodeAdd { .. } => "add node",
            Command::ItemsAdd { .. } => "add items",
            Command::ItemsRemove { .. } => "remove items",
            Command::EdgeAdd { .. } => "add edge",
            Command::NodeMove { .. } => "move nodes",
            Command::NodeResize { .. } => "resize node",
            Command::NodeSetDepth { .. } => "change depth",
            Command::NodeSwitchTo { .. } => "switch node",
            Command::NodeChangeInputsOrder { .. } => "change inputs order",
            Command::EdgeAnchorMove { .. } => "move anchor",
            Command::EdgeBreakpointAdd { .. } => "add breakpoint",
            Command::EdgeBreakpointMove { .. } => "move breakpoint",
            Command::EdgeBreakpointRemove { .. } => "remove breakpoint",
            Command::EdgeSwap { .. } => "swap edge",
            Command::LabelChange { .. } => "change label",
            Command::LabelMove { .. } => "move label",
        }
    }

    pub fn redo(&self, diagram: &mut Diagram) {
        debug!(command = self.name(), "redo");
        match self {
            Command::NodeAdd { node } => diagram.attach_node(node.clone()),
            Command::ItemsAdd { nodes, edges } => {
                for node in nodes {
                    diagram.attach_node(node.clone());
                }
                for edge in edges {
                    diagram.attach_edge(edge.clone());
                }
            }
            Command::ItemsRemove { nodes, edges, .. } => {
                for edge in edges {
                    diagram.detach_edge(edge.id());
                }
                for node in nodes {
                    diagram.detach_node(node.id());
                }
            }
            Command::EdgeAdd { edge } => diagram.attach_edge(edge.clone()),
            Command::NodeMove { redo, .. } => diagram.apply_move(redo),
            Command::NodeResize { node, redo, .. } => apply_shape(diagram, node, redo),
            Command::NodeSetDepth { node, redo, .. } => apply_depth(diagram, node, *redo),
            Command::NodeSwitchTo { redo, .. } => diagram.replace_node(redo.clone()),
            Command::NodeChangeInputsOrder { node, redo, .. } => apply_inputs(diagram, node, redo),
            Command::EdgeAnchorMove { edge, node, redo, .. } => apply_anchor(diagram, edge, node, *redo),
            Command::EdgeBreakpointAdd { edge, index, point } => {
                let Some(target) = target_edge(diagram, edge, self) else {
                    return;
                };
                target.insert_breakpoint(*index, *point);
                diagram.update_edge(edge);
            }
            Command::EdgeBreakpointMove { edge, index, redo, .. } => {
                apply_breakpoint(diagram, edge, *index, *redo, self)
            }
            Command::EdgeBreakpointRemove { edge, index, .. } => {
                let Some(target) = target_edge(diagram, edge, self) else {
                    return;
                };
                target.remove_breakpoint(*index);
                diagram.update_edge(edge);
            }
            Command::EdgeSwap { edge, .. } => {
                if !diagram.swap_endpoints(edge) {
                    warn!(command = self.name(), %edge, "edge no longer in diagram");
                }
            }
            Command::LabelChange {
                node, redo, redo_shape, ..
            } => apply_text(diagram, node, redo, redo_shape, self),
            Command::LabelMove { item, redo, .. } => apply_label_pos(diagram, item, *redo, self),
        }
    }

    pub fn undo(&self, diagram: &mut Diagram) {
        debug!(command = self.name(), "undo");
        match self {
            Command::NodeAdd { node } => {
                diagram.detach_node(node.id());
            }
            Command::ItemsAdd { nodes, edges } => {
                for edge in edges {
                    diagram.detach_edge(edge.id());
                }
                for node in nodes {
                    diagram.detach_node(node.id());
                }
            }
            Command::ItemsRemove {
                nodes,
                edges,
                anchors,
                inputs,
            } => {
                for node in nodes {
                    diagram.attach_node(node.clone());
                }
                for edge in edges {
                    diagram.attach_edge(edge.clone());
                }
                for (node, edge, anchor) in anchors {
                    if let Some(target) = diagram.node_mut(node) {
                        target.set_anchor(edge, *anchor);
                    }
                }
                for (node, order) in inputs {
                    apply_inputs(diagram, node, order);
                }
                for edge in edges {
                    diagram.update_edge(edge.id());
                }
            }
            Command::EdgeAdd { edge } => {
                diagram.detach_edge(edge.id());
            }
            Command::NodeMove { undo, .. } => diagram.apply_move(undo),
            Command::NodeResize { node, undo, .. } => apply_shape(diagram, node, undo),
            Command::NodeSetDepth { node, undo, .. } => apply_depth(diagram, node, *undo),
            Command::NodeSwitchTo { undo, .. } => diagram.replace_node(undo.clone()),
            Command::NodeChangeInputsOrder { node, undo, .. } => apply_inputs(diagram, node, undo),
            Command::EdgeAnchorMove { edge, node, undo, .. } => apply_anchor(diagram, edge, node, *undo),
            Command::EdgeBreakpointAdd { edge, index, .. } => {
                let Some(target) = target_edge(diagram, edge, self) else {
                    return;
                };
                target.remove_breakpoint(*index);
                diagram.update_edge(edge);
            }
            Command::EdgeBreakpointMove { edge, index, undo, .. } => {
                apply_breakpoint(diagram, edge, *index, *undo, self)
            }
            Command::EdgeBreakpointRemove { edge, index, point } => {
                let Some(target) = target_edge(diagram, edge, self) else {
                    return;
                };
                target.insert_breakpoint(*index, *point);
                diagram.update_edge(edge);
            }
            Command::EdgeSwap { edge, inputs } => {
                if !diagram.swap_endpoints(edge) {
                    warn!(command = self.name(), %edge, "edge no longer in diagram");
                    return;
                }
                for (node, order) in inputs {
                    apply_inputs(diagram, node, order);
                }
            }
            Command::LabelChange {
                node, undo, undo_shape, ..
            } => apply_text(diagram, node, undo, undo_shape, self),
            Command::LabelMove { item, undo, .. } => apply_label_pos(diagram, item, *undo, self),
        }
    }
}

fn target_edge<'a>(diagram: &'a mut Diagram, edge: &str, command: &Command) -> Option<&'a mut Edge> {
    let target = diagram.edge_mut(edge);
    if target.is_none() {
        warn!(command = command.name(), edge, "edge no longer in diagram");
    }
    target
}

fn target_node<'a>(diagram: &'a mut Diagram, node: &str, command: &str) -> Option<&'a mut Node> {
    let target = diagram.node_mut(node);
    if target.is_none() {
        warn!(command, node, "node no longer in diagram");
    }
    target
}

fn apply_shape(diagram: &mut Diagram, id: &str, state: &NodeShapeState) {
    let Some(node) = target_node(diagram, id, "resize node") else {
        return;
    };
    node.restore_shape_state(state);
    diagram.update_edges_of(id);
}

fn apply_depth(diagram: &mut Diagram, id: &str, z: f32) {
    let Some(node) = target_node(diagram, id, "change depth") else {
        return;
    };
    node.set_z(z);
    diagram.update_edges_of(id);
}

fn apply_inputs(diagram: &mut Diagram, id: &str, order: &[String]) {
    let Some(node) = target_node(diagram, id, "change inputs order") else {
        return;
    };
    node.set_inputs(order.to_vec());
    diagram.update_edges_of(id);
}

fn apply_anchor(diagram: &mut Diagram, edge: &str, id: &str, anchor: Point) {
    let Some(node) = target_node(diagram, id, "move anchor") else {
        return;
    };
    node.set_anchor(edge, anchor);
    diagram.update_edge(edge);
}

fn apply_breakpoint(diagram: &mut Diagram, edge: &str, index: usize, point: Point, command: &Command) {
    let Some(target) = target_edge(diagram, edge, command) else {
        return;
    };
    target.set_breakpoint(index, point);
    diagram.update_edge(edge);
}

fn apply_text(
    diagram: &mut Diagram,
    node: &str,
    text: &str,
    shape: &NodeShapeState,
    command: &Command,
) {
    if !diagram.apply_node_text(node, text) {
        warn!(command = command.name(), node, "node no longer in diagram");
        return;
    }
    if let Some(target) = diagram.node_mut(node) {
        target.restore_shape_state(shape);
    }
    diagram.update_edges_of(node);
}

fn apply_label_pos(diagram: &mut Diagram, item: &str, pos: Point, command: &Command) {
    if !diagram.apply_label_pos(item, pos) {
        warn!(command = command.name(), item, "label owner no longer in diagram");
    }
}

/// Linear command history with a clean marker.
#[derive(Debug, Clone)]
pub struct UndoStack {
    commands: Vec<Command>,
    index: usize,
    clean: Option<usize>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            index: 0,
            clean: Some(0),
        }
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an already applied command, dropping anything that could be redone.
    pub fn push(&mut self, command: Command) {
        self.commands.truncate(self.index);
        if self.clean.is_some_and(|clean| clean > self.index) {
            self.clean = None;
        }
        self.commands.push(command);
        self.index += 1;
    }

    pub(crate) fn step_back(&mut self) -> Option<&Command> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.commands.get(self.index)
    }

    pub(crate) fn step_forward(&mut self) -> Option<&Command> {
        let command = self.commands.get(self.index)?;
        self.index += 1;
        Some(command)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.commands.len()
    }

    pub fn undo_text(&self) -> Option<&'static str> {
        self.index
            .checked_sub(1)
            .and_then(|index| self.commands.get(index))
            .map(Command::name)
    }

    pub fn redo_text(&self) -> Option<&'static str> {
        self.commands.get(self.index).map(Command::name)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_clean(&self) -> bool {
        self.clean == Some(self.index)
    }

    pub fn set_clean(&mut self) {
        self.clean = Some(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    fn add(id: &str) -> Command {
        Command::NodeAdd {
            node: Node::new(id, NodeKind::Concept),
        }
    }

    #[test]
    fn push_truncates_redo_tail() {
        let mut stack = UndoStack::new();
        stack.push(add("n0"));
        stack.push(add("n1"));
        assert!(stack.step_back().is_some());
        assert!(stack.can_redo());

        stack.push(add("n2"));
        assert_eq!(stack.len(), 2);
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_text(), Some("add node"));
    }

    #[test]
    fn clean_marker_follows_index() {
        let mut stack = UndoStack::new();
        assert!(stack.is_clean());
        stack.push(add("n0"));
        assert!(!stack.is_clean());
        stack.set_clean();
        stack.push(add("n1"));
        stack.step_back();
        assert!(stack.is_clean());

        stack.step_back();
        stack.push(add("n2"));
        assert!(!stack.is_clean());
        stack.step_back();
        assert!(!stack.is_clean(), "the clean state was discarded");
    }

    #[test]
    fn stepping_walks_the_history() {
        let mut stack = UndoStack::new();
        assert!(stack.step_back().is_none());
        stack.push(add("n0"));
        assert_eq!(stack.step_back().map(Command::name), Some("add node"));
        assert_eq!(stack.redo_text(), Some("add node"));
        assert!(stack.step_forward().is_some());
        assert!(stack.step_forward().is_none());
        assert_eq!(stack.index(), 1);
    }

    #[test]
    fn translated_move_data_shifts_everything() {
        let data = MoveData {
            nodes: BTreeMap::from([(
                "n0".to_string(),
                NodeMoveData {
                    pos: Point::new(0.0, 0.0),
                    anchors: BTreeMap::from([("e0".to_string(), Point::new(5.0, 5.0))]),
                },
            )]),
            edges: BTreeMap::from([("e0".to_string(), vec![Point::new(1.0, 1.0)])]),
        };
        let moved = data.translated(Point::new(10.0, -10.0));
        assert_eq!(moved.nodes["n0"].pos, Point::new(10.0, -10.0));
        assert_eq!(moved.nodes["n0"].anchors["e0"], Point::new(15.0, -5.0));
        assert_eq!(moved.edges["e0"], vec![Point::new(11.0, -9.0)]);
    }
}
