use crate::command::Command;
use crate::diagram::Diagram;
use crate::edge::Edge;
use crate::error::DiagramError;
use crate::geometry::Point;
use crate::node::Node;
use crate::{EDGE_PREFIX, NODE_PREFIX};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Copied nodes and the edges running between them, still carrying their old ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Copies the selected nodes and every edge whose endpoints are both selected.
    pub fn capture(&mut self, diagram: &mut Diagram) {
        let selected: BTreeSet<String> = diagram
            .selection()
            .iter()
            .filter(|id| diagram.node(id).is_some())
            .cloned()
            .collect();
        let edges: Vec<Edge> = diagram
            .edges()
            .filter(|edge| {
                selected.contains(edge.source())
                    && edge.target().is_some_and(|target| selected.contains(target))
            })
            .cloned()
            .collect();
        let kept: BTreeSet<&str> = edges.iter().map(Edge::id).collect();
        let nodes: Vec<Node> = selected
            .iter()
            .filter_map(|id| diagram.node(id))
            .map(|node| {
                let mut copy = node.clone();
                copy.retain_edges(|edge| kept.contains(edge));
                copy.set_valid(None);
                copy
            })
            .collect();
        debug!(nodes = nodes.len(), edges = edges.len(), "copied selection");

        self.nodes = nodes;
        self.edges = edges;
        diagram.reset_paste_offset();
    }

    /// Copies the selection, then removes it from the diagram.
    pub fn cut(&mut self, diagram: &mut Diagram) -> Result<(), DiagramError> {
        self.capture(diagram);
        let ids: Vec<String> = self.nodes.iter().map(|node| node.id().to_string()).collect();
        diagram.remove_items(ids.as_slice())
    }

    /// Inserts a fresh-id copy of the clipboard through one undoable command and
    /// selects it. With `pos` the topmost copied node is centred there; without,
    /// each consecutive paste is shifted a little further.
    pub fn paste(&self, diagram: &mut Diagram, pos: Option<Point>) -> Result<Vec<String>, DiagramError> {
        if self.nodes.is_empty() {
            return Ok(Vec::new());
        }

        let mut node_ids = BTreeMap::new();
        for node in &self.nodes {
            node_ids.insert(node.id().to_string(), diagram.next_id(NODE_PREFIX)?);
        }
        let mut edge_ids = BTreeMap::new();
        for edge in &self.edges {
            edge_ids.insert(edge.id().to_string(), diagram.next_id(EDGE_PREFIX)?);
        }

        let step = Point::new(diagram.config().paste_offset_x, diagram.config().paste_offset_y);
        let offset = match pos {
            Some(pos) => {
                let top = self
                    .nodes
                    .iter()
                    .map(|node| (node.bounding_rect().min_y, node.pos()))
                    .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(_, pos)| pos)
                    .unwrap_or(pos);
                let offset = pos - top;
                diagram.set_paste_offset(offset + step);
                offset
            }
            None => {
                let offset = diagram.paste_offset();
                diagram.set_paste_offset(offset + step);
                offset
            }
        };

        let base_z = diagram.max_z();
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let mut copy = node.clone();
                copy.set_id(&renamed(&node_ids, node.id()));
                copy.rename_edges(&edge_ids);
                copy.move_by(offset);
                copy.set_z(base_z + 0.1 * (index + 1) as f32);
                copy
            })
            .collect();
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .map(|edge| {
                let mut copy = edge.clone();
                copy.set_id(&renamed(&edge_ids, edge.id()));
                copy.set_source(&renamed(&node_ids, edge.source()));
                let target = edge.target().map(|target| renamed(&node_ids, target));
                copy.set_target(target.as_deref());
                copy.move_by(offset);
                copy
            })
            .collect();

        let ids: Vec<String> = nodes.iter().map(|node| node.id().to_string()).collect();
        debug!(nodes = nodes.len(), edges = edges.len(), dx = offset.x, dy = offset.y, "pasting");
        diagram.push(Command::ItemsAdd { nodes, edges });
        diagram.clear_selection();
        for id in &ids {
            diagram.select(id)?;
        }
        Ok(ids)
    }
}

fn renamed(names: &BTreeMap<String, String>, id: &str) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::PermissiveValidator;
    use crate::{EdgeKind, NodeKind};

    fn pair() -> (Diagram, String, String, String) {
        let mut diagram = Diagram::new().with_validator(PermissiveValidator);
        let a = diagram.add_node(NodeKind::Concept, Point::new(0.0, 0.0)).unwrap();
        let b = diagram.add_node(NodeKind::Concept, Point::new(300.0, 100.0)).unwrap();
        let e = diagram.add_edge(EdgeKind::Inclusion, &a, &b).unwrap().unwrap();
        (diagram, a, b, e)
    }

    #[test]
    fn capture_drops_edges_leaving_the_selection() {
        let (mut diagram, a, _, e) = pair();
        diagram.select(&a).unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&mut diagram);

        assert_eq!(clipboard.nodes().len(), 1);
        assert!(clipboard.edges().is_empty());
        assert!(!clipboard.nodes()[0].has_edge(&e));
        assert!(diagram.node(&a).unwrap().has_edge(&e));
    }

    #[test]
    fn consecutive_pastes_shift_further() {
        let (mut diagram, a, _, _) = pair();
        diagram.select(&a).unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&mut diagram);

        let first = clipboard.paste(&mut diagram, None).unwrap();
        let second = clipboard.paste(&mut diagram, None).unwrap();
        assert_eq!(diagram.node(&first[0]).unwrap().pos(), Point::new(20.0, 10.0));
        assert_eq!(diagram.node(&second[0]).unwrap().pos(), Point::new(40.0, 20.0));
        assert_eq!(diagram.selection().iter().collect::<Vec<_>>(), vec![&second[0]]);
    }

    #[test]
    fn paste_at_position_centres_topmost_node() {
        let (mut diagram, a, b, _) = pair();
        diagram.select(&a).unwrap();
        diagram.select(&b).unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&mut diagram);

        let ids = clipboard.paste(&mut diagram, Some(Point::new(1000.0, 1000.0))).unwrap();
        assert_eq!(diagram.node(&ids[0]).unwrap().pos(), Point::new(1000.0, 1000.0));
        assert_eq!(diagram.node(&ids[1]).unwrap().pos(), Point::new(1300.0, 1100.0));
        assert!(diagram.node(&ids[1]).unwrap().z() > diagram.node(&ids[0]).unwrap().z());
    }

    #[test]
    fn paste_is_one_undo_step() {
        let (mut diagram, a, b, _) = pair();
        diagram.select(&a).unwrap();
        diagram.select(&b).unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.capture(&mut diagram);
        clipboard.paste(&mut diagram, None).unwrap();
        assert_eq!((diagram.nodes().count(), diagram.edges().count()), (4, 2));

        diagram.undo();
        assert_eq!((diagram.nodes().count(), diagram.edges().count()), (2, 1));
    }

    #[test]
    fn cut_removes_the_selection() {
        let (mut diagram, a, b, e) = pair();
        diagram.select(&a).unwrap();
        let mut clipboard = Clipboard::new();
        clipboard.cut(&mut diagram).unwrap();

        assert!(diagram.node(&a).is_none());
        assert!(diagram.edge(&e).is_none());
        assert!(diagram.node(&b).is_some());
        assert_eq!(clipboard.nodes().len(), 1);
    }
}
