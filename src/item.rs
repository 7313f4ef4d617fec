use crate::edge::Edge;
use crate::error::DiagramError;
use crate::geometry::Rect;
use crate::label::Label;
use crate::node::Node;
use crate::ItemType;

/// Capabilities shared by every element of a diagram.
pub trait DiagramItem {
    fn id(&self) -> &str;
    fn item_type(&self) -> ItemType;
    fn bounding_rect(&self) -> Rect;
    fn z_value(&self) -> f32;

    fn is_node(&self) -> bool {
        self.item_type().is_node()
    }

    fn is_edge(&self) -> bool {
        self.item_type().is_edge()
    }

    fn is_label(&self) -> bool {
        self.item_type().is_label()
    }
}

pub trait HasLabel {
    fn label(&self) -> Option<&Label>;
    fn label_mut(&mut self) -> Option<&mut Label>;

    fn text(&self) -> Option<&str> {
        self.label().map(Label::text)
    }
}

impl DiagramItem for Node {
    fn id(&self) -> &str {
        Node::id(self)
    }

    fn item_type(&self) -> ItemType {
        ItemType::Node(self.kind())
    }

    fn bounding_rect(&self) -> Rect {
        Node::bounding_rect(self)
    }

    fn z_value(&self) -> f32 {
        self.z()
    }
}

impl DiagramItem for Edge {
    fn id(&self) -> &str {
        Edge::id(self)
    }

    fn item_type(&self) -> ItemType {
        ItemType::Edge(self.kind())
    }

    fn bounding_rect(&self) -> Rect {
        Edge::bounding_rect(self)
    }

    fn z_value(&self) -> f32 {
        self.z()
    }
}

impl HasLabel for Node {
    fn label(&self) -> Option<&Label> {
        Node::label(self)
    }

    fn label_mut(&mut self) -> Option<&mut Label> {
        Node::label_mut(self)
    }
}

impl HasLabel for Edge {
    fn label(&self) -> Option<&Label> {
        Edge::label(self)
    }

    fn label_mut(&mut self) -> Option<&mut Label> {
        Edge::label_mut(self)
    }
}

/// An element produced by the factory.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    Edge(Edge),
}

impl Item {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(node) => Some(node),
            Item::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Item::Edge(edge) => Some(edge),
            Item::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Result<Node, DiagramError> {
        match self {
            Item::Node(node) => Ok(node),
            Item::Edge(edge) => Err(DiagramError::WrongItemKind {
                id: edge.id().to_string(),
                expected: "node",
            }),
        }
    }

    pub fn into_edge(self) -> Result<Edge, DiagramError> {
        match self {
            Item::Edge(edge) => Ok(edge),
            Item::Node(node) => Err(DiagramError::WrongItemKind {
                id: node.id().to_string(),
                expected: "edge",
            }),
        }
    }
}

impl DiagramItem for Item {
    fn id(&self) -> &str {
        match self {
            Item::Node(node) => Node::id(node),
            Item::Edge(edge) => Edge::id(edge),
        }
    }

    fn item_type(&self) -> ItemType {
        match self {
            Item::Node(node) => node.item_type(),
            Item::Edge(edge) => edge.item_type(),
        }
    }

    fn bounding_rect(&self) -> Rect {
        match self {
            Item::Node(node) => Node::bounding_rect(node),
            Item::Edge(edge) => Edge::bounding_rect(edge),
        }
    }

    fn z_value(&self) -> f32 {
        match self {
            Item::Node(node) => node.z(),
            Item::Edge(edge) => edge.z(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeKind, NodeKind};

    #[test]
    fn capability_flags_follow_type() {
        let node = Item::Node(Node::new("n0", NodeKind::Role));
        let edge = Item::Edge(Edge::new("e0", EdgeKind::Input, "n0", None));

        assert!(node.is_node() && !node.is_edge() && !node.is_label());
        assert!(edge.is_edge() && !edge.is_node());
        assert_eq!(DiagramItem::id(&node), "n0");
        assert_eq!(edge.item_type(), ItemType::Edge(EdgeKind::Input));
    }

    #[test]
    fn conversions_report_wrong_kind() {
        let edge = Item::Edge(Edge::new("e0", EdgeKind::Input, "n0", None));
        assert_eq!(
            edge.clone().into_node(),
            Err(DiagramError::WrongItemKind {
                id: "e0".into(),
                expected: "node"
            })
        );
        assert!(edge.into_edge().is_ok());
    }

    #[test]
    fn labels_are_reachable_through_the_trait() {
        let node = Node::new("n0", NodeKind::Concept);
        assert_eq!(HasLabel::text(&node), Some("concept"));
        let edge = Edge::new("e0", EdgeKind::Membership, "n0", None);
        assert_eq!(HasLabel::text(&edge), Some("instanceOf"));
    }
}
