use crate::edge::Edge;
use crate::error::DiagramError;
use crate::geometry::Point;
use crate::item::Item;
use crate::node::Node;
use crate::ItemType;
use tracing::debug;

/// Constructor arguments accepted by [`ItemFactory::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemArgs {
    pub id: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub pos: Option<Point>,
    pub text: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub breakpoints: Vec<Point>,
}

impl ItemArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn pos(mut self, pos: Point) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn breakpoints(mut self, breakpoints: Vec<Point>) -> Self {
        self.breakpoints = breakpoints;
        self
    }
}

/// Maps item type tags onto concrete nodes and edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFactory;

impl ItemFactory {
    pub fn create(&self, item_type: ItemType, args: ItemArgs) -> Result<Item, DiagramError> {
        let id = args.id.as_deref().ok_or(DiagramError::MissingArgument("id"))?;
        let item = match item_type {
            ItemType::Node(kind) => {
                let (default_w, default_h) = kind.default_size();
                let mut node = Node::with_size(
                    id,
                    kind,
                    args.width.unwrap_or(default_w),
                    args.height.unwrap_or(default_h),
                );
                if let Some(pos) = args.pos {
                    node.set_pos(pos);
                }
                if let Some(text) = args.text.as_deref() {
                    node.set_text(text);
                }
                Item::Node(node)
            }
            ItemType::Edge(kind) => {
                let source = args
                    .source
                    .as_deref()
                    .ok_or(DiagramError::MissingArgument("source"))?;
                let mut edge = Edge::new(id, kind, source, args.target.as_deref());
                edge.set_breakpoints(args.breakpoints);
                Item::Edge(edge)
            }
            ItemType::Label => {
                return Err(DiagramError::UnknownItemType(item_type.to_string()));
            }
        };
        debug!(id, %item_type, "created item");
        Ok(item)
    }

    /// Same as [`ItemFactory::create`] for a numeric document tag.
    pub fn create_from_tag(&self, tag: u32, args: ItemArgs) -> Result<Item, DiagramError> {
        self.create(ItemType::try_from(tag)?, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::DiagramItem;
    use crate::{EdgeKind, NodeKind};

    #[test]
    fn creates_nodes_with_arguments() {
        let item = ItemFactory
            .create(
                ItemType::Node(NodeKind::Concept),
                ItemArgs::new()
                    .id("n4")
                    .size(200.0, 80.0)
                    .pos(Point::new(10.0, 10.0))
                    .text("Person"),
            )
            .unwrap();
        let node = item.into_node().unwrap();
        assert_eq!(node.id(), "n4");
        assert_eq!(node.width(), 200.0);
        assert_eq!(node.pos(), Point::new(10.0, 10.0));
        assert_eq!(node.text(), Some("Person"));
    }

    #[test]
    fn small_sizes_are_raised_to_minimum() {
        let node = ItemFactory
            .create(
                ItemType::Node(NodeKind::Individual),
                ItemArgs::new().id("n0").size(10.0, 10.0),
            )
            .and_then(Item::into_node)
            .unwrap();
        assert_eq!((node.width(), node.height()), (60.0, 60.0));
    }

    #[test]
    fn creates_edges() {
        let edge = ItemFactory
            .create(
                ItemType::Edge(EdgeKind::Inclusion),
                ItemArgs::new()
                    .id("e0")
                    .source("n0")
                    .target("n1")
                    .breakpoints(vec![Point::new(1.0, 2.0)]),
            )
            .and_then(Item::into_edge)
            .unwrap();
        assert_eq!(edge.source(), "n0");
        assert_eq!(edge.target(), Some("n1"));
        assert_eq!(edge.breakpoints(), &[Point::new(1.0, 2.0)]);
    }

    #[test]
    fn reports_structural_errors() {
        let cases = [
            (ItemType::Node(NodeKind::Role), ItemArgs::new(), DiagramError::MissingArgument("id")),
            (
                ItemType::Edge(EdgeKind::Input),
                ItemArgs::new().id("e0"),
                DiagramError::MissingArgument("source"),
            ),
            (
                ItemType::Label,
                ItemArgs::new().id("l0"),
                DiagramError::UnknownItemType("label".into()),
            ),
        ];

        for (item_type, args, expected) in cases {
            assert_eq!(ItemFactory.create(item_type, args), Err(expected), "{item_type}");
        }
        assert_eq!(
            ItemFactory.create_from_tag(1, ItemArgs::new().id("n0")),
            Err(DiagramError::UnknownItemType("1".into()))
        );
    }

    #[test]
    fn numeric_tags_create_matching_items() {
        let item = ItemFactory
            .create_from_tag(65539, ItemArgs::new().id("n0"))
            .unwrap();
        assert_eq!(item.item_type(), ItemType::Node(NodeKind::Role));
    }
}
