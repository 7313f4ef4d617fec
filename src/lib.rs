use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod clipboard;
pub mod command;
pub mod config;
pub mod diagram;
pub mod edge;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod guid;
pub mod item;
pub mod label;
pub mod node;
pub mod validator;

pub use clipboard::Clipboard;
pub use command::{Command, UndoStack};
pub use config::DiagramConfig;
pub use diagram::*;
pub use edge::{Edge, SnapOptions};
pub use error::DiagramError;
pub use factory::{ItemArgs, ItemFactory};
pub use geometry::*;
pub use guid::Guid;
pub use item::{DiagramItem, HasLabel, Item};
pub use label::Label;
pub use node::{Handle, Node, NodeGraph};
pub use validator::{PermissiveValidator, Profile, ValidationResult, Validator};

pub const GRID_SIZE: f32 = 10.0;
pub const SELECTION_RADIUS: f32 = 4.0;
pub const HANDLE_SIZE: f32 = 8.0;
pub const HANDLE_HIT_SLACK: f32 = 3.0;
pub const HALO_PADDING: f32 = 4.0;
pub const ANCHOR_SNAP_RADIUS: f32 = 10.0;
pub const EDGE_HEAD_SIZE: f32 = 12.0;
pub const INPUT_HEAD_SIZE: f32 = 10.0;
pub const EDGE_SELECTION_SIZE: f32 = 8.0;
pub const EDGE_Z_STEP: f32 = 0.1;
pub const LABEL_Z_STEP: f32 = 0.1;
pub const PASTE_OFFSET_X: f32 = 20.0;
pub const PASTE_OFFSET_Y: f32 = 10.0;
pub const NODE_PREFIX: &str = "n";
pub const EDGE_PREFIX: &str = "e";
pub const LABEL_CHAR_WIDTH: f32 = 7.4;
pub const LABEL_LINE_HEIGHT: f32 = 16.0;
pub const LABEL_PADDING: f32 = 8.0;
pub const ORDINAL_LABEL_DISTANCE: f32 = 20.0;

/// OWL semantic category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Neutral,
    Concept,
    Role,
    Attribute,
    ValueDomain,
    Individual,
    Value,
    RoleInstance,
    AttributeInstance,
    Facet,
    Unknown,
}

impl Identity {
    pub fn as_str(self) -> &'static str {
        match self {
            Identity::Neutral => "Neutral",
            Identity::Concept => "Concept",
            Identity::Role => "Role",
            Identity::Attribute => "Attribute",
            Identity::ValueDomain => "Value Domain",
            Identity::Individual => "Individual",
            Identity::Value => "Value",
            Identity::RoleInstance => "Role Instance",
            Identity::AttributeInstance => "Attribute Instance",
            Identity::Facet => "Facet",
            Identity::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Concept,
    Attribute,
    Role,
    ValueDomain,
    Individual,
    DomainRestriction,
    RangeRestriction,
    Union,
    Enumeration,
    Complement,
    RoleChain,
    Intersection,
    RoleInverse,
    DatatypeRestriction,
    DisjointUnion,
    PropertyAssertion,
    Facet,
    Literal,
    HasKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Inclusion,
    Equivalence,
    Input,
    Membership,
    Same,
    Different,
}

/// Closed tag identifying the concrete variant of every diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Node(NodeKind),
    Edge(EdgeKind),
    Label,
}

pub const NODE_KINDS: [NodeKind; 19] = [
    NodeKind::Concept,
    NodeKind::Attribute,
    NodeKind::Role,
    NodeKind::ValueDomain,
    NodeKind::Individual,
    NodeKind::DomainRestriction,
    NodeKind::RangeRestriction,
    NodeKind::Union,
    NodeKind::Enumeration,
    NodeKind::Complement,
    NodeKind::RoleChain,
    NodeKind::Intersection,
    NodeKind::RoleInverse,
    NodeKind::DatatypeRestriction,
    NodeKind::DisjointUnion,
    NodeKind::PropertyAssertion,
    NodeKind::Facet,
    NodeKind::Literal,
    NodeKind::HasKey,
];

pub const EDGE_KINDS: [EdgeKind; 6] = [
    EdgeKind::Inclusion,
    EdgeKind::Equivalence,
    EdgeKind::Input,
    EdgeKind::Membership,
    EdgeKind::Same,
    EdgeKind::Different,
];

const NODE_TAG_BASE: u32 = 65537;
const EDGE_TAG_BASE: u32 = 65556;
const LABEL_TAG: u32 = 65562;

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Concept => "concept",
            NodeKind::Attribute => "attribute",
            NodeKind::Role => "role",
            NodeKind::ValueDomain => "value_domain",
            NodeKind::Individual => "individual",
            NodeKind::DomainRestriction => "domain_restriction",
            NodeKind::RangeRestriction => "range_restriction",
            NodeKind::Union => "union",
            NodeKind::Enumeration => "enumeration",
            NodeKind::Complement => "complement",
            NodeKind::RoleChain => "role_chain",
            NodeKind::Intersection => "intersection",
            NodeKind::RoleInverse => "role_inverse",
            NodeKind::DatatypeRestriction => "datatype_restriction",
            NodeKind::DisjointUnion => "disjoint_union",
            NodeKind::PropertyAssertion => "property_assertion",
            NodeKind::Facet => "facet",
            NodeKind::Literal => "literal",
            NodeKind::HasKey => "has_key",
        }
    }

    /// Human readable name, e.g. "concept node".
    pub fn name(self) -> String {
        format!("{} node", self.as_str().replace('_', " "))
    }

    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            NodeKind::Concept
                | NodeKind::Attribute
                | NodeKind::Role
                | NodeKind::ValueDomain
                | NodeKind::Individual
        )
    }

    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            NodeKind::DomainRestriction
                | NodeKind::RangeRestriction
                | NodeKind::Union
                | NodeKind::Enumeration
                | NodeKind::Complement
                | NodeKind::RoleChain
                | NodeKind::Intersection
                | NodeKind::RoleInverse
                | NodeKind::DatatypeRestriction
                | NodeKind::DisjointUnion
                | NodeKind::PropertyAssertion
                | NodeKind::Facet
                | NodeKind::Literal
                | NodeKind::HasKey
        )
    }

    /// Nodes keeping an ordered list of their incoming input edges.
    pub fn has_ordered_inputs(self) -> bool {
        matches!(
            self,
            NodeKind::RoleChain | NodeKind::PropertyAssertion | NodeKind::HasKey
        )
    }

    fn tag(self) -> u32 {
        let index = NODE_KINDS.iter().position(|kind| *kind == self).unwrap_or(0);
        NODE_TAG_BASE + index as u32
    }
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Inclusion => "inclusion",
            EdgeKind::Equivalence => "equivalence",
            EdgeKind::Input => "input",
            EdgeKind::Membership => "membership",
            EdgeKind::Same => "same",
            EdgeKind::Different => "different",
        }
    }

    pub fn name(self) -> String {
        format!("{} edge", self.as_str())
    }

    fn tag(self) -> u32 {
        let index = EDGE_KINDS.iter().position(|kind| *kind == self).unwrap_or(0);
        EDGE_TAG_BASE + index as u32
    }
}

impl ItemType {
    pub fn is_node(self) -> bool {
        matches!(self, ItemType::Node(_))
    }

    pub fn is_edge(self) -> bool {
        matches!(self, ItemType::Edge(_))
    }

    pub fn is_label(self) -> bool {
        matches!(self, ItemType::Label)
    }

    /// Id prefix used by the generator for items of this type.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            ItemType::Node(_) => Some(NODE_PREFIX),
            ItemType::Edge(_) => Some(EDGE_PREFIX),
            ItemType::Label => None,
        }
    }

    /// Numeric tag used by the Graphol document format.
    pub fn tag(self) -> u32 {
        match self {
            ItemType::Node(kind) => kind.tag(),
            ItemType::Edge(kind) => kind.tag(),
            ItemType::Label => LABEL_TAG,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Node(kind) => kind.as_str(),
            ItemType::Edge(kind) => kind.as_str(),
            ItemType::Label => "label",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Node(kind) => f.write_str(&kind.name()),
            ItemType::Edge(kind) => f.write_str(&kind.name()),
            ItemType::Label => f.write_str("label"),
        }
    }
}

impl TryFrom<u32> for ItemType {
    type Error = DiagramError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        if tag == LABEL_TAG {
            return Ok(ItemType::Label);
        }
        if let Some(kind) = tag
            .checked_sub(NODE_TAG_BASE)
            .and_then(|index| NODE_KINDS.get(index as usize))
        {
            return Ok(ItemType::Node(*kind));
        }
        if let Some(kind) = tag
            .checked_sub(EDGE_TAG_BASE)
            .and_then(|index| EDGE_KINDS.get(index as usize))
        {
            return Ok(ItemType::Edge(*kind));
        }
        Err(DiagramError::UnknownItemType(tag.to_string()))
    }
}

impl FromStr for ItemType {
    type Err = DiagramError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        if normalized == "label" {
            return Ok(ItemType::Label);
        }
        let stripped = normalized
            .strip_suffix("_node")
            .or_else(|| normalized.strip_suffix("_edge"))
            .unwrap_or(&normalized);
        if let Some(kind) = NODE_KINDS.iter().find(|kind| kind.as_str() == stripped) {
            return Ok(ItemType::Node(*kind));
        }
        if let Some(kind) = EDGE_KINDS.iter().find(|kind| kind.as_str() == stripped) {
            return Ok(ItemType::Edge(*kind));
        }
        Err(DiagramError::UnknownItemType(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tags_follow_document_format() {
        let cases = [
            (65537, ItemType::Node(NodeKind::Concept)),
            (65541, ItemType::Node(NodeKind::Individual)),
            (65555, ItemType::Node(NodeKind::HasKey)),
            (65556, ItemType::Edge(EdgeKind::Inclusion)),
            (65559, ItemType::Edge(EdgeKind::Membership)),
            (65562, ItemType::Label),
        ];

        for (tag, expected) in cases {
            assert_eq!(ItemType::try_from(tag).unwrap(), expected, "tag {tag}");
            assert_eq!(expected.tag(), tag, "round trip for {expected}");
        }
    }

    #[test]
    fn rejects_unknown_tags() {
        assert!(matches!(
            ItemType::try_from(42),
            Err(DiagramError::UnknownItemType(_))
        ));
        assert!(matches!(
            "hexagon".parse::<ItemType>(),
            Err(DiagramError::UnknownItemType(_))
        ));
    }

    #[test]
    fn parses_readable_names() {
        let cases = [
            ("concept", ItemType::Node(NodeKind::Concept)),
            ("Role Chain node", ItemType::Node(NodeKind::RoleChain)),
            ("inclusion edge", ItemType::Edge(EdgeKind::Inclusion)),
            ("has-key", ItemType::Node(NodeKind::HasKey)),
            ("label", ItemType::Label),
        ];

        for (input, expected) in cases {
            assert_eq!(input.parse::<ItemType>().unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn capability_queries() {
        assert!(ItemType::Node(NodeKind::Union).is_node());
        assert!(ItemType::Edge(EdgeKind::Input).is_edge());
        assert!(ItemType::Label.is_label());
        assert_eq!(ItemType::Label.prefix(), None);
        assert!(NodeKind::Individual.is_predicate());
        assert!(!NodeKind::Individual.is_constructor());
        assert!(NodeKind::HasKey.is_constructor());
        assert_eq!(NodeKind::RoleChain.name(), "role chain node");
    }
}
