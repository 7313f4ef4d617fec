use crate::diagram::Diagram;
use crate::edge::Edge;
use crate::node::{Node, NodeGraph};
use crate::{EdgeKind, Identity, NodeKind};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::trace;

/// Outcome of checking a connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Decides whether `edge` may connect `source` to `target`.
pub trait Validator {
    fn validate(&self, diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> ValidationResult;

    fn valid(&self, diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> bool {
        self.validate(diagram, source, edge, target).valid
    }
}

/// Accepts every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveValidator;

impl Validator for PermissiveValidator {
    fn validate(&self, _: &Diagram, _: &Node, _: &Edge, _: &Node) -> ValidationResult {
        ValidationResult::ok()
    }
}

/// A rule violation, carrying the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProfileError(pub String);

pub trait EdgeRule {
    fn check(&self, diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError>;
}

impl<F> EdgeRule for F
where
    F: Fn(&Diagram, &Node, &Edge, &Node) -> Result<(), ProfileError>,
{
    fn check(&self, diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
        self(diagram, source, edge, target)
    }
}

/// Ordered set of edge rules; the first violation wins.
pub struct Profile {
    name: String,
    rules: Vec<Box<dyn EdgeRule>>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Profile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_rule(mut self, rule: impl EdgeRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Graphol rules for the OWL 2 profile.
    pub fn owl2() -> Self {
        Profile::new("OWL 2")
            .with_rule(self_connection)
            .with_rule(expressions_only)
            .with_rule(compatible_expressions)
            .with_rule(input_to_constructor)
            .with_rule(input_from_facet)
            .with_rule(input_to_complement)
            .with_rule(input_to_role_inverse)
            .with_rule(input_to_role_chain)
            .with_rule(input_to_union_like)
            .with_rule(input_to_enumeration)
            .with_rule(input_to_datatype_restriction)
            .with_rule(input_to_property_assertion)
            .with_rule(input_to_has_key)
            .with_rule(membership_source)
            .with_rule(membership_target)
            .with_rule(same_or_different)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::owl2()
    }
}

impl Validator for Profile {
    fn validate(&self, diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> ValidationResult {
        for rule in &self.rules {
            if let Err(error) = rule.check(diagram, source, edge, target) {
                trace!(edge = edge.id(), source = source.id(), target = target.id(), %error, "connection rejected");
                return ValidationResult::invalid(error.to_string());
            }
        }
        ValidationResult::ok()
    }
}

fn fail<T>(message: String) -> Result<T, ProfileError> {
    Err(ProfileError(message))
}

fn expressive(node: &Node) -> BTreeSet<Identity> {
    node.identities()
        .iter()
        .copied()
        .filter(|identity| !matches!(identity, Identity::Neutral | Identity::Unknown))
        .collect()
}

/// Input edges already feeding `target`, other than `edge`.
fn other_inputs<'a>(diagram: &'a Diagram, edge: &Edge, target: &Node) -> Vec<&'a Node> {
    diagram.incoming_nodes(
        target,
        |other| other.kind() == EdgeKind::Input && other.id() != edge.id(),
        |_| true,
    )
}

fn invalid_input(source: &Node, target: &Node) -> Result<(), ProfileError> {
    fail(format!("Invalid input to {}: {}", target.kind().name(), source.kind().name()))
}

fn self_connection(_: &Diagram, source: &Node, _: &Edge, target: &Node) -> Result<(), ProfileError> {
    if source.id() == target.id() {
        return fail(format!("Self connection detected on {}", source.kind().name()));
    }
    Ok(())
}

fn expressions_only(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if !matches!(edge.kind(), EdgeKind::Inclusion | EdgeKind::Equivalence) {
        return Ok(());
    }
    let shared: BTreeSet<Identity> = expressive(source)
        .intersection(&expressive(target))
        .copied()
        .collect();
    if shared.is_empty() {
        return Ok(());
    }
    let punned = source.identities().len() > 1 && target.identities().len() > 1;
    let supported = shared.iter().any(|identity| match identity {
        Identity::Concept | Identity::Role | Identity::Attribute | Identity::ValueDomain => true,
        Identity::Individual => punned,
        _ => false,
    });
    if !supported {
        return fail(format!(
            "Type mismatch: {} must involve two graphol expressions",
            edge.kind().as_str()
        ));
    }
    Ok(())
}

fn compatible_expressions(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if !matches!(edge.kind(), EdgeKind::Inclusion | EdgeKind::Equivalence) {
        return Ok(());
    }
    let (a, b) = (source.identity(), target.identity());
    if a != Identity::Neutral && b != Identity::Neutral && a != b {
        return fail(format!("Type mismatch: {} between {a} and {b}", edge.kind().as_str()));
    }
    if expressive(source).is_disjoint(&expressive(target)) {
        return fail(format!(
            "{} and {} are not compatible",
            source.kind().name(),
            target.kind().name()
        ));
    }
    Ok(())
}

fn input_to_constructor(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Input {
        return Ok(());
    }
    if !target.kind().is_constructor() || matches!(target.kind(), NodeKind::Facet | NodeKind::Literal) {
        return fail("Input edges can only target constructor nodes".to_string());
    }
    if source.kind() == NodeKind::PropertyAssertion {
        return invalid_input(source, target);
    }
    Ok(())
}

fn input_from_facet(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() == EdgeKind::Input
        && source.kind() == NodeKind::Facet
        && target.kind() != NodeKind::DatatypeRestriction
    {
        return fail("Facet node can only be input to datatype restriction".to_string());
    }
    Ok(())
}

fn input_to_complement(diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Input || target.kind() != NodeKind::Complement {
        return Ok(());
    }
    if !target.identities().contains(&source.identity()) {
        return invalid_input(source, target);
    }
    if !other_inputs(diagram, edge, target).is_empty() {
        return fail(format!("Too many inputs to {}", target.kind().name()));
    }
    Ok(())
}

fn input_to_role_inverse(diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Input || target.kind() != NodeKind::RoleInverse {
        return Ok(());
    }
    if source.kind() != NodeKind::Role {
        return invalid_input(source, target);
    }
    if !other_inputs(diagram, edge, target).is_empty() {
        return fail(format!("Too many inputs to {}", target.kind().name()));
    }
    Ok(())
}

fn input_to_role_chain(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() == EdgeKind::Input
        && target.kind() == NodeKind::RoleChain
        && !matches!(source.kind(), NodeKind::Role | NodeKind::RoleInverse)
    {
        return invalid_input(source, target);
    }
    Ok(())
}

fn input_to_union_like(diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Input
        || !matches!(
            target.kind(),
            NodeKind::Union | NodeKind::Intersection | NodeKind::DisjointUnion
        )
    {
        return Ok(());
    }
    let identity = source.identity();
    if identity == Identity::Neutral {
        return Ok(());
    }
    if !target.identities().contains(&identity) {
        return invalid_input(source, target);
    }
    let mismatch = other_inputs(diagram, edge, target)
        .iter()
        .map(|node| node.identity())
        .find(|other| !matches!(other, Identity::Neutral | Identity::Unknown) && *other != identity);
    if let Some(other) = mismatch {
        return fail(format!("Type mismatch: {identity} and {other}"));
    }
    Ok(())
}

fn input_to_enumeration(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() == EdgeKind::Input
        && target.kind() == NodeKind::Enumeration
        && !matches!(source.kind(), NodeKind::Individual | NodeKind::Literal)
    {
        return invalid_input(source, target);
    }
    Ok(())
}

fn input_to_datatype_restriction(
    _: &Diagram,
    source: &Node,
    edge: &Edge,
    target: &Node,
) -> Result<(), ProfileError> {
    if edge.kind() == EdgeKind::Input
        && target.kind() == NodeKind::DatatypeRestriction
        && !matches!(source.kind(), NodeKind::ValueDomain | NodeKind::Facet)
    {
        return invalid_input(source, target);
    }
    Ok(())
}

fn input_to_property_assertion(
    diagram: &Diagram,
    source: &Node,
    edge: &Edge,
    target: &Node,
) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Input || target.kind() != NodeKind::PropertyAssertion {
        return Ok(());
    }
    if !matches!(source.kind(), NodeKind::Individual | NodeKind::Literal) {
        return invalid_input(source, target);
    }
    let others = other_inputs(diagram, edge, target);
    if others.len() >= 2 {
        return fail(format!("Too many inputs to {}", target.kind().name()));
    }
    if source.kind() == NodeKind::Literal && others.iter().any(|node| node.kind() == NodeKind::Literal) {
        return fail(format!("Too many literals in {}", target.kind().name()));
    }
    Ok(())
}

fn input_to_has_key(diagram: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Input || target.kind() != NodeKind::HasKey {
        return Ok(());
    }
    let allowed = [Identity::Concept, Identity::Role, Identity::Attribute];
    if !source
        .identities()
        .iter()
        .any(|identity| allowed.contains(identity))
    {
        return invalid_input(source, target);
    }
    let is_class = |node: &Node| {
        node.identity() == Identity::Concept
            || (node.identity() == Identity::Neutral && node.identities().contains(&Identity::Concept))
    };
    if is_class(source) && other_inputs(diagram, edge, target).into_iter().any(is_class) {
        return fail("A key can be defined over one and only one class expression".to_string());
    }
    Ok(())
}

fn membership_source(_: &Diagram, source: &Node, edge: &Edge, _: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Membership {
        return Ok(());
    }
    if source.identity() != Identity::Individual && source.kind() != NodeKind::PropertyAssertion {
        return fail(format!("Invalid source for membership edge: {}", source.kind().name()));
    }
    Ok(())
}

fn membership_target(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if edge.kind() != EdgeKind::Membership {
        return Ok(());
    }
    let (required, assertion) = match source.identity() {
        Identity::Individual => (Identity::Concept, "Concept"),
        Identity::RoleInstance => (Identity::Role, "Role"),
        Identity::AttributeInstance => (Identity::Attribute, "Attribute"),
        _ => return Ok(()),
    };
    if !target.identities().contains(&required) || target.kind() == NodeKind::Individual {
        return fail(format!(
            "Invalid target for {assertion} assertion: {}",
            target.kind().name()
        ));
    }
    Ok(())
}

fn same_or_different(_: &Diagram, source: &Node, edge: &Edge, target: &Node) -> Result<(), ProfileError> {
    if !matches!(edge.kind(), EdgeKind::Same | EdgeKind::Different) {
        return Ok(());
    }
    let assertion = edge.kind().as_str();
    let allowed = [NodeKind::Individual, NodeKind::Concept, NodeKind::Role, NodeKind::Attribute];
    if !allowed.contains(&source.kind()) {
        return fail(format!("Invalid source for {assertion} assertion: {}", source.kind().name()));
    }
    let shares = source
        .identities()
        .iter()
        .any(|identity| target.identities().contains(identity));
    if !allowed.contains(&target.kind()) || !shares {
        return fail(format!("Invalid target for {assertion} assertion: {}", target.kind().name()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn diagram_with(kinds: &[NodeKind]) -> (Diagram, Vec<String>) {
        let mut diagram = Diagram::new();
        let ids = kinds
            .iter()
            .enumerate()
            .map(|(index, kind)| {
                diagram
                    .add_node(*kind, Point::new(200.0 * index as f32, 0.0))
                    .unwrap()
            })
            .collect();
        (diagram, ids)
    }

    fn check(diagram: &Diagram, kind: EdgeKind, source: &str, target: &str) -> ValidationResult {
        let edge = Edge::new("probe", kind, source, Some(target));
        let source = diagram.node(source).unwrap();
        let target = diagram.node(target).unwrap();
        Profile::owl2().validate(diagram, source, &edge, target)
    }

    #[test]
    fn owl2_connection_table() {
        let cases = [
            (NodeKind::Concept, EdgeKind::Inclusion, NodeKind::Concept, ""),
            (NodeKind::Role, EdgeKind::Inclusion, NodeKind::Role, ""),
            (NodeKind::Concept, EdgeKind::Equivalence, NodeKind::Union, ""),
            (
                NodeKind::Role,
                EdgeKind::Inclusion,
                NodeKind::Concept,
                "Type mismatch: inclusion between Role and Concept",
            ),
            (
                NodeKind::Individual,
                EdgeKind::Inclusion,
                NodeKind::Individual,
                "Type mismatch: inclusion must involve two graphol expressions",
            ),
            (
                NodeKind::Concept,
                EdgeKind::Input,
                NodeKind::Concept,
                "Input edges can only target constructor nodes",
            ),
            (NodeKind::Concept, EdgeKind::Input, NodeKind::Complement, ""),
            (
                NodeKind::Concept,
                EdgeKind::Input,
                NodeKind::RoleInverse,
                "Invalid input to role inverse node: concept node",
            ),
            (NodeKind::Individual, EdgeKind::Membership, NodeKind::Concept, ""),
            (
                NodeKind::Individual,
                EdgeKind::Membership,
                NodeKind::Role,
                "Invalid target for Concept assertion: role node",
            ),
            (
                NodeKind::Concept,
                EdgeKind::Membership,
                NodeKind::Concept,
                "Invalid source for membership edge: concept node",
            ),
            (NodeKind::Individual, EdgeKind::Same, NodeKind::Individual, ""),
            (
                NodeKind::Union,
                EdgeKind::Different,
                NodeKind::Individual,
                "Invalid source for different assertion: union node",
            ),
            (
                NodeKind::Facet,
                EdgeKind::Input,
                NodeKind::Union,
                "Facet node can only be input to datatype restriction",
            ),
        ];

        for (source, kind, target, message) in cases {
            let (diagram, ids) = diagram_with(&[source, target]);
            let result = check(&diagram, kind, &ids[0], &ids[1]);
            assert_eq!(result.valid, message.is_empty(), "{source:?} -{kind:?}-> {target:?}");
            assert_eq!(result.message, message, "{source:?} -{kind:?}-> {target:?}");
        }
    }

    #[test]
    fn rejects_self_connections() {
        let (diagram, ids) = diagram_with(&[NodeKind::Concept]);
        let result = check(&diagram, EdgeKind::Inclusion, &ids[0], &ids[0]);
        assert_eq!(result, ValidationResult::invalid("Self connection detected on concept node"));
    }

    #[test]
    fn complement_takes_a_single_input() {
        let (mut diagram, ids) = diagram_with(&[NodeKind::Concept, NodeKind::Concept, NodeKind::Complement]);
        diagram.add_edge(EdgeKind::Input, &ids[0], &ids[2]).unwrap();
        let result = check(&diagram, EdgeKind::Input, &ids[1], &ids[2]);
        assert_eq!(result.message, "Too many inputs to complement node");
    }

    #[test]
    fn has_key_accepts_one_class_expression() {
        let (mut diagram, ids) = diagram_with(&[
            NodeKind::Concept,
            NodeKind::Role,
            NodeKind::Concept,
            NodeKind::HasKey,
        ]);
        diagram.add_edge(EdgeKind::Input, &ids[0], &ids[3]).unwrap();
        assert!(check(&diagram, EdgeKind::Input, &ids[1], &ids[3]).valid);
        let result = check(&diagram, EdgeKind::Input, &ids[2], &ids[3]);
        assert_eq!(
            result.message,
            "A key can be defined over one and only one class expression"
        );
    }

    #[test]
    fn custom_rules_extend_a_profile() {
        let profile = Profile::new("strict").with_rule(
            |_: &Diagram, _: &Node, edge: &Edge, _: &Node| -> Result<(), ProfileError> {
                if edge.kind() == EdgeKind::Equivalence {
                    return Err(ProfileError("no equivalences".into()));
                }
                Ok(())
            },
        );
        let (diagram, ids) = diagram_with(&[NodeKind::Concept, NodeKind::Concept]);
        let edge = Edge::new("probe", EdgeKind::Equivalence, &ids[0], Some(&ids[1]));
        let (source, target) = (diagram.node(&ids[0]).unwrap(), diagram.node(&ids[1]).unwrap());
        assert!(!profile.valid(&diagram, source, &edge, target));
        assert!(PermissiveValidator.valid(&diagram, source, &edge, target));
    }
}
