use thiserror::Error;

/// Structural errors: the diagram invariants were violated upstream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagramError {
    #[error("unknown item type: {0}")]
    UnknownItemType(String),

    #[error("node '{0}' not found")]
    MissingNode(String),

    #[error("edge '{0}' not found")]
    MissingEdge(String),

    #[error("node '{node}' is not an endpoint of edge '{edge}'")]
    NotAnEndpoint { node: String, edge: String },

    #[error("malformed id: {0}")]
    InvalidId(String),

    #[error("invalid id prefix: '{0}'")]
    InvalidPrefix(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("missing constructor argument: {0}")]
    MissingArgument(&'static str),

    #[error("item '{id}' is not a {expected}")]
    WrongItemKind { id: String, expected: &'static str },
}
