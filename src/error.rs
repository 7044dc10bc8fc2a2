use thiserror::Error;

/// Terminal failures of a single compile. Nothing is emitted when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("malformed tree at {path}: {reason}")]
    MalformedTree { path: String, reason: String },

    #[error("title {title:?} sanitizes to an empty filename")]
    InvalidTitle { title: String },

    #[error("layout overflow on band y={band}: {first} overlaps {second}")]
    LayoutOverflow {
        band: i64,
        first: String,
        second: String,
    },

    #[error("config rejected by layout: {0}")]
    InvalidGeometry(String),

    #[error("validation failed: {0}")]
    Validation(#[from] Inconsistency),
}

impl CompileError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTree {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// The first inconsistency found when checking a built document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    #[error("duplicate node id {0:?}")]
    DuplicateNodeId(String),

    #[error("duplicate edge id {0:?}")]
    DuplicateEdgeId(String),

    #[error("expected {expected} nodes, built {actual}")]
    NodeCount { expected: usize, actual: usize },

    #[error("expected {expected} edges, built {actual}")]
    EdgeCount { expected: usize, actual: usize },

    #[error("edge {edge} references unknown node {node:?}")]
    DanglingEndpoint { edge: String, node: String },

    #[error("edge {edge} does not mirror the tree: expected {expected_from} -> {expected_to}")]
    EdgeMismatch {
        edge: String,
        expected_from: String,
        expected_to: String,
    },

    #[error("edge {edge} color {edge_color} differs from target color {node_color}")]
    EdgeColor {
        edge: String,
        edge_color: String,
        node_color: String,
    },
}

pub type Result<T> = std::result::Result<T, CompileError>;
