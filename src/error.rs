//! Error taxonomy
//!
//! Only load-time work can fail: reading files, parsing JSON, validating the
//! waypoint table and the tuning values. Once a [`crate::sim::Simulation`]
//! exists, ticks never return errors; missing references degrade to idle
//! behaviour and are logged instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::graph::NodeId;

/// Problems found while building a waypoint graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The authoring table contained no nodes.
    #[error("waypoint graph has no nodes")]
    Empty,
    /// Two entries share the same id.
    #[error("waypoint {0} is defined more than once")]
    DuplicateNode(NodeId),
    /// A successor list names a node that is not in the table.
    #[error("waypoint {node} lists unknown successor {successor}")]
    UnknownSuccessor {
        /// Node whose successor list is broken.
        node: NodeId,
        /// The id that could not be resolved.
        successor: NodeId,
    },
    /// A node has no successors, so a patrol reaching it could not continue.
    #[error("waypoint {0} has no successors")]
    DeadEnd(NodeId),
    /// A node id was looked up that the graph does not contain.
    #[error("waypoint {0} does not exist")]
    UnknownNode(NodeId),
}

/// A tuning value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuningError {
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field, e.g. `enemy.chase_speed`.
        field: &'static str,
        /// Human-readable description of the accepted range.
        reason: String,
    },
}

impl TuningError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Tuning(#[from] TuningError),
}

/// Convenience alias: a `Result` using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
