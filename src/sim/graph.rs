//! Directed patrol graph
//!
//! Built once from an authoring table when a level loads and never edited
//! afterwards. Every node has at least one successor, so a patrol can always
//! choose its next leg. Nearest/farthest queries are linear scans.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Stable waypoint identifier taken from level authoring data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One row of the authoring table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub position: Vec2,
    #[serde(default)]
    pub successors: Vec<NodeId>,
}

impl NodeSpec {
    pub fn new(id: u32, position: Vec2, successors: &[u32]) -> Self {
        Self {
            id: NodeId(id),
            position,
            successors: successors.iter().copied().map(NodeId).collect(),
        }
    }
}

/// A validated patrol node
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointNode {
    pub id: NodeId,
    pub position: Vec2,
    successors: Vec<NodeId>,
}

impl WaypointNode {
    /// Successor ids in authoring order (never empty)
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }
}

/// Immutable patrol topology
#[derive(Debug, Clone)]
pub struct WaypointGraph {
    /// Nodes in authoring order (scan order for nearest/farthest ties)
    nodes: Vec<WaypointNode>,
    index: HashMap<NodeId, usize>,
}

impl WaypointGraph {
    /// Build from an explicit id -> successor table.
    ///
    /// Rejects empty tables, duplicate ids, successors that point nowhere and
    /// nodes without successors.
    pub fn from_specs(specs: Vec<NodeSpec>) -> Result<Self, GraphError> {
        if specs.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.id, i).is_some() {
                return Err(GraphError::DuplicateNode(spec.id));
            }
        }

        for spec in &specs {
            if spec.successors.is_empty() {
                return Err(GraphError::DeadEnd(spec.id));
            }
            if let Some(&missing) = spec.successors.iter().find(|s| !index.contains_key(s)) {
                return Err(GraphError::UnknownSuccessor {
                    node: spec.id,
                    successor: missing,
                });
            }
        }

        let nodes = specs
            .into_iter()
            .map(|spec| WaypointNode {
                id: spec.id,
                position: spec.position,
                successors: spec.successors,
            })
            .collect();

        Ok(Self { nodes, index })
    }

    /// Build a closed loop visiting `points` in order.
    ///
    /// Each node leads to the next one and the last wraps to the first. With
    /// `bidirectional` every node also leads back to the previous one.
    pub fn ring(
        points: impl IntoIterator<Item = (NodeId, Vec2)>,
        bidirectional: bool,
    ) -> Result<Self, GraphError> {
        let points: Vec<(NodeId, Vec2)> = points.into_iter().collect();
        let ids: Vec<NodeId> = points.iter().map(|(id, _)| *id).collect();
        let n = ids.len();

        let specs = points
            .iter()
            .enumerate()
            .map(|(i, &(id, position))| {
                let next = ids[(i + 1) % n];
                let mut successors = vec![next];
                if bidirectional {
                    let prev = ids[(i + n - 1) % n];
                    if prev != next {
                        successors.push(prev);
                    }
                }
                NodeSpec {
                    id,
                    position,
                    successors,
                }
            })
            .collect();

        Self::from_specs(specs)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&WaypointNode> {
        self.index.get(&id).and_then(|&i| self.nodes.get(i))
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.node(id).map(|n| n.position)
    }

    pub fn successors(&self, id: NodeId) -> Option<&[NodeId]> {
        self.node(id).map(WaypointNode::successors)
    }

    /// Iterate nodes in authoring order
    pub fn iter(&self) -> impl Iterator<Item = &WaypointNode> {
        self.nodes.iter()
    }

    /// Pick a uniformly random successor of `id`
    pub fn successor_of<R: Rng + ?Sized>(&self, id: NodeId, rng: &mut R) -> Option<NodeId> {
        self.node(id)?.successors.choose(rng).copied()
    }

    /// Node closest to `position` (first in authoring order on ties)
    pub fn nearest_node(&self, position: Vec2) -> Option<NodeId> {
        self.scan(position, |candidate, best| candidate < best)
    }

    /// Node farthest from `position` (first in authoring order on ties)
    pub fn farthest_node(&self, position: Vec2) -> Option<NodeId> {
        self.scan(position, |candidate, best| candidate > best)
    }

    fn scan(&self, position: Vec2, better: impl Fn(f32, f32) -> bool) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for node in &self.nodes {
            let dist_sq = node.position.distance_squared(position);
            if best.is_none_or(|(_, best_sq)| better(dist_sq, best_sq)) {
                best = Some((node.id, dist_sq));
            }
        }
        best.map(|(id, _)| id)
    }
}
