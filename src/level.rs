//! Level descriptions
//!
//! A level is a waypoint table plus the two spawn points, stored as JSON:
//!
//! ```json
//! {
//!   "name": "cellar",
//!   "player_start": [0.0, 0.0],
//!   "enemy_start": 1,
//!   "nodes": [
//!     { "id": 1, "position": [4.0, 0.0], "successors": [2] },
//!     { "id": 2, "position": [4.0, 4.0], "successors": [1] }
//!   ]
//! }
//! ```
//!
//! With `"layout": "ring"` or `"ring_bidirectional"` the successor lists are
//! generated from node order and may be left out.

use std::f32::consts::TAU;
use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, GraphError, Result};
use crate::sim::graph::{NodeId, NodeSpec, WaypointGraph};

/// How successor lists are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Every node lists its own successors
    #[default]
    Explicit,
    /// Closed loop in node order
    Ring,
    /// Closed loop walkable in both directions
    RingBidirectional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub name: Option<String>,
    pub player_start: Vec2,
    pub enemy_start: NodeId,
    #[serde(default)]
    pub layout: Layout,
    pub nodes: Vec<NodeSpec>,
}

impl Level {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a level file, checking that its graph builds
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::from_json_str(&json)?;
        let graph = level.build_graph()?;
        if !graph.contains(level.enemy_start) {
            return Err(GraphError::UnknownNode(level.enemy_start).into());
        }
        log::info!(
            "Loaded level {} from {} ({} waypoints)",
            level.display_name(),
            path.display(),
            graph.len()
        );
        Ok(level)
    }

    /// Validate the waypoint table and build the patrol graph
    pub fn build_graph(&self) -> std::result::Result<WaypointGraph, GraphError> {
        match self.layout {
            Layout::Explicit => WaypointGraph::from_specs(self.nodes.clone()),
            Layout::Ring | Layout::RingBidirectional => {
                if self.nodes.iter().any(|n| !n.successors.is_empty()) {
                    log::warn!(
                        "Level {} uses a ring layout; listed successors are ignored",
                        self.display_name()
                    );
                }
                let points = self.nodes.iter().map(|n| (n.id, n.position));
                WaypointGraph::ring(points, self.layout == Layout::RingBidirectional)
            }
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Built-in level: eight waypoints on a two-way ring of radius 8 around
    /// the player's start
    pub fn demo() -> Self {
        const COUNT: u32 = 8;
        const RADIUS: f32 = 8.0;

        let nodes = (0..COUNT)
            .map(|i| {
                let angle = TAU * i as f32 / COUNT as f32;
                NodeSpec::new(i, Vec2::from_angle(angle) * RADIUS, &[])
            })
            .collect();

        Self {
            name: Some("demo ring".into()),
            player_start: Vec2::ZERO,
            enemy_start: NodeId(0),
            layout: Layout::RingBidirectional,
            nodes,
        }
    }
}
