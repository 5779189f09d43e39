//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep for movement, patrol and respawn timing
//! - Seeded RNG only
//! - Stable iteration order (authoring order for waypoints)
//! - No rendering, audio or platform dependencies; presentation drains events

pub mod enemy;
pub mod graph;
pub mod math;
pub mod player;
pub mod respawn;
pub mod state;
pub mod tick;

pub use enemy::{ChaseMode, ChaseTransition, DetectionRadii, Enemy, Leg};
pub use graph::{NodeId, NodeSpec, WaypointGraph, WaypointNode};
pub use player::{DashPhase, DashState, DeathOutcome, Meter, Player, PlayerInput, PlayerSnapshot};
pub use respawn::{RespawnSequence, RespawnStep};
pub use state::{Locomotion, SessionPhase, SimEvent, Simulation};
pub use tick::{Tick, advance_frame, fixed_tick, variable_tick};
