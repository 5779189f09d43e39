//! Deepchase - stealth-chase simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player locomotion and meter, patrol graph,
//!   enemy detection/chase, catch and respawn coupling)
//! - `tuning`: Data-driven gameplay balance
//! - `level`: Level description loading (waypoint table, spawn points)
//! - `error`: Error taxonomy for load-time failures
//! - `logging`: Logger bootstrap for binaries

pub mod error;
pub mod level;
pub mod logging;
pub mod sim;
pub mod tuning;

pub use error::{Error, GraphError, Result, TuningError};
pub use level::{Layout, Level};
pub use tuning::{DrainPolicy, EnemyTuning, PlayerTuning, RespawnTuning, Tuning};

/// Simulation clock constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum fixed substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
