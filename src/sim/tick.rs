//! Frame and fixed-step ticks
//!
//! Each rendered frame runs one variable tick (input, dash, meter), then as
//! many fixed ticks as the accumulated scaled time allows. Fixed ticks always
//! use the same `dt`, which keeps movement, patrol choices and respawn timing
//! reproducible for a given seed and input sequence.

use super::enemy::ChaseTransition;
use super::player::PlayerInput;
use super::state::{SessionPhase, SimEvent, Simulation};
use crate::consts::*;

/// Time step handed to actor updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Seconds to advance by
    pub dt: f32,
    /// Time scale is 0; actors must not change
    pub paused: bool,
}

impl Tick {
    /// Frame tick: `real_dt` scaled by the time scale
    pub fn variable(real_dt: f32, scale: f32) -> Self {
        Self {
            dt: real_dt * scale,
            paused: scale <= 0.0,
        }
    }

    /// Fixed tick: `step` is already simulated time, only the pause flag
    /// depends on the time scale
    pub fn fixed(step: f32, scale: f32) -> Self {
        Self {
            dt: step,
            paused: scale <= 0.0,
        }
    }
}

/// Variable-rate update: player input, dash, meter and the shown detection radius
pub fn variable_tick(sim: &mut Simulation, input: &PlayerInput, dt: f32) {
    if sim.phase == SessionPhase::Over {
        return;
    }
    let tick = Tick::variable(dt, sim.time_scale);
    if sim.player.update(input, tick) {
        sim.events.push(SimEvent::DashStarted);
    }
    sim.smooth_shown_radius(tick.dt);
}

/// Advance the simulation by one fixed timestep
pub fn fixed_tick(sim: &mut Simulation, dt: f32) {
    let tick = Tick::fixed(dt, sim.time_scale);
    if tick.paused || sim.phase == SessionPhase::Over {
        return;
    }

    sim.player.fixed_update(tick);

    let snapshot = sim.player.snapshot();
    match sim
        .enemy
        .update(&sim.graph, Some(&snapshot), tick, &mut sim.rng)
    {
        Some(ChaseTransition::Started) => sim.events.push(SimEvent::ChaseStarted),
        Some(ChaseTransition::Ended) => sim.events.push(SimEvent::ChaseEnded),
        None => {}
    }

    sim.advance_coupling(tick.dt);
    sim.time_ticks += 1;
}

/// Run one frame: a variable tick, then fixed ticks from the accumulator.
///
/// `frame_dt` is capped at [`MAX_FRAME_DT`] and at most [`MAX_SUBSTEPS`]
/// fixed ticks run; whole steps still owed after that are dropped. Returns
/// the number of fixed ticks run.
pub fn advance_frame(sim: &mut Simulation, input: &PlayerInput, frame_dt: f32) -> u32 {
    let frame_dt = if frame_dt.is_finite() {
        frame_dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };

    variable_tick(sim, input, frame_dt);

    sim.accumulator += frame_dt * sim.time_scale;
    let mut substeps = 0;
    while sim.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        fixed_tick(sim, SIM_DT);
        sim.accumulator -= SIM_DT;
        substeps += 1;
    }
    if substeps == MAX_SUBSTEPS && sim.accumulator >= SIM_DT {
        log::debug!(
            "Dropping {:.3}s of simulation time after {MAX_SUBSTEPS} substeps",
            sim.accumulator
        );
        sim.accumulator %= SIM_DT;
    }
    substeps
}
