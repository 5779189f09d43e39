//! Simulation state and coupling
//!
//! [`Simulation`] owns both actors, the patrol graph and everything that ties
//! them together: the catch, the timed respawn sequence and the session
//! phase. Presentation never gets called from here; it reads accessors and
//! drains [`SimEvent`]s instead.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::graph::WaypointGraph;
use super::player::{DeathOutcome, Player};
use super::respawn::{RespawnSequence, RespawnStep};
use super::math::smooth_damp_f32;
use crate::level::Level;
use crate::tuning::Tuning;

/// Smoothing time for the detection radius shown to presentation
const SHOWN_RADIUS_SMOOTH_TIME: f32 = 0.15;

/// Kinematic state shared by both actors
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Locomotion {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Current facing angle (radians)
    pub facing: f32,
    /// Angle the facing rotates toward
    pub target_facing: f32,
}

impl Locomotion {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Notification for presentation (audio, camera, UI, fades)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    DashStarted,
    ChaseStarted,
    ChaseEnded,
    /// The player was caught; `lives_left` is negative when none remain
    Caught { lives_left: i32 },
    FadeOut,
    FadeIn,
    Respawned,
    ImmunityEnded,
    SessionOver,
    RespawnCancelled,
}

/// Whether the session is still being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Running,
    /// Terminal: actors stay halted and nothing respawns
    Over,
}

/// Complete simulation state (deterministic for a given seed and input)
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Run seed for reproducibility
    pub(crate) seed: u64,
    pub(crate) graph: WaypointGraph,
    pub(crate) player: Player,
    pub(crate) enemy: Enemy,
    pub(crate) rng: Pcg32,
    pub(crate) tuning: Tuning,
    pub(crate) time_scale: f32,
    pub(crate) respawn: RespawnSequence,
    /// Seconds until a reported overlap turns into a catch
    pub(crate) pending_bite: Option<f32>,
    pub(crate) phase: SessionPhase,
    /// Unconsumed scaled time for fixed steps
    pub(crate) accumulator: f32,
    /// Fixed ticks run so far
    pub(crate) time_ticks: u64,
    /// Detection radius eased toward [`Simulation::detect_radius`] for display
    pub(crate) shown_detect_radius: f32,
    shown_detect_velocity: f32,
    pub(crate) events: Vec<SimEvent>,
}

impl Simulation {
    /// Validate the tuning, build the level's graph and place both actors
    pub fn new(level: &Level, tuning: Tuning, seed: u64) -> crate::Result<Self> {
        tuning.validate()?;
        let graph = level.build_graph()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let enemy = Enemy::new(tuning.enemy.clone(), &graph, level.enemy_start, &mut rng)?;
        let player = Player::new(tuning.player.clone(), level.player_start);
        let shown_detect_radius = enemy.current_detect_radius(player.meter_normalized());

        log::info!(
            "Session started on {} ({} waypoints, seed {seed})",
            level.display_name(),
            graph.len()
        );

        Ok(Self {
            seed,
            graph,
            player,
            enemy,
            rng,
            tuning,
            time_scale: 1.0,
            respawn: RespawnSequence::Idle,
            pending_bite: None,
            phase: SessionPhase::Running,
            accumulator: 0.0,
            time_ticks: 0,
            shown_detect_radius,
            shown_detect_velocity: 0.0,
            events: Vec::new(),
        })
    }

    // === Collaborator entry points ===

    /// Catch the player right now.
    ///
    /// Returns false (and does nothing) once the session is over or while
    /// the player is already dead.
    pub fn catch_player(&mut self) -> bool {
        if self.phase == SessionPhase::Over || self.player.is_dead() {
            return false;
        }
        self.pending_bite = None;

        let caught_at = self.player.position();
        let was_chasing = self.enemy.is_chasing();
        self.enemy
            .relocate_farthest_from(&self.graph, caught_at, &mut self.rng);
        self.enemy.set_moving(false);
        if was_chasing {
            self.events.push(SimEvent::ChaseEnded);
        }

        let Some(outcome) = self.player.die() else {
            return false;
        };
        let lives_left = self.player.lives();
        self.events.push(SimEvent::Caught { lives_left });

        match outcome {
            DeathOutcome::Respawning => {
                log::info!("Player caught, {lives_left} lives left");
                self.respawn = RespawnSequence::start(&self.tuning.respawn);
                self.events.push(SimEvent::FadeOut);
            }
            DeathOutcome::SessionOver => {
                log::info!("Player caught with no lives left, session over");
                self.phase = SessionPhase::Over;
                self.events.push(SimEvent::SessionOver);
            }
        }
        true
    }

    /// The enemy touched the player: start the bite wind-up.
    ///
    /// Ignored while the player is immune or dead, once the session is
    /// over, or while a wind-up is already pending. Returns whether the
    /// report was accepted.
    pub fn report_overlap(&mut self) -> bool {
        if self.phase == SessionPhase::Over
            || self.player.is_dead()
            || self.player.is_immune()
            || self.pending_bite.is_some()
        {
            return false;
        }

        let windup = self.tuning.respawn.attack_windup;
        if windup <= 0.0 {
            return self.catch_player();
        }
        self.pending_bite = Some(windup);
        true
    }

    /// Abort an in-flight respawn sequence.
    ///
    /// A player still fading never comes back, so the session ends there. A
    /// player already back in play just loses the rest of their immunity.
    pub fn cancel_respawn(&mut self) -> bool {
        let Some(interrupted) = self.respawn.cancel() else {
            return false;
        };
        if let RespawnSequence::Immune { .. } = interrupted {
            self.player.end_immunity();
        }
        log::debug!("Respawn cancelled during {interrupted:?}");
        self.events.push(SimEvent::RespawnCancelled);
        if interrupted.suspends_player() {
            self.finish_session();
        }
        true
    }

    /// Stop the session for good
    pub fn end_session(&mut self) {
        if self.phase == SessionPhase::Over {
            return;
        }
        self.pending_bite = None;
        self.cancel_respawn();
        self.finish_session();
    }

    fn finish_session(&mut self) {
        if self.phase == SessionPhase::Over {
            return;
        }
        self.enemy.set_moving(false);
        self.phase = SessionPhase::Over;
        self.events.push(SimEvent::SessionOver);
        log::info!("Session ended after {} ticks", self.time_ticks);
    }

    pub fn enter_hide_out(&mut self) {
        self.player.enter_hide_out();
    }

    pub fn exit_hide_out(&mut self) {
        self.player.exit_hide_out();
    }

    /// Set the time scale; 0 pauses. Negative or non-finite values pause.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() && scale >= 0.0 {
            scale
        } else {
            log::warn!("Time scale {scale} is not a finite value >= 0, pausing instead");
            0.0
        };
    }

    /// Hand queued events to presentation, oldest first
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Count down the bite wind-up and the respawn sequence by one fixed step
    pub(crate) fn advance_coupling(&mut self, dt: f32) {
        if let Some(remaining) = self.pending_bite.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.pending_bite = None;
                self.catch_player();
            }
        }

        let Some(step) = self.respawn.advance(dt, &self.tuning.respawn) else {
            return;
        };
        match step {
            RespawnStep::Restore => {
                self.player.restore_to_start();
                self.events.push(SimEvent::FadeIn);
                log::debug!("Respawn: player back at start, fading in");
            }
            RespawnStep::Resume => {
                self.enemy.set_moving(true);
                self.player.begin_immunity();
                self.events.push(SimEvent::Respawned);
                log::debug!("Respawn: play resumed, player immune");
            }
            RespawnStep::ImmunityOver => {
                self.player.end_immunity();
                self.events.push(SimEvent::ImmunityEnded);
                log::debug!("Respawn: immunity over");
            }
        }
    }

    /// Ease the shown detection radius toward the live one by `dt` seconds
    pub(crate) fn smooth_shown_radius(&mut self, dt: f32) {
        self.shown_detect_radius = smooth_damp_f32(
            self.shown_detect_radius,
            self.detect_radius(),
            &mut self.shown_detect_velocity,
            SHOWN_RADIUS_SMOOTH_TIME,
            f32::INFINITY,
            dt,
        );
    }

    // === Read-only accessors ===

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn respawn(&self) -> RespawnSequence {
        self.respawn
    }

    pub fn is_bite_pending(&self) -> bool {
        self.pending_bite.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::Over
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Queued events not yet drained
    pub fn pending_events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Detection radius around the enemy for the player's current meter
    pub fn detect_radius(&self) -> f32 {
        self.enemy
            .current_detect_radius(self.player.meter_normalized())
    }

    /// [`Self::detect_radius`] smoothed over frames, for drawing
    pub fn shown_detect_radius(&self) -> f32 {
        self.shown_detect_radius
    }
}
