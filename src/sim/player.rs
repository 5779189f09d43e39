//! Player locomotion and stealth meter
//!
//! Two entry points per frame:
//! - [`Player::update`] on the variable tick: input, dash request and
//!   cooldown, facing target, meter
//! - [`Player::fixed_update`] on the fixed tick: velocity and position
//!   integration, dash time, facing rotation
//!
//! The meter is the player's visibility. It builds while the player moves at
//! speed and drains while they hold still (by default only inside a hide-out).

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::math::{
    DIRECTION_EPSILON_SQ, damp_factor, inverse_lerp, lerp_angle, move_towards, move_towards_f32,
    sanitize_input,
};
use super::state::Locomotion;
use super::tick::Tick;
use crate::tuning::{DrainPolicy, PlayerTuning};

/// Input for one variable tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Analog or digital movement in [-1, 1]²
    pub movement: Vec2,
    /// Dash button went down this tick
    pub dash: bool,
}

impl PlayerInput {
    pub fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            dash: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DashPhase {
    #[default]
    Idle,
    Dashing,
}

/// Dash state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashState {
    pub phase: DashPhase,
    /// Seconds of dash left (positive while dashing)
    pub timer: f32,
    /// Seconds until another dash may start
    pub cooldown: f32,
    /// Unit direction of the current or last dash
    pub direction: Vec2,
}

impl Default for DashState {
    fn default() -> Self {
        Self {
            phase: DashPhase::Idle,
            timer: 0.0,
            cooldown: 0.0,
            direction: Vec2::X,
        }
    }
}

impl DashState {
    pub fn is_dashing(&self) -> bool {
        self.phase == DashPhase::Dashing
    }

    pub fn can_start(&self) -> bool {
        !self.is_dashing() && self.cooldown <= 0.0
    }

    /// Enter Dashing, resetting both timers together. Returns false (and
    /// changes nothing) while dashing or cooling down.
    fn start(&mut self, direction: Vec2, duration: f32, cooldown: f32) -> bool {
        if !self.can_start() || duration <= 0.0 {
            return false;
        }
        self.phase = DashPhase::Dashing;
        self.timer = duration;
        self.cooldown = cooldown;
        self.direction = direction;
        true
    }

    /// Variable tick: count the cooldown down to 0
    fn cool_down(&mut self, dt: f32) {
        self.cooldown = move_towards_f32(self.cooldown, 0.0, dt);
    }

    /// Fixed tick: spend dash time after the dash velocity has been applied
    fn advance_dash(&mut self, dt: f32) {
        if !self.is_dashing() {
            return;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.timer = 0.0;
            self.phase = DashPhase::Idle;
        }
    }

    fn clear(&mut self) {
        self.phase = DashPhase::Idle;
        self.timer = 0.0;
    }
}

/// Visibility meter in [0, max]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    value: f32,
    max: f32,
}

impl Meter {
    pub fn new(max: f32) -> Self {
        Self { value: 0.0, max }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Value as a fraction of max in [0, 1]; 0 when max is not positive
    pub fn normalized(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.value / self.max).clamp(0.0, 1.0)
        }
    }

    /// Add (or with a negative delta, remove) and clamp to [0, max]
    pub fn add(&mut self, delta: f32) {
        self.value = (self.value + delta).clamp(0.0, self.max.max(0.0));
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

/// What a death leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathOutcome {
    /// Lives remain; the respawn sequence should run
    Respawning,
    /// Lives went negative; the session is over
    SessionOver,
}

/// Read-only view of the player handed to the enemy each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub position: Vec2,
    pub meter_normalized: f32,
    pub immune: bool,
    pub dead: bool,
}

impl PlayerSnapshot {
    /// Whether the enemy may detect or keep chasing this player
    pub fn is_detectable(&self) -> bool {
        !self.immune && !self.dead
    }
}

/// The player actor
#[derive(Debug, Clone)]
pub struct Player {
    tuning: PlayerTuning,
    locomotion: Locomotion,
    dash_state: DashState,
    meter: Meter,
    /// Processed input; keeps analog magnitude in [0, 1]
    move_dir: Vec2,
    last_direction: Vec2,
    flip_x: bool,
    in_hide_out: bool,
    dead: bool,
    immune: bool,
    lives: i32,
    start_position: Vec2,
}

impl Player {
    pub fn new(tuning: PlayerTuning, start_position: Vec2) -> Self {
        let meter = Meter::new(tuning.meter_max);
        let lives = tuning.lives;
        Self {
            tuning,
            locomotion: Locomotion::at(start_position),
            dash_state: DashState::default(),
            meter,
            move_dir: Vec2::ZERO,
            last_direction: Vec2::X,
            flip_x: false,
            in_hide_out: false,
            dead: false,
            immune: false,
            lives,
            start_position,
        }
    }

    /// Variable-tick update. Returns true when a dash started this tick.
    pub fn update(&mut self, input: &PlayerInput, tick: Tick) -> bool {
        if tick.paused || self.dead {
            return false;
        }

        self.move_dir = self.process_input(input.movement);
        if self.move_dir.length_squared() > DIRECTION_EPSILON_SQ {
            self.last_direction = self.move_dir.normalize();
        }
        self.aim_facing(self.heading());

        self.dash_state.cool_down(tick.dt);
        let dashed = input.dash && self.dash();

        self.update_meter(tick.dt);

        dashed
    }

    /// Fixed-tick update: integrate velocity, position and facing
    pub fn fixed_update(&mut self, tick: Tick) {
        if tick.paused || self.dead || tick.dt <= 0.0 {
            return;
        }
        let dt = tick.dt;

        if self.dash_state.is_dashing() {
            self.locomotion.velocity = self.dash_state.direction * self.tuning.dash_speed;
            self.dash_state.advance_dash(dt);
        } else {
            let target = self.move_dir * self.tuning.move_speed;
            let rate = if target.length_squared() > DIRECTION_EPSILON_SQ {
                self.tuning.acceleration
            } else {
                self.tuning.deceleration
            };
            self.locomotion.velocity = move_towards(self.locomotion.velocity, target, rate * dt);
        }

        self.locomotion.position += self.locomotion.velocity * dt;
        self.locomotion.facing = lerp_angle(
            self.locomotion.facing,
            self.locomotion.target_facing,
            damp_factor(self.tuning.rotation_speed, dt),
        );
    }

    /// Request a dash. Returns false (state unchanged) while dashing or
    /// cooling down.
    pub fn dash(&mut self) -> bool {
        if self.dead || !self.dash_state.can_start() {
            return false;
        }

        let mut direction = if self.tuning.dash_uses_input_or_last_direction
            && self.move_dir.length_squared() > DIRECTION_EPSILON_SQ
        {
            self.move_dir.normalize()
        } else {
            self.last_direction.normalize_or_zero()
        };
        if direction.length_squared() <= DIRECTION_EPSILON_SQ {
            direction = Vec2::X;
        }

        let started = self.dash_state.start(
            direction,
            self.tuning.dash_duration,
            self.tuning.dash_cooldown,
        );
        if started {
            self.aim_facing(direction);
            log::debug!("Dash toward ({:.2}, {:.2})", direction.x, direction.y);
        }
        started
    }

    /// Deadzone, rescale and diagonal normalization
    fn process_input(&self, raw: Vec2) -> Vec2 {
        let mut dir = apply_deadzone(
            sanitize_input(raw),
            self.tuning.input_deadzone,
            self.tuning.rescale_after_deadzone,
        );
        if self.tuning.normalize_diagonal && dir.length_squared() > 1.0 {
            dir = dir.normalize();
        }
        dir
    }

    fn heading(&self) -> Vec2 {
        if self.move_dir.length_squared() > DIRECTION_EPSILON_SQ {
            self.move_dir
        } else {
            self.last_direction
        }
    }

    fn aim_facing(&mut self, dir: Vec2) {
        if let Some((angle, flip)) = facing_for(dir) {
            self.flip_x = flip;
            self.locomotion.target_facing = angle;
        }
    }

    fn update_meter(&mut self, dt: f32) {
        let t = &self.tuning;
        let speed = self.locomotion.velocity.length();
        let desired_speed = self.move_dir.length() * t.move_speed;
        let trying_to_move = desired_speed > t.moving_threshold;
        let can_build = trying_to_move && speed >= t.min_build_up_speed;

        if can_build {
            let intensity = if !t.use_intensity_for_meter {
                1.0
            } else if t.move_speed <= 0.0 {
                0.0
            } else {
                inverse_lerp(t.min_build_up_speed, t.move_speed, speed)
            };
            self.meter.add(t.meter_build_rate * intensity * dt);
        } else {
            let drain = match (t.drain_policy, self.in_hide_out) {
                (DrainPolicy::HideOutOnly, true) => t.meter_drain_rate,
                (DrainPolicy::HideOutOnly, false) => 0.0,
                (DrainPolicy::Everywhere, true) => t.meter_drain_rate * t.meter_hide_out_multiplier,
                (DrainPolicy::Everywhere, false) => t.meter_drain_rate,
            };
            self.meter.add(-drain * dt);
        }
    }

    pub fn enter_hide_out(&mut self) {
        self.in_hide_out = true;
    }

    pub fn exit_hide_out(&mut self) {
        self.in_hide_out = false;
    }

    // === Death and respawn ===

    /// Kill the player: lose a life, stop, empty the meter.
    ///
    /// Returns `None` if the player was already dead.
    pub fn die(&mut self) -> Option<DeathOutcome> {
        if self.dead {
            return None;
        }
        self.dead = true;
        self.immune = false;
        self.lives -= 1;
        self.locomotion.velocity = Vec2::ZERO;
        self.meter.reset();
        self.dash_state.clear();

        if self.lives < 0 {
            Some(DeathOutcome::SessionOver)
        } else {
            Some(DeathOutcome::Respawning)
        }
    }

    pub fn restore_to_start(&mut self) {
        self.locomotion.position = self.start_position;
        self.locomotion.velocity = Vec2::ZERO;
    }

    /// Bring the player back to life, undetectable until [`Player::end_immunity`]
    pub fn begin_immunity(&mut self) {
        self.dead = false;
        self.immune = true;
    }

    pub fn end_immunity(&mut self) {
        self.immune = false;
    }

    // === Read-only accessors ===

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.locomotion.position,
            meter_normalized: self.meter.normalized(),
            immune: self.immune,
            dead: self.dead,
        }
    }

    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub fn position(&self) -> Vec2 {
        self.locomotion.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.locomotion.velocity
    }

    pub fn facing(&self) -> f32 {
        self.locomotion.facing
    }

    pub fn meter(&self) -> f32 {
        self.meter.value()
    }

    pub fn meter_normalized(&self) -> f32 {
        self.meter.normalized()
    }

    pub fn last_direction(&self) -> Vec2 {
        self.last_direction
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn dash_state(&self) -> &DashState {
        &self.dash_state
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_state.is_dashing()
    }

    pub fn in_hide_out(&self) -> bool {
        self.in_hide_out
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_immune(&self) -> bool {
        self.immune
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn start_position(&self) -> Vec2 {
        self.start_position
    }

    #[cfg(test)]
    pub(crate) fn fill_meter(&mut self, fraction: f32) {
        self.meter.reset();
        self.meter.add(self.meter.max() * fraction);
    }

    #[cfg(test)]
    pub(crate) fn locomotion_mut(&mut self) -> &mut Locomotion {
        &mut self.locomotion
    }
}

/// Zero small inputs; optionally remap the rest so partial tilt stays
/// proportional.
pub fn apply_deadzone(input: Vec2, deadzone: f32, rescale: bool) -> Vec2 {
    if deadzone <= 0.0 {
        return input;
    }
    let magnitude = input.length();
    if magnitude <= deadzone {
        return Vec2::ZERO;
    }
    if !rescale {
        return input;
    }
    input / magnitude * inverse_lerp(deadzone, 1.0, magnitude)
}

/// Sprite facing for a movement direction: (angle, flip_x).
///
/// The angle is measured against the horizontal the sprite faces after
/// flipping, so it stays within [-π/2, π/2].
pub fn facing_for(dir: Vec2) -> Option<(f32, bool)> {
    if dir.length_squared() <= DIRECTION_EPSILON_SQ {
        return None;
    }
    let flip = dir.x < 0.0;
    let mut angle = dir.y.atan2(dir.x.abs());
    if flip {
        angle = -angle;
    }
    Some((angle.clamp(-FRAC_PI_2, FRAC_PI_2), flip))
}
