//! Gameplay tuning
//!
//! One structure enumerates every tunable of both actors and of the catch and
//! respawn sequence. Defaults are the shipped balance. A JSON file can
//! override any subset: missing keys fall back to the defaults.
//!
//! ```json
//! { "enemy": { "chase_speed": 4.5 }, "player": { "drain_policy": "everywhere" } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, TuningError};

/// How the meter drains while the player is not building it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Meter only drains inside a hide-out; outside it holds its value
    #[default]
    HideOutOnly,
    /// Meter always drains; hide-outs apply `meter_hide_out_multiplier`
    Everywhere,
}

/// Player locomotion, dash, meter and life tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    // === Movement ===
    /// Top speed (units/s) at full input
    pub move_speed: f32,
    /// Velocity change rate (units/s²) while input is held
    pub acceleration: f32,
    /// Velocity change rate (units/s²) when input is released
    pub deceleration: f32,
    /// Normalize input only when its length exceeds 1
    pub normalize_diagonal: bool,

    // === Analog input ===
    pub input_deadzone: f32,
    /// Remap [deadzone, 1] to [0, 1] after the deadzone cut
    pub rescale_after_deadzone: bool,

    // === Dash ===
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    /// Dash along current input when there is any, else the last direction
    pub dash_uses_input_or_last_direction: bool,

    // === Meter ===
    pub meter_max: f32,
    pub meter_build_rate: f32,
    pub meter_drain_rate: f32,
    pub meter_hide_out_multiplier: f32,
    /// Desired speed above which the player counts as trying to move
    pub moving_threshold: f32,
    /// Actual speed required before the meter builds at all
    pub min_build_up_speed: f32,
    /// Ramp build rate from 0 at `min_build_up_speed` to 1 at `move_speed`
    pub use_intensity_for_meter: bool,
    pub drain_policy: DrainPolicy,

    // === Facing ===
    pub rotation_speed: f32,

    // === Lives ===
    pub lives: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            acceleration: 40.0,
            deceleration: 55.0,
            normalize_diagonal: true,

            input_deadzone: 0.15,
            rescale_after_deadzone: true,

            dash_speed: 14.0,
            dash_duration: 0.12,
            dash_cooldown: 0.35,
            dash_uses_input_or_last_direction: true,

            meter_max: 100.0,
            meter_build_rate: 35.0,
            meter_drain_rate: 65.0,
            meter_hide_out_multiplier: 2.0,
            moving_threshold: 0.05,
            min_build_up_speed: 3.0,
            use_intensity_for_meter: false,
            drain_policy: DrainPolicy::HideOutOnly,

            rotation_speed: 15.0,

            lives: 3,
        }
    }
}

/// Enemy patrol, chase and detection tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub rotation_speed: f32,

    // === Detection ===
    /// Detection radius at an empty meter
    pub min_detect_radius: f32,
    /// Detection radius at a full meter
    pub max_detect_radius: f32,
    /// Radius inside which detection ignores the meter entirely
    pub guaranteed_detect_radius: f32,
    /// Extra distance beyond the detection radius before a chase is dropped
    pub lose_radius_bonus: f32,

    /// Distance at which a waypoint counts as reached
    pub arrival_epsilon: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            patrol_speed: 2.0,
            chase_speed: 4.0,
            rotation_speed: 15.0,

            min_detect_radius: 1.5,
            max_detect_radius: 6.0,
            guaranteed_detect_radius: 1.0,
            lose_radius_bonus: 1.25,

            arrival_epsilon: 0.001,
        }
    }
}

/// Catch and respawn timing (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnTuning {
    /// Delay between an overlap report and the catch landing
    pub attack_windup: f32,
    /// Suspended time before the player is moved back to the start
    pub fade_out: f32,
    /// Suspended time after the move, before play resumes
    pub fade_in: f32,
    /// Undetectable time after play resumes
    pub immunity: f32,
}

impl Default for RespawnTuning {
    fn default() -> Self {
        Self {
            attack_windup: 0.1,
            fade_out: 1.5,
            fade_in: 1.5,
            immunity: 3.0,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub respawn: RespawnTuning,
}

impl Tuning {
    /// Parse (without validating) a JSON tuning document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read, parse and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_json_str(&json)?;
        tuning.validate()?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Like [`Tuning::load`], but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("No tuning file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Check every value against its accepted range
    pub fn validate(&self) -> std::result::Result<(), TuningError> {
        let p = &self.player;
        non_negative("player.move_speed", p.move_speed)?;
        non_negative("player.acceleration", p.acceleration)?;
        non_negative("player.deceleration", p.deceleration)?;
        if !(0.0..1.0).contains(&p.input_deadzone) {
            return Err(TuningError::invalid("player.input_deadzone", "must be in [0, 1)"));
        }
        non_negative("player.dash_speed", p.dash_speed)?;
        non_negative("player.dash_duration", p.dash_duration)?;
        non_negative("player.dash_cooldown", p.dash_cooldown)?;
        non_negative("player.meter_max", p.meter_max)?;
        non_negative("player.meter_build_rate", p.meter_build_rate)?;
        non_negative("player.meter_drain_rate", p.meter_drain_rate)?;
        non_negative("player.meter_hide_out_multiplier", p.meter_hide_out_multiplier)?;
        non_negative("player.moving_threshold", p.moving_threshold)?;
        non_negative("player.min_build_up_speed", p.min_build_up_speed)?;
        non_negative("player.rotation_speed", p.rotation_speed)?;
        if p.lives < 0 {
            return Err(TuningError::invalid("player.lives", "must be >= 0"));
        }

        let e = &self.enemy;
        non_negative("enemy.patrol_speed", e.patrol_speed)?;
        non_negative("enemy.chase_speed", e.chase_speed)?;
        non_negative("enemy.rotation_speed", e.rotation_speed)?;
        non_negative("enemy.min_detect_radius", e.min_detect_radius)?;
        non_negative("enemy.max_detect_radius", e.max_detect_radius)?;
        if e.min_detect_radius > e.max_detect_radius {
            return Err(TuningError::invalid(
                "enemy.min_detect_radius",
                "must not exceed enemy.max_detect_radius",
            ));
        }
        non_negative("enemy.guaranteed_detect_radius", e.guaranteed_detect_radius)?;
        non_negative("enemy.lose_radius_bonus", e.lose_radius_bonus)?;
        positive("enemy.arrival_epsilon", e.arrival_epsilon)?;

        let r = &self.respawn;
        non_negative("respawn.attack_windup", r.attack_windup)?;
        non_negative("respawn.fade_out", r.fade_out)?;
        non_negative("respawn.fade_in", r.fade_in)?;
        non_negative("respawn.immunity", r.immunity)?;

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> std::result::Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::invalid(field, format!("must be a finite value >= 0, got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> std::result::Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::invalid(field, format!("must be a finite value > 0, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let tuning = Tuning::from_json_str(
            r#"{ "enemy": { "chase_speed": 4.5 }, "player": { "drain_policy": "everywhere" } }"#,
        )
        .unwrap();
        assert_eq!(tuning.enemy.chase_speed, 4.5);
        assert_eq!(tuning.enemy.patrol_speed, 2.0);
        assert_eq!(tuning.player.drain_policy, DrainPolicy::Everywhere);
        assert_eq!(tuning.player.dash_cooldown, 0.35);
        assert_eq!(tuning.respawn, RespawnTuning::default());
    }

    #[test]
    fn test_validate_rejects_inverted_detection_radii() {
        let mut tuning = Tuning::default();
        tuning.enemy.min_detect_radius = 7.0;
        let err = tuning.validate().unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "enemy.min_detect_radius",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_nan_and_bad_deadzone() {
        let mut tuning = Tuning::default();
        tuning.player.move_speed = f32::NAN;
        assert!(tuning.validate().is_err());

        let mut tuning = Tuning::default();
        tuning.player.input_deadzone = 1.0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_arrival_epsilon_must_be_positive() {
        for bad in [0.0, -0.01, f32::NAN, f32::INFINITY] {
            let mut tuning = Tuning::default();
            tuning.enemy.arrival_epsilon = bad;
            assert!(
                matches!(
                    tuning.validate(),
                    Err(TuningError::Invalid {
                        field: "enemy.arrival_epsilon",
                        ..
                    })
                ),
                "accepted {bad}"
            );
        }

        let mut tuning = Tuning::default();
        tuning.enemy.arrival_epsilon = 0.001;
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = Tuning::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("definitely/not/here.json"));
    }

    #[test]
    fn test_load_or_default_falls_back_when_missing() {
        let tuning = Tuning::load_or_default("definitely/not/here.json").unwrap();
        assert_eq!(tuning, Tuning::default());
    }
}
