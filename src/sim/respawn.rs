//! Timed death/respawn sequence
//!
//! Plain state advanced by the fixed tick. It can be cancelled at any point.

use serde::{Deserialize, Serialize};

use crate::tuning::RespawnTuning;

/// Phase of the respawn sequence, with seconds remaining in that phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RespawnSequence {
    #[default]
    Idle,
    /// Player is dead and suspended where they were caught
    FadingOut { remaining: f32 },
    /// Player is back at the start but still suspended
    FadingIn { remaining: f32 },
    /// Player is active again but undetectable
    Immune { remaining: f32 },
}

/// Effect the coupling layer must apply when a phase ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnStep {
    /// Move the player back to the start position
    Restore,
    /// Revive the player (immune) and let the enemy move again
    Resume,
    /// Immunity is over
    ImmunityOver,
}

impl RespawnSequence {
    pub fn start(tuning: &RespawnTuning) -> Self {
        Self::FadingOut {
            remaining: tuning.fade_out,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// True while the player must stay frozen
    pub fn suspends_player(&self) -> bool {
        matches!(self, Self::FadingOut { .. } | Self::FadingIn { .. })
    }

    /// Count down the current phase; returns the step to apply when it ends.
    ///
    /// At most one phase ends per call.
    pub fn advance(&mut self, dt: f32, tuning: &RespawnTuning) -> Option<RespawnStep> {
        let (remaining, next, step) = match self {
            Self::Idle => return None,
            Self::FadingOut { remaining } => (
                remaining,
                Self::FadingIn {
                    remaining: tuning.fade_in,
                },
                RespawnStep::Restore,
            ),
            Self::FadingIn { remaining } => (
                remaining,
                Self::Immune {
                    remaining: tuning.immunity,
                },
                RespawnStep::Resume,
            ),
            Self::Immune { remaining } => (remaining, Self::Idle, RespawnStep::ImmunityOver),
        };

        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        *self = next;
        Some(step)
    }

    /// Abort the sequence. Returns the phase that was interrupted, if any.
    pub fn cancel(&mut self) -> Option<RespawnSequence> {
        let was = std::mem::take(self);
        was.is_active().then_some(was)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_step(
        seq: &mut RespawnSequence,
        tuning: &RespawnTuning,
        dt: f32,
    ) -> (u32, RespawnStep) {
        for ticks in 1..10_000 {
            if let Some(step) = seq.advance(dt, tuning) {
                return (ticks, step);
            }
        }
        panic!("sequence never advanced");
    }

    #[test]
    fn test_phases_run_in_order() {
        let tuning = RespawnTuning {
            attack_windup: 0.0,
            fade_out: 0.25,
            fade_in: 0.5,
            immunity: 0.75,
        };
        let mut seq = RespawnSequence::start(&tuning);
        assert!(seq.suspends_player());

        let (ticks, step) = run_until_step(&mut seq, &tuning, 0.125);
        assert_eq!((ticks, step), (2, RespawnStep::Restore));
        assert!(matches!(seq, RespawnSequence::FadingIn { .. }));

        let (ticks, step) = run_until_step(&mut seq, &tuning, 0.125);
        assert_eq!((ticks, step), (4, RespawnStep::Resume));
        assert!(!seq.suspends_player());

        let (ticks, step) = run_until_step(&mut seq, &tuning, 0.125);
        assert_eq!((ticks, step), (6, RespawnStep::ImmunityOver));
        assert_eq!(seq, RespawnSequence::Idle);
        assert_eq!(seq.advance(0.125, &tuning), None);
    }

    #[test]
    fn test_cancel_stops_everything() {
        let tuning = RespawnTuning::default();
        let mut seq = RespawnSequence::start(&tuning);
        seq.advance(0.5, &tuning);
        assert!(matches!(seq.cancel(), Some(RespawnSequence::FadingOut { .. })));
        assert!(!seq.is_active());
        assert_eq!(seq.advance(10.0, &tuning), None);
        assert_eq!(seq.cancel(), None);
    }
}
