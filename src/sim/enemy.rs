//! Enemy patrol/chase state machine
//!
//! The enemy walks legs of the waypoint graph while Patrolling and runs
//! straight at the player while Chasing. Detection is graded by the player's
//! meter and uses separate enter and exit radii so the enemy does not flicker
//! between states at the boundary:
//!
//! ```text
//! detect = lerp(min_detect, max_detect, meter)      Patrolling -> Chasing at d <= detect
//! lose   = detect + lose_radius_bonus               Chasing -> Patrolling at d >  lose
//! ```
//!
//! Inside the guaranteed radius the meter is ignored. An empty meter, an
//! immune or dead player, or no player at all ends any chase.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::graph::{NodeId, WaypointGraph};
use super::math::{damp_factor, lerp, lerp_angle, move_towards};
use super::player::PlayerSnapshot;
use super::state::Locomotion;
use super::tick::Tick;
use crate::error::GraphError;
use crate::tuning::EnemyTuning;

/// Squared movement below which facing is left alone
const FACING_DELTA_EPSILON_SQ: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChaseMode {
    #[default]
    Patrolling,
    Chasing,
}

/// The stretch of graph the enemy is currently walking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    /// Regular patrol leg; `to` is a successor of `from`
    Patrol { from: NodeId, to: NodeId },
    /// Walking back onto the graph after a chase
    Rejoin { to: NodeId },
}

impl Leg {
    pub fn target(&self) -> NodeId {
        match *self {
            Leg::Patrol { to, .. } | Leg::Rejoin { to } => to,
        }
    }
}

/// A change of [`ChaseMode`] during an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaseTransition {
    Started,
    Ended,
}

/// Enter/exit thresholds for one meter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRadii {
    pub detect: f32,
    pub lose: f32,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    tuning: EnemyTuning,
    locomotion: Locomotion,
    mode: ChaseMode,
    /// Last node reached
    current: NodeId,
    leg: Leg,
    /// Cleared while the player is dying/respawning; halts everything
    moving: bool,
}

impl Enemy {
    /// Place the enemy on `start` heading for a random successor
    pub fn new<R: Rng + ?Sized>(
        tuning: EnemyTuning,
        graph: &WaypointGraph,
        start: NodeId,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        let position = graph.position(start).ok_or(GraphError::UnknownNode(start))?;
        let to = graph
            .successor_of(start, rng)
            .ok_or(GraphError::DeadEnd(start))?;

        Ok(Self {
            tuning,
            locomotion: Locomotion::at(position),
            mode: ChaseMode::Patrolling,
            current: start,
            leg: Leg::Patrol { from: start, to },
            moving: true,
        })
    }

    /// Advance one tick: transitions, movement, facing, then arrival.
    ///
    /// `player` is `None` when there is no player to track; the enemy then
    /// patrols.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        graph: &WaypointGraph,
        player: Option<&PlayerSnapshot>,
        tick: Tick,
        rng: &mut R,
    ) -> Option<ChaseTransition> {
        if !self.moving || tick.paused || tick.dt <= 0.0 {
            return None;
        }
        let dt = tick.dt;

        let transition = self.evaluate(graph, player);

        let before = self.locomotion.position;
        let chase_target = match self.mode {
            ChaseMode::Chasing => player.map(|p| p.position),
            ChaseMode::Patrolling => None,
        };
        match chase_target {
            Some(target) => {
                self.locomotion.position =
                    move_towards(before, target, self.tuning.chase_speed * dt);
            }
            None => self.patrol_step(graph, dt),
        }

        let delta = self.locomotion.position - before;
        self.locomotion.velocity = delta / dt;
        if delta.length_squared() > FACING_DELTA_EPSILON_SQ {
            self.locomotion.target_facing = delta.y.atan2(delta.x);
            self.locomotion.facing = lerp_angle(
                self.locomotion.facing,
                self.locomotion.target_facing,
                damp_factor(self.tuning.rotation_speed, dt),
            );
        }

        if self.mode == ChaseMode::Patrolling && self.has_arrived(graph) {
            self.advance_leg(graph, rng);
        }

        transition
    }

    /// Detection/lose radii for a normalized meter value
    pub fn detection_radii(&self, meter_normalized: f32) -> DetectionRadii {
        let detect = lerp(
            self.tuning.min_detect_radius,
            self.tuning.max_detect_radius,
            meter_normalized,
        );
        DetectionRadii {
            detect,
            lose: detect + self.tuning.lose_radius_bonus,
        }
    }

    /// Radius the enemy currently notices the player at, for display
    pub fn current_detect_radius(&self, meter_normalized: f32) -> f32 {
        if meter_normalized <= 0.0 {
            self.tuning.guaranteed_detect_radius
        } else {
            self.detection_radii(meter_normalized).detect
        }
    }

    fn evaluate(
        &mut self,
        graph: &WaypointGraph,
        player: Option<&PlayerSnapshot>,
    ) -> Option<ChaseTransition> {
        let Some(player) = player.filter(|p| p.is_detectable()) else {
            return self.stop_chasing(graph);
        };

        let dist_sq = self.locomotion.position.distance_squared(player.position);
        let guaranteed = self.tuning.guaranteed_detect_radius;
        if dist_sq <= guaranteed * guaranteed {
            return self.start_chasing();
        }

        if player.meter_normalized <= 0.0 {
            return self.stop_chasing(graph);
        }

        let radii = self.detection_radii(player.meter_normalized);
        match self.mode {
            ChaseMode::Patrolling if dist_sq <= radii.detect * radii.detect => self.start_chasing(),
            ChaseMode::Chasing if dist_sq > radii.lose * radii.lose => self.stop_chasing(graph),
            _ => None,
        }
    }

    fn start_chasing(&mut self) -> Option<ChaseTransition> {
        if self.mode == ChaseMode::Chasing {
            return None;
        }
        self.mode = ChaseMode::Chasing;
        log::debug!("Enemy started chasing (leg toward {} abandoned)", self.leg.target());
        Some(ChaseTransition::Started)
    }

    fn stop_chasing(&mut self, graph: &WaypointGraph) -> Option<ChaseTransition> {
        if self.mode == ChaseMode::Patrolling {
            return None;
        }
        self.mode = ChaseMode::Patrolling;
        match graph.nearest_node(self.locomotion.position) {
            Some(to) => {
                self.leg = Leg::Rejoin { to };
                log::debug!("Enemy lost the player, rejoining patrol at {to}");
            }
            None => log::warn!("Enemy lost the player but the graph has no nodes to rejoin"),
        }
        Some(ChaseTransition::Ended)
    }

    fn patrol_step(&mut self, graph: &WaypointGraph, dt: f32) {
        let target = self.leg.target();
        match graph.position(target) {
            Some(target_pos) => {
                self.locomotion.position = move_towards(
                    self.locomotion.position,
                    target_pos,
                    self.tuning.patrol_speed * dt,
                );
            }
            None => log::warn!("Enemy leg targets missing waypoint {target}; idling"),
        }
    }

    fn has_arrived(&self, graph: &WaypointGraph) -> bool {
        graph
            .position(self.leg.target())
            .is_some_and(|p| p.distance(self.locomotion.position) <= self.tuning.arrival_epsilon)
    }

    fn advance_leg<R: Rng + ?Sized>(&mut self, graph: &WaypointGraph, rng: &mut R) {
        let reached = self.leg.target();
        self.current = reached;
        match graph.successor_of(reached, rng) {
            Some(to) => self.leg = Leg::Patrol { from: reached, to },
            None => log::warn!("Waypoint {reached} has no successor; enemy stays put"),
        }
    }

    /// Teleport to the node farthest from `player_position` and start a fresh
    /// patrol leg there. Used after a catch so the enemy is not waiting at
    /// the respawn point.
    pub fn relocate_farthest_from<R: Rng + ?Sized>(
        &mut self,
        graph: &WaypointGraph,
        player_position: Vec2,
        rng: &mut R,
    ) -> Option<NodeId> {
        let far = graph.farthest_node(player_position)?;
        let position = graph.position(far)?;

        self.mode = ChaseMode::Patrolling;
        self.locomotion.position = position;
        self.locomotion.velocity = Vec2::ZERO;
        self.leg = Leg::Rejoin { to: far };
        self.advance_leg(graph, rng);
        log::debug!("Enemy relocated to {far}");
        Some(far)
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
        if !moving {
            self.locomotion.velocity = Vec2::ZERO;
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn mode(&self) -> ChaseMode {
        self.mode
    }

    pub fn is_chasing(&self) -> bool {
        self.mode == ChaseMode::Chasing
    }

    pub fn current_node(&self) -> NodeId {
        self.current
    }

    pub fn leg(&self) -> Leg {
        self.leg
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::graph::NodeSpec;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 0.02;

    /// Bidirectional square loop with 2-unit sides, far from the origin
    fn square() -> WaypointGraph {
        WaypointGraph::from_specs(vec![
            NodeSpec::new(0, Vec2::new(20.0, 20.0), &[1, 3]),
            NodeSpec::new(1, Vec2::new(22.0, 20.0), &[2, 0]),
            NodeSpec::new(2, Vec2::new(22.0, 22.0), &[3, 1]),
            NodeSpec::new(3, Vec2::new(20.0, 22.0), &[0, 2]),
        ])
        .unwrap()
    }

    fn enemy(graph: &WaypointGraph, rng: &mut Pcg32) -> Enemy {
        Enemy::new(EnemyTuning::default(), graph, NodeId(0), rng).unwrap()
    }

    fn tick() -> Tick {
        Tick::fixed(DT, 1.0)
    }

    fn player_at(position: Vec2, meter: f32) -> PlayerSnapshot {
        PlayerSnapshot {
            position,
            meter_normalized: meter,
            immune: false,
            dead: false,
        }
    }

    /// Player placed `distance` to the right of the enemy
    fn offset(enemy: &Enemy, distance: f32, meter: f32) -> PlayerSnapshot {
        player_at(enemy.position() + Vec2::new(distance, 0.0), meter)
    }

    #[test]
    fn test_starts_on_start_node_heading_to_a_successor() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(1);
        let e = enemy(&graph, &mut rng);
        assert_eq!(e.position(), Vec2::new(20.0, 20.0));
        assert_eq!(e.mode(), ChaseMode::Patrolling);
        let Leg::Patrol { from, to } = e.leg() else {
            panic!("expected a patrol leg");
        };
        assert_eq!(from, NodeId(0));
        assert!(graph.successors(NodeId(0)).unwrap().contains(&to));
    }

    #[test]
    fn test_unknown_start_node_is_an_error() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(1);
        let err = Enemy::new(EnemyTuning::default(), &graph, NodeId(9), &mut rng).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(NodeId(9)));
    }

    #[test]
    fn test_guaranteed_radius_ignores_empty_meter() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut e = enemy(&graph, &mut rng);
        let p = offset(&e, 0.5, 0.0);
        assert_eq!(
            e.update(&graph, Some(&p), tick(), &mut rng),
            Some(ChaseTransition::Started)
        );
        assert!(e.is_chasing());
    }

    #[test]
    fn test_meter_scales_detection_range() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(3);

        // Silent player at 5.0: never detected
        let mut e = enemy(&graph, &mut rng);
        let p = offset(&e, 5.0, 0.0);
        assert_eq!(e.evaluate(&graph, Some(&p)), None);
        assert_eq!(e.mode(), ChaseMode::Patrolling);

        // Loud player at 5.0: detect radius is 6.0
        let p = offset(&e, 5.0, 1.0);
        assert_eq!(e.evaluate(&graph, Some(&p)), Some(ChaseTransition::Started));

        // Going silent while chased ends the chase
        let p = offset(&e, 5.0, 0.0);
        assert_eq!(e.evaluate(&graph, Some(&p)), Some(ChaseTransition::Ended));
    }

    #[test]
    fn test_hysteresis_band_keeps_chase() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut e = enemy(&graph, &mut rng);
        let radii = e.detection_radii(0.5);
        assert!((radii.detect - 3.75).abs() < 1e-5);
        assert!((radii.lose - 5.0).abs() < 1e-5);

        // Approach from outside: no detection until the detect radius is crossed
        assert_eq!(e.evaluate(&graph, Some(&offset(&e, 4.0, 0.5))), None);
        assert_eq!(
            e.evaluate(&graph, Some(&offset(&e, 3.7, 0.5))),
            Some(ChaseTransition::Started)
        );

        // Back out past detect but inside lose: chase holds
        assert_eq!(e.evaluate(&graph, Some(&offset(&e, 4.5, 0.5))), None);
        assert!(e.is_chasing());
        assert_eq!(e.evaluate(&graph, Some(&offset(&e, 4.99, 0.5))), None);
        assert!(e.is_chasing());

        // Past lose: chase drops
        assert_eq!(
            e.evaluate(&graph, Some(&offset(&e, 5.01, 0.5))),
            Some(ChaseTransition::Ended)
        );
        assert!(!e.is_chasing());
    }

    #[test]
    fn test_immune_or_missing_player_ends_chase_and_rejoins_nearest() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(&graph, &mut rng);
        e.evaluate(&graph, Some(&offset(&e, 0.5, 1.0)));
        assert!(e.is_chasing());

        // Wander off the graph, then lose the player
        e.locomotion.position = Vec2::new(23.0, 23.5);
        let mut immune = offset(&e, 0.5, 1.0);
        immune.immune = true;
        assert_eq!(e.evaluate(&graph, Some(&immune)), Some(ChaseTransition::Ended));
        assert_eq!(e.leg(), Leg::Rejoin { to: NodeId(2) });

        // Immune players are not picked up even at point-blank range
        assert_eq!(e.evaluate(&graph, Some(&immune)), None);

        e.evaluate(&graph, Some(&offset(&e, 0.5, 1.0)));
        assert!(e.is_chasing());
        assert_eq!(e.update(&graph, None, tick(), &mut rng), Some(ChaseTransition::Ended));
        assert_eq!(e.mode(), ChaseMode::Patrolling);
    }

    #[test]
    fn test_chase_moves_straight_at_player() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(6);
        let mut e = enemy(&graph, &mut rng);
        let p = player_at(Vec2::new(20.0, 15.0), 1.0);
        e.update(&graph, Some(&p), tick(), &mut rng);
        assert!(e.is_chasing());
        let moved = e.position() - Vec2::new(20.0, 20.0);
        assert!((moved - Vec2::new(0.0, -4.0 * DT)).length() < 1e-5);
        assert!((e.velocity() - Vec2::new(0.0, -4.0)).length() < 1e-3);
    }

    #[test]
    fn test_patrol_legs_follow_successors_and_advance_once_per_arrival() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = enemy(&graph, &mut rng);

        let mut advances = 0;
        let mut last_leg = e.leg();
        // Each 2-unit leg takes 50 ticks at patrol speed 2; stop between arrivals
        for _ in 0..1010 {
            e.update(&graph, None, tick(), &mut rng);
            let leg = e.leg();
            if leg != last_leg {
                advances += 1;
                let Leg::Patrol { from, to } = leg else {
                    panic!("patrol produced a non-patrol leg");
                };
                assert_eq!(from, last_leg.target());
                assert_eq!(e.current_node(), from);
                assert!(graph.successors(from).unwrap().contains(&to));
            }
            last_leg = leg;
        }
        assert_eq!(advances, 20);
    }

    #[test]
    fn test_halted_enemy_does_nothing() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut e = enemy(&graph, &mut rng);
        e.set_moving(false);
        let p = offset(&e, 0.1, 1.0);
        assert_eq!(e.update(&graph, Some(&p), tick(), &mut rng), None);
        assert_eq!(e.position(), Vec2::new(20.0, 20.0));
        assert!(!e.is_chasing());

        e.set_moving(true);
        assert_eq!(
            e.update(&graph, Some(&p), Tick::fixed(DT, 0.0), &mut rng),
            None
        );
        assert_eq!(e.position(), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_relocate_goes_to_farthest_node() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut e = enemy(&graph, &mut rng);
        e.evaluate(&graph, Some(&offset(&e, 0.5, 1.0)));

        let far = e.relocate_farthest_from(&graph, Vec2::new(19.0, 19.0), &mut rng);
        assert_eq!(far, Some(NodeId(2)));
        assert_eq!(e.position(), Vec2::new(22.0, 22.0));
        assert_eq!(e.current_node(), NodeId(2));
        assert!(!e.is_chasing());
        let Leg::Patrol { from, to } = e.leg() else {
            panic!("expected a patrol leg");
        };
        assert_eq!(from, NodeId(2));
        assert!(graph.successors(NodeId(2)).unwrap().contains(&to));
    }

    #[test]
    fn test_current_detect_radius_for_display() {
        let graph = square();
        let mut rng = Pcg32::seed_from_u64(10);
        let e = enemy(&graph, &mut rng);
        assert_eq!(e.current_detect_radius(0.0), 1.0);
        assert_eq!(e.current_detect_radius(1.0), 6.0);
    }
}
