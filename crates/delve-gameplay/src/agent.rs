//! Hostile agent AI.
//!
//! Every agent runs a two-state machine:
//!
//! - **Idle**: alternate between waiting in place and wandering toward a
//!   random nearby point.
//! - **Active**: hunt the target along a cached A* path, repathing on a
//!   jittered cooldown, and walk straight at the target when no path exists.
//!
//! Vision checks are the expensive part of a tick, so each agent only looks
//! every `sense_interval` seconds and the first check is offset by the
//! agent's stagger slot. In between, the cached visibility flag is used.

use std::f32::consts::TAU;

use delve_common::{AgentId, TileCoord, Vec2};
use delve_world::SpatialIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pathfinding::Pathfinder;
use crate::perception::{Perception, PerceptionConfig};

/// Agent tuning. Speeds are in world units per second, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Vision range in world units
    pub vision_radius: f32,
    /// Full vision cone angle in degrees
    pub fov_degrees: f32,
    /// Movement speed while hunting
    pub chase_speed: f32,
    /// Movement speed while wandering
    pub wander_speed: f32,
    /// Shortest idle pause
    pub wait_min: f32,
    /// Longest idle pause
    pub wait_max: f32,
    /// Shortest wander leg
    pub wander_time_min: f32,
    /// Longest wander leg
    pub wander_time_max: f32,
    /// Shortest wander distance
    pub wander_distance_min: f32,
    /// Longest wander distance
    pub wander_distance_max: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_reach: f32,
    /// Base delay between path searches
    pub repath_interval: f32,
    /// Random extra delay added to each repath
    pub repath_jitter: f32,
    /// Delay between vision checks
    pub sense_interval: f32,
    /// Number of stagger slots the population is spread over
    pub stagger_slots: u32,
    /// Give up the hunt once the target is this many vision radii away
    /// from where it was last seen
    pub deaggro_factor: f32,
    /// Line of sight settings
    pub perception: PerceptionConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            vision_radius: 150.0,
            fov_degrees: 60.0,
            chase_speed: 120.0,
            wander_speed: 60.0,
            wait_min: 0.5,
            wait_max: 1.5,
            wander_time_min: 1.0,
            wander_time_max: 3.0,
            wander_distance_min: 20.0,
            wander_distance_max: 80.0,
            waypoint_reach: 2.0,
            repath_interval: 0.5,
            repath_jitter: 0.25,
            sense_interval: 0.2,
            stagger_slots: 4,
            deaggro_factor: 1.5,
            perception: PerceptionConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Clamps values to usable ranges.
    pub fn validate(&mut self) {
        let defaults = Self::default();
        let fix = |value: &mut f32, fallback: f32| {
            if !(value.is_finite() && *value >= 0.0) {
                *value = fallback;
            }
        };
        fix(&mut self.vision_radius, defaults.vision_radius);
        fix(&mut self.chase_speed, defaults.chase_speed);
        fix(&mut self.wander_speed, defaults.wander_speed);
        fix(&mut self.wait_min, defaults.wait_min);
        fix(&mut self.wait_max, defaults.wait_max);
        fix(&mut self.wander_time_min, defaults.wander_time_min);
        fix(&mut self.wander_time_max, defaults.wander_time_max);
        fix(&mut self.wander_distance_min, defaults.wander_distance_min);
        fix(&mut self.wander_distance_max, defaults.wander_distance_max);
        fix(&mut self.waypoint_reach, defaults.waypoint_reach);
        fix(&mut self.repath_interval, defaults.repath_interval);
        fix(&mut self.repath_jitter, defaults.repath_jitter);
        fix(&mut self.sense_interval, defaults.sense_interval);
        fix(&mut self.deaggro_factor, defaults.deaggro_factor);

        if !self.fov_degrees.is_finite() {
            self.fov_degrees = defaults.fov_degrees;
        }
        self.fov_degrees = self.fov_degrees.clamp(1.0, 360.0);
        self.wait_max = self.wait_max.max(self.wait_min);
        self.wander_time_max = self.wander_time_max.max(self.wander_time_min);
        self.wander_distance_max = self.wander_distance_max.max(self.wander_distance_min);
        self.stagger_slots = self.stagger_slots.max(1);
        self.deaggro_factor = self.deaggro_factor.max(1.0);
        self.perception.validate();
    }

    /// Full vision cone angle in radians.
    #[must_use]
    pub fn fov(&self) -> f32 {
        self.fov_degrees.to_radians()
    }
}

/// Idle behaviour state.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleState {
    /// Point the agent is wandering toward
    pub wander_target: Option<Vec2>,
    /// Whether the agent is on a wander leg (as opposed to waiting)
    pub is_moving: bool,
    /// Seconds left in the current wait or wander leg
    pub timer: f32,
}

impl IdleState {
    /// Waiting in place for `seconds`.
    #[must_use]
    pub const fn waiting(seconds: f32) -> Self {
        Self {
            wander_target: None,
            is_moving: false,
            timer: seconds,
        }
    }
}

/// Hunting behaviour state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveState {
    /// Cached path, start tile first
    pub path: Vec<TileCoord>,
    /// Index of the next waypoint in `path`
    pub cursor: usize,
    /// Where the target was last seen
    pub last_known_target: Vec2,
    /// Seconds until the next path search is allowed
    pub repath_cooldown: f32,
    /// Goal tile the cached path was computed for
    pub goal_tile: Option<TileCoord>,
}

impl ActiveState {
    /// Starts a hunt toward a known position, allowed to search at once.
    #[must_use]
    pub const fn hunting(last_known_target: Vec2) -> Self {
        Self {
            path: Vec::new(),
            cursor: 0,
            last_known_target,
            repath_cooldown: 0.0,
            goal_tile: None,
        }
    }

    /// Returns whether the cached path has no waypoints left.
    #[must_use]
    pub fn path_exhausted(&self) -> bool {
        self.cursor >= self.path.len()
    }
}

/// Behaviour mode of an agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMode {
    /// Waiting or wandering
    Idle(IdleState),
    /// Hunting the target
    Active(ActiveState),
}

/// Result of one state handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Mode to switch to after this tick
    pub next: Option<AgentMode>,
    /// Movement for this tick
    pub movement: Vec2,
}

impl Step {
    const fn stay(movement: Vec2) -> Self {
        Self {
            next: None,
            movement,
        }
    }

    const fn switch(next: AgentMode) -> Self {
        Self {
            next: Some(next),
            movement: Vec2::ZERO,
        }
    }
}

/// Per-agent AI state.
#[derive(Debug, Clone)]
pub struct AgentState {
    id: AgentId,
    /// Current world position (centre of the body)
    pub position: Vec2,
    /// Facing in radians, following the last non-zero movement
    pub facing: f32,
    /// Current behaviour
    pub mode: AgentMode,
    /// Hunt regardless of visibility
    pub force_active: bool,
    target_visible: bool,
    sense_cooldown: f32,
    stagger_slot: u32,
    rng: fastrand::Rng,
}

impl AgentState {
    /// Creates an idle agent. Its first vision check is delayed by its stagger
    /// slot so a freshly spawned population does not look all at once.
    #[must_use]
    pub fn new(id: AgentId, position: Vec2, config: &AgentConfig) -> Self {
        let slots = config.stagger_slots.max(1);
        let stagger_slot = (id.raw() % u64::from(slots)) as u32;
        let mut rng = fastrand::Rng::with_seed(id.raw().wrapping_mul(0x2545_F491_4F6C_DD1D));
        let wait = random_between(&mut rng, config.wait_min, config.wait_max);
        Self {
            id,
            position,
            facing: 0.0,
            mode: AgentMode::Idle(IdleState::waiting(wait)),
            force_active: false,
            target_visible: false,
            sense_cooldown: config.sense_interval * stagger_slot as f32 / slots as f32,
            stagger_slot,
            rng,
        }
    }

    /// Returns the agent ID.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns whether the agent is hunting.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.mode, AgentMode::Active(_))
    }

    /// Result of the most recent vision check.
    #[must_use]
    pub const fn target_visible(&self) -> bool {
        self.target_visible
    }

    /// Stagger slot derived from the agent ID.
    #[must_use]
    pub const fn stagger_slot(&self) -> u32 {
        self.stagger_slot
    }

    /// Seconds until the next vision check.
    #[must_use]
    pub const fn sense_cooldown(&self) -> f32 {
        self.sense_cooldown
    }

    /// Starts hunting toward a position the agent has been told about.
    pub fn alert(&mut self, last_known_target: Vec2) {
        match &mut self.mode {
            AgentMode::Active(state) => state.last_known_target = last_known_target,
            AgentMode::Idle(_) => self.mode = AgentMode::Active(ActiveState::hunting(last_known_target)),
        }
    }
}

/// Counters accumulated by an [`AgentController`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Vision checks performed
    pub sense_checks: u32,
    /// Path searches started
    pub repaths: u32,
    /// Path searches that failed
    pub path_failures: u32,
}

/// Drives agents one frame at a time.
///
/// One controller serves a whole population; its pathfinder arena is reused
/// by every search.
#[derive(Debug)]
pub struct AgentController {
    config: AgentConfig,
    perception: Perception,
    pathfinder: Pathfinder,
    stats: ControllerStats,
}

impl AgentController {
    /// Creates a controller; the config is validated first.
    #[must_use]
    pub fn new(mut config: AgentConfig) -> Self {
        config.validate();
        let perception = Perception::new(config.perception.clone());
        Self {
            config,
            perception,
            pathfinder: Pathfinder::new(),
            stats: ControllerStats::default(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> ControllerStats {
        self.stats
    }

    /// Returns the counters and resets them.
    pub fn take_stats(&mut self) -> ControllerStats {
        std::mem::take(&mut self.stats)
    }

    /// Advances one agent by `dt` seconds and returns its movement vector.
    ///
    /// The vector is always finite; the caller applies it through collision.
    pub fn tick(
        &mut self,
        agent: &mut AgentState,
        index: &SpatialIndex,
        target: Vec2,
        dt: f32,
    ) -> Vec2 {
        if !(dt.is_finite() && dt > 0.0) {
            return Vec2::ZERO;
        }

        agent.sense_cooldown -= dt;
        if agent.sense_cooldown <= 0.0 {
            agent.sense_cooldown += self.config.sense_interval;
            if agent.sense_cooldown <= 0.0 {
                agent.sense_cooldown = self.config.sense_interval;
            }
            agent.target_visible = self.perception.in_vision_cone(
                index,
                agent.position,
                agent.facing,
                target,
                self.config.vision_radius,
                self.config.fov(),
            );
            self.stats.sense_checks += 1;
        }

        let sees = agent.target_visible;
        let forced = agent.force_active;
        let step = match &mut agent.mode {
            AgentMode::Idle(state) => {
                self.tick_idle(state, &mut agent.rng, index, agent.position, target, sees || forced, dt)
            }
            AgentMode::Active(state) => {
                self.tick_active(state, &mut agent.rng, index, agent.position, target, sees, forced, dt)
            }
        };
        if let Some(next) = step.next {
            debug!(
                "Agent {} switching to {}",
                agent.id.raw(),
                if matches!(next, AgentMode::Active(_)) { "active" } else { "idle" }
            );
            agent.mode = next;
        }

        let movement = if step.movement.is_finite() {
            step.movement
        } else {
            Vec2::ZERO
        };
        if movement != Vec2::ZERO {
            agent.facing = movement.y.atan2(movement.x);
        }
        movement
    }

    /// Advances every agent by one frame, returning movements in agent order.
    pub fn tick_all(
        &mut self,
        agents: &mut [AgentState],
        index: &SpatialIndex,
        target: Vec2,
        dt: f32,
    ) -> Vec<Vec2> {
        agents
            .iter_mut()
            .map(|agent| self.tick(agent, index, target, dt))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn tick_idle(
        &self,
        state: &mut IdleState,
        rng: &mut fastrand::Rng,
        index: &SpatialIndex,
        position: Vec2,
        target: Vec2,
        alerted: bool,
        dt: f32,
    ) -> Step {
        if alerted {
            return Step::switch(AgentMode::Active(ActiveState::hunting(target)));
        }

        state.timer -= dt;
        if state.timer <= 0.0 {
            if state.is_moving {
                *state = IdleState::waiting(random_between(rng, self.config.wait_min, self.config.wait_max));
            } else {
                state.is_moving = true;
                state.timer =
                    random_between(rng, self.config.wander_time_min, self.config.wander_time_max);
                let angle = rng.f32() * TAU;
                let distance = random_between(
                    rng,
                    self.config.wander_distance_min,
                    self.config.wander_distance_max,
                );
                let candidate = position + Vec2::from_angle(angle) * distance;
                // Unwalkable picks degrade to standing still for this leg.
                state.wander_target = if index.is_walkable(index.world_to_tile(candidate)) {
                    Some(candidate)
                } else {
                    Some(position)
                };
            }
        }

        match state.wander_target {
            Some(goal) if state.is_moving => Step::stay(seek(
                position,
                goal,
                self.config.wander_speed * dt,
                self.config.waypoint_reach,
            )),
            _ => Step::stay(Vec2::ZERO),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn tick_active(
        &mut self,
        state: &mut ActiveState,
        rng: &mut fastrand::Rng,
        index: &SpatialIndex,
        position: Vec2,
        target: Vec2,
        sees: bool,
        forced: bool,
        dt: f32,
    ) -> Step {
        if sees {
            state.last_known_target = target;
        }
        let give_up = self.config.vision_radius * self.config.deaggro_factor;
        if !sees && !forced && target.distance(state.last_known_target) > give_up {
            let wait = random_between(rng, self.config.wait_min, self.config.wait_max);
            return Step::switch(AgentMode::Idle(IdleState::waiting(wait)));
        }

        let chase_point = if sees || forced {
            target
        } else {
            state.last_known_target
        };
        let goal_tile = index.world_to_tile(chase_point);

        state.repath_cooldown -= dt;
        let stale = state.path_exhausted() || state.goal_tile != Some(goal_tile);
        if stale && state.repath_cooldown <= 0.0 {
            state.repath_cooldown = self.config.repath_interval + self.config.repath_jitter * rng.f32();
            state.goal_tile = Some(goal_tile);
            self.stats.repaths += 1;
            match self.pathfinder.find_path(index, position, chase_point) {
                Ok(path) => {
                    // Step 0 is the tile the agent is standing on.
                    state.cursor = path.len().min(1);
                    state.path = path;
                }
                Err(err) => {
                    debug!("Path search failed: {}", err);
                    self.stats.path_failures += 1;
                    state.path.clear();
                    state.cursor = 0;
                }
            }
        }

        let speed = self.config.chase_speed * dt;
        let reach = self.config.waypoint_reach;
        if let Some(&tile) = state.path.get(state.cursor) {
            if position.distance(index.tile_center(tile)) <= reach {
                state.cursor += 1;
            }
        }
        let movement = match state.path.get(state.cursor) {
            Some(&tile) => seek(position, index.tile_center(tile), speed, 0.0),
            // No path or path finished: walk straight at the chase point.
            None => seek(position, chase_point, speed, 0.0),
        };
        Step::stay(movement)
    }
}

/// Movement of at most `max_step` from `from` toward `to`, or zero within
/// `arrive` of the goal. Never overshoots.
fn seek(from: Vec2, to: Vec2, max_step: f32, arrive: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if !distance.is_finite() || distance <= arrive || distance <= f32::EPSILON {
        return Vec2::ZERO;
    }
    delta / distance * max_step.min(distance)
}

fn random_between(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.f32()
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_world::TileKind;

    const DT: f32 = 1.0 / 60.0;

    fn open_room(size: u32) -> SpatialIndex {
        let mut index = SpatialIndex::new(size, size, 16.0, TileKind::Stone);
        for y in 1..size as i32 - 1 {
            for x in 1..size as i32 - 1 {
                index.set_kind(TileCoord::new(x, y), TileKind::Dirt);
            }
        }
        index
    }

    fn agent_at(index: &SpatialIndex, tile: TileCoord, config: &AgentConfig) -> AgentState {
        // Raw ID 4 lands in stagger slot 0, so the first tick looks.
        AgentState::new(AgentId::from_raw(4), index.tile_center(tile), config)
    }

    #[test]
    fn test_stagger_slots_spread_checks() {
        let config = AgentConfig::default();
        let cooldowns: Vec<f32> = (0..4)
            .map(|raw| AgentState::new(AgentId::from_raw(raw), Vec2::ZERO, &config).sense_cooldown())
            .collect();
        for pair in cooldowns.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        let slot = AgentState::new(AgentId::from_raw(9), Vec2::ZERO, &config).stagger_slot();
        assert_eq!(slot, 1);
    }

    #[test]
    fn test_sees_target_and_activates() {
        let index = open_room(20);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(3, 5), controller.config());
        let target = index.tile_center(TileCoord::new(8, 5));

        controller.tick(&mut agent, &index, target, DT);
        assert!(agent.target_visible());
        assert!(agent.is_active());
        assert_eq!(controller.stats().sense_checks, 1);

        // Next tick hunts: one search, movement east toward the target.
        let movement = controller.tick(&mut agent, &index, target, DT);
        assert_eq!(controller.stats().repaths, 1);
        assert!(movement.x > 0.0);
        assert!(movement.y.abs() < 1e-4);
        let expected = controller.config().chase_speed * DT;
        assert!((movement.length() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_target_behind_is_not_seen() {
        let index = open_room(20);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(10, 5), controller.config());
        let target = index.tile_center(TileCoord::new(6, 5));
        controller.tick(&mut agent, &index, target, DT);
        assert!(!agent.target_visible());
        assert!(!agent.is_active());
    }

    #[test]
    fn test_follows_path_around_wall() {
        let index = SpatialIndex::from_ascii(
            &[
                "#####", //
                "#...#", //
                "###.#", //
                "#...#", //
                "#####",
            ],
            16.0,
        );
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(1, 1), controller.config());
        agent.force_active = true;
        let target = index.tile_center(TileCoord::new(1, 3));

        assert_eq!(controller.tick(&mut agent, &index, target, DT), Vec2::ZERO);
        assert!(agent.is_active());

        let movement = controller.tick(&mut agent, &index, target, DT);
        // First waypoint is the tile to the east, not straight through the wall.
        assert!(movement.x > 0.0);
        assert!(movement.y.abs() < 1e-4);
        match &agent.mode {
            AgentMode::Active(state) => {
                assert_eq!(state.path.len(), 7);
                assert_eq!(state.cursor, 1);
            }
            AgentMode::Idle(_) => panic!("agent should be hunting"),
        }
    }

    #[test]
    fn test_sealed_wall_falls_back_to_straight_line() {
        let index = SpatialIndex::from_ascii(
            &[
                "#########", //
                "#...#...#", //
                "#...#...#", //
                "#...#...#", //
                "#########",
            ],
            16.0,
        );
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(2, 2), controller.config());
        let last_known = index.tile_center(TileCoord::new(6, 2));
        agent.alert(last_known);

        let movement = controller.tick(&mut agent, &index, last_known, DT);
        assert!(movement.is_finite());
        assert!(movement.length() > 0.0);
        let toward = (last_known - agent.position).normalize();
        assert!(movement.normalize().dot(toward) > 0.999);
        assert_eq!(controller.stats().path_failures, 1);
        assert!(agent.is_active());
    }

    #[test]
    fn test_gives_up_when_target_is_far() {
        let index = open_room(40);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(2, 2), controller.config());
        agent.alert(index.tile_center(TileCoord::new(3, 3)));

        let far = index.tile_center(TileCoord::new(37, 37));
        controller.tick(&mut agent, &index, far, DT);
        assert!(!agent.target_visible());
        assert!(!agent.is_active());
    }

    #[test]
    fn test_keeps_hunting_near_last_known() {
        let index = open_room(40);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(2, 2), controller.config());
        let last_known = index.tile_center(TileCoord::new(8, 8));
        agent.alert(last_known);
        // Facing east, the target is far behind the cone but close to where it was seen.
        let target = index.tile_center(TileCoord::new(10, 10));
        let movement = controller.tick(&mut agent, &index, target, DT);
        assert!(agent.is_active());
        assert!(movement.length() > 0.0);
    }

    #[test]
    fn test_wandering_respects_speed() {
        let index = open_room(30);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(15, 15), controller.config());
        let far = Vec2::new(-1000.0, -1000.0);
        let limit = controller.config().wander_speed * DT + 1e-4;

        let mut moved = false;
        for _ in 0..600 {
            let movement = controller.tick(&mut agent, &index, far, DT);
            assert!(movement.is_finite());
            assert!(movement.length() <= limit);
            moved |= movement != Vec2::ZERO;
            agent.position += movement;
            assert!(!agent.is_active());
        }
        assert!(moved);
    }

    #[test]
    fn test_never_emits_nan() {
        let index = open_room(10);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(4, 4), controller.config());
        agent.force_active = true;
        let here = agent.position;

        assert_eq!(controller.tick(&mut agent, &index, here, 0.0), Vec2::ZERO);
        assert_eq!(controller.tick(&mut agent, &index, here, f32::NAN), Vec2::ZERO);
        for _ in 0..5 {
            let movement = controller.tick(&mut agent, &index, here, DT);
            assert_eq!(movement, Vec2::ZERO);
        }
    }

    #[test]
    fn test_facing_follows_movement() {
        let index = open_room(20);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(5, 5), controller.config());
        agent.force_active = true;
        let target = index.tile_center(TileCoord::new(5, 12));
        controller.tick(&mut agent, &index, target, DT);
        controller.tick(&mut agent, &index, target, DT);
        assert!((agent.facing - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_tick_all_and_take_stats() {
        let index = open_room(20);
        let mut controller = AgentController::new(AgentConfig::default());
        let config = controller.config().clone();
        let mut agents: Vec<_> = (0..6)
            .map(|raw| AgentState::new(AgentId::from_raw(raw), index.tile_center(TileCoord::new(3, 3)), &config))
            .collect();
        let movements = controller.tick_all(&mut agents, &index, Vec2::new(200.0, 200.0), DT);
        assert_eq!(movements.len(), agents.len());

        let stats = controller.take_stats();
        // Only slot 0 agents (raw 0 and 4) look on the first frame.
        assert_eq!(stats.sense_checks, 2);
        assert_eq!(controller.stats(), ControllerStats::default());
    }

    fn repath_cooldown(agent: &AgentState) -> f32 {
        match &agent.mode {
            AgentMode::Active(state) => state.repath_cooldown,
            AgentMode::Idle(_) => panic!("agent should be hunting"),
        }
    }

    #[test]
    fn test_repaths_respect_cooldown() {
        let index = open_room(40);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(5, 20), controller.config());
        agent.force_active = true;
        let interval = controller.config().repath_interval;

        let mut last_repath: Option<u32> = None;
        let mut repaths = 0;
        for frame in 0..90u32 {
            // Target steps one tile east every five frames.
            let target = index.tile_center(TileCoord::new(10 + (frame / 5) as i32, 20));
            let movement = controller.tick(&mut agent, &index, target, DT);
            agent.position += movement;

            let now = controller.stats().repaths;
            if now > repaths {
                assert_eq!(now, repaths + 1);
                if let Some(previous) = last_repath {
                    let gap = (frame - previous) as f32 * DT;
                    assert!(gap >= interval - 1e-3, "repath after {gap}s");
                }
                last_repath = Some(frame);
                repaths = now;
            }
        }
        assert!((2..=3).contains(&repaths), "{repaths} repaths in 1.5s");
    }

    #[test]
    fn test_goal_tile_change_repaths_once_cooldown_elapses() {
        let index = open_room(40);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(5, 20), controller.config());
        agent.force_active = true;
        let first = index.tile_center(TileCoord::new(20, 20));

        controller.tick(&mut agent, &index, first, DT);
        controller.tick(&mut agent, &index, first, DT);
        assert_eq!(controller.stats().repaths, 1);

        // Same goal tile: no search even after the cooldown runs out.
        for _ in 0..60 {
            let movement = controller.tick(&mut agent, &index, first, DT);
            agent.position += movement;
        }
        assert_eq!(controller.stats().repaths, 1);
        assert!(repath_cooldown(&agent) <= 0.0);

        // New goal tile with the cooldown already spent: immediate search.
        let second = index.tile_center(TileCoord::new(21, 20));
        let movement = controller.tick(&mut agent, &index, second, DT);
        agent.position += movement;
        assert_eq!(controller.stats().repaths, 2);

        // Another change waits exactly until the cooldown elapses.
        let third = index.tile_center(TileCoord::new(22, 20));
        loop {
            let remaining = repath_cooldown(&agent) - DT;
            let movement = controller.tick(&mut agent, &index, third, DT);
            agent.position += movement;
            if remaining > 0.0 {
                assert_eq!(controller.stats().repaths, 2);
            } else {
                assert_eq!(controller.stats().repaths, 3);
                break;
            }
        }
    }

    #[test]
    fn test_wander_into_rock_stays_put() {
        // A single Dirt tile surrounded by rock: every wander pick is unwalkable.
        let mut index = SpatialIndex::new(11, 11, 16.0, TileKind::Stone);
        index.set_kind(TileCoord::new(5, 5), TileKind::Dirt);
        let mut controller = AgentController::new(AgentConfig::default());
        let mut agent = agent_at(&index, TileCoord::new(5, 5), controller.config());
        let home = agent.position;
        let far = Vec2::new(-1000.0, -1000.0);

        let mut wandered = false;
        for _ in 0..300 {
            let movement = controller.tick(&mut agent, &index, far, DT);
            assert_eq!(movement, Vec2::ZERO);
            if let AgentMode::Idle(state) = &agent.mode {
                if state.is_moving {
                    wandered = true;
                    assert_eq!(state.wander_target, Some(home));
                }
            }
        }
        assert!(wandered);
        assert!(!agent.is_active());
    }

    #[test]
    fn test_config_validate() {
        let mut config = AgentConfig {
            fov_degrees: 900.0,
            stagger_slots: 0,
            chase_speed: f32::NAN,
            wait_min: 2.0,
            wait_max: 1.0,
            ..Default::default()
        };
        config.validate();
        assert!((config.fov_degrees - 360.0).abs() < f32::EPSILON);
        assert_eq!(config.stagger_slots, 1);
        assert!((config.chase_speed - 120.0).abs() < f32::EPSILON);
        assert!(config.wait_max >= config.wait_min);
    }
}
