//! Headless level simulation.
//!
//! Generates a level, spawns agents on its spawn list and chases a scripted
//! target that wanders the level. Nothing is rendered; progress is reported
//! once per simulated second.

use std::f32::consts::TAU;

use delve_common::{AgentId, Rect, TileCoord, Vec2, WorldError};
use delve_gameplay::{move_and_collide, AgentController, AgentState};
use delve_world::{GeneratedWorld, WorldGenerator};
use tracing::info;

use crate::config::{EngineConfig, SimConfig};

/// Counters for one simulated second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondSummary {
    /// Simulated second that just ended, starting at 1
    pub second: u32,
    /// Agents hunting at the end of the second
    pub active_agents: usize,
    /// Path searches during the second
    pub repaths: u32,
    /// Failed path searches during the second
    pub path_failures: u32,
    /// Vision checks during the second
    pub sense_checks: u32,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default)]
pub struct SimReport {
    /// Frames simulated
    pub frames: u32,
    /// Most agents hunting at once
    pub peak_active: usize,
    /// Path searches over the run
    pub repaths: u64,
    /// Failed path searches over the run
    pub path_failures: u64,
    /// Per-second counters in order
    pub seconds: Vec<SecondSummary>,
}

/// A level with its agents and a scripted target.
pub struct Simulation {
    world: GeneratedWorld,
    controller: AgentController,
    agents: Vec<AgentState>,
    target: Vec2,
    heading: f32,
    turn_timer: f32,
    rng: fastrand::Rng,
    sim: SimConfig,
    frame: u32,
}

impl Simulation {
    /// Generates the configured level and spawns its agents.
    pub fn new(config: &EngineConfig) -> Result<Self, WorldError> {
        let mut config = config.clone();
        config.validate();

        let generator = WorldGenerator::new(config.generator.clone());
        let world = generator.generate_level(config.sim.difficulty)?;
        let controller = AgentController::new(config.agent.clone());

        let agents = world
            .enemy_spawns
            .iter()
            .enumerate()
            .map(|(i, &tile)| {
                AgentState::new(
                    AgentId::from_raw(i as u64 + 1),
                    world.index.tile_center(tile),
                    controller.config(),
                )
            })
            .collect::<Vec<_>>();

        let start = world.player_spawn.unwrap_or_else(|| TileCoord::new(1, 1));
        let target = world.index.tile_center(start);
        let mut rng = fastrand::Rng::with_seed(config.generator.seed ^ 0x5EED);
        let heading = rng.f32() * TAU;

        info!(
            "Simulating {} agents on a {}x{} tile level for {} frames",
            agents.len(),
            world.index.width(),
            world.index.height(),
            config.sim.frames
        );

        Ok(Self {
            world,
            controller,
            agents,
            target,
            heading,
            turn_timer: config.sim.target_turn_interval,
            rng,
            sim: config.sim,
            frame: 0,
        })
    }

    /// Returns the generated level.
    pub fn world(&self) -> &GeneratedWorld {
        &self.world
    }

    /// Returns the agents.
    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    /// Returns the target position.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Advances one frame. Returns a summary when a simulated second ends.
    pub fn step(&mut self) -> Option<SecondSummary> {
        let dt = 1.0 / self.sim.fps as f32;
        self.move_target(dt);

        let index = &self.world.index;
        let half = self.sim.body_half_extent;
        let movements = self.controller.tick_all(&mut self.agents, index, self.target, dt);
        for (agent, movement) in self.agents.iter_mut().zip(movements) {
            let body = Rect::around(agent.position, half);
            let result = move_and_collide(index, body, movement);
            agent.position = result.body(body.size()).center();
        }

        self.frame += 1;
        if self.frame % self.sim.fps != 0 {
            return None;
        }
        let stats = self.controller.take_stats();
        let summary = SecondSummary {
            second: self.frame / self.sim.fps,
            active_agents: self.agents.iter().filter(|a| a.is_active()).count(),
            repaths: stats.repaths,
            path_failures: stats.path_failures,
            sense_checks: stats.sense_checks,
        };
        info!(
            "t={}s active={}/{} repaths={} path_failures={} sense_checks={}",
            summary.second,
            summary.active_agents,
            self.agents.len(),
            summary.repaths,
            summary.path_failures,
            summary.sense_checks
        );
        Some(summary)
    }

    /// Runs every configured frame.
    pub fn run(&mut self) -> SimReport {
        let mut report = SimReport::default();
        for _ in 0..self.sim.frames {
            report.frames += 1;
            let active = self.agents.iter().filter(|a| a.is_active()).count();
            report.peak_active = report.peak_active.max(active);
            if let Some(summary) = self.step() {
                report.repaths += u64::from(summary.repaths);
                report.path_failures += u64::from(summary.path_failures);
                report.seconds.push(summary);
            }
        }
        // Counters from a trailing partial second.
        let rest = self.controller.take_stats();
        report.repaths += u64::from(rest.repaths);
        report.path_failures += u64::from(rest.path_failures);
        report
    }

    fn move_target(&mut self, dt: f32) {
        self.turn_timer -= dt;
        if self.turn_timer <= 0.0 {
            self.turn_timer = self.sim.target_turn_interval;
            self.heading = self.rng.f32() * TAU;
        }
        let body = Rect::around(self.target, self.sim.body_half_extent);
        let displacement = Vec2::from_angle(self.heading) * self.sim.target_speed * dt;
        let result = move_and_collide(&self.world.index, body, displacement);
        self.target = result.body(body.size()).center();
        if result.collided {
            self.heading = self.rng.f32() * TAU;
        }
    }
}
