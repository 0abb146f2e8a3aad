//! Spawn placement for hostile agents, points of interest and the player.

use delve_common::{ChunkCoord, TileCoord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spatial::SpatialIndex;

/// Difficulty-scaled spawn limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPolicy {
    /// Per-tile spawn chance at difficulty zero
    pub base_chance: f32,
    /// Per-tile spawn chance once the ramp is over
    pub max_chance: f32,
    /// Number of levels over which the chance ramps up
    pub ramp_levels: u32,
    /// Per-chunk cap at difficulty zero
    pub chunk_cap_base: u32,
    /// Per-chunk cap increase per level
    pub chunk_cap_per_level: u32,
    /// Global cap at difficulty zero
    pub global_cap_base: u32,
    /// Global cap increase per level
    pub global_cap_per_level: u32,
    /// Chunk the player starts in; it never receives hostile agents
    pub start_chunk: (u32, u32),
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            base_chance: 0.004,
            max_chance: 0.012,
            ramp_levels: 4,
            chunk_cap_base: 2,
            chunk_cap_per_level: 1,
            global_cap_base: 6,
            global_cap_per_level: 4,
            start_chunk: (0, 0),
        }
    }
}

impl SpawnPolicy {
    /// Per-tile spawn chance for a difficulty level.
    #[must_use]
    pub fn spawn_chance(&self, difficulty: u32) -> f32 {
        if self.ramp_levels == 0 {
            return self.max_chance;
        }
        let t = difficulty.min(self.ramp_levels) as f32 / self.ramp_levels as f32;
        self.base_chance + (self.max_chance - self.base_chance) * t
    }

    /// Maximum hostile agents in a single chunk.
    #[must_use]
    pub fn chunk_cap(&self, difficulty: u32) -> u32 {
        self.chunk_cap_base
            .saturating_add(self.chunk_cap_per_level.saturating_mul(difficulty))
    }

    /// Maximum hostile agents in the whole level.
    #[must_use]
    pub fn global_cap(&self, difficulty: u32) -> u32 {
        self.global_cap_base
            .saturating_add(self.global_cap_per_level.saturating_mul(difficulty))
    }

    /// Clamps the policy to sane ranges.
    pub fn validate(&mut self) {
        let defaults = Self::default();
        if !self.base_chance.is_finite() {
            self.base_chance = defaults.base_chance;
        }
        if !self.max_chance.is_finite() {
            self.max_chance = defaults.max_chance;
        }
        self.base_chance = self.base_chance.clamp(0.0, 1.0);
        self.max_chance = self.max_chance.clamp(self.base_chance, 1.0);
        self.ramp_levels = self.ramp_levels.min(100);
    }
}

/// Everything placed by the spawn pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnPlan {
    /// Tiles where hostile agents start
    pub enemies: Vec<TileCoord>,
    /// One tile per chunk that has Dirt
    pub points_of_interest: Vec<TileCoord>,
    /// Player start tile, if the world has any free Dirt
    pub player: Option<TileCoord>,
}

/// Places hostile agents, points of interest and the player.
///
/// Chunks are visited in row-major order, so the global cap favours chunks
/// near the top-left of the grid.
pub fn plan_spawns(
    index: &SpatialIndex,
    policy: &SpawnPolicy,
    chunk_size: u32,
    chunks: (u32, u32),
    difficulty: u32,
    rng: &mut fastrand::Rng,
) -> SpawnPlan {
    let mut plan = SpawnPlan::default();
    let chance = policy.spawn_chance(difficulty);
    let chunk_cap = policy.chunk_cap(difficulty) as usize;
    let mut remaining = policy.global_cap(difficulty) as usize;
    let start = start_chunk(policy, chunks);

    for cy in 0..chunks.1 {
        for cx in 0..chunks.0 {
            let chunk = ChunkCoord::new(cx as i32, cy as i32);
            let mut cells = chunk_dirt(index, chunk, chunk_size);
            if cells.is_empty() {
                continue;
            }

            rng.shuffle(&mut cells);
            let Some((&poi, rest)) = cells.split_first() else {
                continue;
            };
            plan.points_of_interest.push(poi);

            if chunk == start {
                continue;
            }
            let wanted = (cells.len() as f32 * chance).round() as usize;
            let count = wanted.min(chunk_cap).min(remaining).min(rest.len());
            plan.enemies.extend_from_slice(&rest[..count]);
            remaining -= count;
        }
    }

    let mut reserved = plan.points_of_interest.clone();
    reserved.extend_from_slice(&plan.enemies);
    plan.player = choose_player_spawn(index, chunk_size, start, &reserved, rng);
    debug!(
        "Spawn plan: {} enemies, {} points of interest, player {:?}",
        plan.enemies.len(),
        plan.points_of_interest.len(),
        plan.player
    );
    plan
}

/// Picks a free Dirt tile for the player by reservoir sampling.
///
/// Only the starting chunk is scanned unless it has no usable tile, in which
/// case the whole world is.
pub fn choose_player_spawn(
    index: &SpatialIndex,
    chunk_size: u32,
    start: ChunkCoord,
    reserved: &[TileCoord],
    rng: &mut fastrand::Rng,
) -> Option<TileCoord> {
    let usable = |coord: &TileCoord| {
        index.is_dirt(*coord)
            && index.tile(*coord).is_some_and(|t| t.occupant().is_none())
            && !reserved.contains(coord)
    };
    let in_chunk = index
        .coords()
        .filter(|c| start.contains(*c, chunk_size))
        .filter(|c| usable(c));
    reservoir_sample(in_chunk, rng).or_else(|| reservoir_sample(index.coords().filter(|c| usable(c)), rng))
}

/// Uniformly picks one item from an iterator of unknown length.
fn reservoir_sample<T>(items: impl Iterator<Item = T>, rng: &mut fastrand::Rng) -> Option<T> {
    let mut chosen = None;
    for (seen, item) in items.enumerate() {
        if rng.usize(..=seen) == 0 {
            chosen = Some(item);
        }
    }
    chosen
}

fn start_chunk(policy: &SpawnPolicy, chunks: (u32, u32)) -> ChunkCoord {
    let x = policy.start_chunk.0.min(chunks.0.saturating_sub(1));
    let y = policy.start_chunk.1.min(chunks.1.saturating_sub(1));
    ChunkCoord::new(x as i32, y as i32)
}

fn chunk_dirt(index: &SpatialIndex, chunk: ChunkCoord, chunk_size: u32) -> Vec<TileCoord> {
    let origin = chunk.origin_tile(chunk_size);
    let size = chunk_size as i32;
    (origin.y..origin.y + size)
        .flat_map(|y| (origin.x..origin.x + size).map(move |x| TileCoord::new(x, y)))
        .filter(|&coord| index.is_dirt(coord))
        .collect()
}
