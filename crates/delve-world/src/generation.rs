//! Procedural dungeon generation.
//!
//! A level is a rectangular grid of square chunks. Each chunk is carved on its
//! own (rooms, then corridors between successive rooms, then scrap removal),
//! neighbouring chunks are stitched together, and a few global passes make
//! sure the result is traversable before it is decorated and populated.

use delve_common::{ChunkCoord, TileCoord, WorldError, DEFAULT_TILE_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::connectivity::repair_connectivity;
use crate::decoration::{place_props, BiomeField, Prop};
use crate::rooms::{carve, carve_corridor, carve_room, Bend, Room};
use crate::spatial::SpatialIndex;
use crate::spawn::{plan_spawns, SpawnPolicy};
use crate::tile::TileKind;
use crate::variants::apply_visual_variants;

/// World generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// World seed
    pub seed: u64,
    /// Chunk edge length in tiles
    pub chunk_size: u32,
    /// Tile edge length in world units
    pub tile_size: f32,
    /// Rooms placed in every chunk
    pub rooms_per_chunk: u32,
    /// Smallest room edge in tiles
    pub room_min_size: u32,
    /// Largest room edge in tiles
    pub room_max_size: u32,
    /// Corridor tiles carved on each side of the centre line
    pub corridor_half_width: u32,
    /// Chance of one extra loop corridor per chunk
    pub loop_chance: f32,
    /// Chance that an eligible rock tile gets a prop
    pub prop_density: f32,
    /// Perlin sampling scale for biomes (smaller = larger biomes)
    pub biome_scale: f64,
    /// Chunk grid edge at difficulty zero
    pub base_chunks: u32,
    /// Chunk grid edge cap
    pub max_chunks: u32,
    /// Spawn limits
    pub spawn: SpawnPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            chunk_size: 24,
            tile_size: DEFAULT_TILE_SIZE,
            rooms_per_chunk: 4,
            room_min_size: 3,
            room_max_size: 8,
            corridor_half_width: 1,
            loop_chance: 0.15,
            prop_density: 0.05,
            biome_scale: 0.06,
            base_chunks: 2,
            max_chunks: 6,
            spawn: SpawnPolicy::default(),
        }
    }
}

impl GeneratorConfig {
    /// Clamps values to ranges the generator can work with.
    pub fn validate(&mut self) {
        self.chunk_size = self.chunk_size.clamp(4, 256);
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            self.tile_size = DEFAULT_TILE_SIZE;
        }
        self.rooms_per_chunk = self.rooms_per_chunk.clamp(1, 32);
        self.room_min_size = self.room_min_size.clamp(2, 64);
        self.room_max_size = self.room_max_size.clamp(self.room_min_size, 64);
        self.corridor_half_width = self.corridor_half_width.min(2);
        self.loop_chance = self.loop_chance.clamp(0.0, 1.0);
        self.prop_density = self.prop_density.clamp(0.0, 1.0);
        if !(self.biome_scale.is_finite() && self.biome_scale > 0.0) {
            self.biome_scale = 0.06;
        }
        self.base_chunks = self.base_chunks.max(1);
        self.max_chunks = self.max_chunks.max(self.base_chunks);
        self.spawn.validate();
    }
}

/// Chunk grid and difficulty of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Chunks across
    pub chunks_x: u32,
    /// Chunks down
    pub chunks_y: u32,
    /// Difficulty level
    pub difficulty: u32,
}

impl LevelLayout {
    /// Layout for a difficulty level: the grid grows by one chunk every
    /// level, alternating between width and height, up to the configured cap.
    #[must_use]
    pub fn for_difficulty(config: &GeneratorConfig, difficulty: u32) -> Self {
        let grow = |steps: u32| config.base_chunks.saturating_add(steps).min(config.max_chunks);
        Self {
            chunks_x: grow(difficulty.saturating_add(1) / 2),
            chunks_y: grow(difficulty / 2),
            difficulty,
        }
    }
}

/// Counters collected while generating a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Rooms carved over all chunks
    pub rooms: usize,
    /// Chunks left without rooms
    pub filler_chunks: usize,
    /// Corridors carved between rooms and chunks
    pub corridors: usize,
    /// Dirt tiles reverted by scrap removal
    pub scrap_removed: usize,
    /// Diagonal-only contacts that were opened up
    pub pinches_opened: usize,
    /// Disconnected regions joined to the main one
    pub regions_joined: usize,
    /// Dirt tiles in the finished level
    pub dirt_tiles: usize,
}

/// A finished level.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    /// Tile grid
    pub index: SpatialIndex,
    /// Layout the level was generated for
    pub layout: LevelLayout,
    /// Chunk edge length in tiles
    pub chunk_size: u32,
    /// Decorative props; tiles reference them by index
    pub props: Vec<Prop>,
    /// Hostile agent start tiles
    pub enemy_spawns: Vec<TileCoord>,
    /// One point of interest per non-filler chunk
    pub points_of_interest: Vec<TileCoord>,
    /// Player start tile
    pub player_spawn: Option<TileCoord>,
    /// Generation counters
    pub stats: GenerationStats,
}

/// Procedural dungeon generator.
pub struct WorldGenerator {
    config: GeneratorConfig,
}

impl WorldGenerator {
    /// Creates a new generator; the config is validated first.
    #[must_use]
    pub fn new(mut config: GeneratorConfig) -> Self {
        config.validate();
        Self { config }
    }

    /// Creates a generator with default config.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(GeneratorConfig {
            seed,
            ..Default::default()
        })
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the level for a difficulty using [`LevelLayout::for_difficulty`].
    pub fn generate_level(&self, difficulty: u32) -> Result<GeneratedWorld, WorldError> {
        let layout = LevelLayout::for_difficulty(&self.config, difficulty);
        self.generate(layout.chunks_x, layout.chunks_y, layout.difficulty)
    }

    /// Generates a level of `chunks_x x chunks_y` chunks.
    ///
    /// The same config and arguments always give the same level.
    pub fn generate(
        &self,
        chunks_x: u32,
        chunks_y: u32,
        difficulty: u32,
    ) -> Result<GeneratedWorld, WorldError> {
        let size = self.config.chunk_size;
        let invalid = WorldError::InvalidLayout {
            chunks_x,
            chunks_y,
            chunk_size: size,
        };
        if chunks_x == 0 || chunks_y == 0 || size == 0 {
            return Err(invalid);
        }
        let (Some(width), Some(height)) = (chunks_x.checked_mul(size), chunks_y.checked_mul(size))
        else {
            return Err(invalid);
        };
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(invalid);
        }

        let mut rng = fastrand::Rng::with_seed(self.level_seed(difficulty));
        let mut index = SpatialIndex::new(width, height, self.config.tile_size, TileKind::Stone);
        let mut stats = GenerationStats::default();

        let mut rooms = Vec::with_capacity(chunks_x as usize * chunks_y as usize);
        for cy in 0..chunks_y {
            for cx in 0..chunks_x {
                let chunk = ChunkCoord::new(cx as i32, cy as i32);
                let chunk_rooms = self.carve_chunk(&mut index, chunk, &mut rng, &mut stats);
                if chunk_rooms.is_empty() {
                    warn!("Chunk ({}, {}) produced no rooms; leaving it as filler", cx, cy);
                    stats.filler_chunks += 1;
                }
                rooms.push(chunk_rooms);
            }
        }

        let at = |cx: u32, cy: u32| cy as usize * chunks_x as usize + cx as usize;
        for cy in 0..chunks_y {
            for cx in 0..chunks_x {
                let here = &rooms[at(cx, cy)];
                if cx + 1 < chunks_x {
                    let east = &rooms[at(cx + 1, cy)];
                    stats.corridors +=
                        self.stitch(&mut index, here, east, Bend::HorizontalFirst, &mut rng);
                }
                if cy + 1 < chunks_y {
                    let south = &rooms[at(cx, cy + 1)];
                    stats.corridors +=
                        self.stitch(&mut index, here, south, Bend::VerticalFirst, &mut rng);
                }
            }
        }

        stats.pinches_opened = open_diagonal_pinches(&mut index);
        stats.regions_joined = repair_connectivity(&mut index);
        debug!(
            "Opened {} diagonal pinches, joined {} regions",
            stats.pinches_opened, stats.regions_joined
        );

        apply_visual_variants(&mut index);

        let field = BiomeField::new(fold_seed(self.config.seed), self.config.biome_scale);
        let props = place_props(&mut index, &field, self.config.prop_density, &mut rng);

        let plan = plan_spawns(
            &index,
            &self.config.spawn,
            size,
            (chunks_x, chunks_y),
            difficulty,
            &mut rng,
        );

        stats.dirt_tiles = index.dirt_count();
        info!(
            "Generated {}x{} level (difficulty {}): {} rooms, {} dirt tiles, {} props, {} enemies",
            chunks_x,
            chunks_y,
            difficulty,
            stats.rooms,
            stats.dirt_tiles,
            props.len(),
            plan.enemies.len()
        );

        Ok(GeneratedWorld {
            index,
            layout: LevelLayout {
                chunks_x,
                chunks_y,
                difficulty,
            },
            chunk_size: size,
            props,
            enemy_spawns: plan.enemies,
            points_of_interest: plan.points_of_interest,
            player_spawn: plan.player,
            stats,
        })
    }

    fn level_seed(&self, difficulty: u32) -> u64 {
        self.config.seed ^ u64::from(difficulty).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Places and connects the rooms of one chunk. Returns them in world
    /// coordinates; an empty list marks a filler chunk.
    fn carve_chunk(
        &self,
        index: &mut SpatialIndex,
        chunk: ChunkCoord,
        rng: &mut fastrand::Rng,
        stats: &mut GenerationStats,
    ) -> Vec<Room> {
        let size = self.config.chunk_size;
        let origin = chunk.origin_tile(size);
        // One tile of margin on every side keeps rooms off chunk edges.
        let usable = size.saturating_sub(2) as i32;
        let min = self.config.room_min_size as i32;
        if usable < min {
            return Vec::new();
        }
        let max = (self.config.room_max_size as i32).min(usable);

        let mut rooms = Vec::with_capacity(self.config.rooms_per_chunk as usize);
        for _ in 0..self.config.rooms_per_chunk {
            let width = rng.i32(min..=max);
            let height = rng.i32(min..=max);
            let x = 1 + rng.i32(0..=usable - width);
            let y = 1 + rng.i32(0..=usable - height);
            let room = Room::new(x, y, width, height).translated(origin);
            carve_room(index, &room);
            rooms.push(room);
        }
        stats.rooms += rooms.len();

        let half_width = self.config.corridor_half_width as i32;
        for pair in rooms.windows(2) {
            carve_corridor(index, pair[0].center(), pair[1].center(), random_bend(rng), half_width);
            stats.corridors += 1;
        }
        if rooms.len() > 2 && rng.f32() < self.config.loop_chance {
            let last = rooms[rooms.len() - 1];
            let earlier = rooms[rng.usize(..rooms.len() - 2)];
            carve_corridor(index, last.center(), earlier.center(), random_bend(rng), half_width);
            stats.corridors += 1;
        }

        stats.scrap_removed += remove_scrap(index, origin, size as i32);
        rooms
    }

    /// Connects two neighbouring chunks: their facing outermost rooms, plus
    /// one extra corridor between random rooms of each.
    fn stitch(
        &self,
        index: &mut SpatialIndex,
        first: &[Room],
        second: &[Room],
        bend: Bend,
        rng: &mut fastrand::Rng,
    ) -> usize {
        if first.is_empty() || second.is_empty() {
            return 0;
        }
        let facing = match bend {
            Bend::HorizontalFirst => (
                first.iter().max_by_key(|r| r.right()),
                second.iter().min_by_key(|r| r.x),
            ),
            Bend::VerticalFirst => (
                first.iter().max_by_key(|r| r.bottom()),
                second.iter().min_by_key(|r| r.y),
            ),
        };
        let half_width = self.config.corridor_half_width as i32;
        let mut carved = 0;
        if let (Some(a), Some(b)) = facing {
            carve_corridor(index, a.center(), b.center(), bend, half_width);
            carved += 1;
        }
        let a = first[rng.usize(..first.len())];
        let b = second[rng.usize(..second.len())];
        carve_corridor(index, a.center(), b.center(), random_bend(rng), half_width);
        carved + 1
    }
}

fn random_bend(rng: &mut fastrand::Rng) -> Bend {
    if rng.bool() {
        Bend::HorizontalFirst
    } else {
        Bend::VerticalFirst
    }
}

fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Reverts Dirt tiles with at most one Dirt neighbour inside a square area,
/// repeating until nothing changes. Returns the number of tiles reverted.
pub fn remove_scrap(index: &mut SpatialIndex, origin: TileCoord, size: i32) -> usize {
    let mut removed = 0;
    loop {
        let mut changed = false;
        for y in origin.y..origin.y + size {
            for x in origin.x..origin.x + size {
                let coord = TileCoord::new(x, y);
                if !index.is_dirt(coord) {
                    continue;
                }
                let neighbours = coord
                    .cardinal_neighbors()
                    .iter()
                    .filter(|&&n| index.is_dirt(n))
                    .count();
                if neighbours <= 1 {
                    index.set_kind(coord, TileKind::Stone);
                    removed += 1;
                    changed = true;
                }
            }
        }
        if !changed {
            return removed;
        }
    }
}

/// Carves one side of every 2x2 block whose Dirt tiles touch only at a
/// corner, so corner-cut-free movement can pass. Returns the number opened.
pub fn open_diagonal_pinches(index: &mut SpatialIndex) -> usize {
    let mut opened = 0;
    for y in 0..index.height() as i32 - 1 {
        for x in 0..index.width() as i32 - 1 {
            let nw = TileCoord::new(x, y);
            let ne = TileCoord::new(x + 1, y);
            let sw = TileCoord::new(x, y + 1);
            let se = TileCoord::new(x + 1, y + 1);
            let dirt = |c| index.is_dirt(c);
            let target = if dirt(nw) && dirt(se) && !dirt(ne) && !dirt(sw) {
                Some(ne)
            } else if dirt(ne) && dirt(sw) && !dirt(nw) && !dirt(se) {
                Some(nw)
            } else {
                None
            };
            if let Some(coord) = target {
                opened += usize::from(carve(index, coord));
            }
        }
    }
    opened
}
