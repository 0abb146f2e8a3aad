//! Coordinate types for world, tile, and chunk positions.
//!
//! World positions are continuous `f32` units (`Vec2`). Tiles are the integer
//! grid cells of the dungeon, and chunks are square groups of tiles used as the
//! unit of room generation.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default edge length of a tile in world units.
pub const DEFAULT_TILE_SIZE: f32 = 16.0;

/// Integer coordinate of a single tile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct TileCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TileCoord {
    /// The four orthogonal offsets in east, north, west, south order.
    pub const CARDINALS: [(i32, i32); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a world position to the tile containing it.
    ///
    /// Uses floor division so positions left of or above the origin map to
    /// negative tiles instead of collapsing onto tile zero.
    #[must_use]
    pub fn from_world(pos: Vec2, tile_size: f32) -> Self {
        Self {
            x: (pos.x / tile_size).floor() as i32,
            y: (pos.y / tile_size).floor() as i32,
        }
    }

    /// Returns the world position of the tile's top-left corner.
    #[must_use]
    pub fn to_world(self, tile_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * tile_size, self.y as f32 * tile_size)
    }

    /// Returns the world position of the tile's centre.
    #[must_use]
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * tile_size,
            (self.y as f32 + 0.5) * tile_size,
        )
    }

    /// Returns this coordinate shifted by an offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns the four orthogonal neighbours.
    #[must_use]
    pub fn cardinal_neighbors(self) -> [Self; 4] {
        Self::CARDINALS.map(|(dx, dy)| self.offset(dx, dy))
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev (king-move) distance to another tile.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Returns the chunk containing this tile.
    #[must_use]
    pub const fn to_chunk(self, chunk_size: u32) -> ChunkCoord {
        let size = chunk_size as i32;
        ChunkCoord {
            x: self.x.div_euclid(size),
            y: self.y.div_euclid(size),
        }
    }
}

/// Chunk coordinate (identifies a chunk in the chunk grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the tile at the chunk's top-left corner.
    #[must_use]
    pub const fn origin_tile(self, chunk_size: u32) -> TileCoord {
        let size = chunk_size as i32;
        TileCoord {
            x: self.x * size,
            y: self.y * size,
        }
    }

    /// Checks if a tile lies inside this chunk.
    #[must_use]
    pub const fn contains(self, tile: TileCoord, chunk_size: u32) -> bool {
        let origin = self.origin_tile(chunk_size);
        let size = chunk_size as i32;
        tile.x >= origin.x && tile.x < origin.x + size && tile.y >= origin.y && tile.y < origin.y + size
    }
}
