//! # Delve World
//!
//! Level generation and tile storage for Delve.
//!
//! This crate handles:
//! - The tile grid and its spatial queries
//! - Room and corridor carving across a grid of chunks
//! - Connectivity repair and visual variants
//! - Biome-driven decoration
//! - Spawn placement

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod connectivity;
pub mod decoration;
pub mod generation;
pub mod rooms;
pub mod spatial;
pub mod spawn;
pub mod tile;
pub mod variants;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::connectivity::*;
    pub use crate::decoration::*;
    pub use crate::generation::*;
    pub use crate::rooms::*;
    pub use crate::spatial::*;
    pub use crate::spawn::*;
    pub use crate::tile::*;
    pub use crate::variants::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::TileCoord;

    #[test]
    fn test_generated_level_is_queryable() {
        let world = WorldGenerator::with_seed(2024)
            .generate_level(0)
            .expect("generate");
        let spawn = world.player_spawn.expect("player spawn");
        let center = world.index.tile_center(spawn);
        assert_eq!(world.index.world_to_tile(center), spawn);
        assert!(world
            .index
            .tiles_in_window(spawn, 1)
            .any(|(coord, tile)| coord != spawn && tile.walkable()));
        assert!(is_fully_connected(&world.index));
    }

    #[test]
    fn test_world_has_stone_border_rects() {
        let world = WorldGenerator::with_seed(1).generate(1, 1, 0).expect("generate");
        let rects: Vec<_> = world.index.solid_rects_in_window(TileCoord::new(0, 0), 0).collect();
        assert_eq!(rects.len(), 1);
    }
}
