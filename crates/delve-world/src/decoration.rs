//! Off-grid decorative props placed inside solid rock.
//!
//! Props sit on Stone tiles whose eight neighbours are also Stone, so they are
//! never visible from a walkable tile's edge and never block movement. Which
//! props appear where is driven by a Perlin biome field seeded from the
//! world seed.

use delve_common::{PropId, TileCoord};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::spatial::SpatialIndex;
use crate::tile::TileKind;

/// Biome of a region of rock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    /// Plain rock
    Cavern,
    /// Damp rock overgrown with fungus
    Fungal,
    /// Rock threaded with crystal veins
    Crystal,
}

impl Biome {
    /// Props that can appear in this biome.
    #[must_use]
    pub const fn props(self) -> &'static [PropKind] {
        match self {
            Self::Cavern => &[PropKind::Boulder, PropKind::Rubble, PropKind::Stalagmite],
            Self::Fungal => &[PropKind::Mushrooms, PropKind::Rubble],
            Self::Crystal => &[PropKind::CrystalCluster, PropKind::Stalagmite],
        }
    }
}

/// Kind of decorative prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    /// 2x2 boulder
    Boulder,
    /// 2x1 loose rubble
    Rubble,
    /// 1x2 stalagmite
    Stalagmite,
    /// 2x2 mushroom patch
    Mushrooms,
    /// 3x2 crystal cluster
    CrystalCluster,
}

impl PropKind {
    /// Width and height of the prop's footprint in tiles.
    #[must_use]
    pub const fn footprint(self) -> (i32, i32) {
        match self {
            Self::Boulder | Self::Mushrooms => (2, 2),
            Self::Rubble => (2, 1),
            Self::Stalagmite => (1, 2),
            Self::CrystalCluster => (3, 2),
        }
    }
}

/// A placed prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    /// What the prop is
    pub kind: PropKind,
    /// Biome it was drawn from
    pub biome: Biome,
    /// Top-left tile of the footprint
    pub origin: TileCoord,
}

impl Prop {
    /// Iterates over the tiles covered by the prop.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let (w, h) = self.kind.footprint();
        let origin = self.origin;
        (0..h).flat_map(move |dy| (0..w).map(move |dx| origin.offset(dx, dy)))
    }
}

/// Deterministic biome lookup.
pub struct BiomeField {
    noise: Perlin,
    scale: f64,
    threshold: f64,
}

impl BiomeField {
    /// Creates a field from a seed and a sampling scale (smaller = larger biomes).
    #[must_use]
    pub fn new(seed: u32, scale: f64) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            threshold: 0.2,
        }
    }

    /// Biome at a tile.
    #[must_use]
    pub fn biome_at(&self, coord: TileCoord) -> Biome {
        // Offset off the integer lattice, where Perlin is always zero.
        let value = self.noise.get([
            (f64::from(coord.x) + 0.5) * self.scale,
            (f64::from(coord.y) + 0.5) * self.scale,
        ]);
        if value < -self.threshold {
            Biome::Fungal
        } else if value > self.threshold {
            Biome::Crystal
        } else {
            Biome::Cavern
        }
    }
}

/// Returns whether the tile is Stone with eight Stone neighbours.
#[must_use]
pub fn is_stone_interior(index: &SpatialIndex, coord: TileCoord) -> bool {
    (-1..=1).all(|dy| {
        (-1..=1).all(|dx| {
            index
                .tile(coord.offset(dx, dy))
                .is_some_and(|t| t.kind() == TileKind::Stone)
        })
    })
}

/// Returns whether a prop of `kind` fits at `origin`: every covered tile is
/// Stone-interior and not yet occupied.
#[must_use]
pub fn footprint_is_free(index: &SpatialIndex, kind: PropKind, origin: TileCoord) -> bool {
    let probe = Prop {
        kind,
        biome: Biome::Cavern,
        origin,
    };
    probe.tiles().all(|coord| {
        is_stone_interior(index, coord) && index.tile(coord).is_some_and(|t| t.occupant().is_none())
    })
}

/// Scatters props over the rock of an index.
///
/// Each Stone-interior tile is a candidate with probability `density`.
/// Candidates whose footprint does not fit are skipped.
pub fn place_props(
    index: &mut SpatialIndex,
    field: &BiomeField,
    density: f32,
    rng: &mut fastrand::Rng,
) -> Vec<Prop> {
    let mut props = Vec::new();
    let candidates: Vec<_> = index.coords().filter(|&c| is_stone_interior(index, c)).collect();

    for origin in candidates {
        if rng.f32() >= density {
            continue;
        }
        let biome = field.biome_at(origin);
        let choices = biome.props();
        let kind = choices[rng.usize(..choices.len())];
        if !footprint_is_free(index, kind, origin) {
            continue;
        }

        let id = PropId::new(props.len() as u32);
        let prop = Prop { kind, biome, origin };
        if prop.tiles().all(|coord| index.set_occupant(coord, Some(id)).is_ok()) {
            props.push(prop);
        }
    }
    props
}
