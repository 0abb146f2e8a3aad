//! Tile data stored in the spatial index.

use delve_common::PropId;
use serde::{Deserialize, Serialize};

/// Material of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// Carved floor; the only walkable kind
    Dirt,
    /// Solid rock; blocks movement and sight
    #[default]
    Stone,
    /// Void; neither walkable nor solid
    Air,
}

impl TileKind {
    /// Returns whether agents and the player may stand on this kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Dirt)
    }

    /// Returns whether this kind blocks movement and line of sight.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Stone)
    }
}

/// Bitmask of the Dirt neighbours of a Stone tile, used to pick a border sprite.
///
/// Bits: north = 1, east = 2, south = 4, west = 8. Zero means the tile is
/// surrounded by Stone on all four sides (a fill sprite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VisualVariant(u8);

impl VisualVariant {
    /// Dirt neighbour to the north.
    pub const NORTH: u8 = 1;
    /// Dirt neighbour to the east.
    pub const EAST: u8 = 2;
    /// Dirt neighbour to the south.
    pub const SOUTH: u8 = 4;
    /// Dirt neighbour to the west.
    pub const WEST: u8 = 8;

    /// Fill variant with no exposed edges.
    pub const FILL: Self = Self(0);

    /// Creates a variant from a raw mask (upper bits are discarded).
    #[must_use]
    pub const fn from_mask(mask: u8) -> Self {
        Self(mask & 0x0F)
    }

    /// Returns the raw mask.
    #[must_use]
    pub const fn mask(self) -> u8 {
        self.0
    }

    /// Returns whether the given edge bit is set.
    #[must_use]
    pub const fn has(self, edge: u8) -> bool {
        self.0 & edge != 0
    }
}

/// One grid cell of the world.
///
/// `walkable` is derived from `kind` and only changes through [`Tile::set_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    kind: TileKind,
    variant: VisualVariant,
    walkable: bool,
    occupant: Option<PropId>,
}

impl Tile {
    /// Creates a tile of the given kind.
    #[must_use]
    pub const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            variant: VisualVariant::FILL,
            walkable: kind.is_walkable(),
            occupant: None,
        }
    }

    /// Returns the tile kind.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Changes the kind and the derived walkability together.
    pub fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
        self.walkable = kind.is_walkable();
    }

    /// Returns whether the tile can be walked on.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Returns whether the tile blocks movement and sight.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }

    /// Returns the presentation variant.
    #[must_use]
    pub const fn variant(&self) -> VisualVariant {
        self.variant
    }

    /// Sets the presentation variant.
    pub fn set_variant(&mut self, variant: VisualVariant) {
        self.variant = variant;
    }

    /// Returns the prop covering this tile, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<PropId> {
        self.occupant
    }

    /// Sets or clears the prop covering this tile.
    pub fn set_occupant(&mut self, occupant: Option<PropId>) {
        self.occupant = occupant;
    }
}
