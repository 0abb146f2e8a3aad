//! Room rectangles and corridor carving.

use delve_common::TileCoord;

use crate::spatial::SpatialIndex;
use crate::tile::TileKind;

/// Axis-aligned room in world tile coordinates.
///
/// Rooms only exist while a level is being carved; afterwards they survive
/// as Dirt tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Room {
    /// Left column
    pub x: i32,
    /// Top row
    pub y: i32,
    /// Width in tiles
    pub width: i32,
    /// Height in tiles
    pub height: i32,
}

impl Room {
    /// Creates a new room.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the room shifted by a tile offset.
    #[must_use]
    pub const fn translated(self, origin: TileCoord) -> Self {
        Self::new(self.x + origin.x, self.y + origin.y, self.width, self.height)
    }

    /// Centre tile (rounded toward the top-left).
    #[must_use]
    pub const fn center(&self) -> TileCoord {
        TileCoord::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Column one past the right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Row one past the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns whether the tile lies inside the room.
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= self.x && coord.x < self.right() && coord.y >= self.y && coord.y < self.bottom()
    }

    /// Iterates over every tile of the room.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let (x, right) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x..right).map(move |x| TileCoord::new(x, y)))
    }
}

/// Order in which an L-shaped corridor walks its two legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bend {
    /// Along the row first, then the column
    HorizontalFirst,
    /// Along the column first, then the row
    VerticalFirst,
}

/// Carves a room to Dirt. Returns the number of tiles carved.
pub fn carve_room(index: &mut SpatialIndex, room: &Room) -> usize {
    room.tiles().filter(|&coord| carve(index, coord)).count()
}

/// Carves an L-shaped corridor between two tiles.
///
/// Every tile within `half_width` of the centre line on the cross axis is
/// carved, so `half_width == 0` gives a one-wide corridor.
pub fn carve_corridor(
    index: &mut SpatialIndex,
    from: TileCoord,
    to: TileCoord,
    bend: Bend,
    half_width: i32,
) -> usize {
    match bend {
        Bend::HorizontalFirst => {
            carve_row(index, from.x, to.x, from.y, half_width)
                + carve_column(index, from.y, to.y, to.x, half_width)
        }
        Bend::VerticalFirst => {
            carve_column(index, from.y, to.y, from.x, half_width)
                + carve_row(index, from.x, to.x, to.y, half_width)
        }
    }
}

fn carve_row(index: &mut SpatialIndex, x0: i32, x1: i32, y: i32, half_width: i32) -> usize {
    let mut carved = 0;
    for x in x0.min(x1)..=x0.max(x1) {
        for dy in -half_width..=half_width {
            carved += usize::from(carve(index, TileCoord::new(x, y + dy)));
        }
    }
    carved
}

fn carve_column(index: &mut SpatialIndex, y0: i32, y1: i32, x: i32, half_width: i32) -> usize {
    let mut carved = 0;
    for y in y0.min(y1)..=y0.max(y1) {
        for dx in -half_width..=half_width {
            carved += usize::from(carve(index, TileCoord::new(x + dx, y)));
        }
    }
    carved
}

/// Turns one Stone tile into Dirt.
///
/// The outermost ring of the world always stays Stone. Returns whether the
/// tile changed.
pub(crate) fn carve(index: &mut SpatialIndex, coord: TileCoord) -> bool {
    let w = index.width() as i32;
    let h = index.height() as i32;
    if coord.x < 1 || coord.y < 1 || coord.x > w - 2 || coord.y > h - 2 {
        return false;
    }
    if index.is_dirt(coord) {
        return false;
    }
    index.set_kind(coord, TileKind::Dirt)
}
