//! Dense tile grid with point and window queries.
//!
//! Every tile lookup in Delve goes through [`SpatialIndex`]. Lookups outside the
//! generated bounds return `None`; consumers treat a miss as solid and
//! non-walkable.

use delve_common::{PropId, Rect, TileCoord, Vec2, WorldError};

use crate::tile::{Tile, TileKind, VisualVariant};

/// Row-major tile storage sized to the world.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialIndex {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl SpatialIndex {
    /// Creates an index of `width x height` tiles, all of one kind.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_size: f32, fill: TileKind) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![Tile::new(fill); (width as usize) * (height as usize)],
        }
    }

    /// Builds an index from rows of characters: `.` is Dirt, `#` is Stone and
    /// anything else is Air. Rows shorter than the longest one are padded with Stone.
    #[must_use]
    pub fn from_ascii(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as u32;
        let mut index = Self::new(width, height, tile_size, TileKind::Stone);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    '.' => TileKind::Dirt,
                    '#' => TileKind::Stone,
                    _ => TileKind::Air,
                };
                index.set_kind(TileCoord::new(x as i32, y as i32), kind);
            }
        }
        index
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile edge length in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Number of tiles in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns whether the index holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Returns whether the coordinate lies inside the index.
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as u32) < self.width && (coord.y as u32) < self.height
    }

    /// Converts a coordinate to its row-major slot.
    #[must_use]
    pub fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Converts a row-major slot back to a coordinate.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> TileCoord {
        let width = self.width as usize;
        TileCoord::new((index % width) as i32, (index / width) as i32)
    }

    /// Point lookup by raw coordinates.
    #[must_use]
    pub fn tile_at(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tile(TileCoord::new(x, y))
    }

    /// Point lookup.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index_of(coord).map(|i| &self.tiles[i])
    }

    /// Returns the tile containing a world position.
    #[must_use]
    pub fn tile_at_world(&self, pos: Vec2) -> Option<&Tile> {
        self.tile(self.world_to_tile(pos))
    }

    /// Returns whether the tile exists and is walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(Tile::walkable)
    }

    /// Returns whether the tile blocks movement; misses count as solid.
    #[must_use]
    pub fn is_solid(&self, coord: TileCoord) -> bool {
        self.tile(coord).map_or(true, Tile::is_solid)
    }

    /// Returns whether the tile exists and is Dirt.
    #[must_use]
    pub fn is_dirt(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(|t| t.kind() == TileKind::Dirt)
    }

    /// Iterates over the in-bounds tiles of the square window of `radius`
    /// tiles around `center`, row by row.
    ///
    /// A* expansion reads its eight neighbours through [`Self::index_of`] and
    /// [`Self::is_walkable`] instead, which is the radius-1 window without the
    /// iterator.
    pub fn tiles_in_window(
        &self,
        center: TileCoord,
        radius: i32,
    ) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
        window_coords(center, radius).filter_map(move |coord| self.tile(coord).map(|tile| (coord, tile)))
    }

    /// World rectangles of every solid cell in the window around `center`.
    ///
    /// Out-of-bounds cells are reported as solid so that nothing can leave the
    /// world through its edge.
    pub fn solid_rects_in_window(
        &self,
        center: TileCoord,
        radius: i32,
    ) -> impl Iterator<Item = Rect> + '_ {
        window_coords(center, radius)
            .filter(move |&coord| self.is_solid(coord))
            .map(move |coord| self.tile_rect(coord))
    }

    /// Converts a world position to the containing tile.
    #[must_use]
    pub fn world_to_tile(&self, pos: Vec2) -> TileCoord {
        TileCoord::from_world(pos, self.tile_size)
    }

    /// World-space rectangle covered by a tile.
    #[must_use]
    pub fn tile_rect(&self, coord: TileCoord) -> Rect {
        let origin = coord.to_world(self.tile_size);
        Rect::new(origin.x, origin.y, self.tile_size, self.tile_size)
    }

    /// World-space centre of a tile.
    #[must_use]
    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        coord.center(self.tile_size)
    }

    /// Changes a tile's kind, keeping walkability in sync. Returns `false` on a miss.
    pub fn set_kind(&mut self, coord: TileCoord, kind: TileKind) -> bool {
        self.tile_mut(coord).map(|tile| tile.set_kind(kind)).is_some()
    }

    /// Changes a tile's presentation variant. Returns `false` on a miss.
    pub fn set_variant(&mut self, coord: TileCoord, variant: VisualVariant) -> bool {
        self.tile_mut(coord).map(|tile| tile.set_variant(variant)).is_some()
    }

    /// Marks a tile as covered by a prop.
    pub fn set_occupant(&mut self, coord: TileCoord, occupant: Option<PropId>) -> Result<(), WorldError> {
        let tile = self
            .tile_mut(coord)
            .ok_or(WorldError::OutOfBounds { x: coord.x, y: coord.y })?;
        tile.set_occupant(occupant);
        Ok(())
    }

    /// Number of Dirt tiles in the whole index.
    #[must_use]
    pub fn dirt_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.kind() == TileKind::Dirt).count()
    }

    /// Iterates over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| TileCoord::new(x, y)))
    }

    /// Iterates over every tile with its coordinate in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
        self.tiles.iter().enumerate().map(|(i, tile)| (self.coord_of(i), tile))
    }

    fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        let i = self.index_of(coord)?;
        Some(&mut self.tiles[i])
    }
}

/// Coordinates of the square window of `radius` tiles around `center`.
fn window_coords(center: TileCoord, radius: i32) -> impl Iterator<Item = TileCoord> {
    let radius = radius.max(0);
    (center.y - radius..=center.y + radius)
        .flat_map(move |y| (center.x - radius..=center.x + radius).map(move |x| TileCoord::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpatialIndex {
        SpatialIndex::from_ascii(
            &[
                "#####", //
                "#...#", //
                "#.#.#", //
                "#...#", //
                "#####",
            ],
            16.0,
        )
    }

    #[test]
    fn test_point_lookup() {
        let index = sample();
        assert_eq!(index.width(), 5);
        assert_eq!(index.height(), 5);
        assert_eq!(index.tile_at(1, 1).map(Tile::kind), Some(TileKind::Dirt));
        assert_eq!(index.tile_at(2, 2).map(Tile::kind), Some(TileKind::Stone));
        assert!(index.tile_at(5, 0).is_none());
        assert!(index.tile_at(-1, 2).is_none());
    }

    #[test]
    fn test_misses_are_solid_and_unwalkable() {
        let index = sample();
        let outside = TileCoord::new(-3, 7);
        assert!(index.is_solid(outside));
        assert!(!index.is_walkable(outside));
    }

    #[test]
    fn test_window_clips_to_bounds() {
        let index = sample();
        let corner: Vec<_> = index.tiles_in_window(TileCoord::new(0, 0), 1).collect();
        assert_eq!(corner.len(), 4);
        assert_eq!(corner[0].0, TileCoord::new(0, 0));

        let middle = index.tiles_in_window(TileCoord::new(2, 2), 1).count();
        assert_eq!(middle, 9);
        let walkable = index
            .tiles_in_window(TileCoord::new(2, 2), 1)
            .filter(|(_, t)| t.walkable())
            .count();
        assert_eq!(walkable, 8);
    }

    #[test]
    fn test_solid_rects_include_out_of_bounds() {
        let index = sample();
        // Window of 9 around the corner: 4 in-bounds Stone/Dirt + 5 outside.
        let rects: Vec<_> = index.solid_rects_in_window(TileCoord::new(0, 0), 1).collect();
        // (0,0), (1,0), (0,1) are Stone; (1,1) is Dirt; 5 cells are outside.
        assert_eq!(rects.len(), 8);
        assert!(rects.contains(&Rect::new(-16.0, -16.0, 16.0, 16.0)));
        assert!(!rects.contains(&Rect::new(16.0, 16.0, 16.0, 16.0)));
    }

    #[test]
    fn test_set_kind_keeps_walkable_in_sync() {
        let mut index = sample();
        let coord = TileCoord::new(2, 2);
        assert!(index.set_kind(coord, TileKind::Dirt));
        assert!(index.is_walkable(coord));
        assert!(!index.set_kind(TileCoord::new(9, 9), TileKind::Dirt));
        assert_eq!(index.dirt_count(), 9);
    }

    #[test]
    fn test_world_conversion() {
        let index = sample();
        assert_eq!(index.world_to_tile(Vec2::new(40.0, 17.0)), TileCoord::new(2, 1));
        assert_eq!(index.tile_center(TileCoord::new(1, 1)), Vec2::new(24.0, 24.0));
        assert_eq!(index.tile_rect(TileCoord::new(1, 2)), Rect::new(16.0, 32.0, 16.0, 16.0));
    }

    #[test]
    fn test_occupant_out_of_bounds() {
        let mut index = sample();
        let err = index.set_occupant(TileCoord::new(10, 0), Some(PropId::new(0)));
        assert_eq!(err, Err(WorldError::OutOfBounds { x: 10, y: 0 }));
        assert!(index.set_occupant(TileCoord::new(0, 0), Some(PropId::new(3))).is_ok());
        assert_eq!(index.tile_at(0, 0).and_then(Tile::occupant), Some(PropId::new(3)));
    }
}
