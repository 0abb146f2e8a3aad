//! Border/fill sprite selection for Stone tiles.

use delve_common::TileCoord;

use crate::spatial::SpatialIndex;
use crate::tile::{TileKind, VisualVariant};

/// Computes the variant of one tile from its four neighbours.
///
/// Stone tiles record which sides face Dirt; every other kind gets the fill
/// variant. Out-of-bounds neighbours count as Stone.
#[must_use]
pub fn variant_for(index: &SpatialIndex, coord: TileCoord) -> VisualVariant {
    if index.tile(coord).map(|t| t.kind()) != Some(TileKind::Stone) {
        return VisualVariant::FILL;
    }
    let sides = [
        (0, -1, VisualVariant::NORTH),
        (1, 0, VisualVariant::EAST),
        (0, 1, VisualVariant::SOUTH),
        (-1, 0, VisualVariant::WEST),
    ];
    let mask = sides
        .iter()
        .filter(|(dx, dy, _)| index.is_dirt(coord.offset(*dx, *dy)))
        .fold(0, |mask, (_, _, bit)| mask | bit);
    VisualVariant::from_mask(mask)
}

/// Recomputes the variant of every tile. Walkability is never touched.
pub fn apply_visual_variants(index: &mut SpatialIndex) {
    let variants: Vec<_> = index.coords().map(|coord| (coord, variant_for(index, coord))).collect();
    for (coord, variant) in variants {
        index.set_variant(coord, variant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_masks() {
        let mut index = SpatialIndex::from_ascii(
            &[
                "#####", //
                "#...#", //
                "#.#.#", //
                "#...#", //
                "#####",
            ],
            16.0,
        );
        let walkable_before: Vec<_> = index.iter().map(|(_, t)| t.walkable()).collect();
        apply_visual_variants(&mut index);

        let variant = |x, y| index.tile_at(x, y).map(|t| t.variant().mask());
        // Pillar in the middle is exposed on all four sides.
        assert_eq!(variant(2, 2), Some(15));
        // Top wall faces Dirt to the south only.
        assert_eq!(variant(2, 0), Some(VisualVariant::SOUTH));
        // Corners touch Dirt only diagonally.
        assert_eq!(variant(0, 0), Some(0));
        // Dirt always uses the fill variant.
        assert_eq!(variant(1, 1), Some(0));

        let walkable_after: Vec<_> = index.iter().map(|(_, t)| t.walkable()).collect();
        assert_eq!(walkable_before, walkable_after);
    }
}
