//! Axis-separated collision against the tile grid.
//!
//! Bodies are axis-aligned rectangles. A move is applied along X first and
//! then along Y; after each axis the body is pushed back to the edge of any
//! solid tile it overlaps, which lets bodies slide along walls.

use delve_common::{Rect, Vec2};
use delve_world::SpatialIndex;

/// Outcome of a collision-resolved move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// New top-left corner of the body
    pub position: Vec2,
    /// Whether either axis was blocked
    pub collided: bool,
}

impl MoveResult {
    /// Body rectangle after the move.
    #[must_use]
    pub fn body(&self, size: Vec2) -> Rect {
        Rect::from_origin(self.position, size)
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Moves a body by `displacement`, clamping it against solid tiles.
///
/// Out-of-bounds tiles count as solid. Non-finite displacements are ignored.
#[must_use]
pub fn move_and_collide(index: &SpatialIndex, body: Rect, displacement: Vec2) -> MoveResult {
    if !displacement.is_finite() {
        return MoveResult {
            position: body.origin(),
            collided: false,
        };
    }
    let (body, hit_x) = resolve_axis(index, body, displacement.x, Axis::X);
    let (body, hit_y) = resolve_axis(index, body, displacement.y, Axis::Y);
    MoveResult {
        position: body.origin(),
        collided: hit_x || hit_y,
    }
}

fn resolve_axis(index: &SpatialIndex, body: Rect, delta: f32, axis: Axis) -> (Rect, bool) {
    if delta == 0.0 {
        return (body, false);
    }
    let mut moved = match axis {
        Axis::X => body.translated(Vec2::new(delta, 0.0)),
        Axis::Y => body.translated(Vec2::new(0.0, delta)),
    };

    let reach = (body.width.max(body.height) + delta.abs()) / index.tile_size();
    let radius = reach.ceil() as i32 + 1;
    let center = index.world_to_tile(moved.center());

    let mut collided = false;
    for solid in index.solid_rects_in_window(center, radius) {
        if !moved.intersects(&solid) {
            continue;
        }
        collided = true;
        match axis {
            Axis::X if delta > 0.0 => moved.x = solid.x - moved.width,
            Axis::X => moved.x = solid.right(),
            Axis::Y if delta > 0.0 => moved.y = solid.y - moved.height,
            Axis::Y => moved.y = solid.bottom(),
        }
    }
    (moved, collided)
}
