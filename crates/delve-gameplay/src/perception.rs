//! Line of sight and vision cones.

use std::f32::consts::{PI, TAU};

use delve_common::{Rect, Vec2};
use delve_world::SpatialIndex;
use serde::{Deserialize, Serialize};

/// Perception tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Distance between ray samples in world units
    pub ray_step: f32,
    /// Half edge of the square a ray has to reach around the target
    pub target_half_extent: f32,
    /// Largest occluder window in tiles; farther targets are never seen
    pub max_window_radius: i32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            ray_step: 2.0,
            target_half_extent: 4.0,
            max_window_radius: 16,
        }
    }
}

impl PerceptionConfig {
    /// Clamps values to usable ranges.
    pub fn validate(&mut self) {
        if !(self.ray_step.is_finite() && self.ray_step > 0.0) {
            self.ray_step = 2.0;
        }
        if !(self.target_half_extent.is_finite() && self.target_half_extent >= 0.0) {
            self.target_half_extent = 4.0;
        }
        self.max_window_radius = self.max_window_radius.clamp(1, 64);
    }
}

/// Visibility queries against the tile grid.
#[derive(Debug, Clone, Default)]
pub struct Perception {
    config: PerceptionConfig,
}

impl Perception {
    /// Creates a perception model; the config is validated first.
    #[must_use]
    pub fn new(mut config: PerceptionConfig) -> Self {
        config.validate();
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Returns whether an unobstructed ray runs from `from` to the target
    /// square around `to`.
    ///
    /// The ray advances in fixed steps and stops at the first sample inside
    /// the target square (visible) or inside a solid tile (blocked).
    #[must_use]
    pub fn has_line_of_sight(&self, index: &SpatialIndex, from: Vec2, to: Vec2) -> bool {
        let target = Rect::around(to, self.config.target_half_extent);
        let delta = to - from;
        let distance = delta.length();
        if !distance.is_finite() {
            return false;
        }
        if distance <= f32::EPSILON || target.contains_point(from) {
            return true;
        }

        let radius = (distance / index.tile_size()).ceil() as i32 + 1;
        if radius > self.config.max_window_radius {
            return false;
        }
        let occluders: Vec<Rect> = index
            .solid_rects_in_window(index.world_to_tile(from), radius)
            .collect();

        let direction = delta / distance;
        let steps = (distance / self.config.ray_step).ceil() as u32;
        for i in 1..=steps {
            let travelled = (i as f32 * self.config.ray_step).min(distance);
            let point = from + direction * travelled;
            if target.contains_point(point) {
                return true;
            }
            if occluders.iter().any(|r| r.contains_point(point)) {
                return false;
            }
        }
        true
    }

    /// Returns whether `target` is inside the vision cone of an agent at
    /// `origin` looking along `facing` (radians), and in line of sight.
    ///
    /// Targets at exactly `radius` or exactly `fov / 2` off-axis are outside.
    /// The range and angle rejections run before the ray cast.
    #[must_use]
    pub fn in_vision_cone(
        &self,
        index: &SpatialIndex,
        origin: Vec2,
        facing: f32,
        target: Vec2,
        radius: f32,
        fov: f32,
    ) -> bool {
        let delta = target - origin;
        if delta.length() >= radius {
            return false;
        }
        if angle_off_axis(facing, delta) >= fov / 2.0 {
            return false;
        }
        self.has_line_of_sight(index, origin, target)
    }
}

/// Absolute angle between a facing and a direction, in `[0, PI]`.
#[must_use]
pub fn angle_off_axis(facing: f32, direction: Vec2) -> f32 {
    if direction == Vec2::ZERO {
        return 0.0;
    }
    // Facing in [0, TAU) puts the difference in (-3 PI, PI], so one wrap is enough.
    let mut diff = direction.y.atan2(direction.x) - facing.rem_euclid(TAU);
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    diff.abs()
}
