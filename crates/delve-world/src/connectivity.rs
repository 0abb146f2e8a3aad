//! Dirt region labelling and connectivity repair.
//!
//! Regions are 4-connected, matching how agents and the player can actually
//! move between tiles without cutting corners.

use std::collections::VecDeque;

use delve_common::TileCoord;
use tracing::debug;

use crate::rooms::{carve_corridor, Bend};
use crate::spatial::SpatialIndex;

/// Region labels for every tile of an index.
#[derive(Debug, Clone)]
pub struct RegionMap {
    labels: Vec<Option<u32>>,
    sizes: Vec<usize>,
}

impl RegionMap {
    /// Labels the 4-connected Dirt regions of an index by flood fill.
    #[must_use]
    pub fn build(index: &SpatialIndex) -> Self {
        let mut labels = vec![None; index.len()];
        let mut sizes = Vec::new();
        let mut queue = VecDeque::new();

        for start in index.coords() {
            let Some(slot) = index.index_of(start) else {
                continue;
            };
            if labels[slot].is_some() || !index.is_dirt(start) {
                continue;
            }

            let label = sizes.len() as u32;
            let mut size = 0;
            labels[slot] = Some(label);
            queue.push_back(start);

            while let Some(coord) = queue.pop_front() {
                size += 1;
                for next in coord.cardinal_neighbors() {
                    if !index.is_dirt(next) {
                        continue;
                    }
                    if let Some(i) = index.index_of(next) {
                        if labels[i].is_none() {
                            labels[i] = Some(label);
                            queue.push_back(next);
                        }
                    }
                }
            }
            sizes.push(size);
        }

        Self { labels, sizes }
    }

    /// Number of regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.sizes.len()
    }

    /// Tile count of each region, indexed by label.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Label of the largest region; ties go to the lowest label.
    #[must_use]
    pub fn largest(&self) -> Option<u32> {
        self.sizes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(label, _)| label as u32)
    }

    /// Label of the tile at a row-major slot.
    #[must_use]
    pub fn label_at(&self, slot: usize) -> Option<u32> {
        self.labels.get(slot).copied().flatten()
    }
}

/// Returns whether all Dirt tiles form a single 4-connected region.
///
/// A world without Dirt counts as connected.
#[must_use]
pub fn is_fully_connected(index: &SpatialIndex) -> bool {
    RegionMap::build(index).region_count() <= 1
}

/// Joins every Dirt region to the largest one with a one-wide corridor.
///
/// Each smaller region is linked from its tile closest to the largest region,
/// measured in 4-connected steps. Returns the number of regions joined.
pub fn repair_connectivity(index: &mut SpatialIndex) -> usize {
    let regions = RegionMap::build(index);
    if regions.region_count() <= 1 {
        return 0;
    }
    let Some(main) = regions.largest() else {
        return 0;
    };

    // Multi-source BFS from the main region over every tile, recording the
    // nearest main-region tile for each slot.
    let mut distance = vec![u32::MAX; index.len()];
    let mut nearest = vec![TileCoord::new(0, 0); index.len()];
    let mut queue = VecDeque::new();
    for coord in index.coords() {
        if let Some(slot) = index.index_of(coord) {
            if regions.label_at(slot) == Some(main) {
                distance[slot] = 0;
                nearest[slot] = coord;
                queue.push_back(coord);
            }
        }
    }
    while let Some(coord) = queue.pop_front() {
        let Some(slot) = index.index_of(coord) else {
            continue;
        };
        for next in coord.cardinal_neighbors() {
            if let Some(i) = index.index_of(next) {
                if distance[i] == u32::MAX {
                    distance[i] = distance[slot] + 1;
                    nearest[i] = nearest[slot];
                    queue.push_back(next);
                }
            }
        }
    }

    // Closest tile of every other region, first in scan order on ties.
    let mut anchors: Vec<Option<(u32, TileCoord)>> = vec![None; regions.region_count()];
    for coord in index.coords() {
        let Some(slot) = index.index_of(coord) else {
            continue;
        };
        let Some(label) = regions.label_at(slot) else {
            continue;
        };
        if label == main {
            continue;
        }
        let entry = &mut anchors[label as usize];
        if entry.map_or(true, |(best, _)| distance[slot] < best) {
            *entry = Some((distance[slot], coord));
        }
    }

    let mut joined = 0;
    for &(dist, from) in anchors.iter().flatten() {
        let Some(slot) = index.index_of(from) else {
            continue;
        };
        let to = nearest[slot];
        carve_corridor(index, from, to, Bend::HorizontalFirst, 0);
        debug!("Joined region at ({}, {}) across {} tiles", from.x, from.y, dist);
        joined += 1;
    }
    joined
}
