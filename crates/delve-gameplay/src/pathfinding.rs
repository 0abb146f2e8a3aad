//! A* pathfinding over the tile grid.
//!
//! Movement is 8-directional with integer costs (10 straight, 14 diagonal)
//! and an octile heuristic. A diagonal step is only allowed when both tiles it
//! brushes past are walkable, so paths never clip wall corners.
//!
//! The search state lives in a node arena owned by [`Pathfinder`] and sized to
//! the world. Every node a search touches is reset before `find_path`
//! returns, so the next search always starts from a clean table.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use delve_common::{TileCoord, Vec2};
use delve_world::SpatialIndex;
use thiserror::Error;
use tracing::debug;

/// Cost of an orthogonal step.
pub const STRAIGHT_COST: u32 = 10;
/// Cost of a diagonal step.
pub const DIAGONAL_COST: u32 = 14;

/// Neighbour offsets in expansion order: E, N, W, S, NE, SE, NW, SW.
const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (0, -1),
    (-1, 0),
    (0, 1),
    (1, -1),
    (1, 1),
    (-1, -1),
    (-1, 1),
];

/// Pathfinding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// The open set ran empty before reaching the goal
    #[error("No path to the goal")]
    NotFound,

    /// Start or goal lies outside the world
    #[error("Tile ({x}, {y}) is outside the world")]
    OutOfBounds {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unvisited,
    Open,
    Closed,
}

/// Per-tile search metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathNode {
    g_cost: u32,
    h_cost: u32,
    f_cost: u32,
    parent: Option<usize>,
    /// Sequence number from when the node was first opened
    seq: u64,
    state: NodeState,
}

impl PathNode {
    const UNVISITED: Self = Self {
        g_cost: u32::MAX,
        h_cost: 0,
        f_cost: 0,
        parent: None,
        seq: 0,
        state: NodeState::Unvisited,
    };
}

/// Reusable A* search.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<PathNode>,
    touched: Vec<usize>,
    open: BinaryHeap<Reverse<(u32, u64, usize)>>,
    last_expanded: usize,
}

impl Pathfinder {
    /// Creates a pathfinder with an empty arena; it grows on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes expanded by the most recent search.
    #[must_use]
    pub const fn last_expanded(&self) -> usize {
        self.last_expanded
    }

    /// Returns whether every node is in its unvisited state.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.touched.is_empty()
            && self.open.is_empty()
            && self.nodes.iter().all(|n| *n == PathNode::UNVISITED)
    }

    /// Finds a path between two world positions.
    ///
    /// Positions are converted to tiles by floor division by the tile size.
    /// The path starts with the start tile and ends with the goal tile.
    pub fn find_path(
        &mut self,
        index: &SpatialIndex,
        start: Vec2,
        goal: Vec2,
    ) -> Result<Vec<TileCoord>, PathError> {
        self.find_path_tiles(index, index.world_to_tile(start), index.world_to_tile(goal))
    }

    /// Finds a path between two tiles.
    pub fn find_path_tiles(
        &mut self,
        index: &SpatialIndex,
        start: TileCoord,
        goal: TileCoord,
    ) -> Result<Vec<TileCoord>, PathError> {
        let start_slot = index
            .index_of(start)
            .ok_or(PathError::OutOfBounds { x: start.x, y: start.y })?;
        let goal_slot = index
            .index_of(goal)
            .ok_or(PathError::OutOfBounds { x: goal.x, y: goal.y })?;

        if start == goal {
            self.last_expanded = 0;
            return Ok(vec![start]);
        }
        if !index.is_walkable(goal) {
            self.last_expanded = 0;
            return Err(PathError::NotFound);
        }

        if self.nodes.len() != index.len() {
            self.nodes = vec![PathNode::UNVISITED; index.len()];
        }

        let result = self.search(index, start_slot, goal_slot, goal);
        self.reset();
        if result.is_err() {
            debug!(
                "No path from ({}, {}) to ({}, {}) after expanding {} nodes",
                start.x, start.y, goal.x, goal.y, self.last_expanded
            );
        }
        result
    }

    fn search(
        &mut self,
        index: &SpatialIndex,
        start_slot: usize,
        goal_slot: usize,
        goal: TileCoord,
    ) -> Result<Vec<TileCoord>, PathError> {
        let mut seq = 0u64;
        self.last_expanded = 0;

        let start = index.coord_of(start_slot);
        let h = octile(start, goal);
        self.open_node(start_slot, 0, h, None, &mut seq);

        while let Some(Reverse((f, _, slot))) = self.open.pop() {
            let node = self.nodes[slot];
            // Stale heap entry: the node was closed or improved since.
            if node.state == NodeState::Closed || node.g_cost + node.h_cost != f {
                continue;
            }
            self.nodes[slot].state = NodeState::Closed;
            self.last_expanded += 1;

            if slot == goal_slot {
                return Ok(self.reconstruct(index, goal_slot));
            }

            let current = index.coord_of(slot);
            for (dx, dy) in NEIGHBOURS {
                let next = current.offset(dx, dy);
                let Some(next_slot) = index.index_of(next) else {
                    continue;
                };
                if !index.is_walkable(next) || self.nodes[next_slot].state == NodeState::Closed {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal
                    && !(index.is_walkable(current.offset(dx, 0))
                        && index.is_walkable(current.offset(0, dy)))
                {
                    continue;
                }

                let step = if diagonal { DIAGONAL_COST } else { STRAIGHT_COST };
                let g = node.g_cost.saturating_add(step);
                if g < self.nodes[next_slot].g_cost {
                    self.open_node(next_slot, g, octile(next, goal), Some(slot), &mut seq);
                }
            }
        }

        Err(PathError::NotFound)
    }

    /// Records a better route to a node and queues it. A node that is already
    /// open keeps its original sequence number.
    fn open_node(&mut self, slot: usize, g: u32, h: u32, parent: Option<usize>, seq: &mut u64) {
        let node = &mut self.nodes[slot];
        if node.state == NodeState::Unvisited {
            node.seq = *seq;
            *seq += 1;
            self.touched.push(slot);
        }
        node.g_cost = g;
        node.h_cost = h;
        node.f_cost = g + h;
        node.parent = parent;
        node.state = NodeState::Open;
        self.open.push(Reverse((node.f_cost, node.seq, slot)));
    }

    fn reconstruct(&self, index: &SpatialIndex, goal_slot: usize) -> Vec<TileCoord> {
        let mut path = Vec::new();
        let mut cursor = Some(goal_slot);
        while let Some(slot) = cursor {
            path.push(index.coord_of(slot));
            cursor = self.nodes[slot].parent;
        }
        path.reverse();
        path
    }

    fn reset(&mut self) {
        for slot in self.touched.drain(..) {
            self.nodes[slot] = PathNode::UNVISITED;
        }
        self.open.clear();
    }
}

/// Octile distance heuristic in path cost units.
#[must_use]
pub fn octile(a: TileCoord, b: TileCoord) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    DIAGONAL_COST * dx.min(dy) + STRAIGHT_COST * dx.abs_diff(dy)
}

/// Total step cost of a path.
#[must_use]
pub fn path_cost(path: &[TileCoord]) -> u32 {
    path.windows(2)
        .map(|pair| {
            if pair[0].x != pair[1].x && pair[0].y != pair[1].y {
                DIAGONAL_COST
            } else {
                STRAIGHT_COST
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(rows: &[&str]) -> SpatialIndex {
        SpatialIndex::from_ascii(rows, 16.0)
    }

    fn assert_valid_path(index: &SpatialIndex, path: &[TileCoord]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].chebyshev(pair[1]), 1, "step {pair:?} is not adjacent");
        }
        for coord in path.iter().skip(1) {
            assert!(index.is_walkable(*coord), "{coord:?} is not walkable");
        }
    }

    #[test]
    fn test_octile_heuristic() {
        assert_eq!(octile(TileCoord::new(0, 0), TileCoord::new(3, 1)), 14 + 20);
        assert_eq!(octile(TileCoord::new(2, 2), TileCoord::new(2, 2)), 0);
        assert_eq!(octile(TileCoord::new(5, 0), TileCoord::new(0, 5)), 70);
    }

    #[test]
    fn test_same_tile_single_step() {
        let index = grid(&["...", "..."]);
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path(&index, Vec2::new(20.0, 20.0), Vec2::new(30.0, 17.0))
            .expect("path");
        assert_eq!(path, vec![TileCoord::new(1, 1)]);
    }

    #[test]
    fn test_optimal_cost_around_walls() {
        let index = grid(&[
            "#########",
            "#.......#",
            "#.#####.#",
            "#.#...#.#",
            "#...#...#",
            "#########",
        ]);
        let mut pathfinder = Pathfinder::new();
        let start = TileCoord::new(1, 1);
        let goal = TileCoord::new(5, 3);
        let path = pathfinder.find_path_tiles(&index, start, goal).expect("path");

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_valid_path(&index, &path);
        // Down the west side and back up is 8 straight steps; the east side costs 120.
        assert_eq!(path_cost(&path), 80);
    }

    #[test]
    fn test_no_corner_cutting() {
        let sealed = grid(&[".##", "#.#", "##."]);
        let mut pathfinder = Pathfinder::new();
        let result = pathfinder.find_path_tiles(&sealed, TileCoord::new(0, 0), TileCoord::new(2, 2));
        assert_eq!(result, Err(PathError::NotFound));

        // One open side still forbids the diagonal.
        let half_open = grid(&["..", "#."]);
        let path = pathfinder
            .find_path_tiles(&half_open, TileCoord::new(0, 0), TileCoord::new(1, 1))
            .expect("path");
        assert_eq!(
            path,
            vec![TileCoord::new(0, 0), TileCoord::new(1, 0), TileCoord::new(1, 1)]
        );
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let index = grid(&["...", "..."]);
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path_tiles(&index, TileCoord::new(0, 0), TileCoord::new(2, 1))
            .expect("path");
        // East is opened before south-east, so the straight step comes first.
        assert_eq!(
            path,
            vec![TileCoord::new(0, 0), TileCoord::new(1, 0), TileCoord::new(2, 1)]
        );
        assert_eq!(path_cost(&path), 24);
    }

    #[test]
    fn test_nodes_reset_after_every_search() {
        let index = grid(&[
            "#######",
            "#.....#",
            "#.###.#",
            "#.#.#.#",
            "#######",
        ]);
        let mut pathfinder = Pathfinder::new();
        let start = TileCoord::new(1, 3);
        let goal = TileCoord::new(5, 3);

        let first = pathfinder.find_path_tiles(&index, start, goal);
        assert!(pathfinder.is_clean());
        let second = pathfinder.find_path_tiles(&index, start, goal);
        assert!(pathfinder.is_clean());
        assert_eq!(first, second);
        assert!(first.is_ok());

        // The pocket at (3, 3) is walled in.
        let failed = pathfinder.find_path_tiles(&index, start, TileCoord::new(3, 3));
        assert_eq!(failed, Err(PathError::NotFound));
        assert!(pathfinder.is_clean());
        assert!(pathfinder.last_expanded() > 0);

        assert_eq!(pathfinder.find_path_tiles(&index, start, goal), first);
    }

    #[test]
    fn test_error_cases() {
        let index = grid(&["#..", "..."]);
        let mut pathfinder = Pathfinder::new();
        assert_eq!(
            pathfinder.find_path_tiles(&index, TileCoord::new(1, 0), TileCoord::new(3, 0)),
            Err(PathError::OutOfBounds { x: 3, y: 0 })
        );
        assert_eq!(
            pathfinder.find_path(&index, Vec2::new(-1.0, 5.0), Vec2::new(20.0, 5.0)),
            Err(PathError::OutOfBounds { x: -1, y: 0 })
        );
        assert_eq!(
            pathfinder.find_path_tiles(&index, TileCoord::new(1, 1), TileCoord::new(0, 0)),
            Err(PathError::NotFound)
        );
        assert!(pathfinder.is_clean());
    }

    #[test]
    fn test_path_cost() {
        assert_eq!(path_cost(&[]), 0);
        assert_eq!(path_cost(&[TileCoord::new(0, 0)]), 0);
        let path = [TileCoord::new(0, 0), TileCoord::new(1, 1), TileCoord::new(2, 1)];
        assert_eq!(path_cost(&path), 24);
    }

    fn random_grid(cells: &[bool]) -> SpatialIndex {
        let rows: Vec<String> = cells
            .chunks(8)
            .map(|row| row.iter().map(|&open| if open { '.' } else { '#' }).collect())
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        grid(&rows)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_paths_are_valid_and_arena_is_reset(
            cells in prop::collection::vec(prop::bool::weighted(0.7), 64),
            sx in 0..8i32, sy in 0..8i32, gx in 0..8i32, gy in 0..8i32,
        ) {
            let index = random_grid(&cells);
            let start = TileCoord::new(sx, sy);
            let goal = TileCoord::new(gx, gy);
            let mut pathfinder = Pathfinder::new();

            let first = pathfinder.find_path_tiles(&index, start, goal);
            prop_assert!(pathfinder.is_clean());
            if let Ok(path) = &first {
                prop_assert_eq!(path.first(), Some(&start));
                prop_assert_eq!(path.last(), Some(&goal));
                assert_valid_path(&index, path);
                prop_assert!(path_cost(path) >= octile(start, goal));
                for pair in path.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if a.x != b.x && a.y != b.y {
                        prop_assert!(index.is_walkable(TileCoord::new(b.x, a.y)));
                        prop_assert!(index.is_walkable(TileCoord::new(a.x, b.y)));
                    }
                }
            }
            prop_assert_eq!(pathfinder.find_path_tiles(&index, start, goal), first);
        }
    }
}
