//! # Delve Gameplay
//!
//! Runtime systems that act on a generated level.
//!
//! This crate provides:
//! - A* pathfinding over the tile grid
//! - Line of sight and vision cones
//! - Hostile agent AI (idle wandering and active hunting)
//! - Axis-separated body collision

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod pathfinding;
pub mod perception;
pub mod physics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::pathfinding::*;
    pub use crate::perception::*;
    pub use crate::physics::*;
}

pub use prelude::*;
