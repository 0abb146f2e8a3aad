//! # Delve Common
//!
//! Common types and shared abstractions for Delve.
//!
//! This crate provides foundational types used across all Delve subsystems:
//! - Coordinate types (world positions, tiles, chunks)
//! - Axis-aligned rectangles
//! - ID types (AgentId, PropId)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod rect;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::rect::*;
    pub use glam::Vec2;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_raw_values() {
        assert_eq!(AgentId::from_raw(42).raw(), 42);
        assert_eq!(PropId::new(7).index(), 7);
    }

    #[test]
    fn test_world_error_converts() {
        let err: DelveError = WorldError::OutOfBounds { x: -1, y: 4 }.into();
        assert_eq!(err.to_string(), "World error: Tile (-1, 4) is outside the world");
    }
}
