//! Error types for Delve.

use thiserror::Error;

/// Top-level error type for Delve operations.
#[derive(Debug, Error)]
pub enum DelveError {
    /// World generation or lookup errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// World and tile errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Requested world has no area
    #[error("Invalid world layout: {chunks_x}x{chunks_y} chunks of {chunk_size} tiles")]
    InvalidLayout {
        /// Chunk grid width
        chunks_x: u32,
        /// Chunk grid height
        chunks_y: u32,
        /// Chunk edge length in tiles
        chunk_size: u32,
    },

    /// Tile coordinate outside the generated bounds
    #[error("Tile ({x}, {y}) is outside the world")]
    OutOfBounds {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
}

/// Result type alias for Delve operations.
pub type DelveResult<T> = Result<T, DelveError>;
