//! Common utilities and data structures shared by the trinav crates

mod geometry;
mod vector;

pub use geometry::*;
pub use vector::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid input mesh: {0}")]
    InvalidMesh(String),

    #[error("spatial index error: {0}")]
    SpatialIndex(String),

    #[error("invalid path corridor: {0}")]
    InvalidCorridor(String),

    #[error("search failed: {0}")]
    Search(String),

    #[error("navigator error: {0}")]
    Navigator(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for trinav operations
pub type Result<T> = std::result::Result<T, Error>;
