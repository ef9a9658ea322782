//! Triangle cell navigation meshes
//!
//! This crate turns a flat triangle soup into a graph of linked cells and
//! finds paths across it.
//!
//! # Features
//!
//! - **Cell Graph**: Arena of clockwise triangles cross-linked through shared walls
//! - **Spatial Index**: Quad-tree over cell footprints for point and column queries
//! - **A\* Search**: Incremental optimal search between two cells
//! - **Repair Search**: Depth-bounded uniform-cost search toward many goal cells
//! - **Corridors**: Shared cell corridors with funnel based steering
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glam::Vec3;
//! use trinav::{DistanceHeuristic, MeshBuildConfig, TriNavMesh};
//!
//! # fn example(verts: &[f32], indices: &[u32]) -> trinav_common::Result<()> {
//! let mesh = Arc::new(TriNavMesh::build(verts, indices, &MeshBuildConfig::default())?);
//!
//! let start = Vec3::new(0.2, 0.0, 0.2);
//! let goal = Vec3::new(7.5, 0.0, 7.5);
//! let mut path = TriNavMesh::find_path(&mesh, start, goal, DistanceHeuristic::Manhattan)?;
//!
//! // Steer toward the next visible point until the goal is reached
//! let waypoints = path.straight_path(start, 64);
//! # Ok(())
//! # }
//! ```

// Test code builds meshes it only partially inspects
#![cfg_attr(test, allow(unused))]

pub mod a_star_search;
pub mod cell_quad_tree;
pub mod dijkstra_search;
pub mod master_path;
pub mod node_pool;
pub mod search;
pub mod tri_cell;
pub mod tri_nav_mesh;

pub use a_star_search::AStarSearch;
pub use cell_quad_tree::{Aabb, CellQuadTree};
pub use dijkstra_search::DijkstraSearch;
pub use master_path::{MasterPath, Path};
pub use node_pool::{NodePool, NodeQueue, SearchNode};
pub use search::{CellPath, CellSearch, DistanceHeuristic, SearchState};
pub use tri_cell::{CellRef, PathRelationship, TriCell};
pub use tri_nav_mesh::{MeshBuildConfig, TriNavMesh};

#[cfg(test)]
mod funnel_tests;
#[cfg(test)]
mod search_tests;
#[cfg(test)]
pub(crate) mod test_mesh_helpers;
