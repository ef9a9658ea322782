//! Test mesh and navigator creation helpers
//!
//! Grids use the same layout as the core crate's tests: square `(x, z)` holds
//! cells `2 * (z * nx + x)` (lower left) and `2 * (z * nx + x) + 1`.

use std::sync::Arc;

use glam::Vec3;
use trinav::{MeshBuildConfig, TriNavMesh};
use trinav_common::Result;

use crate::config::NavigatorConfig;
use crate::master_navigator::MasterNavigator;

/// Flat `nx` by `nz` grid of unit squares at y = 0
pub fn create_grid_mesh(nx: usize, nz: usize) -> Result<Arc<TriNavMesh>> {
    let mut verts = Vec::with_capacity((nx + 1) * (nz + 1) * 3);
    for z in 0..=nz {
        for x in 0..=nx {
            verts.extend_from_slice(&[x as f32, 0.0, z as f32]);
        }
    }

    let v = |x: usize, z: usize| (z * (nx + 1) + x) as u32;
    let mut indices = Vec::with_capacity(nx * nz * 6);
    for z in 0..nz {
        for x in 0..nx {
            indices.extend_from_slice(&[v(x, z), v(x, z + 1), v(x + 1, z)]);
            indices.extend_from_slice(&[v(x, z + 1), v(x + 1, z + 1), v(x + 1, z)]);
        }
    }

    Ok(Arc::new(TriNavMesh::build(
        &verts,
        &indices,
        &MeshBuildConfig::default(),
    )?))
}

/// Two unit squares at x in [0, 1] and x in [3, 4] with no shared wall
pub fn create_two_island_mesh() -> Result<Arc<TriNavMesh>> {
    let verts = [
        0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0, //
        1.0, 0.0, 1.0, //
        3.0, 0.0, 0.0, //
        3.0, 0.0, 1.0, //
        4.0, 0.0, 0.0, //
        4.0, 0.0, 1.0, //
    ];
    let indices = [0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6];
    Ok(Arc::new(TriNavMesh::build(
        &verts,
        &indices,
        &MeshBuildConfig::default(),
    )?))
}

/// Navigator over an `n` by `n` grid
pub fn create_navigator(n: usize, config: NavigatorConfig) -> Result<MasterNavigator> {
    MasterNavigator::new(create_grid_mesh(n, n)?, config)
}

/// Centroid of the lower-left triangle of square `(x, z)`
pub fn lower_left(x: usize, z: usize) -> Vec3 {
    Vec3::new(x as f32 + 1.0 / 3.0, 0.0, z as f32 + 1.0 / 3.0)
}

/// Centroid of the upper-right triangle of square `(x, z)`
pub fn upper_right(x: usize, z: usize) -> Vec3 {
    Vec3::new(x as f32 + 2.0 / 3.0, 0.0, z as f32 + 2.0 / 3.0)
}
