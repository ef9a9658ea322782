//! Test mesh creation helpers
//!
//! Grid meshes are built from unit squares on the XZ plane. Square `(x, z)`
//! is split along its `(x, z + 1) - (x + 1, z)` diagonal into two clockwise
//! triangles, so with no holes the cells of square `(x, z)` are
//! `2 * (z * nx + x)` and `2 * (z * nx + x) + 1`.

use trinav_common::Result;

use crate::tri_nav_mesh::{MeshBuildConfig, TriNavMesh};

/// Raw vertex and index arrays for a grid, skipping the squares in `holes`
pub fn grid_mesh_data(
    nx: usize,
    nz: usize,
    holes: &[(usize, usize)],
    height: impl Fn(f32, f32) -> f32,
) -> (Vec<f32>, Vec<u32>) {
    let mut verts = Vec::with_capacity((nx + 1) * (nz + 1) * 3);
    for z in 0..=nz {
        for x in 0..=nx {
            let (fx, fz) = (x as f32, z as f32);
            verts.extend_from_slice(&[fx, height(fx, fz), fz]);
        }
    }

    let v = |x: usize, z: usize| (z * (nx + 1) + x) as u32;
    let mut indices = Vec::with_capacity(nx * nz * 6);
    for z in 0..nz {
        for x in 0..nx {
            if holes.contains(&(x, z)) {
                continue;
            }
            indices.extend_from_slice(&[v(x, z), v(x, z + 1), v(x + 1, z)]);
            indices.extend_from_slice(&[v(x, z + 1), v(x + 1, z + 1), v(x + 1, z)]);
        }
    }
    (verts, indices)
}

/// Flat `nx` by `nz` grid at y = 0
pub fn create_grid_mesh(nx: usize, nz: usize) -> Result<TriNavMesh> {
    let (verts, indices) = grid_mesh_data(nx, nz, &[], |_, _| 0.0);
    TriNavMesh::build(&verts, &indices, &MeshBuildConfig::default())
}

/// Flat grid with the listed squares removed
pub fn create_grid_mesh_with_holes(
    nx: usize,
    nz: usize,
    holes: &[(usize, usize)],
) -> Result<TriNavMesh> {
    let (verts, indices) = grid_mesh_data(nx, nz, holes, |_, _| 0.0);
    TriNavMesh::build(&verts, &indices, &MeshBuildConfig::default())
}

/// Grid rising by `slope` per unit along X
pub fn create_sloped_grid_mesh(nx: usize, nz: usize, slope: f32) -> Result<TriNavMesh> {
    let (verts, indices) = grid_mesh_data(nx, nz, &[], |x, _| x * slope);
    TriNavMesh::build(&verts, &indices, &MeshBuildConfig::default())
}

/// Two unit squares, at x in [0, 1] and x in [3, 4], that share no wall.
///
/// Cells 0 and 1 form the first island, cells 2 and 3 the second.
pub fn create_two_island_mesh() -> Result<TriNavMesh> {
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
    TriNavMesh::build(&verts, &indices, &MeshBuildConfig::default())
}
