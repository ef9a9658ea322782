//! Navigation mesh built from a flat triangle soup
//!
//! The mesh owns the cell arena and the quad-tree that indexes it. Once built
//! it is never mutated again, so it is shared between threads behind an
//! [`Arc`] without any locking.

use std::sync::Arc;

use glam::Vec3;
use trinav_common::{vec3_at, Error, Result};

use crate::a_star_search::AStarSearch;
use crate::cell_quad_tree::{Aabb, CellQuadTree};
use crate::master_path::{MasterPath, Path};
use crate::search::{CellSearch, DistanceHeuristic, SearchState};
use crate::tri_cell::{CellRef, TriCell};

/// Mesh build parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MeshBuildConfig {
    /// Maximum depth of the spatial index
    pub spatial_depth: usize,
    /// Vertical tolerance used when deciding if a point lies on a cell
    pub plane_tolerance: f32,
    /// Fraction of a portal a corridor target is pulled inward by
    pub offset_scale: f32,
}

impl Default for MeshBuildConfig {
    fn default() -> Self {
        Self {
            spatial_depth: 8,
            plane_tolerance: 0.5,
            offset_scale: 0.1,
        }
    }
}

impl MeshBuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spatial_depth(mut self, depth: usize) -> Self {
        self.spatial_depth = depth;
        self
    }

    pub fn with_plane_tolerance(mut self, tolerance: f32) -> Self {
        self.plane_tolerance = tolerance;
        self
    }

    pub fn with_offset_scale(mut self, scale: f32) -> Self {
        self.offset_scale = scale;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.plane_tolerance > 0.0) {
            return Err(Error::Config(format!(
                "plane tolerance must be positive, got {}",
                self.plane_tolerance
            )));
        }
        if !(0.0..=0.5).contains(&self.offset_scale) {
            return Err(Error::Config(format!(
                "offset scale must be within [0, 0.5], got {}",
                self.offset_scale
            )));
        }
        Ok(())
    }
}

/// Immutable triangle navigation mesh
#[derive(Debug, Clone)]
pub struct TriNavMesh {
    verts: Vec<Vec3>,
    cells: Vec<TriCell>,
    quad_tree: CellQuadTree,
    bounds: Aabb,
    plane_tolerance: f32,
    offset_scale: f32,
    link_count: usize,
}

impl TriNavMesh {
    /// Builds a mesh from a flat vertex array (x, y, z triples) and a flat
    /// index array (clockwise triangles).
    pub fn build(verts: &[f32], indices: &[u32], config: &MeshBuildConfig) -> Result<Self> {
        config.validate()?;

        if verts.is_empty() || verts.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "vertex array length {} is not a positive multiple of 3",
                verts.len()
            )));
        }
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "index array length {} is not a positive multiple of 3",
                indices.len()
            )));
        }

        let vert_count = verts.len() / 3;
        let positions: Vec<Vec3> = (0..vert_count)
            .filter_map(|i| vec3_at(verts, i))
            .collect();

        let mut cells = Vec::with_capacity(indices.len() / 3);
        let mut bounds = Aabb::empty();
        for tri in indices.chunks_exact(3) {
            let tri = [tri[0], tri[1], tri[2]];
            let mut corners = [Vec3::ZERO; 3];
            for (corner, &index) in corners.iter_mut().zip(tri.iter()) {
                *corner = *positions.get(index as usize).ok_or_else(|| {
                    Error::InvalidMesh(format!(
                        "index {} out of range for {} vertices",
                        index, vert_count
                    ))
                })?;
            }
            let cell = TriCell::new(tri, corners)?;
            bounds.expand(cell.bounds());
            cells.push(cell);
        }

        let mut quad_tree = CellQuadTree::new(bounds, config.spatial_depth);
        for (i, cell) in cells.iter().enumerate() {
            quad_tree.add(CellRef::new(i as u32), cell.bounds())?;
        }

        let link_count = Self::link_neighbors(&mut cells, &quad_tree);

        log::info!(
            "Built navigation mesh: {} vertices, {} cells, {} links, spatial depth {}/{}",
            vert_count,
            cells.len(),
            link_count,
            quad_tree.depth_in_use(),
            config.spatial_depth
        );

        Ok(Self {
            verts: positions,
            cells,
            quad_tree,
            bounds,
            plane_tolerance: config.plane_tolerance,
            offset_scale: config.offset_scale,
            link_count,
        })
    }

    /// Cross-links every pair of cells that share a wall. Returns the number
    /// of links made.
    fn link_neighbors(cells: &mut [TriCell], quad_tree: &CellQuadTree) -> usize {
        let mut links = 0;
        for i in 0..cells.len() {
            let a = CellRef::new(i as u32);
            let candidates = quad_tree.cells_in_column(cells, cells[i].bounds());
            for b in candidates {
                if b <= a || cells[i].wall_to(b).is_some() {
                    continue;
                }
                if cells[i].shared_wall(&cells[b.index()]).is_none() {
                    continue;
                }
                if TriCell::link_cells(cells, a, b, true).is_some() {
                    links += 1;
                } else {
                    log::warn!("Could not link {} and {}: wall already linked", a, b);
                }
            }
        }
        links
    }

    #[inline]
    pub fn cell(&self, cell: CellRef) -> Option<&TriCell> {
        self.cells.get(cell.index())
    }

    pub fn cells(&self) -> &[TriCell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.verts
    }

    /// Number of cross-links between cells
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn quad_tree(&self) -> &CellQuadTree {
        &self.quad_tree
    }

    pub fn plane_tolerance(&self) -> f32 {
        self.plane_tolerance
    }

    pub fn offset_scale(&self) -> f32 {
        self.offset_scale
    }

    /// Finds the closest cell to a point and the point snapped onto it.
    ///
    /// With `must_be_in_column` only cells whose column contains the point are
    /// considered.
    pub fn closest_cell(&self, p: &Vec3, must_be_in_column: bool) -> Option<(CellRef, Vec3)> {
        self.quad_tree.closest_cell(&self.cells, p, must_be_in_column)
    }

    /// Checks if a point lies on the mesh within a vertical tolerance
    pub fn is_valid_position(&self, p: &Vec3, y_tolerance: f32) -> bool {
        self.closest_cell(p, true)
            .is_some_and(|(_, snapped)| (snapped.y - p.y).abs() <= y_tolerance)
    }

    /// Nearest point on the mesh
    pub fn nearest_valid_location(&self, p: &Vec3) -> Option<Vec3> {
        self.closest_cell(p, false).map(|(_, snapped)| snapped)
    }

    /// Finds a path synchronously and returns a corridor view bound to the
    /// goal.
    ///
    /// Both points must lie within the column of some cell.
    pub fn find_path(
        mesh: &Arc<TriNavMesh>,
        start: Vec3,
        goal: Vec3,
        heuristic: DistanceHeuristic,
    ) -> Result<Path> {
        let (start_cell, _) = mesh
            .closest_cell(&start, true)
            .ok_or_else(|| Error::Search(format!("start {} is not on the mesh", start)))?;
        let (goal_cell, goal) = mesh
            .closest_cell(&goal, true)
            .ok_or_else(|| Error::Search(format!("goal {} is not on the mesh", goal)))?;

        let mut search = AStarSearch::new(Arc::clone(mesh), heuristic);
        search.initialize(start, goal, start_cell, goal_cell);
        if search.process_to_completion() != SearchState::Complete {
            return Err(Error::Search(format!(
                "no path from {} to {}",
                start_cell, goal_cell
            )));
        }

        let master = MasterPath::new(0, Arc::clone(mesh), search.path_cells().to_vec())?;
        Ok(Path::new(Arc::new(master), goal))
    }
}
