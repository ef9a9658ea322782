//! Quad-tree spatial index over cell footprints
//!
//! This module implements a quad-tree on the XZ plane to accelerate point and
//! column queries against the cells of a navigation mesh. A cell is stored at
//! the deepest node whose bounds still fully contain the cell's bounds.

use glam::Vec3;
use trinav_common::{Error, Result};

use crate::tri_cell::{CellRef, TriCell};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum bounds
    pub min: Vec3,
    /// Maximum bounds
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new Aabb from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an empty Aabb (invalid bounds)
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Checks if this Aabb is valid
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Expands this Aabb to include another Aabb
    pub fn expand(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Expands this Aabb to include a point
    pub fn expand_point(&mut self, point: &Vec3) {
        self.min = self.min.min(*point);
        self.max = self.max.max(*point);
    }

    /// Checks if the XZ footprints overlap, touching edges included
    pub fn overlaps_2d(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Checks if the XZ footprint of `other` lies fully inside this one,
    /// boundaries included
    pub fn contains_2d(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.z >= self.min.z
            && other.max.z <= self.max.z
    }

    /// Checks if a point lies within the XZ footprint, boundaries included
    pub fn contains_point_2d(&self, p: &Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Gets the center of the Aabb
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Splits the XZ footprint into four quadrants keeping the Y extent
    fn quadrant(&self, index: usize) -> Aabb {
        let c = self.center();
        let (min_x, max_x) = if index & 1 == 0 {
            (self.min.x, c.x)
        } else {
            (c.x, self.max.x)
        };
        let (min_z, max_z) = if index & 2 == 0 {
            (self.min.z, c.z)
        } else {
            (c.z, self.max.z)
        };
        Aabb::new(
            Vec3::new(min_x, self.min.y, min_z),
            Vec3::new(max_x, self.max.y, max_z),
        )
    }
}

/// Node in the quad-tree
#[derive(Debug, Clone)]
struct QuadNode {
    bounds: Aabb,
    depth: usize,
    children: [Option<Box<QuadNode>>; 4],
    /// Cells contained by this node but by none of its children
    cells: Vec<CellRef>,
}

impl QuadNode {
    fn new(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            children: [None, None, None, None],
            cells: Vec::new(),
        }
    }

    fn add(&mut self, cell: CellRef, cell_bounds: &Aabb, max_depth: usize) -> Result<usize> {
        if self.depth < max_depth {
            for quadrant in 0..4 {
                let child_bounds = self.bounds.quadrant(quadrant);
                if !child_bounds.contains_2d(cell_bounds) {
                    continue;
                }
                let depth = self.depth + 1;
                let child = self.children[quadrant]
                    .get_or_insert_with(|| Box::new(QuadNode::new(child_bounds, depth)));
                return child.add(cell, cell_bounds, max_depth);
            }
        }

        if self.cells.contains(&cell) {
            return Err(Error::SpatialIndex(format!("{} already indexed", cell)));
        }
        self.cells.push(cell);
        Ok(self.depth)
    }

    fn collect_for_point(&self, cells: &[TriCell], p: &Vec3, results: &mut Vec<CellRef>) {
        if !self.bounds.contains_point_2d(p) {
            return;
        }

        for &cell in &self.cells {
            if cells
                .get(cell.index())
                .is_some_and(|c| c.is_in_column(p))
            {
                results.push(cell);
            }
        }

        for child in self.children.iter().flatten() {
            child.collect_for_point(cells, p, results);
        }
    }

    fn collect_in_column(&self, cells: &[TriCell], query: &Aabb, results: &mut Vec<CellRef>) {
        if !self.bounds.overlaps_2d(query) {
            return;
        }

        for &cell in &self.cells {
            if cells
                .get(cell.index())
                .is_some_and(|c| c.bounds().overlaps_2d(query))
            {
                results.push(cell);
            }
        }

        for child in self.children.iter().flatten() {
            child.collect_in_column(cells, query, results);
        }
    }

    fn collect_all(&self, results: &mut Vec<CellRef>) {
        results.extend_from_slice(&self.cells);
        for child in self.children.iter().flatten() {
            child.collect_all(results);
        }
    }

    fn max_depth_in_use(&self) -> usize {
        self.children
            .iter()
            .flatten()
            .map(|c| c.max_depth_in_use())
            .max()
            .unwrap_or(self.depth)
    }
}

/// Quad-tree of cells keyed on their XZ footprint
#[derive(Debug, Clone)]
pub struct CellQuadTree {
    root: QuadNode,
    max_depth: usize,
    cell_count: usize,
}

impl CellQuadTree {
    /// Creates an empty tree covering `bounds`
    pub fn new(bounds: Aabb, max_depth: usize) -> Self {
        Self {
            root: QuadNode::new(bounds, 0),
            max_depth,
            cell_count: 0,
        }
    }

    pub fn bounds(&self) -> &Aabb {
        &self.root.bounds
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of indexed cells
    pub fn len(&self) -> usize {
        self.cell_count
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count == 0
    }

    /// Deepest node currently holding or parenting cells
    pub fn depth_in_use(&self) -> usize {
        self.root.max_depth_in_use()
    }

    /// Adds a cell.
    ///
    /// Fails if the cell's footprint is not fully contained by the tree's
    /// bounds or the cell is already indexed. Returns the depth the cell was
    /// stored at.
    pub fn add(&mut self, cell: CellRef, cell_bounds: &Aabb) -> Result<usize> {
        if !self.root.bounds.contains_2d(cell_bounds) {
            return Err(Error::SpatialIndex(format!(
                "{} bounds {:?} outside of tree bounds {:?}",
                cell, cell_bounds, self.root.bounds
            )));
        }

        let depth = self.root.add(cell, cell_bounds, self.max_depth)?;
        self.cell_count += 1;
        Ok(depth)
    }

    /// Cells whose column contains the point, edges included
    pub fn cells_for_point(&self, cells: &[TriCell], p: &Vec3) -> Vec<CellRef> {
        let mut results = Vec::new();
        self.root.collect_for_point(cells, p, &mut results);
        results
    }

    /// Cells whose footprint bounds intersect the query footprint, edges included
    pub fn cells_in_column(&self, cells: &[TriCell], query: &Aabb) -> Vec<CellRef> {
        let mut results = Vec::new();
        self.root.collect_in_column(cells, query, &mut results);
        results
    }

    /// All indexed cells
    pub fn all_cells(&self) -> Vec<CellRef> {
        let mut results = Vec::with_capacity(self.cell_count);
        self.root.collect_all(&mut results);
        results
    }

    /// Finds the closest cell to a point.
    ///
    /// Strict mode only considers cells whose column contains the point and
    /// picks the one with the nearest plane. Exhaustive mode falls back to a
    /// full scan when no column matches.
    pub fn closest_cell(
        &self,
        cells: &[TriCell],
        p: &Vec3,
        must_be_in_column: bool,
    ) -> Option<(CellRef, Vec3)> {
        let candidates = self.cells_for_point(cells, p);
        if let Some(found) = TriCell::closest_cell(cells, candidates, p, true) {
            return Some(found);
        }
        if must_be_in_column {
            return None;
        }
        TriCell::closest_cell(cells, self.all_cells(), p, false)
    }
}
