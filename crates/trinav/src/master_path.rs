//! Path corridors and funnel navigation
//!
//! A [`MasterPath`] is the shared, immutable list of cells a search produced.
//! A [`Path`] binds a corridor to one goal point and answers "where should I
//! steer next" for a single consumer using the funnel (string pulling)
//! algorithm.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use parking_lot::Mutex;
use trinav_common::{tri_area_2d, Error, Result};
use web_time::Instant;

use crate::tri_cell::{CellRef, TriCell, WALL_TOLERANCE};
use crate::tri_nav_mesh::TriNavMesh;

/// Shared corridor of linked cells from a start cell to a goal cell
#[derive(Debug)]
pub struct MasterPath {
    id: u64,
    mesh: Arc<TriNavMesh>,
    cells: Vec<CellRef>,
    /// Exit wall of each cell, the last cell has none
    exit_walls: Vec<Option<u8>>,
    plane_tolerance: f32,
    offset_scale: f32,
    timestamp: Mutex<Instant>,
    disposed: AtomicBool,
}

impl MasterPath {
    /// Creates a corridor from a cell sequence.
    ///
    /// Every pair of consecutive cells must be linked.
    pub fn new(id: u64, mesh: Arc<TriNavMesh>, cells: Vec<CellRef>) -> Result<Self> {
        if cells.is_empty() {
            return Err(Error::InvalidCorridor(format!("path {} has no cells", id)));
        }

        let mut exit_walls = Vec::with_capacity(cells.len());
        for pair in cells.windows(2) {
            let cell = mesh.cell(pair[0]).ok_or_else(|| {
                Error::InvalidCorridor(format!("path {}: {} is not in the mesh", id, pair[0]))
            })?;
            let wall = cell.wall_to(pair[1]).ok_or_else(|| {
                Error::InvalidCorridor(format!(
                    "path {}: {} and {} do not share a wall",
                    id, pair[0], pair[1]
                ))
            })?;
            exit_walls.push(Some(wall as u8));
        }
        let last = cells[cells.len() - 1];
        if mesh.cell(last).is_none() {
            return Err(Error::InvalidCorridor(format!(
                "path {}: {} is not in the mesh",
                id, last
            )));
        }
        exit_walls.push(None);

        Ok(Self {
            id,
            plane_tolerance: mesh.plane_tolerance(),
            offset_scale: mesh.offset_scale(),
            mesh,
            cells,
            exit_walls,
            timestamp: Mutex::new(Instant::now()),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mesh(&self) -> &Arc<TriNavMesh> {
        &self.mesh
    }

    pub fn cells(&self) -> &[CellRef] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn first_cell(&self) -> CellRef {
        self.cells[0]
    }

    pub fn last_cell(&self) -> CellRef {
        self.cells[self.cells.len() - 1]
    }

    /// Exit wall of the cell at `index`
    pub fn exit_wall(&self, index: usize) -> Option<usize> {
        self.exit_walls.get(index).copied().flatten().map(usize::from)
    }

    pub fn contains_cell(&self, cell: CellRef) -> bool {
        self.cells.contains(&cell)
    }

    /// Position of a cell in the corridor
    pub fn cell_index(&self, cell: CellRef) -> Option<usize> {
        self.cells.iter().position(|&c| c == cell)
    }

    /// Left and right vertices of the exit wall of the cell at `index`
    pub fn portal(&self, index: usize) -> Option<(Vec3, Vec3)> {
        let wall = self.exit_wall(index)?;
        let cell = self.cell_at(index)?;
        Some((cell.wall_left_vertex(wall), cell.wall_right_vertex(wall)))
    }

    pub fn plane_tolerance(&self) -> f32 {
        self.plane_tolerance
    }

    pub fn offset_scale(&self) -> f32 {
        self.offset_scale
    }

    /// Time of creation or of the last renewal
    pub fn timestamp(&self) -> Instant {
        *self.timestamp.lock()
    }

    /// Time since creation or the last renewal
    pub fn age(&self) -> Duration {
        self.timestamp.lock().elapsed()
    }

    /// Resets the age of the corridor
    pub fn renew(&self) {
        *self.timestamp.lock() = Instant::now();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Marks the corridor as no longer usable. Irreversible.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    fn cell_at(&self, index: usize) -> Option<&TriCell> {
        self.cells.get(index).and_then(|&c| self.mesh.cell(c))
    }

    /// Checks if a point lies in the column of the cell at `index` and close
    /// enough to its plane
    fn cell_holds(&self, index: usize, p: &Vec3) -> bool {
        self.cell_at(index).is_some_and(|cell| {
            cell.is_in_column(p) && (cell.plane_y(p.x, p.z) - p.y).abs() <= self.plane_tolerance
        })
    }

    /// Finds the corridor index of the cell holding `p`, trying `hint` first.
    ///
    /// Without a hint match the furthest matching cell wins.
    fn locate(&self, p: &Vec3, hint: usize) -> Option<usize> {
        if self.cell_holds(hint, p) {
            return Some(hint);
        }
        (0..self.cells.len()).rev().find(|&i| self.cell_holds(i, p))
    }
}

/// Per-consumer view of a corridor bound to a goal point.
///
/// Caches the last resolved cell so that queries from a moving agent stay
/// cheap. Not meant to be shared between threads; clone it instead.
#[derive(Debug, Clone)]
pub struct Path {
    master: Arc<MasterPath>,
    goal: Vec3,
    last_index: usize,
}

impl Path {
    pub fn new(master: Arc<MasterPath>, goal: Vec3) -> Self {
        Self {
            master,
            goal,
            last_index: 0,
        }
    }

    pub fn master(&self) -> &Arc<MasterPath> {
        &self.master
    }

    pub fn id(&self) -> u64 {
        self.master.id()
    }

    pub fn goal(&self) -> Vec3 {
        self.goal
    }

    pub fn is_disposed(&self) -> bool {
        self.master.is_disposed()
    }

    /// Checks if a point lies within the corridor
    pub fn is_in_corridor(&self, p: &Vec3) -> bool {
        !self.master.is_disposed() && self.master.locate(p, self.last_index).is_some()
    }

    /// Computes the farthest point visible from `from` toward the goal.
    ///
    /// Returns the goal itself once it is in sight, otherwise the funnel
    /// corner that blocks the view, pulled inward along its portal. Returns
    /// `None` when `from` is outside the corridor or the corridor has been
    /// disposed.
    pub fn get_target(&mut self, from: &Vec3) -> Option<Vec3> {
        let master = &self.master;
        if master.is_disposed() {
            return None;
        }

        let start = master.locate(from, self.last_index)?;
        self.last_index = start;

        let last = master.len() - 1;
        let apex = *from;

        // Step past cells whose exit wall the apex sits on
        let mut index = start;
        while index < last {
            let Some((left, right)) = master.portal(index) else {
                break;
            };
            let on_wall = trinav_common::dist_point_segment_sqr_2d(&apex, &left, &right)
                <= WALL_TOLERANCE * WALL_TOLERANCE;
            if !on_wall {
                break;
            }
            index += 1;
        }
        if index == last {
            return Some(self.goal);
        }

        let (mut left, mut right) = master.portal(index)?;
        let mut left_index = index;
        let mut right_index = index;

        for i in index + 1..=last {
            let (new_left, new_right) = if i == last {
                (self.goal, self.goal)
            } else {
                master.portal(i)?
            };

            // Narrow from the right
            if tri_area_2d(&apex, &right, &new_right) <= 0.0 {
                if tri_area_2d(&apex, &left, &new_right) > 0.0 {
                    right = new_right;
                    right_index = i;
                } else {
                    return Some(self.corner(left, left_index, true));
                }
            }

            // Narrow from the left
            if tri_area_2d(&apex, &left, &new_left) >= 0.0 {
                if tri_area_2d(&apex, &right, &new_left) < 0.0 {
                    left = new_left;
                    left_index = i;
                } else {
                    return Some(self.corner(right, right_index, false));
                }
            }
        }

        Some(self.goal)
    }

    /// Pulls a funnel corner toward the opposite end of its portal
    fn corner(&self, vertex: Vec3, index: usize, is_left: bool) -> Vec3 {
        let Some((left, right)) = self.master.portal(index) else {
            return self.goal;
        };
        let other = if is_left { right } else { left };
        vertex + (other - vertex) * self.master.offset_scale()
    }

    /// Walks the corridor from `start`, collecting every steering target up
    /// to and including the goal.
    ///
    /// The first point is `start` itself. Returns an empty list if `start` is
    /// outside the corridor.
    pub fn straight_path(&mut self, start: Vec3, max_points: usize) -> Vec<Vec3> {
        let mut points = Vec::new();
        if !self.is_in_corridor(&start) {
            return points;
        }
        points.push(start);

        let mut current = start;
        while points.len() < max_points {
            let Some(target) = self.get_target(&current) else {
                break;
            };
            points.push(target);
            if target == self.goal {
                break;
            }
            current = target;
        }
        points
    }
}
