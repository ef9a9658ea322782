//! Uniform-cost search toward a set of goal cells
//!
//! Used to reconnect a position that drifted off a corridor back onto it. The
//! expansion is bounded by a maximum number of graph hops from the start cell,
//! so a repair never costs more than a small local search.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use trinav_common::distance;

use crate::node_pool::{NodeIndex, NodePool, NodeQueue};
use crate::search::{step_cost, CellPath, CellSearch, SearchState};
use crate::tri_cell::CellRef;
use crate::tri_nav_mesh::TriNavMesh;

const DEFAULT_HASH_SIZE: usize = 128;

/// Incremental bounded-depth search with multiple goals
#[derive(Debug, Clone)]
pub struct DijkstraSearch {
    mesh: Arc<TriNavMesh>,
    pool: NodePool,
    open: NodeQueue,
    state: SearchState,
    start: Vec3,
    start_cell: CellRef,
    /// Goal cell -> optional goal point
    goals: HashMap<CellRef, Option<Vec3>>,
    max_depth: u32,
    stop_at_first: bool,
    found: Vec<CellPath>,
}

impl DijkstraSearch {
    pub fn new(mesh: Arc<TriNavMesh>) -> Self {
        Self {
            mesh,
            pool: NodePool::new(DEFAULT_HASH_SIZE),
            open: NodeQueue::new(),
            state: SearchState::Uninitialized,
            start: Vec3::ZERO,
            start_cell: CellRef::new(0),
            goals: HashMap::new(),
            max_depth: 0,
            stop_at_first: false,
            found: Vec::new(),
        }
    }

    pub fn mesh(&self) -> &Arc<TriNavMesh> {
        &self.mesh
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn start_cell(&self) -> CellRef {
        self.start_cell
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Seeds the search.
    ///
    /// `goal_points`, when given, runs parallel to `goal_cells` and adds the
    /// final leg to each goal point to that goal's path cost. Goal cells that
    /// are not part of the mesh are ignored.
    pub fn initialize(
        &mut self,
        start: Vec3,
        goal_points: Option<&[Vec3]>,
        start_cell: CellRef,
        goal_cells: &[CellRef],
        max_depth: u32,
        stop_at_first: bool,
    ) -> SearchState {
        self.reset();
        self.start = start;
        self.start_cell = start_cell;
        self.max_depth = max_depth;
        self.stop_at_first = stop_at_first;

        for (i, &goal) in goal_cells.iter().enumerate() {
            if self.mesh.cell(goal).is_none() {
                continue;
            }
            let point = goal_points.and_then(|points| points.get(i).copied());
            self.goals.entry(goal).or_insert(point);
        }

        if self.mesh.cell(start_cell).is_none() || self.goals.is_empty() {
            log::debug!(
                "Repair search from {} rejected: {} usable goals",
                start_cell,
                self.goals.len()
            );
            self.state = SearchState::Failed;
            return self.state;
        }

        let (root, _) = self.pool.get_or_insert(start_cell);
        self.pool.get_mut(root).pos = start;
        self.open.push(&mut self.pool, root);

        self.state = SearchState::Initialized;
        self.state
    }

    /// Number of goal paths found so far
    pub fn path_count(&self) -> usize {
        self.found.len()
    }

    /// Cells of the `index`-th goal path, start first
    pub fn path_cells(&self, index: usize) -> Option<&[CellRef]> {
        self.found.get(index).map(|p| p.cells.as_slice())
    }

    /// Cost of the `index`-th goal path
    pub fn path_cost(&self, index: usize) -> Option<f32> {
        self.found.get(index).map(|p| p.cost)
    }

    /// All goal paths, in the order they were reached
    pub fn paths(&self) -> &[CellPath] {
        &self.found
    }

    fn finish(&mut self) -> SearchState {
        self.open.clear();
        self.state = if self.found.is_empty() {
            SearchState::Failed
        } else {
            SearchState::Complete
        };
        log::debug!(
            "Repair search from {} finished {:?} with {} paths",
            self.start_cell,
            self.state,
            self.found.len()
        );
        self.state
    }

    fn record_goal(&mut self, idx: NodeIndex) {
        let node = self.pool.get(idx);
        let leg = match self.goals.get(&node.cell) {
            Some(Some(point)) => distance(&node.pos, point),
            _ => 0.0,
        };
        let cost = node.g + leg;
        let mut cells = Vec::with_capacity(node.depth as usize + 1);
        self.pool.path_to(idx, &mut cells);
        self.found.push(CellPath { cells, cost });
    }

    fn expand(&mut self, current: NodeIndex) {
        let mesh = Arc::clone(&self.mesh);
        let (current_cell, current_pos, current_entry, current_g, current_depth) = {
            let node = self.pool.get(current);
            (node.cell, node.pos, node.entry_wall, node.g, node.depth)
        };
        if current_depth >= self.max_depth {
            return;
        }
        let Some(cell) = mesh.cell(current_cell) else {
            return;
        };

        for wall in 0..3 {
            let Some((neighbor, neighbor_wall)) = cell.link(wall) else {
                continue;
            };
            let g = current_g + step_cost(&current_pos, current_entry, cell, wall);

            let (idx, fresh) = self.pool.get_or_insert(neighbor);
            let node = self.pool.get(idx);
            if node.is_closed() || (!fresh && g >= node.g) {
                continue;
            }

            let node = self.pool.get_mut(idx);
            node.parent = current;
            node.entry_wall = Some(neighbor_wall as u8);
            node.pos = cell.wall_midpoint(wall);
            node.g_local = g - current_g;
            node.g = g;
            node.h = 0.0;
            node.depth = current_depth + 1;

            if fresh {
                self.open.push(&mut self.pool, idx);
            } else {
                self.open.modify(&mut self.pool, idx);
            }
        }
    }
}

impl CellSearch for DijkstraSearch {
    fn state(&self) -> SearchState {
        self.state
    }

    fn process(&mut self) -> SearchState {
        if !matches!(
            self.state,
            SearchState::Initialized | SearchState::Processing
        ) {
            return self.state;
        }
        self.state = SearchState::Processing;

        let Some(current) = self.open.pop(&mut self.pool) else {
            return self.finish();
        };

        if self.goals.contains_key(&self.pool.get(current).cell) {
            self.record_goal(current);
            if self.stop_at_first || self.found.len() == self.goals.len() {
                return self.finish();
            }
        }

        self.expand(current);
        self.state
    }

    fn reset(&mut self) {
        self.pool.clear();
        self.open.clear();
        self.goals.clear();
        self.found.clear();
        self.state = SearchState::Uninitialized;
    }
}
