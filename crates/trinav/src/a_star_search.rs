//! Optimal single-goal search over the cell graph
//!
//! The search is driven by a priority queue ordered by `f = g + h` and can be
//! advanced one node expansion at a time, which lets an orchestrator spread
//! long searches over several processing cycles.

use std::sync::Arc;

use glam::Vec3;

use crate::master_path::MasterPath;
use crate::node_pool::{NodeIndex, NodePool, NodeQueue};
use crate::search::{step_cost, CellSearch, DistanceHeuristic, SearchState};
use crate::tri_cell::CellRef;
use crate::tri_nav_mesh::TriNavMesh;

/// Default size of the node lookup table
const DEFAULT_HASH_SIZE: usize = 256;

/// Incremental A* search between two cells
#[derive(Debug, Clone)]
pub struct AStarSearch {
    mesh: Arc<TriNavMesh>,
    heuristic: DistanceHeuristic,
    pool: NodePool,
    open: NodeQueue,
    state: SearchState,
    start: Vec3,
    goal: Vec3,
    start_cell: CellRef,
    goal_cell: CellRef,
    /// Result path, root to goal
    path: Vec<CellRef>,
    iterations: usize,
}

impl AStarSearch {
    /// Creates a new search bound to a mesh
    pub fn new(mesh: Arc<TriNavMesh>, heuristic: DistanceHeuristic) -> Self {
        Self {
            mesh,
            heuristic,
            pool: NodePool::new(DEFAULT_HASH_SIZE),
            open: NodeQueue::new(),
            state: SearchState::Uninitialized,
            start: Vec3::ZERO,
            goal: Vec3::ZERO,
            start_cell: CellRef::new(0),
            goal_cell: CellRef::new(0),
            path: Vec::new(),
            iterations: 0,
        }
    }

    pub fn mesh(&self) -> &Arc<TriNavMesh> {
        &self.mesh
    }

    pub fn heuristic(&self) -> DistanceHeuristic {
        self.heuristic
    }

    pub fn set_heuristic(&mut self, heuristic: DistanceHeuristic) {
        self.heuristic = heuristic;
    }

    pub fn start_cell(&self) -> CellRef {
        self.start_cell
    }

    pub fn goal_cell(&self) -> CellRef {
        self.goal_cell
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn goal(&self) -> Vec3 {
        self.goal
    }

    /// Number of node expansions performed since initialization
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Cells of the found path, start first. Empty unless complete.
    pub fn path_cells(&self) -> &[CellRef] {
        &self.path
    }

    /// Seeds the search.
    ///
    /// Fails immediately when either cell is not part of the mesh.
    pub fn initialize(
        &mut self,
        start: Vec3,
        goal: Vec3,
        start_cell: CellRef,
        goal_cell: CellRef,
    ) -> SearchState {
        self.reset();
        self.start = start;
        self.goal = goal;
        self.start_cell = start_cell;
        self.goal_cell = goal_cell;

        if self.mesh.cell(start_cell).is_none() || self.mesh.cell(goal_cell).is_none() {
            log::debug!(
                "A* search rejected: {} -> {} not in mesh",
                start_cell,
                goal_cell
            );
            self.state = SearchState::Failed;
            return self.state;
        }

        let (root, _) = self.pool.get_or_insert(start_cell);
        {
            let node = self.pool.get_mut(root);
            node.pos = start;
            node.g = 0.0;
            node.g_local = 0.0;
            node.h = self.heuristic.estimate(&start, &goal);
        }
        self.open.push(&mut self.pool, root);

        self.state = SearchState::Initialized;
        self.state
    }

    /// Reuses a cached corridor that already connects this search's start
    /// and goal cells.
    ///
    /// On a match the search completes with the corridor's cells and the
    /// corridor is returned.
    pub fn evaluate(&mut self, existing: &[Arc<MasterPath>]) -> Option<Arc<MasterPath>> {
        if !matches!(
            self.state,
            SearchState::Initialized | SearchState::Processing
        ) {
            return None;
        }

        let found = existing.iter().find(|path| {
            !path.is_disposed()
                && path.first_cell() == self.start_cell
                && path.last_cell() == self.goal_cell
        })?;

        self.path.clear();
        self.path.extend_from_slice(found.cells());
        self.open.clear();
        self.state = SearchState::Complete;
        Some(Arc::clone(found))
    }

    fn complete_at(&mut self, idx: NodeIndex) {
        self.pool.path_to(idx, &mut self.path);
        self.open.clear();
        self.state = SearchState::Complete;
        log::debug!(
            "A* search {} -> {} complete: {} cells after {} iterations",
            self.start_cell,
            self.goal_cell,
            self.path.len(),
            self.iterations
        );
    }

    fn expand(&mut self, current: NodeIndex) {
        let mesh = Arc::clone(&self.mesh);
        let (current_cell, current_pos, current_entry, current_g, current_depth) = {
            let node = self.pool.get(current);
            (node.cell, node.pos, node.entry_wall, node.g, node.depth)
        };
        let Some(cell) = mesh.cell(current_cell) else {
            return;
        };

        for wall in 0..3 {
            let Some((neighbor, neighbor_wall)) = cell.link(wall) else {
                continue;
            };
            if let Some(existing) = self.pool.find(neighbor) {
                if self.pool.get(existing).is_closed() {
                    continue;
                }
            }
            let Some(neighbor_cell) = mesh.cell(neighbor) else {
                continue;
            };

            let is_goal = neighbor == self.goal_cell;
            if !is_goal && neighbor_cell.link_count() <= 1 {
                // Dead end
                continue;
            }

            let pos = cell.wall_midpoint(wall);
            let mut g_local = step_cost(&current_pos, current_entry, cell, wall);
            let h = if is_goal {
                g_local += trinav_common::distance(&pos, &self.goal);
                0.0
            } else {
                self.heuristic.estimate(&pos, &self.goal)
            };
            let g = current_g + g_local;

            let (idx, fresh) = self.pool.get_or_insert(neighbor);
            if !fresh && g >= self.pool.get(idx).g {
                continue;
            }

            {
                let node = self.pool.get_mut(idx);
                node.parent = current;
                node.entry_wall = Some(neighbor_wall as u8);
                node.pos = pos;
                node.g_local = g_local;
                node.g = g;
                node.h = h;
                node.depth = current_depth + 1;
            }

            if is_goal && neighbor_cell.link_count() <= 1 {
                // A dead-end goal can only be reached from here
                self.complete_at(idx);
                return;
            }

            if fresh {
                self.open.push(&mut self.pool, idx);
            } else {
                self.open.modify(&mut self.pool, idx);
            }
        }
    }
}

impl CellSearch for AStarSearch {
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
        self.iterations += 1;

        let Some(current) = self.open.pop(&mut self.pool) else {
            log::debug!(
                "A* search {} -> {} failed after {} iterations",
                self.start_cell,
                self.goal_cell,
                self.iterations
            );
            self.state = SearchState::Failed;
            return self.state;
        };

        if self.pool.get(current).cell == self.goal_cell {
            self.complete_at(current);
            return self.state;
        }

        self.expand(current);
        self.state
    }

    fn reset(&mut self) {
        self.pool.clear();
        self.open.clear();
        self.path.clear();
        self.iterations = 0;
        self.state = SearchState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mesh_helpers::*;

    #[test]
    fn test_uninitialized_search_does_nothing() {
        let mesh = Arc::new(create_grid_mesh(2, 2).unwrap());
        let mut search = AStarSearch::new(mesh, DistanceHeuristic::Manhattan);

        assert_eq!(search.state(), SearchState::Uninitialized);
        assert_eq!(search.process(), SearchState::Uninitialized);
        assert!(search.path_cells().is_empty());
    }

    #[test]
    fn test_same_cell() {
        let mesh = Arc::new(create_grid_mesh(2, 2).unwrap());
        let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);
        let cell = CellRef::new(3);
        let p = mesh.cell(cell).unwrap().centroid();

        assert_eq!(search.initialize(p, p, cell, cell), SearchState::Initialized);
        assert_eq!(search.process(), SearchState::Complete);
        assert_eq!(search.path_cells(), &[cell]);
    }

    #[test]
    fn test_invalid_cells_fail() {
        let mesh = Arc::new(create_grid_mesh(1, 1).unwrap());
        let mut search = AStarSearch::new(mesh, DistanceHeuristic::LongestAxis);

        let state = search.initialize(Vec3::ZERO, Vec3::ONE, CellRef::new(0), CellRef::new(99));
        assert_eq!(state, SearchState::Failed);
    }

    #[test]
    fn test_reset_and_reuse() {
        let mesh = Arc::new(create_grid_mesh(3, 3).unwrap());
        let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);
        let (a, b) = (CellRef::new(0), CellRef::new(17));
        let pa = mesh.cell(a).unwrap().centroid();
        let pb = mesh.cell(b).unwrap().centroid();

        search.initialize(pa, pb, a, b);
        assert_eq!(search.process_to_completion(), SearchState::Complete);
        let first: Vec<CellRef> = search.path_cells().to_vec();

        search.reset();
        assert_eq!(search.state(), SearchState::Uninitialized);
        assert!(search.path_cells().is_empty());

        search.initialize(pa, pb, a, b);
        assert_eq!(search.process_to_completion(), SearchState::Complete);
        assert_eq!(search.path_cells(), first.as_slice());
    }

    #[test]
    fn test_disconnected_islands_fail() {
        let mesh = Arc::new(create_two_island_mesh().unwrap());
        let mut search = AStarSearch::new(mesh.clone(), DistanceHeuristic::Manhattan);
        let a = CellRef::new(0);
        let b = CellRef::new(2);

        search.initialize(
            mesh.cell(a).unwrap().centroid(),
            mesh.cell(b).unwrap().centroid(),
            a,
            b,
        );
        assert_eq!(search.process_to_completion(), SearchState::Failed);
        assert!(search.path_cells().is_empty());
    }
}
