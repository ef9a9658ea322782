//! Owner-thread work items and the pool of reusable searches

use std::sync::Arc;

use glam::Vec3;
use trinav::{AStarSearch, CellSearch, DijkstraSearch, DistanceHeuristic, Path, TriNavMesh};

use crate::nav_request::NavRequest;

/// Path search in progress
#[derive(Debug)]
pub(crate) struct PathJob {
    pub request: NavRequest<Path>,
    pub search: AStarSearch,
    /// Goal snapped onto the mesh
    pub goal: Vec3,
}

/// Repair search in progress
#[derive(Debug)]
pub(crate) struct RepairJob {
    pub request: NavRequest<Path>,
    pub search: DijkstraSearch,
    /// Path being repaired
    pub original: Path,
}

/// Idle search kept for reuse
#[derive(Debug)]
pub(crate) enum PooledSearch {
    Path(AStarSearch),
    Repair(DijkstraSearch),
}

/// Bounded free list of idle searches
#[derive(Debug)]
pub(crate) struct JobPool {
    searches: Vec<PooledSearch>,
    max_size: usize,
}

impl JobPool {
    pub fn new(max_size: usize) -> Self {
        Self {
            searches: Vec::with_capacity(max_size),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    /// Takes a pooled path search or creates a new one
    pub fn acquire_path_search(
        &mut self,
        mesh: &Arc<TriNavMesh>,
        heuristic: DistanceHeuristic,
    ) -> AStarSearch {
        let found = self
            .searches
            .iter()
            .position(|s| matches!(s, PooledSearch::Path(_)));
        if let Some(index) = found {
            if let PooledSearch::Path(mut search) = self.searches.swap_remove(index) {
                search.set_heuristic(heuristic);
                return search;
            }
        }
        AStarSearch::new(Arc::clone(mesh), heuristic)
    }

    /// Takes a pooled repair search or creates a new one
    pub fn acquire_repair_search(&mut self, mesh: &Arc<TriNavMesh>) -> DijkstraSearch {
        let found = self
            .searches
            .iter()
            .position(|s| matches!(s, PooledSearch::Repair(_)));
        if let Some(index) = found {
            if let PooledSearch::Repair(search) = self.searches.swap_remove(index) {
                return search;
            }
        }
        DijkstraSearch::new(Arc::clone(mesh))
    }

    /// Returns a search to the pool, dropping it when the pool is full
    pub fn release(&mut self, search: PooledSearch) {
        if self.searches.len() >= self.max_size {
            return;
        }
        let search = match search {
            PooledSearch::Path(mut s) => {
                s.reset();
                PooledSearch::Path(s)
            }
            PooledSearch::Repair(mut s) => {
                s.reset();
                PooledSearch::Repair(s)
            }
        };
        self.searches.push(search);
    }

    pub fn clear(&mut self) {
        self.searches.clear();
    }
}
