//! Owner-thread side of the request orchestrator
//!
//! A [`MasterNavigator`] owns every mutable piece of navigation state: the
//! in-progress jobs, the pool of idle searches and the path cache. It is
//! neither `Send` nor `Sync`, so the thread that creates it is the
//! only one that can process requests. Other threads talk to it through
//! [`Navigator`] handles.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use glam::Vec3;
use trinav::{CellRef, CellSearch, MasterPath, Path, SearchState, TriNavMesh};
use trinav_common::Result;
use web_time::Instant;

use crate::config::NavigatorConfig;
use crate::jobs::{JobPool, PathJob, PooledSearch, RepairJob};
use crate::nav_request::NavRequest;
use crate::navigator::{NavQueues, Navigator, PathRequestEntry, RepairRequestEntry};
use crate::path_cache::PathCache;

/// How far a processing call advances the active jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessMode {
    /// One iteration per job
    Once,
    /// Rounds of iterations while the timeslice lasts
    Throttled,
    /// Until every job finished
    All,
}

/// Single-owner request processor
pub struct MasterNavigator {
    mesh: Arc<TriNavMesh>,
    config: NavigatorConfig,
    queues: Arc<NavQueues>,
    path_jobs: Vec<PathJob>,
    repair_jobs: Vec<RepairJob>,
    pool: JobPool,
    cache: PathCache,
    next_path_id: u64,
    last_maintenance: Instant,
    disposed: bool,
    /// Pins the navigator to its owner thread
    _owner: PhantomData<*const ()>,
}

impl MasterNavigator {
    /// Creates a navigator over a built mesh
    pub fn new(mesh: Arc<TriNavMesh>, config: NavigatorConfig) -> Result<Self> {
        config.validate()?;

        log::debug!(
            "Creating navigator: {} cells, heuristic {:?}, caching {}",
            mesh.cell_count(),
            config.heuristic,
            config.caching_enabled()
        );

        Ok(Self {
            mesh,
            pool: JobPool::new(config.max_job_pool_size),
            config,
            queues: Arc::new(NavQueues::new()),
            path_jobs: Vec::new(),
            repair_jobs: Vec::new(),
            cache: PathCache::new(),
            next_path_id: 1,
            last_maintenance: Instant::now(),
            disposed: false,
            _owner: PhantomData,
        })
    }

    /// Gets a thread-safe handle for submitting requests
    pub fn navigator(&self) -> Navigator {
        Navigator::new(Arc::clone(&self.queues))
    }

    pub fn mesh(&self) -> &Arc<TriNavMesh> {
        &self.mesh
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Processes requests within the configured timeslice.
    ///
    /// Every active job advances at least one iteration. With a zero
    /// timeslice every job runs to completion.
    pub fn process(&mut self) {
        if self.config.max_process_timeslice_ns == 0 {
            self.run(ProcessMode::All);
        } else {
            self.run(ProcessMode::Throttled);
        }
    }

    /// Processes requests, advancing every active job by one iteration
    pub fn process_once(&mut self) {
        self.run(ProcessMode::Once);
    }

    /// Processes requests, running every active job to completion
    pub fn process_all(&mut self) {
        self.run(ProcessMode::All);
    }

    fn run(&mut self, mode: ProcessMode) {
        if self.disposed {
            return;
        }
        let started = Instant::now();

        self.drain_path_requests();
        self.drain_repair_requests();
        let unmatched_discards = self.apply_discards();
        self.apply_keep_alives();
        self.answer_location_requests(&unmatched_discards);

        match mode {
            ProcessMode::Once => self.step_jobs(),
            ProcessMode::All => {
                while self.has_jobs() {
                    self.step_jobs();
                }
            }
            ProcessMode::Throttled => {
                let budget = self.config.max_process_timeslice();
                loop {
                    self.step_jobs();
                    if !self.has_jobs() || started.elapsed() >= budget {
                        break;
                    }
                }
            }
        }

        self.maintain();
    }

    fn has_jobs(&self) -> bool {
        !self.path_jobs.is_empty() || !self.repair_jobs.is_empty()
    }

    fn next_path_id(&mut self) -> u64 {
        let id = self.next_path_id;
        self.next_path_id += 1;
        id
    }

    fn drain_path_requests(&mut self) {
        let entries: Vec<PathRequestEntry> = self.queues.paths.lock().drain(..).collect();
        for entry in entries {
            self.start_path_job(entry);
        }
    }

    fn drain_repair_requests(&mut self) {
        let entries: Vec<RepairRequestEntry> = self.queues.repairs.lock().drain(..).collect();
        for entry in entries {
            self.start_repair_job(entry);
        }
    }

    fn start_path_job(&mut self, entry: PathRequestEntry) {
        let PathRequestEntry {
            request,
            start,
            goal,
        } = entry;

        let Some((start_cell, _)) = self.mesh.closest_cell(&start, true) else {
            log::debug!("Path request {} failed: start {} is off the mesh", request.id(), start);
            request.fail();
            return;
        };
        let Some((goal_cell, goal)) = self.mesh.closest_cell(&goal, true) else {
            log::debug!("Path request {} failed: goal {} is off the mesh", request.id(), goal);
            request.fail();
            return;
        };

        let mut search = self
            .pool
            .acquire_path_search(&self.mesh, self.config.heuristic);
        search.initialize(start, goal, start_cell, goal_cell);

        if self.config.caching_enabled() {
            if let Some(master) = search.evaluate(self.cache.paths()) {
                log::debug!("Path request {} reuses path {}", request.id(), master.id());
                master.renew();
                request.complete(Path::new(master, goal));
                self.pool.release(PooledSearch::Path(search));
                return;
            }
        }

        self.path_jobs.push(PathJob {
            request,
            search,
            goal,
        });
    }

    fn start_repair_job(&mut self, entry: RepairRequestEntry) {
        let RepairRequestEntry {
            request,
            start,
            path,
        } = entry;

        if !self.config.caching_enabled() || path.is_disposed() {
            request.fail();
            return;
        }
        let Some((start_cell, _)) = self.mesh.closest_cell(&start, true) else {
            request.fail();
            return;
        };

        let master = Arc::clone(path.master());
        if let Some(index) = master.cell_index(start_cell) {
            // Already on the corridor
            if index == 0 {
                master.renew();
                request.complete(path);
            } else {
                let cells = master.cells()[index..].to_vec();
                self.complete_with_cells(&request, cells, path.goal());
            }
            return;
        }

        let mut search = self.pool.acquire_repair_search(&self.mesh);
        search.initialize(
            start,
            None,
            start_cell,
            master.cells(),
            self.config.repair_search_depth,
            false,
        );
        self.repair_jobs.push(RepairJob {
            request,
            search,
            original: path,
        });
    }

    /// Builds and caches a corridor, then completes the request with it
    fn complete_with_cells(&mut self, request: &NavRequest<Path>, cells: Vec<CellRef>, goal: Vec3) {
        let id = self.next_path_id();
        match MasterPath::new(id, Arc::clone(&self.mesh), cells) {
            Ok(master) => {
                let master = Arc::new(master);
                if self.config.caching_enabled() {
                    self.cache.add(Arc::clone(&master));
                }
                request.complete(Path::new(master, goal));
            }
            Err(e) => {
                log::warn!("Request {} produced an invalid corridor: {}", request.id(), e);
                request.fail();
            }
        }
    }

    /// Cancels jobs named by discard requests. Returns the identities that
    /// matched no job.
    fn apply_discards(&mut self) -> HashSet<u64> {
        let ids: Vec<u64> = self.queues.discards.lock().drain(..).collect();
        let mut unmatched = HashSet::new();

        for id in ids {
            if let Some(index) = self.path_jobs.iter().position(|j| j.request.id() == id) {
                let job = self.path_jobs.swap_remove(index);
                job.request.fail();
                self.pool.release(PooledSearch::Path(job.search));
            } else if let Some(index) = self.repair_jobs.iter().position(|j| j.request.id() == id) {
                let job = self.repair_jobs.swap_remove(index);
                job.request.fail();
                self.pool.release(PooledSearch::Repair(job.search));
            } else {
                unmatched.insert(id);
            }
        }
        unmatched
    }

    fn apply_keep_alives(&mut self) {
        let paths: Vec<Arc<MasterPath>> = self.queues.keep_alives.lock().drain(..).collect();
        for path in paths {
            if !path.is_disposed() {
                path.renew();
            }
        }
    }

    fn answer_location_requests(&mut self, discarded: &HashSet<u64>) {
        let nearest: Vec<_> = self.queues.nearest_locations.lock().drain(..).collect();
        for entry in nearest {
            if discarded.contains(&entry.request.id()) {
                entry.request.fail();
                continue;
            }
            match self.mesh.nearest_valid_location(&entry.point) {
                Some(location) => entry.request.complete(location),
                None => entry.request.fail(),
            };
        }

        let valid: Vec<_> = self.queues.valid_locations.lock().drain(..).collect();
        for entry in valid {
            if discarded.contains(&entry.request.id()) {
                entry.request.fail();
                continue;
            }
            let is_valid = self.mesh.is_valid_position(&entry.point, entry.y_tolerance);
            entry.request.complete(is_valid);
        }
    }

    /// Advances every active job by one iteration and settles the finished
    fn step_jobs(&mut self) {
        let mut i = 0;
        while i < self.path_jobs.len() {
            let state = self.path_jobs[i].search.process();
            if state.is_finished() || state == SearchState::Uninitialized {
                let job = self.path_jobs.swap_remove(i);
                self.finish_path_job(job);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.repair_jobs.len() {
            let state = self.repair_jobs[i].search.process();
            if state.is_finished() || state == SearchState::Uninitialized {
                let job = self.repair_jobs.swap_remove(i);
                self.finish_repair_job(job);
            } else {
                i += 1;
            }
        }
    }

    fn finish_path_job(&mut self, job: PathJob) {
        let PathJob {
            request,
            search,
            goal,
        } = job;

        if search.state() == SearchState::Complete {
            self.complete_with_cells(&request, search.path_cells().to_vec(), goal);
        } else {
            log::debug!(
                "Path request {} failed: no path from {} to {}",
                request.id(),
                search.start_cell(),
                search.goal_cell()
            );
            request.fail();
        }
        self.pool.release(PooledSearch::Path(search));
    }

    fn finish_repair_job(&mut self, job: RepairJob) {
        let RepairJob {
            request,
            search,
            original,
        } = job;
        let master = original.master();

        let merged = if search.state() == SearchState::Complete && !master.is_disposed() {
            // Prefer the path rejoining the corridor furthest along
            (0..search.path_count())
                .filter_map(|i| search.path_cells(i))
                .filter_map(|cells| {
                    let joint = master.cell_index(*cells.last()?)?;
                    Some((joint, cells))
                })
                .max_by_key(|(joint, _)| *joint)
                .map(|(joint, cells)| {
                    let mut merged = cells.to_vec();
                    merged.extend_from_slice(&master.cells()[joint + 1..]);
                    merged
                })
        } else {
            None
        };

        match merged {
            Some(cells) => self.complete_with_cells(&request, cells, original.goal()),
            None => {
                log::debug!(
                    "Repair request {} failed from {}",
                    request.id(),
                    search.start_cell()
                );
                request.fail();
            }
        }
        self.pool.release(PooledSearch::Repair(search));
    }

    /// Sweeps aged corridors out of the cache when a sweep is due
    fn maintain(&mut self) {
        if !self.config.caching_enabled() {
            return;
        }
        if self.last_maintenance.elapsed() < self.config.maintenance_frequency() {
            return;
        }
        self.last_maintenance = Instant::now();

        let evicted = self.cache.evict_older_than(self.config.max_path_age());
        if evicted > 0 {
            log::debug!("Evicted {} aged paths, {} remain", evicted, self.cache.len());
        }
    }

    /// Fails every queued request and job, empties the pool and disposes every
    /// cached corridor. Further requests fail immediately. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let mut failed = self.queues.shutdown();
        for job in self.path_jobs.drain(..) {
            failed += job.request.fail() as usize;
        }
        for job in self.repair_jobs.drain(..) {
            failed += job.request.fail() as usize;
        }
        self.pool.clear();
        let paths = self.cache.len();
        self.cache.dispose_all();

        log::info!(
            "Navigator disposed: {} requests failed, {} paths disposed",
            failed,
            paths
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of path searches in progress
    pub fn path_job_count(&self) -> usize {
        self.path_jobs.len()
    }

    /// Number of repair searches in progress
    pub fn repair_job_count(&self) -> usize {
        self.repair_jobs.len()
    }

    /// Number of cached corridors
    pub fn active_path_count(&self) -> usize {
        self.cache.len()
    }

    /// Number of idle searches held for reuse
    pub fn job_pool_size(&self) -> usize {
        self.pool.len()
    }
}

impl Drop for MasterNavigator {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for MasterNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterNavigator")
            .field("path_jobs", &self.path_jobs.len())
            .field("repair_jobs", &self.repair_jobs.len())
            .field("active_paths", &self.cache.len())
            .field("pool", &self.pool.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}
