//! Thread-safe request facade
//!
//! [`Navigator`] only ever appends to one of six queues, each behind its own
//! lock, and hands back a [`NavRequest`]. The owning
//! [`MasterNavigator`](crate::MasterNavigator) drains the queues on its own
//! thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use trinav::{MasterPath, Path};

use crate::nav_request::NavRequest;

pub(crate) struct PathRequestEntry {
    pub request: NavRequest<Path>,
    pub start: Vec3,
    pub goal: Vec3,
}

pub(crate) struct RepairRequestEntry {
    pub request: NavRequest<Path>,
    pub start: Vec3,
    pub path: Path,
}

pub(crate) struct NearestLocationEntry {
    pub request: NavRequest<Vec3>,
    pub point: Vec3,
}

pub(crate) struct ValidLocationEntry {
    pub request: NavRequest<bool>,
    pub point: Vec3,
    pub y_tolerance: f32,
}

/// Queues shared by every [`Navigator`] clone and the owner
#[derive(Default)]
pub(crate) struct NavQueues {
    pub paths: Mutex<VecDeque<PathRequestEntry>>,
    pub repairs: Mutex<VecDeque<RepairRequestEntry>>,
    pub keep_alives: Mutex<VecDeque<Arc<MasterPath>>>,
    pub discards: Mutex<VecDeque<u64>>,
    pub nearest_locations: Mutex<VecDeque<NearestLocationEntry>>,
    pub valid_locations: Mutex<VecDeque<ValidLocationEntry>>,
    disposed: AtomicBool,
    next_request_id: AtomicU64,
}

impl NavQueues {
    pub fn new() -> Self {
        Self {
            next_request_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn next_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Appends to a queue unless the queues were shut down.
    ///
    /// The flag is read under the queue lock, so nothing can slip in after
    /// [`shutdown`](Self::shutdown) drained the queue.
    fn push<E>(&self, queue: &Mutex<VecDeque<E>>, entry: E) -> Result<(), E> {
        let mut queue = queue.lock();
        if self.is_disposed() {
            return Err(entry);
        }
        queue.push_back(entry);
        Ok(())
    }

    /// Rejects further requests and fails everything still queued.
    ///
    /// Returns the number of requests failed.
    pub fn shutdown(&self) -> usize {
        self.disposed.store(true, Ordering::Release);

        let mut failed = 0;
        for entry in self.paths.lock().drain(..) {
            failed += entry.request.fail() as usize;
        }
        for entry in self.repairs.lock().drain(..) {
            failed += entry.request.fail() as usize;
        }
        for entry in self.nearest_locations.lock().drain(..) {
            failed += entry.request.fail() as usize;
        }
        for entry in self.valid_locations.lock().drain(..) {
            failed += entry.request.fail() as usize;
        }
        self.keep_alives.lock().clear();
        self.discards.lock().clear();
        failed
    }
}

/// Cloneable, thread-safe handle for submitting navigation requests.
///
/// Every call returns immediately. Requests are picked up by the next
/// processing call of the owning
/// [`MasterNavigator`](crate::MasterNavigator). After disposal every new
/// request is returned already failed.
#[derive(Clone)]
pub struct Navigator {
    queues: Arc<NavQueues>,
}

impl Navigator {
    pub(crate) fn new(queues: Arc<NavQueues>) -> Self {
        Self { queues }
    }

    /// Requests a path between two points
    pub fn request_path(&self, start: Vec3, goal: Vec3) -> NavRequest<Path> {
        let request = NavRequest::new(self.queues.next_id());
        let entry = PathRequestEntry {
            request: request.clone(),
            start,
            goal,
        };
        if self.queues.push(&self.queues.paths, entry).is_err() {
            request.fail();
        }
        request
    }

    /// Requests a corridor leading from `start` back onto an existing path.
    ///
    /// The result keeps the goal of `path`.
    pub fn repair_path(&self, start: Vec3, path: &Path) -> NavRequest<Path> {
        let request = NavRequest::new(self.queues.next_id());
        let entry = RepairRequestEntry {
            request: request.clone(),
            start,
            path: path.clone(),
        };
        if self.queues.push(&self.queues.repairs, entry).is_err() {
            request.fail();
        }
        request
    }

    /// Cancels a pending path or repair request.
    ///
    /// The request fails on the next processing call unless it finished
    /// first.
    pub fn discard_request<T>(&self, request: &NavRequest<T>) {
        let _ = self.queues.push(&self.queues.discards, request.id());
    }

    /// Resets the age of a cached path
    pub fn keep_path_alive(&self, path: &Path) {
        let _ = self
            .queues
            .push(&self.queues.keep_alives, Arc::clone(path.master()));
    }

    /// Requests the nearest point on the mesh. Answered within one
    /// processing call.
    pub fn nearest_valid_location(&self, point: Vec3) -> NavRequest<Vec3> {
        let request = NavRequest::new(self.queues.next_id());
        let entry = NearestLocationEntry {
            request: request.clone(),
            point,
        };
        if self.queues.push(&self.queues.nearest_locations, entry).is_err() {
            request.fail();
        }
        request
    }

    /// Requests whether a point lies on the mesh within a vertical
    /// tolerance. Answered within one processing call.
    pub fn is_valid_location(&self, point: Vec3, y_tolerance: f32) -> NavRequest<bool> {
        let request = NavRequest::new(self.queues.next_id());
        let entry = ValidLocationEntry {
            request: request.clone(),
            point,
            y_tolerance,
        };
        if self.queues.push(&self.queues.valid_locations, entry).is_err() {
            request.fail();
        }
        request
    }

    pub fn is_disposed(&self) -> bool {
        self.queues.is_disposed()
    }

    pub fn pending_path_requests(&self) -> usize {
        self.queues.paths.lock().len()
    }

    pub fn pending_repair_requests(&self) -> usize {
        self.queues.repairs.lock().len()
    }

    pub fn pending_keep_alives(&self) -> usize {
        self.queues.keep_alives.lock().len()
    }

    pub fn pending_discards(&self) -> usize {
        self.queues.discards.lock().len()
    }

    pub fn pending_nearest_location_requests(&self) -> usize {
        self.queues.nearest_locations.lock().len()
    }

    pub fn pending_valid_location_requests(&self) -> usize {
        self.queues.valid_locations.lock().len()
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("disposed", &self.is_disposed())
            .field("pending_paths", &self.pending_path_requests())
            .field("pending_repairs", &self.pending_repair_requests())
            .finish()
    }
}
