//! Request handles shared between client threads and the owner thread

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// State of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Waiting to be processed or in progress
    Processing,
    /// Finished with a result
    Complete,
    /// Finished without a result
    Failed,
}

#[derive(Debug)]
struct RequestSlot<T> {
    state: RequestState,
    data: Option<T>,
}

#[derive(Debug)]
struct RequestInner<T> {
    id: u64,
    /// Mirrors `slot.state != Processing` for lock-free polling
    finished: AtomicBool,
    slot: Mutex<RequestSlot<T>>,
}

/// Handle to an asynchronous navigation request.
///
/// Clones share the same underlying request. Once a request leaves the
/// processing state it never changes again.
pub struct NavRequest<T> {
    inner: Arc<RequestInner<T>>,
}

impl<T> NavRequest<T> {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                id,
                finished: AtomicBool::new(false),
                slot: Mutex::new(RequestSlot {
                    state: RequestState::Processing,
                    data: None,
                }),
            }),
        }
    }

    pub(crate) fn failed(id: u64) -> Self {
        let request = Self::new(id);
        request.fail();
        request
    }

    /// Identity of the request
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn state(&self) -> RequestState {
        self.inner.slot.lock().state
    }

    /// Lock-free check for a terminal state
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.state() == RequestState::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.state() == RequestState::Failed
    }

    /// Checks if two handles refer to the same request
    pub fn same_request(&self, other: &NavRequest<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Moves the request to `Complete`. Returns false if it already finished.
    pub(crate) fn complete(&self, data: T) -> bool {
        let mut slot = self.inner.slot.lock();
        if slot.state != RequestState::Processing {
            return false;
        }
        slot.state = RequestState::Complete;
        slot.data = Some(data);
        self.inner.finished.store(true, Ordering::Release);
        true
    }

    /// Moves the request to `Failed`. Returns false if it already finished.
    pub(crate) fn fail(&self) -> bool {
        let mut slot = self.inner.slot.lock();
        if slot.state != RequestState::Processing {
            return false;
        }
        slot.state = RequestState::Failed;
        self.inner.finished.store(true, Ordering::Release);
        true
    }
}

impl<T: Clone> NavRequest<T> {
    /// Result of a completed request
    pub fn data(&self) -> Option<T> {
        self.inner.slot.lock().data.clone()
    }
}

impl<T> Clone for NavRequest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for NavRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavRequest")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}
