//! Cache of completed corridors

use std::sync::Arc;
use std::time::Duration;

use trinav::MasterPath;

/// Corridors kept alive for reuse and repair
#[derive(Debug, Default)]
pub(crate) struct PathCache {
    paths: Vec<Arc<MasterPath>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: Arc<MasterPath>) {
        if !self.paths.iter().any(|p| Arc::ptr_eq(p, &path)) {
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[Arc<MasterPath>] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Disposes and drops every corridor older than `max_age`, along with any
    /// disposed elsewhere. Returns the number evicted.
    pub fn evict_older_than(&mut self, max_age: Duration) -> usize {
        let before = self.paths.len();
        self.paths.retain(|path| {
            if path.is_disposed() {
                return false;
            }
            if path.age() > max_age {
                path.dispose();
                return false;
            }
            true
        });
        before - self.paths.len()
    }

    /// Disposes and drops every corridor
    pub fn dispose_all(&mut self) {
        for path in self.paths.drain(..) {
            path.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_mesh_helpers::create_grid_mesh;
    use std::thread;
    use trinav::CellRef;

    #[test]
    fn test_eviction_by_age() -> trinav_common::Result<()> {
        let mesh = create_grid_mesh(1, 1)?;
        let old = Arc::new(MasterPath::new(1, mesh.clone(), vec![CellRef::new(0)])?);
        let mut cache = PathCache::new();
        cache.add(old.clone());
        cache.add(old.clone());
        assert_eq!(cache.len(), 1);

        thread::sleep(Duration::from_millis(30));
        let fresh = Arc::new(MasterPath::new(2, mesh, vec![CellRef::new(1)])?);
        cache.add(fresh.clone());

        assert_eq!(cache.evict_older_than(Duration::from_millis(20)), 1);
        assert!(old.is_disposed());
        assert!(!fresh.is_disposed());
        assert_eq!(cache.len(), 1);

        cache.dispose_all();
        assert!(fresh.is_disposed());
        assert_eq!(cache.len(), 0);
        Ok(())
    }
}
