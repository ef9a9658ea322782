use std::time::Duration;

use trinav::DistanceHeuristic;
use trinav_common::{Error, Result};

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavigatorConfig {
    /// Heuristic used by path searches
    pub heuristic: DistanceHeuristic,
    /// Time budget of a throttled processing call, 0 runs every job to completion
    pub max_process_timeslice_ns: u64,
    /// Age at which cached paths are evicted, 0 disables caching and repair
    pub max_path_age_ms: u64,
    /// Maximum number of cell hops a repair search explores
    pub repair_search_depth: u32,
    /// Maximum number of idle searches kept for reuse
    pub max_job_pool_size: usize,
    /// Interval between cache sweeps, 0 sweeps on every processing call
    pub maintenance_frequency_ms: u64,
}

impl NavigatorConfig {
    pub fn new(heuristic: DistanceHeuristic) -> Self {
        NavigatorConfig {
            heuristic,
            max_process_timeslice_ns: 1_000_000,
            max_path_age_ms: 60_000,
            repair_search_depth: 4,
            max_job_pool_size: 20,
            maintenance_frequency_ms: 500,
        }
    }

    pub fn with_heuristic(mut self, heuristic: DistanceHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_max_process_timeslice_ns(mut self, max_process_timeslice_ns: u64) -> Self {
        self.max_process_timeslice_ns = max_process_timeslice_ns;
        self
    }

    pub fn with_max_path_age_ms(mut self, max_path_age_ms: u64) -> Self {
        self.max_path_age_ms = max_path_age_ms;
        self
    }

    pub fn with_repair_search_depth(mut self, repair_search_depth: u32) -> Self {
        self.repair_search_depth = repair_search_depth;
        self
    }

    pub fn with_max_job_pool_size(mut self, max_job_pool_size: usize) -> Self {
        self.max_job_pool_size = max_job_pool_size;
        self
    }

    pub fn with_maintenance_frequency_ms(mut self, maintenance_frequency_ms: u64) -> Self {
        self.maintenance_frequency_ms = maintenance_frequency_ms;
        self
    }

    /// Checks if completed paths are cached
    pub fn caching_enabled(&self) -> bool {
        self.max_path_age_ms > 0
    }

    pub fn max_path_age(&self) -> Duration {
        Duration::from_millis(self.max_path_age_ms)
    }

    pub fn max_process_timeslice(&self) -> Duration {
        Duration::from_nanos(self.max_process_timeslice_ns)
    }

    pub fn maintenance_frequency(&self) -> Duration {
        Duration::from_millis(self.maintenance_frequency_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.repair_search_depth == 0 {
            return Err(Error::Config(
                "Repair search depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self::new(DistanceHeuristic::default())
    }
}
