//! Shared search state and cost heuristics
//!
//! Both graph searches are incremental: they are initialized once and then
//! advanced by repeated calls to [`CellSearch::process`], one node expansion
//! per call, until they reach a terminal state.

use glam::Vec3;
use trinav_common::{distance, longest_axis_distance, manhattan_distance};

use crate::tri_cell::CellRef;

/// State of an incremental search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Search has no work assigned
    Uninitialized,
    /// Search was seeded but not advanced yet
    Initialized,
    /// Search is in progress
    Processing,
    /// Search reached its goal
    Complete,
    /// Search exhausted its options without reaching a goal
    Failed,
}

impl SearchState {
    /// Checks if the search reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(self, SearchState::Complete | SearchState::Failed)
    }
}

/// Distance estimate used for the search heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DistanceHeuristic {
    /// Sum of the absolute differences over the three axes
    #[default]
    Manhattan,
    /// Largest absolute difference over the three axes
    LongestAxis,
}

impl DistanceHeuristic {
    /// Estimates the cost between two points
    #[inline]
    pub fn estimate(&self, from: &Vec3, to: &Vec3) -> f32 {
        match self {
            DistanceHeuristic::Manhattan => manhattan_distance(from, to),
            DistanceHeuristic::LongestAxis => longest_axis_distance(from, to),
        }
    }
}

/// Common interface of the incremental cell searches
pub trait CellSearch {
    /// Current state
    fn state(&self) -> SearchState;

    /// Advances the search by one iteration and returns the new state.
    ///
    /// Calling this on a search that is not initialized or already finished
    /// is a no-op.
    fn process(&mut self) -> SearchState;

    /// Returns the search to the uninitialized state, keeping allocations
    fn reset(&mut self);

    /// Checks if the search reached a terminal state
    fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Runs the search until it finishes
    fn process_to_completion(&mut self) -> SearchState {
        loop {
            let state = self.process();
            if state.is_finished() || state == SearchState::Uninitialized {
                return state;
            }
        }
    }
}

/// Local cost of stepping from a parent node into a neighbor.
///
/// The cost runs from the parent's position (its entry wall midpoint, or the
/// true start point for the root) to the midpoint of the wall shared with the
/// neighbor.
pub(crate) fn step_cost(
    parent_pos: &Vec3,
    parent_entry_wall: Option<u8>,
    parent_cell: &crate::tri_cell::TriCell,
    exit_wall: usize,
) -> f32 {
    match parent_entry_wall {
        Some(entry) => parent_cell.midpoint_distance(entry as usize, exit_wall),
        None => distance(parent_pos, &parent_cell.wall_midpoint(exit_wall)),
    }
}

/// Cells reached by a finished search, start first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellPath {
    pub cells: Vec<CellRef>,
    pub cost: f32,
}
