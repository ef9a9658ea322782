//! Asynchronous path requests over trinav meshes
//!
//! This crate serves path searches to many client threads while a single
//! owner thread does all of the work.
//!
//! # Features
//!
//! - **Thread-Safe Facade**: [`Navigator`] handles enqueue requests without blocking
//! - **Independent Queues**: Six queues, each behind its own lock
//! - **Throttled Processing**: Searches advance incrementally within a time budget
//! - **Search Pooling**: Idle searches are reused up to a configured bound
//! - **Path Cache**: Completed corridors are reused, repaired and aged out
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glam::Vec3;
//! use trinav::TriNavMesh;
//! use trinav_navigator::{MasterNavigator, NavigatorConfig};
//!
//! # fn example(mesh: Arc<TriNavMesh>) -> trinav_common::Result<()> {
//! let mut master = MasterNavigator::new(mesh, NavigatorConfig::default())?;
//! let navigator = master.navigator();
//!
//! // From any thread
//! let request = navigator.request_path(Vec3::new(0.5, 0.0, 0.5), Vec3::new(9.5, 0.0, 9.5));
//!
//! // On the owner thread
//! while !request.is_finished() {
//!     master.process();
//! }
//!
//! if let Some(mut path) = request.data() {
//!     let target = path.get_target(&Vec3::new(0.5, 0.0, 0.5));
//! }
//! # Ok(())
//! # }
//! ```

// Test code builds meshes it only partially inspects
#![cfg_attr(test, allow(unused))]

pub mod config;
mod jobs;
pub mod master_navigator;
pub mod nav_request;
pub mod navigator;
mod path_cache;

pub use config::NavigatorConfig;
pub use master_navigator::MasterNavigator;
pub use nav_request::{NavRequest, RequestState};
pub use navigator::Navigator;

#[cfg(test)]
pub(crate) mod test_mesh_helpers;
