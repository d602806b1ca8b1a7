//! Resource Monitoring Module
//!
//! Provides utilities for tracking the analysis subprocess and timing the
//! stages of a job run.
//!
//! # Components
//!
//! - [`ResourceMonitor`]: CPU and memory sampling of the child process
//! - [`JobTimeline`]: per-stage wall-clock accounting

pub mod resource;
pub mod timeline;

pub use resource::{ResourceMonitor, ResourceSample};
pub use timeline::{JobTimeline, StageTiming};
