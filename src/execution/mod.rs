//! Job Execution Module
//!
//! Provides the straight-line job pipeline and the child-process helpers
//! it is built on.
//!
//! # Architecture
//!
//! - [`engine`]: staging, analysis invocation, and result publication
//! - [`command`]: rendering, checked execution, and monitored execution

pub mod command;
pub mod engine;

pub use engine::{JobReport, JobRunner, ALLOCATION_ENV, DEFAULT_TOOL_PROGRAM};
