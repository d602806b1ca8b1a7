//! TreeSort Runner - BV-BRC Job Wrapper
//!
//! Runs the TreeSort reassortment detection tool as a platform job:
//! stages an ephemeral directory tree, serializes the job descriptor,
//! drives the analysis as a subprocess, and publishes the results to the
//! user's workspace folder with content-type tagging.
//!
//! # Architecture
//!
//! The library is organized into six modules:
//!
//! - [`job`]: typed job parameters, descriptor emission, pre-flight
//! - [`staging`]: the per-job `input`/`work`/`stage` directory tree
//! - [`execution`]: the job pipeline and child-process helpers
//! - [`treesort`]: the analysis runner behind the `run-treesort` binary
//! - [`workspace`]: the remote workspace CLI client and suffix tagging
//! - [`monitoring`]: resource sampling and stage timing
//!
//! # Example
//!
//! ```rust,no_run
//! use treesort_runner::execution::JobRunner;
//! use treesort_runner::job::load_params;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = load_params("job.json")?;
//!
//!     let mut runner = JobRunner::new(params);
//!     runner.set_threads(8);
//!
//!     let report = runner.run()?;
//!     println!("Results published: {}", report.published);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod execution;
pub mod job;
pub mod monitoring;
pub mod staging;
pub mod treesort;
pub mod workspace;

// Re-export commonly used types
pub use error::{Error, Result};
pub use execution::JobRunner;
pub use job::{load_params, JobParams};
pub use treesort::TreeSortRunner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "TreeSort Runner";
