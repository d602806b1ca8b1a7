//! Pre-flight Resource Estimation
//!
//! The scheduler calls the wrapper once before the real run to learn what
//! the job needs. TreeSort's cost is dominated by tree inference, which the
//! external tool parallelizes internally, so the request is a fixed record
//! rather than something derived from the input size. No I/O and no
//! validation happen here.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::job::JobParams;

/// CPUs requested for every TreeSort job.
pub const PREFLIGHT_CPU: usize = 8;

/// Memory requested for every TreeSort job.
pub const PREFLIGHT_MEMORY: &str = "16G";

/// Wall-clock ceiling in seconds.
pub const PREFLIGHT_RUNTIME: u64 = 14_400;

/// Disk storage hint in bytes (the staging tree is small).
pub const PREFLIGHT_STORAGE: u64 = 0;

/// A fixed resource request reported to the scheduler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    /// Number of CPUs
    pub cpu: usize,
    /// Memory size with unit suffix (e.g., "16G")
    pub memory: String,
    /// Wall-clock runtime ceiling in seconds
    pub runtime: u64,
    /// Disk storage hint
    pub storage: u64,
}

impl ResourceRequest {
    /// Renders the request as the JSON document the scheduler consumes.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Returns the resource request for a job.
///
/// Always succeeds; the parameters are only logged for diagnostics.
pub fn preflight(params: &JobParams) -> ResourceRequest {
    debug!("Pre-flight for job parameters: {:?}", params);

    ResourceRequest {
        cpu: PREFLIGHT_CPU,
        memory: PREFLIGHT_MEMORY.to_string(),
        runtime: PREFLIGHT_RUNTIME,
        storage: PREFLIGHT_STORAGE,
    }
}
