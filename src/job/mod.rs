//! Job Definition Module
//!
//! Provides the typed parameter record for a TreeSort job along with the
//! descriptor file it serializes to, and the pre-flight resource request
//! the scheduler asks for before execution.
//!
//! # Structure
//!
//! - [`params`]: Job parameters, validation, and descriptor emission
//! - [`preflight`]: Fixed resource estimation

pub mod params;
pub mod preflight;

pub use params::{load_params, InputSource, JobParams, Method, TreeInference, DESCRIPTOR_FILE_NAME};
pub use preflight::{preflight, ResourceRequest};
