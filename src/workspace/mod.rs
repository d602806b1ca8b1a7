//! Workspace Module
//!
//! Integration with the platform's remote workspace storage, reached only
//! through its command-line utilities.
//!
//! # Components
//!
//! - [`suffix`]: static suffix-to-content-type table for tagged uploads
//! - [`client`]: folder probing/creation and the recursive publication copy

pub mod client;
pub mod suffix;

pub use client::{normalize_folder, publish_args, WorkspaceClient};
pub use suffix::{map_suffix_args, type_for_suffix, SUFFIX_TYPES};
