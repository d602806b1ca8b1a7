//! Staging Module
//!
//! Handles the ephemeral per-job directory tree: provisioning of the
//! `input`, `work`, and `stage` subdirectories under a fresh temporary
//! root, scoped cleanup, and optional retention for debugging.

pub mod dirs;

pub use dirs::{provision_subdirs, JobDirs, INPUT_SUBDIR, STAGE_SUBDIR, WORK_SUBDIR};
