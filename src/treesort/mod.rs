//! TreeSort Analysis Module
//!
//! The inner half of the job: FASTA input handling and the subprocess
//! choreography around `prepare_dataset.sh` and the `treesort` CLI.
//!
//! # Structure
//!
//! - [`fasta`]: header cleanup and per-segment splitting
//! - [`runner`]: the analysis pipeline behind the `run-treesort` binary

pub mod fasta;
pub mod runner;

pub use fasta::{sanitize_header, segment_from_header, split_by_segment, INPUT_FASTA_FILE_NAME};
pub use runner::{TreeSortRunner, DEFAULT_BASE_URL};
