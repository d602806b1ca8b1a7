//! Error Types
//!
//! A single error enum shared across the library. Failures fall into two
//! tiers: anything that happens before or during the analysis run is fatal
//! to the job, while a failed result upload is downgraded to a warning by
//! the caller (the analysis output already exists and should not be thrown
//! away because of a transfer problem).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while staging, running, or publishing a job.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The job file could not be read.
    #[error("failed to read job file '{path}': {source}")]
    JobFile {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The job parameters failed boundary validation.
    #[error("invalid job parameters: {0}")]
    InvalidParams(String),

    /// A child process could not be launched at all.
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A child process ran but exited with a non-zero status.
    #[error("command `{command}` exited with {}", exit_code_text(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
    },

    /// An input FASTA file was missing or had no content.
    #[error("input FASTA file '{}' is missing or empty", .0.display())]
    EmptyFasta(PathBuf),
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "an unknown status (terminated by signal?)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = Error::CommandFailed {
            command: "treesort -i descriptor.csv".to_string(),
            code: Some(2),
        };
        let text = err.to_string();
        assert!(text.contains("treesort -i descriptor.csv"));
        assert!(text.contains("code 2"));
    }

    #[test]
    fn test_command_failed_display_no_code() {
        let err = Error::CommandFailed {
            command: "p3-cp".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("unknown status"));
    }

    #[test]
    fn test_invalid_params_display() {
        let err = Error::InvalidParams("bad segment: XX".to_string());
        assert!(err.to_string().contains("bad segment: XX"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_empty_fasta_display() {
        let err = Error::EmptyFasta(PathBuf::from("/tmp/input.fasta"));
        assert!(err.to_string().contains("/tmp/input.fasta"));
    }
}
