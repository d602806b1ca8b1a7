//! Job Directory Staging
//!
//! Every job gets a fresh temporary root with a fixed substructure:
//!
//! ```text
//! treesort_job_XXXX/
//!   jobdesc.json     job descriptor (written by the wrapper)
//!   input/           FASTA input staged for the analysis runner
//!   work/            intermediate alignments and trees
//!   stage/           final outputs destined for the workspace
//! ```
//!
//! The tree is owned exclusively by one job and is removed when the
//! [`JobDirs`] value is dropped, unless the operator keeps it around for
//! debugging with [`JobDirs::keep`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::TempDir;

use crate::error::Result;

/// Subdirectory that receives the staged input files.
pub const INPUT_SUBDIR: &str = "input";

/// Subdirectory for intermediate files.
pub const WORK_SUBDIR: &str = "work";

/// Subdirectory for outputs destined for the workspace.
pub const STAGE_SUBDIR: &str = "stage";

/// Prefix for the per-job temporary root.
const JOB_DIR_PREFIX: &str = "treesort_job_";

/// The temporary directory tree for one job.
pub struct JobDirs {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl JobDirs {
    /// Creates a fresh temporary root and provisions the subdirectories.
    ///
    /// The root lives under the system temp directory and is deleted when
    /// this value is dropped.
    pub fn provision() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix(JOB_DIR_PREFIX).tempdir()?;
        let root = temp.path().to_path_buf();
        provision_subdirs(&root)?;

        info!("Provisioned job directory: {}", root.display());
        Ok(Self {
            root,
            temp: Some(temp),
        })
    }

    /// Uses an existing directory as the job root without taking ownership.
    ///
    /// The caller is responsible for the directory's lifetime; nothing is
    /// deleted on drop. The subdirectories are still provisioned.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        provision_subdirs(&root)?;
        Ok(Self { root, temp: None })
    }

    /// The job root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `input` subdirectory.
    pub fn input_dir(&self) -> PathBuf {
        self.root.join(INPUT_SUBDIR)
    }

    /// The `work` subdirectory.
    pub fn work_dir(&self) -> PathBuf {
        self.root.join(WORK_SUBDIR)
    }

    /// The `stage` subdirectory.
    pub fn stage_dir(&self) -> PathBuf {
        self.root.join(STAGE_SUBDIR)
    }

    /// Disables cleanup and returns the root path.
    ///
    /// Used with the `--keep-workdir` flag so a failed or suspicious run
    /// can be inspected after the job ends.
    pub fn keep(mut self) -> PathBuf {
        if let Some(temp) = self.temp.take() {
            let root = temp.into_path();
            info!("Retaining job directory: {}", root.display());
            root
        } else {
            self.root.clone()
        }
    }
}

/// Creates the `input`, `work`, and `stage` subdirectories under `root`.
///
/// Existence is checked first, so calling this twice on the same root is
/// harmless.
pub fn provision_subdirs(root: &Path) -> Result<()> {
    for name in [INPUT_SUBDIR, WORK_SUBDIR, STAGE_SUBDIR] {
        let dir = root.join(name);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!("Created directory: {}", dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_provision_creates_subdirectories() {
        let dirs = JobDirs::provision().unwrap();

        assert!(dirs.input_dir().is_dir());
        assert!(dirs.work_dir().is_dir());
        assert!(dirs.stage_dir().is_dir());
    }

    #[test]
    fn test_provision_is_idempotent() {
        let temp_dir = tempdir().unwrap();

        provision_subdirs(temp_dir.path()).unwrap();
        provision_subdirs(temp_dir.path()).unwrap();

        assert!(temp_dir.path().join(INPUT_SUBDIR).is_dir());
        assert!(temp_dir.path().join(WORK_SUBDIR).is_dir());
        assert!(temp_dir.path().join(STAGE_SUBDIR).is_dir());
    }

    #[test]
    fn test_cleanup_on_drop() {
        let root = {
            let dirs = JobDirs::provision().unwrap();
            dirs.root().to_path_buf()
        };

        assert!(!root.exists());
    }

    #[test]
    fn test_keep_disables_cleanup() {
        let dirs = JobDirs::provision().unwrap();
        let root = dirs.keep();

        assert!(root.exists());
        assert!(root.join(STAGE_SUBDIR).is_dir());

        // Manual cleanup since drop no longer owns it.
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_at_does_not_own_the_root() {
        let temp_dir = tempdir().unwrap();
        {
            let dirs = JobDirs::at(temp_dir.path()).unwrap();
            assert!(dirs.input_dir().is_dir());
        }

        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_fresh_roots_are_distinct() {
        let a = JobDirs::provision().unwrap();
        let b = JobDirs::provision().unwrap();

        assert_ne!(a.root(), b.root());
    }
}
