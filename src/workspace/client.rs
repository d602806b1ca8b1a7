//! Workspace CLI Client
//!
//! The remote workspace is reached only through the platform's command-line
//! utilities (`p3-cp`, `p3-ls`, `p3-mkdir`). This module wraps them behind
//! a small client so the rest of the code never builds those command lines
//! itself, and so tests can point the client at stub executables.

use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::Result;
use crate::execution::command::run_checked;
use crate::workspace::suffix::map_suffix_args;

/// Default copy utility.
pub const DEFAULT_CP_PROGRAM: &str = "p3-cp";

/// Default listing utility used to probe folder existence.
pub const DEFAULT_LS_PROGRAM: &str = "p3-ls";

/// Default folder creation utility.
pub const DEFAULT_MKDIR_PROGRAM: &str = "p3-mkdir";

/// Strips one trailing `/.` from a result folder path.
///
/// The platform composes result folders as `<path>/.<name>`; with an empty
/// name that leaves a dangling `/.` the copy utility cannot address.
pub fn normalize_folder(folder: &str) -> &str {
    folder.strip_suffix("/.").unwrap_or(folder)
}

/// Client for the workspace command-line utilities.
#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    cp_program: String,
    ls_program: String,
    mkdir_program: String,
}

impl Default for WorkspaceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceClient {
    /// Creates a client using the platform utilities from `PATH`.
    pub fn new() -> Self {
        Self {
            cp_program: DEFAULT_CP_PROGRAM.to_string(),
            ls_program: DEFAULT_LS_PROGRAM.to_string(),
            mkdir_program: DEFAULT_MKDIR_PROGRAM.to_string(),
        }
    }

    /// Creates a client with explicit utility programs (used by tests to
    /// substitute stubs).
    pub fn with_programs(
        cp: impl Into<String>,
        ls: impl Into<String>,
        mkdir: impl Into<String>,
    ) -> Self {
        Self {
            cp_program: cp.into(),
            ls_program: ls.into(),
            mkdir_program: mkdir.into(),
        }
    }

    /// Checks whether a workspace folder exists.
    ///
    /// A probe failure of any kind reads as "missing"; the follow-up mkdir
    /// will surface real problems.
    pub fn folder_exists(&self, folder: &str) -> bool {
        let mut cmd = Command::new(&self.ls_program);
        cmd.arg(format!("ws:{}", folder));

        debug!("Probing workspace folder: {}", folder);
        match cmd.output() {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Creates a workspace folder.
    pub fn create_folder(&self, folder: &str) -> Result<()> {
        let mut cmd = Command::new(&self.mkdir_program);
        cmd.arg(format!("ws:{}", folder));

        info!("Creating workspace folder: {}", folder);
        run_checked(&mut cmd)?;
        Ok(())
    }

    /// Creates a workspace folder unless it already exists.
    pub fn ensure_folder(&self, folder: &str) -> Result<()> {
        if self.folder_exists(folder) {
            debug!("Workspace folder already exists: {}", folder);
            return Ok(());
        }
        self.create_folder(folder)
    }

    /// Copies a workspace file to a local path.
    pub fn fetch_file(&self, workspace_id: &str, dest: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.cp_program);
        cmd.arg(format!("ws:{}", workspace_id)).arg(dest);

        info!("Fetching {} from the workspace", workspace_id);
        run_checked(&mut cmd)?;
        Ok(())
    }

    /// Uploads the whole staging directory to a workspace folder in one
    /// recursive, force-overwrite copy, tagging files by suffix.
    pub fn publish(&self, stage_dir: &Path, folder: &str) -> Result<()> {
        let mut cmd = Command::new(&self.cp_program);
        cmd.args(publish_args(stage_dir, folder));

        info!(
            "Publishing {} to workspace folder {}",
            stage_dir.display(),
            folder
        );
        run_checked(&mut cmd)?;
        Ok(())
    }
}

/// Builds the argument vector for the publication copy call.
pub fn publish_args(stage_dir: &Path, folder: &str) -> Vec<String> {
    let mut args = vec!["-r".to_string(), "-f".to_string()];
    args.extend(map_suffix_args());
    args.push(stage_dir.display().to_string());
    args.push(format!("ws:{}", folder));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Writes an executable stub script and returns its path.
    #[cfg(unix)]
    fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/bash\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_normalize_strips_trailing_dot_segment() {
        assert_eq!(normalize_folder("/home/user/results/."), "/home/user/results");
    }

    #[test]
    fn test_normalize_leaves_plain_path_alone() {
        assert_eq!(normalize_folder("/home/user/results"), "/home/user/results");
        assert_eq!(normalize_folder("/home/user/.hidden"), "/home/user/.hidden");
    }

    #[test]
    fn test_normalize_strips_only_one_suffix() {
        assert_eq!(normalize_folder("/a/./."), "/a/.");
    }

    #[test]
    fn test_publish_args_shape() {
        let args = publish_args(Path::new("/tmp/job/stage"), "/user@bvbrc/home/.run1");

        assert_eq!(args[0], "-r");
        assert_eq!(args[1], "-f");
        assert!(args.contains(&"--map-suffix".to_string()));
        assert!(args.contains(&"tre=nwk".to_string()));
        assert!(args.contains(&"csv=csv".to_string()));
        assert_eq!(args[args.len() - 2], "/tmp/job/stage");
        assert_eq!(args[args.len() - 1], "ws:/user@bvbrc/home/.run1");
    }

    #[test]
    #[cfg(unix)]
    fn test_folder_exists_true_and_false() {
        let dir = tempdir().unwrap();
        let ls_ok = write_stub(dir.path(), "ls-ok", "exit 0");
        let ls_missing = write_stub(dir.path(), "ls-missing", "exit 1");

        let client = WorkspaceClient::with_programs("p3-cp", ls_ok.to_str().unwrap(), "p3-mkdir");
        assert!(client.folder_exists("/any"));

        let client =
            WorkspaceClient::with_programs("p3-cp", ls_missing.to_str().unwrap(), "p3-mkdir");
        assert!(!client.folder_exists("/any"));
    }

    #[test]
    fn test_folder_exists_missing_utility() {
        let client = WorkspaceClient::with_programs("p3-cp", "no-such-utility-42", "p3-mkdir");
        assert!(!client.folder_exists("/any"));
    }

    #[test]
    #[cfg(unix)]
    fn test_ensure_folder_creates_when_probe_fails() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("created");
        let ls = write_stub(dir.path(), "ls", "exit 1");
        let mkdir = write_stub(
            dir.path(),
            "mkdir",
            &format!("echo \"$1\" > {}", marker.display()),
        );

        let client = WorkspaceClient::with_programs(
            "p3-cp",
            ls.to_str().unwrap(),
            mkdir.to_str().unwrap(),
        );
        client.ensure_folder("/user@bvbrc/home/.run1").unwrap();

        let recorded = fs::read_to_string(&marker).unwrap();
        assert_eq!(recorded.trim(), "ws:/user@bvbrc/home/.run1");
    }

    #[test]
    #[cfg(unix)]
    fn test_ensure_folder_skips_mkdir_when_present() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("created");
        let ls = write_stub(dir.path(), "ls", "exit 0");
        let mkdir = write_stub(dir.path(), "mkdir", &format!("touch {}", marker.display()));

        let client = WorkspaceClient::with_programs(
            "p3-cp",
            ls.to_str().unwrap(),
            mkdir.to_str().unwrap(),
        );
        client.ensure_folder("/any").unwrap();

        assert!(!marker.exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_create_folder_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let ls = write_stub(dir.path(), "ls", "exit 1");
        let mkdir = write_stub(dir.path(), "mkdir", "exit 3");

        let client = WorkspaceClient::with_programs(
            "p3-cp",
            ls.to_str().unwrap(),
            mkdir.to_str().unwrap(),
        );
        assert!(client.ensure_folder("/any").is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_publish_invokes_copy_with_arguments() {
        let dir = tempdir().unwrap();
        let record = dir.path().join("argv");
        let cp = write_stub(dir.path(), "cp", &format!("echo \"$@\" > {}", record.display()));

        let client = WorkspaceClient::with_programs(cp.to_str().unwrap(), "p3-ls", "p3-mkdir");
        client
            .publish(Path::new("/tmp/job/stage"), "/user@bvbrc/home/.run1")
            .unwrap();

        let argv = fs::read_to_string(&record).unwrap();
        assert!(argv.contains("-r -f"));
        assert!(argv.contains("--map-suffix tre=nwk"));
        assert!(argv.contains("--map-suffix csv=csv"));
        assert!(argv.contains("ws:/user@bvbrc/home/.run1"));
    }

    #[test]
    #[cfg(unix)]
    fn test_fetch_file_arguments() {
        let dir = tempdir().unwrap();
        let record = dir.path().join("argv");
        let cp = write_stub(dir.path(), "cp", &format!("echo \"$@\" > {}", record.display()));

        let client = WorkspaceClient::with_programs(cp.to_str().unwrap(), "p3-ls", "p3-mkdir");
        client
            .fetch_file("/user@bvbrc/home/input.fasta", Path::new("/tmp/input.fasta"))
            .unwrap();

        let argv = fs::read_to_string(&record).unwrap();
        assert!(argv.contains("ws:/user@bvbrc/home/input.fasta"));
        assert!(argv.contains("/tmp/input.fasta"));
    }
}
