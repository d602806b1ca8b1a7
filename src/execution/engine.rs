//! Job Execution Engine
//!
//! The straight-line pipeline that turns a validated job into published
//! results:
//!
//! 1. Provision the temporary directory tree
//! 2. Write the job descriptor
//! 3. Run the analysis tool and wait for it
//! 4. Normalize and create the destination workspace folder
//! 5. Publish the staging directory with suffix tagging
//!
//! Failures in stages 1-4 abort the job. A failed publication only logs a
//! warning: at that point the analysis has already succeeded and its
//! outputs are worth more than a clean exit status.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use chrono::Local;
use log::{info, warn};

use crate::error::Result;
use crate::execution::command::{render, run_monitored};
use crate::job::JobParams;
use crate::monitoring::JobTimeline;
use crate::staging::JobDirs;
use crate::workspace::{normalize_folder, WorkspaceClient};

/// Environment variable the platform uses to communicate the CPU
/// allocation; the wrapper sets it explicitly on the child process.
pub const ALLOCATION_ENV: &str = "P3_ALLOCATED_CPU";

/// Default analysis runner invoked by the wrapper.
pub const DEFAULT_TOOL_PROGRAM: &str = "run-treesort";

/// What happened during a completed job.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Normalized workspace folder the results were sent to
    pub result_folder: String,
    /// Whether the publication copy succeeded
    pub published: bool,
    /// Total wall-clock time
    pub elapsed: Duration,
    /// Peak memory of the analysis process in MB (0 when unsampled)
    pub peak_memory_mb: u64,
}

/// Runs one TreeSort job from staging through publication.
///
/// # Example
///
/// ```rust,no_run
/// use treesort_runner::execution::JobRunner;
/// use treesort_runner::job::load_params;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let params = load_params("job.json")?;
///     let mut runner = JobRunner::new(params);
///     runner.set_threads(8);
///     let report = runner.run()?;
///     println!("results in {}", report.result_folder);
///     Ok(())
/// }
/// ```
pub struct JobRunner {
    params: JobParams,
    threads: usize,
    dry_run: bool,
    keep_workdir: bool,
    tool_program: String,
    workspace: WorkspaceClient,
}

impl JobRunner {
    /// Creates a runner for a validated parameter set.
    pub fn new(params: JobParams) -> Self {
        Self {
            params,
            threads: num_cpus::get(),
            dry_run: false,
            keep_workdir: false,
            tool_program: DEFAULT_TOOL_PROGRAM.to_string(),
            workspace: WorkspaceClient::new(),
        }
    }

    /// Sets the CPU allocation passed to the analysis tool.
    pub fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    /// Enables or disables dry run mode (commands are previewed, nothing
    /// is executed or uploaded).
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Retains the temporary directory tree after the job for debugging.
    pub fn set_keep_workdir(&mut self, keep: bool) {
        self.keep_workdir = keep;
    }

    /// Overrides the analysis runner program.
    pub fn set_tool_program(&mut self, program: impl Into<String>) {
        self.tool_program = program.into();
    }

    /// Overrides the workspace client (used by tests with stub utilities).
    pub fn set_workspace_client(&mut self, client: WorkspaceClient) {
        self.workspace = client;
    }

    /// Executes the job pipeline.
    pub fn run(&self) -> Result<JobReport> {
        let started = Local::now();
        let mut timeline = JobTimeline::new();

        info!(
            "Job started at {} (threads: {}, dry run: {})",
            started.format("%Y-%m-%d %H:%M:%S"),
            self.threads,
            self.dry_run
        );

        timeline.begin("provision");
        let dirs = JobDirs::provision()?;
        timeline.finish("provision");

        timeline.begin("descriptor");
        let descriptor = self.params.write_descriptor(dirs.root())?;
        timeline.finish("descriptor");

        timeline.begin("analysis");
        let mut cmd = self.tool_command(&dirs, &descriptor);
        let peak_memory_mb = if self.dry_run {
            info!("[DRY RUN] Would run: {}", render(&cmd));
            0
        } else {
            let monitor = run_monitored(&mut cmd)?;
            info!("{}", monitor.summary());
            monitor.peak_memory_mb()
        };
        timeline.finish("analysis");

        timeline.begin("publish");
        let raw_folder = self.params.result_folder();
        let folder = normalize_folder(&raw_folder).to_string();
        let published = self.publish(&dirs, &folder)?;
        timeline.finish("publish");

        if self.keep_workdir {
            dirs.keep();
        }

        info!("{}", timeline.summary());

        Ok(JobReport {
            result_folder: folder,
            published,
            elapsed: timeline.elapsed(),
            peak_memory_mb,
        })
    }

    /// Builds the analysis runner command line.
    fn tool_command(&self, dirs: &JobDirs, descriptor: &Path) -> Command {
        let mut cmd = Command::new(&self.tool_program);
        cmd.arg("-i")
            .arg(dirs.input_dir())
            .arg("-j")
            .arg(descriptor)
            .arg("-s")
            .arg(dirs.stage_dir())
            .arg("-w")
            .arg(dirs.work_dir())
            .env(ALLOCATION_ENV, self.threads.to_string());
        cmd
    }

    /// Sends the staging directory to the workspace.
    ///
    /// Folder creation failure is fatal; a failed copy is downgraded to a
    /// warning and reported through the return value.
    fn publish(&self, dirs: &JobDirs, folder: &str) -> Result<bool> {
        if self.dry_run {
            info!(
                "[DRY RUN] Would publish {} to workspace folder {}",
                dirs.stage_dir().display(),
                folder
            );
            return Ok(false);
        }

        self.workspace.ensure_folder(folder)?;

        match self.workspace.publish(&dirs.stage_dir(), folder) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Failed to copy results to the workspace: {}", e);
                warn!(
                    "The job completed, but outputs may be missing from {}",
                    folder
                );
                Ok(false)
            }
        }
    }
}
