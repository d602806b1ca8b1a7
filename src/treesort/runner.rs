//! TreeSort Analysis Runner
//!
//! Drives one analysis from a staged job descriptor: prepares the input
//! FASTA, builds the per-segment dataset with `prepare_dataset.sh`, and
//! runs the `treesort` CLI against the compiled descriptor. The wrapper
//! binary invokes this through `run-treesort` with the four standard
//! arguments (input directory, job file, staging directory, work
//! directory).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::execution::command::run_streamed;
use crate::job::params::{InputSource, JobParams, TreeInference};
use crate::treesort::fasta::{check_fasta_file, split_by_segment, INPUT_FASTA_FILE_NAME};
use crate::workspace::WorkspaceClient;

/// Dataset descriptor compiled by the preparation script and consumed by
/// the TreeSort CLI (not the job descriptor).
pub const DATASET_DESCRIPTOR_NAME: &str = "descriptor.csv";

/// Default dataset preparation script.
pub const DEFAULT_PREPARE_PROGRAM: &str = "prepare_dataset.sh";

/// Default TreeSort executable.
pub const DEFAULT_TREESORT_PROGRAM: &str = "treesort";

/// Platform base URL used when the environment does not set one.
pub const DEFAULT_BASE_URL: &str = "https://www.bv-brc.org";

// TreeSort CLI flags.
const OPT_CLADES: &str = "--clades";
const OPT_DESCRIPTOR: &str = "-i";
const OPT_EQUAL_RATES: &str = "--equal-rates";
const OPT_MATCH_EPI: &str = "--match-on-epi";
const OPT_MATCH_REGEX: &str = "--match-on-regex";
const OPT_MATCH_STRAIN: &str = "--match-on-strain";
const OPT_NO_COLLAPSE: &str = "--no-collapse";
const OPT_OUTPUT: &str = "-o";
const OPT_TIMETREE: &str = "--timetree";

// Preparation script flags.
const OPT_FAST_TREE: &str = "--fast";
const OPT_SEGMENTS: &str = "--segments";

/// Runs the TreeSort analysis for one job.
pub struct TreeSortRunner {
    params: JobParams,
    input_dir: PathBuf,
    staging_dir: PathBuf,
    work_dir: PathBuf,
    input_fasta: PathBuf,
    base_url: String,
    workspace: WorkspaceClient,
    prepare_program: String,
    treesort_program: String,
}

impl TreeSortRunner {
    /// Creates a runner over the three job directories.
    ///
    /// The parameters are re-validated here so the runner can also be
    /// driven directly with a hand-built record.
    pub fn new(
        mut params: JobParams,
        input_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        params.validate()?;

        let input_dir = input_dir.into();
        let input_fasta = input_dir.join(INPUT_FASTA_FILE_NAME);

        Ok(Self {
            params,
            input_dir,
            staging_dir: staging_dir.into(),
            work_dir: work_dir.into(),
            input_fasta,
            base_url: DEFAULT_BASE_URL.to_string(),
            workspace: WorkspaceClient::new(),
            prepare_program: DEFAULT_PREPARE_PROGRAM.to_string(),
            treesort_program: DEFAULT_TREESORT_PROGRAM.to_string(),
        })
    }

    /// Sets the platform base URL (normally from `P3_BASE_URL`).
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    /// Overrides the workspace client (used by tests with stub utilities).
    pub fn set_workspace_client(&mut self, client: WorkspaceClient) {
        self.workspace = client;
    }

    /// Overrides the dataset preparation script.
    pub fn set_prepare_program(&mut self, program: impl Into<String>) {
        self.prepare_program = program.into();
    }

    /// Overrides the TreeSort executable.
    pub fn set_treesort_program(&mut self, program: impl Into<String>) {
        self.treesort_program = program.into();
    }

    /// Runs the full analysis.
    ///
    /// Input and dataset preparation are skipped for `prepared_files`
    /// jobs, where the platform stages the compiled dataset into the work
    /// directory ahead of time.
    pub fn run(&self) -> Result<()> {
        info!("Analysis starting against {}", self.base_url);

        if self.params.prepare_dataset {
            self.prepare_input_file()?;
            self.run_prepare_dataset()?;
        } else {
            info!(
                "Using prepared files from {}",
                self.params
                    .input_existing_directory
                    .as_deref()
                    .unwrap_or("the work directory")
            );
        }

        self.run_treesort()
    }

    /// Materializes `input.fasta` in the input directory.
    pub fn prepare_input_file(&self) -> Result<()> {
        match self.params.input_source {
            InputSource::FastaData => {
                let data = self.params.input_fasta_data.as_deref().unwrap_or("");
                fs::write(&self.input_fasta, data)?;
                info!("Staged inline FASTA data to {}", self.input_fasta.display());
            }
            InputSource::FastaFileId => {
                let id = self
                    .params
                    .input_fasta_file_id
                    .as_deref()
                    .unwrap_or_default();
                self.workspace.fetch_file(id, &self.input_fasta)?;
            }
            InputSource::PreparedFiles => {
                return Err(Error::InvalidParams(
                    "prepared_files input does not use a staged FASTA".to_string(),
                ));
            }
        }

        check_fasta_file(&self.input_fasta)
    }

    /// Splits the input by segment and runs the preparation script, which
    /// aligns each segment, infers reference trees, and compiles the
    /// dataset descriptor into the work directory.
    pub fn run_prepare_dataset(&self) -> Result<()> {
        let segments = split_by_segment(&self.input_fasta, &self.work_dir)?;
        if segments.is_empty() {
            warn!("No recognized segments in the input FASTA");
        }

        let mut cmd = Command::new(&self.prepare_program);
        cmd.args(self.prepare_dataset_args());
        run_streamed(&mut cmd)
    }

    /// Runs the TreeSort CLI against the compiled dataset.
    pub fn run_treesort(&self) -> Result<()> {
        let mut cmd = Command::new(&self.treesort_program);
        cmd.args(self.treesort_args());
        run_streamed(&mut cmd)
    }

    /// Arguments for the dataset preparation script.
    pub fn prepare_dataset_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.params.ref_tree_inference == TreeInference::FastTree {
            args.push(OPT_FAST_TREE.to_string());
        }

        if let Some(segments) = &self.params.segments {
            if !segments.trim().is_empty() {
                args.push(OPT_SEGMENTS.to_string());
                args.push(segments.clone());
            }
        }

        args.push(self.input_fasta.display().to_string());
        args.push(self.params.ref_segment.clone());
        args.push(self.work_dir.display().to_string());

        args
    }

    /// Arguments for the TreeSort CLI.
    ///
    /// The match-on options are mutually exclusive; strain wins over EPI,
    /// which wins over a custom regex.
    pub fn treesort_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(clades_path) = &self.params.clades_path {
            if !clades_path.trim().is_empty() {
                args.push(OPT_CLADES.to_string());
                args.push(clades_path.clone());
            }
        }

        args.push(OPT_DESCRIPTOR.to_string());
        args.push(self.dataset_descriptor().display().to_string());

        if self.params.match_on_strain {
            args.push(OPT_MATCH_STRAIN.to_string());
        } else if self.params.match_on_epi {
            args.push(OPT_MATCH_EPI.to_string());
        } else if let Some(regex) = &self.params.match_on_regex {
            args.push(OPT_MATCH_REGEX.to_string());
            args.push(regex.clone());
        }

        if self.params.no_collapse {
            args.push(OPT_NO_COLLAPSE.to_string());
        }

        args.push(OPT_OUTPUT.to_string());
        args.push(self.staging_dir.display().to_string());

        if self.params.equal_rates {
            args.push(OPT_EQUAL_RATES.to_string());
        }

        if self.params.is_time_scaled {
            args.push(OPT_TIMETREE.to_string());
        }

        args
    }

    /// Path of the compiled dataset descriptor in the work directory.
    fn dataset_descriptor(&self) -> PathBuf {
        self.work_dir.join(DATASET_DESCRIPTOR_NAME)
    }

    /// The staged input directory.
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fasta_params() -> JobParams {
        JobParams {
            output_path: "/user@bvbrc/home".to_string(),
            output_file: "run1".to_string(),
            input_source: InputSource::FastaData,
            input_fasta_data: Some(">s|HA|\nACGT\n".to_string()),
            prepare_dataset: true,
            ..JobParams::default()
        }
    }

    fn make_runner(params: JobParams) -> (tempfile::TempDir, TreeSortRunner) {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input");
        let stage = dir.path().join("stage");
        let work = dir.path().join("work");
        for d in [&input, &stage, &work] {
            fs::create_dir_all(d).unwrap();
        }

        let runner = TreeSortRunner::new(params, &input, &stage, &work).unwrap();
        (dir, runner)
    }

    #[cfg(unix)]
    fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/bash\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let params = JobParams::default();
        assert!(TreeSortRunner::new(params, "in", "stage", "work").is_err());
    }

    #[test]
    fn test_prepare_input_file_writes_inline_data() {
        let (_dir, runner) = make_runner(fasta_params());

        runner.prepare_input_file().unwrap();

        let content = fs::read_to_string(runner.input_dir().join(INPUT_FASTA_FILE_NAME)).unwrap();
        assert_eq!(content, ">s|HA|\nACGT\n");
    }

    #[test]
    fn test_new_rejects_blank_fasta_data() {
        let mut params = fasta_params();
        params.input_fasta_data = Some("   \n".to_string());

        assert!(TreeSortRunner::new(params, "in", "stage", "work").is_err());
    }

    #[test]
    fn test_prepare_dataset_args_default() {
        let (_dir, runner) = make_runner(fasta_params());
        let args = runner.prepare_dataset_args();

        assert_eq!(args.len(), 3);
        assert!(args[0].ends_with(INPUT_FASTA_FILE_NAME));
        assert_eq!(args[1], "HA");
    }

    #[test]
    fn test_prepare_dataset_args_with_fast_tree_and_segments() {
        let mut params = fasta_params();
        params.ref_tree_inference = TreeInference::FastTree;
        params.segments = Some("HA,NA".to_string());
        params.ref_segment = "NA".to_string();

        let (_dir, runner) = make_runner(params);
        let args = runner.prepare_dataset_args();

        assert_eq!(args[0], "--fast");
        assert_eq!(args[1], "--segments");
        assert_eq!(args[2], "HA,NA");
        assert!(args[3].ends_with(INPUT_FASTA_FILE_NAME));
        assert_eq!(args[4], "NA");
    }

    #[test]
    fn test_treesort_args_minimal() {
        let (_dir, runner) = make_runner(fasta_params());
        let args = runner.treesort_args();

        assert_eq!(args[0], "-i");
        assert!(args[1].ends_with(DATASET_DESCRIPTOR_NAME));
        assert_eq!(args[2], "-o");
        assert!(args[3].ends_with("stage"));
    }

    #[test]
    fn test_treesort_args_full() {
        let mut params = fasta_params();
        params.clades_path = Some("clades.tsv".to_string());
        params.match_on_epi = true;
        params.no_collapse = true;
        params.equal_rates = true;
        params.is_time_scaled = true;

        let (_dir, runner) = make_runner(params);
        let args = runner.treesort_args();

        assert_eq!(args[0], "--clades");
        assert_eq!(args[1], "clades.tsv");
        assert!(args.contains(&"--match-on-epi".to_string()));
        assert!(args.contains(&"--no-collapse".to_string()));
        assert!(args.contains(&"--equal-rates".to_string()));
        assert!(args.contains(&"--timetree".to_string()));
    }

    #[test]
    fn test_treesort_args_match_on_priority() {
        let mut params = fasta_params();
        params.match_on_strain = true;
        params.match_on_epi = true;
        params.match_on_regex = Some("(EPI\\d+)".to_string());

        let (_dir, runner) = make_runner(params);
        let args = runner.treesort_args();

        assert!(args.contains(&"--match-on-strain".to_string()));
        assert!(!args.contains(&"--match-on-epi".to_string()));
        assert!(!args.contains(&"--match-on-regex".to_string()));
    }

    #[test]
    fn test_treesort_args_match_on_regex() {
        let mut params = fasta_params();
        params.match_on_regex = Some("(EPI\\d+)".to_string());

        let (_dir, runner) = make_runner(params);
        let args = runner.treesort_args();

        let pos = args.iter().position(|a| a == "--match-on-regex").unwrap();
        assert_eq!(args[pos + 1], "(EPI\\d+)");
    }

    #[test]
    #[cfg(unix)]
    fn test_run_invokes_prepare_then_treesort() {
        let stub_dir = tempdir().unwrap();
        let prepare_record = stub_dir.path().join("prepare_argv");
        let treesort_record = stub_dir.path().join("treesort_argv");

        let prepare = write_stub(
            stub_dir.path(),
            "prepare",
            &format!("echo \"$@\" > {}", prepare_record.display()),
        );
        let treesort = write_stub(
            stub_dir.path(),
            "treesort",
            &format!("echo \"$@\" > {}", treesort_record.display()),
        );

        let (_dir, mut runner) = make_runner(fasta_params());
        runner.set_prepare_program(prepare.to_str().unwrap());
        runner.set_treesort_program(treesort.to_str().unwrap());

        runner.run().unwrap();

        let prepare_argv = fs::read_to_string(&prepare_record).unwrap();
        assert!(prepare_argv.contains(INPUT_FASTA_FILE_NAME));
        assert!(prepare_argv.contains("HA"));

        let treesort_argv = fs::read_to_string(&treesort_record).unwrap();
        assert!(treesort_argv.contains(DATASET_DESCRIPTOR_NAME));
    }

    #[test]
    #[cfg(unix)]
    fn test_run_fails_when_treesort_fails() {
        let stub_dir = tempdir().unwrap();

        let prepare = write_stub(stub_dir.path(), "prepare", "exit 0");
        let treesort = write_stub(stub_dir.path(), "treesort", "exit 2");

        let (_dir, mut runner) = make_runner(fasta_params());
        runner.set_prepare_program(prepare.to_str().unwrap());
        runner.set_treesort_program(treesort.to_str().unwrap());

        let err = runner.run().unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(2), .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_run_skips_preparation_for_prepared_files() {
        let stub_dir = tempdir().unwrap();
        let prepare_record = stub_dir.path().join("prepare_argv");

        let prepare = write_stub(
            stub_dir.path(),
            "prepare",
            &format!("touch {}", prepare_record.display()),
        );
        let treesort = write_stub(stub_dir.path(), "treesort", "exit 0");

        let mut params = fasta_params();
        params.prepare_dataset = false;
        params.input_source = InputSource::PreparedFiles;
        params.input_fasta_data = None;
        params.input_existing_directory = Some("/user@bvbrc/home/prepared".to_string());

        let (_dir, mut runner) = make_runner(params);
        runner.set_prepare_program(prepare.to_str().unwrap());
        runner.set_treesort_program(treesort.to_str().unwrap());

        runner.run().unwrap();
        assert!(!prepare_record.exists());
    }
}
