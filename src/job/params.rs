//! Job Parameters
//!
//! The typed parameter record for a TreeSort job. Parameters arrive as a
//! JSON job file, are validated once at the boundary, and are then written
//! back out verbatim as the `jobdesc.json` descriptor consumed by the
//! analysis runner.
//!
//! # Example Job File
//!
//! ```json
//! {
//!   "output_path": "/user@bvbrc/home/TreeSort",
//!   "output_file": "h3n2_run1",
//!   "input_source": "fasta_data",
//!   "input_fasta_data": ">A/swine/IA/2019|HA|\nACGT...",
//!   "prepare_dataset": true,
//!   "ref_segment": "HA",
//!   "segments": "HA,NA"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the descriptor file written into the job's temporary root.
pub const DESCRIPTOR_FILE_NAME: &str = "jobdesc.json";

/// Reference segment used when the job does not name one.
pub const DEFAULT_REF_SEGMENT: &str = "HA";

/// Genome segments recognized for influenza input.
pub const VALID_SEGMENTS: &[&str] = &["PB2", "PB1", "PA", "HA", "NP", "NA", "MP", "NS"];

/// Significance cutoff used when the job does not set one.
pub const DEFAULT_P_VALUE: f64 = 0.001;

/// Clock deviation allowance used when the job does not set one.
pub const DEFAULT_DEVIATION: f64 = 2.0;

/// Where the input FASTA comes from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// FASTA content pasted directly into the job submission
    #[serde(rename = "fasta_data")]
    FastaData,
    /// Workspace id of a FASTA file to fetch
    #[serde(rename = "fasta_file_id")]
    FastaFileId,
    /// Workspace directory of previously prepared alignments and trees
    #[serde(rename = "prepared_files")]
    PreparedFiles,
}

impl Default for InputSource {
    fn default() -> Self {
        InputSource::FastaData
    }
}

/// Reassortment inference method passed through to TreeSort.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "mincut")]
    MinCut,
}

impl Default for Method {
    fn default() -> Self {
        Method::Local
    }
}

/// Program used to infer the per-segment reference trees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeInference {
    #[serde(rename = "FastTree")]
    FastTree,
    #[serde(rename = "IQ-Tree")]
    IqTree,
}

impl Default for TreeInference {
    fn default() -> Self {
        TreeInference::IqTree
    }
}

/// The full parameter set for one TreeSort job.
///
/// Every field is optional in the job file; missing fields take the
/// defaults below. [`JobParams::validate`] must run once after loading,
/// before anything else looks at the values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct JobParams {
    /// Workspace folder that will receive the result files
    pub output_path: String,

    /// Basename for the result folder (a dot-prefixed subfolder of
    /// `output_path` per platform convention)
    pub output_file: String,

    /// How the input FASTA is provided
    pub input_source: InputSource,

    /// Inline FASTA content (input_source = fasta_data)
    pub input_fasta_data: Option<String>,

    /// Workspace id of the FASTA file (input_source = fasta_file_id)
    pub input_fasta_file_id: Option<String>,

    /// Workspace directory of prepared files (input_source = prepared_files)
    pub input_existing_directory: Option<String>,

    /// Build alignments and trees before running TreeSort
    pub prepare_dataset: bool,

    /// Reference segment whose topology is tested against the others
    pub ref_segment: String,

    /// Comma-separated list of challenge segments (all found if empty)
    pub segments: Option<String>,

    /// Tree inference program for dataset preparation
    pub ref_tree_inference: TreeInference,

    /// Reassortment inference method
    pub method: Method,

    /// Optional path for the clades output file
    pub clades_path: Option<String>,

    /// Match segments by strain name
    pub match_on_strain: bool,

    /// Match segments by EPI_ISL id
    pub match_on_epi: bool,

    /// Match segments by a custom regular expression
    pub match_on_regex: Option<String>,

    /// Keep near-zero branches instead of collapsing them
    pub no_collapse: bool,

    /// Assume equal substitution rates across segments
    pub equal_rates: bool,

    /// Input trees are time-scaled (timetree)
    pub is_time_scaled: bool,

    /// Significance cutoff for the reassortment test
    pub p_value: f64,

    /// Allowed molecular clock deviation
    pub deviation: f64,
}

impl Default for JobParams {
    fn default() -> Self {
        Self {
            output_path: String::new(),
            output_file: String::new(),
            input_source: InputSource::default(),
            input_fasta_data: None,
            input_fasta_file_id: None,
            input_existing_directory: None,
            prepare_dataset: false,
            ref_segment: String::new(),
            segments: None,
            ref_tree_inference: TreeInference::default(),
            method: Method::default(),
            clades_path: None,
            match_on_strain: false,
            match_on_epi: false,
            match_on_regex: None,
            no_collapse: false,
            equal_rates: false,
            is_time_scaled: false,
            p_value: DEFAULT_P_VALUE,
            deviation: DEFAULT_DEVIATION,
        }
    }
}

impl JobParams {
    /// Validates the parameters and fills in defaults.
    ///
    /// This mirrors the platform's submission checks: the output path must
    /// be present, segment names must be known, and the input source must
    /// be consistent with the fields that accompany it. Workspace ids may
    /// carry a `ws:` prefix, which is stripped here so downstream code
    /// never sees it.
    pub fn validate(&mut self) -> Result<()> {
        if self.output_path.trim().is_empty() {
            return Err(Error::InvalidParams("the output path is empty".to_string()));
        }

        // Reference segment defaults to HA when not named.
        let ref_segment = self.ref_segment.trim().to_string();
        if ref_segment.is_empty() {
            self.ref_segment = DEFAULT_REF_SEGMENT.to_string();
        } else if !VALID_SEGMENTS.contains(&ref_segment.as_str()) {
            return Err(Error::InvalidParams(format!(
                "invalid reference segment: {}",
                ref_segment
            )));
        } else {
            self.ref_segment = ref_segment;
        }

        if let Some(segments) = &self.segments {
            for segment in segments.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                if !VALID_SEGMENTS.contains(&segment) {
                    return Err(Error::InvalidParams(format!("invalid segment: {}", segment)));
                }
            }
        }

        if self.prepare_dataset {
            match self.input_source {
                InputSource::FastaData => {
                    if self
                        .input_fasta_data
                        .as_deref()
                        .map_or(true, |data| data.trim().is_empty())
                    {
                        return Err(Error::InvalidParams(
                            "input_source is fasta_data but no FASTA data was provided"
                                .to_string(),
                        ));
                    }
                }
                InputSource::FastaFileId => {
                    let id = self
                        .input_fasta_file_id
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or("");
                    if id.is_empty() {
                        return Err(Error::InvalidParams(
                            "input_source is fasta_file_id but no file id was provided"
                                .to_string(),
                        ));
                    }
                    self.input_fasta_file_id = Some(strip_ws_prefix(id).to_string());
                }
                InputSource::PreparedFiles => {
                    return Err(Error::InvalidParams(
                        "prepared_files cannot be combined with dataset preparation"
                            .to_string(),
                    ));
                }
            }
        } else {
            if self.input_source != InputSource::PreparedFiles {
                return Err(Error::InvalidParams(
                    "a prepared_files input is required when dataset preparation is off"
                        .to_string(),
                ));
            }
            let dir = self
                .input_existing_directory
                .as_deref()
                .map(str::trim)
                .unwrap_or("");
            if dir.is_empty() {
                return Err(Error::InvalidParams(
                    "an existing directory of prepared files is required".to_string(),
                ));
            }
            self.input_existing_directory = Some(strip_ws_prefix(dir).to_string());
        }

        Ok(())
    }

    /// Returns the raw workspace folder that should receive the results.
    ///
    /// The platform convention is a dot-prefixed subfolder of the output
    /// path. With an empty `output_file` this yields a trailing `/.`,
    /// which the publisher normalizes away before use.
    pub fn result_folder(&self) -> String {
        format!(
            "{}/.{}",
            self.output_path.trim_end_matches('/'),
            self.output_file
        )
    }

    /// Serializes a snapshot of the parameters as `jobdesc.json` in `dir`.
    ///
    /// The descriptor is a pretty-printed mirror of the parameters with no
    /// transformation, so parsing it back yields a deep-equal record.
    pub fn write_descriptor(&self, dir: &Path) -> Result<PathBuf> {
        let snapshot = self.clone();
        let path = dir.join(DESCRIPTOR_FILE_NAME);
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, json)?;

        info!("Wrote job descriptor: {}", path.display());
        Ok(path)
    }
}

/// Loads and validates job parameters from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the job file
///
/// # Returns
///
/// * `Ok(JobParams)` - Parsed and validated parameters
/// * `Err` - Read, parse, or validation error
pub fn load_params(path: &str) -> Result<JobParams> {
    info!("Loading job file: {}", path);

    let content = fs::read_to_string(path).map_err(|e| Error::JobFile {
        path: path.to_string(),
        source: e,
    })?;

    debug!("Job file loaded ({} bytes)", content.len());

    let mut params: JobParams = serde_json::from_str(&content)?;
    params.validate()?;

    Ok(params)
}

/// Strips a leading `ws:` from a workspace id.
fn strip_ws_prefix(id: &str) -> &str {
    id.strip_prefix("ws:").unwrap_or(id)
}
