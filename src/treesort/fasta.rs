//! FASTA Input Handling
//!
//! Influenza submissions arrive as one multi-segment FASTA whose headers
//! carry the segment name between pipes (`>A/swine/IA/2019|HA|...`). The
//! analysis runner splits that file into one FASTA per segment for the
//! dataset preparation script, cleaning up headers on the way: characters
//! that break downstream tree tools are removed and spaces become
//! underscores.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::job::params::VALID_SEGMENTS;

/// Name of the staged input FASTA file.
pub const INPUT_FASTA_FILE_NAME: &str = "input.fasta";

/// Characters stripped from FASTA headers.
///
/// Segment tokens are read from the raw header before the pipes are
/// stripped.
const INVALID_HEADER_CHARS: &[char] = &['[', ']', '\'', '"', '(', ')', ',', ';', '|', ':'];

/// Removes invalid characters from a header line and replaces spaces with
/// underscores.
pub fn sanitize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !INVALID_HEADER_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Finds the segment name in a FASTA header, matching `|SEG|` tokens
/// case-insensitively.
pub fn segment_from_header(header: &str) -> Option<&'static str> {
    let upper = header.to_ascii_uppercase();
    VALID_SEGMENTS
        .iter()
        .find(|segment| upper.contains(&format!("|{}|", segment)))
        .copied()
}

/// Splits a multi-segment FASTA into one file per segment.
///
/// Each output file is named `{SEG}-input.fasta` in `work_dir` and gets
/// sanitized headers. Sequences whose header names no recognized segment
/// are dropped.
///
/// # Returns
///
/// The segment names encountered, in first-seen order.
pub fn split_by_segment(input: &Path, work_dir: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(input)?;

    let mut segments: Vec<String> = Vec::new();
    let mut fasta_by_segment: Vec<(String, String)> = Vec::new();
    let mut current_segment: Option<&'static str> = None;

    for line in content.lines() {
        let line = if line.starts_with('>') {
            current_segment = segment_from_header(line);

            if let Some(segment) = current_segment {
                if !segments.iter().any(|s| s == segment) {
                    segments.push(segment.to_string());
                    fasta_by_segment.push((segment.to_string(), String::new()));
                    debug!("Found segment {} in the input", segment);
                }
            }

            format!(">{}", sanitize_header(line.trim_start_matches('>')))
        } else {
            line.to_string()
        };

        let Some(segment) = current_segment else {
            continue;
        };

        if let Some((_, fasta)) = fasta_by_segment.iter_mut().find(|(s, _)| s == segment) {
            fasta.push_str(&line);
            fasta.push('\n');
        }
    }

    for (segment, fasta) in &fasta_by_segment {
        let path = segment_file_path(work_dir, segment);
        let mut file = fs::File::create(&path)?;
        file.write_all(fasta.as_bytes())?;
        debug!("Wrote {}", path.display());
    }

    info!(
        "Split {} into {} segment file(s): {}",
        input.display(),
        segments.len(),
        segments.join(",")
    );

    Ok(segments)
}

/// Path of the per-segment FASTA file written by the splitter.
pub fn segment_file_path(work_dir: &Path, segment: &str) -> PathBuf {
    work_dir.join(format!("{}-{}", segment, INPUT_FASTA_FILE_NAME))
}

/// Checks that a staged FASTA file exists and has content.
pub fn check_fasta_file(path: &Path) -> Result<()> {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(Error::EmptyFasta(path.to_path_buf()));
    }
    Ok(())
}
