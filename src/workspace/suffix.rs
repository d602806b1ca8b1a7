//! Suffix-to-Type Mapping
//!
//! TreeSort emits its results as plain files in the staging directory. The
//! workspace tags uploads with a content type, and the copy utility learns
//! the tags through `--map-suffix EXT=TYPE` arguments. Files with suffixes
//! outside this table are still uploaded, just untyped.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// File suffixes produced by TreeSort and the workspace types they map to.
pub const SUFFIX_TYPES: &[(&str, &str)] = &[
    ("aln", "aligned_dna_fasta"),
    ("csv", "csv"),
    ("pdf", "pdf"),
    ("tre", "nwk"),
    ("tsv", "tsv"),
];

static SUFFIX_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SUFFIX_TYPES.iter().copied().collect());

/// Looks up the workspace type for a file suffix.
pub fn type_for_suffix(suffix: &str) -> Option<&'static str> {
    SUFFIX_MAP.get(suffix).copied()
}

/// Builds the `--map-suffix` argument pairs for the copy utility, one per
/// table entry.
pub fn map_suffix_args() -> Vec<String> {
    let mut args = Vec::with_capacity(SUFFIX_TYPES.len() * 2);
    for (suffix, ws_type) in SUFFIX_TYPES {
        args.push("--map-suffix".to_string());
        args.push(format!("{}={}", suffix, ws_type));
    }
    args
}
