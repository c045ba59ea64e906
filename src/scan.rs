//! Source directory scanning.
//!
//! Lists the immediate children of the source directory and keeps the
//! regular files whose names look like images. Subdirectories are never
//! descended into.
//!
//! ## Matching
//!
//! File names are matched against `*.{jpg,jpeg,png,gif}` with a
//! case-insensitive glob, so `DSC_001.JPG` is picked up. Anything else is
//! skipped silently.

use crate::imaging::SUPPORTED_EXTENSIONS;
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid image pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// A source image discovered in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Bare file name, e.g. `dawn.jpg`.
    pub file_name: String,
    /// `source_dir` joined with the file name.
    pub path: PathBuf,
}

/// Glob matching every supported image extension, case-insensitively.
pub fn image_matcher() -> Result<GlobMatcher, ScanError> {
    let pattern = format!("*.{{{}}}", SUPPORTED_EXTENSIONS.join(","));
    let glob = GlobBuilder::new(&pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Whether a bare file name is a candidate image.
pub fn is_image_name(matcher: &GlobMatcher, file_name: &str) -> bool {
    matcher.is_match(file_name)
}

/// List candidate images directly inside `source_dir`, sorted by file name.
///
/// Non-UTF-8 names and non-files are skipped along with non-images.
pub fn scan(source_dir: &Path) -> Result<Vec<Candidate>, ScanError> {
    let matcher = image_matcher()?;
    let mut candidates = Vec::new();

    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!("Skipping non-UTF-8 name: {:?}", entry.file_name());
            continue;
        };
        if !is_image_name(&matcher, &file_name) {
            tracing::debug!("Skipping non-image: {}", file_name);
            continue;
        }
        // Follows symlinks, so a link to an image counts as an image.
        let path = entry.path();
        if !path.is_file() {
            tracing::debug!("Skipping non-file: {}", file_name);
            continue;
        }
        candidates.push(Candidate { file_name, path });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}
