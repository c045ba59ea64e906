//! CLI output formatting.
//!
//! # Output Format
//!
//! One line per settled image, in completion order, followed by a single
//! completion line:
//!
//! ```text
//! exported: /photos/web/dawn.jpg
//!     3000x2000 → 1200x800 (by width)
//! exported: /photos/web/icon.png
//!     64x64 (kept)
//! failed: /photos/broken.jpg
//!     Failed to read image size: Processing failed: ...
//! constrain-img complete! 2 exported, 1 failed
//! ```
//!
//! Batch-level errors get their own lines on stderr. The overwrite guard is
//! phrased in terms of the CLI flag rather than the library option.
//!
//! # Architecture
//!
//! Each piece of output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout or stderr.
//! Format functions are pure, no I/O.

use crate::imaging::{Dimensions, ResizeAction};
use crate::process::{BatchError, BatchEvent, BatchReport, ExportedImage};

/// Message shown when the overwrite guard trips in the CLI.
pub const CLI_OVERWRITE_MESSAGE: &str =
    "FAILED: Use the -f or --force flags to overwrite existing files.";

fn size(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

/// Describe what happened to one image's pixels.
///
/// ```text
/// 3000x2000 → 1200x800 (by width)
/// 64x64 (kept)
/// ```
fn action_line(image: &ExportedImage) -> String {
    let how = match image.action {
        ResizeAction::Keep => return format!("{} (kept)", size(image.original)),
        ResizeAction::ByWidth(_) => "by width",
        ResizeAction::ByHeight(_) => "by height",
    };
    format!("{} → {} ({})", size(image.original), size(image.output), how)
}

// ============================================================================
// Progress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Exported(image) => vec![
            format!("exported: {}", image.target.display()),
            format!("    {}", action_line(image)),
        ],
        BatchEvent::Failed { source, message } => vec![
            format!("failed: {}", source.display()),
            format!("    {}", message),
        ],
    }
}

// ============================================================================
// Completion
// ============================================================================

/// The final line of a batch run.
pub fn format_completion(report: &BatchReport) -> String {
    if report.failures.is_empty() {
        format!("constrain-img complete! {} exported", report.exported.len())
    } else {
        format!(
            "constrain-img complete! {} exported, {} failed",
            report.exported.len(),
            report.failures.len()
        )
    }
}

pub fn print_completion(report: &BatchReport) {
    println!("{}", format_completion(report));
}

// ============================================================================
// Errors
// ============================================================================

/// Format a batch error for the terminal.
///
/// Job failures are listed one per line under the summary so they survive
/// `--quiet`, which suppresses progress lines.
pub fn format_batch_error(error: &BatchError) -> Vec<String> {
    match error {
        BatchError::OverwriteGuard { file } => vec![
            CLI_OVERWRITE_MESSAGE.to_string(),
            format!("    {}", file.display()),
        ],
        BatchError::JobsFailed(report) => {
            let mut lines = vec![format!("FAILED: {}", error)];
            for failure in &report.failures {
                lines.push(format!(
                    "    {}: {}",
                    failure.source.display(),
                    failure.error
                ));
            }
            lines
        }
        other => vec![format!("FAILED: {}", other)],
    }
}

pub fn print_batch_error(error: &BatchError) {
    for line in format_batch_error(error) {
        eprintln!("{}", line);
    }
}
