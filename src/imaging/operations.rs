//! High-level image operations.
//!
//! These functions combine the constraint calculation with backend
//! execution. Measuring and exporting stay separate calls so the caller can
//! tell a size-query failure from a write failure.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{ResizeAction, plan_constraint};
use super::params::{Bounds, ExportParams, Quality};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions> {
    backend.identify(path)
}

/// Plan an export without executing it.
///
/// Returns the chosen action together with the backend parameters that
/// carry it out.
pub fn plan_export(
    source: &Path,
    output: &Path,
    intrinsic: Dimensions,
    bounds: Bounds,
    quality: Quality,
) -> (ResizeAction, ExportParams) {
    let action = plan_constraint(intrinsic, bounds);
    let params = ExportParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        resize: action.resize_to(),
        quality,
    };
    (action, params)
}

/// Measure, plan and export one image in a single call.
///
/// Convenience for callers that do not need to distinguish failure stages.
pub fn constrain_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    bounds: Bounds,
    quality: Quality,
) -> Result<ResizeAction> {
    let intrinsic = get_dimensions(backend, source)?;
    let (action, params) = plan_export(source, output, intrinsic, bounds, quality);
    backend.export(&params)?;
    Ok(action)
}
