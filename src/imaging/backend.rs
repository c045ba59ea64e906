//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only way the rest of the crate touches
//! pixels: measure an image, and export it (optionally resized) at a given
//! quality. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate; tests use the recording mock below.

use super::params::ExportParams;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` because jobs call into one shared backend from rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where the format allows it.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the source, resize if asked, encode at the given quality and
    /// write to the output path.
    fn export(&self, params: &ExportParams) -> Result<(), BackendError>;
}
