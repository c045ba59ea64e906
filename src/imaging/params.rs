//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the orchestrator (which decides what each output should look like) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can stand in during tests without touching the planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: Encoding quality (1–100, default 100). Clamped on construction.
//! - [`Bounds`]: The bounding box an image must fit inside; either axis may be open.
//! - [`ExportParams`]: Full specification for one output: source, target, optional resize, quality.

use super::backend::Dimensions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for encoding (1-100).
///
/// Only lossy encoders honour it directly; PNG maps it onto a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Maximum output size. `None` on an axis means "whatever the image already is".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl Bounds {
    pub fn new(max_width: Option<u32>, max_height: Option<u32>) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Fill open axes from the image's own size.
    pub fn resolve(self, intrinsic: Dimensions) -> Dimensions {
        Dimensions {
            width: self.max_width.unwrap_or(intrinsic.width),
            height: self.max_height.unwrap_or(intrinsic.height),
        }
    }

    pub fn is_unbounded(self) -> bool {
        self.max_width.is_none() && self.max_height.is_none()
    }
}

/// Parameters for writing one output image.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Exact output size, or `None` to re-encode at the original size.
    pub resize: Option<Dimensions>,
    pub quality: Quality,
}
