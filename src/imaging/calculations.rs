//! Pure calculation functions for the bounding-box constraint.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::Bounds;
use serde::Serialize;

/// What to do with one image to make it fit its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResizeAction {
    /// Already fits (or would come out the same size): re-encode only.
    Keep,
    /// Width pinned to the bound, height derived from the aspect ratio.
    ByWidth(Dimensions),
    /// Height pinned to the bound, width derived from the aspect ratio.
    ByHeight(Dimensions),
}

impl ResizeAction {
    /// Size of the written image.
    pub fn output_dimensions(self, intrinsic: Dimensions) -> Dimensions {
        match self {
            ResizeAction::Keep => intrinsic,
            ResizeAction::ByWidth(dims) | ResizeAction::ByHeight(dims) => dims,
        }
    }

    /// Target size for the backend, `None` when no resampling is needed.
    pub fn resize_to(self) -> Option<Dimensions> {
        match self {
            ResizeAction::Keep => None,
            ResizeAction::ByWidth(dims) | ResizeAction::ByHeight(dims) => Some(dims),
        }
    }
}

/// Decide how an image of `intrinsic` size fits inside `bounds`.
///
/// Images strictly smaller than the box on both axes are never upscaled.
/// Otherwise exactly one axis drives the resize: width when the source is
/// at least as wide (proportionally) as the box, height when it is taller.
/// An open bound axis takes the image's own value, so it never constrains.
///
/// # Examples
/// ```
/// # use constrain_img::imaging::{Bounds, Dimensions, ResizeAction, plan_constraint};
/// // 2000x1000 into 800x800 → width drives: 800x400
/// let dims = Dimensions { width: 2000, height: 1000 };
/// let action = plan_constraint(dims, Bounds::new(Some(800), Some(800)));
/// assert_eq!(action, ResizeAction::ByWidth(Dimensions { width: 800, height: 400 }));
/// ```
pub fn plan_constraint(intrinsic: Dimensions, bounds: Bounds) -> ResizeAction {
    let bound = bounds.resolve(intrinsic);

    if intrinsic.width < bound.width && intrinsic.height < bound.height {
        return ResizeAction::Keep;
    }

    let source_ar = intrinsic.width as f64 / intrinsic.height as f64;
    let bound_ar = bound.width as f64 / bound.height as f64;

    let action = if source_ar >= bound_ar {
        let height = scale(intrinsic.height, bound.width, intrinsic.width);
        ResizeAction::ByWidth(Dimensions {
            width: bound.width,
            height,
        })
    } else {
        let width = scale(intrinsic.width, bound.height, intrinsic.height);
        ResizeAction::ByHeight(Dimensions {
            width,
            height: bound.height,
        })
    };

    if action.output_dimensions(intrinsic) == intrinsic {
        ResizeAction::Keep
    } else {
        action
    }
}

/// `value * numerator / denominator`, rounded, never below one pixel.
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (value as f64 * numerator as f64 / denominator as f64).round();
    (scaled as u32).max(1)
}
