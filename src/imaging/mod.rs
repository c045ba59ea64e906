//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | Lanczos3, exact planned size |
//! | **Encode** | JPEG / PNG / GIF, chosen by output extension |
//!
//! The module is split into:
//! - **Calculations**: The bounding-box constraint policy (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{ResizeAction, plan_constraint};
pub use operations::{constrain_image, get_dimensions, plan_export};
pub use params::{Bounds, ExportParams, Quality};
pub use rust_backend::{RustBackend, SUPPORTED_EXTENSIONS};
