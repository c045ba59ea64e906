//! # constrain-img
//!
//! Batch-constrain a directory of images to a maximum bounding box. Every
//! `.jpg`, `.jpeg`, `.png` and `.gif` directly inside a source directory is
//! scaled down, aspect ratio preserved, and written to an output directory
//! in its original format.
//!
//! # Architecture: Prepare, Then Fan Out
//!
//! ```text
//! 1. Configure   flags + positionals + config file  →  BatchConfig
//! 2. Prepare     BatchConfig  →  Vec<ImageJob>      (scan, name, guard)
//! 3. Execute     jobs  →  BatchReport               (parallel, isolated)
//! ```
//!
//! Everything that can reject the whole batch happens in step 2, before any
//! image is read or written. Step 3 runs every job at once on rayon; one
//! corrupt file never stops the others.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered configuration: flags, positional shapes, TOML file, validation |
//! | [`scan`] | Lists candidate images in the source directory |
//! | [`naming`] | Derives output file names from prefix/suffix rules |
//! | [`imaging`] | The constraint policy, the backend trait, and the `image` crate backend |
//! | [`process`] | Batch orchestration: pre-flight guards, parallel jobs, the report |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Upscale
//!
//! An image that already fits its bounds is re-encoded at its own size.
//! The constraint only ever shrinks; see [`imaging::plan_constraint`].
//!
//! ## Format Pass-Through
//!
//! The output extension equals the input extension and the encoder is chosen
//! from it. There is no format conversion.
//!
//! ## Guard Before Work
//!
//! Writing a file over its own source is refused for the whole batch unless
//! `force` is set. Two sources that would land on the same target, or a
//! target that is another source of the same batch, are refused always.
//! These checks run before any job starts, so a refused batch leaves the
//! output directory untouched apart from creating it.
//!
//! # Library Use
//!
//! ```no_run
//! use constrain_img::{BatchConfig, Bounds, run_batch};
//!
//! let mut config = BatchConfig::new("assets/raw", "public/img");
//! config.bounds = Bounds::new(Some(1600), Some(1200));
//! let report = run_batch(&config, None)?;
//! println!("{} images written", report.exported.len());
//! # Ok::<(), constrain_img::BatchError>(())
//! ```

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;

pub use config::BatchConfig;
pub use imaging::{Bounds, Quality};
pub use naming::NamingRule;
pub use process::{BatchError, BatchEvent, BatchReport, run_batch, run_batch_with_backend};

#[cfg(test)]
pub(crate) mod test_helpers;
