//! Batch orchestration.
//!
//! Turns a [`BatchConfig`] into one [`ImageJob`] per candidate image, checks
//! the whole batch before touching any pixels, then runs every job in
//! parallel and collects the outcomes.
//!
//! ## Phases
//!
//! ```text
//! 1. Prepare   ensure out dir → list source dir → name targets → guards
//! 2. Execute   per job: identify → plan → export      (rayon, all at once)
//! 3. Report    BatchReport in candidate order, Err if any job failed
//! ```
//!
//! Preparation failures abort the batch before anything is written. Job
//! failures are isolated: a corrupt image is recorded and its siblings carry
//! on. The batch counts as done only when every job has settled.
//!
//! ## Progress
//!
//! Each settled job sends a [`BatchEvent`] on the optional channel, in
//! completion order. The returned report is always in candidate order.

use crate::config::BatchConfig;
use crate::imaging::{
    BackendError, Bounds, Dimensions, ImageBackend, Quality, ResizeAction, RustBackend,
    get_dimensions, plan_export,
};
use crate::naming;
use crate::scan::{self, ScanError};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Failure of a single image. Never aborts sibling jobs.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read image size: {0}")]
    SizeQuery(#[source] BackendError),
    #[error("Failed to write image: {0}")]
    Write(#[source] BackendError),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot create output directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot read source directory {}: {source}", .path.display())]
    SourceList { path: PathBuf, source: ScanError },
    #[error(
        "Set the \"force\" option to true to overwrite existing files ({})",
        .file.display()
    )]
    OverwriteGuard { file: PathBuf },
    #[error(
        "{} would be written over {}, which is itself being processed",
        .writer.display(),
        .target.display()
    )]
    TargetIsSource { target: PathBuf, writer: PathBuf },
    #[error(
        "{} and {} would both be written to {}",
        .first.display(),
        .second.display(),
        .target.display()
    )]
    DuplicateTarget {
        target: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("{} of {} images failed", .0.failures.len(), .0.total())]
    JobsFailed(BatchReport),
}

/// One unit of work: constrain `source` and write it to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJob {
    pub source: PathBuf,
    pub target: PathBuf,
    pub bounds: Bounds,
    pub quality: Quality,
}

/// A successfully written image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedImage {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Size of the source image.
    pub original: Dimensions,
    /// Size actually written.
    pub output: Dimensions,
    pub action: ResizeAction,
}

/// A job that failed, with the reason.
#[derive(Debug, Serialize)]
pub struct JobFailure {
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(serialize_with = "serialize_display")]
    pub error: JobError,
}

fn serialize_display<S: Serializer>(error: &JobError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Aggregate outcome of a batch, in candidate (file name) order.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub exported: Vec<ExportedImage>,
    pub failures: Vec<JobFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.exported.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok` when every job succeeded, otherwise [`BatchError::JobsFailed`].
    pub fn into_result(self) -> Result<BatchReport, BatchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BatchError::JobsFailed(self))
        }
    }
}

/// Progress notification for one settled job.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Exported(ExportedImage),
    Failed {
        source: PathBuf,
        message: String,
    },
}

impl BatchEvent {
    fn from_outcome(outcome: &Result<ExportedImage, JobFailure>) -> Self {
        match outcome {
            Ok(image) => BatchEvent::Exported(image.clone()),
            Err(failure) => BatchEvent::Failed {
                source: failure.source.clone(),
                message: failure.error.to_string(),
            },
        }
    }
}

/// Run a batch with the production [`RustBackend`].
pub fn run_batch(
    config: &BatchConfig,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    run_batch_with_backend(&RustBackend::new(), config, events)
}

/// Run a batch using a specific backend (allows testing with mock).
pub fn run_batch_with_backend(
    backend: &impl ImageBackend,
    config: &BatchConfig,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let jobs = prepare_jobs(config)?;
    tracing::info!("Constraining {} images", jobs.len());
    execute_jobs(backend, &jobs, events).into_result()
}

/// Build and validate every job without reading any image.
///
/// Creates the output directory (the only side effect), lists the source
/// directory, names every target and runs the batch-wide guards.
pub fn prepare_jobs(config: &BatchConfig) -> Result<Vec<ImageJob>, BatchError> {
    let directory_error = |source| BatchError::Directory {
        path: config.out_dir.clone(),
        source,
    };
    fs::create_dir_all(&config.out_dir).map_err(directory_error)?;
    let out_dir = fs::canonicalize(&config.out_dir).map_err(directory_error)?;

    let source_error = |source| BatchError::SourceList {
        path: config.source_dir.clone(),
        source,
    };
    let source_dir =
        fs::canonicalize(&config.source_dir).map_err(|e| source_error(ScanError::Io(e)))?;
    let candidates = scan::scan(&source_dir).map_err(source_error)?;

    if config.bounds.is_unbounded() {
        tracing::warn!("No width or height given; images will only be re-encoded");
    }
    if config.force && config.naming.is_identity() && source_dir == out_dir {
        tracing::warn!("Overwriting source images in {}", source_dir.display());
    }

    let jobs: Vec<ImageJob> = candidates
        .into_iter()
        .map(|candidate| ImageJob {
            target: naming::target_path(&candidate.file_name, &config.naming, &out_dir),
            source: candidate.path,
            bounds: config.bounds,
            quality: config.quality,
        })
        .collect();

    check_overwrite(&jobs, config.force)?;
    check_unique_targets(&jobs)?;
    Ok(jobs)
}

/// Refuse any job whose target is a source image of this batch.
///
/// A job overwriting its own source needs `force`. A job overwriting some
/// other job's source is refused even when forced: that source may still be
/// being read.
fn check_overwrite(jobs: &[ImageJob], force: bool) -> Result<(), BatchError> {
    let sources: HashSet<&Path> = jobs.iter().map(|job| job.source.as_path()).collect();

    for job in jobs.iter().filter(|job| sources.contains(job.target.as_path())) {
        if job.target != job.source {
            return Err(BatchError::TargetIsSource {
                target: job.target.clone(),
                writer: job.source.clone(),
            });
        }
        if !force {
            return Err(BatchError::OverwriteGuard {
                file: job.target.clone(),
            });
        }
    }
    Ok(())
}

/// Refuse two jobs writing the same file, which would race.
fn check_unique_targets(jobs: &[ImageJob]) -> Result<(), BatchError> {
    let mut seen: HashMap<&Path, &Path> = HashMap::with_capacity(jobs.len());
    for job in jobs {
        if let Some(first) = seen.insert(&job.target, &job.source) {
            return Err(BatchError::DuplicateTarget {
                target: job.target.clone(),
                first: first.to_path_buf(),
                second: job.source.clone(),
            });
        }
    }
    Ok(())
}

/// Run every job in parallel and wait for all of them to settle.
pub fn execute_jobs(
    backend: &impl ImageBackend,
    jobs: &[ImageJob],
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    let outcomes: Vec<Result<ExportedImage, JobFailure>> = jobs
        .par_iter()
        .map_with(events, |events, job| {
            let outcome = run_job(backend, job);
            if let Some(tx) = events {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(BatchEvent::from_outcome(&outcome));
            }
            outcome
        })
        .collect();

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(image) => report.exported.push(image),
            Err(failure) => report.failures.push(failure),
        }
    }
    report
}

fn run_job(backend: &impl ImageBackend, job: &ImageJob) -> Result<ExportedImage, JobFailure> {
    let fail = |error| JobFailure {
        source: job.source.clone(),
        target: job.target.clone(),
        error,
    };

    let original = get_dimensions(backend, &job.source).map_err(|e| {
        tracing::warn!("Cannot measure {}: {}", job.source.display(), e);
        fail(JobError::SizeQuery(e))
    })?;

    let (action, params) = plan_export(&job.source, &job.target, original, job.bounds, job.quality);
    tracing::debug!(
        "{} {}x{} → {:?}",
        job.source.display(),
        original.width,
        original.height,
        action
    );

    backend.export(&params).map_err(|e| {
        tracing::warn!("Cannot write {}: {}", job.target.display(), e);
        fail(JobError::Write(e))
    })?;

    Ok(ExportedImage {
        source: job.source.clone(),
        target: job.target.clone(),
        original,
        output: action.output_dimensions(original),
        action,
    })
}
