//! Batch configuration.
//!
//! A run is described by one immutable [`BatchConfig`]. It is assembled from
//! up to three sparse [`ConfigLayer`]s, highest precedence first:
//!
//! 1. Named CLI flags (`--width`, `--source`, ...)
//! 2. Positional CLI arguments, interpreted by count (see [`PositionalArgs`])
//! 3. An optional TOML config file (`--config`)
//!
//! Anything still unset falls back to the defaults: current directory for
//! source and output, quality 100, `force` and `quiet` off, no bounds.
//!
//! ## Config File
//!
//! ```toml
//! # All keys are optional
//! source = "assets/raw"
//! out = "public/img"
//! width = 1600
//! height = 1200
//! quality = 85       # 1-100
//! prefix = "web_"
//! suffix = "@1x"
//! force = false
//! quiet = false
//! jobs = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Bounds, Quality};
use crate::naming::NamingRule;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// One sparse source of configuration values.
///
/// The same shape serves the config file, the positional arguments and the
/// named flags; [`ConfigLayer::merge`] stacks them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub source: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub force: Option<bool>,
    pub quiet: Option<bool>,
    pub jobs: Option<usize>,
}

impl ConfigLayer {
    /// Stack `overlay` on top of `self`: every value set in `overlay` wins.
    pub fn merge(self, overlay: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            source: overlay.source.or(self.source),
            out: overlay.out.or(self.out),
            width: overlay.width.or(self.width),
            height: overlay.height.or(self.height),
            quality: overlay.quality.or(self.quality),
            prefix: overlay.prefix.or(self.prefix),
            suffix: overlay.suffix.or(self.suffix),
            force: overlay.force.or(self.force),
            quiet: overlay.quiet.or(self.quiet),
            jobs: overlay.jobs.or(self.jobs),
        }
    }

    /// Fill defaults and validate.
    ///
    /// `cwd` stands in for an unset source or output directory.
    pub fn into_config(self, cwd: &Path) -> Result<BatchConfig, ConfigError> {
        let config = BatchConfig {
            source_dir: self.source.unwrap_or_else(|| cwd.to_path_buf()),
            out_dir: self.out.unwrap_or_else(|| cwd.to_path_buf()),
            bounds: Bounds::new(self.width, self.height),
            quality: match self.quality {
                Some(q) => {
                    validate_quality(q)?;
                    Quality::new(q)
                }
                None => Quality::default(),
            },
            naming: NamingRule::new(self.prefix, self.suffix),
            force: self.force.unwrap_or(false),
            quiet: self.quiet.unwrap_or(false),
            jobs: self.jobs,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Positional arguments, interpreted by how many were given.
///
/// Kept for compatibility with the older calling conventions:
///
/// | Count | Meaning |
/// |---|---|
/// | 0 | nothing |
/// | 1 | `width` |
/// | 2 | `width height` |
/// | 3–4 | `source out width [height]` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionalArgs {
    None,
    Width {
        width: u32,
    },
    WidthHeight {
        width: u32,
        height: u32,
    },
    Full {
        source: PathBuf,
        out: PathBuf,
        width: u32,
        height: Option<u32>,
    },
}

impl PositionalArgs {
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        match args {
            [] => Ok(PositionalArgs::None),
            [width] => Ok(PositionalArgs::Width {
                width: parse_dimension("width", width)?,
            }),
            [width, height] => Ok(PositionalArgs::WidthHeight {
                width: parse_dimension("width", width)?,
                height: parse_dimension("height", height)?,
            }),
            [source, out, width, rest @ ..] if rest.len() <= 1 => Ok(PositionalArgs::Full {
                source: PathBuf::from(source),
                out: PathBuf::from(out),
                width: parse_dimension("width", width)?,
                height: rest
                    .first()
                    .map(|h| parse_dimension("height", h))
                    .transpose()?,
            }),
            _ => Err(ConfigError::Validation(format!(
                "expected at most 4 positional arguments ([source] [out] [width] [height]), got {}",
                args.len()
            ))),
        }
    }

    /// The values this shape contributes to configuration.
    ///
    /// The width-only shape means "source and output are the current
    /// directory", which is already the default, so it leaves both unset
    /// and a config file may still supply them.
    pub fn into_layer(self) -> ConfigLayer {
        match self {
            PositionalArgs::None => ConfigLayer::default(),
            PositionalArgs::Width { width } => ConfigLayer {
                width: Some(width),
                ..ConfigLayer::default()
            },
            PositionalArgs::WidthHeight { width, height } => ConfigLayer {
                width: Some(width),
                height: Some(height),
                ..ConfigLayer::default()
            },
            PositionalArgs::Full {
                source,
                out,
                width,
                height,
            } => ConfigLayer {
                source: Some(source),
                out: Some(out),
                width: Some(width),
                height,
                ..ConfigLayer::default()
            },
        }
    }
}

fn parse_dimension(name: &str, value: &str) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Validation(format!(
            "{name} must be a positive integer, got '{value}'"
        ))),
    }
}

fn validate_quality(quality: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::Validation(format!(
            "quality must be 1-100, got {quality}"
        )));
    }
    Ok(())
}

/// Load a TOML config file as a layer.
pub fn load_config_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let content = fs::read_to_string(path)?;
    let layer: ConfigLayer = toml::from_str(&content)?;
    tracing::debug!("Loaded config file {}", path.display());
    Ok(layer)
}

/// Everything one batch run needs. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    pub bounds: Bounds,
    pub quality: Quality,
    pub naming: NamingRule,
    /// Allow outputs to overwrite their own sources.
    pub force: bool,
    /// Suppress progress and completion lines.
    pub quiet: bool,
    /// Maximum parallel workers; `None` for one per CPU core.
    pub jobs: Option<usize>,
}

impl BatchConfig {
    /// Config for a source/output pair with every other option at its default.
    pub fn new(source_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            out_dir: out_dir.into(),
            bounds: Bounds::default(),
            quality: Quality::default(),
            naming: NamingRule::default(),
            force: false,
            quiet: false,
            jobs: None,
        }
    }

    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds.max_width == Some(0) || self.bounds.max_height == Some(0) {
            return Err(ConfigError::Validation(
                "width and height must be non-zero".into(),
            ));
        }
        validate_quality(self.quality.value())?;
        if self.jobs == Some(0) {
            return Err(ConfigError::Validation("jobs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Resolve the effective worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(jobs: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    jobs.map(|n| n.min(cores)).unwrap_or(cores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // Positional shapes
    // =========================================================================

    #[test]
    fn no_positionals() {
        assert_eq!(
            PositionalArgs::from_args(&[]).unwrap(),
            PositionalArgs::None
        );
    }

    #[test]
    fn one_positional_is_width() {
        assert_eq!(
            PositionalArgs::from_args(&args(&["800"])).unwrap(),
            PositionalArgs::Width { width: 800 }
        );
    }

    #[test]
    fn two_positionals_are_width_and_height() {
        assert_eq!(
            PositionalArgs::from_args(&args(&["800", "600"])).unwrap(),
            PositionalArgs::WidthHeight {
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn four_positionals_are_full_shape() {
        assert_eq!(
            PositionalArgs::from_args(&args(&["in", "out", "800", "600"])).unwrap(),
            PositionalArgs::Full {
                source: "in".into(),
                out: "out".into(),
                width: 800,
                height: Some(600),
            }
        );
    }

    #[test]
    fn three_positionals_leave_height_open() {
        assert_eq!(
            PositionalArgs::from_args(&args(&["in", "out", "800"])).unwrap(),
            PositionalArgs::Full {
                source: "in".into(),
                out: "out".into(),
                width: 800,
                height: None,
            }
        );
    }

    #[test]
    fn too_many_positionals_rejected() {
        let result = PositionalArgs::from_args(&args(&["a", "b", "1", "2", "3"]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn non_numeric_width_rejected() {
        let result = PositionalArgs::from_args(&args(&["wide"]));
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("width")));
    }

    #[test]
    fn zero_height_rejected() {
        let result = PositionalArgs::from_args(&args(&["10", "0"]));
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("height")));
    }

    // =========================================================================
    // Layer precedence
    // =========================================================================

    #[test]
    fn flags_override_positionals() {
        let positional = PositionalArgs::from_args(&args(&["in", "out", "800", "600"]))
            .unwrap()
            .into_layer();
        let flags = ConfigLayer {
            width: Some(1024),
            out: Some("elsewhere".into()),
            ..ConfigLayer::default()
        };

        let config = positional
            .merge(flags)
            .into_config(Path::new("/cwd"))
            .unwrap();
        assert_eq!(config.bounds, Bounds::new(Some(1024), Some(600)));
        assert_eq!(config.source_dir, PathBuf::from("in"));
        assert_eq!(config.out_dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn positionals_override_file() {
        let file = ConfigLayer {
            width: Some(100),
            height: Some(100),
            quality: Some(50),
            ..ConfigLayer::default()
        };
        let positional = PositionalArgs::Width { width: 300 }.into_layer();

        let config = file
            .merge(positional)
            .into_config(Path::new("/cwd"))
            .unwrap();
        assert_eq!(config.bounds, Bounds::new(Some(300), Some(100)));
        assert_eq!(config.quality.value(), 50);
    }

    #[test]
    fn width_shape_keeps_file_directories() {
        let file = ConfigLayer {
            source: Some("raw".into()),
            out: Some("public".into()),
            ..ConfigLayer::default()
        };
        let config = file
            .merge(PositionalArgs::Width { width: 10 }.into_layer())
            .into_config(Path::new("/cwd"))
            .unwrap();
        assert_eq!(config.source_dir, PathBuf::from("raw"));
        assert_eq!(config.out_dir, PathBuf::from("public"));
    }

    #[test]
    fn defaults_fill_unset_values() {
        let config = ConfigLayer::default()
            .into_config(Path::new("/cwd"))
            .unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/cwd"));
        assert_eq!(config.out_dir, PathBuf::from("/cwd"));
        assert_eq!(config.quality.value(), 100);
        assert!(config.bounds.is_unbounded());
        assert!(!config.force);
        assert!(!config.quiet);
        assert_eq!(config.jobs, None);
        assert!(config.naming.is_identity());
    }

    #[test]
    fn flags_carry_naming_and_switches() {
        let flags = ConfigLayer {
            prefix: Some("p_".into()),
            suffix: Some("_s".into()),
            force: Some(true),
            quiet: Some(true),
            ..ConfigLayer::default()
        };
        let config = flags.into_config(Path::new("/cwd")).unwrap();
        assert_eq!(config.naming.prefix.as_deref(), Some("p_"));
        assert_eq!(config.naming.suffix.as_deref(), Some("_s"));
        assert!(config.force);
        assert!(config.quiet);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn quality_out_of_range_rejected() {
        for q in [0, 101] {
            let layer = ConfigLayer {
                quality: Some(q),
                ..ConfigLayer::default()
            };
            assert!(matches!(
                layer.into_config(Path::new(".")),
                Err(ConfigError::Validation(_))
            ));
        }
    }

    #[test]
    fn zero_bound_rejected() {
        let mut config = BatchConfig::new("a", "b");
        config.bounds = Bounds::new(Some(0), None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_jobs_rejected() {
        let layer = ConfigLayer {
            jobs: Some(0),
            ..ConfigLayer::default()
        };
        assert!(layer.into_config(Path::new(".")).is_err());
    }

    #[test]
    fn new_config_is_valid() {
        assert!(BatchConfig::new("a", "b").validate().is_ok());
    }

    // =========================================================================
    // Config file
    // =========================================================================

    #[test]
    fn load_config_file_reads_all_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("constrain.toml");
        fs::write(
            &path,
            r#"
source = "raw"
out = "public"
width = 1600
height = 1200
quality = 85
prefix = "web_"
suffix = "@1x"
force = true
quiet = true
jobs = 2
"#,
        )
        .unwrap();

        let layer = load_config_file(&path).unwrap();
        assert_eq!(layer.source, Some(PathBuf::from("raw")));
        assert_eq!(layer.out, Some(PathBuf::from("public")));
        assert_eq!(layer.width, Some(1600));
        assert_eq!(layer.height, Some(1200));
        assert_eq!(layer.quality, Some(85));
        assert_eq!(layer.prefix.as_deref(), Some("web_"));
        assert_eq!(layer.suffix.as_deref(), Some("@1x"));
        assert_eq!(layer.force, Some(true));
        assert_eq!(layer.quiet, Some(true));
        assert_eq!(layer.jobs, Some(2));
    }

    #[test]
    fn load_config_file_sparse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("constrain.toml");
        fs::write(&path, "width = 640\n").unwrap();

        let layer = load_config_file(&path).unwrap();
        assert_eq!(
            layer,
            ConfigLayer {
                width: Some(640),
                ..ConfigLayer::default()
            }
        );
    }

    #[test]
    fn load_config_file_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("constrain.toml");
        fs::write(&path, "widht = 640\n").unwrap();

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_file_missing_is_io_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_config_file(&tmp.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    // =========================================================================
    // Thread count
    // =========================================================================

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = effective_threads(None);
        assert!(cores >= 1);
        assert_eq!(effective_threads(Some(1)), 1);
        assert_eq!(effective_threads(Some(usize::MAX)), cores);
    }
}
