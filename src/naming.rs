//! Output file naming.
//!
//! Every output path is derived from the source file name and a
//! [`NamingRule`] alone, so targets can be computed for the whole batch up
//! front without any job depending on another.
//!
//! ## Decoration
//!
//! - `prefix` is prepended: `dawn.jpg` + `web_` → `web_dawn.jpg`
//! - `suffix` goes before the last `.`: `dawn.jpg` + `@2x` → `dawn@2x.jpg`
//! - A name with no `.` gets the suffix at the very end: `README` → `README@2x`
//!
//! The extension is never touched, so output format always mirrors input.

use std::path::{Path, PathBuf};

/// Prefix/suffix decoration applied to every output file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingRule {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl NamingRule {
    pub fn new(prefix: Option<String>, suffix: Option<String>) -> Self {
        Self { prefix, suffix }
    }

    /// True when output names equal source names.
    pub fn is_identity(&self) -> bool {
        self.prefix.as_deref().is_none_or(str::is_empty)
            && self.suffix.as_deref().is_none_or(str::is_empty)
    }
}

/// Decorate a source file name according to `rule`.
///
/// - `("img.png", prefix "a_", suffix "_b")` → `"a_img_b.png"`
/// - `("img.png", no decoration)` → `"img.png"`
/// - `("img.tar.gz", suffix "-1")` → `"img.tar-1.gz"` (last dot wins)
/// - `("img", suffix "-1")` → `"img-1"`
pub fn output_file_name(file_name: &str, rule: &NamingRule) -> String {
    let mut name = match rule.prefix.as_deref() {
        Some(prefix) => format!("{prefix}{file_name}"),
        None => file_name.to_string(),
    };

    if let Some(suffix) = rule.suffix.as_deref() {
        match name.rfind('.') {
            Some(dot) => name.insert_str(dot, suffix),
            None => name.push_str(suffix),
        }
    }

    name
}

/// Full output path for a source file name.
///
/// `out_dir` is taken as given; the orchestrator resolves it to an absolute
/// path once per batch before naming any file.
pub fn target_path(file_name: &str, rule: &NamingRule, out_dir: &Path) -> PathBuf {
    out_dir.join(output_file_name(file_name, rule))
}
