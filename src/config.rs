//! Project configuration

use crate::io::fs::MAX_BINDER_SIZE;
use std::path::{Path, PathBuf};

/// Default binder file name inside the project directory
pub const DEFAULT_BINDER_FILE: &str = "_binder.md";

/// Environment variable holding the editor command
pub const DEFAULT_EDITOR_VAR: &str = "EDITOR";

/// Configuration for a project directory
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Directory holding the binder and node files
    pub root: PathBuf,
    /// Binder file name, relative to `root`
    pub binder_file: String,
    /// Binder files above this size are refused before parsing
    pub max_binder_size: u64,
    /// Maximum title length in characters
    pub max_title_len: usize,
    /// Maximum synopsis length in characters
    pub max_synopsis_len: usize,
    /// Environment variable consulted for the editor command
    pub editor_var: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            binder_file: DEFAULT_BINDER_FILE.to_string(),
            max_binder_size: MAX_BINDER_SIZE,
            max_title_len: 500,
            max_synopsis_len: 2000,
            editor_var: DEFAULT_EDITOR_VAR.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Default configuration rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn binder_path(&self) -> PathBuf {
        self.root.join(&self.binder_file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw editor command from the environment, or the empty string when the
    /// variable is unset. Never tokenized here.
    pub fn editor_spec(&self) -> String {
        std::env::var(&self.editor_var).unwrap_or_default()
    }
}
