// src/config.rs

use crate::constants::{APP_DIR_NAME, CATALOG_FILE_NAME, DSA_MASTER_PATTERNS, PROGRESS_FILE_NAME};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub catalog_path: PathBuf,
    pub progress_path: PathBuf,
    /// Canonical patterns offered even when no catalog problem carries them yet.
    pub master_patterns: Vec<String>,
    /// Preferred study order; patterns not listed here come after, alphabetically.
    pub learning_order: Vec<String>,
}

impl TrackerConfig {
    pub fn new(catalog_path: impl Into<PathBuf>, progress_path: impl Into<PathBuf>) -> Self {
        TrackerConfig {
            catalog_path: catalog_path.into(),
            progress_path: progress_path.into(),
            master_patterns: Vec::new(),
            learning_order: DSA_MASTER_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CATALOG_FILE_NAME), dir.join(PROGRESS_FILE_NAME))
    }

    pub fn with_master_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.master_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_learning_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.learning_order = order.into_iter().map(Into::into).collect();
        self
    }
}

/// Per-user data directory, e.g. `~/.local/share/dsa-mastery`.
/// Falls back to the working directory when the platform reports none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}
