// src/error.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The catalog is the one thing the tracker cannot invent a default for.
#[derive(Error, Debug)]
pub enum CatalogLoadError {
    #[error("cannot read catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog {path:?} is not a valid problem list: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog entry #{index} has no id")]
    MissingId { index: usize },

    #[error("catalog id '{0}' appears more than once")]
    DuplicateId(String),
}

#[derive(Error, Debug)]
pub enum ProgressLoadError {
    #[error("no progress file at {0:?}")]
    Missing(PathBuf),

    #[error("cannot read progress {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("progress {path:?} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cannot create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot back up {path:?}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of an external pattern or note collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator returned an empty label")]
    EmptyLabel,

    #[error("collaborator failed: {0}")]
    Failed(String),
}

// --- Degradations ---

/// A condition the tracker recovered from. The operation that produced it
/// still completed and in-memory state is authoritative.
#[derive(Debug)]
pub enum Warning {
    ProgressReset(ProgressLoadError),
    Classification {
        problem_id: String,
        fallback: String,
        error: ClassificationError,
    },
    Persist(StorageError),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ProgressReset(e) => write!(f, "progress reset to defaults ({})", e),
            Warning::Classification {
                problem_id,
                fallback,
                error,
            } => write!(
                f,
                "could not classify {} ({}), using '{}'",
                problem_id, error, fallback
            ),
            Warning::Persist(e) => write!(f, "changes kept in memory only ({})", e),
        }
    }
}

/// Outcome of a tracker operation: empty when everything went through.
#[derive(Debug, Default)]
#[must_use]
pub struct Report {
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub(crate) fn record_write(&mut self, result: Result<(), StorageError>) {
        if let Err(e) = result {
            log::warn!("[Storage] {}", e);
            self.push(Warning::Persist(e));
        }
    }

    pub fn has_persist_failure(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::Persist(_)))
    }
}
