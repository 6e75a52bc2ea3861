// src/lib.rs

//! Progress tracking for DSA interview practice: a problem catalog, a
//! ledger of solved problems, pattern classification and "what to study
//! today", persisted as two local JSON files.

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pedagogy;
pub mod repository;
pub mod storage;

pub use collaborators::{
    extract_flashcards, GeneratedNote, NoteGenerator, OfflineClassifier, PatternClassifier,
};
pub use config::TrackerConfig;
pub use error::{
    CatalogLoadError, ClassificationError, ProgressLoadError, Report, StorageError, Warning,
};
pub use models::{
    Difficulty, GlobalStats, PatternStats, Problem, ProblemStatus, ProgressEntry, ProgressRecord,
    ProgressSummary,
};
pub use pedagogy::ProblemProgressTracker;
