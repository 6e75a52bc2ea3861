// src/pedagogy.rs

use crate::collaborators::{classify_or_fallback, PatternClassifier};
use crate::config::TrackerConfig;
use crate::constants::pattern_for_category;
use crate::error::{CatalogLoadError, ProgressLoadError, Report, Warning};
use crate::models::{
    Difficulty, PatternStats, Problem, ProblemStatus, ProgressEntry, ProgressRecord,
    ProgressSummary,
};
use crate::repository;
use crate::storage::JsonStore;
use chrono::Utc;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

/// Owns the problem catalog and the progress record. Every read and every
/// mutation goes through here; each mutation rewrites the affected file.
///
/// Single-threaded by contract: mutations are read-modify-write with no
/// locking.
pub struct ProblemProgressTracker {
    store: JsonStore,
    config: TrackerConfig,
    classifier: Box<dyn PatternClassifier>,
    problems: Vec<Problem>,
    progress: ProgressRecord,
    startup: Report,
}

impl ProblemProgressTracker {
    /// Loads both files, backfills missing patterns and settles the stats.
    /// Only an unusable catalog is fatal; everything else ends up in
    /// [`startup_report`](Self::startup_report).
    pub fn open(
        config: TrackerConfig,
        classifier: impl PatternClassifier + 'static,
    ) -> Result<Self, CatalogLoadError> {
        let store = JsonStore::new(&config.catalog_path, &config.progress_path);
        let problems = store.load_catalog()?;
        let total = problems.len() as u32;

        let mut startup = Report::default();
        let progress = match store.load_progress() {
            Ok(record) => record,
            Err(ProgressLoadError::Missing(path)) => {
                info!("No progress file at {:?}, starting fresh", path);
                ProgressRecord::fresh(total)
            }
            Err(e) => {
                warn!("[Init] {}. Starting with an empty ledger.", e);
                let backup = store.back_up_progress();
                startup.push(Warning::ProgressReset(e));
                startup.record_write(backup.map(|_| ()));
                ProgressRecord::fresh(total)
            }
        };

        let mut tracker = ProblemProgressTracker {
            store,
            config,
            classifier: Box::new(classifier),
            problems,
            progress,
            startup: Report::default(),
        };

        let backfill = tracker.backfill_patterns();
        startup.warnings.extend(backfill.warnings);

        let stats = &mut tracker.progress.stats;
        stats.total = total;
        stats.solved = tracker.progress.problems.values().filter(|e| e.solved).count() as u32;
        if stats.current_pattern.is_none() {
            stats.current_pattern = repository::first_pattern_in_catalog(&tracker.problems);
        }
        startup.record_write(tracker.store.save_progress(&tracker.progress));

        info!(
            "Tracker ready: {} problems, {} solved, current pattern {:?}",
            total, tracker.progress.stats.solved, tracker.progress.stats.current_pattern
        );
        tracker.startup = startup;
        Ok(tracker)
    }

    /// Warnings collected while opening (progress reset, classification
    /// fallbacks, failed writes).
    pub fn startup_report(&self) -> &Report {
        &self.startup
    }

    /// Gives every problem without a pattern one: category table first, the
    /// raw category next, the classifier only for problems with neither.
    /// Problems that already carry a pattern are left alone, so a second run
    /// is a no-op.
    pub fn backfill_patterns(&mut self) -> Report {
        let mut report = Report::default();
        let mut assigned = 0usize;

        for problem in self.problems.iter_mut().filter(|p| p.pattern.is_empty()) {
            let category = problem.category.trim();
            let pattern = if !category.is_empty() {
                pattern_for_category(category)
                    .map(str::to_string)
                    .unwrap_or_else(|| category.to_string())
            } else {
                match classify_or_fallback(self.classifier.as_ref(), problem) {
                    Ok(label) => label,
                    Err((fallback, error)) => {
                        report.push(Warning::Classification {
                            problem_id: problem.id.clone(),
                            fallback: fallback.clone(),
                            error,
                        });
                        fallback
                    }
                }
            };
            debug!("[Backfill] {} -> {}", problem.id, pattern);
            problem.pattern = pattern;
            assigned += 1;
        }

        if assigned > 0 {
            info!("[Backfill] Assigned patterns to {} problems", assigned);
            report.record_write(self.store.save_catalog(&self.problems));
        }
        report
    }

    // --- Queries ---

    pub fn get_all_problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn get_unsolved(&self, difficulty: Option<Difficulty>) -> Vec<&Problem> {
        repository::get_unsolved(&self.problems, difficulty)
    }

    pub fn get_random_unsolved(&self, difficulty: Option<Difficulty>) -> Option<&Problem> {
        self.get_random_unsolved_with(difficulty, &mut rand::thread_rng())
    }

    pub fn get_random_unsolved_with<R: Rng + ?Sized>(
        &self,
        difficulty: Option<Difficulty>,
        rng: &mut R,
    ) -> Option<&Problem> {
        self.get_unsolved(difficulty).choose(rng).copied()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Problem> {
        repository::find_by_id(&self.problems, id)
    }

    pub fn get_by_status(&self, status: ProblemStatus) -> Vec<&Problem> {
        repository::get_by_status(&self.problems, status)
    }

    pub fn get_all_patterns(&self) -> Vec<String> {
        repository::distinct_patterns(&self.problems, &self.config.master_patterns)
    }

    /// `None` or `"any"` returns the whole catalog.
    pub fn get_by_pattern(&self, pattern: Option<&str>) -> Vec<&Problem> {
        repository::get_by_pattern(&self.problems, pattern)
    }

    pub fn get_learning_order(&self) -> &[String] {
        &self.config.learning_order
    }

    pub fn get_pattern_index(&self, pattern: &str) -> Option<usize> {
        self.config.learning_order.iter().position(|p| p == pattern)
    }

    pub fn get_next_pattern(&self) -> Option<String> {
        let ordered =
            repository::order_patterns(&self.get_all_patterns(), &self.config.learning_order);
        repository::next_open_pattern(&self.problems, &ordered)
    }

    pub fn get_next_unsolved_in_pattern(&self, pattern: &str) -> Option<&Problem> {
        if pattern.is_empty() {
            return None;
        }
        self.get_by_pattern(Some(pattern))
            .into_iter()
            .find(|p| !p.is_completed())
    }

    /// Deterministic: the same catalog state always yields the same pick.
    pub fn get_today_problem(&self, pattern: Option<&str>) -> (Option<String>, Option<&Problem>) {
        let pattern = match pattern {
            Some(p) => Some(p.to_string()),
            None => self.get_next_pattern(),
        };
        let problem = pattern
            .as_deref()
            .and_then(|p| self.get_next_unsolved_in_pattern(p));

        match problem {
            Some(p) => info!("Serving Today: {} (ID: {})", p.title, p.id),
            None => info!("Nothing left to serve for pattern {:?}", pattern),
        }
        (pattern, problem)
    }

    pub fn get_current_pattern(&self) -> Option<String> {
        self.progress
            .stats
            .current_pattern
            .clone()
            .or_else(|| repository::first_pattern_in_catalog(&self.problems))
    }

    pub fn get_progress_summary(&self) -> ProgressSummary {
        let stats = &self.progress.stats;
        ProgressSummary {
            total: self.problems.len() as u32,
            solved: stats.solved,
            streak: stats.streak,
            patterns: self.progress.patterns.clone(),
            last_run: stats.last_run,
        }
    }

    pub fn progress_entry(&self, id: &str) -> Option<&ProgressEntry> {
        self.progress.problems.get(id)
    }

    pub fn progress_record(&self) -> &ProgressRecord {
        &self.progress
    }

    // --- Mutations ---

    /// `None` if the id is not in the catalog.
    pub fn mark_skipped(&mut self, id: &str) -> Option<Report> {
        let problem = self.problems.iter_mut().find(|p| p.id == id)?;
        problem.status = ProblemStatus::Skipped;
        info!("Skipped: {} (ID: {})", problem.title, problem.id);

        let mut report = Report::default();
        report.record_write(self.store.save_catalog(&self.problems));
        Some(report)
    }

    /// Explicit pattern override; the only way an assigned pattern changes.
    pub fn reclassify(&mut self, id: &str, pattern: &str) -> Option<Report> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        let problem = self.problems.iter_mut().find(|p| p.id == id)?;
        info!("Reclassified {}: '{}' -> '{}'", problem.id, problem.pattern, pattern);
        problem.pattern = pattern.to_string();

        let mut report = Report::default();
        report.record_write(self.store.save_catalog(&self.problems));
        Some(report)
    }

    /// Marks `problem` completed and books the solve into the ledger and the
    /// counters. `analysis` is stored verbatim. `code` is the user's solution;
    /// the tracker does not keep it, the caller hands it to a
    /// [`NoteGenerator`](crate::collaborators::NoteGenerator).
    ///
    /// The pattern is the one on `problem`, else the catalog entry's (always
    /// set once the catalog is backfilled), so no classifier call happens here.
    ///
    /// `None`, with nothing touched, if the id is not in the catalog.
    pub fn record_solution(
        &mut self,
        problem: &Problem,
        code: Option<&str>,
        analysis: Value,
    ) -> Option<Report> {
        let Some(entry) = self.problems.iter_mut().find(|p| p.id == problem.id) else {
            warn!("Ignoring solve of {}: not in the catalog", problem.id);
            return None;
        };
        let mut report = Report::default();
        let now = Utc::now();
        debug!(
            "Recording {} ({} bytes of code)",
            problem.id,
            code.map_or(0, str::len)
        );

        // 1. Catalog
        let pattern = if problem.pattern.is_empty() {
            entry.pattern.clone()
        } else {
            problem.pattern.clone()
        };
        entry.status = ProblemStatus::Completed;
        report.record_write(self.store.save_catalog(&self.problems));

        // 2. Ledger
        let previous = self.progress.problems.remove(&problem.id);
        let (note_path, flashcards) = previous
            .map(|e| (e.note_path, e.flashcards))
            .unwrap_or_default();
        self.progress.problems.insert(
            problem.id.clone(),
            ProgressEntry {
                solved: true,
                date: now,
                pattern: pattern.clone(),
                difficulty: problem.difficulty,
                note_path,
                analysis,
                flashcards,
            },
        );

        // 3. Counters
        let pattern_stats = self
            .progress
            .patterns
            .entry(pattern.clone())
            .or_insert_with(PatternStats::default);
        pattern_stats.solved += 1;
        pattern_stats.attempted += 1;

        let solved = self.progress.solved_count();
        let stats = &mut self.progress.stats;
        stats.solved = solved;
        stats.streak += 1;
        stats.last_run = now;

        info!(
            "Solved: {} (ID: {}) [{}] - {} solved, streak {}",
            problem.title, problem.id, pattern, stats.solved, stats.streak
        );

        report.record_write(self.store.save_progress(&self.progress));
        Some(report)
    }

    /// `None` (nothing changed) when `pattern` is not one of
    /// [`get_all_patterns`](Self::get_all_patterns).
    pub fn set_current_pattern(&mut self, pattern: &str) -> Option<Report> {
        if !self.get_all_patterns().iter().any(|p| p == pattern) {
            debug!("Rejected unknown pattern '{}'", pattern);
            return None;
        }
        self.progress.stats.current_pattern = Some(pattern.to_string());
        info!("Current pattern set to '{}'", pattern);

        let mut report = Report::default();
        report.record_write(self.store.save_progress(&self.progress));
        Some(report)
    }

    /// Records where a generated note was saved and its flashcards. Creates an
    /// unsolved ledger entry when the problem has none yet. `None` if the id
    /// is not in the catalog.
    pub fn attach_note(
        &mut self,
        id: &str,
        note_path: Option<String>,
        flashcards: Vec<String>,
    ) -> Option<Report> {
        let problem = repository::find_by_id(&self.problems, id)?;
        let entry = self
            .progress
            .problems
            .entry(id.to_string())
            .or_insert_with(|| ProgressEntry {
                solved: false,
                date: Utc::now(),
                pattern: problem.pattern.clone(),
                difficulty: problem.difficulty,
                note_path: None,
                analysis: Value::Null,
                flashcards: Vec::new(),
            });
        entry.note_path = note_path;
        entry.flashcards = flashcards;
        info!(
            "Attached note to {} ({} flashcards)",
            id,
            entry.flashcards.len()
        );

        let mut report = Report::default();
        report.record_write(self.store.save_progress(&self.progress));
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassificationError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::cell::Cell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, catalog: Value) -> TrackerConfig {
        let config = TrackerConfig::in_dir(dir.path());
        fs::write(&config.catalog_path, catalog.to_string()).unwrap();
        config
    }

    fn counting(label: &'static str) -> (impl PatternClassifier, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let classifier = move |_: &Problem| {
            seen.set(seen.get() + 1);
            Ok::<_, ClassificationError>(label.to_string())
        };
        (classifier, calls)
    }

    fn failing() -> impl PatternClassifier {
        |_: &Problem| Err::<String, _>(ClassificationError::Failed("timeout".into()))
    }

    #[test]
    fn backfill_prefers_category_table_then_raw_category() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(
            &dir,
            json!([
                { "id": "NC1", "category": "Trees" },
                { "id": "NC2", "category": "Puzzles" },
                { "id": "NC3", "pattern": "Stack", "category": "Arrays" },
                { "id": "NC4" }
            ]),
        );
        let (classifier, calls) = counting("Greedy");
        let tracker = ProblemProgressTracker::open(config, classifier).unwrap();

        let patterns: Vec<_> = tracker
            .get_all_problems()
            .iter()
            .map(|p| p.pattern.as_str())
            .collect();
        assert_eq!(patterns, vec!["Tree", "Puzzles", "Stack", "Greedy"]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backfill_failure_degrades_to_uncategorized() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(&dir, json!([{ "id": "NC1", "title": "Odd one" }]));
        let tracker = ProblemProgressTracker::open(config, failing()).unwrap();

        assert_eq!(tracker.get_by_id("NC1").unwrap().pattern, "Uncategorized");
        assert!(tracker
            .startup_report()
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::Classification { .. })));
    }

    #[test]
    fn backfill_is_persisted_and_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(&dir, json!([{ "id": "NC1" }, { "id": "NC2" }]));
        let (classifier, calls) = counting("Heap");
        let mut tracker = ProblemProgressTracker::open(config.clone(), classifier).unwrap();
        assert_eq!(calls.get(), 2);

        let before: Vec<_> = tracker.get_all_problems().to_vec();
        assert!(tracker.backfill_patterns().is_clean());
        assert_eq!(tracker.get_all_problems(), before.as_slice());
        assert_eq!(calls.get(), 2);

        let (classifier, calls) = counting("Other");
        let reopened = ProblemProgressTracker::open(config, classifier).unwrap();
        assert_eq!(reopened.get_all_problems(), before.as_slice());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn current_pattern_defaults_to_first_in_catalog_order() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(
            &dir,
            json!([
                { "id": "NC1", "pattern": "Stack" },
                { "id": "NC2", "pattern": "Arrays & Hashing" }
            ]),
        );
        let tracker = ProblemProgressTracker::open(config, failing()).unwrap();
        assert_eq!(tracker.get_current_pattern().as_deref(), Some("Stack"));
        assert_eq!(
            tracker.progress_record().stats.current_pattern.as_deref(),
            Some("Stack")
        );
    }

    #[test]
    fn next_pattern_follows_learning_order() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(
            &dir,
            json!([
                { "id": "NC1", "pattern": "Zeta Custom" },
                { "id": "NC2", "pattern": "Stack" },
                { "id": "NC3", "pattern": "Two Pointers", "status": "Completed" },
                { "id": "NC4", "pattern": "Alpha Custom" }
            ]),
        );
        let mut tracker = ProblemProgressTracker::open(config, failing()).unwrap();
        assert_eq!(tracker.get_next_pattern().as_deref(), Some("Stack"));

        let stack = tracker.get_by_id("NC2").unwrap().clone();
        let _ = tracker.record_solution(&stack, None, Value::Null);
        assert_eq!(tracker.get_next_pattern().as_deref(), Some("Alpha Custom"));
        assert_eq!(tracker.get_pattern_index("Stack"), Some(3));
        assert_eq!(tracker.get_pattern_index("Alpha Custom"), None);
    }

    #[test]
    fn random_pick_stays_inside_filter() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(
            &dir,
            json!([
                { "id": "NC1", "pattern": "Stack", "difficulty": "Easy" },
                { "id": "NC2", "pattern": "Stack", "difficulty": "Hard" },
                { "id": "NC3", "pattern": "Stack", "difficulty": "Hard", "status": "completed" }
            ]),
        );
        let tracker = ProblemProgressTracker::open(config, failing()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let p = tracker
                .get_random_unsolved_with(Some(Difficulty::Hard), &mut rng)
                .unwrap();
            assert_eq!(p.id, "NC2");
        }
        assert!(tracker.get_random_unsolved(Some(Difficulty::Medium)).is_none());
    }

    #[test]
    fn skip_and_reclassify_touch_catalog_only() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(&dir, json!([{ "id": "NC1", "pattern": "Stack" }]));
        let mut tracker = ProblemProgressTracker::open(config.clone(), failing()).unwrap();

        assert!(tracker.mark_skipped("NC1").unwrap().is_clean());
        assert!(tracker.mark_skipped("NOPE").is_none());
        assert!(tracker.reclassify("NC1", "Monotonic Stack").unwrap().is_clean());
        assert!(tracker.reclassify("NC1", "  ").is_none());
        assert!(tracker.progress_record().problems.is_empty());

        let reopened = ProblemProgressTracker::open(config, failing()).unwrap();
        let p = reopened.get_by_id("NC1").unwrap();
        assert_eq!(p.status, ProblemStatus::Skipped);
        assert_eq!(p.pattern, "Monotonic Stack");
        assert_eq!(reopened.get_unsolved(None).len(), 1);
        assert_eq!(reopened.get_by_status(ProblemStatus::Skipped).len(), 1);
    }

    #[test]
    fn record_solution_never_calls_the_classifier() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(
            &dir,
            json!([{ "id": "NC1", "pattern": "Stack" }, { "id": "NC2" }]),
        );
        let (classifier, calls) = counting("Graph");
        let mut tracker = ProblemProgressTracker::open(config, classifier).unwrap();
        assert_eq!(calls.get(), 1);

        // A stale copy without a pattern still books under the catalog's label.
        let stale = Problem::new("NC2", "Number of Islands", Difficulty::Medium);
        let report = tracker
            .record_solution(&stale, Some("class Solution {}"), Value::Null)
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(calls.get(), 1);
        assert_eq!(tracker.progress_entry("NC2").unwrap().pattern, "Graph");
        assert_eq!(tracker.get_progress_summary().patterns["Graph"].solved, 1);
    }

    #[test]
    fn solve_of_unknown_id_is_rejected_without_change() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(&dir, json!([{ "id": "NC1", "pattern": "Stack" }]));
        let mut tracker = ProblemProgressTracker::open(config.clone(), failing()).unwrap();
        let before = tracker.progress_record().clone();

        let mut outside = Problem::new("LC9", "Palindrome Number", Difficulty::Easy);
        outside.pattern = "Math & Geometry".into();
        assert!(tracker.record_solution(&outside, None, Value::Null).is_none());

        assert_eq!(tracker.progress_record(), &before);
        assert!(tracker.progress_entry("LC9").is_none());
        assert!(!tracker.get_progress_summary().patterns.contains_key("Math & Geometry"));
        let reopened = ProblemProgressTracker::open(config, failing()).unwrap();
        assert_eq!(reopened.get_progress_summary().streak, 0);
    }

    #[test]
    fn repeated_solves_bump_counters_but_not_solved_total() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(&dir, json!([{ "id": "NC1", "pattern": "Heap" }]));
        let mut tracker = ProblemProgressTracker::open(config, failing()).unwrap();
        let p = tracker.get_by_id("NC1").unwrap().clone();

        let _ = tracker.record_solution(&p, None, json!({ "complexity": "O(n log k)" }));
        let _ = tracker.record_solution(&p, None, json!({ "complexity": "O(n)" }));

        let summary = tracker.get_progress_summary();
        assert_eq!(summary.solved, 1);
        assert_eq!(summary.streak, 2);
        assert_eq!(
            summary.patterns["Heap"],
            PatternStats {
                solved: 2,
                attempted: 2
            }
        );
        assert_eq!(
            tracker.progress_entry("NC1").unwrap().analysis["complexity"],
            "O(n)"
        );
    }

    #[test]
    fn attach_note_keeps_flashcards_through_later_solve() {
        let dir = TempDir::new().unwrap();
        let config = write_catalog(&dir, json!([{ "id": "NC1", "pattern": "Trie" }]));
        let mut tracker = ProblemProgressTracker::open(config, failing()).unwrap();

        let report = tracker
            .attach_note("NC1", Some("Problems/NC1.md".into()), vec!["Q;A".into()])
            .unwrap();
        assert!(report.is_clean());
        assert!(!tracker.progress_entry("NC1").unwrap().solved);
        assert_eq!(tracker.get_progress_summary().solved, 0);
        assert!(tracker.attach_note("NC9", None, Vec::new()).is_none());

        let p = tracker.get_by_id("NC1").unwrap().clone();
        let analysis = json!({ "flashcards": ["Trie node?;children map"] });
        let _ = tracker.record_solution(&p, None, analysis);
        let entry = tracker.progress_entry("NC1").unwrap();
        assert_eq!(entry.note_path.as_deref(), Some("Problems/NC1.md"));
        assert_eq!(entry.flashcards(), vec!["Q;A", "Trie node?;children map"]);
    }

    #[test]
    fn write_failure_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = write_catalog(&dir, json!([{ "id": "NC1", "pattern": "Stack" }]));
        // A directory where the progress file should be makes every write fail.
        config.progress_path = dir.path().join("blocked");
        fs::create_dir(&config.progress_path).unwrap();

        let mut tracker = ProblemProgressTracker::open(config, failing()).unwrap();
        assert!(tracker.startup_report().has_persist_failure());

        let p = tracker.get_by_id("NC1").unwrap().clone();
        let report = tracker.record_solution(&p, None, Value::Null).unwrap();
        assert!(report.has_persist_failure());
        assert_eq!(tracker.get_progress_summary().solved, 1);
        assert!(tracker.get_by_id("NC1").unwrap().is_completed());
    }
}
