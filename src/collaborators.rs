// src/collaborators.rs

use crate::constants::UNCATEGORIZED;
use crate::error::ClassificationError;
use crate::models::Problem;
use log::warn;

/// Maps a problem to a pattern label, usually by asking an LLM.
pub trait PatternClassifier {
    fn classify(&self, problem: &Problem) -> Result<String, ClassificationError>;
}

impl<F> PatternClassifier for F
where
    F: Fn(&Problem) -> Result<String, ClassificationError>,
{
    fn classify(&self, problem: &Problem) -> Result<String, ClassificationError> {
        self(problem)
    }
}

/// Stand-in when no AI backend is configured: every call reports
/// `Unavailable`, so callers always take their fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineClassifier;

impl PatternClassifier for OfflineClassifier {
    fn classify(&self, _problem: &Problem) -> Result<String, ClassificationError> {
        Err(ClassificationError::Unavailable(
            "no classifier backend configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNote {
    pub text: String,
    pub flashcards: Vec<String>,
}

impl GeneratedNote {
    /// Builds a note from markdown, pulling its `Q;A` flashcard lines out.
    pub fn from_markdown(text: impl Into<String>) -> Self {
        let text = text.into();
        let flashcards = extract_flashcards(&text);
        GeneratedNote { text, flashcards }
    }
}

/// Writes study notes for a problem. Called by the front end, never by the
/// tracker; the tracker only stores what comes back.
pub trait NoteGenerator {
    fn generate(
        &self,
        problem: &Problem,
        code: Option<&str>,
    ) -> Result<GeneratedNote, ClassificationError>;
}

/// Runs the classifier and never fails: a blank label or an error becomes the
/// problem's raw category, or `Uncategorized` when that is blank too.
pub fn classify_or_fallback(
    classifier: &dyn PatternClassifier,
    problem: &Problem,
) -> Result<String, (String, ClassificationError)> {
    let outcome = classifier.classify(problem).and_then(|label| {
        let label = label.trim();
        if label.is_empty() {
            Err(ClassificationError::EmptyLabel)
        } else {
            Ok(label.to_string())
        }
    });

    outcome.map_err(|error| {
        let fallback = if problem.category.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            problem.category.trim().to_string()
        };
        warn!(
            "[Classifier] {} ({}): {}. Falling back to '{}'",
            problem.id, problem.title, error, fallback
        );
        (fallback, error)
    })
}

/// Lines with exactly one `;` and text on both sides, normalised to `Q;A`.
pub fn extract_flashcards(note: &str) -> Vec<String> {
    note.lines()
        .filter_map(|line| {
            let (q, a) = line.split_once(';')?;
            if a.contains(';') {
                return None;
            }
            let (q, a) = (q.trim(), a.trim());
            (!q.is_empty() && !a.is_empty()).then(|| format!("{};{}", q, a))
        })
        .collect()
}
