// src/models.rs

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Difficulty {
    Easy = 1,
    #[default]
    Medium = 2,
    Hard = 3,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Scraped catalogs carry free text here; anything unrecognised is Medium.
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|s| Difficulty::from_str(&s).ok())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProblemStatus {
    #[default]
    Unset,
    Completed,
    Skipped,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Unset => "",
            ProblemStatus::Completed => "completed",
            ProblemStatus::Skipped => "skipped",
        }
    }

    /// Case-insensitive; unknown text counts as unset.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => ProblemStatus::Completed,
            "skipped" => ProblemStatus::Skipped,
            _ => ProblemStatus::Unset,
        }
    }
}

impl FromStr for ProblemStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unset" | "open" => Ok(ProblemStatus::Unset),
            "completed" => Ok(ProblemStatus::Completed),
            "skipped" => Ok(ProblemStatus::Skipped),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

impl Serialize for ProblemStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProblemStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .map(|s| ProblemStatus::parse_lenient(&s))
            .unwrap_or_default())
    }
}

fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn list_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339, or a naive ISO-8601 timestamp (`2024-05-01T10:00:00.123456`)
/// read as UTC. Null means now.
fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(Utc::now());
    };
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("unrecognised timestamp '{}'", raw))
}

// --- Catalog ---

/// One catalog entry. Columns this crate does not know about are kept in
/// `extra` so a catalog rewrite never drops them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Problem {
    #[serde(default, deserialize_with = "string_or_null")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub url: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, deserialize_with = "string_or_null")]
    pub category: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub pattern: String,
    #[serde(default)]
    pub status: ProblemStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Problem {
    pub fn new(id: &str, title: &str, difficulty: Difficulty) -> Self {
        Problem {
            id: id.to_string(),
            title: title.to_string(),
            url: String::new(),
            description: String::new(),
            difficulty,
            category: String::new(),
            pattern: String::new(),
            status: ProblemStatus::Unset,
            extra: Map::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProblemStatus::Completed
    }
}

// --- Progress Record ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    #[serde(default)]
    pub solved: bool,
    #[serde(default = "Utc::now", deserialize_with = "lenient_datetime")]
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "string_or_null")]
    pub pattern: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_path: Option<String>,
    /// Whatever the analysis collaborator returned, stored untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub analysis: Value,
    #[serde(
        default,
        deserialize_with = "list_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub flashcards: Vec<String>,
}

impl ProgressEntry {
    /// Attached note flashcards first, then any `analysis.flashcards` strings.
    pub fn flashcards(&self) -> Vec<String> {
        let from_analysis = self
            .analysis
            .get("flashcards")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string);

        self.flashcards.iter().cloned().chain(from_analysis).collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternStats {
    pub solved: u32,
    pub attempted: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GlobalStats {
    #[serde(default)]
    pub solved: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default = "Utc::now", deserialize_with = "lenient_datetime")]
    pub last_run: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_pattern: Option<String>,
}

impl GlobalStats {
    pub fn new(total: u32) -> Self {
        GlobalStats {
            solved: 0,
            total,
            streak: 0,
            last_run: Utc::now(),
            current_pattern: None,
        }
    }
}

/// Ledger, per-pattern counters and global stats, persisted as one file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    #[serde(default)]
    pub problems: BTreeMap<String, ProgressEntry>,
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternStats>,
    pub stats: GlobalStats,
}

impl ProgressRecord {
    pub fn fresh(total: u32) -> Self {
        ProgressRecord {
            problems: BTreeMap::new(),
            patterns: BTreeMap::new(),
            stats: GlobalStats::new(total),
        }
    }

    pub fn solved_count(&self) -> u32 {
        self.problems.values().filter(|e| e.solved).count() as u32
    }
}

// --- Views ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    pub total: u32,
    pub solved: u32,
    pub streak: u32,
    pub patterns: BTreeMap<String, PatternStats>,
    pub last_run: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_entry_parses_leniently() {
        let p: Problem = serde_json::from_value(json!({
            "id": "NC1",
            "title": "Contains Duplicate",
            "difficulty": "easy",
            "category": "Arrays",
            "status": "Completed",
            "notes": null,
            "doubt": "why a set?"
        }))
        .unwrap();

        assert_eq!(p.difficulty, Difficulty::Easy);
        assert_eq!(p.status, ProblemStatus::Completed);
        assert_eq!(p.pattern, "");
        assert_eq!(p.extra.get("doubt"), Some(&json!("why a set?")));
    }

    #[test]
    fn unknown_difficulty_and_status_fall_back() {
        let p: Problem = serde_json::from_value(json!({
            "id": "NC2",
            "difficulty": "Insane",
            "status": "In progress"
        }))
        .unwrap();
        assert_eq!(p.difficulty, Difficulty::Medium);
        assert_eq!(p.status, ProblemStatus::Unset);
    }

    #[test]
    fn status_serializes_lowercase() {
        let mut p = Problem::new("NC3", "Two Sum", Difficulty::Easy);
        p.status = ProblemStatus::Skipped;
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["status"], "skipped");
        assert_eq!(v["difficulty"], "Easy");
    }

    #[test]
    fn flashcards_merge_attached_and_analysis() {
        let entry = ProgressEntry {
            solved: true,
            date: Utc::now(),
            pattern: "Stack".into(),
            difficulty: Difficulty::Medium,
            note_path: None,
            analysis: json!({ "flashcards": ["Q1;A1", 7, "Q2;A2"] }),
            flashcards: vec!["N;M".into()],
        };
        assert_eq!(entry.flashcards(), vec!["N;M", "Q1;A1", "Q2;A2"]);
    }

    #[test]
    fn legacy_progress_without_streak_or_pattern_loads() {
        let record: ProgressRecord = serde_json::from_value(json!({
            "problems": {},
            "patterns": {},
            "stats": { "solved": 0, "total": 150, "last_run": "2024-05-01T10:00:00Z" }
        }))
        .unwrap();
        assert_eq!(record.stats.streak, 0);
        assert_eq!(record.stats.current_pattern, None);
    }

    #[test]
    fn naive_timestamps_read_as_utc() {
        let record: ProgressRecord = serde_json::from_value(json!({
            "problems": {
                "NC1": {
                    "solved": true,
                    "date": "2024-05-01T10:00:00.123456",
                    "pattern": null,
                    "difficulty": "Easy"
                },
                "NC2": { "date": "2024-05-02T08:30:00", "flashcards": null }
            },
            "stats": { "solved": 1, "total": 150, "streak": 1, "last_run": "2024-05-01T10:00:00.5" }
        }))
        .unwrap();

        let first = &record.problems["NC1"];
        assert_eq!(
            first.date,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
        assert_eq!(first.pattern, "");
        assert!(!record.problems["NC2"].solved);
        assert!(record.problems["NC2"].flashcards.is_empty());
        assert_eq!(record.stats.last_run.timestamp(), first.date.timestamp());
    }

    #[test]
    fn timestamp_parser_accepts_offsets_and_rejects_garbage() {
        let utc = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:00:00+02:00").unwrap(), utc);
        assert_eq!(parse_timestamp("2024-05-01 08:00:00").unwrap(), utc);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
