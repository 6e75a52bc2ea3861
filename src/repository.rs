// src/repository.rs

use crate::constants::ANY_PATTERN;
use crate::models::{Difficulty, Problem, ProblemStatus};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Natural id order: `NC2` sorts before `NC10`.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_num) = split_id(a);
    let (b_prefix, b_num) = split_id(b);
    a_prefix
        .cmp(b_prefix)
        .then_with(|| a_num.cmp(&b_num))
        .then_with(|| a.cmp(b))
}

fn split_id(id: &str) -> (&str, Option<u64>) {
    let digits_at = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    let (prefix, digits) = id.split_at(digits_at);
    (prefix, digits.parse().ok())
}

pub fn find_by_id<'a>(problems: &'a [Problem], id: &str) -> Option<&'a Problem> {
    problems.iter().find(|p| p.id == id)
}

/// Everything not completed; skipped problems stay in the pool.
pub fn get_unsolved(problems: &[Problem], difficulty: Option<Difficulty>) -> Vec<&Problem> {
    problems
        .iter()
        .filter(|p| !p.is_completed())
        .filter(|p| difficulty.map_or(true, |d| p.difficulty == d))
        .collect()
}

pub fn get_by_status(problems: &[Problem], status: ProblemStatus) -> Vec<&Problem> {
    problems.iter().filter(|p| p.status == status).collect()
}

pub fn is_any_pattern(pattern: Option<&str>) -> bool {
    pattern.map_or(true, |p| p.eq_ignore_ascii_case(ANY_PATTERN))
}

/// Exact pattern match, ordered by id. `None` or `"any"` yields the whole
/// catalog in catalog order.
pub fn get_by_pattern<'a>(problems: &'a [Problem], pattern: Option<&str>) -> Vec<&'a Problem> {
    let wanted = match pattern {
        Some(p) if !is_any_pattern(Some(p)) => p,
        _ => return problems.iter().collect(),
    };

    let mut matched: Vec<&Problem> = problems.iter().filter(|p| p.pattern == wanted).collect();
    matched.sort_by(|a, b| compare_ids(&a.id, &b.id));
    matched
}

/// Sorted distinct non-empty patterns of the catalog, plus `master`.
pub fn distinct_patterns(problems: &[Problem], master: &[String]) -> Vec<String> {
    let mut set: BTreeSet<&str> = problems
        .iter()
        .map(|p| p.pattern.as_str())
        .filter(|p| !p.is_empty())
        .collect();
    set.extend(master.iter().map(String::as_str).filter(|p| !p.is_empty()));
    set.into_iter().map(str::to_string).collect()
}

/// Patterns named in `learning_order` first (in that order), the rest
/// alphabetically.
pub fn order_patterns(patterns: &[String], learning_order: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = learning_order
        .iter()
        .filter(|p| patterns.contains(p))
        .cloned()
        .collect();

    let mut rest: Vec<String> = patterns
        .iter()
        .filter(|p| !learning_order.contains(p))
        .cloned()
        .collect();
    rest.sort();
    rest.dedup();

    ordered.dedup();
    ordered.extend(rest);
    ordered
}

/// First pattern (in the given order) that still has an unsolved problem.
pub fn next_open_pattern(problems: &[Problem], ordered_patterns: &[String]) -> Option<String> {
    ordered_patterns
        .iter()
        .find(|pattern| {
            problems
                .iter()
                .any(|p| &p.pattern == *pattern && !p.is_completed())
        })
        .cloned()
}

pub fn first_pattern_in_catalog(problems: &[Problem]) -> Option<String> {
    problems
        .iter()
        .map(|p| &p.pattern)
        .find(|p| !p.is_empty())
        .cloned()
}
