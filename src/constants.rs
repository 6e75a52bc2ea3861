// src/constants.rs

// --- Files ---
pub const CATALOG_FILE_NAME: &str = "neetcode_150.json";
pub const PROGRESS_FILE_NAME: &str = "progress.json";
pub const APP_DIR_NAME: &str = "dsa-mastery";

// --- Sentinels ---
pub const ANY_PATTERN: &str = "any";
pub const UNCATEGORIZED: &str = "Uncategorized";

// --- Pattern Vocabulary ---
// Also the recommended study order.
pub const DSA_MASTER_PATTERNS: [&str; 15] = [
    "Arrays & Hashing",
    "Two Pointers",
    "Sliding Window",
    "Stack",
    "Binary Search",
    "Linked List",
    "Tree",
    "Trie",
    "Heap",
    "Backtracking",
    "Graph",
    "Dynamic Programming",
    "Greedy",
    "Math & Geometry",
    "Bit Manipulation",
];

// Scraped NeetCode sheet column -> canonical pattern.
pub const CATEGORY_TO_PATTERN: [(&str, &str); 18] = [
    ("Arrays", "Arrays & Hashing"),
    ("Two Pointers", "Two Pointers"),
    ("Sliding Window", "Sliding Window"),
    ("Stack", "Stack"),
    ("Binary Search", "Binary Search"),
    ("Linked List", "Linked List"),
    ("Trees", "Tree"),
    ("Tries", "Trie"),
    ("Heap/Priority Queue", "Heap"),
    ("Backtracking", "Backtracking"),
    ("Graphs", "Graph"),
    ("Advanced Graphs", "Graph"),
    ("1-D DP", "Dynamic Programming"),
    ("2-D DP", "Dynamic Programming"),
    ("Greedy", "Greedy"),
    ("Intervals", "Arrays & Hashing"),
    ("Math & Geometry", "Math & Geometry"),
    ("Bit Manipulation", "Bit Manipulation"),
];

pub fn pattern_for_category(category: &str) -> Option<&'static str> {
    CATEGORY_TO_PATTERN
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, p)| *p)
}
