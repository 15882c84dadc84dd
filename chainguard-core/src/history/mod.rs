//! Append-only history log and the bounded, similarity-searchable error
//! index (§4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Edit,
    Create,
    Delete,
}

/// One line of `history.jsonl` (§3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    pub file: String,
    pub action: FileAction,
    /// `"PASS"` or `"FAIL:<msg>"`.
    pub validation: String,
    pub scope_id: Option<String>,
    pub scope_desc: Option<String>,
    #[serde(default)]
    pub fix_applied: Option<String>,
}

/// One entry of `error_index.json` (§3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub ts: DateTime<Utc>,
    pub file_pattern: String,
    pub error_type: String,
    pub error_msg: String,
    pub scope_desc: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Splits a `PascalCase`/`camelCase` identifier into its constituent words.
fn camel_words(stem: &str) -> Vec<&str> {
    let mut starts = vec![0];
    let chars: Vec<char> = stem.chars().collect();
    for i in 1..chars.len() {
        if chars[i].is_uppercase() && !chars[i - 1].is_uppercase() {
            starts.push(i);
        }
    }
    starts
        .windows(2)
        .map(|w| &stem[w[0]..w[1]])
        .chain(starts.last().map(|&last| &stem[last..]))
        .collect()
}

/// Derives `file_pattern` by replacing the non-suffix stem with `*`
/// (`UserController.php` → `*Controller.php`) (§3).
pub fn file_pattern(file: &str) -> String {
    let name = file.rsplit('/').next().unwrap_or(file);
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };

    let words = camel_words(stem);
    let pattern_stem = match words.last() {
        Some(last) if words.len() > 1 => format!("*{last}"),
        _ => "*".to_string(),
    };

    match ext {
        Some(ext) => format!("{pattern_stem}.{ext}"),
        None => pattern_stem,
    }
}

/// The single tokenizer used by every similarity scorer in the crate
/// (frozen, §4.7 / §9): lower-case, split on non-alphanumeric runs, drop
/// empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn token_overlap_score(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: std::collections::HashSet<&String> = a.iter().collect();
    let set_b: std::collections::HashSet<&String> = b.iter().collect();
    let overlap = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        overlap as f64 / union as f64
    }
}

impl ErrorEntry {
    /// Combined token-overlap score against `error_msg`, `file_pattern`,
    /// and `scope_desc`, in `[0, 1]`.
    pub fn matches(&self, query: &str) -> f64 {
        let query_tokens = tokenize(query);
        let msg_score = token_overlap_score(&query_tokens, &tokenize(&self.error_msg));
        let pattern_score = token_overlap_score(&query_tokens, &tokenize(&self.file_pattern));
        let desc_score = self
            .scope_desc
            .as_deref()
            .map(|d| token_overlap_score(&query_tokens, &tokenize(d)))
            .unwrap_or(0.0);

        msg_score * 0.6 + pattern_score * 0.25 + desc_score * 0.15
    }
}

/// Bounded FIFO error index (cap 100, §4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorIndex {
    entries: Vec<ErrorEntry>,
    cap: usize,
}

impl ErrorIndex {
    pub fn new(cap: usize) -> Self {
        Self { entries: Vec::new(), cap }
    }

    pub fn push(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
        while self.entries.len() > self.cap {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ErrorEntry] {
        &mut self.entries
    }

    /// Up to `max_results` resolved entries scoring above `threshold`,
    /// best first (§4.7).
    pub fn find_similar_errors(&self, query: &str, threshold: f64, max_results: usize) -> Vec<&ErrorEntry> {
        let mut scored: Vec<(f64, &ErrorEntry)> = self
            .entries
            .iter()
            .filter(|e| e.resolution.is_some())
            .map(|e| (e.matches(query), e))
            .filter(|(score, _)| *score > threshold)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(max_results).map(|(_, e)| e).collect()
    }

    /// Best matches regardless of resolution (`recall`, §4.7).
    pub fn recall(&self, query: &str, limit: usize) -> Vec<&ErrorEntry> {
        let mut scored: Vec<(f64, &ErrorEntry)> =
            self.entries.iter().map(|e| (e.matches(query), e)).collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(limit).map(|(_, e)| e).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(error_msg: &str, file_pattern: &str, resolution: Option<&str>) -> ErrorEntry {
        ErrorEntry {
            ts: Utc::now(),
            file_pattern: file_pattern.to_string(),
            error_type: "SyntaxError".to_string(),
            error_msg: error_msg.to_string(),
            scope_desc: None,
            project_id: "proj".to_string(),
            resolution: resolution.map(str::to_string),
        }
    }

    #[test]
    fn file_pattern_keeps_capitalized_suffix() {
        assert_eq!(file_pattern("UserController.php"), "*Controller.php");
        assert_eq!(file_pattern("src/OrderController.php"), "*Controller.php");
    }

    #[test]
    fn file_pattern_handles_no_suffix_match() {
        assert_eq!(file_pattern("index.php"), "*.php");
    }

    #[test]
    fn tokenizer_lowercases_and_splits() {
        assert_eq!(tokenize("Parse error: unexpected '{'"), vec!["parse", "error", "unexpected"]);
    }

    #[test]
    fn find_similar_errors_requires_resolution_and_threshold() {
        let mut index = ErrorIndex::new(100);
        index.push(entry("unexpected token brace", "*Controller.php", Some("add missing semicolon")));
        index.push(entry("totally unrelated message", "*.py", None));

        let results = index.find_similar_errors("unexpected token brace in *Controller.php", 0.2, 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resolution.as_deref(), Some("add missing semicolon"));
    }

    #[test]
    fn index_is_bounded_fifo() {
        let mut index = ErrorIndex::new(2);
        index.push(entry("a", "*.php", None));
        index.push(entry("b", "*.php", None));
        index.push(entry("c", "*.php", None));
        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.entries()[0].error_msg, "b");
    }
}
