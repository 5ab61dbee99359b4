//! Fuzzy suggestions for the search bar.

mod catalog;

pub use catalog::ICEBREAKERS;

use serde::Serialize;
use std::ops::Range;

/// Minimum similarity for a fuzzy (non-substring) match.
const MIN_SIMILARITY: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Ticker,
    Index,
    Account,
    Term,
    Metric,
    Question,
    Topic,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Ticker => "ticker",
            SuggestionKind::Index => "index",
            SuggestionKind::Account => "account",
            SuggestionKind::Term => "term",
            SuggestionKind::Metric => "metric",
            SuggestionKind::Question => "question",
            SuggestionKind::Topic => "topic",
        }
    }

    /// Group heading; plain `s` suffix ("Indexs" included).
    pub fn heading(self) -> String {
        let name = self.as_str();
        let mut out = String::with_capacity(name.len() + 1);
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
        }
        out.push_str(chars.as_str());
        out.push('s');
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub value: &'static str,
    pub kind: SuggestionKind,
    pub score: f64,
    /// Byte range of the first case-insensitive occurrence of the input.
    pub highlight: Option<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionGroup {
    pub kind: SuggestionKind,
    pub heading: String,
    pub items: Vec<Suggestion>,
}

/// Best matches first; empty input yields nothing.
pub fn search(input: &str) -> Vec<Suggestion> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<Suggestion> = catalog::CATALOG
        .iter()
        .filter_map(|&(value, kind)| {
            let haystack = value.to_lowercase();
            let score = score(&needle, &haystack);
            (score >= MIN_SIMILARITY).then(|| Suggestion {
                value,
                kind,
                score,
                highlight: highlight(value, &haystack, &needle),
            })
        })
        .collect();

    // Stable: equal scores keep catalog order.
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}

/// Groups in order of first appearance.
pub fn group(suggestions: Vec<Suggestion>) -> Vec<SuggestionGroup> {
    let mut groups: Vec<SuggestionGroup> = Vec::new();
    for suggestion in suggestions {
        match groups.iter_mut().find(|g| g.kind == suggestion.kind) {
            Some(group) => group.items.push(suggestion),
            None => groups.push(SuggestionGroup {
                kind: suggestion.kind,
                heading: suggestion.kind.heading(),
                items: vec![suggestion],
            }),
        }
    }
    groups
}

fn score(needle: &str, haystack: &str) -> f64 {
    if let Some(pos) = haystack.find(needle) {
        return if pos == 0 { 1.0 } else { 0.95 };
    }

    let hay: Vec<char> = haystack.chars().collect();
    let width = needle.chars().count();
    if hay.len() <= width {
        return strsim::normalized_levenshtein(needle, haystack);
    }

    hay.windows(width)
        .map(|w| strsim::normalized_levenshtein(needle, &w.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

fn highlight(value: &str, lowered: &str, needle: &str) -> Option<Range<usize>> {
    // Byte offsets only line up when lowercasing kept the length.
    if lowered.len() != value.len() {
        return None;
    }
    let start = lowered.find(needle)?;
    Some(start..start + needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_suggestions() {
        assert!(search("").is_empty());
        assert!(search("   ").is_empty());
    }

    #[test]
    fn case_insensitive_prefix_ranks_first() {
        let results = search("aapl");
        assert_eq!(results[0].value, "AAPL");
        assert_eq!(results[0].kind, SuggestionKind::Ticker);
        assert_eq!(results[0].highlight, Some(0..4));
    }

    #[test]
    fn tolerates_typos() {
        let results = search("dividnd");
        assert!(results.iter().any(|s| s.value == "Dividend Yield"));
        assert!(results.iter().all(|s| s.score >= MIN_SIMILARITY));
    }

    #[test]
    fn unrelated_input_matches_nothing() {
        assert!(search("zzzzqqqq").is_empty());
    }

    #[test]
    fn highlight_marks_the_substring() {
        let results = search("yield");
        let dividend = results.iter().find(|s| s.value == "Dividend Yield").unwrap();
        assert_eq!(dividend.highlight, Some(9..14));
        assert_eq!(&dividend.value[9..14], "Yield");
    }

    #[test]
    fn groups_by_kind_in_first_appearance_order() {
        let groups = group(search("market"));
        assert!(!groups.is_empty());
        let headings: Vec<_> = groups.iter().map(|g| g.heading.as_str()).collect();
        let mut deduped = headings.clone();
        deduped.dedup();
        assert_eq!(headings, deduped);
        assert!(groups.iter().all(|g| g.items.iter().all(|s| s.kind == g.kind)));
    }

    #[test]
    fn headings_use_simple_pluralization() {
        assert_eq!(SuggestionKind::Ticker.heading(), "Tickers");
        assert_eq!(SuggestionKind::Index.heading(), "Indexs");
    }
}
