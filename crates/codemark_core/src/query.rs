//! Read-side derivations for list and tree views.
//!
//! Everything here borrows the store and returns fresh values; nothing
//! mutates highlights.

use crate::constants::{BUILTIN_PALETTE, PREVIEW_MAX_CHARS};
use crate::models::Highlight;
use crate::store::HighlightStore;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Highlight count for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file_path: String,
    pub file_name: String,
    pub count: usize,
}

impl FileSummary {
    /// Display label, e.g. `main.rs (3)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.file_name, self.count)
    }
}

/// Entry in the flat "list all highlights" picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// `file_name:line` with a 1-based line.
    pub label: String,
    pub description: String,
    pub detail: String,
    pub file_path: String,
    pub id: String,
}

/// Child node under a file in the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    /// Color name of the highlight.
    pub description: String,
    pub tooltip: String,
    pub has_comment: bool,
    pub file_path: String,
    pub id: String,
}

/// Last path segment, splitting on both `/` and `\`.
///
/// A path ending in a separator has an empty last segment and is returned
/// whole.
pub fn file_name(path: &str) -> &str {
    match path.rsplit(['/', '\\']).next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => path,
    }
}

/// Single-line preview of highlight text.
///
/// Keeps the first 50 characters, turns line breaks into spaces and appends
/// `...` when the text was longer.
pub fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
    let mut line = head.replace("\r\n", " ").replace(['\n', '\r'], " ");
    if text.chars().count() > PREVIEW_MAX_CHARS {
        line.push_str("...");
    }
    line
}

/// Human name of a palette color; unknown colors pass through unchanged.
pub fn color_name(color: &str) -> Cow<'_, str> {
    BUILTIN_PALETTE
        .iter()
        .find(|(value, _)| value.eq_ignore_ascii_case(color))
        .map_or(Cow::Borrowed(color), |(_, name)| Cow::Borrowed(*name))
}

/// Hover text for a highlight.
pub fn tooltip(highlight: &Highlight) -> String {
    let line = highlight.range.start.line + 1;
    match highlight.comment.as_deref() {
        Some(comment) => format!(
            "Line {}\n\nComment: {}\n\nText: {}",
            line, comment, highlight.text
        ),
        None => format!("Line {}\n\nText: {}", line, highlight.text),
    }
}

/// Per-file highlight counts, sorted by display label.
pub fn file_summaries(store: &HighlightStore) -> Vec<FileSummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for highlight in store.all() {
        *counts.entry(highlight.file_path.as_str()).or_insert(0) += 1;
    }

    let mut summaries: Vec<FileSummary> = counts
        .into_iter()
        .map(|(file_path, count)| FileSummary {
            file_path: file_path.to_string(),
            file_name: file_name(file_path).to_string(),
            count,
        })
        .collect();
    summaries.sort_by_cached_key(|summary| {
        let label = summary.label();
        (label.to_lowercase(), label)
    });
    summaries
}

/// Picker entries for every highlight, most recent first.
pub fn list_entries(store: &HighlightStore) -> Vec<ListEntry> {
    store
        .all()
        .into_iter()
        .map(|highlight| ListEntry {
            label: format!(
                "{}:{}",
                file_name(&highlight.file_path),
                highlight.range.start.line + 1
            ),
            description: preview(&highlight.text),
            detail: highlight
                .comment
                .clone()
                .unwrap_or_else(|| "(no comment)".to_string()),
            file_path: highlight.file_path.clone(),
            id: highlight.id.clone(),
        })
        .collect()
}

/// Tree children for one file, in creation order.
pub fn tree_items(store: &HighlightStore, file_path: &str) -> Vec<TreeItem> {
    store
        .by_file(file_path)
        .iter()
        .map(|highlight| TreeItem {
            label: preview(&highlight.text),
            description: color_name(&highlight.color).into_owned(),
            tooltip: tooltip(highlight),
            has_comment: highlight.comment.is_some(),
            file_path: highlight.file_path.clone(),
            id: highlight.id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Range;

    fn store() -> HighlightStore {
        let mut store = HighlightStore::new();
        store.add("/w/src/zeta.rs", Range::from_coords(0, 0, 0, 3), "one", None, "#FFFF0066");
        store.add(
            "C:\\w\\Alpha.rs",
            Range::from_coords(9, 0, 9, 3),
            "two",
            Some("check".into()),
            "#ffa50066",
        );
        store.add("/w/src/zeta.rs", Range::from_coords(4, 0, 5, 1), "three\nlines", None, "#123456");
        store
    }

    #[test]
    fn file_name_handles_both_separators() {
        assert_eq!(file_name("/a/b/c.rs"), "c.rs");
        assert_eq!(file_name("C:\\a\\b.rs"), "b.rs");
        assert_eq!(file_name("plain.rs"), "plain.rs");
    }

    #[test]
    fn file_name_of_trailing_separator_is_the_whole_path() {
        assert_eq!(file_name("dir/"), "dir/");
        assert_eq!(file_name("C:\\src\\"), "C:\\src\\");
        assert_eq!(file_name(""), "");
    }

    #[test]
    fn preview_truncates_and_collapses_newlines() {
        assert_eq!(preview("short\ntext"), "short text");
        assert_eq!(preview("crlf\r\nline"), "crlf line");

        let exact: String = "x".repeat(50);
        assert_eq!(preview(&exact), exact);

        let long: String = format!("{}tail", "é".repeat(50));
        let shown = preview(&long);
        assert_eq!(shown, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn color_name_is_case_insensitive_and_passes_unknown_through() {
        assert_eq!(color_name("#FFFF0066"), "Yellow");
        assert_eq!(color_name("#ffa50066"), "Orange");
        assert_eq!(color_name("#123456"), "#123456");
    }

    #[test]
    fn tooltip_mentions_comment_only_when_present() {
        let store = store();
        let all = store.all();
        let commented = all.iter().find(|h| h.comment.is_some()).expect("commented");
        assert_eq!(tooltip(commented), "Line 10\n\nComment: check\n\nText: two");
        let plain = store.by_file("/w/src/zeta.rs")[0].clone();
        assert_eq!(tooltip(&plain), "Line 1\n\nText: one");
    }

    #[test]
    fn file_summaries_group_and_sort_by_label() {
        let summaries = file_summaries(&store());
        let labels: Vec<String> = summaries.iter().map(FileSummary::label).collect();
        assert_eq!(labels, vec!["Alpha.rs (1)", "zeta.rs (2)"]);
        assert_eq!(summaries[1].file_path, "/w/src/zeta.rs");
    }

    #[test]
    fn list_entries_follow_recency_order() {
        let entries = list_entries(&store());
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["zeta.rs:5", "Alpha.rs:10", "zeta.rs:1"]);
        assert_eq!(entries[0].description, "three lines");
        assert_eq!(entries[0].detail, "(no comment)");
        assert_eq!(entries[1].detail, "check");
    }

    #[test]
    fn tree_items_keep_creation_order_and_color_names() {
        let items = tree_items(&store(), "/w/src/zeta.rs");
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["one", "three lines"]);
        assert_eq!(items[0].description, "Yellow");
        assert_eq!(items[1].description, "#123456");
        assert!(!items[0].has_comment);
        assert!(tree_items(&store(), "/missing").is_empty());
    }
}
