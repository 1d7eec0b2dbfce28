//! In-memory highlight store keyed by file path.
//!
//! The store is the single owner of highlight records. Each file maps to its
//! highlights in creation order; files without highlights are never kept as
//! empty entries. No operation here can fail: unknown files simply produce
//! empty results.

use crate::models::highlight::normalize_comment;
use crate::models::{Highlight, Position, Range};
use chrono::Utc;
use std::collections::BTreeMap;

/// File path to ordered highlights.
pub type HighlightMap = BTreeMap<String, Vec<Highlight>>;

/// Hands out strictly increasing epoch-millisecond timestamps.
#[derive(Debug, Default, Clone)]
struct MonotonicClock {
    last: i64,
}

impl MonotonicClock {
    fn next(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last.saturating_add(1));
        self.last
    }

    fn observe(&mut self, timestamp: i64) {
        self.last = self.last.max(timestamp);
    }
}

/// Authoritative mapping from file path to highlight records.
#[derive(Debug, Default, Clone)]
pub struct HighlightStore {
    files: HighlightMap,
    clock: MonotonicClock,
}

impl HighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a persisted map, dropping empty file entries.
    pub fn from_map(map: HighlightMap) -> Self {
        let mut store = Self::new();
        for (file_path, highlights) in map {
            if highlights.is_empty() {
                continue;
            }
            for highlight in &highlights {
                store.clock.observe(highlight.timestamp);
            }
            store.files.insert(file_path, highlights);
        }
        store
    }

    /// Borrow the backing map for persistence.
    pub fn as_map(&self) -> &HighlightMap {
        &self.files
    }

    /// Append a new highlight to `file_path`.
    ///
    /// The range is not checked against any document; callers pass ranges
    /// taken from the live editor.
    ///
    /// # Returns
    /// A copy of the stored record.
    pub fn add(
        &mut self,
        file_path: &str,
        range: Range,
        text: impl Into<String>,
        comment: Option<String>,
        color: impl Into<String>,
    ) -> Highlight {
        let highlight = Highlight::new(
            file_path,
            range,
            text,
            comment,
            color,
            self.clock.next(),
        );
        self.files
            .entry(file_path.to_string())
            .or_default()
            .push(highlight.clone());
        tracing::debug!(
            id = %highlight.id,
            file = file_path,
            range = %highlight.range,
            "highlight added"
        );
        highlight
    }

    /// Remove the first highlight (in creation order) containing `point`.
    ///
    /// # Returns
    /// `true` when a highlight was removed.
    pub fn remove_at(&mut self, file_path: &str, point: Position) -> bool {
        let Some(highlights) = self.files.get_mut(file_path) else {
            return false;
        };
        let Some(index) = highlights.iter().position(|h| h.contains(point)) else {
            return false;
        };
        let removed = highlights.remove(index);
        tracing::debug!(id = %removed.id, file = file_path, "highlight removed");
        self.prune(file_path);
        true
    }

    /// Remove the highlight with `id` from `file_path`.
    ///
    /// # Returns
    /// `true` when the highlight existed.
    pub fn remove_by_id(&mut self, file_path: &str, id: &str) -> bool {
        let Some(highlights) = self.files.get_mut(file_path) else {
            return false;
        };
        let Some(index) = highlights.iter().position(|h| h.id == id) else {
            return false;
        };
        highlights.remove(index);
        tracing::debug!(id, file = file_path, "highlight removed");
        self.prune(file_path);
        true
    }

    /// Remove every highlight in `file_path` intersecting `range`.
    ///
    /// # Returns
    /// Number of highlights removed.
    pub fn remove_in_range(&mut self, file_path: &str, range: &Range) -> usize {
        let Some(highlights) = self.files.get_mut(file_path) else {
            return 0;
        };
        let before = highlights.len();
        highlights.retain(|h| !h.intersects(range));
        let removed = before - highlights.len();
        if removed > 0 {
            tracing::debug!(file = file_path, removed, range = %range, "highlights removed in range");
        }
        self.prune(file_path);
        removed
    }

    /// First highlight (in creation order) whose range contains `point`.
    pub fn find_at_position(&self, file_path: &str, point: Position) -> Option<&Highlight> {
        self.by_file(file_path).iter().find(|h| h.contains(point))
    }

    /// All highlights intersecting `range`, in creation order.
    pub fn find_intersecting(&self, file_path: &str, range: &Range) -> Vec<&Highlight> {
        self.by_file(file_path)
            .iter()
            .filter(|h| h.intersects(range))
            .collect()
    }

    /// Clear one file, or the whole store when `file_path` is `None`.
    ///
    /// # Returns
    /// Number of highlights removed.
    pub fn clear(&mut self, file_path: Option<&str>) -> usize {
        match file_path {
            Some(file_path) => self
                .files
                .remove(file_path)
                .map_or(0, |highlights| highlights.len()),
            None => {
                let removed = self.len();
                self.files.clear();
                removed
            }
        }
    }

    /// Every highlight, most recent first.
    ///
    /// Equal timestamps keep the flattened map order.
    pub fn all(&self) -> Vec<&Highlight> {
        let mut all: Vec<&Highlight> = self.files.values().flatten().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }

    /// Highlights of one file in creation order.
    pub fn by_file(&self, file_path: &str) -> &[Highlight] {
        self.files.get(file_path).map_or(&[], Vec::as_slice)
    }

    pub fn get(&self, file_path: &str, id: &str) -> Option<&Highlight> {
        self.by_file(file_path).iter().find(|h| h.id == id)
    }

    /// Replace the comment of highlight `id` in `file_path` in place.
    ///
    /// Blank comments clear the field.
    ///
    /// # Returns
    /// `true` when the highlight exists.
    pub fn set_comment(&mut self, id: &str, file_path: &str, comment: Option<String>) -> bool {
        let Some(highlight) = self
            .files
            .get_mut(file_path)
            .and_then(|highlights| highlights.iter_mut().find(|h| h.id == id))
        else {
            return false;
        };
        highlight.comment = normalize_comment(comment);
        true
    }

    /// Append records as they are, grouped by their own `file_path`.
    ///
    /// Ids are kept verbatim, so merging the same records twice duplicates
    /// them.
    pub fn merge(&mut self, highlights: Vec<Highlight>) {
        for highlight in highlights {
            self.clock.observe(highlight.timestamp);
            self.files
                .entry(highlight.file_path.clone())
                .or_default()
                .push(highlight);
        }
    }

    /// Drop everything and load `highlights` instead.
    pub fn replace_all(&mut self, highlights: Vec<Highlight>) {
        self.files.clear();
        self.merge(highlights);
    }

    /// Paths of files with at least one highlight, in map order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn file_mut(&mut self, file_path: &str) -> Option<&mut Vec<Highlight>> {
        self.files.get_mut(file_path)
    }

    fn prune(&mut self, file_path: &str) {
        if self
            .files
            .get(file_path)
            .is_some_and(|highlights| highlights.is_empty())
        {
            self.files.remove(file_path);
        }
    }
}
