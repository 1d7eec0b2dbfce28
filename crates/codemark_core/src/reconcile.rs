//! Keeps stored highlights in step with edits to their document.
//!
//! Only line-level shifting is tracked. An edit that lands inside or across a
//! highlight refreshes the cached text under the old range but never resizes
//! the range itself.

use crate::models::Range;
use crate::store::HighlightStore;

/// One replaced span from a document change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Span of the pre-edit document that was replaced.
    pub range: Range,
    /// Replacement text.
    pub text: String,
}

impl TextEdit {
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Net number of lines this edit adds (negative when it removes lines).
    pub fn line_delta(&self) -> i64 {
        let inserted = self.text.matches('\n').count() as i64;
        inserted - i64::from(self.range.line_span())
    }
}

/// Read access to the current (post-edit) text of a document.
pub trait DocumentText {
    /// Text covered by `range`, clamped to the document bounds.
    fn text_in(&self, range: &Range) -> String;
}

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Highlights whose lines moved.
    pub shifted: usize,
    /// Highlights whose cached text was re-read.
    pub refreshed: usize,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        self.shifted > 0 || self.refreshed > 0
    }
}

/// Apply the edits of one change event to the highlights of `file_path`.
///
/// Edits are processed in the order given, each against every highlight of
/// the file. Highlights of other files are never touched.
///
/// # Returns
/// Counts of shifted and refreshed highlights; counts are per (edit,
/// highlight) pair that actually changed something.
pub fn reconcile(
    store: &mut HighlightStore,
    file_path: &str,
    edits: &[TextEdit],
    document: &dyn DocumentText,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let Some(highlights) = store.file_mut(file_path) else {
        return outcome;
    };

    for edit in edits {
        let delta = edit.line_delta();
        for highlight in highlights.iter_mut() {
            if edit.range.end < highlight.range.start {
                if delta != 0 {
                    highlight.range.shift_lines(delta, 0);
                    outcome.shifted += 1;
                }
            } else if edit.range.start >= highlight.range.end {
                // Edit is after the highlight.
            } else {
                let live = document.text_in(&highlight.range);
                if live != highlight.text {
                    highlight.text = live;
                    outcome.refreshed += 1;
                }
            }
        }
    }

    if outcome.changed() {
        tracing::debug!(
            file = file_path,
            shifted = outcome.shifted,
            refreshed = outcome.refreshed,
            "highlights reconciled"
        );
    }
    outcome
}
