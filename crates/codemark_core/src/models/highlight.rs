//! Highlight records as stored, persisted and exported.

use super::range::{Position, Range};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A colored, optionally commented text range in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: String,
    pub file_path: String,
    pub range: Range,
    /// Text under `range` when the highlight was created or last reconciled.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub color: String,
    /// Creation time in epoch milliseconds; used for list ordering only.
    pub timestamp: i64,
}

impl Highlight {
    /// Create a highlight with a fresh id.
    ///
    /// # Returns
    /// A new [`Highlight`]; blank comments are stored as `None`.
    pub fn new(
        file_path: impl Into<String>,
        range: Range,
        text: impl Into<String>,
        comment: Option<String>,
        color: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_path: file_path.into(),
            range,
            text: text.into(),
            comment: normalize_comment(comment),
            color: color.into(),
            timestamp,
        }
    }

    pub fn contains(&self, point: Position) -> bool {
        self.range.contains(point)
    }

    pub fn intersects(&self, range: &Range) -> bool {
        self.range.intersects(range)
    }

    /// Check the invariants a persisted record must satisfy before it is
    /// allowed into the store.
    ///
    /// # Errors
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("empty id".to_string());
        }
        if self.file_path.is_empty() {
            return Err(format!("highlight {} has an empty file path", self.id));
        }
        if !self.range.is_ordered() {
            return Err(format!(
                "highlight {} has a reversed range {}",
                self.id, self.range
            ));
        }
        Ok(())
    }
}

/// Drop a comment that carries no visible text.
///
/// # Returns
/// `None` when the input is missing or whitespace-only; otherwise the comment
/// exactly as entered.
pub fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment.filter(|raw| !raw.trim().is_empty())
}
