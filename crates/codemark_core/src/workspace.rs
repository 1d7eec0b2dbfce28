//! Workspace service: the store, its durable slot and change listeners.
//!
//! A [`Workspace`] is opened once per session and owns all highlight state.
//! Every successful mutation persists the full map and then notifies
//! subscribers, in that order.

use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::events::{ChangeEvent, ChangeKind, ChangeNotifier, SubscriptionId};
use crate::interchange::{ExportDocument, ImportMode};
use crate::models::{Highlight, Position, Range};
use crate::reconcile::{self, DocumentText, ReconcileOutcome, TextEdit};
use crate::store::HighlightStore;

/// Result of toggling highlights over a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Nothing overlapped; a new highlight was created.
    Added(Highlight),
    /// This many overlapping highlights were removed.
    Removed(usize),
    /// The selection was empty; nothing changed.
    EmptySelection,
}

/// Owner of the highlight store for one workspace.
pub struct Workspace {
    config: Config,
    db: Database,
    store: HighlightStore,
    notifier: ChangeNotifier,
}

impl Workspace {
    /// Open the state database named by `config` and load saved highlights.
    ///
    /// # Errors
    /// Returns an error when the database cannot be opened. An unreadable
    /// saved slot starts the workspace empty; malformed records are skipped.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let db = Database::new(&config.db_path)?;
        Self::with_database(config, db)
    }

    /// Load saved highlights from an already opened database.
    ///
    /// # Errors
    /// Returns an error when the state table cannot be read.
    pub fn with_database(config: Config, db: Database) -> Result<Self, AppError> {
        let loaded = db.highlights.load()?;
        if loaded.discarded {
            tracing::warn!("Saved highlight state was unreadable; starting empty");
        }
        if loaded.skipped > 0 {
            tracing::warn!(
                skipped = loaded.skipped,
                "Ignored malformed highlights in saved state"
            );
        }
        Ok(Self {
            config,
            db,
            store: HighlightStore::from_map(loaded.highlights),
            notifier: ChangeNotifier::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read-only view of the store.
    pub fn store(&self) -> &HighlightStore {
        &self.store
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Persist the current map. Safe to call any number of times.
    ///
    /// # Errors
    /// Returns an error when the write fails.
    pub fn save(&self) -> Result<(), AppError> {
        self.db.highlights.save(self.store.as_map())
    }

    /// Add a highlight; `color` falls back to the configured default.
    ///
    /// # Errors
    /// Returns an error when persisting fails. The highlight stays in memory.
    pub fn add(
        &mut self,
        file_path: &str,
        range: Range,
        text: &str,
        comment: Option<String>,
        color: Option<&str>,
    ) -> Result<Highlight, AppError> {
        let color = self.config.color_or_default(color);
        let highlight = self.store.add(file_path, range, text, comment, color);
        tracing::info!(
            id = %highlight.id,
            file = file_path,
            total = self.store.by_file(file_path).len(),
            "Highlight added"
        );
        self.commit(ChangeEvent::for_file(ChangeKind::Added, file_path))?;
        Ok(highlight)
    }

    /// Remove the first highlight containing `point`.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn remove_at(&mut self, file_path: &str, point: Position) -> Result<bool, AppError> {
        if !self.store.remove_at(file_path, point) {
            return Ok(false);
        }
        self.commit(ChangeEvent::for_file(ChangeKind::Removed, file_path))?;
        Ok(true)
    }

    /// Remove highlight `id` from `file_path`.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn remove(&mut self, file_path: &str, id: &str) -> Result<bool, AppError> {
        if !self.store.remove_by_id(file_path, id) {
            return Ok(false);
        }
        self.commit(ChangeEvent::for_file(ChangeKind::Removed, file_path))?;
        Ok(true)
    }

    /// Remove every highlight intersecting `range`.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn remove_in_range(&mut self, file_path: &str, range: &Range) -> Result<usize, AppError> {
        let removed = self.store.remove_in_range(file_path, range);
        if removed > 0 {
            tracing::info!(file = file_path, removed, "Removed highlights in range");
            self.commit(ChangeEvent::for_file(ChangeKind::Removed, file_path))?;
        }
        Ok(removed)
    }

    /// Remove overlapping highlights, or add one when nothing overlaps.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn toggle(
        &mut self,
        file_path: &str,
        selection: Range,
        text: &str,
        color: Option<&str>,
    ) -> Result<ToggleOutcome, AppError> {
        if selection.is_empty() {
            tracing::debug!("Empty selection, skipping toggle");
            return Ok(ToggleOutcome::EmptySelection);
        }
        if self.store.find_intersecting(file_path, &selection).is_empty() {
            let highlight = self.add(file_path, selection, text, None, color)?;
            return Ok(ToggleOutcome::Added(highlight));
        }
        let removed = self.remove_in_range(file_path, &selection)?;
        Ok(ToggleOutcome::Removed(removed))
    }

    /// Clear one file, or every file when `file_path` is `None`.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn clear(&mut self, file_path: Option<&str>) -> Result<usize, AppError> {
        let removed = self.store.clear(file_path);
        if removed > 0 {
            tracing::info!(file = file_path.unwrap_or("*"), removed, "Highlights cleared");
            let event = match file_path {
                Some(file_path) => ChangeEvent::for_file(ChangeKind::Cleared, file_path),
                None => ChangeEvent::global(ChangeKind::Cleared),
            };
            self.commit(event)?;
        }
        Ok(removed)
    }

    /// Set or clear the comment of highlight `id`.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn set_comment(
        &mut self,
        file_path: &str,
        id: &str,
        comment: Option<String>,
    ) -> Result<bool, AppError> {
        if !self.store.set_comment(id, file_path, comment) {
            return Ok(false);
        }
        self.commit(ChangeEvent::for_file(ChangeKind::CommentChanged, file_path))?;
        Ok(true)
    }

    /// Reconcile one document change event for `file_path`.
    ///
    /// `document` must reflect the text after all `edits` were applied.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn apply_edits(
        &mut self,
        file_path: &str,
        edits: &[TextEdit],
        document: &dyn DocumentText,
    ) -> Result<ReconcileOutcome, AppError> {
        let outcome = reconcile::reconcile(&mut self.store, file_path, edits, document);
        if outcome.changed() {
            self.commit(ChangeEvent::for_file(ChangeKind::Reconciled, file_path))?;
        }
        Ok(outcome)
    }

    /// Snapshot every highlight (most recent first) into an export document.
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(self.store.all().into_iter().cloned().collect())
    }

    /// Bring parsed highlights into the store.
    ///
    /// # Returns
    /// Number of highlights imported.
    ///
    /// # Errors
    /// Returns an error when persisting fails.
    pub fn import(&mut self, highlights: Vec<Highlight>, mode: ImportMode) -> Result<usize, AppError> {
        let count = highlights.len();
        match mode {
            ImportMode::Merge => self.store.merge(highlights),
            ImportMode::Replace => self.store.replace_all(highlights),
        }
        tracing::info!(count, ?mode, "Imported highlights");
        self.commit(ChangeEvent::global(ChangeKind::Imported))?;
        Ok(count)
    }

    /// Re-send a change notification without touching state.
    pub fn refresh(&mut self) {
        self.notifier.notify(&ChangeEvent::global(ChangeKind::Refreshed));
    }

    fn commit(&mut self, event: ChangeEvent) -> Result<(), AppError> {
        let saved = self.save();
        if let Err(err) = &saved {
            tracing::error!("Failed to persist highlights: {}", err);
        }
        self.notifier.notify(&event);
        saved
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("config", &self.config)
            .field("highlights", &self.store.len())
            .field("files", &self.store.file_count())
            .finish()
    }
}
