//! User-facing command entry points.
//!
//! Every command gathers its input from the [`Host`] before touching the
//! workspace, so a cancelled prompt never leaves a partial change behind.
//! Failures surface to the user as a generic message; details go to the log.

use crate::constants::DEFAULT_EXPORT_FILE_NAME;
use crate::error::AppError;
use crate::interchange::{self, ImportMode, INVALID_FORMAT};
use crate::models::{Highlight, Position, Range};
use crate::query;
use crate::workspace::{ToggleOutcome, Workspace};
use std::path::PathBuf;

const NO_EDITOR: &str = "No active editor";
const EMPTY_SELECTION: &str = "Please select some text to highlight";
const NO_HIGHLIGHT_AT_CURSOR: &str = "No highlight at cursor position";
const CURRENT_FILE: &str = "Current File";
const ALL_FILES: &str = "All Files";

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Snapshot of the focused editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorContext {
    pub file_path: String,
    pub selection: Range,
    pub cursor: Position,
    /// Document text covered by `selection`.
    pub selected_text: String,
}

impl EditorContext {
    /// Context whose cursor sits at the end of `selection`.
    pub fn new(file_path: impl Into<String>, selection: Range, selected_text: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            selection,
            cursor: selection.end,
            selected_text: selected_text.into(),
        }
    }
}

/// Reference to one stored highlight, as carried by tree and list items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighlightRef {
    pub file_path: String,
    pub id: String,
}

impl HighlightRef {
    pub fn new(file_path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            id: id.into(),
        }
    }
}

impl From<&Highlight> for HighlightRef {
    fn from(highlight: &Highlight) -> Self {
        Self::new(highlight.file_path.as_str(), highlight.id.as_str())
    }
}

/// One choice offered by [`Host::pick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl PickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            detail: None,
        }
    }
}

/// Editor surface the commands talk to.
///
/// Every prompt returns `None` when the user cancels.
pub trait Host {
    fn active_editor(&self) -> Option<EditorContext>;

    /// Ask for a line of text, pre-filled with `initial`.
    fn prompt_text(&mut self, prompt: &str, initial: Option<&str>) -> Option<String>;

    /// Ask the user to choose one of `items`; returns its index.
    fn pick(&mut self, placeholder: &str, items: &[PickItem]) -> Option<usize>;

    /// Ask where to write an export, suggesting `default_name`.
    fn save_location(&mut self, default_name: &str) -> Option<PathBuf>;

    /// Ask which file to import.
    fn open_location(&mut self) -> Option<PathBuf>;

    fn notify(&mut self, level: NoticeLevel, message: &str);

    /// Open `file_path` and select `range`.
    fn reveal(&mut self, file_path: &str, range: Range);
}

/// Commands a host can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a highlight over the selection, or remove what it overlaps.
    Toggle { color: Option<String> },
    /// Prompt for a comment and a color, then add.
    Add,
    /// Quick add with a fixed color; an empty selection is ignored silently.
    AddWithColor(String),
    /// Remove the highlight under the cursor.
    Remove,
    /// Clear the current file or every file.
    Clear,
    /// Pick from all highlights and reveal the choice.
    List,
    /// Edit the comment of `target`, or of the highlight under the cursor.
    EditComment { target: Option<HighlightRef> },
    DeleteFromTree(HighlightRef),
    Export,
    Import,
    JumpTo(HighlightRef),
    /// Re-send the change notification.
    Refresh,
}

impl Command {
    /// Verb phrase used in failure messages.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Toggle { .. } => "toggle highlight",
            Self::Add | Self::AddWithColor(_) => "add highlight",
            Self::Remove | Self::DeleteFromTree(_) => "remove highlight",
            Self::Clear => "clear highlights",
            Self::List => "list highlights",
            Self::EditComment { .. } => "update comment",
            Self::Export => "export highlights",
            Self::Import => "import highlights",
            Self::JumpTo(_) => "open highlight",
            Self::Refresh => "refresh highlights",
        }
    }
}

/// Dispatcher binding commands to one workspace.
#[derive(Debug)]
pub struct Commands {
    workspace: Workspace,
}

impl Commands {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Run `command`, reporting any failure through `host`.
    ///
    /// # Returns
    /// `false` when the command failed unexpectedly.
    pub fn dispatch(&mut self, host: &mut dyn Host, command: Command) -> bool {
        let action = command.action();
        tracing::debug!(?command, "dispatching command");
        match self.run(host, command) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("Failed to {}: {:?}", action, err);
                host.notify(
                    NoticeLevel::Error,
                    &format!("Failed to {}. Check the log for details.", action),
                );
                false
            }
        }
    }

    fn run(&mut self, host: &mut dyn Host, command: Command) -> Result<(), AppError> {
        match command {
            Command::Toggle { color } => self.toggle(host, color.as_deref()),
            Command::Add => self.add(host),
            Command::AddWithColor(color) => self.add_with_color(host, &color),
            Command::Remove => self.remove(host),
            Command::Clear => self.clear(host),
            Command::List => {
                self.list(host);
                Ok(())
            }
            Command::EditComment { target } => self.edit_comment(host, target),
            Command::DeleteFromTree(target) => self.delete(host, &target),
            Command::Export => self.export(host),
            Command::Import => self.import(host),
            Command::JumpTo(target) => {
                self.jump(host, &target);
                Ok(())
            }
            Command::Refresh => {
                self.workspace.refresh();
                host.notify(NoticeLevel::Info, "Highlights refreshed");
                Ok(())
            }
        }
    }

    fn toggle(&mut self, host: &mut dyn Host, color: Option<&str>) -> Result<(), AppError> {
        let Some(editor) = require_selection(host) else {
            return Ok(());
        };
        let outcome = self.workspace.toggle(
            &editor.file_path,
            editor.selection,
            &editor.selected_text,
            color,
        )?;
        match outcome {
            ToggleOutcome::Added(_) => host.notify(NoticeLevel::Info, "Highlight added!"),
            ToggleOutcome::Removed(removed) => host.notify(
                NoticeLevel::Info,
                &format!("Removed {} highlight(s)", removed),
            ),
            ToggleOutcome::EmptySelection => host.notify(NoticeLevel::Warning, EMPTY_SELECTION),
        }
        Ok(())
    }

    fn add(&mut self, host: &mut dyn Host) -> Result<(), AppError> {
        let Some(editor) = require_selection(host) else {
            return Ok(());
        };
        tracing::debug!(file = %editor.file_path, selection = %editor.selection, "add requested");

        let Some(comment) = host.prompt_text("Add a comment (optional - press Enter to skip)", None)
        else {
            tracing::debug!("comment prompt cancelled");
            return Ok(());
        };

        let colors = &self.workspace.config().colors;
        let items: Vec<PickItem> = colors
            .iter()
            .map(|color| PickItem {
                label: query::color_name(color).into_owned(),
                description: Some(color.clone()),
                detail: None,
            })
            .collect();
        let Some(index) = host.pick("Select highlight color", &items) else {
            tracing::debug!("color pick cancelled");
            return Ok(());
        };
        let color = colors.get(index).cloned();

        self.workspace.add(
            &editor.file_path,
            editor.selection,
            &editor.selected_text,
            Some(comment),
            color.as_deref(),
        )?;
        host.notify(NoticeLevel::Info, "Highlight added!");
        Ok(())
    }

    fn add_with_color(&mut self, host: &mut dyn Host, color: &str) -> Result<(), AppError> {
        let Some(editor) = host.active_editor() else {
            return Ok(());
        };
        if editor.selection.is_empty() {
            tracing::debug!("empty selection, skipping quick add");
            return Ok(());
        }
        self.workspace.add(
            &editor.file_path,
            editor.selection,
            &editor.selected_text,
            None,
            Some(color),
        )?;
        Ok(())
    }

    fn remove(&mut self, host: &mut dyn Host) -> Result<(), AppError> {
        let Some(editor) = require_editor(host) else {
            return Ok(());
        };
        if self.workspace.remove_at(&editor.file_path, editor.cursor)? {
            host.notify(NoticeLevel::Info, "Highlight removed");
        } else {
            host.notify(NoticeLevel::Warning, NO_HIGHLIGHT_AT_CURSOR);
        }
        Ok(())
    }

    fn clear(&mut self, host: &mut dyn Host) -> Result<(), AppError> {
        let choices = [PickItem::new(CURRENT_FILE), PickItem::new(ALL_FILES)];
        let Some(choice) = host.pick("Clear highlights from...", &choices) else {
            return Ok(());
        };
        let removed = if choices.get(choice).is_some_and(|item| item.label == CURRENT_FILE) {
            let Some(editor) = require_editor(host) else {
                return Ok(());
            };
            self.workspace.clear(Some(&editor.file_path))?
        } else {
            self.workspace.clear(None)?
        };
        tracing::debug!(removed, "clear finished");
        host.notify(NoticeLevel::Info, "All highlights cleared");
        Ok(())
    }

    fn list(&mut self, host: &mut dyn Host) {
        let entries = query::list_entries(self.workspace.store());
        if entries.is_empty() {
            host.notify(NoticeLevel::Info, "No highlights found");
            return;
        }
        let items: Vec<PickItem> = entries
            .iter()
            .map(|entry| PickItem {
                label: entry.label.clone(),
                description: Some(entry.description.clone()),
                detail: Some(entry.detail.clone()),
            })
            .collect();
        let Some(index) = host.pick("Select a highlight to jump to", &items) else {
            return;
        };
        if let Some(entry) = entries.get(index) {
            self.jump(host, &HighlightRef::new(entry.file_path.as_str(), entry.id.as_str()));
        }
    }

    fn edit_comment(
        &mut self,
        host: &mut dyn Host,
        target: Option<HighlightRef>,
    ) -> Result<(), AppError> {
        let highlight = match target {
            Some(target) => {
                let Some(highlight) = self.workspace.store().get(&target.file_path, &target.id)
                else {
                    host.notify(NoticeLevel::Warning, NO_HIGHLIGHT_AT_CURSOR);
                    return Ok(());
                };
                let highlight = highlight.clone();
                host.reveal(&highlight.file_path, highlight.range);
                highlight
            }
            None => {
                let Some(editor) = require_editor(host) else {
                    return Ok(());
                };
                let Some(highlight) = self
                    .workspace
                    .store()
                    .find_at_position(&editor.file_path, editor.cursor)
                else {
                    host.notify(NoticeLevel::Warning, NO_HIGHLIGHT_AT_CURSOR);
                    return Ok(());
                };
                highlight.clone()
            }
        };

        let Some(comment) = host.prompt_text("Edit comment", highlight.comment.as_deref()) else {
            return Ok(());
        };
        self.workspace
            .set_comment(&highlight.file_path, &highlight.id, Some(comment))?;
        host.notify(NoticeLevel::Info, "Comment updated");
        Ok(())
    }

    fn delete(&mut self, host: &mut dyn Host, target: &HighlightRef) -> Result<(), AppError> {
        if !self.workspace.remove(&target.file_path, &target.id)? {
            tracing::warn!(id = %target.id, file = %target.file_path, "highlight to delete is gone");
            host.notify(NoticeLevel::Warning, "Highlight no longer exists");
            return Ok(());
        }
        host.notify(NoticeLevel::Info, "Highlight removed");
        Ok(())
    }

    fn export(&mut self, host: &mut dyn Host) -> Result<(), AppError> {
        if self.workspace.store().is_empty() {
            host.notify(NoticeLevel::Warning, "No highlights to export");
            return Ok(());
        }
        let document = self.workspace.export_document();
        let Some(path) = host.save_location(DEFAULT_EXPORT_FILE_NAME) else {
            return Ok(());
        };
        document.write_to(&path)?;
        tracing::info!(count = document.highlights.len(), path = %path.display(), "Exported highlights");
        host.notify(
            NoticeLevel::Info,
            &format!("Exported {} highlights", document.highlights.len()),
        );
        Ok(())
    }

    fn import(&mut self, host: &mut dyn Host) -> Result<(), AppError> {
        let Some(path) = host.open_location() else {
            return Ok(());
        };
        let highlights = match interchange::read_import(&path) {
            Ok(highlights) => highlights,
            Err(err @ (AppError::InvalidImport(_) | AppError::Serialization(_))) => {
                tracing::warn!(path = %path.display(), "Rejected import: {}", err);
                host.notify(NoticeLevel::Error, INVALID_FORMAT);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let modes = [ImportMode::Merge, ImportMode::Replace];
        let items: Vec<PickItem> = modes.iter().map(|mode| PickItem::new(mode.label())).collect();
        let Some(mode) = host
            .pick("How to import highlights?", &items)
            .and_then(|index| modes.get(index).copied())
        else {
            return Ok(());
        };
        let count = self.workspace.import(highlights, mode)?;
        host.notify(NoticeLevel::Info, &format!("Imported {} highlights", count));
        Ok(())
    }

    fn jump(&mut self, host: &mut dyn Host, target: &HighlightRef) {
        match self.workspace.store().get(&target.file_path, &target.id) {
            Some(highlight) => host.reveal(&highlight.file_path, highlight.range),
            None => host.notify(NoticeLevel::Warning, "Highlight no longer exists"),
        }
    }
}

fn require_editor(host: &mut dyn Host) -> Option<EditorContext> {
    let editor = host.active_editor();
    if editor.is_none() {
        tracing::warn!("command needs an active editor");
        host.notify(NoticeLevel::Error, NO_EDITOR);
    }
    editor
}

fn require_selection(host: &mut dyn Host) -> Option<EditorContext> {
    let editor = require_editor(host)?;
    if editor.selection.is_empty() {
        tracing::debug!("empty selection");
        host.notify(NoticeLevel::Warning, EMPTY_SELECTION);
        return None;
    }
    Some(editor)
}
