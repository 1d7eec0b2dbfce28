//! Core engine for codemark (highlight store, range reconciliation, persistence).

/// Rope-backed document snapshots and edit application.
pub mod buffer;
/// Host-facing command entry points.
pub mod commands;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Durable storage for workspace highlight state.
pub mod db;
/// Application error types.
pub mod error;
/// Change notification plumbing.
pub mod events;
/// Export/import document format.
pub mod interchange;
/// Data models for highlights and text ranges.
pub mod models;
/// Read-side derivations for list and tree views.
pub mod query;
/// Edit reconciliation for stored highlight ranges.
pub mod reconcile;
/// In-memory highlight store.
pub mod store;
/// Workspace service tying store, storage and notifications together.
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

pub use buffer::TextBuffer;
pub use commands::{Command, Commands, EditorContext, HighlightRef, Host, NoticeLevel, PickItem};
pub use config::Config;
pub use constants::{DEFAULT_COLOR, EXPORT_VERSION};
pub use db::Database;
pub use error::AppError;
pub use events::{ChangeEvent, ChangeKind, SubscriptionId};
pub use interchange::{ExportDocument, ImportMode};
pub use models::{Highlight, Position, Range};
pub use reconcile::{DocumentText, ReconcileOutcome, TextEdit};
pub use store::HighlightStore;
pub use workspace::{ToggleOutcome, Workspace};
