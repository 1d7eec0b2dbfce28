//! Root crate facade for codemark.

pub use codemark_core::{
    buffer, commands, config, constants, db, error, events, interchange, models, query, reconcile,
    store, workspace,
};
pub use codemark_core::{
    AppError, ChangeEvent, ChangeKind, Command, Commands, Config, Database, EditorContext,
    ExportDocument, Highlight, HighlightRef, HighlightStore, Host, ImportMode, NoticeLevel,
    PickItem, Position, Range, TextBuffer, TextEdit, ToggleOutcome, Workspace,
};
