//! Shared test-only helpers for codemark_core.

use crate::commands::{EditorContext, Host, NoticeLevel, PickItem};
use crate::config::Config;
use crate::models::Range;
use crate::workspace::Workspace;
use crate::Database;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

/// Creates an isolated temporary database and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation, path conversion, or database initialization
/// fails in the test environment.
pub(crate) fn setup_temp_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("test.redb");
    let db = Database::new(db_path.to_str().expect("db path")).expect("db");
    (db, temp_dir)
}

/// Workspace over a fresh temporary database with default colors.
pub(crate) fn setup_temp_workspace() -> (Workspace, TempDir) {
    let (db, temp_dir) = setup_temp_db();
    let workspace = Workspace::with_database(Config::default(), db).expect("workspace");
    (workspace, temp_dir)
}

/// Lock serializing environment mutation across test threads.
pub(crate) fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Restores an environment variable value on drop.
pub(crate) struct EnvGuard {
    key: String,
    previous: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &str, value: &str) -> Self {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }

    pub(crate) fn remove(key: &str) -> Self {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var(&self.key, value),
            None => std::env::remove_var(&self.key),
        }
    }
}

/// Host answering prompts from pre-loaded queues and recording output.
///
/// An exhausted queue answers `None`, which the commands treat as a cancel.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHost {
    pub editor: Option<EditorContext>,
    pub texts: VecDeque<Option<String>>,
    pub picks: VecDeque<Option<usize>>,
    pub save_paths: VecDeque<Option<PathBuf>>,
    pub open_paths: VecDeque<Option<PathBuf>>,
    pub prompts: Vec<(String, Option<String>)>,
    pub offered: Vec<Vec<PickItem>>,
    pub notices: Vec<(NoticeLevel, String)>,
    pub revealed: Vec<(String, Range)>,
}

impl ScriptedHost {
    pub(crate) fn with_editor(editor: EditorContext) -> Self {
        Self {
            editor: Some(editor),
            ..Self::default()
        }
    }

    pub(crate) fn answer_text(mut self, answer: Option<&str>) -> Self {
        self.texts.push_back(answer.map(str::to_string));
        self
    }

    pub(crate) fn answer_pick(mut self, answer: Option<usize>) -> Self {
        self.picks.push_back(answer);
        self
    }

    pub(crate) fn last_notice(&self) -> Option<(NoticeLevel, &str)> {
        self.notices
            .last()
            .map(|(level, message)| (*level, message.as_str()))
    }
}

impl Host for ScriptedHost {
    fn active_editor(&self) -> Option<EditorContext> {
        self.editor.clone()
    }

    fn prompt_text(&mut self, prompt: &str, initial: Option<&str>) -> Option<String> {
        self.prompts
            .push((prompt.to_string(), initial.map(str::to_string)));
        self.texts.pop_front().flatten()
    }

    fn pick(&mut self, _placeholder: &str, items: &[PickItem]) -> Option<usize> {
        self.offered.push(items.to_vec());
        self.picks.pop_front().flatten()
    }

    fn save_location(&mut self, _default_name: &str) -> Option<PathBuf> {
        self.save_paths.pop_front().flatten()
    }

    fn open_location(&mut self) -> Option<PathBuf> {
        self.open_paths.pop_front().flatten()
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push((level, message.to_string()));
    }

    fn reveal(&mut self, file_path: &str, range: Range) {
        self.revealed.push((file_path.to_string(), range));
    }
}
