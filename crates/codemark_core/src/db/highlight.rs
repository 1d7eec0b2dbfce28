//! Persistence of the file -> highlights map in a single redb slot.

use crate::constants::STATE_KEY;
use crate::db::tables::WORKSPACE_STATE;
use crate::error::AppError;
use crate::models::Highlight;
use crate::store::HighlightMap;
use redb::{ReadableDatabase, ReadableTable};
use serde_json::Value;
use std::sync::Arc;

/// Result of reading the persisted highlight map.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub highlights: HighlightMap,
    /// Records dropped because they failed validation.
    pub skipped: usize,
    /// The slot held something other than a JSON object and was ignored.
    pub discarded: bool,
}

/// Accessor for the persisted highlight slot.
pub struct HighlightDb {
    db: Arc<redb::Database>,
}

impl HighlightDb {
    /// Initialize the state table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(WORKSPACE_STATE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Overwrite the slot with the full highlight map.
    ///
    /// Every call writes a complete snapshot, so repeated saves of the same
    /// state are harmless.
    ///
    /// # Errors
    /// Returns an error when serialization or the write transaction fails.
    pub fn save(&self, highlights: &HighlightMap) -> Result<(), AppError> {
        let encoded = serde_json::to_vec(highlights)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WORKSPACE_STATE)?;
            table.insert(STATE_KEY, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read the persisted map.
    ///
    /// A missing slot yields an empty map. A slot that is not JSON, or whose
    /// top level is not an object, also yields an empty map with `discarded`
    /// set; the next save overwrites it. Records that do not match the schema,
    /// carry a reversed range, or sit under a different file key are skipped
    /// and logged.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn load(&self) -> Result<LoadedState, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WORKSPACE_STATE)?;
        let Some(raw) = table.get(STATE_KEY)? else {
            tracing::info!("No saved highlights found");
            return Ok(LoadedState::default());
        };
        let parsed = serde_json::from_slice::<Value>(raw.value());
        drop(raw);

        let state = match parsed {
            Ok(Value::Object(files)) => decode_state(files),
            Ok(_) => discard("top-level value is not an object"),
            Err(err) => discard(&err.to_string()),
        };
        tracing::info!(
            highlights = state.highlights.values().map(Vec::len).sum::<usize>(),
            files = state.highlights.len(),
            skipped = state.skipped,
            "Loaded saved highlights"
        );
        Ok(state)
    }

    #[cfg(test)]
    pub(crate) fn write_raw(&self, bytes: &[u8]) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WORKSPACE_STATE)?;
            table.insert(STATE_KEY, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

fn discard(reason: &str) -> LoadedState {
    tracing::warn!("Ignoring unreadable saved highlights: {}", reason);
    LoadedState {
        discarded: true,
        ..LoadedState::default()
    }
}

fn decode_state(files: serde_json::Map<String, Value>) -> LoadedState {
    let mut state = LoadedState::default();
    for (file_path, records) in files {
        let Value::Array(records) = records else {
            tracing::warn!(file = %file_path, "Skipping persisted entry that is not a list");
            state.skipped += 1;
            continue;
        };
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            match decode_record(&file_path, record) {
                Ok(highlight) => kept.push(highlight),
                Err(reason) => {
                    tracing::warn!(file = %file_path, "Skipping malformed highlight: {}", reason);
                    state.skipped += 1;
                }
            }
        }
        if !kept.is_empty() {
            state.highlights.insert(file_path, kept);
        }
    }
    state
}

fn decode_record(file_path: &str, record: Value) -> Result<Highlight, String> {
    let highlight: Highlight = serde_json::from_value(record).map_err(|err| err.to_string())?;
    highlight.validate()?;
    if highlight.file_path != file_path {
        return Err(format!(
            "highlight {} belongs to '{}', not '{}'",
            highlight.id, highlight.file_path, file_path
        ));
    }
    Ok(highlight)
}
