//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// Per-workspace key/value slots (JSON-encoded values).
pub const WORKSPACE_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("workspace_state");
