//! Shared constants used across codemark crates.

/// Color used when neither the caller nor the environment picks one.
pub const DEFAULT_COLOR: &str = "#FFFF0066";

/// Built-in palette with display labels, in presentation order.
pub const BUILTIN_PALETTE: [(&str, &str); 5] = [
    ("#FFFF0066", "Yellow"),
    ("#00FF0066", "Green"),
    ("#FF00FF66", "Pink"),
    ("#00FFFF66", "Cyan"),
    ("#FFA50066", "Orange"),
];

/// Fixed key of the persisted highlight map inside the state table.
pub const STATE_KEY: &str = "highlights";

/// Version stamped into export documents.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Maximum number of characters shown in text previews.
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Default state database location, relative to the workspace root.
pub const DEFAULT_DB_PATH: &str = ".codemark/state.redb";

/// Default file name offered when exporting.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "highlights.json";
