//! Configuration loading from environment variables.

use crate::constants::{BUILTIN_PALETTE, DEFAULT_COLOR, DEFAULT_DB_PATH};
use std::env;
use std::path::PathBuf;

/// Environment variable overriding the state database path.
pub const DB_PATH_ENV: &str = "CODEMARK_DB_PATH";
/// Environment variable overriding the default highlight color.
pub const DEFAULT_COLOR_ENV: &str = "CODEMARK_DEFAULT_COLOR";
/// Environment variable holding a comma-separated color palette.
pub const COLORS_ENV: &str = "CODEMARK_COLORS";

/// Runtime configuration for codemark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
    pub default_color: String,
    pub colors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            default_color: DEFAULT_COLOR.to_string(),
            colors: builtin_colors(),
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}

fn builtin_colors() -> Vec<String> {
    BUILTIN_PALETTE
        .iter()
        .map(|(color, _)| (*color).to_string())
        .collect()
}

/// Split a comma-separated color list, dropping blank entries.
///
/// # Returns
/// Trimmed color tokens in their original order.
pub fn parse_color_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|color| !color.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or blank. An empty palette falls back to the built-in colors.
    pub fn from_env() -> Self {
        let colors = non_blank_env(COLORS_ENV)
            .map(|raw| parse_color_list(&raw))
            .filter(|colors| !colors.is_empty())
            .unwrap_or_else(builtin_colors);

        Self {
            db_path: non_blank_env(DB_PATH_ENV)
                .map(expand_tilde)
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            default_color: non_blank_env(DEFAULT_COLOR_ENV)
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            colors,
        }
    }

    /// Resolve the color for a new highlight.
    ///
    /// # Returns
    /// `requested` when it is non-blank, otherwise the configured default.
    pub fn color_or_default(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .unwrap_or(&self.default_color)
            .to_string()
    }
}
