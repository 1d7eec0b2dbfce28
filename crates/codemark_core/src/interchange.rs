//! Export/import document format for moving highlights between workspaces.

use crate::constants::EXPORT_VERSION;
use crate::error::AppError;
use crate::models::Highlight;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub(crate) const INVALID_FORMAT: &str = "Invalid highlights file format";

/// How imported highlights combine with the existing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Append to existing highlights; colliding ids are kept twice.
    Merge,
    /// Drop every existing highlight first.
    Replace,
}

impl ImportMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Merge => "Merge with existing",
            Self::Replace => "Replace all existing",
        }
    }
}

/// Versioned interchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    /// ISO 8601 timestamp of the export.
    pub export_date: String,
    pub highlights: Vec<Highlight>,
}

impl ExportDocument {
    /// Wrap `highlights` in a document stamped with the current time.
    pub fn new(highlights: Vec<Highlight>) -> Self {
        Self::at(highlights, Utc::now())
    }

    /// Wrap `highlights` in a document stamped with `exported_at`.
    pub fn at(highlights: Vec<Highlight>, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            highlights,
        }
    }

    /// Pretty-printed JSON with two-space indentation.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document as UTF-8 JSON to `path`.
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails.
    pub fn write_to(&self, path: &Path) -> Result<(), AppError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Parse an import document, requiring an array-typed `highlights` field.
///
/// The whole document is rejected when any record fails to parse or
/// validate, so a bad file never leads to a partial import. Version and
/// export date are not checked.
///
/// # Returns
/// The embedded highlights with their ids untouched.
///
/// # Errors
/// Returns [`AppError::InvalidImport`] for schema violations and
/// [`AppError::Serialization`] when the text is not JSON at all.
pub fn parse_import(text: &str) -> Result<Vec<Highlight>, AppError> {
    let document: Value = serde_json::from_str(text)?;
    let Some(Value::Array(records)) = document.get("highlights") else {
        return Err(AppError::InvalidImport(INVALID_FORMAT.to_string()));
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let highlight = Highlight::deserialize(record).map_err(|err| {
                AppError::InvalidImport(format!("{}: record {}: {}", INVALID_FORMAT, index, err))
            })?;
            highlight.validate().map_err(|reason| {
                AppError::InvalidImport(format!("{}: record {}: {}", INVALID_FORMAT, index, reason))
            })?;
            Ok(highlight)
        })
        .collect()
}

/// Read and parse an import document from `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or fails [`parse_import`].
pub fn read_import(path: &Path) -> Result<Vec<Highlight>, AppError> {
    let text = std::fs::read_to_string(path)?;
    parse_import(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Range;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample(id: &str, comment: Option<&str>) -> Highlight {
        let mut h = Highlight::new(
            "/src/main.rs",
            Range::from_coords(3, 1, 4, 0),
            "fn main()",
            comment.map(str::to_string),
            "#00FFFF66",
            1_700_000_000_123,
        );
        h.id = id.to_string();
        h
    }

    #[test]
    fn export_document_has_version_date_and_highlights() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).single().expect("date");
        let doc = ExportDocument::at(vec![sample("h1", Some("why"))], at);
        let value: Value = serde_json::from_str(&doc.to_json().expect("json")).expect("parse");

        assert_eq!(value["version"], json!("1.0.0"));
        assert_eq!(value["exportDate"], json!("2024-03-01T12:30:00.000Z"));
        assert_eq!(value["highlights"][0]["id"], json!("h1"));
        assert_eq!(value["highlights"][0]["filePath"], json!("/src/main.rs"));
        assert_eq!(value["highlights"][0]["comment"], json!("why"));
    }

    #[test]
    fn export_then_parse_preserves_records() {
        let highlights = vec![sample("h1", Some("why")), sample("h2", None)];
        let text = ExportDocument::new(highlights.clone()).to_json().expect("json");
        assert_eq!(parse_import(&text).expect("import"), highlights);
    }

    #[test]
    fn parse_import_requires_highlights_array() {
        for text in [
            r#"{"version": "1.0.0"}"#,
            r#"{"highlights": {"id": "x"}}"#,
            r#"{"highlights": null}"#,
            r#"[1, 2]"#,
        ] {
            let err = parse_import(text).expect_err("must reject");
            assert!(
                matches!(err, AppError::InvalidImport(ref message) if message == INVALID_FORMAT),
                "text {} gave {}",
                text,
                err
            );
        }
    }

    #[test]
    fn parse_import_accepts_minimal_document() {
        assert!(parse_import(r#"{"highlights": []}"#).expect("empty").is_empty());
    }

    #[test]
    fn one_bad_record_rejects_the_whole_document() {
        let good = serde_json::to_value(sample("h1", None)).expect("encode");
        let text = json!({"highlights": [good, {"id": "broken"}]}).to_string();
        let err = parse_import(&text).expect_err("must reject");
        assert!(
            matches!(err, AppError::InvalidImport(ref message) if message.contains("record 1")),
            "unexpected: {}",
            err
        );
    }

    #[test]
    fn non_json_input_is_a_serialization_error() {
        assert!(matches!(
            parse_import("not json"),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn write_and_read_files() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("highlights.json");
        let highlights = vec![sample("h1", Some("kept"))];

        ExportDocument::new(highlights.clone())
            .write_to(&path)
            .expect("write");
        assert_eq!(read_import(&path).expect("read"), highlights);

        let missing = temp.path().join("missing.json");
        assert!(matches!(read_import(&missing), Err(AppError::Io(_))));
    }
}
