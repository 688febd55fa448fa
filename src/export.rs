use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::{AppError, Result};

/// One message-like entry of a Slack export document.
#[derive(Debug, Default)]
pub struct ExportEntry {
    pub files: Option<Vec<FileDescriptor>>,
    /// Elements of `files` that could not be read as a descriptor, with the reason.
    pub rejected_files: Vec<String>,
}

impl ExportEntry {
    /// Anything other than an object whose `files` is an array has no files.
    pub fn from_value(value: Value) -> Self {
        let files = match value {
            Value::Object(mut map) => map.remove("files"),
            _ => None,
        };

        let Some(Value::Array(items)) = files else {
            return Self::default();
        };

        let mut descriptors = Vec::with_capacity(items.len());
        let mut rejected_files = Vec::new();
        for item in items {
            match serde_json::from_value::<FileDescriptor>(item) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => rejected_files.push(e.to_string()),
            }
        }

        Self {
            files: Some(descriptors),
            rejected_files,
        }
    }
}

/// An attachment referenced from an entry's `files` list.
///
/// Slack exports are not consistent about which keys are present, so every
/// field is optional. Empty strings are treated the same as missing keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url_private_download: Option<String>,
}

impl FileDescriptor {
    pub fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn download_url(&self) -> Option<&str> {
        non_empty(&self.url_private_download)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Load and parse an export document.
///
/// Only unreadable files and invalid JSON are errors. A document that is not
/// a list, such as the `{"logs": [...]}` of `integration_logs.json`, has no
/// entries.
pub fn load_export(path: &Path) -> Result<Vec<ExportEntry>> {
    let file = File::open(path).map_err(|e| AppError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let document: Value = serde_json::from_reader(reader).map_err(|e| AppError::JsonParse {
        path: path.display().to_string(),
        source: e,
    })?;

    match document {
        Value::Array(entries) => Ok(entries.into_iter().map(ExportEntry::from_value).collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_entry_without_files() {
        let entry = ExportEntry::from_value(json!({"type": "message", "text": "hi"}));

        assert!(entry.files.is_none());
        assert!(entry.rejected_files.is_empty());
    }

    #[test]
    fn test_entry_with_null_files() {
        let entry = ExportEntry::from_value(json!({"files": null}));

        assert!(entry.files.is_none());
    }

    #[test]
    fn test_entry_with_non_array_files() {
        let entry = ExportEntry::from_value(json!({"files": {"id": "F1"}}));

        assert!(entry.files.is_none());
        assert!(entry.rejected_files.is_empty());
    }

    #[test]
    fn test_non_object_entries_have_no_files() {
        assert!(ExportEntry::from_value(json!("files")).files.is_none());
        assert!(ExportEntry::from_value(json!(42)).files.is_none());
        assert!(ExportEntry::from_value(json!(["files"])).files.is_none());
    }

    #[test]
    fn test_descriptor_fields() {
        let entry = ExportEntry::from_value(json!({"files": [
            {"id": "F1", "name": "a.png", "url_private_download": "http://x/a", "filetype": "png"}
        ]}));

        let files = entry.files.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id(), Some("F1"));
        assert_eq!(files[0].name(), Some("a.png"));
        assert_eq!(files[0].download_url(), Some("http://x/a"));
    }

    #[test]
    fn test_descriptor_missing_fields() {
        let entry = ExportEntry::from_value(json!({"files": [{"mode": "tombstone"}]}));

        let file = &entry.files.unwrap()[0];
        assert_eq!(file.id(), None);
        assert_eq!(file.name(), None);
        assert_eq!(file.download_url(), None);
    }

    #[test]
    fn test_unreadable_descriptors_are_rejected_individually() {
        let entry = ExportEntry::from_value(json!({"files": [
            "F1",
            {"id": "F2", "name": 7},
            {"id": "F3", "name": "ok.txt", "url_private_download": "http://x/ok"}
        ]}));

        let files = entry.files.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id(), Some("F3"));
        assert_eq!(entry.rejected_files.len(), 2);
    }

    #[test]
    fn test_descriptor_empty_strings_are_absent() {
        let file = FileDescriptor {
            id: Some(String::new()),
            name: Some(String::new()),
            url_private_download: Some(String::new()),
        };

        assert_eq!(file.id(), None);
        assert_eq!(file.name(), None);
        assert_eq!(file.download_url(), None);
    }

    #[test]
    fn test_load_export_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2024-01-01.json");
        fs::write(
            &path,
            r#"[{"text": "no files"}, {"files": [{"id": "F1", "name": "a.png"}]}]"#,
        )
        .unwrap();

        let entries = load_export(&path).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].files.is_none());
        assert_eq!(entries[1].files.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_load_export_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_export(&dir.path().join("missing.json"));

        assert!(matches!(result, Err(AppError::ReadFile { .. })));
    }

    #[test]
    fn test_load_export_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{\"files\": [").unwrap();

        let result = load_export(&path);

        assert!(matches!(result, Err(AppError::JsonParse { .. })));
    }

    #[test]
    fn test_load_export_non_list_document_has_no_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("integration_logs.json");
        fs::write(&path, r#"{"logs": [{"service_id": "S1"}]}"#).unwrap();

        assert!(load_export(&path).unwrap().is_empty());
    }
}
