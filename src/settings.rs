use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub download: DownloadSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, rename = "output-directory", skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    #[serde(default, rename = "timeout-secs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_file_constant() {
        assert_eq!(SETTINGS_FILE, "settings.toml");
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();

        assert!(settings.download.token.is_none());
        assert!(settings.download.output_directory.is_none());
        assert!(settings.download.timeout_secs.is_none());
    }

    #[test]
    fn test_settings_deserialization() {
        let toml_content = r#"
[download]
token = "xoxp-123"
output-directory = "/data/slack-files"
timeout-secs = 60
"#;

        let settings: Settings = toml::from_str(toml_content).unwrap();

        assert_eq!(settings.download.token.as_deref(), Some("xoxp-123"));
        assert_eq!(
            settings.download.output_directory.as_deref(),
            Some("/data/slack-files")
        );
        assert_eq!(settings.download.timeout_secs, Some(60));
    }

    #[test]
    fn test_settings_deserialization_empty() {
        let settings: Settings = toml::from_str("").unwrap();

        assert!(settings.download.token.is_none());
    }

    #[test]
    fn test_settings_deserialization_partial() {
        let toml_content = r#"
[download]
output-directory = "attachments"
"#;

        let settings: Settings = toml::from_str(toml_content).unwrap();

        assert!(settings.download.token.is_none());
        assert_eq!(settings.download.output_directory.as_deref(), Some("attachments"));
        assert!(settings.download.timeout_secs.is_none());
    }

    #[test]
    fn test_settings_serialization_skips_unset() {
        let mut settings = Settings::default();
        settings.download.output_directory = Some("out".to_string());

        let toml = toml::to_string(&settings).unwrap();

        assert!(toml.contains("output-directory"));
        assert!(!toml.contains("token"));
        assert!(!toml.contains("timeout-secs"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();

        let settings = Settings::load(&dir.path().join(SETTINGS_FILE)).unwrap();

        assert!(settings.download.token.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[download]\ntimeout-secs = 5\n").unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.download.timeout_secs, Some(5));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[download\n").unwrap();

        assert!(matches!(Settings::load(&path), Err(AppError::TomlParse(_))));
    }
}
