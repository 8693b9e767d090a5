use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const SORT_ENTRIES_ENV: &str = "DOCX_TOOLS_SORT_ENTRIES";

/// Output names and listing behaviour shared by the three tools.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder created next to the input's parent folder for annotated documents
    pub sections_dir: String,
    /// Folder created next to the input folder for text output
    pub text_dir: String,
    /// Merged CSV written inside the JSON folder
    pub csv_name: String,
    pub docx_extension: String,
    /// Extension of converted text files, without the dot
    pub text_extension: String,
    pub json_extension: String,
    /// Process folder entries sorted by file name instead of listing order
    pub sort_entries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sections_dir: "with_sections".to_string(),
            text_dir: "txt_files".to_string(),
            csv_name: "combined_data.csv".to_string(),
            docx_extension: ".docx".to_string(),
            text_extension: "txt".to_string(),
            json_extension: ".json".to_string(),
            sort_entries: false,
        }
    }
}

impl Config {
    /// Defaults, then the optional JSON file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(SORT_ENTRIES_ENV) {
            match parse_flag(&raw) {
                Some(flag) => self.sort_entries = flag,
                None => warn!("Ignoring {}={:?}: expected true/false", SORT_ENTRIES_ENV, raw),
            }
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
