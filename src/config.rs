use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File name looked up in the scanned root when no settings path is given.
pub const SETTINGS_FILE_NAME: &str = "sqlc-index.toml";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    /// Used by `create-user` when neither a flag nor `DATABASE_URL` is set
    pub connection_string: Option<String>,
    /// File names recognised as sqlc project configs
    pub config_names: Vec<String>,
    /// Glob patterns of paths that are never scanned
    pub exclude: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection_string: None,
            config_names: vec![
                "sqlc.yaml".to_string(),
                "sqlc.yml".to_string(),
                "sqlc.json".to_string(),
            ],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Read settings from an explicit file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let conf_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        toml::from_str(&conf_str)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Use `explicit` when given, otherwise `<root>/sqlc-index.toml` if it
    /// exists, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, root: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate = root.join(SETTINGS_FILE_NAME);
        if candidate.is_file() {
            log::debug!("Using settings from {}", candidate.display());
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn is_config_name(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.config_names.iter().any(|c| c == n))
            .unwrap_or(false)
    }

    /// Compiled `exclude` patterns. Invalid patterns are logged and ignored.
    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    log::warn!("Ignoring invalid exclude pattern '{}': {}", p, e);
                    None
                }
            })
            .collect()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_patterns()
            .iter()
            .any(|p| p.matches_path(path))
    }
}
