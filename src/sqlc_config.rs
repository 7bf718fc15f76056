use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SqlcConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse YAML in {}", .path.display())]
    Empty { path: PathBuf },
    #[error("invalid sqlc config {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A `sqlc.yaml` / `sqlc.yml` / `sqlc.json` project file. Only the parts
/// needed to locate query files are modelled.
#[derive(Deserialize, Debug)]
pub struct SqlcConfig {
    pub version: Option<String>,
    pub sql: Vec<SqlPackage>,
}

#[derive(Deserialize, Debug)]
pub struct SqlPackage {
    pub engine: Option<String>,
    pub schema: Option<OneOrMany>,
    pub queries: OneOrMany,
    pub gen: Gen,
}

#[derive(Deserialize, Debug)]
pub struct Gen {
    pub go: GoGen,
}

#[derive(Deserialize, Debug)]
pub struct GoGen {
    pub package: String,
    pub out: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(s) => std::slice::from_ref(s),
            OneOrMany::Many(v) => v.as_slice(),
        }
    }
}

impl SqlcConfig {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, SqlcConfigError> {
        if text.trim().is_empty() {
            return Err(SqlcConfigError::Empty {
                path: path.to_path_buf(),
            });
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|source| SqlcConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;

        if value.is_null() {
            return Err(SqlcConfigError::Empty {
                path: path.to_path_buf(),
            });
        }

        serde_yaml::from_value(value).map_err(|source| SqlcConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every `queries` entry across all packages, deduplicated, in the order
    /// first seen.
    pub fn query_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();

        for pattern in self.sql.iter().flat_map(|pkg| pkg.queries.as_slice()) {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }

        patterns
    }
}

/// Read a sqlc config file and return its query glob patterns.
pub fn parse_config(path: &Path) -> Result<Vec<String>, SqlcConfigError> {
    let text = fs::read_to_string(path).map_err(|source| SqlcConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(SqlcConfig::from_yaml(&text, path)?.query_patterns())
}
