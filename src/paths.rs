//! Resolution of the `queries` globs found in sqlc configs. Globs are
//! relative to the directory containing the config file.

use anyhow::{anyhow, Result};
use std::path::{Component, Path, PathBuf};

/// Lexically drop `.` and resolve `..` components without touching the
/// filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Join `glob` onto the directory of `config_path`. A bare `.` selects
/// every file in that directory.
pub fn resolve_relative_glob(config_path: &Path, glob: &str) -> String {
    let glob = if glob == "." { "*" } else { glob };
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));

    normalize(&config_dir.join(glob)).to_string_lossy().into_owned()
}

/// Like [`resolve_relative_glob`], but a glob naming an existing directory
/// selects the files inside it.
fn expand_directory(config_path: &Path, glob: &str) -> String {
    let resolved = resolve_relative_glob(config_path, glob);

    if glob != "." && Path::new(&resolved).is_dir() {
        Path::new(&resolved).join("*").to_string_lossy().into_owned()
    } else {
        resolved
    }
}

/// Every regular file selected by `glob`, sorted.
pub fn resolve_files(config_path: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let pattern = expand_directory(config_path, glob);

    let paths = glob::glob(&pattern)
        .map_err(|e| anyhow!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files = Vec::new();
    for path_result in paths {
        match path_result {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => log::warn!("Error reading path from glob '{}': {}", pattern, e),
        }
    }
    files.sort();

    Ok(files)
}

// `*` stays within one path component, as it does when walking with `glob::glob`
const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Whether `candidate` would be selected by `glob` from the config at
/// `config_path`. Used for files that may not exist yet.
pub fn pattern_matches(config_path: &Path, glob: &str, candidate: &Path) -> bool {
    let resolved = resolve_relative_glob(config_path, glob);

    let direct = glob::Pattern::new(&resolved)
        .map(|p| p.matches_path_with(candidate, MATCH_OPTIONS))
        .unwrap_or(false);

    // Directory globs select their immediate children
    direct
        || (glob != "."
            && candidate.parent() == Some(Path::new(&resolved))
            && !resolved.contains(['*', '?', '[']))
}
