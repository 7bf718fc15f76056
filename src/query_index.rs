use crate::config::Settings;
use crate::ident::lookup_candidates;
use crate::paths::{pattern_matches, resolve_files};
use crate::sql_parser::{ParsedQuery, QueryCommand, SqlParser};
use crate::sqlc_config::parse_config;
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Span of a `-- name:` line. 0-based, columns in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// One place a query name is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryHit {
    pub path: PathBuf,
    pub range: LineRange,
    pub command: QueryCommand,
}

impl From<ParsedQuery> for QueryHit {
    fn from(q: ParsedQuery) -> Self {
        Self {
            path: q.file_path,
            range: LineRange {
                line: q.line,
                start: 0,
                end: q.line_len,
            },
            command: q.command,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    ConfigCreated(PathBuf),
    ConfigChanged(PathBuf),
    ConfigDeleted(PathBuf),
    QueryFileCreated(PathBuf),
    QueryFileChanged(PathBuf),
    QueryFileDeleted(PathBuf),
}

/// Maps sqlc query names to the lines that define them, across every sqlc
/// config found under a root directory.
#[derive(Debug, Default)]
pub struct QueryIndex {
    settings: Settings,
    config_to_files: HashMap<PathBuf, BTreeSet<PathBuf>>,
    config_to_patterns: HashMap<PathBuf, Vec<String>>,
    file_to_names: HashMap<PathBuf, HashSet<String>>,
    name_to_hits: HashMap<String, Vec<QueryHit>>,
    ready: bool,
}

impl Deref for QueryIndex {
    type Target = HashMap<String, Vec<QueryHit>>;

    fn deref(&self) -> &Self::Target {
        &self.name_to_hits
    }
}

impl QueryIndex {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Build the index from scratch for every sqlc config beneath `root`.
    pub fn init(&mut self, root: &Path) -> Result<()> {
        log::info!("[index] Starting index build…");

        self.ready = false;
        self.config_to_files.clear();
        self.config_to_patterns.clear();
        self.file_to_names.clear();
        self.name_to_hits.clear();

        let configs = self.find_configs(root)?;
        log::info!("[index] Found {} sqlc config(s).", configs.len());

        for config in configs {
            log::info!("[index] Indexing config {}…", config.display());
            match self.index_config(&config) {
                Ok(()) => log::info!("[index] Finished indexing config {}.", config.display()),
                Err(e) => log::warn!("[index] Skipping config {}: {:#}", config.display(), e),
            }
        }

        log::info!("[index] Finished index build.");
        self.ready = true;

        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn lookup(&self, name: &str) -> Option<&[QueryHit]> {
        if !self.ready {
            log::warn!("[index] Warning: lookup called before index was ready.");
            return None;
        }

        self.name_to_hits.get(name).map(Vec::as_slice)
    }

    /// Exact name first, then the PascalCase spelling of `input`.
    pub fn lookup_fuzzy(&self, input: &str) -> Option<(String, &[QueryHit])> {
        if !self.ready {
            log::warn!("[index] Warning: lookup called before index was ready.");
            return None;
        }

        lookup_candidates(input).into_iter().find_map(|name| {
            let hits = self.name_to_hits.get(&name)?;
            Some((name, hits.as_slice()))
        })
    }

    /// Query names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.name_to_hits.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn configs(&self) -> Vec<&Path> {
        let mut configs: Vec<&Path> = self.config_to_patterns.keys().map(PathBuf::as_path).collect();
        configs.sort_unstable();
        configs
    }

    pub fn files_for_config(&self, config: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.config_to_files.get(config)
    }

    pub fn patterns_for_config(&self, config: &Path) -> Option<&[String]> {
        self.config_to_patterns.get(config).map(Vec::as_slice)
    }

    fn find_configs(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut configs = Vec::new();

        for name in &self.settings.config_names {
            let pattern = root.join("**").join(name);
            let pattern = pattern.to_string_lossy();

            let paths = glob::glob(&pattern)
                .map_err(|e| anyhow!("Invalid glob pattern '{}': {}", pattern, e))?;

            for path_result in paths {
                match path_result {
                    Ok(path) if path.is_file() && !self.settings.is_excluded(&path) => {
                        configs.push(path)
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("[index] Skipping unreadable path under {}: {}", root.display(), e),
                }
            }
        }

        configs.sort();
        configs.dedup();

        Ok(configs)
    }

    pub fn index_config(&mut self, config: &Path) -> Result<()> {
        let patterns = parse_config(config)?;

        let mut files = BTreeSet::new();
        for pattern in &patterns {
            log::debug!("[index] Resolving pattern \"{}\" from config {}…", pattern, config.display());
            let matched = resolve_files(config, pattern)?;
            log::info!(
                "[index] From config {}, pattern \"{}\" matched {} file(s).",
                config.display(),
                pattern,
                matched.len()
            );
            files.extend(matched);
        }

        let parser = SqlParser::new();
        let parsed: Vec<(PathBuf, Result<Vec<ParsedQuery>>)> = files
            .par_iter()
            .map(|file| (file.clone(), parser.parse_file(file)))
            .collect();

        for (file, result) in parsed {
            match result {
                Ok(queries) => self.insert_file(&file, queries),
                Err(e) => log::warn!("[index] Could not index {}: {:#}", file.display(), e),
            }
        }

        self.config_to_files
            .entry(config.to_path_buf())
            .or_default()
            .extend(files);
        self.config_to_patterns.insert(config.to_path_buf(), patterns);

        Ok(())
    }

    /// (Re)index one SQL file. Any hits from a previous read are replaced.
    pub fn index_file(&mut self, path: &Path) -> Result<()> {
        let queries = SqlParser::new().parse_file(path)?;
        self.insert_file(path, queries);
        Ok(())
    }

    fn insert_file(&mut self, path: &Path, queries: Vec<ParsedQuery>) {
        self.invalidate_file(path);

        let mut names = HashSet::new();
        for query in queries {
            names.insert(query.name.clone());
            self.name_to_hits
                .entry(query.name.clone())
                .or_default()
                .push(QueryHit::from(query));
        }

        log::debug!("[index] {} defines {} quer(ies)", path.display(), names.len());
        self.file_to_names.insert(path.to_path_buf(), names);
    }

    /// Forget every hit that came from `path`.
    pub fn invalidate_file(&mut self, path: &Path) {
        let Some(names) = self.file_to_names.remove(path) else {
            return;
        };

        for name in names {
            let Some(hits) = self.name_to_hits.get_mut(&name) else {
                continue;
            };

            hits.retain(|hit| hit.path != path);
            if hits.is_empty() {
                self.name_to_hits.remove(&name);
            }
        }
    }

    /// Forget a config and every file it referenced.
    pub fn invalidate_config(&mut self, config: &Path) {
        let files = self.config_to_files.remove(config).unwrap_or_default();

        for file in &files {
            // Shared files stay indexed while another config still selects them
            let still_referenced = self.config_to_files.values().any(|f| f.contains(file));
            if !still_referenced {
                self.invalidate_file(file);
            }
        }

        self.config_to_patterns.remove(config);
    }

    /// Configs whose query globs select `path`.
    fn owning_configs(&self, path: &Path) -> Vec<PathBuf> {
        self.config_to_patterns
            .iter()
            .filter(|(config, patterns)| {
                patterns.iter().any(|p| pattern_matches(config, p, path))
            })
            .map(|(config, _)| config.clone())
            .collect()
    }

    /// Translate a filesystem change into an index event, or `None` when the
    /// path is of no interest.
    pub fn classify(&self, path: &Path, kind: ChangeKind) -> Option<IndexEvent> {
        if self.settings.is_excluded(path) {
            return None;
        }

        if self.settings.is_config_name(path) {
            return Some(match kind {
                ChangeKind::Created => IndexEvent::ConfigCreated(path.to_path_buf()),
                ChangeKind::Changed => IndexEvent::ConfigChanged(path.to_path_buf()),
                ChangeKind::Deleted => IndexEvent::ConfigDeleted(path.to_path_buf()),
            });
        }

        let known = self.file_to_names.contains_key(path);
        if !known && self.owning_configs(path).is_empty() {
            return None;
        }

        Some(match kind {
            ChangeKind::Created => IndexEvent::QueryFileCreated(path.to_path_buf()),
            ChangeKind::Changed => IndexEvent::QueryFileChanged(path.to_path_buf()),
            ChangeKind::Deleted => IndexEvent::QueryFileDeleted(path.to_path_buf()),
        })
    }

    pub fn apply(&mut self, event: &IndexEvent) -> Result<()> {
        match event {
            IndexEvent::ConfigCreated(config) => {
                log::info!("[index] Config file created: {}", config.display());
                // Editors that save via rename report a create for a known config
                self.invalidate_config(config);
                self.index_config(config)
            }
            IndexEvent::ConfigChanged(config) => {
                log::info!("[index] Config file changed: {}", config.display());
                self.invalidate_config(config);
                self.index_config(config)
            }
            IndexEvent::ConfigDeleted(config) => {
                log::info!("[index] Config file deleted: {}", config.display());
                self.invalidate_config(config);
                Ok(())
            }
            IndexEvent::QueryFileCreated(file) | IndexEvent::QueryFileChanged(file) => {
                log::info!("[index] File changed: {}", file.display());
                // Some backends report a rename or delete as a modify
                if !file.is_file() {
                    self.forget_file(file);
                    return Ok(());
                }
                for config in self.owning_configs(file) {
                    self.config_to_files
                        .entry(config)
                        .or_default()
                        .insert(file.clone());
                }
                self.index_file(file)
            }
            IndexEvent::QueryFileDeleted(file) => {
                log::info!("[index] File deleted: {}", file.display());
                self.forget_file(file);
                Ok(())
            }
        }
    }

    fn forget_file(&mut self, file: &Path) {
        self.invalidate_file(file);
        for files in self.config_to_files.values_mut() {
            files.remove(file);
        }
    }
}
