use anyhow::{anyhow, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `-- name: QueryName :command`
static DEFINITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*--\s+name:\s*([A-Za-z0-9_]+)\s+(:[A-Za-z0-9]+)\b")
        .expect("definition regex to compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryCommand {
    /// Single row
    One,
    /// Zero or more rows
    Many,
    /// No result
    Exec,
    /// Affected row count
    ExecRows,
    /// Driver result value
    ExecResult,
    /// Last inserted id
    ExecLastId,
    CopyFrom,
    BatchExec,
    BatchMany,
    BatchOne,
    /// Anything else sqlc might grow; kept verbatim, without the colon
    Other(String),
}

impl QueryCommand {
    /// Parse a command with or without its leading colon. Never fails.
    pub fn parse(s: &str) -> Self {
        match s.trim_start_matches(':') {
            "one" => QueryCommand::One,
            "many" => QueryCommand::Many,
            "exec" => QueryCommand::Exec,
            "execrows" => QueryCommand::ExecRows,
            "execresult" => QueryCommand::ExecResult,
            "execlastid" => QueryCommand::ExecLastId,
            "copyfrom" => QueryCommand::CopyFrom,
            "batchexec" => QueryCommand::BatchExec,
            "batchmany" => QueryCommand::BatchMany,
            "batchone" => QueryCommand::BatchOne,
            other => QueryCommand::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, QueryCommand::Other(_))
    }
}

impl fmt::Display for QueryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryCommand::One => "one",
            QueryCommand::Many => "many",
            QueryCommand::Exec => "exec",
            QueryCommand::ExecRows => "execrows",
            QueryCommand::ExecResult => "execresult",
            QueryCommand::ExecLastId => "execlastid",
            QueryCommand::CopyFrom => "copyfrom",
            QueryCommand::BatchExec => "batchexec",
            QueryCommand::BatchMany => "batchmany",
            QueryCommand::BatchOne => "batchone",
            QueryCommand::Other(s) => s.as_str(),
        };
        write!(f, ":{}", s)
    }
}

impl Serialize for QueryCommand {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub name: String,
    /// Including the leading colon, e.g. `:one`
    pub command: String,
}

/// Match a single `-- name: X :cmd` line.
pub fn match_query_definition(line: &str) -> Option<QueryDefinition> {
    let captures = DEFINITION_REGEX.captures(line)?;

    Some(QueryDefinition {
        name: captures.get(1)?.as_str().to_string(),
        command: captures.get(2)?.as_str().to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub name: String,
    pub command: QueryCommand,
    /// SQL following the definition line, up to the next definition or EOF
    pub sql: String,
    /// File path where query was found
    pub file_path: PathBuf,
    /// 0-based index of the definition line
    pub line: usize,
    /// Length of the definition line in characters
    pub line_len: usize,
}

impl ParsedQuery {
    /// 1-based line number, for display
    pub fn line_number(&self) -> usize {
        self.line + 1
    }
}

#[derive(Default)]
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single SQL file
    pub fn parse_file(&self, path: &Path) -> Result<Vec<ParsedQuery>> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read file {:?}: {}", path, e))?;

        Ok(self.parse_content(&content, path.to_path_buf()))
    }

    /// Parse SQL content from a string
    pub fn parse_content(&self, content: &str, file_path: PathBuf) -> Vec<ParsedQuery> {
        let mut queries = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;

        while i < lines.len() {
            let Some(def) = match_query_definition(lines[i]) else {
                i += 1;
                continue;
            };

            let line = i;
            let line_len = lines[i].chars().count();

            // Collect the SQL query (all lines until next definition or EOF)
            i += 1;
            let start = i;
            while i < lines.len() && match_query_definition(lines[i]).is_none() {
                i += 1;
            }
            let sql = lines[start..i].join("\n").trim().to_string();

            if sql.is_empty() {
                log::warn!(
                    "Empty query for '{}' at {}:{}",
                    def.name,
                    file_path.display(),
                    line + 1
                );
            }

            let command = QueryCommand::parse(&def.command);
            if !command.is_known() {
                log::debug!(
                    "Unrecognised command {} for '{}' at {}:{}",
                    command,
                    def.name,
                    file_path.display(),
                    line + 1
                );
            }

            queries.push(ParsedQuery {
                name: def.name,
                command,
                sql,
                file_path: file_path.clone(),
                line,
                line_len,
            });
        }

        queries
    }
}
