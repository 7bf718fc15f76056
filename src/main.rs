use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use clio::ClioPath;
use env_logger::Env;
use itertools::Itertools;
use serde::Serialize;
use sqlc_index::config::Settings;
use sqlc_index::ident::{query_to_rs_string, CaseType};
use sqlc_index::query_index::{QueryHit, QueryIndex};
use sqlc_index::sqlc_config::parse_config;
use sqlc_index::watch::IndexWatcher;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::{fs, io, thread};

#[derive(Parser)]
#[clap(name = "sqlc-index", about = "Find sqlc query definitions")]
struct Opt {
    /// Directory searched for sqlc configs
    #[clap(long, short, value_parser = clap::value_parser!(ClioPath).exists().is_dir(), default_value = ".")]
    root: ClioPath,

    /// Settings file (defaults to <root>/sqlc-index.toml when present)
    #[clap(long, short, value_parser = clap::value_parser!(ClioPath).exists().is_file())]
    settings: Option<ClioPath>,

    /// Print results as JSON
    #[clap(long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every indexed query
    List,
    /// Show where a query is defined
    Lookup {
        /// Query name, or the generated method name (e.g. create_user)
        name: String,
    },
    /// Print the query globs of a single sqlc config
    Patterns {
        #[clap(value_parser = clap::value_parser!(ClioPath).exists().is_file())]
        config: ClioPath,
    },
    /// Keep the index up to date and answer lookups read from stdin
    Watch,
}

#[derive(Serialize)]
struct Entry<'a> {
    name: &'a str,
    method: String,
    hits: &'a [QueryHit],
}

impl<'a> Entry<'a> {
    fn new(name: &'a str, hits: &'a [QueryHit]) -> Self {
        Self {
            name,
            method: query_to_rs_string(name, CaseType::Snake),
            hits,
        }
    }
}

fn format_hit(hit: &QueryHit) -> String {
    format!("{}:{} {}", hit.path.display(), hit.range.line + 1, hit.command)
}

fn print_entries(entries: &[Entry<'_>], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    for entry in entries {
        println!("{} ({})", entry.name, entry.method);
        println!("{}", entry.hits.iter().map(|h| format!("  {}", format_hit(h))).join("\n"));
    }

    Ok(())
}

fn watch(index: QueryIndex, root: &Path) -> anyhow::Result<()> {
    let index = Arc::new(Mutex::new(index));
    let watcher = IndexWatcher::new(root)?;

    let lookups = Arc::clone(&index);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let name = line.trim();
            if name.is_empty() {
                continue;
            }

            let Ok(index) = lookups.lock() else { break };
            match index.lookup_fuzzy(name) {
                Some((name, hits)) => {
                    println!("{}", name);
                    for hit in hits {
                        println!("  {}", format_hit(hit));
                    }
                }
                None => println!("{}: not found", name),
            }
        }
    });

    watcher.run(index)
}

pub fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opt = Opt::parse();

    let root_arg: &Path = opt.root.path();
    let root: PathBuf = fs::canonicalize(root_arg)
        .with_context(|| format!("Failed to resolve {}", root_arg.display()))?;
    let settings_path: Option<&Path> = opt.settings.as_ref().map(|s| -> &Path { s.path() });
    let settings = Settings::load(settings_path, &root)?;

    match opt.command {
        Command::Patterns { config } => {
            let config_path: &Path = config.path();
            let patterns = parse_config(config_path)?;
            if opt.json {
                println!("{}", serde_json::to_string_pretty(&patterns)?);
            } else {
                for pattern in patterns {
                    println!("{}", pattern);
                }
            }
        }
        Command::List => {
            let index = sqlc_index::build_index(&root, settings)?;
            let entries: Vec<Entry<'_>> = index
                .names()
                .into_iter()
                .filter_map(|name| index.lookup(name).map(|hits| Entry::new(name, hits)))
                .collect();
            print_entries(&entries, opt.json)?;
        }
        Command::Lookup { name } => {
            let index = sqlc_index::build_index(&root, settings)?;
            let Some((found, hits)) = index.lookup_fuzzy(&name) else {
                bail!("No query named '{}' under {}", name, root.display());
            };
            print_entries(&[Entry::new(&found, hits)], opt.json)?;
        }
        Command::Watch => {
            let index = sqlc_index::build_index(&root, settings)?;
            watch(index, &root)?;
        }
    }

    Ok(())
}
