use crate::config::Settings;
use crate::query_index::QueryIndex;
use std::path::Path;
use std::time::Instant;

pub mod config;
pub mod connection;
pub mod db;
pub mod ident;
pub mod paths;
pub mod query_index;
pub mod sql_parser;
pub mod sqlc_config;
pub mod watch;

/// Index every sqlc config beneath `root`.
pub fn build_index(root: &Path, settings: Settings) -> anyhow::Result<QueryIndex> {
    let start = Instant::now();

    let mut index = QueryIndex::new(settings);
    index.init(root)?;

    log::info!(
        "Indexed {} queries from {} config(s) in {:.2}s",
        index.len(),
        index.configs().len(),
        start.elapsed().as_secs_f64()
    );

    Ok(index)
}
