use clap::Parser;
use clio::ClioPath;
use env_logger::Env;
use sqlc_index::config::Settings;
use sqlc_index::connection::{Connection, DEFAULT_CONNECTION_STRING};
use sqlc_index::db::{CreateUserParams, Queries};
use std::path::Path;

#[derive(Parser)]
#[clap(name = "create-user", about = "Insert one user through the query client")]
struct Opt {
    #[clap(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[clap(long, default_value = "testuser")]
    username: String,

    #[clap(long, default_value = "test@example.com")]
    email: String,

    #[clap(long, short, value_parser = clap::value_parser!(ClioPath).exists().is_file())]
    settings: Option<ClioPath>,
}

impl Opt {
    fn connection_string(&self) -> anyhow::Result<String> {
        if let Some(url) = &self.database_url {
            return Ok(url.clone());
        }

        let settings = match &self.settings {
            Some(path) => {
                let path: &Path = path.path();
                Settings::from_file(path)?
            }
            None => Settings::load(None, Path::new("."))?,
        };

        Ok(settings
            .connection_string
            .unwrap_or_else(|| DEFAULT_CONNECTION_STRING.to_string()))
    }
}

async fn run(opt: Opt) -> anyhow::Result<()> {
    let conn = Connection::open(&opt.connection_string()?).await?;

    let queries = Queries::new(conn.client());

    let user = queries
        .create_user(CreateUserParams {
            username: opt.username,
            email: opt.email,
        })
        .await?;

    log::info!("Created user: {:?}", user);

    conn.close().await;

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Opt::parse()).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
