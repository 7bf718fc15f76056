use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config, NoTls};

/// Connection string used when nothing else is configured.
pub const DEFAULT_CONNECTION_STRING: &str = "postgresql://localhost/testdb?sslmode=disable";

/// An open database session. The driver task is torn down with the handle.
pub struct Connection {
    client: Client,
    driver: Option<JoinHandle<()>>,
}

/// Parse a connection string, defaulting the user to the current OS user
/// the way libpq does.
pub fn parse_connection_string(connection_string: &str) -> anyhow::Result<Config> {
    let mut config: Config = connection_string
        .parse()
        .with_context(|| format!("Invalid connection string '{}'", connection_string))?;

    if config.get_user().is_none() {
        config.user(&whoami::username());
    }

    Ok(config)
}

impl Connection {
    pub async fn open(connection_string: &str) -> anyhow::Result<Self> {
        let config = parse_connection_string(connection_string)?;

        log::debug!(
            "Connecting to {:?}/{}",
            config.get_hosts(),
            config.get_dbname().unwrap_or_default()
        );

        let (client, connection) = config
            .connect(NoTls)
            .await
            .context("Failed to connect to database")?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Connection error: {}", e);
            }
        });

        Ok(Self {
            client,
            driver: Some(driver),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Close the session and wait for the driver task to finish.
    pub async fn close(mut self) {
        let driver = self.driver.take();
        drop(self);

        if let Some(driver) = driver {
            // Aborted or panicked drivers have nothing left to clean up
            let _ = driver.await;
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}
