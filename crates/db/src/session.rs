use async_trait::async_trait;
use sparkify_kernel::settings::DatabaseSettings;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::error::DbError;

const APPLICATION_NAME: &str = "sparkify";

/// Executes DDL with an explicit commit discipline.
///
/// [`Session`] is the production implementation; the table phases are
/// generic over this trait.
#[async_trait]
pub trait DdlExecutor: Send {
    /// Run one statement in its own transaction and commit it before returning.
    async fn execute_committed(&mut self, statement: &str) -> Result<(), DbError>;

    /// Run all statements in a single transaction. Nothing is committed
    /// unless every statement succeeds.
    async fn execute_atomic(&mut self, statements: &[String]) -> Result<(), DbError>;
}

/// A live connection to one database.
///
/// The `tokio-postgres` connection future runs on a spawned task; [`Session::close`]
/// drops the client and waits for that task, so the server session is gone
/// once `close` returns.
pub struct Session {
    client: Client,
    driver: JoinHandle<()>,
    database: String,
}

impl Session {
    /// Open a session to `database` using the host and credentials in `settings`.
    pub async fn connect(settings: &DatabaseSettings, database: &str) -> Result<Self, DbError> {
        let server = format!("{}:{}/{}", settings.host, settings.port, database);

        let mut config = tokio_postgres::Config::new();
        config
            .host(settings.host.as_str())
            .port(settings.port)
            .user(settings.user.as_str())
            .dbname(database)
            .application_name(APPLICATION_NAME);
        if let Some(password) = &settings.password {
            config.password(password.as_str());
        }

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|error| DbError::Connect {
                target: server.clone(),
                source: error.into(),
            })?;

        let driver_database = database.to_string();
        let driver = tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::error!(
                    database = %driver_database,
                    error = %error,
                    "database connection terminated with error"
                );
            }
        });

        tracing::info!(server = %server, user = %settings.user, "session opened");

        Ok(Self {
            client,
            driver,
            database: database.to_string(),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run `statement` outside any transaction block. Required for
    /// `CREATE DATABASE` and `DROP DATABASE`.
    pub async fn execute(&self, statement: &str) -> Result<(), DbError> {
        tracing::debug!(database = %self.database, statement = statement.trim(), "executing");
        self.client
            .batch_execute(statement)
            .await
            .map_err(|error| DbError::from_driver(statement, error))
    }

    /// Release the session and wait for the server connection to shut down.
    pub async fn close(self) {
        let Session {
            client,
            driver,
            database,
        } = self;

        drop(client);
        if let Err(error) = driver.await {
            tracing::warn!(
                database = %database,
                error = %error,
                "connection task did not finish cleanly"
            );
        }

        tracing::info!(database = %database, "session closed");
    }
}

#[async_trait]
impl DdlExecutor for Session {
    async fn execute_committed(&mut self, statement: &str) -> Result<(), DbError> {
        let transaction = self
            .client
            .transaction()
            .await
            .map_err(|error| DbError::from_driver("BEGIN", error))?;
        transaction
            .batch_execute(statement)
            .await
            .map_err(|error| DbError::from_driver(statement, error))?;
        transaction
            .commit()
            .await
            .map_err(|error| DbError::from_driver("COMMIT", error))
    }

    async fn execute_atomic(&mut self, statements: &[String]) -> Result<(), DbError> {
        let transaction = self
            .client
            .transaction()
            .await
            .map_err(|error| DbError::from_driver("BEGIN", error))?;
        for statement in statements {
            // Dropping the transaction on error rolls it back.
            transaction
                .batch_execute(statement)
                .await
                .map_err(|error| DbError::from_driver(statement, error))?;
        }
        transaction
            .commit()
            .await
            .map_err(|error| DbError::from_driver("COMMIT", error))
    }
}
