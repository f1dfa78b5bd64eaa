//! Sparkify schema initializer.
//!
//! Recreates the sparkify database and its star schema from the built-in
//! statement catalog in [`queries`] or from a statements file.

pub mod queries;

use anyhow::Context;
use sparkify_db::{bootstrap_database, create_tables, drop_tables, list_tables};
use sparkify_kernel::{Settings, StatementSet};

/// Statements selected by `schema.statements_file`, or the built-in catalog.
pub fn load_statements(settings: &Settings) -> anyhow::Result<StatementSet> {
    match &settings.schema.statements_file {
        Some(path) => StatementSet::from_file(path),
        None => Ok(queries::statement_set()),
    }
}

/// Recreate the target database, then drop and create its tables.
pub async fn run(settings: &Settings, statements: &StatementSet) -> anyhow::Result<()> {
    let database = &settings.database;
    let mode = settings.schema.commit_mode;

    if statements.is_empty() {
        tracing::warn!(
            database = %database.name,
            "statement set is empty; the database will be recreated without tables"
        );
    }

    tracing::info!(
        env = ?settings.environment,
        server = %format!("{}:{}", database.host, database.port),
        database = %database.name,
        "recreating database"
    );

    let mut session = bootstrap_database(database)
        .await
        .with_context(|| format!("failed to recreate database '{}'", database.name))?;

    let result: anyhow::Result<Vec<String>> = async {
        drop_tables(&mut session, &statements.drop, mode)
            .await
            .with_context(|| "failed to drop tables")?;
        create_tables(&mut session, &statements.create, mode)
            .await
            .with_context(|| "failed to create tables")?;
        list_tables(&session, &settings.schema.introspection_schema)
            .await
            .with_context(|| "failed to list tables")
    }
    .await;

    session.close().await;

    let tables = result?;
    tracing::info!(
        database = %database.name,
        tables = ?tables,
        "schema initialized"
    );
    Ok(())
}
