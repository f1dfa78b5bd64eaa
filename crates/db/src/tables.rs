use std::fmt;

use sparkify_kernel::CommitMode;

use crate::error::DbError;
use crate::session::DdlExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DropTables,
    CreateTables,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::DropTables => f.write_str("drop-tables"),
            Phase::CreateTables => f.write_str("create-tables"),
        }
    }
}

/// Execute `DROP TABLE` statements in order.
pub async fn drop_tables<E>(
    executor: &mut E,
    statements: &[String],
    mode: CommitMode,
) -> Result<(), DbError>
where
    E: DdlExecutor + ?Sized,
{
    apply(executor, Phase::DropTables, statements, mode).await
}

/// Execute `CREATE TABLE` statements in order.
///
/// Referenced tables must come before the tables that reference them; the
/// order is not checked here and a violation surfaces as the server's error
/// on the referencing statement.
pub async fn create_tables<E>(
    executor: &mut E,
    statements: &[String],
    mode: CommitMode,
) -> Result<(), DbError>
where
    E: DdlExecutor + ?Sized,
{
    apply(executor, Phase::CreateTables, statements, mode).await
}

async fn apply<E>(
    executor: &mut E,
    phase: Phase,
    statements: &[String],
    mode: CommitMode,
) -> Result<(), DbError>
where
    E: DdlExecutor + ?Sized,
{
    tracing::info!(
        phase = %phase,
        statements = statements.len(),
        mode = ?mode,
        "applying statements"
    );

    match mode {
        CommitMode::PerStatement => {
            for (index, statement) in statements.iter().enumerate() {
                tracing::debug!(phase = %phase, index, statement = statement.trim(), "executing");
                if let Err(error) = executor.execute_committed(statement).await {
                    tracing::error!(phase = %phase, index, error = %error, "statement failed");
                    return Err(error);
                }
            }
        }
        CommitMode::Atomic => {
            if !statements.is_empty() {
                if let Err(error) = executor.execute_atomic(statements).await {
                    tracing::error!(phase = %phase, error = %error, "phase rolled back");
                    return Err(error);
                }
            }
        }
    }

    tracing::info!(phase = %phase, "phase complete");
    Ok(())
}
