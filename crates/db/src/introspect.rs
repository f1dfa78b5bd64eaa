use crate::error::DbError;
use crate::session::Session;

const LIST_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

/// Names of the base tables in `schema`, sorted.
pub async fn list_tables(session: &Session, schema: &str) -> Result<Vec<String>, DbError> {
    let rows = session
        .client()
        .query(LIST_TABLES, &[&schema])
        .await
        .map_err(|error| DbError::from_driver(LIST_TABLES, error))?;

    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}
