//! Scenarios against a live PostgreSQL server.
//!
//! Run with `cargo test -p sparkify-db -- --ignored`; connection settings come
//! from the usual `SPARKIFY_DATABASE__*` variables. Each test owns a separate
//! target database so they can run in parallel.

use sparkify_db::{
    bootstrap_database, create_tables, drop_tables, list_tables, DbError, Session,
};
use sparkify_kernel::settings::{DatabaseSettings, Settings};
use sparkify_kernel::CommitMode;
use tokio_postgres::error::SqlState;

fn settings_for(database: &str) -> DatabaseSettings {
    let mut settings = Settings::load()
        .expect("settings should load from the environment")
        .database;
    settings.name = database.to_string();
    settings
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn run_sequence(
    settings: &DatabaseSettings,
    drops: &[String],
    creates: &[String],
) -> Result<Session, DbError> {
    let mut session = bootstrap_database(settings).await?;
    drop_tables(&mut session, drops, CommitMode::PerStatement).await?;
    create_tables(&mut session, creates, CommitMode::PerStatement).await?;
    Ok(session)
}

async fn count_users(session: &Session) -> i64 {
    session
        .client()
        .query_one("SELECT count(*) FROM users", &[])
        .await
        .unwrap()
        .get(0)
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn rerunning_the_sequence_discards_rows_and_keeps_schema() {
    let settings = settings_for("sparkify_it_rerun");
    let drops = owned(&["DROP TABLE IF EXISTS users"]);
    let creates = owned(&["CREATE TABLE users (id INT PRIMARY KEY)"]);

    let session = run_sequence(&settings, &drops, &creates).await.unwrap();
    session
        .client()
        .execute("INSERT INTO users (id) VALUES (1)", &[])
        .await
        .unwrap();
    assert_eq!(count_users(&session).await, 1);
    session.close().await;

    let session = run_sequence(&settings, &drops, &creates).await.unwrap();
    assert_eq!(count_users(&session).await, 0);
    session
        .client()
        .execute("INSERT INTO users (id) VALUES (1)", &[])
        .await
        .unwrap();
    assert_eq!(
        list_tables(&session, "public").await.unwrap(),
        vec!["users".to_string()]
    );
    session.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn created_tables_match_statement_list_exactly() {
    let settings = settings_for("sparkify_it_exact");
    let drops = owned(&["DROP TABLE IF EXISTS child", "DROP TABLE IF EXISTS parent"]);
    let creates = owned(&[
        "CREATE TABLE parent (id INT PRIMARY KEY)",
        "CREATE TABLE child (id INT PRIMARY KEY, parent_id INT REFERENCES parent (id))",
    ]);

    let mut session = run_sequence(&settings, &drops, &creates).await.unwrap();
    assert_eq!(
        list_tables(&session, "public").await.unwrap(),
        owned(&["child", "parent"])
    );

    // Dropping and creating again on a populated database leaves it empty.
    session
        .client()
        .batch_execute("INSERT INTO parent VALUES (1); INSERT INTO child VALUES (1, 1)")
        .await
        .unwrap();
    drop_tables(&mut session, &drops, CommitMode::Atomic)
        .await
        .unwrap();
    create_tables(&mut session, &creates, CommitMode::Atomic)
        .await
        .unwrap();
    let rows: i64 = session
        .client()
        .query_one(
            "SELECT (SELECT count(*) FROM parent) + (SELECT count(*) FROM child)",
            &[],
        )
        .await
        .unwrap()
        .get(0);
    assert_eq!(rows, 0);
    session.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn child_before_parent_fails_on_the_child_statement() {
    let settings = settings_for("sparkify_it_order");
    let creates = owned(&[
        "CREATE TABLE child (id INT PRIMARY KEY, parent_id INT REFERENCES parent (id))",
        "CREATE TABLE parent (id INT PRIMARY KEY)",
    ]);

    let mut session = bootstrap_database(&settings).await.unwrap();
    let err = create_tables(&mut session, &creates, CommitMode::PerStatement)
        .await
        .unwrap_err();

    assert_eq!(err.sql_state(), Some(&SqlState::UNDEFINED_TABLE));
    assert!(err.statement().unwrap().starts_with("CREATE TABLE child"));
    assert!(list_tables(&session, "public").await.unwrap().is_empty());
    session.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn bootstrap_succeeds_when_target_does_not_exist() {
    let settings = settings_for("sparkify_it_absent");

    let admin = Session::connect(&settings, &settings.admin_database)
        .await
        .unwrap();
    admin
        .execute("DROP DATABASE IF EXISTS \"sparkify_it_absent\"")
        .await
        .unwrap();
    admin.close().await;

    let session = bootstrap_database(&settings).await.unwrap();
    assert_eq!(session.database(), "sparkify_it_absent");
    assert!(list_tables(&session, "public").await.unwrap().is_empty());
    session.close().await;
}
