use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sparkify_db::{create_tables, drop_tables, list_tables, recreate_statements, Session};
use sparkify_kernel::{CommitMode, Settings, StatementSet};

#[derive(Debug, Parser)]
#[command(name = "sparkify", version, about = "Recreate the sparkify database schema")]
struct Cli {
    /// Directory holding `base.toml` and `<env>.toml` (default: ./config).
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load: local, staging or production.
    #[arg(long = "env", global = true, value_name = "ENV")]
    environment: Option<String>,

    /// File with `drop` and `create` statement lists, replacing the built-in catalog.
    #[arg(long, global = true, value_name = "FILE")]
    statements: Option<PathBuf>,

    /// Run each table phase in a single transaction.
    #[arg(long, global = true)]
    atomic: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recreate the database, then drop and create all tables.
    Reset,
    /// Drop and recreate the database only.
    CreateDb,
    /// Run the drop statements against the existing target database.
    DropTables,
    /// Run the create statements against the existing target database.
    CreateTables,
    /// List the base tables of the target database.
    Tables,
    /// Print the statements a reset would execute without connecting.
    Plan {
        /// Emit JSON instead of SQL text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct Plan<'a> {
    database: &'a [String],
    drop: &'a [String],
    create: &'a [String],
    atomic: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_with(cli.config_dir.clone(), cli.environment.clone())
        .with_context(|| "failed to load sparkify settings")?;
    if let Some(path) = &cli.statements {
        settings.schema.statements_file = Some(path.clone());
    }
    if cli.atomic {
        settings.schema.commit_mode = CommitMode::Atomic;
    }

    sparkify_telemetry::init(&settings.telemetry);
    tracing::debug!(command = ?cli.command, env = ?settings.environment, "sparkify cli");

    let statements = sparkify_app::load_statements(&settings)?;

    match cli.command {
        Command::Reset => sparkify_app::run(&settings, &statements).await,
        Command::CreateDb => {
            let session = sparkify_db::bootstrap_database(&settings.database)
                .await
                .with_context(|| format!("failed to recreate '{}'", settings.database.name))?;
            session.close().await;
            Ok(())
        }
        Command::DropTables => {
            let mut session = connect_target(&settings).await?;
            let result =
                drop_tables(&mut session, &statements.drop, settings.schema.commit_mode).await;
            session.close().await;
            result.with_context(|| "failed to drop tables")
        }
        Command::CreateTables => {
            let mut session = connect_target(&settings).await?;
            let result =
                create_tables(&mut session, &statements.create, settings.schema.commit_mode).await;
            session.close().await;
            result.with_context(|| "failed to create tables")
        }
        Command::Tables => {
            let session = connect_target(&settings).await?;
            let tables = list_tables(&session, &settings.schema.introspection_schema).await;
            session.close().await;
            for table in tables? {
                println!("{table}");
            }
            Ok(())
        }
        Command::Plan { json } => print_plan(&settings, &statements, json),
    }
}

async fn connect_target(settings: &Settings) -> anyhow::Result<Session> {
    Session::connect(&settings.database, &settings.database.name)
        .await
        .with_context(|| format!("failed to connect to '{}'", settings.database.name))
}

fn print_plan(settings: &Settings, statements: &StatementSet, json: bool) -> anyhow::Result<()> {
    let database = recreate_statements(&settings.database)?;
    let atomic = settings.schema.commit_mode == CommitMode::Atomic;

    if json {
        let plan = Plan {
            database: &database,
            drop: &statements.drop,
            create: &statements.create,
            atomic,
        };
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let sections = [
        ("recreate database", &database[..]),
        ("drop tables", &statements.drop[..]),
        ("create tables", &statements.create[..]),
    ];
    for (title, section) in sections {
        println!("-- {title}");
        for statement in section {
            println!("{};", statement.trim_end());
        }
    }
    if atomic {
        println!("-- table phases run in one transaction each");
    }
    Ok(())
}
