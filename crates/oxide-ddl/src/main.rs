//! oxide-ddl CLI
//!
//! Prints or applies table DDL for a database engine.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_ddl::prelude::*;
use oxide_ddl::schema::load_json;

/// Dialect-aware table DDL.
#[derive(Parser)]
#[command(name = "oxide-ddl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target engine (postgres, mysql, sqlite).
    #[arg(long, env = "OXIDE_DDL_DIALECT", default_value = "sqlite")]
    dialect: DialectKind,

    /// SQLite database URL. Statements are printed when not given.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a table from a JSON definition.
    Create {
        /// Path to the table definition.
        #[arg(short, long)]
        table: PathBuf,
    },

    /// Drop a table.
    Drop {
        /// Table name.
        #[arg(short, long)]
        table: String,
    },

    /// Alter a table from a JSON alteration.
    Alter {
        /// Path to the alteration.
        #[arg(short, long)]
        alteration: PathBuf,

        /// Print the full plan without executing it.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.dialect {
        DialectKind::Postgres => run(&PostgresDialect::new(), cli.database, cli.command).await,
        DialectKind::MySql => run(&MySqlDialect::new(), cli.database, cli.command).await,
        DialectKind::Sqlite => run(&SqliteDialect::new(), cli.database, cli.command).await,
    }
}

async fn run<D: DdlDialect>(
    dialect: &D,
    database: Option<String>,
    command: Commands,
) -> anyhow::Result<()> {
    let (sql, alteration) = match command {
        Commands::Create { table } => {
            let table: Table = load_json(&table)?;
            (dialect.generate_table_create_sql(&table), None)
        }
        Commands::Drop { table } => (dialect.generate_table_drop_sql(&table), None),
        Commands::Alter {
            alteration,
            dry_run,
        } => {
            let alteration: Alteration = load_json(&alteration)?;
            let plan = dialect.plan_alteration(
                &alteration,
                dialect
                    .assumed_primary_key_name(&alteration.table_name)
                    .as_deref(),
            )?;
            if dry_run || database.is_none() {
                println!("{}", plan.to_sql());
                return Ok(());
            }
            (String::new(), Some(alteration))
        }
    };

    let Some(url) = database else {
        println!("{sql}");
        return Ok(());
    };
    if dialect.name() != SqliteDialect.name() {
        bail!(
            "executing against a database is only supported for sqlite, not {}",
            dialect.name()
        );
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await?;
    let mut tx = pool.begin().await?;

    // Dropping the transaction on error rolls it back.
    let sql = match alteration {
        Some(alteration) => {
            let mut conn = SqliteSchemaConnection::new(&mut *tx);
            dialect
                .generate_modify_table_sql(&alteration, Some(&mut conn))
                .await?
        }
        None => sql,
    };
    if !sql.is_empty() {
        SqliteSchemaConnection::new(&mut *tx)
            .execute_script(&sql)
            .await?;
    }
    tx.commit().await?;

    info!(dialect = dialect.name(), "Schema change applied");
    Ok(())
}
