#![allow(dead_code)]

use oxide_ddl::prelude::*;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

pub async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to execute: {sql}\nError: {e:?}"));
}

/// The table every rebuild test starts from.
pub fn test_table() -> Table {
    Table::new("test")
        .column(
            Column::new("id", "INT")
                .primary_key()
                .auto_increment()
                .not_null(),
        )
        .column(Column::new("name", "VARCHAR").length(100).not_null())
        .column(Column::new("score", "INT").default(0))
        .index(Index::new("name_ind", ["name"]).unwrap())
        .index(Index::new("score_ind", ["score"]).unwrap())
}

/// In-memory database holding `test_table()` and three rows.
pub async fn seeded_pool() -> SqlitePool {
    let pool = memory_pool().await;
    exec(&pool, &SqliteDialect::new().generate_table_create_sql(&test_table())).await;
    exec(
        &pool,
        "INSERT INTO test (\"name\", \"score\") VALUES ('ada', 10), ('brian', 20), ('carmen', 30);",
    )
    .await;
    pool
}

/// User tables, sorted by name.
pub async fn table_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

/// Index names on `table`, sorted.
pub async fn index_names(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' \
         AND tbl_name = ? AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .unwrap()
}

/// Column names of `table`, in declaration order.
pub async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .fetch_all(pool)
        .await
        .unwrap()
}
