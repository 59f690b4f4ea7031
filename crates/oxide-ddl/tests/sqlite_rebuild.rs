//! Table rebuilds against a real SQLite database.
//!
//! Every rebuild runs inside a transaction, the way callers are expected
//! to run it, and the returned cleanup statement is executed by the test.

mod common;

use common::{column_names, exec, index_names, memory_pool, seeded_pool, table_names, test_table};
use oxide_ddl::prelude::*;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;

fn rename_and_retype() -> Alteration {
    let target = Table::new("test")
        .column(
            Column::new("id", "INT")
                .primary_key()
                .auto_increment()
                .not_null(),
        )
        .column(Column::new("full_name", "VARCHAR").length(200).not_null())
        .column(Column::new("score", "BIGINT").default(0))
        .column(Column::new("notes", "TEXT").default("none"))
        .index(Index::new("name_ind", ["full_name"]).unwrap());

    Alteration::new("test")
        .add_column(Column::new("notes", "TEXT").default("none"))
        .modify_column(
            RenameableColumn::new(Column::new("full_name", "VARCHAR").length(200).not_null())
                .renamed_from("name"),
        )
        .modify_column(Column::new("score", "BIGINT").default(0))
        .drop_index(Index::new("score_ind", ["score"]).unwrap())
        .target(target)
}

#[tokio::test]
async fn test_rebuild_preserves_rows_under_rename_and_retype() {
    let pool = seeded_pool().await;
    let dialect = SqliteDialect::new();

    let mut tx = pool.begin().await.unwrap();
    let cleanup = {
        let mut conn = SqliteSchemaConnection::new(&mut *tx);
        dialect
            .generate_modify_table_sql(&rename_and_retype(), Some(&mut conn))
            .await
            .unwrap()
    };
    assert_eq!(cleanup, "DROP TABLE __test;");
    sqlx::raw_sql(&cleanup).execute(&mut *tx).await.unwrap();
    tx.commit().await.unwrap();

    let rows: Vec<(i64, String, i64, String)> =
        sqlx::query_as("SELECT id, full_name, score, notes FROM test ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![
            (1, "ada".to_string(), 10, "none".to_string()),
            (2, "brian".to_string(), 20, "none".to_string()),
            (3, "carmen".to_string(), 30, "none".to_string()),
        ]
    );

    assert_eq!(table_names(&pool).await, vec!["test"]);
    assert_eq!(index_names(&pool, "test").await, vec!["name_ind"]);
    assert_eq!(
        column_names(&pool, "test").await,
        vec!["id", "full_name", "score", "notes"]
    );
}

#[tokio::test]
async fn test_temporary_table_survives_until_caller_drops_it() {
    let pool = seeded_pool().await;

    let mut tx = pool.begin().await.unwrap();
    let cleanup = {
        let mut conn = SqliteSchemaConnection::new(&mut *tx);
        SqliteDialect::new()
            .generate_modify_table_sql(&rename_and_retype(), Some(&mut conn))
            .await
            .unwrap()
    };

    let leftover: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '__test'",
    )
    .fetch_all(&mut *tx)
    .await
    .unwrap();
    assert_eq!(leftover, vec!["__test"]);

    let old_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM __test")
        .fetch_one(&mut *tx)
        .await
        .unwrap();
    assert_eq!(old_rows, 3);

    sqlx::raw_sql(&cleanup).execute(&mut *tx).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(table_names(&pool).await, vec!["test"]);
}

#[tokio::test]
async fn test_failed_rebuild_rolls_back() {
    let pool = seeded_pool().await;

    exec(&pool, "INSERT INTO test (\"name\", \"score\") VALUES ('dora', 10);").await;

    // The copy violates the new unique index.
    let alteration = Alteration::new("test")
        .modify_column(Column::new("score", "BIGINT"))
        .modify_index(Index::new("score_ind", ["score"]).unwrap().unique())
        .target(
            Table::new("test")
                .column(Column::new("id", "INTEGER").primary_key())
                .column(Column::new("name", "TEXT"))
                .column(Column::new("score", "BIGINT"))
                .index(Index::new("score_ind", ["score"]).unwrap().unique()),
        );

    let mut tx = pool.begin().await.unwrap();
    let result = {
        let mut conn = SqliteSchemaConnection::new(&mut *tx);
        SqliteDialect::new()
            .generate_modify_table_sql(&alteration, Some(&mut conn))
            .await
    };
    assert!(matches!(result, Err(SchemaError::Database(_))));
    tx.rollback().await.unwrap();

    assert_eq!(table_names(&pool).await, vec!["test"]);
    assert_eq!(column_names(&pool, "test").await, vec!["id", "name", "score"]);
    assert_eq!(index_names(&pool, "test").await, vec!["name_ind", "score_ind"]);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn test_primary_key_change_rebuilds_with_new_key() {
    let pool = seeded_pool().await;

    let target = Table::new("test")
        .column(Column::new("id", "INT").primary_key().not_null())
        .column(Column::new("name", "VARCHAR").length(100).primary_key().not_null())
        .column(Column::new("score", "INT").default(0))
        .index(Index::new("score_ind", ["score"]).unwrap());
    let alteration = Alteration::new("test")
        .primary_key(["id", "name"])
        .target(target);

    let mut tx = pool.begin().await.unwrap();
    let cleanup = {
        let mut conn = SqliteSchemaConnection::new(&mut *tx);
        SqliteDialect::new()
            .generate_modify_table_sql(&alteration, Some(&mut conn))
            .await
            .unwrap()
    };
    sqlx::raw_sql(&cleanup).execute(&mut *tx).await.unwrap();
    tx.commit().await.unwrap();

    let key: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('test') WHERE pk > 0 ORDER BY pk")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(key, vec!["id", "name"]);
    assert_eq!(index_names(&pool, "test").await, vec!["score_ind"]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_additive_change_is_returned_not_executed() {
    let pool = seeded_pool().await;
    let alteration = Alteration::new("test")
        .add_column(Column::new("notes", "TEXT").default("none"))
        .add_index(Index::new("notes_ind", ["notes"]).unwrap());

    let mut pooled = pool.acquire().await.unwrap();
    let sql = {
        let mut conn = SqliteSchemaConnection::new(&mut pooled);
        SqliteDialect::new()
            .generate_modify_table_sql(&alteration, Some(&mut conn))
            .await
            .unwrap()
    };
    drop(pooled);

    assert_eq!(
        sql,
        "ALTER TABLE test ADD COLUMN \"notes\" TEXT DEFAULT 'none';\
         CREATE INDEX notes_ind ON test (\"notes\");"
    );
    assert_eq!(column_names(&pool, "test").await, vec!["id", "name", "score"]);

    exec(&pool, &sql).await;
    assert_eq!(
        column_names(&pool, "test").await,
        vec!["id", "name", "score", "notes"]
    );
    assert_eq!(
        index_names(&pool, "test").await,
        vec!["name_ind", "notes_ind", "score_ind"]
    );
}

#[tokio::test]
async fn test_create_then_drop_round_trip() {
    let pool = memory_pool().await;
    let dialect = SqliteDialect::new();

    exec(&pool, &dialect.generate_table_create_sql(&test_table())).await;
    assert_eq!(table_names(&pool).await, vec!["test"]);
    assert_eq!(index_names(&pool, "test").await, vec!["name_ind", "score_ind"]);

    exec(&pool, &dialect.generate_table_drop_sql("test")).await;
    assert!(table_names(&pool).await.is_empty());
}

#[tokio::test]
async fn test_rebuild_on_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("app.db"))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await
        .unwrap();
    exec(&pool, &SqliteDialect::new().generate_table_create_sql(&test_table())).await;
    exec(&pool, "INSERT INTO test (\"name\") VALUES ('ada');").await;

    let mut tx = pool.begin().await.unwrap();
    let cleanup = {
        let mut conn = SqliteSchemaConnection::new(&mut *tx);
        SqliteDialect::new()
            .generate_modify_table_sql(&rename_and_retype(), Some(&mut conn))
            .await
            .unwrap()
    };
    sqlx::raw_sql(&cleanup).execute(&mut *tx).await.unwrap();
    tx.commit().await.unwrap();
    pool.close().await;

    let reopened = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    let names: Vec<String> = sqlx::query_scalar("SELECT full_name FROM test")
        .fetch_all(&reopened)
        .await
        .unwrap();
    assert_eq!(names, vec!["ada"]);
    assert_eq!(table_names(&reopened).await, vec!["test"]);
}
