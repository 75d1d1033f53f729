//! Integration tests against real PostgreSQL.
//!
//! These tests verify that:
//! 1. Rendered ALTER statements execute correctly against PostgreSQL
//! 2. Classification matches what the live catalog reports
//! 3. Partial failure leaves the successful columns committed
//!
//! Run with: cargo test -p grout --test postgres_integration -- --ignored
//!
//! Note: Requires Docker to be running.

use grout::{ColumnSpec, Error, PgStore, TableTarget, describe, reconcile};
use std::time::Duration;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

/// Set up a PostgreSQL container and return a connected client.
async fn setup_postgres() -> (ContainerAsync<Postgres>, Client) {
    let container = Postgres::default()
        .start()
        .await
        .expect("failed to start postgres container");

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("postgres port not available");

    // Connect with retries (postgres may not be fully ready even after the
    // port is open).
    let conn_str = format!(
        "host=127.0.0.1 port={} user=postgres password=postgres dbname=postgres",
        port
    );

    let mut attempts = 0;
    let max_attempts = 10;
    let client = loop {
        attempts += 1;
        match grout::connect(&conn_str).await {
            Ok(client) => break client,
            Err(e) if attempts < max_attempts => {
                tracing::debug!("Connection attempt {} failed: {}, retrying...", attempts, e);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Err(e) => panic!(
                "failed to connect to postgres after {} attempts: {}",
                attempts, e
            ),
        }
    };

    (container, client)
}

async fn create_timelines_table(client: &Client) {
    client
        .batch_execute(
            r#"
            CREATE TABLE timelines (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL
            );
            "#,
        )
        .await
        .expect("failed to create test table");
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_reconcile_round_trip() {
    let (_container, client) = setup_postgres().await;
    create_timelines_table(&client).await;

    let target = TableTarget::new("timelines").column(
        ColumnSpec::new("course_topic", "VARCHAR(300)").comment("topic covered this week"),
    );
    let store = PgStore::new(&client);

    let first = reconcile(&store, &target).await.unwrap();
    assert_eq!(first.columns_added, ["course_topic"]);
    assert!(first.columns_failed.is_empty());
    let names: Vec<&str> = first
        .final_schema_snapshot
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["id", "title", "course_topic"]);

    let second = reconcile(&store, &target).await.unwrap();
    assert!(second.columns_added.is_empty());
    assert!(second.columns_already_present.contains("course_topic"));
    assert!(second.is_noop());

    // The catalog spells out the concrete type, and the comment stuck.
    let columns = describe(&store, "timelines").await.unwrap();
    let topic = columns.iter().find(|c| c.name == "course_topic").unwrap();
    assert_eq!(topic.data_type, "character varying");

    let row = client
        .query_one(
            "SELECT col_description(attrelid, attnum) FROM pg_attribute \
             WHERE attrelid = 'timelines'::regclass AND attname = 'course_topic'",
            &[],
        )
        .await
        .unwrap();
    let comment: Option<String> = row.get(0);
    assert_eq!(comment.as_deref(), Some("topic covered this week"));
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_partial_failure_leaves_good_columns_committed() {
    let (_container, client) = setup_postgres().await;
    create_timelines_table(&client).await;

    let target = TableTarget::new("timelines")
        .column(ColumnSpec::new("first_col", "TEXT"))
        .column(ColumnSpec::new("broken_col", "DEFINITELY_NOT_A_TYPE"))
        .column(ColumnSpec::new("third_col", "INTEGER"));
    let store = PgStore::new(&client);

    let result = reconcile(&store, &target).await.unwrap();

    assert_eq!(result.columns_added, ["first_col", "third_col"]);
    assert!(result.columns_failed["broken_col"].contains("does not exist"));

    let names: Vec<&str> = result
        .final_schema_snapshot
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert!(names.contains(&"first_col"));
    assert!(names.contains(&"third_col"));
    assert!(!names.contains(&"broken_col"));
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_missing_table_is_fatal() {
    let (_container, client) = setup_postgres().await;

    let store = PgStore::new(&client);
    let target = TableTarget::new("reports").column(ColumnSpec::new("grade", "NUMERIC"));

    let err = reconcile(&store, &target).await.unwrap_err();
    assert!(matches!(
        err,
        Error::CatalogUnavailable { ref table, .. } if table == "reports"
    ));
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_pooled_connection_path() {
    let (_container, client) = setup_postgres().await;
    create_timelines_table(&client).await;

    drop(client);
    let port = _container.get_host_port_ipv4(5432).await.unwrap();
    let config: tokio_postgres::Config = format!(
        "host=127.0.0.1 port={} user=postgres password=postgres dbname=postgres",
        port
    )
    .parse()
    .unwrap();

    let manager = deadpool_postgres::Manager::new(config, NoTls);
    let pool = deadpool_postgres::Pool::builder(manager)
        .max_size(2)
        .build()
        .unwrap();

    // A pooled Object is a Connection too, so services embedding the
    // reconciler go through the same store code as the CLI.
    let conn = pool.get().await.unwrap();
    let store = PgStore::new(&conn);

    let target =
        TableTarget::new("timelines").column(ColumnSpec::new("course_topic", "VARCHAR(300)"));
    let result = reconcile(&store, &target).await.unwrap();
    assert_eq!(result.columns_added, ["course_topic"]);
}
