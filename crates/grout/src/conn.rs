//! The connection seam between the store and a live Postgres server.
//!
//! [`Connection`] abstracts over the two ways callers hold a connection: a
//! plain `tokio_postgres::Client` for one-shot operational runs, and a pooled
//! `deadpool_postgres::Object` for reconciliation embedded in a service. The
//! store layer talks to this trait only. Futures are boxed so the trait stays
//! usable as `dyn Connection`.

use std::future::Future;
use std::pin::Pin;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};

use crate::error::Error;

/// Future type returned by [`Connection`] methods.
pub type ConnFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, tokio_postgres::Error>> + Send + 'a>>;

/// A live Postgres connection the reconciler can issue statements on.
pub trait Connection: Send + Sync {
    /// Execute a statement, returning the number of rows affected.
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, u64>;

    /// Run a query, returning all rows.
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, Vec<Row>>;

    /// Run a query that must return exactly one row.
    fn query_one<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, Row>;
}

impl Connection for Client {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, u64> {
        Box::pin(Client::execute(self, sql, params))
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, Vec<Row>> {
        Box::pin(Client::query(self, sql, params))
    }

    fn query_one<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, Row> {
        Box::pin(Client::query_one(self, sql, params))
    }
}

impl Connection for deadpool_postgres::Object {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, u64> {
        let client: &Client = self;
        Box::pin(client.execute(sql, params))
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, Vec<Row>> {
        let client: &Client = self;
        Box::pin(client.query(sql, params))
    }

    fn query_one<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> ConnFuture<'a, Row> {
        let client: &Client = self;
        Box::pin(client.query_one(sql, params))
    }
}

/// Connect to Postgres and drive the connection in a background task.
///
/// The companion connection future is spawned onto the current runtime; a
/// terminal connection error is logged rather than surfaced, matching the
/// one-shot operational use this crate is built for. Callers that need TLS or
/// finer control over the connection task connect themselves and hand the
/// client to [`PgStore`](crate::PgStore).
pub async fn connect(url: &str) -> Result<Client, Error> {
    let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::error!(%err, "postgres connection terminated");
        }
    });
    Ok(client)
}
