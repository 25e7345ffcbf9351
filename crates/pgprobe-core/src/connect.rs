//! Connection provider: one `postgres::Client` per invocation.
//!
//! The connection string is libpq key=value format with the `dbname` field
//! controlled separately, so the same string can serve requests that target
//! different databases. The client is dropped when the handler returns,
//! releasing the connection on every exit path.

use postgres::{Client, NoTls};
use tracing::debug;

use crate::error::ProbeError;
use crate::request::MetricRequest;

/// Connection string used when the request supplies none.
pub const DEFAULT_CONN_STRING: &str = "host=localhost";

/// Database used when the request supplies none.
pub const DEFAULT_CONN_DBNAME: &str = "postgres";

/// Builds a libpq-style connection string from the request's connection
/// parameters. A `dbname=` token already present in the connection string is
/// replaced; otherwise one is appended.
pub fn build_connstring(conn: Option<&str>, dbname: Option<&str>) -> String {
    let base = conn.unwrap_or(DEFAULT_CONN_STRING);
    let db = dbname.unwrap_or(DEFAULT_CONN_DBNAME);

    let mut found = false;
    let parts: Vec<String> = base
        .split_whitespace()
        .map(|token| {
            if token.starts_with("dbname=") {
                found = true;
                format!("dbname={}", db)
            } else {
                token.to_string()
            }
        })
        .collect();

    if found {
        parts.join(" ")
    } else {
        format!("{} dbname={}", parts.join(" "), db)
    }
}

/// Connects to PostgreSQL using the request's connection parameters.
pub fn connect_request(request: &MetricRequest) -> Result<Client, ProbeError> {
    let connstring = build_connstring(request.conn_string(), request.dbname());
    debug!(key = request.key(), "connecting to PostgreSQL");

    Client::connect(&connstring, NoTls)
        .map_err(|e| ProbeError::Connection(format_postgres_error(&e)))
}

/// Formats a PostgreSQL driver error for the response message.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        e.to_string()
    }
}
