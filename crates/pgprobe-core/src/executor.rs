//! Parameterized query execution.
//!
//! Scalar queries bind at most one positional value and the engine only ever
//! reads cell [0,0] (plus the [0,1] type tag for settings). Every scalar
//! template casts its output column to `text`, so cells read uniformly as
//! `Option<String>`; SQL NULL becomes an empty string.

use postgres::Client;
use postgres::types::ToSql;
use tracing::debug;

use crate::connect::format_postgres_error;
use crate::error::ProbeError;

/// Executes a query with zero or more bound string parameters.
pub(crate) fn query_rows(
    client: &mut Client,
    sql: &str,
    binds: &[String],
) -> Result<Vec<postgres::Row>, ProbeError> {
    debug!(binds = binds.len(), "executing query");
    let params: Vec<&(dyn ToSql + Sync)> =
        binds.iter().map(|b| b as &(dyn ToSql + Sync)).collect();

    client
        .query(sql, &params)
        .map_err(|e| ProbeError::Query(format_postgres_error(&e)))
}

/// Executes a scalar query and returns cell [0,0] as text.
///
/// Zero rows is a distinct failure from a query error; SQL NULL in a
/// returned row is an empty string.
pub(crate) fn query_cell(
    client: &mut Client,
    sql: &str,
    bind: Option<&str>,
) -> Result<String, ProbeError> {
    let binds: Vec<String> = bind.iter().map(|b| b.to_string()).collect();
    let rows = query_rows(client, sql, &binds)?;

    let Some(row) = rows.first() else {
        return Err(ProbeError::NoResults(sql.to_string()));
    };

    read_text(row, 0)
}

/// Executes a scalar query and returns cells [0,0] and [0,1] as text.
/// Used for vartype-tagged settings lookups.
pub(crate) fn query_cell_pair(
    client: &mut Client,
    sql: &str,
    bind: &str,
) -> Result<(String, String), ProbeError> {
    let rows = query_rows(client, sql, &[bind.to_string()])?;

    let Some(row) = rows.first() else {
        return Err(ProbeError::NoResults(sql.to_string()));
    };

    Ok((read_text(row, 0)?, read_text(row, 1)?))
}

/// Reads one cell as text, mapping SQL NULL to an empty string.
pub(crate) fn read_text(row: &postgres::Row, index: usize) -> Result<String, ProbeError> {
    let cell: Option<String> = row
        .try_get(index)
        .map_err(|e| ProbeError::Query(format_postgres_error(&e)))?;
    Ok(cell.unwrap_or_default())
}

/// Returns true for a plain or schema-qualified SQL identifier.
///
/// Every identifier interpolated into a template (view names, counter
/// columns, filter columns) must pass this check; values are always bound,
/// never interpolated.
pub(crate) fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) if c.is_ascii_lowercase() || c == '_' => {}
                _ => return false,
            }
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}
