//! Index metric family: `pg.index.*`.
//!
//! Catalog queries over `pg_index`/`pg_class` plus the
//! `pg_stat_all_indexes`/`pg_statio_all_indexes` statistics views.
//! Index size is `relpages * 8192` bytes (fixed page size) and the row
//! estimate is `reltuples`; this column mapping is a compatibility
//! contract with existing item configurations.

use crate::registry::{DiscoveryDef, KeyDef};
use crate::value::OutputKind;

/// All user indexes with their schema, table, owner and access method.
/// Column aliases become discovery field names.
pub(crate) const DISCOVER_INDEXES: &str = r#"
    SELECT
        ic.oid::text AS oid
        , current_database() || '.' || n.nspname || '.' || t.relname || '.' || ic.relname AS path
        , ic.relname AS index
        , current_database() AS database
        , n.nspname AS schema
        , t.relname AS table
        , a.rolname AS owner
        , m.amname AS access
    FROM pg_index i
    JOIN pg_class ic ON ic.oid = i.indexrelid
    JOIN pg_namespace n ON n.oid = ic.relnamespace
    JOIN pg_roles a ON a.oid = ic.relowner
    JOIN pg_class t ON t.oid = i.indrelid
    JOIN pg_am m ON m.oid = ic.relam
    WHERE
        n.nspname <> 'pg_catalog'
        AND n.nspname <> 'information_schema'
        AND n.nspname !~ '^pg_toast'"#;

const INDEX_SIZE: &str =
    "SELECT (relpages::bigint * 8192)::text FROM pg_class WHERE relkind = 'i' AND relname = $1";

const INDEX_SIZE_SUM: &str =
    "SELECT SUM(relpages::bigint * 8192)::text FROM pg_class WHERE relkind = 'i'";

// reltuples is float4; bigint first so large estimates never print as 1e+06
const INDEX_ROWS: &str =
    "SELECT reltuples::bigint::text FROM pg_class WHERE relkind = 'i' AND relname = $1";

const INDEX_ROWS_SUM: &str =
    "SELECT SUM(reltuples::bigint)::text FROM pg_class WHERE relkind = 'i'";

/// Aggregate predicate for the I/O statistics view: user indexes only.
const STATIO_WHERE: &str = " WHERE schemaname !~ '^pg_toast' \
     AND schemaname <> 'pg_catalog' AND schemaname <> 'information_schema'";

pub(crate) static KEYS: &[(&str, KeyDef)] = &[
    (
        "pg.index.discovery",
        KeyDef::Discovery(DiscoveryDef {
            base: DISCOVER_INDEXES,
            mode_param: Some(0),
            filters: &[("n.nspname", 1), ("t.relname", 2)],
            family_prefix: Some("pg.index."),
            required_bind: None,
        }),
    ),
    (
        "pg.index.size",
        KeyDef::scalar(Some(INDEX_SIZE_SUM), INDEX_SIZE, OutputKind::Uint, "index name"),
    ),
    (
        "pg.index.rows",
        KeyDef::scalar(Some(INDEX_ROWS_SUM), INDEX_ROWS, OutputKind::Uint, "index name"),
    ),
    (
        "pg.index.idx_scan",
        KeyDef::stat("pg_stat_all_indexes", "idx_scan", "indexrelname", "", OutputKind::Uint, None),
    ),
    (
        "pg.index.idx_tup_read",
        KeyDef::stat("pg_stat_all_indexes", "idx_tup_read", "indexrelname", "", OutputKind::Uint, None),
    ),
    (
        "pg.index.idx_tup_fetch",
        KeyDef::stat("pg_stat_all_indexes", "idx_tup_fetch", "indexrelname", "", OutputKind::Uint, None),
    ),
    (
        "pg.index.idx_blks_read",
        KeyDef::stat("pg_statio_all_indexes", "idx_blks_read", "indexrelname", STATIO_WHERE, OutputKind::Uint, None),
    ),
    (
        "pg.index.idx_blks_hit",
        KeyDef::stat("pg_statio_all_indexes", "idx_blks_hit", "indexrelname", STATIO_WHERE, OutputKind::Uint, None),
    ),
    (
        "pg.index.idx_blks_ratio",
        KeyDef::ratio("pg_statio_all_indexes", "idx_blks_hit", "idx_blks_read", "indexrelname"),
    ),
];
