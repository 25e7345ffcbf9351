//! Table metric family: `pg.table.*`.
//!
//! Catalog queries over `pg_class` relkind='r', counters from
//! `pg_stat_all_tables`/`pg_statio_all_tables`, and inheritance keys over
//! `pg_inherits`. The parent table binds as `$1::text::regclass`: the
//! parameter itself stays text (the driver only binds strings) and the
//! server resolves the relation name.

use crate::registry::{DiscoveryDef, KeyDef};
use crate::value::OutputKind;

pub(crate) const DISCOVER_TABLES: &str = r#"
    SELECT
        c.oid::text AS oid
        , current_database() || '.' || n.nspname || '.' || c.relname AS path
        , current_database() AS database
        , n.nspname AS schema
        , CASE c.reltablespace
            WHEN 0 THEN (SELECT ds.spcname FROM pg_tablespace ds
                JOIN pg_database d ON d.dattablespace = ds.oid
                WHERE d.datname = current_database())
            ELSE (SELECT spcname FROM pg_tablespace WHERE oid = c.reltablespace)
            END AS tablespace
        , c.relname AS table
        , t.typname AS type
        , pg_catalog.pg_get_userbyid(c.relowner) AS owner
        , (SELECT COUNT(inhparent) FROM pg_inherits WHERE inhrelid = c.oid)::text AS issubclass
        , pg_catalog.obj_description(c.oid, 'pg_class') AS description
    FROM pg_class c
    JOIN pg_namespace n ON c.relnamespace = n.oid
    JOIN pg_type t ON c.reltype = t.oid
    WHERE
        c.relkind = 'r'
        AND n.nspname <> 'pg_catalog'
        AND n.nspname <> 'information_schema'
        AND n.nspname !~ '^pg_toast'
    ORDER BY c.relname"#;

pub(crate) const DISCOVER_TABLE_CHILDREN: &str = r#"
    SELECT
        c.oid::text AS oid
        , current_database() || '.' || n.nspname || '.' || c.relname AS path
        , c.relname AS table
        , n.nspname AS schema
    FROM pg_inherits i
    JOIN pg_class c ON i.inhrelid = c.oid
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE i.inhparent = $1::text::regclass"#;

const TABLE_SIZE: &str =
    "SELECT (relpages::bigint * 8192)::text FROM pg_class WHERE relkind = 'r' AND relname = $1";

const TABLE_SIZE_SUM: &str = "SELECT (SUM(relpages::bigint) * 8192)::text \
     FROM pg_class t JOIN pg_namespace n ON n.oid = t.relnamespace \
     WHERE t.relkind = 'r' AND n.nspname <> 'pg_catalog' \
     AND n.nspname <> 'information_schema' AND n.nspname !~ '^pg_toast'";

// reltuples is float4; bigint first so large estimates never print as 1e+06
const TABLE_ROWS: &str =
    "SELECT reltuples::bigint::text FROM pg_class WHERE relkind = 'r' AND relname = $1";

const TABLE_ROWS_SUM: &str = "SELECT SUM(reltuples::bigint)::text \
     FROM pg_class t JOIN pg_namespace n ON n.oid = t.relnamespace \
     WHERE t.relkind = 'r' AND n.nspname <> 'pg_catalog' \
     AND n.nspname <> 'information_schema' AND n.nspname !~ '^pg_toast'";

const CHILD_COUNT: &str =
    "SELECT COUNT(i.inhrelid)::text FROM pg_inherits i WHERE i.inhparent = $1::text::regclass";

const CHILDREN_SIZE: &str = "SELECT (SUM(c.relpages::bigint) * 8192)::text \
     FROM pg_inherits i JOIN pg_class c ON inhrelid = c.oid \
     WHERE i.inhparent = $1::text::regclass";

const CHILDREN_ROWS: &str = "SELECT SUM(c.reltuples::bigint)::text \
     FROM pg_inherits i JOIN pg_class c ON inhrelid = c.oid \
     WHERE i.inhparent = $1::text::regclass";

/// Aggregate predicate shared by both statistics views: user tables only.
const STAT_WHERE: &str = " WHERE schemaname <> 'pg_catalog' \
     AND schemaname <> 'information_schema' AND schemaname !~ '^pg_toast'";

const STAT: &str = "pg_stat_all_tables";
const STATIO: &str = "pg_statio_all_tables";

const fn counter(field: &'static str) -> KeyDef {
    KeyDef::stat(STAT, field, "relname", STAT_WHERE, OutputKind::Uint, None)
}

const fn io_counter(field: &'static str) -> KeyDef {
    KeyDef::stat(STATIO, field, "relname", STAT_WHERE, OutputKind::Uint, None)
}

/// Timestamp fields cannot be summed; the table name is mandatory.
const fn timestamp(field: &'static str) -> KeyDef {
    KeyDef::stat(STAT, field, "relname", "", OutputKind::Text, Some("table name"))
}

pub(crate) static KEYS: &[(&str, KeyDef)] = &[
    (
        "pg.table.discovery",
        KeyDef::Discovery(DiscoveryDef {
            base: DISCOVER_TABLES,
            mode_param: Some(0),
            filters: &[],
            family_prefix: Some("pg.table."),
            required_bind: None,
        }),
    ),
    (
        "pg.table.children.discovery",
        KeyDef::Discovery(DiscoveryDef {
            base: DISCOVER_TABLE_CHILDREN,
            mode_param: None,
            filters: &[],
            family_prefix: None,
            required_bind: Some((0, "table name")),
        }),
    ),
    (
        "pg.table.size",
        KeyDef::scalar(Some(TABLE_SIZE_SUM), TABLE_SIZE, OutputKind::Uint, "table name"),
    ),
    (
        "pg.table.rows",
        KeyDef::scalar(Some(TABLE_ROWS_SUM), TABLE_ROWS, OutputKind::Uint, "table name"),
    ),
    (
        "pg.table.children",
        KeyDef::scalar(None, CHILD_COUNT, OutputKind::Uint, "table name"),
    ),
    (
        "pg.table.children.size",
        KeyDef::scalar(None, CHILDREN_SIZE, OutputKind::Uint, "table name"),
    ),
    (
        "pg.table.children.rows",
        KeyDef::scalar(None, CHILDREN_ROWS, OutputKind::Uint, "table name"),
    ),
    ("pg.table.seq_scan", counter("seq_scan")),
    ("pg.table.seq_tup_read", counter("seq_tup_read")),
    ("pg.table.idx_scan", counter("idx_scan")),
    ("pg.table.idx_tup_fetch", counter("idx_tup_fetch")),
    ("pg.table.n_tup_ins", counter("n_tup_ins")),
    ("pg.table.n_tup_upd", counter("n_tup_upd")),
    ("pg.table.n_tup_del", counter("n_tup_del")),
    ("pg.table.n_tup_hot_upd", counter("n_tup_hot_upd")),
    ("pg.table.n_live_tup", counter("n_live_tup")),
    ("pg.table.n_dead_tup", counter("n_dead_tup")),
    ("pg.table.vacuum_count", counter("vacuum_count")),
    ("pg.table.autovacuum_count", counter("autovacuum_count")),
    ("pg.table.analyze_count", counter("analyze_count")),
    ("pg.table.autoanalyze_count", counter("autoanalyze_count")),
    ("pg.table.last_vacuum", timestamp("last_vacuum")),
    ("pg.table.last_autovacuum", timestamp("last_autovacuum")),
    ("pg.table.last_analyze", timestamp("last_analyze")),
    ("pg.table.last_autoanalyze", timestamp("last_autoanalyze")),
    ("pg.table.heap_blks_read", io_counter("heap_blks_read")),
    ("pg.table.heap_blks_hit", io_counter("heap_blks_hit")),
    ("pg.table.idx_blks_read", io_counter("idx_blks_read")),
    ("pg.table.idx_blks_hit", io_counter("idx_blks_hit")),
    ("pg.table.toast_blks_read", io_counter("toast_blks_read")),
    ("pg.table.toast_blks_hit", io_counter("toast_blks_hit")),
    ("pg.table.tidx_blks_read", io_counter("tidx_blks_read")),
    ("pg.table.tidx_blks_hit", io_counter("tidx_blks_hit")),
    (
        "pg.table.idx_scan_ratio",
        KeyDef::ratio(STAT, "idx_scan", "seq_scan", "relname"),
    ),
    (
        "pg.table.heap_blks_ratio",
        KeyDef::ratio(STATIO, "heap_blks_hit", "heap_blks_read", "relname"),
    ),
    (
        "pg.table.idx_blks_ratio",
        KeyDef::ratio(STATIO, "idx_blks_hit", "idx_blks_read", "relname"),
    ),
    (
        "pg.table.toast_blks_ratio",
        KeyDef::ratio(STATIO, "toast_blks_hit", "toast_blks_read", "relname"),
    ),
    (
        "pg.table.tidx_blks_ratio",
        KeyDef::ratio(STATIO, "tidx_blks_hit", "tidx_blks_read", "relname"),
    ),
];
