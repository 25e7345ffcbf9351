//! Database metric family: `pg.db.*`.
//!
//! Listing from `pg_database`, size via `pg_database_size()`, transaction ID
//! age via `AGE(datfrozenxid)`, counters from `pg_stat_database`.

use crate::registry::{DiscoveryDef, KeyDef};
use crate::value::OutputKind;

/// All connectable, non-template databases.
pub(crate) const DISCOVER_DBS: &str = r#"
    SELECT
        d.oid::text AS oid
        , d.datname AS path
        , d.datname AS database
        , pg_catalog.pg_encoding_to_char(d.encoding)::text AS encoding
        , d.datcollate AS lc_collate
        , d.datctype AS lc_ctype
        , pg_catalog.pg_get_userbyid(d.datdba) AS owner
        , t.spcname AS tablespace
        , pg_catalog.shobj_description(d.oid, 'pg_database') AS description
    FROM pg_catalog.pg_database d
    JOIN pg_catalog.pg_tablespace t ON d.dattablespace = t.oid
    WHERE
        d.datallowconn = 't'
        AND d.datistemplate = 'n'
    ORDER BY d.oid"#;

const DB_SIZE: &str = "SELECT pg_catalog.pg_database_size(d.datname)::text \
     FROM pg_catalog.pg_database d WHERE d.datname = $1";

const DB_SIZE_SUM: &str = "SELECT SUM(pg_catalog.pg_database_size(d.datname)::bigint)::text \
     FROM pg_catalog.pg_database d";

const DB_XID_AGE: &str =
    "SELECT AGE(datfrozenxid)::text FROM pg_database WHERE datname = $1";

/// Oldest frozen transaction ID across all databases: MAX, not SUM; the
/// wraparound risk is driven by the single oldest database.
const DB_XID_AGE_MAX: &str = "SELECT MAX(AGE(datfrozenxid))::text FROM pg_database";

const VIEW: &str = "pg_stat_database";

const fn counter(field: &'static str) -> KeyDef {
    KeyDef::stat(VIEW, field, "datname", "", OutputKind::Uint, None)
}

pub(crate) static KEYS: &[(&str, KeyDef)] = &[
    (
        "pg.db.discovery",
        KeyDef::Discovery(DiscoveryDef {
            base: DISCOVER_DBS,
            mode_param: None,
            filters: &[],
            family_prefix: None,
            required_bind: None,
        }),
    ),
    (
        "pg.db.size",
        KeyDef::scalar(Some(DB_SIZE_SUM), DB_SIZE, OutputKind::Uint, "database"),
    ),
    (
        "pg.db.xid_age",
        KeyDef::scalar(Some(DB_XID_AGE_MAX), DB_XID_AGE, OutputKind::Uint, "database"),
    ),
    ("pg.db.numbackends", counter("numbackends")),
    ("pg.db.xact_commit", counter("xact_commit")),
    ("pg.db.xact_rollback", counter("xact_rollback")),
    ("pg.db.blks_read", counter("blks_read")),
    ("pg.db.blks_hit", counter("blks_hit")),
    ("pg.db.tup_returned", counter("tup_returned")),
    ("pg.db.tup_fetched", counter("tup_fetched")),
    ("pg.db.tup_inserted", counter("tup_inserted")),
    ("pg.db.tup_updated", counter("tup_updated")),
    ("pg.db.tup_deleted", counter("tup_deleted")),
    ("pg.db.conflicts", counter("conflicts")),
    ("pg.db.temp_files", counter("temp_files")),
    ("pg.db.temp_bytes", counter("temp_bytes")),
    ("pg.db.deadlocks", counter("deadlocks")),
    (
        "pg.db.blk_read_time",
        KeyDef::stat(VIEW, "blk_read_time", "datname", "", OutputKind::Double, None),
    ),
    (
        "pg.db.blk_write_time",
        KeyDef::stat(VIEW, "blk_write_time", "datname", "", OutputKind::Double, None),
    ),
    (
        // No aggregate across databases for a timestamp; the name is
        // mandatory. The error reads "No database specified" (not "database
        // name"), which existing consumers match on.
        "pg.db.stats_reset",
        KeyDef::stat(VIEW, "stats_reset", "datname", "", OutputKind::Text, Some("database")),
    ),
    (
        "pg.db.blks_ratio",
        KeyDef::ratio(VIEW, "blks_hit", "blks_read", "datname"),
    ),
];
