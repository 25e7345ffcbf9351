//! Generic dispatch: compiles a registry descriptor plus request parameters
//! into an execution plan, then runs the plan against a connection.
//!
//! Planning is pure and happens before any database interaction, so every
//! invalid-parameter failure is raised without opening a connection. The
//! central dispatch invariant lives here: an absent entity filter always
//! selects the aggregate template and a present filter always selects the
//! filtered one, except for families with no natural aggregate, where the
//! filter is mandatory.

use postgres::Client;
use tracing::debug;

use crate::discovery::{self, DiscoveryDoc, Listing};
use crate::error::ProbeError;
use crate::executor::{is_sql_identifier, query_cell, query_cell_pair};
use crate::keys::setting::GET_SETTING;
use crate::ratio::run_ratio;
use crate::registry::{self, DiscoveryDef, KeyDef, StatFieldDef};
use crate::request::MetricRequest;
use crate::value::{MetricValue, OutputKind, coerce, coerce_tagged};

/// The outcome of a successful invocation.
#[derive(Debug, PartialEq)]
pub enum Response {
    Scalar(MetricValue),
    Discovery(DiscoveryDoc),
}

/// A fully prepared invocation: SQL and bound values, nothing left to
/// validate.
#[derive(Debug)]
pub(crate) enum Plan {
    Scalar {
        sql: String,
        bind: Option<String>,
        output: OutputKind,
    },
    /// Settings lookup: the vartype tag in cell [0,1] picks the output kind.
    Tagged { bind: String },
    Ratio {
        sql: String,
        bind: Option<String>,
    },
    Discovery {
        listing: Listing,
        /// Per-entity metric names for wide mode; `None` means shallow.
        wide: Option<Vec<&'static str>>,
    },
}

/// Compiles a key descriptor and request parameters into a plan.
pub(crate) fn prepare(def: &KeyDef, request: &MetricRequest) -> Result<Plan, ProbeError> {
    match def {
        KeyDef::Scalar(def) => match request.param(0) {
            Some(entity) => Ok(Plan::Scalar {
                sql: def.filtered.to_string(),
                bind: Some(entity.to_string()),
                output: def.output,
            }),
            None => {
                let Some(aggregate) = def.aggregate else {
                    return Err(ProbeError::InvalidParameter(format!(
                        "No {} specified",
                        def.param_name
                    )));
                };
                Ok(Plan::Scalar {
                    sql: aggregate.to_string(),
                    bind: None,
                    output: def.output,
                })
            }
        },
        KeyDef::Stat(def) => prepare_stat(def, request),
        KeyDef::Ratio(def) => {
            let bind = request.param(0);
            Ok(Plan::Ratio {
                sql: def.build_sql(bind.is_some())?,
                bind: bind.map(str::to_string),
            })
        }
        KeyDef::Setting => {
            let name = request.required_param(0, "setting name")?;
            Ok(Plan::Tagged {
                bind: name.to_string(),
            })
        }
        KeyDef::Discovery(def) => prepare_discovery(def, request),
    }
}

fn prepare_stat(def: &StatFieldDef, request: &MetricRequest) -> Result<Plan, ProbeError> {
    for ident in [def.view, def.field, def.filter_col] {
        if !is_sql_identifier(ident) {
            return Err(ProbeError::InvalidParameter(format!(
                "Invalid identifier in metric definition: {}",
                ident
            )));
        }
    }

    match request.param(0) {
        Some(entity) => Ok(Plan::Scalar {
            sql: format!(
                "SELECT {}::text FROM {} WHERE {} = $1",
                def.field, def.view, def.filter_col
            ),
            bind: Some(entity.to_string()),
            output: def.output,
        }),
        None => {
            if let Some(name) = def.required {
                return Err(ProbeError::InvalidParameter(format!(
                    "No {} specified",
                    name
                )));
            }
            // fractional counters (e.g. I/O timings) must not truncate
            let cast = match def.output {
                OutputKind::Double => "float8",
                _ => "bigint",
            };
            Ok(Plan::Scalar {
                sql: format!(
                    "SELECT SUM({}::{})::text FROM {}{}",
                    def.field, cast, def.view, def.aggregate_where
                ),
                bind: None,
                output: def.output,
            })
        }
    }
}

fn prepare_discovery(def: &DiscoveryDef, request: &MetricRequest) -> Result<Plan, ProbeError> {
    let mut listing = Listing::new(def.base);

    if let Some((index, name)) = def.required_bind {
        listing.bind(request.required_param(index, name)?);
    }

    for (column, index) in def.filters {
        if let Some(value) = request.param(*index) {
            listing.and_eq(column, value)?;
        }
    }

    let wide = match (def.mode_param, def.family_prefix) {
        (Some(index), Some(prefix)) => match request.param(index) {
            None | Some("deep") => Some(registry::wide_metrics(prefix)),
            Some("shallow") => None,
            Some(other) => {
                return Err(ProbeError::InvalidParameter(format!(
                    "Invalid search mode parameter: {}",
                    other
                )));
            }
        },
        _ => None,
    };

    Ok(Plan::Discovery { listing, wide })
}

/// Runs a prepared plan against the connection.
pub(crate) fn execute(plan: &Plan, client: &mut Client) -> Result<Response, ProbeError> {
    match plan {
        Plan::Scalar { sql, bind, output } => {
            let cell = query_cell(client, sql, bind.as_deref())?;
            Ok(Response::Scalar(coerce(&cell, *output)))
        }
        Plan::Tagged { bind } => {
            let (value, vartype) = query_cell_pair(client, GET_SETTING, bind)?;
            debug!(vartype = %vartype, "coercing setting by vartype");
            Ok(Response::Scalar(coerce_tagged(&value, &vartype)))
        }
        Plan::Ratio { sql, bind } => {
            Ok(Response::Scalar(run_ratio(client, sql, bind.as_deref())?))
        }
        Plan::Discovery { listing, wide } => {
            let doc = match wide {
                Some(metrics) => discovery::get_discovery_wide(client, listing, metrics)?,
                None => discovery::get_discovery(client, listing)?,
            };
            Ok(Response::Discovery(doc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::resolve;

    fn request(key: &str, params: &[&str]) -> MetricRequest {
        MetricRequest::new(key, params.iter().map(|s| s.to_string()).collect())
    }

    fn prepare_key(key: &str, params: &[&str]) -> Result<Plan, ProbeError> {
        let def = resolve(key).expect(key);
        prepare(def, &request(key, params))
    }

    #[test]
    fn absent_filter_selects_the_aggregate_template() {
        let Plan::Scalar { sql, bind, .. } = prepare_key("pg.index.size", &["", ""]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert!(sql.contains("SUM(relpages::bigint * 8192)"));
        assert!(!sql.contains("$1"));
        assert_eq!(bind, None);
    }

    #[test]
    fn present_filter_selects_the_filtered_template() {
        let Plan::Scalar { sql, bind, .. } =
            prepare_key("pg.index.size", &["", "", "orders_pkey"]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert!(sql.contains("relname = $1"));
        assert!(!sql.contains("SUM("));
        assert_eq!(bind.as_deref(), Some("orders_pkey"));
    }

    #[test]
    fn stat_field_builds_both_shapes() {
        let Plan::Scalar { sql, .. } = prepare_key("pg.index.idx_scan", &["", ""]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert_eq!(
            sql,
            "SELECT SUM(idx_scan::bigint)::text FROM pg_stat_all_indexes"
        );

        let Plan::Scalar { sql, bind, .. } =
            prepare_key("pg.index.idx_scan", &["", "", "orders_pkey"]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert_eq!(
            sql,
            "SELECT idx_scan::text FROM pg_stat_all_indexes WHERE indexrelname = $1"
        );
        assert_eq!(bind.as_deref(), Some("orders_pkey"));
    }

    #[test]
    fn statio_aggregate_excludes_catalog_schemas() {
        let Plan::Scalar { sql, .. } = prepare_key("pg.index.idx_blks_hit", &[]).unwrap() else {
            panic!("expected scalar plan");
        };
        assert!(sql.contains("FROM pg_statio_all_indexes WHERE"));
        assert!(sql.contains("schemaname <> 'pg_catalog'"));
    }

    #[test]
    fn ratio_follows_the_same_duality() {
        let Plan::Ratio { sql, bind } = prepare_key("pg.index.idx_blks_ratio", &[]).unwrap()
        else {
            panic!("expected ratio plan");
        };
        assert!(sql.contains("sum(idx_blks_hit)"));
        assert_eq!(bind, None);

        let Plan::Ratio { sql, bind } =
            prepare_key("pg.index.idx_blks_ratio", &["", "", "orders_pkey"]).unwrap()
        else {
            panic!("expected ratio plan");
        };
        assert!(sql.contains("WHERE indexrelname = $1"));
        assert_eq!(bind.as_deref(), Some("orders_pkey"));
    }

    #[test]
    fn setting_name_is_mandatory() {
        let err = prepare_key("pg.setting", &["", ""]).unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidParameter("No setting name specified".to_string())
        );

        let Plan::Tagged { bind } =
            prepare_key("pg.setting", &["", "", "max_connections"]).unwrap()
        else {
            panic!("expected tagged plan");
        };
        assert_eq!(bind, "max_connections");
    }

    #[test]
    fn timestamp_fields_have_no_aggregate() {
        let err = prepare_key("pg.db.stats_reset", &["", ""]).unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidParameter("No database specified".to_string())
        );

        let Plan::Scalar { sql, output, .. } =
            prepare_key("pg.db.stats_reset", &["", "", "app"]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert!(sql.contains("stats_reset::text"));
        assert_eq!(output, OutputKind::Text);
    }

    #[test]
    fn children_keys_require_the_parent_table() {
        let err = prepare_key("pg.table.children", &["", ""]).unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidParameter("No table name specified".to_string())
        );

        let Plan::Scalar { sql, bind, .. } =
            prepare_key("pg.table.children", &["", "", "measurements"]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert!(sql.contains("$1::text::regclass"));
        assert_eq!(bind.as_deref(), Some("measurements"));
    }

    #[test]
    fn inheritance_keys_bind_the_parent_as_text() {
        // A bare ::regclass cast would make the server infer a regclass
        // parameter, which the string bind cannot serialize.
        for key in [
            "pg.table.children",
            "pg.table.children.size",
            "pg.table.children.rows",
        ] {
            let Plan::Scalar { sql, .. } = prepare_key(key, &["", "", "parent"]).unwrap() else {
                panic!("expected scalar plan for {}", key);
            };
            assert!(sql.contains("$1::text::regclass"), "{}: {}", key, sql);
            assert!(!sql.contains(" $1::regclass"), "{}: {}", key, sql);
        }
    }

    #[test]
    fn db_time_counters_coerce_as_doubles() {
        let Plan::Scalar { output, .. } =
            prepare_key("pg.db.blk_read_time", &["", "", "app"]).unwrap()
        else {
            panic!("expected scalar plan");
        };
        assert_eq!(output, OutputKind::Double);

        // aggregate shape keeps the fractional milliseconds
        let Plan::Scalar { sql, .. } = prepare_key("pg.db.blk_read_time", &[]).unwrap() else {
            panic!("expected scalar plan");
        };
        assert!(sql.contains("SUM(blk_read_time::float8)"));
    }

    #[test]
    fn deep_mode_is_the_discovery_default() {
        let Plan::Discovery { wide, .. } = prepare_key("pg.index.discovery", &[]).unwrap()
        else {
            panic!("expected discovery plan");
        };
        let metrics = wide.expect("deep mode by default");
        assert!(metrics.contains(&"size"));
        assert!(metrics.contains(&"idx_blks_ratio"));

        let Plan::Discovery { wide, .. } =
            prepare_key("pg.index.discovery", &["", "", "deep"]).unwrap()
        else {
            panic!("expected discovery plan");
        };
        assert!(wide.is_some());
    }

    #[test]
    fn shallow_mode_disables_the_cross_product() {
        let Plan::Discovery { wide, .. } =
            prepare_key("pg.index.discovery", &["", "", "shallow"]).unwrap()
        else {
            panic!("expected discovery plan");
        };
        assert!(wide.is_none());
    }

    #[test]
    fn invalid_mode_names_the_offending_value() {
        let err = prepare_key("pg.index.discovery", &["", "", "sideways"]).unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidParameter("Invalid search mode parameter: sideways".to_string())
        );
    }

    #[test]
    fn schema_and_table_filters_compose_with_and() {
        let Plan::Discovery { listing, .. } =
            prepare_key("pg.index.discovery", &["", "", "shallow", "public", "orders"]).unwrap()
        else {
            panic!("expected discovery plan");
        };
        assert!(listing.sql().ends_with("AND n.nspname = $1 AND t.relname = $2"));
        assert_eq!(listing.binds(), ["public", "orders"]);
    }

    #[test]
    fn discovery_filters_are_independently_optional() {
        // table filter alone still binds at $1
        let Plan::Discovery { listing, .. } =
            prepare_key("pg.index.discovery", &["", "", "shallow", "", "orders"]).unwrap()
        else {
            panic!("expected discovery plan");
        };
        assert!(listing.sql().ends_with("AND t.relname = $1"));
        assert_eq!(listing.binds(), ["orders"]);
    }

    #[test]
    fn children_discovery_binds_the_parent_table() {
        let err = prepare_key("pg.table.children.discovery", &["", ""]).unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidParameter("No table name specified".to_string())
        );

        let Plan::Discovery { listing, wide } =
            prepare_key("pg.table.children.discovery", &["", "", "measurements"]).unwrap()
        else {
            panic!("expected discovery plan");
        };
        assert!(listing.sql().contains("$1::text::regclass"));
        assert_eq!(listing.binds(), ["measurements"]);
        assert!(wide.is_none());
    }

    #[test]
    fn every_registered_key_plans_cleanly() {
        for (key, def) in registry::iter() {
            let params: &[&str] = match def {
                KeyDef::Discovery(_) => &["", "", "deep"],
                _ => &["", "", "fixture"],
            };
            let result = prepare(def, &request(key, params));
            assert!(result.is_ok(), "{}: {:?}", key, result);
        }
    }
}
