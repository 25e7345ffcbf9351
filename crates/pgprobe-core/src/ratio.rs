//! Ratio metrics: hit / (hit + miss) as a percentage.
//!
//! Mirrors the aggregate/filtered duality of the scalar families: with no
//! entity filter the query sums both counters across all visible entities,
//! with a filter it computes the per-row ratio for the named entity. The
//! division is guarded in SQL; a zero denominator yields NULL, surfaced as
//! the defined undefined-ratio failure rather than a driver error.

use postgres::Client;

use crate::error::ProbeError;
use crate::executor::{is_sql_identifier, query_cell};
use crate::value::MetricValue;

/// One ratio metric: the statistics view, its hit/miss counter columns and
/// the entity filter column.
#[derive(Debug, Clone, Copy)]
pub struct RatioDef {
    pub view: &'static str,
    pub hit: &'static str,
    pub miss: &'static str,
    pub filter_col: &'static str,
}

impl RatioDef {
    /// Builds the percentage query for this ratio; aggregate shape when
    /// `filtered` is false, per-entity shape with a `$1` placeholder when
    /// true.
    pub fn build_sql(&self, filtered: bool) -> Result<String, ProbeError> {
        for ident in [self.view, self.hit, self.miss, self.filter_col] {
            if !is_sql_identifier(ident) {
                return Err(ProbeError::InvalidParameter(format!(
                    "Invalid identifier in ratio definition: {}",
                    ident
                )));
            }
        }

        let sql = if filtered {
            format!(
                "SELECT (CASE WHEN {hit} + {miss} = 0 THEN NULL \
                 ELSE {hit}::float8 / ({hit} + {miss}) * 100 END)::text \
                 FROM {view} WHERE {col} = $1",
                hit = self.hit,
                miss = self.miss,
                view = self.view,
                col = self.filter_col,
            )
        } else {
            format!(
                "SELECT (CASE WHEN COALESCE(sum({hit}) + sum({miss}), 0) = 0 THEN NULL \
                 ELSE sum({hit})::float8 / (sum({hit}) + sum({miss})) * 100 END)::text \
                 FROM {view}",
                hit = self.hit,
                miss = self.miss,
                view = self.view,
            )
        };

        Ok(sql)
    }
}

/// Executes a prepared ratio query and maps the result cell.
pub(crate) fn run_ratio(
    client: &mut Client,
    sql: &str,
    bind: Option<&str>,
) -> Result<MetricValue, ProbeError> {
    ratio_from_cell(&query_cell(client, sql, bind)?)
}

/// Maps a ratio result cell: NULL (empty cell) is the undefined case,
/// anything else parses as a percentage.
pub(crate) fn ratio_from_cell(cell: &str) -> Result<MetricValue, ProbeError> {
    if cell.is_empty() {
        return Err(ProbeError::UndefinedRatio);
    }
    Ok(MetricValue::Double(cell.trim().parse().unwrap_or(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEF: RatioDef = RatioDef {
        view: "pg_statio_all_indexes",
        hit: "idx_blks_hit",
        miss: "idx_blks_read",
        filter_col: "indexrelname",
    };

    #[test]
    fn aggregate_shape_sums_both_counters() {
        let sql = DEF.build_sql(false).unwrap();
        assert!(sql.contains("sum(idx_blks_hit)::float8 / (sum(idx_blks_hit) + sum(idx_blks_read)) * 100"));
        assert!(sql.contains("FROM pg_statio_all_indexes"));
        assert!(!sql.contains("$1"));
    }

    #[test]
    fn filtered_shape_binds_the_entity_name() {
        let sql = DEF.build_sql(true).unwrap();
        assert!(sql.contains("idx_blks_hit::float8 / (idx_blks_hit + idx_blks_read) * 100"));
        assert!(sql.contains("WHERE indexrelname = $1"));
        assert!(!sql.contains("sum("));
    }

    #[test]
    fn both_shapes_guard_division_by_zero() {
        for filtered in [false, true] {
            let sql = DEF.build_sql(filtered).unwrap();
            assert!(sql.contains("= 0 THEN NULL"), "missing guard: {}", sql);
        }
    }

    #[test]
    fn null_cell_is_the_undefined_case() {
        assert_eq!(ratio_from_cell(""), Err(ProbeError::UndefinedRatio));
    }

    #[test]
    fn equal_hits_and_total_reads_as_one_hundred() {
        // The database computes N / (N + 0) * 100 = 100.
        let MetricValue::Double(v) = ratio_from_cell("100").unwrap() else {
            panic!("expected double");
        };
        assert!((v - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_hits_reads_as_zero() {
        assert_eq!(ratio_from_cell("0"), Ok(MetricValue::Double(0.0)));
    }
}
