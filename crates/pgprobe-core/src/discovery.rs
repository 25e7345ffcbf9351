//! Discovery enumeration: listing queries serialized for the discovery
//! protocol consumer.
//!
//! Every row of a listing query becomes one record of uppercase
//! `{#FIELD}` keys in column order; the full payload is
//! `{"data": [ {...}, ... ]}`. This shape is a compatibility contract and
//! must not change. An empty entity set is a successful empty listing.
//!
//! Wide mode cross-products each record with every discoverable per-entity
//! metric of the family, adding a `{#METRIC}` field, so the consumer can
//! auto-generate one item per entity per statistic.

use postgres::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProbeError;
use crate::executor::{is_sql_identifier, query_rows, read_text};

/// Field added to each record in wide mode, naming the per-entity metric.
const METRIC_FIELD: &str = "{#METRIC}";

/// A listing query under construction: base SQL plus independently optional,
/// AND-composed equality filters. Filter values are always bound, never
/// interpolated.
#[derive(Debug, Clone)]
pub struct Listing {
    sql: String,
    binds: Vec<String>,
}

impl Listing {
    /// Starts from a base query that already contains a WHERE clause.
    pub fn new(base: &str) -> Self {
        Self {
            sql: base.to_string(),
            binds: Vec::new(),
        }
    }

    /// Binds a value for a placeholder already present in the base query
    /// (e.g. a mandatory `$1::text::regclass` parent table).
    pub fn bind(&mut self, value: &str) {
        self.binds.push(value.to_string());
    }

    /// Appends `AND <column> = $n` with the value bound at the next free
    /// placeholder. The column must be a fixed internal identifier.
    pub fn and_eq(&mut self, column: &str, value: &str) -> Result<(), ProbeError> {
        if !is_sql_identifier(column) {
            return Err(ProbeError::InvalidParameter(format!(
                "Invalid filter column: {}",
                column
            )));
        }
        self.binds.push(value.to_string());
        self.sql
            .push_str(&format!(" AND {} = ${}", column, self.binds.len()));
        Ok(())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[String] {
        &self.binds
    }
}

/// The discovery response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDoc {
    pub data: Vec<Map<String, Value>>,
}

impl DiscoveryDoc {
    pub fn to_json(&self) -> Result<String, ProbeError> {
        serde_json::to_string(self)
            .map_err(|e| ProbeError::Query(format!("discovery serialization failed: {}", e)))
    }
}

/// Executes a listing query and maps every returned row into one discovery
/// record (shallow mode).
pub(crate) fn get_discovery(
    client: &mut Client,
    listing: &Listing,
) -> Result<DiscoveryDoc, ProbeError> {
    let rows = query_rows(client, listing.sql(), listing.binds())?;

    let mut data = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut record = Map::new();
        for (i, column) in row.columns().iter().enumerate() {
            record.insert(field_name(column.name()), Value::String(read_text(row, i)?));
        }
        data.push(record);
    }

    Ok(DiscoveryDoc { data })
}

/// Wide mode: shallow records cross-producted with the family's discoverable
/// per-entity metrics.
pub(crate) fn get_discovery_wide(
    client: &mut Client,
    listing: &Listing,
    metrics: &[&str],
) -> Result<DiscoveryDoc, ProbeError> {
    let shallow = get_discovery(client, listing)?;
    Ok(DiscoveryDoc {
        data: cross_product(shallow.data, metrics),
    })
}

/// N entity records x M metrics -> N*M records, each carrying `{#METRIC}`.
fn cross_product(records: Vec<Map<String, Value>>, metrics: &[&str]) -> Vec<Map<String, Value>> {
    let mut data = Vec::with_capacity(records.len() * metrics.len());
    for record in &records {
        for metric in metrics {
            let mut wide = record.clone();
            wide.insert(
                METRIC_FIELD.to_string(),
                Value::String(metric.to_string()),
            );
            data.push(wide);
        }
    }
    data
}

/// Discovery field name: uppercase column name in `{#...}` brackets.
fn field_name(column: &str) -> String {
    format!("{{#{}}}", column.to_uppercase())
}
