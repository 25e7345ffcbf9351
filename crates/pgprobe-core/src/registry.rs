//! Declarative metric key registry.
//!
//! Every supported key maps to one descriptor: a scalar template pair, a
//! statistics-view field, a ratio definition, the tagged settings lookup, or
//! a discovery listing. One generic dispatch routine (see [`crate::plan`])
//! interprets the descriptors; there are no per-key handler functions.
//!
//! The registry is immutable static data; the engine holds no global
//! mutable state, so concurrent invocations need no synchronization.

use crate::keys;
use crate::ratio::RatioDef;
use crate::value::OutputKind;

/// A scalar metric with a fixed template pair.
#[derive(Debug)]
pub struct ScalarDef {
    /// Template used when the entity filter is absent. `None` makes the
    /// filter mandatory.
    pub aggregate: Option<&'static str>,
    /// Template with a `$1` placeholder for the entity name.
    pub filtered: &'static str,
    pub output: OutputKind,
    /// Entity parameter name, used in the missing-parameter error.
    pub param_name: &'static str,
}

/// A scalar metric reading one field of a statistics view. The SQL is built
/// at dispatch time from the view, field and filter column names.
#[derive(Debug)]
pub struct StatFieldDef {
    pub view: &'static str,
    pub field: &'static str,
    pub filter_col: &'static str,
    /// Extra predicate appended to the aggregate shape ("" when none).
    pub aggregate_where: &'static str,
    pub output: OutputKind,
    /// `Some(name)` makes the entity filter mandatory (no natural aggregate,
    /// e.g. timestamp fields).
    pub required: Option<&'static str>,
}

/// A discovery listing.
#[derive(Debug)]
pub struct DiscoveryDef {
    pub base: &'static str,
    /// Metric-relative index of the `deep`/`shallow` search mode parameter.
    pub mode_param: Option<usize>,
    /// Optional AND-composed equality filters: (column, metric-relative
    /// parameter index).
    pub filters: &'static [(&'static str, usize)],
    /// Key prefix whose per-entity metrics populate wide mode.
    pub family_prefix: Option<&'static str>,
    /// Mandatory bound parameter for a `$1` placeholder in the base query:
    /// (metric-relative index, parameter name).
    pub required_bind: Option<(usize, &'static str)>,
}

/// One registry entry.
#[derive(Debug)]
pub enum KeyDef {
    Scalar(ScalarDef),
    Stat(StatFieldDef),
    Ratio(RatioDef),
    /// `pg.setting`: mandatory name, output kind chosen by the vartype tag.
    Setting,
    Discovery(DiscoveryDef),
}

impl KeyDef {
    pub const fn scalar(
        aggregate: Option<&'static str>,
        filtered: &'static str,
        output: OutputKind,
        param_name: &'static str,
    ) -> Self {
        KeyDef::Scalar(ScalarDef {
            aggregate,
            filtered,
            output,
            param_name,
        })
    }

    pub const fn stat(
        view: &'static str,
        field: &'static str,
        filter_col: &'static str,
        aggregate_where: &'static str,
        output: OutputKind,
        required: Option<&'static str>,
    ) -> Self {
        KeyDef::Stat(StatFieldDef {
            view,
            field,
            filter_col,
            aggregate_where,
            output,
            required,
        })
    }

    pub const fn ratio(
        view: &'static str,
        hit: &'static str,
        miss: &'static str,
        filter_col: &'static str,
    ) -> Self {
        KeyDef::Ratio(RatioDef {
            view,
            hit,
            miss,
            filter_col,
        })
    }
}

/// All metric families, in registry order.
fn families() -> [&'static [(&'static str, KeyDef)]; 4] {
    [
        keys::index::KEYS,
        keys::table::KEYS,
        keys::database::KEYS,
        keys::setting::KEYS,
    ]
}

/// Iterates every registered key.
pub fn iter() -> impl Iterator<Item = &'static (&'static str, KeyDef)> {
    families().into_iter().flat_map(|family| family.iter())
}

/// Every supported key name, in registry order.
pub fn key_names() -> impl Iterator<Item = &'static str> {
    iter().map(|(key, _)| *key)
}

/// Looks up the descriptor for a metric key.
pub fn resolve(key: &str) -> Option<&'static KeyDef> {
    iter().find(|(k, _)| *k == key).map(|(_, def)| def)
}

/// Per-entity metric names of a family, for wide discovery: every key under
/// `prefix` that targets a single entity (scalar, stat and ratio keys), named
/// by its suffix, in registry order.
pub fn wide_metrics(prefix: &str) -> Vec<&'static str> {
    iter()
        .filter(|(key, def)| {
            key.starts_with(prefix)
                && matches!(
                    def,
                    KeyDef::Scalar(_) | KeyDef::Stat(_) | KeyDef::Ratio(_)
                )
        })
        .map(|(key, _)| &key[prefix.len()..])
        .collect()
}
