//! Typed scalar output and result coercion.
//!
//! Every scalar query returns its value as text (the templates cast to
//! `text`); coercion picks the output representation either by the metric
//! family's fixed convention or by a runtime `vartype` tag for settings.
//!
//! Malformed numeric text coerces to 0 rather than failing. Existing
//! consumers depend on this (SQL NULL arrives as an empty cell and must read
//! as zero, e.g. an aggregate over an empty catalog).

/// The coerced output of a scalar metric. Exactly one representation is
/// populated per invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Uint(u64),
    Double(f64),
    Text(String),
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Uint(v) => write!(f, "{}", v),
            MetricValue::Double(v) => write!(f, "{}", v),
            MetricValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// How a metric family's first result cell is coerced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputKind {
    /// Unsigned 64-bit integer, base-10 parse.
    Uint,
    /// Double-precision float.
    Double,
    /// Raw string passthrough.
    Text,
    /// Selected at runtime by the companion `vartype` cell.
    ByVartype,
}

/// Coerces a result cell with a fixed output kind.
///
/// `ByVartype` is not valid here; tagged cells go through [`coerce_tagged`].
pub fn coerce(cell: &str, kind: OutputKind) -> MetricValue {
    match kind {
        OutputKind::Uint => MetricValue::Uint(parse_u64(cell)),
        OutputKind::Double => MetricValue::Double(parse_f64(cell)),
        OutputKind::Text | OutputKind::ByVartype => MetricValue::Text(cell.to_string()),
    }
}

/// Coerces a setting value using its runtime `vartype` tag.
///
/// `integer` parses as u64, `real` as f64; every other tag (`bool`,
/// `string`, `enum`) passes the raw value through unmodified.
pub fn coerce_tagged(value: &str, vartype: &str) -> MetricValue {
    match vartype {
        "integer" => MetricValue::Uint(parse_u64(value)),
        "real" => MetricValue::Double(parse_f64(value)),
        _ => MetricValue::Text(value.to_string()),
    }
}

fn parse_u64(cell: &str) -> u64 {
    cell.trim().parse().unwrap_or(0)
}

fn parse_f64(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_uint() {
        assert_eq!(coerce("42", OutputKind::Uint), MetricValue::Uint(42));
    }

    #[test]
    fn coerce_double() {
        assert_eq!(coerce("1.5", OutputKind::Double), MetricValue::Double(1.5));
    }

    #[test]
    fn empty_cell_reads_as_zero() {
        // SQL NULL arrives as an empty cell (aggregate over zero rows).
        assert_eq!(coerce("", OutputKind::Uint), MetricValue::Uint(0));
        assert_eq!(coerce("", OutputKind::Double), MetricValue::Double(0.0));
    }

    #[test]
    fn malformed_numeric_reads_as_zero() {
        assert_eq!(coerce("not-a-number", OutputKind::Uint), MetricValue::Uint(0));
    }

    #[test]
    fn tagged_integer_parses_as_uint() {
        assert_eq!(coerce_tagged("42", "integer"), MetricValue::Uint(42));
    }

    #[test]
    fn tagged_real_parses_as_double() {
        let MetricValue::Double(v) = coerce_tagged("3.14", "real") else {
            panic!("expected double");
        };
        assert!((v - 3.14).abs() < 1e-9);
    }

    #[test]
    fn tagged_bool_passes_through_unchanged() {
        assert_eq!(
            coerce_tagged("on", "bool"),
            MetricValue::Text("on".to_string())
        );
    }

    #[test]
    fn tagged_enum_and_string_pass_through() {
        assert_eq!(
            coerce_tagged("replica", "enum"),
            MetricValue::Text("replica".to_string())
        );
        assert_eq!(
            coerce_tagged("/var/lib/pgsql", "string"),
            MetricValue::Text("/var/lib/pgsql".to_string())
        );
    }
}
