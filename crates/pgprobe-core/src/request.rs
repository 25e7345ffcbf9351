//! Inbound metric request: a key name plus ordered positional parameters.
//!
//! Positions 0 and 1 are always the connection string and target database;
//! they are consumed by the connection step. Metric-specific parameters start
//! at position 2 and are addressed here with metric-relative indices starting
//! at 0. An empty parameter is equivalent to an absent one.

use crate::error::ProbeError;

/// Index of the first metric-specific parameter in the raw parameter list.
const PARAM_FIRST: usize = 2;

/// A single metric invocation: key name + ordered string parameters.
#[derive(Debug, Clone)]
pub struct MetricRequest {
    key: String,
    params: Vec<String>,
}

impl MetricRequest {
    pub fn new(key: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            key: key.into(),
            params,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Connection string (raw position 0), normalized to `None` when empty.
    pub fn conn_string(&self) -> Option<&str> {
        self.raw(0)
    }

    /// Target database (raw position 1), normalized to `None` when empty.
    pub fn dbname(&self) -> Option<&str> {
        self.raw(1)
    }

    /// Metric-specific parameter by metric-relative index (0 = raw position 2).
    /// Missing and empty are both `None`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.raw(PARAM_FIRST + index)
    }

    /// Like [`param`](Self::param), but absence is a hard error naming the
    /// parameter. Used by metric families with no natural aggregate.
    pub fn required_param(&self, index: usize, name: &str) -> Result<&str, ProbeError> {
        self.param(index)
            .ok_or_else(|| ProbeError::InvalidParameter(format!("No {} specified", name)))
    }

    fn raw(&self, index: usize) -> Option<&str> {
        match self.params.get(index).map(String::as_str) {
            Some("") | None => None,
            Some(value) => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(params: &[&str]) -> MetricRequest {
        MetricRequest::new("pg.test", params.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn params_are_metric_relative() {
        let req = request(&["host=db1", "postgres", "my_index"]);
        assert_eq!(req.conn_string(), Some("host=db1"));
        assert_eq!(req.dbname(), Some("postgres"));
        assert_eq!(req.param(0), Some("my_index"));
        assert_eq!(req.param(1), None);
    }

    #[test]
    fn empty_and_missing_are_equivalent() {
        let req = request(&["", "", ""]);
        assert_eq!(req.conn_string(), None);
        assert_eq!(req.dbname(), None);
        assert_eq!(req.param(0), None);

        let req = request(&[]);
        assert_eq!(req.conn_string(), None);
        assert_eq!(req.param(0), None);
    }

    #[test]
    fn required_param_errors_with_name() {
        let req = request(&["", ""]);
        let err = req.required_param(0, "setting name").unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidParameter("No setting name specified".to_string())
        );
    }

    #[test]
    fn required_param_returns_value_when_present() {
        let req = request(&["", "", "max_connections"]);
        assert_eq!(
            req.required_param(0, "setting name").unwrap(),
            "max_connections"
        );
    }
}
