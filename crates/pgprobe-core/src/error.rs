//! Error type for metric key resolution.
//!
//! Every failure is local to a single invocation; nothing is retried.
//! The caller (a polling agent) owns any retry/backoff policy.

/// Error type for a single metric invocation.
#[derive(Debug, PartialEq)]
pub enum ProbeError {
    /// The requested key is not in the registry.
    UnknownKey(String),
    /// A request parameter is missing or has an invalid value.
    /// Raised before any database interaction.
    InvalidParameter(String),
    /// Connection failed.
    Connection(String),
    /// Query execution failed. Carries the driver's message verbatim.
    Query(String),
    /// A scalar query returned zero rows. Carries the query text.
    NoResults(String),
    /// A ratio metric's denominator evaluated to zero.
    UndefinedRatio,
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::UnknownKey(key) => write!(f, "Unsupported metric key: {}", key),
            ProbeError::InvalidParameter(msg) => write!(f, "{}", msg),
            ProbeError::Connection(msg) => write!(f, "PostgreSQL: {}", msg),
            ProbeError::Query(msg) => write!(f, "PostgreSQL query error: {}", msg),
            ProbeError::NoResults(query) => {
                write!(f, "No results returned for query: {}", query)
            }
            ProbeError::UndefinedRatio => write!(f, "Ratio undefined: denominator is zero"),
        }
    }
}

impl std::error::Error for ProbeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_query() {
        let err = ProbeError::NoResults("SELECT 1".to_string());
        assert_eq!(err.to_string(), "No results returned for query: SELECT 1");
    }

    #[test]
    fn display_carries_driver_text_verbatim() {
        let err = ProbeError::Query("ERROR: permission denied".to_string());
        assert_eq!(
            err.to_string(),
            "PostgreSQL query error: ERROR: permission denied"
        );
    }
}
