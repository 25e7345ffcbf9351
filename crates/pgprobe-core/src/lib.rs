//! PostgreSQL metric key resolution engine.
//!
//! Resolves named, parameterized metric keys (`pg.index.size`,
//! `pg.setting`, `pg.table.discovery`, ...) against a live server and
//! returns either a typed scalar or a discovery document. Keys live in a
//! declarative [`registry`]; one generic dispatch routine in [`plan`]
//! interprets them, so adding a metric means adding a registry row, not a
//! handler function.
//!
//! Parameter validation and SQL assembly happen before any connection is
//! opened, so a malformed request never touches the database.

pub mod connect;
pub mod discovery;
pub mod error;
mod executor;
mod keys;
pub mod plan;
pub mod ratio;
pub mod registry;
pub mod request;
pub mod value;

pub use discovery::DiscoveryDoc;
pub use error::ProbeError;
pub use plan::Response;
pub use request::MetricRequest;
pub use value::MetricValue;

use tracing::debug;

/// Resolves one metric request end to end: key lookup, parameter
/// validation, connection, query, coercion.
///
/// The connection is opened only after the plan is fully prepared and closes
/// when this returns, on every path.
pub fn run(request: &MetricRequest) -> Result<Response, ProbeError> {
    let def = registry::resolve(request.key())
        .ok_or_else(|| ProbeError::UnknownKey(request.key().to_string()))?;

    let plan = plan::prepare(def, request)?;
    debug!(key = request.key(), "plan prepared");

    let mut client = connect::connect_request(request)?;
    plan::execute(&plan, &mut client)
}
