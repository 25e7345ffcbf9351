//! Settings metric family: `pg.setting` and `pg.setting.discovery`.
//!
//! Run-time parameters from the `pg_settings` view. The scalar lookup
//! returns the value alongside its `vartype` tag, which drives output
//! coercion (integer/real/other).

use crate::registry::{DiscoveryDef, KeyDef};

pub(crate) const DISCOVER_SETTINGS: &str = r#"
    SELECT
        name AS setting
        , unit AS unit
        , category AS category
        , short_desc AS description
        , context AS context
        , vartype AS vartype
    FROM pg_settings"#;

pub(crate) const GET_SETTING: &str =
    "SELECT setting, vartype FROM pg_settings WHERE name = $1";

pub(crate) static KEYS: &[(&str, KeyDef)] = &[
    (
        "pg.setting.discovery",
        KeyDef::Discovery(DiscoveryDef {
            base: DISCOVER_SETTINGS,
            mode_param: None,
            filters: &[],
            family_prefix: None,
            required_bind: None,
        }),
    ),
    ("pg.setting", KeyDef::Setting),
];
