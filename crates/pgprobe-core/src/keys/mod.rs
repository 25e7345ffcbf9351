//! SQL templates and registry rows, one module per metric family.

pub(crate) mod database;
pub(crate) mod index;
pub(crate) mod setting;
pub(crate) mod table;
