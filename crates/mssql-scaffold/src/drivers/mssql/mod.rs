//! Microsoft SQL Server driver.
//!
//! - [`TiberiusCatalog`]: query primitives over a Tiberius connection
//! - [`SqlServerIntrospector`]: schema discovery from the `sys.*` catalog views

mod connection;
mod introspector;

pub use connection::TiberiusCatalog;
pub use introspector::{SqlServerIntrospector, FALLBACK_SCHEMA};
