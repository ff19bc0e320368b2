//! Database driver implementations.
//!
//! - [`mssql`]: Microsoft SQL Server
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with a [`CatalogSource`] for the
//!    engine's client library and a [`SchemaIntrospector`] over it
//! 2. Add a [`Provider`] variant and its accepted names
//! 3. Construct it in [`open_introspector`]
//!
//! [`CatalogSource`]: crate::core::traits::CatalogSource

pub mod mssql;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::config::SourceConfig;
use crate::core::traits::SchemaIntrospector;
use crate::error::{Result, ScaffoldError};

pub use mssql::{SqlServerIntrospector, TiberiusCatalog};

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    SqlServer,
}

impl Provider {
    /// Canonical provider name.
    pub fn name(self) -> &'static str {
        match self {
            Provider::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" | "mssql" | "sql_server" => Ok(Provider::SqlServer),
            other => Err(ScaffoldError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Build the introspector for a source. Performs no I/O.
pub fn open_introspector(source: &SourceConfig) -> Result<Arc<dyn SchemaIntrospector>> {
    let provider: Provider = source.provider.parse()?;
    debug!("Using {} provider", provider);

    match provider {
        Provider::SqlServer => {
            let catalog = TiberiusCatalog::new(source)?;
            Ok(Arc::new(SqlServerIntrospector::new(catalog)))
        }
    }
}
