//! # mssql-scaffold
//!
//! Reverse-engineer a SQL Server schema into FluentMigrator migrations.
//!
//! This library reads the catalog of a live database and generates C#
//! migration classes that rebuild it:
//!
//! - **Schema introspection** of tables, columns, foreign keys and indexes
//! - **Default-value normalization** from catalog SQL to C# literals
//! - **Per-table or consolidated** schema migrations with mirrored Up/Down
//! - **Seed data export** streamed in fixed-size insert chunks
//!
//! ## Example
//!
//! ```rust,no_run
//! use mssql_scaffold::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mssql_scaffold::ScaffoldError> {
//!     let config = Config::load("scaffold.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let result = orchestrator.run(CancellationToken::new()).await?;
//!     println!("Wrote {} files", result.files_written.len());
//!     Ok(())
//! }
//! ```

pub mod codegen;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod typemap;

// Re-exports for convenient access
pub use codegen::{CodeGenerator, ExportStats, MigrationPlan, Operation, SeedExporter, VersionSequence};
pub use config::{Config, ScaffoldConfig, SourceConfig};
pub use crate::core::{
    CatalogSource, ColumnInfo, DatabaseInfo, ForeignKeyInfo, IndexColumnInfo, IndexInfo,
    ReferentialAction, SchemaIntrospector, SqlValue, TableInfo,
};
pub use error::{Result, ScaffoldError};
pub use normalize::{normalize_default, DefaultValue};
pub use orchestrator::{Orchestrator, ScaffoldResult};
