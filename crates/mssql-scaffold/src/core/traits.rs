//! Core traits for schema introspection.
//!
//! - [`CatalogSource`]: the three query primitives a backend connection offers
//! - [`SchemaIntrospector`]: reads a schema snapshot and table rows
//!
//! The introspector is written against `CatalogSource` so that catalog
//! parsing can be exercised without a live server.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::{DatabaseInfo, TableInfo};
use super::value::{ResultSet, RowStream, SqlValue};

/// Query primitives of a database connection.
///
/// Parameters are bound positionally as `@P1`, `@P2`, ... and are always text.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Execute a query and collect every row.
    async fn query(&self, sql: &str, params: &[String]) -> Result<ResultSet>;

    /// Execute a query and return the first column of the first row.
    async fn query_scalar(&self, sql: &str, params: &[String]) -> Result<Option<SqlValue>>;

    /// Execute a query and lazily yield rows one at a time.
    ///
    /// Errors (including connection failures) surface as the first stream item.
    fn query_stream(&self, sql: String, params: Vec<String>) -> RowStream;
}

/// Read schema metadata and row data from a database.
///
/// Discovery enumerates the tables first, then loads each table's columns,
/// foreign keys and indexes in that order. [`get_structure`](SchemaIntrospector::get_structure) is a
/// template method over the per-phase loaders.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Provider name, e.g. "sqlserver".
    fn provider(&self) -> &str;

    /// Enumerate the tables of `schema`, optionally limited to `table_filter`.
    ///
    /// Returned tables have no columns or constraints yet.
    async fn load_tables(&self, schema: &str, table_filter: &[String]) -> Result<Vec<TableInfo>>;

    /// Load column metadata for a table.
    async fn load_columns(&self, table: &mut TableInfo) -> Result<()>;

    /// Load foreign key metadata for a table.
    async fn load_foreign_keys(&self, table: &mut TableInfo) -> Result<()>;

    /// Load index metadata for a table.
    async fn load_indexes(&self, table: &mut TableInfo) -> Result<()>;

    /// Build a full schema snapshot.
    ///
    /// An empty `table_filter` selects every table. Zero matching tables is
    /// not an error.
    async fn get_structure(&self, schema: &str, table_filter: &[String]) -> Result<DatabaseInfo> {
        let mut tables = self.load_tables(schema, table_filter).await?;

        for table in &mut tables {
            self.load_columns(table).await?;
            self.load_foreign_keys(table).await?;
            self.load_indexes(table).await?;
        }

        Ok(DatabaseInfo {
            schema: schema.to_string(),
            tables,
        })
    }

    /// Default schema of the connected user. Never fails; falls back to "dbo".
    async fn detect_default_schema(&self) -> String;

    /// Load every row of a table into memory. Intended for small tables.
    async fn get_table_data(&self, table: &TableInfo) -> Result<ResultSet>;

    /// Stream the rows of a table.
    ///
    /// Values come in [`TableInfo::ordered_columns`] order, hidden columns
    /// included. The stream is forward-only and single-pass; call again for
    /// a new pass.
    fn stream_table_data(&self, table: &TableInfo) -> RowStream;
}
