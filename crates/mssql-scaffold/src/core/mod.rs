//! Core abstractions shared by the introspector and the code generator.
//!
//! - [`schema`]: table, column, index and foreign key metadata
//! - [`value`]: owned SQL values, rows and row streams
//! - [`traits`]: the catalog and introspector seams
//! - [`identifier`]: SQL and C# quoting helpers

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{
    ColumnInfo, DatabaseInfo, ForeignKeyInfo, IndexColumnInfo, IndexInfo, ReferentialAction,
    TableInfo,
};
pub use traits::{CatalogSource, SchemaIntrospector};
pub use value::{ResultSet, Row, RowStream, SqlValue};
