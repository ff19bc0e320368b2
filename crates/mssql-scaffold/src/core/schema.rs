//! Schema metadata types for tables, columns, indexes, and foreign keys.
//!
//! These types are a backend-neutral snapshot of a database schema. An
//! introspector builds them once per run; the code generator only reads them.

use serde::{Deserialize, Serialize};

/// Schema snapshot produced by one introspection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Schema the tables were read from.
    pub schema: String,

    /// Tables in catalog order (by name).
    pub tables: Vec<TableInfo>,
}

impl DatabaseInfo {
    /// Create an empty snapshot for a schema.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            tables: Vec::new(),
        }
    }

    /// Find a table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

/// Table metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub name: String,

    /// Schema name.
    pub schema: String,

    /// `MS_Description` extended property, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Column definitions.
    pub columns: Vec<ColumnInfo>,

    /// Foreign key columns, one entry per constrained column.
    pub foreign_keys: Vec<ForeignKeyInfo>,

    /// Indexes, including the primary key index.
    pub indexes: Vec<IndexInfo>,
}

impl TableInfo {
    /// Create a table with no columns or constraints.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            ..Default::default()
        }
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Columns in ascending `column_id` order.
    pub fn ordered_columns(&self) -> Vec<&ColumnInfo> {
        let mut cols: Vec<&ColumnInfo> = self.columns.iter().collect();
        cols.sort_by_key(|c| c.column_id);
        cols
    }

    /// Indexes other than the one backing the primary key.
    pub fn non_pk_indexes(&self) -> impl Iterator<Item = &IndexInfo> {
        self.indexes.iter().filter(|i| !i.is_primary_key)
    }

    /// Check if any column is an identity column.
    pub fn has_identity(&self) -> bool {
        self.columns.iter().any(|c| c.is_identity)
    }
}

/// Column metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Raw catalog type name (e.g. `nvarchar`, `decimal`).
    pub data_type: String,

    /// Whether the column accepts NULL.
    pub is_nullable: bool,

    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,

    /// Whether the column is an identity column.
    pub is_identity: bool,

    /// Character or byte length. `None` for MAX or when not applicable.
    /// Unicode lengths are in characters, not bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,

    /// Numeric precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,

    /// Numeric scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,

    /// Raw default constraint definition, e.g. `((0))` or `(getdate())`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// `MS_Description` extended property, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Catalog column id; defines column order.
    pub column_id: i32,
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse a `*_referential_action_desc` value (`NO_ACTION`, `SET_NULL`, ...).
    ///
    /// Unknown text maps to [`ReferentialAction::NoAction`].
    pub fn from_catalog(desc: &str) -> Self {
        match desc.trim().to_uppercase().replace(' ', "_").as_str() {
            "CASCADE" => ReferentialAction::Cascade,
            "SET_NULL" => ReferentialAction::SetNull,
            "SET_DEFAULT" => ReferentialAction::SetDefault,
            _ => ReferentialAction::NoAction,
        }
    }
}

/// One column of a foreign key constraint.
///
/// A composite key is stored as several entries sharing `name`, one per
/// column, in constraint column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    /// Constraint name.
    pub name: String,

    /// Constrained column on the owning table.
    pub column_name: String,

    /// Referenced table.
    pub referenced_table: String,

    /// Referenced table's schema.
    pub referenced_schema: String,

    /// Referenced column.
    pub referenced_column: String,

    /// Action on delete of the referenced row.
    #[serde(default)]
    pub on_delete: ReferentialAction,

    /// Action on update of the referenced key.
    #[serde(default)]
    pub on_update: ReferentialAction,
}

/// Index metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name.
    pub name: String,

    /// Key columns in key order.
    pub columns: Vec<IndexColumnInfo>,

    /// Whether the index is unique.
    pub is_unique: bool,

    /// Whether the index backs the primary key.
    pub is_primary_key: bool,

    /// Whether the index is clustered.
    pub is_clustered: bool,
}

impl IndexInfo {
    /// Key columns ordered by position.
    pub fn ordered_columns(&self) -> Vec<&IndexColumnInfo> {
        let mut cols: Vec<&IndexColumnInfo> = self.columns.iter().collect();
        cols.sort_by_key(|c| c.position);
        cols
    }
}

/// One key column of an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexColumnInfo {
    /// Column name.
    pub column_name: String,

    /// Descending sort order.
    pub is_descending: bool,

    /// 1-based key position.
    pub position: i32,
}
