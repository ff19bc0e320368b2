//! SQL Server catalog introspection.
//!
//! Reads `sys.tables`, `sys.columns`, `sys.foreign_keys` and `sys.indexes`
//! through a [`CatalogSource`] and builds the schema model.

use async_trait::async_trait;
use futures::stream;
use tracing::{debug, info, warn};

use crate::core::identifier::{qualify_mssql, quote_mssql};
use crate::core::schema::{
    ColumnInfo, ForeignKeyInfo, IndexColumnInfo, IndexInfo, ReferentialAction, TableInfo,
};
use crate::core::traits::{CatalogSource, SchemaIntrospector};
use crate::core::value::{ResultSet, Row, RowStream, SqlValue};
use crate::error::{Result, ScaffoldError};

/// Schema used when the server cannot tell us the user's default.
pub const FALLBACK_SCHEMA: &str = "dbo";

const TABLES_SQL: &str = r#"
    SELECT
        t.name AS table_name,
        SCHEMA_NAME(t.schema_id) AS schema_name,
        CAST(ep.value AS NVARCHAR(4000)) AS description
    FROM sys.tables t
    LEFT JOIN sys.extended_properties ep ON ep.major_id = t.object_id
        AND ep.minor_id = 0
        AND ep.class = 1
        AND ep.name = 'MS_Description'
    WHERE SCHEMA_NAME(t.schema_id) = @P1"#;

const COLUMNS_SQL: &str = r#"
    SELECT
        c.name AS column_name,
        ty.name AS data_type,
        c.is_nullable,
        c.is_identity,
        c.max_length,
        c.precision,
        c.scale,
        dc.definition AS default_value,
        CAST(ep.value AS NVARCHAR(4000)) AS description,
        c.column_id,
        CASE WHEN pk.column_id IS NOT NULL THEN 1 ELSE 0 END AS is_primary_key
    FROM sys.columns c
    INNER JOIN sys.types ty ON c.user_type_id = ty.user_type_id
    LEFT JOIN sys.default_constraints dc ON c.default_object_id = dc.object_id
    LEFT JOIN sys.extended_properties ep ON ep.major_id = c.object_id
        AND ep.minor_id = c.column_id
        AND ep.class = 1
        AND ep.name = 'MS_Description'
    LEFT JOIN (
        SELECT ic.object_id, ic.column_id
        FROM sys.indexes i
        INNER JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id
        WHERE i.is_primary_key = 1
    ) pk ON c.object_id = pk.object_id AND c.column_id = pk.column_id
    WHERE c.object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
    ORDER BY c.column_id"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        fk.name AS fk_name,
        COL_NAME(fkc.parent_object_id, fkc.parent_column_id) AS column_name,
        OBJECT_NAME(fk.referenced_object_id) AS referenced_table,
        SCHEMA_NAME(rt.schema_id) AS referenced_schema,
        COL_NAME(fkc.referenced_object_id, fkc.referenced_column_id) AS referenced_column,
        fk.delete_referential_action_desc,
        fk.update_referential_action_desc
    FROM sys.foreign_keys fk
    INNER JOIN sys.foreign_key_columns fkc ON fk.object_id = fkc.constraint_object_id
    INNER JOIN sys.tables rt ON fk.referenced_object_id = rt.object_id
    WHERE fk.parent_object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
    ORDER BY fk.name, fkc.constraint_column_id"#;

const INDEXES_SQL: &str = r#"
    SELECT
        i.name AS index_name,
        i.is_unique,
        i.is_primary_key,
        i.type_desc,
        COL_NAME(ic.object_id, ic.column_id) AS column_name,
        ic.is_descending_key,
        ic.key_ordinal
    FROM sys.indexes i
    INNER JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id
    WHERE i.object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2))
        AND i.type > 0
        AND ic.key_ordinal > 0
    ORDER BY i.name, ic.key_ordinal"#;

const DEFAULT_SCHEMA_SQL: &str =
    "SELECT DEFAULT_SCHEMA_NAME FROM sys.database_principals WHERE name = USER_NAME()";

/// Schema introspector for SQL Server catalog views.
pub struct SqlServerIntrospector<C> {
    catalog: C,
}

impl<C: CatalogSource> SqlServerIntrospector<C> {
    /// Create an introspector over a catalog connection.
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Access the underlying catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }
}

/// Build the table enumeration query and its parameters.
fn tables_query(schema: &str, table_filter: &[String]) -> (String, Vec<String>) {
    let mut sql = TABLES_SQL.to_string();
    let mut params = vec![schema.to_string()];

    if !table_filter.is_empty() {
        let placeholders: Vec<String> = (0..table_filter.len())
            .map(|i| format!("@P{}", i + 2))
            .collect();
        sql.push_str(&format!("\n      AND t.name IN ({})", placeholders.join(", ")));
        params.extend(table_filter.iter().cloned());
    }

    sql.push_str("\n    ORDER BY t.name");
    (sql, params)
}

fn text(row: &Row, idx: usize) -> String {
    opt_text(row, idx).unwrap_or_default()
}

fn opt_text(row: &Row, idx: usize) -> Option<String> {
    row.get(idx).and_then(|v| v.as_str()).map(str::to_string)
}

/// Text of a column that the catalog never leaves NULL.
fn required(row: &Row, idx: usize, what: &str) -> Result<String> {
    opt_text(row, idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScaffoldError::SchemaExtraction(format!("catalog row is missing {}", what)))
}

fn flag(row: &Row, idx: usize) -> bool {
    row.get(idx).and_then(SqlValue::as_bool).unwrap_or(false)
}

fn int(row: &Row, idx: usize) -> Option<i32> {
    row.get(idx)
        .and_then(SqlValue::as_i64)
        .and_then(|v| i32::try_from(v).ok())
}

/// `SELECT` of a table's rows with an explicit column list.
///
/// `SELECT *` skips hidden columns such as system-versioning periods, so the
/// list is spelled out in column order. A table with no known columns falls
/// back to `*`.
fn select_rows_sql(table: &TableInfo) -> Result<String> {
    let from = qualify_mssql(&table.schema, &table.name)?;
    let columns = table.ordered_columns();
    if columns.is_empty() {
        return Ok(format!("SELECT * FROM {}", from));
    }

    let list = columns
        .iter()
        .map(|c| quote_mssql(&c.name))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("SELECT {} FROM {}", list.join(", "), from))
}

/// Build a column from a `COLUMNS_SQL` row.
fn parse_column(row: &Row) -> Result<ColumnInfo> {
    let name = required(row, 0, "column name")?;
    let data_type = required(row, 1, "column type")?;
    let mut max_length = int(row, 4);

    // sys.columns reports bytes; Unicode types store two per character.
    let lower = data_type.to_lowercase();
    if lower == "nvarchar" || lower == "nchar" {
        max_length = max_length.map(|len| if len > 0 { len / 2 } else { len });
    }

    Ok(ColumnInfo {
        name,
        data_type,
        is_nullable: flag(row, 2),
        is_identity: flag(row, 3),
        // -1 means MAX
        max_length: max_length.filter(|len| *len != -1),
        precision: int(row, 5),
        scale: int(row, 6),
        default_value: opt_text(row, 7),
        description: opt_text(row, 8),
        column_id: int(row, 9).unwrap_or_default(),
        is_primary_key: flag(row, 10),
    })
}

fn parse_foreign_key(row: &Row) -> ForeignKeyInfo {
    ForeignKeyInfo {
        name: text(row, 0),
        column_name: text(row, 1),
        referenced_table: text(row, 2),
        referenced_schema: text(row, 3),
        referenced_column: text(row, 4),
        on_delete: ReferentialAction::from_catalog(&text(row, 5)),
        on_update: ReferentialAction::from_catalog(&text(row, 6)),
    }
}

/// Group `INDEXES_SQL` rows (ordered by index name, key ordinal) into indexes.
fn group_indexes(rows: &[Row]) -> Vec<IndexInfo> {
    let mut indexes: Vec<IndexInfo> = Vec::new();

    for row in rows {
        let name = text(row, 0);
        let starts_new = indexes.last().map_or(true, |current| current.name != name);
        if starts_new {
            indexes.push(IndexInfo {
                name,
                columns: Vec::new(),
                is_unique: flag(row, 1),
                is_primary_key: flag(row, 2),
                is_clustered: text(row, 3).eq_ignore_ascii_case("CLUSTERED"),
            });
        }

        if let Some(current) = indexes.last_mut() {
            current.columns.push(IndexColumnInfo {
                column_name: text(row, 4),
                is_descending: flag(row, 5),
                position: int(row, 6).unwrap_or_default(),
            });
        }
    }

    indexes
}

#[async_trait]
impl<C: CatalogSource> SchemaIntrospector for SqlServerIntrospector<C> {
    fn provider(&self) -> &str {
        "sqlserver"
    }

    async fn load_tables(&self, schema: &str, table_filter: &[String]) -> Result<Vec<TableInfo>> {
        let (sql, params) = tables_query(schema, table_filter);
        let result = self.catalog.query(&sql, &params).await?;

        let tables = result
            .rows
            .iter()
            .map(|row| -> Result<TableInfo> {
                Ok(TableInfo {
                    description: opt_text(row, 2),
                    ..TableInfo::new(text(row, 1), required(row, 0, "table name")?)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Found {} tables in schema {}", tables.len(), schema);
        Ok(tables)
    }

    async fn load_columns(&self, table: &mut TableInfo) -> Result<()> {
        let params = [table.schema.clone(), table.name.clone()];
        let result = self.catalog.query(COLUMNS_SQL, &params).await?;
        table.columns = result
            .rows
            .iter()
            .map(parse_column)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Loaded {} columns for {}",
            table.columns.len(),
            table.full_name()
        );
        Ok(())
    }

    async fn load_foreign_keys(&self, table: &mut TableInfo) -> Result<()> {
        let params = [table.schema.clone(), table.name.clone()];
        let result = self.catalog.query(FOREIGN_KEYS_SQL, &params).await?;
        table.foreign_keys = result.rows.iter().map(parse_foreign_key).collect();

        debug!(
            "Loaded {} foreign key columns for {}",
            table.foreign_keys.len(),
            table.full_name()
        );
        Ok(())
    }

    async fn load_indexes(&self, table: &mut TableInfo) -> Result<()> {
        let params = [table.schema.clone(), table.name.clone()];
        let result = self.catalog.query(INDEXES_SQL, &params).await?;
        table.indexes = group_indexes(&result.rows);

        debug!(
            "Loaded {} indexes for {}",
            table.indexes.len(),
            table.full_name()
        );
        Ok(())
    }

    async fn detect_default_schema(&self) -> String {
        match self.catalog.query_scalar(DEFAULT_SCHEMA_SQL, &[]).await {
            Ok(Some(SqlValue::Text(schema))) if !schema.trim().is_empty() => {
                info!("Detected default schema: {}", schema);
                schema
            }
            Ok(_) => {
                warn!(
                    "No default schema reported for current user, using {}",
                    FALLBACK_SCHEMA
                );
                FALLBACK_SCHEMA.to_string()
            }
            Err(e) => {
                warn!(
                    "Default schema detection failed ({}), using {}",
                    e, FALLBACK_SCHEMA
                );
                FALLBACK_SCHEMA.to_string()
            }
        }
    }

    async fn get_table_data(&self, table: &TableInfo) -> Result<ResultSet> {
        let sql = select_rows_sql(table)?;
        self.catalog.query(&sql, &[]).await
    }

    fn stream_table_data(&self, table: &TableInfo) -> RowStream {
        match select_rows_sql(table) {
            Ok(sql) => self.catalog.query_stream(sql, Vec::new()),
            Err(e) => Box::pin(stream::once(async move { Err(e) })),
        }
    }
}
