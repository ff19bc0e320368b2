//! Migration plans: paired build (Up) and tear-down (Down) operations.
//!
//! A plan is built from its Up operations only. Down is derived by reversing
//! Up and inverting each operation, so the two bodies always mirror each
//! other in count and order.

use crate::core::schema::{DatabaseInfo, ForeignKeyInfo, IndexInfo, TableInfo};

/// One statement of a migration body.
///
/// Every create variant has a matching drop variant carrying the same
/// metadata, so [`Operation::inverse`] is its own inverse.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateTable(TableInfo),
    DeleteTable(TableInfo),
    CreateForeignKey {
        table: TableInfo,
        foreign_key: ForeignKeyInfo,
    },
    DeleteForeignKey {
        table: TableInfo,
        foreign_key: ForeignKeyInfo,
    },
    CreateIndex {
        table: TableInfo,
        index: IndexInfo,
    },
    DeleteIndex {
        table: TableInfo,
        index: IndexInfo,
    },
    /// Captured rows for a table. Rendered by the seed exporter.
    InsertRows(TableInfo),
    DeleteRows(TableInfo),
}

/// Statement family, used to group rendered output into sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    CreateTable,
    DeleteTable,
    CreateForeignKey,
    DeleteForeignKey,
    CreateIndex,
    DeleteIndex,
    InsertRows,
    DeleteRows,
}

impl Operation {
    /// The operation that undoes this one.
    pub fn inverse(&self) -> Operation {
        match self.clone() {
            Operation::CreateTable(t) => Operation::DeleteTable(t),
            Operation::DeleteTable(t) => Operation::CreateTable(t),
            Operation::CreateForeignKey { table, foreign_key } => {
                Operation::DeleteForeignKey { table, foreign_key }
            }
            Operation::DeleteForeignKey { table, foreign_key } => {
                Operation::CreateForeignKey { table, foreign_key }
            }
            Operation::CreateIndex { table, index } => Operation::DeleteIndex { table, index },
            Operation::DeleteIndex { table, index } => Operation::CreateIndex { table, index },
            Operation::InsertRows(t) => Operation::DeleteRows(t),
            Operation::DeleteRows(t) => Operation::InsertRows(t),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateTable(_) => OperationKind::CreateTable,
            Operation::DeleteTable(_) => OperationKind::DeleteTable,
            Operation::CreateForeignKey { .. } => OperationKind::CreateForeignKey,
            Operation::DeleteForeignKey { .. } => OperationKind::DeleteForeignKey,
            Operation::CreateIndex { .. } => OperationKind::CreateIndex,
            Operation::DeleteIndex { .. } => OperationKind::DeleteIndex,
            Operation::InsertRows(_) => OperationKind::InsertRows,
            Operation::DeleteRows(_) => OperationKind::DeleteRows,
        }
    }

    /// The table the operation applies to.
    pub fn table(&self) -> &TableInfo {
        match self {
            Operation::CreateTable(t)
            | Operation::DeleteTable(t)
            | Operation::InsertRows(t)
            | Operation::DeleteRows(t) => t,
            Operation::CreateForeignKey { table, .. }
            | Operation::DeleteForeignKey { table, .. }
            | Operation::CreateIndex { table, .. }
            | Operation::DeleteIndex { table, .. } => table,
        }
    }
}

/// Up and Down operation lists of one migration class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationPlan {
    pub up: Vec<Operation>,
    pub down: Vec<Operation>,
}

impl MigrationPlan {
    /// Build a plan, deriving Down from Up.
    pub fn from_up(up: Vec<Operation>) -> Self {
        let down = up.iter().rev().map(Operation::inverse).collect();
        Self { up, down }
    }

    /// Create one table, then its foreign keys, then its non-PK indexes.
    pub fn for_table(table: &TableInfo) -> Self {
        let mut up = vec![Operation::CreateTable(table.clone())];
        up.extend(foreign_key_ops(table));
        up.extend(index_ops(table));
        Self::from_up(up)
    }

    /// Create every table, then every foreign key, then every non-PK index.
    ///
    /// Each phase follows table declaration order, which lets tables reference
    /// each other regardless of order.
    pub fn for_database(db: &DatabaseInfo) -> Self {
        let mut up: Vec<Operation> = db
            .tables
            .iter()
            .map(|t| Operation::CreateTable(t.clone()))
            .collect();
        up.extend(db.tables.iter().flat_map(foreign_key_ops));
        up.extend(db.tables.iter().flat_map(index_ops));
        Self::from_up(up)
    }

    /// Insert rows for each table, in order.
    pub fn for_seed<'a>(tables: impl IntoIterator<Item = &'a TableInfo>) -> Self {
        Self::from_up(
            tables
                .into_iter()
                .map(|t| Operation::InsertRows(t.clone()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty()
    }
}

fn foreign_key_ops(table: &TableInfo) -> Vec<Operation> {
    table
        .foreign_keys
        .iter()
        .map(|fk| Operation::CreateForeignKey {
            table: table.clone(),
            foreign_key: fk.clone(),
        })
        .collect()
}

fn index_ops(table: &TableInfo) -> Vec<Operation> {
    table
        .non_pk_indexes()
        .map(|idx| Operation::CreateIndex {
            table: table.clone(),
            index: idx.clone(),
        })
        .collect()
}
