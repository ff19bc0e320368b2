//! C# FluentMigrator source rendering.
//!
//! Statements are emitted at two levels of indentation inside the `Up` and
//! `Down` methods; chained calls continue on the following lines with four
//! more spaces.

use crate::core::identifier::csharp_string;
use crate::core::schema::{ColumnInfo, ForeignKeyInfo, IndexInfo, ReferentialAction, TableInfo};
use crate::normalize::normalize_default;
use crate::typemap::column_type;

use super::plan::{MigrationPlan, Operation, OperationKind};

/// Indentation of statements inside a method body.
pub const BODY_INDENT: &str = "        ";

/// Indentation of chained calls after the first line of a statement.
pub const CHAIN_INDENT: &str = "            ";

/// Schema that needs no `.InSchema(..)` qualifier.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Usings of schema migrations.
pub const SCHEMA_USINGS: &[&str] = &["FluentMigrator"];

/// Usings of seed migrations.
pub const SEED_USINGS: &[&str] = &[
    "System",
    "System.Collections.Generic",
    "FluentMigrator",
    "FluentMigrator.SqlServer",
];

/// Declaration of one generated migration class.
#[derive(Debug, Clone)]
pub struct ClassSpec<'a> {
    pub namespace: &'a str,
    pub version: &'a str,
    pub class_name: &'a str,
    pub summary: Option<&'a str>,
    pub usings: &'a [&'a str],
}

/// Render a complete migration class from a plan.
pub fn render_class(spec: &ClassSpec<'_>, plan: &MigrationPlan) -> String {
    let mut out = render_header(spec);
    out.push_str(&render_body(&plan.up));
    out.push_str(&render_footer(&plan.down));
    out
}

/// Everything up to and including the opening brace of `Up()`.
pub fn render_header(spec: &ClassSpec<'_>) -> String {
    let mut out = String::new();
    for using in spec.usings {
        out.push_str(&format!("using {};\n", using));
    }
    out.push('\n');
    out.push_str(&format!("namespace {};\n\n", spec.namespace));

    if let Some(summary) = spec.summary.filter(|s| !s.trim().is_empty()) {
        out.push_str("/// <summary>\n");
        for line in summary.lines() {
            out.push_str(&format!("/// {}\n", xml_escape(line.trim_end())));
        }
        out.push_str("/// </summary>\n");
    }

    out.push_str(&format!("[Migration({})]\n", spec.version));
    out.push_str(&format!("public class {} : Migration\n", spec.class_name));
    out.push_str("{\n");
    out.push_str("    public override void Up()\n");
    out.push_str("    {\n");
    out
}

/// Close `Up()`, render `Down()` and close the class.
pub fn render_footer(down: &[Operation]) -> String {
    let mut out = String::from("    }\n\n");
    out.push_str("    public override void Down()\n");
    out.push_str("    {\n");
    out.push_str(&render_body(down));
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

/// Render a list of operations, grouped into commented sections.
pub fn render_body(ops: &[Operation]) -> String {
    let mut out = String::new();
    let mut section: Option<String> = None;

    for op in ops {
        let Some(statement) = render_operation(op) else {
            continue;
        };

        let title = section_title(op);
        if section.as_deref() != Some(title.as_str()) {
            if section.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("{}// {}\n", BODY_INDENT, title));
            section = Some(title);
        }

        out.push_str(&statement);
        out.push('\n');
    }

    out
}

fn section_title(op: &Operation) -> String {
    match op.kind() {
        OperationKind::CreateTable => format!("Table: {}", op.table().name),
        OperationKind::CreateForeignKey => "Foreign Keys".to_string(),
        OperationKind::CreateIndex => "Indexes".to_string(),
        OperationKind::InsertRows => format!("Data: {}", op.table().name),
        OperationKind::DeleteIndex => "Drop Indexes".to_string(),
        OperationKind::DeleteForeignKey => "Drop Foreign Keys".to_string(),
        OperationKind::DeleteTable => "Drop Tables".to_string(),
        OperationKind::DeleteRows => "Delete Seed Data".to_string(),
    }
}

/// Render one statement, indented for a method body.
///
/// Row inserts are streamed by the seed exporter and yield `None` here.
pub fn render_operation(op: &Operation) -> Option<String> {
    let text = match op {
        Operation::CreateTable(table) => create_table(table),
        Operation::CreateForeignKey { table, foreign_key } => create_foreign_key(table, foreign_key),
        Operation::CreateIndex { table, index } => create_index(table, index),
        Operation::DeleteIndex { table, index } => format!(
            "{}Delete.Index({}).OnTable({}){};",
            BODY_INDENT,
            csharp_string(&index.name),
            csharp_string(&table.name),
            in_schema(&table.schema)
        ),
        Operation::DeleteForeignKey { table, foreign_key } => format!(
            "{}Delete.ForeignKey({}).OnTable({}){};",
            BODY_INDENT,
            csharp_string(&foreign_key.name),
            csharp_string(&table.name),
            in_schema(&table.schema)
        ),
        Operation::DeleteTable(table) => format!(
            "{}Delete.Table({}){};",
            BODY_INDENT,
            csharp_string(&table.name),
            in_schema(&table.schema)
        ),
        Operation::DeleteRows(table) => format!(
            "{}Delete.FromTable({}){}.AllRows();",
            BODY_INDENT,
            csharp_string(&table.name),
            in_schema(&table.schema)
        ),
        Operation::InsertRows(_) => return None,
    };
    Some(text)
}

/// `.InSchema("s")` for schemas other than `dbo`, otherwise nothing.
pub fn in_schema(schema: &str) -> String {
    let schema = schema.trim();
    if schema.is_empty() || schema.eq_ignore_ascii_case(DEFAULT_SCHEMA) {
        String::new()
    } else {
        format!(".InSchema({})", csharp_string(schema))
    }
}

fn create_table(table: &TableInfo) -> String {
    let mut out = format!(
        "{}Create.Table({}){}",
        BODY_INDENT,
        csharp_string(&table.name),
        in_schema(&table.schema)
    );
    for column in table.ordered_columns() {
        out.push('\n');
        out.push_str(CHAIN_INDENT);
        out.push_str(&render_column(column));
    }
    out.push(';');
    out
}

/// Render a column definition: name, type, then modifiers.
pub fn render_column(column: &ColumnInfo) -> String {
    let mut out = format!(".WithColumn({})", csharp_string(&column.name));
    out.push_str(&column_type(column));

    out.push_str(if column.is_nullable {
        ".Nullable()"
    } else {
        ".NotNullable()"
    });

    if column.is_primary_key {
        out.push_str(".PrimaryKey()");
    }

    if column.is_identity {
        out.push_str(".Identity()");
    }

    if let Some(default) = column
        .default_value
        .as_deref()
        .and_then(|raw| normalize_default(raw, &column.data_type))
    {
        out.push_str(&format!(".WithDefaultValue({})", default.render()));
    }

    out
}

/// `System.Data.Rule` member for a referential action.
pub fn rule_name(action: ReferentialAction) -> Option<&'static str> {
    match action {
        ReferentialAction::NoAction => None,
        ReferentialAction::Cascade => Some("Cascade"),
        ReferentialAction::SetNull => Some("SetNull"),
        ReferentialAction::SetDefault => Some("SetDefault"),
    }
}

fn create_foreign_key(table: &TableInfo, fk: &ForeignKeyInfo) -> String {
    let referenced_schema = if fk.referenced_schema.is_empty() {
        &table.schema
    } else {
        &fk.referenced_schema
    };

    let mut out = format!(
        "{}Create.ForeignKey({})\n{}.FromTable({}){}.ForeignColumn({})\n{}.ToTable({}){}.PrimaryColumn({})",
        BODY_INDENT,
        csharp_string(&fk.name),
        CHAIN_INDENT,
        csharp_string(&table.name),
        in_schema(&table.schema),
        csharp_string(&fk.column_name),
        CHAIN_INDENT,
        csharp_string(&fk.referenced_table),
        in_schema(referenced_schema),
        csharp_string(&fk.referenced_column),
    );

    if let Some(rule) = rule_name(fk.on_delete) {
        out.push_str(&format!(".OnDelete(System.Data.Rule.{})", rule));
    }
    if let Some(rule) = rule_name(fk.on_update) {
        out.push_str(&format!(".OnUpdate(System.Data.Rule.{})", rule));
    }

    out.push(';');
    out
}

fn create_index(table: &TableInfo, index: &IndexInfo) -> String {
    let mut out = format!(
        "{}Create.Index({})\n{}.OnTable({}){}",
        BODY_INDENT,
        csharp_string(&index.name),
        CHAIN_INDENT,
        csharp_string(&table.name),
        in_schema(&table.schema)
    );

    for column in index.ordered_columns() {
        let direction = if column.is_descending {
            ".Descending()"
        } else {
            ".Ascending()"
        };
        out.push_str(&format!(
            "\n{}.OnColumn({}){}",
            CHAIN_INDENT,
            csharp_string(&column.column_name),
            direction
        ));
    }

    if index.is_clustered {
        out.push_str(&format!("\n{}.WithOptions().Clustered()", CHAIN_INDENT));
    }
    if index.is_unique {
        out.push_str(&format!("\n{}.WithOptions().Unique()", CHAIN_INDENT));
    }

    out.push(';');
    out
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{DatabaseInfo, IndexColumnInfo};

    fn users() -> TableInfo {
        let mut t = TableInfo::new("dbo", "Users");
        // Deliberately out of column_id order.
        t.columns = vec![
            ColumnInfo {
                name: "CreatedAt".into(),
                data_type: "datetime2".into(),
                is_nullable: true,
                default_value: Some("(getdate())".into()),
                column_id: 3,
                ..Default::default()
            },
            ColumnInfo {
                name: "Id".into(),
                data_type: "int".into(),
                is_primary_key: true,
                is_identity: true,
                column_id: 1,
                ..Default::default()
            },
            ColumnInfo {
                name: "Name".into(),
                data_type: "nvarchar".into(),
                max_length: Some(50),
                column_id: 2,
                ..Default::default()
            },
        ];
        t
    }

    fn orders() -> TableInfo {
        let mut t = TableInfo::new("dbo", "Orders");
        t.columns = vec![ColumnInfo {
            name: "UserId".into(),
            data_type: "int".into(),
            column_id: 1,
            ..Default::default()
        }];
        t.foreign_keys = vec![ForeignKeyInfo {
            name: "FK_Orders_Users".into(),
            column_name: "UserId".into(),
            referenced_table: "Users".into(),
            referenced_schema: "dbo".into(),
            referenced_column: "Id".into(),
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::NoAction,
        }];
        t.indexes = vec![
            IndexInfo {
                name: "PK_Orders".into(),
                columns: vec![IndexColumnInfo {
                    column_name: "UserId".into(),
                    is_descending: false,
                    position: 1,
                }],
                is_unique: true,
                is_primary_key: true,
                is_clustered: true,
            },
            IndexInfo {
                name: "IX_Orders_UserId".into(),
                columns: vec![IndexColumnInfo {
                    column_name: "UserId".into(),
                    is_descending: true,
                    position: 1,
                }],
                is_unique: true,
                is_primary_key: false,
                is_clustered: false,
            },
        ];
        t
    }

    fn spec<'a>(class_name: &'a str, summary: Option<&'a str>) -> ClassSpec<'a> {
        ClassSpec {
            namespace: "App.Migrations",
            version: "20240101120000",
            class_name,
            summary,
            usings: SCHEMA_USINGS,
        }
    }

    #[test]
    fn test_create_table_columns_in_order() {
        let text = render_operation(&Operation::CreateTable(users())).unwrap();
        let expected = [
            "        Create.Table(\"Users\")",
            "            .WithColumn(\"Id\").AsInt32().NotNullable().PrimaryKey().Identity()",
            "            .WithColumn(\"Name\").AsString(50).NotNullable()",
            "            .WithColumn(\"CreatedAt\").AsDateTime().Nullable().WithDefaultValue(SystemMethods.CurrentDateTime);",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_unrecognized_default_is_omitted() {
        let column = ColumnInfo {
            name: "Flag".into(),
            data_type: "bit".into(),
            default_value: Some("((1)+(2))".into()),
            ..Default::default()
        };
        assert_eq!(
            render_column(&column),
            ".WithColumn(\"Flag\").AsBoolean().NotNullable()"
        );
    }

    #[test]
    fn test_foreign_key_statement() {
        let t = orders();
        let text = render_operation(&Operation::CreateForeignKey {
            table: t.clone(),
            foreign_key: t.foreign_keys[0].clone(),
        })
        .unwrap();
        let expected = [
            "        Create.ForeignKey(\"FK_Orders_Users\")",
            "            .FromTable(\"Orders\").ForeignColumn(\"UserId\")",
            "            .ToTable(\"Users\").PrimaryColumn(\"Id\").OnDelete(System.Data.Rule.Cascade);",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_foreign_key_update_rules() {
        let mut t = orders();
        t.foreign_keys[0].on_delete = ReferentialAction::SetNull;
        t.foreign_keys[0].on_update = ReferentialAction::SetDefault;
        let text = render_operation(&Operation::CreateForeignKey {
            table: t.clone(),
            foreign_key: t.foreign_keys[0].clone(),
        })
        .unwrap();
        assert!(text.ends_with(
            ".OnDelete(System.Data.Rule.SetNull).OnUpdate(System.Data.Rule.SetDefault);"
        ));
    }

    #[test]
    fn test_index_statement() {
        let t = orders();
        let text = render_operation(&Operation::CreateIndex {
            table: t.clone(),
            index: t.indexes[1].clone(),
        })
        .unwrap();
        let expected = [
            "        Create.Index(\"IX_Orders_UserId\")",
            "            .OnTable(\"Orders\")",
            "            .OnColumn(\"UserId\").Descending()",
            "            .WithOptions().Unique();",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_non_default_schema_is_qualified() {
        let mut t = orders();
        t.schema = "sales".into();
        t.foreign_keys[0].referenced_schema = "auth".into();

        let create = render_operation(&Operation::CreateTable(t.clone())).unwrap();
        assert!(create.starts_with("        Create.Table(\"Orders\").InSchema(\"sales\")"));

        let fk = render_operation(&Operation::CreateForeignKey {
            table: t.clone(),
            foreign_key: t.foreign_keys[0].clone(),
        })
        .unwrap();
        assert!(fk.contains(".FromTable(\"Orders\").InSchema(\"sales\").ForeignColumn"));
        assert!(fk.contains(".ToTable(\"Users\").InSchema(\"auth\").PrimaryColumn"));

        let drop = render_operation(&Operation::DeleteTable(t)).unwrap();
        assert_eq!(drop, "        Delete.Table(\"Orders\").InSchema(\"sales\");");
    }

    #[test]
    fn test_in_schema() {
        assert_eq!(in_schema("dbo"), "");
        assert_eq!(in_schema("DBO"), "");
        assert_eq!(in_schema(""), "");
        assert_eq!(in_schema("hr"), ".InSchema(\"hr\")");
    }

    #[test]
    fn test_names_needing_escape_use_verbatim_literals() {
        let t = TableInfo::new("dbo", "Odd\"Name");
        let text = render_operation(&Operation::DeleteTable(t)).unwrap();
        assert_eq!(text, "        Delete.Table(@\"Odd\"\"Name\");");
    }

    #[test]
    fn test_per_table_class() {
        let plan = MigrationPlan::for_table(&orders());
        let text = render_class(&spec("CreateOrdersTable", None), &plan);

        assert!(text.starts_with("using FluentMigrator;\n\nnamespace App.Migrations;\n\n"));
        assert!(text.contains("[Migration(20240101120000)]\npublic class CreateOrdersTable : Migration\n{"));

        let down_at = text.find("public override void Down()").unwrap();
        let down = &text[down_at..];
        let idx = down.find("Delete.Index(\"IX_Orders_UserId\").OnTable(\"Orders\");").unwrap();
        let fk = down.find("Delete.ForeignKey(\"FK_Orders_Users\").OnTable(\"Orders\");").unwrap();
        let table = down.find("Delete.Table(\"Orders\");").unwrap();
        assert!(idx < fk && fk < table);
        assert!(!text.contains("PK_Orders"));
        assert!(text.ends_with("    }\n}\n"));
    }

    #[test]
    fn test_summary_from_description() {
        let plan = MigrationPlan::for_table(&users());
        let text = render_class(&spec("CreateUsersTable", Some("Registered users & admins")), &plan);
        assert!(text.contains(
            "/// <summary>\n/// Registered users &amp; admins\n/// </summary>\n[Migration("
        ));
    }

    #[test]
    fn test_empty_database_is_well_formed() {
        let plan = MigrationPlan::for_database(&DatabaseInfo::new("dbo"));
        let text = render_class(&spec("InitialSchema", None), &plan);
        let expected = "using FluentMigrator;\n\nnamespace App.Migrations;\n\n\
            [Migration(20240101120000)]\npublic class InitialSchema : Migration\n{\n    \
            public override void Up()\n    {\n    }\n\n    \
            public override void Down()\n    {\n    }\n}\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_body_sections() {
        let db = DatabaseInfo {
            schema: "dbo".into(),
            tables: vec![users(), orders()],
        };
        let plan = MigrationPlan::for_database(&db);
        let up = render_body(&plan.up);
        let down = render_body(&plan.down);

        assert!(up.starts_with("        // Table: Users\n        Create.Table(\"Users\")"));
        assert!(up.contains(";\n\n        // Table: Orders\n"));
        assert!(up.contains("\n\n        // Foreign Keys\n"));
        assert!(up.contains("\n\n        // Indexes\n"));
        assert!(down.starts_with("        // Drop Indexes\n"));
        assert!(down.ends_with(
            "        // Drop Tables\n        Delete.Table(\"Orders\");\n        Delete.Table(\"Users\");\n"
        ));
    }

    #[test]
    fn test_delete_rows() {
        let text = render_operation(&Operation::DeleteRows(TableInfo::new("hr", "People"))).unwrap();
        assert_eq!(text, "        Delete.FromTable(\"People\").InSchema(\"hr\").AllRows();");
        assert!(render_operation(&Operation::InsertRows(TableInfo::new("hr", "People"))).is_none());
    }
}
