//! SQL Server column type mapping to FluentMigrator column builders.
//!
//! The mapping is a static table keyed by lowercase type name. Each entry
//! says which builder method to call, what arguments it takes, and which
//! defaults to substitute when the catalog leaves a value out.

use crate::core::identifier::csharp_string;
use crate::core::schema::ColumnInfo;

/// Broad family of a column type. Drives default-value normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integer,
    Decimal,
    Float,
    Boolean,
    Text,
    Binary,
    DateTime,
    Time,
    Guid,
    Xml,
    Other,
}

impl TypeCategory {
    /// Integer, decimal, money and floating point types.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeCategory::Integer | TypeCategory::Decimal | TypeCategory::Float
        )
    }

    /// Date, time and timestamp types.
    pub fn is_temporal(self) -> bool {
        matches!(self, TypeCategory::DateTime | TypeCategory::Time)
    }
}

/// Argument list a builder method takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// `.AsInt32()`
    Plain,
    /// `.AsString(50)` when a length is known, `.AsString()` otherwise.
    OptionalLength,
    /// `.AsFixedLengthString(10)`, substituting `default` when unknown.
    RequiredLength { default: i32 },
    /// `.AsDecimal(18, 2)`, substituting the defaults when unknown.
    PrecisionScale { precision: i32, scale: i32 },
    /// A fixed argument list, e.g. `int.MaxValue` for legacy text types.
    Fixed(&'static str),
}

/// One row of the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Lowercase SQL Server type name.
    pub sql_type: &'static str,
    /// FluentMigrator builder method, without the leading dot.
    pub method: &'static str,
    pub shape: TypeShape,
    pub category: TypeCategory,
}

const fn entry(
    sql_type: &'static str,
    method: &'static str,
    shape: TypeShape,
    category: TypeCategory,
) -> TypeDescriptor {
    TypeDescriptor {
        sql_type,
        method,
        shape,
        category,
    }
}

/// Known SQL Server types.
pub static TYPE_TABLE: &[TypeDescriptor] = &[
    // Integer types
    entry("int", "AsInt32", TypeShape::Plain, TypeCategory::Integer),
    entry("bigint", "AsInt64", TypeShape::Plain, TypeCategory::Integer),
    entry("smallint", "AsInt16", TypeShape::Plain, TypeCategory::Integer),
    entry("tinyint", "AsByte", TypeShape::Plain, TypeCategory::Integer),
    // Boolean
    entry("bit", "AsBoolean", TypeShape::Plain, TypeCategory::Boolean),
    // Decimal/numeric
    entry(
        "decimal",
        "AsDecimal",
        TypeShape::PrecisionScale { precision: 18, scale: 0 },
        TypeCategory::Decimal,
    ),
    entry(
        "numeric",
        "AsDecimal",
        TypeShape::PrecisionScale { precision: 18, scale: 0 },
        TypeCategory::Decimal,
    ),
    entry("money", "AsCurrency", TypeShape::Plain, TypeCategory::Decimal),
    entry("smallmoney", "AsCurrency", TypeShape::Plain, TypeCategory::Decimal),
    // Floating point
    entry("float", "AsDouble", TypeShape::Plain, TypeCategory::Float),
    entry("real", "AsFloat", TypeShape::Plain, TypeCategory::Float),
    // Date/time
    entry("datetime", "AsDateTime", TypeShape::Plain, TypeCategory::DateTime),
    entry("datetime2", "AsDateTime", TypeShape::Plain, TypeCategory::DateTime),
    entry("smalldatetime", "AsDateTime", TypeShape::Plain, TypeCategory::DateTime),
    entry("date", "AsDate", TypeShape::Plain, TypeCategory::DateTime),
    entry("time", "AsTime", TypeShape::Plain, TypeCategory::Time),
    entry(
        "datetimeoffset",
        "AsDateTimeOffset",
        TypeShape::Plain,
        TypeCategory::DateTime,
    ),
    // GUID
    entry("uniqueidentifier", "AsGuid", TypeShape::Plain, TypeCategory::Guid),
    // String types
    entry("varchar", "AsString", TypeShape::OptionalLength, TypeCategory::Text),
    entry("nvarchar", "AsString", TypeShape::OptionalLength, TypeCategory::Text),
    entry(
        "char",
        "AsFixedLengthString",
        TypeShape::RequiredLength { default: 1 },
        TypeCategory::Text,
    ),
    entry(
        "nchar",
        "AsFixedLengthString",
        TypeShape::RequiredLength { default: 1 },
        TypeCategory::Text,
    ),
    entry("text", "AsString", TypeShape::Fixed("int.MaxValue"), TypeCategory::Text),
    entry("ntext", "AsString", TypeShape::Fixed("int.MaxValue"), TypeCategory::Text),
    // Binary types
    entry("binary", "AsBinary", TypeShape::OptionalLength, TypeCategory::Binary),
    entry("varbinary", "AsBinary", TypeShape::OptionalLength, TypeCategory::Binary),
    entry("image", "AsBinary", TypeShape::Fixed("int.MaxValue"), TypeCategory::Binary),
    // XML
    entry("xml", "AsXml", TypeShape::Plain, TypeCategory::Xml),
];

/// Look up a type by name (case-insensitive, surrounding whitespace ignored).
pub fn lookup(sql_type: &str) -> Option<&'static TypeDescriptor> {
    let key = sql_type.trim().to_lowercase();
    TYPE_TABLE.iter().find(|d| d.sql_type == key)
}

/// Category of a type name.
///
/// Names missing from the table are classified by substring, so user-defined
/// aliases such as `shortvarchar` still normalize like their base type.
pub fn category_of(sql_type: &str) -> TypeCategory {
    if let Some(desc) = lookup(sql_type) {
        return desc.category;
    }

    let t = sql_type.trim().to_lowercase();
    if t.contains("char") || t.contains("text") {
        TypeCategory::Text
    } else if t.contains("int") {
        TypeCategory::Integer
    } else if t.contains("decimal") || t.contains("numeric") || t.contains("money") {
        TypeCategory::Decimal
    } else if t.contains("float") || t.contains("real") {
        TypeCategory::Float
    } else if t.contains("date") {
        TypeCategory::DateTime
    } else if t.contains("time") {
        TypeCategory::Time
    } else {
        TypeCategory::Other
    }
}

/// Render the type builder call for a column, e.g. `.AsString(50)`.
///
/// Unknown types become `.AsCustom("<raw name>")`.
pub fn column_type(column: &ColumnInfo) -> String {
    let Some(desc) = lookup(&column.data_type) else {
        return format!(".AsCustom({})", csharp_string(&column.data_type));
    };

    match desc.shape {
        TypeShape::Plain => format!(".{}()", desc.method),
        TypeShape::OptionalLength => match column.max_length.filter(|l| *l > 0) {
            Some(len) => format!(".{}({})", desc.method, len),
            None => format!(".{}()", desc.method),
        },
        TypeShape::RequiredLength { default } => format!(
            ".{}({})",
            desc.method,
            column.max_length.filter(|l| *l > 0).unwrap_or(default)
        ),
        TypeShape::PrecisionScale { precision, scale } => format!(
            ".{}({}, {})",
            desc.method,
            column.precision.unwrap_or(precision),
            column.scale.unwrap_or(scale)
        ),
        TypeShape::Fixed(args) => format!(".{}({})", desc.method, args),
    }
}
