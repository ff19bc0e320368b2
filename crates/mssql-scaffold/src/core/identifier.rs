//! Identifier quoting for SQL Server queries and for generated C# source.
//!
//! SQL identifiers cannot be bound as parameters, so data queries embed
//! bracket-quoted names. Generated C# embeds names as string literals whose
//! only escaping is quote-doubling.

use crate::error::{Result, ScaffoldError};

/// SQL Server's identifier length limit (characters).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier before embedding it in SQL.
///
/// Rejects empty names, names containing null bytes, and names longer
/// than SQL Server allows.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ScaffoldError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ScaffoldError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(ScaffoldError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a SQL Server identifier, doubling any closing bracket.
///
/// ```ignore
/// assert_eq!(quote_mssql("users")?, "[users]");
/// assert_eq!(quote_mssql("table]name")?, "[table]]name]");
/// ```
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// Qualify a SQL Server table name with schema.
pub fn qualify_mssql(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_mssql(schema)?, quote_mssql(table)?))
}

/// Render text as a C# string literal.
///
/// Double quotes are doubled and nothing else is escaped. Text containing a
/// quote, backslash or any C# line terminator is emitted as a verbatim `@"..."` literal,
/// where doubling is the language's own escape, so backslashes and line
/// breaks survive as-is.
pub fn csharp_string(value: &str) -> String {
    if value.contains(['"', '\\', '\n', '\r', '\u{0085}', '\u{2028}', '\u{2029}']) {
        format!("@\"{}\"", value.replace('"', "\"\""))
    } else {
        format!("\"{}\"", value)
    }
}

/// Turn a table name into something usable inside a C# class name.
///
/// Characters that cannot appear in an identifier are dropped and the next
/// kept character is capitalized (`order items` becomes `orderItems`).
/// A leading digit gets an underscore prefix.
pub fn class_name_part(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if upper_next {
                out.extend(ch.to_uppercase());
                upper_next = false;
            } else {
                out.push(ch);
            }
        } else {
            upper_next = !out.is_empty();
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if out.is_empty() {
        out.push_str("Table");
    }
    out
}
