//! Default constraint normalization.
//!
//! SQL Server stores default constraints as expression text such as `((0))`,
//! `(N'active')` or `(getdate())`. [`normalize_default`] turns that text into
//! a [`DefaultValue`] the code generator can emit, or `None` when the
//! expression is not understood. Omission is silent; the column is still
//! generated, just without a default.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::identifier::csharp_string;
use crate::typemap::{category_of, TypeCategory};

/// First signed decimal token in an expression.
static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+\.?\d*").expect("Valid number token pattern"));

/// Function spellings that mean "now".
const CURRENT_TIMESTAMP_FUNCTIONS: &[&str] = &[
    "GETDATE",
    "GETUTCDATE",
    "SYSDATETIME",
    "SYSUTCDATETIME",
    "SYSDATETIMEOFFSET",
    "CURRENT_TIMESTAMP",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%Y/%m/%d"];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];

/// A default value in a form the generator can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// The database's current timestamp; emitted as a symbolic marker.
    CurrentTimestamp,
    Bool(bool),
    /// Numeric literal text, already validated.
    Number(String),
    Text(String),
    /// GUID text. The format is not checked.
    Guid(String),
    DateTime(NaiveDateTime),
    /// Unrecognized expression, emitted verbatim.
    Raw(String),
}

impl DefaultValue {
    /// Render as a C# argument for `.WithDefaultValue(..)`.
    pub fn render(&self) -> String {
        match self {
            DefaultValue::CurrentTimestamp => "SystemMethods.CurrentDateTime".to_string(),
            DefaultValue::Bool(b) => b.to_string(),
            DefaultValue::Number(n) => n.clone(),
            DefaultValue::Text(s) | DefaultValue::Guid(s) => csharp_string(s),
            DefaultValue::DateTime(dt) => {
                csharp_string(&dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            DefaultValue::Raw(s) => s.clone(),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Normalize a raw default constraint for a column of type `sql_type`.
///
/// Returns `None` when the expression should be dropped.
pub fn normalize_default(raw: &str, sql_type: &str) -> Option<DefaultValue> {
    let cleaned = strip_wrapping_parens(raw);
    if cleaned.is_empty() {
        return None;
    }

    let category = category_of(sql_type);
    let value = match category {
        TypeCategory::Guid => Some(DefaultValue::Guid(strip_quotes(cleaned).to_string())),
        TypeCategory::Boolean => normalize_bool(cleaned),
        TypeCategory::Text => Some(normalize_text(cleaned)),
        c if c.is_numeric() => normalize_number(cleaned),
        c if c.is_temporal() => normalize_temporal(cleaned, c),
        _ => Some(normalize_fallback(cleaned)),
    };

    if value.is_none() {
        debug!(
            "Dropping default {:?} for column of type {}: not recognized",
            raw, sql_type
        );
    }
    value
}

/// Remove balanced outer parentheses, repeatedly, and surrounding whitespace.
///
/// `((1))` becomes `1`; `(1)+(2)` is left alone because its first
/// parenthesis does not close at the end.
pub fn strip_wrapping_parens(raw: &str) -> &str {
    let mut s = raw.trim();
    while s.starts_with('(') && closing_paren(s) == Some(s.len() - 1) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Byte index of the parenthesis closing the one at index 0.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip any single or double quotes around a value.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == '"')
}

/// The value argument of `CAST(x AS t)` or `CONVERT(t, x[, style])`.
fn unwrap_cast(expr: &str) -> Option<&str> {
    let open = expr.find('(')?;
    let func = expr[..open].trim().to_uppercase();
    if !expr.ends_with(')') {
        return None;
    }
    let inner = &expr[open + 1..expr.len() - 1];

    match func.as_str() {
        "CAST" | "TRY_CAST" => {
            let split = inner.to_ascii_uppercase().rfind(" AS ")?;
            Some(strip_wrapping_parens(&inner[..split]))
        }
        "CONVERT" | "TRY_CONVERT" => {
            let args = split_top_level(inner);
            args.get(1).map(|a| strip_wrapping_parens(a))
        }
        _ => None,
    }
}

/// Split on commas that are not nested in parentheses or quotes.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            ',' if !in_quote && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn is_cast(expr: &str) -> bool {
    let upper = expr.to_uppercase();
    upper.contains("CONVERT") || upper.contains("CAST")
}

fn normalize_bool(cleaned: &str) -> Option<DefaultValue> {
    let value = if is_cast(cleaned) {
        unwrap_cast(cleaned)?
    } else {
        cleaned
    };

    match strip_quotes(value).to_lowercase().as_str() {
        "1" | "true" => Some(DefaultValue::Bool(true)),
        "0" | "false" => Some(DefaultValue::Bool(false)),
        _ => None,
    }
}

fn normalize_text(cleaned: &str) -> DefaultValue {
    let s = if cleaned.starts_with("N'") || cleaned.starts_with("n'") {
        &cleaned[1..]
    } else {
        cleaned
    };

    let s = if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    DefaultValue::Text(s.replace("''", "'"))
}

fn normalize_number(cleaned: &str) -> Option<DefaultValue> {
    if is_cast(cleaned) {
        let target = unwrap_cast(cleaned).unwrap_or(cleaned);
        return NUMBER_TOKEN
            .find(target)
            .map(|m| DefaultValue::Number(m.as_str().to_string()));
    }

    Decimal::from_str(cleaned)
        .ok()
        .map(|_| DefaultValue::Number(cleaned.to_string()))
}

fn normalize_temporal(cleaned: &str, category: TypeCategory) -> Option<DefaultValue> {
    let upper = cleaned.to_uppercase();
    if CURRENT_TIMESTAMP_FUNCTIONS.iter().any(|f| upper.contains(f)) {
        return Some(DefaultValue::CurrentTimestamp);
    }

    let text = strip_quotes(cleaned).trim();
    if let Some(dt) = parse_datetime(text) {
        return Some(DefaultValue::DateTime(dt));
    }

    if category == TypeCategory::Time && !text.is_empty() {
        return Some(DefaultValue::Text(text.to_string()));
    }

    None
}

/// Parse a date or timestamp in one of the accepted layouts.
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|f| DateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn normalize_fallback(cleaned: &str) -> DefaultValue {
    if cleaned.len() >= 2 && cleaned.starts_with('\'') && cleaned.ends_with('\'') {
        DefaultValue::Text(cleaned[1..cleaned.len() - 1].to_string())
    } else {
        DefaultValue::Raw(cleaned.to_string())
    }
}
