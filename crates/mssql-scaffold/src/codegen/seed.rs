//! Streaming seed data export.
//!
//! Rows are pulled from a [`RowStream`] one at a time and buffered into
//! chunks. Each full chunk is written as one `Insert.IntoTable(..)` statement
//! before the next chunk is read, so at most one chunk is held in memory.

use futures::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::identifier::csharp_string;
use crate::core::schema::TableInfo;
use crate::core::value::{Row, RowStream, SqlValue};
use crate::error::{Result, ScaffoldError};

use super::output::MigrationFile;
use super::render::{in_schema, BODY_INDENT, CHAIN_INDENT};

/// Default number of rows per insert statement.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Counters for one exported table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub rows: u64,
    pub chunks: u64,
}

impl ExportStats {
    pub fn add(&mut self, other: ExportStats) {
        self.rows += other.rows;
        self.chunks += other.chunks;
    }
}

/// Writes table rows as chunked insert statements.
#[derive(Debug, Clone)]
pub struct SeedExporter {
    chunk_size: usize,
    cancel: CancellationToken,
}

impl SeedExporter {
    /// Create an exporter. A chunk size of zero is treated as one.
    pub fn new(chunk_size: usize, cancel: CancellationToken) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            cancel,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Consume `rows` and write them to `out`.
    ///
    /// Nothing is written for an empty stream. When `separate` is set, a
    /// blank line precedes the table's section. Cancellation is checked
    /// before every row is pulled; on cancellation the partial output is
    /// left in `out`.
    pub async fn export(
        &self,
        table: &TableInfo,
        mut rows: RowStream,
        out: &mut MigrationFile,
        separate: bool,
    ) -> Result<ExportStats> {
        let columns: Vec<&str> = table
            .ordered_columns()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();

        let mut stats = ExportStats::default();
        let mut chunk: Vec<Row> = Vec::with_capacity(self.chunk_size);

        loop {
            if self.cancel.is_cancelled() {
                return Err(ScaffoldError::Cancelled);
            }

            let Some(row) = rows.next().await else {
                break;
            };
            let row = row?;

            if row.len() != columns.len() {
                return Err(ScaffoldError::generation(
                    table.full_name(),
                    format!(
                        "row has {} values but the table has {} columns",
                        row.len(),
                        columns.len()
                    ),
                ));
            }

            chunk.push(row);
            if chunk.len() == self.chunk_size {
                self.flush_chunk(table, &columns, &mut chunk, out, &mut stats, separate)
                    .await?;
            }
        }

        if !chunk.is_empty() {
            self.flush_chunk(table, &columns, &mut chunk, out, &mut stats, separate)
                .await?;
        }

        debug!(
            "Exported {} rows in {} chunks from {}",
            stats.rows,
            stats.chunks,
            table.full_name()
        );
        Ok(stats)
    }

    async fn flush_chunk(
        &self,
        table: &TableInfo,
        columns: &[&str],
        chunk: &mut Vec<Row>,
        out: &mut MigrationFile,
        stats: &mut ExportStats,
        separate: bool,
    ) -> Result<()> {
        if stats.chunks == 0 {
            let lead = if separate { "\n" } else { "" };
            out.write_str(&format!("{}{}// Data: {}\n", lead, BODY_INDENT, table.name))
                .await?;
        }

        out.write_str(&render_insert(table, columns, chunk)).await?;
        stats.rows += chunk.len() as u64;
        stats.chunks += 1;
        chunk.clear();
        Ok(())
    }
}

/// Render one insert statement for a chunk of rows.
pub fn render_insert(table: &TableInfo, columns: &[&str], rows: &[Row]) -> String {
    let mut out = format!(
        "{}Insert.IntoTable({}){}",
        BODY_INDENT,
        csharp_string(&table.name),
        in_schema(&table.schema)
    );
    if table.has_identity() {
        out.push_str(".WithIdentityInsert()");
    }

    for row in rows {
        let pairs: Vec<String> = columns
            .iter()
            .zip(row)
            .map(|(column, value)| {
                format!("{{ {}, {} }}", csharp_string(column), format_seed_value(value))
            })
            .collect();
        out.push_str(&format!(
            "\n{}.Row(new Dictionary<string, object> {{ {} }})",
            CHAIN_INDENT,
            pairs.join(", ")
        ));
    }

    out.push_str(";\n");
    out
}

/// Render a value as a C# expression.
///
/// Numeric literals carry a type suffix (`m`, `d`, `f`) so a value never
/// lands as an out-of-range integral constant or a lossy `double`.
pub fn format_seed_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "null".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::I16(v) => v.to_string(),
        SqlValue::I32(v) => v.to_string(),
        SqlValue::I64(v) => v.to_string(),
        SqlValue::F32(v) => format_float(f64::from(*v), format!("{:?}f", v), "float"),
        SqlValue::F64(v) => format_float(*v, format!("{:?}d", v), "double"),
        SqlValue::Decimal(d) => format!("{}m", d),
        SqlValue::Text(s) => csharp_string(s),
        SqlValue::Uuid(u) => format!("Guid.Parse(\"{}\")", u),
        SqlValue::Bytes(b) if b.is_empty() => "new byte[0]".to_string(),
        SqlValue::Bytes(b) => {
            let bytes: Vec<String> = b.iter().map(u8::to_string).collect();
            format!("new byte[] {{ {} }}", bytes.join(", "))
        }
        SqlValue::DateTime(dt) => format!("DateTime.Parse(\"{}\")", dt.format("%Y-%m-%d %H:%M:%S")),
        SqlValue::Date(d) => format!("DateTime.Parse(\"{} 00:00:00\")", d.format("%Y-%m-%d")),
        SqlValue::DateTimeOffset(dt) => format!(
            "DateTimeOffset.Parse(\"{}\")",
            dt.format("%Y-%m-%d %H:%M:%S %:z")
        ),
        SqlValue::Time(t) => format!("TimeSpan.Parse(\"{}\")", t.format("%H:%M:%S")),
    }
}

fn format_float(v: f64, text: String, type_name: &str) -> String {
    if v.is_nan() {
        format!("{}.NaN", type_name)
    } else if v.is_infinite() && v > 0.0 {
        format!("{}.PositiveInfinity", type_name)
    } else if v.is_infinite() {
        format!("{}.NegativeInfinity", type_name)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnInfo;
    use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
    use futures::stream;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn table(identity: bool) -> TableInfo {
        let mut t = TableInfo::new("dbo", "Users");
        t.columns = vec![
            ColumnInfo {
                name: "Name".into(),
                data_type: "nvarchar".into(),
                column_id: 2,
                ..Default::default()
            },
            ColumnInfo {
                name: "Id".into(),
                data_type: "int".into(),
                is_identity: identity,
                column_id: 1,
                ..Default::default()
            },
        ];
        t
    }

    fn rows(n: i32) -> RowStream {
        Box::pin(stream::iter(
            (1..=n).map(|i| Ok(vec![SqlValue::I32(i), SqlValue::Text(format!("user{}", i))])),
        ))
    }

    async fn export_to_string(
        exporter: &SeedExporter,
        table: &TableInfo,
        rows: RowStream,
    ) -> (Result<ExportStats>, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seed.cs");
        let mut file = MigrationFile::create(&path).await.unwrap();
        let result = exporter.export(table, rows, &mut file, false).await;
        file.close().await.unwrap();
        (result, std::fs::read_to_string(&path).unwrap())
    }

    #[tokio::test]
    async fn test_chunk_counts() {
        let t = table(false);
        for (n, size, expected) in [(0, 3, 0), (1, 3, 1), (3, 3, 1), (7, 3, 3), (10, 1, 10)] {
            let exporter = SeedExporter::new(size, CancellationToken::new());
            let (stats, text) = export_to_string(&exporter, &t, rows(n)).await;
            let stats = stats.unwrap();
            assert_eq!(stats.rows, n as u64);
            assert_eq!(stats.chunks, expected, "n={} size={}", n, size);
            assert_eq!(text.matches("Insert.IntoTable").count() as u64, expected);
        }
    }

    #[tokio::test]
    async fn test_chunks_preserve_row_order() {
        let exporter = SeedExporter::new(3, CancellationToken::new());
        let (stats, text) = export_to_string(&exporter, &table(false), rows(7)).await;
        assert_eq!(stats.unwrap().chunks, 3);

        let statements: Vec<&str> = text.split("Insert.IntoTable").skip(1).collect();
        let per_chunk: Vec<usize> = statements.iter().map(|s| s.matches(".Row(").count()).collect();
        assert_eq!(per_chunk, vec![3, 3, 1]);

        let ids: Vec<usize> = (1..=7)
            .map(|i| text.find(&format!("{{ \"Id\", {} }}", i)).unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_empty_stream_writes_nothing() {
        let exporter = SeedExporter::new(10, CancellationToken::new());
        let (stats, text) = export_to_string(&exporter, &table(false), rows(0)).await;
        assert_eq!(stats.unwrap(), ExportStats::default());
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_statement_shape() {
        let exporter = SeedExporter::new(10, CancellationToken::new());
        let (_, text) = export_to_string(&exporter, &table(true), rows(1)).await;
        assert_eq!(
            text,
            "        // Data: Users\n        Insert.IntoTable(\"Users\").WithIdentityInsert()\n            \
             .Row(new Dictionary<string, object> { { \"Id\", 1 }, { \"Name\", \"user1\" } });\n"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_first_row() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let exporter = SeedExporter::new(10, cancel);
        let (result, text) = export_to_string(&exporter, &table(false), rows(5)).await;
        assert!(matches!(result, Err(ScaffoldError::Cancelled)));
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_row_width_mismatch() {
        let exporter = SeedExporter::new(10, CancellationToken::new());
        let bad: RowStream = Box::pin(stream::iter(vec![Ok(vec![SqlValue::I32(1)])]));
        let (result, _) = export_to_string(&exporter, &table(false), bad).await;
        assert!(matches!(result, Err(ScaffoldError::Generation { .. })));
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let exporter = SeedExporter::new(10, CancellationToken::new());
        let failing: RowStream = Box::pin(stream::iter(vec![Err(ScaffoldError::connection(
            "reset",
            "reading rows",
        ))]));
        let (result, _) = export_to_string(&exporter, &table(false), failing).await;
        assert_eq!(result.unwrap_err().exit_code(), 2);
    }

    #[test]
    fn test_zero_chunk_size_is_one() {
        assert_eq!(SeedExporter::new(0, CancellationToken::new()).chunk_size(), 1);
    }

    #[test]
    fn test_format_seed_value() {
        assert_eq!(format_seed_value(&SqlValue::Null), "null");
        assert_eq!(format_seed_value(&SqlValue::Bool(true)), "true");
        assert_eq!(format_seed_value(&SqlValue::I64(-9)), "-9");
        assert_eq!(format_seed_value(&SqlValue::F64(1.5)), "1.5d");
        assert_eq!(format_seed_value(&SqlValue::F64(f64::NAN)), "double.NaN");
        assert_eq!(format_seed_value(&SqlValue::F32(0.1)), "0.1f");
        assert_eq!(
            format_seed_value(&SqlValue::Decimal(Decimal::from_str("12.50").unwrap())),
            "12.50m"
        );
        assert_eq!(format_seed_value(&SqlValue::Text("it\"s".into())), "@\"it\"\"s\"");
        assert_eq!(format_seed_value(&SqlValue::Text("C:\\temp".into())), "@\"C:\\temp\"");
        assert_eq!(format_seed_value(&SqlValue::Bytes(vec![1, 2, 255])), "new byte[] { 1, 2, 255 }");
        assert_eq!(format_seed_value(&SqlValue::Bytes(vec![])), "new byte[0]");
        assert_eq!(
            format_seed_value(&SqlValue::Uuid(Uuid::nil())),
            "Guid.Parse(\"00000000-0000-0000-0000-000000000000\")"
        );
    }

    #[test]
    fn test_large_floats_keep_exponent() {
        assert_eq!(format_seed_value(&SqlValue::F64(1e20)), "1e20d");
        assert_eq!(format_seed_value(&SqlValue::F64(-2.5e-8)), "-2.5e-8d");
        assert_eq!(format_seed_value(&SqlValue::F64(100.0)), "100.0d");
        assert_eq!(format_seed_value(&SqlValue::F32(3e38)), "3e38f");
        assert_eq!(
            format_seed_value(&SqlValue::F32(f32::NEG_INFINITY)),
            "float.NegativeInfinity"
        );
    }

    #[test]
    fn test_decimals_are_decimal_literals() {
        let big = Decimal::from_str("12345678901234567890123").unwrap();
        assert_eq!(format_seed_value(&SqlValue::Decimal(big)), "12345678901234567890123m");

        let fine = Decimal::from_str("0.1000000000000000000000000001").unwrap();
        assert_eq!(
            format_seed_value(&SqlValue::Decimal(fine)),
            "0.1000000000000000000000000001m"
        );

        let negative = Decimal::from_str("-7").unwrap();
        assert_eq!(format_seed_value(&SqlValue::Decimal(negative)), "-7m");
    }

    #[test]
    fn test_format_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let time = NaiveTime::from_hms_milli_opt(13, 45, 7, 250).unwrap();
        assert_eq!(
            format_seed_value(&SqlValue::DateTime(date.and_time(time))),
            "DateTime.Parse(\"2024-02-29 13:45:07\")"
        );
        assert_eq!(
            format_seed_value(&SqlValue::Date(date)),
            "DateTime.Parse(\"2024-02-29 00:00:00\")"
        );
        assert_eq!(format_seed_value(&SqlValue::Time(time)), "TimeSpan.Parse(\"13:45:07\")");

        let offset = FixedOffset::east_opt(-3 * 3600).unwrap();
        let dto = offset.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap();
        assert_eq!(
            format_seed_value(&SqlValue::DateTimeOffset(dto)),
            "DateTimeOffset.Parse(\"2024-02-29 08:00:00 -03:00\")"
        );
    }
}
