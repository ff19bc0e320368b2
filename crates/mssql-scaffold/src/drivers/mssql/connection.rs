//! SQL Server query primitives over Tiberius.
//!
//! Every call opens its own connection and closes it when done. Streaming
//! queries run on a spawned task that owns its connection and feeds rows
//! through a bounded channel.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::stream::{self, TryStreamExt};
use rust_decimal::Decimal;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql, Query};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::config::SourceConfig;
use crate::core::traits::CatalogSource;
use crate::core::value::{ResultSet, Row, RowStream, SqlValue};
use crate::error::{Result, ScaffoldError};

/// Rows buffered between the streaming task and its consumer.
const STREAM_BUFFER: usize = 64;

/// Tiberius-backed [`CatalogSource`].
#[derive(Clone)]
pub struct TiberiusCatalog {
    config: Config,
}

impl TiberiusCatalog {
    /// Prepare a catalog from source configuration. Does not connect.
    pub fn new(source: &SourceConfig) -> Result<Self> {
        Ok(Self {
            config: build_config(source)?,
        })
    }

    async fn connect(&self) -> Result<Client<Compat<TcpStream>>> {
        let config = self.config.clone();
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| ScaffoldError::connection(e, format!("connecting to {}", config.get_addr())))?;

        tcp.set_nodelay(true).ok();

        let client = Client::connect(config, tcp.compat_write()).await?;
        debug!("Connected to SQL Server: {}", self.config.get_addr());
        Ok(client)
    }
}

fn build_config(source: &SourceConfig) -> Result<Config> {
    if let Some(ref ado) = source.connection_string {
        return Config::from_ado_string(ado)
            .map_err(|e| ScaffoldError::Config(format!("invalid connection_string: {}", e)));
    }

    let mut config = Config::new();
    config.host(&source.host);
    config.port(source.port);
    config.database(&source.database);
    config.authentication(AuthMethod::sql_server(&source.user, &source.password));

    // Encryption settings
    if source.encrypt {
        if source.trust_server_cert {
            config.trust_cert();
        }
        config.encryption(EncryptionLevel::Required);
    } else {
        config.encryption(EncryptionLevel::NotSupported);
    }

    Ok(config)
}

fn build_query<'a>(sql: &'a str, params: &'a [String]) -> Query<'a> {
    let mut query = Query::new(sql);
    for p in params {
        query.bind(p.as_str());
    }
    query
}

#[async_trait]
impl CatalogSource for TiberiusCatalog {
    async fn query(&self, sql: &str, params: &[String]) -> Result<ResultSet> {
        let mut client = self.connect().await?;
        let mut stream = build_query(sql, params).query(&mut client).await?;

        let columns = stream
            .columns()
            .await?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = stream
            .into_first_result()
            .await?
            .into_iter()
            .map(convert_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultSet { columns, rows })
    }

    async fn query_scalar(&self, sql: &str, params: &[String]) -> Result<Option<SqlValue>> {
        let mut client = self.connect().await?;
        let row = build_query(sql, params)
            .query(&mut client)
            .await?
            .into_row()
            .await?;

        match row.and_then(|r| r.into_iter().next()) {
            Some(data) => Ok(Some(convert_value(data)?)),
            None => Ok(None),
        }
    }

    fn query_stream(&self, sql: String, params: Vec<String>) -> RowStream {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let catalog = self.clone();

        tokio::spawn(async move {
            if let Err(e) = stream_rows(&catalog, &sql, &params, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }))
    }
}

async fn stream_rows(
    catalog: &TiberiusCatalog,
    sql: &str,
    params: &[String],
    tx: &mpsc::Sender<Result<Row>>,
) -> Result<()> {
    let mut client = catalog.connect().await?;
    let mut rows = build_query(sql, params)
        .query(&mut client)
        .await?
        .into_row_stream();

    let mut sent = 0u64;
    while let Some(row) = rows.try_next().await? {
        if tx.send(Ok(convert_row(row)?)).await.is_err() {
            debug!("Row stream consumer went away after {} rows", sent);
            break;
        }
        sent += 1;
    }

    Ok(())
}

fn convert_row(row: tiberius::Row) -> Result<Row> {
    row.into_iter().map(convert_value).collect()
}

/// Convert a TDS value to an owned [`SqlValue`].
fn convert_value(data: ColumnData<'static>) -> Result<SqlValue> {
    let value = match &data {
        ColumnData::U8(v) => v.map_or(SqlValue::Null, |v| SqlValue::I16(i16::from(v))),
        ColumnData::I16(v) => v.map_or(SqlValue::Null, SqlValue::I16),
        ColumnData::I32(v) => v.map_or(SqlValue::Null, SqlValue::I32),
        ColumnData::I64(v) => v.map_or(SqlValue::Null, SqlValue::I64),
        ColumnData::F32(v) => v.map_or(SqlValue::Null, SqlValue::F32),
        ColumnData::F64(v) => v.map_or(SqlValue::Null, SqlValue::F64),
        ColumnData::Bit(v) => v.map_or(SqlValue::Null, SqlValue::Bool),
        ColumnData::String(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map_or(SqlValue::Null, SqlValue::Uuid),
        ColumnData::Binary(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |b| SqlValue::Bytes(b.to_vec())),
        ColumnData::Numeric(_) => {
            Decimal::from_sql(&data)?.map_or(SqlValue::Null, SqlValue::Decimal)
        }
        ColumnData::Xml(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |x| SqlValue::Text((**x).clone().into_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)?.map_or(SqlValue::Null, SqlValue::DateTime)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(&data)?.map_or(SqlValue::Null, SqlValue::Date),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)?.map_or(SqlValue::Null, SqlValue::Time),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(&data)?
            .map_or(SqlValue::Null, SqlValue::DateTimeOffset),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn source() -> SourceConfig {
        SourceConfig {
            provider: "sqlserver".into(),
            host: "db.local".into(),
            port: 1444,
            database: "app".into(),
            user: "sa".into(),
            password: "pw".into(),
            connection_string: None,
            default_schema: None,
            encrypt: false,
            trust_server_cert: false,
        }
    }

    #[test]
    fn test_build_config_from_fields() {
        let config = build_config(&source()).unwrap();
        assert_eq!(config.get_addr(), "db.local:1444");
    }

    #[test]
    fn test_build_config_from_ado_string() {
        let mut src = source();
        src.connection_string = Some("Server=tcp:other,1500;Database=x;User Id=u;Password=p".into());
        let config = build_config(&src).unwrap();
        assert_eq!(config.get_addr(), "other:1500");
    }

    #[test]
    fn test_convert_scalars() {
        assert_eq!(convert_value(ColumnData::I32(Some(5))).unwrap(), SqlValue::I32(5));
        assert_eq!(convert_value(ColumnData::I32(None)).unwrap(), SqlValue::Null);
        assert_eq!(convert_value(ColumnData::U8(Some(200))).unwrap(), SqlValue::I16(200));
        assert_eq!(convert_value(ColumnData::Bit(Some(true))).unwrap(), SqlValue::Bool(true));
        assert_eq!(
            convert_value(ColumnData::String(Some(Cow::Borrowed("abc")))).unwrap(),
            SqlValue::Text("abc".into())
        );
        assert_eq!(
            convert_value(ColumnData::Binary(Some(Cow::Owned(vec![1, 2])))).unwrap(),
            SqlValue::Bytes(vec![1, 2])
        );
    }
}
