//! tiberius-backed [`BulkConnection`].

use std::time::Duration;

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, ToSql, TokenRow};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};

use crate::config::{BulkCopyOptions, ConnectionConfig};
use crate::core::identifier::quote_mssql;
use crate::core::{
    BulkConnection, CatalogColumn, CatalogReader, ColumnMetadata, RowCursor, SqlValue,
    TableIdentifier,
};
use crate::error::{BulkInsertError, Result};

use super::batch::{BatchPlanner, RowRoute};
use super::column_data::{row_has_oversized_strings, to_column_data, to_sql_param};

/// TCP keepalive interval for long-running bulk loads.
const TCP_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Columns of the destination visible to the login, excluding computed ones.
const CATALOG_QUERY: &str = r#"
SELECT c.COLUMN_NAME,
       c.ORDINAL_POSITION,
       ISNULL(COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)),
                             c.COLUMN_NAME, 'IsIdentity'), 0) AS IS_IDENTITY
FROM INFORMATION_SCHEMA.COLUMNS c
WHERE c.TABLE_SCHEMA = COALESCE(NULLIF(@P1, ''), SCHEMA_NAME())
  AND c.TABLE_NAME = @P2
  AND ISNULL(COLUMNPROPERTY(OBJECT_ID(QUOTENAME(c.TABLE_SCHEMA) + '.' + QUOTENAME(c.TABLE_NAME)),
                            c.COLUMN_NAME, 'IsComputed'), 0) = 0
ORDER BY c.ORDINAL_POSITION
"#;

fn encryption_level(encrypt: &str) -> EncryptionLevel {
    match encrypt.to_lowercase().as_str() {
        "false" | "no" | "disable" | "disabled" => EncryptionLevel::NotSupported,
        "optional" | "off" => EncryptionLevel::Off,
        _ => EncryptionLevel::Required,
    }
}

fn build_config(config: &ConnectionConfig) -> Config {
    let mut tds = Config::new();
    tds.host(&config.host);
    tds.port(config.port);
    tds.database(&config.database);
    tds.authentication(AuthMethod::sql_server(&config.user, &config.password));

    let level = encryption_level(&config.encrypt);
    if level != EncryptionLevel::NotSupported && config.trust_server_cert {
        tds.trust_cert();
    }
    tds.encryption(level);

    tds.packet_size(config.packet_size);
    tds
}

fn io_error(e: std::io::Error, context: &str) -> tiberius::error::Error {
    tiberius::error::Error::Io {
        kind: e.kind(),
        message: format!("{}: {}", context, e),
    }
}

async fn open_stream(config: &Config) -> std::result::Result<TcpStream, tiberius::error::Error> {
    let tcp = TcpStream::connect(config.get_addr())
        .await
        .map_err(|e| io_error(e, "connect"))?;
    tcp.set_nodelay(true).ok();

    let std_tcp = match tcp.into_std() {
        Ok(std_tcp) => std_tcp,
        Err(e) => {
            warn!("Failed to configure TCP keepalives on SQL Server connection: {}", e);
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| io_error(e, "connect"))?;
            tcp.set_nodelay(true).ok();
            return Ok(tcp);
        }
    };

    let socket = socket2::Socket::from(std_tcp);
    let keepalive = socket2::TcpKeepalive::new()
        .with_time(TCP_KEEPALIVE_INTERVAL)
        .with_interval(TCP_KEEPALIVE_INTERVAL);
    if let Err(e) = socket.set_tcp_keepalive(&keepalive) {
        warn!("Failed to set TCP keepalive on SQL Server connection: {}", e);
    }

    let std_tcp: std::net::TcpStream = socket.into();
    std_tcp.set_nonblocking(true).ok();
    TcpStream::from_std(std_tcp).map_err(|e| io_error(e, "Failed to convert socket"))
}

/// A single SQL Server connection used as a bulk-load sink.
///
/// A failed `write_all` may leave a bulk request open on the wire; discard
/// the connection after a `BulkTransfer` error.
pub struct MssqlConnection {
    client: Client<Compat<TcpStream>>,
    target: String,
}

impl MssqlConnection {
    /// Open a connection with TCP keepalives enabled.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let tds = build_config(config);
        let tcp = open_stream(&tds)
            .await
            .map_err(BulkInsertError::Connection)?;
        let client = Client::connect(tds, tcp.compat_write())
            .await
            .map_err(BulkInsertError::Connection)?;

        info!(
            "Connected to SQL Server {}:{}/{}",
            config.host, config.port, config.database
        );
        Ok(Self::from_client(client, config.target()))
    }

    /// Wrap an already connected client. `target` keys the reconciled
    /// column-order cache and should identify server and database.
    pub fn from_client(client: Client<Compat<TcpStream>>, target: impl Into<String>) -> Self {
        Self {
            client,
            target: target.into(),
        }
    }

    pub fn client_mut(&mut self) -> &mut Client<Compat<TcpStream>> {
        &mut self.client
    }

    /// Parameterised single-row `INSERT` for rows the bulk protocol cannot carry.
    async fn insert_row(
        &mut self,
        table: &TableIdentifier,
        qualified: &str,
        columns: &[(usize, ColumnMetadata)],
        row: &[SqlValue<'static>],
        row_number: u64,
    ) -> Result<u64> {
        debug!(
            "{}: row {} exceeds the bulk string limit, inserting singly",
            table, row_number
        );
        let names = columns
            .iter()
            .map(|(_, c)| quote_mssql(c.name()))
            .collect::<Result<Vec<_>>>()?;
        let placeholders: Vec<String> =
            (1..=columns.len()).map(|i| format!("@P{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified,
            names.join(", "),
            placeholders.join(", ")
        );

        let mut params: Vec<Box<dyn ToSql>> = Vec::with_capacity(columns.len());
        for (index, column) in columns {
            let param = to_sql_param(&row[*index], column).map_err(|source| {
                BulkInsertError::Conversion {
                    column: column.name().to_string(),
                    row: row_number,
                    source,
                }
            })?;
            params.push(param);
        }
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let result = self.client.execute(sql, &refs).await.map_err(|e| {
            BulkInsertError::transfer_with_source(
                table.full_name(),
                format!("single-row insert of row {}: {}", row_number, e),
                e,
            )
        })?;
        Ok(result.total())
    }
}

/// Columns the bulk request lists: everything except server-generated ones.
fn sent_columns(rows: &dyn RowCursor) -> Vec<(usize, ColumnMetadata)> {
    (0..rows.column_count())
        .filter(|&i| !rows.is_auto_increment(i))
        .filter_map(|i| rows.column(i).map(|c| (i, c.clone())))
        .collect()
}

fn token_row(
    row: &[SqlValue<'static>],
    columns: &[(usize, ColumnMetadata)],
    row_number: u64,
) -> Result<TokenRow<'static>> {
    let mut token_row = TokenRow::new();
    for (index, column) in columns {
        let data = to_column_data(&row[*index], column).map_err(|source| {
            BulkInsertError::Conversion {
                column: column.name().to_string(),
                row: row_number,
                source,
            }
        })?;
        token_row.push(data);
    }
    Ok(token_row)
}

fn current_row<'c>(
    rows: &'c dyn RowCursor,
    table: &TableIdentifier,
) -> Result<&'c [SqlValue<'static>]> {
    rows.current_row().ok_or_else(|| {
        BulkInsertError::transfer(table.full_name(), "cursor advanced without a current row")
    })
}

fn bulk_error(table: &TableIdentifier, stage: &str, e: tiberius::error::Error) -> BulkInsertError {
    BulkInsertError::transfer_with_source(
        table.full_name(),
        format!("bulk insert {}: {}", stage, e),
        e,
    )
}

fn warn_unsupported_hints(table: &TableIdentifier, options: &BulkCopyOptions) {
    let hints = options.hints();
    if !hints.is_empty() {
        warn!(
            "{}: bulk copy hints {} are not carried by the TDS bulk request; using server defaults",
            table,
            hints.join(", ")
        );
    }
}

#[async_trait]
impl CatalogReader for MssqlConnection {
    async fn catalog_columns(&mut self, table: &TableIdentifier) -> Result<Vec<CatalogColumn>> {
        let stream = self
            .client
            .query(CATALOG_QUERY, &[&table.schema.as_str(), &table.name.as_str()])
            .await
            .map_err(|e| BulkInsertError::catalog(table.full_name(), e))?;
        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| BulkInsertError::catalog(table.full_name(), e))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: &str = row
                .try_get(0)
                .map_err(|e| BulkInsertError::catalog(table.full_name(), e))?
                .unwrap_or_default();
            let ordinal: i32 = row
                .try_get(1)
                .map_err(|e| BulkInsertError::catalog(table.full_name(), e))?
                .unwrap_or_default();
            let is_identity: i32 = row
                .try_get(2)
                .map_err(|e| BulkInsertError::catalog(table.full_name(), e))?
                .unwrap_or_default();

            columns.push(CatalogColumn {
                name: name.to_string(),
                ordinal,
                is_identity: is_identity != 0,
            });
        }

        debug!("{}: catalog reports {} columns", table, columns.len());
        Ok(columns)
    }
}

#[async_trait]
impl BulkConnection for MssqlConnection {
    fn target(&self) -> &str {
        &self.target
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let result = self.client.execute(sql, &[]).await?;
        Ok(result.total())
    }

    async fn write_all(
        &mut self,
        table: &TableIdentifier,
        rows: &mut dyn RowCursor,
        options: &BulkCopyOptions,
    ) -> Result<u64> {
        let qualified = table.quoted()?;
        let columns = sent_columns(rows);
        let mut planner = BatchPlanner::new(options.batch_size);
        warn_unsupported_hints(table, options);

        let mut singles = 0u64;
        let mut exhausted = false;

        while !exhausted && rows.advance()? {
            let row_number = rows.rows_read();
            let row = current_row(rows, table)?;
            if columns.is_empty() {
                return Err(BulkInsertError::transfer(
                    table.full_name(),
                    "mapping has no insertable columns",
                ));
            }
            if let RowRoute::Single { .. } = planner.route(row_has_oversized_strings(row)) {
                let row = row.to_vec();
                singles += self
                    .insert_row(table, &qualified, &columns, &row, row_number)
                    .await?;
                continue;
            }

            let first = token_row(row, &columns, row_number)?;
            let mut held = None;
            {
                let mut request = self
                    .client
                    .bulk_insert(&qualified)
                    .await
                    .map_err(|e| bulk_error(table, "init", e))?;
                request
                    .send(first)
                    .await
                    .map_err(|e| bulk_error(table, "send", e))?;

                loop {
                    if !rows.advance()? {
                        exhausted = true;
                        break;
                    }
                    let row_number = rows.rows_read();
                    let row = current_row(rows, table)?;
                    let route = planner.route(row_has_oversized_strings(row));
                    if let RowRoute::Single { .. } = route {
                        held = Some((row.to_vec(), row_number));
                        break;
                    }

                    let token = token_row(row, &columns, row_number)?;
                    if route == RowRoute::Rollover {
                        request
                            .finalize()
                            .await
                            .map_err(|e| bulk_error(table, "finalize", e))?;
                        debug!("{}: committed bulk request", table);
                        request = self
                            .client
                            .bulk_insert(&qualified)
                            .await
                            .map_err(|e| bulk_error(table, "init", e))?;
                    }
                    request
                        .send(token)
                        .await
                        .map_err(|e| bulk_error(table, "send", e))?;
                }

                request
                    .finalize()
                    .await
                    .map_err(|e| bulk_error(table, "finalize", e))?;
                debug!("{}: committed bulk request", table);
            }

            if let Some((row, row_number)) = held {
                singles += self
                    .insert_row(table, &qualified, &columns, &row, row_number)
                    .await?;
            }
        }

        Ok(singles + planner.bulk_rows())
    }
}
