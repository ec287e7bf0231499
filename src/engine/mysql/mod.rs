//! MySQL Driver Implementation
//!
//! This module implements the `Driver` trait for MySQL databases (including MariaDB).
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver) driven on a private current-thread
//!   tokio runtime, so every call blocks the caller until the server answers
//! - Reads collect the first result set and drop the rest (a `CALL` also
//!   produces a trailing status set)
//! - Writes run inside an explicit transaction that is committed before
//!   returning
//! - DECIMAL columns arrive as text; BLOB data is Base64-encoded
//! - An I/O error drops the connection so the next call reconnects

use mysql_async::{prelude::*, Conn, OptsBuilder, Params, TxOpts, Value};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::engine::{ConnectionConfig, DatabaseType, Driver, Invocation, Param, Row};
use crate::error::{NgoError, Result};

/// MySQL driver holding one connection
pub struct MySqlDriver {
    config: ConnectionConfig,
    runtime: Runtime,
    connection: Option<Conn>,
}

impl MySqlDriver {
    /// Create an unconnected driver
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        if config.engine != DatabaseType::MySQL {
            return Err(NgoError::invalid_input(format!(
                "Expected MySQL engine, got {}",
                config.engine
            )));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| NgoError::connection_failed(format!("Failed to start runtime: {e}")))?;

        Ok(Self { config, runtime, connection: None })
    }

    /// Map a driver error, forgetting the connection when the socket is gone
    fn classify(&mut self, context: &str, err: mysql_async::Error) -> NgoError {
        match err {
            mysql_async::Error::Io(e) => {
                self.connection = None;
                NgoError::connection_failed(format!("{context}: {e}"))
            }
            other => NgoError::query_failed(format!("{context}: {other}")),
        }
    }
}

impl Driver for MySqlDriver {
    fn engine(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn connect(&mut self) -> Result<()> {
        self.disconnect();
        let opts = build_mysql_opts(&self.config)?;
        let conn = self.runtime.block_on(Conn::new(opts)).map_err(|e| {
            NgoError::connection_failed(format!("Failed to connect to MySQL: {e}"))
        })?;
        debug!(server = ?conn.server_version(), "mysql connection established");
        self.connection = Some(conn);
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        let Some(conn) = self.connection.as_mut() else {
            return false;
        };
        if self.runtime.block_on(conn.ping()).is_ok() {
            true
        } else {
            self.connection = None;
            false
        }
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            if let Err(e) = self.runtime.block_on(conn.disconnect()) {
                debug!(error = %e, "mysql disconnect was not clean");
            }
        }
    }

    fn fetch(&mut self, invocation: &Invocation) -> Result<Vec<Row>> {
        let sql = invocation.render();
        let params = to_params(&invocation.params);
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| NgoError::connection_failed("MySQL connection is not open"))?;

        let outcome = self.runtime.block_on(async {
            let result = conn.exec_iter(sql, params).await?;
            result.collect_and_drop::<mysql_async::Row>().await
        });

        let rows = outcome.map_err(|e| self.classify("Failed to execute query", e))?;
        rows.iter().map(row_to_json).collect()
    }

    fn execute_and_commit(&mut self, invocation: &Invocation) -> Result<u64> {
        let sql = invocation.render();
        let params = to_params(&invocation.params);
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| NgoError::connection_failed("MySQL connection is not open"))?;

        let outcome = self.runtime.block_on(async {
            let mut tx = conn.start_transaction(TxOpts::default()).await?;
            let result = tx.exec_iter(sql, params).await?;
            let affected = result.affected_rows();
            result.drop_result().await?;
            tx.commit().await?;
            Ok::<u64, mysql_async::Error>(affected)
        });

        outcome.map_err(|e| self.classify("Failed to execute statement", e))
    }
}

impl Drop for MySqlDriver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Build MySQL connection options from ConnectionConfig
fn build_mysql_opts(config: &ConnectionConfig) -> Result<OptsBuilder> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| NgoError::invalid_input("MySQL requires 'host' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| NgoError::invalid_input("MySQL requires 'user' parameter"))?;

    let password = config
        .password
        .as_ref()
        .ok_or_else(|| NgoError::invalid_input("MySQL requires 'password' parameter"))?;

    let database = config
        .database
        .as_ref()
        .ok_or_else(|| NgoError::invalid_input("MySQL requires 'database' parameter"))?;

    let opts = OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(config.port.unwrap_or(ConnectionConfig::MYSQL_PORT))
        .user(Some(user))
        .pass(Some(password))
        .db_name(Some(database));

    Ok(opts)
}

fn to_params(params: &[Param]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(
        params
            .iter()
            .map(|p| match p {
                Param::Int(i) => Value::Int(*i),
                Param::Float(f) => Value::Double(*f),
                Param::Text(s) => Value::Bytes(s.clone().into_bytes()),
                Param::Null => Value::NULL,
            })
            .collect(),
    )
}

/// Convert a MySQL row to a positional JSON row
fn row_to_json(row: &mysql_async::Row) -> Result<Row> {
    (0..row.len()).map(|idx| mysql_value_to_json(row, idx)).collect::<Result<Vec<_>>>().map(Row)
}

/// Convert MySQL value to JSON value
fn mysql_value_to_json(row: &mysql_async::Row, idx: usize) -> Result<serde_json::Value> {
    let value = row.as_ref(idx).ok_or_else(|| {
        NgoError::query_failed(format!("Failed to get value at index {idx}"))
    })?;

    let json_value = match value {
        Value::NULL => serde_json::Value::Null,

        Value::Bytes(bytes) => {
            if let Ok(s) = std::str::from_utf8(bytes) {
                serde_json::Value::String(s.to_string())
            } else {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                serde_json::Value::String(encoded)
            }
        }

        Value::Int(i) => serde_json::Value::Number((*i).into()),

        Value::UInt(u) => serde_json::json!(*u),

        Value::Float(f) => serde_json::Number::from_f64(f64::from(*f))
            .map_or(serde_json::Value::Null, serde_json::Value::Number),

        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),

        Value::Date(year, month, day, hour, minute, second, micro) => {
            // Dates without a time part print as plain dates
            let text = if (*hour, *minute, *second, *micro) == (0, 0, 0, 0) {
                format!("{year:04}-{month:02}-{day:02}")
            } else {
                format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
            };
            serde_json::Value::String(text)
        }

        Value::Time(is_negative, days, hours, minutes, seconds, _micro) => {
            let sign = if *is_negative { "-" } else { "" };
            let total_hours = days * 24 + u32::from(*hours);
            serde_json::Value::String(format!("{sign}{total_hours}:{minutes:02}:{seconds:02}"))
        }
    };

    Ok(json_value)
}
