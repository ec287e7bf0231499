//! `SQLite` Driver Implementation
//!
//! This module implements the `Driver` trait for `SQLite` database files.
//!
//! # Stored Routines
//! `SQLite` has no stored procedures or stored functions. Each routine the
//! client calls (`AuthenticateUser`, `GetUserRole`, `CreateEvent`, ...) is
//! mapped to a SQL template from the connection config. Templates use
//! positional parameters (`?` or `?1`, `?2`, ...) bound in call order.
//! Calling a routine with no template is a query error.
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver, no async needed)
//! - Writes run inside a transaction that is committed before returning
//! - BLOB data is Base64-encoded

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::engine::{DatabaseType, Driver, Invocation, Param, Row, Statement};
use crate::error::{NgoError, Result};

/// `SQLite` driver with routine templates
pub struct SqliteDriver {
    file: PathBuf,
    routines: BTreeMap<String, String>,
    connection: Option<Connection>,
}

impl SqliteDriver {
    /// Create an unconnected driver for `file`
    #[must_use]
    pub fn new(file: PathBuf, routines: BTreeMap<String, String>) -> Self {
        Self { file, routines, connection: None }
    }

    /// Statement text for an invocation, resolving routines through templates
    fn statement_text(&self, invocation: &Invocation) -> Result<String> {
        match invocation.statement {
            Statement::Raw(_) | Statement::Insert { .. } => Ok(invocation.render()),
            Statement::Call(name) | Statement::Function(name) => {
                self.routines.get(name).cloned().ok_or_else(|| {
                    NgoError::query_failed(format!("Routine {name} is not defined for sqlite"))
                })
            }
        }
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        self.connection
            .as_mut()
            .ok_or_else(|| NgoError::connection_failed("SQLite database is not open"))
    }
}

impl Driver for SqliteDriver {
    fn engine(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn connect(&mut self) -> Result<()> {
        self.connection = None;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(&self.file, flags).map_err(|e| {
            NgoError::connection_failed(format!("Failed to open SQLite database: {e}"))
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON").map_err(|e| {
            NgoError::connection_failed(format!("Failed to enable foreign keys: {e}"))
        })?;
        debug!(file = %self.file.display(), "sqlite database opened");
        self.connection = Some(conn);
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.connection.is_some()
    }

    fn disconnect(&mut self) {
        self.connection = None;
    }

    fn fetch(&mut self, invocation: &Invocation) -> Result<Vec<Row>> {
        let sql = self.statement_text(invocation)?;
        let conn = self.connection()?;

        // The prepared statement is dropped (and finalized) on every return path
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| NgoError::query_failed(format!("Failed to prepare query: {e}")))?;
        let column_count = stmt.column_count();

        let rows = stmt
            .query(params_from_iter(invocation.params.iter().map(to_sql_value)))
            .map_err(|e| NgoError::query_failed(format!("Failed to execute query: {e}")))?;

        let fetched: Result<Vec<Row>> = rows
            .mapped(|row| {
                (0..column_count)
                    .map(|idx| sqlite_value_to_json(row, idx))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .map(|row| {
                row.map(Row)
                    .map_err(|e| NgoError::query_failed(format!("Failed to fetch row: {e}")))
            })
            .collect();
        fetched
    }

    fn execute_and_commit(&mut self, invocation: &Invocation) -> Result<u64> {
        let sql = self.statement_text(invocation)?;
        let conn = self.connection()?;

        let tx = conn
            .transaction()
            .map_err(|e| NgoError::query_failed(format!("Failed to begin transaction: {e}")))?;
        let affected = tx
            .execute(&sql, params_from_iter(invocation.params.iter().map(to_sql_value)))
            .map_err(|e| NgoError::query_failed(format!("Failed to execute statement: {e}")))?;
        tx.commit()
            .map_err(|e| NgoError::query_failed(format!("Failed to commit: {e}")))?;

        Ok(affected as u64)
    }
}

fn to_sql_value(param: &Param) -> SqlValue {
    match param {
        Param::Int(i) => SqlValue::Integer(*i),
        Param::Float(f) => SqlValue::Real(*f),
        Param::Text(s) => SqlValue::Text(s.clone()),
        Param::Null => SqlValue::Null,
    }
}

/// Convert `SQLite` value to JSON value
fn sqlite_value_to_json(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> std::result::Result<serde_json::Value, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    let value_ref = row.get_ref(idx)?;

    Ok(match value_ref {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        ValueRef::Text(s) => {
            let text = std::str::from_utf8(s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            serde_json::Value::String(text.to_string())
        }
        ValueRef::Blob(b) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
    })
}
