//! Database Driver Trait and Core Types
//!
//! This module defines the abstractions the connection manager talks to.
//! Each engine (`MySQL`, `SQLite`) implements the `Driver` trait.
//!
//! # Stateful Design
//! A driver owns at most one live connection. It is opened by `connect`,
//! probed by `is_connected`, and dropped by `disconnect`. Reconnect policy
//! lives one layer up, in [`crate::database::Database`].
//!
//! # Invocations
//! Every statement is described by an [`Invocation`]: a verb plus positional
//! parameters. Parameters are always bound by the driver, never spliced into
//! the statement text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{NgoError, Result};

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(test)]
pub(crate) mod scripted;

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `MySQL` database (includes `MariaDB`)
    MySQL,
    /// `SQLite` database
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = NgoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "sqlite" => Ok(Self::SQLite),
            other => Err(NgoError::config_error(format!(
                "Unknown engine '{other}' (expected mysql or sqlite)"
            ))),
        }
    }
}

/// Connection configuration for database engines
///
/// Fields are engine-specific (`file` and `routines` only apply to `SQLite`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database engine type
    pub engine: DatabaseType,

    /// Hostname (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port number (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password (for mysql)
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database name (for mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Database file path (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// SQL templates standing in for stored routines (for sqlite)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routines: BTreeMap<String, String>,
}

impl ConnectionConfig {
    /// Default `MySQL` port
    pub const MYSQL_PORT: u16 = 3306;

    /// Create a new `MySQL` connection config
    #[must_use]
    pub fn mysql(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::MySQL,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
            routines: BTreeMap::new(),
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub fn sqlite(file: PathBuf, routines: BTreeMap<String, String>) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            file: Some(file),
            routines,
        }
    }

    /// Short description for logs (no credentials)
    #[must_use]
    pub fn describe(&self) -> String {
        match self.engine {
            DatabaseType::MySQL => format!(
                "mysql://{}@{}:{}/{}",
                self.user.as_deref().unwrap_or("?"),
                self.host.as_deref().unwrap_or("?"),
                self.port.unwrap_or(Self::MYSQL_PORT),
                self.database.as_deref().unwrap_or("?"),
            ),
            DatabaseType::SQLite => format!(
                "sqlite://{}",
                self.file.as_ref().map_or_else(|| "?".to_string(), |f| f.display().to_string())
            ),
        }
    }
}

/// A positional statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Statement verb
///
/// Statement text is always a compile-time constant. Only `Param`s carry
/// user-entered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Plain SQL with `?` placeholders
    Raw(&'static str),
    /// Stored procedure call: `CALL name(?, ...)`
    Call(&'static str),
    /// Stored function select: `SELECT name(?, ...)`
    Function(&'static str),
    /// Parametrized insert: `INSERT INTO table (cols) VALUES (?, ...)`
    Insert { table: &'static str, columns: &'static [&'static str] },
}

/// A statement plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub statement: Statement,
    pub params: Vec<Param>,
}

impl Invocation {
    #[must_use]
    pub const fn raw(sql: &'static str) -> Self {
        Self { statement: Statement::Raw(sql), params: Vec::new() }
    }

    #[must_use]
    pub const fn call(procedure: &'static str) -> Self {
        Self { statement: Statement::Call(procedure), params: Vec::new() }
    }

    #[must_use]
    pub const fn function(name: &'static str) -> Self {
        Self { statement: Statement::Function(name), params: Vec::new() }
    }

    #[must_use]
    pub const fn insert(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self { statement: Statement::Insert { table, columns }, params: Vec::new() }
    }

    /// Append a positional parameter
    #[must_use]
    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Routine name for calls and function selects
    #[must_use]
    pub const fn routine(&self) -> Option<&'static str> {
        match self.statement {
            Statement::Call(name) | Statement::Function(name) => Some(name),
            Statement::Raw(_) | Statement::Insert { .. } => None,
        }
    }

    /// Check that the parameter count matches the placeholders
    pub fn validate(&self) -> Result<()> {
        let expected = match &self.statement {
            Statement::Raw(sql) => placeholder_count(sql),
            Statement::Insert { columns, .. } => columns.len(),
            // Arity is defined by the bound parameters
            Statement::Call(_) | Statement::Function(_) => return Ok(()),
        };

        if expected == self.params.len() {
            Ok(())
        } else {
            Err(NgoError::invalid_input(format!(
                "Statement expects {expected} parameter(s), got {}",
                self.params.len()
            )))
        }
    }

    /// Render the statement text with `?` placeholders (MySQL dialect)
    #[must_use]
    pub fn render(&self) -> String {
        let marks = vec!["?"; self.params.len()].join(", ");
        match &self.statement {
            Statement::Raw(sql) => (*sql).to_string(),
            Statement::Call(name) => format!("CALL {name}({marks})"),
            Statement::Function(name) => format!("SELECT {name}({marks})"),
            Statement::Insert { table, columns } => {
                let marks = vec!["?"; columns.len()].join(", ");
                format!("INSERT INTO {table} ({}) VALUES ({marks})", columns.join(", "))
            }
        }
    }
}

/// Count `?` placeholders outside quoted literals
fn placeholder_count(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '?') => count += 1,
            (None, _) => {}
        }
    }
    count
}

/// One result row, columns in query order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<serde_json::Value>);

impl Row {
    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn column(&self, idx: usize) -> Result<&serde_json::Value> {
        self.0.get(idx).ok_or_else(|| {
            NgoError::query_failed(format!(
                "Result row has {} column(s), expected column {idx}",
                self.0.len()
            ))
        })
    }

    /// Column as integer (accepts numeric strings, as `MySQL` returns for some types)
    pub fn int(&self, idx: usize) -> Result<i64> {
        let value = self.column(idx)?;
        match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            serde_json::Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
        .ok_or_else(|| NgoError::query_failed(format!("Column {idx} is not an integer: {value}")))
    }

    /// Column as float (DECIMAL columns arrive as strings from `MySQL`)
    pub fn float(&self, idx: usize) -> Result<f64> {
        let value = self.column(idx)?;
        match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| NgoError::query_failed(format!("Column {idx} is not a number: {value}")))
    }

    /// Column as display text; NULL renders as an empty string
    pub fn text(&self, idx: usize) -> Result<String> {
        Ok(match self.column(idx)? {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Column as optional text, keeping NULL distinct from an empty string
    pub fn opt_text(&self, idx: usize) -> Result<Option<String>> {
        if self.column(idx)?.is_null() {
            Ok(None)
        } else {
            self.text(idx).map(Some)
        }
    }

    /// Column as optional float; NULL means no value (e.g. an average with no reviews)
    pub fn opt_float(&self, idx: usize) -> Result<Option<f64>> {
        if self.column(idx)?.is_null() {
            Ok(None)
        } else {
            self.float(idx).map(Some)
        }
    }

    /// Column as a SQL truth value
    pub fn truthy(&self, idx: usize) -> Result<bool> {
        Ok(match self.column(idx)? {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            serde_json::Value::String(s) => {
                !matches!(s.trim().to_ascii_lowercase().as_str(), "" | "0" | "false")
            }
            _ => true,
        })
    }
}

/// Query execution result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    /// Result rows in engine order (empty for writes)
    pub rows: Vec<Row>,

    /// Number of rows affected (only for committed writes)
    pub rows_affected: Option<u64>,
}

/// Database driver trait
///
/// Implementations hold at most one connection. All methods block until the
/// engine answers; per-call statement resources are released before returning.
pub trait Driver {
    /// Engine served by this driver
    fn engine(&self) -> DatabaseType;

    /// Open a connection, replacing any previous one
    fn connect(&mut self) -> Result<()>;

    /// Whether a live connection is held
    fn is_connected(&mut self) -> bool;

    /// Drop the connection (no-op when unconnected)
    fn disconnect(&mut self);

    /// Run a read statement and return every row, without committing
    fn fetch(&mut self, invocation: &Invocation) -> Result<Vec<Row>>;

    /// Run a write statement and commit it, returning rows affected
    fn execute_and_commit(&mut self, invocation: &Invocation) -> Result<u64>;
}
