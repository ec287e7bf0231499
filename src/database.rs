//! Connection Manager
//!
//! [`Database`] owns the single driver connection of the process and is the
//! only place that talks to a [`Driver`]. Before every call it makes sure a
//! live connection exists, reconnecting at most once, synchronously. Engine
//! failures are logged here and handed back as typed errors, so callers can
//! tell "the call failed" (`Err`) from "the call returned nothing"
//! (`Ok` with no rows).

use tracing::{debug, info, warn};

use crate::engine::{ConnectionConfig, DatabaseType, Driver, Invocation, QueryResult, Row};
use crate::error::{NgoError, Result};

/// Owned database connection with reconnect-on-loss
pub struct Database {
    driver: Box<dyn Driver>,
    connect_attempts: usize,
}

impl Database {
    /// Wrap a driver without connecting; the first call connects lazily
    #[must_use]
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self { driver, connect_attempts: 0 }
    }

    /// Pick the driver for a connection config, without connecting
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        debug!(connection = %config.describe(), "opening database");
        let driver: Box<dyn Driver> = match config.engine {
            #[cfg(feature = "mysql")]
            DatabaseType::MySQL => Box::new(crate::engine::mysql::MySqlDriver::new(config.clone())?),
            #[cfg(feature = "sqlite")]
            DatabaseType::SQLite => {
                let file = config.file.clone().ok_or_else(|| {
                    NgoError::config_error("SQLite connection requires a database file")
                })?;
                if config.routines.is_empty() {
                    warn!("no routine templates configured; stored routine calls will fail");
                }
                Box::new(crate::engine::sqlite::SqliteDriver::new(file, config.routines.clone()))
            }
            #[allow(unreachable_patterns)]
            other => {
                return Err(NgoError::config_error(format!(
                    "ngodesk was built without {other} support"
                )))
            }
        };
        Ok(Self::new(driver))
    }

    /// Engine behind this database
    #[must_use]
    pub fn engine(&self) -> DatabaseType {
        self.driver.engine()
    }

    /// Number of connection attempts made so far
    #[must_use]
    pub const fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }

    /// Establish the connection
    ///
    /// On failure the driver is left unconnected and the error is logged and
    /// returned.
    pub fn connect(&mut self) -> Result<()> {
        self.connect_attempts += 1;
        match self.driver.connect() {
            Ok(()) => {
                info!(engine = %self.driver.engine(), "connected to database");
                Ok(())
            }
            Err(e) => {
                self.driver.disconnect();
                warn!(code = e.error_code(), error = %e, "database connection failed");
                Err(e)
            }
        }
    }

    /// Drop the connection; the next call reconnects
    pub fn disconnect(&mut self) {
        self.driver.disconnect();
    }

    /// Whether a live connection is currently held
    pub fn is_connected(&mut self) -> bool {
        self.driver.is_connected()
    }

    /// Execute an invocation
    ///
    /// With `expect_rows` the rows are fetched and nothing is committed.
    /// Without it the statement is committed before returning and
    /// `rows_affected` is set.
    pub fn execute(&mut self, invocation: &Invocation, expect_rows: bool) -> Result<QueryResult> {
        invocation.validate()?;

        if !self.driver.is_connected() {
            debug!("no live connection, reconnecting");
            self.connect()?;
        }

        let outcome = if expect_rows {
            self.driver
                .fetch(invocation)
                .map(|rows| QueryResult { rows, rows_affected: None })
        } else {
            self.driver
                .execute_and_commit(invocation)
                .map(|affected| QueryResult { rows: Vec::new(), rows_affected: Some(affected) })
        };

        match &outcome {
            Ok(result) => debug!(
                statement = ?invocation.statement,
                rows = result.rows.len(),
                rows_affected = ?result.rows_affected,
                "statement executed"
            ),
            Err(e) => warn!(
                statement = ?invocation.statement,
                code = e.error_code(),
                error = %e,
                "statement failed"
            ),
        }

        outcome
    }

    /// Read rows
    pub fn fetch(&mut self, invocation: &Invocation) -> Result<Vec<Row>> {
        self.execute(invocation, true).map(|result| result.rows)
    }

    /// Read the first row, if any
    pub fn fetch_one(&mut self, invocation: &Invocation) -> Result<Option<Row>> {
        Ok(self.fetch(invocation)?.into_iter().next())
    }

    /// Read a single-value result, such as a stored function select
    pub fn fetch_scalar(&mut self, invocation: &Invocation) -> Result<Row> {
        self.fetch_one(invocation)?.ok_or_else(|| {
            NgoError::query_failed(format!("{:?} returned no rows", invocation.statement))
        })
    }

    /// Write and commit, returning rows affected
    pub fn run(&mut self, invocation: &Invocation) -> Result<u64> {
        Ok(self.execute(invocation, false)?.rows_affected.unwrap_or(0))
    }
}
