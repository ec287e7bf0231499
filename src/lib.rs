//! ngodesk - Text-Menu Client for an NGO Management Database
//!
//! ngodesk signs a user in against the database, asks the database for the
//! user's role, and offers that role's menu of actions (donations,
//! adoptions, events, reviews, NGO administration). Business rules live in
//! the database as stored procedures, functions and views; this crate
//! collects input, invokes them, and prints results.
//!
//! # Architecture
//! - The binary is a thin wrapper: it resolves a connection, picks a
//!   console and hands both to a [`Session`].
//! - All database traffic goes through one [`Database`], which reconnects
//!   on loss and turns engine failures into typed errors.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`engine`] - Driver trait, invocations and the `MySQL`/`SQLite` drivers
//! - [`database`] - Connection manager
//! - [`console`] - Prompting and printing
//! - [`catalog`] - Menu actions
//! - [`session`] - Login and role menus
//! - [`config`] - Connection profiles
//! - [`lookup`] - One-shot lookups

pub mod catalog;
pub mod config;
pub mod console;
pub mod database;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod session;

// Re-export commonly used types for convenience
pub use catalog::Action;
pub use config::{
    connection_for, load_with_precedence, save_connection, ConfigLocation, ConnectionOverrides,
    ConnectionRegistry, StoredConnection,
};
pub use console::{Console, LineConsole, TerminalConsole};
pub use database::Database;
pub use engine::{ConnectionConfig, DatabaseType, Driver, Invocation, Param, QueryResult, Row};
pub use error::{NgoError, Result};
pub use lookup::{lookup, LookupKind};
pub use session::{Identity, LoginOutcome, MenuEntry, Role, Session, State};
