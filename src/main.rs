//! ngodesk CLI Entry Point
//!
//! Subcommands:
//! - `run` - interactive session (the default when no subcommand is given)
//! - `connect` - save a connection profile
//! - `lookup` - print a single value from one of the stored functions
//!
//! Menus and results go to stdout. Logs go to stderr.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ngodesk::{
    connection_for, load_with_precedence, lookup, save_connection, ConfigLocation,
    ConnectionConfig, ConnectionOverrides, Console, Database, DatabaseType, LineConsole,
    LookupKind, Session, StoredConnection, TerminalConsole,
};

/// ngodesk - text-menu client for the NGO management database
#[derive(Parser)]
#[command(name = "ngodesk")]
#[command(about = "Text-menu client for the NGO management database")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive client
    Run {
        /// Connection profile to use (default profile when omitted)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Save a connection profile
    Connect {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Read the password from this environment variable instead of storing it
        #[arg(long)]
        password_env: Option<String>,

        /// Save to the user config instead of `.ngodesk/config.json`
        #[arg(long)]
        global: bool,
    },

    /// Look up a single value
    Lookup {
        kind: LookupKind,
        value: String,

        /// Connection profile to use (default profile when omitted)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

/// Explicit connection flags
#[derive(Args, Default)]
struct ConnectionArgs {
    /// Database engine (mysql or sqlite)
    #[arg(long)]
    engine: Option<DatabaseType>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[arg(long)]
    database: Option<String>,

    /// Database file (sqlite)
    #[arg(long)]
    file: Option<PathBuf>,

    /// JSON file mapping routine names to SQL (sqlite)
    #[arg(long)]
    routines: Option<PathBuf>,
}

impl From<ConnectionArgs> for ConnectionOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            engine: args.engine,
            host: args.host,
            port: args.port,
            user: args.user,
            password: args.password,
            database: args.database,
            file: args.file,
            routines: args.routines,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli
        .command
        .unwrap_or(Commands::Run { name: None, connection: ConnectionArgs::default() });

    let stdin = io::stdin();
    if stdin.is_terminal() {
        dispatch(command, TerminalConsole)
    } else {
        debug!("stdin is not a terminal, reading plain lines");
        dispatch(command, LineConsole::new(stdin.lock(), io::stdout()))
    }
}

fn dispatch(command: Commands, mut console: impl Console) -> anyhow::Result<()> {
    match command {
        Commands::Run { name, connection } => {
            let config = resolve(name.as_deref(), connection.into(), &mut console)?;
            let mut db = Database::open(&config)?;
            // A failed first connect is not fatal; every call retries once
            if let Err(e) = db.connect() {
                console.say(&format!("Error connecting to the database: {}", e.message()));
            }
            Session::new(db, console).run()?;
            Ok(())
        }
        Commands::Connect { name, connection, password_env, global } => {
            let mut overrides: ConnectionOverrides = connection.into();
            if password_env.is_some() {
                overrides.password.get_or_insert_with(String::new);
            }
            let mut config = overrides.prompt_missing(&mut console)?;
            if password_env.is_some() {
                config.password = None;
            }

            let location = if global { ConfigLocation::Global } else { ConfigLocation::Local };
            let first = save_connection(&name, StoredConnection { config, password_env }, location)
                .with_context(|| format!("saving connection '{name}'"))?;
            console.say(&format!(
                "Saved connection '{name}'{}",
                if first { " (default)" } else { "" }
            ));
            Ok(())
        }
        Commands::Lookup { kind, value, name, connection } => {
            let config = resolve(name.as_deref(), connection.into(), &mut console)?;
            let mut db = Database::open(&config)?;
            let line = lookup(&mut db, kind, &value)?;
            console.say(&line);
            db.disconnect();
            Ok(())
        }
    }
}

/// Flags over profile, prompting for anything still missing
fn resolve(
    name: Option<&str>,
    overrides: ConnectionOverrides,
    console: &mut impl Console,
) -> anyhow::Result<ConnectionConfig> {
    let registry = load_with_precedence()?;
    Ok(connection_for(&registry, name, overrides, console)?)
}
