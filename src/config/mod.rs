//! Configuration Management
//!
//! This module handles loading and saving database connection profiles.
//!
//! # Configuration Locations
//! - Local: `.ngodesk/config.json` (per working directory)
//! - Global: `~/.config/ngodesk/connections.json` (per user)
//!
//! Both files share one format. When both exist, local profiles replace
//! global profiles of the same name and a local `default` wins.
//!
//! # Resolution Precedence
//! 1. Explicit connection flags (highest priority)
//! 2. The named profile, or the registry default
//! 3. Interactive prompt for whatever is still missing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::console::Console;
use crate::engine::{ConnectionConfig, DatabaseType};
use crate::error::{NgoError, Result};

/// Connection registry (the content of one config file)
///
/// ```json
/// {
///   "connections": {
///     "office": { "engine": "mysql", "host": "db.local", "user": "ngo",
///                 "password_env": "NGO_DB_PASSWORD", "database": "ngo" }
///   },
///   "default": "office"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionRegistry {
    /// Named connection profiles
    #[serde(default)]
    pub connections: BTreeMap<String, StoredConnection>,

    /// Name of the default profile (must exist in `connections`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ConnectionRegistry {
    /// Overlay `local` on top of `self`
    #[must_use]
    pub fn merge(mut self, local: Self) -> Self {
        self.connections.extend(local.connections);
        if local.default.is_some() {
            self.default = local.default;
        }
        self
    }

    /// Look up a profile by name, or the default profile when no name is given
    ///
    /// Returns `Ok(None)` only when no name was asked for and no default is set.
    pub fn resolve(&self, name: Option<&str>) -> Result<Option<ConnectionConfig>> {
        let Some(name) = name.or(self.default.as_deref()) else {
            return Ok(None);
        };

        let stored = self.connections.get(name).ok_or_else(|| {
            let available: Vec<_> = self.connections.keys().collect();
            NgoError::config_error(format!(
                "Connection '{name}' not found. Available connections: {available:?}"
            ))
        })?;

        stored.resolve().map(Some)
    }
}

/// Stored connection profile
///
/// Same fields as `ConnectionConfig`, plus an environment variable reference
/// so the password does not have to live in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConnection {
    /// Connection configuration
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable holding the password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredConnection {
    /// Resolve environment variables into a `ConnectionConfig`
    pub fn resolve(&self) -> Result<ConnectionConfig> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            match std::env::var(env_var) {
                Ok(password) => config.password = Some(password),
                Err(_) => {
                    return Err(NgoError::config_error(format!(
                        "Environment variable {env_var} not found for password"
                    )));
                }
            }
        }

        Ok(config)
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local config: `.ngodesk/config.json`
    Local,
    /// Global config: `~/.config/ngodesk/connections.json`
    Global,
}

/// Get path to local config file (`.ngodesk/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        NgoError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".ngodesk").join("config.json"))
}

/// Get path to global config file (`~/.config/ngodesk/connections.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| NgoError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("ngodesk").join("connections.json"))
}

/// Load a registry from a config file (missing file means empty registry)
pub fn load_registry(path: &Path) -> Result<ConnectionRegistry> {
    if !path.exists() {
        return Ok(ConnectionRegistry::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| NgoError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents).map_err(|e| {
        NgoError::config_error(format!("Invalid config file {}: {e}", path.display()))
    })
}

/// Save a registry to a config file, creating its directory
pub fn save_registry(path: &Path, registry: &ConnectionRegistry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            NgoError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(registry)
        .map_err(|e| NgoError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| NgoError::config_error(format!("Could not write config file: {e}")))
}

/// Load the global registry with the local one layered on top
pub fn load_with_precedence() -> Result<ConnectionRegistry> {
    let global = load_registry(&global_config_path()?)?;
    let local = load_registry(&local_config_path()?)?;
    Ok(global.merge(local))
}

/// Final connection settings: flags over the profile, prompting for the rest
pub fn connection_for(
    registry: &ConnectionRegistry,
    name: Option<&str>,
    overrides: ConnectionOverrides,
    console: &mut impl Console,
) -> Result<ConnectionConfig> {
    match registry.resolve(name)? {
        Some(profile) => {
            debug!(connection = %profile.describe(), "resolved connection profile");
            overrides.apply(profile)
        }
        None => {
            debug!("no connection profile configured, asking for connection details");
            overrides.prompt_missing(console)
        }
    }
}

/// Save a profile to the given location
///
/// The first profile saved to a file becomes its default. Returns whether
/// that happened.
pub fn save_connection(
    name: &str,
    connection: StoredConnection,
    location: ConfigLocation,
) -> Result<bool> {
    let path = match location {
        ConfigLocation::Local => local_config_path()?,
        ConfigLocation::Global => global_config_path()?,
    };
    save_connection_at(&path, name, connection)
}

/// Save a profile into the registry file at `path`
pub fn save_connection_at(path: &Path, name: &str, connection: StoredConnection) -> Result<bool> {
    let mut registry = load_registry(path)?;
    let first = registry.connections.is_empty();

    registry.connections.insert(name.to_string(), connection);
    if first {
        registry.default = Some(name.to_string());
    }

    save_registry(path, &registry)?;
    Ok(first)
}

/// Read a routine template file: a JSON object of routine name to SQL
pub fn load_routines(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| NgoError::config_error(format!("Could not read routines file: {e}")))?;
    serde_json::from_str(&contents).map_err(|e| {
        NgoError::config_error(format!("Invalid routines file {}: {e}", path.display()))
    })
}

/// Connection settings given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub engine: Option<DatabaseType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub file: Option<PathBuf>,
    /// Routine template file (sqlite)
    pub routines: Option<PathBuf>,
}

impl ConnectionOverrides {
    /// Whether no flag was given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engine.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.database.is_none()
            && self.file.is_none()
            && self.routines.is_none()
    }

    /// Engine the flags ask for (a file implies `SQLite`)
    #[must_use]
    pub fn engine(&self) -> DatabaseType {
        self.engine.unwrap_or(if self.file.is_some() {
            DatabaseType::SQLite
        } else {
            DatabaseType::MySQL
        })
    }

    /// Apply the flags over a resolved profile
    pub fn apply(self, mut base: ConnectionConfig) -> Result<ConnectionConfig> {
        if let Some(engine) = self.engine {
            base.engine = engine;
        }
        base.host = self.host.or(base.host);
        base.port = self.port.or(base.port);
        base.user = self.user.or(base.user);
        base.password = self.password.or(base.password);
        base.database = self.database.or(base.database);
        base.file = self.file.or(base.file);
        if let Some(path) = &self.routines {
            base.routines = load_routines(path)?;
        }
        Ok(base)
    }

    /// Fill in whatever the flags leave out by asking on the console
    pub fn prompt_missing(self, console: &mut impl Console) -> Result<ConnectionConfig> {
        match self.engine() {
            DatabaseType::SQLite => {
                let file = match self.file {
                    Some(file) => file,
                    None => PathBuf::from(required(console.read_line("Enter database file")?, "file")?),
                };
                let routines = match &self.routines {
                    Some(path) => load_routines(path)?,
                    None => BTreeMap::new(),
                };
                Ok(ConnectionConfig::sqlite(file, routines))
            }
            DatabaseType::MySQL => {
                let host = match self.host {
                    Some(host) => host,
                    None => required(console.read_line("Enter host")?, "host")?,
                };
                let user = match self.user {
                    Some(user) => user,
                    None => required(console.read_line("Enter user")?, "user")?,
                };
                let password = match self.password {
                    Some(password) => password,
                    None => console.read_secret("Enter password")?,
                };
                let database = match self.database {
                    Some(database) => database,
                    None => required(console.read_line("Enter database name")?, "database")?,
                };
                Ok(ConnectionConfig::mysql(
                    host,
                    self.port.unwrap_or(ConnectionConfig::MYSQL_PORT),
                    user,
                    password,
                    database,
                ))
            }
        }
    }
}

fn required(value: String, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(NgoError::config_error(format!("A {field} is required to connect")))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{console, output};
    use pretty_assertions::assert_eq;

    fn mysql_profile(host: &str) -> StoredConnection {
        StoredConnection {
            config: ConnectionConfig::mysql(
                host.to_string(),
                3306,
                "ngo".to_string(),
                "secret".to_string(),
                "ngo".to_string(),
            ),
            password_env: None,
        }
    }

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("ngodesk-config-{label}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_registry_serialization() {
        let mut registry = ConnectionRegistry::default();
        registry.connections.insert("office".to_string(), mysql_profile("db.local"));
        registry.default = Some("office".to_string());

        let json = serde_json::to_string(&registry).unwrap();
        let parsed: ConnectionRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.default.as_deref(), Some("office"));
        assert_eq!(parsed.connections["office"].config.host.as_deref(), Some("db.local"));
    }

    #[test]
    fn test_sqlite_profile_with_routines() {
        let json = r#"{
            "connections": {
                "demo": {
                    "engine": "sqlite",
                    "file": "/tmp/ngo.db",
                    "routines": { "GetUserRole": "SELECT role FROM Users WHERE user_id = ?1" }
                }
            }
        }"#;
        let registry: ConnectionRegistry = serde_json::from_str(json).unwrap();
        let config = registry.resolve(Some("demo")).unwrap().unwrap();
        assert_eq!(config.engine, DatabaseType::SQLite);
        assert!(config.routines.contains_key("GetUserRole"));
    }

    #[test]
    fn test_resolve_env_password() {
        std::env::set_var("NGODESK_TEST_CONFIG_PW", "from-env");
        let stored = StoredConnection {
            password_env: Some("NGODESK_TEST_CONFIG_PW".to_string()),
            ..mysql_profile("db.local")
        };
        assert_eq!(stored.resolve().unwrap().password.as_deref(), Some("from-env"));
        std::env::remove_var("NGODESK_TEST_CONFIG_PW");
    }

    #[test]
    fn test_resolve_missing_env_password() {
        let stored = StoredConnection {
            password_env: Some("NGODESK_TEST_CONFIG_MISSING".to_string()),
            ..mysql_profile("db.local")
        };
        assert!(matches!(stored.resolve(), Err(NgoError::ConfigError(_))));
    }

    #[test]
    fn test_local_overrides_global() {
        let mut global = ConnectionRegistry::default();
        global.connections.insert("office".to_string(), mysql_profile("global-host"));
        global.connections.insert("archive".to_string(), mysql_profile("archive-host"));
        global.default = Some("archive".to_string());

        let mut local = ConnectionRegistry::default();
        local.connections.insert("office".to_string(), mysql_profile("local-host"));
        local.default = Some("office".to_string());

        let merged = global.merge(local);
        assert_eq!(merged.connections.len(), 2);
        let config = merged.resolve(None).unwrap().unwrap();
        assert_eq!(config.host.as_deref(), Some("local-host"));
    }

    #[test]
    fn test_resolve_without_default_is_none() {
        let mut registry = ConnectionRegistry::default();
        registry.connections.insert("office".to_string(), mysql_profile("db.local"));
        assert!(registry.resolve(None).unwrap().is_none());
        assert!(matches!(registry.resolve(Some("missing")), Err(NgoError::ConfigError(_))));
    }

    #[test]
    fn test_first_saved_profile_becomes_default() {
        let dir = temp_dir("save");
        let path = dir.join("connections.json");

        assert!(save_connection_at(&path, "office", mysql_profile("a")).unwrap());
        assert!(!save_connection_at(&path, "home", mysql_profile("b")).unwrap());

        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.default.as_deref(), Some("office"));
        assert_eq!(registry.connections.len(), 2);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = temp_dir("invalid");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_registry(&path), Err(NgoError::ConfigError(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_flags_override_profile() {
        let overrides = ConnectionOverrides {
            host: Some("flag-host".to_string()),
            ..ConnectionOverrides::default()
        };
        let config = overrides.apply(mysql_profile("profile-host").config).unwrap();
        assert_eq!(config.host.as_deref(), Some("flag-host"));
        assert_eq!(config.user.as_deref(), Some("ngo"));
    }

    #[test]
    fn test_prompt_for_missing_fields() {
        let overrides = ConnectionOverrides {
            host: Some("db.local".to_string()),
            ..ConnectionOverrides::default()
        };
        let mut c = console("ngo\nhunter2\nngo_db\n");

        let config = overrides.prompt_missing(&mut c).unwrap();
        assert_eq!(config.engine, DatabaseType::MySQL);
        assert_eq!(config.user.as_deref(), Some("ngo"));
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.database.as_deref(), Some("ngo_db"));
        assert_eq!(config.port, Some(3306));
        assert_eq!(
            output(&c),
            "Enter user: Enter password: Enter database name: "
        );
    }

    #[test]
    fn test_prompt_rejects_blank_host() {
        let mut c = console("\n");
        let err = ConnectionOverrides::default().prompt_missing(&mut c).unwrap_err();
        assert!(matches!(err, NgoError::ConfigError(_)));
    }

    #[test]
    fn test_file_flag_implies_sqlite() {
        let overrides = ConnectionOverrides {
            file: Some(PathBuf::from("ngo.db")),
            ..ConnectionOverrides::default()
        };
        assert_eq!(overrides.engine(), DatabaseType::SQLite);
        let mut c = console("");
        let config = overrides.prompt_missing(&mut c).unwrap();
        assert_eq!(config.file, Some(PathBuf::from("ngo.db")));
    }

    #[test]
    fn test_routines_flag_loads_templates() {
        let dir = temp_dir("routines");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("routines.json");
        fs::write(&path, r#"{ "GetUserRole": "SELECT role FROM Users WHERE user_id = ?1" }"#)
            .unwrap();

        let overrides = ConnectionOverrides {
            file: Some(PathBuf::from("ngo.db")),
            routines: Some(path.clone()),
            ..ConnectionOverrides::default()
        };
        let config = overrides.clone().prompt_missing(&mut console("")).unwrap();
        assert!(config.routines.contains_key("GetUserRole"));

        // Flags also replace the templates of a saved profile
        let profile = ConnectionConfig::sqlite(PathBuf::from("other.db"), BTreeMap::new());
        let config = overrides.apply(profile).unwrap();
        assert_eq!(config.file, Some(PathBuf::from("ngo.db")));
        assert_eq!(config.routines.len(), 1);

        let missing = ConnectionOverrides {
            routines: Some(dir.join("missing.json")),
            ..ConnectionOverrides::default()
        };
        assert!(matches!(
            missing.apply(ConnectionConfig::sqlite(PathBuf::from("ngo.db"), BTreeMap::new())),
            Err(NgoError::ConfigError(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_connection_for_uses_profile_then_flags() {
        let mut registry = ConnectionRegistry::default();
        registry.connections.insert("office".to_string(), mysql_profile("profile-host"));
        registry.default = Some("office".to_string());

        let overrides = ConnectionOverrides {
            database: Some("ngo_test".to_string()),
            ..ConnectionOverrides::default()
        };
        let mut c = console("");
        let config = connection_for(&registry, None, overrides, &mut c).unwrap();

        assert_eq!(config.host.as_deref(), Some("profile-host"));
        assert_eq!(config.database.as_deref(), Some("ngo_test"));
        assert_eq!(output(&c), "", "a resolved profile must not prompt");
    }

    #[test]
    fn test_connection_for_prompts_without_profile() {
        let registry = ConnectionRegistry::default();
        let overrides = ConnectionOverrides {
            host: Some("db.local".to_string()),
            password: Some("secret".to_string()),
            ..ConnectionOverrides::default()
        };
        let mut c = console("ngo
ngo_db
");
        let config = connection_for(&registry, None, overrides, &mut c).unwrap();

        assert_eq!(config.host.as_deref(), Some("db.local"));
        assert_eq!(config.user.as_deref(), Some("ngo"));
        assert_eq!(output(&c), "Enter user: Enter database name: ");
    }

    #[test]
    fn test_connection_for_unknown_name_is_an_error() {
        let registry = ConnectionRegistry::default();
        let mut c = console("db.local
");
        let err =
            connection_for(&registry, Some("office"), ConnectionOverrides::default(), &mut c)
                .unwrap_err();
        assert!(matches!(err, NgoError::ConfigError(_)));
        assert_eq!(output(&c), "");
    }

    #[test]
    fn test_saved_profile_is_found_by_name() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("config.json");
        save_connection_at(&path, "office", mysql_profile("a")).unwrap();
        save_connection_at(&path, "home", mysql_profile("b")).unwrap();

        let registry = load_registry(&path).unwrap();
        let mut c = console("");
        let home =
            connection_for(&registry, Some("home"), ConnectionOverrides::default(), &mut c)
                .unwrap();
        let default =
            connection_for(&registry, None, ConnectionOverrides::default(), &mut c).unwrap();

        assert_eq!(home.host.as_deref(), Some("b"));
        assert_eq!(default.host.as_deref(), Some("a"));
        let _ = fs::remove_dir_all(&dir);
    }
}
