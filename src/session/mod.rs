//! Session and Role State Machine
//!
//! A [`Session`] owns the database connection, the console and the signed-in
//! identity (if any). [`Session::run`] drives the top-level loop:
//!
//! ```text
//! LoggedOut --(exit? y)--------------------------------> Exiting
//!     |  (exit? n, or first iteration)
//!     v
//! Authenticating --(no row / error)--> LoggedOut
//!     |  (identity row)
//!     v
//! Menu --(derive role, run role loop)--Logout--> LoggedOut
//!                                    --Exit----> Exiting
//! ```
//!
//! The role is looked up again every time a menu is entered; it is never
//! carried over from a previous menu.

mod role;

pub use role::{MenuEntry, Role};

use tracing::{debug, info, warn};

use crate::console::Console;
use crate::database::Database;
use crate::engine::Invocation;
use crate::error::{NgoError, Result};

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Identity),
    /// Credentials were rejected (the procedure returned no row)
    Rejected,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    LoggedOut { first_run: bool },
    Authenticating,
    Menu,
    Exiting,
}

/// How a role menu was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuExit {
    Logout,
    Exit,
}

/// The single interactive session of the process
pub struct Session<C> {
    db: Database,
    console: C,
    identity: Option<Identity>,
}

impl<C: Console> Session<C> {
    #[must_use]
    pub fn new(db: Database, console: C) -> Self {
        Self { db, console, identity: None }
    }

    /// Signed-in identity, if any
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn into_parts(self) -> (Database, C) {
        (self.db, self.console)
    }

    /// Run until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        let mut state = State::LoggedOut { first_run: true };
        while state != State::Exiting {
            state = match self.step(state) {
                Ok(next) => next,
                Err(NgoError::InputClosed) => {
                    debug!("input closed, leaving session");
                    State::Exiting
                }
                Err(e) => return Err(e),
            };
        }
        self.identity = None;
        self.db.disconnect();
        Ok(())
    }

    /// Perform one transition
    pub fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::LoggedOut { first_run: true } => Ok(State::Authenticating),
            State::LoggedOut { first_run: false } => {
                if self.console.confirm("\nExit program? (y/n)")? {
                    self.console.say("Exiting...");
                    Ok(State::Exiting)
                } else {
                    Ok(State::Authenticating)
                }
            }
            State::Authenticating => match self.login() {
                Ok(LoginOutcome::Authenticated(identity)) => {
                    self.console.say(&format!("Welcome {}!", identity.name));
                    info!(user_id = identity.id, "signed in");
                    self.identity = Some(identity);
                    Ok(State::Menu)
                }
                Ok(LoginOutcome::Rejected) => {
                    self.console.say("Invalid credentials!");
                    Ok(State::LoggedOut { first_run: false })
                }
                Err(e) if e.is_database() => {
                    self.console.say(&format!("Could not sign in: {}", e.message()));
                    Ok(State::LoggedOut { first_run: false })
                }
                Err(e) => Err(e),
            },
            State::Menu => {
                let Some(user_id) = self.identity.as_ref().map(|identity| identity.id) else {
                    return Ok(State::LoggedOut { first_run: false });
                };
                let role = match self.derive_role(user_id) {
                    Ok(role) => role,
                    Err(e) if e.is_database() => {
                        self.console.say(&format!("Could not load your menu: {}", e.message()));
                        self.logout();
                        return Ok(State::LoggedOut { first_run: false });
                    }
                    Err(e) => return Err(e),
                };
                match self.menu_loop(role)? {
                    MenuExit::Logout => {
                        self.logout();
                        Ok(State::LoggedOut { first_run: false })
                    }
                    MenuExit::Exit => {
                        self.console.say("Exiting...");
                        Ok(State::Exiting)
                    }
                }
            }
            State::Exiting => Ok(State::Exiting),
        }
    }

    /// Collect credentials and call the authentication procedure
    pub fn login(&mut self) -> Result<LoginOutcome> {
        let username = self.console.read_line("Username")?;
        let password = self.console.read_secret("Password")?;

        let row = self.db.fetch_one(
            &Invocation::call("AuthenticateUser").bind(username.trim()).bind(password),
        )?;

        match row {
            Some(row) => Ok(LoginOutcome::Authenticated(Identity {
                id: row.int(0)?,
                name: row.text(1)?,
            })),
            None => {
                debug!(username = username.trim(), "credentials rejected");
                Ok(LoginOutcome::Rejected)
            }
        }
    }

    /// Ask the database which role a user has
    pub fn derive_role(&mut self, user_id: i64) -> Result<Role> {
        let row = self.db.fetch_scalar(&Invocation::function("GetUserRole").bind(user_id))?;
        let raw = row.text(0)?;
        let role = Role::from_db(&raw);
        if role == Role::General && !raw.trim().eq_ignore_ascii_case("general") {
            warn!(user_id, role = %raw, "unrecognised role, using general menu");
        }
        Ok(role)
    }

    /// Clear the identity
    pub fn logout(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(user_id = identity.id, "signed out");
            self.console.say("Logout successful.");
        }
    }

    fn print_menu(&mut self, role: Role) {
        self.console.say(&format!("\n{}", role.title()));
        for (idx, entry) in role.entries().iter().enumerate() {
            self.console.say(&format!("{}. {}", idx + 1, entry.label()));
        }
    }

    fn menu_loop(&mut self, role: Role) -> Result<MenuExit> {
        loop {
            self.print_menu(role);
            let choice = self.console.read_line("Choose")?;
            let Some(entry) = role.choose(&choice) else {
                self.console.say("Invalid choice!");
                continue;
            };

            let action = match entry {
                MenuEntry::Logout => return Ok(MenuExit::Logout),
                MenuEntry::Exit => return Ok(MenuExit::Exit),
                MenuEntry::Run(action) => action,
            };

            let Some(identity) = self.identity.as_ref() else {
                return Ok(MenuExit::Logout);
            };
            debug!(?action, user_id = identity.id, "running action");
            match action.perform(&mut self.db, &mut self.console, identity) {
                Ok(()) => {}
                Err(NgoError::InputClosed) => return Err(NgoError::InputClosed),
                Err(e) => self.console.say(&e.message()),
            }
        }
    }
}
