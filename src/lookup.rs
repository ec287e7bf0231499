//! One-shot lookups
//!
//! Single-value queries against the stored functions, for checking a
//! deployment from the command line without signing in.

use clap::ValueEnum;

use crate::database::Database;
use crate::engine::Invocation;
use crate::error::{NgoError, Result};

const USER_BY_NAME: &str = "SELECT user_id FROM users WHERE username = ?";

/// What to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupKind {
    /// User id for a username
    Username,
    /// Whether an email is registered
    Email,
    /// Whether a password meets the strength rules
    Password,
    /// Role of a user id
    Role,
    /// Total donated by a user id
    UserDonations,
    /// Total donated to an NGO id
    NgoDonations,
    /// Average rating of an NGO id
    NgoRating,
}

impl LookupKind {
    /// Build the invocation for a raw command-line value
    pub fn invocation(self, value: &str) -> Result<Invocation> {
        let function = match self {
            Self::Username => return Ok(Invocation::raw(USER_BY_NAME).bind(value)),
            Self::Email => return Ok(Invocation::function("fn_email_exists").bind(value)),
            Self::Password => return Ok(Invocation::function("fn_validate_password").bind(value)),
            Self::Role => "fn_get_user_role",
            Self::UserDonations => "fn_get_user_total_donations",
            Self::NgoDonations => "fn_get_ngo_total_donations",
            Self::NgoRating => "fn_get_ngo_avg_rating",
        };
        let id: i64 = value
            .trim()
            .parse()
            .map_err(|_| NgoError::invalid_input(format!("'{}' is not a whole number", value.trim())))?;
        Ok(Invocation::function(function).bind(id))
    }

    const fn caption(self) -> &'static str {
        match self {
            Self::Username => "Username exists",
            Self::Email => "Email exists",
            Self::Password => "Password valid",
            Self::Role => "User role",
            Self::UserDonations => "Total donations by user",
            Self::NgoDonations => "Total donations to NGO",
            Self::NgoRating => "NGO average rating",
        }
    }
}

/// Run a lookup and format its single output line
pub fn lookup(db: &mut Database, kind: LookupKind, value: &str) -> Result<String> {
    let invocation = kind.invocation(value)?;

    if kind == LookupKind::Username {
        return Ok(match db.fetch_one(&invocation)? {
            Some(row) => format!("{}: {}", kind.caption(), row.text(0)?),
            None => "User not found".to_string(),
        });
    }

    let row = db.fetch_scalar(&invocation)?;
    let shown = row.opt_text(0)?.unwrap_or_else(|| "none".to_string());
    Ok(format!("{}: {shown}", kind.caption()))
}
