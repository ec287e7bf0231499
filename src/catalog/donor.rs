//! Donor actions

use crate::catalog::public::list_ngos;
use crate::console::Console;
use crate::database::Database;
use crate::engine::Invocation;
use crate::error::Result;
use crate::session::Identity;

const DONATION_COLUMNS: &[&str] = &["user_id", "ngo_id", "amount", "payment_method"];

/// Record a donation from the signed-in user
pub fn make_donation(db: &mut Database, console: &mut impl Console, identity: &Identity) -> Result<()> {
    list_ngos(db, console)?;
    let ngo_id = console.ask_int("Enter NGO ID")?;
    let amount = console.ask_float("Amount")?;
    let method = console.read_line("Payment method (Credit Card/PayPal/Bank Transfer)")?;

    db.run(
        &Invocation::insert("Donations", DONATION_COLUMNS)
            .bind(identity.id)
            .bind(ngo_id)
            .bind(amount)
            .bind(method.trim()),
    )?;
    console.say("Donation recorded!");
    Ok(())
}
