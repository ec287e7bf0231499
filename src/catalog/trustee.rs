//! Trustee actions, scoped to the NGO the trustee belongs to

use crate::console::Console;
use crate::database::Database;
use crate::engine::Invocation;
use crate::error::Result;
use crate::session::Identity;

const TRUSTEE_NGO: &str = "SELECT ngo_id FROM Trustees WHERE user_id = ?";
const DONATION_SUMMARY: &str = "SELECT * FROM Donation_Summary_View WHERE ngo_id = ?";

/// NGO the identity is a trustee of, if any
pub fn trustee_ngo(db: &mut Database, identity: &Identity) -> Result<Option<i64>> {
    db.fetch_one(&Invocation::raw(TRUSTEE_NGO).bind(identity.id))?
        .map(|row| row.int(0))
        .transpose()
}

pub fn create_event(db: &mut Database, console: &mut impl Console, identity: &Identity) -> Result<()> {
    let Some(ngo_id) = trustee_ngo(db, identity)? else {
        console.say("You are not a trustee of any NGO.");
        return Ok(());
    };

    let name = console.read_line("Event name")?;
    let description = console.read_line("Description")?;
    let date = console.ask_date("Date (YYYY-MM-DD)")?;
    let location = console.read_line("Location")?;

    db.run(
        &Invocation::call("CreateEvent")
            .bind(name)
            .bind(description)
            .bind(ngo_id)
            .bind(date)
            .bind(location),
    )?;
    console.say("Event created!");
    Ok(())
}

pub fn view_donation_summary(
    db: &mut Database,
    console: &mut impl Console,
    identity: &Identity,
) -> Result<()> {
    let Some(ngo_id) = trustee_ngo(db, identity)? else {
        console.say("You are not a trustee of any NGO.");
        return Ok(());
    };

    match db.fetch_one(&Invocation::raw(DONATION_SUMMARY).bind(ngo_id))? {
        Some(summary) => {
            console.say(&format!("\nNGO: {}", summary.text(1)?));
            console.say(&format!(
                "Total Donations: ${:.2} ({} donations)",
                summary.float(2)?,
                summary.text(3)?
            ));
        }
        None => console.say("No donations recorded yet."),
    }
    Ok(())
}

pub fn view_beneficiaries(db: &mut Database, console: &mut impl Console, identity: &Identity) -> Result<()> {
    let rows = db.fetch(&Invocation::call("GetTrusteeBeneficiaries").bind(identity.id))?;
    if rows.is_empty() {
        console.say("No beneficiaries found.");
        return Ok(());
    }
    for row in &rows {
        console.say(&format!("{}: {} ({} years old)", row.text(0)?, row.text(1)?, row.text(2)?));
    }
    Ok(())
}
