//! Adopter actions
//!
//! Adoption is a guarded write: the database decides whether a beneficiary is
//! already taken (`CheckAdoptionConflict`) and the insert only runs when it
//! says no. Check and insert are separate round-trips. The adoption date is
//! the database's current date, not the client's.

use crate::console::Console;
use crate::database::Database;
use crate::engine::Invocation;
use crate::error::Result;
use crate::session::Identity;

const AVAILABLE_BENEFICIARIES: &str = "SELECT * FROM Available_Beneficiaries_View";
const INSERT_ADOPTION: &str = "INSERT INTO Adoptions (adopter_id, beneficiary_id, adoption_date) \
     VALUES (?, ?, CURRENT_DATE)";

/// Result of an adoption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoptionOutcome {
    Adopted,
    /// The database flagged the beneficiary as already adopted
    AlreadyAdopted,
}

pub fn view_available_beneficiaries(db: &mut Database, console: &mut impl Console) -> Result<()> {
    for row in db.fetch(&Invocation::raw(AVAILABLE_BENEFICIARIES))? {
        console.say(&format!("{}: {} ({} years old)", row.text(0)?, row.text(1)?, row.text(2)?));
    }
    Ok(())
}

pub fn adopt_beneficiary(
    db: &mut Database,
    console: &mut impl Console,
    identity: &Identity,
) -> Result<AdoptionOutcome> {
    view_available_beneficiaries(db, console)?;
    let beneficiary_id = console.ask_int("Enter Beneficiary ID")?;

    let conflict = db
        .fetch_scalar(&Invocation::function("CheckAdoptionConflict").bind(beneficiary_id))?
        .truthy(0)?;
    if conflict {
        console.say("Already adopted!");
        return Ok(AdoptionOutcome::AlreadyAdopted);
    }

    db.run(&Invocation::raw(INSERT_ADOPTION).bind(identity.id).bind(beneficiary_id))?;
    console.say("Adoption successful!");
    Ok(AdoptionOutcome::Adopted)
}
