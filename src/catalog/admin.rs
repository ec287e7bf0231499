//! NGO administration
//!
//! Updates follow "blank means keep": the current row is read first and any
//! field left empty at the prompt is written back unchanged, NULLs included.

use crate::catalog::public::list_ngos;
use crate::console::Console;
use crate::database::Database;
use crate::engine::{Invocation, Row};
use crate::error::{NgoError, Result};

const NGO_DETAILS: &str =
    "SELECT ngo_id, name, description, location, contact_email FROM NGOs WHERE ngo_id = ?";

/// Editable NGO fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgoFields {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
}

impl NgoFields {
    /// Read fields from an `NGO_DETAILS` row
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            name: row.text(1)?,
            description: row.opt_text(2)?,
            location: row.opt_text(3)?,
            contact_email: row.opt_text(4)?,
        })
    }

    /// Apply user edits; a blank edit keeps the current value
    #[must_use]
    pub fn merge(self, edits: &NgoEdits) -> Self {
        Self {
            name: keep_if_blank(&edits.name, Some(self.name)).unwrap_or_default(),
            description: keep_if_blank(&edits.description, self.description),
            location: keep_if_blank(&edits.location, self.location),
            contact_email: keep_if_blank(&edits.contact_email, self.contact_email),
        }
    }
}

/// Raw text entered at the update prompts
#[derive(Debug, Clone, Default)]
pub struct NgoEdits {
    pub name: String,
    pub description: String,
    pub location: String,
    pub contact_email: String,
}

fn keep_if_blank(edit: &str, current: Option<String>) -> Option<String> {
    let edit = edit.trim();
    if edit.is_empty() {
        current
    } else {
        Some(edit.to_string())
    }
}

/// Prompt label showing the current value, e.g. `Location [Nairobi]`
fn labelled(field: &str, current: Option<&str>) -> String {
    format!("{field} [{}]", current.unwrap_or(""))
}

pub fn add_ngo(db: &mut Database, console: &mut impl Console) -> Result<()> {
    let name = console.read_line("NGO name")?;
    if name.trim().is_empty() {
        return Err(NgoError::invalid_input("NGO name cannot be empty"));
    }
    let description = console.read_line("Description")?;
    let location = console.read_line("Location")?;
    let contact_email = console.read_line("Contact email")?;

    db.run(
        &Invocation::call("AddNGO")
            .bind(name.trim())
            .bind(description)
            .bind(location)
            .bind(contact_email),
    )?;
    console.say("NGO added!");
    Ok(())
}

pub fn update_ngo(db: &mut Database, console: &mut impl Console) -> Result<()> {
    list_ngos(db, console)?;
    let ngo_id = console.ask_int("Enter NGO ID to update")?;

    let Some(row) = db.fetch_one(&Invocation::raw(NGO_DETAILS).bind(ngo_id))? else {
        console.say("NGO not found.");
        return Ok(());
    };
    let current = NgoFields::from_row(&row)?;

    console.say("Leave a field blank to keep its current value.");
    let edits = NgoEdits {
        name: console.read_line(&labelled("Name", Some(&current.name)))?,
        description: console.read_line(&labelled("Description", current.description.as_deref()))?,
        location: console.read_line(&labelled("Location", current.location.as_deref()))?,
        contact_email: console
            .read_line(&labelled("Contact email", current.contact_email.as_deref()))?,
    };
    let merged = current.merge(&edits);

    db.run(
        &Invocation::call("UpdateNGO")
            .bind(ngo_id)
            .bind(merged.name)
            .bind(merged.description)
            .bind(merged.location)
            .bind(merged.contact_email),
    )?;
    console.say("NGO updated!");
    Ok(())
}

pub fn delete_ngo(db: &mut Database, console: &mut impl Console) -> Result<()> {
    list_ngos(db, console)?;
    let ngo_id = console.ask_int("Enter NGO ID to delete")?;
    if !console.confirm(&format!("Delete NGO {ngo_id}? (y/n)"))? {
        console.say("Deletion cancelled.");
        return Ok(());
    }

    db.run(&Invocation::call("DeleteNGO").bind(ngo_id))?;
    console.say("NGO deleted!");
    Ok(())
}

pub fn search_ngos_by_location(db: &mut Database, console: &mut impl Console) -> Result<()> {
    let location = console.read_line("Location")?;
    let rows = db.fetch(&Invocation::call("SearchNGOsByLocation").bind(location.trim()))?;
    if rows.is_empty() {
        console.say("No NGOs found.");
        return Ok(());
    }
    for row in &rows {
        console.say(&format!("{}: {} ({})", row.text(0)?, row.text(1)?, row.text(2)?));
    }
    Ok(())
}
