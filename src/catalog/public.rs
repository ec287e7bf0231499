//! Actions every role can reach: NGO listing, ratings, reviews, events

use crate::console::Console;
use crate::database::Database;
use crate::engine::Invocation;
use crate::error::Result;
use crate::session::Identity;

const LIST_NGOS: &str = "SELECT * FROM NGOs";
const NGO_RATINGS: &str = "SELECT * FROM NGO_Ratings_View";
const NGO_REVIEWS: &str = "SELECT rating, review_text, created_at FROM Reviews WHERE ngo_id = ?";
const UPCOMING_EVENTS: &str = "SELECT * FROM Upcoming_Events_View";

/// Print `<id>: <name>` for every NGO
pub fn list_ngos(db: &mut Database, console: &mut impl Console) -> Result<()> {
    for row in db.fetch(&Invocation::raw(LIST_NGOS))? {
        console.say(&format!("{}: {}", row.text(0)?, row.text(1)?));
    }
    Ok(())
}

pub fn view_ngo_ratings(db: &mut Database, console: &mut impl Console) -> Result<()> {
    for row in db.fetch(&Invocation::raw(NGO_RATINGS))? {
        let line = match row.opt_float(2)? {
            Some(average) => {
                format!("{}: {average:.1} stars ({} reviews)", row.text(1)?, row.text(3)?)
            }
            None => format!("{}: no ratings yet", row.text(1)?),
        };
        console.say(&line);
    }
    Ok(())
}

pub fn view_ngo_reviews(db: &mut Database, console: &mut impl Console) -> Result<()> {
    list_ngos(db, console)?;
    let ngo_id = console.ask_int("Enter NGO ID to view reviews")?;

    let reviews = db.fetch(&Invocation::raw(NGO_REVIEWS).bind(ngo_id))?;
    if reviews.is_empty() {
        console.say("No reviews yet.");
        return Ok(());
    }

    for (idx, review) in reviews.iter().enumerate() {
        console.say(&format!("\nReview {}:", idx + 1));
        console.say(&format!("Rating: {}/5", review.text(0)?));
        console.say(&format!("Date: {}", review.text(2)?));
        console.say(&format!("Text: {}", review.text(1)?));
    }
    Ok(())
}

pub fn view_upcoming_events(db: &mut Database, console: &mut impl Console) -> Result<()> {
    let events = db.fetch(&Invocation::raw(UPCOMING_EVENTS))?;
    if events.is_empty() {
        console.say("No upcoming events.");
        return Ok(());
    }

    for event in &events {
        console.say(&format!("\nEvent: {}", event.text(1)?));
        console.say(&format!("Date: {}", event.text(4)?));
        console.say(&format!("Location: {}", event.text(5)?));
        console.say(&format!("Description: {}", event.text(2)?));
    }
    Ok(())
}

pub fn submit_review(db: &mut Database, console: &mut impl Console, identity: &Identity) -> Result<()> {
    list_ngos(db, console)?;
    let ngo_id = console.ask_int("NGO ID")?;
    let rating = console.ask_int("Rating (1-5)")?;
    let text = console.read_line("Review text")?;

    db.run(
        &Invocation::call("SubmitReview")
            .bind(identity.id)
            .bind(ngo_id)
            .bind(rating)
            .bind(text),
    )?;
    console.say("Review submitted!");
    Ok(())
}
