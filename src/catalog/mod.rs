//! Action Catalog
//!
//! Every menu entry maps to one [`Action`]. An action lists choices where the
//! user needs them, reads and coerces input, makes one (or a small fixed
//! sequence of) database round-trips and prints a confirmation or a listing.
//!
//! Actions return `Err` without printing it; the menu loop reports the error
//! and stays in the menu.

pub mod admin;
pub mod adopter;
pub mod donor;
pub mod public;
pub mod trustee;

use crate::console::Console;
use crate::database::Database;
use crate::error::Result;
use crate::session::Identity;

/// A menu action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MakeDonation,
    ViewAvailableBeneficiaries,
    AdoptBeneficiary,
    CreateEvent,
    ViewDonationSummary,
    ViewTrusteeBeneficiaries,
    SubmitReview,
    ViewNgoRatings,
    ViewNgoReviews,
    ViewUpcomingEvents,
    AddNgo,
    UpdateNgo,
    DeleteNgo,
    SearchNgosByLocation,
}

impl Action {
    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MakeDonation => "Make Donation",
            Self::ViewAvailableBeneficiaries => "View Available Beneficiaries",
            Self::AdoptBeneficiary => "Adopt a Beneficiary",
            Self::CreateEvent => "Create Event",
            Self::ViewDonationSummary => "View Donation Summary",
            Self::ViewTrusteeBeneficiaries => "View Beneficiaries",
            Self::SubmitReview => "Submit Review",
            Self::ViewNgoRatings => "View NGO Ratings",
            Self::ViewNgoReviews => "View NGO Reviews",
            Self::ViewUpcomingEvents => "View Upcoming Events",
            Self::AddNgo => "Add NGO",
            Self::UpdateNgo => "Update NGO",
            Self::DeleteNgo => "Delete NGO",
            Self::SearchNgosByLocation => "Search NGOs by Location",
        }
    }

    /// Whether the action only reads
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Self::ViewAvailableBeneficiaries
                | Self::ViewDonationSummary
                | Self::ViewTrusteeBeneficiaries
                | Self::ViewNgoRatings
                | Self::ViewNgoReviews
                | Self::ViewUpcomingEvents
                | Self::SearchNgosByLocation
        )
    }

    /// Run the action for the signed-in identity
    pub fn perform(
        self,
        db: &mut Database,
        console: &mut impl Console,
        identity: &Identity,
    ) -> Result<()> {
        match self {
            Self::MakeDonation => donor::make_donation(db, console, identity),
            Self::ViewAvailableBeneficiaries => adopter::view_available_beneficiaries(db, console),
            Self::AdoptBeneficiary => adopter::adopt_beneficiary(db, console, identity).map(drop),
            Self::CreateEvent => trustee::create_event(db, console, identity),
            Self::ViewDonationSummary => trustee::view_donation_summary(db, console, identity),
            Self::ViewTrusteeBeneficiaries => trustee::view_beneficiaries(db, console, identity),
            Self::SubmitReview => public::submit_review(db, console, identity),
            Self::ViewNgoRatings => public::view_ngo_ratings(db, console),
            Self::ViewNgoReviews => public::view_ngo_reviews(db, console),
            Self::ViewUpcomingEvents => public::view_upcoming_events(db, console),
            Self::AddNgo => admin::add_ngo(db, console),
            Self::UpdateNgo => admin::update_ngo(db, console),
            Self::DeleteNgo => admin::delete_ngo(db, console),
            Self::SearchNgosByLocation => admin::search_ngos_by_location(db, console),
        }
    }
}
