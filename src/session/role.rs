//! Roles and their menus

use crate::catalog::Action;

/// User role, as reported by the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Donor,
    Adopter,
    Trustee,
    Admin,
    General,
}

/// One numbered menu line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Run(Action),
    Logout,
    Exit,
}

impl MenuEntry {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Run(action) => action.label(),
            Self::Logout => "Logout",
            Self::Exit => "Exit",
        }
    }
}

const DONOR_MENU: &[MenuEntry] = &[
    MenuEntry::Run(Action::MakeDonation),
    MenuEntry::Run(Action::ViewNgoRatings),
    MenuEntry::Run(Action::ViewNgoReviews),
    MenuEntry::Run(Action::ViewUpcomingEvents),
    MenuEntry::Run(Action::SubmitReview),
    MenuEntry::Logout,
];

const ADOPTER_MENU: &[MenuEntry] = &[
    MenuEntry::Run(Action::ViewAvailableBeneficiaries),
    MenuEntry::Run(Action::AdoptBeneficiary),
    MenuEntry::Run(Action::SubmitReview),
    MenuEntry::Run(Action::ViewNgoRatings),
    MenuEntry::Run(Action::ViewNgoReviews),
    MenuEntry::Run(Action::ViewUpcomingEvents),
    MenuEntry::Logout,
];

const TRUSTEE_MENU: &[MenuEntry] = &[
    MenuEntry::Run(Action::CreateEvent),
    MenuEntry::Run(Action::ViewDonationSummary),
    MenuEntry::Run(Action::SubmitReview),
    MenuEntry::Run(Action::ViewNgoRatings),
    MenuEntry::Run(Action::ViewNgoReviews),
    MenuEntry::Run(Action::ViewUpcomingEvents),
    MenuEntry::Run(Action::ViewTrusteeBeneficiaries),
    MenuEntry::Logout,
];

const ADMIN_MENU: &[MenuEntry] = &[
    MenuEntry::Run(Action::AddNgo),
    MenuEntry::Run(Action::UpdateNgo),
    MenuEntry::Run(Action::DeleteNgo),
    MenuEntry::Run(Action::SearchNgosByLocation),
    MenuEntry::Run(Action::ViewNgoRatings),
    MenuEntry::Run(Action::ViewUpcomingEvents),
    MenuEntry::Logout,
];

// General users leave the program from their menu instead of logging out
const GENERAL_MENU: &[MenuEntry] = &[
    MenuEntry::Run(Action::ViewNgoRatings),
    MenuEntry::Run(Action::ViewNgoReviews),
    MenuEntry::Run(Action::ViewUpcomingEvents),
    MenuEntry::Exit,
];

impl Role {
    /// Map the stored role string; anything unrecognised is `General`
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        let value = value.trim();
        [Self::Donor, Self::Adopter, Self::Trustee, Self::Admin]
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value))
            .unwrap_or(Self::General)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donor => "Donor",
            Self::Adopter => "Adopter",
            Self::Trustee => "Trustee",
            Self::Admin => "Admin",
            Self::General => "General",
        }
    }

    /// Menu heading
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Donor => "Donor Menu",
            Self::Adopter => "Adopter Menu",
            Self::Trustee => "Trustee Menu",
            Self::Admin => "Admin Menu",
            Self::General => "General User Menu",
        }
    }

    /// Menu entries in display order (numbered from 1)
    #[must_use]
    pub const fn entries(self) -> &'static [MenuEntry] {
        match self {
            Self::Donor => DONOR_MENU,
            Self::Adopter => ADOPTER_MENU,
            Self::Trustee => TRUSTEE_MENU,
            Self::Admin => ADMIN_MENU,
            Self::General => GENERAL_MENU,
        }
    }

    /// Resolve a typed menu choice
    #[must_use]
    pub fn choose(self, choice: &str) -> Option<MenuEntry> {
        let number: usize = choice.trim().parse().ok()?;
        self.entries().get(number.checked_sub(1)?).copied()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
