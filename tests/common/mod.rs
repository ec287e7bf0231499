//! Shared `SQLite` fixture for integration tests
//!
//! Builds a throwaway database file with the NGO schema, the four views and
//! a small data set, plus routine templates standing in for the stored
//! procedures and functions.
//!
//! Seed data:
//! - users: 1 alice/pw1 (Donor), 2 carol/pw2 (Adopter), 3 tina/pw3 (Trustee),
//!   4 root/pw4 (Admin), 5 vic/pw5 (Volunteer, no menu of its own)
//! - NGOs: 1 Relief Fund (Nairobi), 2 Water Aid (Mombasa), 3 Book Bridge
//!   (Kisumu, no description)
//! - tina is trustee of Water Aid; Water Aid has one donation of 100.00
//! - beneficiaries of Water Aid: 1 Amara (free), 2 Baraka (adopted by carol)
//! - Relief Fund has one 4-star review; one upcoming Water Aid event

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use rusqlite::Connection;

use ngodesk::{ConnectionConfig, Database, LineConsole, Session};

const SCHEMA: &str = "
CREATE TABLE Users (
    user_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    email TEXT,
    role TEXT NOT NULL
);
CREATE TABLE NGOs (
    ngo_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    location TEXT,
    contact_email TEXT
);
CREATE TABLE Donations (
    donation_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES Users(user_id),
    ngo_id INTEGER NOT NULL REFERENCES NGOs(ngo_id),
    amount REAL NOT NULL CHECK (amount > 0),
    payment_method TEXT NOT NULL,
    donation_date TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE Beneficiaries (
    beneficiary_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL,
    ngo_id INTEGER REFERENCES NGOs(ngo_id)
);
CREATE TABLE Adopters (
    adopter_id INTEGER PRIMARY KEY REFERENCES Users(user_id)
);
CREATE TABLE Adoptions (
    adoption_id INTEGER PRIMARY KEY,
    adopter_id INTEGER NOT NULL REFERENCES Users(user_id),
    beneficiary_id INTEGER NOT NULL REFERENCES Beneficiaries(beneficiary_id),
    adoption_date TEXT NOT NULL
);
CREATE TABLE Trustees (
    user_id INTEGER PRIMARY KEY REFERENCES Users(user_id),
    ngo_id INTEGER NOT NULL REFERENCES NGOs(ngo_id)
);
CREATE TABLE Reviews (
    review_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES Users(user_id),
    ngo_id INTEGER NOT NULL REFERENCES NGOs(ngo_id),
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    review_text TEXT,
    created_at TEXT DEFAULT '2026-01-15'
);
CREATE TABLE Events (
    event_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    ngo_id INTEGER NOT NULL REFERENCES NGOs(ngo_id),
    event_date TEXT NOT NULL,
    location TEXT
);

CREATE VIEW Available_Beneficiaries_View AS
    SELECT beneficiary_id, name, age FROM Beneficiaries
    WHERE beneficiary_id NOT IN (SELECT beneficiary_id FROM Adoptions)
    ORDER BY beneficiary_id;
CREATE VIEW Donation_Summary_View AS
    SELECT n.ngo_id, n.name, SUM(d.amount) AS total_donations, COUNT(*) AS donation_count
    FROM NGOs n JOIN Donations d ON d.ngo_id = n.ngo_id
    GROUP BY n.ngo_id, n.name;
CREATE VIEW NGO_Ratings_View AS
    SELECT n.ngo_id, n.name, AVG(r.rating) AS avg_rating, COUNT(r.review_id) AS review_count
    FROM NGOs n LEFT JOIN Reviews r ON r.ngo_id = n.ngo_id
    GROUP BY n.ngo_id, n.name
    ORDER BY n.ngo_id;
CREATE VIEW Upcoming_Events_View AS
    SELECT event_id, name, description, ngo_id, event_date, location FROM Events
    WHERE event_date >= date('now')
    ORDER BY event_date;

INSERT INTO Users VALUES
    (1, 'alice', 'pw1', 'alice@example.org', 'Donor'),
    (2, 'carol', 'pw2', 'carol@example.org', 'Adopter'),
    (3, 'tina', 'pw3', 'tina@example.org', 'Trustee'),
    (4, 'root', 'pw4', 'root@example.org', 'Admin'),
    (5, 'vic', 'pw5', 'vic@example.org', 'Volunteer');
INSERT INTO NGOs VALUES
    (1, 'Relief Fund', 'Disaster relief', 'Nairobi', 'info@relief.org'),
    (2, 'Water Aid', 'Clean water', 'Mombasa', 'hello@wateraid.org'),
    (3, 'Book Bridge', NULL, 'Kisumu', 'books@bridge.org');
INSERT INTO Trustees VALUES (3, 2);
INSERT INTO Adopters VALUES (2);
INSERT INTO Donations (user_id, ngo_id, amount, payment_method) VALUES (1, 2, 100.0, 'Bank Transfer');
INSERT INTO Beneficiaries VALUES (1, 'Amara', 9, 2), (2, 'Baraka', 12, 2);
INSERT INTO Adoptions (adopter_id, beneficiary_id, adoption_date) VALUES (2, 2, '2026-02-01');
INSERT INTO Reviews (user_id, ngo_id, rating, review_text) VALUES (1, 1, 4, 'Quick to respond');
INSERT INTO Events (name, description, ngo_id, event_date, location)
    VALUES ('Well Opening', 'New village well', 2, '2099-03-01', 'Kilifi');
";

const ROUTINES: &[(&str, &str)] = &[
    (
        "AuthenticateUser",
        "SELECT user_id, username FROM Users WHERE username = ?1 AND password = ?2",
    ),
    ("GetUserRole", "SELECT role FROM Users WHERE user_id = ?1"),
    (
        "CheckAdoptionConflict",
        "SELECT EXISTS (SELECT 1 FROM Adoptions WHERE beneficiary_id = ?1)",
    ),
    (
        "CreateEvent",
        "INSERT INTO Events (name, description, ngo_id, event_date, location) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    ),
    (
        "SubmitReview",
        "INSERT INTO Reviews (user_id, ngo_id, rating, review_text) VALUES (?1, ?2, ?3, ?4)",
    ),
    (
        "AddNGO",
        "INSERT INTO NGOs (name, description, location, contact_email) VALUES (?1, ?2, ?3, ?4)",
    ),
    (
        "UpdateNGO",
        "UPDATE NGOs SET name = ?2, description = ?3, location = ?4, contact_email = ?5 \
         WHERE ngo_id = ?1",
    ),
    ("DeleteNGO", "DELETE FROM NGOs WHERE ngo_id = ?1"),
    (
        "SearchNGOsByLocation",
        "SELECT ngo_id, name, location FROM NGOs WHERE location LIKE '%' || ?1 || '%' \
         ORDER BY ngo_id",
    ),
    (
        "GetTrusteeBeneficiaries",
        "SELECT b.beneficiary_id, b.name, b.age FROM Beneficiaries b \
         JOIN Trustees t ON t.ngo_id = b.ngo_id WHERE t.user_id = ?1 ORDER BY b.beneficiary_id",
    ),
    ("fn_email_exists", "SELECT EXISTS (SELECT 1 FROM Users WHERE email = ?1)"),
    ("fn_validate_password", "SELECT length(?1) >= 8"),
    ("fn_get_user_role", "SELECT role FROM Users WHERE user_id = ?1"),
    (
        "fn_get_user_total_donations",
        "SELECT printf('%.2f', COALESCE(SUM(amount), 0)) FROM Donations WHERE user_id = ?1",
    ),
    (
        "fn_get_ngo_total_donations",
        "SELECT printf('%.2f', COALESCE(SUM(amount), 0)) FROM Donations WHERE ngo_id = ?1",
    ),
    ("fn_get_ngo_avg_rating", "SELECT AVG(rating) FROM Reviews WHERE ngo_id = ?1"),
];

/// Seeded database file, removed on drop
pub struct Fixture {
    pub path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir()
            .join(format!("ngodesk_test_{}_{id}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let conn = Connection::open(&path).expect("Failed to create fixture database");
        conn.execute_batch(SCHEMA).expect("Failed to seed fixture database");

        Self { path }
    }

    pub fn routines() -> BTreeMap<String, String> {
        ROUTINES
            .iter()
            .map(|(name, sql)| ((*name).to_string(), (*sql).to_string()))
            .collect()
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::sqlite(self.path.clone(), Self::routines())
    }

    pub fn database(&self) -> Database {
        Database::open(&self.config()).expect("Failed to open fixture database")
    }

    /// Run a full session over `input` and return everything printed
    pub fn session(&self, input: &str) -> String {
        let console = LineConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let mut session = Session::new(self.database(), console);
        session.run().expect("session failed");

        let (_db, console) = session.into_parts();
        String::from_utf8(console.into_writer()).expect("output is not UTF-8")
    }

    /// Direct connection for checking what a session wrote
    pub fn inspect(&self) -> Connection {
        Connection::open(&self.path).expect("Failed to open fixture database")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.inspect()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count failed")
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
