//! Pre-built Test Fixtures
//!
//! Dates, ids and names shared across the order test suite. Dates sit in a
//! January to March 2024 term so that proration lands on known fractions.

use chrono::NaiveDate;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::Name;
use fake::Fake;
use once_cell::sync::Lazy;

use core_kernel::{LocationId, StudentId};

/// First and last day of each month in the 2024 test term
pub static TERM_MONTHS: Lazy<Vec<(NaiveDate, NaiveDate)>> = Lazy::new(|| {
    vec![
        (DateFixtures::date(2024, 1, 1), DateFixtures::date(2024, 1, 31)),
        (DateFixtures::date(2024, 2, 1), DateFixtures::date(2024, 2, 29)),
        (DateFixtures::date(2024, 3, 1), DateFixtures::date(2024, 3, 31)),
    ]
});

/// Fixture for calendar dates
pub struct DateFixtures;

impl DateFixtures {
    /// Builds a date, panicking on an impossible one
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap_or_else(|| panic!("invalid fixture date {year}-{month}-{day}"))
    }

    pub fn term_start() -> NaiveDate {
        Self::date(2024, 1, 1)
    }

    pub fn term_end() -> NaiveDate {
        Self::date(2024, 3, 31)
    }

    /// Falls in the half-ratio part of January
    pub fn late_january() -> NaiveDate {
        Self::date(2024, 1, 20)
    }

    pub fn mid_february() -> NaiveDate {
        Self::date(2024, 2, 10)
    }

    pub fn march_first() -> NaiveDate {
        Self::date(2024, 3, 1)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn student_id() -> StudentId {
        StudentId::new()
    }

    pub fn location_id() -> LocationId {
        LocationId::new()
    }
}

/// Fixture for generated names
pub struct NameFixtures;

impl NameFixtures {
    pub fn student_name() -> String {
        Name().fake()
    }

    pub fn course_name() -> String {
        let word: String = Word().fake();
        format!("{} course", word)
    }

    pub fn product_name() -> String {
        let word: String = Word().fake();
        format!("{} package", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_months_are_contiguous() {
        for pair in TERM_MONTHS.windows(2) {
            assert_eq!(pair[0].1.succ_opt(), Some(pair[1].0));
        }
        assert_eq!(TERM_MONTHS[0].0, DateFixtures::term_start());
        assert_eq!(TERM_MONTHS[2].1, DateFixtures::term_end());
    }

    #[test]
    fn test_generated_names_are_not_empty() {
        assert!(!NameFixtures::student_name().is_empty());
        assert!(NameFixtures::course_name().ends_with("course"));
    }
}
