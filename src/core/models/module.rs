//! Module model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StudyYear;
use crate::calendar::{academic_year_string, TeachingPattern};
use crate::{Error, Result};

/// Allowed module sizes
pub const CREDIT_OPTIONS: [u32; 4] = [10, 20, 30, 40];

/// Allowed values of [`Module::eligible`]: the stages that may take a module
pub const ELIGIBLE_OPTIONS: [(&str, &str); 8] = [
    ("1", "Year 1 only"),
    ("2", "Year 2 only"),
    ("3", "Year 3 only"),
    ("7", "Masters Students only"),
    ("8", "PhD Students only"),
    ("123", "All years"),
    ("12", "Years 1 and 2"),
    ("23", "Years 2 and 3"),
];

/// A taught unit in one academic year, e.g. "Law of Contract (2014/15)"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Module code without spaces; unique together with `year`
    pub code: String,
    /// Academic year the module runs in
    pub year: i32,
    /// Display title
    pub title: String,
    /// Subject area slugs the module is open to
    pub subject_areas: Vec<String>,
    /// Foundational subject of the qualifying law degree
    pub foundational: bool,
    /// Required for the paralegal qualification
    pub nalp: bool,
    /// Credit value
    pub credits: u32,
    /// Stage digits allowed to take the module, see [`ELIGIBLE_OPTIONS`]
    pub eligible: String,
    /// Week of the first seminar
    pub first_session: Option<u32>,
    /// Week of the last seminar
    pub last_session: Option<u32>,
    /// Weeks without teaching, comma separated
    pub no_teaching_in: Option<String>,
    /// Usernames of the teaching staff
    pub teachers: Vec<String>,
}

impl Module {
    /// Create a 20 credit first year module taught in weeks 5 to 15
    #[must_use]
    pub fn new(title: &str, code: &str, year: i32) -> Self {
        Self {
            id: None,
            code: normalize_code(code),
            year,
            title: title.trim().to_string(),
            subject_areas: Vec::new(),
            foundational: false,
            nalp: false,
            credits: 20,
            eligible: "1".to_string(),
            first_session: Some(5),
            last_session: Some(15),
            no_teaching_in: None,
            teachers: Vec::new(),
        }
    }

    /// Check credit value and eligibility string
    ///
    /// # Errors
    /// Returns [`Error::Invalid`] for values outside the allowed options.
    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(Error::invalid("code", "module code cannot be empty"));
        }
        if !CREDIT_OPTIONS.contains(&self.credits) {
            return Err(Error::invalid(
                "credits",
                format!("{} is not one of 10, 20, 30, 40", self.credits),
            ));
        }
        if !ELIGIBLE_OPTIONS.iter().any(|(code, _)| *code == self.eligible) {
            return Err(Error::invalid(
                "eligible",
                format!("'{}' is not a valid year combination", self.eligible),
            ));
        }
        if let (Some(first), Some(last)) = (self.first_session, self.last_session) {
            if first > last {
                return Err(Error::invalid(
                    "sessions",
                    format!("first session {first} is after last session {last}"),
                ));
            }
        }
        Ok(())
    }

    /// Whether students in `year` may take this module
    #[must_use]
    pub fn is_open_to(&self, year: StudyYear) -> bool {
        let digit = year.code().to_string();
        self.eligible.contains(&digit)
    }

    /// Teaching weeks from the first to the last session, skipping the
    /// weeks listed in `no_teaching_in`
    #[must_use]
    pub fn all_teaching_weeks(&self) -> Vec<u32> {
        let (Some(first), Some(last)) = (self.first_session, self.last_session) else {
            return Vec::new();
        };
        let skipped: Vec<u32> = self
            .no_teaching_in
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|week| week.trim().parse().ok())
            .collect();
        (first..=last).filter(|week| !skipped.contains(week)).collect()
    }

    /// Copy session weeks from a preset
    pub fn apply_pattern(&mut self, pattern: &TeachingPattern) {
        self.first_session = Some(pattern.first_session);
        self.last_session = Some(pattern.last_session);
        self.no_teaching_in = Some(pattern.no_teaching_in.to_string());
    }

    /// "CODE/YEAR", used in messages
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.code, self.year)
    }
}

impl fmt::Display for Module {
    /// "Title (2014/15)"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, academic_year_string(self.year))
    }
}

/// Module codes are stored without spaces
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}
