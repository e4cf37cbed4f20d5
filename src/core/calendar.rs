//! Academic calendar helpers
//!
//! An academic year is named after the calendar year in which it starts and
//! runs from September to August. Week 1 begins on the first Monday of
//! September.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Month in which a new academic year begins
const FIRST_MONTH: u32 = 9;

/// The academic year `today` falls into
#[must_use]
pub fn this_year(today: NaiveDate) -> i32 {
    if today.month() < FIRST_MONTH {
        today.year() - 1
    } else {
        today.year()
    }
}

/// The academic year of the local clock
#[must_use]
pub fn current_academic_year() -> i32 {
    this_year(chrono::Local::now().date_naive())
}

/// "2013/14" for 2013
#[must_use]
pub fn academic_year_string(year: i32) -> String {
    format!("{year}/{:02}", (year + 1).rem_euclid(100))
}

/// Monday of teaching week 1 in the given academic year
#[must_use]
pub fn first_week_starts(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, FIRST_MONTH, Weekday::Mon, 1)
}

/// Monday on which `week` of academic `year` begins
#[must_use]
pub fn week_starting_date(week: u32, year: i32) -> Option<NaiveDate> {
    let offset = u64::from(week.checked_sub(1)?) * 7;
    first_week_starts(year)?.checked_add_days(Days::new(offset))
}

/// Teaching week that contains `date`, or `None` before week 1
#[must_use]
pub fn week_number(date: NaiveDate, year: i32) -> Option<u32> {
    let start = first_week_starts(year)?;
    let days = (date - start).num_days();
    if days < 0 {
        return None;
    }
    u32::try_from(days / 7 + 1).ok()
}

/// A named pattern of teaching weeks that can be applied to a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeachingPattern {
    /// Short label
    pub name: &'static str,
    /// Week of the first seminar
    pub first_session: u32,
    /// Week of the last seminar
    pub last_session: u32,
    /// Weeks without teaching, comma separated
    pub no_teaching_in: &'static str,
}

/// Teaching week layouts in common use
pub const TEACHING_PATTERNS: [TeachingPattern; 4] = [
    TeachingPattern {
        name: "Short/Fat, term 1",
        first_session: 5,
        last_session: 15,
        no_teaching_in: "9",
    },
    TeachingPattern {
        name: "Short/Fat, term 2",
        first_session: 19,
        last_session: 29,
        no_teaching_in: "25",
    },
    TeachingPattern {
        name: "Long/Thin, even weeks",
        first_session: 6,
        last_session: 28,
        no_teaching_in: "7,9,11,13,15,16,17,18,19,21,23,25,27",
    },
    TeachingPattern {
        name: "Long/Thin, odd weeks",
        first_session: 5,
        last_session: 29,
        no_teaching_in: "6,8,10,12,14,16,17,18,19,20,22,24,26,28",
    },
];

/// Look up a pattern by its 1-based position in [`TEACHING_PATTERNS`]
#[must_use]
pub fn teaching_pattern(number: usize) -> Option<&'static TeachingPattern> {
    number
        .checked_sub(1)
        .and_then(|index| TEACHING_PATTERNS.get(index))
}
