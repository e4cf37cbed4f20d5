//! Seminar attendance
//!
//! Attendance is kept per performance as `week:status` pairs joined by `/`,
//! e.g. `5:p/6:a/7:e`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attendance status for one week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    /// Attended
    Present,
    /// Missed without excuse
    Absent,
    /// Missed with an accepted excuse, counted as present
    Excused,
}

impl Presence {
    /// One letter code
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Present => 'p',
            Self::Absent => 'a',
            Self::Excused => 'e',
        }
    }

    /// Counted as attended
    #[must_use]
    pub const fn counts_as_present(self) -> bool {
        matches!(self, Self::Present | Self::Excused)
    }
}

impl FromStr for Presence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "present" => Ok(Self::Present),
            "a" | "absent" => Ok(Self::Absent),
            "e" | "excused" => Ok(Self::Excused),
            other => Err(format!("Unknown attendance status: '{other}'")),
        }
    }
}

/// Attendance record of one student in one module, keyed by teaching week
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attendance {
    weeks: BTreeMap<u32, Presence>,
}

impl Attendance {
    /// Empty record
    #[must_use]
    pub const fn new() -> Self {
        Self {
            weeks: BTreeMap::new(),
        }
    }

    /// Parse the stored form, skipping malformed entries
    #[must_use]
    pub fn parse(stored: &str) -> Self {
        let weeks = stored
            .split('/')
            .filter_map(|entry| {
                let (week, status) = entry.split_once(':')?;
                Some((week.trim().parse().ok()?, status.parse().ok()?))
            })
            .collect();
        Self { weeks }
    }

    /// Status recorded for `week`
    #[must_use]
    pub fn for_week(&self, week: u32) -> Option<Presence> {
        self.weeks.get(&week).copied()
    }

    /// Record or overwrite the status for `week`
    pub fn record(&mut self, week: u32, presence: Presence) {
        self.weeks.insert(week, presence);
    }

    /// Forget the entry for `week`
    pub fn clear(&mut self, week: u32) {
        self.weeks.remove(&week);
    }

    /// Statuses in week order
    #[must_use]
    pub fn as_list(&self) -> Vec<Presence> {
        self.weeks.values().copied().collect()
    }

    /// Weeks with a recorded status, ascending
    #[must_use]
    pub fn weeks(&self) -> Vec<u32> {
        self.weeks.keys().copied().collect()
    }

    /// `(attended, recorded)` counting excused absences as attended
    #[must_use]
    pub fn totals(&self) -> (usize, usize) {
        let present = self
            .weeks
            .values()
            .filter(|p| p.counts_as_present())
            .count();
        (present, self.weeks.len())
    }

    /// "attended/recorded", e.g. "6/9"
    #[must_use]
    pub fn count(&self) -> String {
        let (present, total) = self.totals();
        format!("{present}/{total}")
    }

    /// Whether the two most recent recorded weeks were unexcused absences
    #[must_use]
    pub fn missed_the_last_two_sessions(&self) -> bool {
        let mut latest = self.weeks.values().rev();
        matches!(
            (latest.next(), latest.next()),
            (Some(Presence::Absent), Some(Presence::Absent))
        )
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

impl fmt::Display for Attendance {
    /// Stored form, weeks ascending
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (week, presence) in &self.weeks {
            if !first {
                f.write_str("/")?;
            }
            first = false;
            write!(f, "{week}:{}", presence.code())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read_back() {
        let mut attendance = Attendance::new();
        attendance.record(5, Presence::Present);
        attendance.record(6, Presence::Absent);
        attendance.record(5, Presence::Excused);
        assert_eq!(attendance.for_week(5), Some(Presence::Excused));
        assert_eq!(attendance.for_week(6), Some(Presence::Absent));
        assert_eq!(attendance.for_week(7), None);
        assert_eq!(attendance.to_string(), "5:e/6:a");
    }

    #[test]
    fn test_parse_stored_form() {
        let attendance = Attendance::parse("1:p/2:a/3:e/junk/4:x");
        assert_eq!(attendance.count(), "2/3");
        assert_eq!(Attendance::parse("").count(), "0/0");
        assert_eq!(Attendance::parse("7:p").for_week(7), Some(Presence::Present));
    }

    #[test]
    fn test_count_attendance() {
        let attendance = Attendance::parse("1:p/2:p/3:a/4:e/5:p/6:a/7:p/8:p/9:a");
        assert_eq!(attendance.count(), "6/9");
    }

    #[test]
    fn test_list_is_sorted_numerically() {
        let attendance = Attendance::parse("10:a/2:p/9:e");
        assert_eq!(
            attendance.as_list(),
            vec![Presence::Present, Presence::Excused, Presence::Absent]
        );
        assert_eq!(attendance.weeks(), vec![2, 9, 10]);
    }

    #[test]
    fn test_missed_the_last_two_sessions() {
        assert!(Attendance::parse("1:p/2:a/3:a").missed_the_last_two_sessions());
        assert!(!Attendance::parse("1:a/2:a/3:p").missed_the_last_two_sessions());
        assert!(!Attendance::parse("1:p/2:a/3:e").missed_the_last_two_sessions());
        assert!(!Attendance::parse("3:a").missed_the_last_two_sessions());
        assert!(Attendance::parse("12:a/9:a/2:p").missed_the_last_two_sessions());
    }
}
