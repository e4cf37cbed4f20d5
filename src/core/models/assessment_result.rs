//! Assessment result model
//!
//! One row per student and assessment holding every attempt: the first
//! mark, a resit, a second resit and a QLD resit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which sitting of an assessment a mark belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attempt {
    /// First sitting
    First,
    /// First resit
    Resit,
    /// Second resit
    SecondResit,
    /// Resit required to keep the qualifying law degree
    QldResit,
}

impl Attempt {
    /// All attempts in order
    pub const ALL: [Self; 4] = [Self::First, Self::Resit, Self::SecondResit, Self::QldResit];

    /// Identifier stored in the database
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Resit => "resit",
            Self::SecondResit => "second_resit",
            Self::QldResit => "qld_resit",
        }
    }

    /// Label for listings
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "First Attempt",
            Self::Resit => "First Resit",
            Self::SecondResit => "Second Resit",
            Self::QldResit => "QLD Resit",
        }
    }
}

impl FromStr for Attempt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|a| a.code() == wanted)
            .ok_or_else(|| format!("Unknown attempt: '{s}'"))
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// State of a mitigating circumstances claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Concession {
    /// No concession
    #[default]
    None,
    /// Concession applied for, not yet decided
    Pending,
    /// Concession granted: the next sitting counts as a first attempt
    Granted,
}

impl Concession {
    /// One letter code stored in the database
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::None => 'N',
            Self::Pending => 'P',
            Self::Granted => 'G',
        }
    }

    /// Inverse of [`code`](Self::code); unknown letters mean no concession
    #[must_use]
    pub const fn from_code(code: char) -> Self {
        match code {
            'P' | 'p' => Self::Pending,
            'G' | 'g' => Self::Granted,
            _ => Self::None,
        }
    }

    /// Granted or pending
    #[must_use]
    pub const fn is_claimed(self) -> bool {
        matches!(self, Self::Pending | Self::Granted)
    }

    /// Label for listings
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "No Concession",
            Self::Pending => "Concession Pending",
            Self::Granted => "Concession Granted",
        }
    }
}

impl FromStr for Concession {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "none" => Ok(Self::None),
            "p" | "pending" => Ok(Self::Pending),
            "g" | "granted" => Ok(Self::Granted),
            other => Err(format!("Unknown concession: '{other}'")),
        }
    }
}

/// A student's marks in one assessment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Owning performance
    pub performance_id: i64,
    /// Assessment marked
    pub assessment_id: i64,
    /// First attempt
    pub mark: Option<i32>,
    /// First resit
    pub resit_mark: Option<i32>,
    /// Second resit
    pub second_resit_mark: Option<i32>,
    /// QLD resit
    pub qld_resit: Option<i32>,
    /// Concession on the first attempt
    pub concessions: Concession,
    /// Concession on the resits
    pub second_concessions: Concession,
    /// Group number for the first attempt
    pub assessment_group: Option<i32>,
    /// Group number for the resit
    pub resit_assessment_group: Option<i32>,
    /// When a mark last changed
    pub last_modified: Option<NaiveDateTime>,
}

/// Present and non-zero
const fn given(mark: Option<i32>) -> Option<i32> {
    match mark {
        Some(0) | None => None,
        other => other,
    }
}

impl AssessmentResult {
    /// Empty result linking a performance and an assessment
    #[must_use]
    pub fn new(performance_id: i64, assessment_id: i64) -> Self {
        Self {
            performance_id,
            assessment_id,
            ..Self::default()
        }
    }

    /// Mark counted towards the module average
    ///
    /// The first mark (0 when missing), raised by the resit, and only when
    /// there is a resit also raised by the second resit.
    #[must_use]
    pub fn result(&self) -> i32 {
        let mut result = self.mark.unwrap_or(0);
        if let Some(resit) = given(self.resit_mark) {
            result = result.max(resit);
            if let Some(second) = given(self.second_resit_mark) {
                result = result.max(second);
            }
        }
        result
    }

    /// Mark of one attempt
    #[must_use]
    pub const fn get_mark(&self, attempt: Attempt) -> Option<i32> {
        match attempt {
            Attempt::First => self.mark,
            Attempt::Resit => self.resit_mark,
            Attempt::SecondResit => self.second_resit_mark,
            Attempt::QldResit => self.qld_resit,
        }
    }

    /// Store the mark of one attempt
    ///
    /// `last_modified` is set to `now` only when the value changes.
    /// Returns whether it changed.
    pub fn set_mark(&mut self, attempt: Attempt, mark: Option<i32>, now: NaiveDateTime) -> bool {
        let slot = match attempt {
            Attempt::First => &mut self.mark,
            Attempt::Resit => &mut self.resit_mark,
            Attempt::SecondResit => &mut self.second_resit_mark,
            Attempt::QldResit => &mut self.qld_resit,
        };
        if *slot == mark {
            return false;
        }
        *slot = mark;
        self.last_modified = Some(now);
        true
    }

    /// Concession for an attempt; all resits share the second concession
    #[must_use]
    pub const fn concession(&self, attempt: Attempt) -> Concession {
        match attempt {
            Attempt::First => self.concessions,
            _ => self.second_concessions,
        }
    }

    /// Set the concession for an attempt
    pub fn set_concession(&mut self, attempt: Attempt, concession: Concession) {
        match attempt {
            Attempt::First => self.concessions = concession,
            _ => self.second_concessions = concession,
        }
    }

    /// Group number for an attempt (only first and resit carry groups)
    #[must_use]
    pub const fn group(&self, attempt: Attempt) -> Option<i32> {
        match attempt {
            Attempt::First => self.assessment_group,
            Attempt::Resit => self.resit_assessment_group,
            _ => None,
        }
    }

    /// Assign a group for the first attempt or the resit
    pub fn set_group(&mut self, attempt: Attempt, group: Option<i32>) {
        match attempt {
            Attempt::First => self.assessment_group = group,
            Attempt::Resit => self.resit_assessment_group = group,
            _ => {}
        }
    }

    /// First mark with the later attempts in brackets
    ///
    /// "35 (Submission: 38, Second Resubmission: 40)". A granted concession
    /// turns a resubmission into a submission; exams say "Sit"/"Resit".
    /// `None` while there is no first mark.
    #[must_use]
    pub fn result_as_string(&self, is_exam: bool) -> Option<String> {
        let resit_kind = |concession: Concession| match (concession, is_exam) {
            (Concession::Granted, true) => "Sit",
            (Concession::Granted, false) => "Submission",
            (_, true) => "Resit",
            (_, false) => "Resubmission",
        };

        let mark = self.mark?;
        let mut extra = Vec::new();
        if let Some(resit) = given(self.resit_mark) {
            extra.push(format!("{}: {resit}", resit_kind(self.concessions)));
            if let Some(second) = given(self.second_resit_mark) {
                extra.push(format!(
                    "Second {}: {second}",
                    resit_kind(self.second_concessions)
                ));
            }
        }
        if let Some(qld) = given(self.qld_resit) {
            extra.push(format!("QLD Resit: {qld}"));
        }

        if extra.is_empty() {
            Some(mark.to_string())
        } else {
            Some(format!("{mark} ({})", extra.join(", ")))
        }
    }

    /// Whether the assessment has been passed for QLD purposes
    ///
    /// Uses a strict "above the pass mark" test on the first mark, then the
    /// resit, then the second resit if there is one, otherwise the QLD resit.
    #[must_use]
    pub fn no_qld_problems(&self, pass_mark: i32) -> bool {
        let Some(mark) = given(self.mark) else {
            return false;
        };
        if mark > pass_mark || given(self.resit_mark).is_some_and(|m| m > pass_mark) {
            return true;
        }
        given(self.second_resit_mark).map_or_else(
            || given(self.qld_resit).is_some_and(|m| m > pass_mark),
            |second| second > pass_mark,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PASS: i32 = 40;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn result(mark: Option<i32>, resit: Option<i32>, second: Option<i32>) -> AssessmentResult {
        AssessmentResult {
            mark,
            resit_mark: resit,
            second_resit_mark: second,
            ..AssessmentResult::new(1, 1)
        }
    }

    #[test]
    fn test_result_takes_best_attempt() {
        assert_eq!(result(Some(35), None, None).result(), 35);
        assert_eq!(result(Some(35), Some(45), None).result(), 45);
        assert_eq!(result(Some(50), Some(45), None).result(), 50);
        assert_eq!(result(Some(30), Some(35), Some(42)).result(), 42);
        assert_eq!(result(None, None, None).result(), 0);
    }

    #[test]
    fn test_second_resit_only_counts_after_a_resit() {
        assert_eq!(result(Some(30), None, Some(60)).result(), 30);
    }

    #[test]
    fn test_result_as_string_with_granted_concession() {
        let mut r = result(Some(35), Some(38), Some(40));
        r.concessions = Concession::Granted;
        assert_eq!(
            r.result_as_string(false).as_deref(),
            Some("35 (Submission: 38, Second Resubmission: 40)")
        );
    }

    #[test]
    fn test_result_as_string_without_concession() {
        let r = result(Some(30), Some(35), Some(38));
        assert_eq!(
            r.result_as_string(false).as_deref(),
            Some("30 (Resubmission: 35, Second Resubmission: 38)")
        );
    }

    #[test]
    fn test_result_as_string_for_exams_and_qld() {
        let mut r = result(Some(30), Some(35), None);
        r.second_concessions = Concession::Granted;
        r.qld_resit = Some(45);
        assert_eq!(
            r.result_as_string(true).as_deref(),
            Some("30 (Resit: 35, QLD Resit: 45)")
        );
        assert_eq!(result(Some(55), None, None).result_as_string(true).as_deref(), Some("55"));
        assert_eq!(result(None, Some(50), None).result_as_string(false), None);
    }

    #[test]
    fn test_no_qld_problems() {
        assert!(result(Some(38), Some(42), None).no_qld_problems(PASS));
        assert!(!result(Some(38), Some(36), None).no_qld_problems(PASS));

        let mut with_second = result(Some(38), Some(35), Some(33));
        with_second.qld_resit = Some(45);
        assert!(!with_second.no_qld_problems(PASS));

        let mut qld_only = result(Some(38), Some(35), None);
        qld_only.qld_resit = Some(45);
        assert!(qld_only.no_qld_problems(PASS));

        assert!(!result(Some(40), None, None).no_qld_problems(PASS));
        assert!(!result(None, None, None).no_qld_problems(PASS));
    }

    #[test]
    fn test_set_mark_only_touches_timestamp_on_change() {
        let mut r = AssessmentResult::new(1, 1);
        assert!(r.set_mark(Attempt::First, Some(50), at(9)));
        assert_eq!(r.last_modified, Some(at(9)));
        assert!(!r.set_mark(Attempt::First, Some(50), at(10)));
        assert_eq!(r.last_modified, Some(at(9)));
        assert!(r.set_mark(Attempt::QldResit, Some(45), at(11)));
        assert_eq!(r.get_mark(Attempt::QldResit), Some(45));
        assert_eq!(r.last_modified, Some(at(11)));
    }

    #[test]
    fn test_concessions_per_attempt() {
        let mut r = AssessmentResult::new(1, 1);
        r.set_concession(Attempt::First, Concession::Granted);
        r.set_concession(Attempt::SecondResit, Concession::Pending);
        assert_eq!(r.concession(Attempt::First), Concession::Granted);
        assert_eq!(r.concession(Attempt::Resit), Concession::Pending);
        assert!(r.concession(Attempt::First).is_claimed());
    }

    #[test]
    fn test_groups_per_attempt() {
        let mut r = AssessmentResult::new(1, 1);
        r.set_group(Attempt::First, Some(2));
        r.set_group(Attempt::Resit, Some(1));
        r.set_group(Attempt::QldResit, Some(9));
        assert_eq!(r.group(Attempt::First), Some(2));
        assert_eq!(r.group(Attempt::Resit), Some(1));
        assert_eq!(r.group(Attempt::QldResit), None);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!("second-resit".parse::<Attempt>(), Ok(Attempt::SecondResit));
        assert_eq!("G".parse::<Concession>(), Ok(Concession::Granted));
        assert_eq!(Concession::from_code('P'), Concession::Pending);
        assert_eq!(Concession::from_code('x'), Concession::None);
        assert!("maybe".parse::<Concession>().is_err());
    }
}
