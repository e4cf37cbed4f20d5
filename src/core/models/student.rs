//! Student model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Degree;

/// Stage of study
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StudyYear {
    /// First undergraduate year
    First,
    /// Second undergraduate year
    Second,
    /// Final undergraduate year
    Third,
    /// Masters student
    Masters,
    /// Doctoral student
    Phd,
    /// Left the university
    Alumni,
}

impl StudyYear {
    /// All stages in code order
    pub const ALL: [Self; 6] = [
        Self::First,
        Self::Second,
        Self::Third,
        Self::Masters,
        Self::Phd,
        Self::Alumni,
    ];

    /// Numeric code stored in the database (1, 2, 3, 7, 8, 9)
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Masters => 7,
            Self::Phd => 8,
            Self::Alumni => 9,
        }
    }

    /// Inverse of [`code`](Self::code)
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|y| y.code() == code)
    }

    /// The stage a student moves to after passing this one
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::First => Some(Self::Second),
            Self::Second => Some(Self::Third),
            _ => None,
        }
    }

    /// Whether students in this stage finish their degree at the end of it
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Third | Self::Masters | Self::Phd)
    }

    /// Label used in listings
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
            Self::Third => "3",
            Self::Masters => "Masters",
            Self::Phd => "PhD",
            Self::Alumni => "Alumni",
        }
    }
}

impl fmt::Display for StudyYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decision of the progression board for the coming year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextYear {
    /// Pass and proceed
    Proceed,
    /// Pass and proceed with QLD resit(s) outstanding
    ProceedQld,
    /// Proceed and trail the failed modules
    ProceedTrailing,
    /// Pass and proceed with compensation
    ProceedCompensated,
    /// Repeat the year or the failed modules
    Repeat,
    /// Repeat, absent subject to judgement
    RepeatAbsj,
    /// Graduate with the given honours class
    Graduate(Degree),
    /// Leave with a Certificate of Higher Education
    CertHe,
    /// Leave with a Diploma of Higher Education
    DipHe,
    /// Leave with an Ordinary degree
    Ordinary,
    /// Withdraw without an award
    Withdraw,
}

impl NextYear {
    /// Every board decision in listing order
    pub const ALL: [Self; 14] = [
        Self::Proceed,
        Self::ProceedQld,
        Self::ProceedTrailing,
        Self::ProceedCompensated,
        Self::Repeat,
        Self::RepeatAbsj,
        Self::Graduate(Degree::First),
        Self::Graduate(Degree::UpperSecond),
        Self::Graduate(Degree::LowerSecond),
        Self::Graduate(Degree::Third),
        Self::CertHe,
        Self::DipHe,
        Self::Ordinary,
        Self::Withdraw,
    ];

    /// Short code stored in the database
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Proceed => "PP",
            Self::ProceedQld => "PQ",
            Self::ProceedTrailing => "PT",
            Self::ProceedCompensated => "PC",
            Self::Repeat => "R",
            Self::RepeatAbsj => "ABSJ",
            Self::Graduate(Degree::First) => "1",
            Self::Graduate(Degree::UpperSecond) => "21",
            Self::Graduate(Degree::LowerSecond) => "22",
            Self::Graduate(_) => "3",
            Self::CertHe => "C",
            Self::DipHe => "D",
            Self::Ordinary => "O",
            Self::Withdraw => "WD",
        }
    }

    /// Description shown to the board
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Proceed => "Pass and Proceed",
            Self::ProceedQld => "Pass and Proceed with QLD Resit(s)",
            Self::ProceedTrailing => "Proceed and Trail Failed Module",
            Self::ProceedCompensated => "Pass and Proceed with Compensation",
            Self::Repeat => "Repeat Year or Failed Modules",
            Self::RepeatAbsj => "Repeat ABSJ",
            Self::Graduate(Degree::First) => "Graduate with First",
            Self::Graduate(Degree::UpperSecond) => "Graduate with 2:1",
            Self::Graduate(Degree::LowerSecond) => "Graduate with 2:2",
            Self::Graduate(_) => "Graduate with 3rd",
            Self::CertHe => "Award Certificate of Higher Education",
            Self::DipHe => "Award Diploma of Higher Education",
            Self::Ordinary => "Award Ordinary Degree",
            Self::Withdraw => "Withdrawal with no Award",
        }
    }

    /// Decisions that move the student up one stage
    #[must_use]
    pub const fn proceeds(self) -> bool {
        matches!(
            self,
            Self::Proceed | Self::ProceedQld | Self::ProceedTrailing | Self::ProceedCompensated
        )
    }
}

impl FromStr for NextYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|n| n.code() == code)
            .ok_or_else(|| format!("Unknown next year code: '{s}'"))
    }
}

impl fmt::Display for NextYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.label())
    }
}

/// A student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// University student number, primary key
    pub student_id: String,
    /// All first names
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Anonymous exam number, unique when present
    pub exam_id: Option<String>,
    /// Academic year the student started
    pub since: Option<i32>,
    /// Current stage of study
    pub year: Option<StudyYear>,
    /// Studies part time
    pub is_part_time: bool,
    /// Part-time student in the second half of a stage
    pub second_part_time_year: bool,
    /// University email
    pub email: String,
    /// Programme id
    pub course_id: Option<i64>,
    /// On the qualifying law degree track
    pub qld: bool,
    /// Username of the personal tutor
    pub tutor: Option<String>,
    /// Free text notes, appended to by the progression board
    pub notes: String,
    /// Currently enrolled
    pub active: bool,
    /// Learning support plan
    pub lsp: Option<String>,
    /// Private email that survives graduation
    pub permanent_email: Option<String>,
    /// Term time address, one line per row
    pub address: String,
    /// Landline
    pub phone_number: Option<String>,
    /// Mobile
    pub cell_number: Option<String>,
    /// Home address, one line per row
    pub home_address: String,
    /// On the paralegal pathway
    pub nalp: bool,
    /// Holds a Tier 4 visa
    pub tier_4: bool,
    /// Final award
    pub achieved_degree: Option<Degree>,
    /// Academic year of graduation
    pub graduated_in: Option<i32>,
    /// Pending progression decision
    pub next_year: Option<NextYear>,
}

impl Student {
    /// Create an active QLD-track student with no other details
    #[must_use]
    pub const fn new(student_id: String, first_name: String, last_name: String) -> Self {
        Self {
            student_id,
            first_name,
            last_name,
            exam_id: None,
            since: None,
            year: None,
            is_part_time: false,
            second_part_time_year: false,
            email: String::new(),
            course_id: None,
            qld: true,
            tutor: None,
            notes: String::new(),
            active: true,
            lsp: None,
            permanent_email: None,
            address: String::new(),
            phone_number: None,
            cell_number: None,
            home_address: String::new(),
            nalp: false,
            tier_4: false,
            achieved_degree: None,
            graduated_in: None,
            next_year: None,
        }
    }

    /// First of the first names
    #[must_use]
    pub fn short_first_name(&self) -> &str {
        self.first_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.first_name)
    }

    /// "Last, First" using only the first of the first names
    #[must_use]
    pub fn short_name(&self) -> String {
        format!("{}, {}", self.last_name, self.short_first_name())
    }

    /// "First Last" using only the first of the first names
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.short_first_name(), self.last_name)
    }

    /// Append a line to the notes
    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() && !self.notes.ends_with('\n') {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bugs() -> Student {
        Student::new(
            "bb23".to_string(),
            "Bugs Middle Names".to_string(),
            "Bunny".to_string(),
        )
    }

    #[test]
    fn test_new_student_defaults() {
        let student = bugs();
        assert!(student.active);
        assert!(student.qld);
        assert!(!student.is_part_time);
        assert!(student.year.is_none());
        assert!(student.next_year.is_none());
    }

    #[test]
    fn test_name_variants() {
        let student = bugs();
        assert_eq!(student.short_first_name(), "Bugs");
        assert_eq!(student.short_name(), "Bunny, Bugs");
        assert_eq!(student.name(), "Bugs Bunny");
        assert_eq!(student.to_string(), "Bunny, Bugs Middle Names");
    }

    #[test]
    fn test_add_note_separates_lines() {
        let mut student = bugs();
        student.add_note("First note");
        student.add_note("Second note");
        assert_eq!(student.notes, "First note\nSecond note");
    }

    #[test]
    fn test_study_year_codes() {
        for year in StudyYear::ALL {
            assert_eq!(StudyYear::from_code(year.code()), Some(year));
        }
        assert_eq!(StudyYear::from_code(4), None);
        assert_eq!(StudyYear::First.next(), Some(StudyYear::Second));
        assert_eq!(StudyYear::Third.next(), None);
        assert!(StudyYear::Third.is_final());
        assert!(StudyYear::Masters.is_final());
        assert!(!StudyYear::Second.is_final());
    }

    #[test]
    fn test_next_year_codes_round_trip() {
        for option in NextYear::ALL {
            assert_eq!(option.code().parse::<NextYear>(), Ok(option));
        }
        assert_eq!("pq".parse::<NextYear>(), Ok(NextYear::ProceedQld));
        assert_eq!(
            "21".parse::<NextYear>(),
            Ok(NextYear::Graduate(Degree::UpperSecond))
        );
        assert!("X".parse::<NextYear>().is_err());
    }

    #[test]
    fn test_proceeding_decisions() {
        assert!(NextYear::Proceed.proceeds());
        assert!(NextYear::ProceedCompensated.proceeds());
        assert!(!NextYear::Repeat.proceeds());
        assert!(!NextYear::Graduate(Degree::First).proceeds());
    }
}
