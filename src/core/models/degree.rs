//! Degree classification awarded to a leaving student

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final award recorded against a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degree {
    /// First class honours
    First,
    /// Upper second (2:1)
    UpperSecond,
    /// Lower second (2:2)
    LowerSecond,
    /// Third class honours
    Third,
    /// Failed
    Fail,
    /// Ordinary degree without honours
    Ordinary,
    /// Diploma of Higher Education
    DipHe,
    /// Certificate of Higher Education
    CertHe,
    /// Left without an award
    NoDegree,
}

impl Degree {
    /// All awards in code order
    pub const ALL: [Self; 9] = [
        Self::First,
        Self::UpperSecond,
        Self::LowerSecond,
        Self::Third,
        Self::Fail,
        Self::Ordinary,
        Self::DipHe,
        Self::CertHe,
        Self::NoDegree,
    ];

    /// Numeric code stored in the database
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::First => 1,
            Self::UpperSecond => 21,
            Self::LowerSecond => 22,
            Self::Third => 3,
            Self::Fail => 4,
            Self::Ordinary => 5,
            Self::DipHe => 6,
            Self::CertHe => 7,
            Self::NoDegree => 8,
        }
    }

    /// Inverse of [`code`](Self::code)
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::UpperSecond => "2:1",
            Self::LowerSecond => "2:2",
            Self::Third => "3rd",
            Self::Fail => "Fail",
            Self::Ordinary => "Ord. Degree",
            Self::DipHe => "Dip HE",
            Self::CertHe => "Cert HE",
            Self::NoDegree => "No Degree",
        }
    }

    /// Honours class for a final credit-weighted average, `None` below `pass_mark`
    #[must_use]
    pub const fn classify(average: i32, pass_mark: i32) -> Option<Self> {
        if average >= 70 {
            Some(Self::First)
        } else if average >= 60 {
            Some(Self::UpperSecond)
        } else if average >= 50 {
            Some(Self::LowerSecond)
        } else if average >= pass_mark {
            Some(Self::Third)
        } else {
            None
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for degree in Degree::ALL {
            assert_eq!(Degree::from_code(degree.code()), Some(degree));
        }
        assert_eq!(Degree::from_code(2), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(Degree::classify(72, 40), Some(Degree::First));
        assert_eq!(Degree::classify(60, 40), Some(Degree::UpperSecond));
        assert_eq!(Degree::classify(59, 40), Some(Degree::LowerSecond));
        assert_eq!(Degree::classify(40, 40), Some(Degree::Third));
        assert_eq!(Degree::classify(39, 40), None);
    }
}
