//! Marksheet types and their marking categories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marking bands for non-free categories: the value stored and its label
pub const MARK_BANDS: [(i32, &str); 6] = [
    (39, "0 - 39 %"),
    (49, "40 - 49 %"),
    (59, "50 - 59 %"),
    (69, "60 - 69 %"),
    (79, "70 - 79 %"),
    (80, "80 or more"),
];

/// One row on a marksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Heading printed on the marksheet
    pub title: &'static str,
    /// Whether any mark may be entered instead of a band
    pub free: bool,
}

const fn banded(title: &'static str) -> Category {
    Category { title, free: false }
}

const fn free(title: &'static str) -> Category {
    Category { title, free: true }
}

const PRESENTATION: [Category; 3] = [
    banded("Understanding, Analysis and Content"),
    banded("Organisation and Application"),
    banded("Delivery (including visual aid), Timing and Planning"),
];

const ESSAY: [Category; 4] = [
    banded("Knowledge and Understanding"),
    banded("Analysis"),
    banded("Argument"),
    banded("Presentation and Organisation"),
];

const LEGAL_PROBLEM: [Category; 4] = [
    banded("Issue Identification"),
    banded("Rule Identification"),
    banded("Analysis and Application of Law"),
    banded("Structure and Presentation"),
];

const MEDIATION_ROLE_PLAY: [Category; 3] = [
    free("Relationship Skills"),
    free("Process Knowledge"),
    free("Teamwork"),
];

const GROUP_PRESENTATION_GROUP: [Category; 2] = [
    banded("Structure and Organisation"),
    banded("Delivery and Supporting Material"),
];

/// Layout of a marksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarksheetType {
    /// Individual oral presentation
    Presentation,
    /// Essay
    Essay,
    /// Problem question
    LegalProblem,
    /// Mediation role-play, marked freely
    MediationRolePlay,
    /// Group presentation with individual and group categories
    GroupPresentation,
}

impl MarksheetType {
    /// All marksheets in listing order
    pub const ALL: [Self; 5] = [
        Self::Presentation,
        Self::Essay,
        Self::LegalProblem,
        Self::MediationRolePlay,
        Self::GroupPresentation,
    ];

    /// Identifier stored in the database
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Presentation => "PRESENTATION",
            Self::Essay => "ESSAY",
            Self::LegalProblem => "LEGAL_PROBLEM",
            Self::MediationRolePlay => "MEDIATION_ROLE_PLAY",
            Self::GroupPresentation => "GROUP_PRESENTATION",
        }
    }

    /// Heading of the marksheet
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Presentation => "Oral Presentation",
            Self::Essay => "Essay",
            Self::LegalProblem => "Legal Problem",
            Self::MediationRolePlay => "Mediation Role-Play",
            Self::GroupPresentation => "Group Presentation",
        }
    }

    /// Categories marked for each student
    #[must_use]
    pub const fn categories(self) -> &'static [Category] {
        match self {
            Self::Presentation | Self::GroupPresentation => &PRESENTATION,
            Self::Essay => &ESSAY,
            Self::LegalProblem => &LEGAL_PROBLEM,
            Self::MediationRolePlay => &MEDIATION_ROLE_PLAY,
        }
    }

    /// Categories marked once for the whole group
    #[must_use]
    pub const fn group_categories(self) -> &'static [Category] {
        match self {
            Self::GroupPresentation => &GROUP_PRESENTATION_GROUP,
            _ => &[],
        }
    }

    /// `(group weight, individual weight)` in percent for group marksheets
    #[must_use]
    pub const fn split(self) -> Option<(u32, u32)> {
        match self {
            Self::GroupPresentation => Some((10, 90)),
            _ => None,
        }
    }

    /// Whether the marksheet is filled in per group
    #[must_use]
    pub const fn is_group(self) -> bool {
        self.split().is_some()
    }

    /// Individual category by 1-based number
    #[must_use]
    pub fn category(self, number: u8) -> Option<&'static Category> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|index| self.categories().get(index))
    }

    /// Group category by 1-based number
    #[must_use]
    pub fn group_category(self, number: u8) -> Option<&'static Category> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|index| self.group_categories().get(index))
    }
}

impl FromStr for MarksheetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|m| m.code() == wanted)
            .ok_or_else(|| format!("Unknown marksheet type: '{s}'"))
    }
}

impl fmt::Display for MarksheetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Whether `mark` is a band value
#[must_use]
pub fn is_band(mark: i32) -> bool {
    MARK_BANDS.iter().any(|(value, _)| *value == mark)
}

/// Band value a free mark falls into
#[must_use]
pub const fn band_for(mark: i32) -> i32 {
    match mark {
        i32::MIN..=39 => 39,
        40..=49 => 49,
        50..=59 => 59,
        60..=69 => 69,
        70..=79 => 79,
        _ => 80,
    }
}

/// Label of the band containing `mark`
#[must_use]
pub fn band_label(mark: i32) -> &'static str {
    let band = band_for(mark);
    MARK_BANDS
        .iter()
        .find(|(value, _)| *value == band)
        .map_or("", |(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_counts() {
        assert_eq!(MarksheetType::Presentation.categories().len(), 3);
        assert_eq!(MarksheetType::Essay.categories().len(), 4);
        assert_eq!(MarksheetType::LegalProblem.categories().len(), 4);
        assert_eq!(MarksheetType::MediationRolePlay.categories().len(), 3);
        assert_eq!(MarksheetType::GroupPresentation.categories().len(), 3);
        assert_eq!(MarksheetType::GroupPresentation.group_categories().len(), 2);
        assert!(MarksheetType::Essay.group_categories().is_empty());
    }

    #[test]
    fn test_only_mediation_is_free() {
        for marksheet in MarksheetType::ALL {
            let free = marksheet.categories().iter().all(|c| c.free);
            assert_eq!(free, marksheet == MarksheetType::MediationRolePlay);
        }
    }

    #[test]
    fn test_category_lookup_is_one_based() {
        let essay = MarksheetType::Essay;
        assert_eq!(essay.category(1).map(|c| c.title), Some("Knowledge and Understanding"));
        assert_eq!(essay.category(4).map(|c| c.title), Some("Presentation and Organisation"));
        assert!(essay.category(0).is_none());
        assert!(essay.category(5).is_none());
    }

    #[test]
    fn test_parse_marksheet_type() {
        assert_eq!("essay".parse::<MarksheetType>(), Ok(MarksheetType::Essay));
        assert_eq!(
            "legal-problem".parse::<MarksheetType>(),
            Ok(MarksheetType::LegalProblem)
        );
        assert_eq!(
            "GROUP_PRESENTATION".parse::<MarksheetType>(),
            Ok(MarksheetType::GroupPresentation)
        );
        assert!("poem".parse::<MarksheetType>().is_err());
    }

    #[test]
    fn test_group_split_puts_group_weight_first() {
        assert_eq!(MarksheetType::GroupPresentation.split(), Some((10, 90)));
        assert!(MarksheetType::GroupPresentation.is_group());
        assert_eq!(MarksheetType::LegalProblem.split(), None);
    }

    #[test]
    fn test_bands() {
        assert!(is_band(59));
        assert!(!is_band(55));
        assert_eq!(band_for(12), 39);
        assert_eq!(band_for(40), 49);
        assert_eq!(band_for(79), 79);
        assert_eq!(band_for(95), 80);
        assert_eq!(band_label(64), "60 - 69 %");
    }
}
