//! Marksheet feedback records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Attempt;
use crate::feedback::{category_average, combine_group_mark, is_band, MarksheetType};
use crate::{Error, Result};

/// Checks a category mark against the marksheet layout
fn check_category_mark(
    marksheet: MarksheetType,
    number: u8,
    mark: i32,
    group: bool,
) -> Result<()> {
    let category = (if group {
        marksheet.group_category(number)
    } else {
        marksheet.category(number)
    })
    .ok_or_else(|| {
        Error::invalid(
            "category",
            format!("{} has no category {number}", marksheet.title()),
        )
    })?;
    if !(0..=100).contains(&mark) || (!category.free && !is_band(mark)) {
        return Err(Error::invalid(
            "category mark",
            format!("{mark} is not valid for '{}'", category.title),
        ));
    }
    Ok(())
}

/// Marksheet for one student's attempt at an assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualFeedback {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Result the marksheet belongs to
    pub result_id: i64,
    /// Attempt marked; unique together with `result_id`
    pub attempt: Attempt,
    /// Mark, submission date and marking date are all recorded
    pub completed: bool,
    /// First marker (staff username)
    pub marker: Option<String>,
    /// Co-marker
    pub second_first_marker: Option<String>,
    /// Moderator
    pub second_marker: Option<String>,
    /// Date of marking
    pub marking_date: Option<NaiveDate>,
    /// Category marks by 1-based category number
    pub category_marks: BTreeMap<u8, i32>,
    /// Penalty applied to the mark
    pub deduction: Option<i32>,
    /// Reason for the penalty
    pub deduction_explanation: String,
    /// Mark for the first part of split assessments
    pub part_1_mark: Option<i32>,
    /// Mark for the second part of split assessments
    pub part_2_mark: Option<i32>,
    /// Date handed in
    pub submission_date: Option<NaiveDate>,
    /// Comments to the student
    pub comments: String,
    /// Further comments
    pub comments_2: String,
}

impl IndividualFeedback {
    /// Empty marksheet
    #[must_use]
    pub const fn new(result_id: i64, attempt: Attempt) -> Self {
        Self {
            id: None,
            result_id,
            attempt,
            completed: false,
            marker: None,
            second_first_marker: None,
            second_marker: None,
            marking_date: None,
            category_marks: BTreeMap::new(),
            deduction: None,
            deduction_explanation: String::new(),
            part_1_mark: None,
            part_2_mark: None,
            submission_date: None,
            comments: String::new(),
            comments_2: String::new(),
        }
    }

    /// Set or clear a category mark
    ///
    /// # Errors
    /// Returns [`Error::Invalid`] for a category the marksheet does not have,
    /// or a mark that is not a band value on a banded category.
    pub fn set_category_mark(
        &mut self,
        marksheet: MarksheetType,
        number: u8,
        mark: Option<i32>,
    ) -> Result<()> {
        match mark {
            Some(mark) => {
                check_category_mark(marksheet, number, mark, false)?;
                self.category_marks.insert(number, mark);
            }
            None => {
                self.category_marks.remove(&number);
            }
        }
        Ok(())
    }

    /// Recompute `completed` from the attempt's mark and the two dates
    pub fn update_completion(&mut self, mark: Option<i32>) {
        self.completed =
            mark.is_some() && self.submission_date.is_some() && self.marking_date.is_some();
    }
}

/// Per-student field on a group marksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndividualPart {
    /// Individual category mark, 1-based
    Category(u8),
    /// Comments for this student
    Comments,
    /// Mark for the individual component
    ComponentMark,
}

impl IndividualPart {
    /// Key stored in the database
    #[must_use]
    pub fn key(self) -> String {
        match self {
            Self::Category(number) => number.to_string(),
            Self::Comments => "comments".to_string(),
            Self::ComponentMark => "individual_component_mark".to_string(),
        }
    }

    const fn is_mark(self) -> bool {
        !matches!(self, Self::Comments)
    }
}

impl FromStr for IndividualPart {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "comments" => Ok(Self::Comments),
            "individual_component_mark" | "component" => Ok(Self::ComponentMark),
            other => other
                .parse::<u8>()
                .map(Self::Category)
                .map_err(|_| format!("Unknown marksheet part: '{other}'")),
        }
    }
}

impl fmt::Display for IndividualPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Marksheet shared by a group, with individual parts per student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFeedback {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Assessment marked
    pub assessment_id: i64,
    /// Group number
    pub group_no: i32,
    /// Attempt marked
    pub attempt: Attempt,
    /// Marker (staff username)
    pub marker: Option<String>,
    /// Date of marking
    pub marking_date: Option<NaiveDate>,
    /// Group category marks by 1-based number
    pub group_category_marks: BTreeMap<u8, i32>,
    /// Comments to the whole group
    pub group_comments: String,
    /// Individual parts: student id, then part key, then value
    pub individual_parts: BTreeMap<String, BTreeMap<String, String>>,
}

impl GroupFeedback {
    /// Empty group marksheet
    #[must_use]
    pub const fn new(assessment_id: i64, group_no: i32, attempt: Attempt) -> Self {
        Self {
            id: None,
            assessment_id,
            group_no,
            attempt,
            marker: None,
            marking_date: None,
            group_category_marks: BTreeMap::new(),
            group_comments: String::new(),
            individual_parts: BTreeMap::new(),
        }
    }

    /// Set one student's part; an empty value clears it
    ///
    /// # Errors
    /// Returns [`Error::Invalid`] when a mark part is not a whole number.
    pub fn set_individual_part(
        &mut self,
        part: IndividualPart,
        student_id: &str,
        value: &str,
    ) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            if let Some(parts) = self.individual_parts.get_mut(student_id) {
                parts.remove(&part.key());
                if parts.is_empty() {
                    self.individual_parts.remove(student_id);
                }
            }
            return Ok(());
        }
        if part.is_mark() && value.parse::<i32>().is_err() {
            return Err(Error::invalid(
                "individual part",
                format!("'{value}' is not a mark"),
            ));
        }
        self.individual_parts
            .entry(student_id.to_string())
            .or_default()
            .insert(part.key(), value.to_string());
        Ok(())
    }

    /// Set the same part for several students
    ///
    /// # Errors
    /// Stops at the first invalid value, see
    /// [`set_individual_part`](Self::set_individual_part).
    pub fn set_multiple_individual_parts<'a>(
        &mut self,
        part: IndividualPart,
        values: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<()> {
        for (student_id, value) in values {
            self.set_individual_part(part, student_id, value)?;
        }
        Ok(())
    }

    /// Stored value of one student's part
    #[must_use]
    pub fn get_individual_part(&self, part: IndividualPart, student_id: &str) -> Option<&str> {
        self.individual_parts
            .get(student_id)?
            .get(&part.key())
            .map(String::as_str)
    }

    /// Mark part as a number
    #[must_use]
    pub fn individual_mark(&self, part: IndividualPart, student_id: &str) -> Option<i32> {
        self.get_individual_part(part, student_id)?.parse().ok()
    }

    /// Set or clear a group category mark
    ///
    /// # Errors
    /// Returns [`Error::Invalid`] for a category the marksheet does not have
    /// or a mark that is not a band value.
    pub fn set_group_category_mark(
        &mut self,
        marksheet: MarksheetType,
        number: u8,
        mark: Option<i32>,
    ) -> Result<()> {
        match mark {
            Some(mark) => {
                check_category_mark(marksheet, number, mark, true)?;
                self.group_category_marks.insert(number, mark);
            }
            None => {
                self.group_category_marks.remove(&number);
            }
        }
        Ok(())
    }

    /// Final mark for one student on a group marksheet
    ///
    /// The group mark is the mean of the group categories; the individual
    /// mark is the component mark, or else the mean of the student's
    /// category marks. Both are weighted by the marksheet's split.
    #[must_use]
    pub fn student_mark(&self, marksheet: MarksheetType, student_id: &str) -> Option<i32> {
        let split = marksheet.split()?;
        let group_mark = category_average(self.group_category_marks.values())?;
        let individual = self
            .individual_mark(IndividualPart::ComponentMark, student_id)
            .or_else(|| {
                let marks: Vec<i32> = (1..=u8::try_from(marksheet.categories().len()).ok()?)
                    .filter_map(|n| self.individual_mark(IndividualPart::Category(n), student_id))
                    .collect();
                category_average(&marks)
            })?;
        Some(combine_group_mark(split, group_mark, individual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_individual_parts_round_trip() {
        let mut feedback = GroupFeedback::new(1, 1, Attempt::First);
        let comment = "Generally a good presentation, but too many carrots";
        feedback
            .set_individual_part(IndividualPart::Category(1), "bb23", "40")
            .unwrap();
        feedback
            .set_individual_part(IndividualPart::Comments, "bb23", comment)
            .unwrap();
        feedback
            .set_individual_part(IndividualPart::Category(1), "dd42", "50")
            .unwrap();
        feedback
            .set_individual_part(IndividualPart::ComponentMark, "bb23", "55")
            .unwrap();

        assert_eq!(feedback.individual_mark(IndividualPart::Category(1), "bb23"), Some(40));
        assert_eq!(feedback.individual_mark(IndividualPart::Category(1), "dd42"), Some(50));
        assert_eq!(
            feedback.get_individual_part(IndividualPart::Comments, "bb23"),
            Some(comment)
        );
        assert_eq!(
            feedback.individual_mark(IndividualPart::ComponentMark, "bb23"),
            Some(55)
        );
    }

    #[test]
    fn test_empty_values_return_none() {
        let mut feedback = GroupFeedback::new(1, 1, Attempt::First);
        assert_eq!(feedback.get_individual_part(IndividualPart::Category(1), "x"), None);
        assert_eq!(feedback.get_individual_part(IndividualPart::Comments, "x"), None);
        assert_eq!(feedback.get_individual_part(IndividualPart::ComponentMark, "x"), None);

        feedback
            .set_individual_part(IndividualPart::Comments, "x", "fine")
            .unwrap();
        feedback
            .set_individual_part(IndividualPart::Comments, "x", "  ")
            .unwrap();
        assert_eq!(feedback.get_individual_part(IndividualPart::Comments, "x"), None);
        assert!(feedback.individual_parts.is_empty());
    }

    #[test]
    fn test_multiple_individual_parts() {
        let mut feedback = GroupFeedback::new(1, 1, Attempt::First);
        feedback
            .set_multiple_individual_parts(
                IndividualPart::Category(1),
                [("bb23", "45"), ("dd42", "55")],
            )
            .unwrap();
        feedback
            .set_multiple_individual_parts(
                IndividualPart::Comments,
                [("bb23", "aaa"), ("dd42", "bbb")],
            )
            .unwrap();
        assert_eq!(feedback.individual_mark(IndividualPart::Category(1), "dd42"), Some(55));
        assert_eq!(
            feedback.get_individual_part(IndividualPart::Comments, "bb23"),
            Some("aaa")
        );
    }

    #[test]
    fn test_mark_parts_must_be_numbers() {
        let mut feedback = GroupFeedback::new(1, 1, Attempt::First);
        assert!(feedback
            .set_individual_part(IndividualPart::ComponentMark, "bb23", "good")
            .is_err());
    }

    #[test]
    fn test_student_mark_uses_split() {
        let sheet = MarksheetType::GroupPresentation;
        let mut feedback = GroupFeedback::new(1, 1, Attempt::First);
        feedback.set_group_category_mark(sheet, 1, Some(69)).unwrap();
        feedback.set_group_category_mark(sheet, 2, Some(79)).unwrap();
        feedback
            .set_individual_part(IndividualPart::ComponentMark, "bb23", "60")
            .unwrap();
        feedback
            .set_multiple_individual_parts(
                IndividualPart::Category(1),
                [("dd42", "49")],
            )
            .unwrap();
        feedback
            .set_individual_part(IndividualPart::Category(2), "dd42", "59")
            .unwrap();

        assert_eq!(feedback.student_mark(sheet, "bb23"), Some(61));
        assert_eq!(feedback.student_mark(sheet, "dd42"), Some(56));
        assert_eq!(feedback.student_mark(sheet, "nobody"), None);
        assert_eq!(feedback.student_mark(MarksheetType::Essay, "bb23"), None);
    }

    #[test]
    fn test_group_category_needs_a_band() {
        let mut feedback = GroupFeedback::new(1, 1, Attempt::First);
        assert!(feedback
            .set_group_category_mark(MarksheetType::GroupPresentation, 1, Some(65))
            .is_err());
        assert!(feedback
            .set_group_category_mark(MarksheetType::GroupPresentation, 3, Some(59))
            .is_err());
    }

    #[test]
    fn test_individual_category_marks() {
        let mut feedback = IndividualFeedback::new(1, Attempt::First);
        feedback
            .set_category_mark(MarksheetType::Essay, 2, Some(59))
            .unwrap();
        assert!(feedback
            .set_category_mark(MarksheetType::Essay, 2, Some(58))
            .is_err());
        assert!(feedback
            .set_category_mark(MarksheetType::MediationRolePlay, 1, Some(58))
            .is_ok());
        feedback
            .set_category_mark(MarksheetType::Essay, 2, None)
            .unwrap();
        assert_eq!(feedback.category_marks.get(&2), None);
    }

    #[test]
    fn test_completion_needs_mark_and_dates() {
        let mut feedback = IndividualFeedback::new(1, Attempt::First);
        feedback.update_completion(Some(60));
        assert!(!feedback.completed);
        feedback.submission_date = NaiveDate::from_ymd_opt(2014, 1, 10);
        feedback.marking_date = NaiveDate::from_ymd_opt(2014, 1, 20);
        feedback.update_completion(None);
        assert!(!feedback.completed);
        feedback.update_completion(Some(60));
        assert!(feedback.completed);
    }
}
