//! Assessment model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{slugify, Attempt, Module};
use crate::feedback::MarksheetType;

/// A marked component of a module, e.g. an essay worth 40%
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Owning module
    pub module_id: i64,
    /// Title, unique within the module
    pub title: String,
    /// Identifier derived from the title
    pub slug: String,
    /// Weight in percent of the module mark
    pub value: u32,
    /// Deadline of the first attempt
    pub submission_date: Option<NaiveDate>,
    /// Deadline of the resit
    pub resit_submission_date: Option<NaiveDate>,
    /// Word limit of the first attempt
    pub max_word_count: Option<u32>,
    /// Word limit of the resit
    pub resit_max_word_count: Option<u32>,
    /// Marked in groups
    pub group_assessment: bool,
    /// Resit marked in groups
    pub resit_group_assessment: bool,
    /// Marksheet used for the first attempt
    pub marksheet_type: Option<MarksheetType>,
    /// Marksheet used for resits
    pub resit_marksheet_type: Option<MarksheetType>,
    /// All module teachers appear on the marksheet
    pub co_marking: bool,
    /// Students can see the first attempt mark
    pub available: bool,
    /// Students can see the resit mark
    pub resit_available: bool,
    /// Students can see the second resit mark
    pub second_resit_available: bool,
    /// Students can see the QLD resit mark
    pub qld_resit_available: bool,
}

impl Assessment {
    /// Create an assessment with only title and weight set
    #[must_use]
    pub fn new(module_id: i64, title: &str, value: u32) -> Self {
        let title = title.trim().to_string();
        Self {
            id: None,
            module_id,
            slug: slugify(&title),
            title,
            value,
            submission_date: None,
            resit_submission_date: None,
            max_word_count: None,
            resit_max_word_count: None,
            group_assessment: false,
            resit_group_assessment: false,
            marksheet_type: None,
            resit_marksheet_type: None,
            co_marking: false,
            available: false,
            resit_available: false,
            second_resit_available: false,
            qld_resit_available: false,
        }
    }

    /// Whether this is the module's exam
    #[must_use]
    pub fn is_exam(&self) -> bool {
        self.title.eq_ignore_ascii_case("exam")
    }

    /// Marksheet for the given attempt
    #[must_use]
    pub const fn marksheet_for(&self, attempt: Attempt) -> Option<MarksheetType> {
        match attempt {
            Attempt::First => self.marksheet_type,
            _ => self.resit_marksheet_type,
        }
    }

    /// Whether marks for `attempt` are released to students
    #[must_use]
    pub const fn is_available(&self, attempt: Attempt) -> bool {
        match attempt {
            Attempt::First => self.available,
            Attempt::Resit => self.resit_available,
            Attempt::SecondResit => self.second_resit_available,
            Attempt::QldResit => self.qld_resit_available,
        }
    }

    /// Release or withhold marks for `attempt`
    pub fn set_available(&mut self, attempt: Attempt, available: bool) {
        match attempt {
            Attempt::First => self.available = available,
            Attempt::Resit => self.resit_available = available,
            Attempt::SecondResit => self.second_resit_available = available,
            Attempt::QldResit => self.qld_resit_available = available,
        }
    }

    /// File name stem for exported marksheets,
    /// e.g. `Hunting_Practice_(1900-01)_-_Essay`
    #[must_use]
    pub fn filename(&self, module: &Module) -> String {
        let module_part = module.to_string().replace(' ', "_").replace('/', "-");
        format!("{module_part}_-_{}", self.title.replace(' ', "_"))
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Order assessments by title with the exam last
pub fn sort_for_display(assessments: &mut [Assessment]) {
    assessments.sort_by(|a, b| {
        a.is_exam()
            .cmp(&b.is_exam())
            .then_with(|| a.title.cmp(&b.title))
    });
}
