//! Students with outstanding resits

use askama::Template;

use super::{mark_cell, table_cell};
use crate::calendar::academic_year_string;
use crate::models::StudyYear;
use crate::store::{Store, StudentFilter};
use crate::{debug, Result};

/// One student and module needing action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRow {
    /// "Last, First"
    pub name: String,
    /// Student id
    pub student_id: String,
    /// Module with its session
    pub module: String,
    /// Module mark
    pub average: String,
    /// "attended/recorded"
    pub attendance: String,
    /// "Essay (35): Resubmit" and similar
    pub actions: Vec<String>,
}

/// Resits, resubmissions and pending concessions of one stage
#[derive(Debug, Clone, Template)]
#[template(path = "problem_students.md", escape = "none")]
pub struct ProblemStudentsReport {
    /// Stage label
    pub year: String,
    /// "1900/01"
    pub session: String,
    /// Students by name, then module
    pub rows: Vec<ProblemRow>,
}

impl ProblemStudentsReport {
    /// Collect the active students of a stage who still have to do something
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn build(store: &Store, year: StudyYear, pass_mark: i32) -> Result<Self> {
        let current_year = store.current_year()?;
        let mut rows = Vec::new();
        for student in store.students(&StudentFilter::active_in(year))? {
            for record in store.year_records(&student, current_year)? {
                let actions: Vec<String> = record
                    .required_actions(pass_mark)
                    .into_iter()
                    .filter(|(_, _, action)| !action.is_empty())
                    .map(|(assessment, mark, action)| {
                        format!("{} ({}): {action}", assessment.title, mark_cell(mark))
                    })
                    .collect();
                if actions.is_empty() {
                    continue;
                }
                rows.push(ProblemRow {
                    name: table_cell(&student.to_string()),
                    student_id: student.student_id.clone(),
                    module: table_cell(&record.module.to_string()),
                    average: mark_cell(record.performance.average),
                    attendance: record.performance.attendance.count(),
                    actions: actions.iter().map(|a| table_cell(a)).collect(),
                });
            }
        }
        debug!("{} problem rows for year {year}", rows.len());
        Ok(Self {
            year: year.to_string(),
            session: academic_year_string(current_year),
            rows,
        })
    }
}
