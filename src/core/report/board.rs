//! Exam board overview: every module of a stage with marks and comments

use askama::Template;

use super::{mark_cell, table_cell};
use crate::calendar::academic_year_string;
use crate::models::StudyYear;
use crate::store::Store;
use crate::{debug, Result};

/// One student's line in a board table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    /// "Last, First"
    pub name: String,
    /// Student id
    pub student_id: String,
    /// Result strings in assessment order
    pub results: Vec<String>,
    /// Module mark, noting a cap
    pub mark: String,
    /// "Resubmit Essay, Resit Exam (QLD)" and similar
    pub comments: String,
}

/// One module as the board sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardModule {
    /// Module title
    pub title: String,
    /// Module code
    pub code: String,
    /// Assessment titles with weights, exam last
    pub headings: Vec<String>,
    /// Markdown separator cells matching the headings
    pub rule: String,
    /// Active students by name
    pub rows: Vec<BoardRow>,
}

/// Marks of every module a stage can take in one academic year
#[derive(Debug, Clone, Template)]
#[template(path = "exam_board.md", escape = "none")]
pub struct ExamBoardReport {
    /// Stage label
    pub level: String,
    /// "1900/01"
    pub session: String,
    /// Subject area slug, empty for the whole department
    pub subject_area: String,
    /// Modules by title
    pub modules: Vec<BoardModule>,
}

impl ExamBoardReport {
    /// Collect the board tables for modules open to `level` in `year`,
    /// optionally only those of one subject area
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn build(
        store: &Store,
        year: i32,
        level: StudyYear,
        subject_area: Option<&str>,
        pass_mark: i32,
    ) -> Result<Self> {
        let mut modules = Vec::new();
        for module in store.modules(Some(year))? {
            if !module.is_open_to(level)
                || subject_area.is_some_and(|slug| !module.subject_areas.iter().any(|s| s == slug))
            {
                continue;
            }
            let module_id = module.id.unwrap_or_default();
            let mut assessments = store.assessments(module_id)?;
            crate::models::assessment::sort_for_display(&mut assessments);
            let mut rows = Vec::new();
            for (student, _) in store.enrolled(module_id)? {
                if !student.active {
                    continue;
                }
                let mut record = store.module_record(&student.student_id, module_id)?;
                let results = record
                    .all_results_as_strings()
                    .into_iter()
                    .map(|(_, text)| text.map_or_else(|| "-".to_string(), |t| table_cell(&t)))
                    .collect();
                let mark = record
                    .capped_mark(pass_mark)
                    .unwrap_or_else(|| mark_cell(None));
                rows.push(BoardRow {
                    name: table_cell(&student.to_string()),
                    student_id: student.student_id.clone(),
                    results,
                    mark,
                    comments: table_cell(&record.board_comments(pass_mark)),
                });
            }
            modules.push(BoardModule {
                title: table_cell(&module.title),
                code: module.code.clone(),
                headings: assessments
                    .iter()
                    .map(|a| table_cell(&format!("{} ({}%)", a.title, a.value)))
                    .collect(),
                rule: "---|".repeat(assessments.len()),
                rows,
            });
        }
        debug!("Exam board for year {level}: {} modules", modules.len());
        Ok(Self {
            level: level.to_string(),
            session: academic_year_string(year),
            subject_area: subject_area.unwrap_or_default().to_string(),
            modules,
        })
    }
}
