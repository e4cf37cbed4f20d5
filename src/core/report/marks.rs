//! Module mark overview and CSV export

use askama::Template;
use std::io::Write;

use super::{mark_cell, table_cell};
use crate::calendar::academic_year_string;
use crate::store::Store;
use crate::{debug, Result};

/// One student's line in the mark overview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRow {
    /// "Last, First"
    pub name: String,
    /// Student id
    pub student_id: String,
    /// Result strings in assessment order, "-" when missing
    pub results: Vec<String>,
    /// Module mark, noting a cap
    pub average: String,
    /// Module failed
    pub failed: bool,
    /// Mark ends in 9
    pub nine: bool,
}

/// Every enrolled student's results in one module
#[derive(Debug, Clone, Template)]
#[template(path = "module_marks.md", escape = "none")]
pub struct ModuleMarksReport {
    /// Module title
    pub title: String,
    /// Module code
    pub code: String,
    /// "1900/01"
    pub session: String,
    /// Credit value
    pub credits: u32,
    /// Assessment titles with weights, exam last
    pub headings: Vec<String>,
    /// Markdown separator row matching the headings
    pub rule: String,
    /// Students by name
    pub rows: Vec<MarkRow>,
    /// Number of failed students
    pub failed: usize,
    /// Number of marks ending in 9
    pub nines: usize,
}

impl ModuleMarksReport {
    /// Collect the marks of a module
    ///
    /// # Errors
    /// [`Error::NotFound`](crate::Error::NotFound) for an unknown module.
    pub fn build(store: &Store, module_id: i64, pass_mark: i32) -> Result<Self> {
        let module = store.get_module(module_id)?;
        let assessments = store.assessments(module_id)?;
        let mut rows = Vec::new();
        for (student, _) in store.enrolled(module_id)? {
            let record = store.module_record(&student.student_id, module_id)?;
            let results = record
                .all_results_as_strings()
                .into_iter()
                .map(|(_, text)| text.map_or_else(|| "-".to_string(), |t| table_cell(&t)))
                .collect();
            let average = record.performance.average.filter(|a| *a != 0);
            rows.push(MarkRow {
                name: table_cell(&student.to_string()),
                student_id: student.student_id.clone(),
                results,
                average: record
                    .capped_mark(pass_mark)
                    .unwrap_or_else(|| mark_cell(average)),
                failed: average.is_some_and(|a| a < pass_mark),
                nine: record.performance.average_ends_in_nine(),
            });
        }
        let mut ordered = assessments;
        crate::models::assessment::sort_for_display(&mut ordered);
        let headings: Vec<String> = ordered
            .iter()
            .map(|a| table_cell(&format!("{} ({}%)", a.title, a.value)))
            .collect();
        let rule = "---|".repeat(headings.len());
        debug!("Mark overview for {module}: {} students", rows.len());
        Ok(Self {
            failed: rows.iter().filter(|r| r.failed).count(),
            nines: rows.iter().filter(|r| r.nine).count(),
            title: module.title,
            code: module.code,
            session: academic_year_string(module.year),
            credits: module.credits,
            headings,
            rule,
            rows,
        })
    }
}

/// Write a module's marks as CSV: ids, names, one column per assessment
/// with the best mark, then the module mark
///
/// Returns the number of students written.
///
/// # Errors
/// Store errors, [`Error::Csv`](crate::Error::Csv) and
/// [`Error::Io`](crate::Error::Io).
pub fn export_module_marks<W: Write>(store: &Store, module_id: i64, writer: W) -> Result<usize> {
    let module = store.get_module(module_id)?;
    let mut assessments = store.assessments(module_id)?;
    crate::models::assessment::sort_for_display(&mut assessments);

    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![
        "student_id".to_string(),
        "exam_id".to_string(),
        "last_name".to_string(),
        "first_name".to_string(),
    ];
    header.extend(assessments.iter().map(|a| a.title.clone()));
    header.push("module_mark".to_string());
    csv_writer.write_record(&header)?;

    let mut written = 0;
    for (student, performance) in store.enrolled(module_id)? {
        let record = store.module_record(&student.student_id, module_id)?;
        let mut line = vec![
            student.student_id.clone(),
            student.exam_id.clone().unwrap_or_default(),
            student.last_name.clone(),
            student.first_name.clone(),
        ];
        line.extend(assessments.iter().map(|assessment| {
            record
                .result_for(assessment)
                .and_then(|r| r.mark.map(|_| r.result().to_string()))
                .unwrap_or_default()
        }));
        line.push(performance.average.map(|a| a.to_string()).unwrap_or_default());
        csv_writer.write_record(&line)?;
        written += 1;
    }
    csv_writer.flush()?;
    debug!("Exported {written} rows for {module}");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assessment, Attempt, Module, Student};
    use crate::report::ReportGenerator;

    fn store_with_marks() -> (Store, i64) {
        let store = Store::open_in_memory().unwrap();
        let mut module = Module::new("Hunting Practice", "HP 100", 1900);
        let module_id = store.add_module(&mut module).unwrap();
        let mut essay = Assessment::new(module_id, "Essay", 50);
        store.add_assessment(&mut essay).unwrap();
        let mut exam = Assessment::new(module_id, "Exam", 50);
        store.add_assessment(&mut exam).unwrap();
        for (id, first, last, essay_mark, exam_mark) in [
            ("bb23", "Bugs", "Bunny", Some(70), Some(68)),
            ("dd42", "Daffy", "Duck", Some(30), Some(35)),
            ("pp01", "Porky", "Pig", None, None),
        ] {
            let mut student = Student::new(id.to_string(), first.to_string(), last.to_string());
            student.exam_id = Some(format!("X{id}"));
            store.add_student(&student).unwrap();
            store.enroll(id, module_id).unwrap();
            store.set_mark(id, &essay, Attempt::First, essay_mark).unwrap();
            store.set_mark(id, &exam, Attempt::First, exam_mark).unwrap();
        }
        (store, module_id)
    }

    #[test]
    fn test_module_marks_report() {
        let (store, module_id) = store_with_marks();
        let report = ModuleMarksReport::build(&store, module_id, 40).unwrap();
        assert_eq!(report.headings, vec!["Essay (50%)", "Exam (50%)"]);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].name, "Bunny, Bugs");
        assert_eq!(report.rows[0].average, "69");
        assert!(report.rows[0].nine);
        assert!(report.rows[1].failed);
        assert_eq!(report.rows[2].results, vec!["-", "-"]);
        assert_eq!(report.failed, 1);

        let text = report.render_report().unwrap();
        assert!(text.starts_with("# Hunting Practice (HP100, 1900/01)"));
        assert!(text.contains("| Bunny, Bugs | bb23 | 70 | 68 | 69 |"));
        assert!(text.contains("| Pig, Porky | pp01 | - | - | - |"));
    }

    #[test]
    fn test_csv_export() {
        let (store, module_id) = store_with_marks();
        let mut out = Vec::new();
        let written = export_module_marks(&store, module_id, &mut out).unwrap();
        assert_eq!(written, 3);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "student_id,exam_id,last_name,first_name,Essay,Exam,module_mark"
        );
        assert_eq!(lines[1], "bb23,Xbb23,Bunny,Bugs,70,68,69");
        assert_eq!(lines[3], "pp01,Xpp01,Pig,Porky,,,");
    }
}
