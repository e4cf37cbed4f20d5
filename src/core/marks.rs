//! Mark aggregation
//!
//! A [`ModuleRecord`] gathers everything needed to judge one student's
//! performance in one module: the module, its assessments, the student's
//! results and the performance row holding the average. All rules take the
//! pass mark as an argument so the threshold stays configurable.

use serde::Serialize;

use crate::models::assessment::sort_for_display;
use crate::models::{Assessment, AssessmentResult, Attempt, Concession, Module, Performance};

/// Default lowest passing mark
pub const PASS_MARK: i32 = 40;

/// Module mark before and after rounding
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Average {
    /// Unrounded weighted mean
    pub real: f64,
    /// Rounded half to even, as displayed
    pub rounded: i32,
}

impl Average {
    #[allow(clippy::cast_possible_truncation)]
    fn from_weighted_sum(sum: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let real = sum as f64 / 100.0;
        Self {
            real,
            rounded: real.round_ties_even() as i32,
        }
    }
}

/// Why a result may be sat again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResitKind {
    /// Ordinary resit: failed module or a concession
    Resit,
    /// Resit only needed to keep the qualifying law degree
    Qld,
}

impl ResitKind {
    /// One letter code ("r" or "q")
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Resit => 'r',
            Self::Qld => 'q',
        }
    }
}

/// One student's module: module, assessments, results and performance
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    /// The module
    pub module: Module,
    /// Whether the student is on the qualifying law degree track
    pub student_qld: bool,
    /// The enrolment row, holding the stored average
    pub performance: Performance,
    /// Assessments of the module, exam last
    pub assessments: Vec<Assessment>,
    /// Results the student has so far
    pub results: Vec<AssessmentResult>,
}

impl ModuleRecord {
    /// Assemble a record, ordering the assessments for display
    #[must_use]
    pub fn new(
        module: Module,
        student_qld: bool,
        performance: Performance,
        mut assessments: Vec<Assessment>,
        results: Vec<AssessmentResult>,
    ) -> Self {
        sort_for_display(&mut assessments);
        Self {
            module,
            student_qld,
            performance,
            assessments,
            results,
        }
    }

    /// Result for an assessment, if one was recorded
    #[must_use]
    pub fn result_for(&self, assessment: &Assessment) -> Option<&AssessmentResult> {
        let id = assessment.id?;
        self.results.iter().find(|r| r.assessment_id == id)
    }

    fn weighted_sum(&self, mark_of: impl Fn(&AssessmentResult) -> i32) -> i64 {
        self.assessments
            .iter()
            .filter_map(|assessment| {
                let mark = mark_of(self.result_for(assessment)?);
                (mark != 0).then(|| i64::from(mark) * i64::from(assessment.value))
            })
            .sum()
    }

    /// Weighted mean of the best marks
    #[must_use]
    pub fn calculate_average(&self) -> Average {
        Average::from_weighted_sum(self.weighted_sum(AssessmentResult::result))
    }

    /// Store the current average on the performance
    pub fn recalculate(&mut self) -> Average {
        let average = self.calculate_average();
        self.performance.real_average = Some(average.real);
        self.performance.average = Some(average.rounded);
        average
    }

    /// Rounded weighted mean using first attempts only
    #[must_use]
    pub fn average_from_first_attempt(&self) -> i32 {
        Average::from_weighted_sum(self.weighted_sum(|r| r.mark.unwrap_or(0))).rounded
    }

    /// Stored average, or a fresh calculation when none is stored
    fn current_average(&self) -> i32 {
        self.performance
            .average
            .unwrap_or_else(|| self.calculate_average().rounded)
    }

    /// Results that may be resat, with the reason, in assessment order
    ///
    /// A failed mark is an ordinary resit when the first-attempt average
    /// fails; a claimed concession is always an ordinary resit; a failed
    /// mark in a foundational module is a QLD resit for QLD students.
    #[must_use]
    pub fn results_eligible_for_resit(
        &self,
        pass_mark: i32,
    ) -> Vec<(&AssessmentResult, ResitKind)> {
        let first_average = self.average_from_first_attempt();
        let qld_module = self.module.foundational && self.student_qld;
        self.assessments
            .iter()
            .filter_map(|assessment| {
                let result = self.result_for(assessment)?;
                let failed = result.mark.is_some_and(|m| m < pass_mark);
                let kind = if (first_average < pass_mark && failed)
                    || result.concessions.is_claimed()
                {
                    ResitKind::Resit
                } else if qld_module && failed {
                    ResitKind::Qld
                } else {
                    return None;
                };
                Some((result, kind))
            })
            .collect()
    }

    /// Assessments that must be resat, each with its first concession
    ///
    /// Recalculates the average first. With a failing average every failed
    /// (or missing) first mark without a resit mark is listed; otherwise only
    /// assessments with a granted or pending concession. Empty when nothing
    /// needs resitting.
    pub fn resit_required(&mut self, pass_mark: i32) -> Vec<(&Assessment, Concession)> {
        let average = self.recalculate().rounded;
        let empty = AssessmentResult::default();
        self.assessments
            .iter()
            .filter_map(|assessment| {
                let result = self.result_for(assessment).unwrap_or(&empty);
                let required = if average < pass_mark {
                    result.mark.unwrap_or(0) < pass_mark && result.resit_mark.is_none()
                } else {
                    result.concessions.is_claimed()
                };
                required.then_some((assessment, result.concessions))
            })
            .collect()
    }

    /// Assessments a QLD student still has to pass in a foundational module
    #[must_use]
    pub fn qld_resit_required(&self, pass_mark: i32) -> Vec<&Assessment> {
        if !(self.module.foundational && self.student_qld) {
            return Vec::new();
        }
        self.assessments
            .iter()
            .filter(|assessment| {
                self.result_for(assessment)
                    .is_none_or(|result| result.result() < pass_mark)
            })
            .collect()
    }

    /// Results still failed after the resit while the module is failed
    #[must_use]
    pub fn failures_after_resit(&self, pass_mark: i32) -> Vec<&AssessmentResult> {
        if self.current_average() >= pass_mark {
            return Vec::new();
        }
        self.results
            .iter()
            .filter(|result| {
                let first_failed = result.mark.is_none_or(|m| m == 0 || m < pass_mark);
                first_failed && failed_or_missing(result.resit_mark, pass_mark)
            })
            .collect()
    }

    /// Results still failed after the resit for QLD purposes
    #[must_use]
    pub fn qld_failures_after_resit(&self, pass_mark: i32) -> Vec<&AssessmentResult> {
        if !(self.module.foundational && self.student_qld) {
            return Vec::new();
        }
        self.results
            .iter()
            .filter(|result| {
                result.mark.unwrap_or(0) < pass_mark
                    && failed_or_missing(result.resit_mark, pass_mark)
            })
            .collect()
    }

    /// Average for display, noting a cap at the pass mark
    ///
    /// The mark is capped when a failed first attempt without a claimed
    /// concession was lifted above the pass mark by a resit.
    #[must_use]
    pub fn capped_mark(&self, pass_mark: i32) -> Option<String> {
        let average = self.performance.average.filter(|a| *a != 0)?;
        let cap = average > pass_mark
            && self.average_from_first_attempt() < pass_mark
            && self.results.iter().any(|result| {
                result.mark.is_none_or(|m| m < pass_mark) && !result.concessions.is_claimed()
            });
        if cap {
            Some(format!("{average} (capped at {pass_mark})"))
        } else {
            Some(average.to_string())
        }
    }

    /// Every assessment title with its result string, exam last
    #[must_use]
    pub fn all_results_as_strings(&self) -> Vec<(&str, Option<String>)> {
        self.assessments
            .iter()
            .map(|assessment| {
                let text = self
                    .result_for(assessment)
                    .and_then(|r| r.result_as_string(assessment.is_exam()));
                (assessment.title.as_str(), text)
            })
            .collect()
    }

    /// Concession per assessment slug for an attempt, exam last
    #[must_use]
    pub fn all_concessions(&self, attempt: Attempt) -> Vec<(&str, Concession)> {
        self.assessments
            .iter()
            .map(|assessment| {
                let concession = self
                    .result_for(assessment)
                    .map_or(Concession::None, |r| r.concession(attempt));
                (assessment.slug.as_str(), concession)
            })
            .collect()
    }

    /// What the student must do for each resit-eligible assessment
    ///
    /// Rows are `(assessment, first mark, action)` where the action is
    /// "Sit"/"Submit" for granted concessions, "Concessions Pending",
    /// "Resit"/"Resubmit" for a failed module and the same with "(QLD)"
    /// when only the QLD requires it. Assessments without action get "".
    #[must_use]
    pub fn required_actions(
        &self,
        pass_mark: i32,
    ) -> Vec<(&Assessment, Option<i32>, &'static str)> {
        let eligible = self.results_eligible_for_resit(pass_mark);
        let module_failed = self.current_average() < pass_mark;
        self.assessments
            .iter()
            .filter_map(|assessment| {
                let result = self.result_for(assessment)?;
                let is_eligible = eligible
                    .iter()
                    .any(|(r, _)| r.assessment_id == result.assessment_id);
                let action = if !is_eligible {
                    ""
                } else {
                    match (result.concessions, assessment.is_exam(), module_failed) {
                        (Concession::Granted, true, _) => "Sit",
                        (Concession::Granted, false, _) => "Submit",
                        (Concession::Pending, _, _) => "Concessions Pending",
                        (Concession::None, true, true) => "Resit",
                        (Concession::None, false, true) => "Resubmit",
                        (Concession::None, true, false) => "Resit (QLD)",
                        (Concession::None, false, false) => "Resubmit (QLD)",
                    }
                };
                Some((assessment, result.mark, action))
            })
            .collect()
    }

    /// Board comments such as "Resubmit Essay, Resit Exam (QLD)"
    pub fn board_comments(&mut self, pass_mark: i32) -> String {
        let mut comments: Vec<String> = Vec::new();
        let mut listed: Vec<i64> = Vec::new();
        for (assessment, concession) in self.resit_required(pass_mark) {
            listed.extend(assessment.id);
            comments.push(match (concession, assessment.is_exam()) {
                (Concession::Granted, true) => "Sit Exam".to_string(),
                (Concession::Granted, false) => format!("Submit {}", assessment.title),
                (Concession::Pending, _) => {
                    format!("Concessions for {} pending", assessment.title)
                }
                (Concession::None, true) => "Resit Exam".to_string(),
                (Concession::None, false) => format!("Resubmit {}", assessment.title),
            });
        }
        for assessment in self.qld_resit_required(pass_mark) {
            if assessment.id.is_some_and(|id| listed.contains(&id)) {
                continue;
            }
            comments.push(if assessment.is_exam() {
                "Resit Exam (QLD)".to_string()
            } else {
                format!("Resubmit {} (QLD)", assessment.title)
            });
        }
        comments.join(", ")
    }

    /// Whether every assessment is passed for QLD purposes
    #[must_use]
    pub fn no_qld_problems(&self, pass_mark: i32) -> bool {
        self.assessments.iter().all(|assessment| {
            self.result_for(assessment)
                .is_some_and(|r| r.no_qld_problems(pass_mark))
        })
    }
}

fn failed_or_missing(mark: Option<i32>, pass_mark: i32) -> bool {
    match mark {
        Some(m) if m != 0 => m < pass_mark,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Module "Hunting Practice" with essay 20%, presentation 30%, exam 50%
    fn record(marks: [(Option<i32>, Concession); 3]) -> ModuleRecord {
        let mut module = Module::new("Hunting Practice", "HP23", 1900);
        module.id = Some(1);
        let titles = [("Essay", 20), ("Presentation", 30), ("Exam", 50)];
        let assessments: Vec<Assessment> = titles
            .iter()
            .zip(1..)
            .map(|((title, value), id)| Assessment {
                id: Some(id),
                ..Assessment::new(1, title, *value)
            })
            .collect();
        let results = marks
            .iter()
            .zip(1..)
            .map(|((mark, concession), id)| AssessmentResult {
                id: Some(id),
                mark: *mark,
                concessions: *concession,
                ..AssessmentResult::new(1, id)
            })
            .collect();
        let mut performance = Performance::new("bb23".to_string(), 1);
        performance.id = Some(1);
        ModuleRecord::new(module, true, performance, assessments, results)
    }

    fn plain(essay: i32, presentation: i32, exam: i32) -> ModuleRecord {
        record([
            (Some(essay), Concession::None),
            (Some(presentation), Concession::None),
            (Some(exam), Concession::None),
        ])
    }

    #[test]
    fn test_average_uses_weights_and_rounds_half_to_even() {
        let mut single = plain(48, 0, 0);
        single.assessments[0].value = 30;
        let average = single.calculate_average();
        assert!((average.real - 14.4).abs() < f64::EPSILON);
        assert_eq!(average.rounded, 14);

        let mut record = plain(35, 42, 38);
        let average = record.recalculate();
        assert!((average.real - 38.6).abs() < 1e-9);
        assert_eq!(record.performance.average, Some(39));

        let half = plain(45, 45, 44);
        assert!((half.calculate_average().real - 44.5).abs() < 1e-9);
        assert_eq!(half.calculate_average().rounded, 44);
    }

    #[test]
    fn test_average_ignores_missing_results() {
        let mut record = plain(60, 60, 60);
        record.results.pop();
        assert_eq!(record.calculate_average().rounded, 30);
    }

    #[test]
    fn test_resit_counts_towards_average_but_not_first_attempt() {
        let mut record = plain(30, 30, 30);
        record.results[2].resit_mark = Some(50);
        assert_eq!(record.calculate_average().rounded, 40);
        assert_eq!(record.average_from_first_attempt(), 30);
    }

    #[test]
    fn test_no_resit_required_when_passed() {
        let mut record = plain(42, 35, 42);
        assert!(record.resit_required(PASS_MARK).is_empty());
    }

    #[test]
    fn test_resit_required_for_failed_module() {
        let mut record = record([
            (Some(35), Concession::None),
            (Some(42), Concession::None),
            (Some(38), Concession::Granted),
        ]);
        let required: Vec<(&str, Concession)> = record
            .resit_required(PASS_MARK)
            .into_iter()
            .map(|(a, c)| (a.title.as_str(), c))
            .collect();
        assert_eq!(
            required,
            vec![("Essay", Concession::None), ("Exam", Concession::Granted)]
        );
    }

    #[test]
    fn test_resit_required_for_concessions_in_passed_module() {
        let mut record = record([
            (Some(42), Concession::None),
            (Some(44), Concession::Granted),
            (Some(42), Concession::Pending),
        ]);
        let required: Vec<(&str, Concession)> = record
            .resit_required(PASS_MARK)
            .into_iter()
            .map(|(a, c)| (a.title.as_str(), c))
            .collect();
        assert_eq!(
            required,
            vec![
                ("Presentation", Concession::Granted),
                ("Exam", Concession::Pending)
            ]
        );
    }

    #[test]
    fn test_missing_result_counts_as_zero_for_resits() {
        let mut record = plain(30, 30, 30);
        record.results.remove(1);
        let titles: Vec<&str> = record
            .resit_required(PASS_MARK)
            .into_iter()
            .map(|(a, _)| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Essay", "Presentation", "Exam"]);
    }

    #[test]
    fn test_results_eligible_for_resit() {
        let record = plain(35, 42, 38);
        let eligible: Vec<(i64, char)> = record
            .results_eligible_for_resit(PASS_MARK)
            .into_iter()
            .map(|(r, kind)| (r.assessment_id, kind.code()))
            .collect();
        assert_eq!(eligible, vec![(1, 'r'), (3, 'r')]);
    }

    #[test]
    fn test_qld_resit_for_foundational_modules() {
        let mut record = plain(35, 50, 50);
        assert!(record.results_eligible_for_resit(PASS_MARK).is_empty());
        record.module.foundational = true;
        let eligible: Vec<(i64, char)> = record
            .results_eligible_for_resit(PASS_MARK)
            .into_iter()
            .map(|(r, kind)| (r.assessment_id, kind.code()))
            .collect();
        assert_eq!(eligible, vec![(1, 'q')]);
        assert_eq!(record.qld_resit_required(PASS_MARK).len(), 1);

        record.student_qld = false;
        assert!(record.qld_resit_required(PASS_MARK).is_empty());
    }

    #[test]
    fn test_failures_after_resit() {
        let mut record = plain(30, 30, 30);
        record.results[0].resit_mark = Some(45);
        record.results[1].resit_mark = Some(35);
        record.recalculate();
        let failed: Vec<i64> = record
            .failures_after_resit(PASS_MARK)
            .iter()
            .map(|r| r.assessment_id)
            .collect();
        assert_eq!(failed, vec![2, 3]);

        let passed = plain(50, 50, 50);
        assert!(passed.failures_after_resit(PASS_MARK).is_empty());
    }

    #[test]
    fn test_qld_failures_after_resit() {
        let mut record = plain(30, 50, 60);
        record.module.foundational = true;
        record.results[0].resit_mark = Some(38);
        assert_eq!(record.qld_failures_after_resit(PASS_MARK).len(), 1);
        record.results[0].resit_mark = Some(41);
        assert!(record.qld_failures_after_resit(PASS_MARK).is_empty());
    }

    #[test]
    fn test_capped_mark() {
        let mut record = plain(30, 30, 30);
        record.results[0].resit_mark = Some(60);
        record.results[1].resit_mark = Some(60);
        record.results[2].resit_mark = Some(60);
        record.recalculate();
        assert_eq!(record.capped_mark(PASS_MARK).as_deref(), Some("60 (capped at 40)"));

        let mut fine = plain(60, 60, 60);
        fine.recalculate();
        assert_eq!(fine.capped_mark(PASS_MARK).as_deref(), Some("60"));

        let mut granted = record.clone();
        for result in &mut granted.results {
            result.concessions = Concession::Granted;
        }
        assert_eq!(granted.capped_mark(PASS_MARK).as_deref(), Some("60"));

        let empty = plain(0, 0, 0);
        assert_eq!(empty.capped_mark(PASS_MARK), None);
    }

    #[test]
    fn test_results_as_strings_put_exam_last() {
        let mut record = plain(35, 42, 38);
        record.results[0].resit_mark = Some(45);
        let strings = record.all_results_as_strings();
        assert_eq!(strings[0], ("Essay", Some("35 (Resubmission: 45)".to_string())));
        assert_eq!(strings[2], ("Exam", Some("38".to_string())));
    }

    #[test]
    fn test_required_actions() {
        let mut record = record([
            (Some(35), Concession::None),
            (Some(42), Concession::Pending),
            (Some(38), Concession::Granted),
        ]);
        record.recalculate();
        let actions: Vec<(&str, &str)> = record
            .required_actions(PASS_MARK)
            .into_iter()
            .map(|(a, _, action)| (a.title.as_str(), action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("Essay", "Resubmit"),
                ("Presentation", "Concessions Pending"),
                ("Exam", "Sit")
            ]
        );
    }

    #[test]
    fn test_qld_actions_in_passed_module() {
        let mut record = plain(35, 50, 50);
        record.module.foundational = true;
        record.recalculate();
        let actions: Vec<&str> = record
            .required_actions(PASS_MARK)
            .into_iter()
            .map(|(_, _, action)| action)
            .collect();
        assert_eq!(actions, vec!["Resubmit (QLD)", "", ""]);
    }

    #[test]
    fn test_board_comments() {
        let mut record = record([
            (Some(35), Concession::None),
            (Some(42), Concession::None),
            (Some(38), Concession::Granted),
        ]);
        assert_eq!(record.board_comments(PASS_MARK), "Resubmit Essay, Sit Exam");

        let mut qld = plain(35, 50, 50);
        qld.module.foundational = true;
        assert_eq!(qld.board_comments(PASS_MARK), "Resubmit Essay (QLD)");
    }

    #[test]
    fn test_all_concessions() {
        let record = record([
            (Some(35), Concession::None),
            (Some(42), Concession::Pending),
            (Some(38), Concession::Granted),
        ]);
        assert_eq!(
            record.all_concessions(Attempt::First),
            vec![
                ("essay", Concession::None),
                ("presentation", Concession::Pending),
                ("exam", Concession::Granted)
            ]
        );
    }
}
