//! Year-end progression
//!
//! The board records a [`NextYear`] decision for every student. At the end of
//! the academic year [`proceed_to_next_year`] applies all decisions at once:
//! students move up, repeat, graduate or leave, notes record outstanding
//! resits, and the department's current year advances.

use serde::Serialize;
use std::fmt;

use crate::calendar::academic_year_string;
use crate::marks::{ModuleRecord, PASS_MARK};
use crate::models::{Degree, NextYear, Student, StudyYear};
use crate::store::{Store, StudentFilter};
use crate::{info, verbose, warn};
use crate::{Error, Result};

/// Thresholds used when suggesting decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Lowest passing module mark
    pub pass_mark: i32,
    /// Lowest failed module mark that can be compensated
    pub compensation_floor: i32,
    /// Most failed credits that can be compensated
    pub max_compensated_credits: u32,
    /// Most failed credits that can be trailed into the next year
    pub max_trailed_credits: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            pass_mark: PASS_MARK,
            compensation_floor: 30,
            max_compensated_credits: 20,
            max_trailed_credits: 40,
        }
    }
}

/// A student's year in numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearStanding {
    /// Credits taken
    pub credits: u32,
    /// Credits of failed modules
    pub failed_credits: u32,
    /// Credit-weighted average, rounded half to even
    pub average: Option<i32>,
    /// Failed modules with their marks
    pub failed: Vec<(String, i32)>,
    /// Modules with QLD resits outstanding
    pub qld_resits: Vec<String>,
}

impl YearStanding {
    /// Sum up the module records of one year
    #[must_use]
    pub fn from_records(records: &[ModuleRecord], rules: &Rules) -> Self {
        let mut standing = Self::default();
        let mut weighted = 0.0;
        for record in records {
            let credits = record.module.credits;
            let real = record
                .performance
                .real_average
                .unwrap_or_else(|| record.calculate_average().real);
            let rounded = record
                .performance
                .average
                .unwrap_or_else(|| record.calculate_average().rounded);
            standing.credits += credits;
            weighted += real * f64::from(credits);
            if rounded < rules.pass_mark {
                standing.failed_credits += credits;
                standing.failed.push((record.module.to_string(), rounded));
            }
            if !record.qld_resit_required(rules.pass_mark).is_empty() {
                standing.qld_resits.push(record.module.to_string());
            }
        }
        if standing.credits > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let average = (weighted / f64::from(standing.credits)).round_ties_even() as i32;
            standing.average = Some(average);
        }
        standing
    }

    fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Decision the board would normally take, `None` when there is nothing to
/// decide (no stage, alumni or no modules this year)
#[must_use]
pub fn suggest_next_year(
    student: &Student,
    records: &[ModuleRecord],
    rules: &Rules,
) -> Option<NextYear> {
    let year = student.year.filter(|y| *y != StudyYear::Alumni)?;
    let standing = YearStanding::from_records(records, rules);
    let average = standing.average?;
    // Compensated finalists can average below the pass mark and still get a third
    let graduate = || {
        NextYear::Graduate(Degree::classify(average, rules.pass_mark).unwrap_or(Degree::Third))
    };

    if standing.failed_credits == 0 {
        return Some(if year.is_final() {
            graduate()
        } else if standing.qld_resits.is_empty() {
            NextYear::Proceed
        } else {
            NextYear::ProceedQld
        });
    }
    let compensable = standing.failed_credits <= rules.max_compensated_credits
        && standing
            .failed
            .iter()
            .all(|(_, mark)| *mark >= rules.compensation_floor);
    if compensable {
        return Some(if year.is_final() {
            graduate()
        } else {
            NextYear::ProceedCompensated
        });
    }
    if !year.is_final() && standing.failed_credits <= rules.max_trailed_credits {
        return Some(NextYear::ProceedTrailing);
    }
    Some(NextYear::Repeat)
}

/// What a decision did to a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Moved up a stage
    Advanced {
        /// Stage before
        from: StudyYear,
        /// Stage after
        to: StudyYear,
    },
    /// Part-time student finished the first half of a stage
    FirstPartTimeYear,
    /// Stays in the same stage
    Repeats,
    /// Left with an award
    Graduated(Degree),
    /// Left without an award
    Withdrawn,
    /// Decision could not be applied; the student is unchanged
    Skipped(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advanced { from, to } => write!(f, "year {from} to year {to}"),
            Self::FirstPartTimeYear => f.write_str("second part-time year"),
            Self::Repeats => f.write_str("repeats"),
            Self::Graduated(degree) => write!(f, "left with {degree}"),
            Self::Withdrawn => f.write_str("withdrawn"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

fn advance(student: &mut Student) -> Outcome {
    let Some(from) = student.year else {
        return Outcome::Skipped("no year of study".to_string());
    };
    let Some(to) = from.next() else {
        return Outcome::Skipped(format!("year {from} is a final year"));
    };
    if student.is_part_time && !student.second_part_time_year {
        student.second_part_time_year = true;
        return Outcome::FirstPartTimeYear;
    }
    student.second_part_time_year = false;
    student.year = Some(to);
    Outcome::Advanced { from, to }
}

fn leave_with(student: &mut Student, degree: Degree, current_year: i32) -> Outcome {
    student.year = Some(StudyYear::Alumni);
    student.achieved_degree = Some(degree);
    student.graduated_in = Some(current_year);
    Outcome::Graduated(degree)
}

/// Apply one decision to a student record
///
/// `standing` supplies the modules named in the notes. The decision is
/// cleared unless the outcome is [`Outcome::Skipped`].
pub fn apply_decision(
    student: &mut Student,
    decision: NextYear,
    current_year: i32,
    standing: &YearStanding,
) -> Outcome {
    let session = academic_year_string(current_year);
    let outcome = match decision {
        NextYear::Proceed => advance(student),
        NextYear::ProceedQld => {
            let outcome = advance(student);
            if !matches!(outcome, Outcome::Skipped(_)) {
                student.add_note(&format!(
                    "{session}: QLD resit(s) outstanding in {}",
                    standing.qld_resits.join(", ")
                ));
            }
            outcome
        }
        NextYear::ProceedTrailing => {
            let outcome = advance(student);
            if !matches!(outcome, Outcome::Skipped(_)) {
                student.add_note(&format!(
                    "{session}: trailing {}",
                    standing.failed_names().join(", ")
                ));
            }
            outcome
        }
        NextYear::ProceedCompensated => {
            let outcome = advance(student);
            if !matches!(outcome, Outcome::Skipped(_)) {
                student.add_note(&format!(
                    "{session}: compensated in {}",
                    standing.failed_names().join(", ")
                ));
            }
            outcome
        }
        NextYear::Repeat => {
            student.add_note(&format!("{session}: repeating the year"));
            Outcome::Repeats
        }
        NextYear::RepeatAbsj => {
            student.add_note(&format!("{session}: absent, subject to judgement"));
            Outcome::Repeats
        }
        NextYear::Graduate(degree) => leave_with(student, degree, current_year),
        NextYear::CertHe => leave_with(student, Degree::CertHe, current_year),
        NextYear::DipHe => leave_with(student, Degree::DipHe, current_year),
        NextYear::Ordinary => leave_with(student, Degree::Ordinary, current_year),
        NextYear::Withdraw => {
            student.achieved_degree = Some(Degree::NoDegree);
            student.active = false;
            Outcome::Withdrawn
        }
    };
    if !matches!(outcome, Outcome::Skipped(_)) {
        student.next_year = None;
    }
    outcome
}

/// One applied decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// Student id
    pub student_id: String,
    /// "Last, First"
    pub name: String,
    /// Decision that was applied
    pub decision: NextYear,
    /// What happened
    pub outcome: Outcome,
}

/// Result of [`proceed_to_next_year`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionSummary {
    /// Academic year that ended
    pub from_year: i32,
    /// Academic year now current
    pub to_year: i32,
    /// Averages recalculated before applying decisions
    pub recalculated: usize,
    /// Applied decisions, by name
    pub changes: Vec<Change>,
    /// Active students in a stage who had no decision
    pub undecided: Vec<String>,
}

impl ProgressionSummary {
    /// Changes whose decision could not be applied
    pub fn skipped(&self) -> impl Iterator<Item = &Change> {
        self.changes
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Skipped(_)))
    }
}

/// Suggested decisions for the active students of one stage
///
/// # Errors
/// Fails on a database error.
pub fn suggest_for_year(
    store: &Store,
    year: StudyYear,
    rules: &Rules,
) -> Result<Vec<(Student, Option<NextYear>)>> {
    let current_year = store.current_year()?;
    store
        .students(&StudentFilter::active_in(year))?
        .into_iter()
        .map(|student| {
            let records = store.year_records(&student, current_year)?;
            let suggestion = suggest_next_year(&student, &records, rules);
            Ok((student, suggestion))
        })
        .collect()
}

/// Record or clear the board's decision for a student
///
/// # Errors
/// [`Error::NotFound`] for an unknown student, [`Error::Invalid`] for a
/// student who is no longer active.
pub fn set_next_year(
    store: &Store,
    student_id: &str,
    decision: Option<NextYear>,
) -> Result<Student> {
    let mut student = store.get_student(student_id)?;
    if !student.active {
        return Err(Error::invalid(
            "student",
            format!("{student} is no longer active"),
        ));
    }
    student.next_year = decision;
    store.update_student(&student)?;
    match decision {
        Some(d) => info!("Decision for {student}: {d}"),
        None => info!("Decision for {student} cleared"),
    }
    Ok(student)
}

/// Apply every recorded decision and move the department to the next year
///
/// Runs in one transaction: averages of the current year are recalculated
/// first, then each active student's decision is applied and cleared, and
/// finally the current year is incremented. Students without a decision are
/// listed and left unchanged. Any failure rolls everything back.
///
/// # Errors
/// Fails on a database error.
pub fn proceed_to_next_year(store: &Store, rules: &Rules) -> Result<ProgressionSummary> {
    store.in_transaction(|store| {
        let from_year = store.current_year()?;
        let recalculated = store.recalculate_year(from_year)?;
        let mut changes = Vec::new();
        let mut undecided = Vec::new();

        let filter = StudentFilter {
            active_only: true,
            ..StudentFilter::default()
        };
        for mut student in store.students(&filter)? {
            let Some(decision) = student.next_year else {
                if student.year.is_some_and(|y| y != StudyYear::Alumni) {
                    undecided.push(format!("{} ({})", student, student.student_id));
                }
                continue;
            };
            let records = store.year_records(&student, from_year)?;
            let standing = YearStanding::from_records(&records, rules);
            let outcome = apply_decision(&mut student, decision, from_year, &standing);
            match &outcome {
                Outcome::Skipped(reason) => {
                    warn!("{student}: {} not applied, {reason}", decision.code());
                }
                other => verbose!("{student}: {other}"),
            }
            store.save_student(&student)?;
            changes.push(Change {
                student_id: student.student_id.clone(),
                name: student.to_string(),
                decision,
                outcome,
            });
        }

        let to_year = from_year + 1;
        store.set_current_year(to_year)?;
        if !undecided.is_empty() {
            warn!("{} students had no decision", undecided.len());
        }
        info!(
            "Proceeded from {} to {}: {} decisions applied",
            academic_year_string(from_year),
            academic_year_string(to_year),
            changes.len()
        );
        Ok(ProgressionSummary {
            from_year,
            to_year,
            recalculated,
            changes,
            undecided,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assessment, AssessmentResult, Module, Performance};

    fn record(title: &str, credits: u32, mark: i32, foundational: bool) -> ModuleRecord {
        let mut module = Module::new(title, title, 1900);
        module.id = Some(1);
        module.credits = credits;
        module.foundational = foundational;
        let assessment = Assessment {
            id: Some(1),
            ..Assessment::new(1, "Exam", 100)
        };
        let result = AssessmentResult {
            mark: Some(mark),
            ..AssessmentResult::new(1, 1)
        };
        let mut record = ModuleRecord::new(
            module,
            true,
            Performance::new("bb23".to_string(), 1),
            vec![assessment],
            vec![result],
        );
        record.recalculate();
        record
    }

    fn student(year: StudyYear) -> Student {
        let mut student = Student::new("bb23".to_string(), "Bugs".to_string(), "Bunny".to_string());
        student.year = Some(year);
        student
    }

    fn suggest(year: StudyYear, records: &[ModuleRecord]) -> Option<NextYear> {
        suggest_next_year(&student(year), records, &Rules::default())
    }

    #[test]
    fn test_all_passed_proceeds() {
        let records = [record("A", 60, 55, false), record("B", 60, 45, false)];
        assert_eq!(suggest(StudyYear::First, &records), Some(NextYear::Proceed));
    }

    #[test]
    fn test_qld_problems_proceed_with_qld_resit() {
        let mut passed = record("A", 60, 80, true);
        passed.assessments[0].value = 50;
        let essay = Assessment {
            id: Some(2),
            ..Assessment::new(1, "Essay", 50)
        };
        passed.assessments.push(essay);
        passed.results.push(AssessmentResult {
            mark: Some(35),
            ..AssessmentResult::new(1, 2)
        });
        passed.recalculate();
        assert_eq!(passed.performance.average, Some(58));
        assert_eq!(suggest(StudyYear::First, &[passed]), Some(NextYear::ProceedQld));
    }

    #[test]
    fn test_final_year_graduates_with_class() {
        let records = [record("A", 60, 72, false), record("B", 60, 64, false)];
        assert_eq!(
            suggest(StudyYear::Third, &records),
            Some(NextYear::Graduate(Degree::UpperSecond))
        );
    }

    #[test]
    fn test_compensation() {
        let records = [
            record("A", 20, 35, false),
            record("B", 60, 60, false),
            record("C", 40, 60, false),
        ];
        assert_eq!(
            suggest(StudyYear::Second, &records),
            Some(NextYear::ProceedCompensated)
        );
        assert_eq!(
            suggest(StudyYear::Third, &records),
            Some(NextYear::Graduate(Degree::LowerSecond))
        );
    }

    #[test]
    fn test_compensated_finalist_below_pass_mark_graduates_with_third() {
        let records = [record("A", 20, 30, false), record("B", 20, 40, false)];
        assert_eq!(
            suggest(StudyYear::Third, &records),
            Some(NextYear::Graduate(Degree::Third))
        );
        assert_eq!(
            suggest(StudyYear::First, &records),
            Some(NextYear::ProceedCompensated)
        );
    }

    #[test]
    fn test_below_floor_trails_or_repeats() {
        let records = [record("A", 20, 25, false), record("B", 100, 60, false)];
        assert_eq!(
            suggest(StudyYear::First, &records),
            Some(NextYear::ProceedTrailing)
        );
        assert_eq!(suggest(StudyYear::Third, &records), Some(NextYear::Repeat));
    }

    #[test]
    fn test_too_many_failed_credits_repeat() {
        let records = [record("A", 60, 30, false), record("B", 60, 60, false)];
        assert_eq!(suggest(StudyYear::First, &records), Some(NextYear::Repeat));
    }

    #[test]
    fn test_nothing_to_suggest() {
        assert_eq!(suggest(StudyYear::First, &[]), None);
        assert_eq!(suggest(StudyYear::Alumni, &[record("A", 20, 50, false)]), None);
    }

    #[test]
    fn test_standing_uses_credit_weights() {
        let records = [record("A", 20, 30, false), record("B", 100, 60, false)];
        let standing = YearStanding::from_records(&records, &Rules::default());
        assert_eq!(standing.credits, 120);
        assert_eq!(standing.failed_credits, 20);
        assert_eq!(standing.average, Some(55));
        assert_eq!(standing.failed, vec![("A (1900/01)".to_string(), 30)]);
    }

    #[test]
    fn test_apply_proceed() {
        let mut bugs = student(StudyYear::First);
        bugs.next_year = Some(NextYear::Proceed);
        let outcome = apply_decision(&mut bugs, NextYear::Proceed, 1900, &YearStanding::default());
        assert_eq!(
            outcome,
            Outcome::Advanced {
                from: StudyYear::First,
                to: StudyYear::Second
            }
        );
        assert_eq!(bugs.year, Some(StudyYear::Second));
        assert_eq!(bugs.next_year, None);
    }

    #[test]
    fn test_part_time_students_advance_every_second_year() {
        let mut bugs = student(StudyYear::First);
        bugs.is_part_time = true;
        let standing = YearStanding::default();
        assert_eq!(
            apply_decision(&mut bugs, NextYear::Proceed, 1900, &standing),
            Outcome::FirstPartTimeYear
        );
        assert_eq!(bugs.year, Some(StudyYear::First));
        assert!(bugs.second_part_time_year);
        apply_decision(&mut bugs, NextYear::Proceed, 1901, &standing);
        assert_eq!(bugs.year, Some(StudyYear::Second));
        assert!(!bugs.second_part_time_year);
    }

    #[test]
    fn test_trailing_and_qld_notes() {
        let standing = YearStanding {
            failed: vec![("Hunting Practice (1900/01)".to_string(), 35)],
            qld_resits: vec!["Duck Law (1900/01)".to_string()],
            ..YearStanding::default()
        };
        let mut bugs = student(StudyYear::First);
        apply_decision(&mut bugs, NextYear::ProceedTrailing, 1900, &standing);
        assert_eq!(bugs.notes, "1900/01: trailing Hunting Practice (1900/01)");
        apply_decision(&mut bugs, NextYear::ProceedQld, 1901, &standing);
        assert_eq!(
            bugs.notes,
            "1900/01: trailing Hunting Practice (1900/01)\n\
             1901/02: QLD resit(s) outstanding in Duck Law (1900/01)"
        );
        assert_eq!(bugs.year, Some(StudyYear::Third));
    }

    #[test]
    fn test_graduation_and_exit_awards() {
        let standing = YearStanding::default();
        let mut bugs = student(StudyYear::Third);
        let outcome = apply_decision(&mut bugs, NextYear::Graduate(Degree::First), 1900, &standing);
        assert_eq!(outcome, Outcome::Graduated(Degree::First));
        assert_eq!(bugs.year, Some(StudyYear::Alumni));
        assert_eq!(bugs.achieved_degree, Some(Degree::First));
        assert_eq!(bugs.graduated_in, Some(1900));

        let mut daffy = student(StudyYear::Second);
        apply_decision(&mut daffy, NextYear::DipHe, 1900, &standing);
        assert_eq!(daffy.achieved_degree, Some(Degree::DipHe));
        assert!(daffy.active);
    }

    #[test]
    fn test_withdrawal() {
        let mut bugs = student(StudyYear::Second);
        let outcome = apply_decision(&mut bugs, NextYear::Withdraw, 1900, &YearStanding::default());
        assert_eq!(outcome, Outcome::Withdrawn);
        assert!(!bugs.active);
        assert_eq!(bugs.achieved_degree, Some(Degree::NoDegree));
        assert_eq!(bugs.year, Some(StudyYear::Second));
    }

    #[test]
    fn test_proceed_in_final_year_is_skipped() {
        let mut bugs = student(StudyYear::Third);
        bugs.next_year = Some(NextYear::Proceed);
        let outcome = apply_decision(&mut bugs, NextYear::Proceed, 1900, &YearStanding::default());
        assert!(matches!(outcome, Outcome::Skipped(_)));
        assert_eq!(bugs.year, Some(StudyYear::Third));
        assert_eq!(bugs.next_year, Some(NextYear::Proceed));
    }

    #[test]
    fn test_repeat_keeps_year() {
        let mut bugs = student(StudyYear::Second);
        let outcome = apply_decision(&mut bugs, NextYear::Repeat, 1900, &YearStanding::default());
        assert_eq!(outcome, Outcome::Repeats);
        assert_eq!(bugs.year, Some(StudyYear::Second));
        assert_eq!(bugs.notes, "1900/01: repeating the year");
    }
}
