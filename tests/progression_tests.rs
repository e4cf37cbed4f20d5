//! End-to-end tests of a year: enrolment, marks, board decisions and proceeding

use nomosdb::models::{
    Assessment, Attempt, Concession, Degree, Module, NextYear, Student, StudyYear,
};
use nomosdb::progression::{
    proceed_to_next_year, set_next_year, suggest_for_year, Outcome, Rules,
};
use nomosdb::report::{ProgressionReport, ReportGenerator};
use nomosdb::store::Store;

fn student(store: &Store, id: &str, first: &str, last: &str, year: StudyYear) {
    let mut student = Student::new(id.to_string(), first.to_string(), last.to_string());
    student.year = Some(year);
    student.since = Some(2024);
    store.add_student(&student).unwrap();
}

fn module(
    store: &Store,
    code: &str,
    title: &str,
    eligible: &str,
    parts: &[(&str, u32)],
) -> (Module, Vec<Assessment>) {
    let mut module = Module::new(title, code, 2024);
    module.eligible = eligible.to_string();
    let module_id = store.add_module(&mut module).unwrap();
    let assessments = parts
        .iter()
        .map(|(title, value)| {
            let mut assessment = Assessment::new(module_id, title, *value);
            store.add_assessment(&mut assessment).unwrap();
            assessment
        })
        .collect();
    (module, assessments)
}

/// Looney Law School at the end of 2024/25
fn department() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.set_current_year(2024).unwrap();

    student(&store, "bb23", "Bugs", "Bunny", StudyYear::First);
    student(&store, "dd42", "Daffy", "Duck", StudyYear::First);
    student(&store, "pp01", "Porky", "Pig", StudyYear::Third);
    student(&store, "tt07", "Tweety", "Bird", StudyYear::Second);

    let (crime, crime_parts) = module(
        &store,
        "LW100",
        "Criminal Law",
        "1",
        &[("Essay", 50), ("Exam", 50)],
    );
    let (dissertation, dissertation_parts) =
        module(&store, "LW300", "Dissertation", "3", &[("Dissertation", 100)]);

    let crime_id = crime.id.unwrap();
    for id in ["bb23", "dd42"] {
        store.enroll(id, crime_id).unwrap();
    }
    store.enroll("pp01", dissertation.id.unwrap()).unwrap();

    let (essay, exam) = (&crime_parts[0], &crime_parts[1]);
    store.set_mark("bb23", essay, Attempt::First, Some(70)).unwrap();
    store.set_mark("bb23", exam, Attempt::First, Some(68)).unwrap();
    store.set_mark("dd42", essay, Attempt::First, Some(20)).unwrap();
    store.set_mark("dd42", exam, Attempt::First, Some(30)).unwrap();
    store
        .set_mark("pp01", &dissertation_parts[0], Attempt::First, Some(65))
        .unwrap();
    store
}

#[test]
fn marks_update_the_stored_average() {
    let store = department();
    let crime = store.find_module("LW100", 2024).unwrap();
    let bugs = store.get_performance("bb23", crime.id.unwrap()).unwrap();
    let daffy = store.get_performance("dd42", crime.id.unwrap()).unwrap();
    assert_eq!(bugs.average, Some(69));
    assert_eq!(daffy.average, Some(25));

    let nines = store.nines(crime.id.unwrap()).unwrap();
    assert_eq!(nines.len(), 1);
    assert_eq!(nines[0].0.student_id, "bb23");
}

#[test]
fn resit_raises_the_mark() {
    let store = department();
    let crime = store.find_module("LW100", 2024).unwrap();
    let exam = store.find_assessment(crime.id.unwrap(), "exam").unwrap();

    store.set_mark("dd42", &exam, Attempt::Resit, Some(60)).unwrap();
    let daffy = store.get_performance("dd42", crime.id.unwrap()).unwrap();
    assert_eq!(daffy.average, Some(40));

    let result = store
        .set_concession("dd42", &exam, Attempt::First, Concession::Granted)
        .unwrap();
    assert_eq!(result.concessions, Concession::Granted);
    assert_eq!(result.resit_mark, Some(60));
}

#[test]
fn suggestions_follow_the_rules() {
    let store = department();
    let rules = Rules::default();

    let first_years = suggest_for_year(&store, StudyYear::First, &rules).unwrap();
    let suggested: Vec<(&str, Option<NextYear>)> = first_years
        .iter()
        .map(|(s, d)| (s.student_id.as_str(), *d))
        .collect();
    assert_eq!(
        suggested,
        vec![
            ("bb23", Some(NextYear::Proceed)),
            ("dd42", Some(NextYear::ProceedTrailing)),
        ]
    );

    let finalists = suggest_for_year(&store, StudyYear::Third, &rules).unwrap();
    assert_eq!(finalists[0].1, Some(NextYear::Graduate(Degree::UpperSecond)));

    let second_years = suggest_for_year(&store, StudyYear::Second, &rules).unwrap();
    assert_eq!(second_years[0].1, None, "no modules, nothing to suggest");
}

#[test]
fn proceeding_applies_every_decision() {
    let store = department();
    let rules = Rules::default();
    for year in [StudyYear::First, StudyYear::Third] {
        for (student, suggestion) in suggest_for_year(&store, year, &rules).unwrap() {
            set_next_year(&store, &student.student_id, suggestion).unwrap();
        }
    }

    let summary = proceed_to_next_year(&store, &rules).unwrap();

    assert_eq!(summary.from_year, 2024);
    assert_eq!(summary.to_year, 2025);
    assert_eq!(store.current_year().unwrap(), 2025);
    assert_eq!(summary.changes.len(), 3);
    assert_eq!(summary.skipped().count(), 0);
    assert_eq!(summary.undecided, vec!["Bird, Tweety (tt07)".to_string()]);

    let bugs = store.get_student("bb23").unwrap();
    assert_eq!(bugs.year, Some(StudyYear::Second));
    assert_eq!(bugs.next_year, None);

    let daffy = store.get_student("dd42").unwrap();
    assert_eq!(daffy.year, Some(StudyYear::Second));
    assert!(daffy.notes.contains("2024/25: trailing Criminal Law (2024/25)"));

    let porky = store.get_student("pp01").unwrap();
    assert_eq!(porky.year, Some(StudyYear::Alumni));
    assert_eq!(porky.achieved_degree, Some(Degree::UpperSecond));
    assert_eq!(porky.graduated_in, Some(2024));

    let tweety = store.get_student("tt07").unwrap();
    assert_eq!(tweety.year, Some(StudyYear::Second));

    let report = ProgressionReport::from(&summary).render_report().unwrap();
    assert!(report.starts_with("# Progression from 2024/25 to 2025/26"));
    assert!(report.contains("| Pig, Porky | pp01 | 21 (Graduate with 2:1) | left with 2:1 |"));
}

#[test]
fn final_year_proceed_is_skipped_and_kept() {
    let store = department();
    set_next_year(&store, "pp01", Some(NextYear::Proceed)).unwrap();

    let summary = proceed_to_next_year(&store, &Rules::default()).unwrap();

    let skipped: Vec<_> = summary.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert!(matches!(skipped[0].outcome, Outcome::Skipped(_)));
    let porky = store.get_student("pp01").unwrap();
    assert_eq!(porky.year, Some(StudyYear::Third));
    assert_eq!(porky.next_year, Some(NextYear::Proceed));
}

#[test]
fn withdrawn_students_cannot_get_new_decisions() {
    let store = department();
    set_next_year(&store, "dd42", Some(NextYear::Withdraw)).unwrap();
    proceed_to_next_year(&store, &Rules::default()).unwrap();

    let daffy = store.get_student("dd42").unwrap();
    assert!(!daffy.active);
    assert_eq!(daffy.achieved_degree, Some(Degree::NoDegree));
    assert!(set_next_year(&store, "dd42", Some(NextYear::Proceed)).is_err());
}

#[test]
fn failed_proceed_leaves_students_and_year_untouched() {
    let store = department();
    set_next_year(&store, "bb23", Some(NextYear::Proceed)).unwrap();
    set_next_year(&store, "dd42", Some(NextYear::ProceedTrailing)).unwrap();
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER lock_year BEFORE UPDATE ON settings
             WHEN NEW.name = 'current_year'
             BEGIN SELECT RAISE(ABORT, 'year is locked'); END;",
        )
        .unwrap();

    // Students are saved before the year moves on, so all of them must be undone
    assert!(proceed_to_next_year(&store, &Rules::default()).is_err());

    assert_eq!(store.current_year().unwrap(), 2024);
    let bugs = store.get_student("bb23").unwrap();
    assert_eq!(bugs.year, Some(StudyYear::First));
    assert_eq!(bugs.next_year, Some(NextYear::Proceed));
    let daffy = store.get_student("dd42").unwrap();
    assert_eq!(daffy.year, Some(StudyYear::First));
    assert_eq!(daffy.next_year, Some(NextYear::ProceedTrailing));
    assert!(daffy.notes.is_empty());

    store.connection().execute_batch("DROP TRIGGER lock_year;").unwrap();
    proceed_to_next_year(&store, &Rules::default()).unwrap();
    assert_eq!(store.current_year().unwrap(), 2025);
    assert_eq!(store.get_student("bb23").unwrap().year, Some(StudyYear::Second));
}

#[test]
fn proceeding_notes_compensation_and_qld_resits() {
    let store = department();
    let mut bugs = store.get_student("bb23").unwrap();
    bugs.qld = true;
    store.save_student(&bugs).unwrap();

    let mut contract = Module::new("Contract Law", "LW110", 2024);
    contract.foundational = true;
    let contract_id = store.add_module(&mut contract).unwrap();
    let mut essay = Assessment::new(contract_id, "Essay", 50);
    store.add_assessment(&mut essay).unwrap();
    let mut exam = Assessment::new(contract_id, "Exam", 50);
    store.add_assessment(&mut exam).unwrap();
    store.enroll("bb23", contract_id).unwrap();
    store.set_mark("bb23", &essay, Attempt::First, Some(30)).unwrap();
    store.set_mark("bb23", &exam, Attempt::First, Some(80)).unwrap();

    set_next_year(&store, "bb23", Some(NextYear::ProceedQld)).unwrap();
    set_next_year(&store, "dd42", Some(NextYear::ProceedCompensated)).unwrap();
    proceed_to_next_year(&store, &Rules::default()).unwrap();

    let bugs = store.get_student("bb23").unwrap();
    assert_eq!(bugs.year, Some(StudyYear::Second));
    assert_eq!(
        bugs.notes,
        "2024/25: QLD resit(s) outstanding in Contract Law (2024/25)"
    );
    let daffy = store.get_student("dd42").unwrap();
    assert_eq!(daffy.year, Some(StudyYear::Second));
    assert_eq!(daffy.notes, "2024/25: compensated in Criminal Law (2024/25)");
}

#[test]
fn part_time_students_advance_every_second_proceed() {
    let store = department();
    let mut sylvester =
        Student::new("ss99".to_string(), "Sylvester".to_string(), "Cat".to_string());
    sylvester.year = Some(StudyYear::First);
    sylvester.is_part_time = true;
    store.add_student(&sylvester).unwrap();

    set_next_year(&store, "ss99", Some(NextYear::Proceed)).unwrap();
    let summary = proceed_to_next_year(&store, &Rules::default()).unwrap();
    let change = summary
        .changes
        .iter()
        .find(|c| c.student_id == "ss99")
        .unwrap();
    assert_eq!(change.outcome, Outcome::FirstPartTimeYear);

    let sylvester = store.get_student("ss99").unwrap();
    assert_eq!(sylvester.year, Some(StudyYear::First));
    assert!(sylvester.second_part_time_year);
    assert_eq!(sylvester.next_year, None);

    set_next_year(&store, "ss99", Some(NextYear::Proceed)).unwrap();
    let summary = proceed_to_next_year(&store, &Rules::default()).unwrap();
    assert_eq!(summary.from_year, 2025);
    let sylvester = store.get_student("ss99").unwrap();
    assert_eq!(sylvester.year, Some(StudyYear::Second));
    assert!(!sylvester.second_part_time_year);
    assert_eq!(store.current_year().unwrap(), 2026);
}
