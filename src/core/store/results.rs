//! Assessment results, module averages and attendance

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, OptionalExtension, Row};

use super::modules::performance_from_row;
use super::Store;
use crate::attendance::Presence;
use crate::marks::{Average, ModuleRecord};
use crate::models::{
    Assessment, AssessmentResult, Attempt, Concession, Module, Performance, Student,
};
use crate::{debug, info};
use crate::{Error, Result};

fn concession(value: &str) -> Concession {
    value
        .chars()
        .next()
        .map_or(Concession::None, Concession::from_code)
}

fn result_from_row(row: &Row) -> rusqlite::Result<AssessmentResult> {
    let concessions: String = row.get("concessions")?;
    let second_concessions: String = row.get("second_concessions")?;
    Ok(AssessmentResult {
        id: row.get("id")?,
        performance_id: row.get("performance_id")?,
        assessment_id: row.get("assessment_id")?,
        mark: row.get("mark")?,
        resit_mark: row.get("resit_mark")?,
        second_resit_mark: row.get("second_resit_mark")?,
        qld_resit: row.get("qld_resit")?,
        concessions: concession(&concessions),
        second_concessions: concession(&second_concessions),
        assessment_group: row.get("assessment_group")?,
        resit_assessment_group: row.get("resit_assessment_group")?,
        last_modified: row.get::<_, Option<NaiveDateTime>>("last_modified")?,
    })
}

fn check_mark(mark: Option<i32>) -> Result<()> {
    match mark {
        Some(m) if !(0..=100).contains(&m) => Err(Error::invalid(
            "mark",
            format!("{m} is not between 0 and 100"),
        )),
        _ => Ok(()),
    }
}

impl Store {
    /// Results recorded for one enrolment
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn results(&self, performance_id: i64) -> Result<Vec<AssessmentResult>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM results WHERE performance_id = ?1")?;
        let results = stmt
            .query_map([performance_id], result_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    /// Result row for an enrolment and assessment, created empty if missing
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn result_for(
        &self,
        performance: &Performance,
        assessment: &Assessment,
    ) -> Result<AssessmentResult> {
        let performance_id = performance
            .id
            .ok_or_else(|| Error::not_found("enrolment", &performance.student_id))?;
        let assessment_id = assessment
            .id
            .ok_or_else(|| Error::not_found("assessment", &assessment.title))?;
        self.conn.execute(
            "INSERT OR IGNORE INTO results (performance_id, assessment_id) VALUES (?1, ?2)",
            [performance_id, assessment_id],
        )?;
        Ok(self.conn.query_row(
            "SELECT * FROM results WHERE performance_id = ?1 AND assessment_id = ?2",
            [performance_id, assessment_id],
            result_from_row,
        )?)
    }

    /// Write every field of a stored result
    ///
    /// # Errors
    /// [`Error::NotFound`] when the result has no id.
    pub fn save_result(&self, result: &AssessmentResult) -> Result<()> {
        let id = result
            .id
            .ok_or_else(|| Error::not_found("result", result.assessment_id))?;
        self.conn.execute(
            "UPDATE results SET mark = ?1, resit_mark = ?2, second_resit_mark = ?3,
                    qld_resit = ?4, concessions = ?5, second_concessions = ?6,
                    assessment_group = ?7, resit_assessment_group = ?8, last_modified = ?9
             WHERE id = ?10",
            params![
                result.mark,
                result.resit_mark,
                result.second_resit_mark,
                result.qld_resit,
                result.concessions.code().to_string(),
                result.second_concessions.code().to_string(),
                result.assessment_group,
                result.resit_assessment_group,
                result.last_modified,
                id,
            ],
        )?;
        Ok(())
    }

    /// Everything needed to judge one student's module
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn module_record(&self, student_id: &str, module_id: i64) -> Result<ModuleRecord> {
        let student = self.get_student(student_id)?;
        let module = self.get_module(module_id)?;
        self.record_for(&student, module)
    }

    fn record_for(&self, student: &Student, module: Module) -> Result<ModuleRecord> {
        let module_id = module.id.unwrap_or_default();
        let performance = self.get_performance(&student.student_id, module_id)?;
        let assessments = self.assessments(module_id)?;
        let results = match performance.id {
            Some(id) => self.results(id)?,
            None => Vec::new(),
        };
        Ok(ModuleRecord::new(
            module,
            student.qld,
            performance,
            assessments,
            results,
        ))
    }

    /// Records of every module a student takes in one academic year
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn year_records(&self, student: &Student, year: i32) -> Result<Vec<ModuleRecord>> {
        self.modules_of(&student.student_id, Some(year))?
            .into_iter()
            .map(|module| self.record_for(student, module))
            .collect()
    }

    /// Store the average held by a performance
    ///
    /// # Errors
    /// [`Error::NotFound`] when the performance has no id.
    pub fn save_average(&self, performance: &Performance) -> Result<()> {
        let id = performance
            .id
            .ok_or_else(|| Error::not_found("enrolment", &performance.student_id))?;
        self.conn.execute(
            "UPDATE performances SET average = ?1, real_average = ?2 WHERE id = ?3",
            params![performance.average, performance.real_average, id],
        )?;
        Ok(())
    }

    /// Recalculate and store one student's module average
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn recalculate(&self, student_id: &str, module_id: i64) -> Result<Average> {
        let mut record = self.module_record(student_id, module_id)?;
        let average = record.recalculate();
        self.save_average(&record.performance)?;
        debug!(
            "Average of {student_id} in {} is {} ({:.2})",
            record.module.key(),
            average.rounded,
            average.real
        );
        Ok(average)
    }

    /// Recalculate every average of a module in one transaction
    ///
    /// # Errors
    /// Fails on a database error; nothing is stored in that case.
    pub fn recalculate_module(&self, module_id: i64) -> Result<usize> {
        let enrolled = self.enrolled(module_id)?;
        self.in_transaction(|store| {
            for (student, _) in &enrolled {
                store.recalculate(&student.student_id, module_id)?;
            }
            Ok(enrolled.len())
        })
    }

    /// Recalculate every average in an academic year
    ///
    /// Runs inside the caller's transaction when there is one.
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn recalculate_year(&self, year: i32) -> Result<usize> {
        let mut count = 0;
        for module in self.modules(Some(year))? {
            let module_id = module.id.unwrap_or_default();
            for (student, _) in self.enrolled(module_id)? {
                self.recalculate(&student.student_id, module_id)?;
                count += 1;
            }
        }
        info!("Recalculated {count} averages for {year}");
        Ok(count)
    }

    /// Enter or clear a mark
    ///
    /// The timestamp changes only when the mark does. Entering a mark
    /// recalculates the module average; clearing one leaves it as it is.
    /// Mark and average are written together or not at all.
    ///
    /// # Errors
    /// [`Error::Invalid`] for a mark outside 0 to 100, [`Error::NotFound`]
    /// when the student is not enrolled.
    pub fn set_mark(
        &self,
        student_id: &str,
        assessment: &Assessment,
        attempt: Attempt,
        mark: Option<i32>,
    ) -> Result<AssessmentResult> {
        check_mark(mark)?;
        self.in_transaction(|store| {
            let performance = store.get_performance(student_id, assessment.module_id)?;
            let mut result = store.result_for(&performance, assessment)?;
            if result.set_mark(attempt, mark, Local::now().naive_local()) {
                store.save_result(&result)?;
                info!(
                    "{} mark of {student_id} for {}: {}",
                    attempt.label(),
                    assessment.title,
                    mark.map_or_else(|| "cleared".to_string(), |m| m.to_string())
                );
            }
            if mark.is_some() {
                store.recalculate(student_id, assessment.module_id)?;
            }
            Ok(result)
        })
    }

    /// Record a concession decision for an attempt
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn set_concession(
        &self,
        student_id: &str,
        assessment: &Assessment,
        attempt: Attempt,
        concession: Concession,
    ) -> Result<AssessmentResult> {
        let performance = self.get_performance(student_id, assessment.module_id)?;
        let mut result = self.result_for(&performance, assessment)?;
        result.set_concession(attempt, concession);
        self.save_result(&result)?;
        info!(
            "{} for {student_id} in {} ({})",
            concession.label(),
            assessment.title,
            attempt.label()
        );
        Ok(result)
    }

    /// Put a student into a marking group for an attempt
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn set_assessment_group(
        &self,
        student_id: &str,
        assessment: &Assessment,
        attempt: Attempt,
        group: Option<i32>,
    ) -> Result<()> {
        let performance = self.get_performance(student_id, assessment.module_id)?;
        let mut result = self.result_for(&performance, assessment)?;
        result.set_group(attempt, group);
        self.save_result(&result)
    }

    /// Students in one marking group of an assessment
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn group_members(
        &self,
        assessment: &Assessment,
        attempt: Attempt,
        group: i32,
    ) -> Result<Vec<String>> {
        let column = match attempt {
            Attempt::First => "assessment_group",
            _ => "resit_assessment_group",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT p.student_id FROM results r JOIN performances p ON p.id = r.performance_id
             WHERE r.assessment_id = ?1 AND r.{column} = ?2 ORDER BY p.student_id"
        ))?;
        let members = stmt
            .query_map(params![assessment.id, group], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(members)
    }

    /// Record attendance for one week; `None` clears it
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled,
    /// [`Error::Invalid`] for a week the module does not teach in.
    pub fn record_attendance(
        &self,
        student_id: &str,
        module: &Module,
        week: u32,
        presence: Option<Presence>,
    ) -> Result<Performance> {
        if !module.all_teaching_weeks().contains(&week) {
            return Err(Error::invalid(
                "week",
                format!("{module} has no session in week {week}"),
            ));
        }
        let module_id = module.id.unwrap_or_default();
        let mut performance = self.get_performance(student_id, module_id)?;
        match presence {
            Some(presence) => performance.attendance.record(week, presence),
            None => performance.attendance.clear(week),
        }
        self.conn.execute(
            "UPDATE performances SET attendance = ?1 WHERE student_id = ?2 AND module_id = ?3",
            params![performance.attendance.to_string(), student_id, module_id],
        )?;
        debug!("Attendance of {student_id} in week {week}: {presence:?}");
        Ok(performance)
    }

    /// Enrolments of a module whose average ends in 9
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn nines(&self, module_id: i64) -> Result<Vec<(Student, Performance)>> {
        Ok(self
            .enrolled(module_id)?
            .into_iter()
            .filter(|(_, p)| p.average_ends_in_nine())
            .collect())
    }

    /// Performance by id
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id.
    pub fn performance(&self, id: i64) -> Result<Performance> {
        self.conn
            .query_row(
                "SELECT * FROM performances WHERE id = ?1",
                [id],
                performance_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("enrolment", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyYear;

    struct Fixture {
        store: Store,
        module: Module,
        essay: Assessment,
        exam: Assessment,
    }

    fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        store.set_current_year(1900).unwrap();
        let mut bugs = Student::new("bb23".to_string(), "Bugs".to_string(), "Bunny".to_string());
        bugs.year = Some(StudyYear::First);
        store.add_student(&bugs).unwrap();
        let mut module = Module::new("Hunting Practice", "HP23", 1900);
        store.add_module(&mut module).unwrap();
        let module_id = module.id.unwrap();
        let mut essay = Assessment::new(module_id, "Essay", 40);
        let mut exam = Assessment::new(module_id, "Exam", 60);
        store.add_assessment(&mut essay).unwrap();
        store.add_assessment(&mut exam).unwrap();
        store.enroll("bb23", module_id).unwrap();
        Fixture {
            store,
            module,
            essay,
            exam,
        }
    }

    #[test]
    fn test_set_mark_updates_average() {
        let f = fixture();
        f.store.set_mark("bb23", &f.essay, Attempt::First, Some(50)).unwrap();
        f.store.set_mark("bb23", &f.exam, Attempt::First, Some(35)).unwrap();
        let performance = f.store.get_performance("bb23", f.module.id.unwrap()).unwrap();
        assert_eq!(performance.average, Some(41));
        assert!((performance.real_average.unwrap() - 41.0).abs() < 1e-9);
    }

    #[test]
    fn test_clearing_a_mark_keeps_the_average() {
        let f = fixture();
        f.store.set_mark("bb23", &f.essay, Attempt::First, Some(50)).unwrap();
        f.store.set_mark("bb23", &f.essay, Attempt::First, None).unwrap();
        let performance = f.store.get_performance("bb23", f.module.id.unwrap()).unwrap();
        assert_eq!(performance.average, Some(20));
        let record = f.store.module_record("bb23", f.module.id.unwrap()).unwrap();
        assert_eq!(record.results[0].mark, None);
    }

    #[test]
    fn test_mark_is_not_kept_when_the_average_cannot_be_stored() {
        let f = fixture();
        f.store
            .connection()
            .execute_batch(
                "CREATE TRIGGER freeze_averages BEFORE UPDATE OF average ON performances
                 BEGIN SELECT RAISE(ABORT, 'averages are frozen'); END;",
            )
            .unwrap();
        assert!(f.store.set_mark("bb23", &f.essay, Attempt::First, Some(50)).is_err());

        let module_id = f.module.id.unwrap();
        let performance = f.store.get_performance("bb23", module_id).unwrap();
        assert_eq!(performance.average, None);
        let record = f.store.module_record("bb23", module_id).unwrap();
        assert!(record.results.iter().all(|r| r.mark.is_none()));
    }

    #[test]
    fn test_marks_out_of_range_are_rejected() {
        let f = fixture();
        assert!(matches!(
            f.store.set_mark("bb23", &f.essay, Attempt::First, Some(101)),
            Err(Error::Invalid { .. })
        ));
    }

    #[test]
    fn test_last_modified_only_changes_with_the_mark() {
        let f = fixture();
        let first = f.store.set_mark("bb23", &f.essay, Attempt::First, Some(50)).unwrap();
        assert!(first.last_modified.is_some());
        let record = f.store.module_record("bb23", f.module.id.unwrap()).unwrap();
        assert_eq!(record.results[0].last_modified, first.last_modified);
    }

    #[test]
    fn test_concessions_are_stored() {
        let f = fixture();
        f.store
            .set_concession("bb23", &f.exam, Attempt::First, Concession::Granted)
            .unwrap();
        f.store
            .set_concession("bb23", &f.exam, Attempt::Resit, Concession::Pending)
            .unwrap();
        let record = f.store.module_record("bb23", f.module.id.unwrap()).unwrap();
        let result = &record.results[0];
        assert_eq!(result.concessions, Concession::Granted);
        assert_eq!(result.second_concessions, Concession::Pending);
    }

    #[test]
    fn test_module_record_and_recalculation() {
        let f = fixture();
        let module_id = f.module.id.unwrap();
        f.store.set_mark("bb23", &f.essay, Attempt::First, Some(30)).unwrap();
        f.store.set_mark("bb23", &f.exam, Attempt::First, Some(30)).unwrap();
        f.store.set_mark("bb23", &f.exam, Attempt::Resit, Some(60)).unwrap();
        assert_eq!(f.store.recalculate_module(module_id).unwrap(), 1);

        let record = f.store.module_record("bb23", module_id).unwrap();
        assert_eq!(record.performance.average, Some(48));
        assert_eq!(record.average_from_first_attempt(), 30);
        assert_eq!(
            record.capped_mark(40).as_deref(),
            Some("48 (capped at 40)")
        );
    }

    #[test]
    fn test_attendance() {
        let f = fixture();
        f.store
            .record_attendance("bb23", &f.module, 5, Some(Presence::Present))
            .unwrap();
        f.store
            .record_attendance("bb23", &f.module, 6, Some(Presence::Absent))
            .unwrap();
        let performance = f
            .store
            .record_attendance("bb23", &f.module, 7, Some(Presence::Excused))
            .unwrap();
        assert_eq!(performance.attendance.count(), "2/3");
        let stored = f.store.get_performance("bb23", f.module.id.unwrap()).unwrap();
        assert_eq!(stored.attendance, performance.attendance);
        assert!(f
            .store
            .record_attendance("bb23", &f.module, 30, Some(Presence::Present))
            .is_err());
    }

    #[test]
    fn test_nines() {
        let f = fixture();
        f.store.set_mark("bb23", &f.essay, Attempt::First, Some(49)).unwrap();
        f.store.set_mark("bb23", &f.exam, Attempt::First, Some(49)).unwrap();
        let nines = f.store.nines(f.module.id.unwrap()).unwrap();
        assert_eq!(nines.len(), 1);
        assert_eq!(nines[0].1.average, Some(49));
    }

    #[test]
    fn test_assessment_groups() {
        let f = fixture();
        f.store
            .set_assessment_group("bb23", &f.essay, Attempt::First, Some(2))
            .unwrap();
        assert_eq!(
            f.store.group_members(&f.essay, Attempt::First, 2).unwrap(),
            vec!["bb23"]
        );
        assert!(f
            .store
            .group_members(&f.essay, Attempt::Resit, 2)
            .unwrap()
            .is_empty());
    }
}
