//! Modules, their assessments and student enrolment

use rusqlite::{params, OptionalExtension, Row};

use super::{load_links, replace_links, unique_or, Store};
use crate::attendance::Attendance;
use crate::feedback::MarksheetType;
use crate::models::assessment::sort_for_display;
use crate::models::performance::belongs_to_year;
use crate::models::{Assessment, Module, Performance, Student};
use crate::{debug, info, warn};
use crate::{Error, Result};

fn module_from_row(row: &Row) -> rusqlite::Result<Module> {
    Ok(Module {
        id: row.get("id")?,
        code: row.get("code")?,
        year: row.get("year")?,
        title: row.get("title")?,
        subject_areas: Vec::new(),
        foundational: row.get("foundational")?,
        nalp: row.get("nalp")?,
        credits: row.get("credits")?,
        eligible: row.get("eligible")?,
        first_session: row.get("first_session")?,
        last_session: row.get("last_session")?,
        no_teaching_in: row.get("no_teaching_in")?,
        teachers: Vec::new(),
    })
}

fn marksheet(value: Option<String>) -> Option<MarksheetType> {
    value.and_then(|code| code.parse().ok())
}

fn assessment_from_row(row: &Row) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: row.get("id")?,
        module_id: row.get("module_id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        value: row.get("value")?,
        submission_date: row.get("submission_date")?,
        resit_submission_date: row.get("resit_submission_date")?,
        max_word_count: row.get("max_word_count")?,
        resit_max_word_count: row.get("resit_max_word_count")?,
        group_assessment: row.get("group_assessment")?,
        resit_group_assessment: row.get("resit_group_assessment")?,
        marksheet_type: marksheet(row.get("marksheet_type")?),
        resit_marksheet_type: marksheet(row.get("resit_marksheet_type")?),
        co_marking: row.get("co_marking")?,
        available: row.get("available")?,
        resit_available: row.get("resit_available")?,
        second_resit_available: row.get("second_resit_available")?,
        qld_resit_available: row.get("qld_resit_available")?,
    })
}

pub(super) fn performance_from_row(row: &Row) -> rusqlite::Result<Performance> {
    let attendance: String = row.get("attendance")?;
    Ok(Performance {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        module_id: row.get("module_id")?,
        seminar_group: row.get("seminar_group")?,
        belongs_to_year: row.get("belongs_to_year")?,
        average: row.get("average")?,
        real_average: row.get("real_average")?,
        attendance: Attendance::parse(&attendance),
    })
}

impl Store {
    fn save_module_links(&self, module: &Module, id: i64) -> Result<()> {
        for username in &module.teachers {
            self.get_staff(username)?;
        }
        replace_links(
            &self.conn,
            "module_subject_areas",
            "module_id",
            "slug",
            &id,
            &module.subject_areas,
        )?;
        replace_links(
            &self.conn,
            "module_teachers",
            "module_id",
            "username",
            &id,
            &module.teachers,
        )
    }

    fn load_module_links(&self, module: &mut Module) -> Result<()> {
        module.subject_areas = load_links(
            &self.conn,
            "module_subject_areas",
            "module_id",
            "slug",
            &module.id,
        )?;
        module.teachers = load_links(
            &self.conn,
            "module_teachers",
            "module_id",
            "username",
            &module.id,
        )?;
        Ok(())
    }

    /// Add a module and set its id
    ///
    /// # Errors
    /// [`Error::Invalid`] for bad credits or eligibility,
    /// [`Error::Duplicate`] when the code is already used in that year.
    pub fn add_module(&self, module: &mut Module) -> Result<i64> {
        module.validate()?;
        let id = self.in_transaction(|store| {
            store
                .conn
                .execute(
                    "INSERT INTO modules (code, year, title, foundational, nalp, credits,
                                          eligible, first_session, last_session, no_teaching_in)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        module.code,
                        module.year,
                        module.title,
                        module.foundational,
                        module.nalp,
                        module.credits,
                        module.eligible,
                        module.first_session,
                        module.last_session,
                        module.no_teaching_in,
                    ],
                )
                .map_err(|e| unique_or(e, "module", &module.key()))?;
            let id = store.conn.last_insert_rowid();
            store.save_module_links(module, id)?;
            Ok(id)
        })?;
        module.id = Some(id);
        info!("Module added: {module}");
        Ok(id)
    }

    /// Save changes to a stored module
    ///
    /// # Errors
    /// [`Error::NotFound`] when the module has no id or does not exist.
    pub fn update_module(&self, module: &Module) -> Result<()> {
        module.validate()?;
        let id = module
            .id
            .ok_or_else(|| Error::not_found("module", module.key()))?;
        self.in_transaction(|store| {
            let changed = store
                .conn
                .execute(
                    "UPDATE modules SET code = ?1, year = ?2, title = ?3, foundational = ?4,
                            nalp = ?5, credits = ?6, eligible = ?7, first_session = ?8,
                            last_session = ?9, no_teaching_in = ?10
                     WHERE id = ?11",
                    params![
                        module.code,
                        module.year,
                        module.title,
                        module.foundational,
                        module.nalp,
                        module.credits,
                        module.eligible,
                        module.first_session,
                        module.last_session,
                        module.no_teaching_in,
                        id,
                    ],
                )
                .map_err(|e| unique_or(e, "module", &module.key()))?;
            if changed == 0 {
                return Err(Error::not_found("module", module.key()));
            }
            store.save_module_links(module, id)
        })?;
        debug!("Module updated: {module}");
        Ok(())
    }

    /// Module by id
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id.
    pub fn get_module(&self, id: i64) -> Result<Module> {
        let mut module = self
            .conn
            .query_row("SELECT * FROM modules WHERE id = ?1", [id], module_from_row)
            .optional()?
            .ok_or_else(|| Error::not_found("module", id))?;
        self.load_module_links(&mut module)?;
        Ok(module)
    }

    /// Module by code and academic year
    ///
    /// # Errors
    /// [`Error::NotFound`] when no such module runs that year.
    pub fn find_module(&self, code: &str, year: i32) -> Result<Module> {
        let code = crate::models::module::normalize_code(code);
        let mut module = self
            .conn
            .query_row(
                "SELECT * FROM modules WHERE code = ?1 COLLATE NOCASE AND year = ?2",
                params![code, year],
                module_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("module", format!("{code}/{year}")))?;
        self.load_module_links(&mut module)?;
        Ok(module)
    }

    /// Modules by title, optionally only one academic year
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn modules(&self, year: Option<i32>) -> Result<Vec<Module>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM modules WHERE ?1 IS NULL OR year = ?1 ORDER BY year, title",
        )?;
        let mut modules = stmt
            .query_map([year], module_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for module in &mut modules {
            self.load_module_links(module)?;
        }
        Ok(modules)
    }

    /// Delete a module with its assessments, enrolments and results
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id.
    pub fn delete_module(&self, id: i64) -> Result<()> {
        let module = self.get_module(id)?;
        self.conn.execute("DELETE FROM modules WHERE id = ?1", [id])?;
        info!("Module deleted: {module}");
        Ok(())
    }

    /// Add an assessment to its module and set its id
    ///
    /// # Errors
    /// [`Error::Duplicate`] when the module already has that title,
    /// [`Error::Invalid`] for a weight above 100.
    pub fn add_assessment(&self, assessment: &mut Assessment) -> Result<i64> {
        if assessment.value > 100 {
            return Err(Error::invalid(
                "value",
                format!("{}% is more than the whole module", assessment.value),
            ));
        }
        let module = self.get_module(assessment.module_id)?;
        self.write_assessment(assessment)
            .map_err(|e| match e {
                Error::Database(db) => unique_or(db, "assessment", &assessment.title),
                other => other,
            })?;
        let id = self.conn.last_insert_rowid();
        assessment.id = Some(id);

        let total: u32 = self
            .assessments(assessment.module_id)?
            .iter()
            .map(|a| a.value)
            .sum();
        if total > 100 {
            warn!("Assessments of {module} add up to {total}%");
        }
        info!("Assessment added to {module}: {} ({}%)", assessment.title, assessment.value);
        Ok(id)
    }

    fn write_assessment(&self, assessment: &Assessment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO assessments (
                 id, module_id, title, slug, value, submission_date, resit_submission_date,
                 max_word_count, resit_max_word_count, group_assessment,
                 resit_group_assessment, marksheet_type, resit_marksheet_type, co_marking,
                 available, resit_available, second_resit_available, qld_resit_available)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title, slug = excluded.slug, value = excluded.value,
                 submission_date = excluded.submission_date,
                 resit_submission_date = excluded.resit_submission_date,
                 max_word_count = excluded.max_word_count,
                 resit_max_word_count = excluded.resit_max_word_count,
                 group_assessment = excluded.group_assessment,
                 resit_group_assessment = excluded.resit_group_assessment,
                 marksheet_type = excluded.marksheet_type,
                 resit_marksheet_type = excluded.resit_marksheet_type,
                 co_marking = excluded.co_marking, available = excluded.available,
                 resit_available = excluded.resit_available,
                 second_resit_available = excluded.second_resit_available,
                 qld_resit_available = excluded.qld_resit_available",
            params![
                assessment.id,
                assessment.module_id,
                assessment.title,
                assessment.slug,
                assessment.value,
                assessment.submission_date,
                assessment.resit_submission_date,
                assessment.max_word_count,
                assessment.resit_max_word_count,
                assessment.group_assessment,
                assessment.resit_group_assessment,
                assessment.marksheet_type.map(MarksheetType::code),
                assessment.resit_marksheet_type.map(MarksheetType::code),
                assessment.co_marking,
                assessment.available,
                assessment.resit_available,
                assessment.second_resit_available,
                assessment.qld_resit_available,
            ],
        )?;
        Ok(())
    }

    /// Save changes to a stored assessment
    ///
    /// # Errors
    /// [`Error::NotFound`] when the assessment has no id.
    pub fn update_assessment(&self, assessment: &Assessment) -> Result<()> {
        if assessment.id.is_none() {
            return Err(Error::not_found("assessment", &assessment.title));
        }
        self.write_assessment(assessment)
    }

    /// Assessments of a module, exam last
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn assessments(&self, module_id: i64) -> Result<Vec<Assessment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM assessments WHERE module_id = ?1")?;
        let mut assessments = stmt
            .query_map([module_id], assessment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        sort_for_display(&mut assessments);
        Ok(assessments)
    }

    /// Assessment of a module by slug or title
    ///
    /// # Errors
    /// [`Error::NotFound`] when the module has no such assessment.
    pub fn find_assessment(&self, module_id: i64, key: &str) -> Result<Assessment> {
        let slug = crate::models::slugify(key);
        self.assessments(module_id)?
            .into_iter()
            .find(|a| a.slug == slug || a.title.eq_ignore_ascii_case(key.trim()))
            .ok_or_else(|| Error::not_found("assessment", key))
    }

    /// Delete an assessment and all results for it
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id.
    pub fn delete_assessment(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM assessments WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::not_found("assessment", id));
        }
        info!("Assessment {id} deleted");
        Ok(())
    }

    /// Enrol a student in a module
    ///
    /// `belongs_to_year` is derived from the student's stage and the
    /// current year. Students outside the module's eligible stages are
    /// enrolled with a warning.
    ///
    /// # Errors
    /// [`Error::Duplicate`] when already enrolled, [`Error::NotFound`] for
    /// an unknown student or module.
    pub fn enroll(&self, student_id: &str, module_id: i64) -> Result<Performance> {
        let student = self.get_student(student_id)?;
        let module = self.get_module(module_id)?;
        let current_year = self.current_year()?;
        if let Some(year) = student.year {
            if !module.is_open_to(year) {
                warn!("{student} is in year {year}, {module} is for years {}", module.eligible);
            }
        }
        let mut performance = Performance::new(student.student_id.clone(), module_id);
        performance.belongs_to_year = student
            .year
            .map(|y| belongs_to_year(y.code(), current_year, module.year));
        self.conn
            .execute(
                "INSERT INTO performances (student_id, module_id, belongs_to_year, attendance)
                 VALUES (?1, ?2, ?3, '')",
                params![student.student_id, module_id, performance.belongs_to_year],
            )
            .map_err(|e| unique_or(e, "enrolment", &format!("{student_id} in {}", module.key())))?;
        performance.id = Some(self.conn.last_insert_rowid());
        info!("{student} enrolled in {module}");
        Ok(performance)
    }

    /// Remove a student from a module with all results
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn unenroll(&self, student_id: &str, module_id: i64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM performances WHERE student_id = ?1 AND module_id = ?2",
            params![student_id, module_id],
        )?;
        if deleted == 0 {
            return Err(Error::not_found(
                "enrolment",
                format!("{student_id} in module {module_id}"),
            ));
        }
        info!("{student_id} removed from module {module_id}");
        Ok(())
    }

    /// Enrolment of a student in a module
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn get_performance(&self, student_id: &str, module_id: i64) -> Result<Performance> {
        self.conn
            .query_row(
                "SELECT * FROM performances WHERE student_id = ?1 AND module_id = ?2",
                params![student_id, module_id],
                performance_from_row,
            )
            .optional()?
            .ok_or_else(|| {
                Error::not_found("enrolment", format!("{student_id} in module {module_id}"))
            })
    }

    /// Enrolled students with their performance, by name
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn enrolled(&self, module_id: i64) -> Result<Vec<(Student, Performance)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.* FROM performances p JOIN students s USING (student_id)
             WHERE p.module_id = ?1 ORDER BY s.last_name, s.first_name",
        )?;
        let performances = stmt
            .query_map([module_id], performance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        performances
            .into_iter()
            .map(|p| Ok((self.get_student(&p.student_id)?, p)))
            .collect()
    }

    /// Modules a student takes, optionally only those of one academic year
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn modules_of(&self, student_id: &str, year: Option<i32>) -> Result<Vec<Module>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.* FROM modules m JOIN performances p ON p.module_id = m.id
             WHERE p.student_id = ?1 AND (?2 IS NULL OR m.year = ?2)
             ORDER BY m.year, m.title",
        )?;
        let mut modules = stmt
            .query_map(params![student_id, year], module_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for module in &mut modules {
            self.load_module_links(module)?;
        }
        Ok(modules)
    }

    /// Put a student into a seminar group
    ///
    /// # Errors
    /// [`Error::NotFound`] when the student is not enrolled.
    pub fn set_seminar_group(
        &self,
        student_id: &str,
        module_id: i64,
        group: Option<i32>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE performances SET seminar_group = ?3 WHERE student_id = ?1 AND module_id = ?2",
            params![student_id, module_id, group],
        )?;
        if changed == 0 {
            return Err(Error::not_found(
                "enrolment",
                format!("{student_id} in module {module_id}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attempt, StudyYear};

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.set_current_year(1900).unwrap();
        let mut bugs = Student::new("bb23".to_string(), "Bugs".to_string(), "Bunny".to_string());
        bugs.year = Some(StudyYear::Second);
        store.add_student(&bugs).unwrap();
        store
    }

    fn hunting(store: &Store) -> Module {
        let mut module = Module::new("Hunting Practice", "HP 23", 1900);
        module.eligible = "12".to_string();
        store.add_module(&mut module).unwrap();
        module
    }

    #[test]
    fn test_module_round_trip() {
        let store = store();
        let module = hunting(&store);
        let id = module.id.unwrap();
        assert_eq!(store.get_module(id).unwrap(), module);
        assert_eq!(store.find_module("hp23", 1900).unwrap().id, Some(id));
        assert!(store.find_module("HP23", 1901).is_err());
    }

    #[test]
    fn test_module_code_unique_per_year() {
        let store = store();
        hunting(&store);
        let mut again = Module::new("Hunting Theory", "HP23", 1900);
        assert!(matches!(store.add_module(&mut again), Err(Error::Duplicate { .. })));
        let mut next_year = Module::new("Hunting Practice", "HP23", 1901);
        store.add_module(&mut next_year).unwrap();
        assert_eq!(store.modules(None).unwrap().len(), 2);
        assert_eq!(store.modules(Some(1901)).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_module_is_rejected() {
        let store = store();
        let mut module = Module::new("Hunting Practice", "HP23", 1900);
        module.credits = 25;
        assert!(matches!(store.add_module(&mut module), Err(Error::Invalid { .. })));
    }

    #[test]
    fn test_assessments_sorted_with_exam_last() {
        let store = store();
        let module_id = hunting(&store).id.unwrap();
        for (title, value) in [("Exam", 50), ("Presentation", 30), ("Essay", 20)] {
            store
                .add_assessment(&mut Assessment::new(module_id, title, value))
                .unwrap();
        }
        let titles: Vec<String> = store
            .assessments(module_id)
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Essay", "Presentation", "Exam"]);
        assert!(matches!(
            store.add_assessment(&mut Assessment::new(module_id, "Essay", 10)),
            Err(Error::Duplicate { .. })
        ));
        assert_eq!(store.find_assessment(module_id, "essay").unwrap().value, 20);
    }

    #[test]
    fn test_update_assessment() {
        let store = store();
        let module_id = hunting(&store).id.unwrap();
        let mut essay = Assessment::new(module_id, "Essay", 40);
        store.add_assessment(&mut essay).unwrap();
        essay.marksheet_type = Some(MarksheetType::Essay);
        essay.max_word_count = Some(2500);
        store.update_assessment(&essay).unwrap();
        assert_eq!(store.find_assessment(module_id, "Essay").unwrap(), essay);
    }

    #[test]
    fn test_update_module() {
        let store = store();
        let mut module = hunting(&store);
        module.title = "Advanced Hunting".to_string();
        module.credits = 40;
        store.update_module(&module).unwrap();
        assert_eq!(store.get_module(module.id.unwrap()).unwrap(), module);

        let mut unknown = Module::new("Fishing", "FP1", 1900);
        assert!(matches!(store.update_module(&unknown), Err(Error::NotFound { .. })));
        unknown.id = Some(99);
        assert!(matches!(store.update_module(&unknown), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_deleting_assessment_removes_results() {
        let store = store();
        let module_id = hunting(&store).id.unwrap();
        let mut essay = Assessment::new(module_id, "Essay", 100);
        store.add_assessment(&mut essay).unwrap();
        store.enroll("bb23", module_id).unwrap();
        store.set_mark("bb23", &essay, Attempt::First, Some(55)).unwrap();

        store.delete_assessment(essay.id.unwrap()).unwrap();
        assert!(store.assessments(module_id).unwrap().is_empty());
        let record = store.module_record("bb23", module_id).unwrap();
        assert!(record.results.is_empty());
        assert!(matches!(
            store.delete_assessment(essay.id.unwrap()),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_enrolment() {
        let store = store();
        let module_id = hunting(&store).id.unwrap();
        let performance = store.enroll("bb23", module_id).unwrap();
        assert_eq!(performance.belongs_to_year, Some(2));
        assert!(matches!(
            store.enroll("bb23", module_id),
            Err(Error::Duplicate { .. })
        ));
        assert_eq!(store.enrolled(module_id).unwrap().len(), 1);
        assert_eq!(store.modules_of("bb23", Some(1900)).unwrap().len(), 1);

        store.set_seminar_group("bb23", module_id, Some(3)).unwrap();
        assert_eq!(
            store.get_performance("bb23", module_id).unwrap().seminar_group,
            Some(3)
        );

        store.unenroll("bb23", module_id).unwrap();
        assert!(store.enrolled(module_id).unwrap().is_empty());
        assert!(store.unenroll("bb23", module_id).is_err());
    }

    #[test]
    fn test_deleting_module_removes_enrolments() {
        let store = store();
        let module_id = hunting(&store).id.unwrap();
        store.enroll("bb23", module_id).unwrap();
        store.delete_module(module_id).unwrap();
        assert!(store.modules_of("bb23", None).unwrap().is_empty());
        assert!(store.get_module(module_id).is_err());
    }
}
