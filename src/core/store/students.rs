//! Student records

use rusqlite::{params, params_from_iter, OptionalExtension, Row, ToSql};

use super::{unique_or, Store};
use crate::models::{Degree, NextYear, Student, StudyYear};
use crate::{debug, info};
use crate::{Error, Result};

/// Which students to list; every `None` field matches everyone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    /// Stage of study
    pub year: Option<StudyYear>,
    /// Subject area slug of the student's programme
    pub subject_area: Option<String>,
    /// Programme id
    pub course_id: Option<i64>,
    /// Personal tutor username
    pub tutor: Option<String>,
    /// Leave out inactive students
    pub active_only: bool,
}

impl StudentFilter {
    /// Active students in one stage
    #[must_use]
    pub const fn active_in(year: StudyYear) -> Self {
        Self {
            year: Some(year),
            subject_area: None,
            course_id: None,
            tutor: None,
            active_only: true,
        }
    }

    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(year) = self.year {
            conditions.push("year = ?");
            values.push(Box::new(year.code()));
        }
        if let Some(slug) = &self.subject_area {
            conditions
                .push("course_id IN (SELECT course_id FROM course_subject_areas WHERE slug = ?)");
            values.push(Box::new(slug.clone()));
        }
        if let Some(course_id) = self.course_id {
            conditions.push("course_id = ?");
            values.push(Box::new(course_id));
        }
        if let Some(tutor) = &self.tutor {
            conditions.push("tutor = ?");
            values.push(Box::new(tutor.clone()));
        }
        if self.active_only {
            conditions.push("active = 1");
        }
        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
    let year: Option<i32> = row.get("year")?;
    let degree: Option<i32> = row.get("achieved_degree")?;
    let next_year: Option<String> = row.get("next_year")?;
    Ok(Student {
        student_id: row.get("student_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        exam_id: row.get("exam_id")?,
        since: row.get("since")?,
        year: year.and_then(StudyYear::from_code),
        is_part_time: row.get("is_part_time")?,
        second_part_time_year: row.get("second_part_time_year")?,
        email: row.get("email")?,
        course_id: row.get("course_id")?,
        qld: row.get("qld")?,
        tutor: row.get("tutor")?,
        notes: row.get("notes")?,
        active: row.get("active")?,
        lsp: row.get("lsp")?,
        permanent_email: row.get("permanent_email")?,
        address: row.get("address")?,
        phone_number: row.get("phone_number")?,
        cell_number: row.get("cell_number")?,
        home_address: row.get("home_address")?,
        nalp: row.get("nalp")?,
        tier_4: row.get("tier_4")?,
        achieved_degree: degree.and_then(Degree::from_code),
        graduated_in: row.get("graduated_in")?,
        next_year: next_year.and_then(|code| code.parse().ok()),
    })
}

const UPSERT_STUDENT: &str = "
INSERT INTO students (
    student_id, first_name, last_name, exam_id, since, year, is_part_time,
    second_part_time_year, email, course_id, qld, tutor, notes, active, lsp,
    permanent_email, address, phone_number, cell_number, home_address, nalp,
    tier_4, achieved_degree, graduated_in, next_year)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
        ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)";

const UPDATE_CLAUSE: &str = "
ON CONFLICT(student_id) DO UPDATE SET
    first_name = excluded.first_name, last_name = excluded.last_name,
    exam_id = excluded.exam_id, since = excluded.since, year = excluded.year,
    is_part_time = excluded.is_part_time,
    second_part_time_year = excluded.second_part_time_year,
    email = excluded.email, course_id = excluded.course_id, qld = excluded.qld,
    tutor = excluded.tutor, notes = excluded.notes, active = excluded.active,
    lsp = excluded.lsp, permanent_email = excluded.permanent_email,
    address = excluded.address, phone_number = excluded.phone_number,
    cell_number = excluded.cell_number, home_address = excluded.home_address,
    nalp = excluded.nalp, tier_4 = excluded.tier_4,
    achieved_degree = excluded.achieved_degree,
    graduated_in = excluded.graduated_in, next_year = excluded.next_year";

impl Store {
    fn write_student(&self, student: &Student, sql: &str) -> Result<()> {
        if student.student_id.trim().is_empty() {
            return Err(Error::invalid("student_id", "cannot be empty"));
        }
        if let Some(tutor) = &student.tutor {
            self.get_staff(tutor)?;
        }
        self.conn
            .execute(
                sql,
                params![
                    student.student_id,
                    student.first_name,
                    student.last_name,
                    student.exam_id,
                    student.since,
                    student.year.map(StudyYear::code),
                    student.is_part_time,
                    student.second_part_time_year,
                    student.email,
                    student.course_id,
                    student.qld,
                    student.tutor,
                    student.notes,
                    student.active,
                    student.lsp,
                    student.permanent_email,
                    student.address,
                    student.phone_number,
                    student.cell_number,
                    student.home_address,
                    student.nalp,
                    student.tier_4,
                    student.achieved_degree.map(Degree::code),
                    student.graduated_in,
                    student.next_year.map(NextYear::code),
                ],
            )
            .map_err(|e| unique_or(e, "student", &student.student_id))?;
        Ok(())
    }

    /// Add a new student
    ///
    /// # Errors
    /// [`Error::Duplicate`] when the student id or exam id is taken,
    /// [`Error::NotFound`] for an unknown tutor.
    pub fn add_student(&self, student: &Student) -> Result<()> {
        self.write_student(student, UPSERT_STUDENT)?;
        info!("Student added: {} ({})", student.name(), student.student_id);
        Ok(())
    }

    /// Insert a student or overwrite the stored record with the same id
    ///
    /// # Errors
    /// [`Error::Duplicate`] when the exam id belongs to someone else.
    pub fn save_student(&self, student: &Student) -> Result<()> {
        self.write_student(student, &format!("{UPSERT_STUDENT}{UPDATE_CLAUSE}"))?;
        debug!("Student saved: {}", student.student_id);
        Ok(())
    }

    /// Overwrite an existing student
    ///
    /// # Errors
    /// [`Error::NotFound`] when there is no student with that id.
    pub fn update_student(&self, student: &Student) -> Result<()> {
        self.get_student(&student.student_id)?;
        self.save_student(student)
    }

    /// Student by id, if present
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn find_student(&self, student_id: &str) -> Result<Option<Student>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM students WHERE student_id = ?1",
                [student_id],
                student_from_row,
            )
            .optional()?)
    }

    /// Student by id
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id.
    pub fn get_student(&self, student_id: &str) -> Result<Student> {
        self.find_student(student_id)?
            .ok_or_else(|| Error::not_found("student", student_id))
    }

    /// Delete a student with all enrolments, results and feedback
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id.
    pub fn delete_student(&self, student_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM students WHERE student_id = ?1", [student_id])?;
        if deleted == 0 {
            return Err(Error::not_found("student", student_id));
        }
        info!("Student deleted: {student_id}");
        Ok(())
    }

    /// Students matching the filter, by last then first name
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn students(&self, filter: &StudentFilter) -> Result<Vec<Student>> {
        let (clause, values) = filter.where_clause();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM students {clause} ORDER BY last_name, first_name"
        ))?;
        let students = stmt
            .query_map(params_from_iter(values.iter()), student_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    /// Students whose id, exam id or names contain every word of `query`
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn search_students(&self, query: &str) -> Result<Vec<Student>> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|w| format!("%{}%", w.replace(['%', '_'], "")))
            .collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let condition =
            "(student_id LIKE ? OR exam_id LIKE ? OR first_name LIKE ? OR last_name LIKE ?)";
        let clause = vec![condition; words.len()].join(" AND ");
        let values = words.iter().flat_map(|w| [w; 4]);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM students WHERE {clause} ORDER BY last_name, first_name"
        ))?;
        let students = stmt
            .query_map(params_from_iter(values), student_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Search '{query}' found {} students", students.len());
        Ok(students)
    }
}
