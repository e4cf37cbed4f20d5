//! Subject areas, degree programmes and staff

use rusqlite::{params, OptionalExtension, Row};

use super::{load_links, replace_links, unique_or, Store};
use crate::models::{Course, Role, Staff, SubjectArea};
use crate::{debug, info};
use crate::{Error, Result};

fn staff_from_row(row: &Row) -> rusqlite::Result<Staff> {
    let role: String = row.get("role")?;
    Ok(Staff {
        username: row.get("username")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        role: role.parse().unwrap_or_default(),
        subject_areas: Vec::new(),
        pastoral_care: row.get("pastoral_care")?,
        programme_director: row.get("programme_director")?,
        main_admin: row.get("main_admin")?,
    })
}

impl Store {
    /// Add a subject area
    ///
    /// # Errors
    /// [`Error::Duplicate`] when the name or slug is taken.
    pub fn add_subject_area(&self, area: &SubjectArea) -> Result<()> {
        if area.slug.is_empty() {
            return Err(Error::invalid("name", "subject area needs a name"));
        }
        self.conn
            .execute(
                "INSERT INTO subject_areas (slug, name) VALUES (?1, ?2)",
                [&area.slug, &area.name],
            )
            .map_err(|e| unique_or(e, "subject area", &area.name))?;
        info!("Subject area added: {}", area.name);
        Ok(())
    }

    /// All subject areas by name
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn subject_areas(&self) -> Result<Vec<SubjectArea>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slug, name FROM subject_areas ORDER BY name")?;
        let areas = stmt
            .query_map([], |row| {
                Ok(SubjectArea {
                    slug: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(areas)
    }

    fn check_subject_areas(&self, slugs: &[String]) -> Result<()> {
        for slug in slugs {
            let exists: Option<i64> = self
                .conn
                .query_row(
                    "SELECT 1 FROM subject_areas WHERE slug = ?1",
                    [slug],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(Error::not_found("subject area", slug));
            }
        }
        Ok(())
    }

    /// Add a degree programme and set its id
    ///
    /// # Errors
    /// [`Error::Duplicate`] for a taken title or short title,
    /// [`Error::NotFound`] for an unknown subject area.
    pub fn add_course(&self, course: &mut Course) -> Result<i64> {
        self.check_subject_areas(&course.subject_areas)?;
        let id = self.in_transaction(|store| {
            store
                .conn
                .execute(
                    "INSERT INTO courses (title, short_title) VALUES (?1, ?2)",
                    params![course.title, course.short_title],
                )
                .map_err(|e| unique_or(e, "course", &course.title))?;
            let id = store.conn.last_insert_rowid();
            replace_links(
                &store.conn,
                "course_subject_areas",
                "course_id",
                "slug",
                &id,
                &course.subject_areas,
            )?;
            Ok(id)
        })?;
        course.id = Some(id);
        info!("Course added: {}", course.title);
        Ok(id)
    }

    /// All programmes by title
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, short_title FROM courses ORDER BY title")?;
        let mut courses = stmt
            .query_map([], |row| {
                Ok(Course {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    short_title: row.get(2)?,
                    subject_areas: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for course in &mut courses {
            course.subject_areas = load_links(
                &self.conn,
                "course_subject_areas",
                "course_id",
                "slug",
                &course.id,
            )?;
        }
        Ok(courses)
    }

    /// Programme by id, title or short title
    ///
    /// # Errors
    /// [`Error::NotFound`] when nothing matches.
    pub fn find_course(&self, key: &str) -> Result<Course> {
        let id: Option<i64> = key.parse().ok();
        self.courses()?
            .into_iter()
            .find(|c| {
                (id.is_some() && c.id == id)
                    || c.title.eq_ignore_ascii_case(key)
                    || c.short_title
                        .as_deref()
                        .is_some_and(|s| s.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| Error::not_found("course", key))
    }

    /// Add a member of staff
    ///
    /// # Errors
    /// [`Error::Duplicate`] for a taken username,
    /// [`Error::NotFound`] for an unknown subject area.
    pub fn add_staff(&self, staff: &Staff) -> Result<()> {
        if staff.username.trim().is_empty() {
            return Err(Error::invalid("username", "cannot be empty"));
        }
        self.check_subject_areas(&staff.subject_areas)?;
        self.in_transaction(|store| {
            store
                .conn
                .execute(
                    "INSERT INTO staff (username, first_name, last_name, email, role,
                                        pastoral_care, programme_director, main_admin)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        staff.username,
                        staff.first_name,
                        staff.last_name,
                        staff.email,
                        staff.role.code(),
                        staff.pastoral_care,
                        staff.programme_director,
                        staff.main_admin,
                    ],
                )
                .map_err(|e| unique_or(e, "staff", &staff.username))?;
            replace_links(
                &store.conn,
                "staff_subject_areas",
                "username",
                "slug",
                &staff.username,
                &staff.subject_areas,
            )
        })?;
        info!("Staff added: {} ({})", staff.name(), staff.username);
        Ok(())
    }

    /// Member of staff by username
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown username.
    pub fn get_staff(&self, username: &str) -> Result<Staff> {
        let mut staff = self
            .conn
            .query_row(
                "SELECT * FROM staff WHERE username = ?1",
                [username],
                staff_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("staff", username))?;
        staff.subject_areas = load_links(
            &self.conn,
            "staff_subject_areas",
            "username",
            "slug",
            &staff.username,
        )?;
        Ok(staff)
    }

    /// Staff by last name, optionally only those with a role
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn staff(&self, role: Option<Role>) -> Result<Vec<Staff>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM staff WHERE ?1 IS NULL OR role = ?1 ORDER BY last_name, first_name",
        )?;
        let mut staff = stmt
            .query_map([role.map(Role::code)], staff_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for member in &mut staff {
            member.subject_areas = load_links(
                &self.conn,
                "staff_subject_areas",
                "username",
                "slug",
                &member.username,
            )?;
        }
        debug!("{} staff loaded", staff.len());
        Ok(staff)
    }
}
