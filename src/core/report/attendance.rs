//! Attendance sheets and the Tier 4 attendance listing

use askama::Template;
use std::collections::BTreeSet;

use super::table_cell;
use crate::attendance::{Attendance, Presence};
use crate::calendar::{academic_year_string, week_starting_date};
use crate::store::{Store, StudentFilter};
use crate::{debug, Error, Result};

/// Cell text for one week: a tick for present, "e" for excused, "-" for absent
fn presence_cell(presence: Option<Presence>) -> String {
    match presence {
        Some(Presence::Present) => "✓".to_string(),
        Some(Presence::Excused) => "e".to_string(),
        Some(Presence::Absent) => "-".to_string(),
        None => String::new(),
    }
}

/// One student's line on an attendance sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    /// "Last, First"
    pub name: String,
    /// Student id
    pub student_id: String,
    /// One cell per teaching week
    pub cells: Vec<String>,
    /// "attended/recorded"
    pub count: String,
    /// Missed the two most recent sessions
    pub missing: bool,
}

/// Students of one seminar group, or of the whole module when there are none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeminarGroup {
    /// "Seminar Group 2", empty for the whole module
    pub heading: String,
    /// Students by name
    pub rows: Vec<AttendanceRow>,
}

/// Week-by-week attendance of the active students in a module
#[derive(Debug, Clone, Template)]
#[template(path = "attendance_sheet.md", escape = "none")]
pub struct AttendanceSheet {
    /// Module with its session
    pub module: String,
    /// Teaching weeks
    pub weeks: Vec<u32>,
    /// Markdown separator cells matching the weeks
    pub rule: String,
    /// One table per seminar group, students without a group last
    pub groups: Vec<SeminarGroup>,
    /// Students who missed the last two sessions
    pub missing: usize,
}

impl AttendanceSheet {
    /// Collect attendance for every teaching week of a module
    ///
    /// # Errors
    /// [`Error::NotFound`](crate::Error::NotFound) for an unknown module.
    pub fn build(store: &Store, module_id: i64) -> Result<Self> {
        let module = store.get_module(module_id)?;
        let weeks = module.all_teaching_weeks();
        let mut grouped: Vec<(Option<i32>, AttendanceRow)> = store
            .enrolled(module_id)?
            .into_iter()
            .filter(|(student, _)| student.active)
            .map(|(student, performance)| {
                let attendance = &performance.attendance;
                let row = AttendanceRow {
                    name: table_cell(&student.to_string()),
                    student_id: student.student_id.clone(),
                    cells: weeks
                        .iter()
                        .map(|week| presence_cell(attendance.for_week(*week)))
                        .collect(),
                    count: attendance.count(),
                    missing: attendance.missed_the_last_two_sessions(),
                };
                (performance.seminar_group, row)
            })
            .collect();
        // Stable sort keeps name order inside each group
        grouped.sort_by_key(|(group, _)| group.map_or(i32::MAX, |g| g));

        let has_groups = grouped.iter().any(|(group, _)| group.is_some());
        let mut groups: Vec<SeminarGroup> = Vec::new();
        for (group, row) in grouped {
            let heading = match group {
                Some(number) => format!("Seminar Group {number}"),
                None if has_groups => "Without a seminar group".to_string(),
                None => String::new(),
            };
            match groups.last_mut() {
                Some(last) if last.heading == heading => last.rows.push(row),
                _ => groups.push(SeminarGroup {
                    heading,
                    rows: vec![row],
                }),
            }
        }
        let missing = groups
            .iter()
            .flat_map(|g| &g.rows)
            .filter(|r| r.missing)
            .count();
        debug!("Attendance sheet for {module}: {} groups", groups.len());
        Ok(Self {
            module: table_cell(&module.to_string()),
            rule: "---|".repeat(weeks.len()),
            weeks,
            groups,
            missing,
        })
    }
}

/// Attendance of one module in the Tier 4 listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier4Row {
    /// Module title
    pub module: String,
    /// One cell per week in the student's header
    pub cells: Vec<String>,
    /// "attended/recorded"
    pub count: String,
    /// Missed the two most recent sessions
    pub missing: bool,
}

/// One Tier 4 student with a table of their modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier4Student {
    /// "Last, First"
    pub name: String,
    /// Student id
    pub student_id: String,
    /// Week starting dates as "d/m" for every week with a record
    pub headings: Vec<String>,
    /// Markdown separator cells matching the headings
    pub rule: String,
    /// Modules by title
    pub rows: Vec<Tier4Row>,
}

impl Tier4Student {
    /// Whether any module shows two missed sessions in a row
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        self.rows.iter().any(|r| r.missing)
    }
}

/// Attendance of active students on a Tier 4 visa across their modules
#[derive(Debug, Clone, Template)]
#[template(path = "tier4_attendance.md", escape = "none")]
pub struct Tier4AttendanceReport {
    /// "1900/01"
    pub session: String,
    /// Subject area name, empty for the whole department
    pub subject_area: String,
    /// Students by name
    pub students: Vec<Tier4Student>,
}

impl Tier4AttendanceReport {
    /// Collect attendance for every module a Tier 4 student takes in `year`
    ///
    /// # Errors
    /// Fails on a database error or an unknown subject area.
    pub fn build(store: &Store, year: i32, subject_area: Option<&str>) -> Result<Self> {
        let area_name = match subject_area {
            Some(slug) => {
                store
                    .subject_areas()?
                    .into_iter()
                    .find(|area| area.slug == slug)
                    .ok_or_else(|| Error::not_found("subject area", slug))?
                    .name
            }
            None => String::new(),
        };
        let filter = StudentFilter {
            subject_area: subject_area.map(str::to_string),
            active_only: true,
            ..StudentFilter::default()
        };
        let mut students = Vec::new();
        for student in store.students(&filter)?.into_iter().filter(|s| s.tier_4) {
            let mut modules: Vec<(String, Attendance)> = Vec::new();
            for module in store.modules_of(&student.student_id, Some(year))? {
                let performance =
                    store.get_performance(&student.student_id, module.id.unwrap_or_default())?;
                modules.push((module.title, performance.attendance));
            }
            let weeks: BTreeSet<u32> = modules.iter().flat_map(|(_, a)| a.weeks()).collect();
            let headings: Vec<String> = weeks
                .iter()
                .map(|week| {
                    week_starting_date(*week, year)
                        .map_or_else(|| week.to_string(), |d| d.format("%-d/%-m").to_string())
                })
                .collect();
            let rows = modules
                .iter()
                .map(|(title, attendance)| Tier4Row {
                    module: table_cell(title),
                    cells: weeks
                        .iter()
                        .map(|week| match attendance.for_week(*week) {
                            Some(p) if p.counts_as_present() => "✓".to_string(),
                            other => presence_cell(other),
                        })
                        .collect(),
                    count: attendance.count(),
                    missing: attendance.missed_the_last_two_sessions(),
                })
                .collect();
            students.push(Tier4Student {
                name: table_cell(&student.to_string()),
                student_id: student.student_id.clone(),
                rule: "---|".repeat(headings.len()),
                headings,
                rows,
            });
        }
        debug!("Tier 4 attendance for {year}: {} students", students.len());
        Ok(Self {
            session: academic_year_string(year),
            subject_area: area_name,
            students,
        })
    }
}
