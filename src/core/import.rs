//! Student data import from CSV files
//!
//! A row creates a student or updates the one with the same id. Columns are
//! mapped by name, either from the header row or from an explicit list for
//! files without headers. Only mapped columns overwrite stored values.

use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::models::{Degree, Student, StudyYear};
use crate::store::Store;
use crate::{debug, info, warn};
use crate::{Error, Result};

/// Number of address lines accepted per address
pub const ADDRESS_LINES: usize = 5;

/// What a CSV column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Student number, required
    StudentId,
    /// First names
    FirstName,
    /// Family name
    LastName,
    /// Anonymous exam number
    ExamId,
    /// Academic year the student started
    Since,
    /// Stage of study, the first valid code in the text
    Year,
    /// University email
    Email,
    /// Landline
    PhoneNumber,
    /// Mobile
    CellNumber,
    /// Private email
    PermanentEmail,
    /// Degree code
    AchievedDegree,
    /// Term time address line, 1 to 5
    Address(usize),
    /// Home address line, 1 to 5
    HomeAddress(usize),
    /// Not imported
    Ignore,
}

impl Column {
    /// Column name accepted in headers and column lists
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::StudentId => "student_id".to_string(),
            Self::FirstName => "first_name".to_string(),
            Self::LastName => "last_name".to_string(),
            Self::ExamId => "exam_id".to_string(),
            Self::Since => "since".to_string(),
            Self::Year => "year".to_string(),
            Self::Email => "email".to_string(),
            Self::PhoneNumber => "phone_number".to_string(),
            Self::CellNumber => "cell_number".to_string(),
            Self::PermanentEmail => "permanent_email".to_string(),
            Self::AchievedDegree => "achieved_degree".to_string(),
            Self::Address(line) => format!("address{line}"),
            Self::HomeAddress(line) => format!("home_address{line}"),
            Self::Ignore => "ignore".to_string(),
        }
    }
}

fn address_line(rest: &str) -> Option<usize> {
    rest.parse()
        .ok()
        .filter(|line| (1..=ADDRESS_LINES).contains(line))
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let column = match name.as_str() {
            "student_id" => Self::StudentId,
            "first_name" => Self::FirstName,
            "last_name" => Self::LastName,
            "exam_id" => Self::ExamId,
            "since" => Self::Since,
            "year" => Self::Year,
            "email" => Self::Email,
            "phone_number" => Self::PhoneNumber,
            "cell_number" => Self::CellNumber,
            "permanent_email" => Self::PermanentEmail,
            "achieved_degree" => Self::AchievedDegree,
            "ignore" | "" => Self::Ignore,
            other => {
                if let Some(line) = other.strip_prefix("home_address").and_then(address_line) {
                    Self::HomeAddress(line)
                } else if let Some(line) = other.strip_prefix("address").and_then(address_line) {
                    Self::Address(line)
                } else {
                    return Err(Error::invalid("column", format!("unknown column '{s}'")));
                }
            }
        };
        Ok(column)
    }
}

/// Parse a comma separated column list such as `student_id,last_name,ignore`
///
/// # Errors
/// [`Error::Invalid`] for an unknown column name.
pub fn parse_columns(list: &str) -> Result<Vec<Column>> {
    list.split(',').map(str::parse).collect()
}

/// How to read an import file
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Column mapping for files without a header row
    pub columns: Option<Vec<Column>>,
    /// Data rows to leave out, counted from 1
    pub skip_rows: Vec<usize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            columns: None,
            skip_rows: Vec::new(),
        }
    }
}

/// Result of a student import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Ids of new students
    pub created: Vec<String>,
    /// Ids of students that already existed
    pub updated: Vec<String>,
    /// Rows left out on request
    pub skipped: usize,
}

/// Stage code in free text: "Year 2 (part time)" gives the second year
#[must_use]
pub fn parse_study_year(text: &str) -> Option<StudyYear> {
    text.split_whitespace()
        .filter_map(|part| part.parse().ok())
        .find_map(StudyYear::from_code)
}

/// Phone numbers without a leading `0` or `+` get a `0` prefix
#[must_use]
pub fn normalize_phone_number(number: &str) -> Option<String> {
    let number = number.trim();
    if number.is_empty() {
        None
    } else if number.starts_with(['0', '+']) {
        Some(number.to_string())
    } else {
        Some(format!("0{number}"))
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn apply_field(student: &mut Student, column: Column, value: &str, row: usize) -> Result<()> {
    let value = value.trim();
    match column {
        Column::StudentId | Column::Ignore | Column::Address(_) | Column::HomeAddress(_) => {}
        Column::FirstName => student.first_name = value.to_string(),
        Column::LastName => student.last_name = value.to_string(),
        Column::ExamId => student.exam_id = optional(value),
        Column::Since => {
            student.since = if value.is_empty() {
                None
            } else {
                Some(value.parse().map_err(|_| {
                    Error::invalid("since", format!("row {row}: '{value}' is not a year"))
                })?)
            };
        }
        Column::Year => match parse_study_year(value) {
            Some(year) => student.year = Some(year),
            None => warn!("Row {row}: no year of study in '{value}'"),
        },
        Column::Email => student.email = value.to_string(),
        Column::PhoneNumber => student.phone_number = normalize_phone_number(value),
        Column::CellNumber => student.cell_number = normalize_phone_number(value),
        Column::PermanentEmail => student.permanent_email = optional(value),
        Column::AchievedDegree => {
            student.achieved_degree = if value.is_empty() {
                None
            } else {
                let degree = value.parse().ok().and_then(Degree::from_code);
                Some(degree.ok_or_else(|| {
                    Error::invalid(
                        "achieved_degree",
                        format!("row {row}: '{value}' is not a degree code"),
                    )
                })?)
            };
        }
    }
    Ok(())
}

fn join_address(columns: &[Column], record: &csv::StringRecord, home: bool) -> Option<String> {
    let mut lines: Vec<(usize, &str)> = columns
        .iter()
        .zip(record.iter())
        .filter_map(|(column, value)| match (column, home) {
            (Column::Address(line), false) | (Column::HomeAddress(line), true) => {
                Some((*line, value.trim()))
            }
            _ => None,
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    lines.sort_by_key(|(line, _)| *line);
    Some(
        lines
            .into_iter()
            .map(|(_, text)| text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Import students from CSV text
///
/// Runs in one transaction, so a bad row leaves the database untouched.
///
/// # Errors
/// [`Error::Invalid`] when there is no `student_id` column or a value does
/// not parse, [`Error::Csv`] for malformed input, and store errors such as a
/// duplicate exam id.
pub fn import_students<R: Read>(
    store: &Store,
    reader: R,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.columns.is_none())
        .flexible(true)
        .from_reader(reader);
    let columns = match &options.columns {
        Some(columns) => columns.clone(),
        None => csv_reader
            .headers()?
            .iter()
            .map(str::parse)
            .collect::<Result<Vec<Column>>>()?,
    };
    let Some(id_index) = columns.iter().position(|c| *c == Column::StudentId) else {
        return Err(Error::invalid("column", "no student_id column"));
    };
    let has_address = columns.iter().any(|c| matches!(c, Column::Address(_)));
    let has_home_address = columns.iter().any(|c| matches!(c, Column::HomeAddress(_)));

    store.in_transaction(|store| {
        let mut summary = ImportSummary::default();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = index + 1;
            if options.skip_rows.contains(&row) {
                summary.skipped += 1;
                continue;
            }
            let Some(student_id) = record.get(id_index).map(str::trim).filter(|id| !id.is_empty())
            else {
                warn!("Row {row}: no student id, row ignored");
                summary.skipped += 1;
                continue;
            };
            let existing = store.find_student(student_id)?;
            let is_new = existing.is_none();
            let mut student = existing.unwrap_or_else(|| {
                Student::new(student_id.to_string(), String::new(), String::new())
            });
            for (column, value) in columns.iter().zip(record.iter()) {
                apply_field(&mut student, *column, value, row)?;
            }
            if has_address {
                student.address = join_address(&columns, &record, false).unwrap_or_default();
            }
            if has_home_address {
                student.home_address = join_address(&columns, &record, true).unwrap_or_default();
            }
            store.save_student(&student)?;
            debug!("Row {row}: {} ({student_id})", student.name());
            if is_new {
                summary.created.push(student.student_id);
            } else {
                summary.updated.push(student.student_id);
            }
        }
        info!(
            "Imported students: {} new, {} updated",
            summary.created.len(),
            summary.updated.len()
        );
        Ok(summary)
    })
}

/// Import students from a CSV file
///
/// # Errors
/// As [`import_students`], plus [`Error::Io`] when the file cannot be opened.
pub fn import_students_from_path(
    store: &Store,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let file = File::open(path)?;
    import_students(store, file, options)
}

/// Result of an exam id import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExamIdSummary {
    /// Students whose exam id was set or cleared
    pub imported: usize,
    /// Students whose new exam id belongs to someone else
    pub conflicts: Vec<String>,
    /// Student ids not in the database
    pub unknown: Vec<String>,
}

/// Assign exam ids from a headerless two column file: student id, exam id
///
/// An empty exam id clears it. Conflicting ids are reported and skipped.
///
/// # Errors
/// [`Error::Csv`] for malformed input and database failures.
pub fn import_exam_ids<R: Read>(store: &Store, reader: R) -> Result<ExamIdSummary> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    store.in_transaction(|store| {
        let mut summary = ExamIdSummary::default();
        for record in csv_reader.records() {
            let record = record?;
            let Some(student_id) = record.get(0).filter(|id| !id.is_empty()) else {
                continue;
            };
            let Some(mut student) = store.find_student(student_id)? else {
                summary.unknown.push(student_id.to_string());
                continue;
            };
            student.exam_id = record.get(1).and_then(optional);
            match store.save_student(&student) {
                Ok(()) => summary.imported += 1,
                Err(Error::Duplicate { .. }) => {
                    warn!("Exam id of {student} is assigned to another student");
                    summary.conflicts.push(format!("{} ({})", student.name(), student.student_id));
                }
                Err(e) => return Err(e),
            }
        }
        info!("{} exam ids imported", summary.imported);
        Ok(summary)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_column_names() {
        assert_eq!("Student ID".parse::<Column>().unwrap(), Column::StudentId);
        assert_eq!("home_address3".parse::<Column>().unwrap(), Column::HomeAddress(3));
        assert_eq!("address1".parse::<Column>().unwrap(), Column::Address(1));
        assert_eq!("".parse::<Column>().unwrap(), Column::Ignore);
        assert!("address6".parse::<Column>().is_err());
        assert!("shoe_size".parse::<Column>().is_err());
        assert_eq!(Column::HomeAddress(2).name(), "home_address2");
    }

    #[test]
    fn test_study_year_from_text() {
        assert_eq!(parse_study_year("Year 2 (part time)"), Some(StudyYear::Second));
        assert_eq!(parse_study_year("LLM 7"), Some(StudyYear::Masters));
        assert_eq!(parse_study_year("4 5 3"), Some(StudyYear::Third));
        assert_eq!(parse_study_year("final"), None);
    }

    #[test]
    fn test_phone_numbers() {
        assert_eq!(normalize_phone_number("1227 123456").as_deref(), Some("01227 123456"));
        assert_eq!(normalize_phone_number("07700 900000").as_deref(), Some("07700 900000"));
        assert_eq!(normalize_phone_number("+44 1227").as_deref(), Some("+44 1227"));
        assert_eq!(normalize_phone_number("  "), None);
    }

    #[test]
    fn test_import_with_headers() {
        let store = store();
        let data = "\
student_id,first_name,last_name,year,phone_number,address1,address2
bb23,Bugs,Bunny,Year 1,1227 123,Rabbit Hole,Carrot Field
dd42,Daffy,Duck,2,,Pond,
";
        let summary = import_students(&store, data.as_bytes(), &ImportOptions::default()).unwrap();
        assert_eq!(summary.created, vec!["bb23", "dd42"]);
        let bugs = store.get_student("bb23").unwrap();
        assert_eq!(bugs.first_name, "Bugs");
        assert_eq!(bugs.year, Some(StudyYear::First));
        assert_eq!(bugs.phone_number.as_deref(), Some("01227 123"));
        assert_eq!(bugs.address, "Rabbit Hole\nCarrot Field");
        let daffy = store.get_student("dd42").unwrap();
        assert_eq!(daffy.address, "Pond");
        assert_eq!(daffy.phone_number, None);
    }

    #[test]
    fn test_import_updates_only_mapped_fields() {
        let store = store();
        let mut bugs = Student::new("bb23".to_string(), "Bugs".to_string(), "Bunny".to_string());
        bugs.email = "bugs@acme.edu".to_string();
        store.add_student(&bugs).unwrap();

        let options = ImportOptions {
            delimiter: b';',
            columns: Some(parse_columns("student_id,ignore,last_name").unwrap()),
            skip_rows: vec![2],
        };
        let data = "bb23;whatever;Hare\nxx99;skipped;Nobody\n";
        let summary = import_students(&store, data.as_bytes(), &options).unwrap();
        assert_eq!(summary.updated, vec!["bb23"]);
        assert_eq!(summary.skipped, 1);
        let bugs = store.get_student("bb23").unwrap();
        assert_eq!(bugs.last_name, "Hare");
        assert_eq!(bugs.first_name, "Bugs");
        assert_eq!(bugs.email, "bugs@acme.edu");
        assert!(store.find_student("xx99").unwrap().is_none());
    }

    #[test]
    fn test_bad_row_rolls_back() {
        let store = store();
        let data = "student_id,since\nbb23,1900\ndd42,last year\n";
        let err = import_students(&store, data.as_bytes(), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Invalid { field: "since", .. }));
        assert!(store.find_student("bb23").unwrap().is_none());
    }

    #[test]
    fn test_missing_id_column() {
        let store = store();
        let data = "first_name,last_name\nBugs,Bunny\n";
        assert!(matches!(
            import_students(&store, data.as_bytes(), &ImportOptions::default()),
            Err(Error::Invalid { field: "column", .. })
        ));
    }

    #[test]
    fn test_exam_ids() {
        let store = store();
        for (id, first) in [("bb23", "Bugs"), ("dd42", "Daffy")] {
            store
                .add_student(&Student::new(id.to_string(), first.to_string(), "Toon".to_string()))
                .unwrap();
        }
        let summary =
            import_exam_ids(&store, "bb23, X1\ndd42,X1\nzz00,X2\n".as_bytes()).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.conflicts, vec!["Daffy Toon (dd42)"]);
        assert_eq!(summary.unknown, vec!["zz00"]);
        assert_eq!(store.get_student("bb23").unwrap().exam_id.as_deref(), Some("X1"));
        assert_eq!(store.get_student("dd42").unwrap().exam_id, None);
    }
}
