//! Course (degree programme) model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A degree programme students are enrolled on, e.g. "Law with Economics"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Database id, `None` until stored
    pub id: Option<i64>,

    /// Full title, unique
    pub title: String,

    /// Optional abbreviation, unique when present (e.g. "LLB")
    pub short_title: Option<String>,

    /// Slugs of the subject areas the programme draws on
    pub subject_areas: Vec<String>,
}

impl Course {
    /// Create a new programme
    ///
    /// # Arguments
    /// * `title` - Full programme title
    /// * `short_title` - Optional abbreviation
    #[must_use]
    pub const fn new(title: String, short_title: Option<String>) -> Self {
        Self {
            id: None,
            title,
            short_title,
            subject_areas: Vec::new(),
        }
    }

    /// Link a subject area by slug
    pub fn add_subject_area(&mut self, slug: String) {
        if !self.subject_areas.contains(&slug) {
            self.subject_areas.push(slug);
        }
    }

    /// Short title if there is one, otherwise the full title
    #[must_use]
    pub fn label(&self) -> &str {
        self.short_title.as_deref().unwrap_or(&self.title)
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_creation() {
        let course = Course::new("Law with Economics".to_string(), Some("LLB Econ".to_string()));
        assert!(course.id.is_none());
        assert_eq!(course.title, "Law with Economics");
        assert_eq!(course.label(), "LLB Econ");
        assert!(course.subject_areas.is_empty());
    }

    #[test]
    fn test_label_falls_back_to_title() {
        let course = Course::new("Law".to_string(), None);
        assert_eq!(course.label(), "Law");
    }

    #[test]
    fn test_subject_areas_are_not_duplicated() {
        let mut course = Course::new("Law".to_string(), None);
        course.add_subject_area("law".to_string());
        course.add_subject_area("law".to_string());
        course.add_subject_area("economics".to_string());
        assert_eq!(course.subject_areas, vec!["law", "economics"]);
    }
}
