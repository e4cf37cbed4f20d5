//! Performance model: a student's enrolment in a module

use serde::{Deserialize, Serialize};

use crate::attendance::Attendance;

/// Links a student to a module, holding the aggregated mark and attendance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Performance {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Enrolled student
    pub student_id: String,
    /// Module taken
    pub module_id: i64,
    /// Seminar group
    pub seminar_group: Option<i32>,
    /// Stage of study the module counts towards
    pub belongs_to_year: Option<i32>,
    /// Rounded module mark, for display
    pub average: Option<i32>,
    /// Unrounded module mark, for calculation
    pub real_average: Option<f64>,
    /// Seminar attendance
    pub attendance: Attendance,
}

impl Performance {
    /// New enrolment with nothing recorded
    #[must_use]
    pub fn new(student_id: String, module_id: i64) -> Self {
        Self {
            student_id,
            module_id,
            ..Self::default()
        }
    }

    /// Whether the rounded average ends in 9 (a borderline mark)
    #[must_use]
    pub const fn average_ends_in_nine(&self) -> bool {
        matches!(self.average, Some(average) if average % 10 == 9)
    }
}

/// Stage a module counts towards for a student
///
/// A student now in year `student_year` took a module from `module_year`
/// in stage `student_year - (current_year - module_year)`.
#[must_use]
pub const fn belongs_to_year(student_year: i32, current_year: i32, module_year: i32) -> i32 {
    student_year - (current_year - module_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belongs_to_year() {
        assert_eq!(belongs_to_year(2, 2014, 2014), 2);
        assert_eq!(belongs_to_year(2, 2014, 2013), 1);
        assert_eq!(belongs_to_year(3, 2014, 2012), 1);
    }

    #[test]
    fn test_average_ends_in_nine() {
        let mut performance = Performance::new("bb23".to_string(), 1);
        assert!(!performance.average_ends_in_nine());
        performance.average = Some(59);
        assert!(performance.average_ends_in_nine());
        performance.average = Some(9);
        assert!(performance.average_ends_in_nine());
        performance.average = Some(60);
        assert!(!performance.average_ends_in_nine());
    }
}
