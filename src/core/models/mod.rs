//! Data models for `NomosDB`
//!
//! Plain records mirroring the database tables. Behaviour that only needs a
//! single record lives here; anything spanning several records lives in
//! [`crate::marks`] or [`crate::progression`].

pub mod assessment;
pub mod assessment_result;
pub mod course;
pub mod degree;
pub mod feedback;
pub mod module;
pub mod performance;
pub mod staff;
pub mod student;
pub mod subject_area;
pub mod tutee_session;

pub use assessment::Assessment;
pub use assessment_result::{AssessmentResult, Attempt, Concession};
pub use course::Course;
pub use degree::Degree;
pub use feedback::{GroupFeedback, IndividualFeedback, IndividualPart};
pub use module::Module;
pub use performance::Performance;
pub use staff::{Role, Staff};
pub use student::{NextYear, Student, StudyYear};
pub use subject_area::SubjectArea;
pub use tutee_session::TuteeSession;

/// Lowercase, hyphen-separated identifier made from `text`
///
/// Characters other than ASCII letters, digits, underscores, hyphens and
/// whitespace are dropped; runs of whitespace and hyphens become one hyphen.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}
