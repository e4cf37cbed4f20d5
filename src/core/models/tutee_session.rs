//! Personal tutor meetings

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A meeting (or attempted meeting) between a tutor and a tutee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuteeSession {
    /// Database id, `None` until stored
    pub id: Option<i64>,
    /// Student id of the tutee
    pub tutee: String,
    /// Username of the tutor
    pub tutor: String,
    /// Date of the meeting
    pub date_of_meet: NaiveDate,
    /// What was discussed
    pub notes: String,
    /// False when the student did not turn up
    pub meeting_took_place: bool,
}

impl TuteeSession {
    /// Record a meeting that took place
    #[must_use]
    pub const fn new(tutee: String, tutor: String, date_of_meet: NaiveDate, notes: String) -> Self {
        Self {
            id: None,
            tutee,
            tutor,
            date_of_meet,
            notes,
            meeting_took_place: true,
        }
    }
}
