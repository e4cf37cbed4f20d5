//! Personal tutor meetings

use rusqlite::params;

use super::Store;
use crate::info;
use crate::models::TuteeSession;
use crate::Result;

impl Store {
    /// Record a meeting and set its id
    ///
    /// # Errors
    /// [`Error::NotFound`](crate::Error::NotFound) for an unknown student or
    /// tutor.
    pub fn add_tutee_session(&self, session: &mut TuteeSession) -> Result<i64> {
        self.get_student(&session.tutee)?;
        self.get_staff(&session.tutor)?;
        self.conn.execute(
            "INSERT INTO tutee_sessions (tutee, tutor, date_of_meet, notes, meeting_took_place)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.tutee,
                session.tutor,
                session.date_of_meet,
                session.notes,
                session.meeting_took_place,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        session.id = Some(id);
        info!("Meeting of {} with {} on {}", session.tutee, session.tutor, session.date_of_meet);
        Ok(id)
    }

    /// Meetings with a student, most recent first
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn tutee_sessions(&self, student_id: &str) -> Result<Vec<TuteeSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tutee, tutor, date_of_meet, notes, meeting_took_place
             FROM tutee_sessions WHERE tutee = ?1 ORDER BY date_of_meet DESC, id DESC",
        )?;
        let sessions = stmt
            .query_map([student_id], |row| {
                Ok(TuteeSession {
                    id: row.get(0)?,
                    tutee: row.get(1)?,
                    tutor: row.get(2)?,
                    date_of_meet: row.get(3)?,
                    notes: row.get(4)?,
                    meeting_took_place: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Staff, Student};
    use crate::Error;
    use chrono::NaiveDate;

    #[test]
    fn test_sessions_most_recent_first() {
        let store = Store::open_in_memory().unwrap();
        store
            .add_staff(&Staff::new(
                "efudd".to_string(),
                "Elmar".to_string(),
                "Fudd".to_string(),
            ))
            .unwrap();
        store
            .add_student(&Student::new(
                "bb23".to_string(),
                "Bugs".to_string(),
                "Bunny".to_string(),
            ))
            .unwrap();
        for (day, notes) in [(3, "Second"), (1, "First")] {
            let mut session = TuteeSession::new(
                "bb23".to_string(),
                "efudd".to_string(),
                NaiveDate::from_ymd_opt(1900, 10, day).unwrap(),
                notes.to_string(),
            );
            store.add_tutee_session(&mut session).unwrap();
            assert!(session.id.is_some());
        }
        let notes: Vec<String> = store
            .tutee_sessions("bb23")
            .unwrap()
            .into_iter()
            .map(|s| s.notes)
            .collect();
        assert_eq!(notes, vec!["Second", "First"]);

        let mut stray = TuteeSession::new(
            "nobody".to_string(),
            "efudd".to_string(),
            NaiveDate::from_ymd_opt(1900, 10, 5).unwrap(),
            String::new(),
        );
        assert!(matches!(
            store.add_tutee_session(&mut stray),
            Err(Error::NotFound { .. })
        ));
    }
}
