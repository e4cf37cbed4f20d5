//! Marksheet feedback

use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

use super::Store;
use crate::models::{Attempt, GroupFeedback, IndividualFeedback};
use crate::{debug, Error, Result};

fn attempt(code: &str) -> rusqlite::Result<Attempt> {
    code.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}

fn individual_from_row(row: &Row) -> rusqlite::Result<IndividualFeedback> {
    let code: String = row.get("attempt")?;
    Ok(IndividualFeedback {
        id: row.get("id")?,
        result_id: row.get("result_id")?,
        attempt: attempt(&code)?,
        completed: row.get("completed")?,
        marker: row.get("marker")?,
        second_first_marker: row.get("second_first_marker")?,
        second_marker: row.get("second_marker")?,
        marking_date: row.get("marking_date")?,
        category_marks: BTreeMap::new(),
        deduction: row.get("deduction")?,
        deduction_explanation: row.get("deduction_explanation")?,
        part_1_mark: row.get("part_1_mark")?,
        part_2_mark: row.get("part_2_mark")?,
        submission_date: row.get("submission_date")?,
        comments: row.get("comments")?,
        comments_2: row.get("comments_2")?,
    })
}

fn group_from_row(row: &Row) -> rusqlite::Result<GroupFeedback> {
    let code: String = row.get("attempt")?;
    Ok(GroupFeedback {
        id: row.get("id")?,
        assessment_id: row.get("assessment_id")?,
        group_no: row.get("group_no")?,
        attempt: attempt(&code)?,
        marker: row.get("marker")?,
        marking_date: row.get("marking_date")?,
        group_category_marks: BTreeMap::new(),
        group_comments: row.get("group_comments")?,
        individual_parts: BTreeMap::new(),
    })
}

impl Store {
    fn load_category_marks(&self, table: &str, feedback_id: i64) -> Result<BTreeMap<u8, i32>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT category, mark FROM {table} WHERE feedback_id = ?1"
        ))?;
        let marks = stmt
            .query_map([feedback_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<u8, i32>>>()?;
        Ok(marks)
    }

    fn save_category_marks(
        &self,
        table: &str,
        feedback_id: i64,
        marks: &BTreeMap<u8, i32>,
    ) -> Result<()> {
        self.conn.execute(
            &format!("DELETE FROM {table} WHERE feedback_id = ?1"),
            [feedback_id],
        )?;
        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO {table} (feedback_id, category, mark) VALUES (?1, ?2, ?3)"
        ))?;
        for (category, mark) in marks {
            stmt.execute(params![feedback_id, category, mark])?;
        }
        Ok(())
    }

    /// Marksheet of a result for an attempt
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn individual_feedback(
        &self,
        result_id: i64,
        attempt: Attempt,
    ) -> Result<Option<IndividualFeedback>> {
        let feedback = self
            .conn
            .query_row(
                "SELECT * FROM individual_feedback WHERE result_id = ?1 AND attempt = ?2",
                params![result_id, attempt.code()],
                individual_from_row,
            )
            .optional()?;
        match feedback {
            Some(mut feedback) => {
                if let Some(id) = feedback.id {
                    feedback.category_marks =
                        self.load_category_marks("individual_feedback_marks", id)?;
                }
                Ok(Some(feedback))
            }
            None => Ok(None),
        }
    }

    /// Insert or replace a marksheet and set its id
    ///
    /// # Errors
    /// Fails on a database error, e.g. an unknown marker.
    pub fn save_individual_feedback(&self, feedback: &mut IndividualFeedback) -> Result<i64> {
        let id = self.in_transaction(|store| {
            store.conn.execute(
                "INSERT INTO individual_feedback (
                     result_id, attempt, completed, marker, second_first_marker,
                     second_marker, marking_date, deduction, deduction_explanation,
                     part_1_mark, part_2_mark, submission_date, comments, comments_2)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(result_id, attempt) DO UPDATE SET
                     completed = excluded.completed, marker = excluded.marker,
                     second_first_marker = excluded.second_first_marker,
                     second_marker = excluded.second_marker,
                     marking_date = excluded.marking_date, deduction = excluded.deduction,
                     deduction_explanation = excluded.deduction_explanation,
                     part_1_mark = excluded.part_1_mark, part_2_mark = excluded.part_2_mark,
                     submission_date = excluded.submission_date,
                     comments = excluded.comments, comments_2 = excluded.comments_2",
                params![
                    feedback.result_id,
                    feedback.attempt.code(),
                    feedback.completed,
                    feedback.marker,
                    feedback.second_first_marker,
                    feedback.second_marker,
                    feedback.marking_date,
                    feedback.deduction,
                    feedback.deduction_explanation,
                    feedback.part_1_mark,
                    feedback.part_2_mark,
                    feedback.submission_date,
                    feedback.comments,
                    feedback.comments_2,
                ],
            )?;
            let id: i64 = store.conn.query_row(
                "SELECT id FROM individual_feedback WHERE result_id = ?1 AND attempt = ?2",
                params![feedback.result_id, feedback.attempt.code()],
                |row| row.get(0),
            )?;
            store.save_category_marks("individual_feedback_marks", id, &feedback.category_marks)?;
            Ok(id)
        })?;
        feedback.id = Some(id);
        debug!("Feedback {id} saved for result {}", feedback.result_id);
        Ok(id)
    }

    /// Group marksheet for an assessment, group and attempt
    ///
    /// # Errors
    /// Fails on a database error.
    pub fn group_feedback(
        &self,
        assessment_id: i64,
        group_no: i32,
        attempt: Attempt,
    ) -> Result<Option<GroupFeedback>> {
        let feedback = self
            .conn
            .query_row(
                "SELECT * FROM group_feedback
                 WHERE assessment_id = ?1 AND group_no = ?2 AND attempt = ?3",
                params![assessment_id, group_no, attempt.code()],
                group_from_row,
            )
            .optional()?;
        let Some(mut feedback) = feedback else {
            return Ok(None);
        };
        let id = feedback
            .id
            .ok_or_else(|| Error::not_found("group feedback", group_no))?;
        feedback.group_category_marks = self.load_category_marks("group_feedback_marks", id)?;
        let mut stmt = self.conn.prepare(
            "SELECT student_id, part, value FROM group_feedback_parts WHERE feedback_id = ?1",
        )?;
        let parts = stmt
            .query_map([id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (student_id, part, value) in parts {
            feedback
                .individual_parts
                .entry(student_id)
                .or_default()
                .insert(part, value);
        }
        Ok(Some(feedback))
    }

    /// Insert or replace a group marksheet and set its id
    ///
    /// # Errors
    /// Fails on a database error, e.g. a part for an unknown student.
    pub fn save_group_feedback(&self, feedback: &mut GroupFeedback) -> Result<i64> {
        let id = self.in_transaction(|store| {
            store.conn.execute(
                "INSERT INTO group_feedback (
                     assessment_id, group_no, attempt, marker, marking_date, group_comments)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(assessment_id, group_no, attempt) DO UPDATE SET
                     marker = excluded.marker, marking_date = excluded.marking_date,
                     group_comments = excluded.group_comments",
                params![
                    feedback.assessment_id,
                    feedback.group_no,
                    feedback.attempt.code(),
                    feedback.marker,
                    feedback.marking_date,
                    feedback.group_comments,
                ],
            )?;
            let id: i64 = store.conn.query_row(
                "SELECT id FROM group_feedback
                 WHERE assessment_id = ?1 AND group_no = ?2 AND attempt = ?3",
                params![feedback.assessment_id, feedback.group_no, feedback.attempt.code()],
                |row| row.get(0),
            )?;
            store.save_category_marks("group_feedback_marks", id, &feedback.group_category_marks)?;
            store
                .conn
                .execute("DELETE FROM group_feedback_parts WHERE feedback_id = ?1", [id])?;
            let mut stmt = store.conn.prepare(
                "INSERT INTO group_feedback_parts (feedback_id, student_id, part, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (student_id, parts) in &feedback.individual_parts {
                for (part, value) in parts {
                    stmt.execute(params![id, student_id, part, value])?;
                }
            }
            Ok(id)
        })?;
        feedback.id = Some(id);
        debug!(
            "Group feedback {id} saved for group {} of assessment {}",
            feedback.group_no, feedback.assessment_id
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::MarksheetType;
    use crate::models::{Assessment, IndividualPart, Module, Staff, Student};
    use chrono::NaiveDate;

    fn store() -> (Store, Assessment, i64) {
        let store = Store::open_in_memory().unwrap();
        store
            .add_staff(&Staff::new(
                "efudd".to_string(),
                "Elmar".to_string(),
                "Fudd".to_string(),
            ))
            .unwrap();
        for (id, first, last) in [("bb23", "Bugs", "Bunny"), ("dd42", "Daffy", "Duck")] {
            store
                .add_student(&Student::new(id.to_string(), first.to_string(), last.to_string()))
                .unwrap();
        }
        let mut module = Module::new("Hunting Practice", "HP23", 1900);
        store.add_module(&mut module).unwrap();
        let mut assessment = Assessment::new(module.id.unwrap(), "Presentation", 100);
        assessment.marksheet_type = Some(MarksheetType::GroupPresentation);
        store.add_assessment(&mut assessment).unwrap();
        let performance = store.enroll("bb23", module.id.unwrap()).unwrap();
        let result = store.result_for(&performance, &assessment).unwrap();
        let result_id = result.id.unwrap();
        (store, assessment, result_id)
    }

    #[test]
    fn test_individual_feedback_round_trip() {
        let (store, _, result_id) = store();
        assert_eq!(store.individual_feedback(result_id, Attempt::First).unwrap(), None);

        let mut feedback = IndividualFeedback::new(result_id, Attempt::First);
        feedback.marker = Some("efudd".to_string());
        feedback.marking_date = NaiveDate::from_ymd_opt(1900, 12, 1);
        feedback.comments = "Not enough carrots".to_string();
        feedback
            .set_category_mark(MarksheetType::Essay, 1, Some(59))
            .unwrap();
        feedback
            .set_category_mark(MarksheetType::Essay, 2, Some(69))
            .unwrap();
        store.save_individual_feedback(&mut feedback).unwrap();

        let loaded = store
            .individual_feedback(result_id, Attempt::First)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, feedback);

        feedback.category_marks.remove(&2);
        let id = feedback.id;
        store.save_individual_feedback(&mut feedback).unwrap();
        assert_eq!(feedback.id, id);
        let loaded = store
            .individual_feedback(result_id, Attempt::First)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.category_marks.len(), 1);
        assert_eq!(store.individual_feedback(result_id, Attempt::Resit).unwrap(), None);
    }

    #[test]
    fn test_group_feedback_round_trip() {
        let (store, assessment, _) = store();
        let assessment_id = assessment.id.unwrap();
        let mut feedback = GroupFeedback::new(assessment_id, 1, Attempt::First);
        feedback
            .set_group_category_mark(MarksheetType::GroupPresentation, 1, Some(59))
            .unwrap();
        feedback
            .set_multiple_individual_parts(
                IndividualPart::ComponentMark,
                [("bb23", "65"), ("dd42", "45")],
            )
            .unwrap();
        feedback
            .set_individual_part(IndividualPart::Comments, "bb23", "Lively")
            .unwrap();
        store.save_group_feedback(&mut feedback).unwrap();

        let loaded = store
            .group_feedback(assessment_id, 1, Attempt::First)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, feedback);
        assert_eq!(
            loaded.student_mark(MarksheetType::GroupPresentation, "bb23"),
            Some(64)
        );
        assert_eq!(store.group_feedback(assessment_id, 2, Attempt::First).unwrap(), None);
    }
}
