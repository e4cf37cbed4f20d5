//! Personal tutor meeting command handlers

use chrono::Local;

use super::{CommandResult, Context};
use crate::args::TuteeCommand;
use nomosdb::models::TuteeSession;

/// Record or list tutor meetings
pub fn run(command: TuteeCommand, ctx: &Context) -> CommandResult {
    match command {
        TuteeCommand::Add {
            student_id,
            tutor,
            date,
            notes,
            no_show,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let mut session = TuteeSession::new(student_id, tutor, date, notes);
            session.meeting_took_place = !no_show;
            ctx.store.add_tutee_session(&mut session)?;
            println!(
                "✓ Meeting of {} with {} on {date} recorded",
                session.tutee, session.tutor
            );
        }
        TuteeCommand::List { student_id } => {
            let student = ctx.store.get_student(&student_id)?;
            let sessions = ctx.store.tutee_sessions(&student_id)?;
            println!("\n=== {student}: {} meeting(s) ===\n", sessions.len());
            for session in sessions {
                println!(
                    "{}  {:<12}{}",
                    session.date_of_meet,
                    session.tutor,
                    if session.meeting_took_place {
                        ""
                    } else {
                        " (did not attend)"
                    }
                );
                for line in session.notes.lines() {
                    println!("    {line}");
                }
            }
        }
    }
    Ok(())
}
