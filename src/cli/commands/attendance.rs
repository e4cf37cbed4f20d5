//! Attendance command handlers

use super::{CommandResult, Context};
use crate::args::AttendanceCommand;

/// Record or show seminar attendance
pub fn run(command: AttendanceCommand, ctx: &Context) -> CommandResult {
    match command {
        AttendanceCommand::Record {
            module,
            week,
            entries,
        } => {
            let module = ctx.module(&module)?;
            let recorded = ctx.store.in_transaction(|store| {
                for (student_id, presence) in &entries {
                    store.record_attendance(student_id, &module, week, *presence)?;
                }
                Ok(entries.len())
            })?;
            println!("✓ Week {week} of {module}: {recorded} student(s) recorded");
        }
        AttendanceCommand::Show { module } => {
            let module = ctx.module(&module)?;
            let weeks = module.all_teaching_weeks();
            let header: String = weeks.iter().map(|w| format!("{w:>3}")).collect();
            println!("{:<30}{header}  total", module.to_string());
            for (student, performance) in ctx.store.enrolled(module.id.unwrap_or_default())? {
                let row: String = weeks
                    .iter()
                    .map(|week| {
                        let code = performance
                            .attendance
                            .for_week(*week)
                            .map_or('.', |p| p.code());
                        format!("{code:>3}")
                    })
                    .collect();
                let alert = if performance.attendance.missed_the_last_two_sessions() {
                    " !"
                } else {
                    ""
                };
                println!(
                    "{:<30}{row}  {}{alert}",
                    student.to_string(),
                    performance.attendance.count()
                );
            }
        }
    }
    Ok(())
}
