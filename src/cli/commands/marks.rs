//! Mark entry command handlers

use super::{or_dash, CommandResult, Context};
use crate::args::MarksCommand;
use nomosdb::calendar::academic_year_string;

/// Dispatch marks subcommands
pub fn run(command: MarksCommand, ctx: &Context) -> CommandResult {
    match command {
        MarksCommand::Set {
            target,
            student_id,
            mark,
        } => {
            let (module, assessment) = ctx.assessment(&target)?;
            ctx.store
                .set_mark(&student_id, &assessment, target.attempt, mark)?;
            let performance = ctx
                .store
                .get_performance(&student_id, module.id.unwrap_or_default())?;
            println!(
                "✓ {student_id} {assessment} ({}): {}, module mark {}",
                target.attempt.label(),
                or_dash(mark),
                or_dash(performance.average)
            );
        }
        MarksCommand::Concession {
            target,
            student_id,
            concession,
        } => {
            let (_, assessment) = ctx.assessment(&target)?;
            ctx.store
                .set_concession(&student_id, &assessment, target.attempt, concession)?;
            println!(
                "✓ {student_id} {assessment} ({}): {}",
                target.attempt.label(),
                concession.label()
            );
        }
        MarksCommand::Group {
            target,
            student_id,
            group,
        } => {
            let (_, assessment) = ctx.assessment(&target)?;
            let group = (group != 0).then_some(group);
            ctx.store
                .set_assessment_group(&student_id, &assessment, target.attempt, group)?;
            println!(
                "✓ {student_id} {assessment} ({}): group {}",
                target.attempt.label(),
                or_dash(group)
            );
        }
        MarksCommand::Show { student_id, year } => {
            let year = ctx.academic_year(year)?;
            let student = ctx.store.get_student(&student_id)?;
            let pass_mark = ctx.pass_mark();
            println!(
                "\n=== {student} ({student_id}), {} ===\n",
                academic_year_string(year)
            );
            let records = ctx.store.year_records(&student, year)?;
            if records.is_empty() {
                println!("No modules in {}", academic_year_string(year));
            }
            for mut record in records {
                println!(
                    "{} {}: {}",
                    record.module.code,
                    record.module.title,
                    or_dash(record.capped_mark(pass_mark))
                );
                for (title, result) in record.all_results_as_strings() {
                    println!("    {title:<20} {}", result.as_deref().unwrap_or("-"));
                }
                let comments = record.board_comments(pass_mark);
                if !comments.is_empty() {
                    println!("    → {comments}");
                }
            }
        }
        MarksCommand::Recalculate { module, year } => {
            let year = ctx.academic_year(year)?;
            let changed = match module {
                Some(code) => {
                    let module = ctx.store.find_module(&code, year)?;
                    ctx.store.recalculate_module(module.id.unwrap_or_default())?
                }
                None => ctx.store.recalculate_year(year)?,
            };
            println!("✓ Recalculated {changed} module mark(s)");
        }
    }
    Ok(())
}
