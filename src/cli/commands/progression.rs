//! Progression board command handlers

use std::path::PathBuf;

use super::{confirm, CommandResult, Context};
use crate::args::{parse_decision, ProgressionCommand};
use nomosdb::calendar::academic_year_string;
use nomosdb::progression::{proceed_to_next_year, set_next_year, suggest_for_year};
use nomosdb::report::{ProgressionReport, ReportGenerator};

/// Dispatch progression subcommands
pub fn run(command: ProgressionCommand, ctx: &Context) -> CommandResult {
    match command {
        ProgressionCommand::Suggest { year, apply } => {
            let rules = ctx.rules();
            let mut applied = 0;
            for (student, suggestion) in suggest_for_year(&ctx.store, year, &rules)? {
                let current = student
                    .next_year
                    .map_or_else(|| "-".to_string(), |d| d.code().to_string());
                let suggested = suggestion.map_or("?", |d| d.code());
                println!(
                    "{:<10} {:<30} {current:<5} {suggested}",
                    student.student_id,
                    student.to_string()
                );
                if apply && student.next_year.is_none() {
                    if let Some(decision) = suggestion {
                        set_next_year(&ctx.store, &student.student_id, Some(decision))?;
                        applied += 1;
                    }
                }
            }
            if apply {
                println!("✓ Recorded {applied} suggested decision(s)");
            }
        }
        ProgressionCommand::Set {
            student_id,
            decision,
        } => {
            let decision = parse_decision(&decision)?;
            let student = set_next_year(&ctx.store, &student_id, decision)?;
            match decision {
                Some(d) => println!("✓ {student}: {d}"),
                None => println!("✓ {student}: decision cleared"),
            }
        }
        ProgressionCommand::Proceed { yes } => {
            let year = ctx.store.current_year()?;
            let question = format!(
                "Apply all decisions and move from {} to {}?",
                academic_year_string(year),
                academic_year_string(year + 1)
            );
            if !confirm(&question, yes) {
                println!("✗ Proceed cancelled");
                return Ok(());
            }
            let summary = proceed_to_next_year(&ctx.store, &ctx.rules())?;
            let report = ProgressionReport::from(&summary);
            let path = PathBuf::from(&ctx.config.paths.reports_dir)
                .join(format!("progression_{}.md", summary.from_year));
            report.generate(&path)?;
            println!(
                "✓ Now in {}: {} decision(s) applied, {} not applied, {} without a decision",
                report.to_session,
                report.rows.len() - report.skipped,
                report.skipped,
                report.undecided.len()
            );
            println!("✓ Summary written to {}", path.display());
        }
    }
    Ok(())
}
