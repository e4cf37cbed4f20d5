//! Report command handlers

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::{CommandResult, Context};
use crate::args::ReportCommand;
use nomosdb::models::Module;
use nomosdb::report::{
    export_module_marks, AttendanceSheet, ExamBoardReport, ModuleMarksReport,
    ProblemStudentsReport, ReportFormat, ReportGenerator, Tier4AttendanceReport,
};

/// Dispatch report subcommands
pub fn run(command: ReportCommand, ctx: &Context) -> CommandResult {
    match command {
        ReportCommand::Module {
            module,
            format,
            output,
        } => {
            let module = ctx.module(&module)?;
            match format {
                ReportFormat::Markdown => {
                    let path = output.unwrap_or_else(|| {
                        default_path(&ctx.config.paths.reports_dir, &module, format)
                    });
                    let module_id = module.id.unwrap_or_default();
                    ModuleMarksReport::build(&ctx.store, module_id, ctx.pass_mark())?
                        .generate(&path)?;
                    println!("✓ Report written to {}", path.display());
                }
                ReportFormat::Csv => {
                    let path = output.unwrap_or_else(|| {
                        default_path(&ctx.config.paths.exports_dir, &module, format)
                    });
                    export(ctx, &module, &path)?;
                }
            }
        }
        ReportCommand::Problems { year, output } => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(&ctx.config.paths.reports_dir)
                    .join(format!("problem_students_year_{}.md", year.code()))
            });
            ProblemStudentsReport::build(&ctx.store, year, ctx.pass_mark())?.generate(&path)?;
            println!("✓ Report written to {}", path.display());
        }
        ReportCommand::Export { module, output } => {
            let module = ctx.module(&module)?;
            let path = output.unwrap_or_else(|| {
                default_path(&ctx.config.paths.exports_dir, &module, ReportFormat::Csv)
            });
            export(ctx, &module, &path)?;
        }
        ReportCommand::Attendance { module, output } => {
            let module = ctx.module(&module)?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(&ctx.config.paths.reports_dir)
                    .join(format!("attendance_{}_{}.md", module.code, module.year))
            });
            let sheet = AttendanceSheet::build(&ctx.store, module.id.unwrap_or_default())?;
            sheet.generate(&path)?;
            println!("✓ Report written to {}", path.display());
            if sheet.missing > 0 {
                println!("  {} student(s) missed the last two sessions", sheet.missing);
            }
        }
        ReportCommand::Board {
            level,
            year,
            subject,
            output,
        } => {
            let year = ctx.academic_year(year)?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(&ctx.config.paths.reports_dir)
                    .join(format!("exam_board_{year}_year_{}.md", level.code()))
            });
            ExamBoardReport::build(&ctx.store, year, level, subject.as_deref(), ctx.pass_mark())?
                .generate(&path)?;
            println!("✓ Report written to {}", path.display());
        }
        ReportCommand::Tier4 {
            year,
            subject,
            output,
        } => {
            let year = ctx.academic_year(year)?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(&ctx.config.paths.reports_dir)
                    .join(format!("tier_4_attendance_{year}.md"))
            });
            let report = Tier4AttendanceReport::build(&ctx.store, year, subject.as_deref())?;
            report.generate(&path)?;
            println!("✓ Report written to {}", path.display());
            for student in report.students.iter().filter(|s| s.needs_attention()) {
                println!(
                    "  {} ({}) missed two sessions in a row",
                    student.name, student.student_id
                );
            }
        }
    }
    Ok(())
}

fn default_path(dir: &str, module: &Module, format: ReportFormat) -> PathBuf {
    PathBuf::from(dir).join(format!(
        "{}_{}.{}",
        module.code,
        module.year,
        format.extension()
    ))
}

fn export(ctx: &Context, module: &Module, path: &Path) -> CommandResult {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let rows = export_module_marks(&ctx.store, module.id.unwrap_or_default(), file)?;
    println!("✓ Exported {rows} student(s) to {}", path.display());
    Ok(())
}
