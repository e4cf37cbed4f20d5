//! Module, assessment and enrolment command handlers

use super::{confirm, or_dash, CommandResult, Context};
use crate::args::ModuleCommand;
use nomosdb::calendar::{academic_year_string, teaching_pattern, TEACHING_PATTERNS};
use nomosdb::models::{Assessment, Module};
use nomosdb::warn;

/// Dispatch module subcommands
pub fn run(command: ModuleCommand, ctx: &Context) -> CommandResult {
    match command {
        ModuleCommand::Add {
            module: target,
            title,
            credits,
            eligible,
            foundational,
            nalp,
            subjects,
            teachers,
            pattern,
            first_session,
            last_session,
            no_teaching_in,
        } => {
            let year = ctx.academic_year(target.year)?;
            let mut module = Module::new(&title, &target.code, year);
            module.credits = credits;
            module.eligible = eligible;
            module.foundational = foundational;
            module.nalp = nalp;
            module.subject_areas = subjects;
            module.teachers = teachers;
            if let Some(number) = pattern {
                let pattern = teaching_pattern(number)
                    .ok_or_else(|| format!("No teaching pattern {number}, see `module patterns`"))?;
                module.apply_pattern(pattern);
            }
            if first_session.is_some() {
                module.first_session = first_session;
            }
            if last_session.is_some() {
                module.last_session = last_session;
            }
            if no_teaching_in.is_some() {
                module.no_teaching_in = no_teaching_in;
            }
            ctx.store.add_module(&mut module)?;
            println!("✓ Added {} {module}", module.code);
        }
        ModuleCommand::Update {
            module: target,
            title,
            credits,
            eligible,
            foundational,
            nalp,
            subjects,
            teachers,
            pattern,
            first_session,
            last_session,
            no_teaching_in,
        } => {
            let mut module = ctx.module(&target)?;
            if let Some(title) = title {
                module.title = title.trim().to_string();
            }
            if let Some(credits) = credits {
                module.credits = credits;
            }
            if let Some(eligible) = eligible {
                module.eligible = eligible;
            }
            if let Some(foundational) = foundational {
                module.foundational = foundational;
            }
            if let Some(nalp) = nalp {
                module.nalp = nalp;
            }
            if !subjects.is_empty() {
                module.subject_areas = subjects;
            }
            if !teachers.is_empty() {
                module.teachers = teachers;
            }
            if let Some(number) = pattern {
                let pattern = teaching_pattern(number)
                    .ok_or_else(|| format!("No teaching pattern {number}, see `module patterns`"))?;
                module.apply_pattern(pattern);
            }
            if first_session.is_some() {
                module.first_session = first_session;
            }
            if last_session.is_some() {
                module.last_session = last_session;
            }
            if let Some(weeks) = no_teaching_in {
                module.no_teaching_in = (!weeks.trim().is_empty()).then_some(weeks);
            }
            ctx.store.update_module(&module)?;
            println!("✓ Updated {} {module}", module.code);
        }
        ModuleCommand::Show { module } => show(&ctx.module(&module)?, ctx)?,
        ModuleCommand::List { year } => {
            let modules = ctx.store.modules(year)?;
            for module in &modules {
                println!(
                    "{:<10} {:<8} {:>3} cr  {}",
                    module.code,
                    academic_year_string(module.year),
                    module.credits,
                    module.title
                );
            }
            println!("{} module(s)", modules.len());
        }
        ModuleCommand::Patterns => {
            for (index, pattern) in TEACHING_PATTERNS.iter().enumerate() {
                println!(
                    "{}  {:<24} weeks {}-{}, none in {}",
                    index + 1,
                    pattern.name,
                    pattern.first_session,
                    pattern.last_session,
                    pattern.no_teaching_in
                );
            }
        }
        ModuleCommand::Delete { module, yes } => {
            let module = ctx.module(&module)?;
            let question = format!("Delete {} {module} with all marks and feedback?", module.code);
            if confirm(&question, yes) {
                ctx.store.delete_module(module.id.unwrap_or_default())?;
                println!("✓ Deleted {module}");
            } else {
                println!("✗ Delete cancelled");
            }
        }
        ModuleCommand::Enroll { module, students } => {
            let module = ctx.module(&module)?;
            let module_id = module.id.unwrap_or_default();
            for student_id in students {
                match ctx.store.enroll(&student_id, module_id) {
                    Ok(_) => println!("✓ {student_id} enrolled in {module}"),
                    Err(e) => println!("✗ {student_id}: {e}"),
                }
            }
        }
        ModuleCommand::Unenroll { module, students } => {
            let module = ctx.module(&module)?;
            let module_id = module.id.unwrap_or_default();
            for student_id in students {
                match ctx.store.unenroll(&student_id, module_id) {
                    Ok(()) => println!("✓ {student_id} removed from {module}"),
                    Err(e) => println!("✗ {student_id}: {e}"),
                }
            }
        }
        ModuleCommand::SeminarGroup {
            module,
            group,
            students,
        } => {
            let module = ctx.module(&module)?;
            let group = (group != 0).then_some(group);
            for student_id in students {
                ctx.store
                    .set_seminar_group(&student_id, module.id.unwrap_or_default(), group)?;
            }
            println!("✓ Seminar group {} updated in {module}", or_dash(group));
        }
        ModuleCommand::AddAssessment {
            module,
            title,
            value,
            marksheet,
            resit_marksheet,
            group,
            submission_date,
            max_word_count,
        } => {
            let module = ctx.module(&module)?;
            let mut assessment = Assessment::new(module.id.unwrap_or_default(), &title, value);
            assessment.marksheet_type = marksheet;
            assessment.resit_marksheet_type = resit_marksheet.or(marksheet);
            assessment.group_assessment = group;
            assessment.submission_date = submission_date;
            assessment.max_word_count = max_word_count;
            if marksheet.is_some_and(|m| m.is_group()) != group {
                warn!("{title}: group marking and marksheet type do not match");
            }
            ctx.store.add_assessment(&mut assessment)?;
            println!("✓ Added {assessment} ({value}%) to {module}");
        }
        ModuleCommand::DeleteAssessment {
            module,
            assessment,
            yes,
        } => {
            let module = ctx.module(&module)?;
            let assessment = ctx
                .store
                .find_assessment(module.id.unwrap_or_default(), &assessment)?;
            let question = format!("Delete {assessment} of {module} with all marks and feedback?");
            if confirm(&question, yes) {
                ctx.store.delete_assessment(assessment.id.unwrap_or_default())?;
                ctx.store.recalculate_module(module.id.unwrap_or_default())?;
                println!("✓ Deleted {assessment} from {module}");
            } else {
                println!("✗ Delete cancelled");
            }
        }
        ModuleCommand::Nines { module } => {
            let module = ctx.module(&module)?;
            let nines = ctx.store.nines(module.id.unwrap_or_default())?;
            if nines.is_empty() {
                println!("✓ No module mark in {module} ends in 9");
            }
            for (student, performance) in nines {
                println!(
                    "{:<10} {student}: {}",
                    student.student_id,
                    or_dash(performance.average)
                );
            }
        }
    }
    Ok(())
}

fn show(module: &Module, ctx: &Context) -> CommandResult {
    let module_id = module.id.unwrap_or_default();
    println!("\n=== {} {module} ===\n", module.code);
    println!("Credits:     {}", module.credits);
    println!("Years:       {}", module.eligible);
    println!("Subjects:    {}", module.subject_areas.join(", "));
    println!("Teachers:    {}", module.teachers.join(", "));
    println!(
        "Sessions:    {}-{}{}",
        or_dash(module.first_session),
        or_dash(module.last_session),
        module
            .no_teaching_in
            .as_deref()
            .map_or_else(String::new, |weeks| format!(", none in {weeks}"))
    );
    if module.foundational {
        println!("Foundational QLD subject");
    }

    println!("\nAssessments:");
    for assessment in ctx.store.assessments(module_id)? {
        println!(
            "  {:<20} {:>3}%  {}",
            assessment.title,
            assessment.value,
            assessment
                .marksheet_type
                .map_or_else(|| "no marksheet".to_string(), |m| m.title().to_string())
        );
    }

    let enrolled = ctx.store.enrolled(module_id)?;
    println!("\nStudents ({}):", enrolled.len());
    for (student, performance) in enrolled {
        println!(
            "  {:<10} {:<30} group {:<3} {:>4}  {}",
            student.student_id,
            student.to_string(),
            or_dash(performance.seminar_group),
            or_dash(performance.average),
            performance.attendance.count()
        );
    }
    Ok(())
}
