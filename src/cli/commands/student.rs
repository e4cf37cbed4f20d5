//! Student command handlers

use super::{confirm, or_dash, CommandResult, Context};
use crate::args::{StudentCommand, StudentFields};
use nomosdb::calendar::academic_year_string;
use nomosdb::models::Student;
use nomosdb::store::StudentFilter;

/// Dispatch student subcommands
pub fn run(command: StudentCommand, ctx: &Context) -> CommandResult {
    match command {
        StudentCommand::Add {
            student_id,
            first,
            last,
            fields,
        } => {
            let mut student = Student::new(student_id, first, last);
            apply_fields(&mut student, fields, ctx)?;
            ctx.store.add_student(&student)?;
            println!("✓ Added {student} ({})", student.student_id);
        }
        StudentCommand::Show { student_id } => show(&student_id, ctx)?,
        StudentCommand::List {
            year,
            subject,
            course,
            tutor,
            all,
        } => {
            let course_id = match course {
                Some(key) => ctx.store.find_course(&key)?.id,
                None => None,
            };
            let filter = StudentFilter {
                year,
                subject_area: subject,
                course_id,
                tutor,
                active_only: !all,
            };
            print_students(&ctx.store.students(&filter)?);
        }
        StudentCommand::Search { query } => {
            let found = ctx.store.search_students(&query.join(" "))?;
            if found.is_empty() {
                println!("✗ No student matches '{}'", query.join(" "));
            }
            print_students(&found);
        }
        StudentCommand::Update { student_id, fields } => {
            let mut student = ctx.store.get_student(&student_id)?;
            apply_fields(&mut student, fields, ctx)?;
            ctx.store.update_student(&student)?;
            println!("✓ Updated {student} ({student_id})");
        }
        StudentCommand::Delete { student_id, yes } => {
            let student = ctx.store.get_student(&student_id)?;
            let question =
                format!("Delete {student} ({student_id}) with all marks and feedback?");
            if confirm(&question, yes) {
                ctx.store.delete_student(&student_id)?;
                println!("✓ Deleted {student}");
            } else {
                println!("✗ Delete cancelled");
            }
        }
    }
    Ok(())
}

/// Copy the given fields onto a student; empty strings clear optional ones
fn apply_fields(student: &mut Student, fields: StudentFields, ctx: &Context) -> CommandResult {
    if let Some(first_name) = fields.first_name {
        student.first_name = first_name;
    }
    if let Some(last_name) = fields.last_name {
        student.last_name = last_name;
    }
    if let Some(exam_id) = fields.exam_id {
        student.exam_id = non_empty(exam_id);
    }
    if let Some(since) = fields.since {
        student.since = Some(since);
    }
    if let Some(year) = fields.year {
        student.year = Some(year);
    }
    if let Some(email) = fields.email {
        student.email = email;
    }
    if let Some(course) = fields.course {
        student.course_id = if course.is_empty() {
            None
        } else {
            ctx.store.find_course(&course)?.id
        };
    }
    if let Some(tutor) = fields.tutor {
        student.tutor = non_empty(tutor);
    }
    if let Some(part_time) = fields.part_time {
        student.is_part_time = part_time;
    }
    if let Some(qld) = fields.qld {
        student.qld = qld;
    }
    if let Some(active) = fields.active {
        student.active = active;
    }
    if let Some(tier_4) = fields.tier_4 {
        student.tier_4 = tier_4;
    }
    if let Some(nalp) = fields.nalp {
        student.nalp = nalp;
    }
    if let Some(lsp) = fields.lsp {
        student.lsp = non_empty(lsp);
    }
    if let Some(note) = fields.note {
        student.add_note(&note);
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn print_students(students: &[Student]) {
    for student in students {
        println!(
            "{:<10} {:<8} {:<4} {}{}",
            student.student_id,
            student.exam_id.as_deref().unwrap_or("-"),
            or_dash(student.year.map(|y| y.code())),
            student,
            if student.active { "" } else { " (inactive)" }
        );
    }
    println!("{} student(s)", students.len());
}

fn show(student_id: &str, ctx: &Context) -> CommandResult {
    let student = ctx.store.get_student(student_id)?;
    println!("\n=== {student} ({}) ===\n", student.student_id);
    println!("Exam id:     {}", student.exam_id.as_deref().unwrap_or("-"));
    println!(
        "Year:        {}",
        student.year.map_or_else(|| "-".to_string(), |y| y.label().to_string())
    );
    println!("Since:       {}", or_dash(student.since.map(academic_year_string)));
    if let Some(course_id) = student.course_id {
        println!("Programme:   {}", ctx.store.find_course(&course_id.to_string())?);
    }
    println!("Email:       {}", student.email);
    println!("Tutor:       {}", student.tutor.as_deref().unwrap_or("-"));
    println!(
        "Status:      {}{}{}{}",
        if student.active { "active" } else { "inactive" },
        if student.is_part_time { ", part time" } else { "" },
        if student.qld { ", QLD" } else { "" },
        if student.tier_4 { ", Tier 4" } else { "" }
    );
    if let Some(lsp) = &student.lsp {
        println!("LSP:         {lsp}");
    }
    if let Some(decision) = student.next_year {
        println!("Decision:    {decision}");
    }
    if let Some(degree) = student.achieved_degree {
        println!(
            "Degree:      {degree} ({})",
            or_dash(student.graduated_in.map(academic_year_string))
        );
    }

    let modules = ctx.store.modules_of(&student.student_id, None)?;
    if !modules.is_empty() {
        println!("\nModules:");
        for module in modules {
            let performance = ctx
                .store
                .get_performance(&student.student_id, module.id.unwrap_or_default())?;
            println!(
                "  {:<10} {module}: {}",
                module.code,
                or_dash(performance.average)
            );
        }
    }

    let sessions = ctx.store.tutee_sessions(&student.student_id)?;
    if !sessions.is_empty() {
        println!("\nTutor meetings: {}", sessions.len());
    }
    if !student.notes.is_empty() {
        println!("\nNotes:\n{}", student.notes);
    }
    Ok(())
}
