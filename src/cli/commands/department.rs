//! Subject area, programme and staff command handlers

use super::{CommandResult, Context};
use crate::args::{CourseCommand, StaffCommand, SubjectCommand};
use nomosdb::models::{Course, Staff, SubjectArea};

/// Add or list subject areas
pub fn run_subject(command: SubjectCommand, ctx: &Context) -> CommandResult {
    match command {
        SubjectCommand::Add { name } => {
            let area = SubjectArea::new(&name);
            ctx.store.add_subject_area(&area)?;
            println!("✓ Added subject area {area} ({})", area.slug);
        }
        SubjectCommand::List => {
            for area in ctx.store.subject_areas()? {
                println!("{:<24} {area}", area.slug);
            }
        }
    }
    Ok(())
}

/// Add or list programmes
pub fn run_course(command: CourseCommand, ctx: &Context) -> CommandResult {
    match command {
        CourseCommand::Add {
            title,
            short,
            subjects,
        } => {
            let mut course = Course::new(title, short);
            for slug in subjects {
                course.add_subject_area(slug);
            }
            let id = ctx.store.add_course(&mut course)?;
            println!("✓ Added programme {course} (id {id})");
        }
        CourseCommand::List => {
            for course in ctx.store.courses()? {
                println!(
                    "{:>4}  {:<10} {course} [{}]",
                    course.id.unwrap_or_default(),
                    course.label(),
                    course.subject_areas.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Add or list staff
pub fn run_staff(command: StaffCommand, ctx: &Context) -> CommandResult {
    match command {
        StaffCommand::Add {
            username,
            first_name,
            last_name,
            email,
            role,
            subjects,
            pastoral_care,
            programme_director,
            main_admin,
        } => {
            let mut staff = Staff::new(username, first_name, last_name);
            staff.email = email.unwrap_or_default();
            staff.role = role;
            staff.subject_areas = subjects;
            staff.pastoral_care = pastoral_care;
            staff.programme_director = programme_director;
            staff.main_admin = main_admin;
            ctx.store.add_staff(&staff)?;
            println!("✓ Added {} {staff} as {}", staff.username, role.code());
        }
        StaffCommand::List { role } => {
            for staff in ctx.store.staff(role)? {
                let mut flags = Vec::new();
                if staff.pastoral_care {
                    flags.push("pastoral care");
                }
                if staff.programme_director {
                    flags.push("programme director");
                }
                if staff.main_admin {
                    flags.push("main admin");
                }
                println!(
                    "{:<12} {:<8} {staff}{}",
                    staff.username,
                    staff.role.code(),
                    if flags.is_empty() {
                        String::new()
                    } else {
                        format!(" - {}", flags.join(", "))
                    }
                );
            }
        }
    }
    Ok(())
}
