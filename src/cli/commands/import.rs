//! CSV import command handlers

use std::fs::File;

use super::{CommandResult, Context};
use crate::args::ImportCommand;
use nomosdb::import::{import_exam_ids, import_students_from_path, parse_columns, ImportOptions};

/// Import students or exam ids
pub fn run(command: ImportCommand, ctx: &Context) -> CommandResult {
    match command {
        ImportCommand::Students {
            file,
            delimiter,
            columns,
            skip,
        } => {
            let delimiter = u8::try_from(delimiter)
                .map_err(|_| format!("Delimiter must be a single byte, got '{delimiter}'"))?;
            let options = ImportOptions {
                delimiter,
                columns: columns.as_deref().map(parse_columns).transpose()?,
                skip_rows: skip,
            };
            let summary = import_students_from_path(&ctx.store, &file, &options)?;
            println!(
                "✓ Imported {}: {} created, {} updated, {} skipped",
                file.display(),
                summary.created.len(),
                summary.updated.len(),
                summary.skipped
            );
        }
        ImportCommand::ExamIds { file } => {
            let reader = File::open(&file)
                .map_err(|e| format!("Cannot open {}: {e}", file.display()))?;
            let summary = import_exam_ids(&ctx.store, reader)?;
            println!("✓ {} exam id(s) assigned", summary.imported);
            for conflict in &summary.conflicts {
                println!("✗ {conflict}");
            }
            for student_id in &summary.unknown {
                println!("✗ Unknown student: {student_id}");
            }
        }
    }
    Ok(())
}
