//! Marksheet command handlers

use super::{or_dash, CommandResult, Context};
use crate::args::{FeedbackCommand, MarksheetFields};
use nomosdb::feedback::{band_label, MarksheetType};
use nomosdb::models::{Assessment, Attempt, GroupFeedback, IndividualFeedback, IndividualPart};

/// Dispatch feedback subcommands
pub fn run(command: FeedbackCommand, ctx: &Context) -> CommandResult {
    match command {
        FeedbackCommand::Set {
            target,
            student_id,
            fields,
            submission_date,
            second_first_marker,
            moderator,
            deduction,
            deduction_explanation,
        } => {
            let (module, assessment) = ctx.assessment(&target)?;
            let marksheet = individual_marksheet(&assessment, target.attempt)?;
            let performance = ctx
                .store
                .get_performance(&student_id, module.id.unwrap_or_default())?;
            let result = ctx.store.result_for(&performance, &assessment)?;
            let result_id = result.id.unwrap_or_default();
            let mut feedback = ctx
                .store
                .individual_feedback(result_id, target.attempt)?
                .unwrap_or_else(|| IndividualFeedback::new(result_id, target.attempt));

            for (number, mark) in fields.categories {
                feedback.set_category_mark(marksheet, number, mark)?;
            }
            if let Some(marker) = fields.marker {
                feedback.marker = Some(marker);
            }
            if let Some(date) = fields.marking_date {
                feedback.marking_date = Some(date);
            }
            if let Some(comments) = fields.comments {
                feedback.comments = comments;
            }
            if let Some(date) = submission_date {
                feedback.submission_date = Some(date);
            }
            if let Some(marker) = second_first_marker {
                feedback.second_first_marker = Some(marker);
            }
            if let Some(moderator) = moderator {
                feedback.second_marker = Some(moderator);
            }
            if let Some(deduction) = deduction {
                feedback.deduction = (deduction != 0).then_some(deduction);
            }
            if let Some(explanation) = deduction_explanation {
                feedback.deduction_explanation = explanation;
            }
            feedback.update_completion(result.get_mark(target.attempt));
            ctx.store.save_individual_feedback(&mut feedback)?;
            println!(
                "✓ {} marksheet of {student_id} for {assessment} saved{}",
                marksheet.title(),
                if feedback.completed { " (complete)" } else { "" }
            );
        }
        FeedbackCommand::Show { target, student_id } => {
            let (module, assessment) = ctx.assessment(&target)?;
            let marksheet = assessment
                .marksheet_for(target.attempt)
                .ok_or_else(|| format!("{assessment} has no marksheet"))?;
            let performance = ctx
                .store
                .get_performance(&student_id, module.id.unwrap_or_default())?;
            let result = ctx.store.result_for(&performance, &assessment)?;
            println!(
                "\n=== {assessment}, {module}: {student_id} ({}) ===\n",
                target.attempt.label()
            );
            if marksheet.is_group() {
                let group = result
                    .group(target.attempt)
                    .ok_or_else(|| format!("{student_id} is not in a marking group"))?;
                match ctx
                    .store
                    .group_feedback(assessment.id.unwrap_or_default(), group, target.attempt)?
                {
                    Some(feedback) => show_group(&feedback, marksheet, &student_id),
                    None => println!("No marksheet for group {group} yet"),
                }
            } else {
                match ctx
                    .store
                    .individual_feedback(result.id.unwrap_or_default(), target.attempt)?
                {
                    Some(feedback) => show_individual(&feedback, marksheet),
                    None => println!("No marksheet yet"),
                }
            }
            println!("Mark: {}", or_dash(result.get_mark(target.attempt)));
        }
        FeedbackCommand::GroupSet {
            target,
            group,
            fields,
            parts,
        } => {
            let (_, assessment) = ctx.assessment(&target)?;
            let marksheet = assessment
                .marksheet_for(target.attempt)
                .filter(|m| m.is_group())
                .ok_or_else(|| format!("{assessment} has no group marksheet"))?;
            let members = ctx.store.group_members(&assessment, target.attempt, group)?;
            if members.is_empty() {
                return Err(format!("Group {group} of {assessment} has no members").into());
            }
            let mut feedback = ctx
                .store
                .group_feedback(assessment.id.unwrap_or_default(), group, target.attempt)?
                .unwrap_or_else(|| {
                    GroupFeedback::new(assessment.id.unwrap_or_default(), group, target.attempt)
                });
            apply_group_fields(&mut feedback, marksheet, fields)?;
            for part in &parts {
                let (student_id, part, value) = parse_part(part)?;
                if !members.iter().any(|m| m == student_id) {
                    return Err(format!("{student_id} is not in group {group}").into());
                }
                feedback.set_individual_part(part, student_id, value)?;
            }
            ctx.store.in_transaction(|store| {
                store.save_group_feedback(&mut feedback)?;
                for student_id in &members {
                    if let Some(mark) = feedback.student_mark(marksheet, student_id) {
                        store.set_mark(student_id, &assessment, target.attempt, Some(mark))?;
                    }
                }
                Ok(())
            })?;
            println!("✓ Group {group} marksheet for {assessment} saved");
            for student_id in &members {
                println!(
                    "  {student_id:<10} {}",
                    or_dash(feedback.student_mark(marksheet, student_id))
                );
            }
        }
    }
    Ok(())
}

fn individual_marksheet(assessment: &Assessment, attempt: Attempt) -> CommandResult<MarksheetType> {
    match assessment.marksheet_for(attempt) {
        Some(marksheet) if marksheet.is_group() => Err(format!(
            "{assessment} is marked in groups, use `feedback group-set`"
        )
        .into()),
        Some(marksheet) => Ok(marksheet),
        None => Err(format!("{assessment} has no marksheet").into()),
    }
}

fn apply_group_fields(
    feedback: &mut GroupFeedback,
    marksheet: MarksheetType,
    fields: MarksheetFields,
) -> CommandResult {
    for (number, mark) in fields.categories {
        feedback.set_group_category_mark(marksheet, number, mark)?;
    }
    if let Some(marker) = fields.marker {
        feedback.marker = Some(marker);
    }
    if let Some(date) = fields.marking_date {
        feedback.marking_date = Some(date);
    }
    if let Some(comments) = fields.comments {
        feedback.group_comments = comments;
    }
    Ok(())
}

/// Split `STUDENT:PART=VALUE`
fn parse_part(text: &str) -> CommandResult<(&str, IndividualPart, &str)> {
    let (student_id, rest) = text
        .split_once(':')
        .ok_or_else(|| format!("Expected STUDENT:PART=VALUE, got '{text}'"))?;
    let (part, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("Expected STUDENT:PART=VALUE, got '{text}'"))?;
    Ok((student_id.trim(), part.parse()?, value))
}

fn show_individual(feedback: &IndividualFeedback, marksheet: MarksheetType) {
    println!("{}", marksheet.title());
    for (index, category) in marksheet.categories().iter().enumerate() {
        let mark = u8::try_from(index + 1)
            .ok()
            .and_then(|n| feedback.category_marks.get(&n));
        println!(
            "  {:<55} {}",
            category.title,
            mark.map_or_else(|| "-".to_string(), |m| format!("{m} ({})", band_label(*m)))
        );
    }
    println!("Marker:    {}", feedback.marker.as_deref().unwrap_or("-"));
    println!("Marked on: {}", or_dash(feedback.marking_date));
    println!("Submitted: {}", or_dash(feedback.submission_date));
    if let Some(deduction) = feedback.deduction {
        println!("Deduction: {deduction} ({})", feedback.deduction_explanation);
    }
    if !feedback.comments.is_empty() {
        println!("\n{}\n", feedback.comments);
    }
}

fn show_group(feedback: &GroupFeedback, marksheet: MarksheetType, student_id: &str) {
    println!("{}, group {}", marksheet.title(), feedback.group_no);
    for (index, category) in marksheet.group_categories().iter().enumerate() {
        let mark = u8::try_from(index + 1)
            .ok()
            .and_then(|n| feedback.group_category_marks.get(&n));
        println!("  {:<55} {}", category.title, or_dash(mark));
    }
    for (index, category) in marksheet.categories().iter().enumerate() {
        let mark = u8::try_from(index + 1)
            .ok()
            .and_then(|n| feedback.individual_mark(IndividualPart::Category(n), student_id));
        println!("  {:<55} {}", category.title, or_dash(mark));
    }
    if let Some(mark) = feedback.individual_mark(IndividualPart::ComponentMark, student_id) {
        println!("  {:<55} {mark}", "Individual component");
    }
    println!("Marker:    {}", feedback.marker.as_deref().unwrap_or("-"));
    if !feedback.group_comments.is_empty() {
        println!("\n{}", feedback.group_comments);
    }
    if let Some(comments) = feedback.get_individual_part(IndividualPart::Comments, student_id) {
        println!("\n{comments}");
    }
    println!("Mark:      {}", or_dash(feedback.student_mark(marksheet, student_id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_part() {
        let (student, part, value) = parse_part("bb23:2=65").unwrap();
        assert_eq!(student, "bb23");
        assert_eq!(part, IndividualPart::Category(2));
        assert_eq!(value, "65");

        let (_, part, value) = parse_part("dd42:comments=Well done: clear").unwrap();
        assert_eq!(part, IndividualPart::Comments);
        assert_eq!(value, "Well done: clear");

        assert!(parse_part("bb23=65").is_err());
        assert!(parse_part("bb23:part=65").is_err());
    }
}
