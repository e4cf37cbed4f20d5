//! Summary of a year-end progression run

use askama::Template;

use super::table_cell;
use crate::calendar::academic_year_string;
use crate::progression::ProgressionSummary;

/// One applied decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRow {
    /// "Last, First"
    pub name: String,
    /// Student id
    pub student_id: String,
    /// Decision with its label
    pub decision: String,
    /// What happened
    pub outcome: String,
}

/// What [`proceed_to_next_year`](crate::progression::proceed_to_next_year) did
#[derive(Debug, Clone, Template)]
#[template(path = "progression.md", escape = "none")]
pub struct ProgressionReport {
    /// Year that ended
    pub from_session: String,
    /// Year now current
    pub to_session: String,
    /// Averages recalculated
    pub recalculated: usize,
    /// Applied decisions
    pub rows: Vec<ChangeRow>,
    /// Decisions that could not be applied
    pub skipped: usize,
    /// Students without a decision
    pub undecided: Vec<String>,
}

impl From<&ProgressionSummary> for ProgressionReport {
    fn from(summary: &ProgressionSummary) -> Self {
        Self {
            from_session: academic_year_string(summary.from_year),
            to_session: academic_year_string(summary.to_year),
            recalculated: summary.recalculated,
            rows: summary
                .changes
                .iter()
                .map(|change| ChangeRow {
                    name: table_cell(&change.name),
                    student_id: change.student_id.clone(),
                    decision: change.decision.to_string(),
                    outcome: table_cell(&change.outcome.to_string()),
                })
                .collect(),
            skipped: summary.skipped().count(),
            undecided: summary.undecided.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NextYear, StudyYear};
    use crate::progression::{Change, Outcome};
    use crate::report::ReportGenerator;

    #[test]
    fn test_progression_report() {
        let summary = ProgressionSummary {
            from_year: 1900,
            to_year: 1901,
            recalculated: 4,
            changes: vec![
                Change {
                    student_id: "bb23".to_string(),
                    name: "Bunny, Bugs".to_string(),
                    decision: NextYear::Proceed,
                    outcome: Outcome::Advanced {
                        from: StudyYear::First,
                        to: StudyYear::Second,
                    },
                },
                Change {
                    student_id: "dd42".to_string(),
                    name: "Duck, Daffy".to_string(),
                    decision: NextYear::Proceed,
                    outcome: Outcome::Skipped("year 3 is a final year".to_string()),
                },
            ],
            undecided: vec!["Pig, Porky (pp01)".to_string()],
        };
        let report = ProgressionReport::from(&summary);
        assert_eq!(report.skipped, 1);
        let text = report.render_report().unwrap();
        assert!(text.starts_with("# Progression from 1900/01 to 1901/02"));
        assert!(text.contains("| Bunny, Bugs | bb23 | PP (Pass and Proceed) | year 1 to year 2 |"));
        assert!(text.contains("2 decisions, 1 not applied."));
        assert!(text.contains("- Pig, Porky (pp01)"));
    }
}
