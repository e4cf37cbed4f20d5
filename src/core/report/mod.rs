//! Report generation
//!
//! Markdown reports are askama templates from `templates/`; each report
//! struct is built from the store and rendered through [`ReportGenerator`].
//! Mark sheets can also be exported as CSV for spreadsheets.

pub mod attendance;
pub mod board;
pub mod marks;
pub mod problems;
pub mod progression;

pub use attendance::{
    AttendanceRow, AttendanceSheet, SeminarGroup, Tier4AttendanceReport, Tier4Row, Tier4Student,
};
pub use board::{BoardModule, BoardRow, ExamBoardReport};
pub use marks::{export_module_marks, MarkRow, ModuleMarksReport};
pub use problems::{ProblemRow, ProblemStudentsReport};
pub use progression::ProgressionReport;

use askama::Template;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::info;
use crate::Result;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown tables
    Markdown,
    /// Comma separated values
    Csv,
}

impl ReportFormat {
    /// File extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown report format: {s}")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Anything that renders to a report file
pub trait ReportGenerator {
    /// Report content as a string
    ///
    /// # Errors
    /// [`Error::Template`](crate::Error::Template) when rendering fails.
    fn render_report(&self) -> Result<String>;

    /// Write the report to a file, creating parent directories
    ///
    /// # Errors
    /// Rendering errors and [`Error::Io`](crate::Error::Io).
    fn generate(&self, output_path: &Path) -> Result<()> {
        let content = self.render_report()?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, content)?;
        info!("Report written to {}", output_path.display());
        Ok(())
    }
}

impl<T: Template> ReportGenerator for T {
    fn render_report(&self) -> Result<String> {
        Ok(self.render()?)
    }
}

/// Mark for a table cell, "-" when missing
#[must_use]
pub fn mark_cell(mark: Option<i32>) -> String {
    mark.map_or_else(|| "-".to_string(), |m| m.to_string())
}

/// Pipes would break Markdown table rows
#[must_use]
pub fn table_cell(text: &str) -> String {
    text.replace('|', "/").replace('\n', " ")
}
