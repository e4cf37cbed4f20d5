//! CLI argument definitions for `NomosDB`

use chrono::NaiveDate;
use clap::{builder::BoolishValueParser, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use nomosdb::attendance::Presence;
use nomosdb::config::ConfigOverrides;
use nomosdb::feedback::MarksheetType;
use nomosdb::logger::Level;
use nomosdb::models::{Attempt, Concession, NextYear, Role, StudyYear};
use nomosdb::report::ReportFormat;

/// CLI log level argument
///
/// Converts to lowercase strings for config storage and to `Level` for
/// runtime use.
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevelArg {
    /// Error-level logging
    Error,
    /// Warning-level logging
    Warn,
    /// Info-level logging
    Info,
    /// Debug-level logging
    Debug,
}

impl From<LogLevelArg> for Level {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
        }
    }
}

impl std::fmt::Display for LogLevelArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let as_str = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        };
        write!(f, "{as_str}")
    }
}

/// Stage of study given by its code (1, 2, 3, 7, 8 or 9)
pub fn parse_study_year(s: &str) -> Result<StudyYear, String> {
    s.trim()
        .parse::<i32>()
        .ok()
        .and_then(StudyYear::from_code)
        .ok_or_else(|| format!("Unknown year of study: '{s}' (use 1, 2, 3, 7, 8 or 9)"))
}

/// A board decision code, or `none` to clear it
pub fn parse_decision(s: &str) -> Result<Option<NextYear>, String> {
    if s.trim().eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

/// `NAME=VALUE` pair
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("Expected NAME=VALUE, got '{s}'"))
}

/// Category number and mark, `3=65`; an empty mark clears the category
pub fn parse_category_mark(s: &str) -> Result<(u8, Option<i32>), String> {
    let (number, mark) = parse_assignment(s)?;
    let number = number
        .parse()
        .map_err(|_| format!("Category must be a number, got '{number}'"))?;
    let mark = if mark.is_empty() {
        None
    } else {
        Some(
            mark.parse()
                .map_err(|_| format!("Mark must be a whole number, got '{mark}'"))?,
        )
    };
    Ok((number, mark))
}

/// Student id and attendance status, `bb23=p`; `-` clears the week
pub fn parse_presence(s: &str) -> Result<(String, Option<Presence>), String> {
    let (student, status) = parse_assignment(s)?;
    let presence = if status == "-" {
        None
    } else {
        Some(status.parse()?)
    };
    Ok((student, presence))
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Display all configuration values.
    Show,
    /// Display configuration values.
    ///
    /// If a KEY is provided, displays only that configuration value.
    /// If no KEY is provided, displays all configuration values.
    Get {
        /// Optional configuration key to display (e.g., `level`, `db_path`, `pass_mark`)
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },
    /// Set a configuration value.
    Set {
        /// Configuration key to set
        #[arg(value_name = "KEY")]
        key: String,
        /// Value to set
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Unset a configuration value.
    Unset {
        /// Configuration key to unset
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Reset configuration to defaults (requires confirmation).
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum YearCommand {
    /// Show the current academic year
    Show,
    /// Set the current academic year (e.g. 2024 for 2024/25)
    Set {
        /// First calendar year of the academic year
        year: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubjectCommand {
    /// Add a subject area
    Add {
        /// Display name, e.g. "Law"
        name: String,
    },
    /// List subject areas
    List,
}

#[derive(Debug, Subcommand)]
pub enum CourseCommand {
    /// Add a programme
    Add {
        /// Full title
        title: String,
        /// Abbreviation, e.g. LLB
        #[arg(long)]
        short: Option<String>,
        /// Subject area slug (repeatable)
        #[arg(long = "subject", value_name = "SLUG")]
        subjects: Vec<String>,
    },
    /// List programmes
    List,
}

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// Add a member of staff
    Add {
        /// Login name
        username: String,
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// admin or teacher
        #[arg(long, default_value = "teacher")]
        role: Role,
        /// Subject area slug (repeatable)
        #[arg(long = "subject", value_name = "SLUG")]
        subjects: Vec<String>,
        /// Responsible for pastoral care
        #[arg(long)]
        pastoral_care: bool,
        /// Directs a programme
        #[arg(long)]
        programme_director: bool,
        /// Sees every subject area
        #[arg(long)]
        main_admin: bool,
    },
    /// List staff
    List {
        /// Only this role
        #[arg(long)]
        role: Option<Role>,
    },
}

/// Student fields settable from the command line
#[derive(Debug, Args, Default)]
pub struct StudentFields {
    /// First names
    #[arg(long)]
    pub first_name: Option<String>,
    /// Family name
    #[arg(long)]
    pub last_name: Option<String>,
    /// Anonymous exam id (empty to clear)
    #[arg(long)]
    pub exam_id: Option<String>,
    /// Academic year the student started
    #[arg(long)]
    pub since: Option<i32>,
    /// Year of study: 1, 2, 3, 7 (Masters), 8 (PhD) or 9 (Alumni)
    #[arg(long, value_parser = parse_study_year)]
    pub year: Option<StudyYear>,
    /// University email
    #[arg(long)]
    pub email: Option<String>,
    /// Programme title or short title
    #[arg(long)]
    pub course: Option<String>,
    /// Tutor username (empty to clear)
    #[arg(long)]
    pub tutor: Option<String>,
    /// Studies part time
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub part_time: Option<bool>,
    /// On the qualifying law degree track
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub qld: Option<bool>,
    /// Currently enrolled
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub active: Option<bool>,
    /// Holds a Tier 4 visa
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub tier_4: Option<bool>,
    /// On the paralegal pathway
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub nalp: Option<bool>,
    /// Learning support plan (empty to clear)
    #[arg(long)]
    pub lsp: Option<String>,
    /// Append a line to the notes
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Add a student
    Add {
        /// Student number
        student_id: String,
        /// First names
        #[arg(value_name = "FIRST_NAME")]
        first: String,
        /// Family name
        #[arg(value_name = "LAST_NAME")]
        last: String,
        #[command(flatten)]
        fields: StudentFields,
    },
    /// Show a student with modules, marks and tutor meetings
    Show {
        /// Student number
        student_id: String,
    },
    /// List students
    List {
        /// Year of study
        #[arg(long, value_parser = parse_study_year)]
        year: Option<StudyYear>,
        /// Subject area slug
        #[arg(long)]
        subject: Option<String>,
        /// Programme title or short title
        #[arg(long)]
        course: Option<String>,
        /// Tutor username
        #[arg(long)]
        tutor: Option<String>,
        /// Include inactive students
        #[arg(long)]
        all: bool,
    },
    /// Search by id, exam id or name
    Search {
        /// Words that must all match
        #[arg(num_args = 1..)]
        query: Vec<String>,
    },
    /// Change a student
    Update {
        /// Student number
        student_id: String,
        #[command(flatten)]
        fields: StudentFields,
    },
    /// Delete a student with all marks and feedback
    Delete {
        /// Student number
        student_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Module code with an optional academic year
#[derive(Debug, Args, Clone)]
pub struct ModuleRef {
    /// Module code
    pub code: String,
    /// Academic year (defaults to the current year)
    #[arg(long = "in", value_name = "YEAR")]
    pub year: Option<i32>,
}

#[derive(Debug, Subcommand)]
pub enum ModuleCommand {
    /// Add a module
    Add {
        #[command(flatten)]
        module: ModuleRef,
        /// Title
        title: String,
        /// Credits (10, 20, 30 or 40)
        #[arg(long, default_value_t = 20)]
        credits: u32,
        /// Years of study allowed, e.g. 123
        #[arg(long, default_value = "1")]
        eligible: String,
        /// Foundational QLD subject
        #[arg(long)]
        foundational: bool,
        /// Required for the paralegal pathway
        #[arg(long)]
        nalp: bool,
        /// Subject area slug (repeatable)
        #[arg(long = "subject", value_name = "SLUG")]
        subjects: Vec<String>,
        /// Teacher username (repeatable)
        #[arg(long = "teacher", value_name = "USERNAME")]
        teachers: Vec<String>,
        /// Teaching pattern number (see `module patterns`)
        #[arg(long)]
        pattern: Option<usize>,
        /// Week of the first seminar
        #[arg(long)]
        first_session: Option<u32>,
        /// Week of the last seminar
        #[arg(long)]
        last_session: Option<u32>,
        /// Weeks without teaching, comma separated
        #[arg(long)]
        no_teaching_in: Option<String>,
    },
    /// Show a module with assessments and students
    Show {
        #[command(flatten)]
        module: ModuleRef,
    },
    /// List modules
    List {
        /// Academic year (defaults to every year)
        #[arg(long = "in", value_name = "YEAR")]
        year: Option<i32>,
    },
    /// Change a module; only the given options are applied
    Update {
        #[command(flatten)]
        module: ModuleRef,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// Credits (10, 20, 30 or 40)
        #[arg(long)]
        credits: Option<u32>,
        /// Years of study allowed, e.g. 123
        #[arg(long)]
        eligible: Option<String>,
        /// Foundational QLD subject
        #[arg(long, value_parser = BoolishValueParser::new())]
        foundational: Option<bool>,
        /// Required for the paralegal pathway
        #[arg(long, value_parser = BoolishValueParser::new())]
        nalp: Option<bool>,
        /// Subject area slug (repeatable, replaces the current list)
        #[arg(long = "subject", value_name = "SLUG")]
        subjects: Vec<String>,
        /// Teacher username (repeatable, replaces the current list)
        #[arg(long = "teacher", value_name = "USERNAME")]
        teachers: Vec<String>,
        /// Teaching pattern number (see `module patterns`)
        #[arg(long)]
        pattern: Option<usize>,
        /// Week of the first seminar
        #[arg(long)]
        first_session: Option<u32>,
        /// Week of the last seminar
        #[arg(long)]
        last_session: Option<u32>,
        /// Weeks without teaching, comma separated (empty to clear)
        #[arg(long)]
        no_teaching_in: Option<String>,
    },
    /// List the built-in teaching patterns
    Patterns,
    /// Delete a module with all marks and feedback
    Delete {
        #[command(flatten)]
        module: ModuleRef,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Enroll students
    Enroll {
        #[command(flatten)]
        module: ModuleRef,
        /// Student numbers
        #[arg(num_args = 1.., required = true)]
        students: Vec<String>,
    },
    /// Remove students and their marks
    Unenroll {
        #[command(flatten)]
        module: ModuleRef,
        /// Student numbers
        #[arg(num_args = 1.., required = true)]
        students: Vec<String>,
    },
    /// Put students into a seminar group
    SeminarGroup {
        #[command(flatten)]
        module: ModuleRef,
        /// Group number, 0 to clear
        group: i32,
        /// Student numbers
        #[arg(num_args = 1.., required = true)]
        students: Vec<String>,
    },
    /// Add an assessment
    AddAssessment {
        #[command(flatten)]
        module: ModuleRef,
        /// Title, e.g. Essay or Exam
        title: String,
        /// Weight in percent
        value: u32,
        /// Marksheet type for the first attempt
        #[arg(long)]
        marksheet: Option<MarksheetType>,
        /// Marksheet type for resits
        #[arg(long)]
        resit_marksheet: Option<MarksheetType>,
        /// Marked in groups
        #[arg(long)]
        group: bool,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        submission_date: Option<NaiveDate>,
        /// Word limit
        #[arg(long)]
        max_word_count: Option<u32>,
    },
    /// Delete an assessment with all its marks and feedback
    DeleteAssessment {
        #[command(flatten)]
        module: ModuleRef,
        /// Assessment title or slug
        assessment: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Students whose module mark ends in 9
    Nines {
        #[command(flatten)]
        module: ModuleRef,
    },
}

/// Module, assessment and attempt of a mark
#[derive(Debug, Args, Clone)]
pub struct AssessmentRef {
    #[command(flatten)]
    pub module: ModuleRef,
    /// Assessment title or slug
    pub assessment: String,
    /// first, resit, second_resit or qld_resit
    #[arg(long, default_value = "first")]
    pub attempt: Attempt,
}

#[derive(Debug, Subcommand)]
pub enum MarksCommand {
    /// Enter or clear a mark
    Set {
        #[command(flatten)]
        target: AssessmentRef,
        /// Student number
        student_id: String,
        /// Mark 0-100; omit to clear
        mark: Option<i32>,
    },
    /// Record a concession decision
    Concession {
        #[command(flatten)]
        target: AssessmentRef,
        /// Student number
        student_id: String,
        /// none, pending or granted
        concession: Concession,
    },
    /// Put a student into a marking group
    Group {
        #[command(flatten)]
        target: AssessmentRef,
        /// Student number
        student_id: String,
        /// Group number, 0 to clear
        group: i32,
    },
    /// Show a student's marks for an academic year
    Show {
        /// Student number
        student_id: String,
        /// Academic year (defaults to the current year)
        #[arg(long = "in", value_name = "YEAR")]
        year: Option<i32>,
    },
    /// Recalculate stored module marks
    Recalculate {
        /// Only this module
        #[arg(long)]
        module: Option<String>,
        /// Academic year (defaults to the current year)
        #[arg(long = "in", value_name = "YEAR")]
        year: Option<i32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AttendanceCommand {
    /// Record attendance for a teaching week
    Record {
        #[command(flatten)]
        module: ModuleRef,
        /// Teaching week
        week: u32,
        /// STUDENT=STATUS entries with p, a, e, or - to clear
        #[arg(num_args = 1.., required = true, value_parser = parse_presence)]
        entries: Vec<(String, Option<Presence>)>,
    },
    /// Show attendance for a module
    Show {
        #[command(flatten)]
        module: ModuleRef,
    },
}

/// Marksheet fields shared by individual and group feedback
#[derive(Debug, Args, Default)]
pub struct MarksheetFields {
    /// Category mark as N=MARK, empty mark to clear (repeatable)
    #[arg(long = "category", value_name = "N=MARK", value_parser = parse_category_mark)]
    pub categories: Vec<(u8, Option<i32>)>,
    /// Marker username
    #[arg(long)]
    pub marker: Option<String>,
    /// Date of marking (YYYY-MM-DD)
    #[arg(long)]
    pub marking_date: Option<NaiveDate>,
    /// Comments
    #[arg(long)]
    pub comments: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum FeedbackCommand {
    /// Fill in an individual marksheet
    Set {
        #[command(flatten)]
        target: AssessmentRef,
        /// Student number
        student_id: String,
        #[command(flatten)]
        fields: MarksheetFields,
        /// Date handed in (YYYY-MM-DD)
        #[arg(long)]
        submission_date: Option<NaiveDate>,
        /// Co-marker username
        #[arg(long)]
        second_first_marker: Option<String>,
        /// Moderator username
        #[arg(long)]
        moderator: Option<String>,
        /// Penalty in marks
        #[arg(long)]
        deduction: Option<i32>,
        /// Reason for the penalty
        #[arg(long)]
        deduction_explanation: Option<String>,
    },
    /// Show a student's marksheet
    Show {
        #[command(flatten)]
        target: AssessmentRef,
        /// Student number
        student_id: String,
    },
    /// Fill in a group marksheet
    GroupSet {
        #[command(flatten)]
        target: AssessmentRef,
        /// Group number
        group: i32,
        #[command(flatten)]
        fields: MarksheetFields,
        /// STUDENT:PART=VALUE with PART a category number, component or comments (repeatable)
        #[arg(long = "part", value_name = "STUDENT:PART=VALUE")]
        parts: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TuteeCommand {
    /// Record a meeting with a tutee
    Add {
        /// Student number
        student_id: String,
        /// Tutor username
        tutor: String,
        /// Date of the meeting (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// What was discussed
        #[arg(long, default_value = "")]
        notes: String,
        /// The student did not turn up
        #[arg(long)]
        no_show: bool,
    },
    /// List meetings with a tutee
    List {
        /// Student number
        student_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Create or update students from a CSV file
    Students {
        /// CSV file
        file: PathBuf,
        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// Column names for files without a header row, comma separated
        #[arg(long)]
        columns: Option<String>,
        /// Data rows to leave out, counted from 1 (repeatable)
        #[arg(long = "skip", value_name = "ROW")]
        skip: Vec<usize>,
    },
    /// Assign exam ids from a two column CSV file
    ExamIds {
        /// CSV file: student id, exam id
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProgressionCommand {
    /// Suggest decisions for a year of study
    Suggest {
        /// Year of study
        #[arg(value_parser = parse_study_year)]
        year: StudyYear,
        /// Record the suggestions for students without a decision
        #[arg(long)]
        apply: bool,
    },
    /// Record the board's decision for a student
    Set {
        /// Student number
        student_id: String,
        /// PP, PQ, PT, PC, R, ABSJ, 1, 21, 22, 3, C, D, O, WD or none
        decision: String,
    },
    /// Apply every decision and move to the next academic year
    Proceed {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Mark overview of a module
    Module {
        #[command(flatten)]
        module: ModuleRef,
        /// markdown or csv
        #[arg(short, long, default_value = "markdown")]
        format: ReportFormat,
        /// Output file (defaults to the reports or exports directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Students of a year with outstanding resits
    Problems {
        /// Year of study
        #[arg(value_parser = parse_study_year)]
        year: StudyYear,
        /// Output file (defaults to the reports directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Export a module's marks as CSV
    Export {
        #[command(flatten)]
        module: ModuleRef,
        /// Output file (defaults to the exports directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Week-by-week attendance sheet of a module, one table per seminar group
    Attendance {
        #[command(flatten)]
        module: ModuleRef,
        /// Output file (defaults to the reports directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Marks and board comments of every module a year of study takes
    Board {
        /// Year of study
        #[arg(value_parser = parse_study_year)]
        level: StudyYear,
        /// Academic year (defaults to the current one)
        #[arg(long = "in", value_name = "YEAR")]
        year: Option<i32>,
        /// Only modules of this subject area
        #[arg(long, value_name = "SLUG")]
        subject: Option<String>,
        /// Output file (defaults to the reports directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Attendance of all active Tier 4 students
    Tier4 {
        /// Academic year (defaults to the current one)
        #[arg(long = "in", value_name = "YEAR")]
        year: Option<i32>,
        /// Only students of this subject area
        #[arg(long, value_name = "SLUG")]
        subject: Option<String>,
        /// Output file (defaults to the reports directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    ///
    /// If no subcommand is provided, displays all configuration values.
    Config {
        #[command(subcommand)]
        subcommand: Option<ConfigSubcommand>,
    },
    /// Show or set the current academic year
    Year {
        #[command(subcommand)]
        command: YearCommand,
    },
    /// Manage subject areas
    Subject {
        #[command(subcommand)]
        command: SubjectCommand,
    },
    /// Manage programmes
    Course {
        #[command(subcommand)]
        command: CourseCommand,
    },
    /// Manage staff
    Staff {
        #[command(subcommand)]
        command: StaffCommand,
    },
    /// Manage students
    Student {
        #[command(subcommand)]
        command: StudentCommand,
    },
    /// Manage modules, assessments and enrolments
    Module {
        #[command(subcommand)]
        command: ModuleCommand,
    },
    /// Enter marks and concessions
    Marks {
        #[command(subcommand)]
        command: MarksCommand,
    },
    /// Record seminar attendance
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommand,
    },
    /// Fill in marksheets
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommand,
    },
    /// Personal tutor meetings
    Tutee {
        #[command(subcommand)]
        command: TuteeCommand,
    },
    /// Import data from CSV files
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
    /// Year-end progression board
    Progression {
        #[command(subcommand)]
        command: ProgressionCommand,
    },
    /// Generate reports and exports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "nomosdb",
    about = "NomosDB law department records",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Use this configuration file instead of the default one
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Use this database file (runtime only)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Set the runtime log level (error|warn|info|debug). Falls back to config if omitted.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Enable verbose output (runtime only)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Enable debug-level logging and runtime debug flag (shorthand)
    #[arg(long = "debug", global = true)]
    pub debug_flag: bool,

    /// Write runtime logs to a file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    // --- Config overrides ---
    /// Override config logging level
    #[arg(long = "config-level", value_enum)]
    pub config_level: Option<LogLevelArg>,

    /// Override config log file path
    #[arg(long = "config-log-file", value_name = "PATH")]
    pub config_log_file: Option<PathBuf>,

    /// Override config verbose flag (true/false)
    #[arg(long = "config-verbose", value_parser = BoolishValueParser::new())]
    pub config_verbose: Option<bool>,

    /// Override config reports directory
    #[arg(long = "reports-dir", value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Override config exports directory
    #[arg(long = "exports-dir", value_name = "DIR")]
    pub exports_dir: Option<PathBuf>,

    /// Subcommand to execute.
    /// A subcommand is required to run the CLI.
    #[command(subcommand)]
    pub command: Command,
}

fn path_string(path: Option<&PathBuf>) -> Option<String> {
    path.map(|p| p.to_string_lossy().to_string())
}

impl Cli {
    /// Convert CLI flags into config overrides
    ///
    /// `--db` replaces the configured database path for this run only.
    /// Nothing here is written to the config file.
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            level: self.config_level.map(|lvl| lvl.to_string()),
            file: path_string(self.config_log_file.as_ref()),
            verbose: self.config_verbose,
            db_path: path_string(self.db.as_ref()),
            reports_dir: path_string(self.reports_dir.as_ref()),
            exports_dir: path_string(self.exports_dir.as_ref()),
        }
    }
}
