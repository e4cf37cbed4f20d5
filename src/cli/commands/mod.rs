//! CLI command handlers for `NomosDB`.
//!
//! Each command group is implemented in its own submodule. Handlers return a
//! [`CommandResult`]; `main` prints the error with a `✗` and exits with 1.

pub mod attendance;
pub mod config;
pub mod department;
pub mod feedback;
pub mod import;
pub mod marks;
pub mod module;
pub mod progression;
pub mod report;
pub mod student;
pub mod tutee;
pub mod year;

use std::error::Error;
use std::io::{self, Write};

use crate::args::{AssessmentRef, Command, ModuleRef};
use nomosdb::config::Config;
use nomosdb::models::{Assessment, Module};
use nomosdb::progression::Rules;
use nomosdb::store::Store;

/// Outcome of a command handler
pub type CommandResult<T = ()> = Result<T, Box<dyn Error>>;

/// Open database and effective configuration shared by the handlers
pub struct Context {
    /// Open database
    pub store: Store,
    /// Configuration with CLI overrides applied
    pub config: Config,
}

impl Context {
    /// Lowest passing mark
    pub const fn pass_mark(&self) -> i32 {
        self.config.university.pass_mark
    }

    /// Progression thresholds
    pub const fn rules(&self) -> Rules {
        self.config.progression_rules()
    }

    /// The given academic year, or the current one
    pub fn academic_year(&self, year: Option<i32>) -> CommandResult<i32> {
        match year {
            Some(year) => Ok(year),
            None => Ok(self.store.current_year()?),
        }
    }

    /// Module by code in the given or current academic year
    pub fn module(&self, module: &ModuleRef) -> CommandResult<Module> {
        let year = self.academic_year(module.year)?;
        Ok(self.store.find_module(&module.code, year)?)
    }

    /// Module and assessment named on the command line
    pub fn assessment(&self, target: &AssessmentRef) -> CommandResult<(Module, Assessment)> {
        let module = self.module(&target.module)?;
        let assessment = self
            .store
            .find_assessment(module.id.unwrap_or_default(), &target.assessment)?;
        Ok((module, assessment))
    }
}

/// Route a database command to its handler
pub fn dispatch(command: Command, ctx: &Context) -> CommandResult {
    match command {
        Command::Config { .. } => Err("config is handled before the database is opened".into()),
        Command::Year { command } => year::run(command, ctx),
        Command::Subject { command } => department::run_subject(command, ctx),
        Command::Course { command } => department::run_course(command, ctx),
        Command::Staff { command } => department::run_staff(command, ctx),
        Command::Student { command } => student::run(command, ctx),
        Command::Module { command } => module::run(command, ctx),
        Command::Marks { command } => marks::run(command, ctx),
        Command::Attendance { command } => attendance::run(command, ctx),
        Command::Feedback { command } => feedback::run(command, ctx),
        Command::Tutee { command } => tutee::run(command, ctx),
        Command::Import { command } => import::run(command, ctx),
        Command::Progression { command } => progression::run(command, ctx),
        Command::Report { command } => report::run(command, ctx),
    }
}

/// Ask a yes/no question on stdin unless `assume_yes` is set
pub fn confirm(question: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    print!("{question} (y/n): ");
    io::stdout().flush().ok();

    let mut response = String::new();
    io::stdin().read_line(&mut response).ok();
    let response = response.trim();
    response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes")
}

/// Optional value for display
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
