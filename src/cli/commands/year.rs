//! Academic year command handler

use super::{CommandResult, Context};
use crate::args::YearCommand;
use nomosdb::calendar::academic_year_string;

/// Show or change the current academic year
pub fn run(command: YearCommand, ctx: &Context) -> CommandResult {
    match command {
        YearCommand::Show => {
            let year = ctx.store.current_year()?;
            println!("{}", academic_year_string(year));
        }
        YearCommand::Set { year } => {
            ctx.store.set_current_year(year)?;
            println!("✓ Current year is now {}", academic_year_string(year));
        }
    }
    Ok(())
}
