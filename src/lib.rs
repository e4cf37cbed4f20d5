//! Library for `NomosDB`
//!
//! Keeps the records of a law department: students, modules and their
//! assessments, marks and resits, marksheet feedback, seminar attendance and
//! the year-end progression board. Everything is stored in a single `SQLite`
//! file and driven from the `nomosdb` command-line tool.

pub mod core;
pub mod logger;

pub use crate::core::error::{Error, Result};
pub use crate::core::{
    attendance, calendar, config, feedback, import, marks, models, progression, report, store,
};

/// Returns the current version of the `NomosDB` crate
#[must_use]
pub const fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
