//! Core domain modules

pub mod attendance;
pub mod calendar;
pub mod config;
pub mod error;
pub mod feedback;
pub mod import;
pub mod marks;
pub mod models;
pub mod progression;
pub mod report;
pub mod store;
