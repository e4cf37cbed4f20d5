//! Error type shared by the library

use thiserror::Error;

/// Errors raised by the store, the rule engine and the importers
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying `SQLite` failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// CSV read or write failure
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Report template failed to render
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A looked-up record does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record, e.g. "student"
        entity: &'static str,
        /// Key that was searched for
        key: String,
    },

    /// A uniqueness rule would be broken
    #[error("{entity} already exists: {key}")]
    Duplicate {
        /// Kind of record
        entity: &'static str,
        /// Conflicting key
        key: String,
    },

    /// Input failed validation
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Field or argument name
        field: &'static str,
        /// What was wrong
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`Error::Duplicate`]
    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`Error::Invalid`]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::not_found("student", "1234").to_string(),
            "student not found: 1234"
        );
        assert_eq!(
            Error::duplicate("module", "LAW1/2014").to_string(),
            "module already exists: LAW1/2014"
        );
        assert_eq!(
            Error::invalid("mark", "must be between 0 and 100").to_string(),
            "invalid mark: must be between 0 and 100"
        );
    }
}
