//! Staff model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a staff member does in the department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrative staff
    Admin,
    /// Teaching staff
    #[default]
    Teacher,
}

impl Role {
    /// Value stored in the database
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            other => Err(format!("Unknown staff role: '{other}'")),
        }
    }
}

/// A member of staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Login name, unique
    pub username: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact address
    pub email: String,
    /// Admin or teacher
    pub role: Role,
    /// Slugs of the subject areas this person works in
    pub subject_areas: Vec<String>,
    /// Responsible for pastoral care
    pub pastoral_care: bool,
    /// Directs a programme
    pub programme_director: bool,
    /// Sees every subject area
    pub main_admin: bool,
}

impl Staff {
    /// Create a teacher with no flags set
    #[must_use]
    pub const fn new(username: String, first_name: String, last_name: String) -> Self {
        Self {
            username,
            first_name,
            last_name,
            email: String::new(),
            role: Role::Teacher,
            subject_areas: Vec::new(),
            pastoral_care: false,
            programme_director: false,
            main_admin: false,
        }
    }

    /// "First Last"
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Staff {
    /// "First Last (Law/Economics)"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name(),
            self.subject_areas.join("/")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_names() {
        let mut staff = Staff::new(
            "ebudd".to_string(),
            "Elmar".to_string(),
            "Fudd".to_string(),
        );
        staff.subject_areas = vec!["law".to_string(), "economics".to_string()];
        assert_eq!(staff.name(), "Elmar Fudd");
        assert_eq!(staff.to_string(), "Elmar Fudd (law/economics)");
        assert_eq!(staff.role, Role::Teacher);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("teacher".parse::<Role>(), Ok(Role::Teacher));
        assert!("dean".parse::<Role>().is_err());
        assert_eq!(Role::Admin.code(), "admin");
    }
}
