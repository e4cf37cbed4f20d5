//! Subject area model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::slugify;

/// A broad discipline such as "Law" or "Economics"
///
/// Modules are opened to subject areas and programmes belong to them, so a
/// "Law with Economics" student can take modules from either area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectArea {
    /// Identifier derived from the name
    pub slug: String,
    /// Display name, unique
    pub name: String,
}

impl SubjectArea {
    /// Create a subject area, deriving its slug from `name`
    #[must_use]
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_string();
        Self {
            slug: slugify(&name),
            name,
        }
    }
}

impl fmt::Display for SubjectArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
