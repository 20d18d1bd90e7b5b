use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A class group: department, year (or semester) and section
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub department: String,
    pub year: String,
    pub section: String,
}

impl Scope {
    pub fn new(
        department: impl Into<String>,
        year: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            department: department.into(),
            year: year.into(),
            section: normalize_section(&section.into()),
        }
    }

    /// Container key for everything stored per section, e.g. `CSE_2_A`
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.department, self.year, self.section)
    }

    /// Container key for course records, which are shared by all sections
    pub fn course_key(&self) -> String {
        format!("{}_{}", self.department, self.year)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.department.trim().is_empty() {
            return Err(ValidationError::MissingScope("department"));
        }
        if self.year.trim().is_empty() {
            return Err(ValidationError::MissingScope("year"));
        }
        if self.section.trim().is_empty() {
            return Err(ValidationError::MissingScope("section"));
        }
        Ok(())
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.key())
    }
}

/// Canonical form of a section label: `"Section A"`, `"sec-a"` and `"a"` all
/// become `"A"`. The prefix only counts when a separator follows it, so
/// `"Second"` stays `"SECOND"`.
pub fn normalize_section(label: &str) -> String {
    let upper = label.trim().to_uppercase();
    let is_separator = |c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace();

    ["SECTION", "SEC"]
        .iter()
        .filter_map(|prefix| upper.strip_prefix(prefix))
        .find(|rest| rest.starts_with(is_separator))
        .map(|rest| rest.trim_start_matches(is_separator).trim())
        .filter(|section| !section.is_empty())
        .unwrap_or(&upper)
        .to_string()
}
