use chrono::NaiveDate;
use thiserror::Error;

/// Raised when planning is invoked without the identifiers it needs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("scope is missing its {0}")]
    MissingScope(&'static str),
    #[error("timetable for {0} has no entries")]
    EmptyTimetable(String),
    #[error("timetable entry on {0} has no course id")]
    MissingCourse(String),
    #[error("week of {0} falls outside the supported calendar")]
    WeekOutOfRange(NaiveDate),
}
