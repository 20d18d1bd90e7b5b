use crate::days::{clock_format, weekday_format};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// One recurring weekly slot of a section's timetable. Entries are stored
/// under their section's container and carry no date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    #[serde(with = "weekday_format")]
    pub weekday: Weekday,
    #[serde(default)]
    pub periods: Vec<u8>,
    #[serde(with = "clock_format")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_format")]
    pub end_time: NaiveTime,
    pub course_id: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub faculty_id: String,
    #[serde(default)]
    pub faculty_name: String,
    #[serde(default)]
    pub room: String,
}
