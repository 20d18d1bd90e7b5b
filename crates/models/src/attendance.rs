use crate::{days::clock_format, timetable::TimetableEntry};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumString};

/// Attendance mark for one student in one session
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Present,
    Absent,
    Excused,
}

/// Identity of a session inside its section's container: `{date}_{courseId}`
/// with the date in `YYYY-MM-DD`.
pub fn session_id(date: NaiveDate, course_id: &str) -> String {
    format!("{}_{}", date.format("%Y-%m-%d"), course_id)
}

/// A dated class meeting that attendance is taken against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub date: NaiveDate,
    pub course_id: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub faculty_name: String,
    #[serde(with = "clock_format")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_format")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub periods: Vec<u8>,
    #[serde(default)]
    pub status_by_student: BTreeMap<String, AttendanceStatus>,
}

impl AttendanceSession {
    /// A session for `entry` on `date` with every roster student pending
    pub fn scheduled(date: NaiveDate, entry: &TimetableEntry, roster: &[String]) -> Self {
        Self {
            date,
            course_id: entry.course_id.clone(),
            course_name: entry.course_name.clone(),
            faculty_name: entry.faculty_name.clone(),
            start_time: entry.start_time,
            end_time: entry.end_time,
            room: entry.room.clone(),
            periods: entry.periods.clone(),
            status_by_student: roster
                .iter()
                .map(|student| (student.clone(), AttendanceStatus::Pending))
                .collect(),
        }
    }

    pub fn id(&self) -> String {
        session_id(self.date, &self.course_id)
    }

    /// Folds another slot of the same course on the same day into this
    /// session: the span widens to cover both and periods are unioned.
    pub fn absorb(&mut self, entry: &TimetableEntry) {
        self.start_time = self.start_time.min(entry.start_time);
        self.end_time = self.end_time.max(entry.end_time);

        for period in &entry.periods {
            if !self.periods.contains(period) {
                self.periods.push(*period);
            }
        }
        self.periods.sort_unstable();

        if self.room.is_empty() {
            self.room = entry.room.clone();
        }
        if self.faculty_name.is_empty() {
            self.faculty_name = entry.faculty_name.clone();
        }
    }
}

#[cfg(test)]
mod test {
    use crate::attendance::{AttendanceStatus, session_id};
    use chrono::NaiveDate;

    #[test]
    fn test_session_id_format() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(session_id(date, "CS301"), "2024-05-03_CS301");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(AttendanceStatus::default().to_string(), "pending");
        assert_eq!("excused".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Excused));
    }
}
