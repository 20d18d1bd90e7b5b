use crate::{
    attendance::{AttendanceSession, session_id},
    error::ValidationError,
    scope::Scope,
    timetable::TimetableEntry,
    week::{date_in_week, week_dates},
};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, btree_map::Entry};
use strum::{AsRefStr, Display, EnumString};

/// Supplies the students enrolled in a course for a section
pub trait RosterSource {
    fn roster(&self, course_id: &str, scope: &Scope) -> Vec<String>;
}

impl<F> RosterSource for F
where
    F: Fn(&str, &Scope) -> Vec<String>,
{
    fn roster(&self, course_id: &str, scope: &Scope) -> Vec<String> {
        self(course_id, scope)
    }
}

/// What a rerun does to attendance already recorded on a session
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatusPolicy {
    /// Keep recorded marks; only students missing from the session are added
    /// as pending
    #[default]
    Preserve,
    /// Replace the whole status map with all-pending
    Reset,
}

/// A session to be created or merged into its section's container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpsert {
    pub scope: Scope,
    pub session: AttendanceSession,
}

impl SessionUpsert {
    pub fn id(&self) -> String {
        self.session.id()
    }
}

/// Projects `entries` onto the week containing `now`.
///
/// Produces one upsert per `(date, course_id)`, ordered by session id. Sunday
/// slots have no date in the materialized week and are skipped. Slots of the
/// same course on the same day are folded into one session.
pub fn materialize<Tz, R>(
    scope: &Scope,
    entries: &[TimetableEntry],
    now: &DateTime<Tz>,
    rosters: &R,
) -> Result<Vec<SessionUpsert>, ValidationError>
where
    Tz: TimeZone,
    R: RosterSource + ?Sized,
{
    scope.validate()?;
    if entries.is_empty() {
        return Err(ValidationError::EmptyTimetable(scope.key()));
    }
    if let Some(entry) = entries.iter().find(|entry| entry.course_id.trim().is_empty()) {
        return Err(ValidationError::MissingCourse(entry.weekday.to_string()));
    }

    let week =
        week_dates(now).ok_or_else(|| ValidationError::WeekOutOfRange(now.date_naive()))?;
    let mut roster_cache: HashMap<&str, Vec<String>> = HashMap::new();
    let mut sessions: BTreeMap<String, AttendanceSession> = BTreeMap::new();

    for entry in entries {
        let Some(date) = date_in_week(&week, entry.weekday) else {
            continue;
        };

        match sessions.entry(session_id(date, &entry.course_id)) {
            Entry::Occupied(mut existing) => existing.get_mut().absorb(entry),
            Entry::Vacant(slot) => {
                let roster = roster_cache
                    .entry(entry.course_id.as_str())
                    .or_insert_with(|| rosters.roster(&entry.course_id, scope));
                slot.insert(AttendanceSession::scheduled(date, entry, roster));
            }
        }
    }

    Ok(sessions
        .into_values()
        .map(|session| SessionUpsert {
            scope: scope.clone(),
            session,
        })
        .collect())
}
