//! Translation of legacy document shapes into the canonical schema.
//!
//! Older records were written with camelCase field names, loose section
//! labels and bare dates. Every typed read goes through [`KeyAdapter`], so
//! planning code only ever sees canonical names.

use chrono::NaiveDate;
use models::scope::normalize_section;
use serde_json::{Map, Value};

type Aliases = &'static [(&'static str, &'static str)];

/// Legacy field name to canonical field name, per collection family
const FIELD_ALIASES: [(&str, Aliases); 7] = [
    (
        "waitlist",
        &[
            ("applicantId", "applicant_id"),
            ("studentId", "applicant_id"),
            ("rollNo", "roll_no"),
            ("priority", "priority_rank"),
            ("priorityRank", "priority_rank"),
            ("appliedOn", "applied_on"),
            ("isFulfilled", "fulfilled"),
        ],
    ),
    (
        "beds",
        &[("roomId", "parent_group_id"), ("parentGroupId", "parent_group_id")],
    ),
    (
        "rooms",
        &[("roomType", "resource_type"), ("type", "resource_type")],
    ),
    (
        "allocations",
        &[
            ("applicantId", "applicant_id"),
            ("studentId", "applicant_id"),
            ("waitlistId", "waitlist_id"),
            ("bedId", "resource_id"),
            ("roomId", "group_id"),
            ("allotDate", "allot_date"),
            ("vacateDate", "vacate_date"),
        ],
    ),
    (
        "courses",
        &[
            ("courseName", "name"),
            ("studentsBySection", "students_by_section"),
        ],
    ),
    (
        "timetable",
        &[
            ("day", "weekday"),
            ("period", "periods"),
            ("startTime", "start_time"),
            ("endTime", "end_time"),
            ("courseId", "course_id"),
            ("courseName", "course_name"),
            ("facultyId", "faculty_id"),
            ("facultyName", "faculty_name"),
        ],
    ),
    (
        "attendance",
        &[
            ("courseId", "course_id"),
            ("courseName", "course_name"),
            ("facultyName", "faculty_name"),
            ("startTime", "start_time"),
            ("endTime", "end_time"),
            ("statusByStudent", "status_by_student"),
        ],
    ),
];

const PREFERENCE_ALIASES: Aliases = &[
    ("roomType", "resource_type"),
    ("type", "resource_type"),
    ("roomId", "group_id"),
];

/// Rewrites legacy documents into canonical form at the storage boundary
pub struct KeyAdapter;

impl KeyAdapter {
    /// Canonical form of `body` as stored in `collection`. Canonical keys win
    /// when a document carries both spellings.
    pub fn canonicalize(collection: &str, body: Value) -> Value {
        let mut fields = match body {
            Value::Object(fields) => fields,
            other => return other,
        };
        let family = collection.split('/').next().unwrap_or(collection);

        if let Some((_, aliases)) = FIELD_ALIASES.iter().find(|(name, _)| *name == family) {
            rename_keys(&mut fields, aliases);
        }

        match family {
            "waitlist" => {
                if let Some(Value::Object(preferences)) = fields.get_mut("preferences") {
                    rename_keys(preferences, PREFERENCE_ALIASES);
                }
                if let Some(applied_on) = fields.get_mut("applied_on") {
                    widen_bare_date(applied_on);
                }
            }
            "timetable" => {
                if let Some(period) = fields.get_mut("periods")
                    && period.is_number()
                {
                    *period = Value::Array(vec![period.take()]);
                }
            }
            "courses" => {
                if let Some(Value::Object(sections)) = fields.get_mut("students_by_section") {
                    normalize_section_keys(sections);
                }
            }
            _ => {}
        }

        Value::Object(fields)
    }
}

fn rename_keys(fields: &mut Map<String, Value>, aliases: Aliases) {
    for (legacy, canonical) in aliases {
        if let Some(value) = fields.remove(*legacy)
            && !fields.contains_key(*canonical)
        {
            fields.insert(canonical.to_string(), value);
        }
    }
}

/// `2024-01-05` becomes `2024-01-05T00:00:00+00:00`
fn widen_bare_date(value: &mut Value) {
    let widened = value
        .as_str()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().to_rfc3339());

    if let Some(widened) = widened {
        *value = Value::String(widened);
    }
}

fn normalize_section_keys(sections: &mut Map<String, Value>) {
    let labels: Vec<String> = sections.keys().cloned().collect();

    for label in labels {
        let canonical = normalize_section(&label);
        if canonical == label {
            continue;
        }
        if let Some(students) = sections.remove(&label)
            && !sections.contains_key(&canonical)
        {
            sections.insert(canonical, students);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::legacy::KeyAdapter;
    use serde_json::json;

    #[test]
    fn test_waitlist_aliases() {
        let body = json!({
            "studentId": "s1",
            "rollNo": "21CS001",
            "priority": 3,
            "appliedOn": "2024-01-05",
            "preferences": { "roomType": "double", "roomId": "R2" },
        });

        let canonical = KeyAdapter::canonicalize("waitlist", body);

        assert_eq!(
            canonical,
            json!({
                "applicant_id": "s1",
                "roll_no": "21CS001",
                "priority_rank": 3,
                "applied_on": "2024-01-05T00:00:00+00:00",
                "preferences": { "resource_type": "double", "group_id": "R2" },
            })
        );
    }

    #[test]
    fn test_canonical_key_wins() {
        let body = json!({ "roomId": "old", "parent_group_id": "new" });

        let canonical = KeyAdapter::canonicalize("beds", body);

        assert_eq!(canonical, json!({ "parent_group_id": "new" }));
    }

    #[test]
    fn test_scoped_collections_use_their_family() {
        let timetable = KeyAdapter::canonicalize(
            "timetable/CSE_2_A",
            json!({ "day": "Mon", "period": 2, "courseId": "CS201" }),
        );
        assert_eq!(
            timetable,
            json!({ "weekday": "Mon", "periods": [2], "course_id": "CS201" })
        );

        let course = KeyAdapter::canonicalize(
            "courses/CSE_2",
            json!({ "studentsBySection": { "Section A": ["s1"], "b": ["s2"] } }),
        );
        assert_eq!(
            course,
            json!({ "students_by_section": { "A": ["s1"], "B": ["s2"] } })
        );
    }

    #[test]
    fn test_unknown_collections_and_non_objects_pass_through() {
        let body = json!({ "rollNo": "x" });
        assert_eq!(KeyAdapter::canonicalize("audit_log", body.clone()), body);
        assert_eq!(KeyAdapter::canonicalize("waitlist", json!(7)), json!(7));
    }
}
