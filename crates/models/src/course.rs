use crate::{materialize::RosterSource, scope::Scope, scope::normalize_section};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A course offered to one department and year. The roster map is kept as
/// raw JSON because imported records do not always hold lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub students_by_section: Value,
}

impl Course {
    /// Student ids enrolled in `section`, in stored order.
    ///
    /// A section that is missing, or whose value is not a list, has no
    /// students. Non-string items are skipped.
    pub fn roster_for_section(&self, section: &str) -> Vec<String> {
        let Some(sections) = self.students_by_section.as_object() else {
            return Vec::new();
        };

        let wanted = normalize_section(section);
        let students = sections.get(section).or_else(|| {
            sections
                .iter()
                .find(|(label, _)| normalize_section(label) == wanted)
                .map(|(_, students)| students)
        });

        students
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Courses of one department and year, keyed by course id
#[derive(Debug, Clone, Default)]
pub struct CourseRosters {
    courses: HashMap<String, Course>,
}

impl CourseRosters {
    pub fn new(courses: impl IntoIterator<Item = Course>) -> Self {
        Self {
            courses: courses
                .into_iter()
                .map(|course| (course.id.clone(), course))
                .collect(),
        }
    }

    pub fn get(&self, course_id: &str) -> Option<&Course> {
        self.courses.get(course_id)
    }
}

impl RosterSource for CourseRosters {
    fn roster(&self, course_id: &str, scope: &Scope) -> Vec<String> {
        self.get(course_id)
            .map(|course| course.roster_for_section(&scope.section))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        course::{Course, CourseRosters},
        materialize::RosterSource,
        scope::Scope,
    };
    use serde_json::{Value, json};

    fn course(students_by_section: Value) -> Course {
        Course {
            id: "CS301".to_string(),
            name: "Operating Systems".to_string(),
            department: "CSE".to_string(),
            year: "3".to_string(),
            students_by_section,
        }
    }

    #[test]
    fn test_roster_for_section() {
        let course = course(json!({ "A": ["s1", "s2"], "B": ["s3"] }));

        assert_eq!(course.roster_for_section("A"), ["s1", "s2"]);
        assert_eq!(course.roster_for_section("B"), ["s3"]);
    }

    #[test]
    fn test_roster_matches_legacy_section_labels() {
        let course = course(json!({ "Section A": ["s1"] }));

        assert_eq!(course.roster_for_section("A"), ["s1"]);
    }

    #[test]
    fn test_roster_is_empty_when_missing_or_malformed() {
        assert!(course(json!({ "A": ["s1"] })).roster_for_section("C").is_empty());
        assert!(course(json!({ "A": "s1,s2" })).roster_for_section("A").is_empty());
        assert!(course(json!(["s1"])).roster_for_section("A").is_empty());
        assert!(course(Value::Null).roster_for_section("A").is_empty());
        assert_eq!(course(json!({ "A": ["s1", 7, null] })).roster_for_section("A"), ["s1"]);
    }

    #[test]
    fn test_course_rosters_lookup() {
        let rosters = CourseRosters::new([course(json!({ "A": ["s1"] }))]);
        let scope = Scope::new("CSE", "3", "A");

        assert_eq!(rosters.roster("CS301", &scope), ["s1"]);
        assert!(rosters.roster("CS999", &scope).is_empty());
    }
}
