use models::scope::Scope;

pub const WAITLIST: &str = "waitlist";
pub const BEDS: &str = "beds";
pub const ROOMS: &str = "rooms";
pub const ALLOCATIONS: &str = "allocations";
pub const AUDIT_LOG: &str = "audit_log";

/// Collections whose writes change who holds which bed. A batch touching one
/// of these must also append to [`AUDIT_LOG`].
pub const AUDITED: [&str; 3] = [ALLOCATIONS, BEDS, WAITLIST];

/// Courses of the scope's department and year
pub fn courses(scope: &Scope) -> String {
    format!("courses/{}", scope.course_key())
}

pub fn timetable(scope: &Scope) -> String {
    format!("timetable/{}", scope.key())
}

pub fn attendance(scope: &Scope) -> String {
    format!("attendance/{}", scope.key())
}

#[cfg(test)]
mod test {
    use crate::collections::{attendance, courses, timetable};
    use models::scope::Scope;

    #[test]
    fn test_scoped_collection_names() {
        let scope = Scope::new("CSE", "3", "Section a");

        assert_eq!(courses(&scope), "courses/CSE_3");
        assert_eq!(timetable(&scope), "timetable/CSE_3_A");
        assert_eq!(attendance(&scope), "attendance/CSE_3_A");
    }
}
