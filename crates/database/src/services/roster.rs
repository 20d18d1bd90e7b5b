use crate::{
    collections,
    error::Error,
    store::{DocumentStore, Query},
};
use log::warn;
use models::{
    course::{Course, CourseRosters},
    scope::Scope,
};

pub struct RosterResolver;

impl RosterResolver {
    /// Students enrolled in `course_id` for `section` of the scope's
    /// department and year.
    ///
    /// Never fails: a missing course, a malformed course document or a read
    /// failure all give an empty roster.
    pub async fn resolve<S>(store: &S, course_id: &str, scope: &Scope, section: &str) -> Vec<String>
    where
        S: DocumentStore + ?Sized,
    {
        let collection = collections::courses(scope);

        let course = match store.get(&collection, course_id).await {
            Ok(Some(document)) => document.decode::<Course>(),
            Ok(None) => return Vec::new(),
            Err(e) => Err(e),
        };

        match course {
            Ok(course) => course.roster_for_section(section),
            Err(e) => {
                warn!("Roster for {course_id} in {collection} unavailable: {e}");
                Vec::new()
            }
        }
    }

    /// Every readable course of the scope's department and year, for
    /// resolving many rosters from one read. Unreadable courses are skipped.
    pub async fn load<S>(store: &S, scope: &Scope) -> CourseRosters
    where
        S: DocumentStore + ?Sized,
    {
        let collection = collections::courses(scope);

        let documents = match store.query(&collection, &Query::new()).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Courses in {collection} unavailable: {e}");
                return CourseRosters::default();
            }
        };

        CourseRosters::new(documents.iter().filter_map(|document| {
            document
                .decode::<Course>()
                .map_err(|e: Error| warn!("Skipping course {}: {e}", document.id))
                .ok()
        }))
    }
}
