use crate::{
    collections,
    error::Error,
    services::{committer::AtomicCommitter, roster::RosterResolver},
    store::{DocumentStore, Operation, Query, to_object},
};
use chrono::{DateTime, TimeZone};
use futures::future::try_join_all;
use log::info;
use models::{
    attendance::{AttendanceSession, AttendanceStatus},
    materialize::{SessionUpsert, StatusPolicy, materialize},
    scope::Scope,
    timetable::TimetableEntry,
};
use serde_json::{Map, json};

const STATUS_FIELD: &str = "status_by_student";

pub struct SessionService;

impl SessionService {
    /// Writes this week's sessions for `scope` from its timetable and
    /// returns their ids. Reruns merge into the sessions already written.
    pub async fn materialize_week<S, Tz>(
        store: &S,
        scope: &Scope,
        now: &DateTime<Tz>,
        policy: StatusPolicy,
    ) -> Result<Vec<String>, Error>
    where
        S: DocumentStore + ?Sized,
        Tz: TimeZone,
    {
        scope.validate()?;

        let entries: Vec<TimetableEntry> = store
            .query(&collections::timetable(scope), &Query::new())
            .await?
            .iter()
            .map(|document| document.decode::<TimetableEntry>())
            .collect::<Result<_, _>>()?;

        let rosters = RosterResolver::load(store, scope).await;
        let upserts = materialize(scope, &entries, now, &rosters)?;

        let ids: Vec<String> = upserts.iter().map(SessionUpsert::id).collect();
        let operations = upserts
            .iter()
            .map(|upsert| Self::upsert_operation(upsert, policy))
            .collect::<Result<Vec<_>, _>>()?;

        AtomicCommitter::commit(store, operations).await?;
        info!(
            "Materialized {} sessions for {scope} ({policy} statuses)",
            ids.len()
        );

        Ok(ids)
    }

    /// Runs [`Self::materialize_week`] for every scope concurrently. Each
    /// scope commits on its own.
    pub async fn materialize_all<S, Tz>(
        store: &S,
        scopes: &[Scope],
        now: &DateTime<Tz>,
        policy: StatusPolicy,
    ) -> Result<Vec<String>, Error>
    where
        S: DocumentStore + ?Sized,
        Tz: TimeZone,
    {
        let per_scope = try_join_all(
            scopes
                .iter()
                .map(|scope| Self::materialize_week(store, scope, now, policy)),
        )
        .await?;

        Ok(per_scope.into_iter().flatten().collect())
    }

    /// Records `status` for `student_id` in an existing session
    pub async fn mark<S>(
        store: &S,
        scope: &Scope,
        session_id: &str,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<AttendanceSession, Error>
    where
        S: DocumentStore + ?Sized,
    {
        let collection = collections::attendance(scope);
        let document = store
            .get(&collection, session_id)
            .await?
            .ok_or_else(|| Error::Validation(format!("no session {session_id} in {scope}")))?;
        let mut session: AttendanceSession = document.decode()?;

        match session.status_by_student.get_mut(student_id) {
            Some(current) => *current = status,
            None => {
                return Err(Error::Validation(format!(
                    "{student_id} is not on the roster of {session_id}"
                )));
            }
        }

        let operation = Operation::update(
            collection,
            session_id,
            &json!({ STATUS_FIELD: session.status_by_student }),
            Some(document.version),
        )?;
        AtomicCommitter::commit(store, vec![operation]).await?;

        Ok(session)
    }

    /// Under [`StatusPolicy::Preserve`] roster statuses only fill gaps, so
    /// marks already recorded survive. Under [`StatusPolicy::Reset`] the
    /// whole status map is replaced.
    fn upsert_operation(upsert: &SessionUpsert, policy: StatusPolicy) -> Result<Operation, Error> {
        let mut fields = to_object(&upsert.session)?;
        let statuses = fields.remove(STATUS_FIELD).unwrap_or_default();

        let mut defaults = Map::new();
        match policy {
            StatusPolicy::Preserve => {
                defaults.insert(STATUS_FIELD.to_string(), statuses);
            }
            StatusPolicy::Reset => {
                fields.insert(STATUS_FIELD.to_string(), statuses);
            }
        }

        Ok(Operation::Upsert {
            collection: collections::attendance(&upsert.scope),
            id: upsert.id(),
            fields,
            defaults,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::Error,
        services::sessions::SessionService,
        store::{DocumentStore, MemoryStore, Operation, Query},
        test_support::{init_logging, seed, sqlite_store},
    };
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use models::{
        attendance::{AttendanceSession, AttendanceStatus},
        materialize::StatusPolicy,
        scope::Scope,
    };
    use serde_json::json;

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap()
    }

    fn scope() -> Scope {
        Scope::new("CSE", "3", "A")
    }

    async fn seed_section<S: DocumentStore>(store: &S) {
        seed(
            store,
            vec![
                (
                    "courses/CSE_3",
                    json!({
                        "id": "CS301",
                        "name": "Operating Systems",
                        "students_by_section": { "A": ["s1", "s2"], "B": ["s7"] },
                    }),
                ),
                (
                    "courses/CSE_3",
                    json!({ "id": "MA201", "courseName": "Probability", "studentsBySection": { "Section A": ["s1"] } }),
                ),
                (
                    "timetable/CSE_3_A",
                    json!({
                        "weekday": "Monday", "periods": [1], "start_time": "09:00",
                        "end_time": "10:00", "course_id": "CS301", "course_name": "Operating Systems",
                        "faculty_name": "Dr. Rao", "room": "LH-1",
                    }),
                ),
                (
                    "timetable/CSE_3_A",
                    json!({
                        "day": "W", "period": 3, "startTime": "11:00 AM",
                        "endTime": "12:00 PM", "courseId": "MA201", "courseName": "Probability",
                    }),
                ),
                (
                    "timetable/CSE_3_A",
                    json!({
                        "weekday": 7, "start_time": "09:00", "end_time": "10:00",
                        "course_id": "CS301",
                    }),
                ),
            ],
        )
        .await;
    }

    async fn session<S: DocumentStore>(store: &S, id: &str) -> AttendanceSession {
        store
            .get("attendance/CSE_3_A", id)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap()
    }

    async fn rerun_is_idempotent<S: DocumentStore>(store: S) {
        seed_section(&store).await;

        let first = SessionService::materialize_week(&store, &scope(), &wednesday(), StatusPolicy::Preserve)
            .await
            .unwrap();
        let second = SessionService::materialize_week(&store, &scope(), &wednesday(), StatusPolicy::Preserve)
            .await
            .unwrap();

        assert_eq!(first, ["2024-05-13_CS301", "2024-05-15_MA201"]);
        assert_eq!(first, second);
        assert_eq!(
            store.query("attendance/CSE_3_A", &Query::new()).await.unwrap().len(),
            2
        );

        let monday = session(&store, "2024-05-13_CS301").await;
        assert_eq!(monday.course_name, "Operating Systems");
        assert_eq!(monday.room, "LH-1");
        assert_eq!(monday.status_by_student.len(), 2);

        let wednesday = session(&store, "2024-05-15_MA201").await;
        assert_eq!(wednesday.periods, [3]);
        assert_eq!(wednesday.start_time.to_string(), "11:00:00");
        assert_eq!(wednesday.end_time.to_string(), "12:00:00");
        assert_eq!(wednesday.status_by_student.len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        init_logging();
        rerun_is_idempotent(MemoryStore::new()).await;
        rerun_is_idempotent(sqlite_store().await).await;
    }

    async fn preserve_keeps_marks<S: DocumentStore>(store: S) {
        seed_section(&store).await;
        SessionService::materialize_week(&store, &scope(), &wednesday(), StatusPolicy::Preserve)
            .await
            .unwrap();

        SessionService::mark(&store, &scope(), "2024-05-13_CS301", "s1", AttendanceStatus::Present)
            .await
            .unwrap();
        store
            .transactional_batch(&[Operation::update(
                "courses/CSE_3",
                "CS301",
                &json!({ "students_by_section": { "A": ["s1", "s2", "s3"] } }),
                None,
            )
            .unwrap()])
            .await
            .unwrap();

        SessionService::materialize_week(&store, &scope(), &wednesday(), StatusPolicy::Preserve)
            .await
            .unwrap();

        let monday = session(&store, "2024-05-13_CS301").await;
        assert_eq!(monday.status_by_student["s1"], AttendanceStatus::Present);
        assert_eq!(monday.status_by_student["s2"], AttendanceStatus::Pending);
        assert_eq!(monday.status_by_student["s3"], AttendanceStatus::Pending);

        SessionService::materialize_week(&store, &scope(), &wednesday(), StatusPolicy::Reset)
            .await
            .unwrap();

        let monday = session(&store, "2024-05-13_CS301").await;
        assert_eq!(monday.status_by_student.len(), 3);
        assert!(
            monday
                .status_by_student
                .values()
                .all(|status| *status == AttendanceStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_preserve_keeps_marks_and_reset_clears_them() {
        preserve_keeps_marks(MemoryStore::new()).await;
        preserve_keeps_marks(sqlite_store().await).await;
    }

    #[tokio::test]
    async fn test_week_follows_local_date() {
        let store = MemoryStore::new();
        seed_section(&store).await;
        // Sunday 20:00 UTC is already Monday in IST
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 5, 19, 20, 0, 0)
            .unwrap()
            .with_timezone(&ist);

        let ids = SessionService::materialize_week(&store, &scope(), &now, StatusPolicy::Preserve)
            .await
            .unwrap();

        assert_eq!(ids, ["2024-05-20_CS301", "2024-05-22_MA201"]);
    }

    #[tokio::test]
    async fn test_invalid_requests_write_nothing() {
        init_logging();
        let store = MemoryStore::new();
        seed_section(&store).await;

        let no_timetable = SessionService::materialize_week(
            &store,
            &Scope::new("CSE", "3", "B"),
            &wednesday(),
            StatusPolicy::Preserve,
        )
        .await;
        let no_department = SessionService::materialize_week(
            &store,
            &Scope::new("", "3", "A"),
            &wednesday(),
            StatusPolicy::Preserve,
        )
        .await;

        assert!(matches!(no_timetable, Err(Error::Validation(_))));
        assert!(matches!(no_department, Err(Error::Validation(_))));
        assert!(
            store
                .query("attendance/CSE_3_B", &Query::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_materialize_all_scopes() {
        let store = MemoryStore::new();
        seed_section(&store).await;
        seed(
            &store,
            vec![(
                "timetable/CSE_3_B",
                json!({
                    "weekday": "Fri", "start_time": "14:00", "end_time": "15:00",
                    "course_id": "CS301",
                }),
            )],
        )
        .await;

        let ids = SessionService::materialize_all(
            &store,
            &[scope(), Scope::new("CSE", "3", "B")],
            &wednesday(),
            StatusPolicy::Preserve,
        )
        .await
        .unwrap();

        assert_eq!(
            ids,
            ["2024-05-13_CS301", "2024-05-15_MA201", "2024-05-17_CS301"]
        );
        let friday: AttendanceSession = store
            .get("attendance/CSE_3_B", "2024-05-17_CS301")
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(friday.status_by_student.keys().collect::<Vec<_>>(), ["s7"]);
    }

    #[tokio::test]
    async fn test_mark_rejects_unknown_students_and_sessions() {
        let store = MemoryStore::new();
        seed_section(&store).await;
        SessionService::materialize_week(&store, &scope(), &wednesday(), StatusPolicy::Preserve)
            .await
            .unwrap();

        let stranger =
            SessionService::mark(&store, &scope(), "2024-05-13_CS301", "s9", AttendanceStatus::Present)
                .await;
        let missing =
            SessionService::mark(&store, &scope(), "2024-05-14_CS301", "s1", AttendanceStatus::Absent)
                .await;

        assert!(matches!(stranger, Err(Error::Validation(_))));
        assert!(matches!(missing, Err(Error::Validation(_))));
    }
}
