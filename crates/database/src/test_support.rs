use crate::store::{DocumentStore, Operation, SeaOrmStore};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A SeaORM store over a fresh in-memory SQLite database. A single pooled
/// connection keeps every query on the same database.
pub(crate) async fn sqlite_store() -> SeaOrmStore {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("in-memory sqlite");
    Migrator::up(&db, None).await.expect("documents migration");
    SeaOrmStore::new(db)
}

/// Writes `documents` directly, skipping the committer's audit rules
pub(crate) async fn seed<S: DocumentStore>(store: &S, documents: Vec<(&str, Value)>) {
    let operations: Vec<Operation> = documents
        .into_iter()
        .map(|(collection, body)| Operation::create(collection, &body).expect("object body"))
        .collect();

    store
        .transactional_batch(&operations)
        .await
        .expect("seed batch");
}
