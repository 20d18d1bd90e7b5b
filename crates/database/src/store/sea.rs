use crate::{
    entities::documents,
    error::Error,
    store::{DocumentStore, Operation, Query, StoredDocument, Write},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait, sea_query::Expr,
};

impl From<documents::Model> for StoredDocument {
    fn from(model: documents::Model) -> Self {
        Self {
            collection: model.collection,
            id: model.id,
            version: model.version,
            body: model.body,
        }
    }
}

/// Inserts a fresh row at version 1. A concurrent writer that created the same
/// key first surfaces as a conflict, not a storage failure.
async fn insert<C: ConnectionTrait>(
    db: &C,
    collection: &str,
    id: &str,
    body: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let row = documents::ActiveModel {
        collection: Set(collection.to_string()),
        id: Set(id.to_string()),
        version: Set(1),
        body: Set(body),
        created_at: Set(now),
        updated_at: Set(now),
    };

    documents::Entity::insert(row)
        .exec_without_returning(db)
        .await
        .map_err(|err| insert_error(err, collection, id))?;
    Ok(())
}

fn insert_error(err: DbErr, collection: &str, id: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::conflict(collection, id),
        _ => Error::from(err),
    }
}

/// Documents kept in the `documents` table, one row per `(collection, id)`
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl DocumentStore for SeaOrmStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>, Error> {
        let rows = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .order_by_asc(documents::Column::Id)
            .all(&self.db)
            .await?;

        Ok(query.apply(rows.into_iter().map(StoredDocument::from).collect()))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, Error> {
        let row = documents::Entity::find_by_id((collection.to_string(), id.to_string()))
            .one(&self.db)
            .await?;

        Ok(row.map(StoredDocument::from))
    }

    async fn transactional_batch(&self, operations: &[Operation]) -> Result<Vec<String>, Error> {
        // Dropping the transaction on an early return rolls it back
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let mut created = Vec::new();

        for operation in operations {
            let collection = operation.collection();
            let id = operation.target_id();

            let current = documents::Entity::find_by_id((collection.to_string(), id.clone()))
                .one(&txn)
                .await?
                .map(StoredDocument::from);

            match operation.plan(&id, current.as_ref())? {
                Write::Insert(body) => {
                    insert(&txn, collection, &id, body, now).await?;
                }
                Write::Replace { body, version } => {
                    let result = documents::Entity::update_many()
                        .col_expr(documents::Column::Body, Expr::value(body))
                        .col_expr(documents::Column::Version, Expr::value(version + 1))
                        .col_expr(documents::Column::UpdatedAt, Expr::value(now))
                        .filter(documents::Column::Collection.eq(collection))
                        .filter(documents::Column::Id.eq(id.as_str()))
                        .filter(documents::Column::Version.eq(version))
                        .exec(&txn)
                        .await?;

                    // Another writer got in between our read and this write
                    if result.rows_affected == 0 {
                        return Err(Error::conflict(collection, &id));
                    }
                }
                Write::Remove => {
                    documents::Entity::delete_many()
                        .filter(documents::Column::Collection.eq(collection))
                        .filter(documents::Column::Id.eq(id.as_str()))
                        .exec(&txn)
                        .await?;
                }
                Write::Skip => {}
            }

            if operation.is_create() {
                created.push(id);
            }
        }

        txn.commit().await?;
        Ok(created)
    }
}
