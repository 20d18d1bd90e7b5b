use crate::{
    error::Error,
    store::{DocumentStore, Operation, Query, StoredDocument, Write},
};
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

type Documents = BTreeMap<(String, String), StoredDocument>;

/// Process-local store. A batch is applied to a copy of the documents and
/// swapped in only when every operation succeeded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Documents>, Error> {
        self.documents
            .lock()
            .map_err(|_| Error::CommitFailure("document store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>, Error> {
        let documents: Vec<StoredDocument> = self
            .lock()?
            .values()
            .filter(|document| document.collection == collection)
            .cloned()
            .collect();

        Ok(query.apply(documents))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, Error> {
        let key = (collection.to_string(), id.to_string());
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn transactional_batch(&self, operations: &[Operation]) -> Result<Vec<String>, Error> {
        let mut documents = self.lock()?;
        let mut working = documents.clone();
        let mut created = Vec::new();

        for operation in operations {
            let collection = operation.collection().to_string();
            let id = operation.target_id();
            let key = (collection.clone(), id.clone());

            match operation.plan(&id, working.get(&key))? {
                Write::Insert(body) => {
                    working.insert(
                        key,
                        StoredDocument {
                            collection,
                            id: id.clone(),
                            version: 1,
                            body,
                        },
                    );
                }
                Write::Replace { body, version } => {
                    working.insert(
                        key,
                        StoredDocument {
                            collection,
                            id: id.clone(),
                            version: version + 1,
                            body,
                        },
                    );
                }
                Write::Remove => {
                    working.remove(&key);
                }
                Write::Skip => {}
            }

            if operation.is_create() {
                created.push(id);
            }
        }

        *documents = working;
        Ok(created)
    }
}
