//! The repository boundary: a collection-keyed document store with
//! all-or-nothing batches.

mod memory;
mod sea;

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

use crate::{error::Error, legacy::KeyAdapter};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, map::Entry};
use std::{cmp::Ordering, future::Future};
use uuid::Uuid;

/// A document as persisted, before any legacy translation
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub collection: String,
    pub id: String,
    /// Starts at 1 and increases with every write
    pub version: i64,
    pub body: Value,
}

impl StoredDocument {
    /// The body in canonical field names, with the document id as `id`
    pub fn canonical_body(&self) -> Value {
        let mut body = KeyAdapter::canonicalize(&self.collection, self.body.clone());
        if let Value::Object(fields) = &mut body {
            fields.insert("id".to_string(), Value::String(self.id.clone()));
        }
        body
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_value(self.canonical_body())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filters and ordering over canonical field names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
    ordering: Vec<(String, Direction)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.ordering.push((field.into(), direction));
        self
    }

    /// Keeps the documents matching every filter and sorts them. Documents
    /// missing an ordering field sort after those that have it, in either
    /// direction. The sort is stable.
    pub fn apply(&self, documents: Vec<StoredDocument>) -> Vec<StoredDocument> {
        let mut matching: Vec<(Value, StoredDocument)> = documents
            .into_iter()
            .map(|document| (document.canonical_body(), document))
            .filter(|(body, _)| {
                self.filters
                    .iter()
                    .all(|(field, wanted)| body.get(field) == Some(wanted))
            })
            .collect();

        matching.sort_by(|(a, _), (b, _)| {
            self.ordering
                .iter()
                .fold(Ordering::Equal, |order, (field, direction)| {
                    order.then_with(|| compare_field(a.get(field), b.get(field), *direction))
                })
        });

        matching.into_iter().map(|(_, document)| document).collect()
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    let a = a.filter(|value| !value.is_null());
    let b = b.filter(|value| !value.is_null());

    match (a, b) {
        (Some(a), Some(b)) => {
            let order = compare_values(a, b);
            match direction {
                Direction::Ascending => order,
                Direction::Descending => order.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// One write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Fails if the id already exists. Without an id a UUID v4 is generated.
    Create {
        collection: String,
        id: Option<String>,
        fields: Map<String, Value>,
    },
    /// Top-level merge into an existing document. With `expected_version`
    /// set, the write only happens if nobody wrote the document since.
    Update {
        collection: String,
        id: String,
        fields: Map<String, Value>,
        expected_version: Option<i64>,
    },
    /// Create-or-merge. `fields` replace top-level keys; `defaults` are
    /// filled in only where the key path is absent.
    Upsert {
        collection: String,
        id: String,
        fields: Map<String, Value>,
        defaults: Map<String, Value>,
    },
    /// Removing a missing document is not an error
    Delete { collection: String, id: String },
}

impl Operation {
    /// Create from a serializable document. A non-empty string `id` field
    /// becomes the explicit id.
    pub fn create(collection: impl Into<String>, document: &impl Serialize) -> Result<Self, Error> {
        let mut fields = to_object(document)?;
        let id = match fields.remove("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id),
            _ => None,
        };

        Ok(Self::Create {
            collection: collection.into(),
            id,
            fields,
        })
    }

    pub fn update(
        collection: impl Into<String>,
        id: impl Into<String>,
        patch: &impl Serialize,
        expected_version: Option<i64>,
    ) -> Result<Self, Error> {
        Ok(Self::Update {
            collection: collection.into(),
            id: id.into(),
            fields: to_object(patch)?,
            expected_version,
        })
    }

    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Delete {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Upsert { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }

    /// The id written to; `None` for a create that lets the store pick one
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Create { id, .. } => id.as_deref(),
            Self::Update { id, .. } | Self::Upsert { id, .. } | Self::Delete { id, .. } => Some(id),
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }

    /// The id this operation writes to, generating one for an anonymous create
    pub(crate) fn target_id(&self) -> String {
        match self {
            Self::Create { id: Some(id), .. } => id.clone(),
            Self::Create { id: None, .. } => Uuid::new_v4().to_string(),
            Self::Update { id, .. } | Self::Upsert { id, .. } | Self::Delete { id, .. } => {
                id.clone()
            }
        }
    }

    /// Decides the write against the current state of `id`
    pub(crate) fn plan(&self, id: &str, current: Option<&StoredDocument>) -> Result<Write, Error> {
        match (self, current) {
            (Self::Create { collection, .. }, Some(_)) => Err(Error::conflict(collection, id)),
            (Self::Create { fields, .. }, None) => Ok(Write::Insert(Value::Object(fields.clone()))),
            (Self::Update { collection, .. }, None) => Err(Error::Validation(format!(
                "cannot update {collection}/{id}: no such document"
            ))),
            (
                Self::Update {
                    collection,
                    fields,
                    expected_version,
                    ..
                },
                Some(current),
            ) => {
                if let Some(expected) = expected_version
                    && *expected != current.version
                {
                    return Err(Error::conflict(collection, id));
                }

                let mut body = stored_fields(current);
                body.extend(fields.clone());
                Ok(Write::Replace {
                    body: Value::Object(body),
                    version: current.version,
                })
            }
            (Self::Upsert { fields, defaults, .. }, None) => {
                let mut body = fields.clone();
                fill_defaults(&mut body, defaults);
                Ok(Write::Insert(Value::Object(body)))
            }
            (Self::Upsert { fields, defaults, .. }, Some(current)) => {
                let mut body = stored_fields(current);
                body.extend(fields.clone());
                fill_defaults(&mut body, defaults);
                Ok(Write::Replace {
                    body: Value::Object(body),
                    version: current.version,
                })
            }
            (Self::Delete { .. }, Some(_)) => Ok(Write::Remove),
            (Self::Delete { .. }, None) => Ok(Write::Skip),
        }
    }
}

/// A planned change to a single document
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Write {
    Insert(Value),
    /// `version` is the version the body was computed from
    Replace { body: Value, version: i64 },
    Remove,
    Skip,
}

pub(crate) fn to_object(value: &impl Serialize) -> Result<Map<String, Value>, Error> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::Validation(format!(
            "document must be a JSON object, got {other}"
        ))),
    }
}

/// Current body in canonical names. Merged writes therefore also migrate
/// legacy documents.
fn stored_fields(current: &StoredDocument) -> Map<String, Value> {
    match KeyAdapter::canonicalize(&current.collection, current.body.clone()) {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

fn fill_defaults(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match target.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(default.clone());
            }
            Entry::Occupied(mut slot) => {
                if let (Value::Object(existing), Value::Object(nested)) = (slot.get_mut(), default) {
                    fill_defaults(existing, nested);
                }
            }
        }
    }
}

/// Persistence used by the committer and the services
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching `query`
    fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<StoredDocument>, Error>> + Send;

    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<StoredDocument>, Error>> + Send;

    /// Applies every operation or none. Returns the ids of created documents
    /// in operation order.
    fn transactional_batch(
        &self,
        operations: &[Operation],
    ) -> impl Future<Output = Result<Vec<String>, Error>> + Send;
}
