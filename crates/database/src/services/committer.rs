use crate::{
    collections::{AUDIT_LOG, AUDITED},
    error::Error,
    store::{DocumentStore, Operation},
};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;

/// The single write path for allocation and attendance state
pub struct AtomicCommitter;

impl AtomicCommitter {
    /// Applies `operations` as one transaction and returns the ids created by
    /// its `Create` operations, in order.
    ///
    /// Every write to allocations, beds or the waitlist must be matched by its
    /// own audit record in the same batch, naming the written collection as
    /// `entity` and the document id as `entity_id`. The audit log itself only
    /// accepts creates. Both rules are checked before anything reaches the
    /// store.
    pub async fn commit<S>(store: &S, operations: Vec<Operation>) -> Result<Vec<String>, Error>
    where
        S: DocumentStore + ?Sized,
    {
        if operations.is_empty() {
            return Ok(Vec::new());
        }

        Self::validate(&operations)?;

        debug!("Committing batch of {} operations", operations.len());
        match store.transactional_batch(&operations).await {
            Ok(created) => {
                info!(
                    "Committed {} operations, created {} documents",
                    operations.len(),
                    created.len()
                );
                Ok(created)
            }
            Err(e) => {
                warn!("Batch of {} operations rejected: {e}", operations.len());
                Err(e)
            }
        }
    }

    fn validate(operations: &[Operation]) -> Result<(), Error> {
        if let Some(operation) = operations
            .iter()
            .find(|operation| operation.collection() == AUDIT_LOG && !operation.is_create())
        {
            return Err(Error::Validation(format!(
                "{AUDIT_LOG} is append-only, refusing {operation:?}"
            )));
        }

        // Audit records in this batch, by the (entity, entity_id) they describe
        let mut records: HashMap<(&str, &str), usize> = HashMap::new();
        for operation in operations {
            if let Operation::Create {
                collection, fields, ..
            } = operation
                && collection == AUDIT_LOG
                && let (Some(entity), Some(entity_id)) = (
                    fields.get("entity").and_then(Value::as_str),
                    fields.get("entity_id").and_then(Value::as_str),
                )
            {
                *records.entry((entity, entity_id)).or_default() += 1;
            }
        }

        for operation in operations {
            let collection = operation.collection();
            if !AUDITED.contains(&collection) {
                continue;
            }

            let Some(id) = operation.id() else {
                return Err(Error::Validation(format!(
                    "writes to {collection} need an explicit id to be audited"
                )));
            };
            match records.get_mut(&(collection, id)) {
                Some(remaining) if *remaining > 0 => *remaining -= 1,
                _ => {
                    return Err(Error::Validation(format!(
                        "{collection}/{id} changes without an audit record in the same batch"
                    )));
                }
            }
        }

        Ok(())
    }
}
