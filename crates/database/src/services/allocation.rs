use crate::{
    collections::{ALLOCATIONS, AUDIT_LOG, BEDS, ROOMS, WAITLIST},
    error::Error,
    services::committer::AtomicCommitter,
    store::{Direction, DocumentStore, Operation, Query},
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use models::{
    audit::{AuditAction, AuditRecord},
    housing::{Allocation, AllocationStatus, Resource, ResourceGroup, ResourceStatus, WaitlistEntry},
    matcher::{Candidate, MatchOutcome, match_waitlist},
};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// A matching pass that has not been committed yet
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub allocations: Vec<Allocation>,
    pub remaining: Vec<WaitlistEntry>,
    operations: Vec<Operation>,
}

impl AllocationPlan {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

/// Outcome of a committed allocation run
#[derive(Debug, Clone)]
pub struct AllocationReport {
    pub allocations: Vec<Allocation>,
    /// Pending entries that found no bed
    pub remaining: Vec<WaitlistEntry>,
    pub created_ids: Vec<String>,
}

impl AllocationReport {
    pub fn allocated_count(&self) -> usize {
        self.allocations.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }
}

pub struct AllocationService;

impl AllocationService {
    /// Matches every pending waitlist entry against the vacant beds and
    /// commits the result as one audited batch
    pub async fn run<S>(store: &S, actor_id: &str, now: DateTime<Utc>) -> Result<AllocationReport, Error>
    where
        S: DocumentStore + ?Sized,
    {
        let plan = Self::plan(store, actor_id, now).await?;
        Self::apply(store, plan).await
    }

    /// Reads the pending waitlist, rooms and vacant beds and plans the writes.
    ///
    /// Every bed and waitlist update carries the version read here, so a
    /// plan only commits if none of them changed in the meantime.
    pub async fn plan<S>(store: &S, actor_id: &str, now: DateTime<Utc>) -> Result<AllocationPlan, Error>
    where
        S: DocumentStore + ?Sized,
    {
        let waitlist_docs = store
            .query(
                WAITLIST,
                &Query::new()
                    .order_by("priority_rank", Direction::Ascending)
                    .order_by("applied_on", Direction::Ascending),
            )
            .await?;
        let mut waitlist_versions = HashMap::new();
        let mut pending = Vec::new();
        for document in &waitlist_docs {
            let entry: WaitlistEntry = document.decode()?;
            if !entry.fulfilled {
                waitlist_versions.insert(entry.id.clone(), document.version);
                pending.push(entry);
            }
        }

        let rooms: HashMap<String, ResourceGroup> = store
            .query(ROOMS, &Query::new())
            .await?
            .iter()
            .map(|document| document.decode::<ResourceGroup>())
            .map(|room| room.map(|room| (room.id.clone(), room)))
            .collect::<Result<_, _>>()?;

        let bed_docs = store
            .query(
                BEDS,
                &Query::new()
                    .order_by("parent_group_id", Direction::Ascending)
                    .order_by("id", Direction::Ascending),
            )
            .await?;
        let mut bed_versions = HashMap::new();
        let mut pool = Vec::new();
        for document in &bed_docs {
            let bed: Resource = document.decode()?;
            if bed.status != ResourceStatus::Vacant {
                continue;
            }
            let Some(room) = rooms.get(&bed.parent_group_id) else {
                warn!("Bed {} belongs to unknown room {}", bed.id, bed.parent_group_id);
                continue;
            };
            bed_versions.insert(bed.id.clone(), document.version);
            pool.push(Candidate {
                resource_id: bed.id,
                group_id: room.id.clone(),
                resource_type: room.resource_type.clone(),
                status: bed.status,
            });
        }

        debug!(
            "Matching {} pending entries against {} vacant beds",
            pending.len(),
            pool.len()
        );
        let MatchOutcome { intents, remaining } = match_waitlist(pending, &pool);

        let mut allocations = Vec::with_capacity(intents.len());
        let mut operations = Vec::with_capacity(intents.len() * 6);
        for intent in intents {
            let allocation = Allocation {
                id: Uuid::new_v4().to_string(),
                applicant_id: intent.applicant_id.clone(),
                waitlist_id: Some(intent.waitlist_id.clone()),
                resource_id: intent.resource_id.clone(),
                group_id: intent.group_id.clone(),
                status: AllocationStatus::Active,
                allot_date: now,
                vacate_date: None,
                reason: None,
            };
            let notes = format!(
                "bed {} in room {} for applicant {}",
                intent.resource_id, intent.group_id, intent.applicant_id
            );
            let audit = |entity: &str, entity_id: &str| {
                Operation::create(
                    AUDIT_LOG,
                    &AuditRecord::new(entity, entity_id, AuditAction::Allocate, actor_id, now)
                        .with_notes(notes.as_str()),
                )
            };

            operations.push(Operation::create(ALLOCATIONS, &allocation)?);
            operations.push(audit(ALLOCATIONS, &allocation.id)?);
            operations.push(Operation::update(
                BEDS,
                &intent.resource_id,
                &json!({ "status": ResourceStatus::Occupied }),
                bed_versions.get(&intent.resource_id).copied(),
            )?);
            operations.push(audit(BEDS, &intent.resource_id)?);
            operations.push(Operation::update(
                WAITLIST,
                &intent.waitlist_id,
                &json!({ "fulfilled": true }),
                waitlist_versions.get(&intent.waitlist_id).copied(),
            )?);
            operations.push(audit(WAITLIST, &intent.waitlist_id)?);

            allocations.push(allocation);
        }

        Ok(AllocationPlan {
            allocations,
            remaining,
            operations,
        })
    }

    /// Commits a plan. Fails with a conflict if any bed or waitlist entry
    /// changed since the plan was read.
    pub async fn apply<S>(store: &S, plan: AllocationPlan) -> Result<AllocationReport, Error>
    where
        S: DocumentStore + ?Sized,
    {
        let AllocationPlan {
            allocations,
            remaining,
            operations,
        } = plan;

        let created_ids = AtomicCommitter::commit(store, operations).await?;
        info!(
            "Allocated {} beds, {} applicants still waiting",
            allocations.len(),
            remaining.len()
        );

        Ok(AllocationReport {
            allocations,
            remaining,
            created_ids,
        })
    }

    /// Ends an active allocation and frees its bed
    pub async fn vacate<S>(
        store: &S,
        allocation_id: &str,
        actor_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Allocation, Error>
    where
        S: DocumentStore + ?Sized,
    {
        let document = store
            .get(ALLOCATIONS, allocation_id)
            .await?
            .ok_or_else(|| Error::Validation(format!("no allocation {allocation_id}")))?;
        let mut allocation: Allocation = document.decode()?;

        if allocation.status != AllocationStatus::Active {
            return Err(Error::Validation(format!(
                "allocation {allocation_id} is already {}",
                allocation.status
            )));
        }

        let bed = store
            .get(BEDS, &allocation.resource_id)
            .await?
            .ok_or_else(|| {
                Error::Validation(format!(
                    "allocation {allocation_id} points at missing bed {}",
                    allocation.resource_id
                ))
            })?;

        allocation.status = AllocationStatus::Vacated;
        allocation.vacate_date = Some(now);
        allocation.reason = reason.map(str::to_string);

        let audit = |entity: &str, entity_id: &str| {
            let record = AuditRecord::new(entity, entity_id, AuditAction::Vacate, actor_id, now);
            let record = match reason {
                Some(reason) => record.with_notes(reason),
                None => record,
            };
            Operation::create(AUDIT_LOG, &record)
        };

        let operations = vec![
            Operation::update(
                ALLOCATIONS,
                allocation_id,
                &json!({
                    "status": allocation.status,
                    "vacate_date": allocation.vacate_date,
                    "reason": allocation.reason,
                }),
                Some(document.version),
            )?,
            audit(ALLOCATIONS, allocation_id)?,
            Operation::update(
                BEDS,
                &allocation.resource_id,
                &json!({ "status": ResourceStatus::Vacant }),
                Some(bed.version),
            )?,
            audit(BEDS, &allocation.resource_id)?,
        ];

        AtomicCommitter::commit(store, operations).await?;
        info!(
            "Vacated allocation {allocation_id}, bed {} is free",
            allocation.resource_id
        );

        Ok(allocation)
    }

    /// Moves a bed between vacant, blocked and maintenance. Occupancy only
    /// changes through allocation and vacating.
    pub async fn set_resource_status<S>(
        store: &S,
        bed_id: &str,
        status: ResourceStatus,
        actor_id: &str,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<Resource, Error>
    where
        S: DocumentStore + ?Sized,
    {
        if status == ResourceStatus::Occupied {
            return Err(Error::Validation(format!(
                "bed {bed_id} can only become occupied through an allocation"
            )));
        }

        let document = store
            .get(BEDS, bed_id)
            .await?
            .ok_or_else(|| Error::Validation(format!("no bed {bed_id}")))?;
        let mut bed: Resource = document.decode()?;

        if bed.status == ResourceStatus::Occupied {
            return Err(Error::Validation(format!(
                "bed {bed_id} is occupied; vacate its allocation first"
            )));
        }
        if bed.status == status {
            return Ok(bed);
        }

        let audit = AuditRecord::new(BEDS, bed_id, AuditAction::SetResourceStatus, actor_id, now)
            .with_notes(format!("{} -> {status}: {notes}", bed.status));

        let operations = vec![
            Operation::update(
                BEDS,
                bed_id,
                &json!({ "status": status }),
                Some(document.version),
            )?,
            Operation::create(AUDIT_LOG, &audit)?,
        ];

        AtomicCommitter::commit(store, operations).await?;
        info!("Bed {bed_id} is now {status}");

        bed.status = status;
        Ok(bed)
    }
}
