use crate::housing::{ResourceStatus, WaitlistEntry};
use serde::Serialize;
use std::{cmp::Ordering, collections::HashSet};

/// Rank given to waitlist entries that were never ranked
pub const UNRANKED: u32 = u32::MAX;

/// A bed as seen by the matcher, joined with its room's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub resource_id: String,
    pub group_id: String,
    pub resource_type: String,
    pub status: ResourceStatus,
}

/// A planned allocation, not yet committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationIntent {
    pub waitlist_id: String,
    pub applicant_id: String,
    pub resource_id: String,
    pub group_id: String,
}

/// Result of one matching pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub intents: Vec<AllocationIntent>,
    /// Entries that found no bed, in the order they were considered
    pub remaining: Vec<WaitlistEntry>,
}

/// Serving order: rank ascending, then application date ascending. Missing
/// values sort last.
fn serving_order(a: &WaitlistEntry, b: &WaitlistEntry) -> Ordering {
    let rank_a = a.priority_rank.unwrap_or(UNRANKED);
    let rank_b = b.priority_rank.unwrap_or(UNRANKED);

    rank_a
        .cmp(&rank_b)
        .then_with(|| match (a.applied_on, b.applied_on) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Greedy first-fit matching of `waitlist` against `pool`.
///
/// Entries are served strictly in priority order and each takes the first
/// vacant bed, in pool order, that satisfies its preferences. A bed handed out
/// earlier in the pass is gone for everyone after. Entries that find nothing,
/// or were already fulfilled, come back in `remaining`.
pub fn match_waitlist(mut waitlist: Vec<WaitlistEntry>, pool: &[Candidate]) -> MatchOutcome {
    // Stable, so equal keys keep their input order
    waitlist.sort_by(serving_order);

    let mut seen = HashSet::new();
    let mut available: Vec<&Candidate> = pool
        .iter()
        .filter(|candidate| candidate.status == ResourceStatus::Vacant)
        .filter(|candidate| seen.insert(candidate.resource_id.clone()))
        .collect();

    let mut outcome = MatchOutcome::default();

    for entry in waitlist {
        if entry.fulfilled {
            outcome.remaining.push(entry);
            continue;
        }

        let position = available.iter().position(|candidate| {
            entry
                .preferences
                .accepts(&candidate.resource_type, &candidate.group_id)
        });

        match position {
            Some(index) => {
                let candidate = available.remove(index);
                outcome.intents.push(AllocationIntent {
                    waitlist_id: entry.id,
                    applicant_id: entry.applicant_id,
                    resource_id: candidate.resource_id.clone(),
                    group_id: candidate.group_id.clone(),
                });
            }
            None => outcome.remaining.push(entry),
        }
    }

    outcome
}
