//! Three-way diff between a proposal's persisted items and a full resubmission.
//!
//! The submitted list replaces the persisted list wholesale:
//! - a valid submission naming a persisted id updates that row (first occurrence only)
//! - any other valid submission becomes a new row with a fresh id
//! - persisted rows not claimed by the submission are deleted
//!
//! Invalid submissions are reported and skipped. If an invalid submission
//! names a persisted id, that row is retained as-is rather than deleted.
//!
//! Planning is pure; applying a plan is the store's job.

use std::collections::{HashMap, HashSet};

use autoproposal_core::{ProposalId, ProposalItemId, identity_set};

use crate::item::{ItemFailure, ProposalItem, SubmittedItem};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub updates: Vec<ProposalItem>,
    pub inserts: Vec<ProposalItem>,
    pub deletes: Vec<ProposalItemId>,
    /// Persisted ids left untouched because their submission was invalid.
    pub retained: Vec<ProposalItemId>,
    pub failures: Vec<ItemFailure>,
}

impl ReconcilePlan {
    /// Ids that will exist after the plan is applied.
    pub fn surviving_ids(&self) -> HashSet<ProposalItemId> {
        self.updates
            .iter()
            .chain(&self.inserts)
            .map(|i| i.id)
            .chain(self.retained.iter().copied())
            .collect()
    }

    /// Apply to an in-memory copy of the persisted set.
    ///
    /// Updated and retained rows keep their position; inserts are appended.
    pub fn apply_to(&self, existing: &[ProposalItem]) -> Vec<ProposalItem> {
        let updates: HashMap<ProposalItemId, &ProposalItem> =
            self.updates.iter().map(|i| (i.id, i)).collect();
        let deletes: HashSet<ProposalItemId> = self.deletes.iter().copied().collect();

        existing
            .iter()
            .filter(|e| !deletes.contains(&e.id))
            .map(|e| updates.get(&e.id).map_or_else(|| e.clone(), |u| (*u).clone()))
            .chain(self.inserts.iter().cloned())
            .collect()
    }
}

/// Compute the plan. `new_id` is called once per inserted row.
pub fn plan<F>(
    proposal_id: ProposalId,
    existing: &[ProposalItem],
    submitted: &[SubmittedItem],
    mut new_id: F,
) -> ReconcilePlan
where
    F: FnMut() -> ProposalItemId,
{
    let persisted = identity_set(existing);
    let mut kept: HashSet<ProposalItemId> = HashSet::with_capacity(submitted.len());
    let mut out = ReconcilePlan::default();

    for (index, s) in submitted.iter().enumerate() {
        // Claims a persisted id only the first time it is seen.
        let claimed = s
            .id
            .filter(|id| persisted.contains(id) && !kept.contains(id));

        match s.validate() {
            Ok(valid) => match claimed {
                Some(id) => {
                    kept.insert(id);
                    out.updates.push(valid.into_item(id, proposal_id));
                }
                None => {
                    let id = new_id();
                    kept.insert(id);
                    out.inserts.push(valid.into_item(id, proposal_id));
                }
            },
            Err(reason) => {
                if let Some(id) = claimed {
                    kept.insert(id);
                    out.retained.push(id);
                }
                out.failures.push(ItemFailure {
                    index,
                    id: s.id,
                    name: s.name().to_string(),
                    reason,
                });
            }
        }
    }

    out.deletes = existing
        .iter()
        .map(|e| e.id)
        .filter(|id| !kept.contains(id))
        .collect();

    out
}
