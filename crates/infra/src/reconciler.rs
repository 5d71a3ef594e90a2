//! Proposal writes and reads, including transactional item reconciliation.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use autoproposal_core::{ClientId, CompanyId, DomainError, ProposalId, ProposalItemId};
use autoproposal_proposals::{
    ItemFailure, NewProposal, Proposal, ProposalChanges, ProposalItem, ProposalStatus,
    ReconcilePlan, SubmittedItem, plan,
};

use crate::store::{RecordStore, RecordTx, StoreError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of applying a full item list to a proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub proposal_id: ProposalId,
    /// Persisted items after commit.
    pub items: Vec<ProposalItem>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<ItemFailure>,
}

impl ReconcileOutcome {
    fn from_plan(proposal_id: ProposalId, plan: &ReconcilePlan, items: Vec<ProposalItem>) -> Self {
        Self {
            proposal_id,
            items,
            created: plan.inserts.len(),
            updated: plan.updates.len(),
            deleted: plan.deletes.len(),
            failures: plan.failures.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedProposal {
    pub proposal: Proposal,
    pub outcome: ReconcileOutcome,
}

pub struct ProposalService<S> {
    store: Arc<S>,
}

impl<S: RecordStore> ProposalService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a proposal and its initial items in one transaction.
    ///
    /// Items go through the same planner as an edit, against an empty set;
    /// invalid items are reported, not fatal.
    #[instrument(
        skip(self, new_proposal, items),
        fields(company_id = %new_proposal.company_id, item_count = items.len()),
        err
    )]
    pub async fn create_proposal(
        &self,
        new_proposal: NewProposal,
        items: &[SubmittedItem],
    ) -> Result<CreatedProposal, ReconcileError> {
        let proposal = new_proposal.into_proposal(ProposalId::new(), Utc::now())?;

        let mut tx = self.store.begin().await?;
        if tx.find_company(proposal.company_id).await?.is_none() {
            return Err(DomainError::not_found(format!("company {}", proposal.company_id)).into());
        }
        match tx.find_client(proposal.client_id).await? {
            Some(client) if client.company_id == proposal.company_id => {}
            Some(_) => {
                return Err(DomainError::validation(format!(
                    "client {} does not belong to company {}",
                    proposal.client_id, proposal.company_id
                ))
                .into());
            }
            None => {
                return Err(DomainError::not_found(format!("client {}", proposal.client_id)).into());
            }
        }
        tx.insert_proposal(&proposal).await?;

        let p = plan(proposal.id, &[], items, ProposalItemId::new);
        apply(&mut tx, &p).await?;
        let persisted = tx.list_proposal_items(proposal.id).await?;
        tx.commit().await?;

        tracing::info!(
            proposal_id = %proposal.id,
            created = p.inserts.len(),
            rejected = p.failures.len(),
            "proposal created"
        );

        Ok(CreatedProposal {
            outcome: ReconcileOutcome::from_plan(proposal.id, &p, persisted),
            proposal,
        })
    }

    /// Replace the proposal's items with `submitted`.
    ///
    /// The proposal row is locked for the whole read-diff-write cycle. Nothing
    /// is written if the proposal is missing or any store call fails.
    #[instrument(skip(self, submitted), fields(proposal_id = %proposal_id, submitted = submitted.len()), err)]
    pub async fn reconcile_items(
        &self,
        proposal_id: ProposalId,
        submitted: &[SubmittedItem],
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut tx = self.store.begin().await?;
        if tx.find_proposal_for_update(proposal_id).await?.is_none() {
            return Err(ReconcileError::ProposalNotFound(proposal_id));
        }

        let existing = tx.list_proposal_items(proposal_id).await?;
        let p = plan(proposal_id, &existing, submitted, ProposalItemId::new);
        for f in &p.failures {
            tracing::warn!(index = f.index, item = %f.name, reason = %f.reason, "item rejected");
        }

        apply(&mut tx, &p).await?;
        tx.touch_proposal(proposal_id, Utc::now()).await?;
        let persisted = tx.list_proposal_items(proposal_id).await?;
        tx.commit().await?;

        let outcome = ReconcileOutcome::from_plan(proposal_id, &p, persisted);
        tracing::info!(
            created = outcome.created,
            updated = outcome.updated,
            deleted = outcome.deleted,
            rejected = outcome.failures.len(),
            "items reconciled"
        );
        Ok(outcome)
    }

    pub async fn get(&self, id: ProposalId) -> Result<Proposal, ReconcileError> {
        self.store
            .find_proposal(id)
            .await?
            .ok_or(ReconcileError::ProposalNotFound(id))
    }

    pub async fn list_by_company(
        &self,
        company_id: CompanyId,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<Proposal>, ReconcileError> {
        Ok(self.store.list_proposals(company_id, status).await?)
    }

    pub async fn list_items(&self, id: ProposalId) -> Result<Vec<ProposalItem>, ReconcileError> {
        if self.store.find_proposal(id).await?.is_none() {
            return Err(ReconcileError::ProposalNotFound(id));
        }
        Ok(self.store.list_proposal_items(id).await?)
    }

    /// Proposals for one client, newest first.
    pub async fn list_by_client(&self, client_id: ClientId) -> Result<Vec<Proposal>, ReconcileError> {
        Ok(self.store.list_proposals_by_client(client_id).await?)
    }

    /// Edit the proposal's own fields. Owner company, client and items are untouched.
    #[instrument(skip(self, changes), fields(proposal_id = %id), err)]
    pub async fn update(
        &self,
        id: ProposalId,
        changes: ProposalChanges,
    ) -> Result<Proposal, ReconcileError> {
        let mut tx = self.store.begin().await?;
        let mut proposal = tx
            .find_proposal_for_update(id)
            .await?
            .ok_or(ReconcileError::ProposalNotFound(id))?;
        proposal.apply(changes, Utc::now())?;
        if !tx.update_proposal(&proposal).await? {
            return Err(ReconcileError::ProposalNotFound(id));
        }
        tx.commit().await?;
        Ok(proposal)
    }

    /// Delete a proposal and all of its items.
    #[instrument(skip(self), fields(proposal_id = %id), err)]
    pub async fn delete(&self, id: ProposalId) -> Result<(), ReconcileError> {
        let mut tx = self.store.begin().await?;
        if tx.find_proposal_for_update(id).await?.is_none() {
            return Err(ReconcileError::ProposalNotFound(id));
        }
        tx.delete_proposal(id).await?;
        tx.commit().await?;
        tracing::info!("proposal deleted");
        Ok(())
    }

    /// `status` is parsed strictly: one of Draft, Sent, Approved, Rejected.
    #[instrument(skip(self), err)]
    pub async fn update_status(
        &self,
        id: ProposalId,
        status: &str,
    ) -> Result<Proposal, ReconcileError> {
        let status: ProposalStatus = status.parse()?;
        let mut tx = self.store.begin().await?;
        if !tx.update_proposal_status(id, status, Utc::now()).await? {
            return Err(ReconcileError::ProposalNotFound(id));
        }
        let proposal = tx
            .find_proposal_for_update(id)
            .await?
            .ok_or(ReconcileError::ProposalNotFound(id))?;
        tx.commit().await?;
        Ok(proposal)
    }
}

async fn apply<T: RecordTx>(tx: &mut T, plan: &ReconcilePlan) -> Result<(), StoreError> {
    for item in plan.updates.iter().chain(&plan.inserts) {
        tx.upsert_proposal_item(item).await?;
    }
    for id in &plan.deletes {
        tx.delete_proposal_item(*id).await?;
    }
    Ok(())
}
