use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use autoproposal_auth::{Company, UserAccount};
use autoproposal_core::{ClientId, CompanyId, ProposalId, ProposalItemId, UserId};
use autoproposal_proposals::{BoqItem, Client, Proposal, ProposalItem, ProposalStatus};

/// Storage-level failure. Domain rules are checked before a store is called.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    type Tx: RecordTx;

    /// Open a transaction. Dropping it without [`RecordTx::commit`] rolls back.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError>;
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Overwrite the stored hash. Returns `false` if the user does not exist.
    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<bool, StoreError>;
    /// Save profile and access fields; the hash is left alone. Returns
    /// `false` if the user does not exist, [`StoreError::Conflict`] if the
    /// email belongs to another user.
    async fn update_user(&self, user: &UserAccount) -> Result<bool, StoreError>;

    async fn insert_company(&self, company: &Company) -> Result<(), StoreError>;
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: &UserAccount) -> Result<(), StoreError>;
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError>;
    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;
    async fn list_clients(
        &self,
        company_id: CompanyId,
        active: Option<bool>,
    ) -> Result<Vec<Client>, StoreError>;

    async fn find_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError>;
    /// Newest first.
    async fn list_proposals(
        &self,
        company_id: CompanyId,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<Proposal>, StoreError>;
    /// Newest first.
    async fn list_proposals_by_client(&self, client_id: ClientId)
    -> Result<Vec<Proposal>, StoreError>;
    async fn list_proposal_items(&self, id: ProposalId) -> Result<Vec<ProposalItem>, StoreError>;

    async fn list_boq_items(
        &self,
        company_id: CompanyId,
        project_type: Option<&str>,
    ) -> Result<Vec<BoqItem>, StoreError>;
    /// Distinct non-empty project types, sorted.
    async fn list_project_types(&self, company_id: CompanyId) -> Result<Vec<String>, StoreError>;
}

/// Writes and locking reads scoped to one transaction.
#[async_trait]
pub trait RecordTx: Send + Sized {
    async fn find_company(&mut self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError>;

    /// Load the proposal and hold it against concurrent reconciliation until commit.
    async fn find_proposal_for_update(
        &mut self,
        id: ProposalId,
    ) -> Result<Option<Proposal>, StoreError>;
    async fn insert_proposal(&mut self, proposal: &Proposal) -> Result<(), StoreError>;
    /// Returns `false` if the proposal does not exist.
    async fn update_proposal_status(
        &mut self,
        id: ProposalId,
        status: ProposalStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    async fn touch_proposal(&mut self, id: ProposalId, at: DateTime<Utc>) -> Result<(), StoreError>;
    /// Overwrite the editable fields. Returns `false` if the proposal does not exist.
    async fn update_proposal(&mut self, proposal: &Proposal) -> Result<bool, StoreError>;
    /// Delete the proposal together with its items.
    async fn delete_proposal(&mut self, id: ProposalId) -> Result<bool, StoreError>;

    async fn list_proposal_items(&mut self, id: ProposalId)
    -> Result<Vec<ProposalItem>, StoreError>;
    async fn upsert_proposal_item(&mut self, item: &ProposalItem) -> Result<(), StoreError>;
    async fn delete_proposal_item(&mut self, id: ProposalItemId) -> Result<bool, StoreError>;

    async fn insert_boq_item(&mut self, item: &BoqItem) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
