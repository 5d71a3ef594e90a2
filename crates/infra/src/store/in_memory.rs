use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use autoproposal_auth::{Company, UserAccount};
use autoproposal_core::{ClientId, CompanyId, ProposalId, ProposalItemId, UserId};
use autoproposal_proposals::{BoqItem, Client, Proposal, ProposalItem, ProposalStatus};

use super::r#trait::{RecordStore, RecordTx, StoreError};

#[derive(Debug, Clone, Default)]
struct Tables {
    companies: HashMap<CompanyId, Company>,
    users: HashMap<UserId, UserAccount>,
    clients: HashMap<ClientId, Client>,
    proposals: HashMap<ProposalId, Proposal>,
    /// Per proposal, in insertion order.
    items: HashMap<ProposalId, Vec<ProposalItem>>,
    boq_items: Vec<BoqItem>,
}

impl Tables {
    fn insert_user(&mut self, user: &UserAccount) -> Result<(), StoreError> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "user with email '{}' already exists",
                user.email
            )));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn items_of(&self, id: ProposalId) -> Vec<ProposalItem> {
        self.items.get(&id).cloned().unwrap_or_default()
    }
}

/// In-memory record store.
///
/// Intended for tests/dev. A transaction holds the table lock for its whole
/// life and works on a private copy that replaces the tables on commit, so
/// transactions are fully serialised.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx { guard, working })
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.tables.lock().await.companies.get(&id).cloned())
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.companies.values().find(|c| c.name == name).cloned())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().await;
        Ok(match t.users.get_mut(&id) {
            Some(u) => {
                u.password_hash = Some(hash.to_string());
                true
            }
            None => false,
        })
    }

    async fn update_user(&self, user: &UserAccount) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "user with email '{}' already exists",
                user.email
            )));
        }
        Ok(match t.users.get_mut(&user.id) {
            Some(stored) => {
                let hash = stored.password_hash.take();
                *stored = UserAccount {
                    password_hash: hash,
                    company_id: stored.company_id,
                    ..user.clone()
                };
                true
            }
            None => false,
        })
    }

    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        if t.companies.values().any(|c| c.name == company.name) {
            return Err(StoreError::Conflict(format!(
                "company '{}' already exists",
                company.name
            )));
        }
        t.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn insert_user(&self, user: &UserAccount) -> Result<(), StoreError> {
        self.tables.lock().await.insert_user(user)
    }

    async fn insert_client(&self, client: &Client) -> Result<(), StoreError> {
        self.tables.lock().await.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.tables.lock().await.clients.get(&id).cloned())
    }

    async fn list_clients(
        &self,
        company_id: CompanyId,
        active: Option<bool>,
    ) -> Result<Vec<Client>, StoreError> {
        let t = self.tables.lock().await;
        let mut out: Vec<Client> = t
            .clients
            .values()
            .filter(|c| c.company_id == company_id)
            .filter(|c| active.is_none_or(|a| c.active == a))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.id);
        Ok(out)
    }

    async fn find_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        Ok(self.tables.lock().await.proposals.get(&id).cloned())
    }

    async fn list_proposals(
        &self,
        company_id: CompanyId,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<Proposal>, StoreError> {
        let t = self.tables.lock().await;
        let mut out: Vec<Proposal> = t
            .proposals
            .values()
            .filter(|p| p.company_id == company_id)
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn list_proposals_by_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<Proposal>, StoreError> {
        let t = self.tables.lock().await;
        let mut out: Vec<Proposal> = t
            .proposals
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn list_proposal_items(&self, id: ProposalId) -> Result<Vec<ProposalItem>, StoreError> {
        Ok(self.tables.lock().await.items_of(id))
    }

    async fn list_boq_items(
        &self,
        company_id: CompanyId,
        project_type: Option<&str>,
    ) -> Result<Vec<BoqItem>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.boq_items
            .iter()
            .filter(|b| b.company_id == company_id)
            .filter(|b| project_type.is_none_or(|pt| b.project_type.as_deref() == Some(pt)))
            .cloned()
            .collect())
    }

    async fn list_project_types(&self, company_id: CompanyId) -> Result<Vec<String>, StoreError> {
        let t = self.tables.lock().await;
        let types: BTreeSet<String> = t
            .boq_items
            .iter()
            .filter(|b| b.company_id == company_id)
            .filter_map(|b| b.project_type.clone())
            .filter(|pt| !pt.is_empty())
            .collect();
        Ok(types.into_iter().collect())
    }
}

#[async_trait]
impl RecordTx for InMemoryTx {
    async fn find_company(&mut self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.working.companies.get(&id).cloned())
    }

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.working.clients.get(&id).cloned())
    }

    async fn find_proposal_for_update(
        &mut self,
        id: ProposalId,
    ) -> Result<Option<Proposal>, StoreError> {
        Ok(self.working.proposals.get(&id).cloned())
    }

    async fn insert_proposal(&mut self, proposal: &Proposal) -> Result<(), StoreError> {
        if self.working.proposals.contains_key(&proposal.id) {
            return Err(StoreError::Conflict(format!("proposal {} already exists", proposal.id)));
        }
        self.working.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn update_proposal_status(
        &mut self,
        id: ProposalId,
        status: ProposalStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(match self.working.proposals.get_mut(&id) {
            Some(p) => {
                p.status = status;
                p.updated_at = at;
                true
            }
            None => false,
        })
    }

    async fn touch_proposal(&mut self, id: ProposalId, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(p) = self.working.proposals.get_mut(&id) {
            p.updated_at = at;
        }
        Ok(())
    }

    async fn update_proposal(&mut self, proposal: &Proposal) -> Result<bool, StoreError> {
        Ok(match self.working.proposals.get_mut(&proposal.id) {
            Some(stored) => {
                *stored = Proposal {
                    company_id: stored.company_id,
                    client_id: stored.client_id,
                    created_at: stored.created_at,
                    ..proposal.clone()
                };
                true
            }
            None => false,
        })
    }

    async fn delete_proposal(&mut self, id: ProposalId) -> Result<bool, StoreError> {
        self.working.items.remove(&id);
        Ok(self.working.proposals.remove(&id).is_some())
    }

    async fn list_proposal_items(
        &mut self,
        id: ProposalId,
    ) -> Result<Vec<ProposalItem>, StoreError> {
        Ok(self.working.items_of(id))
    }

    async fn upsert_proposal_item(&mut self, item: &ProposalItem) -> Result<(), StoreError> {
        if !self.working.proposals.contains_key(&item.proposal_id) {
            return Err(StoreError::NotFound(format!("proposal {}", item.proposal_id)));
        }
        let rows = self.working.items.entry(item.proposal_id).or_default();
        match rows.iter_mut().find(|r| r.id == item.id) {
            Some(row) => *row = item.clone(),
            None => rows.push(item.clone()),
        }
        Ok(())
    }

    async fn delete_proposal_item(&mut self, id: ProposalItemId) -> Result<bool, StoreError> {
        for rows in self.working.items.values_mut() {
            if let Some(pos) = rows.iter().position(|r| r.id == id) {
                rows.remove(pos);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn insert_boq_item(&mut self, item: &BoqItem) -> Result<(), StoreError> {
        self.working.boq_items.push(item.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use autoproposal_core::Amount;

    fn test_company() -> Company {
        Company::new(CompanyId::new(), "Acme Interiors").unwrap()
    }

    fn proposal_for(company_id: CompanyId, title: &str, created_at: DateTime<Utc>) -> Proposal {
        Proposal {
            id: ProposalId::new(),
            company_id,
            client_id: ClientId::new(),
            title: title.to_string(),
            description: None,
            amount: Amount::ZERO,
            status: ProposalStatus::Draft,
            project_type: None,
            area: None,
            material_preferences: None,
            special_requirement: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn item_for(proposal_id: ProposalId, name: &str) -> ProposalItem {
        ProposalItem {
            id: ProposalItemId::new(),
            proposal_id,
            name: name.to_string(),
            description: None,
            unit: None,
            quantity: Amount::new(1.0, "quantity").unwrap(),
            unit_price: Amount::new(2.0, "unit_price").unwrap(),
        }
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = InMemoryRecordStore::new();
        let p = proposal_for(CompanyId::new(), "Kitchen", Utc::now());

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_proposal(&p).await.unwrap();
        }

        assert!(store.find_proposal(p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = InMemoryRecordStore::new();
        let p = proposal_for(CompanyId::new(), "Kitchen", Utc::now());
        let item = item_for(p.id, "Tiles");

        let mut tx = store.begin().await.unwrap();
        tx.insert_proposal(&p).await.unwrap();
        tx.upsert_proposal_item(&item).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.list_proposal_items(p.id).await.unwrap(), vec![item]);
    }

    #[tokio::test]
    async fn item_without_parent_proposal_is_rejected() {
        let store = InMemoryRecordStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx
            .upsert_proposal_item(&item_for(ProposalId::new(), "Orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryRecordStore::new();
        let company = test_company();
        store.insert_company(&company).await.unwrap();

        let a = UserAccount::new(UserId::new(), company.id, "A", "a@acme.com").unwrap();
        let b = UserAccount::new(UserId::new(), company.id, "B", "a@acme.com").unwrap();
        store.insert_user(&a).await.unwrap();
        assert!(matches!(store.insert_user(&b).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn proposals_list_newest_first_with_status_filter() {
        let store = InMemoryRecordStore::new();
        let company_id = CompanyId::new();
        let t0 = Utc::now();
        let older = proposal_for(company_id, "Older", t0 - chrono::Duration::days(1));
        let mut newer = proposal_for(company_id, "Newer", t0);
        newer.status = ProposalStatus::Sent;
        let other = proposal_for(CompanyId::new(), "Elsewhere", t0);

        let mut tx = store.begin().await.unwrap();
        for p in [&older, &newer, &other] {
            tx.insert_proposal(p).await.unwrap();
        }
        tx.commit().await.unwrap();

        let all = store.list_proposals(company_id, None).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        let sent = store
            .list_proposals(company_id, Some(ProposalStatus::Sent))
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, newer.id);
    }

    #[tokio::test]
    async fn set_password_hash_reports_unknown_user() {
        let store = InMemoryRecordStore::new();
        assert!(!store.set_password_hash(UserId::new(), "$argon2id$x").await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_proposal_takes_its_items_along() {
        let store = InMemoryRecordStore::new();
        let p = proposal_for(CompanyId::new(), "Kitchen", Utc::now());
        let item = item_for(p.id, "Tiles");

        let mut tx = store.begin().await.unwrap();
        tx.insert_proposal(&p).await.unwrap();
        tx.upsert_proposal_item(&item).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.delete_proposal(p.id).await.unwrap());
        assert!(!tx.delete_proposal(p.id).await.unwrap());
        tx.commit().await.unwrap();

        assert!(store.find_proposal(p.id).await.unwrap().is_none());
        assert!(store.list_proposal_items(p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_user_keeps_hash_and_guards_email() {
        let store = InMemoryRecordStore::new();
        let company = test_company();
        store.insert_company(&company).await.unwrap();

        let mut a = UserAccount::new(UserId::new(), company.id, "A", "a@acme.com").unwrap();
        a.password_hash = Some("$argon2id$a".into());
        let b = UserAccount::new(UserId::new(), company.id, "B", "b@acme.com").unwrap();
        store.insert_user(&a).await.unwrap();
        store.insert_user(&b).await.unwrap();

        let mut edited = a.clone();
        edited.password_hash = None;
        edited.active = false;
        assert!(store.update_user(&edited).await.unwrap());
        let stored = store.find_user(a.id).await.unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(stored.password_hash.as_deref(), Some("$argon2id$a"));

        let mut stolen = b.clone();
        stolen.email = "a@acme.com".into();
        assert!(matches!(store.update_user(&stolen).await, Err(StoreError::Conflict(_))));

        let ghost = UserAccount::new(UserId::new(), company.id, "G", "g@acme.com").unwrap();
        assert!(!store.update_user(&ghost).await.unwrap());
    }
}
