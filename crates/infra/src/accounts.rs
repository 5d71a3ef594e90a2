//! Login and account provisioning over a [`RecordStore`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use autoproposal_auth::{
    AccountDirectory, Company, DirectoryError, LoginError, LoginGrant, LoginRequest, UserAccount,
    UserChanges, authorize, hash_password,
};
use autoproposal_core::{ClientId, CompanyId, DomainError, UserId};
use autoproposal_proposals::Client;

use crate::error::ServiceError;
use crate::store::RecordStore;

/// Read-only view of a store as the login chain sees it.
struct StoreDirectory<'a, S>(&'a S);

#[async_trait]
impl<S: RecordStore> AccountDirectory for StoreDirectory<'_, S> {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, DirectoryError> {
        self.0
            .find_company_by_name(name)
            .await
            .map_err(|e| DirectoryError(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, DirectoryError> {
        self.0
            .find_user_by_email(email)
            .await
            .map_err(|e| DirectoryError(e.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub industry_type: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Clone)]
pub struct NewUser {
    pub company_id: CompanyId,
    pub full_name: String,
    pub email: String,
    pub designation: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub access_end_date: Option<chrono::NaiveDate>,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("company_id", &self.company_id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub company_id: CompanyId,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
}

pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S: RecordStore> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run the login chain as of `now`.
    pub async fn login(
        &self,
        request: &LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<LoginGrant, LoginError> {
        authorize(&StoreDirectory(self.store.as_ref()), request, now).await
    }

    /// Replace a user's password. Returns the user on success.
    ///
    /// Looks the user up before hashing.
    #[instrument(skip(self, password), fields(user_id = %user_id), err)]
    pub async fn set_password(
        &self,
        user_id: UserId,
        password: &str,
    ) -> Result<UserAccount, ServiceError> {
        let mut user = self.get_user(user_id).await?;
        let hash = hash_password(password)?;
        if !self.store.set_password_hash(user_id, &hash).await? {
            return Err(DomainError::not_found(format!("user {user_id}")).into());
        }
        user.password_hash = Some(hash);
        tracing::info!(email = %user.email, "password updated");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserAccount, ServiceError> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {user_id}")))?)
    }

    /// Edit profile and access fields (`active`, `access_end_date` included).
    #[instrument(skip(self, changes), fields(user_id = %user_id), err)]
    pub async fn update_user(
        &self,
        user_id: UserId,
        changes: UserChanges,
    ) -> Result<UserAccount, ServiceError> {
        let mut user = self.get_user(user_id).await?;
        user.apply(changes)?;
        if !self.store.update_user(&user).await? {
            return Err(DomainError::not_found(format!("user {user_id}")).into());
        }
        tracing::info!(
            active = user.active,
            access_end_date = ?user.access_end_date,
            "user updated"
        );
        Ok(user)
    }

    /// Activate or deactivate an account. A deactivated account fails login
    /// with `ACCOUNT_INACTIVE` even with the right password.
    pub async fn set_active(
        &self,
        user_id: UserId,
        active: bool,
    ) -> Result<UserAccount, ServiceError> {
        self.update_user(user_id, UserChanges::active(active)).await
    }

    #[instrument(skip(self, new_company), fields(name = %new_company.name), err)]
    pub async fn create_company(&self, new_company: NewCompany) -> Result<Company, ServiceError> {
        let mut company = Company::new(CompanyId::new(), new_company.name.trim())?;
        company.industry_type = new_company.industry_type;
        company.contact_person = new_company.contact_person;
        company.email = new_company.email;
        company.phone = new_company.phone;
        company.city = new_company.city;
        company.country = new_company.country;
        company.logo_url = new_company.logo_url;
        self.store.insert_company(&company).await?;
        Ok(company)
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email), err)]
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserAccount, ServiceError> {
        if self.store.find_company(new_user.company_id).await?.is_none() {
            return Err(DomainError::not_found(format!("company {}", new_user.company_id)).into());
        }
        let mut user = UserAccount::new(
            UserId::new(),
            new_user.company_id,
            new_user.full_name,
            new_user.email,
        )?;
        user.designation = new_user.designation;
        if let Some(role) = new_user.role {
            user.role = role;
        }
        user.access_end_date = new_user.access_end_date;
        if let Some(pw) = new_user.password.as_deref() {
            user.password_hash = Some(hash_password(pw)?);
        }
        self.store.insert_user(&user).await?;
        Ok(user)
    }

    #[instrument(skip(self, new_client), fields(company_id = %new_client.company_id), err)]
    pub async fn create_client(&self, new_client: NewClient) -> Result<Client, ServiceError> {
        if self.store.find_company(new_client.company_id).await?.is_none() {
            return Err(DomainError::not_found(format!("company {}", new_client.company_id)).into());
        }
        let mut client = Client::new(ClientId::new(), new_client.company_id, new_client.name.trim())?;
        client.email = new_client.email;
        client.mobile = new_client.mobile;
        client.address = new_client.address;
        self.store.insert_client(&client).await?;
        Ok(client)
    }

    pub async fn get_client(&self, client_id: ClientId) -> Result<Client, ServiceError> {
        Ok(self
            .store
            .find_client(client_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("client {client_id}")))?)
    }

    /// Clients of one company, optionally only active or only inactive ones.
    pub async fn list_clients(
        &self,
        company_id: CompanyId,
        active: Option<bool>,
    ) -> Result<Vec<Client>, ServiceError> {
        Ok(self.store.list_clients(company_id, active).await?)
    }
}
