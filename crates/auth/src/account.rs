//! Company and user account records as the login flow sees them.
//!
//! These are plain records: provisioning and persistence live outside this
//! crate. Writes happen through [`UserChanges`] and the administrative
//! password reset (see [`crate::password`]).

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use autoproposal_core::{CompanyId, DomainError, DomainResult, Entity, UserId};

/// A company using the system. Its name is the secondary login key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub industry_type: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Company {
    /// Build a company with only the required fields set.
    pub fn new(id: CompanyId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("company name must not be empty"));
        }
        Ok(Self {
            id,
            name,
            industry_type: None,
            contact_person: None,
            email: None,
            phone: None,
            city: None,
            country: None,
            logo_url: None,
        })
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &CompanyId {
        &self.id
    }
}

/// A user belonging to exactly one company.
///
/// # Invariants
/// - `company_id` never changes after provisioning.
/// - A user without `password_hash` can never authenticate.
/// - `password_hash` is never serialized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub company_id: CompanyId,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub access_end_date: Option<NaiveDate>,
}

fn default_role() -> String {
    "User".to_string()
}

impl UserAccount {
    /// Build an active user with no password and no access expiry.
    pub fn new(
        id: UserId,
        company_id: CompanyId,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> DomainResult<Self> {
        let email = email.into();
        if !looks_like_email(&email) {
            return Err(DomainError::validation(format!("invalid email address '{email}'")));
        }
        Ok(Self {
            id,
            company_id,
            full_name: full_name.into(),
            email,
            designation: None,
            role: default_role(),
            password_hash: None,
            active: true,
            access_end_date: None,
        })
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// Apply an edit. The whole edit is checked before any field changes.
    pub fn apply(&mut self, changes: UserChanges) -> DomainResult<()> {
        if let Some(email) = &changes.email {
            if !looks_like_email(email) {
                return Err(DomainError::validation(format!("invalid email address '{email}'")));
            }
        }
        if changes.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::validation("full name must not be empty"));
        }
        if changes.role.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(DomainError::validation("role must not be empty"));
        }

        if let Some(full_name) = changes.full_name {
            self.full_name = full_name.trim().to_string();
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(designation) = changes.designation {
            self.designation = Some(designation);
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(active) = changes.active {
            self.active = active;
        }
        if let Some(end) = changes.access_end_date {
            self.access_end_date = end;
        }
        Ok(())
    }
}

/// Partial edit of a user. Absent fields are left as they are.
///
/// `access_end_date` distinguishes absent (keep) from `null` (clear).
/// The password is not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub access_end_date: Option<Option<NaiveDate>>,
}

impl UserChanges {
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Hand-written so the hash never ends up in logs.
impl core::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("company_id", &self.company_id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("has_password", &self.has_password())
            .field("active", &self.active)
            .field("access_end_date", &self.access_end_date)
            .finish()
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// Minimal shape check: one `@`, non-empty local part, a dot in the domain.
pub fn looks_like_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}
