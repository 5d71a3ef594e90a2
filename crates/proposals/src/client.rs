use serde::{Deserialize, Serialize};

use autoproposal_core::{ClientId, CompanyId, DomainError, DomainResult, Entity};

/// A customer of a company; proposals are addressed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub company_id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub active: bool,
}

impl Client {
    pub fn new(id: ClientId, company_id: CompanyId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("client name must not be empty"));
        }
        Ok(Self {
            id,
            company_id,
            name,
            email: None,
            mobile: None,
            address: None,
            active: true,
        })
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> &ClientId {
        &self.id
    }
}
