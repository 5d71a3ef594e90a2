use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use autoproposal_auth::{LoginGrant, UserAccount};
use autoproposal_infra::{CreatedProposal, ImportOutcome, NewClient, NewCompany, NewUser, ReconcileOutcome};
use autoproposal_proposals::{
    BoqItem, BoqRow, ItemFailure, NewProposal, ProposalItem, Screened, SkippedRow, SubmittedItem,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub industry_type: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub logo_url: Option<String>,
}

impl From<CreateCompanyRequest> for NewCompany {
    fn from(r: CreateCompanyRequest) -> Self {
        NewCompany {
            name: r.name,
            industry_type: r.industry_type,
            contact_person: r.contact_person,
            email: r.email,
            phone: r.phone,
            city: r.city,
            country: r.country,
            logo_url: r.logo_url,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub company_id: String,
    pub full_name: String,
    pub email: String,
    pub designation: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub access_end_date: Option<NaiveDate>,
}

impl CreateUserRequest {
    pub fn into_new_user(self, company_id: autoproposal_core::CompanyId) -> NewUser {
        NewUser {
            company_id,
            full_name: self.full_name,
            email: self.email,
            designation: self.designation,
            role: self.role,
            password: self.password,
            access_end_date: self.access_end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub company_id: String,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
}

impl CreateClientRequest {
    pub fn into_new_client(self, company_id: autoproposal_core::CompanyId) -> NewClient {
        NewClient {
            company_id,
            name: self.name,
            email: self.email,
            mobile: self.mobile,
            address: self.address,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    #[serde(flatten)]
    pub proposal: NewProposal,
    #[serde(default)]
    pub items: Vec<SubmittedItem>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceItemsRequest {
    pub items: Vec<SubmittedItem>,
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub is_active: Option<bool>,
}

/// Body of both `/boq-items/import` and `/boq-items/import/preview`.
#[derive(Debug, Deserialize)]
pub struct BoqImportRequest {
    pub company_id: String,
    pub rows: Vec<BoqRow>,
}

#[derive(Debug, Deserialize)]
pub struct BoqListQuery {
    pub company_id: String,
    pub project_type: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(u: &UserAccount) -> serde_json::Value {
    json!({
        "id": u.id.to_string(),
        "company_id": u.company_id.to_string(),
        "full_name": u.full_name,
        "email": u.email,
        "designation": u.designation,
        "role": u.role,
        "active": u.active,
        "has_password": u.has_password(),
        "access_end_date": u.access_end_date,
    })
}

pub fn login_grant_to_json(g: &LoginGrant) -> serde_json::Value {
    json!({
        "success": true,
        "message": g.message,
        "user": user_to_json(&g.user),
        "company": g.company,
        "access_granted": g.access_granted,
        "access_end_date": g.access_end_date,
        "expires_in_days": g.expires_in_days,
    })
}

pub fn item_to_json(i: &ProposalItem) -> serde_json::Value {
    json!({
        "id": i.id.to_string(),
        "proposal_id": i.proposal_id.to_string(),
        "name": i.name,
        "description": i.description,
        "unit": i.unit,
        "quantity": i.quantity.value(),
        "unit_price": i.unit_price.value(),
        "total": i.total().ok().map(|t| t.value()),
    })
}

pub fn failure_to_json(f: &ItemFailure) -> serde_json::Value {
    json!({
        "index": f.index,
        "id": f.id.map(|id| id.to_string()),
        "name": f.name,
        "error": ItemFailure::KIND,
        "message": f.reason.to_string(),
    })
}

pub fn outcome_to_json(o: &ReconcileOutcome) -> serde_json::Value {
    json!({
        "proposal_id": o.proposal_id.to_string(),
        "items": o.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "created": o.created,
        "updated": o.updated,
        "deleted": o.deleted,
        "failures": o.failures.iter().map(failure_to_json).collect::<Vec<_>>(),
    })
}

pub fn created_proposal_to_json(c: &CreatedProposal) -> serde_json::Value {
    json!({
        "proposal": c.proposal,
        "items": c.outcome.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "failures": c.outcome.failures.iter().map(failure_to_json).collect::<Vec<_>>(),
    })
}

pub fn boq_to_json(b: &BoqItem) -> serde_json::Value {
    json!({
        "id": b.id.to_string(),
        "company_id": b.company_id.to_string(),
        "project_type": b.project_type,
        "title": b.title,
        "description": b.description,
        "unit": b.unit,
        "basic_rate": b.basic_rate.map(|r| r.value()),
        "premium_rate": b.premium_rate.map(|r| r.value()),
    })
}

pub fn import_to_json(o: &ImportOutcome) -> serde_json::Value {
    json!({
        "success": true,
        "message": o.message(),
        "total_imported": o.imported.len(),
        "items": o.imported.iter().map(boq_to_json).collect::<Vec<_>>(),
        "skipped": skipped_to_json(&o.skipped),
    })
}

pub fn preview_to_json(s: &Screened) -> serde_json::Value {
    json!({
        "success": true,
        "message": format!("Found {} valid rows to import", s.accepted.len()),
        "total_rows": s.accepted.len() + s.skipped.len(),
        "items": s.accepted.iter().map(boq_to_json).collect::<Vec<_>>(),
        "skipped": skipped_to_json(&s.skipped),
    })
}

fn skipped_to_json(skipped: &[SkippedRow]) -> Vec<serde_json::Value> {
    skipped
        .iter()
        .map(|s| json!({ "row": s.row, "reason": s.reason.to_string() }))
        .collect()
}
