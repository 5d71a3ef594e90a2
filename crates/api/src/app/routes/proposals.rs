use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use autoproposal_core::{ClientId, CompanyId, ProposalId};
use autoproposal_infra::RecordStore;
use autoproposal_proposals::{ProposalChanges, ProposalStatus};

use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: RecordStore>() -> Router {
    Router::new()
        .route("/", post(create_proposal::<S>))
        .route("/company/:company_id", get(list_by_company::<S>))
        .route("/client/:client_id", get(list_by_client::<S>))
        .route(
            "/:id",
            get(get_proposal::<S>)
                .put(update_proposal::<S>)
                .delete(delete_proposal::<S>),
        )
        .route("/:id/status/:status", patch(update_status::<S>))
        .route("/:id/items", get(list_items::<S>).put(replace_items::<S>))
}

pub async fn create_proposal<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<dto::CreateProposalRequest>,
) -> axum::response::Response {
    match services
        .proposals
        .create_proposal(body.proposal, &body.items)
        .await
    {
        Ok(created) => {
            (StatusCode::CREATED, Json(dto::created_proposal_to_json(&created))).into_response()
        }
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn get_proposal<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProposalId = match errors::parse_id(&id, "proposal") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.get(id).await {
        Ok(p) => (StatusCode::OK, Json(p)).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn list_by_company<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(company_id): Path<String>,
    Query(filter): Query<dto::StatusFilter>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match filter.status.as_deref().map(str::parse::<ProposalStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.proposals.list_by_company(company_id, status).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn update_status<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path((id, status)): Path<(String, String)>,
) -> axum::response::Response {
    let id: ProposalId = match errors::parse_id(&id, "proposal") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.update_status(id, &status).await {
        Ok(p) => (StatusCode::OK, Json(p)).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn list_items<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProposalId = match errors::parse_id(&id, "proposal") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.list_items(id).await {
        Ok(items) => {
            let items = items.iter().map(dto::item_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

/// Replace the whole item list; the response lists per-item rejections.
pub async fn replace_items<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReplaceItemsRequest>,
) -> axum::response::Response {
    let id: ProposalId = match errors::parse_id(&id, "proposal") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.reconcile_items(id, &body.items).await {
        Ok(outcome) => (StatusCode::OK, Json(dto::outcome_to_json(&outcome))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn list_by_client<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(client_id): Path<String>,
) -> axum::response::Response {
    let client_id: ClientId = match errors::parse_id(&client_id, "client") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.list_by_client(client_id).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

/// Edit header fields; items go through `PUT /:id/items`.
pub async fn update_proposal<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
    Json(body): Json<ProposalChanges>,
) -> axum::response::Response {
    let id: ProposalId = match errors::parse_id(&id, "proposal") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.update(id, body).await {
        Ok(p) => (StatusCode::OK, Json(p)).into_response(),
        Err(e) => errors::reconcile_error_to_response(e),
    }
}

pub async fn delete_proposal<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProposalId = match errors::parse_id(&id, "proposal") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.proposals.delete(id).await {
        Ok(()) => {
            let body = serde_json::json!({
                "success": true,
                "message": format!("Proposal with ID {id} deleted successfully"),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::reconcile_error_to_response(e),
    }
}
