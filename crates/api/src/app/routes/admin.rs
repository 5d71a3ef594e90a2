use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use autoproposal_auth::UserChanges;
use autoproposal_core::{ClientId, CompanyId, UserId};
use autoproposal_infra::RecordStore;

use crate::app::services::Services;
use crate::app::{dto, errors};

/// Provisioning endpoints.
pub fn router<S: RecordStore>() -> Router {
    Router::new()
        .route("/companies", post(create_company::<S>))
        .route("/users", post(create_user::<S>))
        .route("/users/:id", get(get_user::<S>).put(update_user::<S>))
        .route("/users/:id/activate", patch(activate_user::<S>))
        .route("/users/:id/deactivate", patch(deactivate_user::<S>))
        .route("/clients", post(create_client::<S>))
        .route("/clients/:id", get(get_client::<S>))
        .route("/clients/company/:company_id", get(list_clients::<S>))
}

pub async fn create_company<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<dto::CreateCompanyRequest>,
) -> axum::response::Response {
    match services.accounts.create_company(body.into()).await {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_user<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&body.company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.create_user(body.into_new_user(company_id)).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_client<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<dto::CreateClientRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&body.company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.create_client(body.into_new_client(company_id)).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.get_user(id).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_user<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
    Json(body): Json<UserChanges>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.update_user(id, body).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn activate_user<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    toggle_user(&services, &id, true).await
}

pub async fn deactivate_user<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    toggle_user(&services, &id, false).await
}

async fn toggle_user<S: RecordStore>(
    services: &Services<S>,
    id: &str,
    active: bool,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.set_active(id, active).await {
        Ok(user) => {
            let verb = if active { "activated" } else { "deactivated" };
            let body = serde_json::json!({
                "message": format!("User {verb} successfully"),
                "user": dto::user_to_json(&user),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_client<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match errors::parse_id(&id, "client") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.get_client(id).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_clients<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(company_id): Path<String>,
    Query(filter): Query<dto::ClientListQuery>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.list_clients(company_id, filter.is_active).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
