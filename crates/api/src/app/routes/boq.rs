use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use autoproposal_core::CompanyId;
use autoproposal_infra::RecordStore;

use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: RecordStore>() -> Router {
    Router::new()
        .route("/", get(list_boq_items::<S>))
        .route("/import", post(import_rows::<S>))
        .route("/import/preview", post(preview_rows::<S>))
        .route("/project-types/:company_id", get(project_types::<S>))
}

pub async fn import_rows<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<dto::BoqImportRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&body.company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.import(company_id, &body.rows).await {
        Ok(outcome) => (StatusCode::CREATED, Json(dto::import_to_json(&outcome))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Screen rows as an import would, writing nothing.
pub async fn preview_rows<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<dto::BoqImportRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&body.company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.preview(company_id, &body.rows).await {
        Ok(screened) => (StatusCode::OK, Json(dto::preview_to_json(&screened))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_boq_items<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Query(q): Query<dto::BoqListQuery>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&q.company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.list(company_id, q.project_type.as_deref()).await {
        Ok(items) => {
            let items = items.iter().map(dto::boq_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn project_types<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(company_id): Path<String>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&company_id, "company") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.project_types(company_id).await {
        Ok(types) => (StatusCode::OK, Json(types)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
