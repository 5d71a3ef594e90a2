use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use autoproposal_auth::LoginRequest;
use autoproposal_core::UserId;
use autoproposal_infra::RecordStore;

use crate::app::services::Services;
use crate::app::{dto, errors};

pub fn router<S: RecordStore>() -> Router {
    Router::new()
        .route("/login", post(login::<S>))
        .route("/set-password/:user_id", post(set_password::<S>))
}

pub async fn login<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match services.accounts.login(&body, Utc::now()).await {
        Ok(grant) => (StatusCode::OK, Json(dto::login_grant_to_json(&grant))).into_response(),
        Err(e) => errors::login_error_to_response(e),
    }
}

pub async fn set_password<S: RecordStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Path(user_id): Path<String>,
    Json(body): Json<dto::SetPasswordRequest>,
) -> axum::response::Response {
    let user_id: UserId = match errors::parse_id(&user_id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.accounts.set_password(user_id, &body.password).await {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": format!("Password set successfully for user {}", user.email),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
