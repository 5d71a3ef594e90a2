use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use autoproposal_auth::{LoginError, LoginFailureKind, PasswordError};
use autoproposal_core::DomainError;
use autoproposal_infra::{ReconcileError, ServiceError, StoreError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let msg = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        StoreError::Storage(msg) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Password(PasswordError::Empty) => json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            PasswordError::Empty.to_string(),
        ),
        ServiceError::Password(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "password_error", e.to_string())
        }
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn reconcile_error_to_response(err: ReconcileError) -> axum::response::Response {
    match err {
        ReconcileError::ProposalNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "proposal_not_found", err.to_string())
        }
        ReconcileError::Domain(e) => domain_error_to_response(e),
        ReconcileError::Store(e) => store_error_to_response(e),
    }
}

/// Login failures keep the `success`/`error_code` envelope clients already parse.
pub fn login_error_to_response(err: LoginError) -> axum::response::Response {
    let status = match err.kind() {
        LoginFailureKind::NotFound => StatusCode::NOT_FOUND,
        LoginFailureKind::Forbidden => StatusCode::FORBIDDEN,
        LoginFailureKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        LoginFailureKind::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
        LoginFailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": err.code(),
            "error_code": err.code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

pub fn parse_id<T: core::str::FromStr>(
    raw: &str,
    what: &'static str,
) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
