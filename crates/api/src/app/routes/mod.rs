use axum::Router;

use autoproposal_infra::RecordStore;

pub mod admin;
pub mod auth;
pub mod boq;
pub mod proposals;
pub mod system;

/// Router for every endpoint except `/health`.
pub fn router<S: RecordStore>() -> Router {
    Router::new()
        .nest("/auth", auth::router::<S>())
        .merge(admin::router::<S>())
        .nest("/proposals", proposals::router::<S>())
        .nest("/boq-items", boq::router::<S>())
}
