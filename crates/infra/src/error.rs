use thiserror::Error;

use autoproposal_auth::PasswordError;
use autoproposal_core::DomainError;

use crate::store::StoreError;

/// Failure of an account or catalog operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
