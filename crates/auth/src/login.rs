//! Login authorization: an ordered, fail-fast validation chain.
//!
//! Checks run in this order and the first failure wins:
//! company, user, company association, password present, password match,
//! active flag, access end date.
//!
//! The authorizer reads through [`AccountDirectory`] and never writes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::account::{Company, UserAccount};
use crate::password::verify_password;

/// Remaining days at or below which a successful login carries an expiry advisory.
pub const EXPIRY_ADVISORY_DAYS: i64 = 7;

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub company_name: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("company_name", &self.company_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Coarse classification of login failures, independent of any transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailureKind {
    NotFound,
    Forbidden,
    Unauthenticated,
    Misconfigured,
    Unavailable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("Company '{0}' not found")]
    CompanyNotFound(String),

    #[error("User with email '{0}' not found")]
    UserNotFound(String),

    #[error("User does not belong to company '{0}'")]
    CompanyMismatch(String),

    #[error("Password not set for this user. Please contact administrator.")]
    NoPasswordSet,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("User account is deactivated. Please contact administrator.")]
    AccountInactive,

    #[error("Access expired on {0}. Please renew subscription.")]
    AccessExpired(NaiveDate),

    #[error("account directory unavailable: {0}")]
    Directory(String),
}

impl LoginError {
    /// Stable wire code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            LoginError::CompanyNotFound(_) => "INVALID_COMPANY",
            LoginError::UserNotFound(_) => "INVALID_USER",
            LoginError::CompanyMismatch(_) => "COMPANY_MISMATCH",
            LoginError::NoPasswordSet => "NO_PASSWORD",
            LoginError::InvalidPassword => "INVALID_PASSWORD",
            LoginError::AccountInactive => "ACCOUNT_INACTIVE",
            LoginError::AccessExpired(_) => "ACCESS_EXPIRED",
            LoginError::Directory(_) => "DIRECTORY_UNAVAILABLE",
        }
    }

    pub fn kind(&self) -> LoginFailureKind {
        match self {
            LoginError::CompanyNotFound(_) | LoginError::UserNotFound(_) => {
                LoginFailureKind::NotFound
            }
            LoginError::CompanyMismatch(_)
            | LoginError::AccountInactive
            | LoginError::AccessExpired(_) => LoginFailureKind::Forbidden,
            LoginError::InvalidPassword => LoginFailureKind::Unauthenticated,
            LoginError::NoPasswordSet => LoginFailureKind::Misconfigured,
            LoginError::Directory(_) => LoginFailureKind::Unavailable,
        }
    }
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginGrant {
    pub user: UserAccount,
    pub company: Company,
    pub access_granted: bool,
    pub access_end_date: Option<NaiveDate>,
    /// Days left when access ends within [`EXPIRY_ADVISORY_DAYS`].
    pub expires_in_days: Option<i64>,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DirectoryError(pub String);

/// Read-only lookups the authorizer needs.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, DirectoryError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, DirectoryError>;
}

/// Run the login chain against `directory` as of `now`.
#[instrument(
    skip(directory, request, now),
    fields(company = %request.company_name, email = %request.email),
    err(Display)
)]
pub async fn authorize<D>(
    directory: &D,
    request: &LoginRequest,
    now: DateTime<Utc>,
) -> Result<LoginGrant, LoginError>
where
    D: AccountDirectory + ?Sized,
{
    let company = directory
        .find_company_by_name(&request.company_name)
        .await
        .map_err(|e| LoginError::Directory(e.0))?
        .ok_or_else(|| LoginError::CompanyNotFound(request.company_name.clone()))?;

    let user = directory
        .find_user_by_email(&request.email)
        .await
        .map_err(|e| LoginError::Directory(e.0))?
        .ok_or_else(|| LoginError::UserNotFound(request.email.clone()))?;

    if user.company_id != company.id {
        return Err(LoginError::CompanyMismatch(request.company_name.clone()));
    }

    let stored_hash = match user.password_hash.as_deref() {
        Some(h) if !h.is_empty() => h,
        _ => return Err(LoginError::NoPasswordSet),
    };

    if !verify_password(&request.password, stored_hash) {
        return Err(LoginError::InvalidPassword);
    }

    if !user.active {
        return Err(LoginError::AccountInactive);
    }

    let expires_in_days = check_access_window(user.access_end_date, now.date_naive())?;
    let message = match expires_in_days {
        Some(days) => format!("Login successful. Access expires in {days} days."),
        None => "Login successful".to_string(),
    };

    tracing::info!(user_id = %user.id, company_id = %company.id, "login granted");

    Ok(LoginGrant {
        access_end_date: user.access_end_date,
        user,
        company,
        access_granted: true,
        expires_in_days,
        message,
    })
}

/// Expiry check on calendar dates. Returns the advisory day count, if any.
fn check_access_window(
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Option<i64>, LoginError> {
    let Some(end) = end else {
        return Ok(None);
    };
    if today > end {
        return Err(LoginError::AccessExpired(end));
    }
    let remaining = (end - today).num_days();
    Ok((remaining <= EXPIRY_ADVISORY_DAYS).then_some(remaining))
}
