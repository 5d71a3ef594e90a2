//! `autoproposal-auth`: account model and login authorization.
//!
//! No HTTP and no storage here: lookups go through [`AccountDirectory`].

pub mod account;
pub mod login;
pub mod password;

pub use account::{Company, UserAccount, UserChanges, looks_like_email};
pub use login::{
    AccountDirectory, DirectoryError, EXPIRY_ADVISORY_DAYS, LoginError, LoginFailureKind,
    LoginGrant, LoginRequest, authorize,
};
pub use password::{PasswordError, hash_password, verify_password};
