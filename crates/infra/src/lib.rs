//! Infrastructure layer: record stores, transactional services, config.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod store;


pub use accounts::{AccountService, NewClient, NewCompany, NewUser};
pub use catalog::{BoqCatalogService, ImportOutcome};
pub use config::{AppConfig, ConfigError};
pub use error::ServiceError;
pub use reconciler::{CreatedProposal, ProposalService, ReconcileError, ReconcileOutcome};
pub use store::{InMemoryRecordStore, PostgresRecordStore, RecordStore, RecordTx, StoreError};
