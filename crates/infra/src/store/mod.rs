//! Record store boundary.
//!
//! One trait pair covers everything the services persist: [`RecordStore`] for
//! autocommit reads and provisioning writes, [`RecordTx`] for work that must
//! be all-or-nothing (proposal creation, item reconciliation, BOQ import).

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use r#trait::{RecordStore, RecordTx, StoreError};
