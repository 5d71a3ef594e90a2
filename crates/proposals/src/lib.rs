//! `autoproposal-proposals`: proposals, their line items, and the BOQ catalog.
//!
//! Pure domain logic: no IO. The item reconciler here only plans; applying a
//! plan inside a transaction is done by the infra crate.

pub mod boq;
pub mod client;
pub mod item;
pub mod proposal;
pub mod reconcile;

pub use boq::{BoqItem, BoqRow, RowSkip, Screened, SkippedRow, screen_rows};
pub use client::Client;
pub use item::{ItemFailure, ItemRejection, ProposalItem, SubmittedItem, ValidItem};
pub use proposal::{NewProposal, Proposal, ProposalChanges, ProposalStatus};
pub use reconcile::{ReconcilePlan, plan};
