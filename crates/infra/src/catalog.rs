//! BOQ rate-card import and queries.

use std::sync::Arc;

use tracing::instrument;

use autoproposal_core::{BoqItemId, CompanyId, DomainError};
use autoproposal_proposals::{BoqItem, BoqRow, Screened, SkippedRow, screen_rows};

use crate::error::ServiceError;
use crate::store::{RecordStore, RecordTx};

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub imported: Vec<BoqItem>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportOutcome {
    pub fn message(&self) -> String {
        format!("Successfully imported {} BOQ items", self.imported.len())
    }
}

pub struct BoqCatalogService<S> {
    store: Arc<S>,
}

impl<S: RecordStore> BoqCatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Save every importable row in one transaction; report the rest.
    #[instrument(skip(self, rows), fields(company_id = %company_id, rows = rows.len()), err)]
    pub async fn import(
        &self,
        company_id: CompanyId,
        rows: &[BoqRow],
    ) -> Result<ImportOutcome, ServiceError> {
        let screened = screen_rows(company_id, rows, BoqItemId::new);

        let mut tx = self.store.begin().await?;
        if tx.find_company(company_id).await?.is_none() {
            return Err(DomainError::not_found(format!("company {company_id}")).into());
        }
        for item in &screened.accepted {
            tx.insert_boq_item(item).await?;
        }
        tx.commit().await?;

        tracing::info!(
            imported = screened.accepted.len(),
            skipped = screened.skipped.len(),
            "boq import finished"
        );
        Ok(ImportOutcome {
            imported: screened.accepted,
            skipped: screened.skipped,
        })
    }

    /// Screen rows exactly as [`Self::import`] would, without writing anything.
    pub async fn preview(
        &self,
        company_id: CompanyId,
        rows: &[BoqRow],
    ) -> Result<Screened, ServiceError> {
        if self.store.find_company(company_id).await?.is_none() {
            return Err(DomainError::not_found(format!("company {company_id}")).into());
        }
        Ok(screen_rows(company_id, rows, BoqItemId::new))
    }

    pub async fn list(
        &self,
        company_id: CompanyId,
        project_type: Option<&str>,
    ) -> Result<Vec<BoqItem>, ServiceError> {
        Ok(self.store.list_boq_items(company_id, project_type).await?)
    }

    pub async fn project_types(&self, company_id: CompanyId) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.list_project_types(company_id).await?)
    }
}
