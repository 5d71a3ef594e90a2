//! Postgres-backed record store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | Any other | `Storage` |
//! | PoolClosed / network / decode | N/A | `Storage` |
//!
//! Line totals are a generated column (`quantity * unit_price`) and are never written.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use autoproposal_auth::{Company, UserAccount};
use autoproposal_core::{
    Amount, BoqItemId, ClientId, CompanyId, ProposalId, ProposalItemId, UserId,
};
use autoproposal_proposals::{BoqItem, Client, Proposal, ProposalItem, ProposalStatus};

use super::r#trait::{RecordStore, RecordTx, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        industry_type TEXT,
        contact_person TEXT,
        email TEXT,
        phone TEXT,
        city TEXT,
        country TEXT,
        logo_url TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        company_id UUID NOT NULL REFERENCES companies(id),
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        designation TEXT,
        role TEXT NOT NULL DEFAULT 'User',
        password_hash TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        access_end_date DATE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id UUID PRIMARY KEY,
        company_id UUID NOT NULL REFERENCES companies(id),
        name TEXT NOT NULL,
        email TEXT,
        mobile TEXT,
        address TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS proposals (
        id UUID PRIMARY KEY,
        company_id UUID NOT NULL REFERENCES companies(id),
        client_id UUID NOT NULL REFERENCES clients(id),
        title TEXT NOT NULL,
        description TEXT,
        amount DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (amount >= 0),
        status TEXT NOT NULL DEFAULT 'Draft'
            CHECK (status IN ('Draft', 'Sent', 'Approved', 'Rejected')),
        project_type TEXT,
        area TEXT,
        material_preferences TEXT,
        special_requirement TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS proposal_items (
        id UUID PRIMARY KEY,
        proposal_id UUID NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        unit TEXT,
        quantity DOUBLE PRECISION NOT NULL CHECK (quantity >= 0),
        unit_price DOUBLE PRECISION NOT NULL CHECK (unit_price >= 0),
        total DOUBLE PRECISION GENERATED ALWAYS AS (quantity * unit_price) STORED
    )
    "#,
    "CREATE INDEX IF NOT EXISTS proposal_items_proposal_idx ON proposal_items (proposal_id)",
    r#"
    CREATE TABLE IF NOT EXISTS boq_items (
        id UUID PRIMARY KEY,
        company_id UUID NOT NULL REFERENCES companies(id),
        project_type TEXT,
        title TEXT,
        description TEXT NOT NULL,
        unit TEXT,
        basic_rate DOUBLE PRECISION CHECK (basic_rate >= 0),
        premium_rate DOUBLE PRECISION CHECK (premium_rate >= 0)
    )
    "#,
];

const PROPOSAL_COLUMNS: &str = "id, company_id, client_id, title, description, amount, status, \
     project_type, area, material_preferences, special_requirement, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, proposal_id, name, description, unit, quantity, unit_price";

/// Postgres-backed record store.
///
/// `Send + Sync`; clones share the same pool.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables if missing. Safe to run on every start.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for ddl in SCHEMA {
            sqlx::query(ddl)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresTx { tx })
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_company", e))?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT * FROM companies WHERE name = $1")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_company_by_name", e))?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, hash), fields(user_id = %id), err)]
    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(hash)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_password_hash", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, u), fields(user_id = %u.id), err)]
    async fn update_user(&self, u: &UserAccount) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                full_name = $2, email = $3, designation = $4, role = $5,
                active = $6, access_end_date = $7
            WHERE id = $1
            "#,
        )
        .bind(u.id.as_uuid())
        .bind(&u.full_name)
        .bind(&u.email)
        .bind(&u.designation)
        .bind(&u.role)
        .bind(u.active)
        .bind(u.access_end_date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_company(&self, c: &Company) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, industry_type, contact_person, email, phone, city, country, logo_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.industry_type)
        .bind(&c.contact_person)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.city)
        .bind(&c.country)
        .bind(&c.logo_url)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(())
    }

    async fn insert_user(&self, u: &UserAccount) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, company_id, full_name, email, designation, role,
                password_hash, active, access_end_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(u.id.as_uuid())
        .bind(u.company_id.as_uuid())
        .bind(&u.full_name)
        .bind(&u.email)
        .bind(&u.designation)
        .bind(&u.role)
        .bind(&u.password_hash)
        .bind(u.active)
        .bind(u.access_end_date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn insert_client(&self, c: &Client) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, company_id, name, email, mobile, address, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(c.id.as_uuid())
        .bind(c.company_id.as_uuid())
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.mobile)
        .bind(&c.address)
        .bind(c.active)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_client", e))?;
        Ok(())
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_client", e))?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn list_clients(
        &self,
        company_id: CompanyId,
        active: Option<bool>,
    ) -> Result<Vec<Client>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM clients
            WHERE company_id = $1 AND ($2::BOOLEAN IS NULL OR active = $2)
            ORDER BY id
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(active)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_clients", e))?;
        rows.iter().map(client_from_row).collect()
    }

    async fn find_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_proposal", e))?;
        row.as_ref().map(proposal_from_row).transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn list_proposals(
        &self,
        company_id: CompanyId,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<Proposal>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS} FROM proposals
            WHERE company_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(company_id.as_uuid())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_proposals", e))?;
        rows.iter().map(proposal_from_row).collect()
    }

    async fn list_proposals_by_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<Proposal>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS} FROM proposals
            WHERE client_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(client_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_proposals_by_client", e))?;
        rows.iter().map(proposal_from_row).collect()
    }

    async fn list_proposal_items(&self, id: ProposalId) -> Result<Vec<ProposalItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM proposal_items WHERE proposal_id = $1 ORDER BY id"
        ))
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_proposal_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    async fn list_boq_items(
        &self,
        company_id: CompanyId,
        project_type: Option<&str>,
    ) -> Result<Vec<BoqItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM boq_items
            WHERE company_id = $1 AND ($2::TEXT IS NULL OR project_type = $2)
            ORDER BY id
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(project_type)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_boq_items", e))?;
        rows.iter().map(boq_from_row).collect()
    }

    async fn list_project_types(&self, company_id: CompanyId) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT project_type FROM boq_items
            WHERE company_id = $1 AND project_type IS NOT NULL AND project_type <> ''
            ORDER BY project_type
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_project_types", e))?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("project_type").map_err(decode_error))
            .collect()
    }
}

#[async_trait]
impl RecordTx for PostgresTx {
    async fn find_company(&mut self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_company", e))?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_client", e))?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn find_proposal_for_update(
        &mut self,
        id: ProposalId,
    ) -> Result<Option<Proposal>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_proposal_for_update", e))?;
        row.as_ref().map(proposal_from_row).transpose()
    }

    async fn insert_proposal(&mut self, p: &Proposal) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO proposals ({PROPOSAL_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        ))
        .bind(p.id.as_uuid())
        .bind(p.company_id.as_uuid())
        .bind(p.client_id.as_uuid())
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.amount.value())
        .bind(p.status.as_str())
        .bind(&p.project_type)
        .bind(&p.area)
        .bind(&p.material_preferences)
        .bind(&p.special_requirement)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_proposal", e))?;
        Ok(())
    }

    async fn update_proposal_status(
        &mut self,
        id: ProposalId,
        status: ProposalStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE proposals SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_proposal_status", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn touch_proposal(&mut self, id: ProposalId, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE proposals SET updated_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("touch_proposal", e))?;
        Ok(())
    }

    async fn update_proposal(&mut self, p: &Proposal) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE proposals SET
                title = $2, description = $3, amount = $4, status = $5,
                project_type = $6, area = $7, material_preferences = $8,
                special_requirement = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(p.id.as_uuid())
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.amount.value())
        .bind(p.status.as_str())
        .bind(&p.project_type)
        .bind(&p.area)
        .bind(&p.material_preferences)
        .bind(&p.special_requirement)
        .bind(p.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_proposal", e))?;
        Ok(result.rows_affected() == 1)
    }

    // proposal_items rows go with it through ON DELETE CASCADE.
    async fn delete_proposal(&mut self, id: ProposalId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_proposal", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_proposal_items(
        &mut self,
        id: ProposalId,
    ) -> Result<Vec<ProposalItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM proposal_items WHERE proposal_id = $1 ORDER BY id"
        ))
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_proposal_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    async fn upsert_proposal_item(&mut self, i: &ProposalItem) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO proposal_items ({ITEM_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                unit = EXCLUDED.unit,
                quantity = EXCLUDED.quantity,
                unit_price = EXCLUDED.unit_price
            WHERE proposal_items.proposal_id = EXCLUDED.proposal_id
            "#
        ))
        .bind(i.id.as_uuid())
        .bind(i.proposal_id.as_uuid())
        .bind(&i.name)
        .bind(&i.description)
        .bind(&i.unit)
        .bind(i.quantity.value())
        .bind(i.unit_price.value())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_proposal_item", e))?;
        Ok(())
    }

    async fn delete_proposal_item(&mut self, id: ProposalItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM proposal_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_proposal_item", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_boq_item(&mut self, b: &BoqItem) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO boq_items (
                id, company_id, project_type, title, description, unit, basic_rate, premium_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(b.id.as_uuid())
        .bind(b.company_id.as_uuid())
        .bind(&b.project_type)
        .bind(&b.title)
        .bind(&b.description)
        .bind(&b.unit)
        .bind(b.basic_rate.map(Amount::value))
        .bind(b.premium_rate.map(Amount::value))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_boq_item", e))?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn company_from_row(row: &PgRow) -> Result<Company, StoreError> {
    Ok(Company {
        id: CompanyId::from_uuid(get::<Uuid>(row, "id")?),
        name: get(row, "name")?,
        industry_type: get(row, "industry_type")?,
        contact_person: get(row, "contact_person")?,
        email: get(row, "email")?,
        phone: get(row, "phone")?,
        city: get(row, "city")?,
        country: get(row, "country")?,
        logo_url: get(row, "logo_url")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<UserAccount, StoreError> {
    Ok(UserAccount {
        id: UserId::from_uuid(get::<Uuid>(row, "id")?),
        company_id: CompanyId::from_uuid(get::<Uuid>(row, "company_id")?),
        full_name: get(row, "full_name")?,
        email: get(row, "email")?,
        designation: get(row, "designation")?,
        role: get(row, "role")?,
        password_hash: get(row, "password_hash")?,
        active: get(row, "active")?,
        access_end_date: get::<Option<NaiveDate>>(row, "access_end_date")?,
    })
}

fn client_from_row(row: &PgRow) -> Result<Client, StoreError> {
    Ok(Client {
        id: ClientId::from_uuid(get::<Uuid>(row, "id")?),
        company_id: CompanyId::from_uuid(get::<Uuid>(row, "company_id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        mobile: get(row, "mobile")?,
        address: get(row, "address")?,
        active: get(row, "active")?,
    })
}

fn proposal_from_row(row: &PgRow) -> Result<Proposal, StoreError> {
    let status: String = get(row, "status")?;
    Ok(Proposal {
        id: ProposalId::from_uuid(get::<Uuid>(row, "id")?),
        company_id: CompanyId::from_uuid(get::<Uuid>(row, "company_id")?),
        client_id: ClientId::from_uuid(get::<Uuid>(row, "client_id")?),
        title: get(row, "title")?,
        description: get(row, "description")?,
        amount: amount(get(row, "amount")?, "amount")?,
        status: status
            .parse()
            .map_err(|_| StoreError::Storage(format!("unknown proposal status '{status}'")))?,
        project_type: get(row, "project_type")?,
        area: get(row, "area")?,
        material_preferences: get(row, "material_preferences")?,
        special_requirement: get(row, "special_requirement")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<ProposalItem, StoreError> {
    Ok(ProposalItem {
        id: ProposalItemId::from_uuid(get::<Uuid>(row, "id")?),
        proposal_id: ProposalId::from_uuid(get::<Uuid>(row, "proposal_id")?),
        name: get(row, "name")?,
        description: get(row, "description")?,
        unit: get(row, "unit")?,
        quantity: amount(get(row, "quantity")?, "quantity")?,
        unit_price: amount(get(row, "unit_price")?, "unit_price")?,
    })
}

fn boq_from_row(row: &PgRow) -> Result<BoqItem, StoreError> {
    let basic: Option<f64> = get(row, "basic_rate")?;
    let premium: Option<f64> = get(row, "premium_rate")?;
    Ok(BoqItem {
        id: BoqItemId::from_uuid(get::<Uuid>(row, "id")?),
        company_id: CompanyId::from_uuid(get::<Uuid>(row, "company_id")?),
        project_type: get(row, "project_type")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        unit: get(row, "unit")?,
        basic_rate: basic.map(|v| amount(v, "basic_rate")).transpose()?,
        premium_rate: premium.map(|v| amount(v, "premium_rate")).transpose()?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(decode_error)
}

fn amount(value: f64, field: &str) -> Result<Amount, StoreError> {
    Amount::new(value, field).map_err(|e| StoreError::Storage(format!("corrupt row: {e}")))
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("failed to decode row: {err}"))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(format!("referenced record ({msg})")),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
