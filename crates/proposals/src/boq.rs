//! BOQ rate-card catalog and import screening.
//!
//! Rows arrive already parsed from a spreadsheet. A row is importable when it
//! has a description and at least one of the two rates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use autoproposal_core::{Amount, BoqItemId, CompanyId, Entity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoqItem {
    pub id: BoqItemId,
    pub company_id: CompanyId,
    pub project_type: Option<String>,
    pub title: Option<String>,
    pub description: String,
    pub unit: Option<String>,
    pub basic_rate: Option<Amount>,
    pub premium_rate: Option<Amount>,
}

impl Entity for BoqItem {
    type Id = BoqItemId;

    fn id(&self) -> &BoqItemId {
        &self.id
    }
}

/// One spreadsheet row, columns `ProjectType, Title, Description, Unit, BasicRate, PremiumRate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoqRow {
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub basic_rate: Option<f64>,
    #[serde(default)]
    pub premium_rate: Option<f64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowSkip {
    #[error("description is required")]
    MissingDescription,

    #[error("at least one of basic_rate or premium_rate is required")]
    MissingRate,

    #[error("{0}")]
    InvalidRate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based position in the submitted rows.
    pub row: usize,
    pub reason: RowSkip,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screened {
    pub accepted: Vec<BoqItem>,
    pub skipped: Vec<SkippedRow>,
}

/// Split rows into importable items and skipped rows.
pub fn screen_rows<F>(company_id: CompanyId, rows: &[BoqRow], mut new_id: F) -> Screened
where
    F: FnMut() -> BoqItemId,
{
    let mut out = Screened::default();
    for (i, row) in rows.iter().enumerate() {
        match screen_row(row) {
            Ok((description, basic_rate, premium_rate)) => out.accepted.push(BoqItem {
                id: new_id(),
                company_id,
                project_type: non_blank(&row.project_type),
                title: non_blank(&row.title),
                description,
                unit: non_blank(&row.unit),
                basic_rate,
                premium_rate,
            }),
            Err(reason) => out.skipped.push(SkippedRow { row: i + 1, reason }),
        }
    }
    out
}

type Screen = (String, Option<Amount>, Option<Amount>);

fn screen_row(row: &BoqRow) -> Result<Screen, RowSkip> {
    let description = non_blank(&row.description).ok_or(RowSkip::MissingDescription)?;
    if row.basic_rate.is_none() && row.premium_rate.is_none() {
        return Err(RowSkip::MissingRate);
    }
    let basic = rate(row.basic_rate, "basic_rate")?;
    let premium = rate(row.premium_rate, "premium_rate")?;
    Ok((description, basic, premium))
}

fn rate(value: Option<f64>, field: &str) -> Result<Option<Amount>, RowSkip> {
    value
        .map(|v| Amount::new(v, field).map_err(|e| RowSkip::InvalidRate(e.to_string())))
        .transpose()
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
