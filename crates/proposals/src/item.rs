use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use autoproposal_core::{Amount, DomainResult, Entity, ProposalId, ProposalItemId};

/// One persisted bill-of-quantities line on a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalItem {
    pub id: ProposalItemId,
    pub proposal_id: ProposalId,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Amount,
    pub unit_price: Amount,
}

impl ProposalItem {
    /// Always derived; never stored as caller input. Items that went through
    /// [`SubmittedItem::validate`] always have a finite total.
    pub fn total(&self) -> DomainResult<Amount> {
        self.quantity.times(self.unit_price)
    }
}

impl Entity for ProposalItem {
    type Id = ProposalItemId;

    fn id(&self) -> &ProposalItemId {
        &self.id
    }
}

/// A line as the caller submits it: id optional, fields not yet validated.
///
/// Name and numbers are taken loosely so that a malformed line is rejected
/// on its own instead of failing the whole request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmittedItem {
    #[serde(default)]
    pub id: Option<ProposalItemId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub unit_price: Option<Value>,
}

impl SubmittedItem {
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            name: Some(name.into()),
            quantity: Some(Value::from(quantity)),
            unit_price: Some(Value::from(unit_price)),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: ProposalItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// The submitted name, or `""` when absent.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<ValidItem, ItemRejection> {
        let name = self.name().trim();
        if name.is_empty() {
            return Err(ItemRejection::MissingName);
        }
        let quantity =
            number(self.quantity.as_ref(), "quantity").map_err(ItemRejection::InvalidQuantity)?;
        let unit_price = number(self.unit_price.as_ref(), "unit_price")
            .map_err(ItemRejection::InvalidUnitPrice)?;
        quantity
            .times(unit_price)
            .map_err(|e| ItemRejection::InvalidTotal(e.to_string()))?;
        Ok(ValidItem {
            name: name.to_string(),
            description: self.description.clone(),
            unit: self.unit.clone(),
            quantity,
            unit_price,
        })
    }
}

/// Numbers arrive as JSON numbers or numeric strings.
fn number(raw: Option<&Value>, field: &str) -> Result<Amount, String> {
    let value = match raw {
        None | Some(Value::Null) => return Err(format!("{field} is required")),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| format!("{field} must be a number"))?;
    Amount::new(value, field).map_err(|e| e.to_string())
}

impl From<&ProposalItem> for SubmittedItem {
    fn from(item: &ProposalItem) -> Self {
        Self {
            id: Some(item.id),
            name: Some(item.name.clone()),
            description: item.description.clone(),
            unit: item.unit.clone(),
            quantity: Some(Value::from(item.quantity.value())),
            unit_price: Some(Value::from(item.unit_price.value())),
        }
    }
}

/// The mutable fields of a line after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidItem {
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Amount,
    pub unit_price: Amount,
}

impl ValidItem {
    pub fn into_item(self, id: ProposalItemId, proposal_id: ProposalId) -> ProposalItem {
        ProposalItem {
            id,
            proposal_id,
            name: self.name,
            description: self.description,
            unit: self.unit,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemRejection {
    #[error("item name must not be empty")]
    MissingName,

    #[error("{0}")]
    InvalidQuantity(String),

    #[error("{0}")]
    InvalidUnitPrice(String),

    #[error("line total out of range: {0}")]
    InvalidTotal(String),
}

/// A submitted line that was skipped, with its position in the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub index: usize,
    pub id: Option<ProposalItemId>,
    pub name: String,
    pub reason: ItemRejection,
}

impl ItemFailure {
    pub const KIND: &'static str = "InvalidItemValue";
}
