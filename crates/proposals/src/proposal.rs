use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use autoproposal_core::{Amount, ClientId, CompanyId, DomainError, DomainResult, Entity, ProposalId};

/// Proposal lifecycle status. Transitions are unrestricted; only the value set is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 4] = [
        ProposalStatus::Draft,
        ProposalStatus::Sent,
        ProposalStatus::Approved,
        ProposalStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "Draft",
            ProposalStatus::Sent => "Sent",
            ProposalStatus::Approved => "Approved",
            ProposalStatus::Rejected => "Rejected",
        }
    }
}

impl core::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProposalStatus {
    type Err = DomainError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProposalStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation("Invalid status. Must be one of: Draft, Sent, Approved, Rejected")
            })
    }
}

/// A quotation for one client, owned by one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub title: String,
    pub description: Option<String>,
    pub amount: Amount,
    pub status: ProposalStatus,
    pub project_type: Option<String>,
    pub area: Option<String>,
    pub material_preferences: Option<String>,
    pub special_requirement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Proposal {
    type Id = ProposalId;

    fn id(&self) -> &ProposalId {
        &self.id
    }
}

/// Caller-supplied fields of a proposal about to be created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProposal {
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<ProposalStatus>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub material_preferences: Option<String>,
    #[serde(default)]
    pub special_requirement: Option<String>,
}

impl NewProposal {
    /// Validate and stamp the proposal. Status defaults to `Draft`, amount to zero.
    pub fn into_proposal(self, id: ProposalId, now: DateTime<Utc>) -> DomainResult<Proposal> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("proposal title must not be empty"));
        }
        let amount = match self.amount {
            Some(v) => Amount::new(v, "amount")?,
            None => Amount::ZERO,
        };
        Ok(Proposal {
            id,
            company_id: self.company_id,
            client_id: self.client_id,
            title,
            description: self.description,
            amount,
            status: self.status.unwrap_or_default(),
            project_type: self.project_type,
            area: self.area,
            material_preferences: self.material_preferences,
            special_requirement: self.special_requirement,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of a proposal. Absent fields are left as they are.
///
/// Status arrives as text so an unknown value is reported with the usual
/// status message rather than as a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposalChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub material_preferences: Option<String>,
    #[serde(default)]
    pub special_requirement: Option<String>,
}

impl Proposal {
    /// Apply an edit and stamp `updated_at`. Nothing changes on error.
    pub fn apply(&mut self, changes: ProposalChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let title = match changes.title {
            Some(t) if t.trim().is_empty() => {
                return Err(DomainError::validation("proposal title must not be empty"));
            }
            Some(t) => Some(t.trim().to_string()),
            None => None,
        };
        let amount = changes.amount.map(|v| Amount::new(v, "amount")).transpose()?;
        let status = changes
            .status
            .as_deref()
            .map(str::parse::<ProposalStatus>)
            .transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if changes.description.is_some() {
            self.description = changes.description;
        }
        if changes.project_type.is_some() {
            self.project_type = changes.project_type;
        }
        if changes.area.is_some() {
            self.area = changes.area;
        }
        if changes.material_preferences.is_some() {
            self.material_preferences = changes.material_preferences;
        }
        if changes.special_requirement.is_some() {
            self.special_requirement = changes.special_requirement;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NewProposal {
        NewProposal {
            company_id: CompanyId::new(),
            client_id: ClientId::new(),
            title: title.to_string(),
            description: None,
            amount: None,
            status: None,
            project_type: Some("Residential".into()),
            area: None,
            material_preferences: None,
            special_requirement: None,
        }
    }

    #[test]
    fn status_parses_exact_names_only() {
        assert_eq!("Sent".parse::<ProposalStatus>().unwrap(), ProposalStatus::Sent);
        let err = "sent".parse::<ProposalStatus>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: Invalid status. Must be one of: Draft, Sent, Approved, Rejected"
        );
        assert!("Archived".parse::<ProposalStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_its_name() {
        let json = serde_json::to_string(&ProposalStatus::Approved).unwrap();
        assert_eq!(json, "\"Approved\"");
    }

    #[test]
    fn new_proposal_defaults_to_draft_and_zero_amount() {
        let now = Utc::now();
        let p = draft("  Kitchen remodel ").into_proposal(ProposalId::new(), now).unwrap();
        assert_eq!(p.title, "Kitchen remodel");
        assert_eq!(p.status, ProposalStatus::Draft);
        assert_eq!(p.amount, Amount::ZERO);
        assert_eq!(p.created_at, now);
    }

    #[test]
    fn blank_title_or_negative_amount_is_rejected() {
        assert!(draft(" ").into_proposal(ProposalId::new(), Utc::now()).is_err());

        let mut np = draft("Office fit-out");
        np.amount = Some(-1.0);
        assert!(np.into_proposal(ProposalId::new(), Utc::now()).is_err());
    }

    #[test]
    fn changes_touch_only_given_fields() {
        let created = Utc::now();
        let mut p = draft("Kitchen").into_proposal(ProposalId::new(), created).unwrap();
        let later = created + chrono::Duration::minutes(5);

        p.apply(
            ProposalChanges {
                amount: Some(4500.0),
                status: Some("Sent".into()),
                ..ProposalChanges::default()
            },
            later,
        )
        .unwrap();

        assert_eq!(p.title, "Kitchen");
        assert_eq!(p.amount.value(), 4500.0);
        assert_eq!(p.status, ProposalStatus::Sent);
        assert_eq!(p.project_type.as_deref(), Some("Residential"));
        assert_eq!(p.updated_at, later);
        assert_eq!(p.created_at, created);
    }

    #[test]
    fn rejected_changes_leave_the_proposal_alone() {
        let mut p = draft("Kitchen").into_proposal(ProposalId::new(), Utc::now()).unwrap();
        let before = p.clone();

        let err = p
            .apply(
                ProposalChanges {
                    amount: Some(10.0),
                    status: Some("Archived".into()),
                    ..ProposalChanges::default()
                },
                Utc::now(),
            )
            .unwrap_err();

        assert!(err.to_string().contains("Invalid status"));
        assert_eq!(p, before);

        let blank_title = ProposalChanges {
            title: Some("  ".into()),
            ..ProposalChanges::default()
        };
        assert!(p.apply(blank_title, Utc::now()).is_err());

        let negative = ProposalChanges {
            amount: Some(-1.0),
            ..ProposalChanges::default()
        };
        assert!(p.apply(negative, Utc::now()).is_err());
    }
}
