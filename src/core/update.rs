use crate::core::scoring::{compute_score, ScoreInput, ScoringPolicy};
use crate::domain::model::{Lead, LeadStatus, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A partial edit of a lead; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadUpdate {
    pub status: Option<LeadStatus>,
    pub priority: Option<Priority>,
    pub target_purchase_price: Option<f64>,
    pub location: Option<String>,
    pub estimated_income: Option<f64>,
    pub credit_score_range: Option<String>,
    pub purchase_timeline: Option<String>,
    pub last_contact: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum SaveOutcome<T> {
    Saved(T),
    ValidationFailed(Vec<FieldError>),
}

impl<T> SaveOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }

    pub fn saved(self) -> Option<T> {
        match self {
            SaveOutcome::Saved(value) => Some(value),
            SaveOutcome::ValidationFailed(_) => None,
        }
    }
}

impl LeadUpdate {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for (field, amount) in [
            ("target_purchase_price", self.target_purchase_price),
            ("estimated_income", self.estimated_income),
        ] {
            if let Some(n) = amount {
                if !n.is_finite() || n < 0.0 {
                    errors.push(FieldError {
                        field,
                        message: "must be a non-negative amount".to_string(),
                    });
                }
            }
        }

        for (field, text) in [
            ("location", &self.location),
            ("credit_score_range", &self.credit_score_range),
            ("purchase_timeline", &self.purchase_timeline),
        ] {
            if matches!(text, Some(s) if s.trim().is_empty()) {
                errors.push(FieldError {
                    field,
                    message: "cannot be blank".to_string(),
                });
            }
        }

        errors
    }
}

/// Produces the edited lead with a fresh score, or the reasons it was refused. `lead` itself is
/// never changed.
pub fn apply_update(lead: &Lead, update: &LeadUpdate, policy: &ScoringPolicy) -> SaveOutcome<Lead> {
    let errors = update.validate();
    if !errors.is_empty() {
        tracing::debug!("Update of lead '{}' refused: {} field errors", lead.id, errors.len());
        return SaveOutcome::ValidationFailed(errors);
    }

    let mut next = lead.clone();
    if let Some(status) = update.status {
        next.status = status;
    }
    if let Some(priority) = update.priority {
        next.priority = priority;
    }
    if let Some(price) = update.target_purchase_price {
        next.target_purchase_price = Some(price);
    }
    if let Some(location) = &update.location {
        next.location = Some(location.trim().to_string());
    }
    if let Some(income) = update.estimated_income {
        next.estimated_income = Some(income);
    }
    if let Some(bracket) = &update.credit_score_range {
        next.credit_score_range = Some(bracket.trim().to_string());
    }
    if let Some(timeline) = &update.purchase_timeline {
        next.purchase_timeline = Some(timeline.trim().to_string());
    }
    if let Some(contacted) = update.last_contact {
        next.last_contact = Some(contacted);
    }

    next.lead_score = compute_score(&ScoreInput::from(&next), policy);
    SaveOutcome::Saved(next)
}

/// Applies one status change to each listed lead, keeping the input order.
pub fn bulk_update_status(
    leads: &[Lead],
    ids: &[String],
    status: LeadStatus,
    policy: &ScoringPolicy,
) -> Vec<Lead> {
    let update = LeadUpdate {
        status: Some(status),
        ..LeadUpdate::default()
    };
    leads
        .iter()
        .filter(|lead| ids.contains(&lead.id))
        .filter_map(|lead| apply_update(lead, &update, policy).saved())
        .collect()
}
