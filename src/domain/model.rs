use crate::core::scoring::clamp_score;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single cell value as the table engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.trim().is_empty() => FieldValue::Text(s.to_string()),
            _ => FieldValue::Empty,
        }
    }

    pub fn opt_number(value: Option<f64>) -> Self {
        match value {
            Some(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M")),
        }
    }
}

/// What the table engine and predicates need from a record.
pub trait TableRecord {
    /// The unique id, or `None` when the record arrived without one.
    fn record_id(&self) -> Option<&str>;

    /// Value of a named field; unknown names yield `FieldValue::Empty`.
    fn field(&self, key: &str) -> FieldValue;

    /// Brings stored values back into their valid range. Returns `true` when something changed.
    fn normalize(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Application,
    Approved,
    Closed,
    Declined,
}

impl LeadStatus {
    /// Funnel order, from first touch to the terminal states.
    pub const PIPELINE: [LeadStatus; 7] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Application,
        LeadStatus::Approved,
        LeadStatus::Closed,
        LeadStatus::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Application => "application",
            LeadStatus::Approved => "approved",
            LeadStatus::Closed => "closed",
            LeadStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Closed | LeadStatus::Declined)
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::PIPELINE
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("unknown lead status '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeddingStage {
    Engaged,
    Planning,
    RecentlyMarried,
}

impl WeddingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeddingStage::Engaged => "engaged",
            WeddingStage::Planning => "planning",
            WeddingStage::RecentlyMarried => "recently_married",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Scheduled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Scheduled => "scheduled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Couple {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    pub partner_1_name: String,
    pub partner_2_name: String,
    #[serde(default)]
    pub partner_1_email: Option<String>,
    #[serde(default)]
    pub partner_2_email: Option<String>,
    pub wedding_stage: WeddingStage,
    #[serde(default)]
    pub wedding_date: Option<NaiveDate>,
    #[serde(default)]
    pub wedding_city: Option<String>,
    #[serde(default)]
    pub wedding_state: Option<String>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub wedding_budget: Option<f64>,
    #[serde(default)]
    pub source_platform: String,
    #[serde(default)]
    pub combined_income: Option<f64>,
    #[serde(default)]
    pub credit_score_range: Option<String>,
    #[serde(default)]
    pub home_purchase_timeline: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Couple {
    pub fn display_name(&self) -> String {
        format!("{} & {}", self.partner_1_name, self.partner_2_name)
    }
}

impl TableRecord for Couple {
    fn record_id(&self) -> Option<&str> {
        non_blank(&self.id)
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "id" => FieldValue::opt_text(Some(&self.id)),
            "couple_name" => FieldValue::Text(self.display_name()),
            "partner_1_name" => FieldValue::text(&self.partner_1_name),
            "partner_2_name" => FieldValue::text(&self.partner_2_name),
            "partner_1_email" => FieldValue::opt_text(self.partner_1_email.as_deref()),
            "partner_2_email" => FieldValue::opt_text(self.partner_2_email.as_deref()),
            "wedding_stage" => FieldValue::text(self.wedding_stage.as_str()),
            "wedding_date" => self.wedding_date.map_or(FieldValue::Empty, FieldValue::Date),
            "wedding_city" => FieldValue::opt_text(self.wedding_city.as_deref()),
            "wedding_state" => FieldValue::opt_text(self.wedding_state.as_deref()),
            "venue_name" => FieldValue::opt_text(self.venue_name.as_deref()),
            "wedding_budget" => FieldValue::opt_number(self.wedding_budget),
            "source_platform" => FieldValue::opt_text(Some(&self.source_platform)),
            "combined_income" => FieldValue::opt_number(self.combined_income),
            "credit_score_range" => FieldValue::opt_text(self.credit_score_range.as_deref()),
            "home_purchase_timeline" => {
                FieldValue::opt_text(self.home_purchase_timeline.as_deref())
            }
            "created_at" => FieldValue::Timestamp(self.created_at),
            _ => FieldValue::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub couple_id: String,
    #[serde(default)]
    pub couple_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    pub status: LeadStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub lead_score: f64,
    #[serde(default)]
    pub target_purchase_price: Option<f64>,
    #[serde(default)]
    pub estimated_income: Option<f64>,
    #[serde(default)]
    pub credit_score_range: Option<String>,
    #[serde(default)]
    pub purchase_timeline: Option<String>,
    #[serde(default)]
    pub estimated_loan_amount: Option<f64>,
    #[serde(default)]
    pub loan_officer: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub last_contact: Option<DateTime<Utc>>,
}

impl TableRecord for Lead {
    fn record_id(&self) -> Option<&str> {
        non_blank(&self.id)
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "id" => FieldValue::opt_text(Some(&self.id)),
            "couple_id" => FieldValue::opt_text(Some(&self.couple_id)),
            "couple_name" => FieldValue::opt_text(self.couple_name.as_deref()),
            "email" => FieldValue::opt_text(self.email.as_deref()),
            "location" => FieldValue::opt_text(self.location.as_deref()),
            "platform" => FieldValue::opt_text(self.platform.as_deref()),
            "status" => FieldValue::text(self.status.as_str()),
            "priority" => FieldValue::text(self.priority.as_str()),
            "lead_score" => FieldValue::opt_number(Some(self.lead_score)),
            "target_purchase_price" => FieldValue::opt_number(self.target_purchase_price),
            "estimated_income" => FieldValue::opt_number(self.estimated_income),
            "credit_score_range" => FieldValue::opt_text(self.credit_score_range.as_deref()),
            "purchase_timeline" => FieldValue::opt_text(self.purchase_timeline.as_deref()),
            "estimated_loan_amount" => FieldValue::opt_number(self.estimated_loan_amount),
            "loan_officer" => FieldValue::opt_text(self.loan_officer.as_deref()),
            "created_at" => FieldValue::Timestamp(self.created_at),
            "last_contact" => self.last_contact.map_or(FieldValue::Empty, FieldValue::Timestamp),
            _ => FieldValue::Empty,
        }
    }

    fn normalize(&mut self) -> bool {
        let clamped = clamp_score(self.lead_score);
        if clamped == self.lead_score {
            return false;
        }
        self.lead_score = clamped;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub status: CampaignStatus,
    #[serde(default)]
    pub campaign_type: Option<String>,
    #[serde(default)]
    pub total_sends: u64,
    #[serde(default)]
    pub total_opens: u64,
    #[serde(default)]
    pub total_clicks: u64,
    #[serde(default)]
    pub total_conversions: u64,
    #[serde(default)]
    pub revenue_generated: f64,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TableRecord for Campaign {
    fn record_id(&self) -> Option<&str> {
        non_blank(&self.id)
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "id" => FieldValue::opt_text(Some(&self.id)),
            "name" => FieldValue::text(&self.name),
            "status" => FieldValue::text(self.status.as_str()),
            "campaign_type" => FieldValue::opt_text(self.campaign_type.as_deref()),
            "total_sends" => FieldValue::Number(self.total_sends as f64),
            "total_opens" => FieldValue::Number(self.total_opens as f64),
            "total_clicks" => FieldValue::Number(self.total_clicks as f64),
            "total_conversions" => FieldValue::Number(self.total_conversions as f64),
            "revenue_generated" => FieldValue::opt_number(Some(self.revenue_generated)),
            "created_at" => self.created_at.map_or(FieldValue::Empty, FieldValue::Timestamp),
            _ => FieldValue::Empty,
        }
    }
}

fn non_blank(id: &str) -> Option<&str> {
    if id.trim().is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (read as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn deserialize_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
    }
}

// Upstream ids arrive as either integers or strings; null counts as missing.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
