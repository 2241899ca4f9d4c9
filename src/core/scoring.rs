//! Weighted additive lead scoring.
//!
//! A score starts at [`ScoringPolicy::base`] and collects one bonus each for income, credit
//! bracket, purchase timeline and source platform. The sum is clamped to `0..=100`. Attributes
//! that are missing or cannot be read contribute nothing; scoring never fails.

use crate::domain::model::{Couple, Lead, TableRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeTier {
    /// Inclusive lower bound of the tier.
    pub min: f64,
    pub bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub base: f64,
    pub income_tiers: Vec<IncomeTier>,
    pub credit_brackets: BTreeMap<String, f64>,
    pub timelines: BTreeMap<String, f64>,
    pub high_quality_platforms: Vec<String>,
    pub platform_bonus: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base: 50.0,
            income_tiers: vec![
                IncomeTier { min: 150_000.0, bonus: 30.0 },
                IncomeTier { min: 100_000.0, bonus: 20.0 },
                IncomeTier { min: 75_000.0, bonus: 10.0 },
            ],
            credit_brackets: BTreeMap::from([
                ("800+".to_string(), 25.0),
                ("750-799".to_string(), 20.0),
                ("700-749".to_string(), 15.0),
                ("650-699".to_string(), 10.0),
            ]),
            timelines: BTreeMap::from([
                ("Immediate".to_string(), 20.0),
                ("Within 6 months".to_string(), 15.0),
                ("Within 1 year".to_string(), 10.0),
            ]),
            high_quality_platforms: vec![
                "The Knot".to_string(),
                "WeddingWire".to_string(),
                "Zola".to_string(),
            ],
            platform_bonus: 10.0,
        }
    }
}

impl ScoringPolicy {
    pub fn income_bonus(&self, income: Option<f64>) -> f64 {
        let Some(income) = income.filter(|n| n.is_finite()) else {
            return 0.0;
        };
        self.income_tiers
            .iter()
            .filter(|tier| income >= tier.min)
            .max_by(|a, b| a.min.total_cmp(&b.min))
            .map_or(0.0, |tier| tier.bonus)
    }

    pub fn credit_bonus(&self, bracket: Option<&str>) -> f64 {
        bracket
            .and_then(|label| self.credit_brackets.get(label.trim()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn timeline_bonus(&self, timeline: Option<&str>) -> f64 {
        timeline
            .and_then(|label| self.timelines.get(label.trim()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn platform_bonus(&self, platform: Option<&str>) -> f64 {
        let Some(platform) = platform.map(str::trim).filter(|p| !p.is_empty()) else {
            return 0.0;
        };
        let high_quality = self
            .high_quality_platforms
            .iter()
            .any(|known| known.trim().eq_ignore_ascii_case(platform));
        if high_quality {
            self.platform_bonus
        } else {
            0.0
        }
    }
}

/// The attributes scoring reads, already pulled out of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub combined_income: Option<f64>,
    pub credit_score_range: Option<String>,
    pub purchase_timeline: Option<String>,
    pub source_platform: Option<String>,
}

impl ScoreInput {
    /// Reads a flat attribute bag. Several spellings are accepted per attribute because couples
    /// and leads name them differently upstream.
    pub fn from_attributes(attributes: &HashMap<String, serde_json::Value>) -> Self {
        // A null under one spelling falls through to the next.
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| attributes.get(*k).filter(|v| !v.is_null()))
        };

        let combined_income = first(&["combined_income", "estimated_income"]).and_then(|v| {
            let parsed = parse_amount(v);
            if parsed.is_none() && !v.is_null() {
                tracing::debug!("Ignoring unreadable income value: {}", v);
            }
            parsed
        });

        Self {
            combined_income,
            credit_score_range: first(&["credit_score_range"]).and_then(label),
            purchase_timeline: first(&[
                "purchase_timeline",
                "home_purchase_timeline",
                "timeline_to_purchase",
            ])
            .and_then(label),
            source_platform: first(&["source_platform", "platform"]).and_then(label),
        }
    }
}

impl From<&Couple> for ScoreInput {
    fn from(couple: &Couple) -> Self {
        Self {
            combined_income: couple.combined_income,
            credit_score_range: couple.credit_score_range.clone(),
            purchase_timeline: couple.home_purchase_timeline.clone(),
            source_platform: Some(couple.source_platform.clone()),
        }
    }
}

impl From<&Lead> for ScoreInput {
    fn from(lead: &Lead) -> Self {
        Self {
            combined_income: lead.estimated_income,
            credit_score_range: lead.credit_score_range.clone(),
            purchase_timeline: lead.purchase_timeline.clone(),
            source_platform: lead.platform.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub income_bonus: f64,
    pub credit_bonus: f64,
    pub timeline_bonus: f64,
    pub platform_bonus: f64,
    pub total: f64,
}

pub fn explain(input: &ScoreInput, policy: &ScoringPolicy) -> ScoreBreakdown {
    let income_bonus = policy.income_bonus(input.combined_income);
    let credit_bonus = policy.credit_bonus(input.credit_score_range.as_deref());
    let timeline_bonus = policy.timeline_bonus(input.purchase_timeline.as_deref());
    let platform_bonus = policy.platform_bonus(input.source_platform.as_deref());

    let raw = policy.base + income_bonus + credit_bonus + timeline_bonus + platform_bonus;

    ScoreBreakdown {
        base: policy.base,
        income_bonus,
        credit_bonus,
        timeline_bonus,
        platform_bonus,
        total: clamp_score(raw),
    }
}

pub fn compute_score(input: &ScoreInput, policy: &ScoringPolicy) -> f64 {
    explain(input, policy).total
}

pub fn score_attributes(
    attributes: &HashMap<String, serde_json::Value>,
    policy: &ScoringPolicy,
) -> f64 {
    compute_score(&ScoreInput::from_attributes(attributes), policy)
}

/// Clamps into `0..=100`; NaN becomes 0.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        MIN_SCORE
    } else {
        raw.clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Returns rescored copies; the input slice is left as it was.
pub fn score_leads(leads: &[Lead], policy: &ScoringPolicy) -> Vec<Lead> {
    leads
        .iter()
        .map(|lead| Lead {
            lead_score: compute_score(&ScoreInput::from(lead), policy),
            ..lead.clone()
        })
        .collect()
}

pub fn score_couple(couple: &Couple, policy: &ScoringPolicy) -> f64 {
    compute_score(&ScoreInput::from(couple), policy)
}

/// Re-scores each lead whose `couple_id` names a couple from that couple's attributes. Couples
/// without an id are skipped and the first couple wins on a repeated id. Returns the leads and
/// how many of them were re-scored.
pub fn score_leads_from_couples(
    leads: Vec<Lead>,
    couples: &[Couple],
    policy: &ScoringPolicy,
) -> (Vec<Lead>, usize) {
    let mut by_id: HashMap<&str, &Couple> = HashMap::new();
    for couple in couples {
        if let Some(id) = couple.record_id() {
            by_id.entry(id).or_insert(couple);
        }
    }

    let mut rescored = 0;
    let leads = leads
        .into_iter()
        .map(|lead| match by_id.get(lead.couple_id.trim()) {
            Some(couple) => {
                rescored += 1;
                Lead {
                    lead_score: score_couple(couple, policy),
                    ..lead
                }
            }
            None => lead,
        })
        .collect();
    (leads, rescored)
}

fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '_') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn label(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
