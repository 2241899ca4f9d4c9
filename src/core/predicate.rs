//! Composes independent filter criteria into one match function.
//!
//! Every criterion is optional and an unset or blank criterion matches everything. Inputs that
//! cannot be interpreted (a non-numeric bound, an unknown score band) impose no constraint.

use crate::domain::model::{FieldValue, TableRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCORE_FIELD: &str = "lead_score";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Case-insensitive substring searched across the configured search fields.
    pub search: Option<String>,
    /// Exact equality on enum-like fields (`status`, `priority`, `platform`, ...).
    pub equals: BTreeMap<String, String>,
    /// Case-insensitive substring on a single field (`wedding_city`, `wedding_state`).
    pub contains: BTreeMap<String, String>,
    /// Inclusive numeric bounds, kept as raw text until evaluated.
    pub ranges: Vec<RangeCriterion>,
    /// `high`, `medium` or `low` over the lead score.
    pub score_band: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCriterion {
    pub field: String,
    pub min: Option<String>,
    pub max: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn with_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    pub fn with_contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.contains.insert(field.into(), value.into());
        self
    }

    pub fn with_min(mut self, field: impl Into<String>, min: impl Into<String>) -> Self {
        self.ranges.push(RangeCriterion {
            field: field.into(),
            min: Some(min.into()),
            max: None,
        });
        self
    }

    pub fn with_range(
        mut self,
        field: impl Into<String>,
        min: Option<String>,
        max: Option<String>,
    ) -> Self {
        self.ranges.push(RangeCriterion {
            field: field.into(),
            min,
            max,
        });
        self
    }

    pub fn with_score_band(mut self, band: impl Into<String>) -> Self {
        self.score_band = Some(band.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(ScoreBand::High),
            "medium" => Some(ScoreBand::Medium),
            "low" => Some(ScoreBand::Low),
            _ => None,
        }
    }

    pub fn contains(&self, score: f64) -> bool {
        match self {
            ScoreBand::High => score >= 80.0,
            ScoreBand::Medium => (60.0..80.0).contains(&score),
            ScoreBand::Low => score < 60.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Bounds {
    field: String,
    min: Option<f64>,
    max: Option<f64>,
}

/// Compiled form of [`FilterCriteria`]: the AND of every active criterion.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    search: Option<String>,
    search_fields: Vec<String>,
    equals: Vec<(String, String)>,
    contains: Vec<(String, String)>,
    bounds: Vec<Bounds>,
    band: Option<ScoreBand>,
}

impl Predicate {
    pub fn compile(criteria: &FilterCriteria, search_fields: &[String]) -> Self {
        let search = non_blank(criteria.search.as_deref()).map(|q| q.to_lowercase());
        if search.is_some() && search_fields.is_empty() {
            tracing::debug!("Search query ignored: no searchable fields configured");
        }

        let equals = criteria
            .equals
            .iter()
            .filter_map(|(field, value)| {
                non_blank(Some(value)).map(|v| (field.clone(), v.to_string()))
            })
            .collect();

        let contains = criteria
            .contains
            .iter()
            .filter_map(|(field, value)| {
                non_blank(Some(value)).map(|v| (field.clone(), v.to_lowercase()))
            })
            .collect();

        let bounds = criteria
            .ranges
            .iter()
            .filter_map(|range| {
                let min = parse_bound(&range.field, range.min.as_deref());
                let max = parse_bound(&range.field, range.max.as_deref());
                if min.is_none() && max.is_none() {
                    None
                } else {
                    Some(Bounds {
                        field: range.field.clone(),
                        min,
                        max,
                    })
                }
            })
            .collect();

        let band = non_blank(criteria.score_band.as_deref()).and_then(|raw| {
            let band = ScoreBand::parse(raw);
            if band.is_none() {
                tracing::debug!("Unknown score band '{}' ignored", raw);
            }
            band
        });

        Self {
            search: if search_fields.is_empty() { None } else { search },
            search_fields: search_fields.to_vec(),
            equals,
            contains,
            bounds,
            band,
        }
    }

    /// True when no criterion constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.search.is_none()
            && self.equals.is_empty()
            && self.contains.is_empty()
            && self.bounds.is_empty()
            && self.band.is_none()
    }

    pub fn matches<T: TableRecord>(&self, record: &T) -> bool {
        self.matches_search(record)
            && self.matches_equals(record)
            && self.matches_contains(record)
            && self.matches_bounds(record)
            && self.matches_band(record)
    }

    fn matches_search<T: TableRecord>(&self, record: &T) -> bool {
        let Some(query) = &self.search else {
            return true;
        };
        self.search_fields.iter().any(|field| {
            let value = record.field(field);
            !value.is_empty() && value.to_string().to_lowercase().contains(query.as_str())
        })
    }

    fn matches_equals<T: TableRecord>(&self, record: &T) -> bool {
        self.equals.iter().all(|(field, expected)| {
            let value = record.field(field);
            !value.is_empty() && value.to_string() == *expected
        })
    }

    fn matches_contains<T: TableRecord>(&self, record: &T) -> bool {
        self.contains.iter().all(|(field, needle)| {
            let value = record.field(field);
            !value.is_empty() && value.to_string().to_lowercase().contains(needle.as_str())
        })
    }

    fn matches_bounds<T: TableRecord>(&self, record: &T) -> bool {
        self.bounds.iter().all(|bounds| {
            let Some(n) = record.field(&bounds.field).as_number() else {
                return false;
            };
            bounds.min.map_or(true, |min| n >= min) && bounds.max.map_or(true, |max| n <= max)
        })
    }

    fn matches_band<T: TableRecord>(&self, record: &T) -> bool {
        let Some(band) = self.band else {
            return true;
        };
        match record.field(SCORE_FIELD) {
            FieldValue::Number(score) => band.contains(score),
            _ => false,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(field: &str, raw: Option<&str>) -> Option<f64> {
    let raw = non_blank(raw)?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => {
            tracing::debug!("Non-numeric bound '{}' for '{}' ignored", raw, field);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        id: &'static str,
        name: &'static str,
        city: Option<&'static str>,
        status: &'static str,
        score: f64,
    }

    impl TableRecord for Row {
        fn record_id(&self) -> Option<&str> {
            Some(self.id)
        }

        fn field(&self, key: &str) -> FieldValue {
            match key {
                "name" => FieldValue::text(self.name),
                "city" => FieldValue::opt_text(self.city),
                "status" => FieldValue::text(self.status),
                "lead_score" => FieldValue::Number(self.score),
                _ => FieldValue::Empty,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: "1", name: "Sarah Johnson", city: Some("Napa"), status: "qualified", score: 85.0 },
            Row { id: "2", name: "Emma Wilson", city: Some("Austin"), status: "contacted", score: 72.0 },
            Row { id: "3", name: "Lisa Chen", city: Some("Seattle"), status: "new", score: 91.0 },
            Row { id: "4", name: "Amy Chen", city: None, status: "qualified", score: 55.0 },
        ]
    }

    fn fields() -> Vec<String> {
        vec!["name".to_string(), "city".to_string()]
    }

    fn matching_ids(criteria: &FilterCriteria) -> Vec<&'static str> {
        let predicate = Predicate::compile(criteria, &fields());
        rows().into_iter().filter(|r| predicate.matches(r)).map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let predicate = Predicate::compile(&FilterCriteria::new(), &fields());
        assert!(predicate.is_unconstrained());
        assert_eq!(matching_ids(&FilterCriteria::new()), vec!["1", "2", "3", "4"]);

        let blanks = FilterCriteria::new()
            .with_search("   ")
            .with_equals("status", "")
            .with_score_band("");
        assert_eq!(matching_ids(&blanks), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        assert_eq!(matching_ids(&FilterCriteria::new().with_search("CHEN")), vec!["3", "4"]);
        assert_eq!(matching_ids(&FilterCriteria::new().with_search("aust")), vec!["2"]);
    }

    #[test]
    fn test_combined_criteria_are_a_conjunction() {
        let both = FilterCriteria::new()
            .with_equals("status", "qualified")
            .with_search("chen");
        let status_only = Predicate::compile(
            &FilterCriteria::new().with_equals("status", "qualified"),
            &fields(),
        );
        let search_only = Predicate::compile(&FilterCriteria::new().with_search("chen"), &fields());
        let combined = Predicate::compile(&both, &fields());

        for row in rows() {
            assert_eq!(
                combined.matches(&row),
                status_only.matches(&row) && search_only.matches(&row)
            );
        }
        assert_eq!(matching_ids(&both), vec!["4"]);
    }

    #[test]
    fn test_malformed_bound_is_no_constraint() {
        let criteria = FilterCriteria::new().with_min("lead_score", "eighty");
        assert!(Predicate::compile(&criteria, &fields()).is_unconstrained());
        assert_eq!(matching_ids(&criteria), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_numeric_range_is_inclusive() {
        let criteria = FilterCriteria::new().with_range(
            "lead_score",
            Some("72".to_string()),
            Some("85".to_string()),
        );
        assert_eq!(matching_ids(&criteria), vec!["1", "2"]);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(matching_ids(&FilterCriteria::new().with_score_band("high")), vec!["1", "3"]);
        assert_eq!(matching_ids(&FilterCriteria::new().with_score_band("Medium")), vec!["2"]);
        assert_eq!(matching_ids(&FilterCriteria::new().with_score_band("low")), vec!["4"]);
        assert_eq!(
            matching_ids(&FilterCriteria::new().with_score_band("stellar")),
            vec!["1", "2", "3", "4"]
        );
    }

    #[test]
    fn test_contains_skips_missing_values() {
        assert_eq!(matching_ids(&FilterCriteria::new().with_contains("city", "a")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_search_without_fields_is_ignored() {
        let predicate = Predicate::compile(&FilterCriteria::new().with_search("chen"), &[]);
        assert!(rows().iter().all(|r| predicate.matches(r)));
    }
}
