use crate::core::predicate::{FilterCriteria, SCORE_FIELD};
use crate::core::table::SortDirection;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lead-desk")]
#[command(about = "Filter, score and page through wedding-lead pipelines")]
pub struct CliConfig {
    #[arg(long, help = "TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Leads JSON (paged response or bare array)")]
    pub leads: PathBuf,

    #[arg(long, help = "Couples JSON, used to score leads that lack their own attributes")]
    pub couples: Option<PathBuf>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub platform: Option<String>,

    #[arg(long, help = "high, medium or low")]
    pub score_band: Option<String>,

    #[arg(long)]
    pub min_score: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, help = "Column to sort by (defaults to the configured sort)")]
    pub sort: Option<String>,

    #[arg(long, help = "Sort descending")]
    pub desc: bool,

    #[arg(long, default_value = "1", help = "Page to show; out-of-range pages clamp to the nearest one")]
    pub page: usize,

    #[arg(long)]
    pub page_size: Option<usize>,

    #[arg(long, help = "Write the filtered, sorted rows to this CSV file")]
    pub export: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Flags that narrow the table, as one criteria set.
    pub fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        for (field, value) in [
            ("status", &self.status),
            ("priority", &self.priority),
            ("platform", &self.platform),
        ] {
            if let Some(value) = value {
                criteria = criteria.with_equals(field, value.clone());
            }
        }
        if let Some(band) = &self.score_band {
            criteria = criteria.with_score_band(band.clone());
        }
        if let Some(min) = &self.min_score {
            criteria = criteria.with_min(SCORE_FIELD, min.clone());
        }
        if let Some(search) = &self.search {
            criteria = criteria.with_search(search.clone());
        }
        criteria
    }

    pub fn sort_override(&self) -> Option<(String, SortDirection)> {
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.sort.clone().map(|key| (key, direction))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(page_size) = self.page_size {
            validation::validate_range("page_size", page_size, 1, super::toml_config::MAX_PAGE_SIZE)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::predicate::Predicate;
    use crate::core::table::{ColumnDef, TableEngine};
    use crate::domain::model::FieldValue;
    use crate::domain::model::TableRecord;

    struct Row(&'static str, f64);

    impl TableRecord for Row {
        fn record_id(&self) -> Option<&str> {
            Some("1")
        }

        fn field(&self, key: &str) -> FieldValue {
            match key {
                "status" => FieldValue::text(self.0),
                "lead_score" => FieldValue::Number(self.1),
                _ => FieldValue::Empty,
            }
        }
    }

    #[test]
    fn test_flags_become_criteria() {
        let config = CliConfig::parse_from([
            "lead-desk",
            "--leads",
            "leads.json",
            "--status",
            "qualified",
            "--min-score",
            "80",
            "--sort",
            "lead_score",
            "--desc",
        ]);

        let predicate = Predicate::compile(&config.criteria(), &[]);
        assert!(predicate.matches(&Row("qualified", 85.0)));
        assert!(!predicate.matches(&Row("qualified", 72.0)));
        assert!(!predicate.matches(&Row("new", 91.0)));
        assert_eq!(
            config.sort_override(),
            Some(("lead_score".to_string(), SortDirection::Desc))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_zero_is_accepted_and_clamped_by_the_table() {
        let config = CliConfig::parse_from(["lead-desk", "--leads", "x.json", "--page", "0"]);
        assert!(config.validate().is_ok());

        let rows = vec![Row("new", 50.0)];
        let mut table = TableEngine::new(vec![ColumnDef::new("status", "Status")], 10, rows).unwrap();
        table.paginate(config.page);
        assert_eq!(table.get_page_info().current_page, 1);
    }

    #[test]
    fn test_page_size_bounds() {
        let config = CliConfig::parse_from(["lead-desk", "--leads", "x.json", "--page-size", "0"]);
        assert!(config.validate().is_err());
    }
}
