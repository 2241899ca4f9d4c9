use crate::core::scoring::ScoringPolicy;
use crate::core::table::SortDirection;
use crate::core::ConfigProvider;
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_PAGE_SIZE: usize = 100;

/// Dashboard settings read from a TOML file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub table: TableConfig,
    pub scoring: ScoringPolicy,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub page_size: usize,
    pub default_sort_key: String,
    pub default_sort_direction: String,
    pub search_fields: SearchFieldsConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            default_sort_key: "created_at".to_string(),
            default_sort_direction: "desc".to_string(),
            search_fields: SearchFieldsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFieldsConfig {
    pub leads: Vec<String>,
    pub couples: Vec<String>,
}

impl Default for SearchFieldsConfig {
    fn default() -> Self {
        Self {
            leads: strings(&["couple_name", "email", "location"]),
            couples: strings(&["partner_1_name", "partner_2_name", "wedding_city", "venue_name"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl DeskConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeskError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeskError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range("table.page_size", self.table.page_size, 1, MAX_PAGE_SIZE)?;
        validation::validate_non_empty_string("table.default_sort_key", &self.table.default_sort_key)?;
        validation::validate_one_of(
            "table.default_sort_direction",
            &self.table.default_sort_direction.to_ascii_lowercase(),
            &["asc", "desc"],
        )?;

        for (field, values) in [
            ("table.search_fields.leads", &self.table.search_fields.leads),
            ("table.search_fields.couples", &self.table.search_fields.couples),
        ] {
            for value in values {
                validation::validate_non_empty_string(field, value)?;
            }
            validation::validate_unique(field, values)?;
        }

        self.validate_scoring()?;

        validation::validate_one_of(
            "logging.level",
            &self.logging.level.to_ascii_lowercase(),
            &["trace", "debug", "info", "warn", "error"],
        )?;

        Ok(())
    }

    fn validate_scoring(&self) -> Result<()> {
        let scoring = &self.scoring;
        validation::validate_non_negative("scoring.base", scoring.base)?;
        validation::validate_non_negative("scoring.platform_bonus", scoring.platform_bonus)?;

        for tier in &scoring.income_tiers {
            validation::validate_non_negative("scoring.income_tiers.min", tier.min)?;
            validation::validate_non_negative("scoring.income_tiers.bonus", tier.bonus)?;
        }
        for bonus in scoring.credit_brackets.values() {
            validation::validate_non_negative("scoring.credit_brackets", *bonus)?;
        }
        for bonus in scoring.timelines.values() {
            validation::validate_non_negative("scoring.timelines", *bonus)?;
        }
        for platform in &scoring.high_quality_platforms {
            validation::validate_non_empty_string("scoring.high_quality_platforms", platform)?;
        }
        Ok(())
    }

    pub fn default_sort(&self) -> (String, SortDirection) {
        let direction = self
            .table
            .default_sort_direction
            .parse()
            .unwrap_or(SortDirection::Desc);
        (self.table.default_sort_key.clone(), direction)
    }
}

impl ConfigProvider for DeskConfig {
    fn page_size(&self) -> usize {
        self.table.page_size
    }

    fn lead_search_fields(&self) -> &[String] {
        &self.table.search_fields.leads
    }

    fn couple_search_fields(&self) -> &[String] {
        &self.table.search_fields.couples
    }

    fn scoring_policy(&self) -> ScoringPolicy {
        self.scoring.clone()
    }
}

impl Validate for DeskConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
