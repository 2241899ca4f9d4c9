use crate::core::scoring::ScoringPolicy;
use crate::domain::model::FieldValue;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Query parameters of a paged list endpoint. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub search: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
            status: None,
            min_score: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
}

/// Supplies record snapshots to the core. Implementations own all I/O.
pub trait DataSource<T>: Send + Sync {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>>;

    /// Everything the source holds, for small unpaged collections.
    fn fetch_all(&self) -> Result<Vec<T>>;
}

/// Turns a column value into display text. Closures qualify.
pub trait Formatter<T>: Send + Sync {
    fn format(&self, value: &FieldValue, record: &T) -> String;
}

impl<T, F> Formatter<T> for F
where
    F: Fn(&FieldValue, &T) -> String + Send + Sync,
{
    fn format(&self, value: &FieldValue, record: &T) -> String {
        self(value, record)
    }
}

pub trait ConfigProvider: Send + Sync {
    fn page_size(&self) -> usize;
    fn lead_search_fields(&self) -> &[String];
    fn couple_search_fields(&self) -> &[String];
    fn scoring_policy(&self) -> ScoringPolicy;
}
