use crate::core::predicate::{FilterCriteria, Predicate, SCORE_FIELD};
use crate::domain::model::TableRecord;
use crate::domain::ports::{DataSource, Page, PageRequest};
use crate::utils::error::{DeskError, Result};

/// Serves fixed records the way a list endpoint would: filter, count, then slice a page.
#[derive(Debug, Clone)]
pub struct InMemorySource<T> {
    records: Vec<T>,
    search_fields: Vec<String>,
}

impl<T> InMemorySource<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            search_fields: Vec::new(),
        }
    }

    pub fn with_search_fields(mut self, fields: Vec<String>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> DataSource<T> for InMemorySource<T>
where
    T: TableRecord + Clone + Send + Sync,
{
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>> {
        if request.page_size == 0 {
            return Err(DeskError::DataSourceError {
                message: "page_size must be at least 1".to_string(),
            });
        }

        let mut criteria = FilterCriteria::new();
        if let Some(status) = &request.status {
            criteria = criteria.with_equals("status", status.clone());
        }
        if let Some(min_score) = request.min_score {
            criteria = criteria.with_min(SCORE_FIELD, min_score.to_string());
        }
        if let Some(search) = &request.search {
            criteria = criteria.with_search(search.clone());
        }
        let predicate = Predicate::compile(&criteria, &self.search_fields);

        let matching: Vec<&T> = self.records.iter().filter(|r| predicate.matches(*r)).collect();
        // A page far past the end saturates to an empty slice instead of overflowing.
        let offset = (request.page.max(1) - 1).saturating_mul(request.page_size);
        let items = matching
            .iter()
            .skip(offset)
            .take(request.page_size)
            .map(|r| (*r).clone())
            .collect();

        Ok(Page {
            items,
            total_count: matching.len(),
        })
    }

    fn fetch_all(&self) -> Result<Vec<T>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FieldValue;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        key: String,
        status: &'static str,
        score: f64,
    }

    impl TableRecord for Row {
        fn record_id(&self) -> Option<&str> {
            Some(&self.key)
        }

        fn field(&self, key: &str) -> FieldValue {
            match key {
                "status" => FieldValue::text(self.status),
                "lead_score" => FieldValue::Number(self.score),
                _ => FieldValue::Empty,
            }
        }
    }

    fn source() -> InMemorySource<Row> {
        InMemorySource::new(
            (1..=12)
                .map(|id| Row {
                    id,
                    key: id.to_string(),
                    status: if id <= 4 { "new" } else { "qualified" },
                    score: id as f64 * 8.0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_paged_response_counts_all_matches() {
        let page = source()
            .fetch_page(&PageRequest {
                page: 2,
                page_size: 5,
                status: Some("qualified".to_string()),
                ..PageRequest::default()
            })
            .unwrap();

        assert_eq!(page.total_count, 8);
        let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_min_score_filter() {
        let page = source()
            .fetch_page(&PageRequest {
                min_score: Some(80.0),
                ..PageRequest::default()
            })
            .unwrap();
        assert_eq!(page.total_count, 3);
    }

    #[test]
    fn test_page_past_the_end_is_empty_with_full_count() {
        let page = source()
            .fetch_page(&PageRequest {
                page: usize::MAX,
                page_size: 50,
                ..PageRequest::default()
            })
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 12);
    }

    #[test]
    fn test_zero_page_size_is_an_error() {
        let request = PageRequest {
            page_size: 0,
            ..PageRequest::default()
        };
        assert!(source().fetch_page(&request).is_err());
    }
}
