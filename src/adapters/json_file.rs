use crate::adapters::memory::InMemorySource;
use crate::domain::model::TableRecord;
use crate::domain::ports::{DataSource, Page, PageRequest};
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Reads records from a JSON file holding either `{ "items": [...], "total_count": n }` or a bare
/// array. The file is read again on every fetch so edits show up in the next snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    search_fields: Vec<String>,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            search_fields: Vec::new(),
        }
    }

    pub fn with_search_fields(mut self, fields: Vec<String>) -> Self {
        self.search_fields = fields;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let content = std::fs::read_to_string(&self.path)?;
        let records = parse_records(&content)?;
        tracing::debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

/// Accepts both list response shapes.
pub fn parse_records<T: DeserializeOwned>(content: &str) -> Result<Vec<T>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("items") => {
            let items = map.remove("items").unwrap_or_default();
            Ok(serde_json::from_value(items)?)
        }
        other => Ok(serde_json::from_value(other)?),
    }
}

impl<T> DataSource<T> for JsonFileSource
where
    T: TableRecord + DeserializeOwned + Clone + Send + Sync,
{
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>> {
        InMemorySource::new(self.load::<T>()?)
            .with_search_fields(self.search_fields.clone())
            .fetch_page(request)
    }

    fn fetch_all(&self) -> Result<Vec<T>> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Lead;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LEADS: &str = r#"[
        {"id": 1, "status": "new", "lead_score": 91, "couple_name": "Lisa & Tom Chen", "created_at": "2024-01-14"},
        {"id": 2, "status": "qualified", "lead_score": 85, "couple_name": "Sarah & Mike Johnson", "created_at": "2024-01-10"}
    ]"#;

    #[test]
    fn test_bare_array_and_paged_shapes() {
        let bare: Vec<Lead> = parse_records(LEADS).unwrap();
        assert_eq!(bare.len(), 2);

        let paged = format!(r#"{{"items": {}, "total_count": 2}}"#, LEADS);
        let from_page: Vec<Lead> = parse_records(&paged).unwrap();
        assert_eq!(from_page, bare);
    }

    #[test]
    fn test_fetch_page_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LEADS.as_bytes()).unwrap();

        let source = JsonFileSource::new(file.path()).with_search_fields(vec!["couple_name".to_string()]);
        let page: Page<Lead> = source
            .fetch_page(&PageRequest {
                search: Some("chen".to_string()),
                ..PageRequest::default()
            })
            .unwrap();

        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, "1");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        let result: Result<Vec<Lead>> = source.fetch_all();
        assert!(matches!(result, Err(crate::utils::error::DeskError::IoError(_))));
    }
}
