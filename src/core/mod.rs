pub mod export;
pub mod ingest;
pub mod metrics;
pub mod predicate;
pub mod scoring;
pub mod table;
pub mod update;

pub use crate::domain::model::{FieldValue, TableRecord};
pub use crate::domain::ports::{ConfigProvider, DataSource, Formatter, Page, PageRequest};
pub use crate::utils::error::Result;
