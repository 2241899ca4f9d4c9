pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::DeskConfig;

pub use adapters::{InMemorySource, JsonFileSource};
pub use core::predicate::{FilterCriteria, Predicate};
pub use core::scoring::{compute_score, ScoreInput, ScoringPolicy};
pub use core::table::{ColumnDef, PageInfo, SortDirection, TableEngine};
pub use domain::model::{Campaign, Couple, FieldValue, Lead, LeadStatus, TableRecord};
pub use utils::error::{DeskError, Result};
