use crate::domain::model::TableRecord;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordWarning {
    /// The record at `position` in the snapshot had no id and was left out.
    MissingId { position: usize },
    /// A later record repeated an id already admitted; the first one wins.
    DuplicateId { position: usize, id: String },
    /// A lead score outside `0..=100` was clamped.
    ScoreClamped { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub warnings: Vec<RecordWarning>,
}

impl IngestReport {
    pub fn dropped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| !matches!(w, RecordWarning::ScoreClamped { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Keeps records that carry a unique id, in snapshot order. Kept records are normalized, so no
/// lead leaves ingestion with a score outside `0..=100`.
pub fn admit<T: TableRecord>(records: Vec<T>) -> (Vec<T>, IngestReport) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();

    for (position, mut record) in records.into_iter().enumerate() {
        let Some(id) = record.record_id().map(str::to_string) else {
            tracing::warn!("Dropping record at position {}: missing id", position);
            warnings.push(RecordWarning::MissingId { position });
            continue;
        };
        if seen.contains(&id) {
            tracing::warn!("Dropping record at position {}: duplicate id '{}'", position, id);
            warnings.push(RecordWarning::DuplicateId { position, id });
            continue;
        }
        if record.normalize() {
            tracing::warn!("Record '{}' had its score clamped into range", id);
            warnings.push(RecordWarning::ScoreClamped { id: id.clone() });
        }
        seen.insert(id);
        kept.push(record);
    }

    let report = IngestReport {
        accepted: kept.len(),
        warnings,
    };
    (kept, report)
}
