//! Render-agnostic table controller.
//!
//! [`TableEngine`] owns a record snapshot, the column definitions and a [`TableState`]. Every
//! operation computes a complete new state through [`TableEngine::reduce`] and swaps it in, so a
//! caller never observes a half-applied transition. Rows are always projected in the fixed order
//! filter, sort, paginate.
//!
//! Invariants held after every operation:
//! - the stored selection only holds ids present in the current records;
//! - `current_page` lies in `1..=page_count`, and is 1 when nothing passes the filter.

use crate::core::ingest::{self, IngestReport};
use crate::core::predicate::{FilterCriteria, Predicate};
use crate::domain::model::{FieldValue, TableRecord};
use crate::domain::ports::Formatter;
use crate::utils::error::{DeskError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

pub struct ColumnDef<T> {
    pub key: String,
    pub title: String,
    pub sortable: bool,
    pub align: Align,
    formatter: Option<Box<dyn Formatter<T>>>,
}

impl<T> ColumnDef<T> {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            sortable: false,
            align: Align::Left,
            formatter: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn formatter(mut self, formatter: impl Formatter<T> + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }
}

impl<T: TableRecord> ColumnDef<T> {
    /// Display text for this column of `record`.
    pub fn display(&self, record: &T) -> String {
        let value = record.field(&self.key);
        match &self.formatter {
            Some(formatter) => formatter.format(&value, record),
            None => value.to_string(),
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("sortable", &self.sortable)
            .field("align", &self.align)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub sort: Option<SortState>,
    pub criteria: FilterCriteria,
    pub selected: BTreeSet<String>,
    pub current_page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    SetFilter(FilterCriteria),
    Sort { key: String, direction: SortDirection },
    ToggleSort(String),
    ToggleSelect { id: String, selected: bool },
    SelectAll(bool),
    ClearSelection,
    Paginate(usize),
    SetPageSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub page_count: usize,
    pub total_filtered: usize,
    pub page_size: usize,
    /// 1-based position of the first row on the page; 0 when the page is empty.
    pub first_item: usize,
    pub last_item: usize,
}

pub struct TableEngine<T> {
    columns: Vec<ColumnDef<T>>,
    search_fields: Vec<String>,
    records: Vec<T>,
    state: TableState,
    last_report: IngestReport,
}

impl<T: TableRecord> TableEngine<T> {
    /// Builds an engine over `records`. A zero page size or an ambiguous column set is a
    /// programming error and is reported as [`DeskError::ContractViolation`].
    pub fn new(columns: Vec<ColumnDef<T>>, page_size: usize, records: Vec<T>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DeskError::contract("TableEngine::new", "at least one column is required"));
        }
        let mut keys = HashSet::new();
        for column in &columns {
            if !keys.insert(column.key.as_str()) {
                return Err(DeskError::contract(
                    "TableEngine::new",
                    format!("duplicate column key '{}'", column.key),
                ));
            }
        }
        check_page_size("TableEngine::new", page_size)?;

        let mut engine = Self {
            columns,
            search_fields: Vec::new(),
            records: Vec::new(),
            state: TableState {
                sort: None,
                criteria: FilterCriteria::default(),
                selected: BTreeSet::new(),
                current_page: 1,
                page_size,
            },
            last_report: IngestReport::default(),
        };
        engine.set_records(records);
        Ok(engine)
    }

    pub fn with_search_fields(mut self, fields: Vec<String>) -> Self {
        self.search_fields = fields;
        self.state = self.normalized(self.state.clone());
        self
    }

    /// Applies an initial sort; an unknown key leaves the table unsorted.
    pub fn with_default_sort(mut self, key: &str, direction: SortDirection) -> Self {
        self.sort(key, direction);
        self
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Replaces the dataset. Records without an id (or repeating one) are left out and reported;
    /// the selection shrinks to ids that survived.
    pub fn set_records(&mut self, records: Vec<T>) -> IngestReport {
        let (records, report) = ingest::admit(records);

        let present: HashSet<&str> = records.iter().filter_map(|r| r.record_id()).collect();
        let mut next = self.state.clone();
        let before = next.selected.len();
        next.selected.retain(|id| present.contains(id.as_str()));
        if next.selected.len() != before {
            tracing::debug!(
                "Selection pruned from {} to {} ids after dataset replacement",
                before,
                next.selected.len()
            );
        }

        let total = self.count_matching(&records, &next.criteria);
        self.records = records;
        self.state = normalize_page(next, total);
        self.last_report = report.clone();
        tracing::debug!("Table holds {} records", self.records.len());
        report
    }

    /// Outcome of the most recent dataset replacement.
    pub fn ingest_report(&self) -> &IngestReport {
        &self.last_report
    }

    pub fn dispatch(&mut self, action: TableAction) -> Result<()> {
        let next = self.reduce(&self.state, action)?;
        self.state = next;
        Ok(())
    }

    /// Pure transition: computes the state `action` leads to without touching `self`.
    pub fn reduce(&self, state: &TableState, action: TableAction) -> Result<TableState> {
        let mut next = state.clone();
        match action {
            TableAction::SetFilter(criteria) => {
                next.criteria = criteria;
                next.current_page = 1;
            }
            TableAction::Sort { key, direction } => {
                if self.is_sortable(&key) {
                    next.sort = Some(SortState { key, direction });
                } else {
                    tracing::debug!("Ignoring sort on unknown column '{}'", key);
                }
            }
            TableAction::ToggleSort(key) => {
                if self.is_sortable(&key) {
                    let direction = match &state.sort {
                        Some(current) if current.key == key && current.direction == SortDirection::Asc => {
                            SortDirection::Desc
                        }
                        _ => SortDirection::Asc,
                    };
                    next.sort = Some(SortState { key, direction });
                } else {
                    tracing::debug!("Ignoring sort on unknown column '{}'", key);
                }
            }
            TableAction::ToggleSelect { id, selected } => {
                if !self.contains_id(&id) {
                    tracing::debug!("Ignoring selection of unknown id '{}'", id);
                } else if selected {
                    next.selected.insert(id);
                } else {
                    next.selected.remove(&id);
                }
            }
            TableAction::SelectAll(true) => {
                let predicate = self.predicate(&next.criteria);
                next.selected = self
                    .records
                    .iter()
                    .filter(|r| predicate.matches(*r))
                    .filter_map(|r| r.record_id().map(str::to_string))
                    .collect();
            }
            TableAction::SelectAll(false) | TableAction::ClearSelection => {
                next.selected.clear();
            }
            TableAction::Paginate(page) => {
                next.current_page = page;
            }
            TableAction::SetPageSize(page_size) => {
                check_page_size("TableEngine::set_page_size", page_size)?;
                next.page_size = page_size;
                next.current_page = 1;
            }
        }
        Ok(self.normalized(next))
    }

    pub fn set_filter(&mut self, criteria: FilterCriteria) {
        self.apply(TableAction::SetFilter(criteria));
    }

    pub fn sort(&mut self, key: &str, direction: SortDirection) {
        self.apply(TableAction::Sort {
            key: key.to_string(),
            direction,
        });
    }

    pub fn toggle_sort(&mut self, key: &str) {
        self.apply(TableAction::ToggleSort(key.to_string()));
    }

    pub fn toggle_select(&mut self, id: &str, selected: bool) {
        self.apply(TableAction::ToggleSelect {
            id: id.to_string(),
            selected,
        });
    }

    pub fn select_all(&mut self, selected: bool) {
        self.apply(TableAction::SelectAll(selected));
    }

    pub fn clear_selection(&mut self) {
        self.apply(TableAction::ClearSelection);
    }

    pub fn paginate(&mut self, page: usize) {
        self.apply(TableAction::Paginate(page));
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        self.dispatch(TableAction::SetPageSize(page_size))
    }

    /// Rows that pass the filter, in sort order, before pagination.
    pub fn filtered_rows(&self) -> Vec<&T> {
        let predicate = self.predicate(&self.state.criteria);
        let mut rows: Vec<&T> = self.records.iter().filter(|r| predicate.matches(*r)).collect();
        if let Some(sort) = &self.state.sort {
            sort_rows(&mut rows, sort);
        }
        rows
    }

    /// The current page: filter, then sort, then paginate.
    pub fn get_visible_rows(&self) -> Vec<&T> {
        let rows = self.filtered_rows();
        let start = (self.state.current_page - 1) * self.state.page_size;
        rows.into_iter().skip(start).take(self.state.page_size).collect()
    }

    /// Selected ids that are still visible under the current filter, in view order.
    pub fn get_selection(&self) -> Vec<String> {
        self.filtered_rows()
            .into_iter()
            .filter_map(|r| r.record_id())
            .filter(|id| self.state.selected.contains(*id))
            .map(str::to_string)
            .collect()
    }

    pub fn get_page_info(&self) -> PageInfo {
        let total_filtered = self.count_matching(&self.records, &self.state.criteria);
        let page_size = self.state.page_size;
        let current_page = self.state.current_page;
        let (first_item, last_item) = if total_filtered == 0 {
            (0, 0)
        } else {
            let first = (current_page - 1) * page_size + 1;
            (first, (current_page * page_size).min(total_filtered))
        };

        PageInfo {
            current_page,
            page_count: page_count(total_filtered, page_size),
            total_filtered,
            page_size,
            first_item,
            last_item,
        }
    }

    // Transitions that cannot fail go through here.
    fn apply(&mut self, action: TableAction) {
        match self.reduce(&self.state, action) {
            Ok(next) => self.state = next,
            Err(e) => tracing::debug!("Table transition rejected: {}", e),
        }
    }

    fn normalized(&self, state: TableState) -> TableState {
        let total = self.count_matching(&self.records, &state.criteria);
        normalize_page(state, total)
    }

    fn predicate(&self, criteria: &FilterCriteria) -> Predicate {
        Predicate::compile(criteria, &self.search_fields)
    }

    fn count_matching(&self, records: &[T], criteria: &FilterCriteria) -> usize {
        let predicate = self.predicate(criteria);
        records.iter().filter(|r| predicate.matches(*r)).count()
    }

    fn is_sortable(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key && c.sortable)
    }

    fn contains_id(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.record_id() == Some(id))
    }
}

fn check_page_size(operation: &str, page_size: usize) -> Result<()> {
    if page_size == 0 {
        return Err(DeskError::contract(operation, "page size must be at least 1"));
    }
    Ok(())
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

fn normalize_page(mut state: TableState, total_filtered: usize) -> TableState {
    let last = page_count(total_filtered, state.page_size);
    state.current_page = state.current_page.clamp(1, last);
    state
}

/// Comparable projection of a field value. Variant order is the rank across mixed types.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Number(OrderedFloat<f64>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Empty => None,
            FieldValue::Number(n) => Some(SortValue::Number(OrderedFloat(n))),
            FieldValue::Date(d) => Some(SortValue::Date(d)),
            FieldValue::Timestamp(t) => Some(SortValue::Timestamp(t)),
            FieldValue::Text(s) => Some(SortValue::Text(s.trim().to_lowercase())),
        }
    }
}

/// Ids that look like integers order numerically and ahead of the rest. The raw text settles
/// ids with the same numeric value ("7" and "07"), so distinct ids never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum IdKey {
    Numeric(u64, String),
    Text(String),
}

impl IdKey {
    fn of(id: Option<&str>) -> Self {
        let id = id.unwrap_or_default();
        match id.parse::<u64>() {
            Ok(n) => IdKey::Numeric(n, id.to_string()),
            Err(_) => IdKey::Text(id.to_string()),
        }
    }
}

// Empty values go last in either direction; equal keys fall back to ascending id.
fn sort_rows<T: TableRecord>(rows: &mut Vec<&T>, sort: &SortState) {
    let mut keyed: Vec<(Option<SortValue>, IdKey, &T)> = rows
        .drain(..)
        .map(|r| {
            (
                SortValue::from_field(r.field(&sort.key)),
                IdKey::of(r.record_id()),
                r,
            )
        })
        .collect();

    keyed.sort_by(|a, b| {
        let primary = match (&a.0, &b.0) {
            (Some(x), Some(y)) => match sort.direction {
                SortDirection::Asc => x.cmp(y),
                SortDirection::Desc => y.cmp(x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        primary.then_with(|| a.1.cmp(&b.1))
    });

    rows.extend(keyed.into_iter().map(|(_, _, r)| r));
}
