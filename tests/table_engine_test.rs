use lead_desk::core::ingest::RecordWarning;
use lead_desk::core::table::TableAction;
use lead_desk::{ColumnDef, DeskError, FilterCriteria, Lead, SortDirection, TableEngine};
use serde_json::json;

fn lead(id: serde_json::Value, name: &str, status: &str, score: f64) -> Lead {
    serde_json::from_value(json!({
        "id": id,
        "couple_name": name,
        "status": status,
        "lead_score": score,
        "location": "Napa Valley, CA",
        "created_at": "2024-01-10"
    }))
    .unwrap()
}

fn columns() -> Vec<ColumnDef<Lead>> {
    vec![
        ColumnDef::new("couple_name", "Couple").sortable(),
        ColumnDef::new("status", "Status").sortable(),
        ColumnDef::new("lead_score", "Score").sortable(),
        ColumnDef::new("created_at", "Created").sortable(),
    ]
}

fn engine(leads: Vec<Lead>, page_size: usize) -> TableEngine<Lead> {
    TableEngine::new(columns(), page_size, leads)
        .unwrap()
        .with_search_fields(vec!["couple_name".to_string(), "location".to_string()])
}

fn scores(rows: &[&Lead]) -> Vec<f64> {
    rows.iter().map(|l| l.lead_score).collect()
}

fn ids(rows: &[&Lead]) -> Vec<String> {
    rows.iter().map(|l| l.id.clone()).collect()
}

#[test]
fn test_sort_desc_then_first_page() {
    let leads = vec![
        lead(json!(1), "Sarah & Mike Johnson", "qualified", 85.0),
        lead(json!(2), "Emma & David Wilson", "contacted", 72.0),
        lead(json!(3), "Lisa & Tom Chen", "new", 91.0),
        lead(json!(4), "Rachel & James Brown", "application", 68.0),
    ];
    let mut table = engine(leads, 2);

    table.sort("lead_score", SortDirection::Desc);
    assert_eq!(scores(&table.filtered_rows()), vec![91.0, 85.0, 72.0, 68.0]);

    table.paginate(1);
    assert_eq!(scores(&table.get_visible_rows()), vec![91.0, 85.0]);

    let info = table.get_page_info();
    assert_eq!(info.page_count, 2);
    assert_eq!(info.total_filtered, 4);
    assert_eq!((info.first_item, info.last_item), (1, 2));
}

#[test]
fn test_combined_filter_is_conjunction() {
    let leads = vec![
        lead(json!(1), "Lisa & Tom Chen", "qualified", 91.0),
        lead(json!(2), "Amy Chen & Bo Park", "new", 70.0),
        lead(json!(3), "Sarah & Mike Johnson", "qualified", 85.0),
    ];
    let mut table = engine(leads, 10);

    table.set_filter(FilterCriteria::new().with_search("chen"));
    let by_search = ids(&table.filtered_rows());
    table.set_filter(FilterCriteria::new().with_equals("status", "qualified"));
    let by_status = ids(&table.filtered_rows());

    table.set_filter(
        FilterCriteria::new()
            .with_search("CHEN")
            .with_equals("status", "qualified"),
    );
    let both = ids(&table.filtered_rows());

    assert_eq!(both, vec!["1".to_string()]);
    for id in &both {
        assert!(by_search.contains(id) && by_status.contains(id));
    }
}

#[test]
fn test_selection_never_outlives_filter() {
    let leads = (1..=6)
        .map(|i| lead(json!(i), &format!("Couple {}", i), if i % 2 == 0 { "qualified" } else { "new" }, 60.0 + i as f64))
        .collect();
    let mut table = engine(leads, 2);

    table.select_all(true);
    assert_eq!(table.get_selection().len(), 6);

    table.set_filter(FilterCriteria::new().with_equals("status", "qualified"));
    let visible: Vec<String> = ids(&table.filtered_rows());
    let selection = table.get_selection();

    assert_eq!(selection.len(), 3);
    assert!(selection.iter().all(|id| visible.contains(id)));

    // widening the filter again brings the stored selection back
    table.set_filter(FilterCriteria::new());
    assert_eq!(table.get_selection().len(), 6);
}

#[test]
fn test_pagination_clamps() {
    let leads = (1..=25)
        .map(|i| lead(json!(i), &format!("Couple {}", i), "new", 50.0))
        .collect();
    let mut table = engine(leads, 10);

    assert_eq!(table.get_page_info().page_count, 3);

    table.paginate(5);
    assert_eq!(table.get_page_info().current_page, 3);
    assert_eq!(table.get_visible_rows().len(), 5);

    table.paginate(0);
    assert_eq!(table.get_page_info().current_page, 1);

    table.set_filter(FilterCriteria::new().with_search("no such couple"));
    let info = table.get_page_info();
    assert_eq!((info.current_page, info.page_count, info.total_filtered), (1, 1, 0));
    assert!(table.get_visible_rows().is_empty());
}

#[test]
fn test_missing_id_is_dropped_and_reported() {
    let leads = vec![
        lead(json!(1), "Sarah & Mike Johnson", "qualified", 85.0),
        lead(json!(null), "Ghost Couple", "new", 99.0),
        lead(json!("   "), "Blank Couple", "new", 98.0),
    ];
    let mut table = engine(leads, 10);

    assert_eq!(table.get_visible_rows().len(), 1);
    assert_eq!(table.ingest_report().dropped(), 2);

    table.select_all(true);
    table.toggle_select("", true);
    assert_eq!(table.get_selection(), vec!["1".to_string()]);
}

#[test]
fn test_replacing_records_prunes_selection() {
    let mut table = engine(
        vec![
            lead(json!(1), "A", "new", 50.0),
            lead(json!(2), "B", "new", 60.0),
        ],
        10,
    );
    table.select_all(true);

    let report = table.set_records(vec![
        lead(json!(2), "B", "new", 60.0),
        lead(json!(3), "C", "new", 70.0),
        lead(json!(3), "C again", "new", 75.0),
    ]);

    assert_eq!(report.accepted, 2);
    assert_eq!(report.dropped(), 1);
    assert_eq!(table.get_selection(), vec!["2".to_string()]);
    assert_eq!(table.state().selected.len(), 1);
}

#[test]
fn test_equal_scores_break_ties_by_ascending_id() {
    let leads = vec![
        lead(json!(10), "J", "new", 80.0),
        lead(json!(2), "B", "new", 80.0),
        lead(json!(7), "G", "new", 90.0),
        lead(json!(1), "A", "new", 80.0),
    ];
    let mut table = engine(leads, 10);

    table.sort("lead_score", SortDirection::Desc);
    assert_eq!(ids(&table.filtered_rows()), vec!["7", "1", "2", "10"]);

    table.sort("lead_score", SortDirection::Asc);
    assert_eq!(ids(&table.filtered_rows()), vec!["1", "2", "10", "7"]);
}

#[test]
fn test_unknown_sort_key_keeps_previous_order() {
    let mut table = engine(
        vec![lead(json!(1), "B", "new", 50.0), lead(json!(2), "A", "new", 60.0)],
        10,
    );
    table.sort("couple_name", SortDirection::Asc);
    let before = table.state().clone();

    table.sort("favourite_colour", SortDirection::Desc);
    assert_eq!(table.state(), &before);
    assert_eq!(ids(&table.filtered_rows()), vec!["2", "1"]);
}

#[test]
fn test_reduce_is_pure() {
    let table = engine(vec![lead(json!(1), "A", "new", 50.0)], 10);
    let before = table.state().clone();

    let next = table
        .reduce(
            table.state(),
            TableAction::Sort {
                key: "lead_score".to_string(),
                direction: SortDirection::Desc,
            },
        )
        .unwrap();

    assert!(next.sort.is_some());
    assert_eq!(table.state(), &before);
}

#[test]
fn test_contract_violations() {
    let no_columns = TableEngine::<Lead>::new(Vec::new(), 10, Vec::new());
    assert!(matches!(no_columns, Err(DeskError::ContractViolation { .. })));

    let zero_page = TableEngine::new(columns(), 0, Vec::<Lead>::new());
    assert!(matches!(zero_page, Err(DeskError::ContractViolation { .. })));

    let mut table = engine(vec![lead(json!(1), "A", "new", 50.0)], 10);
    assert!(table.set_page_size(0).is_err());
    assert_eq!(table.state().page_size, 10);
}

#[test]
fn test_scores_out_of_range_are_clamped_on_every_ingest() {
    let mut table = engine(vec![lead(json!(1), "A", "new", 130.0)], 10);
    assert_eq!(table.records()[0].lead_score, 100.0);
    assert_eq!(
        table.ingest_report().warnings,
        vec![RecordWarning::ScoreClamped { id: "1".to_string() }]
    );

    let report = table.set_records(vec![lead(json!(2), "B", "new", -12.0)]);
    assert_eq!(table.records()[0].lead_score, 0.0);
    assert_eq!(report.dropped(), 0);
    assert_eq!(report.warnings.len(), 1);
}
