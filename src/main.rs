use clap::Parser;
use lead_desk::core::export::export_csv;
use lead_desk::core::ingest::{admit, IngestReport, RecordWarning};
use lead_desk::core::metrics::PipelineSummary;
use lead_desk::core::scoring::score_leads_from_couples;
use lead_desk::core::table::Align;
use lead_desk::core::ConfigProvider;
use lead_desk::utils::error::ErrorSeverity;
use lead_desk::utils::{logger, validation::Validate};
use lead_desk::{CliConfig, ColumnDef, Couple, DeskConfig, FieldValue, JsonFileSource, Lead, Result, TableEngine};

fn main() {
    let cli = CliConfig::parse();
    let config = load_config(&cli);

    match &config {
        Ok(c) if c.logging.json => logger::init_json_logger(&c.logging.level),
        _ => logger::init_cli_logger(cli.verbose),
    }
    tracing::info!("Starting lead-desk");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = config.and_then(|c| run(&cli, &c)) {
        tracing::error!(
            "lead-desk failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("{}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn load_config(cli: &CliConfig) -> Result<DeskConfig> {
    match &cli.config {
        Some(path) => DeskConfig::from_file(path),
        None => Ok(DeskConfig::default()),
    }
}

fn run(cli: &CliConfig, config: &DeskConfig) -> Result<()> {
    cli.validate()?;
    config.validate()?;
    let policy = config.scoring_policy();

    let source = JsonFileSource::new(&cli.leads);
    let mut leads = source.load::<Lead>()?;

    if let Some(path) = &cli.couples {
        let (couples, report) = admit(JsonFileSource::new(path).load::<Couple>()?);
        print_warnings("couple", &report);
        let (rescored_leads, rescored) = score_leads_from_couples(leads, &couples, &policy);
        leads = rescored_leads;
        tracing::info!("Re-scored {} leads from {} couples", rescored, couples.len());
    }

    let (leads, report) = admit(leads);
    print_warnings("lead", &report);

    let summary = PipelineSummary::from_leads(&leads);
    let page_size = cli.page_size.unwrap_or_else(|| config.page_size());
    let (sort_key, direction) = cli.sort_override().unwrap_or_else(|| config.default_sort());

    let mut table = TableEngine::new(lead_columns(), page_size, leads)?
        .with_search_fields(config.lead_search_fields().to_vec())
        .with_default_sort(&sort_key, direction);
    table.set_filter(cli.criteria());
    table.paginate(cli.page);

    print_table(&table);

    let info = table.get_page_info();
    println!();
    println!(
        "Showing {} to {} of {} leads (page {} of {})",
        info.first_item, info.last_item, info.total_filtered, info.current_page, info.page_count
    );
    let stages: Vec<String> = summary
        .stages
        .iter()
        .map(|s| format!("{} {}", s.status.as_str(), s.count))
        .collect();
    println!("Pipeline: {} | open {}, closed/declined {}", stages.join(", "), summary.open, summary.terminal);

    if let Some(path) = &cli.export {
        let rows = table.filtered_rows();
        let file = std::fs::File::create(path)?;
        let written = export_csv(table.columns(), &rows, file)?;
        tracing::info!("Exported {} rows to {}", written, path.display());
        println!("Exported {} rows to {}", written, path.display());
    }

    Ok(())
}

fn print_warnings(kind: &str, report: &IngestReport) {
    for warning in &report.warnings {
        match warning {
            RecordWarning::MissingId { position } => {
                eprintln!("warning: {} record {} skipped (no id)", kind, position + 1)
            }
            RecordWarning::DuplicateId { position, id } => {
                eprintln!("warning: {} record {} skipped (duplicate id {})", kind, position + 1, id)
            }
            RecordWarning::ScoreClamped { id } => {
                eprintln!("warning: {} {} score clamped into 0-100", kind, id)
            }
        }
    }
}

fn lead_columns() -> Vec<ColumnDef<Lead>> {
    vec![
        ColumnDef::new("id", "ID").sortable().align(Align::Right),
        ColumnDef::new("couple_name", "Couple").sortable(),
        ColumnDef::new("status", "Status")
            .sortable()
            .formatter(|v: &FieldValue, _: &Lead| v.to_string().replace('_', " ")),
        ColumnDef::new("priority", "Priority").sortable(),
        ColumnDef::new("lead_score", "Score")
            .sortable()
            .align(Align::Right)
            .formatter(|v: &FieldValue, _: &Lead| match v.as_number() {
                Some(n) => format!("{:.0}/100", n),
                None => String::new(),
            }),
        ColumnDef::new("platform", "Platform").sortable(),
        ColumnDef::new("location", "Location").sortable(),
        ColumnDef::new("target_purchase_price", "Target Price")
            .sortable()
            .align(Align::Right)
            .formatter(|v: &FieldValue, _: &Lead| match v.as_number() {
                Some(n) => format!("${:.0}K", n / 1000.0),
                None => String::new(),
            }),
        ColumnDef::new("created_at", "Created")
            .sortable()
            .formatter(|v: &FieldValue, _: &Lead| match v {
                FieldValue::Timestamp(t) => t.format("%Y-%m-%d").to_string(),
                other => other.to_string(),
            }),
    ]
}

fn print_table(table: &TableEngine<Lead>) {
    let columns = table.columns();
    let rows: Vec<Vec<String>> = table
        .get_visible_rows()
        .into_iter()
        .map(|lead| columns.iter().map(|c| c.display(lead)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.title.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(&c.title, *w, c.align))
        .collect();
    println!("{}", header.join("  "));

    if rows.is_empty() {
        println!("No leads match the current filters.");
        return;
    }
    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(columns.iter().zip(&widths))
            .map(|(cell, (c, w))| pad(cell, *w, c.align))
            .collect();
        println!("{}", cells.join("  "));
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{:<width$}", text, width = width),
        Align::Right => format!("{:>width$}", text, width = width),
        Align::Center => format!("{:^width$}", text, width = width),
    }
}
