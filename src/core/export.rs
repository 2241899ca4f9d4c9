use crate::core::table::ColumnDef;
use crate::domain::model::TableRecord;
use crate::utils::error::Result;
use std::io::Write;

/// Writes `rows` as CSV: a header of column titles, then each row through the column formatters.
pub fn export_csv<T, W>(columns: &[ColumnDef<T>], rows: &[&T], writer: W) -> Result<usize>
where
    T: TableRecord,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns.iter().map(|c| c.title.as_str()))?;

    for row in rows {
        csv_writer.write_record(columns.iter().map(|c| c.display(row)))?;
    }
    csv_writer.flush()?;

    tracing::debug!("Exported {} rows across {} columns", rows.len(), columns.len());
    Ok(rows.len())
}

pub fn export_csv_string<T: TableRecord>(columns: &[ColumnDef<T>], rows: &[&T]) -> Result<String> {
    let mut buffer = Vec::new();
    export_csv(columns, rows, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FieldValue;

    struct Row(&'static str, &'static str, f64);

    impl TableRecord for Row {
        fn record_id(&self) -> Option<&str> {
            Some(self.0)
        }

        fn field(&self, key: &str) -> FieldValue {
            match key {
                "name" => FieldValue::text(self.1),
                "score" => FieldValue::Number(self.2),
                _ => FieldValue::Empty,
            }
        }
    }

    #[test]
    fn test_export_quotes_and_formats() {
        let columns = vec![
            ColumnDef::new("name", "Couple"),
            ColumnDef::new("score", "Lead Score")
                .formatter(|v: &FieldValue, _: &Row| format!("{}/100", v)),
        ];
        let a = Row("1", "Sarah & Mike, Johnson", 85.0);
        let b = Row("2", "Emma Wilson", 72.5);

        let csv = export_csv_string(&columns, &[&a, &b]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Couple,Lead Score");
        assert_eq!(lines[1], "\"Sarah & Mike, Johnson\",85/100");
        assert_eq!(lines[2], "Emma Wilson,72.5/100");
    }

    #[test]
    fn test_export_empty_rows_writes_header_only() {
        let columns: Vec<ColumnDef<Row>> = vec![ColumnDef::new("name", "Couple")];
        let csv = export_csv_string(&columns, &[]).unwrap();
        assert_eq!(csv, "Couple\n");
    }
}
