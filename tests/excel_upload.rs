use retail_insights::execution::QueryExecutor;
use retail_insights::ingestion::{load_dataframe, DatasetFormat};
use retail_insights::intent::{Aggregation, Intent};
use retail_insights::profiler::profile_dataframe;
use retail_insights::SqlCompiler;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Workbook with a date, a text and a number column on its first sheet
fn write_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("sales.xlsx");
    let rows = [
        ((2023, 1, 15), "East", 100.0),
        ((2023, 4, 20), "East", 50.0),
        ((2023, 5, 2), "West", 80.0),
        ((2023, 11, 30), "West", 20.0),
    ];

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    for (col, name) in ["order_date", "region", "revenue"].iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (i, ((y, m, d), region, revenue)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
        sheet.write_datetime_with_format(row, 0, &date, &date_format).unwrap();
        sheet.write_string(row, 1, *region).unwrap();
        sheet.write_number(row, 2, *revenue).unwrap();
    }
    workbook.save(&path).unwrap();
    path
}

fn workbook_dir() -> (PathBuf, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());
    (path, dir)
}

#[test]
fn test_excel_profile_sees_numeric_revenue() {
    let (path, _dir) = workbook_dir();
    let format = DatasetFormat::detect(&path).unwrap();
    assert_eq!(format, DatasetFormat::Excel);

    let df = load_dataframe(&path, format).unwrap();
    let profile = profile_dataframe(&df).unwrap();

    assert_eq!(profile.row_count, 4);
    assert_eq!(profile.columns, vec!["order_date", "region", "revenue"]);
    assert_eq!(profile.numeric_metrics, vec!["revenue"]);
}

#[test]
fn test_excel_registered_table_answers_queries() {
    let (path, _dir) = workbook_dir();
    let executor = QueryExecutor::open_in_memory().unwrap();
    executor.register_dataset("sales", &path, DatasetFormat::Excel).unwrap();

    let compiler = SqlCompiler::new("sales");
    let by_region = Intent::new("revenue", Aggregation::Sum)
        .with_time_fields(["order_date"])
        .with_group_by(["region"]);
    let table = executor.execute(&compiler.compile(&by_region).unwrap()).unwrap();
    assert_eq!(table.len(), 2);

    let q2 = by_region.clone().with_filter("quarter", json!("Q2"));
    let table = executor.execute_bound(&compiler.compile_bound(&q2).unwrap()).unwrap();
    assert_eq!(table.len(), 2);
    for row in &table.rows {
        let expected = if row["region"] == "East" { 50.0 } else { 80.0 };
        assert_eq!(row["value"].as_f64(), Some(expected));
    }
}
