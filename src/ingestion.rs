//! Dataset ingestion - format detection and loading into a DataFrame

use crate::error::{InsightError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Excel serial day number of 1970-01-01 (1900 date system)
const EXCEL_UNIX_EPOCH_SERIAL: i64 = 25_569;

/// Supported upload formats, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Excel,
    Json,
    Parquet,
    Text,
}

impl DatasetFormat {
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "xls" | "xlsx" => Ok(DatasetFormat::Excel),
            "json" => Ok(DatasetFormat::Json),
            "parquet" => Ok(DatasetFormat::Parquet),
            "txt" => Ok(DatasetFormat::Text),
            _ => Err(InsightError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::Csv => "csv",
            DatasetFormat::Excel => "excel",
            DatasetFormat::Json => "json",
            DatasetFormat::Parquet => "parquet",
            DatasetFormat::Text => "text",
        }
    }

    /// Formats that can back a tabular analysis
    pub fn is_tabular(&self) -> bool {
        !matches!(self, DatasetFormat::Text)
    }
}

/// Load a tabular dataset.
///
/// CSV dates are parsed and the schema inferred over the first 1000 rows.
/// JSON must be an array of records. Excel reads the first sheet, with the
/// first row as header.
pub fn load_dataframe(path: &Path, format: DatasetFormat) -> Result<DataFrame> {
    info!("📂 Loading {} dataset: {}", format.as_str(), path.display());

    let df = match format {
        DatasetFormat::Csv => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_try_parse_dates(true)
            .with_infer_schema_length(Some(1000))
            .finish()?
            .collect()?,
        DatasetFormat::Json => JsonReader::new(File::open(path)?).finish()?,
        DatasetFormat::Parquet => {
            LazyFrame::scan_parquet(path, ScanArgsParquet::default())?.collect()?
        }
        DatasetFormat::Excel => load_excel(path)?,
        DatasetFormat::Text => return Err(not_tabular(path, format)),
    };

    info!("✅ Loaded {} rows, {} columns", df.height(), df.width());
    Ok(df)
}

pub(crate) fn not_tabular(path: &Path, format: DatasetFormat) -> InsightError {
    InsightError::UnsupportedFormat(format!(
        "{} files cannot be analysed as a table: {}",
        format.as_str(),
        path.display()
    ))
}

/// Column type chosen from the non-empty cells of a sheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    Date,
    Text,
}

fn column_kind<'a>(cells: impl Iterator<Item = &'a Data>) -> CellKind {
    let mut kind: Option<CellKind> = None;

    for cell in cells {
        let cell_kind = match cell {
            Data::Empty => continue,
            Data::Int(_) | Data::Float(_) => CellKind::Number,
            Data::DateTime(_) => CellKind::Date,
            _ => return CellKind::Text,
        };
        match kind {
            None => kind = Some(cell_kind),
            Some(k) if k != cell_kind => return CellKind::Text,
            Some(_) => {}
        }
    }

    kind.unwrap_or(CellKind::Text)
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

/// Days since 1970-01-01 for an Excel date cell; the time of day is dropped.
fn cell_epoch_days(cell: &Data) -> Option<i32> {
    match cell {
        Data::DateTime(dt) => i32::try_from(dt.as_f64().floor() as i64 - EXCEL_UNIX_EPOCH_SERIAL).ok(),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => Some(other.to_string()),
    }
}

/// First worksheet as a DataFrame: numeric columns become Float64, date
/// columns Date, everything else String.
fn load_excel(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| InsightError::Excel(format!("workbook has no sheets: {}", path.display())))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| cell_text(cell).unwrap_or_else(|| format!("column_{}", idx + 1)))
            .collect(),
        None => return Ok(DataFrame::empty()),
    };
    let body: Vec<&[Data]> = rows.collect();

    debug!("Reading sheet '{}': {} columns, {} rows", sheet_name, header.len(), body.len());

    let empty = Data::Empty;
    let empty = &empty;
    let mut columns = Vec::with_capacity(header.len());

    for (idx, name) in header.iter().enumerate() {
        let cells = || body.iter().map(move |row| row.get(idx).unwrap_or(empty));

        let series = match column_kind(cells()) {
            CellKind::Number => {
                let values: Vec<Option<f64>> = cells().map(cell_number).collect();
                Series::new(name, values)
            }
            CellKind::Date => {
                let days: Vec<Option<i32>> = cells().map(cell_epoch_days).collect();
                Series::new(name, days).cast(&DataType::Date)?
            }
            CellKind::Text => {
                let values: Vec<Option<String>> = cells().map(cell_text).collect();
                Series::new(name, values)
            }
        };
        columns.push(series);
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_formats() {
        assert_eq!(DatasetFormat::detect(Path::new("sales.CSV")).unwrap(), DatasetFormat::Csv);
        assert_eq!(DatasetFormat::detect(Path::new("a/b.xlsx")).unwrap(), DatasetFormat::Excel);
        assert_eq!(DatasetFormat::detect(Path::new("b.json")).unwrap(), DatasetFormat::Json);
        assert_eq!(DatasetFormat::detect(Path::new("c.parquet")).unwrap(), DatasetFormat::Parquet);
        assert_eq!(DatasetFormat::detect(Path::new("notes.txt")).unwrap(), DatasetFormat::Text);
        assert!(matches!(
            DatasetFormat::detect(Path::new("archive.zip")),
            Err(InsightError::UnsupportedFormat(_))
        ));
        assert!(DatasetFormat::detect(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "order_date,region,revenue").unwrap();
        writeln!(file, "2023-01-05,East,100.5").unwrap();
        writeln!(file, "2023-04-10,West,200").unwrap();

        let df = load_dataframe(&path, DatasetFormat::Csv).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_text_is_not_tabular() {
        let result = load_dataframe(Path::new("notes.txt"), DatasetFormat::Text);
        assert!(matches!(result, Err(InsightError::UnsupportedFormat(_))));
        assert!(!DatasetFormat::Text.is_tabular());
        assert!(DatasetFormat::Excel.is_tabular());
    }

    #[test]
    fn test_load_excel_first_sheet() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "order_date").unwrap();
        sheet.write_string(0, 1, "region").unwrap();
        sheet.write_string(0, 2, "revenue").unwrap();

        let rows = [((2023, 1, 15), "East", 100.0), ((2023, 4, 20), "West", 50.5)];
        for (i, ((y, m, d), region, revenue)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
            sheet.write_datetime_with_format(row, 0, &date, &date_format).unwrap();
            sheet.write_string(row, 1, *region).unwrap();
            sheet.write_number(row, 2, *revenue).unwrap();
        }
        workbook.save(&path).unwrap();

        let df = load_dataframe(&path, DatasetFormat::detect(&path).unwrap()).unwrap();

        assert_eq!(df.get_column_names(), vec!["order_date", "region", "revenue"]);
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("order_date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("region").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("revenue").unwrap().f64().unwrap().get(1), Some(50.5));
    }

    #[test]
    fn test_mixed_excel_column_is_text() {
        let cells = [Data::Float(1.0), Data::Empty, Data::String("n/a".to_string())];
        assert_eq!(column_kind(cells.iter()), CellKind::Text);

        let numbers = [Data::Int(3), Data::Empty, Data::Float(2.5)];
        assert_eq!(column_kind(numbers.iter()), CellKind::Number);
    }
}
