use crate::error::LoadError;
use calamine::{Data, DataType, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use log::info;
use std::fmt;
use std::fs;
use std::path::Path;

/// A single cell read from the source table
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Numeric value, if the cell holds one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    fn from_calamine(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::Int(i) => CellValue::Int(*i),
            // workbooks store every number as a float; whole ones read back as integers
            Data::Float(f) if is_whole(*f) => CellValue::Int(*f as i64),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::String(s) => CellValue::Text(s.clone()),
            // dates come back as their Excel serial number so they stay plottable
            Data::DateTime(_) => cell.as_f64().map_or(CellValue::Empty, CellValue::Float),
            other => CellValue::Text(other.to_string()),
        }
    }

    fn from_text(field: &str) -> Self {
        let field = field.trim();
        if field.is_empty() {
            CellValue::Empty
        } else if let Ok(i) = field.parse::<i64>() {
            CellValue::Int(i)
        } else if let Ok(f) = field.parse::<f64>() {
            CellValue::Float(f)
        } else {
            CellValue::Text(field.to_string())
        }
    }
}

fn is_whole(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            // keep the fractional part visible: 1.0 stays "1.0"
            CellValue::Float(x) => write!(f, "{:?}", x),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One data row, cells indexed by column position
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at `index`; missing trailing cells read as empty
    pub fn get(&self, index: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cells.get(index).unwrap_or(EMPTY)
    }
}

/// A loaded sheet: column names by position plus the data rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

/// Load a table from a spreadsheet or CSV file
///
/// For workbooks `sheet` selects the sheet to read; a CSV file has a single
/// table and ignores it. Rows whose cells are all empty are dropped.
///
/// # Arguments
/// * `path` - Workbook (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) or `csv` file
/// * `sheet` - Name of the sheet holding the data
///
/// # Returns
/// * `Result<Table, LoadError>` - The column names and data rows, or
///   `LoadError::SheetNotFound` when the workbook has no such sheet
///
/// # Examples
/// ```no_run
/// use swreq::loader::load_table;
///
/// match load_table("usage.xlsx", "Sheet2") {
///     Ok(table) => println!("Loaded {} rows", table.rows.len()),
///     Err(e) => eprintln!("Error loading workbook: {}", e),
/// }
/// ```
pub fn load_table(path: impl AsRef<Path>, sheet: &str) -> Result<Table, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    let table = match extension.as_deref() {
        Some("csv") => from_csv(path)?,
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => from_excel(path, sheet)?,
        Some(ext) => return Err(LoadError::UnsupportedFormat(ext.to_string())),
        None => return Err(LoadError::UnsupportedFormat("(none)".to_string())),
    };

    let (rows, cols) = table.shape();
    info!("Loaded {} ({})", path.display(), sheet);
    info!("Columns: {:?}", table.columns);
    info!("Shape: {} rows x {} columns", rows, cols);
    Ok(table)
}

/// Read the named sheet of a workbook; the first row holds the column names
pub fn from_excel(path: impl AsRef<Path>, sheet: &str) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto(path)?;

    let names = workbook.sheet_names();
    if !names.iter().any(|name| name == sheet) {
        return Err(LoadError::SheetNotFound(sheet.to_string(), names.join(", ")));
    }
    let range = workbook.worksheet_range(sheet)?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| LoadError::EmptySheet(sheet.to_string()))?;
    let columns = column_names(header.iter().map(CellValue::from_calamine));

    let rows = rows
        .map(|cells| Row::new(cells.iter().map(CellValue::from_calamine).collect()))
        .filter(|row| !row.cells.iter().all(CellValue::is_empty))
        .collect();

    Ok(Table { columns, rows })
}

/// Read a comma separated file; the first line holds the column names
pub fn from_csv(path: impl AsRef<Path>) -> Result<Table, LoadError> {
    let bytes = fs::read(path)?;
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(&bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let columns = column_names(reader.headers()?.iter().map(CellValue::from_text));
    let mut rows = Vec::new();
    for record in reader.records() {
        let row = Row::new(record?.iter().map(CellValue::from_text).collect());
        if !row.cells.iter().all(CellValue::is_empty) {
            rows.push(row);
        }
    }

    Ok(Table { columns, rows })
}

fn column_names(header: impl Iterator<Item = CellValue>) -> Vec<String> {
    header
        .enumerate()
        .map(|(i, cell)| match cell {
            CellValue::Empty => format!("Unnamed: {}", i),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();

        let first = workbook.add_worksheet();
        first.set_name("Sheet1").unwrap();
        first.write_string(0, 0, "ignored").unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Sheet2").unwrap();
        let header = ["month", "site", "line", "File uploads", "Users", "Errors", "Latency"];
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "Jan").unwrap();
        sheet.write_string(1, 1, "Seoul").unwrap();
        sheet.write_string(1, 2, "A").unwrap();
        for col in 3..7u16 {
            sheet.write_number(1, col, f64::from(col) * 1.5).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_named_sheet_from_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        write_workbook(&path);

        let table = load_table(&path, "Sheet2").unwrap();
        assert_eq!(table.shape(), (1, 7));
        assert_eq!(table.column_name(3), Some("File uploads"));
        assert_eq!(table.rows[0].get(1), &CellValue::Text("Seoul".into()));
        assert_eq!(table.rows[0].get(3).as_f64(), Some(4.5));
        assert_eq!(table.rows[0].get(4), &CellValue::Int(6));
    }

    #[test]
    fn whole_numbers_in_group_columns_read_as_integers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("years.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Sheet2").unwrap();
        let header = ["month", "year", "line", "File uploads", "Users", "Errors", "Latency"];
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "Jan").unwrap();
        sheet.write_number(1, 1, 2024.0).unwrap();
        sheet.write_number(1, 2, 3.0).unwrap();
        for col in 3..7u16 {
            sheet.write_number(1, col, 2.5).unwrap();
        }
        workbook.save(&path).unwrap();

        let table = load_table(&path, "Sheet2").unwrap();
        assert_eq!(table.rows[0].get(1), &CellValue::Int(2024));
        assert_eq!(table.rows[0].get(3), &CellValue::Float(2.5));

        let set = crate::series::build_series(&table, &crate::series::ChartLayout::default());
        assert_eq!(set.groups, vec!["2024 - 3"]);
    }

    #[test]
    fn missing_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        write_workbook(&path);

        match load_table(&path, "Sheet9") {
            Err(LoadError::SheetNotFound(name, available)) => {
                assert_eq!(name, "Sheet9");
                assert!(available.contains("Sheet2"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reads_csv_with_bom_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "\u{feff}day,site,,v1\n1,Seoul,A,2.5\n,,,\n2,Busan,B,\n",
        )
        .unwrap();

        let table = load_table(&path, "ignored").unwrap();
        assert_eq!(table.columns, vec!["day", "site", "Unnamed: 2", "v1"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get(0), &CellValue::Int(1));
        assert_eq!(table.rows[0].get(3), &CellValue::Float(2.5));
        assert!(table.rows[1].get(3).is_empty());
        assert!(table.rows[1].get(10).is_empty());
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(matches!(
            load_table("data.txt", "Sheet2"),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn float_cells_keep_their_fraction_in_text() {
        assert_eq!(CellValue::Float(1.0).to_string(), "1.0");
        assert_eq!(CellValue::Int(3).to_string(), "3");
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
    }
}
