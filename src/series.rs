use crate::loader::{CellValue, Table};
use log::info;
use std::collections::HashMap;

/// Column names containing one of these (case-insensitively) are shown first
pub const DEFAULT_COLUMN_HINTS: [&str; 2] = ["파일 업로드 수", "upload"];

/// Which column positions play which role in the chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    /// Category / x-axis column
    pub x_column: usize,
    /// The two columns joined into a group key
    pub group_columns: (usize, usize),
    /// Selectable numeric series columns
    pub value_columns: Vec<usize>,
    pub separator: String,
    pub default_hints: Vec<String>,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            x_column: 0,
            group_columns: (1, 2),
            value_columns: vec![3, 4, 5, 6],
            separator: " - ".to_string(),
            default_hints: DEFAULT_COLUMN_HINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub group: String,
    pub column: String,
}

impl SeriesKey {
    pub fn label(&self) -> String {
        format!("{} ({})", self.group, self.column)
    }
}

/// One plotted line
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: SeriesKey,
    /// x value and y value per row, in row order; `None` where y is not numeric
    pub points: Vec<(CellValue, Option<f64>)>,
    pub visible: bool,
}

impl Series {
    pub fn y_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|(_, y)| *y)
    }
}

/// Every (group, column) series built from a table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesSet {
    pub x_label: String,
    /// Group keys in order of first appearance
    pub groups: Vec<String>,
    /// Names of the value columns present in the table
    pub columns: Vec<String>,
    pub default_column: Option<String>,
    /// Ordered group-major: all columns of the first group, then the next group
    pub series: Vec<Series>,
}

/// Pick the column shown at load
///
/// The first value column whose name contains a hint wins; otherwise the
/// first value column present in the table.
pub fn default_column(table: &Table, layout: &ChartLayout) -> Option<usize> {
    let present: Vec<usize> = layout
        .value_columns
        .iter()
        .copied()
        .filter(|&col| col < table.columns.len())
        .collect();

    let hints: Vec<String> = layout.default_hints.iter().map(|h| h.to_lowercase()).collect();
    present
        .iter()
        .copied()
        .find(|&col| {
            let name = table.columns[col].to_lowercase();
            hints.iter().any(|hint| name.contains(hint.as_str()))
        })
        .or_else(|| present.first().copied())
}

/// Text key of the group a row belongs to: both group cells joined by the
/// layout separator. An empty cell prints as `nan`, so rows missing a group
/// value still share one group.
pub fn group_key(table_row: &crate::loader::Row, layout: &ChartLayout) -> String {
    let (first, second) = layout.group_columns;
    format!(
        "{}{}{}",
        key_part(table_row.get(first)),
        layout.separator,
        key_part(table_row.get(second))
    )
}

fn key_part(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => "nan".to_string(),
        other => other.to_string(),
    }
}

/// Group rows and build one series per (group, value column)
///
/// Groups are ordered by first appearance and keep their rows in table
/// order. Only series of the default column start visible, in every group.
///
/// # Arguments
/// * `table` - Loaded sheet
/// * `layout` - Which columns hold x, the group key and the values
///
/// # Returns
/// * `SeriesSet` - Group names, value column names and the
///   `groups x columns` series
///
/// # Examples
/// ```no_run
/// use swreq::loader::load_table;
/// use swreq::series::{ChartLayout, build_series};
///
/// let table = load_table("usage.xlsx", "Sheet2").unwrap();
/// let set = build_series(&table, &ChartLayout::default());
/// println!("{} groups, {} series", set.groups.len(), set.series.len());
/// ```
pub fn build_series(table: &Table, layout: &ChartLayout) -> SeriesSet {
    let mut groups: Vec<String> = Vec::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();

    for (index, row) in table.rows.iter().enumerate() {
        let key = group_key(row, layout);
        let slot = *lookup.entry(key.clone()).or_insert_with(|| {
            groups.push(key);
            members.push(Vec::new());
            groups.len() - 1
        });
        members[slot].push(index);
    }

    let value_columns: Vec<usize> = layout
        .value_columns
        .iter()
        .copied()
        .filter(|&col| col < table.columns.len())
        .collect();
    let default = default_column(table, layout);

    let mut series = Vec::with_capacity(groups.len() * value_columns.len());
    for (group, rows) in groups.iter().zip(&members) {
        for &col in &value_columns {
            let points = rows
                .iter()
                .map(|&r| {
                    let row = &table.rows[r];
                    (row.get(layout.x_column).clone(), row.get(col).as_f64())
                })
                .collect();
            series.push(Series {
                key: SeriesKey {
                    group: group.clone(),
                    column: table.columns[col].clone(),
                },
                points,
                visible: Some(col) == default,
            });
        }
    }

    let default_column = default.map(|col| table.columns[col].clone());
    if let Some(name) = &default_column {
        info!("Default column: {}", name);
    }

    SeriesSet {
        x_label: table.column_name(layout.x_column).unwrap_or_default().to_string(),
        groups,
        columns: value_columns.iter().map(|&col| table.columns[col].clone()).collect(),
        default_column,
        series,
    }
}
