use crate::error::ChartError;
use crate::loader::Table;
use crate::range::YAxis;
use crate::series::{ChartLayout, Series, SeriesSet, build_series};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    Column,
    Group,
}

impl ToggleKind {
    fn name(self) -> &'static str {
        match self {
            ToggleKind::Column => "column",
            ToggleKind::Group => "group",
        }
    }
}

/// A checkbox click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEvent {
    pub kind: ToggleKind,
    pub key: String,
}

impl ToggleEvent {
    pub fn column(key: impl Into<String>) -> Self {
        Self {
            kind: ToggleKind::Column,
            key: key.into(),
        }
    }

    pub fn group(key: impl Into<String>) -> Self {
        Self {
            kind: ToggleKind::Group,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBox {
    pub label: String,
    pub checked: bool,
}

/// Interactive chart state: the series, both checkbox panels and the y axis
///
/// A click flips the checkbox and then flips the visibility of every series
/// on that row or column of the (group, column) grid, one series at a time.
/// Series carry a single visibility flag, so the two panels do not combine
/// as a logical AND: hiding a group and then hiding a column re-shows the
/// series where they cross.
#[derive(Debug, Clone)]
pub struct ChartViewer {
    set: SeriesSet,
    column_boxes: Vec<CheckBox>,
    group_boxes: Vec<CheckBox>,
    axis: YAxis,
}

impl ChartViewer {
    pub fn new(set: SeriesSet) -> Self {
        let column_boxes = set
            .columns
            .iter()
            .map(|column| CheckBox {
                label: column.clone(),
                checked: set
                    .series
                    .iter()
                    .any(|s| s.visible && &s.key.column == column),
            })
            .collect();
        let group_boxes = set
            .groups
            .iter()
            .map(|group| CheckBox {
                label: group.clone(),
                checked: true,
            })
            .collect();

        let mut axis = YAxis::new(set.default_column.clone().unwrap_or_default());
        axis.rescale(&set.series);

        Self {
            set,
            column_boxes,
            group_boxes,
            axis,
        }
    }

    pub fn from_table(table: &Table, layout: &ChartLayout) -> Self {
        Self::new(build_series(table, layout))
    }

    /// Apply a checkbox click, then refit the y axis
    ///
    /// Every series matching the clicked label flips its own visibility;
    /// series of the other panel are untouched.
    ///
    /// # Examples
    /// ```
    /// use swreq::loader::{CellValue, Row, Table};
    /// use swreq::series::ChartLayout;
    /// use swreq::viewer::{ChartViewer, ToggleEvent};
    ///
    /// let columns = ["month", "site", "line", "Users", "Uploads", "Errors", "Latency"];
    /// let table = Table {
    ///     columns: columns.iter().map(|c| c.to_string()).collect(),
    ///     rows: vec![Row::new(vec![
    ///         CellValue::Text("Jan".into()),
    ///         CellValue::Text("Seoul".into()),
    ///         CellValue::Text("A".into()),
    ///         CellValue::Int(10),
    ///         CellValue::Int(2),
    ///         CellValue::Int(1),
    ///         CellValue::Int(30),
    ///     ])],
    /// };
    /// let mut viewer = ChartViewer::from_table(&table, &ChartLayout::default());
    /// assert_eq!(viewer.is_visible("Seoul - A", "Users"), Some(false));
    ///
    /// viewer.handle(&ToggleEvent::column("Users")).unwrap();
    /// assert_eq!(viewer.is_visible("Seoul - A", "Users"), Some(true));
    /// assert_eq!(viewer.axis().label, "value");
    /// ```
    pub fn handle(&mut self, event: &ToggleEvent) -> Result<(), ChartError> {
        let boxes = match event.kind {
            ToggleKind::Column => &mut self.column_boxes,
            ToggleKind::Group => &mut self.group_boxes,
        };
        let checkbox = boxes
            .iter_mut()
            .find(|b| b.label == event.key)
            .ok_or_else(|| ChartError::UnknownToggle(event.kind.name(), event.key.clone()))?;
        checkbox.checked = !checkbox.checked;

        let mut flipped = 0;
        for series in &mut self.set.series {
            let matches = match event.kind {
                ToggleKind::Column => series.key.column == event.key,
                ToggleKind::Group => series.key.group == event.key,
            };
            if matches {
                series.visible = !series.visible;
                flipped += 1;
            }
        }

        let rescaled = self.axis.rescale(&self.set.series);
        debug!(
            "Toggled {} '{}': {} series flipped, y axis {} {}",
            event.kind.name(),
            event.key,
            flipped,
            if rescaled { "refit to" } else { "kept at" },
            self.axis
        );
        Ok(())
    }

    pub fn title(&self) -> String {
        format!(
            "Line chart - default column: {}",
            self.set.default_column.as_deref().unwrap_or("default")
        )
    }

    pub fn x_label(&self) -> &str {
        &self.set.x_label
    }

    pub fn axis(&self) -> &YAxis {
        &self.axis
    }

    pub fn series(&self) -> &[Series] {
        &self.set.series
    }

    pub fn visible_series(&self) -> impl Iterator<Item = &Series> {
        self.set.series.iter().filter(|s| s.visible)
    }

    pub fn column_boxes(&self) -> &[CheckBox] {
        &self.column_boxes
    }

    pub fn group_boxes(&self) -> &[CheckBox] {
        &self.group_boxes
    }

    pub fn boxes(&self, kind: ToggleKind) -> &[CheckBox] {
        match kind {
            ToggleKind::Column => &self.column_boxes,
            ToggleKind::Group => &self.group_boxes,
        }
    }

    pub fn is_visible(&self, group: &str, column: &str) -> Option<bool> {
        self.set
            .series
            .iter()
            .find(|s| s.key.group == group && s.key.column == column)
            .map(|s| s.visible)
    }
}
