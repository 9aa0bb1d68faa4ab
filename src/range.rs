use crate::series::Series;
use std::collections::BTreeSet;
use std::fmt;

/// Share of the data span added above and below
pub const MARGIN_RATIO: f64 = 0.1;
/// Y label used when more than one column is on screen
pub const GENERIC_LABEL: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

/// Span of `values` widened by 10% on each side
///
/// A flat span falls back to 10% of |min|, or 1.0 when that is zero too.
/// Returns `None` for an empty input.
pub fn padded_bounds(values: impl IntoIterator<Item = f64>) -> Option<AxisBounds> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    let mut margin = (max - min) * MARGIN_RATIO;
    if margin == 0.0 {
        margin = if min != 0.0 { min.abs() * MARGIN_RATIO } else { 1.0 };
    }

    Some(AxisBounds {
        min: min - margin,
        max: max + margin,
    })
}

/// Label for a set of on-screen columns: the name when there is exactly one
pub fn axis_label<'a>(columns: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let distinct: BTreeSet<&str> = columns.into_iter().collect();
    match distinct.len() {
        0 => None,
        1 => distinct.into_iter().next().map(str::to_string),
        _ => Some(GENERIC_LABEL.to_string()),
    }
}

/// Y-axis state kept between redraws
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YAxis {
    pub bounds: Option<AxisBounds>,
    pub label: String,
}

impl YAxis {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            bounds: None,
            label: label.into(),
        }
    }

    /// Fit the axis to the visible series
    ///
    /// With no visible y values the axis is left as it was. Returns whether
    /// anything was recomputed.
    pub fn rescale<'a>(&mut self, series: impl IntoIterator<Item = &'a Series>) -> bool {
        let visible: Vec<&Series> = series.into_iter().filter(|s| s.visible).collect();
        let Some(bounds) = padded_bounds(visible.iter().flat_map(|s| s.y_values())) else {
            return false;
        };

        self.bounds = Some(bounds);
        if let Some(label) = axis_label(visible.iter().map(|s| s.key.column.as_str())) {
            self.label = label;
        }
        true
    }
}

impl fmt::Display for YAxis {
    /// `label [min, max]`, or `label [auto]` before the first fit
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some(b) => write!(f, "{} [{:.3}, {:.3}]", self.label, b.min, b.max),
            None => write!(f, "{} [auto]", self.label),
        }
    }
}
