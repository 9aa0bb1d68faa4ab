/*!
# Software Request Tools

Two small tools used by the IT desk: a survey intake service for software
requests and a line chart viewer for the monthly usage workbook.

## Survey intake

- **Technologies**: Rust, axum, lettre
- `GET /` serves the request form, `POST /submit` takes a JSON body with
  `department`, `name`, `employee_id`, `software` and `work_type`
- Each request is appended to `request_YYYYMMDD.csv` (UTF-8 with BOM,
  header written once per file)
- A notice with an HTML summary table is mailed over STARTTLS; mail
  problems are logged and never fail the request
- Responses are `{"status": "success" | "error", "message": "..."}`

## Chart viewer

- Loads one sheet of a workbook (or a CSV file)
- Column 1 is the x axis, columns 2 and 3 form the group key, columns 4-7
  are the selectable value series
- One column is shown at start (a name mentioning uploads, otherwise the
  first value column)
- Column and group checkboxes flip the matching series; the y axis is
  refit to the visible data with a 10% margin after every click
- Charts are exported as PNG at a chosen resolution

## Modules

- **config**: mail settings file and command line options
- **submission**: request parsing and validation
- **saving**: daily CSV files
- **mailer**: notice formatting and delivery
- **app**: routing
- **loader**: workbook and CSV reading
- **series**: grouping rows into series
- **range**: y axis fitting
- **viewer**: checkbox handling
- **graph**: drawing and export
- **console**: terminal commands for the chart session
*/

pub mod config;
pub mod console;
pub mod error;
pub mod graph;
pub mod loader;
pub mod mailer;
pub mod range;
pub mod saving;
pub mod series;
pub mod submission;
pub mod viewer;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the types most callers need
pub use config::*;
pub use error::*;
pub use loader::{CellValue, Row, Table, load_table};
pub use range::{AxisBounds, YAxis};
pub use series::{ChartLayout, Series, SeriesKey, SeriesSet, build_series};
pub use submission::*;
pub use viewer::*;
