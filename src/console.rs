use crate::viewer::{ChartViewer, CheckBox, ToggleEvent, ToggleKind};
use std::fmt::Write;

/// A line typed into the chart session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Click a checkbox, given by its label or 1-based position
    Toggle(ToggleKind, String),
    Show,
    Save(Option<String>),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  col <name|#>     toggle a value column checkbox
  group <name|#>   toggle a group checkbox
  show             list checkboxes and the current y axis
  save [path]      export the chart (default: <file>_chart.png)
  help             this text
  quit             leave the session";

/// Parse one input line; `None` for blank or unrecognised input
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word.to_lowercase().as_str(), rest) {
        ("col" | "column" | "c", key) if !key.is_empty() => {
            Some(Command::Toggle(ToggleKind::Column, key.to_string()))
        }
        ("group" | "g", key) if !key.is_empty() => {
            Some(Command::Toggle(ToggleKind::Group, key.to_string()))
        }
        ("show" | "list" | "ls", "") => Some(Command::Show),
        ("save", "") => Some(Command::Save(None)),
        ("save", path) => Some(Command::Save(Some(path.to_string()))),
        ("help" | "?", "") => Some(Command::Help),
        ("quit" | "exit" | "q", "") => Some(Command::Quit),
        _ => None,
    }
}

/// Turn a typed checkbox reference into an event
///
/// Accepts the 1-based position shown by [`describe`], the exact label, or a
/// case-insensitive match of the label.
pub fn resolve(viewer: &ChartViewer, kind: ToggleKind, token: &str) -> Option<ToggleEvent> {
    let boxes = viewer.boxes(kind);
    let label = token
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| boxes.get(i))
        .or_else(|| boxes.iter().find(|b| b.label == token))
        .or_else(|| boxes.iter().find(|b| b.label.to_lowercase() == token.to_lowercase()))?
        .label
        .clone();

    Some(ToggleEvent { kind, key: label })
}

fn panel(out: &mut String, title: &str, boxes: &[CheckBox]) {
    let _ = writeln!(out, "{}:", title);
    for (i, b) in boxes.iter().enumerate() {
        let mark = if b.checked { 'x' } else { ' ' };
        let _ = writeln!(out, "  [{}] {}. {}", mark, i + 1, b.label);
    }
}

/// Text rendering of both checkbox panels and the y axis
pub fn describe(viewer: &ChartViewer) -> String {
    let mut out = String::new();
    panel(&mut out, "Columns", viewer.column_boxes());
    panel(&mut out, "Groups", viewer.group_boxes());

    let _ = write!(out, "y axis: {}", viewer.axis());
    out
}
