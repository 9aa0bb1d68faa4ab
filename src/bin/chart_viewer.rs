#![cfg(not(tarpaulin_include))]

use clap::Parser;
use log::{error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use swreq::config::ChartArgs;
use swreq::console::{self, Command, HELP};
use swreq::graph::{self, ExportOptions};
use swreq::loader::load_table;
use swreq::series::ChartLayout;
use swreq::viewer::ChartViewer;

fn refresh_preview(viewer: &ChartViewer, preview: &Path) {
    match graph::export_chart(viewer, preview, &ExportOptions::preview()) {
        Ok(()) => println!("Preview updated: {}", preview.display()),
        Err(e) => warn!("Could not draw preview: {}", e),
    }
}

fn prompt(text: &str) -> io::Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ChartArgs::parse();
    println!("=== Spreadsheet line chart viewer ===");

    let table = match load_table(&args.path, &args.sheet) {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to load {}: {}", args.path, e);
            std::process::exit(1);
        }
    };

    let mut viewer = ChartViewer::from_table(&table, &ChartLayout::default());
    let preview = args
        .preview
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| graph::derived_path(&args.path, "_preview.png"));
    let export = ExportOptions::with_dpi(args.dpi);

    println!("{}", viewer.title());
    println!("{}", console::describe(&viewer));
    println!("{}", HELP);
    refresh_preview(&viewer, &preview);

    while let Some(line) = prompt("> ")? {
        match console::parse_command(&line) {
            Some(Command::Toggle(kind, token)) => {
                let Some(event) = console::resolve(&viewer, kind, &token) else {
                    println!("No such checkbox: {}", token);
                    continue;
                };
                viewer.handle(&event)?;
                info!("Toggled {}", event.key);
                println!("{}", console::describe(&viewer));
                refresh_preview(&viewer, &preview);
            }
            Some(Command::Show) => println!("{}", console::describe(&viewer)),
            Some(Command::Save(path)) => {
                let path = path
                    .map(PathBuf::from)
                    .unwrap_or_else(|| graph::default_export_path(&args.path));
                if let Err(e) = graph::export_chart(&viewer, &path, &export) {
                    error!("Export failed: {}", e);
                }
            }
            Some(Command::Help) => println!("{}", HELP),
            Some(Command::Quit) => break,
            None if line.trim().is_empty() => {}
            None => println!("Unknown command. Type 'help' for the list."),
        }
    }

    let answer = prompt("\nSave chart? (y/n): ")?.unwrap_or_default();
    if answer.trim().eq_ignore_ascii_case("y") {
        let path = graph::default_export_path(&args.path);
        graph::export_chart(&viewer, &path, &export)?;
        println!("Chart saved: {}", path.display());
    }

    Ok(())
}
