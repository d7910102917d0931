//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use console::style;

use crate::engine::{Classification, ComparisonState, Snapshot};

/// Shown in place of a value when values are hidden.
pub const HIDDEN: &str = "***HIDDEN***";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Table options for [`print_comparison`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonView {
    pub show_values: bool,
    pub show_metadata: bool,
}

/// Print one row per name in `names`: Name, State, Source, Target
/// (and Metadata when asked for).
pub fn print_comparison(
    names: &[String],
    classified: &Classification,
    source: &Snapshot,
    target: &Snapshot,
    view: ComparisonView,
) {
    let mut header = vec!["Name", "State", "Source", "Target"];
    if view.show_metadata {
        header.push("Metadata");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);

    for name in names {
        let Some(state) = classified.state(name) else {
            continue;
        };
        let mut row = vec![
            Cell::new(name),
            Cell::new(state.label()).fg(state_color(state)),
            Cell::new(value_cell(source, name, view.show_values)),
            Cell::new(value_cell(target, name, view.show_values)),
        ];
        if view.show_metadata {
            row.push(Cell::new(metadata_cell(source, target, name)));
        }
        table.add_row(row);
    }

    println!("{table}");
}

/// Print the per-state counts line under a comparison.
pub fn print_comparison_summary(classified: &Classification) {
    println!(
        "  {} match, {} different, {} source-only, {} target-only",
        style(classified.count(ComparisonState::Match)).dim(),
        style(classified.count(ComparisonState::Different))
            .yellow()
            .bold(),
        style(classified.count(ComparisonState::SourceOnly))
            .red()
            .bold(),
        style(classified.count(ComparisonState::TargetOnly))
            .cyan()
            .bold(),
    );
}

fn state_color(state: ComparisonState) -> Color {
    match state {
        ComparisonState::Match => Color::Green,
        ComparisonState::Different => Color::Yellow,
        ComparisonState::SourceOnly => Color::Red,
        ComparisonState::TargetOnly => Color::Cyan,
    }
}

fn value_cell(snapshot: &Snapshot, name: &str, show_values: bool) -> String {
    match snapshot.value(name) {
        None => "-".to_string(),
        Some(_) if !show_values => HIDDEN.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Prefer the target's metadata; fall back to the source's.
fn metadata_cell(source: &Snapshot, target: &Snapshot, name: &str) -> String {
    target
        .get(name)
        .or_else(|| source.get(name))
        .map(|r| {
            format!(
                "{} | Version: {} | Enabled: {}",
                r.metadata.summary(),
                r.metadata.version_label(),
                r.metadata.enabled_label()
            )
        })
        .unwrap_or_default()
}
