use console::style;
use mozu_actions_core::pipeline::RunSummary;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// File progress and closing notes of a generator run.
pub fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(summary);
    }

    for path in &summary.files.created {
        println!("  created: {path}");
    }
    for path in &summary.files.updated {
        println!("  updated: {path}");
    }
    for path in &summary.files.skipped {
        println!("  skipped: {path}");
    }

    println!();
    for action in &summary.actions {
        println!(
            "{} {} ({})",
            style(action.name.as_str()).bold(),
            action.custom_function_names.join(", "),
            action.domain
        );
    }
    for note in &summary.notes {
        println!("{} {note}", style("note:").yellow());
    }
    Ok(())
}
