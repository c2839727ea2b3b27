//! Plain text table output

use std::fmt::Write;

use datatable_lib::DataTable;
use datatable_lib::TableStatus;
use datatable_lib::model::TableRow;

/// Renders the visible columns and rows as aligned text.
///
/// Shows the status message instead when there is nothing to list.
pub fn render_table<T: TableRow>(table: &DataTable<T>) -> String {
    match table.status() {
        TableStatus::Ready => {}
        TableStatus::Error(message) | TableStatus::Empty(message) | TableStatus::NoResults(message) => {
            return format!("{}\n", message);
        }
        TableStatus::Loading => return "Loading...\n".to_string(),
    }

    let columns = table.visible_columns();
    let headers: Vec<String> = columns.iter().map(|c| c.label()).collect();
    let cells: Vec<Vec<String>> = table
        .view()
        .iter()
        .map(|row| columns.iter().map(|c| c.render(row)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(&mut out, &rule, &widths);
    for row in &cells {
        write_line(&mut out, row, &widths);
    }
    out
}

fn write_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
