use unicode_width::UnicodeWidthStr;

use crate::batch::{BatchReport, Warning};
use crate::ingest::table::Table;
use crate::ingest::{FileKind, Inspection};
use crate::report::DateFormat;

/// Widest a single column is allowed to get on screen.
const MAX_COLUMN_WIDTH: usize = 40;

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Pad to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

/// Render a table as aligned text, one line per row.
pub fn render(table: &Table) -> Vec<String> {
    let cells: Vec<Vec<String>> = std::iter::once(&table.columns)
        .chain(table.rows.iter())
        .map(|row| row.iter().map(|c| truncate(c, MAX_COLUMN_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = (0..table.columns.len())
        .map(|i| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| UnicodeWidthStr::width(c.as_str()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |row: &Vec<String>| -> String {
        row.iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(cells.len() + 1);
    if let Some((header, body)) = cells.split_first() {
        lines.push(line(header));
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        lines.push("-".repeat(total));
        lines.extend(body.iter().map(line));
    }
    lines
}

fn print_table(title: &str, table: &Table) {
    println!("{title}:\n");
    if table.is_empty() {
        println!("  (none)\n");
        return;
    }
    for line in render(table) {
        println!("  {line}");
    }
    println!();
}

/// Print the summary, pivot and warnings for `zoomclean process`.
pub fn print_batch(report: &BatchReport, fmt: DateFormat) {
    let webinars = report.count_of(FileKind::Webinar);
    let meetings = report.count_of(FileKind::Meeting);
    println!(
        "{} file{} processed ({} webinar{}, {} meeting{}):\n",
        report.files.len(),
        if report.files.len() == 1 { "" } else { "s" },
        webinars,
        if webinars == 1 { "" } else { "s" },
        meetings,
        if meetings == 1 { "" } else { "s" },
    );

    print_table("Summary", &super::summary_table(report, fmt));
    println!("Total Data : {}\n", report.roster.len());
    print_table("Horizontal Data", &super::pivot_table(&report.pivot, fmt));
    print_warnings(&report.warnings);
}

pub fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!(
        "{} warning{}:",
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" }
    );
    for w in warnings {
        eprintln!("  {}: {}", w.filename, w.message);
    }
}

/// Print what `zoomclean inspect` found in one file.
pub fn print_inspection(filename: &str, inspection: &Inspection, fmt: DateFormat) {
    println!("File: {filename}");
    println!("  Kind:        {}", inspection.kind.label());
    println!("  Header line: {}", inspection.header_line + 1);
    println!("  Topic:       {}", inspection.topic);
    println!(
        "  Date:        {} (raw: {})",
        if inspection.date.is_some() {
            fmt.format(inspection.date)
        } else {
            "unparsed".to_string()
        },
        inspection.raw_date.as_deref().unwrap_or("none"),
    );
    println!("  Data rows:   {}", inspection.data_rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_render_aligns_columns() {
        let mut table = Table::new(vec!["Topic".into(), "N".into()]);
        table.rows.push(vec!["Rice farming".into(), "12".into()]);
        table.rows.push(vec!["Soil".into(), "3".into()]);
        let lines = render(&table);
        assert_eq!(lines[0], "Topic         N");
        assert_eq!(lines[1], "----------------");
        assert_eq!(lines[2], "Rice farming  12");
        assert_eq!(lines[3], "Soil          3");
    }
}
