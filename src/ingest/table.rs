use csv::ReaderBuilder;
use std::ops::Range;

use crate::error::{CleanError, Result};

/// A parsed CSV section: header names plus raw string cells.
///
/// Cells are kept exactly as exported. A blank cell is the empty string, which
/// is also what an absent column reads as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell at `row` under column `name`, or None when either is missing.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Non-empty cell at `row` under column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        self.cell(row, name).filter(|v| !v.trim().is_empty())
    }

    /// Copy of the rows in `range`, clamped to the table length.
    pub fn slice(&self, range: Range<usize>) -> Table {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        Table {
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Project onto `names`, in that order. Absent columns come back blank.
    pub fn select(&self, names: &[&str]) -> Table {
        let positions: Vec<Option<usize>> = names.iter().map(|n| self.column(n)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|p| p.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        }
    }

    /// Append a column holding one value per row.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Append the rows of `other`, matching columns by name.
    pub fn extend(&mut self, other: &Table) {
        let names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let aligned = other.select(&names);
        self.rows.extend(aligned.rows);
    }
}

/// Byte offset of the start of zero-based `line` in `text`.
/// Past the last line this is `text.len()`.
pub fn line_offset(text: &str, line: usize) -> usize {
    text.split_inclusive('\n').take(line).map(str::len).sum()
}

/// Parse the table whose header sits on zero-based `header_line`.
///
/// Blank lines are skipped. Short rows are padded with blank cells; a row with
/// extra non-empty fields is rejected, since its cells cannot be attributed to
/// a column.
pub fn parse_table(text: &str, header_line: usize) -> Result<Table> {
    let body = &text[line_offset(text, header_line)..];
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = reader.records();
    let columns: Vec<String> = match records.next() {
        Some(header) => header?
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if name.is_empty() {
                    format!("Unnamed: {i}")
                } else {
                    name.to_string()
                }
            })
            .collect(),
        None => return Ok(Table::default()),
    };

    let width = columns.len();
    let mut table = Table::new(columns);

    for record in records {
        let record = record?;
        if record.iter().all(str::is_empty) && record.len() <= 1 {
            continue;
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() > width {
            if row[width..].iter().any(|v| !v.is_empty()) {
                let line = record
                    .position()
                    .map(|p| p.line() as usize + header_line)
                    .unwrap_or(header_line);
                return Err(CleanError::MalformedRow {
                    line,
                    expected: width,
                    found: row.len(),
                });
            }
            row.truncate(width);
        }
        row.resize(width, String::new());
        table.rows.push(row);
    }

    Ok(table)
}

/// A one-row metadata block: a header line and the line right after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRow {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl MetadataRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Read the metadata block whose header is on zero-based `header_line`.
/// Only two records are consumed, so whatever follows may have any shape.
pub fn read_metadata_row(text: &str, header_line: usize) -> Result<Option<MetadataRow>> {
    let body = &text[line_offset(text, header_line)..];
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = reader.records();
    let (Some(header), Some(values)) = (records.next(), records.next()) else {
        return Ok(None);
    };

    Ok(Some(MetadataRow {
        columns: header?.iter().map(str::to_string).collect(),
        values: values?.iter().map(str::to_string).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Report\nGenerated,now\nName,Email,Minutes\nAda,ada@x.org,10\n\nBob,bob@x.org\n";

    #[test]
    fn test_line_offset() {
        assert_eq!(line_offset(SAMPLE, 0), 0);
        assert_eq!(line_offset(SAMPLE, 1), "Report\n".len());
        assert_eq!(line_offset(SAMPLE, 99), SAMPLE.len());
    }

    #[test]
    fn test_parse_table_from_header_line() {
        let table = parse_table(SAMPLE, 2).unwrap();
        assert_eq!(table.columns, vec!["Name", "Email", "Minutes"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Email"), Some("ada@x.org"));
        // short row padded, blank line skipped
        assert_eq!(table.cell(1, "Minutes"), Some(""));
        assert_eq!(table.value(1, "Minutes"), None);
    }

    #[test]
    fn test_parse_table_rejects_overlong_row() {
        let text = "A,B\n1,2\n3,4,5\n";
        match parse_table(text, 0) {
            Err(CleanError::MalformedRow {
                line,
                expected,
                found,
            }) => {
                assert_eq!((line, expected, found), (3, 2, 3));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_table_allows_trailing_comma() {
        let text = "A,B\n1,2,\n";
        let table = parse_table(text, 0).unwrap();
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_unnamed_header_columns() {
        let table = parse_table("A,,C\n1,2,3\n", 0).unwrap();
        assert_eq!(table.columns, vec!["A", "Unnamed: 1", "C"]);
    }

    #[test]
    fn test_select_tolerates_missing_columns() {
        let table = parse_table(SAMPLE, 2).unwrap();
        let projected = table.select(&["Email", "Country"]);
        assert_eq!(projected.columns, vec!["Email", "Country"]);
        assert_eq!(projected.rows[0], vec!["ada@x.org".to_string(), String::new()]);
    }

    #[test]
    fn test_slice_clamps() {
        let table = parse_table(SAMPLE, 2).unwrap();
        assert_eq!(table.slice(1..10).len(), 1);
        assert!(table.slice(5..10).is_empty());
    }

    #[test]
    fn test_read_metadata_row() {
        let meta = read_metadata_row(SAMPLE, 2).unwrap().unwrap();
        assert_eq!(meta.get("Email"), Some("ada@x.org"));
        assert_eq!(meta.first(), Some("Ada"));
        assert!(read_metadata_row("only-one-line\n", 0).unwrap().is_none());
    }
}
