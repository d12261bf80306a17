use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::batch::BatchReport;
use crate::ingest::table::Table;
use crate::report::DateFormat;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

pub const SUMMARY_FILE: &str = "zoom_processed_result.csv";
pub const ROSTER_FILE: &str = "zoom_attendees_all.csv";
pub const PIVOT_FILE: &str = "horizontal.csv";

/// Write `table` as comma-separated UTF-8 with a header row and no index.
pub fn write_table<W: Write>(mut out: W, table: &Table, bom: bool) -> Result<()> {
    if bom {
        out.write_all(UTF8_BOM)?;
    }
    let mut writer = ::csv::WriterBuilder::new().from_writer(out);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv_bytes(table: &Table, bom: bool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_table(&mut buf, table, bom)?;
    Ok(buf)
}

fn write_file(path: &Path, table: &Table, bom: bool) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(std::io::BufWriter::new(file), table, bom)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write every export of a batch into `dir`. Returns the paths written.
///
/// Per-file cleaned tables are named `cleaned_<original filename>`.
pub fn export_batch(
    report: &BatchReport,
    dir: &Path,
    fmt: DateFormat,
    bom: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut outputs = vec![
        (dir.join(SUMMARY_FILE), super::summary_table(report, fmt)),
        (dir.join(ROSTER_FILE), super::roster_table(report, fmt)),
        (dir.join(PIVOT_FILE), super::pivot_table(&report.pivot, fmt)),
    ];
    for file in &report.files {
        if !file.cleaned.is_empty() {
            outputs.push((dir.join(format!("cleaned_{}", file.filename)), file.cleaned.clone()));
        }
    }

    let mut written = Vec::with_capacity(outputs.len());
    for (path, table) in outputs {
        write_file(&path, &table, bom)?;
        info!("Wrote {} ({} rows)", path.display(), table.len());
        written.push(path);
    }
    Ok(written)
}
