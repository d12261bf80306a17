use serde::Serialize;
use std::collections::HashSet;
use std::io::{Read, Seek};
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{CleanError, Result};
use crate::ingest::{clean_file, CleanOptions, FileKind, FileReport, UploadedFile};
use crate::report::pivot::{CountryPivot, MergedSummary};
use crate::report::{dedupe_roster, RosterEntry, SummaryRecord};

/// One batch of uploads plus the options they are cleaned with.
pub struct BatchRequest<R> {
    pub files: Vec<UploadedFile<R>>,
    pub options: CleanOptions,
}

/// A per-file problem that did not stop the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub filename: String,
    pub message: String,
}

impl Warning {
    fn new(filename: &str, message: impl ToString) -> Self {
        Warning {
            filename: filename.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Per-file results, in upload order.
    pub files: Vec<FileReport>,
    pub summaries: Vec<SummaryRecord>,
    /// Deduplicated on (email, role, topic, date) across the batch.
    pub roster: Vec<RosterEntry>,
    pub pivot: CountryPivot,
    /// Summaries left-joined with the pivot.
    pub merged: Vec<MergedSummary>,
    pub warnings: Vec<Warning>,
    pub duration_secs: f64,
}

impl BatchReport {
    pub fn count_of(&self, kind: FileKind) -> usize {
        self.files.iter().filter(|f| f.kind == kind).count()
    }
}

/// Clean every file of the batch in order.
///
/// Files are routed by name; unknown names, repeated names, and files that
/// fail to parse are skipped with a warning. Fails only when no file at all
/// could be processed.
pub fn run_batch<R: Read + Seek>(request: BatchRequest<R>) -> Result<BatchReport> {
    let start = Instant::now();
    let BatchRequest { files, options } = request;
    let total = files.len();
    let width = format!("{}", total).len();

    let mut seen: HashSet<String> = HashSet::new();
    let mut reports: Vec<FileReport> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();

    for (i, mut file) in files.into_iter().enumerate() {
        let name = file.name().to_string();

        if !seen.insert(name.clone()) {
            warn!("Skipping duplicate filename: {}", name);
            warnings.push(Warning::new(&name, CleanError::DuplicateFilename));
            continue;
        }

        let Some(kind) = FileKind::detect(&name) else {
            warn!("Skipping unrecognized file: {}", name);
            warnings.push(Warning::new(&name, CleanError::UnrecognizedFileKind));
            continue;
        };

        match clean_file(&mut file, kind, &options) {
            Ok(report) => {
                eprintln!(
                    "  [{:>width$}/{}] {} ({}): {} total, {} duplicate rows removed",
                    i + 1,
                    total,
                    name,
                    kind.label(),
                    report.summary.total_all,
                    report.summary.row_deleted,
                );
                warnings.extend(report.notes.iter().map(|n| Warning::new(&name, n)));
                reports.push(report);
            }
            Err(e) => {
                eprintln!("  [{:>width$}/{}] SKIPPED {}: {}", i + 1, total, name, e);
                warnings.push(Warning::new(&name, e));
            }
        }
    }

    if reports.is_empty() {
        return Err(CleanError::NoProcessableFiles { warnings });
    }

    let summaries: Vec<SummaryRecord> = reports.iter().map(|r| r.summary.clone()).collect();
    let roster = dedupe_roster(reports.iter().flat_map(|r| r.roster.iter().cloned()).collect());
    let pivot = CountryPivot::build(&roster);
    let merged = pivot.merge(&summaries);

    let duration_secs = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} processed, {} warnings ({:.1}s)",
        reports.len(),
        warnings.len(),
        duration_secs
    );

    Ok(BatchReport {
        files: reports,
        summaries,
        roster,
        pivot,
        merged,
        warnings,
        duration_secs,
    })
}
