pub mod header;
pub mod meeting;
pub mod table;
pub mod webinar;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::clean::{PanelistMatcher, Role};
use crate::error::{CleanError, Result};
use crate::report::{RosterEntry, SummaryRecord};
use table::Table;

/// The two Zoom exports we know how to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Webinar attendee report.
    Webinar,
    /// Meeting participants report.
    Meeting,
}

impl FileKind {
    /// Route by filename, the way Zoom names its exports.
    pub fn detect(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.contains("attendee") {
            Some(FileKind::Webinar)
        } else if lower.contains("participants") {
            Some(FileKind::Meeting)
        } else {
            None
        }
    }

    pub fn header_marker(&self) -> &'static str {
        match self {
            FileKind::Webinar => webinar::WEBINAR_HEADER_MARKER,
            FileKind::Meeting => meeting::MEETING_HEADER_MARKER,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Webinar => "Webinar",
            FileKind::Meeting => "Meeting",
        }
    }
}

/// A named upload. The stream is rewound before every read, so each stage
/// sees the whole file no matter what ran before it.
pub struct UploadedFile<R> {
    name: String,
    reader: R,
}

impl UploadedFile<Cursor<Vec<u8>>> {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile::new(name, Cursor::new(bytes))
    }
}

impl<R: Read + Seek> UploadedFile<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        UploadedFile {
            name: name.into(),
            reader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the full stream from offset zero as text. Invalid UTF-8 is
    /// replaced and a leading byte-order mark is dropped.
    pub fn read_text(&mut self) -> Result<String> {
        self.reader.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        self.reader.read_to_end(&mut bytes)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(match text.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => text,
        })
    }
}

/// Per-run knobs the pipelines need.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub panelists: PanelistMatcher,
    /// Stripped from the front of webinar topics.
    pub topic_prefix: String,
    /// Reject files whose session date does not parse.
    pub strict_dates: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            panelists: PanelistMatcher::parse(crate::clean::roles::DEFAULT_PANELIST_PATTERNS)
                .unwrap_or_default(),
            topic_prefix: webinar::DEFAULT_TOPIC_PREFIX.to_string(),
            strict_dates: false,
        }
    }
}

/// Everything one cleaned file contributes to a batch.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub filename: String,
    pub kind: FileKind,
    pub summary: SummaryRecord,
    /// Surviving rows with a `Role` column appended.
    pub cleaned: Table,
    /// Person-level rows; always empty for meetings.
    pub roster: Vec<RosterEntry>,
    /// Non-fatal problems found along the way.
    pub notes: Vec<String>,
}

/// Run the pipeline for `kind` over one file.
pub fn clean_file<R: Read + Seek>(
    file: &mut UploadedFile<R>,
    kind: FileKind,
    opts: &CleanOptions,
) -> Result<FileReport> {
    match kind {
        FileKind::Webinar => webinar::clean_webinar(file, opts),
        FileKind::Meeting => meeting::clean_meeting(file, opts),
    }
}

/// Decide what to do with a session date that may not have parsed.
///
/// Returns the date (None when degraded) and a note for the warning list.
pub(crate) fn settle_date(
    raw: Option<&str>,
    parsed: Option<NaiveDate>,
    strict: bool,
) -> Result<(Option<NaiveDate>, Option<String>)> {
    if parsed.is_some() {
        return Ok((parsed, None));
    }
    let value = raw.unwrap_or_default().to_string();
    let err = CleanError::MalformedDate { value };
    if strict {
        return Err(err);
    }
    warn!("{}", err);
    Ok((None, Some(format!("{err}; kept with an empty date"))))
}

/// Tag each row of `table` with `role`.
pub(crate) fn with_role(mut table: Table, role: Role) -> Table {
    let values = vec![role.as_str().to_string(); table.len()];
    table.push_column("Role", values);
    table
}

/// What the locator and metadata extractor see in a single file.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub kind: FileKind,
    pub header_line: usize,
    pub topic: String,
    pub raw_date: Option<String>,
    pub date: Option<NaiveDate>,
    pub data_rows: usize,
}

/// Locate header and metadata without cleaning or aggregating.
pub fn inspect<R: Read + Seek>(
    file: &mut UploadedFile<R>,
    opts: &CleanOptions,
) -> Result<Inspection> {
    let kind = FileKind::detect(file.name()).ok_or(CleanError::UnrecognizedFileKind)?;
    let text = file.read_text()?;
    let header_line = header::find_header(&text, kind)?;
    let table = table::parse_table(&text, header_line)?;

    let (topic, raw_date, date) = match kind {
        FileKind::Webinar => {
            let topic = webinar::read_topic(&text, &opts.topic_prefix)?;
            let raw = webinar::raw_session_date(&table).map(str::to_string);
            let date = raw.as_deref().and_then(webinar::parse_session_date);
            (topic, raw, date)
        }
        FileKind::Meeting => {
            let meta = table::read_metadata_row(&text, 0)?;
            let topic = meeting::read_topic(meta.as_ref());
            let raw = meta
                .as_ref()
                .and_then(|m| m.get(meeting::START_TIME_COLUMN))
                .map(str::to_string);
            let date = raw.as_deref().and_then(meeting::parse_start_time);
            (topic, raw, date)
        }
    };

    Ok(Inspection {
        kind,
        header_line,
        topic,
        raw_date,
        date,
        data_rows: table.len(),
    })
}

/// Resolve files, directories and glob patterns into a sorted list of paths.
///
/// Directories are walked recursively and only `.csv` files are taken from
/// them. Explicit file arguments are kept whatever their extension.
pub fn collect_paths(paths: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_dir() {
            collect_directory(path, &mut found)?;
        } else if path.is_file() {
            found.push(path.to_path_buf());
        } else {
            // Try glob pattern
            let matches: Vec<_> = glob::glob(path_str)
                .with_context(|| format!("Invalid path or glob pattern: {path_str}"))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            if matches.is_empty() {
                bail!("No files found matching: {path_str}");
            }
            found.extend(matches);
        }
    }

    Ok(found)
}

fn collect_directory(dir: &Path, found: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_directory(&path, found)?;
        } else if path.is_file() && is_csv(&path) {
            found.push(path);
        }
    }

    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Load each path into memory as an upload named after its file name.
pub fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<UploadedFile<Cursor<Vec<u8>>>>> {
    paths
        .iter()
        .map(|path| {
            let bytes =
                std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");
            info!("Loaded {} ({} bytes)", path.display(), bytes.len());
            Ok(UploadedFile::from_bytes(filename, bytes))
        })
        .collect()
}
