use chrono::{NaiveDate, NaiveDateTime};
use std::io::{Read, Seek};
use tracing::info;

use super::header::find_header;
use super::table::{parse_table, read_metadata_row, MetadataRow};
use super::{settle_date, CleanOptions, FileKind, FileReport, UploadedFile};
use crate::clean::{deduplicate, IdentityRule, Role};
use crate::error::Result;
use crate::report::{SessionType, SummaryRecord};

pub const MEETING_HEADER_MARKER: &str = "Name (original name)";

pub const NAME_COLUMN: &str = "Name (original name)";
pub const DURATION_COLUMN: &str = "Total duration (minutes)";
pub const START_TIME_COLUMN: &str = "Start time";

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%dT%H:%M:%S",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M:%S %p",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%b %d, %Y"];

/// Meeting title: the first cell of the first metadata row, as-is.
pub fn read_topic(meta: Option<&MetadataRow>) -> String {
    meta.and_then(MetadataRow::first)
        .unwrap_or_default()
        .to_string()
}

/// Calendar day of a meeting `Start time` value. US month-first forms are
/// tried before ISO ones, matching how Zoom writes them.
pub fn parse_start_time(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Clean a meeting participants report.
///
/// Rows are projected to name and total duration and deduplicated on that
/// pair; roles come from the panelist name patterns. Meetings carry no email
/// or country, so they add nothing to the roster.
pub fn clean_meeting<R: Read + Seek>(
    file: &mut UploadedFile<R>,
    opts: &CleanOptions,
) -> Result<FileReport> {
    let header_line = find_header(&file.read_text()?, FileKind::Meeting)?;
    let table = parse_table(&file.read_text()?, header_line)?;
    let meta = read_metadata_row(&file.read_text()?, 0)?;

    let topic = read_topic(meta.as_ref());
    let raw_date = meta.as_ref().and_then(|m| m.get(START_TIME_COLUMN));
    let (date, date_note) = settle_date(
        raw_date,
        raw_date.and_then(parse_start_time),
        opts.strict_dates,
    )?;

    let projected = table.select(&[NAME_COLUMN, DURATION_COLUMN]);
    let deduped = deduplicate(
        &projected,
        &IdentityRule::columns([NAME_COLUMN, DURATION_COLUMN]),
    );

    let roles: Vec<Role> = (0..deduped.table.len())
        .map(|row| {
            let name = deduped.table.cell(row, NAME_COLUMN).unwrap_or_default();
            opts.panelists.classify(name)
        })
        .collect();
    let total_panelist = roles.iter().filter(|r| **r == Role::Panelist).count();
    let total_attendee = roles.len() - total_panelist;

    let summary = SummaryRecord::new(
        date,
        topic,
        total_attendee,
        total_panelist,
        deduped.removed,
        SessionType::Meeting,
    );

    let mut cleaned = deduped.table;
    cleaned.push_column("Role", roles.iter().map(|r| r.as_str().to_string()).collect());

    info!(
        "{}: {} panelists, {} attendees, {} duplicate rows removed",
        file.name(),
        summary.total_panelist,
        summary.total_attendee,
        summary.row_deleted
    );

    Ok(FileReport {
        filename: file.name().to_string(),
        kind: FileKind::Meeting,
        summary,
        cleaned,
        roster: Vec::new(),
        notes: date_note.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::PanelistMatcher;

    const REPORT: &str = "\
Topic,Meeting ID,Start time,End time,User email,Duration (minutes),Participants
Weekly Sync,812 3456 7890,03/04/2025 09:00:00 AM,03/04/2025 10:00:00 AM,host@x.org,60,5

Name (original name),User email,Total duration (minutes),Guest
iBlooming Host,host@x.org,60,No
Ada,,45,Yes
Ada,,45,Yes
Bob,,30,Yes
Interpreter Kim,,58,Yes
";

    #[test]
    fn test_parse_start_time() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 4);
        assert_eq!(parse_start_time("03/04/2025 09:00:00 AM"), expected);
        assert_eq!(parse_start_time("2025-03-04 21:00:00"), expected);
        assert_eq!(parse_start_time("Mar 4, 2025 09:00 AM"), expected);
        assert_eq!(parse_start_time("03/04/2025"), expected);
        assert_eq!(parse_start_time("next tuesday"), None);
    }

    #[test]
    fn test_clean_meeting() {
        let mut file = UploadedFile::from_bytes("participants_1.csv", REPORT.as_bytes().to_vec());
        let report = clean_meeting(&mut file, &CleanOptions::default()).unwrap();

        let s = &report.summary;
        assert_eq!(s.topic, "Weekly Sync");
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2025, 3, 4));
        assert_eq!((s.total_panelist, s.total_attendee), (2, 2));
        assert_eq!(s.row_deleted, 1);
        assert_eq!(s.session_type, SessionType::Meeting);

        assert_eq!(
            report.cleaned.columns,
            vec![NAME_COLUMN, DURATION_COLUMN, "Role"]
        );
        assert_eq!(report.cleaned.cell(0, "Role"), Some("Panelist"));
        assert_eq!(report.cleaned.cell(1, "Role"), Some("Attendee"));
        assert!(report.roster.is_empty());
    }

    #[test]
    fn test_empty_pattern_list() {
        let opts = CleanOptions {
            panelists: PanelistMatcher::parse("").unwrap(),
            ..CleanOptions::default()
        };
        let mut file = UploadedFile::from_bytes("participants_1.csv", REPORT.as_bytes().to_vec());
        let report = clean_meeting(&mut file, &opts).unwrap();
        assert_eq!(report.summary.total_panelist, 0);
        assert_eq!(report.summary.total_attendee, 4);
    }

    #[test]
    fn test_same_name_and_duration_conflate() {
        // two different people, same display name and duration: counted once
        let text = REPORT.replace("Bob,,30", "Ada,,45");
        let mut file = UploadedFile::from_bytes("participants_1.csv", text.into_bytes());
        let report = clean_meeting(&mut file, &CleanOptions::default()).unwrap();
        assert_eq!(report.summary.row_deleted, 2);
        assert_eq!(report.summary.total_attendee, 1);
    }
}
