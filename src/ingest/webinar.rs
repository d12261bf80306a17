use chrono::NaiveDate;
use std::io::{Read, Seek};
use tracing::{debug, info, warn};

use super::header::find_header;
use super::table::{parse_table, read_metadata_row, Table};
use super::{settle_date, with_role, CleanOptions, FileKind, FileReport, UploadedFile};
use crate::clean::{deduplicate, split_sections, IdentityRule, Role};
use crate::error::Result;
use crate::report::{RosterEntry, SessionType, SummaryRecord};

pub const WEBINAR_HEADER_MARKER: &str = "User Name (Original Name)";

/// Line holding the "Topic,Webinar ID,..." metadata header; values follow it.
pub const WEBINAR_TOPIC_LINE: usize = 2;

pub const DEFAULT_TOPIC_PREFIX: &str = "iBlooming: ";

pub const NAME_COLUMN: &str = "User Name (Original Name)";
pub const EMAIL_COLUMN: &str = "Email";
pub const JOIN_TIME_COLUMN: &str = "Join Time";
pub const COUNTRY_COLUMN: &str = "Country/Region Name";
const TOPIC_COLUMN: &str = "Topic";

/// Columns that change between reconnects of the same attendee.
pub const VOLATILE_COLUMNS: [&str; 7] = [
    "User Name (Original Name)",
    "Attended",
    "Join Time",
    "Leave Time",
    "Time in Session (minutes)",
    "Is Guest",
    "Country/Region Name",
];

/// Session title from the metadata block, with `prefix` removed.
///
/// Falls back to the first metadata value when there is no `Topic` column,
/// and to an empty title when the block is missing.
pub fn read_topic(text: &str, prefix: &str) -> Result<String> {
    let meta = read_metadata_row(text, WEBINAR_TOPIC_LINE)?;
    let raw = meta
        .as_ref()
        .and_then(|m| m.get(TOPIC_COLUMN).or_else(|| m.first()))
        .unwrap_or_default();
    if meta.as_ref().and_then(|m| m.get(TOPIC_COLUMN)).is_none() {
        debug!("no {TOPIC_COLUMN} column on line {WEBINAR_TOPIC_LINE}, using {raw:?}");
    }
    Ok(strip_topic_prefix(raw, prefix))
}

fn strip_topic_prefix(raw: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return raw.to_string();
    }
    raw.strip_prefix(prefix).unwrap_or(raw).to_string()
}

/// `Join Time` of the last data row.
pub fn raw_session_date(table: &Table) -> Option<&str> {
    let last = table.len().checked_sub(1)?;
    table.value(last, JOIN_TIME_COLUMN)
}

/// Calendar day from the `YYYY-MM-DD` prefix of a join timestamp.
pub fn parse_session_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn roster_entries(table: &Table, role: Role, topic: &str, date: Option<NaiveDate>) -> Vec<RosterEntry> {
    (0..table.len())
        .map(|row| RosterEntry {
            name: table.cell(row, NAME_COLUMN).unwrap_or_default().to_string(),
            email: table.cell(row, EMAIL_COLUMN).unwrap_or_default().to_string(),
            country: table.value(row, COUNTRY_COLUMN).map(str::to_string),
            role,
            topic: topic.to_string(),
            date,
        })
        .collect()
}

/// Clean a webinar attendee report.
///
/// Panelists are deduplicated on email, attendees on everything except the
/// reconnect-volatile columns.
pub fn clean_webinar<R: Read + Seek>(
    file: &mut UploadedFile<R>,
    opts: &CleanOptions,
) -> Result<FileReport> {
    let header_line = find_header(&file.read_text()?, FileKind::Webinar)?;
    let topic = read_topic(&file.read_text()?, &opts.topic_prefix)?;
    let table = parse_table(&file.read_text()?, header_line)?;

    let raw_date = raw_session_date(&table);
    let (date, date_note) = settle_date(
        raw_date,
        raw_date.and_then(parse_session_date),
        opts.strict_dates,
    )?;

    let sections = split_sections(&table)?;
    let panelist_rule = IdentityRule::columns([EMAIL_COLUMN]);
    let mut notes: Vec<String> = date_note.into_iter().collect();
    let missing = panelist_rule.missing_columns(&sections.panelists);
    if !missing.is_empty() && sections.panelists.len() > 1 {
        let note = format!(
            "no {} column, panelists cannot be told apart and count as one",
            missing.join(", ")
        );
        warn!("{}: {}", file.name(), note);
        notes.push(note);
    }
    let panelists = deduplicate(&sections.panelists, &panelist_rule);
    let attendees = deduplicate(
        &sections.attendees,
        &IdentityRule::all_except(VOLATILE_COLUMNS),
    );

    let mut roster = roster_entries(&panelists.table, Role::Panelist, &topic, date);
    roster.extend(roster_entries(&attendees.table, Role::Attendee, &topic, date));

    let summary = SummaryRecord::new(
        date,
        topic,
        attendees.table.len(),
        panelists.table.len(),
        panelists.removed + attendees.removed,
        SessionType::Webinar,
    );

    let mut cleaned = with_role(panelists.table, Role::Panelist);
    cleaned.extend(&with_role(attendees.table, Role::Attendee));

    info!(
        "{}: {} panelists, {} attendees, {} duplicate rows removed",
        file.name(),
        summary.total_panelist,
        summary.total_attendee,
        summary.row_deleted
    );

    Ok(FileReport {
        filename: file.name().to_string(),
        kind: FileKind::Webinar,
        summary,
        cleaned,
        roster,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanError;

    const REPORT: &str = "\
Attendee Report
Report Generated:,\"Mar 3, 2025 10:00 AM\"
Topic,Webinar ID,Actual Start Time,Actual Duration (minutes)
iBlooming: Soil Basics,812 3456 7890,\"Mar 1, 2025 09:00 AM\",60
Host Details
Attended,User Name (Original Name),Email,Join Time,Leave Time,Time in Session (minutes),Is Guest,Country/Region Name
Yes,Host,host@x.org,2025-03-01 08:55:00,2025-03-01 10:00:00,65,No,Malaysia
Panelist Details
Yes,Pat,pat@x.org,2025-03-01 08:58:00,2025-03-01 10:00:00,62,No,Malaysia
Yes,Pat,pat@x.org,2025-03-01 09:10:00,2025-03-01 10:00:00,50,No,Malaysia
Attendee Details
Attended,User Name (Original Name),Email,Join Time,Leave Time,Time in Session (minutes),Is Guest,Country/Region Name
Yes,Ada,ada@x.org,2025-03-01 09:00:00,2025-03-01 09:20:00,20,Yes,Indonesia
Yes,Ada phone,ada@x.org,2025-03-01 09:25:00,2025-03-01 10:00:00,35,Yes,Indonesia
Yes,Bob,bob@x.org,2025-03-01 09:01:00,2025-03-01 10:00:00,59,Yes,
";

    #[test]
    fn test_read_topic_strips_prefix() {
        assert_eq!(read_topic(REPORT, DEFAULT_TOPIC_PREFIX).unwrap(), "Soil Basics");
        assert_eq!(read_topic(REPORT, "").unwrap(), "iBlooming: Soil Basics");
    }

    #[test]
    fn test_read_topic_fails_open() {
        let text = "a\nb\nTitle,Id\nRaw Title,1\n";
        assert_eq!(read_topic(text, DEFAULT_TOPIC_PREFIX).unwrap(), "Raw Title");
        assert_eq!(read_topic("a\n", DEFAULT_TOPIC_PREFIX).unwrap(), "");
    }

    #[test]
    fn test_parse_session_date() {
        assert_eq!(
            parse_session_date("2025-03-01 09:00:00"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(parse_session_date("03/01/2025 09:00"), None);
        assert_eq!(parse_session_date("2025"), None);
    }

    #[test]
    fn test_clean_webinar() {
        let mut file = UploadedFile::from_bytes("Soil_attendee.csv", REPORT.as_bytes().to_vec());
        let report = clean_webinar(&mut file, &CleanOptions::default()).unwrap();

        let s = &report.summary;
        assert_eq!(s.topic, "Soil Basics");
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!((s.total_panelist, s.total_attendee, s.total_all), (1, 2, 3));
        assert_eq!(s.row_deleted, 2);
        assert_eq!(s.session_type, SessionType::Webinar);

        assert_eq!(report.cleaned.len(), 3);
        assert_eq!(report.cleaned.columns.last().map(String::as_str), Some("Role"));
        assert_eq!(report.cleaned.cell(0, "Role"), Some("Panelist"));
        assert_eq!(report.cleaned.cell(2, "Email"), Some("bob@x.org"));

        assert_eq!(report.roster.len(), 3);
        assert_eq!(report.roster[1].country.as_deref(), Some("Indonesia"));
        assert_eq!(report.roster[2].country, None);
        assert!(report.notes.is_empty());
    }

    #[test]
    fn test_missing_country_column() {
        let text = "\
r
g
Topic
T
Attended,User Name (Original Name),Email,Join Time
Yes,Host,host@x.org,2025-03-01 08:55:00
Panelist Details
Attendee Details
Attended,User Name (Original Name),Email,Join Time
Yes,Ada,ada@x.org,2025-03-01 09:00:00
";
        let mut file = UploadedFile::from_bytes("attendee.csv", text.as_bytes().to_vec());
        let report = clean_webinar(&mut file, &CleanOptions::default()).unwrap();
        assert_eq!(report.summary.total_attendee, 1);
        assert_eq!(report.summary.total_panelist, 0);
        assert!(report.roster.iter().all(|e| e.country.is_none()));
    }

    #[test]
    fn test_missing_email_column_is_noted() {
        let text = "\
r
g
Topic
T
Attended,User Name (Original Name),Join Time
Yes,Host,2025-03-01 08:55:00
Panelist Details
Yes,Pat,2025-03-01 08:58:00
Yes,Quinn,2025-03-01 08:59:00
Attendee Details
Attended,User Name (Original Name),Join Time
Yes,Ada,2025-03-01 09:00:00
";
        let mut file = UploadedFile::from_bytes("attendee.csv", text.as_bytes().to_vec());
        let report = clean_webinar(&mut file, &CleanOptions::default()).unwrap();
        assert_eq!(report.summary.total_panelist, 1);
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("no Email column"));
    }

    #[test]
    fn test_missing_attendee_section() {
        let text = REPORT.replace("Attendee Details", "Someone Else");
        let mut file = UploadedFile::from_bytes("attendee.csv", text.into_bytes());
        assert!(matches!(
            clean_webinar(&mut file, &CleanOptions::default()),
            Err(CleanError::AttendeeSectionNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_date_degrades_or_rejects() {
        let text = REPORT.replace("2025-03-01 09:01:00", "soon");
        let mut file = UploadedFile::from_bytes("attendee.csv", text.into_bytes());

        let report = clean_webinar(&mut file, &CleanOptions::default()).unwrap();
        assert_eq!(report.summary.date, None);
        assert_eq!(report.summary.total_all, 3);
        assert_eq!(report.notes.len(), 1);

        let strict = CleanOptions {
            strict_dates: true,
            ..CleanOptions::default()
        };
        assert!(matches!(
            clean_webinar(&mut file, &strict),
            Err(CleanError::MalformedDate { .. })
        ));
    }
}
