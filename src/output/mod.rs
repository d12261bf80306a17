//! Rendering of batch results. Dates become strings here and nowhere else.

pub mod csv;
pub mod json;
pub mod table;

use crate::batch::BatchReport;
use crate::ingest::table::Table;
use crate::report::pivot::CountryPivot;
use crate::report::DateFormat;

const SUMMARY_COLUMNS: [&str; 7] = [
    "Date",
    "Topic",
    "Total_Attendee",
    "Total_Panelist",
    "Total_All",
    "Row_Deleted",
    "Type",
];

const ROSTER_COLUMNS: [&str; 6] = ["Name", "Email", "Country", "Role", "Topic", "Date"];

fn headers(fixed: &[&str], countries: &[String]) -> Vec<String> {
    fixed
        .iter()
        .map(|c| c.to_string())
        .chain(countries.iter().cloned())
        .collect()
}

/// Summary rows with one count column per country appended.
pub fn summary_table(report: &BatchReport, fmt: DateFormat) -> Table {
    let mut table = Table::new(headers(&SUMMARY_COLUMNS, &report.pivot.countries));
    for m in &report.merged {
        let s = &m.summary;
        let mut row = vec![
            fmt.format(s.date),
            s.topic.clone(),
            s.total_attendee.to_string(),
            s.total_panelist.to_string(),
            s.total_all.to_string(),
            s.row_deleted.to_string(),
            s.session_type.as_str().to_string(),
        ];
        row.extend(m.countries.iter().map(|c| c.to_string()));
        table.rows.push(row);
    }
    table
}

pub fn roster_table(report: &BatchReport, fmt: DateFormat) -> Table {
    let mut table = Table::new(headers(&ROSTER_COLUMNS, &[]));
    for e in &report.roster {
        table.rows.push(vec![
            e.name.clone(),
            e.email.clone(),
            e.country.clone().unwrap_or_default(),
            e.role.as_str().to_string(),
            e.topic.clone(),
            fmt.format(e.date),
        ]);
    }
    table
}

pub fn pivot_table(pivot: &CountryPivot, fmt: DateFormat) -> Table {
    let mut table = Table::new(headers(&["Date", "Topic"], &pivot.countries));
    for r in &pivot.rows {
        let mut row = vec![fmt.format(Some(r.date)), r.topic.clone()];
        row.extend(r.counts.iter().map(|c| c.to_string()));
        table.rows.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{run_batch, BatchRequest};
    use crate::ingest::{CleanOptions, UploadedFile};

    const WEBINAR: &str = "\
Attendee Report
x
Topic,Webinar ID
iBlooming: Rice,1
Attended,User Name (Original Name),Email,Join Time,Country/Region Name
Yes,Host,host@x.org,2025-03-01 08:55:00,Malaysia
Panelist Details
Yes,Pat,pat@x.org,2025-03-01 08:58:00,Japan
Attendee Details
Attended,User Name (Original Name),Email,Join Time,Country/Region Name
Yes,Ada,ada@x.org,2025-03-01 09:00:00,Malaysia
";

    fn report() -> BatchReport {
        run_batch(BatchRequest {
            files: vec![UploadedFile::from_bytes("rice_attendee.csv", WEBINAR.as_bytes().to_vec())],
            options: CleanOptions::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_summary_table_has_country_columns() {
        let table = summary_table(&report(), DateFormat::DayFirst);
        assert_eq!(&table.columns[7..], &["Japan".to_string(), "Malaysia".to_string()]);
        assert_eq!(
            table.rows[0],
            vec!["01/03/2025", "Rice", "1", "1", "2", "0", "Webinar", "1", "1"]
        );
    }

    #[test]
    fn test_roster_and_pivot_tables() {
        let report = report();
        let roster = roster_table(&report, DateFormat::Iso);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.rows[0][3], "Panelist");
        assert_eq!(roster.rows[1][5], "2025-03-01");

        let pivot = pivot_table(&report.pivot, DateFormat::Iso);
        assert_eq!(pivot.columns, vec!["Date", "Topic", "Japan", "Malaysia"]);
        assert_eq!(pivot.rows[0], vec!["2025-03-01", "Rice", "1", "1"]);
    }
}
