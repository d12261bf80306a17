use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::batch::{BatchReport, Warning};
use crate::clean::Role;
use crate::ingest::table::Table;
use crate::ingest::FileKind;
use crate::report::pivot::{MergedSummary, PivotRow};
use crate::report::{DateFormat, RosterEntry, SessionType};

/// Pretty-print any serializable value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Table rows as JSON objects keyed by column name.
pub fn records(table: &Table) -> Vec<Value> {
    table
        .rows
        .iter()
        .map(|row| {
            let map: Map<String, Value> = table
                .columns
                .iter()
                .zip(row)
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            Value::Object(map)
        })
        .collect()
}

/// The whole batch result as one JSON document. Counts stay numeric;
/// dates are rendered with `fmt`.
#[derive(Debug, Serialize)]
pub struct BatchJson<'a> {
    files: usize,
    webinars: usize,
    meetings: usize,
    total_data: usize,
    summary: Vec<SummaryJson<'a>>,
    roster: Vec<RosterJson<'a>>,
    countries: Vec<PivotJson<'a>>,
    cleaned: Vec<CleanedJson<'a>>,
    warnings: &'a [Warning],
}

#[derive(Debug, Serialize)]
struct SummaryJson<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Topic")]
    topic: &'a str,
    #[serde(rename = "Total_Attendee")]
    total_attendee: usize,
    #[serde(rename = "Total_Panelist")]
    total_panelist: usize,
    #[serde(rename = "Total_All")]
    total_all: usize,
    #[serde(rename = "Row_Deleted")]
    row_deleted: usize,
    #[serde(rename = "Type")]
    session_type: SessionType,
    #[serde(flatten)]
    countries: BTreeMap<&'a str, usize>,
}

#[derive(Debug, Serialize)]
struct RosterJson<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Country")]
    country: Option<&'a str>,
    #[serde(rename = "Role")]
    role: Role,
    #[serde(rename = "Topic")]
    topic: &'a str,
    #[serde(rename = "Date")]
    date: String,
}

#[derive(Debug, Serialize)]
struct PivotJson<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Topic")]
    topic: &'a str,
    #[serde(flatten)]
    countries: BTreeMap<&'a str, usize>,
}

#[derive(Debug, Serialize)]
struct CleanedJson<'a> {
    filename: &'a str,
    kind: &'static str,
    rows: Vec<Value>,
}

fn by_country<'a>(countries: &'a [String], counts: &[usize]) -> BTreeMap<&'a str, usize> {
    countries.iter().map(String::as_str).zip(counts.iter().copied()).collect()
}

pub fn batch_json(report: &BatchReport, fmt: DateFormat) -> BatchJson<'_> {
    let countries = &report.pivot.countries;

    let summary = report
        .merged
        .iter()
        .map(|MergedSummary { summary: s, countries: counts }| SummaryJson {
            date: fmt.format(s.date),
            topic: &s.topic,
            total_attendee: s.total_attendee,
            total_panelist: s.total_panelist,
            total_all: s.total_all,
            row_deleted: s.row_deleted,
            session_type: s.session_type,
            countries: by_country(countries, counts),
        })
        .collect();

    let roster = report
        .roster
        .iter()
        .map(|e: &RosterEntry| RosterJson {
            name: &e.name,
            email: &e.email,
            country: e.country.as_deref(),
            role: e.role,
            topic: &e.topic,
            date: fmt.format(e.date),
        })
        .collect();

    let pivot = report
        .pivot
        .rows
        .iter()
        .map(|r: &PivotRow| PivotJson {
            date: fmt.format(Some(r.date)),
            topic: &r.topic,
            countries: by_country(countries, &r.counts),
        })
        .collect();

    let cleaned = report
        .files
        .iter()
        .map(|f| CleanedJson {
            filename: &f.filename,
            kind: f.kind.label(),
            rows: records(&f.cleaned),
        })
        .collect();

    BatchJson {
        files: report.files.len(),
        webinars: report.count_of(FileKind::Webinar),
        meetings: report.count_of(FileKind::Meeting),
        total_data: report.roster.len(),
        summary,
        roster,
        countries: pivot,
        cleaned,
        warnings: &report.warnings,
    }
}
