pub mod pivot;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::clean::Role;

/// Which export pipeline produced a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionType {
    Webinar,
    Meeting,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Webinar => "Webinar",
            SessionType::Meeting => "Meeting",
        }
    }
}

/// One row per processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRecord {
    pub date: Option<NaiveDate>,
    pub topic: String,
    pub total_attendee: usize,
    pub total_panelist: usize,
    pub total_all: usize,
    pub row_deleted: usize,
    pub session_type: SessionType,
}

impl SummaryRecord {
    pub fn new(
        date: Option<NaiveDate>,
        topic: String,
        total_attendee: usize,
        total_panelist: usize,
        row_deleted: usize,
        session_type: SessionType,
    ) -> Self {
        SummaryRecord {
            date,
            topic,
            total_attendee,
            total_panelist,
            total_all: total_attendee + total_panelist,
            row_deleted,
            session_type,
        }
    }
}

/// One person in one role at one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub email: String,
    pub country: Option<String>,
    pub role: Role,
    pub topic: String,
    pub date: Option<NaiveDate>,
}

/// Keep the first entry per (email, role, topic, date).
pub fn dedupe_roster(entries: Vec<RosterEntry>) -> Vec<RosterEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert((e.email.clone(), e.role, e.topic.clone(), e.date)))
        .collect()
}

/// Output date style. Dates stay `NaiveDate` until they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    #[default]
    Iso,
    /// `DD/MM/YYYY`
    DayFirst,
}

impl DateFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "iso" | "ymd" => Some(DateFormat::Iso),
            "day-first" | "dmy" => Some(DateFormat::DayFirst),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::Iso => "iso",
            DateFormat::DayFirst => "day-first",
        }
    }

    /// Render a date; unknown dates render blank.
    pub fn format(&self, date: Option<NaiveDate>) -> String {
        let pattern = match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::DayFirst => "%d/%m/%Y",
        };
        date.map(|d| d.format(pattern).to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(email: &str, role: Role, day: u32) -> RosterEntry {
        RosterEntry {
            name: email.to_string(),
            email: email.to_string(),
            country: None,
            role,
            topic: "Intro".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, day),
        }
    }

    #[test]
    fn test_summary_totals() {
        let s = SummaryRecord::new(None, "t".into(), 8, 3, 2, SessionType::Webinar);
        assert_eq!(s.total_all, s.total_attendee + s.total_panelist);
        assert_eq!(s.total_all, 11);
    }

    #[test]
    fn test_summary_serializes_counts_as_numbers() {
        let s = SummaryRecord::new(
            NaiveDate::from_ymd_opt(2025, 3, 1),
            "Rice".into(),
            8,
            3,
            2,
            SessionType::Meeting,
        );
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["total_all"], 11);
        assert_eq!(value["date"], "2025-03-01");
        assert_eq!(value["session_type"], "Meeting");
    }

    #[test]
    fn test_dedupe_roster_keeps_both_roles() {
        let roster = dedupe_roster(vec![
            entry("a@x.org", Role::Panelist, 1),
            entry("a@x.org", Role::Attendee, 1),
            entry("a@x.org", Role::Attendee, 1),
            entry("a@x.org", Role::Attendee, 2),
        ]);
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].role, Role::Panelist);
        assert_eq!(roster[1].role, Role::Attendee);
    }

    #[test]
    fn test_date_format() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7);
        assert_eq!(DateFormat::Iso.format(d), "2025-03-07");
        assert_eq!(DateFormat::DayFirst.format(d), "07/03/2025");
        assert_eq!(DateFormat::Iso.format(None), "");
        assert_eq!(DateFormat::from_str("DMY"), Some(DateFormat::DayFirst));
        assert_eq!(DateFormat::from_str("weekly"), None);
    }
}
