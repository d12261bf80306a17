use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{RosterEntry, SummaryRecord};

/// Participants per country per session, one column per country seen
/// anywhere in the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountryPivot {
    /// Sorted country names; `counts` in each row follows this order.
    pub countries: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub date: NaiveDate,
    pub topic: String,
    pub counts: Vec<usize>,
}

impl CountryPivot {
    /// Count roster entries per (date, topic, country).
    ///
    /// Entries without a country or without a date don't contribute; a
    /// session with no country data at all gets no row.
    pub fn build(roster: &[RosterEntry]) -> Self {
        let mut cells: BTreeMap<(NaiveDate, String), BTreeMap<&str, usize>> = BTreeMap::new();
        let mut countries: BTreeSet<&str> = BTreeSet::new();

        for entry in roster {
            let (Some(date), Some(country)) = (entry.date, entry.country.as_deref()) else {
                continue;
            };
            countries.insert(country);
            *cells
                .entry((date, entry.topic.clone()))
                .or_default()
                .entry(country)
                .or_insert(0) += 1;
        }

        let rows = cells
            .into_iter()
            .map(|((date, topic), by_country)| PivotRow {
                date,
                topic,
                counts: countries
                    .iter()
                    .map(|c| by_country.get(c).copied().unwrap_or(0))
                    .collect(),
            })
            .collect();

        CountryPivot {
            countries: countries.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    pub fn counts_for(&self, date: NaiveDate, topic: &str) -> Option<&[usize]> {
        self.rows
            .iter()
            .find(|r| r.date == date && r.topic == topic)
            .map(|r| r.counts.as_slice())
    }

    /// Left-join summary rows with the pivot on (date, topic). Rows with no
    /// match, including rows with an unknown date, get zero for every country.
    pub fn merge(&self, summaries: &[SummaryRecord]) -> Vec<MergedSummary> {
        summaries
            .iter()
            .map(|s| {
                let counts = s
                    .date
                    .and_then(|d| self.counts_for(d, &s.topic))
                    .map(<[usize]>::to_vec)
                    .unwrap_or_else(|| vec![0; self.countries.len()]);
                MergedSummary {
                    summary: s.clone(),
                    countries: counts,
                }
            })
            .collect()
    }
}

/// A summary row with its per-country counts appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedSummary {
    pub summary: SummaryRecord,
    /// Aligned with `CountryPivot::countries`.
    pub countries: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::Role;
    use crate::report::SessionType;

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 3, d)
    }

    fn entry(topic: &str, date: Option<NaiveDate>, country: Option<&str>) -> RosterEntry {
        RosterEntry {
            name: "n".into(),
            email: "e".into(),
            country: country.map(str::to_string),
            role: Role::Attendee,
            topic: topic.into(),
            date,
        }
    }

    #[test]
    fn test_pivot_counts_and_zero_fill() {
        let roster = vec![
            entry("A", day(1), Some("Malaysia")),
            entry("A", day(1), Some("Malaysia")),
            entry("A", day(1), Some("Indonesia")),
            entry("B", day(2), Some("Japan")),
            entry("B", day(2), None),
            entry("C", None, Some("Brunei")),
        ];
        let pivot = CountryPivot::build(&roster);
        assert_eq!(pivot.countries, vec!["Indonesia", "Japan", "Malaysia"]);
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(pivot.counts_for(day(1).unwrap(), "A"), Some(&[1, 0, 2][..]));
        assert_eq!(pivot.counts_for(day(2).unwrap(), "B"), Some(&[0, 1, 0][..]));
    }

    #[test]
    fn test_merge_fills_unmatched_with_zero() {
        let pivot = CountryPivot::build(&[entry("A", day(1), Some("Malaysia"))]);
        let summaries = vec![
            SummaryRecord::new(day(1), "A".into(), 1, 0, 0, SessionType::Webinar),
            SummaryRecord::new(day(1), "Standup".into(), 4, 1, 0, SessionType::Meeting),
            SummaryRecord::new(None, "A".into(), 1, 0, 0, SessionType::Webinar),
        ];
        let merged = pivot.merge(&summaries);
        assert_eq!(merged[0].countries, vec![1]);
        assert_eq!(merged[1].countries, vec![0]);
        assert_eq!(merged[2].countries, vec![0]);
    }

    #[test]
    fn test_empty_roster() {
        let pivot = CountryPivot::build(&[]);
        assert!(pivot.countries.is_empty());
        assert!(pivot.rows.is_empty());
    }
}
