use std::ops::Range;
use tracing::debug;

use crate::error::{CleanError, Result};
use crate::ingest::table::Table;

/// Marker row separating panelists from attendees in a webinar report.
pub const ATTENDEE_SENTINEL: &str = "Attendee Details";

/// Column the sentinel is looked up in.
pub const SENTINEL_COLUMN: &str = "Attended";

/// Rows after the header that precede the first panelist (host row and
/// the "Panelist Details" sub-header).
pub const PANELIST_GAP: usize = 2;

/// Rows from the sentinel up to the first attendee (the sentinel itself
/// and the repeated column header under it).
pub const ATTENDEE_GAP: usize = 2;

/// Row ranges of each webinar section, in table coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBounds {
    pub sentinel: usize,
    pub panelists: Range<usize>,
    pub attendees: Range<usize>,
}

impl SectionBounds {
    /// Bounds for a table of `len` rows with the sentinel at `sentinel`.
    pub fn new(len: usize, sentinel: usize) -> Self {
        let attendee_start = (sentinel + ATTENDEE_GAP).min(len);
        SectionBounds {
            sentinel,
            panelists: PANELIST_GAP.min(sentinel)..sentinel,
            attendees: attendee_start..len,
        }
    }

    /// The two skipped ranges: before the panelists, and from the sentinel
    /// up to the attendees.
    pub fn gaps(&self) -> (Range<usize>, Range<usize>) {
        (
            0..self.panelists.start,
            self.panelists.end..self.attendees.start,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Sections {
    pub bounds: SectionBounds,
    pub panelists: Table,
    pub attendees: Table,
}

/// Index of the first sentinel row, if the table has one.
pub fn find_sentinel(table: &Table) -> Option<usize> {
    let col = table.column(SENTINEL_COLUMN)?;
    table
        .rows
        .iter()
        .position(|row| row.get(col).map(String::as_str) == Some(ATTENDEE_SENTINEL))
}

/// Partition a webinar table into its panelist and attendee rows.
pub fn split_sections(table: &Table) -> Result<Sections> {
    let sentinel = find_sentinel(table).ok_or(CleanError::AttendeeSectionNotFound {
        sentinel: ATTENDEE_SENTINEL,
        column: SENTINEL_COLUMN,
    })?;
    let bounds = SectionBounds::new(table.len(), sentinel);
    debug!(
        "sentinel at row {}: panelists {:?}, attendees {:?}",
        sentinel, bounds.panelists, bounds.attendees
    );

    Ok(Sections {
        panelists: table.slice(bounds.panelists.clone()),
        attendees: table.slice(bounds.attendees.clone()),
        bounds,
    })
}
