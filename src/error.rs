use thiserror::Error;

use crate::batch::Warning;

/// Errors raised while cleaning a single export or a batch of them.
///
/// Everything except `NoProcessableFiles` is scoped to one file; the batch
/// runner turns those into warnings and moves on.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("could not detect {kind} header row (no line contains \"{marker}\")")]
    HeaderNotFound { kind: &'static str, marker: &'static str },

    #[error("could not detect attendee section (no \"{sentinel}\" row in column \"{column}\")")]
    AttendeeSectionNotFound {
        sentinel: &'static str,
        column: &'static str,
    },

    #[error("malformed session date: {value:?}")]
    MalformedDate { value: String },

    #[error("duplicate filename in batch, only the first upload is used")]
    DuplicateFilename,

    #[error("unknown type (filename contains neither \"attendee\" nor \"participants\")")]
    UnrecognizedFileKind,

    #[error("line {line}: expected {expected} fields, saw {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid panelist name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Carries the reason each file was rejected.
    #[error("no processable files in batch ({} skipped)", warnings.len())]
    NoProcessableFiles { warnings: Vec<Warning> },
}

pub type Result<T> = std::result::Result<T, CleanError>;
