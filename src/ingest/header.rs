use tracing::debug;

use super::FileKind;
use crate::error::{CleanError, Result};

/// Zero-based index of the first line containing `marker`.
///
/// Only the first match counts; nothing about the following lines is checked.
pub fn locate_header<'a, I>(lines: I, marker: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().position(|line| line.contains(marker))
}

/// Locate the header row for `kind` in a whole decoded file.
pub fn find_header(text: &str, kind: FileKind) -> Result<usize> {
    let marker = kind.header_marker();
    let line = locate_header(text.lines(), marker).ok_or(CleanError::HeaderNotFound {
        kind: kind.label(),
        marker,
    })?;
    debug!("{} header on line {}", kind.label(), line);
    Ok(line)
}
