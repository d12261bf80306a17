use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::Result;

/// Default name fragments that mark a meeting participant as staff.
pub const DEFAULT_PANELIST_PATTERNS: &str = "admin, iblooming, interpreter, host";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    Panelist,
    Attendee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Panelist => "Panelist",
            Role::Attendee => "Attendee",
        }
    }
}

/// Classifies meeting participants by display name.
///
/// Built from a comma-separated list of fragments; a name containing any of
/// them (case-insensitive) is a panelist. Fragments are literal text.
#[derive(Debug, Clone, Default)]
pub struct PanelistMatcher {
    fragments: Vec<String>,
    regex: Option<Regex>,
}

impl PanelistMatcher {
    pub fn parse(list: &str) -> Result<Self> {
        let fragments: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        if fragments.is_empty() {
            return Ok(PanelistMatcher::default());
        }

        let alternation = fragments
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;

        Ok(PanelistMatcher {
            fragments,
            regex: Some(regex),
        })
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn classify(&self, name: &str) -> Role {
        match &self.regex {
            Some(re) if re.is_match(name) => Role::Panelist,
            _ => Role::Attendee,
        }
    }
}
