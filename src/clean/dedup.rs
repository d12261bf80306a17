use std::collections::HashSet;
use tracing::debug;

use crate::ingest::table::Table;

/// Which cells make two rows "the same person".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRule {
    /// Compare only these columns. Absent columns compare as blank.
    Columns(Vec<String>),
    /// Compare every column except these. Names not in the table are ignored.
    AllExcept(Vec<String>),
}

/// The projected cells a row is compared on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(pub Vec<String>);

impl IdentityRule {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IdentityRule::Columns(names.into_iter().map(Into::into).collect())
    }

    pub fn all_except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IdentityRule::AllExcept(names.into_iter().map(Into::into).collect())
    }

    fn positions(&self, table: &Table) -> Vec<Option<usize>> {
        match self {
            IdentityRule::Columns(names) => names.iter().map(|n| table.column(n)).collect(),
            IdentityRule::AllExcept(excluded) => table
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| !excluded.contains(*c))
                .map(|(i, _)| Some(i))
                .collect(),
        }
    }

    /// Identity columns `table` doesn't have. Always empty for `AllExcept`.
    pub fn missing_columns<'a>(&'a self, table: &Table) -> Vec<&'a str> {
        match self {
            IdentityRule::Columns(names) => names
                .iter()
                .filter(|n| !table.has_column(n))
                .map(String::as_str)
                .collect(),
            IdentityRule::AllExcept(_) => Vec::new(),
        }
    }

    /// Identity key of every row in `table`, in row order.
    pub fn keys(&self, table: &Table) -> Vec<IdentityKey> {
        let positions = self.positions(table);
        table
            .rows
            .iter()
            .map(|row| {
                IdentityKey(
                    positions
                        .iter()
                        .map(|p| p.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                        .collect(),
                )
            })
            .collect()
    }
}

/// `true` for every row whose key already appeared earlier in the table.
pub fn duplicate_mask(table: &Table, rule: &IdentityRule) -> Vec<bool> {
    let mut seen = HashSet::new();
    rule.keys(table)
        .into_iter()
        .map(|key| !seen.insert(key))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Deduplicated {
    pub table: Table,
    pub removed: usize,
}

/// Drop rows that repeat an earlier row's identity, keeping the first.
/// Surviving rows keep all their columns and their original order.
pub fn deduplicate(table: &Table, rule: &IdentityRule) -> Deduplicated {
    let mask = duplicate_mask(table, rule);
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .zip(&mask)
        .filter(|(_, dup)| !**dup)
        .map(|(row, _)| row.clone())
        .collect();
    let removed = table.len() - rows.len();
    if removed > 0 {
        debug!("removed {} duplicate rows of {}", removed, table.len());
    }

    Deduplicated {
        table: Table {
            columns: table.columns.clone(),
            rows,
        },
        removed,
    }
}
