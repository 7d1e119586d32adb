//! Key-based record matching

use rustc_hash::FxHashSet;

use crate::model::{OrderRecord, RowSet};

/// How a fresh record relates to the remote snapshot
#[derive(Debug)]
pub enum Match<'a> {
    /// Key only in the fresh set; every occurrence is reported
    FreshOnly(&'a OrderRecord),
    /// Key in both sets; the remote side is its first occurrence
    Both {
        fresh: &'a OrderRecord,
        remote: &'a OrderRecord,
    },
    /// Key only in the remote set
    RemoteOnly(&'a OrderRecord),
    /// Later occurrence of a fresh key that is also remote; only the
    /// first occurrence is compared
    FreshDuplicate(&'a OrderRecord),
}

/// Match fresh records against remote records by identity key.
///
/// Fresh matches come first in fresh order, then remote-only records in
/// remote order. Duplicates of a key found on one side only are all kept;
/// for a key on both sides the first fresh and first remote occurrences
/// are paired.
pub fn match_records<'a>(fresh: &'a RowSet, remote: &'a RowSet) -> Vec<Match<'a>> {
    let mut matches = Vec::with_capacity(fresh.len() + remote.len());
    let mut fresh_keys: FxHashSet<&str> = FxHashSet::default();

    for (idx, record) in fresh.records.iter().enumerate() {
        fresh_keys.insert(record.key.as_str());
        match remote.get(&record.key) {
            Some(_) if !fresh.is_first_occurrence(idx) => {
                matches.push(Match::FreshDuplicate(record))
            }
            Some(remote_record) => matches.push(Match::Both {
                fresh: record,
                remote: remote_record,
            }),
            None => matches.push(Match::FreshOnly(record)),
        }
    }

    for record in &remote.records {
        if !fresh_keys.contains(record.key.as_str()) {
            matches.push(Match::RemoteOnly(record));
        }
    }

    matches
}
