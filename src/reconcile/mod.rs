//! Reconciliation of a fresh export against the published snapshot.
//!
//! With `F` the identity keys of the fresh set and `R` those of the remote
//! snapshot:
//!
//! - **new**: fresh records with key in `F - R`
//! - **updated**: fresh records with key in `F ∩ R` whose fingerprint differs
//!   from the remote record's
//! - **retained**: remote records with key in `R - F`
//!
//! Keys in `F ∩ R` with equal fingerprints land in none of the three sets and
//! therefore disappear from the republished sheet. They are listed in
//! [`Reconciliation::unchanged`] so callers can see exactly what was dropped.
//!
//! A fresh key repeated in the export stays repeated in **new**. A repeated
//! key in `F ∩ R` is compared through its first fresh occurrence only.

pub mod changes;
mod matcher;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{OrderRecord, RowSet};

pub use changes::{field_changes, FieldChange};
pub use matcher::{match_records, Match};

/// Where a key ended up after reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    New,
    Updated,
    Retained,
    /// Present on both sides with identical content; not republished
    Unchanged,
}

/// An updated order together with what changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedOrder {
    pub key: String,
    pub changes: Vec<FieldChange>,
}

/// Counters for a reconciliation
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileStats {
    pub fresh_rows: usize,
    pub remote_rows: usize,
    pub new: usize,
    pub updated: usize,
    pub retained: usize,
    pub unchanged: usize,
    /// Fresh records that share their key with an earlier fresh record
    pub fresh_duplicates: usize,
}

/// Result of reconciling a fresh set against the remote snapshot
#[derive(Debug, Default, Clone)]
pub struct Reconciliation {
    pub new: Vec<OrderRecord>,
    pub updated: Vec<OrderRecord>,
    pub retained: Vec<OrderRecord>,
    /// Keys present on both sides with equal fingerprints
    pub unchanged: Vec<String>,
    /// Field-level changes behind each updated record
    pub updated_details: Vec<UpdatedOrder>,
    pub stats: ReconcileStats,
}

impl Reconciliation {
    /// Whether anything is new or updated
    pub fn has_changes(&self) -> bool {
        !self.new.is_empty() || !self.updated.is_empty()
    }

    /// Records that will be republished
    pub fn published_count(&self) -> usize {
        self.new.len() + self.updated.len() + self.retained.len()
    }

    /// Which class a key fell into, if it was seen at all
    pub fn classification_of(&self, key: &str) -> Option<Classification> {
        if self.new.iter().any(|r| r.key == key) {
            Some(Classification::New)
        } else if self.updated.iter().any(|r| r.key == key) {
            Some(Classification::Updated)
        } else if self.retained.iter().any(|r| r.key == key) {
            Some(Classification::Retained)
        } else if self.unchanged.iter().any(|k| k == key) {
            Some(Classification::Unchanged)
        } else {
            None
        }
    }
}

/// Classify every fresh and remote record.
///
/// Duplicate keys inside `fresh` are not deduplicated: every row of a key
/// the remote lacks is new. For a key on both sides only the first fresh
/// occurrence is compared; later ones are logged and skipped. Remote
/// records are never deduplicated.
pub fn reconcile(fresh: &RowSet, remote: &RowSet) -> Reconciliation {
    let mut result = Reconciliation {
        stats: ReconcileStats {
            fresh_rows: fresh.len(),
            remote_rows: remote.len(),
            fresh_duplicates: fresh.duplicate_count(),
            ..Default::default()
        },
        ..Default::default()
    };

    for matched in match_records(fresh, remote) {
        match matched {
            Match::FreshOnly(record) => result.new.push(record.clone()),
            Match::Both { fresh, remote } => {
                if fresh.fingerprint != remote.fingerprint {
                    result.updated_details.push(UpdatedOrder {
                        key: fresh.key.clone(),
                        changes: field_changes(remote, fresh),
                    });
                    result.updated.push(fresh.clone());
                } else {
                    result.unchanged.push(fresh.key.clone());
                }
            }
            Match::RemoteOnly(record) => result.retained.push(record.clone()),
            Match::FreshDuplicate(record) => {
                warn!(
                    key = %record.key,
                    line = record.source_line,
                    "duplicate of a published order in input, comparing the first occurrence"
                );
            }
        }
    }

    result.stats.new = result.new.len();
    result.stats.updated = result.updated.len();
    result.stats.retained = result.retained.len();
    result.stats.unchanged = result.unchanged.len();

    info!(
        new = result.stats.new,
        updated = result.stats.updated,
        retained = result.stats.retained,
        unchanged = result.stats.unchanged,
        "reconciled orders"
    );

    result
}
