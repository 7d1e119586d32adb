//! Building and writing the republished sheet

mod ordering;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::{Result, SyncError};
use crate::model::{OrderRecord, Schema};
use crate::reconcile::Reconciliation;
use crate::remote::SheetStore;

pub use ordering::{parse_order_date, sort_newest_first};

/// Row counts per block, in publish order
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    pub new: usize,
    pub updated: usize,
    pub retained: usize,
}

/// The complete target sheet, materialized before any remote call
#[derive(Debug, Clone)]
pub struct PublishPlan {
    pub header: Vec<String>,
    /// Data rows: new, then updated, then retained; each newest first
    pub records: Vec<OrderRecord>,
    pub blocks: BlockCounts,
}

impl PublishPlan {
    /// Order the three classes into the final sheet layout
    pub fn build(reconciliation: &Reconciliation) -> Self {
        let mut new = reconciliation.new.clone();
        let mut updated = reconciliation.updated.clone();
        let mut retained = reconciliation.retained.clone();
        sort_newest_first(&mut new);
        sort_newest_first(&mut updated);
        sort_newest_first(&mut retained);

        let blocks = BlockCounts {
            new: new.len(),
            updated: updated.len(),
            retained: retained.len(),
        };
        let mut records = new;
        records.append(&mut updated);
        records.append(&mut retained);

        Self {
            header: Schema::headers(),
            records,
            blocks,
        }
    }

    /// Data rows as sheet values. Every value, dates included, is written as
    /// text except amounts, which are written as numbers.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.records.iter().map(OrderRecord::to_sheet_row).collect()
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}

/// Writes a publish plan to a sheet store
pub struct Publisher<'a, S: SheetStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SheetStore + ?Sized> Publisher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Full-replace the remote sheet with the plan. Returns the number of
    /// data rows written.
    ///
    /// Any failure fails the publish as a whole. A failure after the clear
    /// leaves the sheet in whatever state the store left it.
    #[instrument(skip_all, fields(rows = plan.row_count()))]
    pub fn publish(&self, plan: &PublishPlan) -> Result<usize> {
        let rows = plan.rows();
        self.store.replace(&plan.header, &rows).map_err(|e| {
            error!(error = %e, "publish failed");
            match e {
                SyncError::WriteError(_) | SyncError::Unavailable(_) => e,
                other => SyncError::WriteError(other.to_string()),
            }
        })?;
        info!(
            new = plan.blocks.new,
            updated = plan.blocks.updated,
            retained = plan.blocks.retained,
            "published sheet"
        );
        Ok(rows.len())
    }
}
