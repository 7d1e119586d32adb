//! ordersync - reconcile marketplace order exports against a published sheet
//!
//! Reads an order export (Excel workbook, HTML table or CSV), compares it with
//! the orders currently published in a Google Sheet, and republishes the sheet
//! with new, updated and retained orders.

pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod publish;
pub mod reconcile;
pub mod remote;
pub mod report;
pub mod state;

pub use config::Config;
pub use error::SyncError;
pub use pipeline::{Pipeline, RunSummary, StoreStatus};
pub use reconcile::{reconcile, Reconciliation};
