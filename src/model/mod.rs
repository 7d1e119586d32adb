//! Data model for order records

mod fingerprint;
mod key;
mod record;
mod schema;

pub use fingerprint::content_fingerprint;
pub use key::{identity_key, KEY_SEPARATOR};
pub use record::{FieldValue, OrderRecord, RowSet};
pub use schema::{Field, FieldKind, Schema, FIELDS, FIELD_COUNT, MARKET, ORDER_DATE, ORDER_NO};
