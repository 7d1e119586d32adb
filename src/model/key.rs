//! Identity key derivation

use super::record::FieldValue;
use super::schema::{MARKET, ORDER_NO};

/// Separator between identity key components
pub const KEY_SEPARATOR: &str = "_";

/// Identity key of a record's values: `"{order_no}_{market}"`.
/// A missing field contributes an empty component.
pub fn identity_key(values: &[FieldValue]) -> String {
    let component = |idx: usize| values.get(idx).map(FieldValue::canonical).unwrap_or_default();
    format!("{}{}{}", component(ORDER_NO), KEY_SEPARATOR, component(MARKET))
}
