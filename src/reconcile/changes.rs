//! Field-level differences between two versions of an order

use serde::{Deserialize, Serialize};

use crate::model::{OrderRecord, FIELDS};

/// A change to a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field ident
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Fields whose canonical value differs, in schema order
pub fn field_changes(old: &OrderRecord, new: &OrderRecord) -> Vec<FieldChange> {
    FIELDS
        .iter()
        .enumerate()
        .filter_map(|(i, field)| {
            let old_value = old.text(i);
            let new_value = new.text(i);
            (old_value != new_value).then(|| FieldChange {
                field: field.ident.to_string(),
                old_value,
                new_value,
            })
        })
        .collect()
}
