//! Order records, field values and row sets

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::fingerprint::content_fingerprint;
use super::key::identity_key;
use super::schema::{Schema, FIELD_COUNT, ORDER_DATE, ORDER_NO};

/// A normalized field value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(f64),
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Amount(a), FieldValue::Amount(b)) => a.to_bits() == b.to_bits() || a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the canonical text so 0.0 and -0.0 agree with PartialEq.
        std::mem::discriminant(self).hash(state);
        self.canonical().hash(state);
    }
}

impl FieldValue {
    /// Lenient amount parsing: keep digits, `.` and `-`, fall back to zero.
    pub fn parse_amount(raw: &str) -> FieldValue {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite());
        FieldValue::Amount(value.unwrap_or(0.0))
    }

    /// Normalize a raw cell for the field at `index`. Text loses leading and
    /// trailing whitespace, so padded and unpadded cells compare equal.
    pub fn for_field(index: usize, raw: Option<&str>) -> FieldValue {
        let raw = raw.unwrap_or("");
        if Schema::is_amount(index) {
            FieldValue::parse_amount(raw)
        } else {
            FieldValue::Text(raw.trim().to_string())
        }
    }

    /// Canonical text, identical for equal values regardless of source
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Amount(v) => format_amount(*v),
        }
    }

    /// Value as it is written to the remote sheet
    pub fn to_sheet_value(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Amount(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    serde_json::json!(*v as i64)
                } else {
                    serde_json::Number::from_f64(*v)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

fn format_amount(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        (v as i64).to_string()
    } else {
        v.to_string()
    }
}

/// One order: every schema field, in schema order, plus derived identity
#[derive(Debug, Clone)]
pub struct OrderRecord {
    /// Field values in schema order
    pub values: Vec<FieldValue>,
    /// Identity key (order number + market)
    pub key: String,
    /// Content fingerprint over all fields
    pub fingerprint: String,
    /// Line/row number in the source (1-indexed, header is line 1)
    pub source_line: usize,
}

impl OrderRecord {
    /// Build a record from raw cells. `cells` must hold at least
    /// [`FIELD_COUNT`] entries; extra entries are ignored.
    pub fn from_cells(cells: &[Option<String>], source_line: usize) -> Self {
        let values: Vec<FieldValue> = (0..FIELD_COUNT)
            .map(|i| FieldValue::for_field(i, cells.get(i).and_then(|c| c.as_deref())))
            .collect();
        Self::new(values, source_line)
    }

    /// Build a record from already-normalized values
    pub fn new(values: Vec<FieldValue>, source_line: usize) -> Self {
        debug_assert_eq!(values.len(), FIELD_COUNT);
        let key = identity_key(&values);
        let fingerprint = content_fingerprint(&values);
        Self {
            values,
            key,
            fingerprint,
            source_line,
        }
    }

    /// Get a value by field index
    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// Canonical text of a field (empty if out of range)
    pub fn text(&self, index: usize) -> String {
        self.get(index).map(|v| v.canonical()).unwrap_or_default()
    }

    pub fn order_no(&self) -> String {
        self.text(ORDER_NO)
    }

    pub fn order_date(&self) -> String {
        self.text(ORDER_DATE)
    }

    /// Row as written to the sheet
    pub fn to_sheet_row(&self) -> Vec<serde_json::Value> {
        self.values.iter().map(|v| v.to_sheet_value()).collect()
    }
}

/// An ordered collection of order records with a first-seen key index
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    /// All records, in source order
    pub records: Vec<OrderRecord>,
    /// Identity key to the position of its first occurrence
    pub key_index: IndexMap<String, usize>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns `false` if its key was already present;
    /// the record is still kept but the index keeps pointing at the first one.
    pub fn push(&mut self, record: OrderRecord) -> bool {
        let idx = self.records.len();
        let fresh_key = !self.key_index.contains_key(&record.key);
        if fresh_key {
            self.key_index.insert(record.key.clone(), idx);
        }
        self.records.push(record);
        fresh_key
    }

    /// First record carrying `key`
    pub fn get(&self, key: &str) -> Option<&OrderRecord> {
        self.key_index.get(key).map(|&idx| &self.records[idx])
    }

    /// Whether the record at `idx` is the first occurrence of its key
    pub fn is_first_occurrence(&self, idx: usize) -> bool {
        self.records
            .get(idx)
            .and_then(|r| self.key_index.get(&r.key))
            .map(|&first| first == idx)
            .unwrap_or(false)
    }

    /// Distinct identity keys, in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.key_index.keys().map(|k| k.as_str())
    }

    /// Number of records (duplicates included)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records sharing a key with an earlier record
    pub fn duplicate_count(&self) -> usize {
        self.records.len() - self.key_index.len()
    }
}

impl FromIterator<OrderRecord> for RowSet {
    fn from_iter<I: IntoIterator<Item = OrderRecord>>(iter: I) -> Self {
        let mut set = RowSet::new();
        for record in iter {
            set.push(record);
        }
        set
    }
}
