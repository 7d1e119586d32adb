//! Content fingerprints for change detection

use sha2::{Digest, Sha256};

use super::record::FieldValue;
use super::schema::FIELDS;

const UNIT_SEPARATOR: u8 = 0x1f;

/// SHA-256 over every field in schema order, as `header=canonical` pairs
/// joined by the unit separator. Fresh and remote records must go through
/// this same function or change detection breaks.
pub fn content_fingerprint(values: &[FieldValue]) -> String {
    let mut hasher = Sha256::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            hasher.update([UNIT_SEPARATOR]);
        }
        let name = FIELDS.get(i).map(|f| f.header).unwrap_or("");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.canonical().as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::{Schema, FIELD_COUNT};

    fn sample() -> Vec<FieldValue> {
        (0..FIELD_COUNT)
            .map(|i| {
                if Schema::is_amount(i) {
                    FieldValue::Amount(i as f64 * 10.0)
                } else {
                    FieldValue::Text(format!("v{}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_stable_across_calls() {
        let values = sample();
        let first = content_fingerprint(&values);
        assert_eq!(first.len(), 64);
        assert_eq!(first, content_fingerprint(&values));
    }

    #[test]
    fn test_every_field_matters() {
        let base = sample();
        let original = content_fingerprint(&base);
        for i in 0..FIELD_COUNT {
            let mut changed = base.clone();
            changed[i] = match &changed[i] {
                FieldValue::Text(s) => FieldValue::Text(format!("{}!", s)),
                FieldValue::Amount(v) => FieldValue::Amount(v + 1.0),
            };
            assert_ne!(content_fingerprint(&changed), original, "field {} ignored", i);
        }
    }

    #[test]
    fn test_boundary_shift_detected() {
        let mut a = sample();
        let mut b = sample();
        a[0] = FieldValue::Text("ab".into());
        a[2] = FieldValue::Text("c".into());
        b[0] = FieldValue::Text("a".into());
        b[2] = FieldValue::Text("bc".into());
        assert_ne!(content_fingerprint(&a), content_fingerprint(&b));
    }

    #[test]
    fn test_amount_formatting_does_not_matter() {
        let mut a = sample();
        let mut b = sample();
        a[18] = FieldValue::parse_amount("100");
        b[18] = FieldValue::parse_amount("₩100.0");
        assert_eq!(content_fingerprint(&a), content_fingerprint(&b));
    }
}
