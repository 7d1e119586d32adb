//! Date ordering within a publish block

use std::cmp::Reverse;

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::OrderRecord;

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y%m%d", "%Y. %m. %d"];

/// Parse an order date leniently; `None` for blanks and anything unrecognized
pub fn parse_order_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim().trim_end_matches('.');
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Sort newest first; unparsable dates go last. Equal dates keep their
/// relative order.
pub fn sort_newest_first(records: &mut [OrderRecord]) {
    records.sort_by_cached_key(|r| {
        let date = parse_order_date(&r.order_date());
        (date.is_none(), Reverse(date))
    });
}
