//! End-to-end runs against an in-memory sheet

use std::path::{Path, PathBuf};

use ordersync::config::Config;
use ordersync::model::{Schema, FIELD_COUNT, ORDER_DATE, ORDER_NO};
use ordersync::pipeline::Pipeline;
use ordersync::remote::{MemoryStore, SheetStore};
use serde_json::Value;
use tempfile::TempDir;

const TOTAL: usize = 18;

struct Order<'a> {
    no: &'a str,
    date: &'a str,
    total: &'a str,
}

fn order<'a>(no: &'a str, date: &'a str, total: &'a str) -> Order<'a> {
    Order { no, date, total }
}

fn cells(o: &Order) -> Vec<String> {
    let mut row = vec![String::new(); FIELD_COUNT];
    row[0] = "shop-1".into();
    row[ORDER_DATE] = o.date.into();
    row[ORDER_NO] = o.no.into();
    row[3] = "M".into();
    row[4] = "무선 키보드".into();
    row[5] = "1".into();
    row[6] = "홍길동".into();
    row[TOTAL] = o.total.into();
    row
}

fn write_csv(dir: &Path, name: &str, orders: &[Order]) -> PathBuf {
    let mut body = Schema::headers().join(",");
    body.push('\n');
    for o in orders {
        body.push_str(&cells(o).join(","));
        body.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn write_html(dir: &Path, name: &str, orders: &[Order]) -> PathBuf {
    let mut body = String::from("<!DOCTYPE html>\n<html><body><table>\n<tr>");
    for h in Schema::headers() {
        body.push_str(&format!("<th>{}</th>", h));
    }
    body.push_str("</tr>\n");
    for o in orders {
        body.push_str("<tr>");
        for c in cells(o) {
            body.push_str(&format!("<td> {} </td>", c));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table></body></html>\n");
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn remote_with(orders: &[Order]) -> MemoryStore {
    let mut rows = vec![Schema::headers()];
    rows.extend(orders.iter().map(cells));
    MemoryStore::with_rows(rows)
}

fn pipeline(tmp: &TempDir, store: MemoryStore) -> Pipeline<MemoryStore> {
    let config = Config::default()
        .with_spreadsheet_id("sheet-under-test")
        .with_data_dir(tmp.path().join("data"))
        .with_input_dir(tmp.path());
    Pipeline::new(config, store)
}

/// Order numbers of the published data rows, header excluded
fn published_orders(store: &MemoryStore) -> Vec<String> {
    let rows = store.list().unwrap();
    assert_eq!(rows[0], Schema::headers(), "header row missing");
    rows[1..].iter().map(|r| r[ORDER_NO].clone()).collect()
}

#[test]
fn unchanged_common_order_is_dropped_from_published_sheet() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(
        tmp.path(),
        "orders.csv",
        &[order("A1", "2024-01-01", "100"), order("A2", "2024-02-01", "50")],
    );
    let p = pipeline(&tmp, remote_with(&[order("A1", "2024-01-01", "100")]));

    let summary = p.run(Some(&input)).unwrap();

    assert_eq!(summary.counts.new, 1);
    assert_eq!(summary.counts.updated, 0);
    assert_eq!(summary.counts.retained, 0);
    assert_eq!(summary.counts.dropped_unchanged, 1);
    assert_eq!(summary.dropped_unchanged, vec!["A1_M"]);
    assert_eq!(published_orders(p.store()), vec!["A2"]);
}

#[test]
fn changed_amount_publishes_fresh_version() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(tmp.path(), "orders.csv", &[order("A1", "2024-01-01", "200")]);
    let p = pipeline(&tmp, remote_with(&[order("A1", "2024-01-01", "100")]));

    let summary = p.run(Some(&input)).unwrap();

    assert_eq!(summary.counts.new, 0);
    assert_eq!(summary.counts.updated, 1);
    assert_eq!(summary.counts.retained, 0);
    let contents = p.store().snapshot();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[1][TOTAL], serde_json::json!(200));
    assert_eq!(summary.updated_orders[0].changes[0].field, "payment_total");
}

#[test]
fn empty_export_retains_remote_sorted_by_date() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(tmp.path(), "orders.csv", &[]);
    let p = pipeline(
        &tmp,
        remote_with(&[
            order("A1", "2024-01-01", "100"),
            order("A2", "2024-03-01", "300"),
        ]),
    );

    let summary = p.run(Some(&input)).unwrap();

    assert_eq!(summary.counts.new, 0);
    assert_eq!(summary.counts.updated, 0);
    assert_eq!(summary.counts.retained, 2);
    assert_eq!(published_orders(p.store()), vec!["A2", "A1"]);
    let contents = p.store().snapshot();
    assert_eq!(contents[2][TOTAL], serde_json::json!(100));
    assert_eq!(contents[2][4], Value::String("무선 키보드".into()));
}

#[test]
fn second_identical_run_has_nothing_new_or_updated() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(
        tmp.path(),
        "orders.csv",
        &[order("A1", "2024-01-01", "1000.0"), order("A2", "2024-02-01", "2000")],
    );
    let p = pipeline(&tmp, MemoryStore::new());

    let first = p.run(Some(&input)).unwrap();
    assert_eq!(first.counts.new, 2);
    assert_eq!(published_orders(p.store()), vec!["A2", "A1"]);

    let second = p.run(Some(&input)).unwrap();
    assert_eq!(second.counts.new, 0);
    assert_eq!(second.counts.updated, 0);
    assert_eq!(second.counts.retained, 0);
    assert_eq!(second.counts.dropped_unchanged, 2);
}

#[test]
fn blocks_are_ordered_and_dated_newest_first() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(
        tmp.path(),
        "orders.csv",
        &[
            order("N1", "2024-01-05", "1"),
            order("N2", "not a date", "1"),
            order("N3", "2024-03-05 09:30:00", "1"),
            order("U1", "2023-01-01", "999"),
        ],
    );
    let p = pipeline(
        &tmp,
        remote_with(&[
            order("U1", "2023-01-01", "1"),
            order("R1", "2022-06-01", "1"),
            order("R2", "", "1"),
            order("R3", "2022-12-01", "1"),
        ]),
    );

    p.run(Some(&input)).unwrap();

    assert_eq!(
        published_orders(p.store()),
        vec!["N3", "N1", "N2", "U1", "R3", "R1", "R2"]
    );
}

#[test]
fn html_export_disguised_as_workbook() {
    let tmp = TempDir::new().unwrap();
    let input = write_html(
        tmp.path(),
        "export.xls",
        &[order("H1", "2024-04-01", "₩12,500")],
    );
    let p = pipeline(&tmp, MemoryStore::new());

    let summary = p.upload(&input).unwrap();

    assert_eq!(summary.counts.new, 1);
    assert_eq!(summary.published_rows, 1);
    let contents = p.store().snapshot();
    assert_eq!(contents[1][ORDER_NO], Value::String("H1".into()));
    assert_eq!(contents[1][4], Value::String("무선 키보드".into()));
    assert_eq!(contents[1][TOTAL], serde_json::json!(12500));
}

#[test]
fn short_rows_are_quarantined() {
    let tmp = TempDir::new().unwrap();
    let mut body = Schema::headers().join(",");
    body.push('\n');
    body.push_str(&cells(&order("A1", "2024-01-01", "1")).join(","));
    body.push_str("\nA9,short,row\n");
    let input = tmp.path().join("orders.csv");
    std::fs::write(&input, body).unwrap();
    let p = pipeline(&tmp, MemoryStore::new());

    let summary = p.run(Some(&input)).unwrap();

    assert_eq!(summary.counts.quarantined, 1);
    assert_eq!(summary.parse_report.quarantined[0].source_line, 3);
    assert_eq!(published_orders(p.store()), vec!["A1"]);
}

#[test]
fn narrow_export_is_a_schema_mismatch_and_leaves_remote_untouched() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("orders.csv");
    std::fs::write(&input, "a,b,c\n1,2,3\n").unwrap();
    let p = pipeline(&tmp, remote_with(&[order("A1", "2024-01-01", "1")]));

    let err = p.run(Some(&input)).unwrap_err();

    assert_eq!(err.kind(), "schema_mismatch");
    assert!(p.store().calls().is_empty());
    assert_eq!(published_orders(p.store()), vec!["A1"]);
}

#[test]
fn write_failure_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(tmp.path(), "orders.csv", &[order("A1", "2024-01-01", "1")]);
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let p = pipeline(&tmp, store);

    let err = p.run(Some(&input)).unwrap_err();

    assert_eq!(err.kind(), "write_error");
    assert!(!p.config().state_file().exists());
}

#[test]
fn repeated_new_orders_are_all_published() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(
        tmp.path(),
        "orders.csv",
        &[
            order("A1", "2024-01-01", "10"),
            order("A1", "2024-01-02", "20"),
            order("A2", "2024-01-03", "30"),
        ],
    );
    let p = pipeline(&tmp, MemoryStore::new());

    let summary = p.run(Some(&input)).unwrap();

    assert_eq!(summary.counts.new, 3);
    assert_eq!(summary.counts.duplicate_keys, 1);
    assert_eq!(published_orders(p.store()), vec!["A2", "A1", "A1"]);
    let contents = p.store().snapshot();
    assert_eq!(contents[2][TOTAL], serde_json::json!(20));
    assert_eq!(contents[3][TOTAL], serde_json::json!(10));
}

#[test]
fn repeated_published_order_compares_first_occurrence() {
    let tmp = TempDir::new().unwrap();
    let input = write_csv(
        tmp.path(),
        "orders.csv",
        &[order("A1", "2024-01-01", "100"), order("A1", "2024-01-01", "999")],
    );
    let p = pipeline(&tmp, remote_with(&[order("A1", "2024-01-01", "100")]));

    let summary = p.run(Some(&input)).unwrap();

    assert_eq!(summary.counts.new, 0);
    assert_eq!(summary.counts.updated, 0);
    assert_eq!(summary.counts.dropped_unchanged, 1);
    assert_eq!(summary.counts.duplicate_keys, 1);
}
