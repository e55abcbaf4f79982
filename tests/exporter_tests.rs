// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use goldtrack::models::{GoldBrand, GoldType, PriceHistoryPoint, VnGoldPrice};
use goldtrack::{cli, commands::exporter, db, repo};
use rusqlite::Connection;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run_export(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["goldtrack", "export"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_world_writes_bom_and_rows() {
    let conn = base_conn();
    let now = Utc::now();
    let points: Vec<PriceHistoryPoint> = (0..3)
        .map(|i| PriceHistoryPoint::new(now - Duration::days(3 - i), 2600.0 + i as f64 * 10.0))
        .collect();
    repo::store_world_history(&conn, &points).unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("world.csv");
    let out_str = out.to_string_lossy().to_string();
    run_export(&conn, &["world", "--range", "7D", "--out", &out_str]).unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..3], [0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(text.lines().count(), points.len() + 1);
    assert!(text.lines().nth(1).unwrap().contains(",2600.00,"));
}

#[test]
fn export_vn_filters_by_brand() {
    let conn = base_conn();
    let now = Utc::now();
    let row = |brand| VnGoldPrice {
        gold_type: GoldType::Sjc,
        brand,
        buy_price: 84_000_000,
        sell_price: 86_000_000,
        timestamp: now - Duration::hours(1),
        region: None,
    };
    repo::insert_vn_prices(&conn, &[row(GoldBrand::Sjc), row(GoldBrand::Doji)], "test").unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("vn.csv");
    let out_str = out.to_string_lossy().to_string();
    run_export(&conn, &["vn", "--brand", "DOJI", "--out", &out_str]).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains(",SJC,DOJI,84.000.000,86.000.000,2.000.000"));
}

#[test]
fn export_with_no_data_fails_and_creates_no_file() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    for kind in ["world", "vn", "stats"] {
        let out = dir.path().join(format!("{}.out", kind));
        let out_str = out.to_string_lossy().to_string();
        let err = run_export(&conn, &[kind, "--out", &out_str]).unwrap_err();
        assert!(err.to_string().contains("No data to export"), "{}: {}", kind, err);
        assert!(!out.exists());
    }
}

#[test]
fn export_stats_writes_pretty_json_report() {
    let conn = base_conn();
    let now = Utc::now();
    let points: Vec<PriceHistoryPoint> = (0..25)
        .map(|i| PriceHistoryPoint::new(now - Duration::days(25 - i), 2600.0 + i as f64))
        .collect();
    repo::store_world_history(&conn, &points).unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("stats.json");
    let out_str = out.to_string_lossy().to_string();
    run_export(&conn, &["stats", "--range", "1M", "--out", &out_str]).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["market"], "XAU/USD");
    assert_eq!(parsed["range"], "1M");
    assert_eq!(parsed["statistics"]["total_records"], 25);
    assert_eq!(parsed["statistics"]["high"], 2624.0);
    assert_eq!(parsed["statistics"]["low"], 2600.0);
    assert_eq!(parsed["trend"]["direction"], "sideways");
}
