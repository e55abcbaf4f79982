// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use goldtrack::config::Config;
use goldtrack::models::{AlertCondition, GoldType};
use goldtrack::stores::alerts::AlertStore;
use goldtrack::stores::{ALERTS_FILE, CHAT_FILE};
use goldtrack::{commands::doctor, db, repo};
use rusqlite::Connection;
use tempfile::tempdir;

fn issues(rows: &[Vec<String>]) -> Vec<&str> {
    rows.iter().map(|r| r[0].as_str()).collect()
}

#[test]
fn empty_install_reports_missing_pieces() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let dir = tempdir().unwrap();
    let rows = doctor::diagnose(&conn, &Config::default(), dir.path(), Utc::now()).unwrap();
    assert_eq!(
        issues(&rows),
        vec!["missing_config", "missing_config", "no_world_price", "no_vn_prices", "no_exchange_rate"]
    );
}

#[test]
fn flags_bad_settings_corrupt_stores_and_orphan_alerts() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let dir = tempdir().unwrap();
    repo::set_setting(&conn, "volatility_window", "zero").unwrap();
    std::fs::write(dir.path().join(CHAT_FILE), "not json").unwrap();
    let mut store = AlertStore::load(dir.path().join(ALERTS_FILE));
    store
        .add(GoldType::Nhan9999, AlertCondition::Above, 1.0, None, Utc::now())
        .unwrap();
    store.save().unwrap();

    let cfg = Config::from_lookup(|k| match k {
        "VN_GOLD_API_KEY" | "OPENAI_API_KEY" => Some("key".to_string()),
        _ => None,
    });
    let rows = doctor::diagnose(&conn, &cfg, dir.path(), Utc::now()).unwrap();
    let found = issues(&rows);
    assert!(found.contains(&"bad_setting"));
    assert!(found.contains(&"corrupt_store"));
    assert!(found.contains(&"alert_without_price"));
    assert!(!found.contains(&"missing_config"));
    doctor::handle(&conn, &cfg, dir.path()).unwrap();
}
