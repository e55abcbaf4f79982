// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::alerts::current_prices;
use super::settings::validate;
use crate::config::Config;
use crate::formatters::format_date_time;
use crate::models::GoldType;
use crate::repo::{self, SETTINGS};
use crate::stores::alerts::AlertStore;
use crate::stores::{ALERTS_FILE, CHAT_FILE};
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, cfg: &Config, data_dir: &Path) -> Result<()> {
    let rows = diagnose(conn, cfg, data_dir, Utc::now())?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// One `[issue, detail]` row per problem found.
pub fn diagnose(conn: &Connection, cfg: &Config, data_dir: &Path, now: DateTime<Utc>) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Credentials
    if let Err(e) = cfg.require_vn_gold_api_key() {
        rows.push(vec!["missing_config".into(), e.to_string()]);
    }
    if let Err(e) = cfg.require_openai_api_key() {
        rows.push(vec!["missing_config".into(), e.to_string()]);
    }

    // 2) Stored settings that no longer parse
    for (key, _) in SETTINGS {
        if let Some(v) = repo::get_setting(conn, key)? {
            if let Err(e) = validate(key, &v) {
                rows.push(vec!["bad_setting".into(), e.to_string()]);
            }
        }
    }

    // 3) Empty or stale snapshots
    match repo::latest_world_price(conn)? {
        None => rows.push(vec!["no_world_price".into(), "run `goldtrack world fetch`".into()]),
        Some(p) if now - p.fetched_at > Duration::days(1) => {
            rows.push(vec!["stale_world_price".into(), format_date_time(p.fetched_at)])
        }
        Some(_) => {}
    }
    if repo::latest_vn_prices(conn, &repo::VnFilter::default())?.is_empty() {
        rows.push(vec!["no_vn_prices".into(), "run `goldtrack vn fetch`".into()]);
    }
    if repo::latest_exchange_rate(conn)?.is_none() {
        rows.push(vec!["no_exchange_rate".into(), "fallback_rate setting is in use".into()]);
    }

    // 4) Store files that would load as empty
    for file in [ALERTS_FILE, CHAT_FILE] {
        let path = data_dir.join(file);
        if let Ok(raw) = std::fs::read_to_string(&path) {
            if let Err(e) = serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                rows.push(vec!["corrupt_store".into(), format!("{}: {}", path.display(), e)]);
            }
        }
    }

    // 5) Active alerts nothing can trigger
    let priced: Vec<GoldType> = current_prices(conn)?.iter().map(|p| p.gold_type).collect();
    let store = AlertStore::load(data_dir.join(ALERTS_FILE));
    for alert in store.active() {
        if !priced.contains(&alert.gold_type) {
            rows.push(vec!["alert_without_price".into(), format!("{} ({})", alert.id, alert.gold_type)]);
        }
    }

    Ok(rows)
}
