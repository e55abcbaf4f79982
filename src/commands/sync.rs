// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::alerts::{check_alerts, format_target};
use super::rate::fetch_rate;
use super::vn::fetch_vn;
use super::world::fetch_world;
use crate::config::Config;
use crate::feeds::exchange;
use crate::feeds::http_client;
use crate::formatters::{format_currency, format_usd};
use crate::stores::ALERTS_FILE;
use crate::utils::pretty_table;
use anyhow::{Result, bail};
use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;

/// One pass over every feed. A failing source is reported and the rest
/// still run; the command fails only when nothing could be fetched.
pub fn handle(conn: &Connection, cfg: &Config, data_dir: &Path) -> Result<()> {
    let client = http_client()?;
    let now = Utc::now();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut ok = 0;

    let world = fetch_world(conn, &client, "investing", now).or_else(|e| {
        tracing::warn!(error = %format!("{:#}", e), "Investing.com failed, trying Gold-API.com");
        fetch_world(conn, &client, "gold-api", now)
    });
    match world {
        Ok(p) => {
            ok += 1;
            rows.push(vec!["world".into(), "ok".into(), format!("{} ({})", format_usd(p.price), p.source)]);
        }
        Err(e) => rows.push(vec!["world".into(), "failed".into(), format!("{:#}", e)]),
    }

    match fetch_vn(conn, cfg, &client, now) {
        Ok(n) => {
            ok += 1;
            rows.push(vec!["vn".into(), "ok".into(), format!("{} prices", n)]);
        }
        Err(e) => rows.push(vec!["vn".into(), "failed".into(), format!("{:#}", e)]),
    }

    match fetch_rate(conn, &client, now) {
        Ok(r) => {
            let fresh = r.source != exchange::FALLBACK_SOURCE;
            if fresh {
                ok += 1;
            }
            rows.push(vec![
                "rate".into(),
                if fresh { "ok".into() } else { "fallback".into() },
                format_currency(r.usd_to_vnd, 0),
            ]);
        }
        Err(e) => rows.push(vec!["rate".into(), "failed".into(), format!("{:#}", e)]),
    }

    let fired = check_alerts(conn, &data_dir.join(ALERTS_FILE), now)?;
    for a in &fired {
        rows.push(vec!["alert".into(), "triggered".into(), format!("{} {} {}", a.gold_type, a.condition, format_target(a))]);
    }

    println!("{}", pretty_table(&["Source", "Status", "Detail"], rows));
    if ok == 0 {
        bail!("sync failed: no source could be fetched");
    }
    Ok(())
}
