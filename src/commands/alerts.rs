// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::formatters::{format_date_time, format_usd, format_vnd_with_unit};
use crate::models::{AlertCondition, GoldBrand, GoldType, PriceAlert};
use crate::repo::{self, VnFilter};
use crate::stores::ALERTS_FILE;
use crate::stores::alerts::{AlertStore, CurrentPrice};
use crate::utils::{maybe_print_json, opt_arg, pretty_table, req};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, data_dir: &Path, m: &clap::ArgMatches) -> Result<()> {
    let path = data_dir.join(ALERTS_FILE);
    match m.subcommand() {
        Some(("add", sub)) => add(&path, sub),
        Some(("list", sub)) => list(&path, sub),
        Some(("rm", sub)) => {
            let id = req(sub, "id")?;
            let mut store = AlertStore::load(&path);
            if !store.remove(id) {
                bail!("No alert with id '{}'", id);
            }
            store.save()?;
            println!("Removed alert {}", id);
            Ok(())
        }
        Some(("toggle", sub)) => {
            let id = req(sub, "id")?;
            let mut store = AlertStore::load(&path);
            let Some(active) = store.toggle(id) else {
                bail!("No alert with id '{}'", id);
            };
            store.save()?;
            println!("Alert {} is now {}", id, if active { "active" } else { "paused" });
            Ok(())
        }
        Some(("check", sub)) => {
            let fired = check_alerts(conn, &path, Utc::now())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &fired)? {
                if fired.is_empty() {
                    println!("No alerts triggered");
                } else {
                    println!("{}", pretty_table(&ALERT_HEADERS, alert_rows(fired.iter())));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn add(path: &Path, sub: &clap::ArgMatches) -> Result<()> {
    let gold_type: GoldType = req(sub, "type")?.parse()?;
    let condition: AlertCondition = req(sub, "condition")?.parse()?;
    let raw = req(sub, "target")?;
    let target: f64 = raw
        .replace(['_', ','], "")
        .parse()
        .with_context(|| format!("Invalid target '{}'", raw))?;
    let brand = opt_arg::<GoldBrand>(sub, "brand")?;

    let mut store = AlertStore::load(path);
    let alert = store.add(gold_type, condition, target, brand, Utc::now())?;
    store.save()?;
    println!(
        "Added alert {}: {} {} {}",
        alert.id,
        alert.gold_type,
        alert.condition,
        format_target(&alert)
    );
    Ok(())
}

fn list(path: &Path, sub: &clap::ArgMatches) -> Result<()> {
    let store = AlertStore::load(path);
    let data: Vec<&PriceAlert> = if sub.get_flag("active") {
        store.active()
    } else if sub.get_flag("triggered") {
        store.triggered()
    } else {
        store.alerts().iter().collect()
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", pretty_table(&ALERT_HEADERS, alert_rows(data.into_iter())));
    }
    Ok(())
}

const ALERT_HEADERS: [&str; 8] = ["ID", "Type", "Brand", "Condition", "Target", "Active", "Created", "Triggered"];

pub(crate) fn format_target(a: &PriceAlert) -> String {
    if a.gold_type == GoldType::Xau {
        format_usd(a.target_price)
    } else {
        format_vnd_with_unit(a.target_price)
    }
}

fn alert_rows<'a>(alerts: impl Iterator<Item = &'a PriceAlert>) -> Vec<Vec<String>> {
    alerts
        .map(|a| {
            vec![
                a.id.clone(),
                a.gold_type.display_name().to_string(),
                a.brand.map(|b| b.display_name().to_string()).unwrap_or_default(),
                a.condition.to_string(),
                format_target(a),
                if a.is_active { "yes".into() } else { "no".into() },
                format_date_time(a.created_at),
                a.triggered_at.map(format_date_time).unwrap_or_default(),
            ]
        })
        .collect()
}

/// Latest stored prices alerts can match: dealer sell prices (the SJC bar
/// reference first) and the world price as XAU.
pub fn current_prices(conn: &Connection) -> Result<Vec<CurrentPrice>> {
    let mut out = Vec::new();
    let reference = repo::sjc_price(conn)?;
    let rest = repo::latest_vn_prices(conn, &VnFilter::default())?;
    for p in reference.iter().chain(rest.iter()) {
        out.push(CurrentPrice {
            gold_type: p.gold_type,
            brand: Some(p.brand),
            price: p.sell_price as f64,
        });
    }
    if let Some(w) = repo::latest_world_price(conn)? {
        out.push(CurrentPrice {
            gold_type: GoldType::Xau,
            brand: None,
            price: w.price,
        });
    }
    Ok(out)
}

/// Checks the alert file at `path` against stored prices and saves any
/// alerts that fired.
pub fn check_alerts(conn: &Connection, path: &Path, now: DateTime<Utc>) -> Result<Vec<PriceAlert>> {
    let prices = current_prices(conn)?;
    let mut store = AlertStore::load(path);
    let fired = store.check(&prices, now);
    if !fired.is_empty() {
        store.save()?;
    }
    Ok(fired)
}
