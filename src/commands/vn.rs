// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::vn_filter_arg;
use crate::config::Config;
use crate::error::GoldError;
use crate::feeds::http_client;
use crate::feeds::vnappmob::{self, VnAppMobClient};
use crate::formatters::{format_date_time, format_vnd};
use crate::models::VnGoldPrice;
use crate::repo;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use rusqlite::Connection;

pub const VN_RESOURCE: &str = "vn";

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", _)) => {
            let n = fetch_vn(conn, cfg, &http_client()?, Utc::now())?;
            println!("Stored {} dealer prices", n);
            Ok(())
        }
        Some(("list", sub)) => list(conn, sub),
        Some(("sjc", sub)) => sjc(conn, sub),
        _ => Ok(()),
    }
}

/// Fetches every supported brand and stores what came back.
pub fn fetch_vn(conn: &Connection, cfg: &Config, client: &Client, now: DateTime<Utc>) -> Result<usize> {
    let key = cfg.require_vn_gold_api_key()?;
    let rows = VnAppMobClient::new(client.clone(), key).fetch_all();
    if rows.is_empty() {
        return Err(GoldError::NoData(format!("{} returned no prices", vnappmob::SOURCE)).into());
    }
    let n = repo::insert_vn_prices(conn, &rows, vnappmob::SOURCE)?;
    repo::mark_fetched(conn, VN_RESOURCE, now)?;
    Ok(n)
}

pub(crate) const VN_HEADERS: [&str; 7] = ["Brand", "Type", "Region", "Buy", "Sell", "Spread", "Updated"];

pub(crate) fn vn_rows(prices: &[VnGoldPrice]) -> Vec<Vec<String>> {
    prices
        .iter()
        .map(|p| {
            vec![
                p.brand.display_name().to_string(),
                p.gold_type.display_name().to_string(),
                p.region.clone().unwrap_or_default(),
                format_vnd(p.buy_price as f64),
                format_vnd(p.sell_price as f64),
                format_vnd((p.sell_price - p.buy_price) as f64),
                format_date_time(p.timestamp),
            ]
        })
        .collect()
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = vn_filter_arg(sub)?;
    let data = repo::latest_vn_prices(conn, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        if data.is_empty() {
            println!("No dealer prices stored; run `goldtrack vn fetch`");
            return Ok(());
        }
        println!("{}", pretty_table(&VN_HEADERS, vn_rows(&data)));
    }
    Ok(())
}

fn sjc(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let price = repo::sjc_price(conn)?.ok_or_else(|| GoldError::NoData("no SJC price stored".into()))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &price)? {
        println!("{}", pretty_table(&VN_HEADERS, vn_rows(std::slice::from_ref(&price))));
    }
    Ok(())
}
