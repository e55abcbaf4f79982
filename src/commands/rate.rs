// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::GoldError;
use crate::feeds::exchange::{self, ExchangeClient};
use crate::feeds::http_client;
use crate::formatters::{format_currency, format_date_time};
use crate::models::ExchangeRate;
use crate::repo::{self, RATE_TTL_MINUTES};
use crate::utils::{maybe_print_json, pretty_table, req};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use rusqlite::Connection;

pub const RATE_RESOURCE: &str = "rate";
pub const MANUAL_SOURCE: &str = "manual";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", _)) => {
            let rate = fetch_rate(conn, &http_client()?, Utc::now())?;
            print_line(&rate);
            Ok(())
        }
        Some(("set", sub)) => {
            let rate = set_rate(conn, req(sub, "rate")?, Utc::now())?;
            print_line(&rate);
            Ok(())
        }
        Some(("show", sub)) => show(conn, sub),
        _ => Ok(()),
    }
}

fn print_line(rate: &ExchangeRate) {
    println!("USD/VND {} ({})", format_currency(rate.usd_to_vnd, 0), rate.source);
}

/// Fetches and stores the rate. A failed fetch stores the `fallback_rate`
/// setting instead, tagged with the fallback source.
pub fn fetch_rate(conn: &Connection, client: &Client, now: DateTime<Utc>) -> Result<ExchangeRate> {
    let fallback = repo::fallback_rate(conn)?;
    let rate = exchange::rate_or_fallback(ExchangeClient::new(client.clone()).usd_to_vnd(), fallback, now);
    repo::insert_exchange_rate(conn, &rate)?;
    if rate.source != exchange::FALLBACK_SOURCE {
        repo::mark_fetched(conn, RATE_RESOURCE, now)?;
    }
    Ok(rate)
}

pub fn set_rate(conn: &Connection, raw: &str, now: DateTime<Utc>) -> Result<ExchangeRate> {
    let usd_to_vnd: f64 = raw
        .trim()
        .replace(['_', ','], "")
        .parse()
        .with_context(|| format!("Invalid rate '{}'", raw))?;
    if !usd_to_vnd.is_finite() || usd_to_vnd <= 0.0 {
        return Err(GoldError::InvalidInput("rate must be positive".into()).into());
    }
    let rate = ExchangeRate {
        usd_to_vnd,
        timestamp: now,
        source: MANUAL_SOURCE.to_string(),
    };
    repo::insert_exchange_rate(conn, &rate)?;
    Ok(rate)
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let now = Utc::now();
    let offline = sub.get_flag("offline");
    let rate = match repo::latest_exchange_rate(conn)? {
        Some(r) if offline || repo::is_fresh(r.timestamp, now, RATE_TTL_MINUTES) => r,
        None if offline => return Err(GoldError::NoData("no exchange rate stored".into()).into()),
        _ => fetch_rate(conn, &http_client()?, now)?,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rate)? {
        let rows = vec![vec![
            format_currency(rate.usd_to_vnd, 0),
            rate.source.clone(),
            format_date_time(rate.timestamp),
        ]];
        println!("{}", pretty_table(&["USD/VND", "Source", "Updated"], rows));
    }
    Ok(())
}
