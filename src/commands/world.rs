// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::range_arg;
use crate::error::GoldError;
use crate::feeds::gold_api::{self, GoldApiClient};
use crate::feeds::http_client;
use crate::feeds::investing::InvestingClient;
use crate::formatters::{format_date_time, format_percent, format_price_change, format_time_ago, format_usd};
use crate::models::{PriceHistoryPoint, TimeRange, WorldGoldPrice};
use crate::repo::{self, HISTORY_TTL_MINUTES, WORLD_TTL_MINUTES};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use rusqlite::Connection;

pub const WORLD_RESOURCE: &str = "world";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", sub)) => fetch(conn, sub),
        Some(("show", sub)) => show(conn, sub),
        Some(("history", sub)) => history(conn, sub),
        _ => Ok(()),
    }
}

fn history_resource(range: TimeRange) -> String {
    format!("history:{}", range.code())
}

/// Fetches the current quote from `source`, stores it and adds it to the
/// history series.
pub fn fetch_world(conn: &Connection, client: &Client, source: &str, now: DateTime<Utc>) -> Result<WorldGoldPrice> {
    let price = match source {
        "gold-api" => {
            let spot = GoldApiClient::new(client.clone()).spot()?;
            let window = repo::world_prices_since(conn, now - Duration::hours(24))?;
            gold_api::derive_world_price(spot.price, &window, spot.updated_at.unwrap_or(now), now)
        }
        _ => InvestingClient::new(client.clone()).latest()?,
    };
    repo::insert_world_price(conn, &price)?;
    repo::record_quote_in_history(conn, &price)?;
    repo::mark_fetched(conn, WORLD_RESOURCE, now)?;
    tracing::info!(price = price.price, source = %price.source, "stored world price");
    Ok(price)
}

fn fetch(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let source = sub.get_one::<String>("source").map_or("investing", String::as_str);
    let price = fetch_world(conn, &http_client()?, source, Utc::now())?;
    println!(
        "XAU/USD {} ({}, {}) from {}",
        format_usd(price.price),
        format_price_change(price.change, false),
        format_percent(price.change_percent),
        price.source
    );
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let now = Utc::now();
    let offline = sub.get_flag("offline");
    let price = match repo::latest_world_price(conn)? {
        Some(p) if offline || repo::is_fresh(p.fetched_at, now, WORLD_TTL_MINUTES) => p,
        None if offline => return Err(GoldError::NoData("no world price stored; run `goldtrack world fetch`".into()).into()),
        stored => match http_client().and_then(|c| fetch_world(conn, &c, "investing", now)) {
            Ok(p) => p,
            Err(e) => match stored {
                Some(p) => {
                    tracing::warn!(error = %format!("{:#}", e), "refresh failed, showing stored price");
                    p
                }
                None => return Err(e),
            },
        },
    };

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &price)? {
        let rows = vec![
            vec!["Price".into(), format_usd(price.price)],
            vec![
                "Change".into(),
                format!(
                    "{} ({})",
                    format_price_change(price.change, false),
                    format_percent(price.change_percent)
                ),
            ],
            vec!["Previous close".into(), format_usd(price.previous_close)],
            vec!["24h high".into(), format_usd(price.high_24h)],
            vec!["24h low".into(), format_usd(price.low_24h)],
            vec!["Source".into(), price.source.clone()],
            vec![
                "Updated".into(),
                format!("{} ({})", format_date_time(price.timestamp), format_time_ago(price.fetched_at, now)),
            ],
        ];
        println!("{}", pretty_table(&["XAU/USD", "Value"], rows));
    }
    Ok(())
}

/// Stored world history for `range`. With `refresh`, the series is first
/// re-fetched from Investing.com unless that happened within
/// `max_age_minutes`; a failed refresh falls back to what is stored.
pub fn load_history(
    conn: &Connection,
    range: TimeRange,
    now: DateTime<Utc>,
    refresh: bool,
    max_age_minutes: i64,
) -> Result<Vec<PriceHistoryPoint>> {
    let resource = history_resource(range);
    if refresh && !repo::fetched_recently(conn, &resource, now, max_age_minutes)? {
        let fetched = http_client().and_then(|c| InvestingClient::new(c).history(range));
        match fetched {
            Ok(points) => {
                let added = repo::store_world_history(conn, &points)?;
                repo::mark_fetched(conn, &resource, now)?;
                tracing::info!(range = %range, fetched = points.len(), added, "refreshed world history");
            }
            Err(e) => tracing::warn!(range = %range, error = %format!("{:#}", e), "history refresh failed"),
        }
    }
    repo::world_history(conn, range.start_from(now), now)
}

pub(crate) fn history_rows(points: &[PriceHistoryPoint]) -> Vec<Vec<String>> {
    let opt = |v: Option<f64>| v.map(format_usd).unwrap_or_default();
    points
        .iter()
        .map(|p| {
            vec![
                format_date_time(p.timestamp),
                format_usd(p.price),
                opt(p.open),
                opt(p.high),
                opt(p.low),
                opt(p.close),
            ]
        })
        .collect()
}

pub(crate) const HISTORY_HEADERS: [&str; 6] = ["Time", "Price", "Open", "High", "Low", "Close"];

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_arg(conn, sub)?;
    let points = load_history(conn, range, Utc::now(), !sub.get_flag("offline"), HISTORY_TTL_MINUTES)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &points)? {
        if points.is_empty() {
            println!("No world history stored for {}", range);
            return Ok(());
        }
        println!("{}", pretty_table(&HISTORY_HEADERS, history_rows(&points)));
    }
    Ok(())
}
