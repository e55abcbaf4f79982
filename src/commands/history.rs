// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::stats::market_label;
use super::vn::{VN_HEADERS, vn_rows};
use super::world::{HISTORY_HEADERS, history_rows};
use super::{market_arg, vn_filter_arg};
use crate::analysis::statistics::{calculate_change_absolute, calculate_change_percent};
use crate::error::GoldError;
use crate::feeds::http_client;
use crate::feeds::investing::InvestingClient;
use crate::formatters::{format_percent, format_usd, format_vnd};
use crate::models::Market;
use crate::repo;
use crate::utils::{maybe_print_json, parse_date, pretty_table, req};
use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("world", sub)) => {
            let (start, end) = span(sub)?;
            if sub.get_flag("live") {
                let points = InvestingClient::new(http_client()?).history_between(start, end)?;
                let added = repo::store_world_history(conn, &points)?;
                tracing::info!(fetched = points.len(), added, "stored world history span");
            }
            let data = repo::world_history(conn, start, end)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                println!("{}", pretty_table(&HISTORY_HEADERS, history_rows(&data)));
            }
        }
        Some(("vn", sub)) => {
            let (start, end) = span(sub)?;
            let data = repo::vn_history(conn, start, end, &vn_filter_arg(sub)?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                println!("{}", pretty_table(&VN_HEADERS, vn_rows(&data)));
            }
        }
        Some(("on", sub)) => {
            let date = parse_date(req(sub, "date")?)?;
            let market = market_arg(sub)?;
            match repo::price_by_date(conn, date, &market)? {
                Some(p) => println!("{} on {}: {}", market_label(&market), date.format("%d/%m/%Y"), format_price(&market, p)),
                None => println!("No {} price recorded on {}", market_label(&market), date.format("%d/%m/%Y")),
            }
        }
        Some(("compare", sub)) => {
            let market = market_arg(sub)?;
            let cmp = compare_dates(
                conn,
                &market,
                parse_date(req(sub, "date1")?)?,
                parse_date(req(sub, "date2")?)?,
            )?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cmp)? {
                let rows = vec![
                    vec![cmp.date1.format("%d/%m/%Y").to_string(), format_price(&market, cmp.price1)],
                    vec![cmp.date2.format("%d/%m/%Y").to_string(), format_price(&market, cmp.price2)],
                    vec![
                        "Change".into(),
                        format!("{} ({})", format_price(&market, cmp.change), format_percent(cmp.change_percent)),
                    ],
                ];
                println!("{}", pretty_table(&[cmp.market.as_str(), "Price"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

fn format_price(market: &Market, price: f64) -> String {
    match market {
        Market::World => format_usd(price),
        Market::Vn { .. } => format_vnd(price),
    }
}

/// `--from` start of day to `--to` end of day, Vietnam time.
fn span(sub: &clap::ArgMatches) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = parse_date(req(sub, "from")?)?;
    let to = parse_date(req(sub, "to")?)?;
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }
    let (start, _) = repo::vietnam_day_bounds(from)?;
    let (_, end) = repo::vietnam_day_bounds(to)?;
    Ok((start, end))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateComparison {
    pub market: String,
    pub date1: NaiveDate,
    pub price1: f64,
    pub date2: NaiveDate,
    pub price2: f64,
    pub change: f64,
    pub change_percent: f64,
}

pub fn compare_dates(conn: &Connection, market: &Market, date1: NaiveDate, date2: NaiveDate) -> Result<DateComparison> {
    let lookup = |date: NaiveDate| -> Result<f64> {
        repo::price_by_date(conn, date, market)?.ok_or_else(|| {
            GoldError::NoData(format!("no {} price recorded on {}", market_label(market), date)).into()
        })
    };
    let price1 = lookup(date1)?;
    let price2 = lookup(date2)?;
    Ok(DateComparison {
        market: market_label(market),
        date1,
        price1,
        date2,
        price2,
        change: calculate_change_absolute(price1, price2),
        change_percent: calculate_change_percent(price1, price2),
    })
}
