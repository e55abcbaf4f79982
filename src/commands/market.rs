// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! `compare` and `spread`: the home view's premium and dealer spread panels.

use super::{current_rate, vn_filter_arg};
use crate::converter::{ConvertedPrice, SpreadInfo, calculate_spread, compare_prices};
use crate::error::GoldError;
use crate::formatters::{format_currency, format_usd, format_vnd};
use crate::models::{GoldBrand, GoldType, VnGoldPrice};
use crate::repo::{self, VnFilter};
use crate::utils::{maybe_print_json, opt_arg, pretty_table, to_decimal, to_f64};
use anyhow::Result;
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Comparison {
    pub world_usd: f64,
    pub usd_to_vnd: f64,
    pub gold_type: GoldType,
    pub brand: GoldBrand,
    #[serde(flatten)]
    pub prices: ConvertedPrice,
}

#[derive(Debug, Serialize)]
pub struct SpreadRow {
    pub gold_type: GoldType,
    pub brand: GoldBrand,
    pub region: Option<String>,
    #[serde(flatten)]
    pub spread: SpreadInfo,
}

/// Domestic price used for the comparison: the SJC reference bar, or the
/// newest quote of `gold_type` preferring the SJC brand.
fn domestic_price(conn: &Connection, gold_type: Option<GoldType>) -> Result<Option<VnGoldPrice>> {
    match gold_type {
        None | Some(GoldType::Sjc) => repo::sjc_price(conn),
        Some(t) => {
            let rows = repo::latest_vn_prices(
                conn,
                &VnFilter {
                    gold_type: Some(t),
                    brand: None,
                },
            )?;
            Ok(rows
                .into_iter()
                .max_by_key(|p| (p.brand == GoldBrand::Sjc, p.timestamp)))
        }
    }
}

pub fn comparison(conn: &Connection, gold_type: Option<GoldType>) -> Result<Comparison> {
    let world = repo::latest_world_price(conn)?
        .ok_or_else(|| GoldError::NoData("no world price stored; run `goldtrack world fetch`".into()))?;
    let vn = domestic_price(conn, gold_type)?
        .ok_or_else(|| GoldError::NoData("no matching dealer price stored; run `goldtrack vn fetch`".into()))?;
    let rate = current_rate(conn)?;
    let prices = compare_prices(to_decimal(world.price)?, Decimal::from(vn.sell_price), to_decimal(rate)?);
    Ok(Comparison {
        world_usd: world.price,
        usd_to_vnd: rate,
        gold_type: vn.gold_type,
        brand: vn.brand,
        prices,
    })
}

pub fn handle_compare(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cmp = comparison(conn, opt_arg(sub, "type")?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cmp)? {
        let p = &cmp.prices;
        let rows = vec![
            vec!["World (USD/oz)".into(), format_usd(cmp.world_usd)],
            vec!["USD/VND".into(), format_currency(cmp.usd_to_vnd, 0)],
            vec!["World (VND/lượng)".into(), format_vnd(to_f64(p.world_price_vnd))],
            vec![
                format!("{} {}", cmp.brand.display_name(), cmp.gold_type.display_name()),
                format_vnd(to_f64(p.vn_price)),
            ],
            vec![
                "Difference".into(),
                format!("{} ({}%)", format_vnd(to_f64(p.difference)), p.difference_percent),
            ],
        ];
        println!("{}", pretty_table(&["Comparison", "Value"], rows));
    }
    Ok(())
}

pub fn spreads(conn: &Connection, filter: &VnFilter) -> Result<Vec<SpreadRow>> {
    Ok(repo::latest_vn_prices(conn, filter)?
        .into_iter()
        .map(|p| SpreadRow {
            gold_type: p.gold_type,
            brand: p.brand,
            spread: calculate_spread(Decimal::from(p.buy_price), Decimal::from(p.sell_price)),
            region: p.region,
        })
        .collect())
}

pub fn handle_spread(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = spreads(conn, &vn_filter_arg(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.brand.display_name().to_string(),
                    r.gold_type.display_name().to_string(),
                    r.region.clone().unwrap_or_default(),
                    format_vnd(to_f64(r.spread.buy_price)),
                    format_vnd(to_f64(r.spread.sell_price)),
                    format_vnd(to_f64(r.spread.spread)),
                    format!("{}%", r.spread.spread_percent),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Brand", "Type", "Region", "Buy", "Sell", "Spread", "Spread %"], rows)
        );
    }
    Ok(())
}
