// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::current_rate;
use crate::converter::{
    GoldUnit, calculate_profit_loss, convert_units, convert_vnd_to_world, convert_world_to_vnd, unit_to_grams,
    value_of,
};
use crate::formatters::{format_currency, format_usd, format_vnd};
use crate::utils::{parse_decimal, pretty_table, req, to_decimal, to_f64};
use anyhow::Result;
use rust_decimal::Decimal;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("world-to-vnd", sub)) => {
            let price = parse_decimal(req(sub, "price")?)?;
            let rate = rate_arg(conn, sub)?;
            let vnd = convert_world_to_vnd(price, rate);
            println!(
                "{} /oz x {} = {} VNĐ/lượng",
                format_usd(to_f64(price)),
                format_currency(to_f64(rate), 0),
                format_vnd(to_f64(vnd))
            );
        }
        Some(("vnd-to-world", sub)) => {
            let price = parse_decimal(req(sub, "price")?)?;
            let rate = rate_arg(conn, sub)?;
            let usd = convert_vnd_to_world(price, rate)?;
            println!(
                "{} VNĐ/lượng / {} = {} /oz",
                format_vnd(to_f64(price)),
                format_currency(to_f64(rate), 0),
                format_usd(to_f64(usd))
            );
        }
        Some(("unit", sub)) => unit(sub)?,
        Some(("profit", sub)) => {
            let bought = parse_decimal(req(sub, "bought")?)?;
            let current = parse_decimal(req(sub, "current")?)?;
            let qty = parse_decimal(req(sub, "qty")?)?;
            let pl = calculate_profit_loss(bought, current, qty);
            let label = if pl.is_profit { "Profit" } else { "Loss" };
            println!(
                "{}: {} VNĐ ({}%)",
                label,
                format_vnd(to_f64(pl.profit_loss)),
                pl.profit_loss_percent
            );
        }
        _ => {}
    }
    Ok(())
}

/// `--rate`, else the stored rate.
fn rate_arg(conn: &Connection, sub: &clap::ArgMatches) -> Result<Decimal> {
    match sub.get_one::<String>("rate") {
        Some(raw) => parse_decimal(raw),
        None => to_decimal(current_rate(conn)?),
    }
}

fn unit(sub: &clap::ArgMatches) -> Result<()> {
    let qty = parse_decimal(req(sub, "qty")?)?;
    let from: GoldUnit = req(sub, "from")?.parse()?;
    let to: GoldUnit = req(sub, "to")?.parse()?;

    let mut rows = vec![
        vec![
            format!("{} {}", qty.normalize(), from),
            format!("{} {}", convert_units(qty, from, to).normalize(), to),
        ],
        vec!["Grams".into(), format!("{} g", unit_to_grams(qty, from).normalize())],
    ];
    if let Some(raw) = sub.get_one::<String>("price") {
        let rate = sub.get_one::<String>("rate").map(|r| parse_decimal(r)).transpose()?;
        let value = value_of(qty, from, parse_decimal(raw)?, rate)?;
        rows.push(vec!["Value (VNĐ)".into(), format_vnd(to_f64(value.vnd))]);
        if let Some(usd) = value.usd {
            rows.push(vec!["Value (USD)".into(), format_usd(to_f64(usd))]);
        }
    }
    println!("{}", pretty_table(&["Quantity", "Converted"], rows));
    Ok(())
}
