// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod ai;
pub mod alerts;
pub mod convert;
pub mod doctor;
pub mod exporter;
pub mod history;
pub mod market;
pub mod rate;
pub mod settings;
pub mod stats;
pub mod sync;
pub mod vn;
pub mod world;

use crate::models::{Market, TimeRange};
use crate::repo::{self, VnFilter};
use crate::utils::opt_arg;
use anyhow::{Result, bail};
use rusqlite::Connection;

/// `--range`, else the `default_range` setting.
pub(crate) fn range_arg(conn: &Connection, m: &clap::ArgMatches) -> Result<TimeRange> {
    match opt_arg::<TimeRange>(m, "range")? {
        Some(r) => Ok(r),
        None => repo::default_range(conn),
    }
}

pub(crate) fn vn_filter_arg(m: &clap::ArgMatches) -> Result<VnFilter> {
    Ok(VnFilter {
        gold_type: opt_arg(m, "type")?,
        brand: opt_arg(m, "brand")?,
    })
}

pub(crate) fn market_arg(m: &clap::ArgMatches) -> Result<Market> {
    let raw = m.get_one::<String>("market").map_or("world", String::as_str);
    match raw.to_ascii_lowercase().as_str() {
        "world" => Ok(Market::World),
        "vn" => {
            let filter = vn_filter_arg(m)?;
            Ok(Market::Vn {
                gold_type: filter.gold_type,
                brand: filter.brand,
            })
        }
        other => bail!("Unknown market '{}' (use world|vn)", other),
    }
}

/// Latest stored USD/VND rate, else the `fallback_rate` setting.
pub(crate) fn current_rate(conn: &Connection) -> Result<f64> {
    match repo::latest_exchange_rate(conn)? {
        Some(r) if r.usd_to_vnd > 0.0 => Ok(r.usd_to_vnd),
        _ => repo::fallback_rate(conn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn rate_falls_back_to_the_setting() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        assert_eq!(current_rate(&conn).unwrap(), 24_500.0);
        repo::set_setting(&conn, "fallback_rate", "25100").unwrap();
        assert_eq!(current_rate(&conn).unwrap(), 25_100.0);
    }
}
