// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::stats::{build_report, load_series};
use super::{range_arg, vn_filter_arg};
use crate::error::GoldError;
use crate::export::{write_statistics_json, write_vn_csv, write_world_csv};
use crate::models::Market;
use crate::repo;
use crate::utils::req;
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let now = Utc::now();
    let range = range_arg(conn, sub)?;
    let start = range.start_from(now);
    let out = Path::new(req(sub, "out")?);

    match name {
        "world" => {
            let points = repo::world_history(conn, start, now)?;
            let n = write_world_csv(out, &points)?;
            println!("Exported {} rows to {}", n, out.display());
        }
        "vn" => {
            let rows = repo::vn_history(conn, start, now, &vn_filter_arg(sub)?)?;
            let n = write_vn_csv(out, &rows)?;
            println!("Exported {} rows to {}", n, out.display());
        }
        "stats" => {
            let points = load_series(conn, &Market::World, range, false, now)?;
            if points.is_empty() {
                return Err(GoldError::NoData("No data to export".into()).into());
            }
            let report = build_report(&Market::World, range, &points, repo::volatility_window(conn)?, now);
            write_statistics_json(out, &report)?;
            println!("Exported statistics for {} points to {}", points.len(), out.display());
        }
        _ => {}
    }
    Ok(())
}
