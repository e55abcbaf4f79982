// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::GoldError;
use crate::models::TimeRange;
use crate::repo::{self, SETTINGS};
use crate::utils::{maybe_print_json, pretty_table, req};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = req(sub, "key")?;
            let value = req(sub, "value")?.trim();
            validate(key, value)?;
            repo::set_setting(conn, key, value)?;
            println!("{} = {}", key, value);
        }
        Some(("list", sub)) => {
            let data = list_settings(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|s| vec![s.key.to_string(), s.value.clone(), if s.is_default { "default".into() } else { String::new() }])
                    .collect();
                println!("{}", pretty_table(&["Key", "Value", ""], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingRow {
    pub key: &'static str,
    pub value: String,
    pub is_default: bool,
}

pub fn list_settings(conn: &Connection) -> Result<Vec<SettingRow>> {
    let mut out = Vec::new();
    for (key, default) in SETTINGS {
        let stored = repo::get_setting(conn, key)?;
        out.push(SettingRow {
            key,
            is_default: stored.is_none(),
            value: stored.unwrap_or_else(|| default.to_string()),
        });
    }
    Ok(out)
}

/// Only known keys with well-formed values are stored.
pub fn validate(key: &str, value: &str) -> Result<(), GoldError> {
    let bad = |what: &str| GoldError::InvalidInput(format!("{} must be {}", key, what));
    match key {
        "fallback_rate" => match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
            _ => Err(bad("a positive number")),
        },
        "volatility_window" => match value.parse::<usize>() {
            Ok(v) if v >= 2 => Ok(()),
            _ => Err(bad("an integer of at least 2")),
        },
        "default_range" => value.parse::<TimeRange>().map(|_| ()),
        other => Err(GoldError::InvalidInput(format!(
            "unknown setting '{}' (known: {})",
            other,
            SETTINGS.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
        ))),
    }
}
