// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Goldtrack", "goldtrack"));

pub const DB_FILE: &str = "goldtrack.sqlite";

/// Data directory: the override when given, else the platform default.
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from(APP.0, APP.1, APP.2)
            .context("Could not determine platform-specific data dir")?
            .data_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create data dir {}", dir.display()))?;
    Ok(dir)
}

pub fn db_path(dir: &Path) -> PathBuf {
    dir.join(DB_FILE)
}

pub fn open_or_init(dir: &Path) -> Result<Connection> {
    let path = db_path(dir);
    let conn = Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Timestamps are RFC 3339 UTC strings with second precision, so text
/// comparison orders them chronologically.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS world_gold_prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        price REAL NOT NULL,
        previous_close REAL NOT NULL,
        change REAL NOT NULL,
        change_percent REAL NOT NULL,
        high_24h REAL NOT NULL,
        low_24h REAL NOT NULL,
        source TEXT NOT NULL,
        observed_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_world_prices_created ON world_gold_prices(created_at);

    -- one row per observation time; re-fetched candles are ignored
    CREATE TABLE IF NOT EXISTS world_gold_history(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        price REAL NOT NULL,
        open_price REAL,
        high_price REAL,
        low_price REAL,
        close_price REAL,
        observed_at TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS vn_gold_prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        gold_type TEXT NOT NULL,
        brand TEXT NOT NULL,
        buy_price INTEGER NOT NULL,
        sell_price INTEGER NOT NULL,
        region TEXT,
        source TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_vn_prices_created ON vn_gold_prices(created_at);
    CREATE INDEX IF NOT EXISTS idx_vn_prices_kind ON vn_gold_prices(gold_type, brand);

    CREATE TABLE IF NOT EXISTS exchange_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        usd_to_vnd REAL NOT NULL,
        source TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS ai_analysis_cache(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        analysis_type TEXT NOT NULL,
        content TEXT NOT NULL,
        recommendation TEXT NOT NULL,
        confidence INTEGER NOT NULL,
        price_snapshot TEXT NOT NULL, -- JSON
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );

    -- last successful fetch per remote resource, for freshness checks
    CREATE TABLE IF NOT EXISTS fetch_log(
        resource TEXT PRIMARY KEY,
        fetched_at TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}
