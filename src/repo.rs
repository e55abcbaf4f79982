// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed reads and writes over the SQLite tables created in [`crate::db`].

use crate::formatters::{parse_timestamp, vietnam_offset};
use crate::models::{
    AiAnalysis, AiPriceSnapshot, ExchangeRate, GoldBrand, GoldType, Market, PriceHistoryPoint, Recommendation,
    TimeRange, VnGoldPrice, WorldGoldPrice,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

pub const ANALYSIS_TYPE: &str = "market_analysis";
/// Used for the AI snapshot when no rate has been stored yet.
pub const SNAPSHOT_FALLBACK_RATE: f64 = 25_000.0;

pub const WORLD_TTL_MINUTES: i64 = 5;
pub const RATE_TTL_MINUTES: i64 = 5;
pub const HISTORY_TTL_MINUTES: i64 = 2;
pub const STATS_TTL_MINUTES: i64 = 10;

pub fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn ts_col(r: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = r.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("bad timestamp '{}'", raw).into())
    })
}

fn parse_col<T>(r: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = r.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn is_fresh(stored_at: DateTime<Utc>, now: DateTime<Utc>, max_age_minutes: i64) -> bool {
    now - stored_at < Duration::minutes(max_age_minutes)
}

/// Records a successful fetch of `resource`.
pub fn mark_fetched(conn: &Connection, resource: &str, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO fetch_log(resource, fetched_at) VALUES(?1, ?2)
         ON CONFLICT(resource) DO UPDATE SET fetched_at=excluded.fetched_at",
        params![resource, ts_to_sql(at)],
    )?;
    Ok(())
}

pub fn last_fetched(conn: &Connection, resource: &str) -> Result<Option<DateTime<Utc>>> {
    let at = conn
        .query_row(
            "SELECT fetched_at FROM fetch_log WHERE resource=?1",
            params![resource],
            |r| ts_col(r, 0),
        )
        .optional()?;
    Ok(at)
}

/// True when `resource` was fetched less than `max_age_minutes` ago.
pub fn fetched_recently(conn: &Connection, resource: &str, now: DateTime<Utc>, max_age_minutes: i64) -> Result<bool> {
    Ok(last_fetched(conn, resource)?.is_some_and(|at| is_fresh(at, now, max_age_minutes)))
}

// ---- settings ----

/// Known keys with their defaults, in display order.
pub const SETTINGS: [(&str, &str); 3] = [
    ("fallback_rate", "24500"),
    ("volatility_window", "7"),
    ("default_range", "1M"),
];

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| r.get(0))
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn setting_or_default(conn: &Connection, key: &str) -> Result<String> {
    if let Some(v) = get_setting(conn, key)? {
        return Ok(v);
    }
    let default = SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .with_context(|| format!("Unknown setting '{}'", key))?;
    Ok(default)
}

pub fn fallback_rate(conn: &Connection) -> Result<f64> {
    let raw = setting_or_default(conn, "fallback_rate")?;
    raw.parse::<f64>()
        .with_context(|| format!("Invalid fallback_rate '{}'", raw))
}

pub fn volatility_window(conn: &Connection) -> Result<usize> {
    let raw = setting_or_default(conn, "volatility_window")?;
    raw.parse::<usize>()
        .with_context(|| format!("Invalid volatility_window '{}'", raw))
}

pub fn default_range(conn: &Connection) -> Result<TimeRange> {
    let raw = setting_or_default(conn, "default_range")?;
    Ok(raw.parse::<TimeRange>()?)
}

// ---- world ----

pub fn insert_world_price(conn: &Connection, p: &WorldGoldPrice) -> Result<i64> {
    conn.execute(
        "INSERT INTO world_gold_prices(price, previous_close, change, change_percent, high_24h, low_24h, source, observed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            p.price,
            p.previous_close,
            p.change,
            p.change_percent,
            p.high_24h,
            p.low_24h,
            p.source,
            ts_to_sql(p.timestamp),
            ts_to_sql(p.fetched_at)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn latest_world_price(conn: &Connection) -> Result<Option<WorldGoldPrice>> {
    let p = conn
        .query_row(
            "SELECT price, previous_close, change, change_percent, high_24h, low_24h, observed_at, created_at, source
             FROM world_gold_prices ORDER BY created_at DESC, id DESC LIMIT 1",
            [],
            |r| {
                Ok(WorldGoldPrice {
                    price: r.get(0)?,
                    previous_close: r.get(1)?,
                    change: r.get(2)?,
                    change_percent: r.get(3)?,
                    high_24h: r.get(4)?,
                    low_24h: r.get(5)?,
                    timestamp: ts_col(r, 6)?,
                    fetched_at: ts_col(r, 7)?,
                    source: r.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(p)
}

/// Stored quote prices fetched at or after `since`, oldest first.
pub fn world_prices_since(conn: &Connection, since: DateTime<Utc>) -> Result<Vec<f64>> {
    let mut stmt =
        conn.prepare("SELECT price FROM world_gold_prices WHERE created_at >= ?1 ORDER BY created_at, id")?;
    let rows = stmt.query_map(params![ts_to_sql(since)], |r| r.get::<_, f64>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Inserts points not already stored for their timestamp; returns how many were new.
pub fn store_world_history(conn: &Connection, points: &[PriceHistoryPoint]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO world_gold_history(price, open_price, high_price, low_price, close_price, observed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut inserted = 0;
    for p in points {
        inserted += stmt.execute(params![p.price, p.open, p.high, p.low, p.close, ts_to_sql(p.timestamp)])?;
    }
    Ok(inserted)
}

/// Adds a quote to the history series, using the previous close as open.
pub fn record_quote_in_history(conn: &Connection, p: &WorldGoldPrice) -> Result<usize> {
    let point = PriceHistoryPoint {
        timestamp: p.timestamp,
        price: p.price,
        open: Some(p.previous_close),
        high: Some(p.high_24h),
        low: Some(p.low_24h),
        close: Some(p.price),
    };
    store_world_history(conn, std::slice::from_ref(&point))
}

pub fn world_history(conn: &Connection, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PriceHistoryPoint>> {
    let mut stmt = conn.prepare(
        "SELECT observed_at, price, open_price, high_price, low_price, close_price
         FROM world_gold_history WHERE observed_at >= ?1 AND observed_at <= ?2 ORDER BY observed_at",
    )?;
    let rows = stmt.query_map(params![ts_to_sql(start), ts_to_sql(end)], |r| {
        Ok(PriceHistoryPoint {
            timestamp: ts_col(r, 0)?,
            price: r.get(1)?,
            open: r.get(2)?,
            high: r.get(3)?,
            low: r.get(4)?,
            close: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---- vn ----

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VnFilter {
    pub gold_type: Option<GoldType>,
    pub brand: Option<GoldBrand>,
}

pub fn insert_vn_prices(conn: &Connection, prices: &[VnGoldPrice], source: &str) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO vn_gold_prices(gold_type, brand, buy_price, sell_price, region, source, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for p in prices {
        stmt.execute(params![
            p.gold_type.code(),
            p.brand.code(),
            p.buy_price,
            p.sell_price,
            p.region,
            source,
            ts_to_sql(p.timestamp)
        ])?;
    }
    Ok(prices.len())
}

fn vn_row(r: &Row) -> rusqlite::Result<VnGoldPrice> {
    Ok(VnGoldPrice {
        gold_type: parse_col(r, 0)?,
        brand: parse_col(r, 1)?,
        buy_price: r.get(2)?,
        sell_price: r.get(3)?,
        region: r.get(4)?,
        timestamp: ts_col(r, 5)?,
    })
}

/// Newest row for each brand, type and region.
pub fn latest_vn_prices(conn: &Connection, filter: &VnFilter) -> Result<Vec<VnGoldPrice>> {
    let mut stmt = conn.prepare(
        "SELECT gold_type, brand, buy_price, sell_price, region, created_at FROM vn_gold_prices
         WHERE id IN (SELECT MAX(id) FROM vn_gold_prices GROUP BY brand, gold_type, IFNULL(region, ''))
           AND (?1 IS NULL OR gold_type = ?1)
           AND (?2 IS NULL OR brand = ?2)
         ORDER BY brand, gold_type, region",
    )?;
    let rows = stmt.query_map(
        params![filter.gold_type.map(GoldType::code), filter.brand.map(GoldBrand::code)],
        vn_row,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// The reference SJC bar price: SJC-branded 1-lượng bars first, then any
/// other SJC-type quote.
pub fn sjc_price(conn: &Connection) -> Result<Option<VnGoldPrice>> {
    let latest = latest_vn_prices(
        conn,
        &VnFilter {
            gold_type: Some(GoldType::Sjc),
            brand: None,
        },
    )?;
    let rank = |p: &VnGoldPrice| {
        let branded = p.brand == GoldBrand::Sjc;
        let bar = p.region.as_deref() == Some("1L");
        (branded, bar, p.timestamp)
    };
    Ok(latest.into_iter().max_by_key(rank))
}

pub fn vn_history(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filter: &VnFilter,
) -> Result<Vec<VnGoldPrice>> {
    let mut stmt = conn.prepare(
        "SELECT gold_type, brand, buy_price, sell_price, region, created_at FROM vn_gold_prices
         WHERE created_at >= ?1 AND created_at <= ?2
           AND (?3 IS NULL OR gold_type = ?3)
           AND (?4 IS NULL OR brand = ?4)
         ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(
        params![
            ts_to_sql(start),
            ts_to_sql(end),
            filter.gold_type.map(GoldType::code),
            filter.brand.map(GoldBrand::code)
        ],
        vn_row,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Sell-price series for charting and statistics.
pub fn vn_history_points(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filter: &VnFilter,
) -> Result<Vec<PriceHistoryPoint>> {
    Ok(vn_history(conn, start, end, filter)?
        .into_iter()
        .map(|p| PriceHistoryPoint::new(p.timestamp, p.sell_price as f64))
        .collect())
}

// ---- exchange rate ----

pub fn insert_exchange_rate(conn: &Connection, rate: &ExchangeRate) -> Result<()> {
    conn.execute(
        "INSERT INTO exchange_rates(usd_to_vnd, source, created_at) VALUES (?1, ?2, ?3)",
        params![rate.usd_to_vnd, rate.source, ts_to_sql(rate.timestamp)],
    )?;
    Ok(())
}

pub fn latest_exchange_rate(conn: &Connection) -> Result<Option<ExchangeRate>> {
    let r = conn
        .query_row(
            "SELECT usd_to_vnd, source, created_at FROM exchange_rates ORDER BY created_at DESC, id DESC LIMIT 1",
            [],
            |r| {
                Ok(ExchangeRate {
                    usd_to_vnd: r.get(0)?,
                    source: r.get(1)?,
                    timestamp: ts_col(r, 2)?,
                })
            },
        )
        .optional()?;
    Ok(r)
}

// ---- history lookups ----

/// UTC bounds of a calendar day in Vietnam time.
pub fn vietnam_day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_local = date.and_hms_opt(0, 0, 0).context("Invalid date")?;
    let start = vietnam_offset()
        .from_local_datetime(&start_local)
        .single()
        .context("Ambiguous local date")?
        .with_timezone(&Utc);
    Ok((start, start + Duration::days(1) - Duration::seconds(1)))
}

/// Last price recorded on `date` (Vietnam time): world history close, or a
/// VN sell price.
pub fn price_by_date(conn: &Connection, date: NaiveDate, market: &Market) -> Result<Option<f64>> {
    let (start, end) = vietnam_day_bounds(date)?;
    let price = match market {
        Market::World => conn
            .query_row(
                "SELECT price FROM world_gold_history WHERE observed_at >= ?1 AND observed_at <= ?2
                 ORDER BY observed_at DESC LIMIT 1",
                params![ts_to_sql(start), ts_to_sql(end)],
                |r| r.get::<_, f64>(0),
            )
            .optional()?,
        Market::Vn { gold_type, brand } => conn
            .query_row(
                "SELECT sell_price FROM vn_gold_prices WHERE created_at >= ?1 AND created_at <= ?2
                   AND (?3 IS NULL OR gold_type = ?3)
                   AND (?4 IS NULL OR brand = ?4)
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![
                    ts_to_sql(start),
                    ts_to_sql(end),
                    gold_type.map(GoldType::code),
                    brand.map(GoldBrand::code)
                ],
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .map(|v| v as f64),
    };
    Ok(price)
}

// ---- AI cache ----

pub fn cached_analysis(conn: &Connection, now: DateTime<Utc>) -> Result<Option<AiAnalysis>> {
    let row = conn
        .query_row(
            "SELECT content, recommendation, confidence, price_snapshot, created_at, expires_at
             FROM ai_analysis_cache WHERE analysis_type = ?1 AND expires_at > ?2
             ORDER BY created_at DESC, id DESC LIMIT 1",
            params![ANALYSIS_TYPE, ts_to_sql(now)],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    parse_col::<Recommendation>(r, 1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                    ts_col(r, 4)?,
                    ts_col(r, 5)?,
                ))
            },
        )
        .optional()?;
    let Some((content, recommendation, confidence, snapshot, created_at, expires_at)) = row else {
        return Ok(None);
    };
    let price_snapshot: AiPriceSnapshot =
        serde_json::from_str(&snapshot).context("Decode cached price snapshot")?;
    Ok(Some(AiAnalysis {
        content,
        recommendation,
        confidence: confidence.clamp(0, 100) as u8,
        price_snapshot,
        created_at,
        expires_at,
    }))
}

pub fn cache_analysis(conn: &Connection, a: &AiAnalysis) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_analysis_cache(analysis_type, content, recommendation, confidence, price_snapshot, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ANALYSIS_TYPE,
            a.content,
            a.recommendation.to_string(),
            i64::from(a.confidence),
            serde_json::to_string(&a.price_snapshot)?,
            ts_to_sql(a.created_at),
            ts_to_sql(a.expires_at)
        ],
    )?;
    Ok(())
}

/// Current market state for the AI prompts. Missing pieces are zero, and the
/// rate falls back to [`SNAPSHOT_FALLBACK_RATE`].
pub fn price_snapshot(conn: &Connection) -> Result<AiPriceSnapshot> {
    let world = latest_world_price(conn)?;
    let vn = sjc_price(conn)?;
    let rate = latest_exchange_rate(conn)?;
    Ok(AiPriceSnapshot {
        world_price: world.as_ref().map_or(0.0, |w| w.price),
        world_change: world.as_ref().map_or(0.0, |w| w.change),
        world_change_percent: world.as_ref().map_or(0.0, |w| w.change_percent),
        world_high_24h: world.as_ref().map_or(0.0, |w| w.high_24h),
        world_low_24h: world.as_ref().map_or(0.0, |w| w.low_24h),
        vn_price: vn.map_or(0.0, |v| v.sell_price as f64),
        exchange_rate: rate
            .map(|r| r.usd_to_vnd)
            .filter(|r| *r > 0.0)
            .unwrap_or(SNAPSHOT_FALLBACK_RATE),
    })
}

/// Row counts per table, for `doctor`.
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let mut out = Vec::new();
    for table in [
        "world_gold_prices",
        "world_gold_history",
        "vn_gold_prices",
        "exchange_rates",
        "ai_analysis_cache",
    ] {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        out.push((table, n));
    }
    Ok(out)
}
