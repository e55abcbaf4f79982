// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! XAU/USD candles from Investing.com's chart endpoint.

use super::ensure_success;
use crate::analysis::round2;
use crate::error::GoldError;
use crate::models::{PriceHistoryPoint, TimeRange, WorldGoldPrice};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde_json::Value;

pub const SOURCE: &str = "Investing.com";
const CHART_URL: &str = "https://api.investing.com/api/financialdata/68/historical/chart/";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub interval: &'static str,
    pub points: u32,
}

/// Candle resolution and count used to cover a chart range.
pub fn interval_for_range(range: TimeRange) -> Interval {
    let (interval, points) = match range {
        TimeRange::OneDay => ("PT15M", 96),
        TimeRange::SevenDays => ("PT1H", 168),
        TimeRange::OneMonth => ("PT4H", 180),
        TimeRange::ThreeMonths => ("P1D", 90),
        TimeRange::OneYear => ("P1D", 365),
    };
    Interval { interval, points }
}

/// Picks a resolution so an arbitrary window comes back in a few hundred points.
pub fn interval_for_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Interval {
    let days = (end - start).num_milliseconds() as f64 / 86_400_000.0;
    let ceil = |x: f64| x.ceil().max(1.0) as u32;
    let (interval, points) = if days <= 1.66 {
        ("PT15M", ceil(days * 96.0).min(160))
    } else if days <= 7.0 {
        ("PT1H", ceil(days * 24.0))
    } else if days <= 30.0 {
        ("PT4H", ceil(days * 6.0))
    } else if days <= 180.0 {
        ("P1D", ceil(days))
    } else {
        ("P1D", ceil(days).min(365))
    };
    Interval { interval, points }
}

fn parse_row(row: &Value) -> Option<Candle> {
    let cols = row.as_array()?;
    if cols.len() < 5 {
        return None;
    }
    let ms = cols[0].as_i64().or_else(|| cols[0].as_f64().map(|f| f as i64))?;
    Some(Candle {
        timestamp: DateTime::from_timestamp_millis(ms)?,
        open: cols[1].as_f64()?,
        high: cols[2].as_f64()?,
        low: cols[3].as_f64()?,
        close: cols[4].as_f64()?,
    })
}

/// Accepts either a bare array of `[ts_ms, open, high, low, close, ...]` rows
/// or the same array under `data`. Output is oldest first.
pub fn parse_candles(body: &Value) -> Result<Vec<Candle>, GoldError> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(map) => map
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| GoldError::InvalidResponse(format!("{} payload has no data array", SOURCE)))?,
        _ => {
            return Err(GoldError::InvalidResponse(format!(
                "unexpected {} payload",
                SOURCE
            )));
        }
    };
    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_row(row) {
            Some(c) => candles.push(c),
            None => tracing::debug!(?row, "skipping malformed candle"),
        }
    }
    if candles.is_empty() {
        return Err(GoldError::NoData(format!("{} returned no candles", SOURCE)));
    }
    if candles[0].timestamp > candles[candles.len() - 1].timestamp {
        candles.reverse();
    }
    Ok(candles)
}

/// Current quote from a run of candles: last close against the first close,
/// with the 24h range taken from candles within a day of the last one.
pub fn summarize_candles(candles: &[Candle], fetched_at: DateTime<Utc>) -> Result<WorldGoldPrice, GoldError> {
    let (first, last) = match (candles.first(), candles.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(GoldError::NoData(format!("{} returned no candles", SOURCE))),
    };
    let current = last.close;
    let previous_close = first.close;
    let cutoff = last.timestamp - Duration::hours(24);
    let recent = candles.iter().filter(|c| c.timestamp >= cutoff);
    let high = recent
        .clone()
        .map(|c| c.high)
        .filter(|h| *h > 0.0)
        .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))))
        .unwrap_or(current);
    let low = recent
        .map(|c| c.low)
        .filter(|l| *l > 0.0)
        .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.min(l))))
        .unwrap_or(current);

    let change = current - previous_close;
    let change_percent = if previous_close > 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };
    Ok(WorldGoldPrice {
        price: current,
        previous_close,
        change: round2(change),
        change_percent: round2(change_percent),
        high_24h: high,
        low_24h: low,
        timestamp: last.timestamp,
        fetched_at,
        source: SOURCE.to_string(),
    })
}

pub fn candles_to_points(candles: &[Candle]) -> Vec<PriceHistoryPoint> {
    candles
        .iter()
        .map(|c| PriceHistoryPoint {
            timestamp: c.timestamp,
            price: c.close,
            open: Some(c.open),
            high: Some(c.high),
            low: Some(c.low),
            close: Some(c.close),
        })
        .collect()
}

pub struct InvestingClient {
    client: Client,
}

impl InvestingClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn candles(&self, iv: Interval) -> Result<Vec<Candle>> {
        tracing::debug!(interval = iv.interval, points = iv.points, "requesting candles");
        let resp = self
            .client
            .get(CHART_URL)
            .query(&[("interval", iv.interval.to_string()), ("pointscount", iv.points.to_string())])
            .header("Accept", "application/json")
            .send()
            .with_context(|| format!("Request to {} failed", SOURCE))?;
        let body: Value = ensure_success(resp, SOURCE)?
            .json()
            .with_context(|| format!("Decode {} response", SOURCE))?;
        Ok(parse_candles(&body)?)
    }

    /// Latest quote from 40 hours of 15-minute candles.
    pub fn latest(&self) -> Result<WorldGoldPrice> {
        let candles = self.candles(Interval {
            interval: "PT15M",
            points: 160,
        })?;
        Ok(summarize_candles(&candles, Utc::now())?)
    }

    pub fn history(&self, range: TimeRange) -> Result<Vec<PriceHistoryPoint>> {
        let candles = self.candles(interval_for_range(range))?;
        Ok(candles_to_points(&candles))
    }

    pub fn history_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PriceHistoryPoint>> {
        let candles = self.candles(interval_for_span(start, end))?;
        Ok(candles_to_points(&candles)
            .into_iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const T0: i64 = 1_736_000_000_000;
    const HOUR: i64 = 3_600_000;

    #[test]
    fn wrapped_newest_first_payload_is_normalised() {
        let body = json!({ "data": [
            [T0 + 2 * HOUR, 2650.0, 2660.0, 0.0, 2655.0, 0, 0],
            [T0 + HOUR, 2641.0, 2665.0, 2638.0, 2650.0, 0, 0],
            [T0, 2640.0, 2645.0, 2630.0, 2641.0, 0, 0]
        ]});
        let candles = parse_candles(&body).unwrap();
        assert_eq!(candles.len(), 3);
        assert!(candles[0].timestamp < candles[2].timestamp);

        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        let q = summarize_candles(&candles, now).unwrap();
        assert_eq!(q.price, 2655.0);
        assert_eq!(q.previous_close, 2641.0);
        assert_eq!(q.change, 14.0);
        assert_eq!(q.change_percent, 0.53);
        assert_eq!(q.high_24h, 2665.0);
        assert_eq!(q.low_24h, 2630.0);
        assert_eq!(q.source, SOURCE);
        assert_eq!(q.fetched_at, now);
    }

    #[test]
    fn range_ignores_candles_older_than_a_day() {
        let body = json!([
            [T0 - 30 * HOUR, 2600.0, 9999.0, 1.0, 2600.0],
            [T0, 2640.0, 2645.0, 2630.0, 2641.0]
        ]);
        let candles = parse_candles(&body).unwrap();
        let q = summarize_candles(&candles, Utc::now()).unwrap();
        assert_eq!(q.previous_close, 2600.0);
        assert_eq!(q.high_24h, 2645.0);
        assert_eq!(q.low_24h, 2630.0);
    }

    #[test]
    fn rejects_unexpected_shapes() {
        assert!(matches!(parse_candles(&json!({"status": "ok"})), Err(GoldError::InvalidResponse(_))));
        assert!(matches!(parse_candles(&json!([])), Err(GoldError::NoData(_))));
        assert!(matches!(parse_candles(&json!([["x", 1, 2]])), Err(GoldError::NoData(_))));
    }

    #[test]
    fn intervals_follow_span() {
        assert_eq!(interval_for_range(TimeRange::OneMonth), Interval { interval: "PT4H", points: 180 });
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(interval_for_span(end - Duration::hours(12), end), Interval { interval: "PT15M", points: 48 });
        assert_eq!(interval_for_span(end - Duration::days(3), end), Interval { interval: "PT1H", points: 72 });
        assert_eq!(interval_for_span(end - Duration::days(20), end), Interval { interval: "PT4H", points: 120 });
        assert_eq!(interval_for_span(end - Duration::days(90), end), Interval { interval: "P1D", points: 90 });
        assert_eq!(interval_for_span(end - Duration::days(800), end), Interval { interval: "P1D", points: 365 });
    }
}
