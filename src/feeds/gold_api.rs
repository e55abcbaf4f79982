// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Spot XAU price from gold-api.com. The endpoint returns a single number,
//! so change and the 24h range are derived from prices we stored earlier.

use super::ensure_success;
use crate::analysis::round2;
use crate::error::GoldError;
use crate::formatters::parse_timestamp;
use crate::models::WorldGoldPrice;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

pub const SOURCE: &str = "Gold-API.com";
const SPOT_URL: &str = "https://api.gold-api.com/price/XAU";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotResponse {
    #[serde(default)]
    price: f64,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spot {
    pub price: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn parse_spot(body: &str) -> Result<Spot, GoldError> {
    let raw: SpotResponse =
        serde_json::from_str(body).map_err(|e| GoldError::InvalidResponse(format!("{}: {}", SOURCE, e)))?;
    if raw.price <= 0.0 {
        return Err(GoldError::InvalidResponse(format!("invalid price from {}", SOURCE)));
    }
    Ok(Spot {
        price: raw.price,
        updated_at: raw.updated_at.as_deref().and_then(parse_timestamp),
    })
}

/// `window` holds prices stored in the last 24 hours, oldest first. The oldest
/// one serves as the previous close; the range includes the current price.
pub fn derive_world_price(current: f64, window: &[f64], timestamp: DateTime<Utc>, fetched_at: DateTime<Utc>) -> WorldGoldPrice {
    let previous_close = window.first().copied().unwrap_or(current);
    let high = window.iter().copied().fold(current, f64::max);
    let low = window.iter().copied().fold(current, f64::min);
    let change = current - previous_close;
    let change_percent = if previous_close > 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };
    WorldGoldPrice {
        price: current,
        previous_close,
        change: round2(change),
        change_percent: round2(change_percent),
        high_24h: high,
        low_24h: low,
        timestamp,
        fetched_at,
        source: SOURCE.to_string(),
    }
}

pub struct GoldApiClient {
    client: Client,
}

impl GoldApiClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn spot(&self) -> Result<Spot> {
        let resp = self
            .client
            .get(SPOT_URL)
            .header("Accept", "application/json")
            .send()
            .with_context(|| format!("Request to {} failed", SOURCE))?;
        let body = ensure_success(resp, SOURCE)?.text()?;
        Ok(parse_spot(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn spot_payload() {
        let s = parse_spot(r#"{"name":"Gold","price":2651.3,"symbol":"XAU","updatedAt":"2025-01-06T08:00:00Z"}"#)
            .unwrap();
        assert_eq!(s.price, 2651.3);
        assert_eq!(s.updated_at, Some(Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()));
        assert!(parse_spot(r#"{"price":0}"#).is_err());
        assert!(parse_spot("<html>").is_err());
    }

    #[test]
    fn change_comes_from_oldest_stored_price() {
        let now = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        let w = derive_world_price(2660.0, &[2640.0, 2670.0, 2650.0], now, now);
        assert_eq!(w.previous_close, 2640.0);
        assert_eq!(w.change, 20.0);
        assert_eq!(w.change_percent, 0.76);
        assert_eq!(w.high_24h, 2670.0);
        assert_eq!(w.low_24h, 2640.0);

        let first = derive_world_price(2660.0, &[], now, now);
        assert_eq!(first.change, 0.0);
        assert_eq!((first.high_24h, first.low_24h), (2660.0, 2660.0));
    }
}
