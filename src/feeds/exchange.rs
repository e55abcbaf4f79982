// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::ensure_success;
use crate::error::GoldError;
use crate::models::ExchangeRate;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;

pub const SOURCE: &str = "exchangerate-api.com";
pub const FALLBACK_SOURCE: &str = "fallback";
const LATEST_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

pub fn parse_usd_vnd(body: &str) -> Result<f64, GoldError> {
    let latest: LatestRates =
        serde_json::from_str(body).map_err(|e| GoldError::InvalidResponse(format!("{}: {}", SOURCE, e)))?;
    match latest.rates.get("VND") {
        Some(r) if *r > 0.0 => Ok(*r),
        _ => Err(GoldError::NoData(format!("{} has no VND rate", SOURCE))),
    }
}

/// The fetched rate, or `fallback` tagged as such when the fetch failed.
pub fn rate_or_fallback(fetched: Result<f64>, fallback: f64, now: DateTime<Utc>) -> ExchangeRate {
    match fetched {
        Ok(usd_to_vnd) => ExchangeRate {
            usd_to_vnd,
            timestamp: now,
            source: SOURCE.to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), fallback, "exchange rate fetch failed, using fallback");
            ExchangeRate {
                usd_to_vnd: fallback,
                timestamp: now,
                source: FALLBACK_SOURCE.to_string(),
            }
        }
    }
}

pub struct ExchangeClient {
    client: Client,
}

impl ExchangeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn usd_to_vnd(&self) -> Result<f64> {
        let resp = self
            .client
            .get(LATEST_URL)
            .send()
            .with_context(|| format!("Request to {} failed", SOURCE))?;
        let body = ensure_success(resp, SOURCE)?.text()?;
        Ok(parse_usd_vnd(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_vnd_from_rates() {
        let body = r#"{"base":"USD","date":"2025-01-06","rates":{"EUR":0.96,"VND":25405.5}}"#;
        assert_eq!(parse_usd_vnd(body).unwrap(), 25405.5);
        assert!(matches!(parse_usd_vnd(r#"{"rates":{"EUR":0.96}}"#), Err(GoldError::NoData(_))));
    }

    #[test]
    fn failure_uses_fallback() {
        let now = Utc::now();
        let r = rate_or_fallback(Err(anyhow::anyhow!("timeout")), 24_500.0, now);
        assert_eq!(r.usd_to_vnd, 24_500.0);
        assert_eq!(r.source, FALLBACK_SOURCE);
        let ok = rate_or_fallback(Ok(25_400.0), 24_500.0, now);
        assert_eq!(ok.source, SOURCE);
    }
}
