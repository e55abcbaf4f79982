// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Domestic dealer quotes from VNAppMob. One endpoint per brand; each result
//! item carries buy/sell pairs keyed by product.

use super::ensure_success;
use crate::models::{GoldBrand, GoldType, VnGoldPrice};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

pub const SOURCE: &str = "VNAppMob";
const BASE_URL: &str = "https://vapi.vnappmob.com/api/v2/gold";
pub const BRANDS: [GoldBrand; 3] = [GoldBrand::Sjc, GoldBrand::Doji, GoldBrand::Pnj];

#[derive(Debug, Default, Deserialize)]
pub struct VnAppMobItem {
    #[serde(default)]
    pub buy_1l: Option<Value>,
    #[serde(default)]
    pub sell_1l: Option<Value>,
    #[serde(default)]
    pub buy_1c: Option<Value>,
    #[serde(default)]
    pub sell_1c: Option<Value>,
    #[serde(default)]
    pub buy_5c: Option<Value>,
    #[serde(default)]
    pub sell_5c: Option<Value>,
    #[serde(default)]
    pub buy_nhan1c: Option<Value>,
    #[serde(default)]
    pub sell_nhan1c: Option<Value>,
    #[serde(default)]
    pub buy_nutrang_9999: Option<Value>,
    #[serde(default)]
    pub sell_nutrang_9999: Option<Value>,
    #[serde(default)]
    pub buy_nutrang_99: Option<Value>,
    #[serde(default)]
    pub sell_nutrang_99: Option<Value>,
    #[serde(default)]
    pub buy_nutrang_75: Option<Value>,
    #[serde(default)]
    pub sell_nutrang_75: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BrandResponse {
    #[serde(default)]
    results: Vec<VnAppMobItem>,
}

/// Prices arrive as numbers or strings like `"85,500,000"`. Anything
/// unparseable is 0.
pub fn parse_price(raw: Option<&Value>) -> i64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.replace(',', "").trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v.round() as i64,
        _ => 0,
    }
}

/// One row per product with both prices positive. SJC bars keep their size
/// (1L, 1C, 5C) in `region`.
pub fn process_item(item: &VnAppMobItem, brand: GoldBrand, timestamp: DateTime<Utc>) -> Vec<VnGoldPrice> {
    let products: [(&Option<Value>, &Option<Value>, GoldType, Option<&str>); 7] = [
        (&item.buy_1l, &item.sell_1l, GoldType::Sjc, Some("1L")),
        (&item.buy_1c, &item.sell_1c, GoldType::Sjc, Some("1C")),
        (&item.buy_5c, &item.sell_5c, GoldType::Sjc, Some("5C")),
        (&item.buy_nhan1c, &item.sell_nhan1c, GoldType::Nhan9999, None),
        (&item.buy_nutrang_9999, &item.sell_nutrang_9999, GoldType::Nutrang9999, None),
        (&item.buy_nutrang_99, &item.sell_nutrang_99, GoldType::Nutrang99, None),
        (&item.buy_nutrang_75, &item.sell_nutrang_75, GoldType::Nutrang75, None),
    ];
    products
        .into_iter()
        .filter_map(|(buy, sell, gold_type, region)| {
            let buy_price = parse_price(buy.as_ref());
            let sell_price = parse_price(sell.as_ref());
            (buy_price > 0 && sell_price > 0).then(|| VnGoldPrice {
                gold_type,
                brand,
                buy_price,
                sell_price,
                timestamp,
                region: region.map(str::to_string),
            })
        })
        .collect()
}

pub fn parse_brand_response(body: &str, brand: GoldBrand, timestamp: DateTime<Utc>) -> Result<Vec<VnGoldPrice>> {
    let resp: BrandResponse =
        serde_json::from_str(body).with_context(|| format!("Decode {} response for {}", SOURCE, brand))?;
    Ok(resp
        .results
        .iter()
        .flat_map(|item| process_item(item, brand, timestamp))
        .collect())
}

pub struct VnAppMobClient {
    client: Client,
    api_key: String,
}

impl VnAppMobClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    fn try_fetch_brand(&self, brand: GoldBrand) -> Result<Vec<VnGoldPrice>> {
        let url = format!("{}/{}", BASE_URL, brand.code().to_lowercase());
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .with_context(|| format!("Request to {} failed", SOURCE))?;
        let body = ensure_success(resp, SOURCE)?.text()?;
        parse_brand_response(&body, brand, Utc::now())
    }

    /// A failing brand is logged and contributes nothing.
    pub fn fetch_brand(&self, brand: GoldBrand) -> Vec<VnGoldPrice> {
        match self.try_fetch_brand(brand) {
            Ok(rows) => {
                tracing::info!(%brand, rows = rows.len(), "fetched dealer prices");
                rows
            }
            Err(e) => {
                tracing::error!(%brand, error = %format!("{:#}", e), "dealer price fetch failed");
                Vec::new()
            }
        }
    }

    pub fn fetch_all(&self) -> Vec<VnGoldPrice> {
        BRANDS.into_iter().flat_map(|b| self.fetch_brand(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn price_strings_and_numbers() {
        assert_eq!(parse_price(Some(&json!("85,500,000"))), 85_500_000);
        assert_eq!(parse_price(Some(&json!(84_000_000.4))), 84_000_000);
        assert_eq!(parse_price(Some(&json!("n/a"))), 0);
        assert_eq!(parse_price(Some(&Value::Null)), 0);
        assert_eq!(parse_price(None), 0);
    }

    #[test]
    fn brand_payload_maps_products() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        let body = json!({ "results": [{
            "buy_1l": "84000000", "sell_1l": "86000000",
            "buy_1c": 84000000, "sell_1c": 86020000,
            "buy_5c": "0", "sell_5c": "86020000",
            "buy_nhan1c": "83500000", "sell_nhan1c": "85000000",
            "buy_nutrang_75": "61000000", "sell_nutrang_75": "63000000",
            "datetime": "1736150400"
        }]})
        .to_string();
        let rows = parse_brand_response(&body, GoldBrand::Sjc, ts).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].region.as_deref(), Some("1L"));
        assert_eq!(rows[0].sell_price, 86_000_000);
        assert_eq!(rows[1].region.as_deref(), Some("1C"));
        assert_eq!(rows[2].gold_type, GoldType::Nhan9999);
        assert_eq!(rows[2].region, None);
        assert_eq!(rows[3].gold_type, GoldType::Nutrang75);
        assert!(rows.iter().all(|r| r.brand == GoldBrand::Sjc && r.timestamp == ts));
    }

    #[test]
    fn missing_results_is_empty() {
        let rows = parse_brand_response("{}", GoldBrand::Doji, Utc::now()).unwrap();
        assert!(rows.is_empty());
        assert!(parse_brand_response("not json", GoldBrand::Doji, Utc::now()).is_err());
    }
}
