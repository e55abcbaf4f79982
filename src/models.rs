// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::GoldError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoldType {
    #[serde(rename = "SJC")]
    Sjc,
    #[serde(rename = "NHAN_9999")]
    Nhan9999,
    #[serde(rename = "NHAN_999")]
    Nhan999,
    #[serde(rename = "VANG_24K")]
    Vang24k,
    #[serde(rename = "NUTRANG_9999")]
    Nutrang9999,
    #[serde(rename = "NUTRANG_99")]
    Nutrang99,
    #[serde(rename = "NUTRANG_75")]
    Nutrang75,
    /// World spot gold, quoted in USD per troy ounce.
    #[serde(rename = "XAU")]
    Xau,
}

impl GoldType {
    pub const ALL: [GoldType; 8] = [
        GoldType::Sjc,
        GoldType::Nhan9999,
        GoldType::Nhan999,
        GoldType::Vang24k,
        GoldType::Nutrang9999,
        GoldType::Nutrang99,
        GoldType::Nutrang75,
        GoldType::Xau,
    ];

    pub fn code(self) -> &'static str {
        match self {
            GoldType::Sjc => "SJC",
            GoldType::Nhan9999 => "NHAN_9999",
            GoldType::Nhan999 => "NHAN_999",
            GoldType::Vang24k => "VANG_24K",
            GoldType::Nutrang9999 => "NUTRANG_9999",
            GoldType::Nutrang99 => "NUTRANG_99",
            GoldType::Nutrang75 => "NUTRANG_75",
            GoldType::Xau => "XAU",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GoldType::Sjc => "Vàng SJC",
            GoldType::Nhan9999 => "Nhẫn 9999",
            GoldType::Nhan999 => "Nhẫn 999",
            GoldType::Vang24k => "Vàng 24K",
            GoldType::Nutrang9999 => "Nữ trang 99.99",
            GoldType::Nutrang99 => "Nữ trang 99",
            GoldType::Nutrang75 => "Nữ trang 75 (18K)",
            GoldType::Xau => "Vàng thế giới",
        }
    }
}

impl fmt::Display for GoldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GoldType {
    type Err = GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        GoldType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GoldError::InvalidInput(format!("unknown gold type '{}'", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoldBrand {
    Sjc,
    Doji,
    Pnj,
    Btmc,
    Other,
}

impl GoldBrand {
    pub const ALL: [GoldBrand; 5] = [
        GoldBrand::Sjc,
        GoldBrand::Doji,
        GoldBrand::Pnj,
        GoldBrand::Btmc,
        GoldBrand::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            GoldBrand::Sjc => "SJC",
            GoldBrand::Doji => "DOJI",
            GoldBrand::Pnj => "PNJ",
            GoldBrand::Btmc => "BTMC",
            GoldBrand::Other => "OTHER",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GoldBrand::Btmc => "Bảo Tín Minh Châu",
            GoldBrand::Other => "Khác",
            other => other.code(),
        }
    }
}

impl fmt::Display for GoldBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GoldBrand {
    type Err = GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        GoldBrand::ALL
            .into_iter()
            .find(|b| b.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GoldError::InvalidInput(format!("unknown brand '{}'", wanted)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldGoldPrice {
    pub price: f64, // USD per troy ounce
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    /// Time of the quote at the source.
    pub timestamp: DateTime<Utc>,
    /// Time we retrieved it.
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnGoldPrice {
    pub gold_type: GoldType,
    pub brand: GoldBrand,
    pub buy_price: i64,  // VND per lượng
    pub sell_price: i64, // VND per lượng
    pub timestamp: DateTime<Utc>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub usd_to_vnd: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

impl PriceHistoryPoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            price,
            open: None,
            high: None,
            low: None,
            close: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn is_met(self, price: f64, target: f64) -> bool {
        match self {
            AlertCondition::Above => price >= target,
            AlertCondition::Below => price <= target,
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertCondition::Above => "ABOVE",
            AlertCondition::Below => "BELOW",
        })
    }
}

impl FromStr for AlertCondition {
    type Err = GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ABOVE" | ">=" => Ok(AlertCondition::Above),
            "BELOW" | "<=" => Ok(AlertCondition::Below),
            other => Err(GoldError::InvalidInput(format!(
                "unknown condition '{}' (use ABOVE|BELOW)",
                other
            ))),
        }
    }
}

/// Stored in the alerts JSON file, hence the camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: String,
    pub gold_type: GoldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<GoldBrand>,
    pub condition: AlertCondition,
    pub target_price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "7D")]
    SevenDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::OneDay,
        TimeRange::SevenDays,
        TimeRange::OneMonth,
        TimeRange::ThreeMonths,
        TimeRange::OneYear,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::SevenDays => "7D",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            TimeRange::OneDay => Duration::days(1),
            TimeRange::SevenDays => Duration::days(7),
            TimeRange::OneMonth => Duration::days(30),
            TimeRange::ThreeMonths => Duration::days(90),
            TimeRange::OneYear => Duration::days(365),
        }
    }

    pub fn start_from(self, end: DateTime<Utc>) -> DateTime<Utc> {
        end - self.duration()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TimeRange {
    type Err = GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TimeRange::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                GoldError::InvalidInput(format!("unknown range '{}' (use 1D|7D|1M|3M|1Y)", wanted))
            })
    }
}

/// Which price series a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    World,
    Vn {
        gold_type: Option<GoldType>,
        brand: Option<GoldBrand>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Buy => "BUY",
            Recommendation::Sell => "SELL",
            Recommendation::Hold => "HOLD",
        })
    }
}

impl FromStr for Recommendation {
    type Err = GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Recommendation::Buy),
            "SELL" => Ok(Recommendation::Sell),
            "HOLD" => Ok(Recommendation::Hold),
            other => Err(GoldError::InvalidInput(format!("unknown recommendation '{}'", other))),
        }
    }
}

/// Market state handed to the language model and cached with its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPriceSnapshot {
    pub world_price: f64,
    pub world_change: f64,
    pub world_change_percent: f64,
    pub world_high_24h: f64,
    pub world_low_24h: f64,
    pub vn_price: f64,
    pub exchange_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub content: String,
    pub recommendation: Recommendation,
    pub confidence: u8, // 0-100
    pub price_snapshot: AiPriceSnapshot,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
