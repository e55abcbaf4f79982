// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Price conversion between world quotes (USD per troy ounce) and Vietnamese
//! quotes (VND per lượng), plus dealer spread and unit arithmetic.

use crate::error::GoldError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 1 lượng = 37.5 g
pub fn grams_per_luong() -> Decimal {
    Decimal::new(375, 1)
}

/// 1 troy ounce = 31.1035 g
pub fn grams_per_troy_oz() -> Decimal {
    Decimal::new(311_035, 4)
}

fn round_dp(d: Decimal, dp: u32) -> Decimal {
    d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_dp(part / whole * Decimal::ONE_HUNDRED, 2)
}

/// World price converted to VND per lượng, rounded to whole đồng.
pub fn convert_world_to_vnd(xau_usd: Decimal, usd_vnd: Decimal) -> Decimal {
    round_dp(xau_usd * usd_vnd * grams_per_luong() / grams_per_troy_oz(), 0)
}

/// VND per lượng converted to USD per troy ounce, 2 dp.
pub fn convert_vnd_to_world(vnd_per_luong: Decimal, usd_vnd: Decimal) -> Result<Decimal, GoldError> {
    if usd_vnd <= Decimal::ZERO {
        return Err(GoldError::InvalidInput("exchange rate must be positive".into()));
    }
    let per_gram = vnd_per_luong / grams_per_luong();
    Ok(round_dp(per_gram * grams_per_troy_oz() / usd_vnd, 2))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedPrice {
    pub world_price_vnd: Decimal,
    pub vn_price: Decimal,
    pub difference: Decimal,
    pub difference_percent: Decimal,
}

/// Premium of the domestic price over the converted world price.
pub fn compare_prices(world_usd: Decimal, vn_vnd: Decimal, usd_vnd: Decimal) -> ConvertedPrice {
    let world_price_vnd = convert_world_to_vnd(world_usd, usd_vnd);
    let difference = vn_vnd - world_price_vnd;
    ConvertedPrice {
        world_price_vnd,
        vn_price: vn_vnd,
        difference,
        difference_percent: percent_of(difference, world_price_vnd),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadInfo {
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub spread: Decimal,
    pub spread_percent: Decimal,
    /// What a customer loses per lượng by buying at the dealer's sell price
    /// and selling straight back at its buy price.
    pub loss_if_sell_now: Decimal,
}

pub fn calculate_spread(buy_price: Decimal, sell_price: Decimal) -> SpreadInfo {
    let spread = sell_price - buy_price;
    SpreadInfo {
        buy_price,
        sell_price,
        spread,
        spread_percent: percent_of(spread, buy_price),
        loss_if_sell_now: sell_price - buy_price,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitLoss {
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
    pub is_profit: bool,
}

/// `purchase_price` is what was paid (dealer sell price at the time),
/// `current_buy_price` what the dealer pays today.
pub fn calculate_profit_loss(
    purchase_price: Decimal,
    current_buy_price: Decimal,
    quantity: Decimal,
) -> ProfitLoss {
    let profit_loss = (current_buy_price - purchase_price) * quantity;
    ProfitLoss {
        profit_loss,
        profit_loss_percent: percent_of(profit_loss, purchase_price * quantity),
        is_profit: profit_loss >= Decimal::ZERO,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoldUnit {
    Phan,
    Chi,
    Luong,
}

impl GoldUnit {
    /// Size of the unit in chỉ.
    pub fn in_chi(self) -> Decimal {
        match self {
            GoldUnit::Phan => Decimal::new(1, 1),
            GoldUnit::Chi => Decimal::ONE,
            GoldUnit::Luong => Decimal::TEN,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GoldUnit::Phan => "phân",
            GoldUnit::Chi => "chỉ",
            GoldUnit::Luong => "lượng",
        }
    }
}

impl fmt::Display for GoldUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GoldUnit {
    type Err = GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phan" | "phân" => Ok(GoldUnit::Phan),
            "chi" | "chỉ" => Ok(GoldUnit::Chi),
            "luong" | "lượng" | "cay" | "cây" => Ok(GoldUnit::Luong),
            other => Err(GoldError::InvalidInput(format!(
                "unknown unit '{}' (use phan|chi|luong)",
                other
            ))),
        }
    }
}

pub fn convert_units(quantity: Decimal, from: GoldUnit, to: GoldUnit) -> Decimal {
    quantity * from.in_chi() / to.in_chi()
}

pub fn unit_to_grams(quantity: Decimal, unit: GoldUnit) -> Decimal {
    convert_units(quantity, unit, GoldUnit::Luong) * grams_per_luong()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitValue {
    pub quantity: Decimal,
    pub unit: GoldUnit,
    pub vnd: Decimal,
    pub usd: Option<Decimal>,
}

/// Value of `quantity` units at a dealer sell price quoted per lượng.
pub fn value_of(
    quantity: Decimal,
    unit: GoldUnit,
    sell_price_per_luong: Decimal,
    usd_vnd: Option<Decimal>,
) -> Result<UnitValue, GoldError> {
    if quantity <= Decimal::ZERO {
        return Err(GoldError::InvalidInput("quantity must be positive".into()));
    }
    let per_chi = sell_price_per_luong / Decimal::TEN;
    let total_vnd = per_chi * unit.in_chi() * quantity;
    let usd = usd_vnd
        .filter(|r| *r > Decimal::ZERO)
        .map(|r| round_dp(total_vnd / r, 2));
    Ok(UnitValue {
        quantity,
        unit,
        vnd: round_dp(total_vnd, 0),
        usd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn world_to_vnd_uses_luong_and_troy_ounce() {
        // 2650 * 25400 * 37.5 / 31.1035 = 81,152,442.65...
        let vnd = convert_world_to_vnd(d("2650"), d("25400"));
        assert_eq!(vnd, d("81152443"));
        let back = convert_vnd_to_world(vnd, d("25400")).unwrap();
        assert_eq!(back, d("2650.00"));
    }

    #[test]
    fn compare_reports_premium() {
        let cmp = compare_prices(d("2650"), d("86000000"), d("25400"));
        assert_eq!(cmp.world_price_vnd, d("81152443"));
        assert_eq!(cmp.difference, d("86000000") - cmp.world_price_vnd);
        assert_eq!(cmp.difference_percent, d("5.97"));
    }

    #[test]
    fn spread_and_loss_match() {
        let s = calculate_spread(d("84000000"), d("86000000"));
        assert_eq!(s.spread, d("2000000"));
        assert_eq!(s.loss_if_sell_now, s.spread);
        assert_eq!(s.spread_percent, d("2.38"));
        assert_eq!(calculate_spread(Decimal::ZERO, d("10")).spread_percent, Decimal::ZERO);
    }

    #[test]
    fn profit_loss_over_quantity() {
        let pl = calculate_profit_loss(d("80000000"), d("84000000"), d("2"));
        assert_eq!(pl.profit_loss, d("8000000"));
        assert_eq!(pl.profit_loss_percent, d("5.00"));
        assert!(pl.is_profit);
    }

    #[test]
    fn unit_values() {
        assert_eq!(convert_units(d("1"), GoldUnit::Luong, GoldUnit::Phan), d("100"));
        assert_eq!(unit_to_grams(d("2"), GoldUnit::Chi), d("7.5"));
        let v = value_of(d("2"), GoldUnit::Chi, d("86000000"), Some(d("25000"))).unwrap();
        assert_eq!(v.vnd, d("17200000"));
        assert_eq!(v.usd, Some(d("688.00")));
        assert!(value_of(d("0"), GoldUnit::Chi, d("86000000"), None).is_err());
        assert_eq!("cây".parse::<GoldUnit>().unwrap(), GoldUnit::Luong);
    }
}
