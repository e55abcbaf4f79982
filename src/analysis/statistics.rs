// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{mean, population_std_dev, round2};
use crate::models::PriceHistoryPoint;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceStatistics {
    pub average: f64,
    pub high: f64,
    pub low: f64,
    /// Population standard deviation of the prices.
    pub volatility: f64,
    pub total_records: usize,
    pub up_days: usize,
    pub down_days: usize,
    pub neutral_days: usize,
    pub up_percent: f64,
    pub down_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceDirection {
    pub up_days: usize,
    pub down_days: usize,
    pub neutral_days: usize,
}

impl PriceDirection {
    pub fn total(&self) -> usize {
        self.up_days + self.down_days + self.neutral_days
    }
}

pub fn calculate_statistics(points: &[PriceHistoryPoint]) -> PriceStatistics {
    if points.is_empty() {
        return PriceStatistics::default();
    }
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    let average = mean(&prices);
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);

    let direction = count_price_direction(points);
    let total = direction.total();
    let share = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f64 / total as f64 * 100.0
        }
    };

    PriceStatistics {
        average: round2(average),
        high: round2(high),
        low: round2(low),
        volatility: round2(population_std_dev(&prices)),
        total_records: points.len(),
        up_days: direction.up_days,
        down_days: direction.down_days,
        neutral_days: direction.neutral_days,
        up_percent: round2(share(direction.up_days)),
        down_percent: round2(share(direction.down_days)),
    }
}

/// Counts consecutive-point moves: up, down, or unchanged.
pub fn count_price_direction(points: &[PriceHistoryPoint]) -> PriceDirection {
    let mut dir = PriceDirection::default();
    for pair in points.windows(2) {
        let (prev, curr) = (pair[0].price, pair[1].price);
        if curr > prev {
            dir.up_days += 1;
        } else if curr < prev {
            dir.down_days += 1;
        } else {
            dir.neutral_days += 1;
        }
    }
    dir
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl std::str::FromStr for Period {
    type Err = crate::error::GoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(crate::error::GoldError::InvalidInput(format!(
                "unknown period '{}' (use day|week|month)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAverage {
    pub date: NaiveDate,
    pub average: f64,
    pub samples: usize,
}

fn bucket_start(date: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Day => date,
        // Weeks start on Sunday.
        Period::Week => date - Duration::days(i64::from(date.weekday().num_days_from_sunday())),
        Period::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Mean price per calendar bucket (UTC), oldest bucket first.
pub fn calculate_average_price(points: &[PriceHistoryPoint], period: Period) -> Vec<PeriodAverage> {
    let mut grouped: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for p in points {
        let key = bucket_start(p.timestamp.date_naive(), period);
        grouped.entry(key).or_default().push(p.price);
    }
    grouped
        .into_iter()
        .map(|(date, values)| PeriodAverage {
            date,
            average: mean(&values),
            samples: values.len(),
        })
        .collect()
}

pub fn calculate_change_percent(old_price: f64, new_price: f64) -> f64 {
    if old_price == 0.0 {
        return 0.0;
    }
    (new_price - old_price) / old_price * 100.0
}

pub fn calculate_change_absolute(old_price: f64, new_price: f64) -> f64 {
    new_price - old_price
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_points;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_input_gives_zeroes() {
        assert_eq!(calculate_statistics(&[]), PriceStatistics::default());
    }

    #[test]
    fn summary_bounds_hold() {
        let pts = test_points(&[2650.0, 2660.5, 2655.0, 2655.0, 2671.25, 2640.0]);
        let s = calculate_statistics(&pts);
        assert!(s.high >= s.average && s.average >= s.low);
        assert!(s.volatility >= 0.0);
        assert_eq!(s.high, 2671.25);
        assert_eq!(s.low, 2640.0);
        assert_eq!(s.total_records, 6);
        assert_eq!((s.up_days, s.down_days, s.neutral_days), (2, 2, 1));
        assert_eq!(s.up_percent, 40.0);
    }

    #[test]
    fn single_point_has_zero_volatility() {
        let s = calculate_statistics(&test_points(&[2600.0]));
        assert_eq!(s.average, 2600.0);
        assert_eq!(s.volatility, 0.0);
        assert_eq!(s.up_percent, 0.0);
    }

    #[test]
    fn weekly_buckets_start_on_sunday() {
        // 2025-01-04 is a Saturday, 2025-01-05 a Sunday.
        let pts = vec![
            PriceHistoryPoint::new(Utc.with_ymd_and_hms(2025, 1, 4, 10, 0, 0).unwrap(), 10.0),
            PriceHistoryPoint::new(Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap(), 20.0),
            PriceHistoryPoint::new(Utc.with_ymd_and_hms(2025, 1, 7, 10, 0, 0).unwrap(), 30.0),
        ];
        let weeks = calculate_average_price(&pts, Period::Week);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].date, NaiveDate::from_ymd_opt(2024, 12, 29).unwrap());
        assert_eq!(weeks[1].date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(weeks[1].average, 25.0);
        let months = calculate_average_price(&pts, Period::Month);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].samples, 3);
    }

    #[test]
    fn change_helpers() {
        assert_eq!(calculate_change_percent(0.0, 10.0), 0.0);
        assert_eq!(calculate_change_percent(200.0, 210.0), 5.0);
        assert_eq!(calculate_change_absolute(200.0, 190.0), -10.0);
    }
}
