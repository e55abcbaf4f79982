// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{mean, population_std_dev, round2};
use crate::models::PriceHistoryPoint;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityPoint {
    pub timestamp: DateTime<Utc>,
    pub volatility: f64,
    pub price: f64,
}

/// Rolling population standard deviation; one point per full window,
/// stamped with the window's last point.
pub fn calculate_volatility(points: &[PriceHistoryPoint], window: usize) -> Vec<VolatilityPoint> {
    if window == 0 || points.len() < window {
        return Vec::new();
    }
    points
        .windows(window)
        .map(|w| {
            let prices: Vec<f64> = w.iter().map(|p| p.price).collect();
            let last = &w[w.len() - 1];
            VolatilityPoint {
                timestamp: last.timestamp,
                volatility: round2(population_std_dev(&prices)),
                price: last.price,
            }
        })
        .collect()
}

pub fn calculate_average_volatility(points: &[PriceHistoryPoint], window: usize) -> f64 {
    let series = calculate_volatility(points, window);
    if series.is_empty() {
        return 0.0;
    }
    let values: Vec<f64> = series.iter().map(|v| v.volatility).collect();
    round2(mean(&values))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for VolatilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolatilityLevel::Low => "low",
            VolatilityLevel::Medium => "medium",
            VolatilityLevel::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityClass {
    pub level: VolatilityLevel,
    pub percentage: f64,
}

pub fn classify_volatility(volatility: f64, average_price: f64) -> VolatilityClass {
    if average_price == 0.0 {
        return VolatilityClass {
            level: VolatilityLevel::Low,
            percentage: 0.0,
        };
    }
    let percentage = volatility / average_price * 100.0;
    let level = if percentage < 1.0 {
        VolatilityLevel::Low
    } else if percentage < 3.0 {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::High
    };
    VolatilityClass { level, percentage }
}

/// Standard deviation as a percentage of the mean, 2 dp.
pub fn calculate_coefficient_of_variation(points: &[PriceHistoryPoint]) -> f64 {
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    let avg = mean(&prices);
    if avg == 0.0 {
        return 0.0;
    }
    round2(population_std_dev(&prices) / avg * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_points;

    #[test]
    fn rolling_windows() {
        let pts = test_points(&[10.0, 20.0, 30.0, 40.0]);
        let vol = calculate_volatility(&pts, 3);
        assert_eq!(vol.len(), 2);
        assert_eq!(vol[0].volatility, 8.16);
        assert_eq!(vol[1].price, 40.0);
        assert_eq!(vol[1].timestamp, pts[3].timestamp);
        assert!(calculate_volatility(&pts, 5).is_empty());
        assert_eq!(calculate_average_volatility(&pts, 3), 8.16);
        assert_eq!(calculate_average_volatility(&pts, 5), 0.0);
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify_volatility(10.0, 2000.0).level, VolatilityLevel::Low);
        assert_eq!(classify_volatility(20.0, 2000.0).level, VolatilityLevel::Medium);
        assert_eq!(classify_volatility(100.0, 2000.0).level, VolatilityLevel::High);
        let zero = classify_volatility(5.0, 0.0);
        assert_eq!(zero.level, VolatilityLevel::Low);
        assert_eq!(zero.percentage, 0.0);
    }

    #[test]
    fn coefficient_of_variation() {
        assert_eq!(calculate_coefficient_of_variation(&test_points(&[10.0, 20.0, 30.0])), 40.82);
        assert_eq!(calculate_coefficient_of_variation(&[]), 0.0);
    }
}
