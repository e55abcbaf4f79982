// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{mean, round2};
use crate::models::PriceHistoryPoint;
use serde::Serialize;
use std::fmt;

const SUPPORT_WINDOW: usize = 20;
const REGRESSION_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Sideways,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Sideways => "sideways",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// 0-100
    pub strength: u8,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
}

impl TrendAnalysis {
    fn flat() -> Self {
        Self {
            direction: TrendDirection::Sideways,
            strength: 0,
            support_level: None,
            resistance_level: None,
            sma20: None,
            sma50: None,
            sma200: None,
        }
    }
}

/// Simple moving average; one value per full window, unrounded.
pub fn calculate_sma(points: &[PriceHistoryPoint], period: usize) -> Vec<f64> {
    if period == 0 || points.len() < period {
        return Vec::new();
    }
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    prices.windows(period).map(mean).collect()
}

/// SMA of the window ending at `index`, rounded to 2 dp.
pub fn sma_at_point(points: &[PriceHistoryPoint], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index + 1 < period || index >= points.len() {
        return None;
    }
    let window: Vec<f64> = points[index + 1 - period..=index].iter().map(|p| p.price).collect();
    Some(round2(mean(&window)))
}

fn clamp_strength(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

pub fn analyze_trend(points: &[PriceHistoryPoint]) -> TrendAnalysis {
    let n = points.len();
    if n < SUPPORT_WINDOW {
        return TrendAnalysis::flat();
    }
    let current = points[n - 1].price;
    let sma20 = sma_at_point(points, n - 1, 20);
    let sma50 = sma_at_point(points, n - 1, 50);
    let sma200 = sma_at_point(points, n - 1, 200);

    let recent = &points[n - SUPPORT_WINDOW..];
    let support = recent.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let resistance = recent.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);

    let (direction, strength) = match (sma20, sma50) {
        (Some(s20), Some(s50)) if s50 > 0.0 => {
            if current > s20 && s20 > s50 {
                (TrendDirection::Up, clamp_strength((current - s50) / s50 * 100.0 * 2.0))
            } else if current < s20 && s20 < s50 {
                (TrendDirection::Down, clamp_strength((s50 - current) / s50 * 100.0 * 2.0))
            } else {
                (TrendDirection::Sideways, 30)
            }
        }
        _ => (TrendDirection::Sideways, 0),
    };

    TrendAnalysis {
        direction,
        strength,
        support_level: Some(round2(support)),
        resistance_level: Some(round2(resistance)),
        sma20,
        sma50,
        sma200,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPrediction {
    pub predicted_direction: TrendDirection,
    pub confidence: u8,
    pub predicted_price: Option<f64>,
}

/// Least-squares line through the last 10 prices, projected one step ahead.
/// A move of more than 1% either way sets the direction.
pub fn predict_short_term_trend(points: &[PriceHistoryPoint]) -> TrendPrediction {
    if points.len() < REGRESSION_WINDOW {
        return TrendPrediction {
            predicted_direction: TrendDirection::Sideways,
            confidence: 0,
            predicted_price: None,
        };
    }
    let recent: Vec<f64> = points[points.len() - REGRESSION_WINDOW..]
        .iter()
        .map(|p| p.price)
        .collect();
    let n = recent.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in recent.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    let predicted = slope * n + intercept;
    let current = recent[recent.len() - 1];

    let predicted_direction = if predicted > current * 1.01 {
        TrendDirection::Up
    } else if predicted < current * 0.99 {
        TrendDirection::Down
    } else {
        TrendDirection::Sideways
    };
    let confidence = (analyze_trend(points).strength.saturating_add(20)).min(80);

    TrendPrediction {
        predicted_direction,
        confidence,
        predicted_price: Some(round2(predicted)),
    }
}
