// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{market_arg, range_arg};
use crate::analysis::statistics::{
    Period, PriceStatistics, calculate_average_price, calculate_change_absolute, calculate_change_percent,
    calculate_statistics,
};
use crate::analysis::trend::{TrendAnalysis, TrendPrediction, analyze_trend, predict_short_term_trend};
use crate::analysis::volatility::{
    VolatilityClass, calculate_average_volatility, calculate_coefficient_of_variation, calculate_volatility,
    classify_volatility,
};
use crate::formatters::{format_date, format_date_time, format_percent};
use crate::models::{Market, PriceHistoryPoint, TimeRange};
use crate::repo::{self, STATS_TTL_MINUTES, VnFilter};
use crate::utils::{maybe_print_json, opt_arg, pretty_table};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

/// Everything the statistics view shows for one series.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsReport {
    pub market: String,
    pub range: TimeRange,
    pub generated_at: DateTime<Utc>,
    pub statistics: PriceStatistics,
    pub change: f64,
    pub change_percent: f64,
    pub coefficient_of_variation: f64,
    pub volatility_window: usize,
    pub average_volatility: f64,
    pub volatility_class: VolatilityClass,
    pub trend: TrendAnalysis,
    pub prediction: TrendPrediction,
}

pub fn build_report(
    market: &Market,
    range: TimeRange,
    points: &[PriceHistoryPoint],
    window: usize,
    now: DateTime<Utc>,
) -> StatisticsReport {
    let statistics = calculate_statistics(points);
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f.price, l.price),
        _ => (0.0, 0.0),
    };
    let average_volatility = calculate_average_volatility(points, window);
    StatisticsReport {
        market: market_label(market),
        range,
        generated_at: now,
        change: calculate_change_absolute(first, last),
        change_percent: calculate_change_percent(first, last),
        coefficient_of_variation: calculate_coefficient_of_variation(points),
        volatility_window: window,
        average_volatility,
        volatility_class: classify_volatility(average_volatility, statistics.average),
        trend: analyze_trend(points),
        prediction: predict_short_term_trend(points),
        statistics,
    }
}

pub fn market_label(market: &Market) -> String {
    match market {
        Market::World => "XAU/USD".to_string(),
        Market::Vn { gold_type, brand } => {
            let mut parts = vec!["VN".to_string()];
            parts.extend(gold_type.map(|t| t.code().to_string()));
            parts.extend(brand.map(|b| b.code().to_string()));
            parts.join(" ")
        }
    }
}

/// Series for `market` over `range`. World history is refreshed first when
/// `live` is set and the last fetch is older than the statistics window.
pub fn load_series(
    conn: &Connection,
    market: &Market,
    range: TimeRange,
    live: bool,
    now: DateTime<Utc>,
) -> Result<Vec<PriceHistoryPoint>> {
    match market {
        Market::World => super::world::load_history(conn, range, now, live, STATS_TTL_MINUTES),
        Market::Vn { gold_type, brand } => repo::vn_history_points(
            conn,
            range.start_from(now),
            now,
            &VnFilter {
                gold_type: *gold_type,
                brand: *brand,
            },
        ),
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let now = Utc::now();
    let market = market_arg(sub)?;
    let range = range_arg(conn, sub)?;
    let points = load_series(conn, &market, range, sub.get_flag("live"), now)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    if points.is_empty() && !json_flag && !jsonl_flag {
        println!("No {} history stored for {}", market_label(&market), range);
        return Ok(());
    }

    match name {
        "summary" => {
            let report = build_report(&market, range, &points, repo::volatility_window(conn)?, now);
            if !maybe_print_json(json_flag, jsonl_flag, &report)? {
                println!("{}", pretty_table(&["Statistic", "Value"], summary_rows(&report)));
            }
        }
        "volatility" => {
            let window = match opt_arg::<usize>(sub, "window")? {
                Some(w) => w,
                None => repo::volatility_window(conn)?,
            };
            let series = calculate_volatility(&points, window);
            if !maybe_print_json(json_flag, jsonl_flag, &series)? {
                let avg = calculate_average_volatility(&points, window);
                let class = classify_volatility(avg, calculate_statistics(&points).average);
                let rows = series
                    .iter()
                    .map(|v| vec![format_date_time(v.timestamp), format!("{:.2}", v.price), format!("{:.2}", v.volatility)])
                    .collect();
                println!("{}", pretty_table(&["Time", "Price", "Volatility"], rows));
                println!("Average volatility {:.2} ({}, {:.2}%)", avg, class.level, class.percentage);
            }
        }
        "trend" => {
            let trend = analyze_trend(&points);
            if !maybe_print_json(json_flag, jsonl_flag, &trend)? {
                println!("{}", pretty_table(&["Trend", "Value"], trend_rows(&trend)));
            }
        }
        "predict" => {
            let prediction = predict_short_term_trend(&points);
            if !maybe_print_json(json_flag, jsonl_flag, &prediction)? {
                let rows = vec![
                    vec!["Direction".into(), prediction.predicted_direction.to_string()],
                    vec!["Confidence".into(), format!("{}%", prediction.confidence)],
                    vec!["Next price".into(), opt2(prediction.predicted_price)],
                ];
                println!("{}", pretty_table(&["Prediction", "Value"], rows));
            }
        }
        "averages" => {
            let period: Period = sub.get_one::<String>("period").map_or("day", String::as_str).parse()?;
            let data = calculate_average_price(&points, period);
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|a| vec![a.date.format("%d/%m/%Y").to_string(), format!("{:.2}", a.average), a.samples.to_string()])
                    .collect();
                println!("{}", pretty_table(&["From", "Average", "Samples"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

fn opt2(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "-".into())
}

fn trend_rows(t: &TrendAnalysis) -> Vec<Vec<String>> {
    vec![
        vec!["Direction".into(), t.direction.to_string()],
        vec!["Strength".into(), t.strength.to_string()],
        vec!["SMA 20".into(), opt2(t.sma20)],
        vec!["SMA 50".into(), opt2(t.sma50)],
        vec!["SMA 200".into(), opt2(t.sma200)],
        vec!["Support".into(), opt2(t.support_level)],
        vec!["Resistance".into(), opt2(t.resistance_level)],
    ]
}

fn summary_rows(r: &StatisticsReport) -> Vec<Vec<String>> {
    let s = &r.statistics;
    let mut rows = vec![
        vec!["Series".into(), format!("{} {}", r.market, r.range)],
        vec!["Records".into(), s.total_records.to_string()],
        vec!["Average".into(), format!("{:.2}", s.average)],
        vec!["High".into(), format!("{:.2}", s.high)],
        vec!["Low".into(), format!("{:.2}", s.low)],
        vec!["Std deviation".into(), format!("{:.2}", s.volatility)],
        vec!["Change".into(), format!("{:.2} ({})", r.change, format_percent(r.change_percent))],
        vec!["Up / down / flat".into(), format!("{} / {} / {}", s.up_days, s.down_days, s.neutral_days)],
        vec!["Up %".into(), format!("{:.2}%", s.up_percent)],
        vec!["Coefficient of variation".into(), format!("{:.2}%", r.coefficient_of_variation)],
        vec![
            format!("Volatility ({} pts)", r.volatility_window),
            format!("{:.2} ({})", r.average_volatility, r.volatility_class.level),
        ],
    ];
    rows.extend(trend_rows(&r.trend).into_iter().map(|mut row| {
        row[0] = format!("Trend {}", row[0].to_lowercase());
        row
    }));
    rows.push(vec![
        "Prediction".into(),
        format!(
            "{} ({}%) next {}",
            r.prediction.predicted_direction,
            r.prediction.confidence,
            opt2(r.prediction.predicted_price)
        ),
    ]);
    rows.push(vec!["Generated".into(), format_date(r.generated_at)]);
    rows
}
