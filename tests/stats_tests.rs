// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use goldtrack::analysis::trend::TrendDirection;
use goldtrack::analysis::volatility::VolatilityLevel;
use goldtrack::models::{GoldBrand, GoldType, Market, PriceHistoryPoint, TimeRange, VnGoldPrice};
use goldtrack::{cli, commands::stats, db, repo};
use rusqlite::Connection;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

/// 60 daily closes rising by one, stamped at mid-day offsets so range
/// boundaries never land on a point.
fn seed_rising(conn: &Connection) {
    let now = Utc::now();
    let points: Vec<PriceHistoryPoint> = (0..60)
        .map(|i| PriceHistoryPoint::new(now - Duration::days(60 - i) + Duration::hours(12), 100.0 + i as f64))
        .collect();
    repo::store_world_history(conn, &points).unwrap();
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["goldtrack", "stats"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("stats", sub)) = matches.subcommand() else {
        panic!("no stats subcommand");
    };
    stats::handle(conn, sub)
}

#[test]
fn report_over_stored_world_history() {
    let conn = base_conn();
    seed_rising(&conn);
    let now = Utc::now();
    let points = stats::load_series(&conn, &Market::World, TimeRange::ThreeMonths, false, now).unwrap();
    assert_eq!(points.len(), 60);

    let report = stats::build_report(&Market::World, TimeRange::ThreeMonths, &points, 7, now);
    let s = &report.statistics;
    assert_eq!(s.total_records, 60);
    assert_eq!(s.high, 159.0);
    assert_eq!(s.low, 100.0);
    assert_eq!(s.average, 129.5);
    assert!(s.high >= s.average && s.average >= s.low);
    assert_eq!(s.up_days, 59);
    assert_eq!(report.change, 59.0);

    assert_eq!(report.trend.direction, TrendDirection::Up);
    assert_eq!(report.trend.sma20, Some(149.5));
    assert_eq!(report.trend.sma50, Some(134.5));
    assert_eq!(report.trend.sma200, None);
    assert_eq!(report.trend.strength, 36);
    assert_eq!(report.trend.support_level, Some(140.0));
    assert_eq!(report.trend.resistance_level, Some(159.0));

    // window of 7 consecutive integers: population std dev = 2
    assert_eq!(report.average_volatility, 2.0);
    assert_eq!(report.volatility_class.level, VolatilityLevel::Medium);
    assert_eq!(report.prediction.predicted_direction, TrendDirection::Sideways);
    assert_eq!(report.prediction.predicted_price, Some(160.0));
}

#[test]
fn narrower_range_sees_fewer_points() {
    let conn = base_conn();
    seed_rising(&conn);
    let points = stats::load_series(&conn, &Market::World, TimeRange::SevenDays, false, Utc::now()).unwrap();
    assert_eq!(points.len(), 7);
    let report = stats::build_report(&Market::World, TimeRange::SevenDays, &points, 7, Utc::now());
    assert_eq!(report.trend.direction, TrendDirection::Sideways);
    assert_eq!(report.trend.strength, 0);
    assert_eq!(report.trend.support_level, None);
}

#[test]
fn vn_series_uses_sell_prices() {
    let conn = base_conn();
    let now = Utc::now();
    let rows: Vec<VnGoldPrice> = (0..3)
        .map(|i| VnGoldPrice {
            gold_type: GoldType::Sjc,
            brand: GoldBrand::Sjc,
            buy_price: 84_000_000 + i * 100_000,
            sell_price: 86_000_000 + i * 100_000,
            timestamp: now - Duration::days(3 - i),
            region: None,
        })
        .collect();
    repo::insert_vn_prices(&conn, &rows, "test").unwrap();

    let market = Market::Vn {
        gold_type: Some(GoldType::Sjc),
        brand: None,
    };
    let points = stats::load_series(&conn, &market, TimeRange::SevenDays, false, now).unwrap();
    assert_eq!(points.iter().map(|p| p.price).collect::<Vec<_>>(), vec![86_000_000.0, 86_100_000.0, 86_200_000.0]);
    assert_eq!(stats::market_label(&market), "VN SJC");
}

#[test]
fn every_view_runs_from_the_cli() {
    let conn = base_conn();
    seed_rising(&conn);
    run(&conn, &["summary", "--range", "3M"]).unwrap();
    run(&conn, &["volatility", "--range", "3M", "--window", "5", "--json"]).unwrap();
    run(&conn, &["trend", "--range", "3M", "--json"]).unwrap();
    run(&conn, &["predict", "--range", "1M"]).unwrap();
    run(&conn, &["averages", "--range", "3M", "--period", "week"]).unwrap();
    run(&conn, &["summary", "--market", "vn", "--range", "7D"]).unwrap();
    assert!(run(&conn, &["averages", "--period", "fortnight"]).is_err());
    assert!(run(&conn, &["trend", "--range", "2Y"]).is_err());
}
