// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! CSV and JSON exports. CSV files start with a UTF-8 BOM so spreadsheet
//! apps pick the right encoding for the Vietnamese headers.

use crate::error::GoldError;
use crate::formatters::{format_date, format_vnd, to_vietnam_time};
use crate::models::{PriceHistoryPoint, VnGoldPrice};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const BOM: &str = "\u{FEFF}";
const NO_DATA: &str = "No data to export";

pub const WORLD_HEADERS: [&str; 7] = [
    "Ngày",
    "Giờ",
    "Giá (USD/oz)",
    "Giá mở",
    "Giá cao",
    "Giá thấp",
    "Giá đóng",
];

pub const VN_HEADERS: [&str; 6] = [
    "Ngày",
    "Loại vàng",
    "Thương hiệu",
    "Giá mua (VNĐ)",
    "Giá bán (VNĐ)",
    "Chênh lệch (VNĐ)",
];

fn bom_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut file = File::create(path).with_context(|| format!("Create {}", path.display()))?;
    file.write_all(BOM.as_bytes())?;
    Ok(csv::Writer::from_writer(file))
}

fn opt2(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_default()
}

/// Returns the number of data rows written.
pub fn write_world_csv(path: &Path, points: &[PriceHistoryPoint]) -> Result<usize> {
    if points.is_empty() {
        return Err(GoldError::NoData(NO_DATA.into()).into());
    }
    let mut wtr = bom_writer(path)?;
    wtr.write_record(WORLD_HEADERS)?;
    for p in points {
        wtr.write_record([
            format_date(p.timestamp),
            to_vietnam_time(p.timestamp).format("%H:%M").to_string(),
            format!("{:.2}", p.price),
            opt2(p.open),
            opt2(p.high),
            opt2(p.low),
            opt2(p.close),
        ])?;
    }
    wtr.flush()?;
    Ok(points.len())
}

pub fn write_vn_csv(path: &Path, rows: &[VnGoldPrice]) -> Result<usize> {
    if rows.is_empty() {
        return Err(GoldError::NoData(NO_DATA.into()).into());
    }
    let mut wtr = bom_writer(path)?;
    wtr.write_record(VN_HEADERS)?;
    for r in rows {
        wtr.write_record([
            format_date(r.timestamp),
            r.gold_type.code().to_string(),
            r.brand.code().to_string(),
            format_vnd(r.buy_price as f64),
            format_vnd(r.sell_price as f64),
            format_vnd((r.sell_price - r.buy_price) as f64),
        ])?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

pub fn write_statistics_json<T: Serialize>(path: &Path, stats: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, body).with_context(|| format!("Write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoldBrand, GoldType};
    use chrono::{TimeZone, Utc};

    #[test]
    fn world_csv_has_bom_header_and_one_line_per_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.csv");
        let t = Utc.with_ymd_and_hms(2025, 1, 6, 2, 15, 0).unwrap();
        let mut full = PriceHistoryPoint::new(t, 2650.5);
        full.open = Some(2640.0);
        full.close = Some(2650.5);
        let points = vec![full, PriceHistoryPoint::new(t + chrono::Duration::hours(1), 2655.0)];
        assert_eq!(write_world_csv(&path, &points).unwrap(), 2);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], [0xEF, 0xBB, 0xBF]);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), points.len() + 1);
        assert_eq!(lines[0], "Ngày,Giờ,Giá (USD/oz),Giá mở,Giá cao,Giá thấp,Giá đóng");
        assert_eq!(lines[1], "06/01/2025,09:15,2650.50,2640.00,,,2650.50");
    }

    #[test]
    fn vn_csv_reports_spread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vn.csv");
        let row = VnGoldPrice {
            gold_type: GoldType::Sjc,
            brand: GoldBrand::Doji,
            buy_price: 84_000_000,
            sell_price: 86_000_000,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, 2, 0, 0).unwrap(),
            region: Some("HCM".into()),
        };
        write_vn_csv(&path, &[row]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let last = text.lines().last().unwrap();
        assert_eq!(last, "06/01/2025,SJC,DOJI,84.000.000,86.000.000,2.000.000");
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");
        let err = write_world_csv(&path, &[]).unwrap_err();
        assert!(err.to_string().contains("No data to export"));
        assert!(!path.exists());
        assert!(write_vn_csv(&path, &[]).is_err());
    }
}
