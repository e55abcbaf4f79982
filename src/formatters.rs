// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Display formatting for prices and timestamps.
//!
//! VND amounts follow the vi-VN convention (`.` groups thousands, `,` marks
//! decimals); USD amounts follow en-US. All local times are Vietnam time,
//! which is a fixed UTC+07:00 with no daylight saving.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

pub const VN_OFFSET_SECS: i32 = 7 * 3600;
pub const INVALID_DATE: &str = "Invalid Date";

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Format `amount` with a fixed number of decimals, grouping the integer part.
fn format_grouped(amount: f64, decimals: usize, group_sep: char, decimal_sep: char) -> (bool, String) {
    let rendered = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };
    let mut out = group_thousands(int_part, group_sep);
    if let Some(frac) = frac_part {
        out.push(decimal_sep);
        out.push_str(frac);
    }
    let negative = amount < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0');
    (negative, out)
}

/// `85000000` → `"85.000.000"`; up to three fraction digits, trailing zeros dropped.
pub fn format_vnd(amount: f64) -> String {
    let (negative, mut out) = format_grouped(amount, 3, '.', ',');
    if let Some(pos) = out.find(',') {
        let trimmed_len = out.trim_end_matches('0').len();
        out.truncate(trimmed_len.max(pos));
        if out.ends_with(',') {
            out.pop();
        }
    }
    if negative { format!("-{}", out) } else { out }
}

pub fn format_vnd_with_unit(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("{:.2} tỷ", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("{:.2} triệu", amount / 1_000_000.0)
    } else {
        format_vnd(amount)
    }
}

/// `1234.5` → `"$1,234.50"`, negatives as `"-$1,234.50"`.
pub fn format_usd(amount: f64) -> String {
    let (negative, out) = format_grouped(amount, 2, ',', '.');
    if negative {
        format!("-${}", out)
    } else {
        format!("${}", out)
    }
}

/// Grouped number without a currency symbol.
pub fn format_currency(amount: f64, decimals: usize) -> String {
    let (negative, out) = format_grouped(amount, decimals, ',', '.');
    if negative { format!("-{}", out) } else { out }
}

pub fn format_percent(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, value)
}

pub fn format_price_change(value: f64, is_vnd: bool) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    if is_vnd {
        format!("{}{}", sign, format_vnd(value))
    } else {
        format!("{}{:.2}", sign, value)
    }
}

pub fn vietnam_offset() -> FixedOffset {
    FixedOffset::east_opt(VN_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn to_vietnam_time(date: DateTime<Utc>) -> DateTime<FixedOffset> {
    date.with_timezone(&vietnam_offset())
}

pub fn format_date_time(date: DateTime<Utc>) -> String {
    to_vietnam_time(date).format("%H:%M:%S %d/%m/%Y").to_string()
}

pub fn format_date(date: DateTime<Utc>) -> String {
    to_vietnam_time(date).format("%d/%m/%Y").to_string()
}

pub fn format_time(date: DateTime<Utc>) -> String {
    to_vietnam_time(date).format("%H:%M:%S").to_string()
}

/// Accepts RFC 3339 or SQLite's `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Date of a stored timestamp string, or [`INVALID_DATE`] when it does not parse.
pub fn format_timestamp_str(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => format_date(dt),
        None => {
            tracing::error!(value = raw, "invalid date passed to format_timestamp_str");
            INVALID_DATE.to_string()
        }
    }
}

/// Vietnamese relative time, e.g. `"5 phút trước"`.
pub fn format_time_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - date).num_seconds();
    if secs < 45 {
        return "vài giây trước".to_string();
    }
    let minutes = (secs + 30) / 60;
    if minutes < 60 {
        return format!("{} phút trước", minutes.max(1));
    }
    let hours = (minutes + 30) / 60;
    if hours < 24 {
        return format!("khoảng {} giờ trước", hours);
    }
    let days = (hours + 12) / 24;
    if days < 30 {
        return format!("{} ngày trước", days);
    }
    let months = days / 30;
    if months < 12 {
        return format!("{} tháng trước", months);
    }
    format!("{} năm trước", days / 365)
}
