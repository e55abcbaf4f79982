// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{read_json_array, write_json};
use crate::error::GoldError;
use crate::models::{AlertCondition, GoldBrand, GoldType, PriceAlert};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A price an alert can be checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentPrice {
    pub gold_type: GoldType,
    pub brand: Option<GoldBrand>,
    pub price: f64,
}

impl CurrentPrice {
    fn matches(&self, alert: &PriceAlert) -> bool {
        if self.gold_type != alert.gold_type {
            return false;
        }
        match (alert.brand, self.brand) {
            (Some(want), Some(have)) => want == have,
            _ => true,
        }
    }
}

pub fn new_alert_id(now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("alert_{}_{}", now.timestamp_millis(), suffix)
}

#[derive(Debug)]
pub struct AlertStore {
    path: PathBuf,
    alerts: Vec<PriceAlert>,
}

impl AlertStore {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let alerts = read_json_array(&path);
        Self { path, alerts }
    }

    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.alerts)
    }

    pub fn alerts(&self) -> &[PriceAlert] {
        &self.alerts
    }

    pub fn active(&self) -> Vec<&PriceAlert> {
        self.alerts.iter().filter(|a| a.is_active).collect()
    }

    pub fn triggered(&self) -> Vec<&PriceAlert> {
        self.alerts.iter().filter(|a| a.triggered_at.is_some()).collect()
    }

    pub fn add(
        &mut self,
        gold_type: GoldType,
        condition: AlertCondition,
        target_price: f64,
        brand: Option<GoldBrand>,
        now: DateTime<Utc>,
    ) -> Result<PriceAlert, GoldError> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(GoldError::InvalidInput("target price must be positive".into()));
        }
        let alert = PriceAlert {
            id: new_alert_id(now),
            gold_type,
            brand,
            condition,
            target_price,
            is_active: true,
            created_at: now,
            triggered_at: None,
        };
        self.alerts.push(alert.clone());
        Ok(alert)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    /// Flips `is_active`; returns the new state.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let alert = self.alerts.iter_mut().find(|a| a.id == id)?;
        alert.is_active = !alert.is_active;
        Some(alert.is_active)
    }

    pub fn trigger(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.is_active = false;
                alert.triggered_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Fires every active alert whose condition holds for a matching price.
    /// Fired alerts are deactivated and returned.
    pub fn check(&mut self, prices: &[CurrentPrice], now: DateTime<Utc>) -> Vec<PriceAlert> {
        let mut fired = Vec::new();
        for alert in self.alerts.iter_mut().filter(|a| a.is_active) {
            let Some(current) = prices.iter().find(|p| p.matches(alert)) else {
                continue;
            };
            if alert.condition.is_met(current.price, alert.target_price) {
                alert.is_active = false;
                alert.triggered_at = Some(now);
                tracing::info!(id = %alert.id, price = current.price, target = alert.target_price, "alert triggered");
                fired.push(alert.clone());
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
    }

    #[test]
    fn ids_have_the_expected_shape() {
        let id = new_alert_id(now());
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "alert");
        assert_eq!(parts[1], now().timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn check_triggers_once_and_deactivates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AlertStore::load(dir.path().join("alerts.json"));
        let above = store
            .add(GoldType::Sjc, AlertCondition::Above, 86_000_000.0, None, now())
            .unwrap();
        let below = store
            .add(GoldType::Xau, AlertCondition::Below, 2600.0, None, now())
            .unwrap();

        let prices = [
            CurrentPrice {
                gold_type: GoldType::Sjc,
                brand: Some(GoldBrand::Sjc),
                price: 86_000_000.0,
            },
            CurrentPrice {
                gold_type: GoldType::Xau,
                brand: None,
                price: 2650.0,
            },
        ];
        let fired = store.check(&prices, now());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, above.id);
        assert!(!fired[0].is_active);
        assert_eq!(fired[0].triggered_at, Some(now()));

        assert!(store.check(&prices, now()).is_empty());
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.active()[0].id, below.id);
        assert_eq!(store.triggered().len(), 1);
    }

    #[test]
    fn brand_must_match_when_both_sides_name_one() {
        let mut store = AlertStore::load("/nonexistent/alerts.json");
        store
            .add(GoldType::Sjc, AlertCondition::Below, 90_000_000.0, Some(GoldBrand::Doji), now())
            .unwrap();
        let pnj = [CurrentPrice {
            gold_type: GoldType::Sjc,
            brand: Some(GoldBrand::Pnj),
            price: 85_000_000.0,
        }];
        assert!(store.check(&pnj, now()).is_empty());
        let doji = [CurrentPrice {
            brand: Some(GoldBrand::Doji),
            ..pnj[0]
        }];
        assert_eq!(store.check(&doji, now()).len(), 1);
    }

    #[test]
    fn persists_toggle_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        let mut store = AlertStore::load(&path);
        let a = store
            .add(GoldType::Nhan9999, AlertCondition::Above, 1.0, None, now())
            .unwrap();
        assert_eq!(store.toggle(&a.id), Some(false));
        store.save().unwrap();

        let mut reloaded = AlertStore::load(&path);
        assert_eq!(reloaded.alerts().len(), 1);
        assert!(!reloaded.alerts()[0].is_active);
        assert!(reloaded.remove(&a.id));
        assert!(!reloaded.remove(&a.id));
        assert_eq!(reloaded.toggle("missing"), None);
        assert!(store.add(GoldType::Sjc, AlertCondition::Above, 0.0, None, now()).is_err());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(AlertStore::load(&path).alerts().is_empty());
    }
}
