// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::GoldError;
use std::path::PathBuf;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Process configuration read from the environment (and `.env`, if present).
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub vn_gold_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            data_dir: non_empty("GOLDTRACK_DATA_DIR").map(PathBuf::from),
            vn_gold_api_key: non_empty("VN_GOLD_API_KEY"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        }
    }

    pub fn require_vn_gold_api_key(&self) -> Result<&str, GoldError> {
        self.vn_gold_api_key
            .as_deref()
            .ok_or(GoldError::MissingConfig("VN_GOLD_API_KEY"))
    }

    pub fn require_openai_api_key(&self) -> Result<&str, GoldError> {
        self.openai_api_key
            .as_deref()
            .ok_or(GoldError::MissingConfig("OPENAI_API_KEY"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_and_blank_values_are_ignored() {
        let env: HashMap<&str, &str> = [("OPENAI_API_KEY", "  "), ("OPENAI_BASE_URL", "http://localhost:8080/v1/")]
            .into_iter()
            .collect();
        let cfg = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.openai_base_url, "http://localhost:8080/v1");
        assert!(cfg.openai_api_key.is_none());
        let err = cfg.require_openai_api_key().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY is not set"));
    }
}
