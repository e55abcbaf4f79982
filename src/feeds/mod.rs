// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! HTTP clients for the upstream price sources. Each module keeps its
//! response parsing in plain functions so it can be tested on fixtures.

pub mod ai;
pub mod exchange;
pub mod gold_api;
pub mod investing;
pub mod vnappmob;

use crate::error::GoldError;
use anyhow::Result;
use reqwest::blocking::{Client, Response};

const UA: &str = concat!(
    "goldtrack/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/goldtrack)"
);

pub fn http_client() -> Result<Client> {
    let c = Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

/// Turns a non-2xx response into [`GoldError::Http`].
pub(crate) fn ensure_success(resp: Response, service: &'static str) -> Result<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(GoldError::Http {
            service,
            status: status.as_u16(),
        }
        .into());
    }
    Ok(resp)
}
