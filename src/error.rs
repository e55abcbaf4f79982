// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures callers may want to tell apart. Everything else travels as
/// `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum GoldError {
    #[error("{0} is not set; add it to the environment or a .env file")]
    MissingConfig(&'static str),

    #[error("{service} returned HTTP {status}")]
    Http { service: &'static str, status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
