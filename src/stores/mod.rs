// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Small JSON-file stores kept next to the database.

pub mod alerts;
pub mod chat;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const ALERTS_FILE: &str = "alerts.json";
pub const CHAT_FILE: &str = "chat_history.json";

/// Reads a JSON array. A missing file is empty; an unreadable one is logged
/// and treated as empty.
pub(crate) fn read_json_array<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "could not read store");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "could not parse store");
            Vec::new()
        }
    }
}

/// Writes through a sibling temp file so a crash never leaves half a file.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).with_context(|| format!("Write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Replace {}", path.display()))?;
    Ok(())
}
