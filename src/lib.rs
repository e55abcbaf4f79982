// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod converter;
pub mod db;
pub mod error;
pub mod export;
pub mod feeds;
pub mod formatters;
pub mod logging;
pub mod models;
pub mod repo;
pub mod stores;
pub mod utils;
