// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::feeds::ai::{ChatBackend, OpenAiClient, analyze_market};
use crate::feeds::http_client;
use crate::formatters::{format_date_time, format_time_ago};
use crate::models::AiAnalysis;
use crate::repo;
use crate::stores::CHAT_FILE;
use crate::stores::chat::{ChatHistory, send_message};
use crate::utils::{maybe_print_json, pretty_table, req};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, cfg: &Config, data_dir: &Path, m: &clap::ArgMatches) -> Result<()> {
    let chat_path = data_dir.join(CHAT_FILE);
    match m.subcommand() {
        Some(("analyze", sub)) => {
            let now = Utc::now();
            let refresh = sub.get_flag("refresh");
            let cached = if refresh { None } else { repo::cached_analysis(conn, now)? };
            let (analysis, from_cache) = match cached {
                Some(a) => (a, true),
                None => {
                    let backend = OpenAiClient::from_config(http_client()?, cfg)?;
                    (fresh_analysis(conn, &backend, now)?, false)
                }
            };
            print_analysis(&analysis, from_cache, now);
        }
        Some(("chat", sub)) => {
            let backend = OpenAiClient::from_config(http_client()?, cfg)?;
            let mut history = ChatHistory::load(&chat_path);
            let snapshot = repo::price_snapshot(conn)?;
            match send_message(&mut history, &backend, &snapshot, req(sub, "message")?, Utc::now())? {
                Some(reply) => println!("{}", reply),
                None => println!("Nothing to send"),
            }
        }
        Some(("history", sub)) => {
            let history = ChatHistory::load(&chat_path);
            let data = history.messages();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|msg| vec![format_date_time(msg.timestamp), msg.role.as_str().to_string(), msg.content.clone()])
                    .collect();
                println!("{}", pretty_table(&["Time", "Role", "Message"], rows));
            }
        }
        Some(("clear", _)) => {
            ChatHistory::load(&chat_path).clear()?;
            println!("Chat history cleared");
        }
        _ => {}
    }
    Ok(())
}

/// Asks `backend` about the stored market state and caches the answer.
pub fn fresh_analysis(conn: &Connection, backend: &dyn ChatBackend, now: DateTime<Utc>) -> Result<AiAnalysis> {
    let snapshot = repo::price_snapshot(conn)?;
    let analysis = analyze_market(backend, snapshot, now)?;
    repo::cache_analysis(conn, &analysis)?;
    tracing::info!(recommendation = %analysis.recommendation, confidence = analysis.confidence, "cached market analysis");
    Ok(analysis)
}

fn print_analysis(a: &AiAnalysis, from_cache: bool, now: DateTime<Utc>) {
    println!(
        "{} ({}% confidence){}",
        a.recommendation,
        a.confidence,
        if from_cache {
            format!(", cached {}", format_time_ago(a.created_at, now))
        } else {
            String::new()
        }
    );
    println!();
    println!("{}", a.content);
}
