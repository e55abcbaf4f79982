// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use goldtrack::feeds::ai::{ChatBackend, PromptMessage};
use goldtrack::models::{ExchangeRate, Recommendation};
use goldtrack::stores::CHAT_FILE;
use goldtrack::stores::chat::ChatHistory;
use goldtrack::{cli, commands::ai, db, repo};
use rusqlite::Connection;
use std::cell::RefCell;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

struct Scripted {
    reply: &'static str,
    prompts: RefCell<Vec<Vec<PromptMessage>>>,
}

impl ChatBackend for Scripted {
    fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        self.prompts.borrow_mut().push(messages.to_vec());
        Ok(self.reply.to_string())
    }
}

#[test]
fn analysis_is_cached_for_an_hour() {
    let conn = base_conn();
    repo::insert_exchange_rate(
        &conn,
        &ExchangeRate {
            usd_to_vnd: 25_400.0,
            timestamp: Utc::now(),
            source: "test".into(),
        },
    )
    .unwrap();
    let backend = Scripted {
        reply: r#"Kết quả: {"analysis":"Giá ổn định","recommendation":"BUY","confidence":72,"reason":"Xu hướng tăng"}"#,
        prompts: RefCell::new(Vec::new()),
    };
    let now = Utc::now();
    let fresh = ai::fresh_analysis(&conn, &backend, now).unwrap();
    assert_eq!(fresh.recommendation, Recommendation::Buy);
    assert_eq!(fresh.confidence, 72);
    assert_eq!(fresh.content, "Giá ổn định\n\nXu hướng tăng");
    assert_eq!(fresh.price_snapshot.exchange_rate, 25_400.0);
    assert_eq!(fresh.price_snapshot.world_price, 0.0);
    assert_eq!(backend.prompts.borrow().len(), 1);

    let cached = repo::cached_analysis(&conn, now + Duration::minutes(59)).unwrap().unwrap();
    assert_eq!(cached.content, fresh.content);
    assert_eq!(cached.price_snapshot, fresh.price_snapshot);
    assert!(repo::cached_analysis(&conn, now + Duration::minutes(61)).unwrap().is_none());
}

#[test]
fn chat_history_commands_work_without_a_backend() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let path = dir.path().join(CHAT_FILE);
    let mut history = ChatHistory::load(&path);
    history.push_user("Giá SJC hôm nay?", Utc::now());
    history.push_assistant("86 triệu.", Utc::now());
    history.save().unwrap();

    let cfg = goldtrack::config::Config::default();
    for args in [["goldtrack", "ai", "history"], ["goldtrack", "ai", "clear"]] {
        let matches = cli::build_cli().get_matches_from(args);
        let Some(("ai", sub)) = matches.subcommand() else {
            panic!("no ai subcommand");
        };
        ai::handle(&conn, &cfg, dir.path(), sub).unwrap();
    }
    assert!(!path.exists());

    let matches = cli::build_cli().get_matches_from(["goldtrack", "ai", "chat", "--message", "Mua không?"]);
    let Some(("ai", sub)) = matches.subcommand() else {
        panic!("no ai subcommand");
    };
    let err = ai::handle(&conn, &cfg, dir.path(), sub).unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY is not set"));
}
