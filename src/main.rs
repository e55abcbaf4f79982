// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use goldtrack::config::Config;
use goldtrack::{cli, commands, db, logging, repo, utils};

fn main() -> Result<()> {
    logging::init(&logging::filter_from_env());
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = Config::from_env();
    let dir = db::data_dir(cfg.data_dir.as_deref())?;
    let conn = db::open_or_init(&dir)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path(&dir).display());
            let rows = repo::table_counts(&conn)?
                .into_iter()
                .map(|(table, n)| vec![table.to_string(), n.to_string()])
                .collect();
            println!("{}", utils::pretty_table(&["Table", "Rows"], rows));
        }
        Some(("world", sub)) => commands::world::handle(&conn, sub)?,
        Some(("vn", sub)) => commands::vn::handle(&conn, &cfg, sub)?,
        Some(("rate", sub)) => commands::rate::handle(&conn, sub)?,
        Some(("sync", _)) => commands::sync::handle(&conn, &cfg, &dir)?,
        Some(("compare", sub)) => commands::market::handle_compare(&conn, sub)?,
        Some(("spread", sub)) => commands::market::handle_spread(&conn, sub)?,
        Some(("convert", sub)) => commands::convert::handle(&conn, sub)?,
        Some(("stats", sub)) => commands::stats::handle(&conn, sub)?,
        Some(("history", sub)) => commands::history::handle(&conn, sub)?,
        Some(("alert", sub)) => commands::alerts::handle(&conn, &dir, sub)?,
        Some(("ai", sub)) => commands::ai::handle(&conn, &cfg, &dir, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn, &cfg, &dir)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
