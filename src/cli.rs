// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn required(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

fn range_arg() -> Arg {
    opt("range", "1D|7D|1M|3M|1Y (defaults to the default_range setting)")
}

fn market_arg() -> Arg {
    opt("market", "world|vn").default_value("world")
}

fn vn_filter(cmd: Command) -> Command {
    cmd.arg(opt("type", "Gold type code, e.g. SJC, NHAN_9999"))
        .arg(opt("brand", "SJC|DOJI|PNJ|BTMC|OTHER"))
}

pub fn build_cli() -> Command {
    Command::new("goldtrack")
        .about("Track world and Vietnamese gold prices from the terminal")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("world")
                .about("World spot gold (XAU/USD)")
                .subcommand(
                    Command::new("fetch")
                        .about("Fetch and store the current world price")
                        .arg(
                            opt("source", "investing|gold-api")
                                .value_parser(["investing", "gold-api"])
                                .default_value("investing"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show the latest world price, fetching when stale")
                        .arg(flag("offline", "Only use the stored price")),
                ))
                .subcommand(json_flags(
                    Command::new("history")
                        .about("Price history for a range, refreshed when stale")
                        .arg(range_arg())
                        .arg(flag("offline", "Only use stored history")),
                )),
        )
        .subcommand(
            Command::new("vn")
                .about("Vietnamese dealer prices")
                .subcommand(Command::new("fetch").about("Fetch SJC, DOJI and PNJ prices"))
                .subcommand(json_flags(vn_filter(
                    Command::new("list").about("Latest stored price per brand and type"),
                )))
                .subcommand(json_flags(Command::new("sjc").about("Reference SJC bar price"))),
        )
        .subcommand(
            Command::new("rate")
                .about("USD/VND exchange rate")
                .subcommand(Command::new("fetch").about("Fetch the current rate"))
                .subcommand(
                    Command::new("set")
                        .about("Record a rate by hand")
                        .arg(required("rate", "VND per USD")),
                )
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Latest rate, fetching when stale")
                        .arg(flag("offline", "Only use the stored rate")),
                )),
        )
        .subcommand(Command::new("sync").about("Fetch world, VN and rate in one pass"))
        .subcommand(json_flags(
            Command::new("compare")
                .about("Domestic premium over the converted world price")
                .arg(opt("type", "VN gold type (defaults to the SJC bar)")),
        ))
        .subcommand(json_flags(vn_filter(
            Command::new("spread").about("Dealer buy/sell spread"),
        )))
        .subcommand(
            Command::new("convert")
                .about("Price and unit conversion")
                .subcommand(
                    Command::new("world-to-vnd")
                        .about("USD/oz to VND/lượng")
                        .arg(required("price", "USD per troy ounce"))
                        .arg(opt("rate", "VND per USD (defaults to the stored rate)")),
                )
                .subcommand(
                    Command::new("vnd-to-world")
                        .about("VND/lượng to USD/oz")
                        .arg(required("price", "VND per lượng"))
                        .arg(opt("rate", "VND per USD (defaults to the stored rate)")),
                )
                .subcommand(
                    Command::new("unit")
                        .about("Convert between phân, chỉ and lượng")
                        .arg(required("qty", "Quantity"))
                        .arg(required("from", "phan|chi|luong"))
                        .arg(opt("to", "phan|chi|luong").default_value("luong"))
                        .arg(opt("price", "Sell price per lượng to value the quantity"))
                        .arg(opt("rate", "VND per USD for a USD value")),
                )
                .subcommand(
                    Command::new("profit")
                        .about("Profit or loss on gold bought at a given price")
                        .arg(required("bought", "Price paid per lượng"))
                        .arg(required("current", "Dealer buy price per lượng today"))
                        .arg(opt("qty", "Quantity in lượng").default_value("1")),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Statistics over stored history")
                .subcommand(json_flags(stats_cmd("summary", "Average, high, low and direction counts")))
                .subcommand(json_flags(
                    stats_cmd("volatility", "Rolling volatility")
                        .arg(opt("window", "Window size (defaults to the volatility_window setting)")),
                ))
                .subcommand(json_flags(stats_cmd("trend", "Moving averages and trend")))
                .subcommand(json_flags(stats_cmd("predict", "Short-term projection")))
                .subcommand(json_flags(
                    stats_cmd("averages", "Average price per period")
                        .arg(opt("period", "day|week|month").default_value("day")),
                )),
        )
        .subcommand(
            Command::new("history")
                .about("Stored history lookups")
                .subcommand(json_flags(
                    Command::new("world")
                        .about("World history between two dates")
                        .arg(required("from", "YYYY-MM-DD"))
                        .arg(required("to", "YYYY-MM-DD"))
                        .arg(flag("live", "Fetch this span from Investing.com first")),
                ))
                .subcommand(json_flags(vn_filter(
                    Command::new("vn")
                        .about("VN history between two dates")
                        .arg(required("from", "YYYY-MM-DD"))
                        .arg(required("to", "YYYY-MM-DD")),
                )))
                .subcommand(vn_filter(
                    Command::new("on")
                        .about("Last price recorded on a date (Vietnam time)")
                        .arg(required("date", "YYYY-MM-DD"))
                        .arg(market_arg()),
                ))
                .subcommand(json_flags(vn_filter(
                    Command::new("compare")
                        .about("Compare prices on two dates")
                        .arg(required("date1", "YYYY-MM-DD"))
                        .arg(required("date2", "YYYY-MM-DD"))
                        .arg(market_arg()),
                ))),
        )
        .subcommand(
            Command::new("alert")
                .about("Price alerts")
                .subcommand(
                    Command::new("add")
                        .about("Add an alert")
                        .arg(required("type", "Gold type code (XAU for the world price)"))
                        .arg(required("condition", "ABOVE|BELOW"))
                        .arg(required("target", "Target price"))
                        .arg(opt("brand", "Only match this brand")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List alerts")
                        .arg(flag("active", "Only active alerts"))
                        .arg(flag("triggered", "Only triggered alerts")),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Remove an alert")
                        .arg(Arg::new("id").required(true)),
                )
                .subcommand(
                    Command::new("toggle")
                        .about("Enable or disable an alert")
                        .arg(Arg::new("id").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("check").about("Check active alerts against stored prices"),
                )),
        )
        .subcommand(
            Command::new("ai")
                .about("AI market analysis and chat")
                .subcommand(
                    Command::new("analyze")
                        .about("Market analysis, cached for an hour")
                        .arg(flag("refresh", "Ignore the cached analysis")),
                )
                .subcommand(
                    Command::new("chat")
                        .about("Ask the assistant a question")
                        .arg(required("message", "Your question")),
                )
                .subcommand(json_flags(Command::new("history").about("Saved chat messages")))
                .subcommand(Command::new("clear").about("Delete the saved chat")),
        )
        .subcommand(
            Command::new("export")
                .about("Export stored data")
                .subcommand(
                    Command::new("world")
                        .about("World history as CSV")
                        .arg(range_arg())
                        .arg(required("out", "Output file")),
                )
                .subcommand(vn_filter(
                    Command::new("vn")
                        .about("VN prices as CSV")
                        .arg(range_arg())
                        .arg(required("out", "Output file")),
                ))
                .subcommand(
                    Command::new("stats")
                        .about("World statistics as JSON")
                        .arg(range_arg())
                        .arg(required("out", "Output file")),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Stored settings")
                .subcommand(
                    Command::new("set")
                        .about("Set a setting")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(json_flags(Command::new("list").about("List settings"))),
        )
        .subcommand(Command::new("doctor").about("Check configuration and stored data"))
}

fn stats_cmd(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(range_arg())
        .arg(opt("market", "world|vn").default_value("world"))
        .arg(opt("type", "VN gold type for --market vn").default_value("SJC"))
        .arg(opt("brand", "VN brand for --market vn"))
        .arg(flag("live", "Refresh world history first when it is older than ten minutes"))
}
