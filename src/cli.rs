// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

const COUNT_EDIT_HELP: &str = "Whole number, or 'none' to mark as not tracked";

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn currency_arg() -> Arg {
    Arg::new("currency")
        .long("currency")
        .help("Display currency (IDR|USD); defaults to the saved display currency")
}

fn range_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").help("Start date YYYY-MM-DD (inclusive)"))
        .arg(Arg::new("to").long("to").help("End date YYYY-MM-DD (inclusive)"))
}

fn client_cmd() -> Command {
    Command::new("client")
        .about("Manage clients")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Register a client and issue its public access token")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("phone").long("phone"))
                .arg(Arg::new("company").long("company"))
                .arg(
                    Arg::new("inactive")
                        .long("inactive")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(json_flags(Command::new("list").about("List clients")))
        .subcommand(
            Command::new("update")
                .about("Edit a client")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("email").long("email"))
                .arg(Arg::new("phone").long("phone"))
                .arg(Arg::new("company").long("company"))
                .arg(
                    Arg::new("active")
                        .long("active")
                        .value_parser(value_parser!(bool)),
                ),
        )
        .subcommand(
            Command::new("rm").about("Delete a client without records").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Budget ledger entries")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a topup, bonus or adjustment")
                .arg(
                    Arg::new("client")
                        .long("client")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("date").long("date").required(true))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .default_value("topup")
                        .value_parser(["topup", "bonus", "adj"]),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List budget entries")
                .arg(
                    Arg::new("client")
                        .long("client")
                        .help("Client id or 'all'"),
                )
                .arg(currency_arg()),
        ))
        .subcommand(
            Command::new("update")
                .about("Edit a budget entry")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("date").long("date"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["topup", "bonus", "adj"]),
                )
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(
            Command::new("rm").about("Delete a budget entry").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
        .subcommand(json_flags(
            Command::new("summary")
                .about("Topup, spend and remaining balance for a client")
                .arg(
                    Arg::new("client")
                        .long("client")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(currency_arg()),
        ))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Daily ad performance reports")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Log one day of ad performance")
                .arg(
                    Arg::new("client")
                        .long("client")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("date").long("date").required(true))
                .arg(Arg::new("account").long("account").required(true))
                .arg(Arg::new("spend").long("spend").required(true))
                .arg(Arg::new("clicks").long("clicks"))
                .arg(Arg::new("impressions").long("impressions"))
                .arg(Arg::new("conversions").long("conversions")),
        )
        .subcommand(json_flags(range_args(
            Command::new("list")
                .about("List reports")
                .arg(Arg::new("client").long("client").help("Client id or 'all'"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        )))
        .subcommand(
            Command::new("update")
                .about("Edit a report")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("spend").long("spend"))
                .arg(Arg::new("clicks").long("clicks").help(COUNT_EDIT_HELP))
                .arg(Arg::new("impressions").long("impressions").help(COUNT_EDIT_HELP))
                .arg(Arg::new("conversions").long("conversions").help(COUNT_EDIT_HELP)),
        )
        .subcommand(
            Command::new("rm").about("Delete a report").arg(
                Arg::new("id")
                    .long("id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
        .subcommand(json_flags(range_args(
            Command::new("aggregate")
                .about("Totals, CPC, CTR and CPA over a range")
                .arg(Arg::new("client").long("client").help("Client id or 'all'"))
                .arg(currency_arg()),
        )))
}

fn fx_cmd() -> Command {
    Command::new("fx")
        .about("Display currency and exchange rates")
        .subcommand_required(true)
        .subcommand(
            Command::new("rate")
                .about("Show the exchange rate for a pair")
                .arg(Arg::new("from").long("from").required(true))
                .arg(Arg::new("to").long("to").required(true)),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert an amount")
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("from").long("from").required(true))
                .arg(Arg::new("to").long("to").required(true)),
        )
        .subcommand(
            Command::new("format")
                .about("Format an amount in a currency")
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("currency").long("currency").required(true))
                .arg(
                    Arg::new("compact")
                        .long("compact")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("preload").about("Warm rates for every supported pair"))
        .subcommand(
            Command::new("set-display")
                .about("Save the preferred display currency")
                .arg(Arg::new("currency").required(true)),
        )
        .subcommand(Command::new("currencies").about("List supported currencies"))
}

pub fn build_cli() -> Command {
    Command::new("adledger")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Agency ad-budget ledger, performance reports and analytics")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(client_cmd())
        .subcommand(budget_cmd())
        .subcommand(report_cmd())
        .subcommand(
            Command::new("import")
                .about("Bulk-load records")
                .subcommand_required(true)
                .subcommand(
                    Command::new("reports")
                        .about("Import ad reports from CSV")
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export records")
                .subcommand_required(true)
                .subcommand(
                    Command::new("reports")
                        .about("Export ad reports")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(Arg::new("out").long("out").required(true))
                        .arg(Arg::new("client").long("client").help("Client id or 'all'")),
                ),
        )
        .subcommand(json_flags(
            Command::new("analytics")
                .about("Cross-client analytics for a lookback window")
                .arg(
                    Arg::new("client")
                        .long("client")
                        .default_value("all")
                        .help("Client id or 'all'"),
                )
                .arg(
                    Arg::new("days")
                        .long("days")
                        .value_parser(value_parser!(u32))
                        .help("Lookback window in days (default 30)"),
                )
                .arg(currency_arg()),
        ))
        .subcommand(json_flags(
            Command::new("dashboard")
                .about("Agency-wide totals and recent budget activity")
                .arg(currency_arg()),
        ))
        .subcommand(json_flags(range_args(
            Command::new("view")
                .about("Public client view by access token")
                .arg(Arg::new("token").long("token").required(true))
                .arg(currency_arg()),
        )))
        .subcommand(fx_cmd())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
