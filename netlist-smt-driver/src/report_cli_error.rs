// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let subcommand_str = match subcommand {
        Some(subcommand) => format!("{}: ", subcommand),
        None => String::new(),
    };
    eprintln!(
        "netlist-smt-driver: {}{}",
        subcommand_str,
        message.red().bold()
    );
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}
