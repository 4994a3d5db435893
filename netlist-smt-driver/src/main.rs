// SPDX-License-Identifier: Apache-2.0

//! Command line driver for netlist encoding and equivalence checking.
//!
//! Commands are given like:
//!
//! ```text
//! netlist-smt-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - encode: Renders a JSON netlist as an SMT-LIB2 bit-vector script.
//! - equiv: Checks two JSON netlists for combinational equivalence.
//! - version: Prints the driver version.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- encode adder.json --output adder.smt2
//! $ cargo run -- --config netlist-smt.toml equiv lhs.json rhs.json --solver varisat
//! ```

mod driver_config;
mod encode_cmd;
mod equiv_cmd;
mod report_cli_error;
mod solver_choice;

use clap::{Arg, ArgAction};
use report_cli_error::report_cli_error_and_exit;

use crate::driver_config::{find_config_path, parse_driver_config, DriverConfig};
use crate::solver_choice::SolverChoice;

trait AppExt {
    fn add_width_conflict_arg(self) -> Self;
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self;
}

impl AppExt for clap::Command {
    fn add_width_conflict_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("width_conflict")
                .long("width_conflict")
                .value_name("POLICY")
                .help("How to treat a wire redeclared with a different width")
                .value_parser(["error", "first-wins"])
                .action(ArgAction::Set),
        )
    }

    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(long)
                .long(long)
                .value_name("BOOL")
                .action(ArgAction::Set)
                .value_parser(["true", "false"])
                .num_args(1)
                .help(help),
        )
    }
}

fn load_config(explicit: Option<&str>) -> DriverConfig {
    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        report_cli_error_and_exit(
            "cannot determine working directory",
            None,
            vec![("error", e.to_string().as_str())],
        )
    });
    let path = match find_config_path(explicit, &cwd) {
        Some(path) => path,
        None => return DriverConfig::default(),
    };
    let path_str = path.display().to_string();
    if !path.exists() {
        report_cli_error_and_exit(
            "config toml file does not exist",
            None,
            vec![
                ("path", path_str.as_str()),
                ("working directory", cwd.display().to_string().as_str()),
            ],
        );
    }
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        report_cli_error_and_exit(
            "could not read config toml file",
            None,
            vec![("path", path_str.as_str()), ("error", e.to_string().as_str())],
        )
    });
    parse_driver_config(&text).unwrap_or_else(|e| {
        report_cli_error_and_exit(
            "could not parse config toml file",
            None,
            vec![("path", path_str.as_str()), ("error", e.as_str())],
        )
    })
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "netlist-smt-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("netlist-smt-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encodes netlists as SMT bit-vector constraints and checks their equivalence")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to a netlist-smt.toml file")
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("encode")
                .about("Renders a JSON netlist as an SMT-LIB2 script")
                .arg(
                    Arg::new("netlist")
                        .help("The JSON netlist file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("PATH")
                        .help("Write the script here instead of stdout")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("name_prefix")
                        .long("name_prefix")
                        .value_name("PREFIX")
                        .help("Prefix for every declared SMT symbol")
                        .action(ArgAction::Set),
                )
                .add_width_conflict_arg(),
        )
        .subcommand(
            clap::Command::new("equiv")
                .about("Checks two JSON netlists for combinational equivalence")
                .arg(
                    Arg::new("lhs_netlist")
                        .help("The left-hand side JSON netlist")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("rhs_netlist")
                        .help("The right-hand side JSON netlist")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("solver")
                        .long("solver")
                        .value_name("SOLVER")
                        .help("Solver backend to use")
                        .value_parser(
                            SolverChoice::all()
                                .iter()
                                .map(|c| c.as_str())
                                .collect::<Vec<_>>(),
                        )
                        .action(ArgAction::Set),
                )
                .add_bool_arg("json", "Print the verdict as a JSON object")
                .add_width_conflict_arg(),
        )
        .get_matches();

    let config = load_config(matches.get_one::<String>("config").map(|s| s.as_str()));

    if let Some(matches) = matches.subcommand_matches("encode") {
        encode_cmd::handle_encode(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("equiv") {
        equiv_cmd::handle_equiv(matches, &config);
    } else if let Some(_matches) = matches.subcommand_matches("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
    } else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    }
}
