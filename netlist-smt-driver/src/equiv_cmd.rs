// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use netlist_smt::equiv::prove_equiv::{prove_netlist_equiv, EquivError, EquivResult, WireValue};
use netlist_smt::equiv::varisat_backend::{VarisatConfig, VarisatSolver};
use netlist_smt::netlist_json::load_netlist_json;
use netlist_smt::value_utils::bits_to_string;
use netlist_smt::{EncoderConfig, Net};

#[cfg(feature = "has-easy-smt")]
use netlist_smt::equiv::easy_smt_backend::{EasySmtConfig, EasySmtSolver};

use crate::driver_config::{get_encoder_config, DriverConfig};
use crate::report_cli_error::report_cli_error_and_exit;
use crate::solver_choice::SolverChoice;

const SUBCOMMAND: &str = "equiv";

#[cfg(feature = "has-easy-smt")]
fn run_easy_smt(
    base: EasySmtConfig,
    config: &DriverConfig,
    lhs: &[Net],
    rhs: &[Net],
    encoder_config: &EncoderConfig,
) -> Result<EquivResult, EquivError> {
    let solver_config = match &config.solver.replay_file {
        Some(path) => base.with_replay_file(path.clone()),
        None => base,
    };
    prove_netlist_equiv::<EasySmtSolver>(&solver_config, lhs, rhs, encoder_config)
}

fn run_equiv(
    choice: SolverChoice,
    config: &DriverConfig,
    lhs: &[Net],
    rhs: &[Net],
    encoder_config: &EncoderConfig,
) -> Result<EquivResult, EquivError> {
    log::info!("checking equivalence with solver {}", choice);
    match choice {
        SolverChoice::Varisat => {
            if let Some(path) = &config.solver.replay_file {
                log::warn!(
                    "[solver] replay_file {} is ignored by the varisat backend",
                    path.display()
                );
            }
            prove_netlist_equiv::<VarisatSolver>(&VarisatConfig, lhs, rhs, encoder_config)
        }
        #[cfg(feature = "has-easy-smt")]
        SolverChoice::Z3Binary => run_easy_smt(EasySmtConfig::z3(), config, lhs, rhs, encoder_config),
        #[cfg(feature = "has-easy-smt")]
        SolverChoice::BitwuzlaBinary => {
            run_easy_smt(EasySmtConfig::bitwuzla(), config, lhs, rhs, encoder_config)
        }
        #[cfg(feature = "has-easy-smt")]
        SolverChoice::BoolectorBinary => {
            run_easy_smt(EasySmtConfig::boolector(), config, lhs, rhs, encoder_config)
        }
    }
}

fn values_to_json(values: &[WireValue]) -> serde_json::Value {
    values
        .iter()
        .map(|v| (v.name.clone(), serde_json::Value::from(bits_to_string(&v.value))))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn result_to_json(result: &EquivResult) -> serde_json::Value {
    match result {
        EquivResult::Proved => serde_json::json!({ "equivalent": true }),
        EquivResult::Disproved {
            inputs,
            lhs_outputs,
            rhs_outputs,
        } => serde_json::json!({
            "equivalent": false,
            "counterexample": {
                "inputs": values_to_json(inputs),
                "lhs_outputs": values_to_json(lhs_outputs),
                "rhs_outputs": values_to_json(rhs_outputs),
            },
        }),
    }
}

fn load(path: &str) -> Vec<Net> {
    load_netlist_json(Path::new(path)).unwrap_or_else(|e| {
        report_cli_error_and_exit(&e.to_string(), Some(SUBCOMMAND), vec![("netlist", path)])
    })
}

pub fn handle_equiv(matches: &clap::ArgMatches, config: &DriverConfig) {
    log::info!("handle_equiv");
    let lhs_path = matches.get_one::<String>("lhs_netlist").unwrap();
    let rhs_path = matches.get_one::<String>("rhs_netlist").unwrap();
    let choice = match matches.get_one::<String>("solver") {
        Some(s) => s.parse::<SolverChoice>().unwrap_or_else(|e| {
            report_cli_error_and_exit(&e, Some(SUBCOMMAND), vec![])
        }),
        None => config.solver.backend.unwrap_or_default(),
    };
    let json = matches
        .get_one::<String>("json")
        .map(|s| s == "true")
        .unwrap_or(false);

    let lhs = load(lhs_path);
    let rhs = load(rhs_path);
    let encoder_config = get_encoder_config(matches, config);
    if let Some(prefix) = &encoder_config.name_prefix {
        log::warn!(
            "[encoder] name_prefix {:?} is replaced by lhs/rhs when checking equivalence",
            prefix
        );
    }

    let result = run_equiv(choice, config, &lhs, &rhs, &encoder_config).unwrap_or_else(|e| {
        report_cli_error_and_exit(
            &e.to_string(),
            Some(SUBCOMMAND),
            vec![("lhs", lhs_path.as_str()), ("rhs", rhs_path.as_str())],
        )
    });

    if json {
        println!("{}", result_to_json(&result));
    }
    match result {
        EquivResult::Proved => {
            if !json {
                println!("success: {} and {} are equivalent", lhs_path, rhs_path);
            }
        }
        EquivResult::Disproved {
            inputs,
            lhs_outputs,
            rhs_outputs,
        } => {
            if !json {
                println!("counterexample:");
                for input in &inputs {
                    println!("  input  {}", input);
                }
                for (l, r) in lhs_outputs.iter().zip(rhs_outputs.iter()) {
                    println!(
                        "  output {}: lhs {} rhs {}",
                        l.name,
                        bits_to_string(&l.value),
                        bits_to_string(&r.value)
                    );
                }
            }
            report_cli_error_and_exit(
                "netlists are not equivalent",
                Some(SUBCOMMAND),
                vec![("lhs", lhs_path.as_str()), ("rhs", rhs_path.as_str())],
            );
        }
    }
}
