// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use netlist_smt::equiv::solver_interface::Solver;
use netlist_smt::equiv::varisat_backend::{VarisatConfig, VarisatSolver};
use netlist_smt::netlist_json::load_netlist_json;
use netlist_smt::{encode_netlist, Net};

use crate::driver_config::{get_encoder_config, DriverConfig};
use crate::report_cli_error::report_cli_error_and_exit;

const SUBCOMMAND: &str = "encode";

/// Renders `nets` as a complete SMT-LIB2 script ending in `(check-sat)`.
fn netlist_to_smtlib(
    nets: &[Net],
    encoder_config: &netlist_smt::EncoderConfig,
) -> Result<String, String> {
    let mut solver = VarisatSolver::new(&VarisatConfig).map_err(|e| e.to_string())?;
    let encoding = encode_netlist(&mut solver, nets, encoder_config).map_err(|e| e.to_string())?;
    let mut script = encoding.to_smtlib(&mut solver);
    script.push_str("(check-sat)\n");
    Ok(script)
}

pub fn handle_encode(matches: &clap::ArgMatches, config: &DriverConfig) {
    log::info!("handle_encode");
    let netlist = matches.get_one::<String>("netlist").unwrap();
    let nets = load_netlist_json(Path::new(netlist)).unwrap_or_else(|e| {
        report_cli_error_and_exit(&e.to_string(), Some(SUBCOMMAND), vec![("netlist", netlist.as_str())])
    });
    let encoder_config = get_encoder_config(matches, config);
    let script = netlist_to_smtlib(&nets, &encoder_config).unwrap_or_else(|e| {
        report_cli_error_and_exit(
            "cannot construct a verification query for this netlist",
            Some(SUBCOMMAND),
            vec![("netlist", netlist.as_str()), ("error", e.as_str())],
        )
    });

    match matches.get_one::<String>("output") {
        Some(output) => {
            if let Err(e) = std::fs::write(output, &script) {
                report_cli_error_and_exit(
                    "could not write output",
                    Some(SUBCOMMAND),
                    vec![("output", output.as_str()), ("error", e.to_string().as_str())],
                );
            }
            log::info!("wrote {} bytes to {}", script.len(), output);
        }
        None => print!("{}", script),
    }
}
