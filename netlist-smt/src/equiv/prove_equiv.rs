// SPDX-License-Identifier: Apache-2.0

//! Combinational equivalence of two netlists.
//!
//! Both netlists are encoded into one solver under the prefixes `lhs` and
//! `rhs`. Primary inputs with the same name are tied together and the solver
//! is asked for an assignment under which some pair of same-named primary
//! outputs differs. Unsat means the netlists are equivalent.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::EncoderConfig;
use crate::encode::{encode_netlist, EncodeError, Encoding};
use crate::equiv::solver_interface::{BitVec, Response, Solver};
use crate::netlist::{primary_inputs, primary_outputs, Net, Wire};
use crate::value_utils::{bits_to_string, Bits};

#[derive(Debug, PartialEq, Clone)]
pub struct WireValue {
    pub name: String,
    pub value: Bits,
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, bits_to_string(&self.value))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum EquivResult {
    Proved,
    Disproved {
        inputs: Vec<WireValue>,
        lhs_outputs: Vec<WireValue>,
        rhs_outputs: Vec<WireValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivError {
    Encode { side: &'static str, error: EncodeError },
    InterfaceMismatch(String),
    Unknown,
    Solver(String),
}

impl fmt::Display for EquivError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquivError::Encode { side, error } => {
                write!(f, "cannot encode {} netlist: {}", side, error)
            }
            EquivError::InterfaceMismatch(msg) => write!(f, "interface mismatch: {}", msg),
            EquivError::Unknown => write!(f, "solver returned unknown"),
            EquivError::Solver(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

impl std::error::Error for EquivError {}

impl From<std::io::Error> for EquivError {
    fn from(e: std::io::Error) -> Self {
        EquivError::Solver(e.to_string())
    }
}

fn interface(wires: &[Wire]) -> BTreeMap<&str, usize> {
    wires
        .iter()
        .map(|w| (w.name.as_str(), w.bitwidth))
        .collect()
}

fn check_interface(kind: &str, lhs: &[Wire], rhs: &[Wire]) -> Result<(), EquivError> {
    let lhs_map = interface(lhs);
    let rhs_map = interface(rhs);
    if lhs_map == rhs_map {
        return Ok(());
    }
    let describe = |m: &BTreeMap<&str, usize>| {
        m.iter()
            .map(|(name, width)| format!("{}[{}]", name, width))
            .collect::<Vec<_>>()
            .join(", ")
    };
    Err(EquivError::InterfaceMismatch(format!(
        "{}: lhs has {{{}}}, rhs has {{{}}}",
        kind,
        describe(&lhs_map),
        describe(&rhs_map)
    )))
}

fn var_of<'e, T>(encoding: &'e Encoding<T>, name: &str) -> Result<&'e BitVec<T>, EquivError> {
    encoding
        .wire_map
        .get(name)
        .ok_or_else(|| EquivError::Solver(format!("wire `{}` was not allocated", name)))
}

fn read_values<S: Solver>(
    solver: &mut S,
    encoding: &Encoding<S::Term>,
    wires: &[Wire],
) -> Result<Vec<WireValue>, EquivError> {
    wires
        .iter()
        .map(|w| -> Result<WireValue, EquivError> {
            let var = var_of(encoding, &w.name)?;
            Ok(WireValue {
                name: w.name.clone(),
                value: solver.get_value(var)?,
            })
        })
        .collect()
}

/// Checks whether `lhs` and `rhs` compute the same primary outputs for every
/// assignment of their primary inputs.
///
/// Both netlists must expose the same primary input and output names with
/// matching widths. `encoder_config` applies to both sides; its
/// `name_prefix` is replaced by the per-side prefix.
pub fn prove_netlist_equiv<S: Solver>(
    solver_config: &S::Config,
    lhs: &[Net],
    rhs: &[Net],
    encoder_config: &EncoderConfig,
) -> Result<EquivResult, EquivError> {
    let inputs = primary_inputs(lhs);
    let outputs = primary_outputs(lhs);
    check_interface("primary inputs", &inputs, &primary_inputs(rhs))?;
    check_interface("primary outputs", &outputs, &primary_outputs(rhs))?;
    log::info!(
        "checking equivalence over {} inputs and {} outputs",
        inputs.len(),
        outputs.len()
    );
    let mut solver = S::new(solver_config)?;
    let lhs_enc = encode_netlist(
        &mut solver,
        lhs,
        &encoder_config.clone().with_name_prefix("lhs"),
    )
    .map_err(|error| EquivError::Encode { side: "lhs", error })?;
    let rhs_enc = encode_netlist(
        &mut solver,
        rhs,
        &encoder_config.clone().with_name_prefix("rhs"),
    )
    .map_err(|error| EquivError::Encode { side: "rhs", error })?;
    lhs_enc
        .assert_all(&mut solver)
        .map_err(|error| EquivError::Encode { side: "lhs", error })?;
    rhs_enc
        .assert_all(&mut solver)
        .map_err(|error| EquivError::Encode { side: "rhs", error })?;
    if outputs.is_empty() {
        return Ok(EquivResult::Proved);
    }

    for input in &inputs {
        let l = var_of(&lhs_enc, &input.name)?;
        let r = var_of(&rhs_enc, &input.name)?;
        let tie = solver.eq(l, r);
        solver.assert(&tie)?;
    }

    let mut diffs = Vec::with_capacity(outputs.len());
    for output in &outputs {
        let l = var_of(&lhs_enc, &output.name)?;
        let r = var_of(&rhs_enc, &output.name)?;
        diffs.push(solver.ne(l, r));
    }
    let any_diff = solver.or_many(diffs.iter().collect());
    solver.assert(&any_diff)?;

    match solver.check()? {
        Response::Unsat => {
            log::info!("netlists are equivalent");
            Ok(EquivResult::Proved)
        }
        Response::Sat => {
            let input_values = read_values(&mut solver, &lhs_enc, &inputs)?;
            let lhs_outputs = read_values(&mut solver, &lhs_enc, &outputs)?;
            let rhs_outputs = read_values(&mut solver, &rhs_enc, &outputs)?;
            log::info!("netlists differ; counterexample found");
            Ok(EquivResult::Disproved {
                inputs: input_values,
                lhs_outputs,
                rhs_outputs,
            })
        }
        Response::Unknown => Err(EquivError::Unknown),
    }
}
