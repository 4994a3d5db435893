// SPDX-License-Identifier: Apache-2.0

//! Constraint generation: one bit-vector equality per net.
//!
//! [`encode_netlist`] runs the two passes in order. Variable allocation
//! ([`crate::wire_map::allocate_wires`]) declares a variable per wire, then
//! [`generate_constraints`] walks the nets again and builds, for each one, the
//! equality `result == expr` where `result` is the destination variable and
//! `expr` is the operation applied to the argument variables.
//!
//! Widths are checked per operation before any term is built, so a malformed
//! netlist surfaces as an [`EncodeError`] naming the net rather than as a
//! solver-side sort error.

use std::fmt;
use std::io;

use crate::config::EncoderConfig;
use crate::equiv::solver_interface::{BitVec, Solver};
use crate::netlist::{Net, NetOp, NetOpKind, Wire};
use crate::value_utils::{bits_to_hex, bits_to_smt_literal, significant_bits, Bits};
use crate::wire_map::{allocate_wires, WireMap, WireVar};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    WidthRedeclared {
        wire: String,
        first: usize,
        second: usize,
    },
    ZeroWidthWire {
        wire: String,
    },
    /// The wire's solver symbol contains `|` or `\`.
    UnrepresentableSymbol {
        wire: String,
        symbol: String,
    },
    /// Two wires render to the same SMT-LIB symbol.
    SymbolCollision {
        wire: String,
        other: String,
        symbol: String,
    },
    UnallocatedWire {
        net_index: usize,
        wire: String,
    },
    EmptyOperands {
        net_index: usize,
        op: NetOpKind,
    },
    WidthMismatch {
        net_index: usize,
        op: NetOpKind,
        wire: String,
        expected: usize,
        actual: usize,
    },
    InvalidSelectRange {
        net_index: usize,
        start: usize,
        end: usize,
        arg_width: usize,
    },
    ConstantTooWide {
        net_index: usize,
        value: Bits,
        width: usize,
    },
    Solver(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::WidthRedeclared {
                wire,
                first,
                second,
            } => write!(
                f,
                "wire `{}` redeclared with width {} (first declared with width {})",
                wire, second, first
            ),
            EncodeError::ZeroWidthWire { wire } => write!(f, "wire `{}` has zero width", wire),
            EncodeError::UnrepresentableSymbol { wire, symbol } => write!(
                f,
                "wire `{}`: symbol {:?} cannot be written in SMT-LIB (contains `|` or `\\`)",
                wire, symbol
            ),
            EncodeError::SymbolCollision {
                wire,
                other,
                symbol,
            } => write!(
                f,
                "wires `{}` and `{}` both render to SMT-LIB symbol {}",
                other, wire, symbol
            ),
            EncodeError::UnallocatedWire { net_index, wire } => write!(
                f,
                "net {}: wire `{}` has no allocated variable",
                net_index, wire
            ),
            EncodeError::EmptyOperands { net_index, op } => write!(
                f,
                "net {} ({}): at least one operand is required",
                net_index, op
            ),
            EncodeError::WidthMismatch {
                net_index,
                op,
                wire,
                expected,
                actual,
            } => write!(
                f,
                "net {} ({}): wire `{}` has width {}, expected {}",
                net_index, op, wire, actual, expected
            ),
            EncodeError::InvalidSelectRange {
                net_index,
                start,
                end,
                arg_width,
            } => write!(
                f,
                "net {} (select): bit range [{}, {}] is invalid for an operand of width {}",
                net_index, start, end, arg_width
            ),
            EncodeError::ConstantTooWide {
                net_index,
                value,
                width,
            } => write!(
                f,
                "net {} (const): value {} does not fit in {} bits",
                net_index,
                bits_to_hex(value),
                width
            ),
            EncodeError::Solver(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<io::Error> for EncodeError {
    fn from(e: io::Error) -> Self {
        EncodeError::Solver(e.to_string())
    }
}

/// `result == expr` for the net at `net_index`.
#[derive(Debug, Clone)]
pub struct Constraint<T> {
    pub net_index: usize,
    pub kind: NetOpKind,
    pub result: BitVec<T>,
    pub expr: BitVec<T>,
}

impl<T: Clone> Constraint<T> {
    /// Builds the 1-bit equality term, ready for [`Solver::assert`].
    pub fn to_term<S: Solver<Term = T>>(&self, solver: &mut S) -> BitVec<T> {
        solver.eq(&self.result, &self.expr)
    }

    pub fn render<S: Solver<Term = T>>(&self, solver: &mut S) -> String {
        format!(
            "(= {} {})",
            solver.render(&self.result),
            solver.render(&self.expr)
        )
    }
}

/// Output of one encoding run.
#[derive(Debug, Clone)]
pub struct Encoding<T> {
    pub wire_map: WireMap<T>,
    pub constraints: Vec<Constraint<T>>,
}

impl<T: Clone> Encoding<T> {
    pub fn assert_all<S: Solver<Term = T>>(&self, solver: &mut S) -> Result<(), EncodeError> {
        for constraint in &self.constraints {
            let term = constraint.to_term(solver);
            solver.assert(&term)?;
        }
        Ok(())
    }

    /// Renders declarations and assertions as an SMT-LIB2 script body.
    pub fn to_smtlib<S: Solver<Term = T>>(&self, solver: &mut S) -> String {
        let mut out = String::from("(set-logic QF_BV)\n");
        for entry in self.wire_map.iter() {
            out.push_str(&format!(
                "(declare-const {} (_ BitVec {}))\n",
                solver.render(&entry.var),
                entry.width
            ));
        }
        for constraint in &self.constraints {
            out.push_str(&format!("(assert {})\n", constraint.render(solver)));
        }
        out
    }

    /// Model value of the wire called `name`, after a `Sat` check.
    pub fn value_of<S: Solver<Term = T>>(
        &self,
        solver: &mut S,
        name: &str,
    ) -> io::Result<Option<Bits>> {
        match self.wire_map.get(name) {
            Some(var) => solver.get_value(var).map(Some),
            None => Ok(None),
        }
    }
}

fn lookup<'a, T>(
    wire_map: &'a WireMap<T>,
    net_index: usize,
    wire: &Wire,
) -> Result<&'a WireVar<T>, EncodeError> {
    wire_map
        .entry(&wire.name)
        .ok_or_else(|| EncodeError::UnallocatedWire {
            net_index,
            wire: wire.name.clone(),
        })
}

fn expect_width<T>(
    net_index: usize,
    op: NetOpKind,
    entry: &WireVar<T>,
    expected: usize,
) -> Result<(), EncodeError> {
    if entry.width != expected {
        return Err(EncodeError::WidthMismatch {
            net_index,
            op,
            wire: entry.name.clone(),
            expected,
            actual: entry.width,
        });
    }
    Ok(())
}

fn lookup_operands<'a, T>(
    wire_map: &'a WireMap<T>,
    net_index: usize,
    op: NetOpKind,
    args: &[Wire],
) -> Result<Vec<&'a WireVar<T>>, EncodeError> {
    if args.is_empty() {
        return Err(EncodeError::EmptyOperands { net_index, op });
    }
    args.iter()
        .map(|arg| lookup(wire_map, net_index, arg))
        .collect()
}

fn net_expr<S: Solver>(
    solver: &mut S,
    wire_map: &WireMap<S::Term>,
    net_index: usize,
    net: &Net,
    result: &WireVar<S::Term>,
) -> Result<BitVec<S::Term>, EncodeError> {
    let kind = net.kind();
    let expr = match &net.op {
        NetOp::Wire { arg } | NetOp::Register { arg } => {
            let arg = lookup(wire_map, net_index, arg)?;
            expect_width(net_index, kind, arg, result.width)?;
            arg.var.clone()
        }
        NetOp::Not { arg } => {
            let arg = lookup(wire_map, net_index, arg)?;
            expect_width(net_index, kind, arg, result.width)?;
            solver.not(&arg.var)
        }
        NetOp::And { args } | NetOp::Or { args } | NetOp::Xor { args } => {
            let operands = lookup_operands(wire_map, net_index, kind, args)?;
            for operand in &operands {
                expect_width(net_index, kind, operand, result.width)?;
            }
            let vars: Vec<&BitVec<S::Term>> = operands.iter().map(|e| &e.var).collect();
            match kind {
                NetOpKind::And => solver.and_many(vars),
                NetOpKind::Or => solver.or_many(vars),
                _ => solver.xor_many(vars),
            }
        }
        NetOp::Concat { args } => {
            let operands = lookup_operands(wire_map, net_index, kind, args)?;
            let total: usize = operands.iter().map(|e| e.width).sum();
            expect_width(net_index, kind, result, total)?;
            solver.concat_many(operands.iter().map(|e| &e.var).collect())
        }
        NetOp::Select { arg, start, end } => {
            let arg = lookup(wire_map, net_index, arg)?;
            if start > end || *end >= arg.width {
                return Err(EncodeError::InvalidSelectRange {
                    net_index,
                    start: *start,
                    end: *end,
                    arg_width: arg.width,
                });
            }
            expect_width(net_index, kind, result, end - start + 1)?;
            solver.extract(&arg.var, *end as i32, *start as i32)
        }
        NetOp::Const { value } => {
            if significant_bits(value) > result.width {
                return Err(EncodeError::ConstantTooWide {
                    net_index,
                    value: value.clone(),
                    width: result.width,
                });
            }
            let mut bits = value.clone();
            bits.resize(result.width, false);
            solver.from_raw_str(result.width, &bits_to_smt_literal(&bits))
        }
    };
    Ok(expr)
}

/// Builds one constraint per net, in net order, over variables already in
/// `wire_map`.
pub fn generate_constraints<S: Solver>(
    solver: &mut S,
    nets: &[Net],
    wire_map: &WireMap<S::Term>,
) -> Result<Vec<Constraint<S::Term>>, EncodeError> {
    let mut constraints = Vec::with_capacity(nets.len());
    for (net_index, net) in nets.iter().enumerate() {
        let result = lookup(wire_map, net_index, &net.dest)?;
        let expr = net_expr(solver, wire_map, net_index, net, result)?;
        let constraint = Constraint {
            net_index,
            kind: net.kind(),
            result: result.var.clone(),
            expr,
        };
        log::debug!("net {}: {}", net_index, net);
        constraints.push(constraint);
    }
    Ok(constraints)
}

/// Allocates variables for `nets` in `solver` and generates their constraints.
///
/// Nothing is asserted; see [`Encoding::assert_all`].
pub fn encode_netlist<S: Solver>(
    solver: &mut S,
    nets: &[Net],
    config: &EncoderConfig,
) -> Result<Encoding<S::Term>, EncodeError> {
    let wire_map = allocate_wires(solver, nets, config)?;
    log::info!("allocated {} wire variables", wire_map.len());
    let constraints = generate_constraints(solver, nets, &wire_map)?;
    log::info!("generated {} constraints", constraints.len());
    Ok(Encoding {
        wire_map,
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equiv::varisat_backend::{VarisatConfig, VarisatSolver};
    use crate::value_utils::{bits_from_u128, bits_from_u128_trimmed};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn solver() -> VarisatSolver {
        VarisatSolver::new(&VarisatConfig).unwrap()
    }

    fn encode(nets: &[Net]) -> Result<Encoding<<VarisatSolver as Solver>::Term>, EncodeError> {
        let mut solver = solver();
        encode_netlist(&mut solver, nets, &EncoderConfig::default())
    }

    #[test]
    fn test_constraint_rendering_per_op() {
        let _ = env_logger::builder().is_test(true).try_init();
        let nets = vec![
            Net::and(vec![Wire::new("a", 4), Wire::new("b", 4)], Wire::new("c", 4)),
            Net::or(
                vec![Wire::new("a", 4), Wire::new("b", 4), Wire::new("c", 4)],
                Wire::new("d", 4),
            ),
            Net::not(Wire::new("d", 4), Wire::new("e", 4)),
            Net::concat(vec![Wire::new("e", 4), Wire::new("a", 4)], Wire::new("f", 8)),
            Net::select(Wire::new("f", 8), 2, 5, Wire::new("g", 4)),
            Net::constant(7, Wire::new("h", 4)),
            Net::register(Wire::new("g", 4), Wire::new("q", 4)),
        ];
        let mut solver = solver();
        let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
        let rendered: Vec<String> = encoding
            .constraints
            .iter()
            .map(|c| c.render(&mut solver))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "(= c (bvand a b))",
                "(= d (bvor (bvor a b) c))",
                "(= e (bvnot d))",
                "(= f (concat e a))",
                "(= g ((_ extract 5 2) f))",
                "(= h #b0111)",
                "(= q g)",
            ]
        );
    }

    #[test]
    fn test_to_smtlib_script() {
        let nets = vec![Net::xor(
            vec![Wire::new("a", 2), Wire::new("b", 2)],
            Wire::new("c", 2),
        )];
        let mut solver = solver();
        let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
        assert_eq!(
            encoding.to_smtlib(&mut solver),
            "(set-logic QF_BV)\n\
             (declare-const a (_ BitVec 2))\n\
             (declare-const b (_ BitVec 2))\n\
             (declare-const c (_ BitVec 2))\n\
             (assert (= c (bvxor a b)))\n"
        );
    }

    #[test]
    fn test_const_beyond_128_bits() {
        let mut value = bits_from_u128(256, 0);
        value.set(200, true);
        let nets = vec![Net::constant_bits(value.clone(), Wire::new("c", 256))];
        let mut solver = solver();
        let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
        assert_eq!(
            encoding.constraints[0].render(&mut solver),
            format!("(= c #b{}1{})", "0".repeat(55), "0".repeat(200))
        );

        let narrow = vec![Net::constant_bits(value, Wire::new("c", 200))];
        assert!(matches!(
            encode(&narrow).unwrap_err(),
            EncodeError::ConstantTooWide { width: 200, .. }
        ));
    }

    #[test]
    fn test_script_keeps_lookalike_names_apart() {
        let nets = vec![
            Net::wire(Wire::new("a_b", 1), Wire::new("y", 1)),
            Net::not(Wire::new("a b", 1), Wire::new("let", 1)),
        ];
        let mut solver = solver();
        let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
        assert_eq!(
            encoding.to_smtlib(&mut solver),
            "(set-logic QF_BV)\n\
             (declare-const a_b (_ BitVec 1))\n\
             (declare-const y (_ BitVec 1))\n\
             (declare-const |a b| (_ BitVec 1))\n\
             (declare-const |let| (_ BitVec 1))\n\
             (assert (= y a_b))\n\
             (assert (= |let| (bvnot |a b|)))\n"
        );
    }

    #[test_case("a|b" ; "pipe")]
    #[test_case("a\\b" ; "backslash")]
    fn test_unrepresentable_wire_name_is_rejected(name: &str) {
        let nets = vec![
            Net::wire(Wire::new("a_b", 1), Wire::new("y", 1)),
            Net::not(Wire::new(name, 1), Wire::new("z", 1)),
        ];
        assert_eq!(
            encode(&nets).unwrap_err(),
            EncodeError::UnrepresentableSymbol {
                wire: name.to_string(),
                symbol: name.to_string(),
            }
        );
    }

    #[test]
    fn test_single_operand_gates_are_identity() {
        let nets = vec![Net::and(vec![Wire::new("a", 3)], Wire::new("c", 3))];
        let mut solver = solver();
        let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
        assert_eq!(encoding.constraints[0].render(&mut solver), "(= c a)");
    }

    #[test_case(
        vec![Net::and(vec![Wire::new("a", 4), Wire::new("b", 2)], Wire::new("c", 4))],
        EncodeError::WidthMismatch { net_index: 0, op: NetOpKind::And, wire: "b".to_string(), expected: 4, actual: 2 }
        ; "and operand width")]
    #[test_case(
        vec![Net::not(Wire::new("a", 4), Wire::new("c", 3))],
        EncodeError::WidthMismatch { net_index: 0, op: NetOpKind::Not, wire: "a".to_string(), expected: 3, actual: 4 }
        ; "not width")]
    #[test_case(
        vec![Net::concat(vec![Wire::new("a", 4), Wire::new("b", 4)], Wire::new("c", 7))],
        EncodeError::WidthMismatch { net_index: 0, op: NetOpKind::Concat, wire: "c".to_string(), expected: 8, actual: 7 }
        ; "concat result width")]
    #[test_case(
        vec![Net::select(Wire::new("a", 8), 5, 2, Wire::new("c", 4))],
        EncodeError::InvalidSelectRange { net_index: 0, start: 5, end: 2, arg_width: 8 }
        ; "select reversed range")]
    #[test_case(
        vec![Net::select(Wire::new("a", 8), 4, 8, Wire::new("c", 5))],
        EncodeError::InvalidSelectRange { net_index: 0, start: 4, end: 8, arg_width: 8 }
        ; "select out of range")]
    #[test_case(
        vec![Net::select(Wire::new("a", 8), 2, 5, Wire::new("c", 3))],
        EncodeError::WidthMismatch { net_index: 0, op: NetOpKind::Select, wire: "c".to_string(), expected: 4, actual: 3 }
        ; "select result width")]
    #[test_case(
        vec![Net::constant(16, Wire::new("c", 4))],
        EncodeError::ConstantTooWide { net_index: 0, value: bits_from_u128_trimmed(16), width: 4 }
        ; "const too wide")]
    #[test_case(
        vec![
            Net::wire(Wire::new("a", 1), Wire::new("b", 1)),
            Net::xor(Vec::new(), Wire::new("c", 1)),
        ],
        EncodeError::EmptyOperands { net_index: 1, op: NetOpKind::Xor }
        ; "xor without operands")]
    fn test_encode_errors(nets: Vec<Net>, expected: EncodeError) {
        assert_eq!(encode(&nets).unwrap_err(), expected);
    }

    #[test]
    fn test_generate_with_foreign_wire_map_reports_unallocated() {
        let mut solver = solver();
        let allocated = vec![Net::wire(Wire::new("a", 1), Wire::new("b", 1))];
        let wire_map = allocate_wires(&mut solver, &allocated, &EncoderConfig::default()).unwrap();
        let other = vec![Net::not(Wire::new("a", 1), Wire::new("z", 1))];
        let err = generate_constraints(&mut solver, &other, &wire_map).unwrap_err();
        assert_eq!(
            err,
            EncodeError::UnallocatedWire {
                net_index: 0,
                wire: "z".to_string()
            }
        );
    }

    #[test]
    fn test_error_messages_name_the_net() {
        let err = EncodeError::WidthMismatch {
            net_index: 3,
            op: NetOpKind::Xor,
            wire: "b".to_string(),
            expected: 4,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "net 3 (xor): wire `b` has width 2, expected 4"
        );
    }
}
