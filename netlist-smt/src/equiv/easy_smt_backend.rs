// SPDX-License-Identifier: Apache-2.0

#![cfg(feature = "has-easy-smt")]

use std::{io, path::PathBuf};

use easy_smt::{Context, ContextBuilder, SExpr};

use crate::{
    equiv::solver_interface::{declared_symbol, BitVec, Response, Solver},
    value_utils::{parse_smt_literal, Bits},
};

#[derive(Debug, Clone)]
pub struct SolverFn {
    pub push_fn: fn(&mut Context) -> io::Result<()>,
    pub pop_fn: fn(&mut Context) -> io::Result<()>,
    pub check_fn: fn(&mut Context) -> io::Result<easy_smt::Response>,
    pub assert_fn: fn(&mut Context, SExpr) -> io::Result<()>,
}

impl Default for SolverFn {
    fn default() -> Self {
        Self {
            push_fn: Context::push,
            pop_fn: Context::pop,
            check_fn: Context::check,
            assert_fn: Context::assert,
        }
    }
}

/// Configuration for an external SMT-LIB2 solver process driven through
/// `easy-smt`.
///
/// The solver runs as a child process and every declaration and assertion is
/// sent over stdin. When `replay_file` is set the full command stream is also
/// written there, which yields a standalone script for reproducing a query.
#[derive(Clone)]
pub struct EasySmtConfig {
    pub solver_path: PathBuf,
    pub solver_args: Vec<String>,
    pub replay_file: Option<PathBuf>,
    pub solver_fn: SolverFn,
}

impl EasySmtConfig {
    pub fn bitwuzla() -> Self {
        Self {
            solver_path: PathBuf::from("bitwuzla"),
            solver_args: ["--produce-models"].iter().map(|s| s.to_string()).collect(),
            replay_file: None,
            solver_fn: SolverFn {
                push_fn: |ctx| ctx.push_many(1),
                pop_fn: |ctx| ctx.pop_many(1),
                ..SolverFn::default()
            },
        }
    }

    pub fn boolector() -> Self {
        Self {
            solver_path: PathBuf::from("boolector"),
            solver_args: [
                "--smt2",               // Use SMT2
                "-m",                   // Produce models
                "--output-format=smt2", // Output in SMT2 format
                "--no-exit-codes",      // Don't exit with error code on failure
                "--incremental",        // Use incremental solving
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            replay_file: None,
            solver_fn: SolverFn {
                push_fn: |ctx| ctx.push_many(1),
                pop_fn: |ctx| ctx.pop_many(1),
                ..SolverFn::default()
            },
        }
    }

    pub fn z3() -> Self {
        Self {
            solver_path: PathBuf::from("z3"),
            solver_args: [
                "-nw",   // No warnings
                "-smt2", // Use SMT2
                "-in",   // Read from stdin
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            replay_file: None,
            solver_fn: SolverFn::default(),
        }
    }

    pub fn with_replay_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.replay_file = Some(path.into());
        self
    }
}

pub struct EasySmtSolver {
    context: Context,
    solver_fn: SolverFn,
}

impl EasySmtSolver {
    fn bool_to(&self, value: SExpr) -> BitVec<SExpr> {
        let ctx = &self.context;
        BitVec::BitVec {
            width: 1,
            rep: ctx.ite(value, ctx.binary(1, 1), ctx.binary(1, 0)),
        }
    }

    fn bv_to_bool(&self, value: &BitVec<SExpr>) -> io::Result<SExpr> {
        match value {
            BitVec::BitVec { rep, width: 1 } => {
                Ok(self.context.eq(*rep, self.context.binary(1, 1)))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Invalid bitvector width for boolean: {:?}",
                    value.get_width()
                ),
            )),
        }
    }

    fn bin_bool_op<F>(
        &mut self,
        lhs: &BitVec<SExpr>,
        rhs: &BitVec<SExpr>,
        op: F,
        zero_width_result: BitVec<SExpr>,
    ) -> BitVec<SExpr>
    where
        F: Fn(&Context, SExpr, SExpr) -> SExpr,
    {
        match (lhs, rhs) {
            (BitVec::BitVec { width: w1, rep: r1 }, BitVec::BitVec { width: w2, rep: r2 }) => {
                assert_eq!(w1, w2, "Bitvector width mismatch");
                let res = op(&self.context, *r1, *r2);
                self.bool_to(res)
            }
            (BitVec::ZeroWidth, BitVec::ZeroWidth) => zero_width_result,
            _ => panic!("Bitvector width mismatch"),
        }
    }

    fn bin_op<F>(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>, op: F) -> BitVec<SExpr>
    where
        F: Fn(&Context, SExpr, SExpr) -> SExpr,
    {
        match (lhs, rhs) {
            (BitVec::BitVec { width: w1, rep: r1 }, BitVec::BitVec { width: w2, rep: r2 }) => {
                assert_eq!(w1, w2, "Bitvector width mismatch");
                BitVec::BitVec {
                    width: *w1,
                    rep: op(&self.context, *r1, *r2),
                }
            }
            (BitVec::ZeroWidth, BitVec::ZeroWidth) => BitVec::ZeroWidth,
            _ => panic!("Bitvector width mismatch"),
        }
    }
}

impl Solver for EasySmtSolver {
    type Term = SExpr;
    type Config = EasySmtConfig;

    fn new(config: &EasySmtConfig) -> io::Result<EasySmtSolver> {
        let mut builder = ContextBuilder::new();
        if let Some(ref replay_file) = config.replay_file {
            builder.replay_file(Some(std::fs::File::create(replay_file)?));
        }
        builder.solver(&config.solver_path);
        builder.solver_args(&config.solver_args);
        let context = builder.build()?;
        Ok(EasySmtSolver {
            context,
            solver_fn: config.solver_fn.clone(),
        })
    }

    fn declare(&mut self, name: &str, width: usize) -> io::Result<BitVec<SExpr>> {
        let symbol = declared_symbol(name)?;
        if width == 0 {
            return Ok(BitVec::ZeroWidth);
        }
        let width_numeral = self.context.numeral(width as i64);
        let sort = self.context.bit_vec_sort(width_numeral);
        let rep = self.context.declare_const(symbol, sort)?;
        Ok(BitVec::BitVec { width, rep })
    }

    fn numerical(&mut self, width: usize, mut value: u64) -> BitVec<SExpr> {
        if width == 0 {
            return BitVec::ZeroWidth;
        }
        if width < 64 {
            value &= (1 << width) - 1;
        }
        BitVec::BitVec {
            width,
            rep: self.context.binary(width, value),
        }
    }

    fn from_raw_str(&mut self, width: usize, value: &str) -> BitVec<SExpr> {
        if width == 0 {
            return BitVec::ZeroWidth;
        }
        BitVec::BitVec {
            width,
            rep: self.context.atom(value),
        }
    }

    fn get_value(&mut self, bit_vec: &BitVec<SExpr>) -> io::Result<Bits> {
        match bit_vec {
            BitVec::BitVec { rep, width } => {
                let values = self.context.get_value(vec![*rep])?;
                let value = values.first().map(|(_, v)| *v).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "solver returned no value")
                })?;
                let atom = self.context.get_atom(value).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("model value is not an atom: {}", self.context.display(value)),
                    )
                })?;
                let mut bits = parse_smt_literal(atom)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                bits.resize(*width, false);
                Ok(bits)
            }
            BitVec::ZeroWidth => Ok(Bits::new()),
        }
    }

    fn extract(&mut self, bit_vec: &BitVec<SExpr>, high: i32, low: i32) -> BitVec<SExpr> {
        if high == low - 1 {
            return BitVec::ZeroWidth;
        }
        match bit_vec {
            BitVec::BitVec { width, rep } => {
                assert!(
                    high >= low,
                    "Invalid bit slice: high = {}, low = {}",
                    high,
                    low
                );
                assert!(
                    high < *width as i32,
                    "Invalid bit slice: high = {}, width = {}",
                    high,
                    width
                );
                assert!(low >= 0, "Invalid bit slice: low = {}", low);
                BitVec::BitVec {
                    width: (high - low + 1) as usize,
                    rep: self.context.extract(high, low, *rep),
                }
            }
            BitVec::ZeroWidth => panic!("Cannot extract from zero-width bitvector"),
        }
    }

    fn not(&mut self, bit_vec: &BitVec<SExpr>) -> BitVec<SExpr> {
        match bit_vec {
            BitVec::BitVec { width, rep } => BitVec::BitVec {
                width: *width,
                rep: self.context.bvnot(*rep),
            },
            BitVec::ZeroWidth => BitVec::ZeroWidth,
        }
    }

    fn concat(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>) -> BitVec<SExpr> {
        match (lhs, rhs) {
            (BitVec::BitVec { width: w1, rep: r1 }, BitVec::BitVec { width: w2, rep: r2 }) => {
                BitVec::BitVec {
                    width: w1 + w2,
                    rep: self.context.concat(*r1, *r2),
                }
            }
            (BitVec::ZeroWidth, _) => rhs.clone(),
            (_, BitVec::ZeroWidth) => lhs.clone(),
        }
    }

    fn or(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>) -> BitVec<SExpr> {
        self.bin_op(lhs, rhs, Context::bvor)
    }

    fn and(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>) -> BitVec<SExpr> {
        self.bin_op(lhs, rhs, Context::bvand)
    }

    fn xor(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>) -> BitVec<SExpr> {
        self.bin_op(lhs, rhs, Context::bvxor)
    }

    fn eq(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>) -> BitVec<SExpr> {
        let result = self.true_bv();
        self.bin_bool_op(lhs, rhs, Context::eq, result)
    }

    fn ne(&mut self, lhs: &BitVec<SExpr>, rhs: &BitVec<SExpr>) -> BitVec<SExpr> {
        let result = self.false_bv();
        self.bin_bool_op(lhs, rhs, |ctx, r1, r2| ctx.not(ctx.eq(r1, r2)), result)
    }

    fn push(&mut self) -> io::Result<()> {
        (self.solver_fn.push_fn)(&mut self.context)
    }

    fn pop(&mut self) -> io::Result<()> {
        (self.solver_fn.pop_fn)(&mut self.context)
    }

    fn check(&mut self) -> io::Result<Response> {
        match (self.solver_fn.check_fn)(&mut self.context)? {
            easy_smt::Response::Sat => Ok(Response::Sat),
            easy_smt::Response::Unsat => Ok(Response::Unsat),
            easy_smt::Response::Unknown => Ok(Response::Unknown),
        }
    }

    fn assert(&mut self, bit_vec: &BitVec<SExpr>) -> io::Result<()> {
        let bool_expr = self.bv_to_bool(bit_vec)?;
        (self.solver_fn.assert_fn)(&mut self.context, bool_expr)
    }

    fn render(&mut self, bit_vec: &BitVec<SExpr>) -> String {
        match bit_vec.get_term() {
            Some(rep) => self.context.display(*rep).to_string(),
            None => "<zero-width>".to_string(),
        }
    }
}

#[cfg(test)]
use crate::test_solver;

#[cfg(test)]
#[cfg(feature = "with-bitwuzla-binary-test")]
test_solver!(
    bitwuzla_tests,
    super::EasySmtSolver::new(&super::EasySmtConfig::bitwuzla()).unwrap()
);

#[cfg(test)]
#[cfg(feature = "with-boolector-binary-test")]
test_solver!(
    boolector_tests,
    super::EasySmtSolver::new(&super::EasySmtConfig::boolector()).unwrap()
);

#[cfg(test)]
#[cfg(feature = "with-z3-binary-test")]
test_solver!(
    z3_tests,
    super::EasySmtSolver::new(&super::EasySmtConfig::z3()).unwrap()
);
