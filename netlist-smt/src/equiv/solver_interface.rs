// SPDX-License-Identifier: Apache-2.0

use std::io;

use crate::value_utils::{smt_symbol, Bits};

#[derive(Debug, PartialEq)]
pub enum Response {
    Sat,
    Unsat,
    Unknown,
}

// Generic helper: left-fold a vector with a binary operator implemented by the
// solver.
fn reduce_many<S: Solver, F>(
    solver: &mut S,
    bvs: Vec<&BitVec<S::Term>>,
    mut op: F,
) -> BitVec<S::Term>
where
    F: FnMut(&mut S, &BitVec<S::Term>, &BitVec<S::Term>) -> BitVec<S::Term>,
{
    let mut iter = bvs.into_iter();
    let mut acc = iter
        .next()
        .expect("*_many called with empty vector")
        .clone();
    for bv in iter {
        acc = op(solver, &acc, bv);
    }
    acc
}

/// Bit-vector term builder and satisfiability oracle.
///
/// Every term is a [`BitVec`]; booleans are 1-bit vectors where `#b1` is true.
/// Binary bitwise operators require operands of equal width; callers are
/// expected to have validated widths before building terms.
pub trait Solver: Sized {
    type Term: Clone;
    type Config: Send + Sync;
    fn new(config: &Self::Config) -> io::Result<Self>;
    fn declare(&mut self, name: &str, width: usize) -> io::Result<BitVec<Self::Term>>;
    fn numerical(&mut self, width: usize, value: u64) -> BitVec<Self::Term>;
    fn true_bv(&mut self) -> BitVec<Self::Term> {
        self.numerical(1, 1)
    }
    fn false_bv(&mut self) -> BitVec<Self::Term> {
        self.numerical(1, 0)
    }
    fn from_raw_str(&mut self, width: usize, value: &str) -> BitVec<Self::Term>;
    /// Model value of `bit_vec` after a `Sat` check, LSB at index 0.
    fn get_value(&mut self, bit_vec: &BitVec<Self::Term>) -> io::Result<Bits>;
    fn extract(&mut self, bit_vec: &BitVec<Self::Term>, high: i32, low: i32) -> BitVec<Self::Term>;
    fn not(&mut self, bit_vec: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn concat(&mut self, lhs: &BitVec<Self::Term>, rhs: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn or(&mut self, lhs: &BitVec<Self::Term>, rhs: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn and(&mut self, lhs: &BitVec<Self::Term>, rhs: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn xor(&mut self, lhs: &BitVec<Self::Term>, rhs: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn eq(&mut self, lhs: &BitVec<Self::Term>, rhs: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn ne(&mut self, lhs: &BitVec<Self::Term>, rhs: &BitVec<Self::Term>) -> BitVec<Self::Term>;
    fn push(&mut self) -> io::Result<()>;
    fn pop(&mut self) -> io::Result<()>;
    fn check(&mut self) -> io::Result<Response>;
    fn assert(&mut self, bit_vec: &BitVec<Self::Term>) -> io::Result<()>;
    fn render(&mut self, bit_vec: &BitVec<Self::Term>) -> String;
    fn concat_many(&mut self, bvs: Vec<&BitVec<Self::Term>>) -> BitVec<Self::Term> {
        reduce_many(self, bvs, Self::concat)
    }
    fn and_many(&mut self, bvs: Vec<&BitVec<Self::Term>>) -> BitVec<Self::Term> {
        reduce_many(self, bvs, Self::and)
    }
    fn xor_many(&mut self, bvs: Vec<&BitVec<Self::Term>>) -> BitVec<Self::Term> {
        reduce_many(self, bvs, Self::xor)
    }
    fn or_many(&mut self, bvs: Vec<&BitVec<Self::Term>>) -> BitVec<Self::Term> {
        reduce_many(self, bvs, Self::or)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BitVec<Term> {
    BitVec { width: usize, rep: Term },
    ZeroWidth,
}

impl<Term> BitVec<Term> {
    pub fn get_width(&self) -> usize {
        match self {
            BitVec::BitVec { width, .. } => *width,
            BitVec::ZeroWidth => 0,
        }
    }

    pub fn get_term(&self) -> Option<&Term> {
        match self {
            BitVec::BitVec { rep, .. } => Some(rep),
            BitVec::ZeroWidth => None,
        }
    }
}

/// SMT-LIB symbol for a declared wire; errors when `name` cannot be quoted.
pub fn declared_symbol(name: &str) -> io::Result<String> {
    smt_symbol(name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{:?} cannot be written as an SMT-LIB symbol", name),
        )
    })
}


#[cfg(test)]
#[macro_export]
macro_rules! test_solver {
    ($mod_ident:ident, $solver:expr) => {
        #[cfg(test)]
        mod $mod_ident {
            use crate::equiv::solver_interface::test_utils;
            use crate::equiv::solver_interface::Solver;

            #[test]
            fn test_bitvec_equiv_basic() {
                let mut solver = $solver;
                test_utils::test_bitvec_equiv_basic(&mut solver);
            }

            #[test]
            fn test_numerical_inbound() {
                let mut solver = $solver;
                test_utils::test_numerical_inbound(&mut solver);
            }

            #[test]
            fn test_numerical_outbound() {
                let mut solver = $solver;
                test_utils::test_numerical_outbound(&mut solver);
            }

            #[test]
            fn test_raw_literal_long() {
                let mut solver = $solver;
                test_utils::test_raw_literal_long(&mut solver);
            }

            #[test]
            fn test_unconstrained_value_has_declared_width() {
                let mut solver = $solver;
                test_utils::test_unconstrained_value_has_declared_width(&mut solver);
            }

            #[test]
            fn test_constants() {
                let mut solver = $solver;
                test_utils::test_constants(&mut solver);
            }

            #[test]
            fn test_extract() {
                let mut solver = $solver;
                test_utils::test_extract(&mut solver);
            }

            #[test]
            fn test_push_pop() {
                let mut solver = $solver;
                test_utils::test_push_pop(&mut solver);
            }

            #[test]
            fn test_contradiction_is_unsat() {
                let mut solver = $solver;
                test_utils::test_contradiction_is_unsat(&mut solver);
            }

            crate::test_solver_unary!(test_not, $solver, not, 8, 0b1010_0101, 8, 0b0101_1010);
            crate::test_solver_unary!(test_not_single_bit, $solver, not, 1, 0, 1, 1);

            crate::test_solver_binary!(test_and, $solver, and, 8, 0b1100_1010, 0b1010_0110, 8, 0b1000_0010);
            crate::test_solver_binary!(test_or, $solver, or, 8, 0b1100_1010, 0b1010_0110, 8, 0b1110_1110);
            crate::test_solver_binary!(test_xor, $solver, xor, 8, 0b1100_1010, 0b1010_0110, 8, 0b0110_1100);
            crate::test_solver_binary!(test_eq_true, $solver, eq, 8, 0x42, 0x42, 1, 1);
            crate::test_solver_binary!(test_eq_false, $solver, eq, 8, 0x42, 0x43, 1, 0);
            crate::test_solver_binary!(test_ne_true, $solver, ne, 8, 0x42, 0x43, 1, 1);
            crate::test_solver_binary!(test_ne_false, $solver, ne, 8, 0x42, 0x42, 1, 0);
            crate::test_solver_binary_arbitrary_width!(test_concat, $solver, concat, 4, 0xa, 4, 0x5, 8, 0xa5);
            crate::test_solver_binary_arbitrary_width!(test_concat_uneven, $solver, concat, 1, 1, 3, 0b010, 4, 0b1010);

            crate::test_solver_many!(test_and_many, $solver, and_many, 4, [0b1111, 0b1101, 0b0111], 4, 0b0101);
            crate::test_solver_many!(test_or_many, $solver, or_many, 4, [0b0001, 0b0100, 0b1000], 4, 0b1101);
            crate::test_solver_many!(test_xor_many, $solver, xor_many, 4, [0b0011, 0b0101, 0b1111], 4, 0b1001);
            crate::test_solver_many!(test_concat_many, $solver, concat_many, 4, [0x1, 0x2, 0x3], 12, 0x123);
            crate::test_solver_many!(test_and_many_single, $solver, and_many, 4, [0b1001], 4, 0b1001);
        }
    };
}
