// SPDX-License-Identifier: Apache-2.0

//! In-process [`Solver`] that bit-blasts bit-vector terms into CNF.
//!
//! Every term carries one SAT literal per bit (LSB first) together with its
//! SMT-LIB2 rendering, so the same encoding can be both decided here and
//! printed for an external solver. Gate outputs are defined with Tseitin
//! clauses, which hold in every scope; only asserted facts are guarded by the
//! activation literal of the innermost `push`.

use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use varisat::{ExtendFormula, Lit};

use crate::equiv::solver_interface::{declared_symbol, BitVec, Response, Solver};
use crate::value_utils::{
    bits_from_u128, bits_to_smt_literal, parse_smt_literal, Bits,
};

#[derive(Debug, Clone, Default)]
pub struct VarisatConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct VarisatTerm {
    bits: Rc<Vec<Lit>>,
    text: Rc<str>,
}

impl VarisatTerm {
    /// Literals of the term, LSB first.
    pub fn lits(&self) -> &[Lit] {
        &self.bits
    }
}

pub struct VarisatSolver {
    solver: varisat::Solver<'static>,
    true_lit: Lit,
    scopes: Vec<Lit>,
    model: Option<Vec<bool>>,
    declared: HashSet<String>,
}

// x <-> a & b
fn add_tseitin_and(solver: &mut impl ExtendFormula, a: Lit, b: Lit, output: Lit) {
    solver.add_clause(&[!a, !b, output]);
    solver.add_clause(&[a, !output]);
    solver.add_clause(&[b, !output]);
}

// x <-> a ^ b
fn add_tseitin_xor(solver: &mut impl ExtendFormula, a: Lit, b: Lit, output: Lit) {
    solver.add_clause(&[!a, !b, !output]);
    solver.add_clause(&[a, b, !output]);
    solver.add_clause(&[a, !b, output]);
    solver.add_clause(&[!a, b, output]);
}

fn term(bits: Vec<Lit>, text: String) -> BitVec<VarisatTerm> {
    if bits.is_empty() {
        return BitVec::ZeroWidth;
    }
    BitVec::BitVec {
        width: bits.len(),
        rep: VarisatTerm {
            bits: Rc::new(bits),
            text: text.into(),
        },
    }
}

impl VarisatSolver {
    fn false_lit(&self) -> Lit {
        !self.true_lit
    }

    fn const_value(&self, lit: Lit) -> Option<bool> {
        if lit == self.true_lit {
            Some(true)
        } else if lit == self.false_lit() {
            Some(false)
        } else {
            None
        }
    }

    fn and_lit(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(false), _) | (_, Some(false)) => return self.false_lit(),
            (Some(true), _) => return b,
            (_, Some(true)) => return a,
            _ => {}
        }
        if a == b {
            return a;
        }
        if a == !b {
            return self.false_lit();
        }
        let output = self.solver.new_lit();
        add_tseitin_and(&mut self.solver, a, b, output);
        output
    }

    fn or_lit(&mut self, a: Lit, b: Lit) -> Lit {
        !self.and_lit(!a, !b)
    }

    fn xor_lit(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(x), _) => return if x { !b } else { b },
            (_, Some(y)) => return if y { !a } else { a },
            _ => {}
        }
        if a == b {
            return self.false_lit();
        }
        if a == !b {
            return self.true_lit;
        }
        let output = self.solver.new_lit();
        add_tseitin_xor(&mut self.solver, a, b, output);
        output
    }

    fn bitwise<F>(
        &mut self,
        lhs: &BitVec<VarisatTerm>,
        rhs: &BitVec<VarisatTerm>,
        smt_op: &str,
        mut gate: F,
    ) -> BitVec<VarisatTerm>
    where
        F: FnMut(&mut Self, Lit, Lit) -> Lit,
    {
        match (lhs, rhs) {
            (BitVec::BitVec { width: w1, rep: r1 }, BitVec::BitVec { width: w2, rep: r2 }) => {
                assert_eq!(w1, w2, "Bitvector width mismatch");
                let bits = r1
                    .bits
                    .iter()
                    .zip(r2.bits.iter())
                    .map(|(&a, &b)| gate(self, a, b))
                    .collect();
                term(bits, format!("({} {} {})", smt_op, r1.text, r2.text))
            }
            (BitVec::ZeroWidth, BitVec::ZeroWidth) => BitVec::ZeroWidth,
            _ => panic!("Bitvector width mismatch"),
        }
    }

    /// Single literal that holds iff `lhs` and `rhs` agree on every bit.
    fn equal_lit(&mut self, lhs: &[Lit], rhs: &[Lit]) -> Lit {
        assert_eq!(lhs.len(), rhs.len(), "Bitvector width mismatch");
        let mut acc = self.true_lit;
        for (&a, &b) in lhs.iter().zip(rhs.iter()) {
            let same = !self.xor_lit(a, b);
            acc = self.and_lit(acc, same);
        }
        acc
    }

    fn lit_value(model: &[bool], lit: Lit) -> bool {
        let assigned = model.get(lit.var().index()).copied().unwrap_or(false);
        assigned == lit.is_positive()
    }
}

impl Solver for VarisatSolver {
    type Term = VarisatTerm;
    type Config = VarisatConfig;

    fn new(_config: &VarisatConfig) -> io::Result<Self> {
        let mut solver = varisat::Solver::new();
        let true_lit = solver.new_lit();
        solver.add_clause(&[true_lit]);
        Ok(VarisatSolver {
            solver,
            true_lit,
            scopes: Vec::new(),
            model: None,
            declared: HashSet::new(),
        })
    }

    fn declare(&mut self, name: &str, width: usize) -> io::Result<BitVec<VarisatTerm>> {
        let symbol = declared_symbol(name)?;
        if !self.declared.insert(name.to_string()) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("symbol {:?} is already declared", name),
            ));
        }
        let bits = (0..width).map(|_| self.solver.new_lit()).collect();
        Ok(term(bits, symbol))
    }

    fn numerical(&mut self, width: usize, value: u64) -> BitVec<VarisatTerm> {
        let bits = bits_from_u128(width, value as u128);
        let text = bits_to_smt_literal(&bits);
        let lits = bits
            .iter()
            .map(|bit| if *bit { self.true_lit } else { self.false_lit() })
            .collect();
        term(lits, text)
    }

    fn from_raw_str(&mut self, width: usize, value: &str) -> BitVec<VarisatTerm> {
        let mut bits = parse_smt_literal(value)
            .unwrap_or_else(|e| panic!("Invalid bit-vector literal: {}", e));
        bits.resize(width, false);
        let text = bits_to_smt_literal(&bits);
        let lits = bits
            .iter()
            .map(|bit| if *bit { self.true_lit } else { self.false_lit() })
            .collect();
        term(lits, text)
    }

    fn get_value(&mut self, bit_vec: &BitVec<VarisatTerm>) -> io::Result<Bits> {
        let model = self.model.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "no model available; last check was not sat")
        })?;
        Ok(match bit_vec {
            BitVec::BitVec { rep, .. } => rep
                .bits
                .iter()
                .map(|&lit| Self::lit_value(model, lit))
                .collect(),
            BitVec::ZeroWidth => Bits::new(),
        })
    }

    fn extract(&mut self, bit_vec: &BitVec<VarisatTerm>, high: i32, low: i32) -> BitVec<VarisatTerm> {
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
                let bits = rep.bits[low as usize..=high as usize].to_vec();
                term(bits, format!("((_ extract {} {}) {})", high, low, rep.text))
            }
            BitVec::ZeroWidth => panic!("Cannot extract from zero-width bitvector"),
        }
    }

    fn not(&mut self, bit_vec: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        match bit_vec {
            BitVec::BitVec { rep, .. } => {
                let bits = rep.bits.iter().map(|&lit| !lit).collect();
                term(bits, format!("(bvnot {})", rep.text))
            }
            BitVec::ZeroWidth => BitVec::ZeroWidth,
        }
    }

    fn concat(&mut self, lhs: &BitVec<VarisatTerm>, rhs: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        match (lhs, rhs) {
            (BitVec::BitVec { rep: r1, .. }, BitVec::BitVec { rep: r2, .. }) => {
                // rhs supplies the low bits.
                let bits = r2.bits.iter().chain(r1.bits.iter()).copied().collect();
                term(bits, format!("(concat {} {})", r1.text, r2.text))
            }
            (BitVec::ZeroWidth, _) => rhs.clone(),
            (_, BitVec::ZeroWidth) => lhs.clone(),
        }
    }

    fn or(&mut self, lhs: &BitVec<VarisatTerm>, rhs: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        self.bitwise(lhs, rhs, "bvor", Self::or_lit)
    }

    fn and(&mut self, lhs: &BitVec<VarisatTerm>, rhs: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        self.bitwise(lhs, rhs, "bvand", Self::and_lit)
    }

    fn xor(&mut self, lhs: &BitVec<VarisatTerm>, rhs: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        self.bitwise(lhs, rhs, "bvxor", Self::xor_lit)
    }

    fn eq(&mut self, lhs: &BitVec<VarisatTerm>, rhs: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        match (lhs, rhs) {
            (BitVec::BitVec { rep: r1, .. }, BitVec::BitVec { rep: r2, .. }) => {
                let lit = self.equal_lit(&r1.bits, &r2.bits);
                term(
                    vec![lit],
                    format!("(ite (= {} {}) #b1 #b0)", r1.text, r2.text),
                )
            }
            (BitVec::ZeroWidth, BitVec::ZeroWidth) => self.true_bv(),
            _ => panic!("Bitvector width mismatch"),
        }
    }

    fn ne(&mut self, lhs: &BitVec<VarisatTerm>, rhs: &BitVec<VarisatTerm>) -> BitVec<VarisatTerm> {
        match (lhs, rhs) {
            (BitVec::BitVec { rep: r1, .. }, BitVec::BitVec { rep: r2, .. }) => {
                let lit = self.equal_lit(&r1.bits, &r2.bits);
                term(
                    vec![!lit],
                    format!("(ite (distinct {} {}) #b1 #b0)", r1.text, r2.text),
                )
            }
            (BitVec::ZeroWidth, BitVec::ZeroWidth) => self.false_bv(),
            _ => panic!("Bitvector width mismatch"),
        }
    }

    fn push(&mut self) -> io::Result<()> {
        let activation = self.solver.new_lit();
        self.scopes.push(activation);
        Ok(())
    }

    fn pop(&mut self) -> io::Result<()> {
        let activation = self.scopes.pop().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "pop without matching push")
        })?;
        // Permanently retire every clause guarded by this scope.
        self.solver.add_clause(&[!activation]);
        self.model = None;
        Ok(())
    }

    fn check(&mut self) -> io::Result<Response> {
        self.solver.assume(&self.scopes);
        match self.solver.solve() {
            Ok(true) => {
                let lits = self.solver.model().unwrap_or_default();
                let mut model = vec![false; lits.len()];
                for lit in lits {
                    let index = lit.var().index();
                    if index >= model.len() {
                        model.resize(index + 1, false);
                    }
                    model[index] = lit.is_positive();
                }
                self.model = Some(model);
                Ok(Response::Sat)
            }
            Ok(false) => {
                self.model = None;
                Ok(Response::Unsat)
            }
            Err(e) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("varisat solver error: {:?}", e),
            )),
        }
    }

    fn assert(&mut self, bit_vec: &BitVec<VarisatTerm>) -> io::Result<()> {
        let lit = match bit_vec {
            BitVec::BitVec { width: 1, rep } => rep.bits[0],
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Invalid bitvector width for boolean: {:?}",
                        bit_vec.get_width()
                    ),
                ))
            }
        };
        match self.scopes.last() {
            Some(&activation) => self.solver.add_clause(&[!activation, lit]),
            None => self.solver.add_clause(&[lit]),
        }
        Ok(())
    }

    fn render(&mut self, bit_vec: &BitVec<VarisatTerm>) -> String {
        match bit_vec {
            BitVec::BitVec { rep, .. } => rep.text.to_string(),
            BitVec::ZeroWidth => "<zero-width>".to_string(),
        }
    }
}


#[cfg(test)]
use crate::test_solver;

#[cfg(test)]
test_solver!(
    varisat_tests,
    super::VarisatSolver::new(&super::VarisatConfig).unwrap()
);
