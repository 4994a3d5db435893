// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use netlist_smt::equiv::prove_equiv::{prove_netlist_equiv, EquivResult};
use netlist_smt::equiv::solver_interface::{Response, Solver};
use netlist_smt::equiv::varisat_backend::{VarisatConfig, VarisatSolver};
use netlist_smt::netlist_json::parse_netlist_json;
use netlist_smt::equiv::solver_interface::BitVec;
use netlist_smt::value_utils::{
    bits_from_u128, bits_to_smt_literal, bits_to_u128, parse_unsigned_literal, significant_bits,
};
use netlist_smt::{encode_netlist, EncoderConfig, Net, Wire};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn w(name: &str, width: usize) -> Wire {
    Wire::new(name, width)
}

fn new_solver() -> VarisatSolver {
    VarisatSolver::new(&VarisatConfig).unwrap()
}

fn literal<S: Solver>(solver: &mut S, width: usize, value: u128) -> BitVec<S::Term> {
    solver.from_raw_str(width, &bits_to_smt_literal(&bits_from_u128(width, value)))
}

/// Fixes `inputs`, then checks that `output` can only take the value
/// `expected`.
fn assert_forced(nets: &[Net], inputs: &[(&str, u128)], output: &str, expected: u128) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut solver = new_solver();
    let encoding = encode_netlist(&mut solver, nets, &EncoderConfig::default()).unwrap();
    encoding.assert_all(&mut solver).unwrap();
    for (name, value) in inputs {
        let entry = encoding.wire_map.entry(name).unwrap();
        let pinned_value = literal(&mut solver, entry.width, *value);
        let pinned = solver.eq(&entry.var, &pinned_value);
        solver.assert(&pinned).unwrap();
    }

    let out = encoding.wire_map.entry(output).unwrap();
    let expected_bv = literal(&mut solver, out.width, expected);
    solver.push().unwrap();
    let differs = solver.ne(&out.var, &expected_bv);
    solver.assert(&differs).unwrap();
    assert_eq!(solver.check().unwrap(), Response::Unsat);
    solver.pop().unwrap();

    assert_eq!(solver.check().unwrap(), Response::Sat);
    let value = encoding.value_of(&mut solver, output).unwrap().unwrap();
    assert_eq!(value.len(), out.width);
    assert_eq!(bits_to_u128(&value), Some(expected));
}

#[test_case(1, 1, 1 ; "both high")]
#[test_case(1, 0, 0 ; "one low")]
#[test_case(0, 0, 0 ; "both low")]
fn test_and_gate(a: u128, b: u128, c: u128) {
    let nets = vec![Net::and(vec![w("a", 1), w("b", 1)], w("c", 1))];
    assert_forced(&nets, &[("a", a), ("b", b)], "c", c);
}

#[test]
fn test_concat_first_operand_is_most_significant() {
    let nets = vec![Net::concat(vec![w("a", 4), w("b", 4)], w("c", 8))];
    assert_forced(&nets, &[("a", 0xA), ("b", 0x5)], "c", 0xA5);
}

#[test]
fn test_select_extracts_inclusive_range() {
    let nets = vec![Net::select(w("a", 8), 2, 5, w("c", 4))];
    assert_forced(&nets, &[("a", 0b1011_0100)], "c", 0b1101);
}

#[test]
fn test_const_drives_destination() {
    let nets = vec![Net::constant(7, w("c", 4))];
    assert_forced(&nets, &[], "c", 7);
}

#[test]
fn test_wide_const() {
    let value = 0x8000_0000_0000_0000_0000_0000_0000_0001u128;
    let nets = vec![Net::constant(value, w("c", 128))];
    assert_forced(&nets, &[], "c", value);
}

#[test_case(vec![Net::or(vec![w("a", 4), w("b", 4)], w("c", 4))], 0b1100, 0b1010, 0b1110 ; "or")]
#[test_case(vec![Net::xor(vec![w("a", 4), w("b", 4)], w("c", 4))], 0b1100, 0b1010, 0b0110 ; "xor")]
#[test_case(vec![
    Net::not(w("a", 4), w("na", 4)),
    Net::and(vec![w("na", 4), w("b", 4)], w("c", 4)),
], 0b1100, 0b1010, 0b0010 ; "and not")]
#[test_case(vec![
    Net::wire(w("a", 4), w("t", 4)),
    Net::register(w("t", 4), w("u", 4)),
    Net::xor(vec![w("u", 4), w("b", 4), w("a", 4)], w("c", 4)),
], 0b1100, 0b1010, 0b1010 ; "three way xor through copies")]
fn test_gate_chains(nets: Vec<Net>, a: u128, b: u128, c: u128) {
    assert_forced(&nets, &[("a", a), ("b", b)], "c", c);
}

#[test]
fn test_register_matches_wire_copy() {
    let as_register = vec![Net::register(w("a", 1), w("c", 1))];
    let as_wire = vec![Net::wire(w("a", 1), w("c", 1))];

    let mut reg_solver = new_solver();
    let reg = encode_netlist(&mut reg_solver, &as_register, &EncoderConfig::default()).unwrap();
    let mut wire_solver = new_solver();
    let wire = encode_netlist(&mut wire_solver, &as_wire, &EncoderConfig::default()).unwrap();

    assert_eq!(
        reg.constraints[0].render(&mut reg_solver),
        wire.constraints[0].render(&mut wire_solver)
    );
    assert_eq!(
        reg.to_smtlib(&mut reg_solver),
        wire.to_smtlib(&mut wire_solver)
    );
}

fn demorgan_lhs() -> Vec<Net> {
    vec![
        Net::not(w("a", 1), w("na", 1)),
        Net::not(w("b", 1), w("nb", 1)),
        Net::and(vec![w("na", 1), w("nb", 1)], w("nab", 1)),
        Net::not(w("nab", 1), w("y", 1)),
    ]
}

fn demorgan_rhs() -> Vec<Net> {
    vec![Net::or(vec![w("a", 1), w("b", 1)], w("y", 1))]
}

#[test]
fn test_demorgan_outputs_cannot_differ() {
    let _ = env_logger::builder().is_test(true).try_init();
    // Both forms in one netlist sharing a and b.
    let mut nets = demorgan_lhs();
    nets.push(Net::or(vec![w("a", 1), w("b", 1)], w("y_or", 1)));

    let mut solver = new_solver();
    let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
    encoding.assert_all(&mut solver).unwrap();
    let y = encoding.wire_map.get("y").unwrap().clone();
    let y_or = encoding.wire_map.get("y_or").unwrap().clone();
    let differs = solver.ne(&y, &y_or);
    solver.assert(&differs).unwrap();
    assert_eq!(solver.check().unwrap(), Response::Unsat);
}

#[test]
fn test_demorgan_proved_by_equivalence_checker() {
    let result = prove_netlist_equiv::<VarisatSolver>(
        &VarisatConfig,
        &demorgan_lhs(),
        &demorgan_rhs(),
        &EncoderConfig::default(),
    )
    .unwrap();
    assert_eq!(result, EquivResult::Proved);
}

fn mixed_netlist() -> Vec<Net> {
    vec![
        Net::and(vec![w("a", 4), w("b", 4)], w("ab", 4)),
        Net::concat(vec![w("ab", 4), w("s", 2)], w("cat", 6)),
        Net::select(w("cat", 6), 1, 4, w("mid", 4)),
        Net::constant(3, w("k", 4)),
        Net::xor(vec![w("mid", 4), w("k", 4)], w("x", 4)),
        Net::register(w("x", 4), w("q", 4)),
        Net::not(w("q", 4), w("y", 4)),
    ]
}

#[test]
fn test_encoding_is_deterministic() {
    let nets = mixed_netlist();
    let mut first_solver = new_solver();
    let first = encode_netlist(&mut first_solver, &nets, &EncoderConfig::default()).unwrap();
    let mut second_solver = new_solver();
    let second = encode_netlist(&mut second_solver, &nets, &EncoderConfig::default()).unwrap();
    assert_eq!(
        first.to_smtlib(&mut first_solver),
        second.to_smtlib(&mut second_solver)
    );
}

#[test]
fn test_every_wire_has_exactly_one_variable() {
    let nets = mixed_netlist();
    let mut solver = new_solver();
    let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();

    let referenced: HashSet<(String, usize)> = nets
        .iter()
        .flat_map(|n| n.args().into_iter().chain(n.dests()))
        .map(|wire| (wire.name.clone(), wire.bitwidth))
        .collect();
    let allocated: HashSet<(String, usize)> = encoding
        .wire_map
        .iter()
        .map(|e| (e.name.clone(), e.var.get_width()))
        .collect();
    assert_eq!(allocated, referenced);
    assert_eq!(encoding.wire_map.len(), referenced.len());
}

#[test]
fn test_one_constraint_per_net_in_order() {
    let nets = mixed_netlist();
    let mut solver = new_solver();
    let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
    assert_eq!(encoding.constraints.len(), nets.len());
    for (i, (constraint, net)) in encoding.constraints.iter().zip(nets.iter()).enumerate() {
        assert_eq!(constraint.net_index, i);
        assert_eq!(constraint.kind, net.kind());
    }
}

#[test]
fn test_json_netlist_with_symbolic_tags_encodes() {
    let text = r#"{"nets": [
        {"op": "c", "args": [{"name": "a", "bitwidth": 4}, {"name": "b", "bitwidth": 4}],
         "dests": [{"name": "c", "bitwidth": 8}]},
        {"op": "s", "args": [{"name": "c", "bitwidth": 8}],
         "dests": [{"name": "d", "bitwidth": 4}], "op_param": [2, 5]}
    ]}"#;
    let nets = parse_netlist_json(text).unwrap();
    assert_forced(&nets, &[("a", 0xA), ("b", 0x5)], "d", 0b1001);
}

#[test]
fn test_const_wider_than_128_bits_is_forced() {
    let value = parse_unsigned_literal("0x8000_0000_0000_0000_0000_0000_0000_0000_0000_0001").unwrap();
    assert_eq!(significant_bits(&value), 160);
    let nets = vec![
        Net::constant_bits(value.clone(), w("k", 192)),
        Net::xor(vec![w("k", 192), w("a", 192)], w("y", 192)),
    ];
    let mut solver = new_solver();
    let encoding = encode_netlist(&mut solver, &nets, &EncoderConfig::default()).unwrap();
    encoding.assert_all(&mut solver).unwrap();
    let a = encoding.wire_map.entry("a").unwrap();
    let zero = literal(&mut solver, 192, 0);
    let pinned = solver.eq(&a.var, &zero);
    solver.assert(&pinned).unwrap();
    assert_eq!(solver.check().unwrap(), Response::Sat);

    let y = encoding.value_of(&mut solver, "y").unwrap().unwrap();
    let mut expected = value;
    expected.resize(192, false);
    assert_eq!(y, expected);
}
