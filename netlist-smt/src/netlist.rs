// SPDX-License-Identifier: Apache-2.0

//! In-memory netlist representation consumed by the encoder.
//!
//! A netlist is an ordered sequence of [`Net`]s. Each net names the wires it
//! reads and the single wire it drives; wires are plain `(name, bitwidth)`
//! values that are looked up by name, never owned by the encoder.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_utils::{
    bits_from_u128_trimmed, bits_to_hex, bits_to_u128, trim_high_zeros, Bits,
};

/// A named, bit-width-tagged signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    pub name: String,
    pub bitwidth: usize,
}

impl Wire {
    pub fn new(name: impl Into<String>, bitwidth: usize) -> Self {
        Self {
            name: name.into(),
            bitwidth,
        }
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.bitwidth)
    }
}

/// Operation kind of a net, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetOpKind {
    Wire,
    And,
    Or,
    Xor,
    Not,
    Concat,
    Select,
    Register,
    Const,
}

impl NetOpKind {
    pub const ALL: [NetOpKind; 9] = [
        NetOpKind::Wire,
        NetOpKind::And,
        NetOpKind::Or,
        NetOpKind::Xor,
        NetOpKind::Not,
        NetOpKind::Concat,
        NetOpKind::Select,
        NetOpKind::Register,
        NetOpKind::Const,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NetOpKind::Wire => "wire",
            NetOpKind::And => "and",
            NetOpKind::Or => "or",
            NetOpKind::Xor => "xor",
            NetOpKind::Not => "not",
            NetOpKind::Concat => "concat",
            NetOpKind::Select => "select",
            NetOpKind::Register => "register",
            NetOpKind::Const => "const",
        }
    }

    /// Single-character code used by netlist front ends that tag nets with
    /// operator characters.
    pub fn symbol(self) -> char {
        match self {
            NetOpKind::Wire => 'w',
            NetOpKind::And => '&',
            NetOpKind::Or => '|',
            NetOpKind::Xor => '^',
            NetOpKind::Not => '~',
            NetOpKind::Concat => 'c',
            NetOpKind::Select => 's',
            NetOpKind::Register => 'r',
            NetOpKind::Const => 'x',
        }
    }
}

impl fmt::Display for NetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for NetOpKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetOpKind::ALL
            .iter()
            .copied()
            .find(|kind| {
                kind.name() == s || {
                    let mut chars = s.chars();
                    chars.next() == Some(kind.symbol()) && chars.next().is_none()
                }
            })
            .ok_or_else(|| format!("unsupported net operation: {:?}", s))
    }
}

/// Operation performed by a net, carrying its operands and static parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetOp {
    /// Plain signal forwarding.
    Wire { arg: Wire },
    And { args: Vec<Wire> },
    Or { args: Vec<Wire> },
    Xor { args: Vec<Wire> },
    Not { arg: Wire },
    /// The first argument occupies the most significant bits.
    Concat { args: Vec<Wire> },
    /// Inclusive bit range `[start, end]`, zero-indexed from the LSB.
    Select { arg: Wire, start: usize, end: usize },
    /// Clocked register, modeled as a combinational pass-through.
    Register { arg: Wire },
    /// Unsigned literal of any size, zero-extended to the destination width.
    /// Carries no high zero bits.
    Const { value: Bits },
}

impl NetOp {
    pub fn kind(&self) -> NetOpKind {
        match self {
            NetOp::Wire { .. } => NetOpKind::Wire,
            NetOp::And { .. } => NetOpKind::And,
            NetOp::Or { .. } => NetOpKind::Or,
            NetOp::Xor { .. } => NetOpKind::Xor,
            NetOp::Not { .. } => NetOpKind::Not,
            NetOp::Concat { .. } => NetOpKind::Concat,
            NetOp::Select { .. } => NetOpKind::Select,
            NetOp::Register { .. } => NetOpKind::Register,
            NetOp::Const { .. } => NetOpKind::Const,
        }
    }

    /// Input wires in operand order.
    pub fn args(&self) -> Vec<&Wire> {
        match self {
            NetOp::Wire { arg }
            | NetOp::Not { arg }
            | NetOp::Select { arg, .. }
            | NetOp::Register { arg } => vec![arg],
            NetOp::And { args } | NetOp::Or { args } | NetOp::Xor { args } | NetOp::Concat { args } => {
                args.iter().collect()
            }
            NetOp::Const { .. } => Vec::new(),
        }
    }
}

/// One operation node of the netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Net {
    pub op: NetOp,
    pub dest: Wire,
}

impl Net {
    pub fn new(op: NetOp, dest: Wire) -> Self {
        Self { op, dest }
    }

    pub fn wire(arg: Wire, dest: Wire) -> Self {
        Self::new(NetOp::Wire { arg }, dest)
    }

    pub fn and(args: Vec<Wire>, dest: Wire) -> Self {
        Self::new(NetOp::And { args }, dest)
    }

    pub fn or(args: Vec<Wire>, dest: Wire) -> Self {
        Self::new(NetOp::Or { args }, dest)
    }

    pub fn xor(args: Vec<Wire>, dest: Wire) -> Self {
        Self::new(NetOp::Xor { args }, dest)
    }

    pub fn not(arg: Wire, dest: Wire) -> Self {
        Self::new(NetOp::Not { arg }, dest)
    }

    pub fn concat(args: Vec<Wire>, dest: Wire) -> Self {
        Self::new(NetOp::Concat { args }, dest)
    }

    pub fn select(arg: Wire, start: usize, end: usize, dest: Wire) -> Self {
        Self::new(NetOp::Select { arg, start, end }, dest)
    }

    pub fn register(arg: Wire, dest: Wire) -> Self {
        Self::new(NetOp::Register { arg }, dest)
    }

    pub fn constant(value: u128, dest: Wire) -> Self {
        Self::constant_bits(bits_from_u128_trimmed(value), dest)
    }

    pub fn constant_bits(value: Bits, dest: Wire) -> Self {
        Self::new(
            NetOp::Const {
                value: trim_high_zeros(value),
            },
            dest,
        )
    }

    pub fn kind(&self) -> NetOpKind {
        self.op.kind()
    }

    pub fn args(&self) -> Vec<&Wire> {
        self.op.args()
    }

    pub fn dests(&self) -> &[Wire] {
        std::slice::from_ref(&self.dest)
    }

    /// Static operation parameters, rendered for diagnostics.
    pub fn op_param(&self) -> Option<String> {
        match &self.op {
            NetOp::Select { start, end, .. } => Some(format!("({}, {})", start, end)),
            NetOp::Const { value } => Some(match bits_to_u128(value) {
                Some(small) => small.to_string(),
                None => bits_to_hex(value),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args().iter().map(|w| w.to_string()).collect();
        write!(f, "{}({}", self.kind(), args.join(", "))?;
        if let Some(param) = self.op_param() {
            if !args.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.dest)
    }
}

/// Wires that are read by some net but driven by none, in first-seen order.
pub fn primary_inputs(nets: &[Net]) -> Vec<Wire> {
    let driven: HashSet<&str> = nets.iter().map(|n| n.dest.name.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut inputs = Vec::new();
    for net in nets {
        for arg in net.args() {
            if !driven.contains(arg.name.as_str()) && seen.insert(arg.name.as_str()) {
                inputs.push(arg.clone());
            }
        }
    }
    inputs
}

/// Wires that are driven by some net but read by none, in net order.
pub fn primary_outputs(nets: &[Net]) -> Vec<Wire> {
    let read: HashSet<&str> = nets
        .iter()
        .flat_map(|n| n.args())
        .map(|w| w.name.as_str())
        .collect();
    let mut seen: HashSet<&str> = HashSet::new();
    nets.iter()
        .map(|n| &n.dest)
        .filter(|w| !read.contains(w.name.as_str()) && seen.insert(w.name.as_str()))
        .cloned()
        .collect()
}
