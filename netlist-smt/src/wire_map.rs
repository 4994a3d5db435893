// SPDX-License-Identifier: Apache-2.0

//! Variable allocation: one symbolic bit-vector per distinct wire name.

use std::collections::HashMap;

use crate::config::{EncoderConfig, WidthConflictPolicy};
use crate::encode::EncodeError;
use crate::equiv::solver_interface::{BitVec, Solver};
use crate::netlist::Net;
use crate::value_utils::smt_symbol;

/// Solver variable allocated for one wire.
#[derive(Debug, Clone)]
pub struct WireVar<T> {
    pub name: String,
    pub width: usize,
    /// Symbol the variable was declared under (the wire name plus any prefix).
    pub symbol: String,
    pub var: BitVec<T>,
}

/// Wire name to solver variable, iterated in first-seen order.
///
/// Built once by [`allocate_wires`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct WireMap<T> {
    entries: Vec<WireVar<T>>,
    index: HashMap<String, usize>,
}

impl<T> WireMap<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&WireVar<T>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn get(&self, name: &str) -> Option<&BitVec<T>> {
        self.entry(name).map(|e| &e.var)
    }

    pub fn width(&self, name: &str) -> Option<usize> {
        self.entry(name).map(|e| e.width)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WireVar<T>> {
        self.entries.iter()
    }
}

/// Declares a solver variable for every wire referenced by `nets`.
///
/// Wires are visited net by net, arguments before the destination. A name
/// that reappears with a different width is handled per
/// [`EncoderConfig::width_conflict`].
pub fn allocate_wires<S: Solver>(
    solver: &mut S,
    nets: &[Net],
    config: &EncoderConfig,
) -> Result<WireMap<S::Term>, EncodeError> {
    let mut map = WireMap::new();
    // Rendered SMT-LIB symbol to the wire that claimed it.
    let mut rendered: HashMap<String, String> = HashMap::new();
    for net in nets {
        for wire in net.args().into_iter().chain(net.dests()) {
            if let Some(first) = map.width(&wire.name) {
                if first != wire.bitwidth {
                    match config.width_conflict {
                        WidthConflictPolicy::Error => {
                            return Err(EncodeError::WidthRedeclared {
                                wire: wire.name.clone(),
                                first,
                                second: wire.bitwidth,
                            });
                        }
                        WidthConflictPolicy::FirstWins => {
                            log::warn!(
                                "wire `{}` redeclared with width {}; keeping first width {}",
                                wire.name,
                                wire.bitwidth,
                                first
                            );
                        }
                    }
                }
                continue;
            }
            if wire.bitwidth == 0 {
                return Err(EncodeError::ZeroWidthWire {
                    wire: wire.name.clone(),
                });
            }
            let symbol = config.symbol_for(&wire.name);
            let smt_name =
                smt_symbol(&symbol).ok_or_else(|| EncodeError::UnrepresentableSymbol {
                    wire: wire.name.clone(),
                    symbol: symbol.clone(),
                })?;
            if let Some(other) = rendered.get(&smt_name) {
                return Err(EncodeError::SymbolCollision {
                    wire: wire.name.clone(),
                    other: other.clone(),
                    symbol: smt_name,
                });
            }
            rendered.insert(smt_name, wire.name.clone());
            let var = solver.declare(&symbol, wire.bitwidth)?;
            log::debug!("allocated {} as `{}`", wire, symbol);
            map.index.insert(wire.name.clone(), map.entries.len());
            map.entries.push(WireVar {
                name: wire.name.clone(),
                width: wire.bitwidth,
                symbol,
                var,
            });
        }
    }
    Ok(map)
}
