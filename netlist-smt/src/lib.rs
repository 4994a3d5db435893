// SPDX-License-Identifier: Apache-2.0

//! Encodes combinational netlists as bit-vector constraints.
//!
//! [`encode::encode_netlist`] allocates one solver variable per wire and one
//! equality per net; [`equiv::prove_equiv::prove_netlist_equiv`] builds a
//! miter over two encodings.

pub mod config;
pub mod encode;
pub mod equiv;
pub mod netlist;
pub mod netlist_json;
pub mod value_utils;
pub mod wire_map;

pub use config::{EncoderConfig, WidthConflictPolicy};
pub use encode::{encode_netlist, generate_constraints, Constraint, EncodeError, Encoding};
pub use netlist::{Net, NetOp, NetOpKind, Wire};
pub use wire_map::{allocate_wires, WireMap};
