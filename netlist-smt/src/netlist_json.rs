// SPDX-License-Identifier: Apache-2.0

//! JSON interchange format for netlists.
//!
//! ```json
//! {"nets": [
//!   {"op": "&", "args": [{"name": "a", "bitwidth": 1}, {"name": "b", "bitwidth": 1}],
//!    "dests": [{"name": "c", "bitwidth": 1}]},
//!   {"op": "select", "args": [{"name": "a", "bitwidth": 8}],
//!    "dests": [{"name": "d", "bitwidth": 4}], "op_param": [2, 5]}
//! ]}
//! ```
//!
//! `op` is a spelled operation name or its single-character code (see
//! [`NetOpKind::symbol`]). Loading checks the tag, the arity, the parameter
//! shape and that every net drives exactly one wire; widths are left to the
//! encoder.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::netlist::{Net, NetOp, NetOpKind, Wire};
use crate::value_utils::{
    bits_from_u128_trimmed, bits_to_hex, bits_to_u128, parse_unsigned_literal, Bits,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlistError {
    Io(String),
    Json(String),
    UnsupportedOp {
        index: usize,
        tag: String,
    },
    Arity {
        index: usize,
        op: NetOpKind,
        expected: &'static str,
        actual: usize,
    },
    DestCount {
        index: usize,
        actual: usize,
    },
    BadOpParam {
        index: usize,
        op: NetOpKind,
        message: String,
    },
}

impl fmt::Display for NetlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetlistError::Io(msg) => write!(f, "could not read netlist: {}", msg),
            NetlistError::Json(msg) => write!(f, "malformed netlist JSON: {}", msg),
            NetlistError::UnsupportedOp { index, tag } => {
                write!(f, "net {}: unsupported operation {:?}", index, tag)
            }
            NetlistError::Arity {
                index,
                op,
                expected,
                actual,
            } => write!(
                f,
                "net {} ({}): expected {} argument(s), got {}",
                index, op, expected, actual
            ),
            NetlistError::DestCount { index, actual } => write!(
                f,
                "net {}: expected exactly one destination, got {}",
                index, actual
            ),
            NetlistError::BadOpParam { index, op, message } => {
                write!(f, "net {} ({}): {}", index, op, message)
            }
        }
    }
}

impl std::error::Error for NetlistError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawNet {
    pub op: String,
    #[serde(default)]
    pub args: Vec<Wire>,
    pub dests: Vec<Wire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_param: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNetlist {
    pub nets: Vec<RawNet>,
}

fn parse_const_value(value: &Value) -> Result<Bits, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|v| bits_from_u128_trimmed(u128::from(v)))
            .ok_or_else(|| format!("constant must be a non-negative integer, got {}", n)),
        Value::String(s) => {
            parse_unsigned_literal(s).map_err(|e| format!("invalid constant {:?}: {}", s, e))
        }
        other => Err(format!("constant must be a number or string, got {}", other)),
    }
}

fn parse_select_range(value: &Value) -> Result<(usize, usize), String> {
    let bound = |v: &Value| -> Result<usize, String> {
        v.as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| format!("bit index must be a non-negative integer, got {}", v))
    };
    match value.as_array().map(Vec::as_slice) {
        Some([start, end]) => Ok((bound(start)?, bound(end)?)),
        _ => Err(format!("select expects [start, end], got {}", value)),
    }
}

impl RawNet {
    /// Validates this record as the net at position `index`.
    pub fn to_net(&self, index: usize) -> Result<Net, NetlistError> {
        let kind: NetOpKind = self.op.parse().map_err(|_| NetlistError::UnsupportedOp {
            index,
            tag: self.op.clone(),
        })?;
        let (expected, arity_ok) = match kind {
            NetOpKind::Const => ("0", self.args.is_empty()),
            NetOpKind::Wire | NetOpKind::Not | NetOpKind::Select | NetOpKind::Register => {
                ("1", self.args.len() == 1)
            }
            NetOpKind::And | NetOpKind::Or | NetOpKind::Xor | NetOpKind::Concat => {
                ("at least 1", !self.args.is_empty())
            }
        };
        if !arity_ok {
            return Err(NetlistError::Arity {
                index,
                op: kind,
                expected,
                actual: self.args.len(),
            });
        }
        let dest = match self.dests.as_slice() {
            [dest] => dest.clone(),
            dests => {
                return Err(NetlistError::DestCount {
                    index,
                    actual: dests.len(),
                })
            }
        };
        let bad_param = |message: String| NetlistError::BadOpParam {
            index,
            op: kind,
            message,
        };
        let param = self.op_param.as_ref().filter(|v| !v.is_null());
        let arg = || self.args[0].clone();
        let args = || self.args.clone();
        let op = match kind {
            NetOpKind::Select => {
                let value = param.ok_or_else(|| bad_param("missing op_param".to_string()))?;
                let (start, end) = parse_select_range(value).map_err(bad_param)?;
                NetOp::Select {
                    arg: arg(),
                    start,
                    end,
                }
            }
            NetOpKind::Const => {
                let value = param.ok_or_else(|| bad_param("missing op_param".to_string()))?;
                NetOp::Const {
                    value: parse_const_value(value).map_err(bad_param)?,
                }
            }
            _ if param.is_some() => {
                return Err(bad_param(format!(
                    "unexpected op_param for {}",
                    kind.name()
                )))
            }
            NetOpKind::Wire => NetOp::Wire { arg: arg() },
            NetOpKind::Not => NetOp::Not { arg: arg() },
            NetOpKind::Register => NetOp::Register { arg: arg() },
            NetOpKind::And => NetOp::And { args: args() },
            NetOpKind::Or => NetOp::Or { args: args() },
            NetOpKind::Xor => NetOp::Xor { args: args() },
            NetOpKind::Concat => NetOp::Concat { args: args() },
        };
        Ok(Net::new(op, dest))
    }

    pub fn from_net(net: &Net) -> Self {
        let op_param = match &net.op {
            NetOp::Select { start, end, .. } => Some(serde_json::json!([start, end])),
            NetOp::Const { value } => {
                Some(match bits_to_u128(value).and_then(|v| u64::try_from(v).ok()) {
                    Some(small) => Value::from(small),
                    None => Value::String(bits_to_hex(value)),
                })
            }
            _ => None,
        };
        RawNet {
            op: net.kind().name().to_string(),
            args: net.args().into_iter().cloned().collect(),
            dests: net.dests().to_vec(),
            op_param,
        }
    }
}

pub fn parse_netlist_json(text: &str) -> Result<Vec<Net>, NetlistError> {
    let raw: RawNetlist =
        serde_json::from_str(text).map_err(|e| NetlistError::Json(e.to_string()))?;
    let nets = raw
        .nets
        .iter()
        .enumerate()
        .map(|(index, net)| net.to_net(index))
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("loaded {} nets", nets.len());
    Ok(nets)
}

pub fn load_netlist_json(path: &Path) -> Result<Vec<Net>, NetlistError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| NetlistError::Io(format!("{}: {}", path.display(), e)))?;
    parse_netlist_json(&text)
}

pub fn netlist_to_json(nets: &[Net]) -> Result<String, NetlistError> {
    let raw = RawNetlist {
        nets: nets.iter().map(RawNet::from_net).collect(),
    };
    serde_json::to_string_pretty(&raw).map_err(|e| NetlistError::Json(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_parse_symbolic_and_spelled_tags() {
        let text = r#"{"nets": [
            {"op": "~", "args": [{"name": "a", "bitwidth": 1}], "dests": [{"name": "na", "bitwidth": 1}]},
            {"op": "or", "args": [{"name": "na", "bitwidth": 1}, {"name": "b", "bitwidth": 1}],
             "dests": [{"name": "y", "bitwidth": 1}]},
            {"op": "s", "args": [{"name": "w", "bitwidth": 8}], "dests": [{"name": "s", "bitwidth": 4}],
             "op_param": [2, 5]},
            {"op": "x", "dests": [{"name": "k", "bitwidth": 8}], "op_param": "0xA5"},
            {"op": "const", "dests": [{"name": "j", "bitwidth": 4}], "op_param": 7}
        ]}"#;
        let nets = parse_netlist_json(text).unwrap();
        assert_eq!(
            nets,
            vec![
                Net::not(Wire::new("a", 1), Wire::new("na", 1)),
                Net::or(vec![Wire::new("na", 1), Wire::new("b", 1)], Wire::new("y", 1)),
                Net::select(Wire::new("w", 8), 2, 5, Wire::new("s", 4)),
                Net::constant(0xa5, Wire::new("k", 8)),
                Net::constant(7, Wire::new("j", 4)),
            ]
        );
    }

    #[test]
    fn test_unknown_op_names_tag_and_index() {
        let text = r#"{"nets": [
            {"op": "w", "args": [{"name": "a", "bitwidth": 1}], "dests": [{"name": "b", "bitwidth": 1}]},
            {"op": "+", "args": [{"name": "a", "bitwidth": 1}], "dests": [{"name": "c", "bitwidth": 1}]}
        ]}"#;
        assert_eq!(
            parse_netlist_json(text).unwrap_err(),
            NetlistError::UnsupportedOp {
                index: 1,
                tag: "+".to_string()
            }
        );
    }

    #[test_case(r#"{"op": "not", "args": [], "dests": [{"name": "c", "bitwidth": 1}]}"# ; "not without argument")]
    #[test_case(r#"{"op": "and", "args": [], "dests": [{"name": "c", "bitwidth": 1}]}"# ; "and without arguments")]
    #[test_case(r#"{"op": "const", "args": [{"name": "a", "bitwidth": 1}], "dests": [{"name": "c", "bitwidth": 1}], "op_param": 1}"# ; "const with argument")]
    fn test_arity_errors(net: &str) {
        let text = format!(r#"{{"nets": [{}]}}"#, net);
        assert!(matches!(
            parse_netlist_json(&text).unwrap_err(),
            NetlistError::Arity { index: 0, .. }
        ));
    }

    #[test]
    fn test_dest_count_error() {
        let text = r#"{"nets": [{"op": "wire", "args": [{"name": "a", "bitwidth": 1}],
            "dests": [{"name": "b", "bitwidth": 1}, {"name": "c", "bitwidth": 1}]}]}"#;
        assert_eq!(
            parse_netlist_json(text).unwrap_err(),
            NetlistError::DestCount {
                index: 0,
                actual: 2
            }
        );
    }

    #[test_case(r#"{"op": "select", "args": [{"name": "a", "bitwidth": 8}], "dests": [{"name": "c", "bitwidth": 4}]}"# ; "select missing range")]
    #[test_case(r#"{"op": "select", "args": [{"name": "a", "bitwidth": 8}], "dests": [{"name": "c", "bitwidth": 4}], "op_param": [2]}"# ; "select short range")]
    #[test_case(r#"{"op": "const", "dests": [{"name": "c", "bitwidth": 4}], "op_param": -1}"# ; "negative const")]
    #[test_case(r#"{"op": "const", "dests": [{"name": "c", "bitwidth": 4}], "op_param": "0xZZ"}"# ; "bad hex const")]
    #[test_case(r#"{"op": "not", "args": [{"name": "a", "bitwidth": 1}], "dests": [{"name": "c", "bitwidth": 1}], "op_param": 3}"# ; "unexpected param")]
    fn test_bad_op_param(net: &str) {
        let text = format!(r#"{{"nets": [{}]}}"#, net);
        assert!(matches!(
            parse_netlist_json(&text).unwrap_err(),
            NetlistError::BadOpParam { index: 0, .. }
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_netlist_json("{\"nets\": [").unwrap_err(),
            NetlistError::Json(_)
        ));
    }

    #[test]
    fn test_serialize_then_parse_preserves_nets() {
        let nets = vec![
            Net::concat(vec![Wire::new("a", 4), Wire::new("b", 4)], Wire::new("c", 8)),
            Net::select(Wire::new("c", 8), 0, 3, Wire::new("d", 4)),
            Net::constant(u128::MAX, Wire::new("big", 128)),
            Net::register(Wire::new("d", 4), Wire::new("q", 4)),
        ];
        let text = netlist_to_json(&nets).unwrap();
        assert!(text.contains("\"0xffffffffffffffffffffffffffffffff\""));
        assert_eq!(parse_netlist_json(&text).unwrap(), nets);
    }

    #[test]
    fn test_const_beyond_128_bits() {
        let hex = format!("0x1{}", "0".repeat(34));
        let decimal = "87112285931760246646623899502532662132736";
        let text = format!(
            r#"{{"nets": [
                {{"op": "const", "dests": [{{"name": "c", "bitwidth": 256}}], "op_param": "{}"}},
                {{"op": "const", "dests": [{{"name": "d", "bitwidth": 256}}], "op_param": "{}"}}
            ]}}"#,
            hex, decimal
        );
        let nets = parse_netlist_json(&text).unwrap();
        match &nets[0].op {
            NetOp::Const { value } => {
                assert_eq!(value.len(), 137);
                assert_eq!(value.count_ones(), 1);
            }
            other => panic!("expected a constant, got {:?}", other),
        }
        assert_eq!(nets[0].op, nets[1].op);

        let written = netlist_to_json(&nets).unwrap();
        assert!(written.contains(&format!("\"{}\"", hex)), "{}", written);
        assert_eq!(parse_netlist_json(&written).unwrap(), nets);
    }
}
