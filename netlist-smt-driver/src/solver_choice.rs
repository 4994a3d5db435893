// SPDX-License-Identifier: Apache-2.0

//! Solver backend selection for the `equiv` subcommand and the `[solver]`
//! config table.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverChoice {
    /// In-process SAT backend; always available.
    #[default]
    Varisat,
    #[cfg(feature = "has-easy-smt")]
    Z3Binary,
    #[cfg(feature = "has-easy-smt")]
    BitwuzlaBinary,
    #[cfg(feature = "has-easy-smt")]
    BoolectorBinary,
}

impl SolverChoice {
    pub fn all() -> Vec<SolverChoice> {
        #[allow(unused_mut)]
        let mut all = vec![SolverChoice::Varisat];
        #[cfg(feature = "has-easy-smt")]
        all.extend([
            SolverChoice::Z3Binary,
            SolverChoice::BitwuzlaBinary,
            SolverChoice::BoolectorBinary,
        ]);
        all
    }

    /// Name accepted by `--solver` and the `[solver] backend` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverChoice::Varisat => "varisat",
            #[cfg(feature = "has-easy-smt")]
            SolverChoice::Z3Binary => "z3-binary",
            #[cfg(feature = "has-easy-smt")]
            SolverChoice::BitwuzlaBinary => "bitwuzla-binary",
            #[cfg(feature = "has-easy-smt")]
            SolverChoice::BoolectorBinary => "boolector-binary",
        }
    }
}

impl fmt::Display for SolverChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SolverChoice {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolverChoice::all()
            .into_iter()
            .find(|choice| choice.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = SolverChoice::all().iter().map(|c| c.as_str()).collect();
                format!("invalid solver: {} (expected one of: {})", s, valid.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for choice in SolverChoice::all() {
            assert_eq!(choice.to_string().parse::<SolverChoice>().unwrap(), choice);
        }
        assert!("minisat".parse::<SolverChoice>().is_err());
    }

    #[test]
    fn test_as_str_matches_display_and_serde() {
        for choice in SolverChoice::all() {
            assert_eq!(choice.as_str(), choice.to_string());
            let from_config: SolverChoice =
                serde_json::from_value(serde_json::Value::from(choice.as_str())).unwrap();
            assert_eq!(from_config, choice);
        }
        assert_eq!(SolverChoice::Varisat.as_str(), "varisat");
    }
}
