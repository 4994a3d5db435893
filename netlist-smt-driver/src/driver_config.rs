// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use netlist_smt::{EncoderConfig, WidthConflictPolicy};
use serde::Deserialize;

use crate::solver_choice::SolverChoice;

/// Name of the config file picked up from the working directory when
/// `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "netlist-smt.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    pub encoder: EncoderConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Backend used by `equiv` when `--solver` is not given.
    pub backend: Option<SolverChoice>,

    /// Where external solver backends write the SMT-LIB2 command stream.
    pub replay_file: Option<PathBuf>,
}

pub fn parse_driver_config(text: &str) -> Result<DriverConfig, String> {
    toml::from_str(text).map_err(|e| e.to_string())
}

/// Resolves the config file: the explicit path if given, otherwise
/// [`DEFAULT_CONFIG_FILE`] in `cwd` if it exists.
pub fn find_config_path(explicit: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    if candidate.exists() {
        log::info!(
            "Using {} in current directory: {}",
            DEFAULT_CONFIG_FILE,
            candidate.display()
        );
        Some(candidate)
    } else {
        None
    }
}

/// Encoder options from the config file, overridden by command-line flags.
///
/// `--name_prefix` only exists on `encode`; subcommands without it keep the
/// config file's prefix.
pub fn get_encoder_config(matches: &ArgMatches, config: &DriverConfig) -> EncoderConfig {
    let mut encoder = config.encoder.clone();
    if let Some(policy) = matches.get_one::<String>("width_conflict") {
        encoder.width_conflict = match policy.as_str() {
            "first-wins" => WidthConflictPolicy::FirstWins,
            _ => WidthConflictPolicy::Error,
        };
    }
    if let Ok(Some(prefix)) = matches.try_get_one::<String>("name_prefix") {
        encoder.name_prefix = Some(prefix.clone());
    }
    encoder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_driver_config(
            r#"
[encoder]
width_conflict = "first-wins"

[solver]
backend = "varisat"
replay_file = "/tmp/replay.smt2"
"#,
        )
        .unwrap();
        assert_eq!(config.encoder.width_conflict, WidthConflictPolicy::FirstWins);
        assert_eq!(config.encoder.name_prefix, None);
        assert_eq!(config.solver.backend, Some(SolverChoice::Varisat));
        assert_eq!(
            config.solver.replay_file,
            Some(PathBuf::from("/tmp/replay.smt2"))
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_driver_config("").unwrap();
        assert_eq!(config.encoder, EncoderConfig::default());
        assert_eq!(config.solver.backend, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_driver_config("[encoder]\nwidth = 3\n").is_err());
        assert!(parse_driver_config("[solver]\nbackend = \"minisat\"\n").is_err());
    }
}
