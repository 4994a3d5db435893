// SPDX-License-Identifier: Apache-2.0

//! Encoder options.

use serde::Deserialize;

/// What the variable allocator does when one wire name appears with two
/// different widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidthConflictPolicy {
    /// Fail with [`crate::encode::EncodeError::WidthRedeclared`].
    #[default]
    Error,
    /// Keep the width seen first and log a warning.
    FirstWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    pub width_conflict: WidthConflictPolicy,
    /// Prepended to every declared symbol as `{prefix}__{wire}`.
    pub name_prefix: Option<String>,
}

impl EncoderConfig {
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_width_conflict(mut self, policy: WidthConflictPolicy) -> Self {
        self.width_conflict = policy;
        self
    }

    /// Solver symbol used for the wire called `wire_name`.
    pub fn symbol_for(&self, wire_name: &str) -> String {
        match &self.name_prefix {
            Some(prefix) => format!("{}__{}", prefix, wire_name),
            None => wire_name.to_string(),
        }
    }
}
