//! Scenario configuration.
//!
//! Scenarios are YAML files; `${VAR}` placeholders anywhere in the file
//! are expanded from the process environment as part of loading, so
//! credentials never have to live in the file itself.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::connect::ConnectOptions;
use crate::worker::LoadShape;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// A complete load scenario: where to connect, what to load, how hard.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub scenario: String,
    pub connection: ConnectOptions,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_workers")]
    pub workers: u32,
    #[serde(default)]
    pub shape: LoadShape,
}

fn default_table() -> String {
    "copytest".to_string()
}

fn default_workers() -> u32 {
    5
}

impl Scenario {
    /// Rows this scenario commits when every worker succeeds.
    pub fn expected_rows(&self) -> u64 {
        u64::from(self.workers) * self.shape.rows_per_worker()
    }

    /// # Errors
    ///
    /// Returns an error if the scenario is not runnable as written.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("scenario '{}': workers must be at least 1", self.scenario);
        }
        if self.shape.rows_per_buffer == 0 {
            anyhow::bail!(
                "scenario '{}': rows_per_buffer must be at least 1",
                self.scenario
            );
        }
        Ok(())
    }
}

/// Load a scenario from a YAML file, expanding `${VAR}` placeholders.
///
/// # Errors
///
/// Fails if the file cannot be read, a referenced environment variable is
/// unset, or the expanded YAML does not describe a scenario.
pub fn parse_scenario(path: &Path) -> Result<Scenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read scenario file {}", path.display()))?;
    parse_scenario_str(&raw)
}

/// Load a scenario from YAML text, expanding `${VAR}` placeholders.
///
/// # Errors
///
/// Fails if a referenced environment variable is unset or the expanded
/// YAML does not describe a scenario.
pub fn parse_scenario_str(yaml: &str) -> Result<Scenario> {
    let expanded = expand_placeholders(yaml)?;
    serde_yaml::from_str(&expanded).context("scenario YAML is malformed")
}

/// Replace every `${VAR}` with the value of the environment variable.
/// Unset variables are collected and reported in one error, sorted, so a
/// scenario missing several credentials fails with the full list at once.
fn expand_placeholders(input: &str) -> Result<String> {
    let mut unset: BTreeSet<String> = BTreeSet::new();

    let expanded = PLACEHOLDER_RE.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        std::env::var(name).unwrap_or_else(|_| {
            unset.insert(name.to_string());
            String::new()
        })
    });

    if unset.is_empty() {
        Ok(expanded.into_owned())
    } else {
        let names = unset.into_iter().collect::<Vec<_>>().join(", ");
        anyhow::bail!("scenario references unset environment variable(s): {names}");
    }
}
