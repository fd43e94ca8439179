//! CLI configuration loaded from environment variables.

use anyhow::{Context, Result};
use myrisk_core::constants::{DEFAULT_SEED, DRIVER_TOP_N, ISOLATION_TREES, PROVIDER_TOP_N};
use myrisk_engine::EngineConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct CliConfig {
    /// Seed for the isolation forest.
    pub seed: u64,
    /// Trees per isolation forest.
    pub isolation_trees: usize,
    /// Drivers kept in explanations.
    pub driver_top_n: usize,
    /// Providers kept when ranking outliers.
    pub provider_top_n: usize,
    /// Log level filter string (e.g. "info", "myrisk_engine=debug").
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            isolation_trees: ISOLATION_TREES,
            driver_top_n: DRIVER_TOP_N,
            provider_top_n: PROVIDER_TOP_N,
            log_level: "info".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
        None => Ok(default),
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let seed = parse_var(&lookup, "MYRISK_SEED", defaults.seed)?;
        let isolation_trees =
            parse_var(&lookup, "MYRISK_ISOLATION_TREES", defaults.isolation_trees)?;
        let driver_top_n = parse_var(&lookup, "MYRISK_DRIVER_TOP_N", defaults.driver_top_n)?;
        let provider_top_n =
            parse_var(&lookup, "MYRISK_PROVIDER_TOP_N", defaults.provider_top_n)?;
        let log_level = lookup("MYRISK_LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(CliConfig { seed, isolation_trees, driver_top_n, provider_top_n, log_level })
    }

    /// Engine calibration with this configuration's overrides applied.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            seed: self.seed,
            isolation_trees: self.isolation_trees,
            driver_top_n: self.driver_top_n,
            provider_top_n: self.provider_top_n,
            ..EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_environment_gives_defaults() {
        let cfg = CliConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, CliConfig::default());
        assert_eq!(cfg.engine_config(), EngineConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = CliConfig::from_lookup(lookup(&[
            ("MYRISK_SEED", "7"),
            ("MYRISK_ISOLATION_TREES", " 50 "),
            ("MYRISK_LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.isolation_trees, 50);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.engine_config().isolation_trees, 50);
    }

    #[test]
    fn bad_number_names_variable() {
        let err = CliConfig::from_lookup(lookup(&[("MYRISK_DRIVER_TOP_N", "ten")])).unwrap_err();
        assert!(err.to_string().contains("MYRISK_DRIVER_TOP_N"));
    }
}
