// Environment configuration
//
//   LEDGER_DB_PATH         database file (default: ledger.db)
//   LEDGER_SNAPSHOT_READS  true/false, fetch inside one read transaction (default: true)

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "LEDGER_DB_PATH";
pub const SNAPSHOT_READS_VAR: &str = "LEDGER_SNAPSHOT_READS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub snapshot_reads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("ledger.db"),
            snapshot_reads: true,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(DB_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path.trim());
        }

        if let Some(raw) = lookup(SNAPSHOT_READS_VAR) {
            config.snapshot_reads = parse_flag(SNAPSHOT_READS_VAR, &raw)?;
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be true or false, got {:?}", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.snapshot_reads);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (DB_PATH_VAR, "/var/lib/ledger/bank.db"),
            (SNAPSHOT_READS_VAR, "off"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/ledger/bank.db"));
        assert!(!config.snapshot_reads);
    }

    #[test]
    fn test_invalid_flag_names_variable() {
        let err = Config::from_lookup(lookup_from(&[(SNAPSHOT_READS_VAR, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(SNAPSHOT_READS_VAR));
    }
}
