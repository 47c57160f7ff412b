//! Runtime configuration.
//!
//! Defaults are compile-time constants; `SUBNET_TRAINER_*` environment
//! variables (optionally from a `.env` file) override them.

use crate::processing::SubnetPolicy;
use std::env;
use std::str::FromStr;

/// Retry ceiling per difficulty level in the exercise generator.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Classful listing cap; a class A /30 split has 4 194 304 blocks.
pub const DEFAULT_MAX_LISTED_SUBNETS: usize = 4096;

/// Historical zero/all-ones convention on by default.
pub const DEFAULT_LEGACY_RESERVED_SUBNETS: bool = true;

pub const ENV_SEED: &str = "SUBNET_TRAINER_SEED";
pub const ENV_MAX_ATTEMPTS: &str = "SUBNET_TRAINER_MAX_ATTEMPTS";
pub const ENV_LEGACY_RESERVED: &str = "SUBNET_TRAINER_LEGACY_RESERVED";
pub const ENV_MAX_LISTED: &str = "SUBNET_TRAINER_MAX_LISTED";

/// Engine settings shared by the CLI and the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Seed for reproducible exercise generation.
    pub seed: Option<u64>,
    pub max_attempts: u32,
    pub legacy_reserved_subnets: bool,
    pub max_listed_subnets: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            legacy_reserved_subnets: DEFAULT_LEGACY_RESERVED_SUBNETS,
            max_listed_subnets: DEFAULT_MAX_LISTED_SUBNETS,
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read overrides from the process environment.
    pub fn from_env() -> Config {
        dotenv::dotenv().ok();
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Config {
            seed: parse_var(&lookup, ENV_SEED),
            max_attempts: parse_var(&lookup, ENV_MAX_ATTEMPTS)
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
            legacy_reserved_subnets: lookup(ENV_LEGACY_RESERVED)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.legacy_reserved_subnets),
            max_listed_subnets: parse_var(&lookup, ENV_MAX_LISTED)
                .filter(|n| *n >= 2)
                .unwrap_or(defaults.max_listed_subnets),
        }
    }

    /// Allocator policy derived from this configuration.
    pub fn policy(&self) -> SubnetPolicy {
        SubnetPolicy {
            legacy_reserved_subnets: self.legacy_reserved_subnets,
            max_listed_subnets: self.max_listed_subnets,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
