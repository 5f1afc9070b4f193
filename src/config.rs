//! Runtime configuration.
//!
//! Values come from environment variables, next to `RUST_LOG`:
//!
//! - `LOYALTY_DEFAULT_PERCENTAGE`: loyalty percentage of a new point of sale (0-100, default 5)
//! - `LOYALTY_DEFAULT_PRICE`: price of a new item (default 500)
//! - `LOYALTY_ID_POLICY`: `strict` or `legacy` identifier matching (default `strict`)
//! - `LOYALTY_ACCESS_POLICY`: `role-gated` or `open` (default `role-gated`)

use crate::auth::AccessPolicy;
use crate::entity::MAX_PERCENTAGE;
use crate::error::{LoyaltyError, Result};
use crate::identifier::IdPolicy;
use std::env;
use std::str::FromStr;

pub const ENV_DEFAULT_PERCENTAGE: &str = "LOYALTY_DEFAULT_PERCENTAGE";
pub const ENV_DEFAULT_PRICE: &str = "LOYALTY_DEFAULT_PRICE";
pub const ENV_ID_POLICY: &str = "LOYALTY_ID_POLICY";
pub const ENV_ACCESS_POLICY: &str = "LOYALTY_ACCESS_POLICY";

/// Ledger-wide settings shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Loyalty percentage given to newly created points of sale.
    pub default_percentage: u8,

    /// Price given to newly created items.
    pub default_price: u64,

    /// How identifiers are matched at creation time.
    pub id_policy: IdPolicy,

    /// How write operations are authorized.
    pub access_policy: AccessPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_percentage: 5,
            default_price: 500,
            id_policy: IdPolicy::Strict,
            access_policy: AccessPolicy::RoleGated,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = read(&lookup, ENV_DEFAULT_PERCENTAGE) {
            let percentage: u8 = parse(ENV_DEFAULT_PERCENTAGE, &value)?;
            if percentage > MAX_PERCENTAGE {
                return Err(LoyaltyError::Config(format!(
                    "{} must be at most {}, got {}",
                    ENV_DEFAULT_PERCENTAGE, MAX_PERCENTAGE, percentage
                )));
            }
            config.default_percentage = percentage;
        }

        if let Some(value) = read(&lookup, ENV_DEFAULT_PRICE) {
            config.default_price = parse(ENV_DEFAULT_PRICE, &value)?;
        }

        if let Some(value) = read(&lookup, ENV_ID_POLICY) {
            config.id_policy = parse(ENV_ID_POLICY, &value)?;
        }

        if let Some(value) = read(&lookup, ENV_ACCESS_POLICY) {
            config.access_policy = parse(ENV_ACCESS_POLICY, &value)?;
        }

        Ok(config)
    }
}

fn read<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| LoyaltyError::Config(format!("{}='{}': {}", key, value, e)))
}
