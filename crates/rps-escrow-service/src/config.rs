//! Service configuration from environment variables.

use rps_escrow_core::{Amount, Identity};
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
/// 0.01 ether in wei
const DEFAULT_WALLET_FUNDING: Amount = 10_000_000_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}={value}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub port: u16,
    /// Identity allowed to pause and resume
    pub owner: Identity,
    /// True when the owner came from RPS_OWNER_ID rather than being generated
    pub owner_configured: bool,
    /// Initial mock-wallet balance for each registered identity
    pub wallet_funding: Amount,
}

impl ServiceConfig {
    /// Read `PORT`, `RPS_OWNER_ID` and `RPS_WALLET_FUNDING`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let wallet_funding =
            parse_var(&lookup, "RPS_WALLET_FUNDING")?.unwrap_or(DEFAULT_WALLET_FUNDING);
        let configured_owner: Option<Identity> = parse_var(&lookup, "RPS_OWNER_ID")?;

        Ok(Self {
            port,
            owner: configured_owner.unwrap_or_default(),
            owner_configured: configured_owner.is_some(),
            wallet_funding,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    let parsed: Result<T, T::Err> = value.trim().parse();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
