use crate::domain::Address;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Optional JSONL capture to ingest at startup.
    pub events_path: Option<String>,
    pub rpc_url: String,
    /// token/intermediate reserve pair contract.
    pub token_pair_address: Address,
    /// intermediate/USD reserve pair contract.
    pub usd_pair_address: Address,
    /// Admin recorded when the ledger singleton is first created.
    pub bootstrap_admin: Address,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let events_path = env_map.get("EVENTS_PATH").cloned();

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let token_pair_address = required_address(&env_map, "TOKEN_PAIR_ADDRESS")?;
        let usd_pair_address = required_address(&env_map, "USD_PAIR_ADDRESS")?;
        let bootstrap_admin = required_address(&env_map, "BOOTSTRAP_ADMIN")?;

        Ok(Config {
            port,
            database_path,
            events_path,
            rpc_url,
            token_pair_address,
            usd_pair_address,
            bootstrap_admin,
        })
    }
}

fn required_address(
    env_map: &HashMap<String, String>,
    name: &str,
) -> Result<Address, ConfigError> {
    env_map
        .get(name)
        .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))?
        .parse()
        .map_err(|_| {
            ConfigError::InvalidValue(name.to_string(), "must be a hex address".to_string())
        })
}
