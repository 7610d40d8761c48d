use anyhow::Context;
use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_port: String,
    pub database_url: String,
}

impl Config {
    /// Reads configuration from the environment, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Config> {
        if dotenv().is_err() {
            tracing::debug!("no .env file loaded");
        }

        let server_port = load_env("SERVER_PORT")?;
        let database_url = load_env("DATABASE_URL")?;

        Ok(Config {
            server_port,
            database_url,
        })
    }
}

fn load_env(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("failed to load environment variable {}", key))
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_missing_variable_names_key() {
        let result = load_env("DEVICES_TEST_SURELY_UNSET_VARIABLE");

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("DEVICES_TEST_SURELY_UNSET_VARIABLE"));
    }
}
