use crate::error::{Result, SomniaError};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://dream-rpc.somnia.network";
pub const DEFAULT_CHAIN_ID: u64 = 50312;
pub const DEFAULT_NATIVE_SYMBOL: &str = "SOMI";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    pub chain_id: u64,
    pub native_symbol: String,
    pub listen_addr: String,
    /// How long to wait for a submitted transaction to be mined.
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl Config {
    /// Load from the process environment (and `.env`). Unset variables take
    /// their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let mut config = Config::from_url(rpc_url);
        config.private_key = lookup("PRIVATE_KEY");

        if let Some(chain_id) = lookup("CHAIN_ID") {
            config.chain_id = chain_id
                .parse::<u64>()
                .map_err(|e| SomniaError::ConfigError(format!("Invalid CHAIN_ID: {}", e)))?;
        }

        if let Some(symbol) = lookup("NATIVE_SYMBOL") {
            config.native_symbol = symbol;
        }

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(secs) = lookup("RECEIPT_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                SomniaError::ConfigError(format!("Invalid RECEIPT_TIMEOUT_SECS: {}", e))
            })?;
            config.receipt_timeout = Duration::from_secs(secs);
        }

        if let Some(ms) = lookup("RECEIPT_POLL_MS") {
            let ms = ms
                .parse::<u64>()
                .map_err(|e| SomniaError::ConfigError(format!("Invalid RECEIPT_POLL_MS: {}", e)))?;
            config.receipt_poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn from_url(rpc_url: String) -> Self {
        Config {
            rpc_url,
            private_key: None,
            chain_id: DEFAULT_CHAIN_ID,
            native_symbol: DEFAULT_NATIVE_SYMBOL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            receipt_timeout: Duration::from_secs(120),
            receipt_poll_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_url() {
        let config = Config::from_url(DEFAULT_RPC_URL.to_string());
        assert_eq!(config.rpc_url, "https://dream-rpc.somnia.network");
        assert_eq!(config.chain_id, 50312);
        assert_eq!(config.native_symbol, "SOMI");
        assert!(config.private_key.is_none());
    }

    #[test]
    fn test_private_key_not_serialized() {
        let mut config = Config::from_url(DEFAULT_RPC_URL.to_string());
        config.private_key = Some("0xdeadbeef".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("deadbeef"));
    }

    fn lookup_from(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_lookup_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[
            ("LISTEN_ADDR", "0.0.0.0:9000"),
            ("RECEIPT_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.receipt_timeout, Duration::from_secs(30));
        assert_eq!(config.receipt_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_lookup_reads_every_variable() {
        let config = Config::from_lookup(lookup_from(&[
            ("RPC_URL", "http://localhost:8545"),
            ("PRIVATE_KEY", "0xabc"),
            ("CHAIN_ID", "31337"),
            ("NATIVE_SYMBOL", "STT"),
            ("RECEIPT_POLL_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.private_key.as_deref(), Some("0xabc"));
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.native_symbol, "STT");
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_variable_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[
            ("RPC_URL", "http://localhost:8545"),
            ("CHAIN_ID", "abc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SomniaError::ConfigError(ref m) if m.starts_with("Invalid CHAIN_ID")));

        let err = Config::from_lookup(lookup_from(&[("RECEIPT_POLL_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("RECEIPT_POLL_MS"));
    }
}
