/// Service configuration from environment variables
///
/// Controls the Bitcoin network, the upstream indexer RPC endpoint and the broadcast relay.
/// Defaults to mainnet since inscription recovery is a mainnet activity.

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    /// Bitcoin network addresses must belong to
    pub bitcoin_network: bitcoin::Network,
    /// Upstream JSON-RPC endpoint (without credential)
    pub rpc_url: String,
    /// Optional access credential, appended as the last path segment
    pub rpc_api_key: Option<String>,
    /// RPC method returning a wallet's spendable/asset/pending UTXOs
    pub balances_method: String,
    /// RPC method returning a single Esplora-style transaction
    pub transaction_method: String,
    /// Timeout applied to every upstream call
    pub request_timeout: Duration,
    /// Esplora API base URL used to relay signed transactions
    pub broadcast_url: String,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl RecoveryConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BITCOIN_NETWORK`: "mainnet" (default), "testnet", "signet" or "regtest"
    /// - `RPC_URL`: indexer JSON-RPC endpoint
    /// - `RPC_API_KEY`: indexer access credential (optional)
    /// - `RPC_BALANCES_METHOD` / `RPC_TRANSACTION_METHOD`: method name overrides
    /// - `RPC_TIMEOUT_SECS`: upstream timeout in seconds (default 30)
    /// - `BROADCAST_URL`: Esplora endpoint for `/broadcast` (has per-network defaults)
    /// - `BIND_ADDRESS`: server bind address (default 0.0.0.0:3000)
    /// - `ALLOWED_ORIGINS`: comma separated CORS origins (unset allows any origin)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Mainnet with a Sandshrew key
    /// RPC_API_KEY=... cargo run
    ///
    /// # Regtest against a local indexer
    /// BITCOIN_NETWORK=regtest RPC_URL=http://localhost:18888 cargo run
    /// ```
    pub fn from_env() -> Self {
        let network_str = env::var("BITCOIN_NETWORK")
            .unwrap_or_else(|_| "mainnet".to_string())
            .to_lowercase();

        let bitcoin_network = match parse_network(&network_str) {
            Some(network) => {
                log::info!("Using {} network", network);
                network
            }
            None => {
                log::warn!("Unknown network '{}', defaulting to mainnet", network_str);
                bitcoin::Network::Bitcoin
            }
        };

        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| default_rpc_url(bitcoin_network));
        log::info!("Indexer RPC URL: {}", rpc_url);

        let rpc_api_key = env::var("RPC_API_KEY").ok().filter(|key| !key.is_empty());
        if rpc_api_key.is_none() {
            log::warn!("RPC_API_KEY not set, upstream calls are unauthenticated");
        }

        let request_timeout = env::var("RPC_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    log::warn!("Ignoring invalid RPC_TIMEOUT_SECS '{}'", secs);
                    None
                }
            })
            .unwrap_or(DEFAULT_TIMEOUT);

        let broadcast_url =
            env::var("BROADCAST_URL").unwrap_or_else(|_| default_broadcast_url(bitcoin_network));

        Self {
            bitcoin_network,
            rpc_url,
            rpc_api_key,
            balances_method: env::var("RPC_BALANCES_METHOD")
                .unwrap_or_else(|_| DEFAULT_BALANCES_METHOD.to_string()),
            transaction_method: env::var("RPC_TRANSACTION_METHOD")
                .unwrap_or_else(|_| DEFAULT_TRANSACTION_METHOD.to_string()),
            request_timeout,
            broadcast_url,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
        }
    }

    /// Full RPC endpoint including the credential path segment, if any.
    pub fn rpc_endpoint(&self) -> String {
        let base = self.rpc_url.trim_end_matches('/');
        match &self.rpc_api_key {
            Some(key) => format!("{}/{}", base, key),
            None => base.to_string(),
        }
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BALANCES_METHOD: &str = "sandshrew_balances";
const DEFAULT_TRANSACTION_METHOD: &str = "esplora_tx";

fn parse_network(name: &str) -> Option<bitcoin::Network> {
    match name {
        "mainnet" | "bitcoin" | "" => Some(bitcoin::Network::Bitcoin),
        "testnet" => Some(bitcoin::Network::Testnet),
        "signet" => Some(bitcoin::Network::Signet),
        "regtest" => Some(bitcoin::Network::Regtest),
        _ => None,
    }
}

fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

fn default_rpc_url(network: bitcoin::Network) -> String {
    match network {
        bitcoin::Network::Testnet => "https://testnet.sandshrew.io/v2".to_string(),
        bitcoin::Network::Signet => "https://signet.sandshrew.io/v2".to_string(),
        bitcoin::Network::Regtest => "http://localhost:18888".to_string(),
        _ => "https://mainnet.sandshrew.io/v2".to_string(),
    }
}

fn default_broadcast_url(network: bitcoin::Network) -> String {
    match network {
        bitcoin::Network::Testnet => "https://mempool.space/testnet/api".to_string(),
        bitcoin::Network::Signet => "https://mempool.space/signet/api".to_string(),
        bitcoin::Network::Regtest => "http://localhost:3000".to_string(),
        _ => "https://mempool.space/api".to_string(),
    }
}

impl Default for RecoveryConfig {
    /// Default configuration (mainnet, unauthenticated)
    fn default() -> Self {
        Self {
            bitcoin_network: bitcoin::Network::Bitcoin,
            rpc_url: default_rpc_url(bitcoin::Network::Bitcoin),
            rpc_api_key: None,
            balances_method: DEFAULT_BALANCES_METHOD.to_string(),
            transaction_method: DEFAULT_TRANSACTION_METHOD.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            broadcast_url: default_broadcast_url(bitcoin::Network::Bitcoin),
            bind_address: "0.0.0.0:3000".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_mainnet() {
        let config = RecoveryConfig::default();
        assert!(matches!(config.bitcoin_network, bitcoin::Network::Bitcoin));
        assert_eq!(config.balances_method, "sandshrew_balances");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_rpc_endpoint_appends_key() {
        let config = RecoveryConfig {
            rpc_url: "https://mainnet.sandshrew.io/v2/".to_string(),
            rpc_api_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert_eq!(config.rpc_endpoint(), "https://mainnet.sandshrew.io/v2/secret");

        let config = RecoveryConfig {
            rpc_api_key: None,
            ..config
        };
        assert_eq!(config.rpc_endpoint(), "https://mainnet.sandshrew.io/v2");
    }

    #[test]
    fn test_parse_network() {
        assert_eq!(parse_network("bitcoin"), Some(bitcoin::Network::Bitcoin));
        assert_eq!(parse_network("signet"), Some(bitcoin::Network::Signet));
        assert_eq!(parse_network("regtest"), Some(bitcoin::Network::Regtest));
        assert_eq!(parse_network("litecoin"), None);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }
}
